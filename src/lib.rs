//! MediaRenamer - Bring order to recorded and downloaded TV episodes
//!
//! This library parses series, season, episode and title information out
//! of messy video filenames, reconciles the guesses against an online
//! episode catalog, and renames the files (plus their sidecar files) into
//! a uniform scheme.

mod cache;
mod catalog;
mod config;
mod episode;
mod format;
mod metadata;
mod parser;
mod patterns;
mod reconcile;
mod rename;
mod scan;

use parser::{generic_title, parse_file};
use reconcile::{reconcile, resolve_entity_title};
use scan::scan_for_episodes;

// Re-export error types
pub use cache::CacheError;
pub use catalog::CatalogError;
pub use config::ConfigError;
pub use metadata::ProviderError;
pub use scan::ScanError;

pub use catalog::{MetadataCatalog, Resolution, SeriesPrompter};
pub use config::Config;
pub use episode::Episode;
pub use format::DEFAULT_FORMAT;
pub use metadata::{
    EpisodeRecord, MetadataProvider, ProviderKind, SeriesIdentity, create_provider,
};
pub use rename::{RenameEngine, RenameOutcome};

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Progress event emitted during a rename run
///
/// These events allow library users to track progress and provide feedback
/// while the batch is processed.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Run started
    Started { directory: PathBuf },

    /// Episode files found below the start path
    FilesFound { count: usize },

    /// Processing a specific file
    ProcessingFile {
        index: usize,
        total: usize,
        path: PathBuf,
    },

    /// The series for a file was resolved against the catalog
    SeriesResolved { path: PathBuf, series: String },

    /// No catalog identity could be found for a file's series guess
    SeriesUnresolved { path: PathBuf, series: String },

    /// The file lives in a specials/extras directory and keeps its name
    SpecialSkipped { path: PathBuf, display: String },

    /// The file already carries its target name
    AlreadyNamed { path: PathBuf },

    /// Dry run: the name the file would receive
    Planned { path: PathBuf, new_name: String },

    /// A file (or one of its sidecars) was renamed or moved
    Renamed { from: PathBuf, to: PathBuf },

    /// A file was copied to its destination
    Copied { from: PathBuf, to: PathBuf },

    /// The destination exists and is a different file; nothing was touched
    Conflict { from: PathBuf, existing: PathBuf },

    /// Processing a single file failed; the run continues
    FileFailed { path: PathBuf, message: String },

    /// Non-fatal trouble worth surfacing (stale caches, persistence)
    Warning { message: String },

    /// Run complete
    Complete { processed: usize, renamed: usize },
}

/// Per-run knobs beyond the catalog itself.
#[derive(Debug, Clone)]
pub struct Options<'a> {
    /// Filename template applied to every episode
    pub rename_format: &'a str,
    /// Preferred metadata language; `None` keeps whatever the filename
    /// or the provider supplies
    pub language: Option<&'a str>,
    /// Move files into this directory instead of renaming in place
    pub target_dir: Option<&'a Path>,
    /// Copy instead of move when a target directory is set
    pub copy: bool,
    /// Report what would happen without touching any file
    pub dry_run: bool,
}

impl Default for Options<'_> {
    fn default() -> Self {
        Self {
            rename_format: DEFAULT_FORMAT,
            language: None,
            target_dir: None,
            copy: false,
            dry_run: false,
        }
    }
}

/// Totals for one rename run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files examined
    pub processed: usize,
    /// Files renamed or moved (primary files, not sidecars)
    pub renamed: usize,
    /// Files left alone because they already had their target name
    pub already_named: usize,
    /// Files skipped as specials or because no identity was found
    pub skipped: usize,
    /// Files refused because the destination existed
    pub conflicts: usize,
    /// Files that failed with an I/O or provider error
    pub failures: usize,
}

/// Top-level error type for MediaRenamer operations
#[derive(Debug, Error)]
pub enum RenamerError {
    /// Error while scanning for episode files
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    /// Error during catalog resolution
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Error during cache operations
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Error in the configuration file
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error talking to the metadata provider
    #[error("Metadata provider error: {0}")]
    Provider(#[from] ProviderError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Scans `path` for episode files, resolves each against the catalog and
/// renames it according to the options.
///
/// A failure on one file never aborts the batch: catalog errors degrade
/// to the parsed-only data, rename errors are reported per file, and the
/// run carries on. Progress events are emitted through the provided
/// callback, allowing library users to display status or remain silent.
pub fn rename_episodes<F>(
    path: &Path,
    catalog: &mut MetadataCatalog,
    prompter: &dyn SeriesPrompter,
    options: &Options,
    mut progress_callback: F,
) -> Result<RunSummary, RenamerError>
where
    F: FnMut(ProgressEvent),
{
    progress_callback(ProgressEvent::Started {
        directory: path.to_path_buf(),
    });

    let files = scan_for_episodes(path)?;
    progress_callback(ProgressEvent::FilesFound { count: files.len() });

    let mut summary = RunSummary::default();
    let engine = RenameEngine::new(options.rename_format);

    for (index, file) in files.iter().enumerate() {
        progress_callback(ProgressEvent::ProcessingFile {
            index,
            total: files.len(),
            path: file.clone(),
        });
        summary.processed += 1;

        let mut ep = parse_file(file);
        if let Some(language) = options.language {
            ep.set_language(language);
        }

        let resolution = {
            let mut warn = |message: String| progress_callback(ProgressEvent::Warning { message });
            catalog.resolve_and_fetch(&mut ep, prompter, &mut warn)
        };

        match resolution {
            Ok(Resolution::Resolved { identity, table }) => {
                progress_callback(ProgressEvent::SeriesResolved {
                    path: file.clone(),
                    series: identity.label(),
                });
                if !reconcile(&mut ep, &table) && ep.title().is_empty() {
                    if let Some(title) = generic_title(&ep) {
                        ep.set_title(&title);
                    }
                }
                resolve_entity_title(&mut ep);
            }
            Ok(Resolution::Special) => {
                progress_callback(ProgressEvent::SpecialSkipped {
                    path: file.clone(),
                    display: ep.to_display(options.rename_format),
                });
                summary.skipped += 1;
                continue;
            }
            Ok(Resolution::Unresolved) => {
                progress_callback(ProgressEvent::SeriesUnresolved {
                    path: file.clone(),
                    series: ep.series().to_string(),
                });
                summary.skipped += 1;
                continue;
            }
            Err(error) => {
                // The file keeps its parsed-only data; without an episode
                // table a rename would guess, so skip it.
                progress_callback(ProgressEvent::FileFailed {
                    path: file.clone(),
                    message: error.to_string(),
                });
                summary.failures += 1;
                continue;
            }
        }

        if !engine.needs_renaming(&ep) {
            progress_callback(ProgressEvent::AlreadyNamed { path: file.clone() });
            summary.already_named += 1;
            continue;
        }

        if options.dry_run {
            progress_callback(ProgressEvent::Planned {
                path: file.clone(),
                new_name: engine.rendered_name(&ep, file),
            });
            summary.renamed += 1;
            continue;
        }

        let outcomes = match options.target_dir {
            Some(target) => vec![engine.rename_and_move(&ep, target, options.copy)],
            None => engine.rename_in_place(&ep),
        };

        let mut renamed_primary = false;
        for outcome in outcomes {
            match outcome {
                RenameOutcome::Renamed {
                    source,
                    destination,
                } => {
                    renamed_primary = true;
                    progress_callback(ProgressEvent::Renamed {
                        from: source,
                        to: destination,
                    });
                }
                RenameOutcome::Copied {
                    source,
                    destination,
                } => {
                    renamed_primary = true;
                    progress_callback(ProgressEvent::Copied {
                        from: source,
                        to: destination,
                    });
                }
                RenameOutcome::Conflict {
                    source,
                    destination,
                } => {
                    summary.conflicts += 1;
                    progress_callback(ProgressEvent::Conflict {
                        from: source,
                        existing: destination,
                    });
                }
                RenameOutcome::Failed { source, error, .. } => {
                    summary.failures += 1;
                    progress_callback(ProgressEvent::FileFailed {
                        path: source,
                        message: error.to_string(),
                    });
                }
            }
        }
        if renamed_primary {
            summary.renamed += 1;
        }
    }

    progress_callback(ProgressEvent::Complete {
        processed: summary.processed,
        renamed: summary.renamed,
    });

    Ok(summary)
}
