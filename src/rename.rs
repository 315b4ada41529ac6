//! Rename engine
//!
//! Decides whether a file needs renaming, renames it in place together
//! with its companion files (subtitle/metadata/thumbnail siblings sharing
//! the base name), or relocates it to a target directory. A destination
//! that already exists under a different path is refused and surfaced as
//! a conflict; IO failures are reported per file and never abort the
//! batch.

use crate::episode::Episode;
use crate::format;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Companion extensions renamed in lockstep with the primary file.
const COMPANION_EXTENSIONS: &[&str] = &[".my", ".edl", ".properties", ".jpg"];

/// Result of one attempted file operation.
#[derive(Debug)]
pub enum RenameOutcome {
    /// File was renamed (or moved) to the destination
    Renamed { source: PathBuf, destination: PathBuf },
    /// File was copied to the destination
    Copied { source: PathBuf, destination: PathBuf },
    /// Destination already exists under a different path; nothing moved
    Conflict { source: PathBuf, destination: PathBuf },
    /// The move/copy itself failed
    Failed {
        source: PathBuf,
        destination: PathBuf,
        error: io::Error,
    },
}

/// Renders names and performs collision-safe renames for one template.
pub struct RenameEngine<'a> {
    rename_format: &'a str,
}

impl<'a> RenameEngine<'a> {
    pub fn new(rename_format: &'a str) -> Self {
        Self { rename_format }
    }

    /// The target filename for `file`, rendered with that file's own
    /// extension so companions keep theirs.
    pub fn rendered_name(&self, ep: &Episode, file: &Path) -> String {
        format::render(ep, extension_of(file), self.rename_format)
    }

    /// True iff the rendered name differs from the current filename
    /// component.
    pub fn needs_renaming(&self, ep: &Episode) -> bool {
        let current = ep
            .filename()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.rendered_name(ep, ep.filename()) != current
    }

    /// Renames the episode's file and any existing companion files in
    /// place. Returns one outcome per touched file; an episode that needs
    /// no renaming yields an empty list.
    pub fn rename_in_place(&self, ep: &Episode) -> Vec<RenameOutcome> {
        if !self.needs_renaming(ep) {
            return Vec::new();
        }

        let mut outcomes = Vec::new();
        for file in companion_files(ep.filename()) {
            if !file.exists() {
                continue;
            }
            let destination = match file.parent() {
                Some(dir) => dir.join(self.rendered_name(ep, &file)),
                None => PathBuf::from(self.rendered_name(ep, &file)),
            };
            outcomes.push(move_file(&file, &destination, false));
        }
        outcomes
    }

    /// Relocates the primary file into `target_dir` under its rendered
    /// name, creating the directory if needed. `copy` leaves the source
    /// in place.
    pub fn rename_and_move(&self, ep: &Episode, target_dir: &Path, copy: bool) -> RenameOutcome {
        let source = ep.filename().to_path_buf();
        let destination = target_dir.join(self.rendered_name(ep, &source));

        if destination.exists() && !same_path(&source, &destination) {
            return RenameOutcome::Conflict {
                source,
                destination,
            };
        }

        if let Err(error) = fs::create_dir_all(target_dir) {
            return RenameOutcome::Failed {
                source,
                destination,
                error,
            };
        }

        move_file(&source, &destination, copy)
    }
}

/// The fixed companion-file set sharing the primary file's base name:
/// the primary itself, `.my`/`.edl`/`.properties`/`.jpg` siblings, and a
/// `<original-extension>.properties` sibling.
fn companion_files(primary: &Path) -> Vec<PathBuf> {
    let mut files = vec![primary.to_path_buf()];

    let base = base_path(primary);
    for ext in COMPANION_EXTENSIONS {
        files.push(PathBuf::from(format!("{}{}", base.display(), ext)));
    }

    let mut with_orig_ext = primary.as_os_str().to_os_string();
    with_orig_ext.push(".properties");
    // Processed right after the plain `.properties` sibling.
    files.insert(4, PathBuf::from(with_orig_ext));

    files
}

/// Path minus the final extension.
fn base_path(path: &Path) -> PathBuf {
    match (path.parent(), path.file_stem()) {
        (Some(dir), Some(stem)) => dir.join(stem),
        (None, Some(stem)) => PathBuf::from(stem),
        _ => path.to_path_buf(),
    }
}

/// Extension including the leading dot, `""` if there is none.
fn extension_of(path: &Path) -> &str {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.rfind('.').map(|i| &n[i..]))
        .unwrap_or("")
}

/// Case-insensitive path identity, the collision policy's notion of
/// "same file".
fn same_path(a: &Path, b: &Path) -> bool {
    a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
}

fn move_file(source: &Path, destination: &Path, copy: bool) -> RenameOutcome {
    if destination.exists() && !same_path(source, destination) {
        return RenameOutcome::Conflict {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
        };
    }

    let result = if copy {
        fs::copy(source, destination).map(|_| ())
    } else {
        fs::rename(source, destination)
    };

    match result {
        Ok(()) => {
            if copy {
                RenameOutcome::Copied {
                    source: source.to_path_buf(),
                    destination: destination.to_path_buf(),
                }
            } else {
                RenameOutcome::Renamed {
                    source: source.to_path_buf(),
                    destination: destination.to_path_buf(),
                }
            }
        }
        Err(error) => RenameOutcome::Failed {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            error,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::DEFAULT_FORMAT;
    use std::fs::File;

    fn episode_for(path: &Path) -> Episode {
        let mut ep = Episode::new(path);
        ep.set_series("Show");
        ep.set_season(1);
        ep.set_episode(2);
        ep.set_title("Title");
        ep
    }

    #[test]
    fn test_needs_renaming() {
        let engine = RenameEngine::new(DEFAULT_FORMAT);

        let ep = episode_for(Path::new("/tv/Show.S01E02.mkv"));
        assert!(engine.needs_renaming(&ep));

        let ep = episode_for(Path::new("/tv/Show - S01E02 - Title.mkv"));
        assert!(!engine.needs_renaming(&ep));
    }

    #[test]
    fn test_rename_in_place_with_companions() {
        let dir = tempfile::tempdir().unwrap();
        let primary = dir.path().join("Show.S01E02.mkv");
        let subtitle = dir.path().join("Show.S01E02.edl");
        let thumb = dir.path().join("Show.S01E02.jpg");
        File::create(&primary).unwrap();
        File::create(&subtitle).unwrap();
        File::create(&thumb).unwrap();

        let engine = RenameEngine::new(DEFAULT_FORMAT);
        let outcomes = engine.rename_in_place(&episode_for(&primary));

        // Primary plus the two existing companions.
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes
            .iter()
            .all(|o| matches!(o, RenameOutcome::Renamed { .. })));
        assert!(dir.path().join("Show - S01E02 - Title.mkv").exists());
        assert!(dir.path().join("Show - S01E02 - Title.edl").exists());
        assert!(dir.path().join("Show - S01E02 - Title.jpg").exists());
        assert!(!primary.exists());
    }

    #[test]
    fn test_rename_refused_on_collision() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("Show.S01E02.mkv");
        let occupied = dir.path().join("Show - S01E02 - Title.mkv");
        File::create(&source).unwrap();
        File::create(&occupied).unwrap();

        let engine = RenameEngine::new(DEFAULT_FORMAT);
        let outcomes = engine.rename_in_place(&episode_for(&source));

        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0], RenameOutcome::Conflict { .. }));
        // Nothing moved.
        assert!(source.exists());
    }

    #[test]
    fn test_rename_and_move_creates_target_dir() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("Show.S01E02.mkv");
        File::create(&source).unwrap();
        let target = dir.path().join("sorted").join("Show");

        let engine = RenameEngine::new(DEFAULT_FORMAT);
        let outcome = engine.rename_and_move(&episode_for(&source), &target, false);

        assert!(matches!(outcome, RenameOutcome::Renamed { .. }));
        assert!(target.join("Show - S01E02 - Title.mkv").exists());
        assert!(!source.exists());
    }

    #[test]
    fn test_move_with_copy_keeps_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("Show.S01E02.mkv");
        File::create(&source).unwrap();
        let target = dir.path().join("out");

        let engine = RenameEngine::new(DEFAULT_FORMAT);
        let outcome = engine.rename_and_move(&episode_for(&source), &target, true);

        assert!(matches!(outcome, RenameOutcome::Copied { .. }));
        assert!(source.exists());
        assert!(target.join("Show - S01E02 - Title.mkv").exists());
    }

    #[test]
    fn test_move_conflict_refused() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("Show.S01E02.mkv");
        File::create(&source).unwrap();
        let target = dir.path().join("out");
        fs::create_dir_all(&target).unwrap();
        File::create(target.join("Show - S01E02 - Title.mkv")).unwrap();

        let engine = RenameEngine::new(DEFAULT_FORMAT);
        let outcome = engine.rename_and_move(&episode_for(&source), &target, false);

        assert!(matches!(outcome, RenameOutcome::Conflict { .. }));
        assert!(source.exists());
    }
}
