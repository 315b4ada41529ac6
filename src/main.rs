use clap::Parser;
use dialoguer::{Input, Select};
use media_renamer::{
    Config, Episode, MetadataCatalog, Options, ProgressEvent, ProviderKind, SeriesIdentity,
    SeriesPrompter, create_provider, rename_episodes,
};
use std::path::PathBuf;
use std::process;

/// Parses TV episode filenames, matches them against an online episode
/// catalog and renames them into a uniform scheme.
#[derive(Parser, Debug)]
#[command(name = "media-renamer", version, about)]
struct Cli {
    /// Directory (or single file) to process
    path: PathBuf,

    /// Filename template, e.g. "<series> - S<season2>E<episode2> - <title>"
    #[arg(short, long)]
    format: Option<String>,

    /// Metadata provider to consult
    #[arg(short, long, value_enum)]
    provider: Option<ProviderKind>,

    /// Preferred metadata language code (e.g. en, de)
    #[arg(short, long)]
    language: Option<String>,

    /// Move renamed files into this directory instead of renaming in place
    #[arg(short, long)]
    target_dir: Option<PathBuf>,

    /// Copy instead of move (only with --target-dir)
    #[arg(long, requires = "target_dir")]
    copy: bool,

    /// Show what would be renamed without touching any file
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Never prompt; ambiguous or unknown series are skipped
    #[arg(long)]
    non_interactive: bool,
}

/// Interactive disambiguation via terminal prompts.
struct CliPrompter;

impl SeriesPrompter for CliPrompter {
    fn choose_series(
        &self,
        episode: &Episode,
        candidates: &[SeriesIdentity],
    ) -> Option<SeriesIdentity> {
        println!(
            "Multiple series match '{}' ({})",
            episode.series(),
            episode.filename().display()
        );
        let mut items: Vec<String> = candidates.iter().map(|c| c.label()).collect();
        items.push("None of these".to_string());

        let selection = Select::new()
            .with_prompt("Pick the series")
            .items(&items)
            .default(0)
            .interact_opt()
            .ok()
            .flatten()?;
        candidates.get(selection).cloned()
    }

    fn corrected_name(&self, episode: &Episode) -> Option<String> {
        println!(
            "No series found for '{}' ({})",
            episode.series(),
            episode.filename().display()
        );
        let input: String = Input::new()
            .with_prompt("Corrected series name (empty to skip)")
            .allow_empty(true)
            .interact_text()
            .ok()?;
        let input = input.trim();
        if input.is_empty() {
            None
        } else {
            Some(input.to_string())
        }
    }
}

/// Declines every prompt; used with --non-interactive.
struct SilentPrompter;

impl SeriesPrompter for SilentPrompter {
    fn choose_series(
        &self,
        _episode: &Episode,
        _candidates: &[SeriesIdentity],
    ) -> Option<SeriesIdentity> {
        None
    }

    fn corrected_name(&self, _episode: &Episode) -> Option<String> {
        None
    }
}

/// Handles progress events and prints formatted output to stdout
fn handle_progress_event(event: ProgressEvent) {
    match event {
        ProgressEvent::Started { directory } => {
            println!("Scanning {} for episode files...", directory.display());
        }
        ProgressEvent::FilesFound { count } => {
            if count == 0 {
                println!("No episode files found.");
            } else {
                println!("Found {} episode file(s)\n", count);
            }
        }
        ProgressEvent::ProcessingFile { index, total, path } => {
            println!("[{}/{}] {}", index + 1, total, path.display());
        }
        ProgressEvent::SeriesResolved { series, .. } => {
            println!("  Series: {}", series);
        }
        ProgressEvent::SeriesUnresolved { series, .. } => {
            println!("  No catalog entry for '{}'; skipping", series);
        }
        ProgressEvent::SpecialSkipped { display, .. } => {
            println!("  {}; bonus material keeps its name", display);
        }
        ProgressEvent::AlreadyNamed { .. } => {
            println!("  Already named correctly");
        }
        ProgressEvent::Planned { new_name, .. } => {
            println!("  Would rename to: {}", new_name);
        }
        ProgressEvent::Renamed { to, .. } => {
            println!("  Renamed to: {}", to.display());
        }
        ProgressEvent::Copied { to, .. } => {
            println!("  Copied to: {}", to.display());
        }
        ProgressEvent::Conflict { existing, .. } => {
            println!(
                "  Skipped: {} already exists and is a different file",
                existing.display()
            );
        }
        ProgressEvent::FileFailed { message, .. } => {
            eprintln!("  Error: {}", message);
        }
        ProgressEvent::Warning { message } => {
            eprintln!("  Warning: {}", message);
        }
        ProgressEvent::Complete { processed, renamed } => {
            println!(
                "\nDone. Processed {} file(s), renamed {}.",
                processed, renamed
            );
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if !cli.path.exists() {
        eprintln!("Error: Path does not exist: {}", cli.path.display());
        process::exit(1);
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };

    // Command-line flags win over the config file.
    let provider_kind = cli
        .provider
        .or_else(|| config.provider.as_deref().and_then(ProviderKind::from_name))
        .unwrap_or_default();
    let rename_format = cli
        .format
        .as_deref()
        .or(config.rename_format.as_deref())
        .unwrap_or(media_renamer::DEFAULT_FORMAT);
    let language = cli.language.as_deref().or(config.language.as_deref());

    let provider = match create_provider(provider_kind, config.tmdb_access_token.clone()) {
        Ok(provider) => provider,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let mut catalog = match MetadataCatalog::open(provider) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Error opening metadata caches: {}", e);
            process::exit(1);
        }
    };

    let prompter: Box<dyn SeriesPrompter> = if cli.non_interactive {
        Box::new(SilentPrompter)
    } else {
        Box::new(CliPrompter)
    };

    let options = Options {
        rename_format,
        language,
        target_dir: cli.target_dir.as_deref(),
        copy: cli.copy,
        dry_run: cli.dry_run,
    };

    match rename_episodes(
        &cli.path,
        &mut catalog,
        prompter.as_ref(),
        &options,
        handle_progress_event,
    ) {
        Ok(summary) => {
            if summary.conflicts > 0 || summary.failures > 0 {
                eprintln!(
                    "{} conflict(s), {} failure(s); the files involved were left untouched.",
                    summary.conflicts, summary.failures
                );
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("\nError: {}", e);
            process::exit(1);
        }
    }
}
