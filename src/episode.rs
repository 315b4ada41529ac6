//! Episode data model
//!
//! An [`Episode`] accumulates everything that is known about a single video
//! file as it moves through the pipeline: parsed filename fields first,
//! then catalog-resolved series and title information. String fields are
//! sanitized on every assignment so that later overwrites (e.g. a title
//! copied from a remote record) can never reintroduce path-illegal
//! characters.

use std::path::{Path, PathBuf};

/// Characters that are not allowed in file names on common filesystems.
const BAD_PATH_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Path segments whose contents are bonus material rather than regular
/// episodes.
const SPECIAL_SEGMENTS: &[&str] = &["special", "extra", "bonus"];

/// Replaces path-illegal characters with `.`.
fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| if BAD_PATH_CHARS.contains(&c) { '.' } else { c })
        .collect()
}

/// A single video file and the episode identity extracted for it.
///
/// Construction fixes the filename; all other fields are filled in by the
/// parser, the catalog and the reconciler through the sanitizing setters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Episode {
    filename: PathBuf,
    series: String,
    alt_series: String,
    title: String,
    language: String,
    /// First-aired year taken from the directory name, 0 = unknown.
    pub year: u32,
    season: u32,
    episode: u32,
    alt_episode: u32,
    episodes: Vec<u32>,
}

impl Episode {
    /// Creates an empty episode for the given file.
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            series: String::new(),
            alt_series: String::new(),
            title: String::new(),
            language: String::new(),
            year: 0,
            season: 0,
            episode: 0,
            alt_episode: 0,
            episodes: vec![0],
        }
    }

    /// The file this episode was constructed from. Never changes.
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// Canonical series display name.
    pub fn series(&self) -> &str {
        &self.series
    }

    /// Assigns the series name, replacing path-illegal characters with `.`.
    pub fn set_series(&mut self, value: &str) {
        self.series = sanitize(value);
    }

    /// Secondary series name candidate derived from the filename prefix.
    pub fn alt_series(&self) -> &str {
        &self.alt_series
    }

    pub fn set_alt_series(&mut self, value: &str) {
        self.alt_series = sanitize(value);
    }

    /// Episode title, trimmed and path-sanitized.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Assigns the title; sanitized and trimmed on every assignment.
    pub fn set_title(&mut self, value: &str) {
        self.title = sanitize(value).trim().to_string();
    }

    /// Provider language code, e.g. `en`.
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn set_language(&mut self, value: &str) {
        self.language = value.to_string();
    }

    /// Season number, 0 = unknown or special.
    pub fn season(&self) -> u32 {
        self.season
    }

    pub fn set_season(&mut self, value: u32) {
        self.season = value;
    }

    /// Primary episode number within the season.
    pub fn episode(&self) -> u32 {
        self.episode
    }

    /// Assigns the episode number. The first assignment also seeds the
    /// multi-episode list.
    pub fn set_episode(&mut self, value: u32) {
        self.episode = value;
        if self.episodes[0] == 0 {
            self.episodes[0] = value;
        }
    }

    /// Absolute episode number across all seasons, 0 = unset.
    pub fn alt_episode(&self) -> u32 {
        self.alt_episode
    }

    pub fn set_alt_episode(&mut self, value: u32) {
        self.alt_episode = value;
    }

    /// All episode numbers covered by this file; length > 1 for
    /// multi-part episodes.
    pub fn episodes(&self) -> &[u32] {
        &self.episodes
    }

    pub fn set_episodes(&mut self, value: Vec<u32>) {
        if !value.is_empty() {
            self.episodes = value;
        }
    }

    /// True if the file lives below a `special`, `extra` or `bonus`
    /// directory (any case, either path-separator style). Specials are
    /// never resolved against the catalog.
    pub fn special(&self) -> bool {
        let lower = self.filename.to_string_lossy().to_lowercase();
        SPECIAL_SEGMENTS.iter().any(|segment| {
            lower.contains(&format!("/{segment}")) || lower.contains(&format!("\\{segment}"))
        })
    }

    /// One-line description used by listings and dry-run output.
    pub fn to_display(&self, rename_format: &str) -> String {
        let mut out = String::new();
        if self.special() {
            out.push_str("SPECIAL: ");
        }
        out.push_str(&crate::format::render(self, self.extension_str(), rename_format));
        out.push_str(&format!(" ({})", self.filename.display()));
        out
    }

    /// The file's extension including the leading dot, or `""`.
    pub fn extension_str(&self) -> &str {
        self.filename
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.rfind('.').map(|i| &n[i..]))
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_on_assignment() {
        let mut ep = Episode::new("/tv/show.mkv");
        ep.set_series("What/If: The*Series");
        assert_eq!(ep.series(), "What.If. The.Series");

        // Later overwrites must re-sanitize as well.
        ep.set_series("A\\B");
        assert_eq!(ep.series(), "A.B");
    }

    #[test]
    fn test_title_trimmed() {
        let mut ep = Episode::new("/tv/show.mkv");
        ep.set_title("  Pilot? ");
        assert_eq!(ep.title(), "Pilot.");
    }

    #[test]
    fn test_episode_seeds_episodes_list() {
        let mut ep = Episode::new("/tv/show.mkv");
        assert_eq!(ep.episodes(), &[0]);
        ep.set_episode(4);
        assert_eq!(ep.episodes(), &[4]);
        // First entry mirrors only the first assignment.
        ep.set_episode(7);
        assert_eq!(ep.episodes(), &[4]);
    }

    #[test]
    fn test_special_detection() {
        let ep = Episode::new(r"D:\TV\Show\Extras\behind-the-scenes.mkv");
        assert!(ep.special());

        let ep = Episode::new("/tv/show/Specials/gag reel.mkv");
        assert!(ep.special());

        let ep = Episode::new("/tv/show/Season 1/ep.mkv");
        assert!(!ep.special());
    }

    #[test]
    fn test_extension_str() {
        let ep = Episode::new("/tv/Show - S01E02 - Title.mkv");
        assert_eq!(ep.extension_str(), ".mkv");

        let ep = Episode::new("/tv/noext");
        assert_eq!(ep.extension_str(), "");
    }
}
