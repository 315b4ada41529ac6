//! Ordered filename pattern library
//!
//! The patterns are tried strictly in the order listed here and the first
//! hit wins. They are prioritized by design, not by specificity: the
//! date-stamped recording shapes come first, canonical `S##E##` shapes
//! next, then absolute-numbering shapes, and the parenthesised-title shape
//! last. Reordering them changes which shape claims ambiguous names, so
//! the order is part of the contract.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Release tokens that are stripped before the validity pre-check because
/// they tend to confuse the episode-number groups.
const NOISE_TOKENS: &[&str] = &["1080p", "720p", "x264", "h.264"];

static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // 1: series (title2) - (title) - recorddate - count
        r"(?i)(?P<series>[^-|\n\r]*\b) \((?P<title2>[^-|\n\r]*\b)\)\s*-\s*\((?P<title>[^\n\r]*\b)\)\s*-\s*(?P<recorddate>(19|20)[0-9]{2}[- /.](0[1-9]|1[012])[- /.](0[1-9]|[12][0-9]|3[01]))\s*-\s*(?P<count>.)",
        // 2: series - (title) - recorddate - count
        r"(?i)(?P<series>[^-|\n\r]*\b)\s*-\s*\((?P<title>[^\n\r]*\b)\)\s*-\s*(?P<recorddate>(19|20)[0-9]{2}[- /.](0[1-9]|1[012])[- /.](0[1-9]|[12][0-9]|3[01]))\s*-\s*(?P<count>.)",
        // 3: series - S##E## - title.ext
        r"(?i)(?P<series>[^-|\n\r]*\b)\s*-\s*S(?P<season>\d*)E(?P<episode>\d*)\s*-\s*(?P<title>[^\n\r]*)\.(?P<ext>\w*)",
        // 4: series - S##E## .ext
        r"(?i)(?P<series>[^-|\n\r]*\b)\s*-\s*S(?P<season>\d*)E(?P<episode>\d*)\s*\.(?P<ext>\w*)",
        // 5: series - title-*
        r"(?i)(?P<series>[^-|\n\r]*\b) *- *(?P<title>[^-|\n\r]*\b)-.*",
        // 6: series - absoluteEpisodeId - title .ext
        r"(?i)(?P<series>[^-|\n\r]*\b)\s*-\s*(?P<absep>\d*)\s*-\s*(?P<title>[^\n\r]*\b) *\.(?P<ext>\w*)",
        // 7: series - absoluteEpisodeId.ext
        r"(?i)(?P<series>[^-|\n\r]*\b)\s*-\s*(?P<absep>\d*)\.(?P<ext>\w*)",
        // 8: series - absoluteEpisodeId-extra.ext
        r"(?i)(?P<series>[^-|\n\r]*\b)\s*-\s*(?P<absep>\d*)-\d*\.(?P<ext>\w*)",
        // 9: series - (title).ext
        r"(?i)(?P<series>[^-|\n\r]*\b) *- *\((?P<title>[^\n\r]*\b)\)\.(?P<ext>\w*)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("filename pattern must compile"))
    .collect()
});

/// Runs the filename (never a full path) through the pattern list and
/// returns the first match along with its pattern index.
pub(crate) fn match_filename(name: &str) -> Option<(usize, Captures<'_>)> {
    PATTERNS
        .iter()
        .enumerate()
        .find_map(|(index, regex)| regex.captures(name).map(|caps| (index, caps)))
}

/// Reports whether the filename component of `name` looks like a TV
/// episode. Used as a cheap pre-filter before full parsing.
pub fn valid_episode_file(name: &str) -> bool {
    let mut bare = std::path::Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    for token in NOISE_TOKENS {
        bare = bare.replace(token, "");
    }
    match_filename(&bare).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_season_episode_uses_pattern_3() {
        let (index, caps) = match_filename("Show - S01E02 - Title.mkv").unwrap();
        assert_eq!(index, 2);
        assert_eq!(&caps["series"], "Show");
        assert_eq!(&caps["season"], "01");
        assert_eq!(&caps["episode"], "02");
        assert_eq!(&caps["title"], "Title");
        assert_eq!(&caps["ext"], "mkv");
    }

    #[test]
    fn test_season_episode_without_title() {
        let (index, caps) = match_filename("Show - S02E11 .avi").unwrap();
        assert_eq!(index, 3);
        assert_eq!(&caps["season"], "02");
        assert_eq!(&caps["episode"], "11");
    }

    #[test]
    fn test_absolute_episode_with_title() {
        let (index, caps) = match_filename("Show - 113 - Some Title .mkv").unwrap();
        assert_eq!(index, 5);
        assert_eq!(&caps["absep"], "113");
        assert_eq!(&caps["title"], "Some Title");
    }

    #[test]
    fn test_absolute_episode_bare() {
        let (index, caps) = match_filename("Show - 113.mkv").unwrap();
        assert_eq!(index, 6);
        assert_eq!(&caps["absep"], "113");
    }

    #[test]
    fn test_recorded_show_with_date() {
        let (index, caps) =
            match_filename("Show - (Pilot) - 2009-03-14 - 1.ts").unwrap();
        assert_eq!(index, 1);
        assert_eq!(&caps["title"], "Pilot");
        assert_eq!(&caps["recorddate"], "2009-03-14");
    }

    #[test]
    fn test_parenthesised_title_only() {
        let (index, caps) = match_filename("Show - (Pilot).mkv").unwrap();
        assert_eq!(index, 8);
        assert_eq!(&caps["title"], "Pilot");
    }

    #[test]
    fn test_priority_season_episode_beats_absolute() {
        // Matches both the S##E## shape and, read loosely, the absolute
        // shapes; the earlier-indexed pattern must claim it.
        let (index, _) = match_filename("Show - S01E02 - 113.mkv").unwrap();
        assert_eq!(index, 2);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let (index, _) = match_filename("show - s03e07 - title.mkv").unwrap();
        assert_eq!(index, 2);
    }

    #[test]
    fn test_no_match() {
        assert!(match_filename("holiday video 2019.mp4").is_none());
    }

    #[test]
    fn test_valid_episode_file_strips_noise_tokens() {
        assert!(valid_episode_file("/tv/Show - S01E02 - Title 1080p.mkv"));
        assert!(valid_episode_file("Show - S01E02 - Title x264.mkv"));
        assert!(!valid_episode_file("somefile"));
    }
}
