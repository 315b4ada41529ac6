//! Filename parser
//!
//! Turns a file path into a best-effort [`Episode`]. Parsing never fails:
//! whatever could be extracted is returned, and files no pattern
//! recognizes fall back to a crude "text after the first dash" title
//! heuristic. The real episode identity is settled later against the
//! catalog.

use crate::episode::Episode;
use crate::patterns;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Directories that hold bonus material or per-season groupings rather
/// than naming the series itself.
const SKIPPED_DIR_PREFIXES: &[&str] = &["season", "series", "extra", "special", "bonus", "dvd"];

static FOUR_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([0-9]{4})").unwrap());

// Cleanup passes for the series text sitting in front of the matched
// pattern span: space out glued letter/digit runs, undo dotted acronym
// words, and drop separator noise.
static LETTER_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([a-z])([0-9])").unwrap());
static DIGIT_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([0-9])([a-z])").unwrap());
static DOTTED_PAIR_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([a-z]{2})\.([a-z])").unwrap());
static DOTTED_PAIR_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([a-z])\.([a-z]{2})").unwrap());

static BRACKET_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[0-9A-Za-z-]*\]").unwrap());

/// Parses a file path into an [`Episode`].
///
/// The walk up the directory tree supplies a provisional series name (and
/// possibly a year) before the filename patterns run; a successful pattern
/// match then overrides the series fields from the filename itself.
pub fn parse_file(path: &Path) -> Episode {
    let mut ep = Episode::new(path);

    derive_series_from_directories(path, &mut ep);

    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.to_string(),
        None => return ep,
    };

    let Some((_, caps)) = patterns::match_filename(&name) else {
        // No pattern matched. Best-effort: everything after the first
        // dash, minus the extension, becomes the title.
        let full = path.to_string_lossy();
        if let Some(dash) = full.find('-') {
            let tail = full[dash + 1..].trim();
            if let Some(dot) = tail.rfind('.') {
                ep.set_title(&tail[..dot]);
            }
        }
        return ep;
    };

    let absolute = caps.name("absep").map(|m| m.as_str()).unwrap_or("");
    let series_capture = caps.name("series").map(|m| m.as_str()).unwrap_or("");

    if !absolute.is_empty() && !series_capture.is_empty() {
        // Absolute-numbering branch: season/episode are left for the
        // reconciler to fill in from the absolute number.
        ep.set_series(series_capture);
        if let Ok(abs) = absolute.parse() {
            ep.set_alt_episode(abs);
        }
        return ep;
    }

    ep.set_series(series_capture);
    if let Some(title) = caps.name("title") {
        ep.set_title(title.as_str());
    }
    if let Some(season) = caps.name("season").filter(|m| !m.as_str().is_empty()) {
        if let Ok(season) = season.as_str().parse() {
            ep.set_season(season);
        }
    }
    if let Some(episode) = caps.name("episode").filter(|m| !m.as_str().is_empty()) {
        if let Ok(episode) = episode.as_str().parse() {
            ep.set_episode(episode);
        }
    }

    // Two-part episode convention carried in the secondary title group.
    match caps.name("title2").map(|m| m.as_str()) {
        Some("1_2") => ep.set_title(&format!("{}(1)", ep.title())),
        Some("2_2") => ep.set_title(&format!("{}(2)", ep.title())),
        _ => {}
    }

    // Re-derive a cleaner series name from the raw filename prefix in
    // front of the matched span. The pattern capture is kept as the
    // primary name; the cleaned prefix becomes the alternate candidate.
    let span_start = caps.get(0).map(|m| m.start()).unwrap_or(0);
    if span_start > 0 {
        let prefix = name.get(..span_start - 1).unwrap_or("");
        ep.set_alt_series(&clean_series_prefix(prefix));
    }
    if ep.series().is_empty() {
        let alt = ep.alt_series().to_string();
        ep.set_series(&alt);
    }

    ep
}

/// Walks up from the file's directory, skipping season/bonus grouping
/// directories, and records the first real ancestor as a provisional
/// series name. A 4-digit token no later than the current year is split
/// off as the first-aired year.
fn derive_series_from_directories(path: &Path, ep: &mut Episode) {
    let mut dir = path.parent();
    while let Some(current) = dir {
        let Some(name) = current.file_name().and_then(|n| n.to_str()) else {
            return;
        };
        let lower = name.to_lowercase();
        if SKIPPED_DIR_PREFIXES.iter().any(|p| lower.starts_with(p)) {
            dir = current.parent();
            continue;
        }

        ep.set_series(name);
        let token = FOUR_DIGITS.find(ep.series()).map(|m| m.as_str().to_string());
        if let Some(token) = token {
            if let Ok(year) = token.parse::<u32>() {
                if year <= current_year() {
                    ep.year = year;
                    let stripped = ep.series().replacen(&token, "", 1);
                    ep.set_series(&stripped);
                }
            }
        }
        let cleaned = ep.series().replace("()", "");
        ep.set_series(cleaned.trim());
        return;
    }
}

fn current_year() -> u32 {
    time::OffsetDateTime::now_utc().year() as u32
}

/// Cleans the raw filename prefix in front of a pattern match into a
/// human-readable series name.
fn clean_series_prefix(prefix: &str) -> String {
    let mut series = LETTER_DIGIT.replace_all(prefix, "$1 $2").into_owned();
    series = DIGIT_LETTER.replace_all(&series, "$1 $2").into_owned();
    series = DOTTED_PAIR_TAIL.replace_all(&series, "$1 $2").into_owned();
    series = DOTTED_PAIR_HEAD.replace_all(&series, "$1 $2").into_owned();
    series = series.replace('_', " ");
    series = series.replace("  ", " ");
    series = series.replace(" - ", " ");
    series = series.replace(" -", " ");
    for bracket in ['[', ']', '(', ')'] {
        series = series.replace(bracket, "");
    }
    series.trim().to_string()
}

/// Degraded title heuristic for files whose table lookup produced
/// nothing: strip `[...]` release tags, drop the extension, turn dots and
/// underscores into spaces and keep the text after the last ` - `.
pub(crate) fn generic_title(ep: &Episode) -> Option<String> {
    let name = ep.filename().file_name()?.to_str()?;
    let mut bare = BRACKET_GROUP.replace_all(name, "").into_owned();
    bare = bare.replace(ep.extension_str(), "");
    bare = bare.replace('.', " ").replace('_', " ");
    let title = match bare.rfind(" - ") {
        Some(idx) => bare[idx + 3..].trim().to_string(),
        None => bare.trim().to_string(),
    };
    if title.is_empty() { None } else { Some(title) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_canonical_filename() {
        let ep = parse_file(Path::new("/tv/Show - S01E02 - Title.mkv"));
        assert_eq!(ep.series(), "Show");
        assert_eq!(ep.season(), 1);
        assert_eq!(ep.episode(), 2);
        assert_eq!(ep.title(), "Title");
        assert_eq!(ep.episodes(), &[2]);
    }

    #[test]
    fn test_absolute_numbering_defers_season() {
        let ep = parse_file(Path::new("/tv/Naruto - 113.mkv"));
        assert_eq!(ep.series(), "Naruto");
        assert_eq!(ep.alt_episode(), 113);
        assert_eq!(ep.season(), 0);
        assert_eq!(ep.episode(), 0);
    }

    #[test]
    fn test_directory_supplies_year() {
        let ep = parse_file(Path::new("/tv/Castle (2009)/Season 1/no pattern here"));
        assert_eq!(ep.year, 2009);
        assert_eq!(ep.series(), "Castle");
    }

    #[test]
    fn test_directory_year_in_future_is_kept_as_text() {
        let ep = parse_file(Path::new("/tv/Space 3000/Season 1/no pattern here"));
        assert_eq!(ep.year, 0);
        assert_eq!(ep.series(), "Space 3000");
    }

    #[test]
    fn test_directory_walk_skips_grouping_dirs() {
        let ep = parse_file(Path::new("/tv/The Wire/Season 2/DVD 1/file with no match"));
        assert_eq!(ep.series(), "The Wire");
    }

    #[test]
    fn test_fallback_title_after_dash() {
        let ep = parse_file(Path::new("/tv/Somewhere/unparsed - The Lost Tape.mkv"));
        assert_eq!(ep.season(), 0);
        assert_eq!(ep.episode(), 0);
        assert_eq!(ep.title(), "The Lost Tape");
    }

    #[test]
    fn test_two_part_marker() {
        let ep = parse_file(Path::new(
            "/tv/Show (1_2) - (Part One) - 2009-03-14 - 1.ts",
        ));
        assert_eq!(ep.title(), "Part One(1)");
    }

    #[test]
    fn test_clean_series_prefix() {
        assert_eq!(clean_series_prefix("Stargate.SG1"), "Stargate SG 1");
        assert_eq!(clean_series_prefix("the_big_bang_theory"), "the big bang theory");
        assert_eq!(clean_series_prefix("[grp] Show"), "grp Show");
    }

    #[test]
    fn test_generic_title() {
        let ep = Episode::new("/tv/[grp] Show - 04 - The_One.mkv");
        assert_eq!(generic_title(&ep).as_deref(), Some("The One"));
    }
}
