//! Rename template rendering
//!
//! Renders the final filename from a template and the resolved episode
//! fields. Multi-episode files join their numbers with `-`; the
//! `<title:suffix>` form renders its suffix only when a title exists.

use crate::episode::Episode;
use regex::Regex;
use std::sync::LazyLock;

/// Built-in template used when no format is configured.
pub const DEFAULT_FORMAT: &str = "<series> - S<season2>E<episode2> - <title>";

static TITLE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<title:([^>]*)>").unwrap());

/// Renders the target filename for an episode.
///
/// `extension` is appended verbatim (pass it with the leading dot, or
/// empty for extensionless files).
pub fn render(ep: &Episode, extension: &str, format: &str) -> String {
    let episodes_plain = join_episodes(ep.episodes(), false);
    let episodes_padded = join_episodes(ep.episodes(), true);

    let mut name = format.to_string();
    name = name.replace("<series>", ep.series());
    name = name.replace("<season>", &ep.season().to_string());
    name = name.replace("<season2>", &format!("{:02}", ep.season()));
    name = name.replace("<episode>", &episodes_plain);
    name = name.replace("<episode2>", &episodes_padded);

    if ep.title().is_empty() {
        name = name.replace("<title>", "");
        name = TITLE_SUFFIX.replace_all(&name, "").into_owned();
    } else {
        name = name.replace("<title>", ep.title());
        name = TITLE_SUFFIX.replace_all(&name, "$1").into_owned();
    }

    name.push_str(extension);
    name
}

fn join_episodes(episodes: &[u32], padded: bool) -> String {
    episodes
        .iter()
        .map(|e| {
            if padded {
                format!("{e:02}")
            } else {
                e.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode() -> Episode {
        let mut ep = Episode::new("/tv/Show.S01E02.mkv");
        ep.set_series("Show");
        ep.set_season(1);
        ep.set_episode(2);
        ep.set_title("Title");
        ep
    }

    #[test]
    fn test_default_format() {
        let name = render(&episode(), ".mkv", DEFAULT_FORMAT);
        assert_eq!(name, "Show - S01E02 - Title.mkv");
    }

    #[test]
    fn test_zero_padding() {
        let mut ep = episode();
        ep.set_season(3);
        assert_eq!(render(&ep, "", "<season2>"), "03");
        ep.set_season(11);
        assert_eq!(render(&ep, "", "<season2>"), "11");
        assert_eq!(render(&ep, "", "<season>"), "11");
    }

    #[test]
    fn test_multi_episode_join() {
        let mut ep = episode();
        ep.set_episodes(vec![3, 4]);
        assert_eq!(render(&ep, "", "<episode>"), "3-4");
        assert_eq!(render(&ep, "", "<episode2>"), "03-04");
    }

    #[test]
    fn test_title_suffix_with_title() {
        let name = render(&episode(), ".avi", "<series><title: - ><title>");
        assert_eq!(name, "Show - Title.avi");
    }

    #[test]
    fn test_title_suffix_dropped_without_title() {
        let mut ep = episode();
        ep.set_title("");
        let name = render(&ep, ".avi", "<series><title: - ><title>");
        assert_eq!(name, "Show.avi");
    }

    #[test]
    fn test_extension_appended_verbatim() {
        let name = render(&episode(), ".MKV", "<series>");
        assert_eq!(name, "Show.MKV");
    }
}
