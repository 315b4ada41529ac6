//! Title reconciliation
//!
//! Decides which remote episode record a locally parsed [`Episode`] refers
//! to: by exact (season, episode) pair when the filename carried no title,
//! by fuzzy title equality, or by absolute episode number. The fuzzy
//! matcher is tuned to the shape of real provider feeds; its asymmetric
//! underscore and "the"-prefix handling is intentional and must not be
//! "fixed" into a symmetric rule.

use crate::episode::Episode;
use crate::metadata::EpisodeRecord;
use regex::Regex;
use std::sync::LazyLock;

static AKA_PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(aka([^)]*)\)").unwrap());
static HTML_ENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&#([0-9]+);").unwrap());
static REAL_TEXT_PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\(([-a-zA-Z0-9.,%:;!?'"+() ]{5,})\)"#).unwrap());

/// Walks the remote episode table in provider order and updates the
/// episode in place when a record matches. Returns `true` on the first
/// accepted record; `false` leaves all parsed fields untouched.
pub(crate) fn reconcile(ep: &mut Episode, table: &[EpisodeRecord]) -> bool {
    for record in table {
        let mut remote_title = record.title.clone();

        // Multi-part local episodes drop the remote part-marker
        // parenthetical so the shared base title can match.
        if ep.episodes().len() > 1 && remote_title.ends_with(')') {
            if let Some(open) = remote_title.rfind('(') {
                remote_title.truncate(open);
            }
        }
        remote_title = remote_title.replace(".i.", "");
        if remote_title.find("aka").is_some_and(|i| i > 0) {
            remote_title = AKA_PARENTHETICAL.replace_all(&remote_title, "").into_owned();
        }

        // No local title: the (season, episode) pair decides, as long as
        // the filename did not use absolute numbering.
        if ep.title().is_empty()
            && ep.episode() == record.episode
            && ep.season() == record.season
            && ep.alt_episode() == 0
        {
            ep.set_title(&sanitize_remote_title(&remote_title));
            return true;
        }

        if check_title(ep.title(), &remote_title) {
            ep.set_title(&sanitize_remote_title(&remote_title));
            ep.set_episode(record.episode);
            ep.set_season(record.season);
            return true;
        }

        if ep.alt_episode() == record.absolute && ep.alt_episode() != 0 {
            ep.set_episode(record.episode);
            ep.set_title(&remote_title);
            ep.set_season(record.season);
            return true;
        }
    }
    false
}

/// Remote titles get `: * ? /` downgraded to `_` before assignment.
fn sanitize_remote_title(title: &str) -> String {
    title
        .replace(':', "_")
        .replace('*', "_")
        .replace('?', "_")
        .replace('/', "_")
}

/// Fuzzy equality between the locally guessed title and a remote title.
///
/// Both sides are collapsed (punctuation and whitespace stripped,
/// lowercased), with an asymmetry: the local side keeps underscores it
/// introduces for `-` and `'`, and remote underscores only survive when
/// the local side has some. Failed comparisons retry with `&`/`and`
/// substituted in both directions, and finally with a "the " prefix
/// stripped from the local side only; a remote title that itself starts
/// with "the" in that last step is an immediate mismatch.
pub(crate) fn check_title(local: &str, remote: &str) -> bool {
    if local.is_empty() || remote.is_empty() {
        return false;
    }

    if titles_equal(local, remote, false) {
        return true;
    }

    let local = if local.to_lowercase().starts_with("the") {
        if remote.to_lowercase().starts_with("the") {
            return false;
        }
        &local[3..]
    } else {
        local
    };

    titles_equal(local, remote, true)
}

/// One comparison round. The second round maps remote `-` and `'` to `_`
/// instead of dropping them (and keeps parentheses).
fn titles_equal(local: &str, remote: &str, dash_as_underscore: bool) -> bool {
    let collapsed_local = local
        .replace(' ', "")
        .replace('-', "_")
        .replace('\'', "_")
        .replace(',', "")
        .to_lowercase();

    let mut collapsed_remote = remote
        .replace(':', "_")
        .replace('*', "_")
        .replace(' ', "")
        .replace('?', "_")
        .replace('/', "_");
    if dash_as_underscore {
        collapsed_remote = collapsed_remote
            .replace('-', "_")
            .replace('\'', "_")
            .replace('!', "")
            .replace(',', "");
    } else {
        collapsed_remote = collapsed_remote
            .replace('-', "")
            .replace('\'', "")
            .replace('!', "")
            .replace(',', "")
            .replace('(', "")
            .replace(')', "");
    }
    let mut collapsed_remote = collapsed_remote.to_lowercase();

    // Remote underscores are only significant when the local side
    // actually contains one.
    if !collapsed_local.contains('_') {
        collapsed_remote = collapsed_remote.replace('_', "");
    }

    if collapsed_local != collapsed_remote {
        collapsed_remote = remote.replace(' ', "").replace('&', "and").to_lowercase();
    }
    if collapsed_local != collapsed_remote {
        collapsed_remote = remote.replace(' ', "").replace("and", "&").to_lowercase();
    }

    collapsed_local == collapsed_remote
}

/// Remote titles that collapsed to HTML entities sometimes carry the real
/// text in a trailing parenthetical; prefer that when present.
pub(crate) fn resolve_entity_title(ep: &mut Episode) {
    if !HTML_ENTITY.is_match(ep.title()) {
        return;
    }
    if let Some(caps) = REAL_TEXT_PARENTHETICAL.captures(ep.title()) {
        let real = caps[1].to_string();
        ep.set_title(&real);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(season: u32, episode: u32, absolute: u32, title: &str) -> EpisodeRecord {
        EpisodeRecord {
            season,
            episode,
            absolute,
            title: title.to_string(),
        }
    }

    #[test]
    fn test_check_title_and_ampersand() {
        assert!(check_title("Beauty and the Beast", "Beauty & the Beast"));
        assert!(check_title("Beauty & the Beast", "Beauty and the Beast"));
    }

    #[test]
    fn test_check_title_the_prefix_asymmetry() {
        assert!(check_title("The Title", "Title"));
        assert!(!check_title("Title", "The Title"));
    }

    #[test]
    fn test_check_title_punctuation_variance() {
        assert!(check_title("Cats in the Bag", "Cat's in the Bag"));
        assert!(check_title("Who Goes There", "Who Goes There?"));
        assert!(check_title("four minutes", "Four Minutes"));
    }

    #[test]
    fn test_check_title_underscore_asymmetry() {
        // Local dashes become significant underscores; a remote title
        // without them must not match.
        assert!(!check_title("Who-Goes-There", "Who Goes There"));
        // The other direction collapses: remote dashes are dropped when
        // the local side carries no separator marker.
        assert!(check_title("Who Goes There", "Who-Goes-There"));
        // Remote underscores are stripped only when the local side has
        // none of its own.
        assert!(check_title("Cats in the Bag", "Cat_s in the Bag"));
        assert!(check_title("Cat's in the Bag", "Cat_s in the Bag"));
    }

    #[test]
    fn test_check_title_rejects_empty() {
        assert!(!check_title("", "Title"));
        assert!(!check_title("Title", ""));
    }

    #[test]
    fn test_reconcile_by_season_episode_when_no_title() {
        let mut ep = Episode::new("/tv/Show - S01E02 .mkv");
        ep.set_season(1);
        ep.set_episode(2);

        let table = vec![
            record(1, 1, 1, "Pilot"),
            record(1, 2, 2, "The Second: One"),
        ];
        assert!(reconcile(&mut ep, &table));
        // `:` downgraded to `_` when copying the remote title.
        assert_eq!(ep.title(), "The Second_ One");
    }

    #[test]
    fn test_reconcile_by_fuzzy_title_overwrites_numbers() {
        let mut ep = Episode::new("/tv/Show - The Second One-x.mkv");
        ep.set_title("the second one");

        let table = vec![
            record(1, 1, 1, "Pilot"),
            record(3, 7, 40, "The Second One"),
        ];
        assert!(reconcile(&mut ep, &table));
        assert_eq!(ep.season(), 3);
        assert_eq!(ep.episode(), 7);
    }

    #[test]
    fn test_reconcile_by_absolute_number() {
        let mut ep = Episode::new("/tv/Show - 113.mkv");
        ep.set_alt_episode(113);

        let table = vec![
            record(1, 1, 112, "Almost"),
            record(5, 13, 113, "The One"),
        ];
        assert!(reconcile(&mut ep, &table));
        assert_eq!(ep.season(), 5);
        assert_eq!(ep.episode(), 13);
        assert_eq!(ep.title(), "The One");
    }

    #[test]
    fn test_reconcile_miss_leaves_fields() {
        let mut ep = Episode::new("/tv/Show - S09E09 .mkv");
        ep.set_season(9);
        ep.set_episode(9);

        let table = vec![record(1, 1, 1, "Pilot")];
        assert!(!reconcile(&mut ep, &table));
        assert_eq!(ep.season(), 9);
        assert_eq!(ep.episode(), 9);
        assert_eq!(ep.title(), "");
    }

    #[test]
    fn test_reconcile_strips_aka_parenthetical() {
        let mut ep = Episode::new("/tv/Show - S01E01 - Pilot.mkv");
        ep.set_title("Pilot");
        ep.set_season(1);
        ep.set_episode(1);

        let table = vec![record(1, 1, 1, "Pilot (aka Where It Began)")];
        assert!(reconcile(&mut ep, &table));
        assert_eq!(ep.title(), "Pilot");
    }

    #[test]
    fn test_reconcile_multipart_truncates_remote_parenthetical() {
        let mut ep = Episode::new("/tv/Show - S01E01 - Storm.mkv");
        ep.set_title("Storm");
        ep.set_episodes(vec![1, 2]);

        let table = vec![record(1, 1, 1, "Storm (1)")];
        assert!(reconcile(&mut ep, &table));
        assert_eq!(ep.title(), "Storm");
    }

    #[test]
    fn test_resolve_entity_title() {
        let mut ep = Episode::new("/tv/x.mkv");
        ep.set_title("&#21336;&#35441; (The Spoken Word)");
        resolve_entity_title(&mut ep);
        assert_eq!(ep.title(), "The Spoken Word");
    }
}
