//! TVMaze metadata provider implementation.

use super::{EpisodeRecord, MetadataProvider, ProviderError, SeriesIdentity};
use serde::Deserialize;
use std::sync::{Mutex, PoisonError};

/// Metadata provider for the TVMaze API.
///
/// This provider searches shows via the public search endpoint of
/// https://api.tvmaze.com and fetches episode tables per show id. TVMaze
/// carries no absolute episode numbering, so the absolute number is
/// derived from the table position.
pub struct TvMazeProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    /// Serializes all network calls through this provider instance.
    net_lock: Mutex<()>,
}

/// One entry of the TVMaze search response.
#[derive(Debug, Deserialize)]
struct TvMazeSearchResult {
    show: TvMazeShow,
}

/// A show as returned by the TVMaze API.
#[derive(Debug, Deserialize)]
struct TvMazeShow {
    id: u64,
    name: String,
    /// First-aired date, e.g. `2009-03-09` (may be null)
    premiered: Option<String>,
    /// Show language, e.g. `English` (may be null)
    language: Option<String>,
}

/// A single episode from the TVMaze API.
#[derive(Debug, Deserialize)]
struct TvMazeEpisode {
    /// Season number (specials live in a separate endpoint)
    season: u32,
    /// Episode number within the season (may be null for specials)
    number: Option<u32>,
    /// Episode title (may be null for episodes without a title)
    name: Option<String>,
}

impl TvMazeProvider {
    /// Creates a new TVMaze provider instance.
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            base_url: "https://api.tvmaze.com".to_string(),
            net_lock: Mutex::new(()),
        }
    }

    fn convert_show(show: TvMazeShow) -> SeriesIdentity {
        SeriesIdentity {
            id: show.id.to_string(),
            name: show.name,
            year: show
                .premiered
                .as_deref()
                .and_then(|d| d.get(..4))
                .and_then(|y| y.parse().ok()),
            language: show
                .language
                .map(language_code)
                .unwrap_or_default(),
        }
    }
}

impl Default for TvMazeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataProvider for TvMazeProvider {
    fn name(&self) -> &'static str {
        "tvmaze"
    }

    fn search_series(&self, name: &str) -> Result<Vec<SeriesIdentity>, ProviderError> {
        let _guard = self.net_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let url = format!("{}/search/shows", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", name)])
            .send()
            .map_err(|e| ProviderError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::RequestError(format!(
                "HTTP {} {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        let results: Vec<TvMazeSearchResult> = response
            .json()
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(results
            .into_iter()
            .map(|r| Self::convert_show(r.show))
            .collect())
    }

    fn fetch_episode_table(
        &self,
        series_id: &str,
        _language: &str,
    ) -> Result<Vec<EpisodeRecord>, ProviderError> {
        let _guard = self.net_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let url = format!("{}/shows/{}/episodes", self.base_url, series_id);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| ProviderError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::RequestError(format!(
                "HTTP {} {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        let episodes: Vec<TvMazeEpisode> = response
            .json()
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        // Table position doubles as the absolute number.
        Ok(episodes
            .into_iter()
            .enumerate()
            .map(|(index, e)| EpisodeRecord {
                season: e.season,
                episode: e.number.unwrap_or(0),
                absolute: index as u32 + 1,
                title: e.name.unwrap_or_else(|| "Unknown".to_string()),
            })
            .collect())
    }
}

/// Maps TVMaze's spelled-out language names to ISO-ish codes. Unknown
/// languages pass through unchanged.
fn language_code(language: String) -> String {
    match language.as_str() {
        "English" => "en".to_string(),
        "German" => "de".to_string(),
        "French" => "fr".to_string(),
        "Spanish" => "es".to_string(),
        "Italian" => "it".to_string(),
        "Japanese" => "ja".to_string(),
        "Korean" => "ko".to_string(),
        _ => language,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_show() {
        let identity = TvMazeProvider::convert_show(TvMazeShow {
            id: 139,
            name: "Castle".to_string(),
            premiered: Some("2009-03-09".to_string()),
            language: Some("English".to_string()),
        });
        assert_eq!(identity.id, "139");
        assert_eq!(identity.year, Some(2009));
        assert_eq!(identity.language, "en");
        assert!(identity.is_resolved());
    }

    #[test]
    fn test_convert_show_without_premiere() {
        let identity = TvMazeProvider::convert_show(TvMazeShow {
            id: 7,
            name: "Unaired".to_string(),
            premiered: None,
            language: None,
        });
        assert_eq!(identity.year, None);
        assert_eq!(identity.language, "");
    }
}
