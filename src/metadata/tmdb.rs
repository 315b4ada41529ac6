//! TMDB metadata provider implementation.
//!
//! Talks to the themoviedb.org v3 JSON API with a bearer access token.
//! The episode table is assembled season by season; TMDB has no absolute
//! numbering either, so a running counter across the seasons provides it.

use super::{EpisodeRecord, MetadataProvider, ProviderError, SeriesIdentity};
use serde::Deserialize;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

const BASE_URL: &str = "https://api.themoviedb.org/3";

/// Metadata provider for The Movie Database.
pub struct TmdbProvider {
    client: reqwest::blocking::Client,
    access_token: String,
    net_lock: Mutex<()>,
}

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    results: Vec<TmdbSeries>,
}

#[derive(Debug, Deserialize)]
struct TmdbSeries {
    id: u64,
    name: String,
    /// e.g. `2008-01-20` (may be null or empty)
    first_air_date: Option<String>,
    original_language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbShowDetails {
    seasons: Vec<TmdbSeasonStub>,
}

#[derive(Debug, Deserialize)]
struct TmdbSeasonStub {
    season_number: u32,
}

#[derive(Debug, Deserialize)]
struct TmdbSeason {
    episodes: Vec<TmdbEpisode>,
}

#[derive(Debug, Deserialize)]
struct TmdbEpisode {
    season_number: u32,
    episode_number: u32,
    name: Option<String>,
}

impl TmdbProvider {
    /// Creates a provider using the given API access token.
    pub fn new(access_token: String) -> Self {
        Self {
            client: reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::blocking::Client::new()),
            access_token,
            net_lock: Mutex::new(()),
        }
    }

    /// Issues an authenticated GET and deserializes the JSON body.
    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let response = self
            .client
            .get(format!("{BASE_URL}{path}"))
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .map_err(|e| ProviderError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::RequestError(format!(
                "HTTP {} {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .json()
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }

    fn convert_series(series: TmdbSeries) -> SeriesIdentity {
        SeriesIdentity {
            id: series.id.to_string(),
            name: series.name,
            year: series
                .first_air_date
                .as_deref()
                .and_then(|d| d.get(..4))
                .and_then(|y| y.parse().ok()),
            language: series.original_language.unwrap_or_default(),
        }
    }
}

impl MetadataProvider for TmdbProvider {
    fn name(&self) -> &'static str {
        "tmdb"
    }

    fn search_series(&self, name: &str) -> Result<Vec<SeriesIdentity>, ProviderError> {
        let _guard = self.net_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let response: TmdbSearchResponse = self.get_json("/search/tv", &[("query", name)])?;
        Ok(response
            .results
            .into_iter()
            .map(Self::convert_series)
            .collect())
    }

    fn fetch_episode_table(
        &self,
        series_id: &str,
        language: &str,
    ) -> Result<Vec<EpisodeRecord>, ProviderError> {
        let _guard = self.net_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let language = if language.is_empty() { "en" } else { language };
        let details: TmdbShowDetails =
            self.get_json(&format!("/tv/{series_id}"), &[("language", language)])?;

        let mut table = Vec::new();
        let mut absolute = 0u32;
        for stub in details.seasons {
            let season: TmdbSeason = self.get_json(
                &format!("/tv/{series_id}/season/{}", stub.season_number),
                &[("language", language)],
            )?;
            for episode in season.episodes {
                // Specials (season 0) stay outside the absolute count.
                if episode.season_number > 0 {
                    absolute += 1;
                }
                table.push(EpisodeRecord {
                    season: episode.season_number,
                    episode: episode.episode_number,
                    absolute: if episode.season_number > 0 { absolute } else { 0 },
                    title: episode.name.unwrap_or_else(|| "Unknown".to_string()),
                });
            }
        }

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_series() {
        let identity = TmdbProvider::convert_series(TmdbSeries {
            id: 1396,
            name: "Breaking Bad".to_string(),
            first_air_date: Some("2008-01-20".to_string()),
            original_language: Some("en".to_string()),
        });
        assert_eq!(identity.id, "1396");
        assert_eq!(identity.year, Some(2008));
        assert_eq!(identity.language, "en");
    }

    #[test]
    fn test_convert_series_empty_air_date() {
        let identity = TmdbProvider::convert_series(TmdbSeries {
            id: 1,
            name: "X".to_string(),
            first_air_date: Some(String::new()),
            original_language: None,
        });
        assert_eq!(identity.year, None);
    }
}
