//! Data structures and traits for TV series metadata retrieval.
//!
//! This module provides the abstract provider contract the catalog is
//! written against, the episode record and series identity types shared by
//! all providers, and a small registry that instantiates a concrete
//! provider by name.

mod tmdb;
mod tvmaze;

pub use tmdb::TmdbProvider;
pub use tvmaze::TvMazeProvider;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during metadata retrieval operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Request to the metadata provider failed
    #[error("Request failed: {0}")]
    RequestError(String),

    /// Failed to parse the provider's JSON response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// The provider needs a credential that was not configured
    #[error("Provider {0} requires an access token")]
    MissingCredential(&'static str),

    /// The API returned invalid or unexpected data
    #[error("API returned invalid data: {0}")]
    InvalidData(String),
}

/// A catalog entry for one series.
///
/// An identity with a non-empty `id` is resolved and may be cached under
/// all the name aliases it was reached through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesIdentity {
    /// Provider-assigned identifier, empty = unresolved
    pub id: String,
    /// Canonical series name as the provider spells it
    pub name: String,
    /// First-aired year, if the provider knows it
    pub year: Option<u16>,
    /// Provider language code
    pub language: String,
}

impl SeriesIdentity {
    /// An unresolved placeholder carrying only the guessed name.
    pub fn unresolved(name: &str) -> Self {
        Self {
            id: String::new(),
            name: name.to_string(),
            year: None,
            language: String::new(),
        }
    }

    /// True once a provider id has been attached.
    pub fn is_resolved(&self) -> bool {
        !self.id.is_empty()
    }

    /// Display label used by disambiguation prompts.
    pub fn label(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({})", self.name, year),
            None => self.name.clone(),
        }
    }
}

/// One row of a provider's episode table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// Season the episode belongs to (0 = specials)
    pub season: u32,
    /// Episode number within the season
    pub episode: u32,
    /// Absolute episode number across all seasons, 0 = provider has none
    pub absolute: u32,
    /// Episode title
    pub title: String,
}

/// Trait for metadata providers that can look up TV series.
///
/// Implementors resolve a series name to candidate identities and fetch
/// the full episode table for a resolved identity. Network access inside
/// an implementation must be serialized through a provider-scoped lock so
/// concurrent callers do not race on shared download state.
pub trait MetadataProvider {
    /// Short provider name, also used as the registry key.
    fn name(&self) -> &'static str;

    /// Searches for series matching the given (possibly noisy) name.
    ///
    /// Zero, one or many candidates may come back; disambiguation is the
    /// caller's business.
    fn search_series(&self, name: &str) -> Result<Vec<SeriesIdentity>, ProviderError>;

    /// Fetches the complete episode table for a resolved series.
    ///
    /// Records are returned in provider order; the reconciler depends on
    /// that order being preserved.
    fn fetch_episode_table(
        &self,
        series_id: &str,
        language: &str,
    ) -> Result<Vec<EpisodeRecord>, ProviderError>;
}

/// The concrete providers this build knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ProviderKind {
    /// TVMaze (no credential required)
    #[default]
    Tvmaze,
    /// The Movie Database (requires an access token)
    Tmdb,
}

impl ProviderKind {
    /// Parses a provider name as stored in the config file.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "tvmaze" => Some(Self::Tvmaze),
            "tmdb" => Some(Self::Tmdb),
            _ => None,
        }
    }
}

/// Instantiates the selected provider.
///
/// `tmdb_token` is only consulted for the TMDB provider.
pub fn create_provider(
    kind: ProviderKind,
    tmdb_token: Option<String>,
) -> Result<Box<dyn MetadataProvider>, ProviderError> {
    match kind {
        ProviderKind::Tvmaze => Ok(Box::new(TvMazeProvider::new())),
        ProviderKind::Tmdb => {
            let token = tmdb_token.ok_or(ProviderError::MissingCredential("tmdb"))?;
            Ok(Box::new(TmdbProvider::new(token)))
        }
    }
}
