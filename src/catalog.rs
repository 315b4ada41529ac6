//! Metadata catalog
//!
//! Resolves a parsed episode's noisy series name against the metadata
//! provider and supplies the episode table for the resolved series.
//! Resolution consults a persistent name → identity cache first; misses
//! fall back to provider searches and, when those stay ambiguous, to a
//! disambiguation collaborator. Episode tables are cached on disk and
//! refreshed after five days; a failed refresh keeps the stale table and
//! is reported as a warning, never as an error.

use crate::cache::{CacheError, CacheStorage};
use crate::episode::Episode;
use crate::metadata::{EpisodeRecord, MetadataProvider, ProviderError, SeriesIdentity};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Episode tables older than this are refreshed on the next use.
const TABLE_TTL: Duration = Duration::from_secs(5 * 24 * 60 * 60);

/// Key the series cache is stored under in its cache storage.
const SERIES_CACHE_KEY: &str = "seriesdata";

/// Errors that can occur during catalog resolution
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The metadata provider failed
    #[error("Metadata provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Cache access failed
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Outcome of resolving one episode against the catalog.
#[derive(Debug)]
pub enum Resolution {
    /// A series was chosen and its episode table is available
    Resolved {
        identity: SeriesIdentity,
        table: Vec<EpisodeRecord>,
    },
    /// Nothing matched, or the user declined disambiguation
    Unresolved,
    /// The file is bonus material; the catalog is never consulted
    Special,
}

/// Collaborator that resolves ambiguity a search cannot.
///
/// The CLI implements this with interactive prompts; a non-interactive
/// run declines everything.
pub trait SeriesPrompter {
    /// Picks one of several candidate series, or `None` to give up on
    /// this episode.
    fn choose_series(
        &self,
        episode: &Episode,
        candidates: &[SeriesIdentity],
    ) -> Option<SeriesIdentity>;

    /// Supplies a corrected series name after a search came back empty,
    /// or `None` to give up.
    fn corrected_name(&self, episode: &Episode) -> Option<String>;
}

/// Owns the provider, the persistent series-name cache and the on-disk
/// episode-table cache for one session.
pub struct MetadataCatalog {
    provider: Box<dyn MetadataProvider>,
    series_cache: HashMap<String, SeriesIdentity>,
    series_store: CacheStorage<HashMap<String, SeriesIdentity>>,
    table_store: CacheStorage<Vec<EpisodeRecord>>,
}

impl MetadataCatalog {
    /// Opens the catalog with caches in the standard cache directory,
    /// namespaced per provider.
    pub fn open(provider: Box<dyn MetadataProvider>) -> Result<Self, CatalogError> {
        let series_store = CacheStorage::open(&format!("{}_series", provider.name()))?;
        let table_store = CacheStorage::open(&format!("{}_tables", provider.name()))?;
        Ok(Self::with_stores(provider, series_store, table_store))
    }

    /// Opens the catalog with caches below an explicit root directory.
    pub fn open_in(provider: Box<dyn MetadataProvider>, root: &Path) -> Result<Self, CatalogError> {
        let series_store = CacheStorage::open_in(root, &format!("{}_series", provider.name()))?;
        let table_store = CacheStorage::open_in(root, &format!("{}_tables", provider.name()))?;
        Ok(Self::with_stores(provider, series_store, table_store))
    }

    fn with_stores(
        provider: Box<dyn MetadataProvider>,
        series_store: CacheStorage<HashMap<String, SeriesIdentity>>,
        table_store: CacheStorage<Vec<EpisodeRecord>>,
    ) -> Self {
        // An unreadable series cache is treated as empty rather than
        // blocking the session.
        let series_cache = series_store
            .load(SERIES_CACHE_KEY)
            .unwrap_or_default()
            .unwrap_or_default();
        Self {
            provider,
            series_cache,
            series_store,
            table_store,
        }
    }

    /// Resolves the episode's series and fetches its episode table.
    ///
    /// Updates the episode's series name and language in place once an
    /// identity is chosen. `warn` receives non-fatal trouble (stale cache
    /// kept, cache persistence failed).
    pub fn resolve_and_fetch(
        &mut self,
        ep: &mut Episode,
        prompter: &dyn SeriesPrompter,
        warn: &mut dyn FnMut(String),
    ) -> Result<Resolution, CatalogError> {
        if ep.special() {
            return Ok(Resolution::Special);
        }

        let original_key = ep.series().to_lowercase();
        let alt_key = ep.alt_series().to_lowercase();

        let mut identity = self
            .series_cache
            .get(&original_key)
            .or_else(|| self.series_cache.get(&alt_key))
            .cloned()
            .unwrap_or_else(|| SeriesIdentity::unresolved(ep.series()));

        if !identity.is_resolved() {
            // Whatever table was cached under the unresolved name is
            // outdated once the identity changes.
            self.table_store.remove(&table_cache_id(&identity.name));

            identity = match self.search(ep, prompter)? {
                Some(found) => found,
                None => return Ok(Resolution::Unresolved),
            };
        }

        ep.set_series(&identity.name);
        if ep.language().is_empty() {
            ep.set_language(&identity.language);
        }

        let cache_id = table_cache_id(&identity.name);
        let table = self.load_or_refresh_table(&identity, ep.language(), &cache_id, warn)?;
        self.register(&identity, &original_key, &alt_key, warn);

        Ok(Resolution::Resolved { identity, table })
    }

    /// Searches the provider by the primary name, widens to the alternate
    /// name when the result is not a single hit, and falls back to the
    /// prompter for empty or ambiguous results.
    fn search(
        &self,
        ep: &Episode,
        prompter: &dyn SeriesPrompter,
    ) -> Result<Option<SeriesIdentity>, CatalogError> {
        let mut candidates = self.provider.search_series(ep.series())?;
        if candidates.len() != 1 && !ep.alt_series().is_empty() && ep.alt_series() != ep.series() {
            candidates.extend(self.provider.search_series(ep.alt_series())?);
        }

        while candidates.is_empty() {
            match prompter.corrected_name(ep) {
                Some(name) => candidates = self.provider.search_series(&name)?,
                None => return Ok(None),
            }
        }

        if candidates.len() == 1 {
            return Ok(Some(candidates.remove(0)));
        }
        Ok(prompter.choose_series(ep, &candidates))
    }

    /// Loads the episode table from the disk cache, refreshing entries
    /// older than five days. A failed refresh keeps the stale table.
    fn load_or_refresh_table(
        &self,
        identity: &SeriesIdentity,
        language: &str,
        cache_id: &str,
        warn: &mut dyn FnMut(String),
    ) -> Result<Vec<EpisodeRecord>, CatalogError> {
        // An unreadable table file is a plain miss.
        let cached = self.table_store.load(cache_id).unwrap_or_default();

        let Some(table) = cached else {
            return self.fetch_table(identity, language, cache_id);
        };

        if self.table_store.age(cache_id).is_some_and(|age| age > TABLE_TTL) {
            match self.fetch_table(identity, language, cache_id) {
                Ok(fresh) => return Ok(fresh),
                Err(error) => warn(format!(
                    "Could not refresh episode table for {}: {error}; keeping stale cache",
                    identity.name
                )),
            }
        }

        Ok(table)
    }

    fn fetch_table(
        &self,
        identity: &SeriesIdentity,
        language: &str,
        cache_id: &str,
    ) -> Result<Vec<EpisodeRecord>, CatalogError> {
        let table = self.provider.fetch_episode_table(&identity.id, language)?;
        // Failing to write the cache must not fail the lookup.
        let _ = self.table_store.store(cache_id, &table);
        Ok(table)
    }

    /// Registers the resolved identity under every alias it was reached
    /// through and persists the cache when anything was added.
    fn register(
        &mut self,
        identity: &SeriesIdentity,
        original_key: &str,
        alt_key: &str,
        warn: &mut dyn FnMut(String),
    ) {
        if !identity.is_resolved() {
            return;
        }

        let mut changed = false;
        for key in [identity.name.to_lowercase(), original_key.to_string(), alt_key.to_string()] {
            if !key.is_empty() && !self.series_cache.contains_key(&key) {
                self.series_cache.insert(key, identity.clone());
                changed = true;
            }
        }

        if changed {
            if let Err(error) = self.series_store.store(SERIES_CACHE_KEY, &self.series_cache) {
                warn(format!("Could not persist series cache: {error}"));
            }
        }
    }
}

/// Table cache identifier: hash of the canonical series name plus the
/// season marker (always the full-table marker here).
fn table_cache_id(series_name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(series_name.as_bytes());
    format!("{:x}_all", hasher.finalize())
}
