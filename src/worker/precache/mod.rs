//! Precache router.
//!
//! Build artifacts listed in the [`PrecacheManifest`] are written to a versioned cache at
//! install time and served from it afterwards, before any network request is made.

mod manifest;
mod url_match;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use url::Url;

pub use manifest::{PrecacheEntry, PrecacheManifest};
pub use url_match::{cache_key, url_variations, without_ignored_parameters};

use crate::logger::Logger;
use crate::worker::constants::PRECACHE_COMPONENT_NAME;
use crate::worker::error::{
    invalid_argument, precache_conflicting_entries, precache_fetch_failed, WorkerResult,
};
use crate::worker::platform::{CacheStore, NetworkFetcher};
use crate::worker::settings::PrecacheSettings;
use crate::worker::types::{FetchRequest, FetchResponse};

static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new(PRECACHE_COMPONENT_NAME));

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseSource {
    Precache,
    Network,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchOutcome {
    pub response: FetchResponse,
    pub source: ResponseSource,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// URLs fetched and stored during this install.
    pub updated: Vec<String>,
    /// URLs already stored at their current revision.
    pub not_updated: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActivateReport {
    /// Keys removed from the current cache because the manifest no longer lists them.
    pub deleted_keys: Vec<String>,
    /// Older precache generations that were dropped.
    pub deleted_caches: Vec<String>,
}

#[derive(Clone, Debug)]
struct Route {
    url: Url,
    revision: Option<String>,
    cache_key: String,
}

#[derive(Clone, Debug)]
pub struct PrecacheController {
    settings: PrecacheSettings,
    cache_name: String,
    /// Keyed by the absolute URL without fragment or revision.
    routes: BTreeMap<String, Route>,
}

impl PrecacheController {
    /// Resolves every manifest entry against `scope`.
    ///
    /// Exact duplicates collapse; the same URL with two different revisions is an error.
    pub fn new(
        manifest: &PrecacheManifest,
        scope: &Url,
        settings: PrecacheSettings,
    ) -> WorkerResult<Self> {
        let mut routes: BTreeMap<String, Route> = BTreeMap::new();
        for entry in manifest.entries() {
            let url = scope.join(&entry.url).map_err(|err| {
                invalid_argument(format!("Invalid precache URL '{}': {err}", entry.url))
            })?;
            let url = url_match::without_fragment(&url);
            let lookup = url.to_string();

            if let Some(existing) = routes.get(&lookup) {
                if existing.revision != entry.revision {
                    return Err(precache_conflicting_entries(
                        &lookup,
                        existing.revision.as_deref().unwrap_or("<none>"),
                        entry.revision.as_deref().unwrap_or("<none>"),
                    ));
                }
                continue;
            }

            let cache_key = cache_key(&url, entry.revision.as_deref());
            routes.insert(
                lookup,
                Route {
                    url,
                    revision: entry.revision.clone(),
                    cache_key,
                },
            );
        }

        Ok(Self {
            cache_name: settings.cache_name(),
            settings,
            routes,
        })
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Every cache key of the current manifest.
    pub fn cache_keys(&self) -> Vec<String> {
        self.routes.values().map(|route| route.cache_key.clone()).collect()
    }

    /// The revision recorded for `url`, if it is precached.
    pub fn revision_for(&self, url: &str) -> Option<&str> {
        let url = Url::parse(url).ok()?;
        self.routes
            .get(url_match::without_fragment(&url).as_str())
            .and_then(|route| route.revision.as_deref())
    }

    /// Route decision for a request URL: the cache key that answers it, if any.
    ///
    /// Synchronous so a browser fetch listener can decide whether to respond at all.
    pub fn cache_key_for(&self, url: &str) -> Option<&str> {
        let url = Url::parse(url).ok()?;
        url_variations(&url, &self.settings)
            .iter()
            .find_map(|candidate| self.routes.get(candidate.as_str()))
            .map(|route| route.cache_key.as_str())
    }

    /// Stores every entry missing from the current cache.
    pub async fn install(
        &self,
        cache: &dyn CacheStore,
        network: &dyn NetworkFetcher,
    ) -> WorkerResult<InstallReport> {
        let stored: BTreeSet<String> = cache.keys(&self.cache_name).await?.into_iter().collect();
        let mut report = InstallReport::default();

        for route in self.routes.values() {
            if stored.contains(&route.cache_key) {
                report.not_updated.push(route.url.to_string());
                continue;
            }

            let response = network
                .fetch(&FetchRequest::get(route.url.as_str()))
                .await
                .map_err(|err| {
                    precache_fetch_failed(format!("Failed to fetch {}: {err}", route.url))
                })?;
            if !response.ok() {
                return Err(precache_fetch_failed(format!(
                    "Fetching {} returned status {}",
                    route.url, response.status
                )));
            }
            cache.put(&self.cache_name, &route.cache_key, response).await?;
            report.updated.push(route.url.to_string());
        }

        LOGGER.info(format!(
            "precached {} file(s), {} already up to date",
            report.updated.len(),
            report.not_updated.len()
        ));
        Ok(report)
    }

    /// Drops stale keys from the current cache and deletes older precache generations.
    pub async fn activate(&self, cache: &dyn CacheStore) -> WorkerResult<ActivateReport> {
        let expected: BTreeSet<String> = self.cache_keys().into_iter().collect();
        let mut report = ActivateReport::default();

        for key in cache.keys(&self.cache_name).await? {
            if !expected.contains(&key) && cache.delete(&self.cache_name, &key).await? {
                report.deleted_keys.push(key);
            }
        }

        let generation_prefix = format!("{}-", self.settings.cache_name_prefix);
        for name in cache.cache_names().await? {
            if name != self.cache_name
                && name.starts_with(&generation_prefix)
                && cache.delete_cache(&name).await?
            {
                report.deleted_caches.push(name);
            }
        }

        if !report.deleted_keys.is_empty() || !report.deleted_caches.is_empty() {
            LOGGER.debug(format!(
                "removed {} stale entr(ies) and {} outdated cache(s)",
                report.deleted_keys.len(),
                report.deleted_caches.len()
            ));
        }
        Ok(report)
    }

    /// Answers a request from the precache when routed, otherwise from the network.
    pub async fn handle_fetch(
        &self,
        cache: &dyn CacheStore,
        network: &dyn NetworkFetcher,
        request: &FetchRequest,
    ) -> WorkerResult<FetchOutcome> {
        if request.is_get() {
            if let Some(key) = self.cache_key_for(&request.url) {
                if let Some(response) = cache.get(&self.cache_name, key).await? {
                    return Ok(FetchOutcome {
                        response,
                        source: ResponseSource::Precache,
                    });
                }
                LOGGER.warn(format!(
                    "{} is precached as {key} but missing from {}; using network",
                    request.url, self.cache_name
                ));
            }
        }

        let response = network.fetch(request).await?;
        Ok(FetchOutcome {
            response,
            source: ResponseSource::Network,
        })
    }
}
