//! Query cache keyed by resource name and query parameters.
//!
//! # Design
//! Entries store the server's JSON so one cache can hold pages, single
//! records and the current user side by side; typed access deserializes on
//! read. An entry is either fresh or stale. Stale data is still handed out
//! as placeholder data while a refetch is pending, which is what keeps a
//! table from flickering between pages.
//!
//! At most one request per key is in flight: `begin_fetch` refuses a key
//! that is already outstanding, and the matching `complete_fetch` /
//! `fail_fetch` releases it. Invalidating a resource while one of its keys
//! is in flight marks that fetch as superseded; its result is stored stale
//! so the next read goes back to the server.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ApiError;

pub const CURRENT_USER: &str = "currentUser";
pub const USERS: &str = "users";
pub const ITEMS: &str = "items";

/// Identifies a cached server response, e.g. `["users", {page: 2}]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    pub resource: String,
    pub params: BTreeMap<String, String>,
}

impl QueryKey {
    pub fn new(resource: &str) -> Self {
        Self {
            resource: resource.to_string(),
            params: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl ToString) -> Self {
        self.params.insert(name.to_string(), value.to_string());
        self
    }

    pub fn page(resource: &str, page: u32) -> Self {
        Self::new(resource).with("page", page)
    }

    pub fn current_user() -> Self {
        Self::new(CURRENT_USER)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.resource)?;
        for (k, v) in &self.params {
            write!(f, " {k}={v}")?;
        }
        write!(f, "]")
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: Value,
    stale: bool,
}

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, CacheEntry>,
    /// Outstanding fetches; `true` once an invalidation has superseded one.
    in_flight: HashMap<QueryKey, bool>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached data for `key`, fresh or stale.
    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let entry = self.entries.get(key)?;
        match serde_json::from_value(entry.data.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(key = %key, error = %e, "cached data has unexpected shape");
                None
            }
        }
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        self.entries.get(key).is_some_and(|e| !e.stale)
    }

    pub fn is_in_flight(&self, key: &QueryKey) -> bool {
        self.in_flight.contains_key(key)
    }

    /// Store data as fresh.
    pub fn set<T: Serialize>(&mut self, key: QueryKey, data: &T) -> Result<(), ApiError> {
        self.store(key, data, false)
    }

    fn store<T: Serialize>(
        &mut self,
        key: QueryKey,
        data: &T,
        stale: bool,
    ) -> Result<(), ApiError> {
        let data = serde_json::to_value(data)
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;
        self.entries.insert(key, CacheEntry { data, stale });
        Ok(())
    }

    /// Claim `key` for a network fetch. Returns false when the entry is
    /// already fresh or another fetch for it is outstanding.
    pub fn begin_fetch(&mut self, key: &QueryKey) -> bool {
        if self.is_fresh(key) {
            debug!(key = %key, "cache hit");
            return false;
        }
        if self.in_flight.contains_key(key) {
            debug!(key = %key, "fetch already in flight");
            return false;
        }
        self.in_flight.insert(key.clone(), false);
        true
    }

    /// Store the answer to a claimed fetch. A fetch superseded by
    /// `invalidate` is stored stale.
    pub fn complete_fetch<T: Serialize>(
        &mut self,
        key: &QueryKey,
        data: &T,
    ) -> Result<(), ApiError> {
        let superseded = self.in_flight.remove(key).unwrap_or(false);
        if superseded {
            debug!(key = %key, "fetch superseded by invalidation, stored stale");
        }
        self.store(key.clone(), data, superseded)
    }

    /// Release `key` after a failed fetch. Existing data stays as it was.
    pub fn fail_fetch(&mut self, key: &QueryKey) {
        self.in_flight.remove(key);
    }

    /// Return fresh cached data, or run `fetch` and cache its result.
    ///
    /// A key that is already in flight yields the stale placeholder when
    /// there is one and `ApiError::InFlight` otherwise.
    pub fn fetch_with<T, F>(&mut self, key: &QueryKey, fetch: F) -> Result<T, ApiError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, ApiError>,
    {
        if self.is_fresh(key) {
            if let Some(hit) = self.get(key) {
                debug!(key = %key, "cache hit");
                return Ok(hit);
            }
        }
        if self.is_in_flight(key) {
            return self.get(key).ok_or(ApiError::InFlight);
        }
        self.in_flight.insert(key.clone(), false);
        match fetch() {
            Ok(data) => {
                self.complete_fetch(key, &data)?;
                Ok(data)
            }
            Err(e) => {
                self.fail_fetch(key);
                Err(e)
            }
        }
    }

    /// Warm `key` in the background. Failures are logged, never returned.
    /// Returns whether a request was issued.
    pub fn prefetch_with<T, F>(&mut self, key: &QueryKey, fetch: F) -> bool
    where
        T: Serialize,
        F: FnOnce() -> Result<T, ApiError>,
    {
        if !self.begin_fetch(key) {
            return false;
        }
        debug!(key = %key, "prefetching");
        match fetch() {
            Ok(data) => {
                if let Err(e) = self.complete_fetch(key, &data) {
                    warn!(key = %key, error = %e, "prefetch result not cached");
                }
            }
            Err(e) => {
                warn!(key = %key, error = %e, "prefetch failed");
                self.fail_fetch(key);
            }
        }
        true
    }

    /// Mark every entry of `resource` stale, along with any of its fetches
    /// still in flight. Returns how many stored entries were marked.
    pub fn invalidate(&mut self, resource: &str) -> usize {
        let mut marked = 0;
        for (key, entry) in self.entries.iter_mut() {
            if key.resource == resource && !entry.stale {
                entry.stale = true;
                marked += 1;
            }
        }
        let mut superseded = 0;
        for (key, flag) in self.in_flight.iter_mut() {
            if key.resource == resource {
                *flag = true;
                superseded += 1;
            }
        }
        debug!(resource, marked, superseded, "invalidated");
        marked
    }

    pub fn remove(&mut self, key: &QueryKey) {
        self.entries.remove(key);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.in_flight.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn fetch_with_caches_until_invalidated() {
        let mut cache = QueryCache::new();
        let key = QueryKey::page(ITEMS, 1);
        let calls = Cell::new(0);
        let fetch = || {
            calls.set(calls.get() + 1);
            Ok::<_, ApiError>(vec![1, 2, 3])
        };

        assert_eq!(cache.fetch_with(&key, fetch).unwrap(), vec![1, 2, 3]);
        assert_eq!(cache.fetch_with(&key, fetch).unwrap(), vec![1, 2, 3]);
        assert_eq!(calls.get(), 1);

        assert_eq!(cache.invalidate(ITEMS), 1);
        assert!(!cache.is_fresh(&key));
        assert_eq!(cache.get::<Vec<i32>>(&key), Some(vec![1, 2, 3]), "stale data stays readable");

        cache.fetch_with(&key, fetch).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn invalidate_only_touches_one_resource() {
        let mut cache = QueryCache::new();
        cache.set(QueryKey::page(USERS, 1), &1).unwrap();
        cache.set(QueryKey::page(USERS, 2), &2).unwrap();
        cache.set(QueryKey::page(ITEMS, 1), &3).unwrap();

        assert_eq!(cache.invalidate(USERS), 2);
        assert!(cache.is_fresh(&QueryKey::page(ITEMS, 1)));
    }

    #[test]
    fn begin_fetch_dedups_in_flight_keys() {
        let mut cache = QueryCache::new();
        let key = QueryKey::current_user();
        assert!(cache.begin_fetch(&key));
        assert!(!cache.begin_fetch(&key));
        cache.fail_fetch(&key);
        assert!(cache.begin_fetch(&key));
        cache.complete_fetch(&key, &"me").unwrap();
        assert!(!cache.begin_fetch(&key), "fresh entries need no fetch");
    }

    #[test]
    fn in_flight_without_data_is_an_error() {
        let mut cache = QueryCache::new();
        let key = QueryKey::page(ITEMS, 1);
        assert!(cache.begin_fetch(&key));
        let err = cache.fetch_with(&key, || Ok::<_, ApiError>(1)).unwrap_err();
        assert!(matches!(err, ApiError::InFlight));
    }

    #[test]
    fn failed_fetch_keeps_previous_data() {
        let mut cache = QueryCache::new();
        let key = QueryKey::page(ITEMS, 1);
        cache.set(key.clone(), &"old").unwrap();
        cache.invalidate(ITEMS);
        let err = cache
            .fetch_with::<String, _>(&key, || Err(ApiError::Transport("down".to_string())))
            .unwrap_err();
        assert!(err.is_transport());
        assert_eq!(cache.get::<String>(&key).as_deref(), Some("old"));
        assert!(!cache.is_in_flight(&key));
    }

    #[test]
    fn prefetch_swallows_errors() {
        let mut cache = QueryCache::new();
        let key = QueryKey::page(USERS, 2);
        let down = || Err::<u8, _>(ApiError::Transport("down".to_string()));
        assert!(cache.prefetch_with(&key, down));
        assert!(!cache.contains(&key));
        assert!(cache.prefetch_with(&key, || Ok::<_, ApiError>(5u8)));
        assert!(
            !cache.prefetch_with(&key, || Ok::<_, ApiError>(6u8)),
            "fresh entry is not refetched"
        );
        assert_eq!(cache.get::<u8>(&key), Some(5));
    }

    #[test]
    fn invalidation_during_fetch_keeps_result_stale() {
        let mut cache = QueryCache::new();
        let key = QueryKey::page(ITEMS, 1);
        let other = QueryKey::page(USERS, 1);
        assert!(cache.begin_fetch(&key));
        assert!(cache.begin_fetch(&other));

        assert_eq!(cache.invalidate(ITEMS), 0, "nothing stored yet");
        cache.complete_fetch(&key, &vec!["before mutation"]).unwrap();
        cache.complete_fetch(&other, &1).unwrap();

        assert!(!cache.is_fresh(&key));
        assert_eq!(cache.get::<Vec<String>>(&key), Some(vec!["before mutation".to_string()]));
        assert!(cache.begin_fetch(&key), "next read goes back to the server");
        assert!(cache.is_fresh(&other), "other resources are untouched");

        cache.complete_fetch(&key, &vec!["after mutation"]).unwrap();
        assert!(cache.is_fresh(&key));
    }

    #[test]
    fn key_display_is_readable() {
        assert_eq!(QueryKey::page(USERS, 3).to_string(), "[users page=3]");
    }
}
