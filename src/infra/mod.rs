//! Clients for the two external data sources, plus their on-disk caches.

pub mod cache;
pub mod exchange_rates;
pub mod restcountries;

use std::time::SystemTime;

/// Where a payload came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    /// Fetched from the network on this run.
    Fresh,
    /// Served from a cache that is still within its TTL.
    Cached,
    /// Served from an expired cache because the network fetch failed.
    Stale,
}

/// A payload together with when and how it was obtained.
#[derive(Clone, Debug)]
pub struct CachedPayload<T> {
    pub data: T,
    pub fetched_at: SystemTime,
    pub status: CacheStatus,
}

impl<T> CachedPayload<T> {
    pub(crate) fn new(data: T, fetched_at: SystemTime, status: CacheStatus) -> Self {
        Self {
            data,
            fetched_at,
            status,
        }
    }
}
