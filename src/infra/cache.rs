//! Persistent on-disk caching for both data sources with TTL tracking.

use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
    sync::OnceLock,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::domain::Country;

const COUNTRY_CACHE_FILENAME: &str = "country_cache.json";
const RATES_CACHE_FILENAME: &str = "rates_cache.json";

/// Country directory TTL: 7 days. Countries and currencies rarely change.
pub const COUNTRY_CACHE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Exchange rate TTL: 60 minutes. The rate source publishes daily, but a
/// short TTL keeps a long-running shell session from drifting.
pub const RATES_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Cached country directory with TTL tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryCache {
    /// Unix timestamp (seconds) when this cache was created.
    pub cached_at: u64,
    /// All valid countries parsed from the source.
    pub countries: Vec<Country>,
}

impl CountryCache {
    pub fn new(countries: Vec<Country>) -> Self {
        Self {
            cached_at: unix_now(),
            countries,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.age() > COUNTRY_CACHE_TTL
    }

    pub fn age(&self) -> Duration {
        age_since(self.cached_at)
    }

    pub fn age_string(&self) -> String {
        format_age(self.age())
    }

    pub fn fetched_at(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.cached_at)
    }
}

/// Cached exchange rates with TTL + base-currency tracking. Stores the raw
/// source map; the domain `RateTable` is rebuilt on load so the
/// reference-entry invariant lives in one place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatesCache {
    /// Unix timestamp (seconds) when this cache was created.
    pub cached_at: u64,
    /// Currency the rates are expressed against.
    pub base_code: String,
    /// When the source says it last updated the rates (unix seconds).
    pub published_at: Option<u64>,
    /// Raw currency → rate map as delivered by the source.
    pub rates: HashMap<String, f64>,
}

impl RatesCache {
    pub fn new(base_code: String, published_at: Option<u64>, rates: HashMap<String, f64>) -> Self {
        Self {
            cached_at: unix_now(),
            base_code,
            published_at,
            rates,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.age() > RATES_CACHE_TTL
    }

    pub fn age(&self) -> Duration {
        age_since(self.cached_at)
    }

    pub fn age_string(&self) -> String {
        format_age(self.age())
    }

    pub fn fetched_at(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.cached_at)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn age_since(cached_at: u64) -> Duration {
    Duration::from_secs(unix_now().saturating_sub(cached_at))
}

/// Human-readable age string ("42s", "12m", "3h", "2d").
pub fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86400 {
        format!("{}h", secs / 3600)
    } else {
        format!("{}d", secs / 86400)
    }
}

/// Cache directory under the platform data-local dir.
fn cache_dir() -> PathBuf {
    static PATH: OnceLock<PathBuf> = OnceLock::new();
    PATH.get_or_init(|| {
        let base = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("price-parity-scanner");

        // Ensure directory exists
        let _ = fs::create_dir_all(&base);

        base
    })
    .clone()
}

fn load_cache<T: DeserializeOwned>(filename: &str, label: &str) -> Option<T> {
    let path = cache_dir().join(filename);

    if !path.exists() {
        println!("[cache] No {label} cache found at {}", path.display());
        return None;
    }

    match fs::read_to_string(&path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(cache) => {
                println!("[cache] Loaded {label} cache from {}", path.display());
                Some(cache)
            }
            Err(e) => {
                println!("[cache] Failed to parse {label} cache: {e}");
                None
            }
        },
        Err(e) => {
            println!("[cache] Failed to read {label} cache: {e}");
            None
        }
    }
}

fn save_cache<T: Serialize>(cache: &T, filename: &str, label: &str) -> Result<(), std::io::Error> {
    let path = cache_dir().join(filename);
    let content = serde_json::to_string_pretty(cache)?;
    fs::write(&path, content)?;
    println!("[cache] Saved {label} cache to {}", path.display());
    Ok(())
}

/// Load the country cache from disk, if it exists.
pub fn load_country_cache() -> Option<CountryCache> {
    load_cache(COUNTRY_CACHE_FILENAME, "country")
}

/// Save the country cache to disk.
pub fn save_country_cache(cache: &CountryCache) -> Result<(), std::io::Error> {
    save_cache(cache, COUNTRY_CACHE_FILENAME, "country")
}

/// Load the rates cache from disk, if it exists.
pub fn load_rates_cache() -> Option<RatesCache> {
    load_cache(RATES_CACHE_FILENAME, "rates")
}

/// Save the rates cache to disk.
pub fn save_rates_cache(cache: &RatesCache) -> Result<(), std::io::Error> {
    save_cache(cache, RATES_CACHE_FILENAME, "rates")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_age_picks_the_largest_unit() {
        assert_eq!(format_age(Duration::from_secs(42)), "42s");
        assert_eq!(format_age(Duration::from_secs(12 * 60)), "12m");
        assert_eq!(format_age(Duration::from_secs(3 * 3600)), "3h");
        assert_eq!(format_age(Duration::from_secs(2 * 86400)), "2d");
    }

    #[test]
    fn fresh_caches_are_not_expired() {
        let countries = CountryCache::new(Vec::new());
        assert!(!countries.is_expired());

        let rates = RatesCache::new("USD".to_string(), None, HashMap::new());
        assert!(!rates.is_expired());
    }

    #[test]
    fn old_caches_expire() {
        let mut cache = CountryCache::new(Vec::new());
        cache.cached_at -= COUNTRY_CACHE_TTL.as_secs() + 1;
        assert!(cache.is_expired());

        let mut rates = RatesCache::new("USD".to_string(), None, HashMap::new());
        rates.cached_at -= RATES_CACHE_TTL.as_secs() + 1;
        assert!(rates.is_expired());
    }
}
