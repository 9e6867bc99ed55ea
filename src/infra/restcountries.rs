//! Thin asynchronous client for the REST Countries API v3.1.
//!
//! - Fetches the country directory reduced to the fields the engine needs.
//! - Drops entries missing a name, currency, or country code while parsing.
//! - Backed by a 7-day disk cache with a stale fallback when the network fails.

use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;

use crate::domain::Country;
use crate::infra::cache::{load_country_cache, save_country_cache, CountryCache};
use crate::infra::{CacheStatus, CachedPayload};

const DEFAULT_BASE_URL: &str = "https://restcountries.com/v3.1/";
const BASE_URL_ENV: &str = "PARITY_COUNTRIES_URL";
const COUNTRY_FIELDS: &str = "name,currencies,region,cca2";
const USER_AGENT: &str = "price-parity-scanner/1.0.0";

#[derive(Debug, Error)]
pub enum CountryDirectoryError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("directory returned no usable countries")]
    Empty,
}

#[derive(Clone)]
pub struct CountryDirectoryClient {
    http: Client,
    base_url: Url,
}

impl CountryDirectoryClient {
    /// Build a client against the public API, honoring the `PARITY_COUNTRIES_URL`
    /// override (useful for pointing at a fixture server).
    pub fn new() -> Result<Self, CountryDirectoryError> {
        match std::env::var(BASE_URL_ENV) {
            Ok(base) => Self::with_base_url(&base),
            Err(_) => Self::with_base_url(DEFAULT_BASE_URL),
        }
    }

    pub fn with_base_url(base: &str) -> Result<Self, CountryDirectoryError> {
        let base_url = Url::parse(base)?;
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { http, base_url })
    }

    /// Load the country directory, disk cache first.
    ///
    /// `force_refresh` skips the cache read (and the stale fallback) and goes
    /// straight to the network.
    pub async fn get_countries(
        &self,
        force_refresh: bool,
    ) -> Result<CachedPayload<Vec<Country>>, CountryDirectoryError> {
        let disk = if force_refresh {
            None
        } else {
            load_country_cache()
        };

        if let Some(cache) = disk.as_ref() {
            if !cache.is_expired() {
                println!(
                    "[countries] Using disk cache ({} countries, age: {})",
                    cache.countries.len(),
                    cache.age_string()
                );
                return Ok(CachedPayload::new(
                    cache.countries.clone(),
                    cache.fetched_at(),
                    CacheStatus::Cached,
                ));
            }
            println!(
                "[countries] Cache expired (age: {}, TTL: 7d), refreshing...",
                cache.age_string()
            );
        }

        match self.fetch_countries().await {
            Ok(countries) if countries.is_empty() => {
                stale_fallback(disk).ok_or(CountryDirectoryError::Empty)
            }
            Ok(countries) => {
                println!("[countries] Loaded {} countries from API", countries.len());
                let cache = CountryCache::new(countries);
                if let Err(e) = save_country_cache(&cache) {
                    println!("[countries] Warning: failed to save cache: {e}");
                }
                Ok(CachedPayload::new(
                    cache.countries,
                    std::time::SystemTime::now(),
                    CacheStatus::Fresh,
                ))
            }
            Err(error) => {
                println!("[countries] Fetch failed: {error}");
                stale_fallback(disk).ok_or(error)
            }
        }
    }

    async fn fetch_countries(&self) -> Result<Vec<Country>, CountryDirectoryError> {
        let mut url = self.base_url.join("all")?;
        url.query_pairs_mut().append_pair("fields", COUNTRY_FIELDS);

        println!("[countries] Requesting country directory from {url}");

        let entries: Vec<CountryDto> = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(parse_countries(entries))
    }
}

fn stale_fallback(disk: Option<CountryCache>) -> Option<CachedPayload<Vec<Country>>> {
    disk.map(|cache| {
        println!(
            "[countries] Serving stale cache ({} countries, age: {})",
            cache.countries.len(),
            cache.age_string()
        );
        let fetched_at = cache.fetched_at();
        CachedPayload::new(cache.countries, fetched_at, CacheStatus::Stale)
    })
}

#[derive(Debug, Deserialize)]
struct CountryDto {
    #[serde(default)]
    name: Option<CountryNameDto>,
    #[serde(default)]
    currencies: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    cca2: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CountryNameDto {
    #[serde(default)]
    common: Option<String>,
}

fn parse_countries(entries: Vec<CountryDto>) -> Vec<Country> {
    entries.into_iter().filter_map(parse_country).collect()
}

/// Convert one directory entry into a domain country, or drop it. This is the
/// filtering predicate: anything without all three of name, currency code, and
/// country code is excluded here and never reaches the engine.
fn parse_country(dto: CountryDto) -> Option<Country> {
    let name = dto
        .name
        .and_then(|n| n.common)
        .filter(|s| !s.trim().is_empty())?;
    // First currency key in document order; the source lists the primary one first.
    let currency_code = dto
        .currencies
        .and_then(|map| map.keys().next().cloned())
        .filter(|s| !s.is_empty())?;
    let country_code = dto.cca2.filter(|s| !s.trim().is_empty())?;
    let region = dto.region.filter(|s| !s.is_empty());

    Some(Country {
        name,
        currency_code,
        country_code,
        region,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_fixture(json: &str) -> Vec<Country> {
        let entries: Vec<CountryDto> = serde_json::from_str(json).expect("fixture parses");
        parse_countries(entries)
    }

    #[test]
    fn complete_entries_parse() {
        let countries = parse_fixture(
            r#"[{
                "name": {"common": "Germany"},
                "currencies": {"EUR": {"name": "Euro", "symbol": "€"}},
                "region": "Europe",
                "cca2": "DE"
            }]"#,
        );
        assert_eq!(
            countries,
            vec![Country {
                name: "Germany".to_string(),
                currency_code: "EUR".to_string(),
                country_code: "DE".to_string(),
                region: Some("Europe".to_string()),
            }]
        );
    }

    #[test]
    fn entries_missing_required_fields_are_dropped() {
        let countries = parse_fixture(
            r#"[
                {"name": {"common": "No Currency"}, "region": "Europe", "cca2": "NC"},
                {"name": {"common": "Empty Currencies"}, "currencies": {}, "region": "Asia", "cca2": "EC"},
                {"currencies": {"EUR": {}}, "region": "Europe", "cca2": "NN"},
                {"name": {}, "currencies": {"EUR": {}}, "region": "Europe", "cca2": "NM"},
                {"name": {"common": "No Code"}, "currencies": {"EUR": {}}, "region": "Europe"},
                {"name": {"common": "Kept"}, "currencies": {"KEP": {}}, "cca2": "KP"}
            ]"#,
        );
        assert_eq!(countries.len(), 1);
        assert_eq!(countries[0].name, "Kept");
        assert_eq!(countries[0].region, None);
    }

    #[test]
    fn first_currency_key_wins_in_document_order() {
        let countries = parse_fixture(
            r#"[{
                "name": {"common": "Zimbabwe"},
                "currencies": {"ZWL": {}, "USD": {}, "ZAR": {}},
                "region": "Africa",
                "cca2": "ZW"
            }]"#,
        );
        assert_eq!(countries[0].currency_code, "ZWL");
    }

    #[test]
    fn empty_region_becomes_none() {
        let countries = parse_fixture(
            r#"[{
                "name": {"common": "Somewhere"},
                "currencies": {"XYZ": {}},
                "region": "",
                "cca2": "SW"
            }]"#,
        );
        assert_eq!(countries[0].region, None);
    }
}
