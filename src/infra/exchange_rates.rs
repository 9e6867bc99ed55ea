//! Thin asynchronous client for the open.er-api.com exchange rate API v6.
//!
//! - Fetches the latest rates against the reference currency.
//! - Validates the response envelope and surfaces the API's error type.
//! - Backed by a 60-minute disk cache with a stale fallback.

use std::collections::HashMap;
use std::time::SystemTime;

use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;
use time::format_description::well_known::Rfc2822;
use time::OffsetDateTime;

use crate::domain::{RateTable, REFERENCE_CURRENCY};
use crate::infra::cache::{load_rates_cache, save_rates_cache, RatesCache};
use crate::infra::{CacheStatus, CachedPayload};

const DEFAULT_BASE_URL: &str = "https://open.er-api.com/v6/";
const BASE_URL_ENV: &str = "PARITY_RATES_URL";
const USER_AGENT: &str = "price-parity-scanner/1.0.0";

#[derive(Debug, Error)]
pub enum ExchangeRateError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error: {0}")]
    Api(String),
}

#[derive(Clone)]
pub struct ExchangeRateClient {
    http: Client,
    base_url: Url,
}

impl ExchangeRateClient {
    /// Build a client against the public API, honoring the `PARITY_RATES_URL`
    /// override (useful for pointing at a fixture server).
    pub fn new() -> Result<Self, ExchangeRateError> {
        match std::env::var(BASE_URL_ENV) {
            Ok(base) => Self::with_base_url(&base),
            Err(_) => Self::with_base_url(DEFAULT_BASE_URL),
        }
    }

    pub fn with_base_url(base: &str) -> Result<Self, ExchangeRateError> {
        let base_url = Url::parse(base)?;
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { http, base_url })
    }

    /// Load the rate table, disk cache first. A cache recorded against a
    /// different base currency is ignored, not served.
    pub async fn get_rates(
        &self,
        force_refresh: bool,
    ) -> Result<CachedPayload<RateTable>, ExchangeRateError> {
        let disk = if force_refresh {
            None
        } else {
            load_rates_cache().filter(|cache| {
                if cache.base_code == REFERENCE_CURRENCY {
                    true
                } else {
                    println!(
                        "[rates] Ignoring cache with base {} (expected {})",
                        cache.base_code, REFERENCE_CURRENCY
                    );
                    false
                }
            })
        };

        if let Some(cache) = disk.as_ref() {
            if !cache.is_expired() {
                println!(
                    "[rates] Using disk cache ({} currencies, age: {})",
                    cache.rates.len(),
                    cache.age_string()
                );
                return Ok(CachedPayload::new(
                    RateTable::from_rates(cache.rates.clone()),
                    cache.fetched_at(),
                    CacheStatus::Cached,
                ));
            }
            println!(
                "[rates] Cache expired (age: {}, TTL: 60m), refreshing...",
                cache.age_string()
            );
        }

        match self.fetch_rates().await {
            Ok((rates, published_at)) => {
                println!("[rates] Loaded {} currency rates from API", rates.len());
                let cache = RatesCache::new(REFERENCE_CURRENCY.to_string(), published_at, rates);
                if let Err(e) = save_rates_cache(&cache) {
                    println!("[rates] Warning: failed to save cache: {e}");
                }
                Ok(CachedPayload::new(
                    RateTable::from_rates(cache.rates),
                    SystemTime::now(),
                    CacheStatus::Fresh,
                ))
            }
            Err(error) => {
                println!("[rates] Fetch failed: {error}");
                stale_fallback(disk).ok_or(error)
            }
        }
    }

    async fn fetch_rates(&self) -> Result<(HashMap<String, f64>, Option<u64>), ExchangeRateError> {
        let url = self.base_url.join(&format!("latest/{REFERENCE_CURRENCY}"))?;

        println!("[rates] Requesting exchange rates from {url}");

        let envelope: RatesResponseDto = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let RatesResponseDto {
            result,
            rates,
            error_type,
            time_last_update_unix,
            time_last_update_utc,
        } = envelope;

        if !result
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("success"))
            .unwrap_or(false)
        {
            return Err(ExchangeRateError::Api(
                error_type.unwrap_or_else(|| "response was not successful".to_string()),
            ));
        }

        let rates = rates.ok_or_else(|| ExchangeRateError::Api("response missing rates".into()))?;
        let published_at = parse_published_at(time_last_update_unix, time_last_update_utc.as_deref());

        Ok((rates, published_at))
    }
}

fn stale_fallback(disk: Option<RatesCache>) -> Option<CachedPayload<RateTable>> {
    disk.map(|cache| {
        println!(
            "[rates] Serving stale cache ({} currencies, age: {})",
            cache.rates.len(),
            cache.age_string()
        );
        let fetched_at = cache.fetched_at();
        CachedPayload::new(
            RateTable::from_rates(cache.rates),
            fetched_at,
            CacheStatus::Stale,
        )
    })
}

/// Publication time in unix seconds: the epoch field is preferred, the RFC 2822
/// string is the fallback.
fn parse_published_at(epoch: Option<i64>, utc: Option<&str>) -> Option<u64> {
    if let Some(secs) = epoch {
        if secs >= 0 {
            return Some(secs as u64);
        }
    }

    utc.and_then(|raw| OffsetDateTime::parse(raw, &Rfc2822).ok())
        .map(|dt| dt.unix_timestamp())
        .filter(|secs| *secs >= 0)
        .map(|secs| secs as u64)
}

#[derive(Debug, Deserialize)]
struct RatesResponseDto {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    rates: Option<HashMap<String, f64>>,
    #[serde(default, rename = "error-type")]
    error_type: Option<String>,
    #[serde(default)]
    time_last_update_unix: Option<i64>,
    #[serde(default)]
    time_last_update_utc: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_parses() {
        let dto: RatesResponseDto = serde_json::from_str(
            r#"{
                "result": "success",
                "time_last_update_unix": 1724457751,
                "time_last_update_utc": "Sat, 24 Aug 2024 00:02:31 +0000",
                "base_code": "USD",
                "rates": {"USD": 1, "EUR": 0.9, "KES": 130.0}
            }"#,
        )
        .expect("fixture parses");

        assert_eq!(dto.result.as_deref(), Some("success"));
        let rates = dto.rates.expect("rates present");
        assert_eq!(rates.get("EUR"), Some(&0.9));
        assert_eq!(dto.time_last_update_unix, Some(1724457751));
    }

    #[test]
    fn error_envelope_parses() {
        let dto: RatesResponseDto = serde_json::from_str(
            r#"{"result": "error", "error-type": "unsupported-code"}"#,
        )
        .expect("fixture parses");

        assert_eq!(dto.result.as_deref(), Some("error"));
        assert_eq!(dto.error_type.as_deref(), Some("unsupported-code"));
        assert!(dto.rates.is_none());
    }

    #[test]
    fn published_at_prefers_the_epoch_field() {
        let parsed = parse_published_at(
            Some(1724457751),
            Some("Sat, 24 Aug 2024 00:02:31 +0000"),
        );
        assert_eq!(parsed, Some(1724457751));
    }

    #[test]
    fn published_at_falls_back_to_the_utc_string() {
        let parsed = parse_published_at(None, Some("Sat, 24 Aug 2024 00:02:31 +0000"));
        assert_eq!(parsed, Some(1724457751));
    }

    #[test]
    fn published_at_handles_garbage() {
        assert_eq!(parse_published_at(None, Some("not a date")), None);
        assert_eq!(parse_published_at(Some(-5), None), None);
        assert_eq!(parse_published_at(None, None), None);
    }
}
