use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Currency every base amount and every exchange rate is expressed against.
pub const REFERENCE_CURRENCY: &str = "USD";

/// A country as delivered by the directory source, reduced to the fields the
/// pricing engine needs. Records missing a name, currency code, or country
/// code never become a `Country`; the infra layer drops them during parsing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    /// Common display name, unique key for ordering and identity.
    pub name: String,
    /// ISO-style code of the country's primary currency.
    pub currency_code: String,
    /// Two-letter country code.
    pub country_code: String,
    /// Free-text region name ("Europe", "Africa", ...), when the source has one.
    pub region: Option<String>,
}

/// Exchange rates relative to [`REFERENCE_CURRENCY`]: 1 unit of the reference
/// currency buys `rate` units of the keyed currency.
///
/// The reference currency always maps to exactly 1.0 and a source value for it
/// is discarded on construction. Lookups are total: an unknown currency
/// resolves to 1.0 so a single missing rate never blocks the whole table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RateTable {
    rates: HashMap<String, f64>,
}

impl RateTable {
    /// Build a table from raw source rates. Non-finite and non-positive rates
    /// are dropped; the reference entry is injected last so it always wins.
    pub fn from_rates(source: HashMap<String, f64>) -> Self {
        let mut rates: HashMap<String, f64> = source
            .into_iter()
            .filter(|(_, rate)| rate.is_finite() && *rate > 0.0)
            .collect();
        rates.insert(REFERENCE_CURRENCY.to_string(), 1.0);
        Self { rates }
    }

    /// Rate for `currency`, falling back to 1.0 when the source had none.
    pub fn rate_for(&self, currency: &str) -> f64 {
        self.rates.get(currency).copied().unwrap_or(1.0)
    }

    /// True when `currency` has an explicit entry (the reference always does).
    pub fn contains(&self, currency: &str) -> bool {
        self.rates.contains_key(currency)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// One row of the computed pricing table.
#[derive(Clone, Debug, PartialEq)]
pub struct PricingRow {
    pub country: String,
    pub country_code: String,
    pub currency_code: String,
    /// Purchasing-power multiplier applied to the base amount.
    pub parity_multiplier: f64,
    /// Reference-to-local rate used for this row (1.0 when the source had none).
    pub local_rate: f64,
    /// Charm-rounded price in the reference currency.
    pub reference_price: f64,
    /// Charm-rounded price in the country's currency.
    pub local_price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rates(entries: &[(&str, f64)]) -> HashMap<String, f64> {
        entries
            .iter()
            .map(|(code, rate)| (code.to_string(), *rate))
            .collect()
    }

    #[test]
    fn reference_entry_always_wins() {
        let table = RateTable::from_rates(rates(&[("USD", 1.08), ("EUR", 0.9)]));
        assert_eq!(table.rate_for("USD"), 1.0);
        assert_eq!(table.rate_for("EUR"), 0.9);
    }

    #[test]
    fn reference_entry_exists_even_for_empty_source() {
        let table = RateTable::from_rates(HashMap::new());
        assert!(table.contains("USD"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn invalid_rates_are_dropped() {
        let table = RateTable::from_rates(rates(&[
            ("EUR", 0.9),
            ("XXX", 0.0),
            ("YYY", -4.0),
            ("ZZZ", f64::NAN),
            ("WWW", f64::INFINITY),
        ]));
        assert!(table.contains("EUR"));
        assert!(!table.contains("XXX"));
        assert!(!table.contains("YYY"));
        assert!(!table.contains("ZZZ"));
        assert!(!table.contains("WWW"));
    }

    #[test]
    fn missing_currency_falls_back_to_parity() {
        let table = RateTable::from_rates(rates(&[("EUR", 0.9)]));
        assert_eq!(table.rate_for("KES"), 1.0);
    }
}
