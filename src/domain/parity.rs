//! Purchasing-power parity pricing: multiplier resolution, charm rounding,
//! and the per-country price computation.

use std::collections::HashMap;
use std::sync::OnceLock;

use super::entities::{Country, PricingRow, RateTable};

/// Country code whose buyers always pay the full base price.
pub const HOME_COUNTRY_CODE: &str = "US";

/// Multiplier for regions the table doesn't know (or records without a region).
pub const DEFAULT_MULTIPLIER: f64 = 0.8;

/// Fixed region → purchasing-power multiplier table. Initialized once,
/// never mutated.
fn region_multipliers() -> &'static HashMap<&'static str, f64> {
    static TABLE: OnceLock<HashMap<&'static str, f64>> = OnceLock::new();
    TABLE.get_or_init(|| {
        HashMap::from([
            ("Africa", 0.5),
            ("Americas", 0.75),
            ("Asia", 0.7),
            ("Europe", 1.0),
            ("Oceania", 0.95),
        ])
    })
}

/// Resolve the parity multiplier for one country.
///
/// The home market always resolves to 1.0, regardless of region. Everything
/// else goes through the region table, defaulting for unknown or absent
/// regions. Total: always returns a positive multiplier.
pub fn resolve_multiplier(country_code: &str, region: Option<&str>) -> f64 {
    if country_code == HOME_COUNTRY_CODE {
        return 1.0;
    }
    region
        .and_then(|name| region_multipliers().get(name).copied())
        .unwrap_or(DEFAULT_MULTIPLIER)
}

/// Round a price up to the nearest value ending in .99.
///
/// Non-finite and non-positive inputs collapse to 0. For positive inputs the
/// result is always `>= value` — quoting below the raw amount is not allowed,
/// so an input already above `floor(value) + 0.99` (e.g. 5.995) moves up to
/// the next .99 step rather than down.
pub fn charm_round(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }
    let whole = value.floor();
    let candidate = whole + 0.99;
    if candidate >= value {
        round_cents(candidate)
    } else {
        round_cents(whole + 1.99)
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Coerce a caller-supplied base amount into the engine's domain: anything
/// non-finite or non-positive prices as zero instead of being rejected.
pub fn sanitize_base_amount(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// The two figures computed for one country.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParityPrice {
    /// Charm-rounded price in the reference currency.
    pub reference: f64,
    /// Charm-rounded price in the local currency.
    pub local: f64,
}

/// Compute both prices for one country.
///
/// The local price derives from the already-rounded reference price, not the
/// raw product: both displayed figures must independently end in .99, so
/// rounding happens twice, sequentially.
pub fn price_for(base_amount: f64, multiplier: f64, local_rate: f64) -> ParityPrice {
    let reference = charm_round(base_amount * multiplier);
    let local = charm_round(reference * local_rate);
    ParityPrice { reference, local }
}

/// Build the full pricing table: one row per country, sorted by country name
/// ascending, case-insensitive. Pure: inputs are untouched and identical
/// inputs always produce the identical sequence.
pub fn build_pricing_table(
    countries: &[Country],
    base_amount: f64,
    rates: &RateTable,
) -> Vec<PricingRow> {
    let base_amount = sanitize_base_amount(base_amount);

    let mut rows: Vec<PricingRow> = countries
        .iter()
        .map(|country| {
            let multiplier = resolve_multiplier(&country.country_code, country.region.as_deref());
            let local_rate = rates.rate_for(&country.currency_code);
            let price = price_for(base_amount, multiplier, local_rate);
            PricingRow {
                country: country.name.clone(),
                country_code: country.country_code.clone(),
                currency_code: country.currency_code.clone(),
                parity_multiplier: multiplier,
                local_rate,
                reference_price: price.reference,
                local_price: price.local,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        a.country
            .to_lowercase()
            .cmp(&b.country.to_lowercase())
            .then_with(|| a.country.cmp(&b.country))
    });
    rows
}
