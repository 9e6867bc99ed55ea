//! Domain logic for parity pricing lives here.

pub mod entities;
pub mod parity;

pub use entities::{Country, PricingRow, RateTable, REFERENCE_CURRENCY};
#[allow(unused_imports)]
pub use parity::{
    build_pricing_table, charm_round, price_for, resolve_multiplier, sanitize_base_amount,
    ParityPrice, DEFAULT_MULTIPLIER, HOME_COUNTRY_CODE,
};
