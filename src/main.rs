//! Price parity scanner CLI.
//!
//! Fetches the country directory and the current exchange rates concurrently,
//! runs the parity pricing engine over them, and prints the resulting table.

mod domain;
mod infra;
mod report;
mod util;

use clap::Parser;
use colored::Colorize;

use crate::domain::{build_pricing_table, sanitize_base_amount, PricingRow};
use crate::infra::cache::format_age;
use crate::infra::exchange_rates::ExchangeRateClient;
use crate::infra::restcountries::CountryDirectoryClient;
use crate::infra::{CacheStatus, CachedPayload};

#[derive(Parser)]
#[command(name = "price-parity-scanner")]
#[command(about = "Purchasing-power adjusted pricing per country, from one base USD amount")]
#[command(version)]
struct Cli {
    /// Base price in USD. Non-positive or non-numeric amounts price as zero.
    #[arg(default_value_t = 99.0, allow_negative_numbers = true)]
    base_amount: f64,

    /// Skip the disk caches and refetch both sources
    #[arg(long)]
    refresh: bool,

    /// Show only the first N rows of the table
    #[arg(short, long, value_name = "N")]
    limit: Option<usize>,

    /// Restrict the table to these two-letter country codes (repeatable)
    #[arg(short, long = "country", value_name = "CODE")]
    countries: Vec<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let directory = match CountryDirectoryClient::new() {
        Ok(client) => client,
        Err(error) => fail(format!("failed to initialise country directory client: {error}")),
    };
    let exchange = match ExchangeRateClient::new() {
        Ok(client) => client,
        Err(error) => fail(format!("failed to initialise exchange rate client: {error}")),
    };

    // Both sources load concurrently; the engine only runs once both are in.
    let (countries, rates) = tokio::join!(
        directory.get_countries(cli.refresh),
        exchange.get_rates(cli.refresh),
    );

    let countries = match countries {
        Ok(payload) => payload,
        Err(error) => fail(format!("could not load country directory: {error}")),
    };
    let rates = match rates {
        Ok(payload) => payload,
        Err(error) => fail(format!("could not load exchange rates: {error}")),
    };

    warn_if_stale(&countries, "country directory");
    warn_if_stale(&rates, "exchange rates");

    let rows = build_pricing_table(&countries.data, cli.base_amount, &rates.data);
    let rows = filter_rows(rows, &cli.countries, cli.limit);

    if rows.is_empty() {
        println!("No countries matched the requested filters.");
        return;
    }

    println!();
    print!("{}", report::render_table(&rows));
    println!();
    println!(
        "{}",
        report::render_summary(
            rows.len(),
            sanitize_base_amount(cli.base_amount),
            &payload_age(&countries),
            &payload_age(&rates),
        )
    );
}

fn warn_if_stale<T>(payload: &CachedPayload<T>, source: &str) {
    if payload.status == CacheStatus::Stale {
        eprintln!(
            "{} {source} served from an expired cache; prices may be outdated.",
            "warning:".yellow().bold()
        );
    }
}

fn payload_age<T>(payload: &CachedPayload<T>) -> String {
    format_age(payload.fetched_at.elapsed().unwrap_or_default())
}

/// Apply the CLI's row filters: country-code selection first, then the row
/// limit. Sorting is the engine's concern and is left untouched.
fn filter_rows(rows: Vec<PricingRow>, codes: &[String], limit: Option<usize>) -> Vec<PricingRow> {
    let mut rows = if codes.is_empty() {
        rows
    } else {
        rows.into_iter()
            .filter(|row| {
                codes
                    .iter()
                    .any(|code| code.eq_ignore_ascii_case(&row.country_code))
            })
            .collect()
    };

    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    rows
}

fn fail(message: String) -> ! {
    eprintln!("{} {message}", "error:".red().bold());
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, code: &str) -> PricingRow {
        PricingRow {
            country: name.to_string(),
            country_code: code.to_string(),
            currency_code: "EUR".to_string(),
            parity_multiplier: 1.0,
            local_rate: 0.9,
            reference_price: 99.99,
            local_price: 90.99,
        }
    }

    #[test]
    fn country_filter_is_case_insensitive() {
        let rows = vec![row("Germany", "DE"), row("Kenya", "KE")];
        let filtered = filter_rows(rows, &["de".to_string()], None);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].country, "Germany");
    }

    #[test]
    fn limit_truncates_after_filtering() {
        let rows = vec![row("Austria", "AT"), row("Germany", "DE"), row("Kenya", "KE")];
        let filtered = filter_rows(
            rows,
            &["AT".to_string(), "KE".to_string()],
            Some(1),
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].country, "Austria");
    }

    #[test]
    fn no_filters_pass_everything_through() {
        let rows = vec![row("Austria", "AT"), row("Germany", "DE")];
        assert_eq!(filter_rows(rows.clone(), &[], None), rows);
    }
}
