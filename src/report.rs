//! Text-table rendering of the pricing table. Presentation only: the numeric
//! contract lives in the domain layer.

use colored::Colorize;

use crate::domain::{PricingRow, REFERENCE_CURRENCY};
use crate::util::format::format_amount;

const HEADERS: [&str; 6] = [
    "Country",
    "Code",
    "Currency",
    "Multiplier",
    "Price (USD)",
    "Price (local)",
];

/// Numeric columns are right-aligned, text columns left-aligned.
const RIGHT_ALIGNED: [bool; 6] = [false, false, false, true, true, true];

/// Render the pricing table as a fixed-width text table.
pub fn render_table(rows: &[PricingRow]) -> String {
    let cells: Vec<[String; 6]> = rows
        .iter()
        .map(|row| {
            [
                row.country.clone(),
                row.country_code.clone(),
                row.currency_code.clone(),
                format!("{:.2}x", row.parity_multiplier),
                format_amount(row.reference_price),
                format_amount(row.local_price),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();

    let header_line = HEADERS
        .iter()
        .enumerate()
        .map(|(i, header)| pad(header, widths[i], RIGHT_ALIGNED[i]))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(&format!("{}\n", header_line.bold()));
    out.push_str(&"-".repeat(header_line.chars().count()));
    out.push('\n');

    for row in &cells {
        let line = row
            .iter()
            .enumerate()
            .map(|(i, cell)| pad(cell, widths[i], RIGHT_ALIGNED[i]))
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

/// One-line summary printed under the table.
pub fn render_summary(
    row_count: usize,
    base_amount: f64,
    countries_age: &str,
    rates_age: &str,
) -> String {
    format!(
        "{row_count} countries priced from a base of {} {REFERENCE_CURRENCY} (countries: {countries_age} old, rates: {rates_age} old)",
        format_amount(base_amount)
    )
}

fn pad(cell: &str, width: usize, right_align: bool) -> String {
    let padding = " ".repeat(width.saturating_sub(cell.chars().count()));
    if right_align {
        format!("{padding}{cell}")
    } else {
        format!("{cell}{padding}")
    }
}
