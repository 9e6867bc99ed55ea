//! Plain numeric formatting for the report. Currency symbols and locale
//! conventions are deliberately out of scope; amounts render as two-decimal
//! numbers with thousands separators, next to their currency code.

/// Format an amount with two decimals and comma-grouped thousands.
pub fn format_amount(value: f64) -> String {
    let formatted = format!("{value:.2}");
    match formatted.split_once('.') {
        Some((int_part, frac_part)) => format!("{}.{}", group_thousands(int_part), frac_part),
        None => formatted,
    }
}

fn group_thousands(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}")
}
