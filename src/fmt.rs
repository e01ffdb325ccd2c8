//! Display helpers for money and count values.
//!
//! Finding descriptions quote dollar amounts and quantities in the same
//! shape the invoices themselves use: absolute dollars with two decimal
//! places and thousands separators, counts with thousands separators.

/// Formats the absolute value of a dollar amount, e.g. `-1234.5` → `"$1,234.50"`.
pub fn money(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;
    format!("${}.{frac:02}", group_thousands(whole))
}

/// Formats a quantity with thousands separators, truncating any fraction
/// only when it is an integral value, e.g. `1200.0` → `"1,200"`.
pub fn count(quantity: f64) -> String {
    if quantity.fract() == 0.0 && quantity.abs() < 1e15 {
        let grouped = group_thousands(quantity.abs() as u64);
        if quantity < 0.0 {
            format!("-{grouped}")
        } else {
            grouped
        }
    } else {
        format!("{quantity}")
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
