//! Display formatting for prices, percentages, and addresses.

use rust_decimal::{Decimal, RoundingStrategy};

/// Minimum fraction digits shown for a price.
const PRICE_MIN_DP: usize = 2;
/// Maximum fraction digits shown for a price.
const PRICE_MAX_DP: u32 = 6;

/// Format a USD amount with 2 to 6 fraction digits and thousands separators.
///
/// `1234.5` becomes `$1,234.50`, `-0.0000123` becomes `-$0.000012`.
/// Negative amounts keep their sign even when they round to zero.
pub fn format_price(price: Decimal) -> String {
    let rounded = price
        .round_dp_with_strategy(PRICE_MAX_DP, RoundingStrategy::MidpointAwayFromZero)
        .normalize();

    let digits = rounded.abs().to_string();
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), ""));

    let mut frac = frac_part.to_string();
    while frac.len() < PRICE_MIN_DP {
        frac.push('0');
    }

    format!("{}${}.{}", sign(price), group_thousands(int_part), frac)
}

/// Format a ratio as a percentage with two decimals: `0.1234` becomes `12.34%`.
///
/// Ratios too large to scale by 100 render as `-`.
pub fn format_percentage(value: Decimal) -> String {
    let Some(percent) = value.checked_mul(Decimal::ONE_HUNDRED) else {
        return "-".to_string();
    };
    let rounded = percent
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{}{:.2}%", sign(value), rounded)
}

fn sign(value: Decimal) -> &'static str {
    if value < Decimal::ZERO {
        "-"
    } else {
        ""
    }
}

/// Abbreviate an address to its first 8 and last 6 characters.
///
/// Short inputs are not padded, so both halves may overlap.
pub fn format_token_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    let head: String = chars.iter().take(8).collect();
    let tail: String = chars[chars.len().saturating_sub(6)..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Shorten an opportunity id for chart labels.
pub fn format_short_id(id: &str) -> String {
    let head: String = id.chars().take(8).collect();
    format!("{}...", head)
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
