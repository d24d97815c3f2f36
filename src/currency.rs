//! Formatting amounts in a user's display currency.

use numfmt::{Formatter, Precision};

/// The symbol shown in front of amounts in `currency`.
///
/// Unknown codes are shown as the code followed by a space, e.g. "SEK 12.00".
pub fn currency_symbol(currency: &str) -> String {
    match currency.trim().to_uppercase().as_str() {
        "EUR" => "€".to_owned(),
        "USD" => "$".to_owned(),
        "GBP" => "£".to_owned(),
        "JPY" => "¥".to_owned(),
        "CAD" => "CA$".to_owned(),
        "AUD" => "A$".to_owned(),
        "NZD" => "NZ$".to_owned(),
        code => format!("{code} "),
    }
}

/// Format `amount` with two decimal places, e.g. "€1,234.50" or "-$12.30".
pub fn format_currency(amount: f64, currency: &str) -> String {
    format_with_decimals(amount, currency, 2)
}

/// Format `amount` rounded to the nearest whole unit, e.g. "€1,235".
pub fn format_currency_rounded(amount: f64, currency: &str) -> String {
    format_with_decimals(amount.round(), currency, 0)
}

// numfmt switches to scientific notation from twelve integer digits upwards.
const SCIENTIFIC_NOTATION_CUTOFF: f64 = 1e12;

fn format_with_decimals(amount: f64, currency: &str, decimals: u8) -> String {
    let symbol = currency_symbol(currency);
    let amount = if amount.is_finite() { amount } else { 0.0 };

    // numfmt truncates extra digits and prints tiny values in scientific
    // notation, so round to the displayed precision first.
    let scale = 10f64.powi(decimals as i32);
    let magnitude = (amount.abs() * scale).round() / scale;

    // Zero is hardcoded as "0", so we must specify the formatted string for zero
    if magnitude == 0.0 {
        return pad_decimals(format!("{symbol}0"), decimals);
    }

    let prefix = if amount < 0.0 {
        format!("-{symbol}")
    } else {
        symbol
    };

    if magnitude >= SCIENTIFIC_NOTATION_CUTOFF {
        return format!("{prefix}{}", group_thousands(magnitude, decimals));
    }

    let formatted = match Formatter::currency(&prefix) {
        Ok(formatter) => formatter
            .precision(Precision::Decimals(decimals))
            .fmt_string(magnitude),
        Err(error) => {
            tracing::warn!("could not create a currency formatter for \"{prefix}\": {error:?}");
            format!("{prefix}{}", group_thousands(magnitude, decimals))
        }
    };

    pad_decimals(formatted, decimals)
}

fn group_thousands(magnitude: f64, decimals: u8) -> String {
    let plain = format!("{magnitude:.*}", decimals as usize);
    let (whole, fraction) = match plain.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (plain.as_str(), None),
    };

    let mut grouped = String::with_capacity(plain.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match fraction {
        Some(fraction) => format!("{grouped}.{fraction}"),
        None => grouped,
    }
}

// numfmt omits trailing zeros, so "12.30" is rendered as "12.3" and we add them back.
fn pad_decimals(formatted: String, decimals: u8) -> String {
    let decimals = decimals as usize;

    if decimals == 0 {
        return match formatted.split_once('.') {
            Some((whole, _)) => whole.to_owned(),
            None => formatted,
        };
    }

    match formatted.split_once('.') {
        Some((whole, fraction)) if fraction.len() < decimals => {
            format!("{whole}.{fraction:0<decimals$}")
        }
        Some(_) => formatted,
        None => format!("{formatted}.{}", "0".repeat(decimals)),
    }
}

#[cfg(test)]
mod tests {
    use super::{currency_symbol, format_currency, format_currency_rounded};

    #[test]
    fn known_currencies_use_symbols() {
        assert_eq!(currency_symbol("EUR"), "€");
        assert_eq!(currency_symbol("usd"), "$");
        assert_eq!(currency_symbol("SEK"), "SEK ");
    }

    #[test]
    fn formats_two_decimal_places() {
        assert_eq!(format_currency(12.3, "EUR"), "€12.30");
        assert_eq!(format_currency(12.0, "USD"), "$12.00");
        assert_eq!(format_currency(0.5, "GBP"), "£0.50");
        assert_eq!(format_currency(99.99, "EUR"), "€99.99");
    }

    #[test]
    fn formats_negative_amounts() {
        assert_eq!(format_currency(-12.3, "USD"), "-$12.30");
        assert_eq!(format_currency_rounded(-12.3, "USD"), "-$12");
    }

    #[test]
    fn formats_zero() {
        assert_eq!(format_currency(0.0, "EUR"), "€0.00");
        assert_eq!(format_currency_rounded(0.0, "EUR"), "€0");
        assert_eq!(format_currency_rounded(0.2, "EUR"), "€0");
    }

    #[test]
    fn float_leftovers_round_to_zero() {
        assert_eq!(format_currency(0.1 + 0.2 - 0.3, "EUR"), "€0.00");
        assert_eq!(format_currency(-(0.1 + 0.2 - 0.3), "EUR"), "€0.00");
        assert_eq!(format_currency(0.001, "EUR"), "€0.00");
        assert_eq!(format_currency_rounded(-0.4, "EUR"), "€0");
    }

    #[test]
    fn rounds_instead_of_truncating() {
        assert_eq!(format_currency(0.005, "EUR"), "€0.01");
        assert_eq!(format_currency(999.999, "EUR"), "€1,000.00");
        assert_eq!(format_currency(1234.567, "USD"), "$1,234.57");
        assert_eq!(format_currency(-999.999, "USD"), "-$1,000.00");
    }

    #[test]
    fn large_amounts_keep_every_digit() {
        assert_eq!(format_currency(1e12, "EUR"), "€1,000,000,000,000.00");
        assert_eq!(format_currency_rounded(1e12, "EUR"), "€1,000,000,000,000");
        assert_eq!(format_currency(123_456_789.5, "EUR"), "€123,456,789.50");
    }

    #[test]
    fn rounds_to_whole_units() {
        assert_eq!(format_currency_rounded(12.5, "EUR"), "€13");
        assert_eq!(format_currency_rounded(99.4, "EUR"), "€99");
    }
}
