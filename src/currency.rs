//! Formatting of amounts and percentages for notification text.

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};

/// Format `number` as dollars and cents, e.g. "$1,234.50" or "-$12.30".
pub fn format_currency(number: f64) -> String {
    static POSITIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| {
        Formatter::currency("$")
            .ok()
            .map(|formatter| formatter.precision(Precision::Decimals(2)))
    });

    static NEGATIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| {
        Formatter::currency("-$")
            .ok()
            .map(|formatter| formatter.precision(Precision::Decimals(2)))
    });

    let formatted_string = match (positive_fmt, negative_fmt) {
        (Some(positive_fmt), Some(negative_fmt)) => {
            if number < 0.0 {
                negative_fmt.fmt_string(number.abs())
            } else if number > 0.0 {
                positive_fmt.fmt_string(number)
            } else {
                // Zero is hardcoded as "0", so we must specify the formatted string for zero
                return "$0.00".to_owned();
            }
        }
        _ => return plain_currency(number),
    };

    pad_cents(formatted_string)
}

/// Format `percentage` with one decimal place, e.g. "85.0%".
pub fn format_percentage(percentage: f64) -> String {
    format!("{percentage:.1}%")
}

// numfmt drops trailing zeros after the decimal point, e.g. "12.30" is
// rendered as "12.3" and "12.00" as "12".
fn pad_cents(formatted_string: String) -> String {
    match formatted_string.rfind('.') {
        Some(dot) => {
            let decimals = formatted_string.len() - dot - 1;
            format!("{formatted_string}{}", "0".repeat(2usize.saturating_sub(decimals)))
        }
        None => format!("{formatted_string}.00"),
    }
}

fn plain_currency(number: f64) -> String {
    if number < 0.0 {
        format!("-${:.2}", number.abs())
    } else {
        format!("${number:.2}")
    }
}

#[cfg(test)]
mod currency_tests {
    use super::{format_currency, format_percentage, pad_cents};

    #[test]
    fn zero_has_two_decimal_places() {
        assert_eq!(format_currency(0.0), "$0.00");
    }

    #[test]
    fn negative_amounts_have_leading_minus() {
        assert!(format_currency(-12.5).starts_with("-$"));
    }

    #[test]
    fn amounts_always_have_two_decimal_places() {
        for amount in [1.0, 12.3, 170.0, 1234.56] {
            let formatted = format_currency(amount);
            let dot = formatted.rfind('.').expect("missing decimal point");

            assert_eq!(formatted.len() - dot - 1, 2, "got {formatted}");
        }
    }

    #[test]
    fn pad_cents_fills_missing_zeros() {
        assert_eq!(pad_cents("$12.3".to_owned()), "$12.30");
        assert_eq!(pad_cents("$12".to_owned()), "$12.00");
        assert_eq!(pad_cents("$12.34".to_owned()), "$12.34");
    }

    #[test]
    fn percentage_has_one_decimal_place() {
        assert_eq!(format_percentage(85.0), "85.0%");
        assert_eq!(format_percentage(104.999), "105.0%");
    }
}
