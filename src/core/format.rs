//! Locale-aware money formatting for converted amounts.
//!
//! Covers the grouping, decimal and symbol placement conventions of a few
//! common locales; anything else is rendered the `en-US` way.

use crate::core::rate::ConvertedAmount;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

const NBSP: &str = "\u{a0}";
const NARROW_NBSP: &str = "\u{202f}";

struct LocaleFormat {
    group: &'static str,
    decimal: &'static str,
    symbol_after: bool,
    symbol_space: bool,
}

const EN: LocaleFormat = LocaleFormat {
    group: ",",
    decimal: ".",
    symbol_after: false,
    symbol_space: false,
};

const DE: LocaleFormat = LocaleFormat {
    group: ".",
    decimal: ",",
    symbol_after: true,
    symbol_space: true,
};

const FR: LocaleFormat = LocaleFormat {
    group: NARROW_NBSP,
    decimal: ",",
    symbol_after: true,
    symbol_space: true,
};

const PT: LocaleFormat = LocaleFormat {
    group: ".",
    decimal: ",",
    symbol_after: false,
    symbol_space: true,
};

fn locale_format(locale: &str) -> &'static LocaleFormat {
    let language = locale
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match language.as_str() {
        "de" | "it" => &DE,
        "fr" => &FR,
        "pt" => &PT,
        _ => &EN,
    }
}

fn currency_symbol(currency: &str) -> &str {
    match currency {
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" => "¥",
        "INR" => "₹",
        "CNY" => "CN¥",
        "KRW" => "₩",
        "CAD" => "CA$",
        "AUD" => "A$",
        "NZD" => "NZ$",
        "BRL" => "R$",
        "MXN" => "MX$",
        "ILS" => "₪",
        "VND" => "₫",
        _ => currency,
    }
}

fn group_digits(digits: &str, separator: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 * separator.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push_str(separator);
        }
        grouped.push(ch);
    }
    grouped
}

/// Formats `amount` in `currency` with exactly two fraction digits.
///
/// The sign follows the unrounded amount, so `-0.001` renders as `-$0.00`.
pub fn format_amount(amount: f64, currency: &str, locale: &str) -> String {
    let Some(value) = Decimal::from_f64(amount) else {
        return format!("{amount} {currency}");
    };
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let fixed = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let style = locale_format(locale);
    let number = format!(
        "{}{}{}",
        group_digits(int_part, style.group),
        style.decimal,
        frac_part
    );

    let symbol = currency_symbol(currency);
    // Alphabetic symbols (ISO codes, "CHF") never touch the digits.
    let space = if style.symbol_space || symbol.ends_with(|c: char| c.is_ascii_alphabetic()) {
        NBSP
    } else {
        ""
    };
    let sign = if amount.is_sign_negative() { "-" } else { "" };

    if style.symbol_after {
        format!("{sign}{number}{NBSP}{symbol}")
    } else {
        format!("{sign}{symbol}{space}{number}")
    }
}

pub fn format_converted(converted: &ConvertedAmount, locale: &str) -> String {
    format_amount(converted.converted_amount, &converted.target_currency, locale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_en_us_format() {
        assert_eq!(format_amount(1234.5, "USD", "en-US"), "$1,234.50");
        assert_eq!(format_amount(1234567.891, "USD", "en-US"), "$1,234,567.89");
        assert_eq!(format_amount(0.0, "GBP", "en-GB"), "£0.00");
        assert_eq!(format_amount(999.0, "EUR", "en-US"), "€999.00");
    }

    #[test]
    fn test_continental_formats() {
        assert_eq!(format_amount(1234.5, "EUR", "de-DE"), "1.234,50\u{a0}€");
        assert_eq!(
            format_amount(1234.5, "EUR", "fr-FR"),
            "1\u{202f}234,50\u{a0}€"
        );
        assert_eq!(format_amount(1234.5, "BRL", "pt-BR"), "R$\u{a0}1.234,50");
    }

    #[test]
    fn test_unknown_currency_uses_code() {
        assert_eq!(format_amount(1234.5, "CHF", "en-US"), "CHF\u{a0}1,234.50");
        assert_eq!(format_amount(10.0, "XYZ", "de-DE"), "10,00\u{a0}XYZ");
    }

    #[test]
    fn test_unknown_locale_falls_back_to_en() {
        assert_eq!(format_amount(1234.5, "USD", "xx-YY"), "$1,234.50");
        assert_eq!(format_amount(1234.5, "USD", ""), "$1,234.50");
    }

    #[test]
    fn test_negative_and_rounding() {
        assert_eq!(format_amount(-1234.5, "USD", "en-US"), "-$1,234.50");
        assert_eq!(format_amount(0.125, "USD", "en-US"), "$0.13");
        assert_eq!(format_amount(-0.001, "USD", "en-US"), "-$0.00");
        assert_eq!(format_amount(-0.004, "EUR", "de-DE"), "-0,00\u{a0}€");
    }

    #[test]
    fn test_format_converted_uses_target_currency() {
        let converted = ConvertedAmount {
            original_amount: 100.0,
            original_currency: "USD".to_string(),
            converted_amount: 92.0,
            target_currency: "EUR".to_string(),
            exchange_rate: 0.92,
            rate_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        };

        assert_eq!(format_converted(&converted, "en-US"), "€92.00");
        assert_eq!(format_converted(&converted, "de_DE"), "92,00\u{a0}€");
    }
}
