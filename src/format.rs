// pt-BR presentation helpers
//
// Mirrors what Intl produces for locale "pt-BR": currency "R$ 1.200,50",
// short dates "20/01/24", long month names in lowercase.

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

const MONTHS_PT_BR: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// Format an amount as Brazilian Real, two decimals, '.' thousands and ',' decimals
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();

    // Always two fractional digits, e.g. "1200.50"
    let plain = format!("{:.2}", rounded.abs());
    let (integer, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let sign = if negative { "-" } else { "" };
    format!("{}R$ {},{}", sign, group_thousands(integer), fraction)
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}

/// "DD/MM/YY"
pub fn format_short_date(date: NaiveDate) -> String {
    date.format("%d/%m/%y").to_string()
}

pub fn month_name(date: NaiveDate) -> &'static str {
    MONTHS_PT_BR[date.month0() as usize]
}

/// "20 de janeiro" (day is not zero-padded)
pub fn day_of_month_label(date: NaiveDate) -> String {
    format!("{} de {}", date.day(), month_name(date))
}

/// "01 a 20 de janeiro": from the first of the month up to `date`
pub fn month_interval_label(date: NaiveDate) -> String {
    format!("01 a {}", day_of_month_label(date))
}
