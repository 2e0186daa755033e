//! Formatting for amounts and order dates.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};

/// Wire format for `order_date`: `YYYY-MM-DD HH:mm:ss`, local time.
pub const ORDER_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Value format of a date input.
pub const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";

const ID_SHORT_MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "Mei", "Jun", "Jul", "Agu", "Sep", "Okt", "Nov", "Des",
];

pub fn format_order_datetime(dt: &NaiveDateTime) -> String {
    dt.format(ORDER_DATETIME_FORMAT).to_string()
}

/// Parse an `order_date` as the backend returns it. Accepts the wire format,
/// naive ISO (`T` separator), RFC 3339 (converted to local time), and a bare
/// date (midnight).
pub fn parse_order_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, ORDER_DATETIME_FORMAT) {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    NaiveDate::parse_from_str(raw, DATE_INPUT_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// `05 Mar 2024`. Unparseable input is returned unchanged.
pub fn format_order_date(raw: &str) -> String {
    match parse_order_datetime(raw) {
        Some(dt) => format!(
            "{:02} {} {}",
            dt.day(),
            ID_SHORT_MONTHS[dt.month0() as usize],
            dt.year()
        ),
        None => raw.to_string(),
    }
}

/// `Rp 1.234.567` with Indonesian grouping; up to two decimals after a comma.
pub fn format_rupiah(amount: f64) -> String {
    if !amount.is_finite() {
        return "Rp 0".to_string();
    }
    let cents = (amount.abs() * 100.0).round() as u128;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    if frac == 0 {
        format!("Rp {sign}{grouped}")
    } else {
        let frac = format!("{frac:02}");
        format!("Rp {sign}{grouped},{}", frac.trim_end_matches('0'))
    }
}
