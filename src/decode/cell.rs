//! Cell values and per-field coercions
//!
//! Every coercion is total: a malformed cell degrades to the field's default
//! instead of failing the row.

use calamine::Data;
use chrono::NaiveDate;

use crate::model::InitiativeStatus;

/// A single spreadsheet cell, reduced to the shapes the decoder cares about
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl CellValue {
    /// Empty, or text that is only whitespace
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) => false,
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => Self::Number(*i as f64),
            Data::Float(f) => Self::Number(*f),
            Data::String(s) => Self::Text(s.clone()),
            Data::Bool(b) => Self::Text(b.to_string()),
            Data::DateTime(dt) => Self::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Self::Text(s.clone()),
            Data::Error(_) | Data::Empty => Self::Empty,
        }
    }
}

/// Currency markers and separators stripped before parsing a cost string
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyFormat {
    /// Matched ASCII case-insensitively anywhere in the string
    pub markers: Vec<String>,
    pub thousands_separator: char,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            markers: vec!["RM".into(), "MYR".into(), "USD".into(), "$".into()],
            thousands_separator: ',',
        }
    }
}

/// Stringify a cell; missing or empty cells become `""`
pub fn to_text(cell: &CellValue) -> String {
    match cell {
        CellValue::Empty => String::new(),
        CellValue::Text(s) => s.clone(),
        CellValue::Number(n) => format_number(*n),
    }
}

/// Date coercion: serials become `YYYY-MM-DD`, text passes through verbatim
pub fn to_date(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Number(serial) => serial_to_iso_date(*serial),
        CellValue::Text(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Cost coercion; always returns a finite, non-negative amount
pub fn to_cost(cell: &CellValue, format: &CurrencyFormat) -> f64 {
    let amount = match cell {
        CellValue::Number(n) => *n,
        CellValue::Text(s) => parse_currency(s, format).unwrap_or(0.0),
        CellValue::Empty => 0.0,
    };
    if amount.is_finite() && amount > 0.0 {
        amount
    } else {
        0.0
    }
}

pub fn to_status(cell: &CellValue) -> InitiativeStatus {
    InitiativeStatus::normalize(&to_text(cell))
}

/// Parse a currency-formatted string such as `"RM 12,500"`
pub fn parse_currency(raw: &str, format: &CurrencyFormat) -> Option<f64> {
    let mut cleaned = raw.to_string();
    for marker in &format.markers {
        cleaned = strip_ascii_case_insensitive(&cleaned, marker);
    }
    let cleaned: String = cleaned
        .chars()
        .filter(|c| !c.is_whitespace() && *c != format.thousands_separator)
        .collect();
    leading_decimal(&cleaned)
}

/// Decode a 1900-system date serial (fractional time is ignored)
pub fn serial_to_iso_date(serial: f64) -> Option<String> {
    // 2958465 is 9999-12-31, the last representable spreadsheet date
    if !serial.is_finite() || serial < 1.0 || serial > 2_958_465.0 {
        return None;
    }
    let days = serial.floor() as i64;
    if days == 60 {
        // Serial 60 is the nonexistent 1900-02-29
        return Some("1900-02-29".to_string());
    }
    let base = if days < 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    let date = base.checked_add_signed(chrono::Duration::days(days))?;
    Some(date.format("%Y-%m-%d").to_string())
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn strip_ascii_case_insensitive(haystack: &str, needle: &str) -> String {
    if needle.is_empty() {
        return haystack.to_string();
    }
    let mut out = String::with_capacity(haystack.len());
    let mut skip_until = 0;
    for (i, c) in haystack.char_indices() {
        if i < skip_until {
            continue;
        }
        let matches = haystack
            .get(i..i + needle.len())
            .is_some_and(|window| window.eq_ignore_ascii_case(needle));
        if matches {
            skip_until = i + needle.len();
        } else {
            out.push(c);
        }
    }
    out
}

/// Longest leading decimal literal, e.g. `"12.5abc"` -> 12.5
fn leading_decimal(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let mut seen_digit = false;
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }
    if !seen_digit {
        return None;
    }
    s[..end].parse::<f64>().ok()
}
