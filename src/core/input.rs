//! Validation of raw trade inputs.
//!
//! Turns user-entered text into the numbers and dates an
//! [`OptionContract`](crate::core::contract::OptionContract) is built from.
//! Only the interest rate may be negative. Dates are accepted as
//! `DD/MM/YYYY` or ISO `YYYY-MM-DD`.

use chrono::{Datelike, NaiveDate};
use log::warn;
use thiserror::Error;

/// Errors for a single input field.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("{field} is required")]
    Missing { field: String },
    #[error("{field} must be numeric, got '{value}'")]
    NotNumeric { field: String, value: String },
    #[error("{field} cannot be negative, got {value}")]
    Negative { field: String, value: String },
    #[error("{field} must be a date in DD/MM/YYYY or YYYY-MM-DD format, got '{value}'")]
    BadDate { field: String, value: String },
}

/// Which date the user last edited, used to pick the field to correct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditedDate {
    Trade,
    Expiration,
}

/// Outcome of [`reconcile_dates`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub trade_date: NaiveDate,
    pub expiration_date: NaiveDate,
    /// Whether one of the dates had to be reset.
    pub corrected: bool,
}

/// Keystroke-level check: would this partial entry be accepted while typing?
///
/// Empty text and a lone `.` are always accepted, a lone `-` only when
/// negatives are allowed.
pub fn is_partial_numeric(text: &str, allow_negative: bool) -> bool {
    match text {
        "" | "." => true,
        "-" => allow_negative,
        _ if text.starts_with('-') && !allow_negative => false,
        _ => text.parse::<f64>().is_ok(),
    }
}

/// Parse a price or volatility field. Negative values are rejected.
pub fn parse_amount(field: &str, text: &str) -> Result<f64, InputError> {
    let value = parse_number(field, text)?;
    if value < 0.0 {
        return Err(InputError::Negative {
            field: field.to_string(),
            value: text.trim().to_string(),
        });
    }
    Ok(value)
}

/// Parse an interest rate field (percent units). Negative rates are valid.
pub fn parse_rate(field: &str, text: &str) -> Result<f64, InputError> {
    parse_number(field, text)
}

/// Parse a date field.
pub fn parse_date(field: &str, text: &str) -> Result<NaiveDate, InputError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(InputError::Missing {
            field: field.to_string(),
        });
    }
    NaiveDate::parse_from_str(trimmed, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
        .map_err(|_| InputError::BadDate {
            field: field.to_string(),
            value: trimmed.to_string(),
        })
}

/// Enforce `trade_date <= expiration_date`.
///
/// When the order is violated the field the user just edited is reset:
/// a trade date falls back to `today`, an expiration date to one year
/// after the trade date.
pub fn reconcile_dates(
    trade_date: NaiveDate,
    expiration_date: NaiveDate,
    edited: EditedDate,
    today: NaiveDate,
) -> DateRange {
    if trade_date <= expiration_date {
        return DateRange {
            trade_date,
            expiration_date,
            corrected: false,
        };
    }

    warn!(
        "trade date {} is after expiration date {}, resetting {:?} date",
        trade_date, expiration_date, edited
    );
    match edited {
        EditedDate::Trade => DateRange {
            trade_date: today,
            expiration_date,
            corrected: true,
        },
        EditedDate::Expiration => DateRange {
            trade_date,
            expiration_date: one_year_after(trade_date),
            corrected: true,
        },
    }
}

/// Same calendar day one year later; 29 February maps to 28 February.
pub fn one_year_after(date: NaiveDate) -> NaiveDate {
    let year = date.year() + 1;
    date.with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
        .unwrap_or(date)
}

fn parse_number(field: &str, text: &str) -> Result<f64, InputError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(InputError::Missing {
            field: field.to_string(),
        });
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(InputError::NotNumeric {
            field: field.to_string(),
            value: trimmed.to_string(),
        }),
    }
}
