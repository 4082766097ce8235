//! Error types for historical VaR

use crate::core::currency::CurrencyCode;
use crate::core::series::SeriesError;
use thiserror::Error;

/// Errors that can occur while building a VaR engine or extracting a quantile.
#[derive(Debug, Error)]
pub enum VarError {
    #[error("invalid historical series: {0}")]
    Series(#[from] SeriesError),

    #[error("insufficient data: {observations} P&L observations, need at least {required}")]
    InsufficientData { observations: usize, required: usize },

    #[error("invalid confidence level: {confidence} (must be strictly between 0 and 1)")]
    InvalidConfidence { confidence: f64 },

    #[error("spot notional for {currency} must be finite, got {value}")]
    InvalidNotional { currency: CurrencyCode, value: f64 },

    #[error("export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VarError>;
