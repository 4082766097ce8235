//! Tail quantiles of a P&L sample.
//!
//! Order statistics are 1-indexed and ascending, so `x(1)` is the worst
//! P&L in the sample.

use crate::risk::error::{Result, VarError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Weight on the 2nd and 3rd smallest observations in the reference blend.
const REFERENCE_WEIGHTS: (f64, f64) = (0.4, 0.6);

/// Observations needed before the 3rd smallest value exists.
pub const REFERENCE_MIN_OBSERVATIONS: usize = 3;

/// How the VaR quantile is read off the sorted P&L sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum QuantileRule {
    /// `0.4·x(2) + 0.6·x(3)`, the 99% quantile for a 260-day window.
    #[default]
    ReferenceWindow,
    /// Linear interpolation at rank `(1 − confidence)·N`.
    Interpolated { confidence: f64 },
}

impl fmt::Display for QuantileRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuantileRule::ReferenceWindow => write!(f, "reference window (0.4·x(2) + 0.6·x(3))"),
            QuantileRule::Interpolated { confidence } => {
                write!(f, "interpolated at {:.2}% confidence", confidence * 100.0)
            }
        }
    }
}

impl QuantileRule {
    /// Evaluate the rule on an unsorted sample.
    pub fn evaluate(&self, values: &[f64]) -> Result<f64> {
        match *self {
            QuantileRule::ReferenceWindow => reference_window_quantile(values),
            QuantileRule::Interpolated { confidence } => interpolated_quantile(values, confidence),
        }
    }

    /// Confidence level the rule targets.
    pub fn confidence(&self) -> f64 {
        match *self {
            QuantileRule::ReferenceWindow => 0.99,
            QuantileRule::Interpolated { confidence } => confidence,
        }
    }
}

/// Sample sorted ascending.
pub fn order_statistics(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// `0.4 × (2nd smallest) + 0.6 × (3rd smallest)`.
pub fn reference_window_quantile(values: &[f64]) -> Result<f64> {
    if values.len() < REFERENCE_MIN_OBSERVATIONS {
        return Err(VarError::InsufficientData {
            observations: values.len(),
            required: REFERENCE_MIN_OBSERVATIONS,
        });
    }
    let sorted = order_statistics(values);
    let (w2, w3) = REFERENCE_WEIGHTS;
    Ok(w2 * sorted[1] + w3 * sorted[2])
}

/// Quantile at `confidence`, interpolating between the two order
/// statistics that bracket rank `p = (1 − confidence)·N`.
///
/// With `k = ⌊p⌋` and `w = p − k` the result is `(1 − w)·x(k) + w·x(k+1)`.
/// A sample too small to reach rank 1 is rejected.
pub fn interpolated_quantile(values: &[f64], confidence: f64) -> Result<f64> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(VarError::InvalidConfidence { confidence });
    }

    let n = values.len();
    let position = (1.0 - confidence) * n as f64;
    let rank = position.floor() as usize;
    if rank < 1 {
        return Err(VarError::InsufficientData {
            observations: n,
            required: (1.0 / (1.0 - confidence)).ceil() as usize,
        });
    }

    let sorted = order_statistics(values);
    let weight = position - rank as f64;
    let lower = sorted[rank - 1];
    if weight == 0.0 || rank >= n {
        return Ok(lower);
    }
    let upper = sorted[rank];
    Ok((1.0 - weight) * lower + weight * upper)
}
