use crate::core::contract::OptionContract;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised before or while evaluating the closed form.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    #[error("time to expiration must be positive, got {days} days")]
    DegenerateTime { days: i64 },
    #[error("volatility is zero; the closed form is singular")]
    ZeroVolatility,
    #[error("volatility cannot be negative, got {volatility}")]
    NegativeVolatility { volatility: f64 },
    #[error("{quantity} is not a finite number; check that spot and strike are positive")]
    NonFinite { quantity: &'static str },
    #[error("normal distribution error: {0}")]
    Distribution(String),
}

/// Which underlying price the formula is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingMethod {
    Spot,
    Forward,
}

impl fmt::Display for PricingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingMethod::Spot => write!(f, "spot"),
            PricingMethod::Forward => write!(f, "forward"),
        }
    }
}

impl FromStr for PricingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spot" => Ok(PricingMethod::Spot),
            "forward" => Ok(PricingMethod::Forward),
            other => Err(format!("unknown pricing method '{}'", other)),
        }
    }
}

/// A call/put price pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionPrices {
    pub call: f64,
    pub put: f64,
}

/// Black-Scholes pricer for a single European option contract.
///
/// Two equivalent derivations are offered: one from the spot price and
/// one from the forward price `F = S·e^(rT)`. Both reject contracts whose
/// `σ·√T` is zero rather than letting the division produce NaN or an
/// infinity. Callers that want the limiting value in those cases can ask
/// for [`BlackScholes::limiting_prices`] explicitly.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use fx_risk_engine::core::contract::OptionContract;
/// use fx_risk_engine::pricing::black_scholes::BlackScholes;
///
/// let contract = OptionContract::new(
///     NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     100.0,
///     100.0,
///     5.0,
///     0.2,
/// );
/// let prices = BlackScholes::new(contract).price_via_spot().unwrap();
///
/// assert!((prices.call - 10.4506).abs() < 1e-4);
/// assert!((prices.put - 5.5735).abs() < 1e-4);
/// ```
#[derive(Debug, Clone)]
pub struct BlackScholes {
    contract: OptionContract,
}

impl BlackScholes {
    pub fn new(contract: OptionContract) -> Self {
        Self { contract }
    }

    pub fn contract(&self) -> &OptionContract {
        &self.contract
    }

    /// Price with the chosen derivation.
    pub fn price(&self, method: PricingMethod) -> Result<OptionPrices, PricingError> {
        match method {
            PricingMethod::Spot => self.price_via_spot(),
            PricingMethod::Forward => self.price_via_forward(),
        }
    }

    /// Call and put prices from the spot price.
    ///
    /// ```text
    /// d1   = [ln(S/K) + (r + σ²/2)·T] / (σ·√T)
    /// d2   = d1 − σ·√T
    /// call = S·Φ(d1) − K·e^(−rT)·Φ(d2)
    /// put  = K·e^(−rT)·Φ(−d2) − S·Φ(−d1)
    /// ```
    pub fn price_via_spot(&self) -> Result<OptionPrices, PricingError> {
        let vol_sqrt_t = self.check_preconditions()?;
        let c = &self.contract;
        let (s, k, r, sigma, t) = (
            c.spot_price(),
            c.strike_price(),
            c.interest_rate(),
            c.volatility(),
            c.time_to_expiration(),
        );

        let d1 = ((s / k).ln() + (r + sigma * sigma / 2.0) * t) / vol_sqrt_t;
        let d2 = d1 - vol_sqrt_t;
        let (n_d1, n_d2, n_neg_d1, n_neg_d2) = cdf_terms(d1, d2)?;
        let discounted_strike = k * c.discount_factor();

        let prices = OptionPrices {
            call: s * n_d1 - discounted_strike * n_d2,
            put: discounted_strike * n_neg_d2 - s * n_neg_d1,
        };
        debug!(
            "spot pricing: d1={:.6} d2={:.6} call={:.6} put={:.6}",
            d1, d2, prices.call, prices.put
        );
        ensure_finite(prices)
    }

    /// Call and put prices from the forward price.
    ///
    /// ```text
    /// d1   = [ln(F/K) + (σ²/2)·T] / (σ·√T)
    /// d2   = d1 − σ·√T
    /// call = e^(−rT)·[F·Φ(d1) − K·Φ(d2)]
    /// put  = e^(−rT)·[K·Φ(−d2) − F·Φ(−d1)]
    /// ```
    ///
    /// The rate drift is already inside `F`, so d1 here equals the spot
    /// d1 and both methods agree up to rounding.
    pub fn price_via_forward(&self) -> Result<OptionPrices, PricingError> {
        let vol_sqrt_t = self.check_preconditions()?;
        let c = &self.contract;
        let (f, k, sigma, t) = (
            c.forward_price(),
            c.strike_price(),
            c.volatility(),
            c.time_to_expiration(),
        );

        let d1 = ((f / k).ln() + sigma * sigma / 2.0 * t) / vol_sqrt_t;
        let d2 = d1 - vol_sqrt_t;
        let (n_d1, n_d2, n_neg_d1, n_neg_d2) = cdf_terms(d1, d2)?;
        let df = c.discount_factor();

        let prices = OptionPrices {
            call: df * (f * n_d1 - k * n_d2),
            put: df * (k * n_neg_d2 - f * n_neg_d1),
        };
        debug!(
            "forward pricing: F={:.6} d1={:.6} d2={:.6} call={:.6} put={:.6}",
            f, d1, d2, prices.call, prices.put
        );
        ensure_finite(prices)
    }

    /// Limit of the closed form as `σ·√T → 0⁺`.
    ///
    /// `call = max(S − K·e^(−rT), 0)`, `put = max(K·e^(−rT) − S, 0)`, with
    /// T clamped at zero. At expiry this is the plain intrinsic value.
    pub fn limiting_prices(&self) -> OptionPrices {
        let c = &self.contract;
        let t = c.time_to_expiration().max(0.0);
        let discounted_strike = c.strike_price() * (-c.interest_rate() * t).exp();
        OptionPrices {
            call: (c.spot_price() - discounted_strike).max(0.0),
            put: (discounted_strike - c.spot_price()).max(0.0),
        }
    }

    /// `call − put − (S − K·e^(−rT))`; zero when put-call parity holds.
    pub fn put_call_parity_gap(&self, prices: &OptionPrices) -> f64 {
        let c = &self.contract;
        prices.call - prices.put - (c.spot_price() - c.strike_price() * c.discount_factor())
    }

    /// Returns `σ·√T` once the closed form is known to be well defined.
    fn check_preconditions(&self) -> Result<f64, PricingError> {
        let c = &self.contract;
        if c.time_to_expiration() <= 0.0 {
            warn!(
                "rejecting contract expiring {} days after trade date",
                c.days_to_expiration()
            );
            return Err(PricingError::DegenerateTime {
                days: c.days_to_expiration(),
            });
        }

        let sigma = c.volatility();
        if sigma.is_nan() {
            return Err(PricingError::NonFinite {
                quantity: "volatility",
            });
        }
        if sigma < 0.0 {
            return Err(PricingError::NegativeVolatility { volatility: sigma });
        }
        if sigma == 0.0 {
            warn!("rejecting contract with zero volatility");
            return Err(PricingError::ZeroVolatility);
        }

        Ok(sigma * c.time_to_expiration().sqrt())
    }
}

/// `(Φ(d1), Φ(d2), Φ(−d1), Φ(−d2))`.
fn cdf_terms(d1: f64, d2: f64) -> Result<(f64, f64, f64, f64), PricingError> {
    if !d1.is_finite() {
        return Err(PricingError::NonFinite { quantity: "d1" });
    }
    if !d2.is_finite() {
        return Err(PricingError::NonFinite { quantity: "d2" });
    }
    let normal = Normal::new(0.0, 1.0).map_err(|e| PricingError::Distribution(e.to_string()))?;
    Ok((normal.cdf(d1), normal.cdf(d2), normal.cdf(-d1), normal.cdf(-d2)))
}

fn ensure_finite(prices: OptionPrices) -> Result<OptionPrices, PricingError> {
    if !prices.call.is_finite() {
        return Err(PricingError::NonFinite { quantity: "call price" });
    }
    if !prices.put.is_finite() {
        return Err(PricingError::NonFinite { quantity: "put price" });
    }
    Ok(prices)
}
