use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Day-count basis used to turn a calendar span into a year fraction.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Terms of a European option trade, ready for pricing.
///
/// The contract is immutable once created. Time to expiration and the
/// forward price are derived here once, so every pricing method works
/// from the same values.
///
/// The interest rate is supplied in percent (`5.0` means 5%) and stored
/// as a decimal fraction. No positivity checks happen at construction;
/// the pricer rejects inputs that would make the closed form singular.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use fx_risk_engine::core::contract::OptionContract;
///
/// let contract = OptionContract::new(
///     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
///     100.0,
///     95.0,
///     5.0,
///     0.3,
/// );
///
/// assert_eq!(contract.interest_rate(), 0.05);
/// assert_eq!(contract.days_to_expiration(), 365);
/// assert!((contract.time_to_expiration() - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    trade_date: NaiveDate,
    expiration_date: NaiveDate,
    spot_price: f64,
    strike_price: f64,
    /// Annualized rate as a decimal fraction.
    interest_rate: f64,
    /// Annualized standard deviation of returns.
    volatility: f64,
    /// Year fraction between trade and expiration. Zero or negative for
    /// same-day or inverted dates.
    time_to_expiration: f64,
    forward_price: f64,
}

impl OptionContract {
    /// Create a contract from trade terms.
    ///
    /// `interest_rate_percent` is in percentage units and may be negative.
    pub fn new(
        trade_date: NaiveDate,
        expiration_date: NaiveDate,
        spot_price: f64,
        strike_price: f64,
        interest_rate_percent: f64,
        volatility: f64,
    ) -> Self {
        let interest_rate = interest_rate_percent / 100.0;
        let days = (expiration_date - trade_date).num_days();
        let time_to_expiration = days as f64 / DAYS_PER_YEAR;
        let forward_price = spot_price * (interest_rate * time_to_expiration).exp();

        Self {
            trade_date,
            expiration_date,
            spot_price,
            strike_price,
            interest_rate,
            volatility,
            time_to_expiration,
            forward_price,
        }
    }

    /// Calendar days between trade and expiration (negative if inverted).
    pub fn days_to_expiration(&self) -> i64 {
        (self.expiration_date - self.trade_date).num_days()
    }

    /// Discount factor `e^(-rT)`.
    pub fn discount_factor(&self) -> f64 {
        (-self.interest_rate * self.time_to_expiration).exp()
    }

    // --- Accessors ---

    pub fn trade_date(&self) -> NaiveDate {
        self.trade_date
    }

    pub fn expiration_date(&self) -> NaiveDate {
        self.expiration_date
    }

    pub fn spot_price(&self) -> f64 {
        self.spot_price
    }

    pub fn strike_price(&self) -> f64 {
        self.strike_price
    }

    pub fn interest_rate(&self) -> f64 {
        self.interest_rate
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    pub fn time_to_expiration(&self) -> f64 {
        self.time_to_expiration
    }

    pub fn forward_price(&self) -> f64 {
        self.forward_price
    }
}
