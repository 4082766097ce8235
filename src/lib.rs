//! # fx-risk-engine
//!
//! Option pricing and historical Value-at-Risk for a two-currency FX book.
//!
//! Two independent analytics share this crate: Black-Scholes pricing of
//! European options, and 1-day historical-simulation VaR over a table of
//! daily rates.
//!
//! ## Architecture
//!
//! - **core** — Input types: option contracts, rate histories, currency labels, input validation
//! - **pricing** — Black-Scholes call/put pricing from spot or forward
//! - **risk** — Day-over-day shifts, P&L vectors, VaR quantiles, augmented export
//! - **simulation** — Synthetic rate histories for tests and benchmarks

pub mod core;
pub mod pricing;
pub mod risk;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::contract::OptionContract;
    pub use crate::core::currency::{CurrencyCode, CurrencyPair};
    pub use crate::core::series::{HistoricalSeries, ImportConfig, RateRecord};
    pub use crate::pricing::black_scholes::{BlackScholes, OptionPrices, PricingError, PricingMethod};
    pub use crate::risk::error::VarError;
    pub use crate::risk::historical_var::{AugmentedSeries, VarConfig, VarEngine, VarReport};
    pub use crate::risk::quantile::QuantileRule;
}
