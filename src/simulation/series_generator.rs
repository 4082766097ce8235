//! Synthetic rate histories for testing and benchmarking.
//!
//! Produces geometric random walks for both currencies, laid out most
//! recent first like an imported table.

use crate::core::currency::CurrencyPair;
use crate::core::series::{HistoricalSeries, RateRecord, SeriesError};
use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("daily volatility must be finite and non-negative, got {0}")]
    InvalidVolatility(f64),
    #[error("{rows} days of history ending {latest_date} fall outside the supported date range")]
    DateOutOfRange { rows: usize, latest_date: NaiveDate },
    #[error(transparent)]
    Series(#[from] SeriesError),
}

/// Configuration for generating a random rate history.
#[derive(Debug, Clone)]
pub struct SeriesGeneratorConfig {
    /// Number of rows, i.e. days of history.
    pub rows: usize,
    /// Date of the most recent row.
    pub latest_date: NaiveDate,
    pub portfolio: String,
    pub currencies: CurrencyPair,
    /// Rate of each currency on the oldest day.
    pub initial_rates: (f64, f64),
    /// Standard deviation of daily log returns.
    pub daily_volatility: f64,
    /// Seed for reproducible output (None = random).
    pub seed: Option<u64>,
}

impl Default for SeriesGeneratorConfig {
    fn default() -> Self {
        Self {
            rows: 261,
            latest_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
            portfolio: "FX".to_string(),
            currencies: CurrencyPair::default(),
            initial_rates: (1.10, 0.85),
            daily_volatility: 0.006,
            seed: None,
        }
    }
}

/// Generate a random rate history.
pub fn generate_series(config: &SeriesGeneratorConfig) -> Result<HistoricalSeries, GeneratorError> {
    let sigma = config.daily_volatility;
    let normal = Normal::new(0.0, sigma).map_err(|_| GeneratorError::InvalidVolatility(sigma))?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let span = u64::try_from(config.rows.saturating_sub(1)).unwrap_or(u64::MAX);
    let earliest = config
        .latest_date
        .checked_sub_days(Days::new(span))
        .ok_or(GeneratorError::DateOutOfRange {
            rows: config.rows,
            latest_date: config.latest_date,
        })?;

    let (mut ccy1, mut ccy2) = config.initial_rates;
    let mut records = Vec::with_capacity(config.rows);
    // Walk forward from the oldest day, then flip to most-recent-first.
    let mut date = earliest;
    for _ in 0..config.rows {
        records.push(RateRecord::new(date, config.portfolio.clone(), ccy1, ccy2));
        date = date.succ_opt().unwrap_or(date);
        ccy1 *= normal.sample(&mut rng).exp();
        ccy2 *= normal.sample(&mut rng).exp();
    }
    records.reverse();

    Ok(HistoricalSeries::new(records, config.currencies.clone())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_series_shape() {
        let config = SeriesGeneratorConfig {
            rows: 30,
            seed: Some(7),
            ..Default::default()
        };
        let series = generate_series(&config).unwrap();
        assert_eq!(series.len(), 30);
        assert_eq!(series.latest().date, config.latest_date);
        assert_eq!(series.earliest().ccy1, 1.10);
        assert!(series.records().iter().all(|r| r.ccy1 > 0.0 && r.ccy2 > 0.0));
    }

    #[test]
    fn test_seed_is_reproducible() {
        let config = SeriesGeneratorConfig {
            rows: 50,
            seed: Some(42),
            ..Default::default()
        };
        let a = generate_series(&config).unwrap();
        let b = generate_series(&config).unwrap();
        assert_eq!(a.records(), b.records());
    }

    #[test]
    fn test_too_few_rows() {
        let config = SeriesGeneratorConfig {
            rows: 1,
            ..Default::default()
        };
        assert!(matches!(
            generate_series(&config),
            Err(GeneratorError::Series(SeriesError::DataAlignment { rows: 1 }))
        ));
    }

    #[test]
    fn test_history_before_earliest_date_rejected() {
        let config = SeriesGeneratorConfig {
            rows: 10,
            latest_date: NaiveDate::MIN.checked_add_days(Days::new(5)).unwrap(),
            seed: Some(1),
            ..Default::default()
        };
        assert!(matches!(
            generate_series(&config),
            Err(GeneratorError::DateOutOfRange { rows: 10, .. })
        ));
    }

    #[test]
    fn test_history_reaching_earliest_date_accepted() {
        let config = SeriesGeneratorConfig {
            rows: 6,
            latest_date: NaiveDate::MIN.checked_add_days(Days::new(5)).unwrap(),
            seed: Some(1),
            ..Default::default()
        };
        let series = generate_series(&config).unwrap();
        assert_eq!(series.earliest().date, NaiveDate::MIN);
        assert_eq!(series.latest().date, config.latest_date);
    }

    #[test]
    fn test_negative_volatility() {
        let config = SeriesGeneratorConfig {
            daily_volatility: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            generate_series(&config),
            Err(GeneratorError::InvalidVolatility(_))
        ));
    }
}
