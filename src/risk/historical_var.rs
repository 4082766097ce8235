//! Historical-simulation VaR for a two-currency FX portfolio.
//!
//! Each day-over-day move in the rate history is replayed against
//! today's notionals. The resulting P&L sample is summed across both
//! currencies and its lower tail read off as the 1-day VaR.

use crate::core::currency::{CurrencyCode, CurrencyPair};
use crate::core::series::{HistoricalSeries, RateRecord};
use crate::risk::error::{Result, VarError};
use crate::risk::quantile::{order_statistics, QuantileRule};
use chrono::NaiveDate;
use csv::Writer;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// VaR engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VarConfig {
    /// Rule used to read the quantile off the P&L sample.
    pub rule: QuantileRule,
}

/// Historical VaR engine.
///
/// All derived arrays are computed once in [`VarEngine::new`] and are
/// index-aligned with the series: entry `i` compares row `i` with the
/// older row `i + 1`, so every array holds `len(series) − 1` values.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use fx_risk_engine::core::currency::CurrencyPair;
/// use fx_risk_engine::core::series::{HistoricalSeries, RateRecord};
/// use fx_risk_engine::risk::historical_var::VarEngine;
///
/// let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
/// let series = HistoricalSeries::new(
///     vec![
///         RateRecord::new(d(4), "FX", 1.00, 2.00),
///         RateRecord::new(d(3), "FX", 1.10, 2.00),
///         RateRecord::new(d(2), "FX", 1.20, 2.00),
///         RateRecord::new(d(1), "FX", 1.30, 2.00),
///     ],
///     CurrencyPair::default(),
/// )
/// .unwrap();
///
/// let engine = VarEngine::new(series, 1_000.0, 500.0).unwrap();
/// assert_eq!(engine.pnl_sum().len(), 3);
///
/// let var = engine.calculate_one_day_var().unwrap();
/// assert!(var < 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct VarEngine {
    series: HistoricalSeries,
    spot_price_ccy1: f64,
    spot_price_ccy2: f64,
    one_day_shift_ccy1: Vec<f64>,
    one_day_shift_ccy2: Vec<f64>,
    pnl_ccy1: Vec<f64>,
    pnl_ccy2: Vec<f64>,
    pnl_sum: Vec<f64>,
}

impl VarEngine {
    /// Build the engine and derive shifts and P&L vectors.
    ///
    /// `spot_price_ccy1` and `spot_price_ccy2` are the current portfolio
    /// values held in each currency, not market rates.
    pub fn new(series: HistoricalSeries, spot_price_ccy1: f64, spot_price_ccy2: f64) -> Result<Self> {
        let currencies = series.currencies().clone();
        check_notional(&currencies.first, spot_price_ccy1)?;
        check_notional(&currencies.second, spot_price_ccy2)?;

        let records = series.records();
        let one_day_shift_ccy1 = one_day_shifts(records, |r| r.ccy1);
        let one_day_shift_ccy2 = one_day_shifts(records, |r| r.ccy2);

        let pnl_ccy1: Vec<f64> = one_day_shift_ccy1.iter().map(|s| s * spot_price_ccy1).collect();
        let pnl_ccy2: Vec<f64> = one_day_shift_ccy2.iter().map(|s| s * spot_price_ccy2).collect();
        let pnl_sum: Vec<f64> = pnl_ccy1.iter().zip(&pnl_ccy2).map(|(a, b)| a + b).collect();

        debug!(
            "derived {} shift/P&L observations for {} from {} rows",
            pnl_sum.len(),
            currencies,
            records.len()
        );

        Ok(Self {
            series,
            spot_price_ccy1,
            spot_price_ccy2,
            one_day_shift_ccy1,
            one_day_shift_ccy2,
            pnl_ccy1,
            pnl_ccy2,
            pnl_sum,
        })
    }

    /// 1-day VaR at 99% confidence: `0.4 × (2nd smallest P&L) + 0.6 × (3rd smallest P&L)`.
    ///
    /// The value is signed; a loss is negative. Fewer than three P&L
    /// observations is an [`VarError::InsufficientData`] error.
    pub fn calculate_one_day_var(&self) -> Result<f64> {
        self.calculate_var(&QuantileRule::ReferenceWindow)
    }

    /// 1-day VaR under an explicit quantile rule.
    pub fn calculate_var(&self, rule: &QuantileRule) -> Result<f64> {
        let var = rule.evaluate(&self.pnl_sum)?;
        info!(
            "1-day VaR for {} over {} observations ({}): {}",
            self.series.currencies(),
            self.pnl_sum.len(),
            rule,
            var
        );
        Ok(var)
    }

    /// Summary of a VaR run under `config`.
    pub fn report(&self, config: &VarConfig) -> Result<VarReport> {
        let var = self.calculate_var(&config.rule)?;
        let worst_pnl = order_statistics(&self.pnl_sum)[0];
        Ok(VarReport {
            currencies: self.series.currencies().clone(),
            as_of: self.series.latest().date,
            observations: self.pnl_sum.len(),
            spot_price_ccy1: self.spot_price_ccy1,
            spot_price_ccy2: self.spot_price_ccy2,
            rule: config.rule,
            confidence: config.rule.confidence(),
            var,
            worst_pnl,
        })
    }

    /// The input rows plus the five derived columns, as a new table.
    pub fn augmented(&self) -> AugmentedSeries {
        let rows = self
            .series
            .records()
            .iter()
            .enumerate()
            .map(|(i, record)| AugmentedRecord {
                date: record.date,
                portfolio: record.portfolio.clone(),
                ccy1: record.ccy1,
                ccy2: record.ccy2,
                one_day_shift_ccy1: self.one_day_shift_ccy1.get(i).copied(),
                one_day_shift_ccy2: self.one_day_shift_ccy2.get(i).copied(),
                pnl_ccy1: self.pnl_ccy1.get(i).copied(),
                pnl_ccy2: self.pnl_ccy2.get(i).copied(),
                pnl_sum: self.pnl_sum.get(i).copied(),
            })
            .collect();

        AugmentedSeries {
            currencies: self.series.currencies().clone(),
            rows,
        }
    }

    // --- Accessors ---

    pub fn series(&self) -> &HistoricalSeries {
        &self.series
    }

    pub fn spot_price_ccy1(&self) -> f64 {
        self.spot_price_ccy1
    }

    pub fn spot_price_ccy2(&self) -> f64 {
        self.spot_price_ccy2
    }

    pub fn one_day_shift_ccy1(&self) -> &[f64] {
        &self.one_day_shift_ccy1
    }

    pub fn one_day_shift_ccy2(&self) -> &[f64] {
        &self.one_day_shift_ccy2
    }

    pub fn pnl_ccy1(&self) -> &[f64] {
        &self.pnl_ccy1
    }

    pub fn pnl_ccy2(&self) -> &[f64] {
        &self.pnl_ccy2
    }

    pub fn pnl_sum(&self) -> &[f64] {
        &self.pnl_sum
    }
}

/// `exp(ln(rate[i] / rate[i+1])) − 1` for each adjacent pair of rows.
fn one_day_shifts(records: &[RateRecord], rate: impl Fn(&RateRecord) -> f64) -> Vec<f64> {
    records
        .windows(2)
        .map(|pair| (rate(&pair[0]) / rate(&pair[1])).ln().exp() - 1.0)
        .collect()
}

fn check_notional(currency: &CurrencyCode, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(VarError::InvalidNotional {
            currency: currency.clone(),
            value,
        })
    }
}

/// One row of the exported table. The oldest row has no prior day, so
/// its derived fields are empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentedRecord {
    pub date: NaiveDate,
    pub portfolio: String,
    pub ccy1: f64,
    pub ccy2: f64,
    pub one_day_shift_ccy1: Option<f64>,
    pub one_day_shift_ccy2: Option<f64>,
    pub pnl_ccy1: Option<f64>,
    pub pnl_ccy2: Option<f64>,
    pub pnl_sum: Option<f64>,
}

/// Historical series with shift and P&L columns appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AugmentedSeries {
    pub currencies: CurrencyPair,
    pub rows: Vec<AugmentedRecord>,
}

impl AugmentedSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the table as CSV with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = Writer::from_writer(writer);
        for row in &self.rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write the table to a CSV file, replacing any existing file.
    pub fn write_csv_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.write_csv(File::create(path)?)?;
        info!("exported {} rows to {}", self.rows.len(), path.display());
        Ok(())
    }
}

/// Outcome of a VaR run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarReport {
    pub currencies: CurrencyPair,
    /// Date of the most recent observation.
    pub as_of: NaiveDate,
    pub observations: usize,
    pub spot_price_ccy1: f64,
    pub spot_price_ccy2: f64,
    pub rule: QuantileRule,
    pub confidence: f64,
    /// Signed 1-day VaR; negative is a loss.
    pub var: f64,
    /// Smallest simulated P&L in the window.
    pub worst_pnl: f64,
}

impl std::fmt::Display for VarReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Historical VaR ({}) ===", self.currencies)?;
        writeln!(f, "As of:         {}", self.as_of)?;
        writeln!(f, "Observations:  {}", self.observations)?;
        writeln!(
            f,
            "Notionals:     {} {:.2} / {} {:.2}",
            self.currencies.first, self.spot_price_ccy1, self.currencies.second, self.spot_price_ccy2
        )?;
        writeln!(f, "Rule:          {}", self.rule)?;
        writeln!(f, "Confidence:    {:.2}%", self.confidence * 100.0)?;
        writeln!(f, "Worst P&L:     {:.2}", self.worst_pnl)?;
        writeln!(f, "1-day VaR:     {:.2}", self.var)?;
        Ok(())
    }
}
