use crate::core::currency::{CurrencyCode, CurrencyPair};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

/// Fewest rows that still yield one day-over-day shift.
pub const MIN_SERIES_ROWS: usize = 2;

/// Errors arising from importing or validating a historical series.
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("historical series needs at least 2 rows to derive a shift, got {rows}")]
    DataAlignment { rows: usize },
    #[error("rows must be ordered most recent first: row {index} ({date}) is not earlier than the row above it ({previous})")]
    OutOfOrder {
        index: usize,
        previous: NaiveDate,
        date: NaiveDate,
    },
    #[error("{currency} rate must be positive and finite, got {rate} in row {index}")]
    InvalidRate {
        index: usize,
        currency: CurrencyCode,
        rate: f64,
    },
    #[error("line {line}: missing column '{column}'")]
    MissingColumn { line: u64, column: &'static str },
    #[error("line {line}: cannot parse date '{value}' with format '{format}'")]
    BadDate {
        line: u64,
        value: String,
        format: String,
    },
    #[error("line {line}: column '{column}' is not a number: '{value}'")]
    BadNumber {
        line: u64,
        column: &'static str,
        value: String,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One day of market rates for the two portfolio currencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub date: NaiveDate,
    /// Portfolio label carried through from the source table.
    pub portfolio: String,
    pub ccy1: f64,
    pub ccy2: f64,
}

impl RateRecord {
    pub fn new(date: NaiveDate, portfolio: impl Into<String>, ccy1: f64, ccy2: f64) -> Self {
        Self {
            date,
            portfolio: portfolio.into(),
            ccy1,
            ccy2,
        }
    }
}

/// Layout of a tabular historical-rates file.
///
/// Columns are read by position starting at `first_column`: date,
/// portfolio, ccy1 rate, ccy2 rate. A sheet whose table sits in columns
/// D:G is read with `first_column: 3`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Rows to discard before the header (title rows, notes).
    pub skip_rows: usize,
    /// Whether a header row follows the skipped rows.
    pub has_headers: bool,
    /// Zero-based index of the date column.
    pub first_column: usize,
    /// `chrono` format string for the date column.
    pub date_format: String,
    /// Labels for the two rate columns.
    pub currencies: CurrencyPair,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            skip_rows: 0,
            has_headers: true,
            first_column: 0,
            date_format: "%Y-%m-%d".to_string(),
            currencies: CurrencyPair::default(),
        }
    }
}

/// Time-ordered daily rates, most recent first.
///
/// Construction guarantees at least [`MIN_SERIES_ROWS`] rows, strictly
/// descending dates, and strictly positive finite rates, so every
/// day-over-day log return is defined.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use fx_risk_engine::core::currency::CurrencyPair;
/// use fx_risk_engine::core::series::{HistoricalSeries, RateRecord};
///
/// let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
/// let series = HistoricalSeries::new(
///     vec![
///         RateRecord::new(d(2), "FX", 1.10, 0.86),
///         RateRecord::new(d(1), "FX", 1.08, 0.85),
///     ],
///     CurrencyPair::default(),
/// )
/// .unwrap();
///
/// assert_eq!(series.shift_count(), 1);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct HistoricalSeries {
    records: Vec<RateRecord>,
    currencies: CurrencyPair,
}

impl HistoricalSeries {
    /// Validate and wrap a most-recent-first list of records.
    pub fn new(records: Vec<RateRecord>, currencies: CurrencyPair) -> Result<Self, SeriesError> {
        if records.len() < MIN_SERIES_ROWS {
            return Err(SeriesError::DataAlignment {
                rows: records.len(),
            });
        }

        for (index, record) in records.iter().enumerate() {
            for (currency, rate) in [
                (&currencies.first, record.ccy1),
                (&currencies.second, record.ccy2),
            ] {
                if !(rate.is_finite() && rate > 0.0) {
                    return Err(SeriesError::InvalidRate {
                        index,
                        currency: currency.clone(),
                        rate,
                    });
                }
            }
            if index > 0 {
                let previous = records[index - 1].date;
                if record.date >= previous {
                    return Err(SeriesError::OutOfOrder {
                        index,
                        previous,
                        date: record.date,
                    });
                }
            }
        }

        Ok(Self {
            records,
            currencies,
        })
    }

    /// Read a series from CSV text.
    ///
    /// Rows whose fields are all blank are skipped.
    pub fn from_csv_reader<R: Read>(reader: R, config: &ImportConfig) -> Result<Self, SeriesError> {
        let mut csv_reader = ReaderBuilder::new()
            .delimiter(config.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let header_rows = config.skip_rows + usize::from(config.has_headers);
        let mut records = Vec::new();
        let mut skipped_blank = 0usize;

        for (idx, result) in csv_reader.records().enumerate() {
            let row = result?;
            if idx < header_rows {
                continue;
            }
            if row.iter().all(|field| field.trim().is_empty()) {
                skipped_blank += 1;
                continue;
            }
            records.push(parse_row(&row, config)?);
        }

        if skipped_blank > 0 {
            debug!("skipped {} blank rows while importing series", skipped_blank);
        }
        info!(
            "imported {} historical rows for {}",
            records.len(),
            config.currencies
        );

        Self::new(records, config.currencies.clone())
    }

    /// Read a series from a CSV file on disk.
    pub fn from_csv_path(path: impl AsRef<Path>, config: &ImportConfig) -> Result<Self, SeriesError> {
        let file = File::open(path)?;
        Self::from_csv_reader(file, config)
    }

    /// Write the series as CSV in the default import layout.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), SeriesError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for record in &self.records {
            csv_writer.serialize(record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn records(&self) -> &[RateRecord] {
        &self.records
    }

    pub fn currencies(&self) -> &CurrencyPair {
        &self.currencies
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// A constructed series is never empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of day-over-day shifts the series yields (`len - 1`).
    pub fn shift_count(&self) -> usize {
        self.records.len() - 1
    }

    pub fn latest(&self) -> &RateRecord {
        &self.records[0]
    }

    pub fn earliest(&self) -> &RateRecord {
        &self.records[self.records.len() - 1]
    }
}

fn parse_row(row: &StringRecord, config: &ImportConfig) -> Result<RateRecord, SeriesError> {
    let line = row.position().map(|p| p.line()).unwrap_or(0);
    let date_format = config.date_format.as_str();
    let field = |offset: usize, column: &'static str| {
        row.get(config.first_column + offset)
            .map(str::trim)
            .ok_or(SeriesError::MissingColumn { line, column })
    };
    let number = |offset: usize, column: &'static str| -> Result<f64, SeriesError> {
        let value = field(offset, column)?;
        value.parse::<f64>().map_err(|_| SeriesError::BadNumber {
            line,
            column,
            value: value.to_string(),
        })
    };

    let raw_date = field(0, "date")?;
    let date = NaiveDate::parse_from_str(raw_date, date_format).map_err(|_| SeriesError::BadDate {
        line,
        value: raw_date.to_string(),
        format: date_format.to_string(),
    })?;

    Ok(RateRecord {
        date,
        portfolio: field(1, "portfolio")?.to_string(),
        ccy1: number(2, "ccy1")?,
        ccy2: number(3, "ccy2")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_single_row_is_data_alignment_error() {
        let result = HistoricalSeries::new(
            vec![RateRecord::new(d(1), "FX", 1.1, 0.9)],
            CurrencyPair::default(),
        );
        assert!(matches!(result, Err(SeriesError::DataAlignment { rows: 1 })));
    }

    #[test]
    fn test_ascending_dates_rejected() {
        let result = HistoricalSeries::new(
            vec![
                RateRecord::new(d(1), "FX", 1.1, 0.9),
                RateRecord::new(d(2), "FX", 1.2, 0.9),
            ],
            CurrencyPair::default(),
        );
        assert!(matches!(result, Err(SeriesError::OutOfOrder { index: 1, .. })));
    }

    #[test]
    fn test_non_positive_rate_rejected() {
        let result = HistoricalSeries::new(
            vec![
                RateRecord::new(d(2), "FX", 1.1, 0.0),
                RateRecord::new(d(1), "FX", 1.2, 0.9),
            ],
            CurrencyPair::default(),
        );
        match result {
            Err(SeriesError::InvalidRate { index, currency, .. }) => {
                assert_eq!(index, 0);
                assert_eq!(currency.as_str(), "CCY2");
            }
            other => panic!("expected InvalidRate, got {:?}", other),
        }
    }

    #[test]
    fn test_csv_import_skips_title_and_blank_rows() {
        let text = "\
FX portfolio history,,,
date,portfolio,ccy1,ccy2
2024-03-03,FX,1.10,0.86
2024-03-02,FX,1.09,0.85
,,,
2024-03-01,FX,1.08,0.84
,,,
";
        let config = ImportConfig {
            skip_rows: 1,
            ..Default::default()
        };
        let series = HistoricalSeries::from_csv_reader(text.as_bytes(), &config).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.latest().date, d(3));
        assert_eq!(series.earliest().ccy2, 0.84);
        assert_eq!(series.shift_count(), 2);
    }

    #[test]
    fn test_csv_import_custom_layout() {
        let text = "03/03/2024;Book A;1.10;0.86\n02/03/2024;Book A;1.09;0.85\n";
        let config = ImportConfig {
            delimiter: b';',
            has_headers: false,
            date_format: "%d/%m/%Y".to_string(),
            currencies: CurrencyPair::new("eur".into(), "gbp".into()),
            ..Default::default()
        };
        let series = HistoricalSeries::from_csv_reader(text.as_bytes(), &config).unwrap();
        assert_eq!(series.records()[1].portfolio, "Book A");
        assert_eq!(series.currencies().to_string(), "EUR/GBP");
    }

    #[test]
    fn test_csv_import_with_column_offset() {
        let text = "\
,,,date,portfolio,ccy1,ccy2
,,,2024-03-03,FX,1.10,0.86
,,,2024-03-02,FX,1.09,0.85
,,,,,,
";
        let config = ImportConfig {
            first_column: 3,
            ..Default::default()
        };
        let series = HistoricalSeries::from_csv_reader(text.as_bytes(), &config).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.latest().date, d(3));
        assert_eq!(series.latest().portfolio, "FX");
        assert_eq!(series.earliest().ccy1, 1.09);
        assert_eq!(series.earliest().ccy2, 0.85);
    }

    #[test]
    fn test_csv_import_without_offset_rejects_shifted_table() {
        let text = ",,,date,portfolio,ccy1,ccy2\n,,,2024-03-03,FX,1.10,0.86\n,,,2024-03-02,FX,1.09,0.85\n";
        let result = HistoricalSeries::from_csv_reader(text.as_bytes(), &ImportConfig::default());
        assert!(matches!(result, Err(SeriesError::BadDate { line: 2, .. })));
    }

    #[test]
    fn test_csv_import_reports_bad_number() {
        let text = "date,portfolio,ccy1,ccy2\n2024-03-02,FX,abc,0.85\n2024-03-01,FX,1.0,0.85\n";
        let result = HistoricalSeries::from_csv_reader(text.as_bytes(), &ImportConfig::default());
        assert!(matches!(
            result,
            Err(SeriesError::BadNumber { line: 2, column: "ccy1", .. })
        ));
    }

    #[test]
    fn test_csv_write_reads_back() {
        let series = HistoricalSeries::new(
            vec![
                RateRecord::new(d(2), "FX", 1.25, 0.5),
                RateRecord::new(d(1), "FX", 1.0, 0.75),
            ],
            CurrencyPair::default(),
        )
        .unwrap();
        let mut buf = Vec::new();
        series.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("date,portfolio,ccy1,ccy2\n2024-03-02,FX,1.25,0.5\n"));

        let reread = HistoricalSeries::from_csv_reader(text.as_bytes(), &ImportConfig::default()).unwrap();
        assert_eq!(reread.records(), series.records());
    }

    #[test]
    fn test_csv_import_reports_missing_column() {
        let text = "date,portfolio,ccy1,ccy2\n2024-03-02,FX,1.0\n";
        let result = HistoricalSeries::from_csv_reader(text.as_bytes(), &ImportConfig::default());
        assert!(matches!(
            result,
            Err(SeriesError::MissingColumn { column: "ccy2", .. })
        ));
    }
}
