use approx::assert_relative_eq;
use chrono::NaiveDate;
use fx_risk_engine::core::contract::OptionContract;
use fx_risk_engine::core::currency::{CurrencyCode, CurrencyPair};
use fx_risk_engine::core::input::{parse_amount, parse_date, parse_rate};
use fx_risk_engine::core::series::{HistoricalSeries, ImportConfig, SeriesError};
use fx_risk_engine::pricing::black_scholes::{BlackScholes, PricingError, PricingMethod};
use fx_risk_engine::risk::error::VarError;
use fx_risk_engine::risk::historical_var::{VarConfig, VarEngine};
use fx_risk_engine::risk::quantile::QuantileRule;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/fx_portfolio.csv");
const SPOT_CCY1: f64 = 153084.81;
const SPOT_CCY2: f64 = 95891.51;
/// Reference 1-day VaR for the fixture, computed independently.
const FIXTURE_VAR: f64 = -2652.2278754561253;

fn fixture_config() -> ImportConfig {
    ImportConfig {
        skip_rows: 1,
        currencies: CurrencyPair::new(CurrencyCode::new("EUR"), CurrencyCode::new("GBP")),
        ..Default::default()
    }
}

fn fixture_engine() -> VarEngine {
    let series = HistoricalSeries::from_csv_path(FIXTURE, &fixture_config()).unwrap();
    VarEngine::new(series, SPOT_CCY1, SPOT_CCY2).unwrap()
}

/// Full pipeline: CSV import → shifts → P&L → VaR.
#[test]
fn fixture_one_day_var_matches_reference() {
    let engine = fixture_engine();

    assert_eq!(engine.series().len(), 261);
    assert_eq!(engine.spot_price_ccy1(), SPOT_CCY1);
    assert_eq!(engine.spot_price_ccy2(), SPOT_CCY2);
    assert_eq!(engine.pnl_sum().len(), 260);

    let var = engine.calculate_one_day_var().unwrap();
    assert_relative_eq!(var, FIXTURE_VAR, epsilon = 1e-6);
}

/// The imported rates are the ones in the file, in file order.
#[test]
fn fixture_import_preserves_rates() {
    let engine = fixture_engine();
    let latest = engine.series().latest();
    assert_eq!(latest.date, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    assert_eq!(latest.portfolio, "FX Portfolio");
    assert_eq!((latest.ccy1, latest.ccy2), (0.8508, 0.8986));

    let earliest = engine.series().earliest();
    assert_eq!((earliest.ccy1, earliest.ccy2), (0.9215, 0.8432));
}

/// A 260-observation window makes the interpolated 99% rule coincide with the fixed blend.
#[test]
fn fixture_interpolated_rule_agrees_at_99_percent() {
    let engine = fixture_engine();
    let interpolated = engine
        .calculate_var(&QuantileRule::Interpolated { confidence: 0.99 })
        .unwrap();
    assert_relative_eq!(interpolated, FIXTURE_VAR, epsilon = 1e-6);

    let at_95 = engine
        .calculate_var(&QuantileRule::Interpolated { confidence: 0.95 })
        .unwrap();
    assert_relative_eq!(at_95, -2073.0425556170953, epsilon = 1e-6);
    assert!(at_95 > interpolated);
}

/// Export writes every source row plus the derived columns.
#[test]
fn fixture_export_round_trip() {
    let engine = fixture_engine();
    let table = engine.augmented();
    assert_eq!(table.len(), 261);
    assert!(table.rows[..260].iter().all(|r| r.pnl_sum.is_some()));
    assert!(table.rows[260].pnl_sum.is_none());

    let path = std::env::temp_dir().join(format!("fx-risk-engine-export-{}.csv", std::process::id()));
    table.write_csv_path(&path).unwrap();

    // The export keeps the import layout in its first four columns.
    let reread = HistoricalSeries::from_csv_path(&path, &ImportConfig::default()).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(reread.records(), engine.series().records());
}

#[test]
fn export_to_missing_directory_is_io_error() {
    let engine = fixture_engine();
    let path = std::env::temp_dir()
        .join(format!("fx-risk-engine-missing-{}", std::process::id()))
        .join("out.csv");
    let result = engine.augmented().write_csv_path(&path);
    assert!(matches!(result, Err(VarError::Io(_))));
}

/// Report serializes with the fields a caller displays.
#[test]
fn var_report_serializes() {
    let engine = fixture_engine();
    let report = engine.report(&VarConfig::default()).unwrap();
    let json = serde_json::to_string_pretty(&report).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed["observations"], 260);
    assert_eq!(parsed["rule"]["rule"], "reference_window");
    assert_eq!(parsed["currencies"]["first"], "EUR");
    assert_eq!(parsed["as_of"], "2024-12-31");
    assert!(parsed["var"].as_f64().unwrap() < 0.0);
}

/// Fewer than three P&L observations is an error, not a number.
#[test]
fn short_series_is_insufficient_data() {
    let text = "date,portfolio,ccy1,ccy2\n2024-01-03,FX,1.1,0.9\n2024-01-02,FX,1.0,0.8\n2024-01-01,FX,1.2,0.85\n";
    let series = HistoricalSeries::from_csv_reader(text.as_bytes(), &ImportConfig::default()).unwrap();
    let engine = VarEngine::new(series, 100.0, 100.0).unwrap();
    assert_eq!(engine.pnl_sum().len(), 2);
    assert!(matches!(
        engine.calculate_one_day_var(),
        Err(VarError::InsufficientData { observations: 2, required: 3 })
    ));
}

/// A header and one data row cannot produce a shift.
#[test]
fn one_row_file_is_data_alignment_error() {
    let text = "date,portfolio,ccy1,ccy2\n2024-01-03,FX,1.1,0.9\n";
    let result = HistoricalSeries::from_csv_reader(text.as_bytes(), &ImportConfig::default());
    assert!(matches!(result, Err(SeriesError::DataAlignment { rows: 1 })));
}

/// Text inputs → contract → both pricing methods.
#[test]
fn pricing_from_validated_inputs() {
    let contract = OptionContract::new(
        parse_date("trade date", "15/01/2024").unwrap(),
        parse_date("expiration date", "2024-07-15").unwrap(),
        parse_amount("spot price", "1.0950").unwrap(),
        parse_amount("strike price", "1.1000").unwrap(),
        parse_rate("interest rate", "-0.25").unwrap(),
        parse_amount("volatility", "0.08").unwrap(),
    );
    assert_eq!(contract.days_to_expiration(), 182);

    let pricer = BlackScholes::new(contract);
    let spot = pricer.price(PricingMethod::Spot).unwrap();
    let forward = pricer.price(PricingMethod::Forward).unwrap();

    assert!(spot.call > 0.0 && spot.put > 0.0);
    assert_relative_eq!(spot.call, forward.call, epsilon = 1e-12);
    assert_relative_eq!(spot.put, forward.put, epsilon = 1e-12);
    assert!(pricer.put_call_parity_gap(&spot).abs() < 1e-12);

    let json = serde_json::to_value(spot).unwrap();
    assert!(json.get("call").is_some());
    assert!(json.get("put").is_some());
}

/// Degenerate contracts surface a typed error and a separate limiting value.
#[test]
fn degenerate_contracts_are_reported() {
    let day = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
    let expiring = BlackScholes::new(OptionContract::new(day, day, 105.0, 100.0, 4.0, 0.25));
    assert_eq!(
        expiring.price_via_spot(),
        Err(PricingError::DegenerateTime { days: 0 })
    );
    let limit = expiring.limiting_prices();
    assert_relative_eq!(limit.call, 5.0);
    assert_eq!(limit.put, 0.0);

    let flat = BlackScholes::new(OptionContract::new(
        day,
        day + chrono::Duration::days(90),
        95.0,
        100.0,
        4.0,
        0.0,
    ));
    assert_eq!(flat.price_via_forward(), Err(PricingError::ZeroVolatility));
    let limit = flat.limiting_prices();
    assert_eq!(limit.call, 0.0);
    assert!(limit.put > 0.0);
}
