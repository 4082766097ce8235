//! fx-risk-engine CLI
//!
//! Price European options and compute historical VaR from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Price a call/put pair with both derivations
//! fx-risk-engine price --spot 100 --strike 95 --rate 5 --vol 0.3 \
//!     --trade-date 01/01/2024 --expiry 01/01/2025
//!
//! # 1-day VaR from a rate history, exporting the augmented table
//! fx-risk-engine var --input rates.csv --spot1 153084.81 --spot2 95891.51 --export var.csv
//!
//! # Generate a synthetic rate history
//! fx-risk-engine generate --rows 261 --seed 7 --output rates.csv
//! ```
//!
//! Set `RUST_LOG=debug` for intermediate values.

use chrono::{Local, NaiveDate};
use fx_risk_engine::core::contract::OptionContract;
use fx_risk_engine::core::currency::{CurrencyCode, CurrencyPair};
use fx_risk_engine::core::input::{
    one_year_after, parse_amount, parse_date, parse_rate, reconcile_dates, EditedDate,
};
use fx_risk_engine::core::series::{HistoricalSeries, ImportConfig};
use fx_risk_engine::pricing::black_scholes::{BlackScholes, OptionPrices, PricingError, PricingMethod};
use fx_risk_engine::risk::historical_var::{VarConfig, VarEngine};
use fx_risk_engine::risk::quantile::QuantileRule;
use fx_risk_engine::simulation::series_generator::{generate_series, SeriesGeneratorConfig};
use std::fs::File;
use std::io;
use std::process;

/// Decimal places shown for option prices.
const PRICE_DECIMALS: usize = 6;

fn print_usage() {
    eprintln!(
        r#"fx-risk-engine — Black-Scholes option pricing and historical FX VaR

USAGE:
    fx-risk-engine <COMMAND> [OPTIONS]

COMMANDS:
    price       Price a European call/put pair
    var         Compute 1-day historical VaR for a two-currency portfolio
    generate    Generate a synthetic rate history (for testing)
    help        Show this message

OPTIONS (price):
    --spot <S>              Spot price of the underlying
    --strike <K>            Strike price
    --rate <R>              Risk-free rate in percent (may be negative)
    --vol <SIGMA>           Annualized volatility, e.g. 0.3 for 30%
    --trade-date <DATE>     DD/MM/YYYY or YYYY-MM-DD (default: today)
    --expiry <DATE>         DD/MM/YYYY or YYYY-MM-DD (default: one year after trade date)
    --method <M>            spot, forward or both (default: both)
    --fallback-intrinsic    Report the limiting value when T = 0 or vol = 0
    --format <FORMAT>       Output format: text (default) or json

OPTIONS (var):
    --input <FILE>          CSV with date, portfolio, ccy1, ccy2 columns, most recent first
    --spot1 <X>             Current portfolio value in currency 1
    --spot2 <Y>             Current portfolio value in currency 2
    --confidence <C>        Interpolate at this confidence instead of the fixed 99% blend
    --currencies <A,B>      Labels for the two rate columns (default: CCY1,CCY2)
    --skip-rows <N>         Rows to skip before the header (default: 0)
    --first-column <N>      Zero-based column holding the date (default: 0; 3 for D:G)
    --delimiter <CHAR>      Field delimiter (default: ,)
    --date-format <FMT>     chrono date format (default: %Y-%m-%d)
    --export <FILE>         Write the augmented table to a CSV file
    --format <FORMAT>       Output format: text (default) or json

OPTIONS (generate):
    --rows <N>              Number of days (default: 261)
    --seed <N>              Random seed for reproducible output
    --vol <SIGMA>           Daily log-return volatility (default: 0.006)
    --output <FILE>         Write to file instead of stdout

EXAMPLES:
    fx-risk-engine price --spot 100 --strike 95 --rate 5 --vol 0.3 --expiry 31/12/2025
    fx-risk-engine price --spot 100 --strike 95 --rate 5 --vol 0.3 --method forward --format json
    fx-risk-engine var --input rates.csv --spot1 153084.81 --spot2 95891.51
    fx-risk-engine var --input rates.csv --spot1 1e5 --spot2 5e4 --confidence 0.975 --export out.csv
    fx-risk-engine generate --rows 261 --seed 7 --output rates.csv"#
    );
}

/// JSON output schema for one pricing method.
#[derive(serde::Serialize)]
struct PriceOutput {
    method: String,
    call: Option<f64>,
    put: Option<f64>,
    limiting_value: bool,
    error: Option<String>,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Collect `--flag value` pairs; bare flags listed in `switches` take no value.
fn parse_options(args: &[String], switches: &[&str]) -> Vec<(String, Option<String>)> {
    let mut options = Vec::new();
    let mut i = 0;
    while i < args.len() {
        let flag = &args[i];
        if !flag.starts_with("--") {
            fail(format!("unexpected argument '{}'", flag));
        }
        if switches.contains(&flag.as_str()) {
            options.push((flag.clone(), None));
        } else {
            i += 1;
            let value = args
                .get(i)
                .cloned()
                .unwrap_or_else(|| fail(format!("{} requires a value", flag)));
            options.push((flag.clone(), Some(value)));
        }
        i += 1;
    }
    options
}

fn cmd_price(args: &[String]) {
    let mut spot = None;
    let mut strike = None;
    let mut rate = None;
    let mut vol = None;
    let mut trade_text = None;
    let mut expiry_text = None;
    let mut method = "both".to_string();
    let mut fallback = false;
    let mut format = "text".to_string();

    for (flag, value) in parse_options(args, &["--fallback-intrinsic"]) {
        let value = value.unwrap_or_default();
        match flag.as_str() {
            "--spot" => spot = Some(value),
            "--strike" => strike = Some(value),
            "--rate" => rate = Some(value),
            "--vol" => vol = Some(value),
            "--trade-date" => trade_text = Some(value),
            "--expiry" => expiry_text = Some(value),
            "--method" => method = value,
            "--fallback-intrinsic" => fallback = true,
            "--format" => format = value,
            _ => fail(format!("unknown option: {}", flag)),
        }
    }

    let spot = parse_amount("spot price", spot.as_deref().unwrap_or("")).unwrap_or_else(|e| fail(e));
    let strike =
        parse_amount("strike price", strike.as_deref().unwrap_or("")).unwrap_or_else(|e| fail(e));
    let rate = parse_rate("interest rate", rate.as_deref().unwrap_or("")).unwrap_or_else(|e| fail(e));
    let vol = parse_amount("volatility", vol.as_deref().unwrap_or("")).unwrap_or_else(|e| fail(e));

    let today = Local::now().date_naive();
    let trade_date = match trade_text {
        Some(text) => parse_date("trade date", &text).unwrap_or_else(|e| fail(e)),
        None => today,
    };
    let expiration_date: NaiveDate = match expiry_text {
        Some(text) => parse_date("expiration date", &text).unwrap_or_else(|e| fail(e)),
        None => one_year_after(trade_date),
    };

    let dates = reconcile_dates(trade_date, expiration_date, EditedDate::Expiration, today);
    if dates.corrected {
        eprintln!(
            "Warning: trade date cannot be after the expiration date; using expiration {}",
            dates.expiration_date
        );
    }

    let methods = match method.as_str() {
        "both" => vec![PricingMethod::Spot, PricingMethod::Forward],
        other => vec![other.parse::<PricingMethod>().unwrap_or_else(|e| fail(e))],
    };

    let contract = OptionContract::new(
        dates.trade_date,
        dates.expiration_date,
        spot,
        strike,
        rate,
        vol,
    );
    let pricer = BlackScholes::new(contract);

    let outputs: Vec<PriceOutput> = methods
        .into_iter()
        .map(|m| price_output(&pricer, m, fallback))
        .collect();

    if format == "json" {
        println!(
            "{}",
            serde_json::to_string_pretty(&outputs).unwrap_or_else(|e| fail(e))
        );
    } else {
        let c = pricer.contract();
        println!("=== Black-Scholes Pricing ===");
        println!("Trade Date:        {}", c.trade_date().format("%d/%m/%Y"));
        println!("Expiration Date:   {}", c.expiration_date().format("%d/%m/%Y"));
        println!("Time to Expiry:    {:.6} years", c.time_to_expiration());
        println!("Forward Price:     {:.prec$}", c.forward_price(), prec = PRICE_DECIMALS);
        for output in &outputs {
            println!("\nMethod: {}", output.method);
            match (&output.error, output.call, output.put) {
                (Some(error), _, _) => println!("  Error: {}", error),
                (None, Some(call), Some(put)) => {
                    let note = if output.limiting_value { "  (limiting value)" } else { "" };
                    println!("  Call Price:  {:.prec$}{}", call, note, prec = PRICE_DECIMALS);
                    println!("  Put Price:   {:.prec$}{}", put, note, prec = PRICE_DECIMALS);
                }
                _ => {}
            }
        }
    }

    if outputs.iter().any(|o| o.error.is_some()) {
        process::exit(2);
    }
}

fn price_output(pricer: &BlackScholes, method: PricingMethod, fallback: bool) -> PriceOutput {
    let to_output = |prices: OptionPrices, limiting_value: bool| PriceOutput {
        method: method.to_string(),
        call: Some(prices.call),
        put: Some(prices.put),
        limiting_value,
        error: None,
    };

    match pricer.price(method) {
        Ok(prices) => to_output(prices, false),
        Err(PricingError::DegenerateTime { days }) if fallback && days == 0 => {
            to_output(pricer.limiting_prices(), true)
        }
        Err(PricingError::ZeroVolatility) if fallback => to_output(pricer.limiting_prices(), true),
        Err(e) => PriceOutput {
            method: method.to_string(),
            call: None,
            put: None,
            limiting_value: false,
            error: Some(e.to_string()),
        },
    }
}

fn cmd_var(args: &[String]) {
    let mut input_path = None;
    let mut spot1 = None;
    let mut spot2 = None;
    let mut confidence = None;
    let mut export_path = None;
    let mut format = "text".to_string();
    let mut config = ImportConfig::default();

    for (flag, value) in parse_options(args, &[]) {
        let value = value.unwrap_or_default();
        match flag.as_str() {
            "--input" => input_path = Some(value),
            "--spot1" => spot1 = Some(value),
            "--spot2" => spot2 = Some(value),
            "--confidence" => confidence = Some(value),
            "--export" => export_path = Some(value),
            "--format" => format = value,
            "--skip-rows" => {
                config.skip_rows = value
                    .parse()
                    .unwrap_or_else(|_| fail("--skip-rows requires a number"));
            }
            "--first-column" => {
                config.first_column = value
                    .parse()
                    .unwrap_or_else(|_| fail("--first-column requires a number"));
            }
            "--delimiter" => {
                config.delimiter = match value.as_bytes() {
                    [b] => *b,
                    _ => fail("--delimiter requires a single character"),
                };
            }
            "--date-format" => config.date_format = value,
            "--currencies" => {
                let codes: Vec<&str> = value.split(',').collect();
                if codes.len() != 2 {
                    fail("--currencies requires exactly two comma-separated codes");
                }
                config.currencies =
                    CurrencyPair::new(CurrencyCode::new(codes[0]), CurrencyCode::new(codes[1]));
            }
            _ => fail(format!("unknown option: {}", flag)),
        }
    }

    let path = input_path.unwrap_or_else(|| fail("--input <FILE> is required"));
    // Portfolio values can be short positions, so only the rate field rules apply.
    let spot1 = parse_rate("--spot1", spot1.as_deref().unwrap_or("")).unwrap_or_else(|e| fail(e));
    let spot2 = parse_rate("--spot2", spot2.as_deref().unwrap_or("")).unwrap_or_else(|e| fail(e));

    let var_config = VarConfig {
        rule: match confidence {
            Some(text) => QuantileRule::Interpolated {
                confidence: text
                    .parse()
                    .unwrap_or_else(|_| fail("--confidence requires a number")),
            },
            None => QuantileRule::ReferenceWindow,
        },
    };

    let series = HistoricalSeries::from_csv_path(&path, &config)
        .unwrap_or_else(|e| fail(format!("reading '{}': {}", path, e)));
    let engine = VarEngine::new(series, spot1, spot2).unwrap_or_else(|e| fail(e));
    let report = engine.report(&var_config).unwrap_or_else(|e| fail(e));

    if let Some(export) = export_path {
        engine
            .augmented()
            .write_csv_path(&export)
            .unwrap_or_else(|e| fail(format!("writing '{}': {}", export, e)));
        eprintln!("Exported augmented table → {}", export);
    }

    if format == "json" {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_else(|e| fail(e))
        );
    } else {
        print!("{}", report);
    }
}

fn cmd_generate(args: &[String]) {
    let mut config = SeriesGeneratorConfig::default();
    let mut output_path: Option<String> = None;

    for (flag, value) in parse_options(args, &[]) {
        let value = value.unwrap_or_default();
        match flag.as_str() {
            "--rows" => {
                config.rows = value
                    .parse()
                    .unwrap_or_else(|_| fail("--rows requires a number"));
            }
            "--seed" => {
                config.seed = Some(
                    value
                        .parse()
                        .unwrap_or_else(|_| fail("--seed requires a number")),
                );
            }
            "--vol" => {
                config.daily_volatility = value
                    .parse()
                    .unwrap_or_else(|_| fail("--vol requires a number"));
            }
            "--output" => output_path = Some(value),
            _ => fail(format!("unknown option: {}", flag)),
        }
    }

    let series = generate_series(&config).unwrap_or_else(|e| fail(e));

    let written = match &output_path {
        Some(path) => {
            let file = File::create(path).unwrap_or_else(|e| fail(format!("writing '{}': {}", path, e)));
            series.write_csv(file)
        }
        None => series.write_csv(io::stdout().lock()),
    };
    written.unwrap_or_else(|e| fail(e));

    if let Some(path) = output_path {
        eprintln!(
            "Generated {} rows ({} → {}) → {}",
            series.len(),
            series.earliest().date,
            series.latest().date,
            path
        );
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "price" => cmd_price(rest),
        "var" => cmd_var(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
