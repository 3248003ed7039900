//! Integration tests for loading, simulation and the parameter sweep.

use chrono::NaiveDate;
use fgi_dca::config::DcaFileConfig;
use fgi_dca::data::{load_observations, DataConfig};
use fgi_dca::engine::{simulate, simulate_plain_dca, simulate_with_history};
use fgi_dca::error::DcaError;
use fgi_dca::export::{export_history_csv, export_json, export_trials_csv};
use fgi_dca::optimizer::{optimize, optimize_with, ParameterGrid, SweepConfig};
use fgi_dca::types::{DailyAction, DailyObservation, StrategyParameters};
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

/// Synthetic series with a cyclic FGI and a wavy upward price.
fn create_synthetic_data(days: usize, initial_price: f64) -> Vec<DailyObservation> {
    let base = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    (0..days)
        .map(|i| {
            let t = i as f64;
            let price = initial_price * (1.0 + 0.002 * t) + (t * 0.3).sin() * initial_price * 0.05;
            let fgi = (50.0 + 45.0 * (t * 0.11).sin()).round() as u8;
            DailyObservation::new(base + chrono::Duration::days(i as i64), price, fgi)
        })
        .collect()
}

/// Three-day series: two fearful dips then a greedy spike.
fn dip_then_spike() -> Vec<DailyObservation> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    vec![
        DailyObservation::new(base, 100.0, 30),
        DailyObservation::new(base + chrono::Duration::days(1), 50.0, 30),
        DailyObservation::new(base + chrono::Duration::days(2), 200.0, 80),
    ]
}

fn write_csv(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const FETCHER_CSV: &str = "\
date,Close,fgi_value,fgi_classification
2024-01-01,100.0,30.0,Fear
2024-01-02,50.0,30.0,Fear
2024-01-03,75.0,,
2024-01-04,200.0,80.0,Extreme Greed
";

#[test]
fn test_dip_then_spike_simulation() {
    let params = StrategyParameters::new(10.0, 60, 10.0);
    let report = simulate_with_history(&dip_then_spike(), &params).unwrap();

    assert_eq!(report.buy_days, 2);
    assert_eq!(report.sell_days, 1);
    assert!((report.result.final_portfolio_value - 70.0).abs() < 1e-9);
    assert!((report.result.cash_invested - 20.0).abs() < 1e-9);
    assert!((report.result.profit - 50.0).abs() < 1e-9);

    match report.history[2].action {
        DailyAction::Sell { value, btc } => {
            assert!((value - 10.0).abs() < 1e-9);
            assert!((btc - 0.05).abs() < 1e-12);
        }
        other => panic!("expected a sell on day 3, got {:?}", other),
    }
}

#[test]
fn test_history_invariants_on_long_series() {
    let data = create_synthetic_data(365, 20_000.0);
    let params = StrategyParameters::new(25.0, 45, 40.0);
    let report = simulate_with_history(&data, &params).unwrap();

    assert_eq!(report.history.len(), 365);
    assert!(report.buy_days > 0);
    assert!(report.sell_days > 0);

    let mut previous_invested = 0.0;
    for (i, snapshot) in report.history.iter().enumerate() {
        assert!(snapshot.btc_holdings >= 0.0);
        assert!(snapshot.cash >= 0.0);
        assert!(snapshot.cash_invested >= previous_invested);
        assert!(snapshot.cash_invested <= 25.0 * (i + 1) as f64 + 1e-6);
        previous_invested = snapshot.cash_invested;
    }

    let r = report.result;
    assert_eq!(r.profit, r.final_portfolio_value - r.cash_invested);
}

#[test]
fn test_always_buy_matches_plain_dca() {
    let data = create_synthetic_data(120, 30_000.0);
    // no FGI reading reaches 101
    let params = StrategyParameters::new(10.0, 101, 10.0);

    let strategy = simulate(&data, &params).unwrap();
    let plain = simulate_plain_dca(&data, 10.0).unwrap();

    assert_eq!(strategy, plain);
    assert!((plain.cash_invested - 1200.0).abs() < 1e-6);
}

#[test]
fn test_sweep_over_synthetic_data() {
    let data = create_synthetic_data(365, 20_000.0);
    let thresholds: Vec<i32> = (10..=90).step_by(5).collect();
    let report = optimize(&data, 10.0, &thresholds, &[10.0, 20.0, 30.0]);

    assert_eq!(report.trials.len(), 51);
    assert!(report.failures.is_empty());
    assert!(report.baseline.is_some());

    let best = report.best.clone().unwrap();
    let max = report
        .trials
        .iter()
        .map(|t| t.result.final_portfolio_value)
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(best.result.final_portfolio_value, max);

    // the winner replays to the same numbers
    let replay = simulate(&data, &best.params).unwrap();
    assert_eq!(replay, best.result);
}

#[test]
fn test_sweep_prefers_buying_the_dip() {
    let report = optimize(&dip_then_spike(), 10.0, &[10, 60], &[10.0]);
    let best = report.best.unwrap();

    assert_eq!(best.params.fgi_buy_threshold, 60);
    assert!((best.result.final_portfolio_value - 70.0).abs() < 1e-9);

    // threshold 10 never buys and just accumulates deposits
    let never = &report.trials[0];
    assert_eq!(never.result.final_portfolio_value, 30.0);
    assert_eq!(never.result.cash_invested, 0.0);
    assert_eq!(never.result.profit, 30.0);
}

#[test]
fn test_invalid_combinations_do_not_abort_sweep() {
    let report = optimize(&dip_then_spike(), 10.0, &[10, 60], &[10.0, -5.0]);

    assert_eq!(report.trials.len(), 2);
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.total_combinations(), 4);
    assert!(report.failures.iter().all(|f| f.params.sell_amount < 0.0));
    assert_eq!(report.best.unwrap().params.fgi_buy_threshold, 60);
}

#[test]
fn test_parallel_sweep_matches_sequential() {
    let data = create_synthetic_data(200, 40_000.0);
    let grid = ParameterGrid::default();

    let sequential = optimize_with(&data, &grid, &SweepConfig::default());
    let parallel = optimize_with(
        &data,
        &grid,
        &SweepConfig {
            parallel: true,
            show_progress: false,
        },
    );

    assert_eq!(sequential.trials, parallel.trials);
    assert_eq!(sequential.best, parallel.best);
    assert_eq!(sequential.grid_hash, parallel.grid_hash);
    assert_eq!(sequential.data_hash, parallel.data_hash);
}

#[test]
fn test_load_fetcher_csv_and_simulate() {
    let file = write_csv(FETCHER_CSV);
    let data = load_observations(file.path(), &DataConfig::default()).unwrap();

    // the row with an empty FGI cell is skipped
    assert_eq!(data.len(), 3);
    assert_eq!(data[0].fgi_value, 30);
    assert_eq!(data[2].close_price, 200.0);

    let params = StrategyParameters::new(10.0, 60, 10.0);
    let result = simulate(&data, &params).unwrap();
    assert!((result.final_portfolio_value - 70.0).abs() < 1e-9);
}

#[test]
fn test_strict_loading_rejects_incomplete_rows() {
    let file = write_csv(FETCHER_CSV);
    let config = DataConfig {
        skip_incomplete: false,
        ..Default::default()
    };

    let err = load_observations(file.path(), &config).unwrap_err();
    assert!(matches!(err, DcaError::InvalidInput(_)));
}

#[test]
fn test_config_driven_sweep() {
    let csv = write_csv(FETCHER_CSV);
    let config_text = format!(
        r#"
[data]
path = "{}"

[strategy]
investment_per_day = 10.0

[sweep]
thresholds = [10, 60]
sell_amounts = [10.0]
"#,
        csv.path().display()
    );
    let config_file = write_csv(&config_text);

    let config = DcaFileConfig::load(config_file.path()).unwrap();
    let data_path = config.data.path.clone().unwrap();
    let data = load_observations(&data_path, &config.to_data_config().unwrap()).unwrap();
    let grid = config.to_grid().unwrap();
    assert_eq!(grid.len(), 2);

    let report = optimize_with(&data, &grid, &config.to_sweep_config());
    assert_eq!(report.best.unwrap().params.fgi_buy_threshold, 60);
}

#[test]
fn test_config_driven_single_run() {
    let csv = write_csv(FETCHER_CSV);
    let config_text = format!(
        r#"
[data]
path = "{}"

[strategy]
investment_per_day = 10.0
fgi_threshold = 60
sell_amount = 10.0
"#,
        csv.path().display()
    );
    let config_file = write_csv(&config_text);

    let config = DcaFileConfig::load(config_file.path()).unwrap();
    let params = config.to_strategy_params().unwrap();
    assert_eq!(params, StrategyParameters::new(10.0, 60, 10.0));

    let data_path = config.data.path.clone().unwrap();
    let data = load_observations(&data_path, &config.to_data_config().unwrap()).unwrap();
    let report = simulate_with_history(&data, &params).unwrap();
    assert_eq!(report.buy_days, 2);
    assert!((report.result.final_portfolio_value - 70.0).abs() < 1e-9);

    // editing the threshold changes the run
    let mut never_buys = config.clone();
    never_buys.strategy.fgi_threshold = 10;
    let params = never_buys.to_strategy_params().unwrap();
    let result = simulate(&data, &params).unwrap();
    assert_eq!(result.cash_invested, 0.0);
}

#[test]
fn test_export_trials_and_history() {
    let dir = tempfile::tempdir().unwrap();
    let data = dip_then_spike();

    let report = optimize(&data, 10.0, &[10, 60], &[10.0, 0.0]);
    let trials_path = dir.path().join("trials.csv");
    export_trials_csv(&report, &trials_path).unwrap();

    let trials = fs::read_to_string(&trials_path).unwrap();
    let lines: Vec<&str> = trials.lines().collect();
    // one row per combination, the rejected sell amount included
    assert_eq!(lines.len(), 1 + report.total_combinations());
    assert!(lines[0].starts_with("fgi_threshold,sell_amount"));
    assert!(lines[1].starts_with("10,10.0,30.0"));
    assert!(lines[2].starts_with("10,0.0,,,,failed,"));

    let json_path = dir.path().join("report.json");
    export_json(&report, &json_path).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["failures"].as_array().unwrap().len(), 2);

    let params = StrategyParameters::new(10.0, 60, 10.0);
    let history = simulate_with_history(&data, &params).unwrap();
    let history_path = dir.path().join("history.csv");
    export_history_csv(&history, &history_path).unwrap();

    let content = fs::read_to_string(&history_path).unwrap();
    assert_eq!(content.lines().count(), 4);
    assert!(content.contains("2024-01-03"));
}
