//! fgi-dca - A Fear & Greed gated dollar-cost-averaging backtester.
//!
//! # Overview
//!
//! The strategy deposits a fixed amount every day. When the Fear & Greed
//! Index is below a threshold it spends that amount on BTC; otherwise it
//! sells a fixed cash value of BTC, if it holds any. The crate replays that
//! rule over a daily price / FGI series and sweeps its parameters to find the
//! configuration with the highest terminal portfolio value.
//!
//! - **Simulation**: pure, deterministic day-by-day replay
//! - **Optimization**: ordered grid sweep, sequential or parallel, with
//!   per-trial failure isolation
//! - **Data**: CSV loading of the merged price / FGI table
//! - **Configuration files**: TOML-based configuration for reproducible sweeps
//! - **Export**: CSV trial logs and daily histories, JSON reports
//!
//! # Quick Start
//!
//! ```no_run
//! use fgi_dca::data::{load_observations, DataConfig};
//! use fgi_dca::engine::simulate;
//! use fgi_dca::optimizer::optimize;
//! use fgi_dca::types::StrategyParameters;
//!
//! let observations = load_observations("data.csv", &DataConfig::default()).unwrap();
//!
//! let params = StrategyParameters::new(10.0, 60, 10.0);
//! let result = simulate(&observations, &params).unwrap();
//! println!("Final value: {:.2}", result.final_portfolio_value);
//!
//! let thresholds: Vec<i32> = (10..=90).step_by(5).collect();
//! let report = optimize(&observations, 10.0, &thresholds, &[10.0, 20.0, 30.0]);
//! if let Some(best) = report.best {
//!     println!("Best: {} -> {:.2}", best.params, best.result.final_portfolio_value);
//! }
//! ```
//!
//! # Modules
//!
//! - [`types`]: Core data types (observations, parameters, results)
//! - [`portfolio`]: Per-run portfolio state
//! - [`engine`]: Simulation engine
//! - [`optimizer`]: Parameter grid sweep
//! - [`data`]: CSV loading and series validation
//! - [`config`]: TOML configuration file support
//! - [`export`]: CSV / JSON export
//! - [`report`]: Terminal reports

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod export;
pub mod metadata;
pub mod optimizer;
pub mod portfolio;
pub mod report;
pub mod types;

// Re-exports for convenience
pub use engine::{simulate, simulate_plain_dca, simulate_with_history, SimulationReport};
pub use error::{DcaError, Result};
pub use optimizer::{
    optimize, optimize_with, BestResult, OptimizationReport, ParameterGrid, SweepConfig,
    ThresholdRange, Trial, TrialFailure, TrialRecord, TrialStatus,
};
pub use portfolio::PortfolioState;
pub use types::{
    DailyAction, DailyObservation, DailySnapshot, SimulationResult, StrategyParameters,
};

pub use data::{load_observations, read_observations, validate_observations, DataConfig};
