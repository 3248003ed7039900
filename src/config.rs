//! Configuration file support.
//!
//! A TOML file describes the data source, a single strategy run and a sweep
//! grid, so that runs are reproducible.

use crate::data::DataConfig;
use crate::error::{DcaError, Result};
use crate::optimizer::{ParameterGrid, SweepConfig, ThresholdRange};
use crate::types::StrategyParameters;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Complete configuration loaded from a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DcaFileConfig {
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub strategy: StrategySettings,
    #[serde(default)]
    pub sweep: SweepSettings,
}

/// Data settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSettings {
    /// Path to the merged price / FGI CSV.
    pub path: Option<String>,
    /// Date format in CSV.
    pub date_format: Option<String>,
    /// CSV delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Skip rows with missing close or FGI.
    #[serde(default = "default_true")]
    pub skip_incomplete: bool,
    /// Start date (YYYY-MM-DD format).
    #[serde(default)]
    pub start_date: Option<String>,
    /// End date (YYYY-MM-DD format).
    #[serde(default)]
    pub end_date: Option<String>,
}

fn default_delimiter() -> char { ',' }
fn default_true() -> bool { true }

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            path: None,
            date_format: None,
            delimiter: ',',
            skip_incomplete: true,
            start_date: None,
            end_date: None,
        }
    }
}

/// Parameters of a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategySettings {
    #[serde(default = "default_investment")]
    pub investment_per_day: f64,
    #[serde(default = "default_threshold")]
    pub fgi_threshold: i32,
    #[serde(default = "default_sell_amount")]
    pub sell_amount: f64,
}

fn default_investment() -> f64 { 10.0 }
fn default_threshold() -> i32 { 60 }
fn default_sell_amount() -> f64 { 10.0 }

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            investment_per_day: 10.0,
            fgi_threshold: 60,
            sell_amount: 10.0,
        }
    }
}

/// Sweep grid settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepSettings {
    /// First threshold tried.
    #[serde(default = "default_threshold_start")]
    pub threshold_start: i32,
    /// Last threshold tried (inclusive).
    #[serde(default = "default_threshold_end")]
    pub threshold_end: i32,
    #[serde(default = "default_threshold_step")]
    pub threshold_step: i32,
    /// Explicit thresholds; overrides the range when set.
    #[serde(default)]
    pub thresholds: Option<Vec<i32>>,
    #[serde(default = "default_sell_amounts")]
    pub sell_amounts: Vec<f64>,
    #[serde(default)]
    pub parallel: bool,
}

fn default_threshold_start() -> i32 { 10 }
fn default_threshold_end() -> i32 { 90 }
fn default_threshold_step() -> i32 { 5 }
fn default_sell_amounts() -> Vec<f64> { vec![10.0, 20.0, 30.0] }

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            threshold_start: 10,
            threshold_end: 90,
            threshold_step: 5,
            thresholds: None,
            sell_amounts: default_sell_amounts(),
            parallel: false,
        }
    }
}

fn parse_config_date(field: &str, value: Option<&String>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
                DcaError::ConfigError(format!("invalid {} '{}': {}", field, s, e))
            })
        })
        .transpose()
}

impl DcaFileConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = fs::read_to_string(path)?;
        let config: DcaFileConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Loader options for the `[data]` section.
    pub fn to_data_config(&self) -> Result<DataConfig> {
        if !self.data.delimiter.is_ascii() {
            return Err(DcaError::ConfigError(format!(
                "delimiter must be ASCII, got {:?}",
                self.data.delimiter
            )));
        }

        Ok(DataConfig {
            date_format: self.data.date_format.clone(),
            delimiter: self.data.delimiter as u8,
            skip_incomplete: self.data.skip_incomplete,
            start_date: parse_config_date("start_date", self.data.start_date.as_ref())?,
            end_date: parse_config_date("end_date", self.data.end_date.as_ref())?,
        })
    }

    /// Parameters of the single run in `[strategy]`.
    pub fn to_strategy_params(&self) -> Result<StrategyParameters> {
        let params = StrategyParameters::new(
            self.strategy.investment_per_day,
            self.strategy.fgi_threshold,
            self.strategy.sell_amount,
        );
        params
            .validate()
            .map_err(|e| DcaError::ConfigError(e.to_string()))?;
        Ok(params)
    }

    /// Sweep grid from `[sweep]`, at the `[strategy]` daily investment.
    pub fn to_grid(&self) -> Result<ParameterGrid> {
        let thresholds = match &self.sweep.thresholds {
            Some(explicit) => explicit.clone(),
            None => ThresholdRange::new(
                self.sweep.threshold_start,
                self.sweep.threshold_end,
                self.sweep.threshold_step,
            )
            .values()?,
        };

        if thresholds.is_empty() {
            return Err(DcaError::ConfigError("no thresholds to sweep".to_string()));
        }
        if self.sweep.sell_amounts.is_empty() {
            return Err(DcaError::ConfigError(
                "no sell amounts to sweep".to_string(),
            ));
        }

        Ok(ParameterGrid::new(
            self.strategy.investment_per_day,
            thresholds,
            self.sweep.sell_amounts.clone(),
        ))
    }

    pub fn to_sweep_config(&self) -> SweepConfig {
        SweepConfig {
            parallel: self.sweep.parallel,
            show_progress: false,
        }
    }

    /// Generate an example configuration file content.
    pub fn example() -> String {
        r#"# FGI DCA configuration file

[data]
path = "data.csv"
# date_format = "%Y-%m-%d"
delimiter = ","
skip_incomplete = true
# start_date = "2024-01-01"
# end_date = "2024-12-31"

[strategy]
investment_per_day = 10.0
fgi_threshold = 60      # buy when FGI < 60, sell otherwise
sell_amount = 10.0

[sweep]
threshold_start = 10
threshold_end = 90      # inclusive
threshold_step = 5
# thresholds = [20, 40, 60]   # explicit list overrides the range
sell_amounts = [10.0, 20.0, 30.0]
parallel = false
"#
        .to_string()
    }
}
