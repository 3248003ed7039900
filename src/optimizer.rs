//! Grid search over strategy parameters.
//!
//! Every combination of `thresholds × sell_amounts` is simulated from a fresh
//! portfolio. The best trial is the one with the highest terminal portfolio
//! value; ties keep the combination enumerated first (threshold outer loop,
//! sell amount inner loop). A failing combination is recorded as a
//! [`TrialFailure`] and the sweep carries on.
//!
//! # Example
//!
//! ```ignore
//! use fgi_dca::optimizer::{optimize_with, ParameterGrid, SweepConfig};
//!
//! let grid = ParameterGrid::default();
//! let report = optimize_with(&observations, &grid, &SweepConfig::default());
//! if let Some(best) = &report.best {
//!     println!("best: {} -> {:.2}", best.params, best.result.final_portfolio_value);
//! }
//! ```

use crate::engine::{simulate, simulate_plain_dca};
use crate::error::{DcaError, Result};
use crate::metadata::{compute_config_hash, observations_hash};
use crate::types::{DailyObservation, SimulationResult, StrategyParameters};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info, warn};

/// Inclusive integer range of FGI thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdRange {
    pub start: i32,
    pub end: i32,
    pub step: i32,
}

impl ThresholdRange {
    pub fn new(start: i32, end: i32, step: i32) -> Self {
        Self { start, end, step }
    }

    /// Values from `start` up to and including `end`.
    pub fn values(&self) -> Result<Vec<i32>> {
        if self.step <= 0 {
            return Err(DcaError::ConfigError(format!(
                "threshold step must be positive, got {}",
                self.step
            )));
        }
        if self.end < self.start {
            return Err(DcaError::ConfigError(format!(
                "threshold range is empty: {}..={}",
                self.start, self.end
            )));
        }

        let mut values = Vec::new();
        let mut current = self.start;
        while current <= self.end {
            values.push(current);
            current = match current.checked_add(self.step) {
                Some(next) => next,
                None => break,
            };
        }
        Ok(values)
    }
}

impl Default for ThresholdRange {
    fn default() -> Self {
        Self::new(10, 90, 5)
    }
}

/// The parameter space searched by a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterGrid {
    /// Daily deposit, fixed across the sweep.
    pub investment_per_day: f64,
    /// FGI buy thresholds, outer loop.
    pub thresholds: Vec<i32>,
    /// Sell amounts, inner loop.
    pub sell_amounts: Vec<f64>,
}

impl ParameterGrid {
    pub fn new(investment_per_day: f64, thresholds: Vec<i32>, sell_amounts: Vec<f64>) -> Self {
        Self {
            investment_per_day,
            thresholds,
            sell_amounts,
        }
    }

    /// Build a grid whose thresholds come from an inclusive range.
    pub fn from_range(
        investment_per_day: f64,
        range: ThresholdRange,
        sell_amounts: Vec<f64>,
    ) -> Result<Self> {
        Ok(Self::new(investment_per_day, range.values()?, sell_amounts))
    }

    /// All combinations in enumeration order: threshold outer, sell amount inner.
    pub fn combinations(&self) -> Vec<StrategyParameters> {
        self.thresholds
            .iter()
            .flat_map(|&threshold| {
                self.sell_amounts.iter().map(move |&sell_amount| {
                    StrategyParameters::new(self.investment_per_day, threshold, sell_amount)
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.thresholds.len() * self.sell_amounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ParameterGrid {
    fn default() -> Self {
        Self {
            investment_per_day: 10.0,
            thresholds: (10..=90).step_by(5).collect(),
            sell_amounts: vec![10.0, 20.0, 30.0],
        }
    }
}

/// Execution options for a sweep.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Evaluate trials on the rayon thread pool.
    pub parallel: bool,
    /// Show a progress bar on stderr.
    pub show_progress: bool,
}

/// One successfully evaluated combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    /// Position in enumeration order.
    pub index: usize,
    pub params: StrategyParameters,
    pub result: SimulationResult,
}

/// Flat view of one combination, one row of the trial log.
///
/// Numeric fields are empty for a combination that failed; `error` then holds
/// the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub fgi_threshold: i32,
    pub sell_amount: f64,
    pub final_portfolio_value: Option<f64>,
    pub cash_invested: Option<f64>,
    pub profit: Option<f64>,
    pub status: TrialStatus,
    pub error: Option<String>,
}

/// Outcome of one combination in the trial log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialStatus {
    Ok,
    Failed,
}

impl Trial {
    pub fn record(&self) -> TrialRecord {
        TrialRecord {
            fgi_threshold: self.params.fgi_buy_threshold,
            sell_amount: self.params.sell_amount,
            final_portfolio_value: Some(self.result.final_portfolio_value),
            cash_invested: Some(self.result.cash_invested),
            profit: Some(self.result.profit),
            status: TrialStatus::Ok,
            error: None,
        }
    }
}

/// A combination that could not be evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialFailure {
    pub index: usize,
    pub params: StrategyParameters,
    pub reason: String,
}

impl TrialFailure {
    pub fn record(&self) -> TrialRecord {
        TrialRecord {
            fgi_threshold: self.params.fgi_buy_threshold,
            sell_amount: self.params.sell_amount,
            final_portfolio_value: None,
            cash_invested: None,
            profit: None,
            status: TrialStatus::Failed,
            error: Some(self.reason.clone()),
        }
    }
}

/// The winning combination of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestResult {
    pub index: usize,
    pub params: StrategyParameters,
    pub result: SimulationResult,
}

/// Everything a sweep produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub grid: ParameterGrid,
    /// `None` when no trial succeeded.
    pub best: Option<BestResult>,
    /// Successful trials in enumeration order.
    pub trials: Vec<Trial>,
    pub failures: Vec<TrialFailure>,
    /// Plain DCA at the grid's daily investment, when it could be computed.
    pub baseline: Option<SimulationResult>,
    pub grid_hash: String,
    pub data_hash: String,
}

impl OptimizationReport {
    /// Trials sorted by descending final value, enumeration order on ties.
    pub fn ranked(&self) -> Vec<&Trial> {
        let mut ranked: Vec<&Trial> = self.trials.iter().collect();
        ranked.sort_by(|a, b| {
            b.result
                .final_portfolio_value
                .partial_cmp(&a.result.final_portfolio_value)
                .unwrap_or(Ordering::Equal)
                .then(a.index.cmp(&b.index))
        });
        ranked
    }

    /// One record per combination in enumeration order, failures included.
    pub fn records(&self) -> Vec<TrialRecord> {
        let mut indexed: Vec<(usize, TrialRecord)> = self
            .trials
            .iter()
            .map(|t| (t.index, t.record()))
            .chain(self.failures.iter().map(|f| (f.index, f.record())))
            .collect();
        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, record)| record).collect()
    }

    pub fn total_combinations(&self) -> usize {
        self.trials.len() + self.failures.len()
    }
}

/// Sweep `thresholds × sell_amounts` sequentially at a fixed daily investment.
pub fn optimize(
    observations: &[DailyObservation],
    investment_per_day: f64,
    thresholds: &[i32],
    sell_amounts: &[f64],
) -> OptimizationReport {
    let grid = ParameterGrid::new(
        investment_per_day,
        thresholds.to_vec(),
        sell_amounts.to_vec(),
    );
    optimize_with(observations, &grid, &SweepConfig::default())
}

/// Sweep a grid with explicit execution options.
///
/// The parallel path collects outcomes in enumeration order before reducing,
/// so both paths return identical reports.
pub fn optimize_with(
    observations: &[DailyObservation],
    grid: &ParameterGrid,
    config: &SweepConfig,
) -> OptimizationReport {
    let combinations = grid.combinations();
    info!(
        "Sweeping {} combinations ({} thresholds x {} sell amounts) over {} days",
        combinations.len(),
        grid.thresholds.len(),
        grid.sell_amounts.len(),
        observations.len()
    );

    let progress = if config.show_progress {
        let pb = ProgressBar::new(combinations.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    } else {
        None
    };

    let evaluate = |(index, params): (usize, &StrategyParameters)| {
        let outcome = simulate(observations, params);
        if let Some(pb) = &progress {
            pb.inc(1);
        }
        (index, *params, outcome)
    };

    let outcomes: Vec<(usize, StrategyParameters, Result<SimulationResult>)> = if config.parallel
    {
        combinations.par_iter().enumerate().map(evaluate).collect()
    } else {
        combinations.iter().enumerate().map(evaluate).collect()
    };

    if let Some(pb) = &progress {
        pb.finish_with_message("Sweep complete");
    }

    let mut trials = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for (index, params, outcome) in outcomes {
        match outcome {
            Ok(result) => {
                debug!(
                    "Trial {}: {} => final {:.2}, invested {:.2}, profit {:.2}",
                    index, params, result.final_portfolio_value, result.cash_invested, result.profit
                );
                trials.push(Trial {
                    index,
                    params,
                    result,
                });
            }
            Err(e) => {
                warn!("Trial {} ({}) failed: {}", index, params, e);
                failures.push(TrialFailure {
                    index,
                    params,
                    reason: e.to_string(),
                });
            }
        }
    }

    let best = select_best(&trials);
    match &best {
        Some(b) => info!(
            "Best: {} => final {:.2} (profit {:.2})",
            b.params, b.result.final_portfolio_value, b.result.profit
        ),
        None => warn!("No trial succeeded ({} failures)", failures.len()),
    }

    let baseline = simulate_plain_dca(observations, grid.investment_per_day).ok();

    OptimizationReport {
        grid: grid.clone(),
        best,
        trials,
        failures,
        baseline,
        grid_hash: compute_config_hash(grid),
        data_hash: observations_hash(observations),
    }
}

/// Running maximum of final value; only a strictly greater value replaces the leader.
fn select_best(trials: &[Trial]) -> Option<BestResult> {
    let mut best: Option<&Trial> = None;
    for trial in trials {
        if trial.result.final_portfolio_value.is_nan() {
            continue;
        }
        let replace = match best {
            None => true,
            Some(current) => {
                trial.result.final_portfolio_value > current.result.final_portfolio_value
            }
        };
        if replace {
            best = Some(trial);
        }
    }

    best.map(|t| BestResult {
        index: t.index,
        params: t.params,
        result: t.result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::simulate;
    use chrono::NaiveDate;

    fn scenario() -> Vec<DailyObservation> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        vec![
            DailyObservation::new(base, 100.0, 30),
            DailyObservation::new(base + chrono::Duration::days(1), 50.0, 30),
            DailyObservation::new(base + chrono::Duration::days(2), 200.0, 80),
        ]
    }

    #[test]
    fn test_threshold_range_inclusive() {
        let values = ThresholdRange::new(10, 90, 5).values().unwrap();
        assert_eq!(values.len(), 17);
        assert_eq!(values.first(), Some(&10));
        assert_eq!(values.last(), Some(&90));
    }

    #[test]
    fn test_threshold_range_rejects_bad_step() {
        assert!(ThresholdRange::new(10, 90, 0).values().is_err());
        assert!(ThresholdRange::new(90, 10, 5).values().is_err());
    }

    #[test]
    fn test_combination_order() {
        let grid = ParameterGrid::new(10.0, vec![10, 60], vec![10.0, 20.0]);
        let combos = grid.combinations();
        let order: Vec<(i32, f64)> = combos
            .iter()
            .map(|p| (p.fgi_buy_threshold, p.sell_amount))
            .collect();
        assert_eq!(order, vec![(10, 10.0), (10, 20.0), (60, 10.0), (60, 20.0)]);
        assert_eq!(grid.len(), 4);
    }

    #[test]
    fn test_default_grid() {
        let grid = ParameterGrid::default();
        assert_eq!(grid.thresholds.len(), 17);
        assert_eq!(grid.len(), 51);
    }

    #[test]
    fn test_single_combination_equals_simulate() {
        let data = scenario();
        let report = optimize(&data, 10.0, &[60], &[10.0]);
        let direct = simulate(&data, &StrategyParameters::new(10.0, 60, 10.0)).unwrap();

        let best = report.best.unwrap();
        assert_eq!(best.result, direct);
        assert_eq!(report.trials.len(), 1);
    }

    #[test]
    fn test_skips_inferior_configuration() {
        let data = scenario();
        let report = optimize(&data, 10.0, &[10, 60], &[10.0]);
        let best = report.best.unwrap();

        assert_eq!(best.params.fgi_buy_threshold, 60);
        let never_buys = &report.trials[0];
        assert_eq!(never_buys.result.final_portfolio_value, 30.0);
        assert_eq!(never_buys.result.cash_invested, 0.0);
        assert_eq!(never_buys.result.profit, 30.0);
    }

    #[test]
    fn test_first_found_wins_ties() {
        let data = scenario();
        // Thresholds 0 and 10 both never buy: identical final values.
        let report = optimize(&data, 10.0, &[0, 10], &[10.0, 20.0]);
        let best = report.best.unwrap();
        assert_eq!(best.index, 0);
        assert_eq!(best.params.fgi_buy_threshold, 0);
        assert_eq!(best.params.sell_amount, 10.0);
    }

    #[test]
    fn test_failures_do_not_abort() {
        let data = scenario();
        let report = optimize(&data, 10.0, &[60], &[-1.0, 10.0]);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 0);
        assert_eq!(report.trials.len(), 1);
        assert_eq!(report.best.unwrap().index, 1);
    }

    #[test]
    fn test_no_trial_succeeded() {
        let report = optimize(&[], 10.0, &[60], &[10.0]);
        assert!(report.best.is_none());
        assert!(report.trials.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert!(report.baseline.is_none());
    }

    #[test]
    fn test_empty_grid() {
        let report = optimize(&scenario(), 10.0, &[], &[10.0]);
        assert!(report.best.is_none());
        assert_eq!(report.total_combinations(), 0);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let data = scenario();
        let grid = ParameterGrid::new(10.0, vec![0, 10, 31, 60, 90], vec![5.0, 10.0, 30.0]);
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
    }

    #[test]
    fn test_records_cover_every_combination() {
        let report = optimize(&scenario(), 10.0, &[60], &[-1.0, 10.0, 0.0]);
        let records = report.records();

        assert_eq!(records.len(), report.total_combinations());
        let statuses: Vec<TrialStatus> = records.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![TrialStatus::Failed, TrialStatus::Ok, TrialStatus::Failed]
        );
        assert_eq!(records[0].sell_amount, -1.0);
        assert!(records[0].final_portfolio_value.is_none());
        assert!(records[0].error.is_some());
        assert_eq!(
            records[1].final_portfolio_value,
            Some(report.trials[0].result.final_portfolio_value)
        );
        assert!(records[1].error.is_none());
    }

    #[test]
    fn test_ranked_order() {
        let report = optimize(&scenario(), 10.0, &[10, 60], &[10.0, 20.0]);
        let ranked = report.ranked();
        assert_eq!(ranked.len(), 4);
        assert!(ranked
            .windows(2)
            .all(|w| w[0].result.final_portfolio_value >= w[1].result.final_portfolio_value));
        assert_eq!(ranked[0].index, report.best.as_ref().unwrap().index);
    }

    #[test]
    fn test_report_fingerprints() {
        let data = scenario();
        let a = optimize(&data, 10.0, &[60], &[10.0]);
        let b = optimize(&data, 10.0, &[60], &[10.0]);
        let c = optimize(&data, 10.0, &[61], &[10.0]);
        assert_eq!(a.grid_hash, b.grid_hash);
        assert_eq!(a.data_hash, b.data_hash);
        assert_ne!(a.grid_hash, c.grid_hash);
    }
}
