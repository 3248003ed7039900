//! Day-by-day portfolio simulation.
//!
//! The decision rule, applied once per day in date order:
//!
//! 1. deposit `investment_per_day` into cash;
//! 2. if `fgi_value < fgi_buy_threshold`, buy `investment_per_day` worth of
//!    BTC when cash allows;
//! 3. otherwise sell `sell_amount` worth of BTC, capped at holdings, or hold
//!    when there is nothing to sell.
//!
//! The portfolio is valued at the close of the last observation.

use crate::data::validate_observations;
use crate::error::{DcaError, Result};
use crate::portfolio::PortfolioState;
use crate::types::{
    DailyAction, DailyObservation, DailySnapshot, SimulationResult, StrategyParameters,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Full output of a run with daily history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub params: StrategyParameters,
    pub result: SimulationResult,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub trading_days: usize,
    pub buy_days: usize,
    pub sell_days: usize,
    pub history: Vec<DailySnapshot>,
}

/// Run the strategy over `observations` and return the terminal result.
///
/// Fails with `InvalidInput` on an empty or malformed series or bad
/// parameters, and with `Arithmetic` on a non-positive price.
pub fn simulate(
    observations: &[DailyObservation],
    params: &StrategyParameters,
) -> Result<SimulationResult> {
    run_days(observations, params, |_, _, _| {})
}

/// Same as [`simulate`] but records one snapshot per day.
pub fn simulate_with_history(
    observations: &[DailyObservation],
    params: &StrategyParameters,
) -> Result<SimulationReport> {
    let mut history = Vec::with_capacity(observations.len());
    let result = run_days(observations, params, |obs, action, state| {
        history.push(DailySnapshot {
            date: obs.date,
            action,
            close_price: obs.close_price,
            fgi_value: obs.fgi_value,
            cash: state.cash,
            btc_holdings: state.btc_holdings,
            btc_value: state.btc_value(obs.close_price),
            portfolio_value: state.total_value(obs.close_price),
            cash_invested: state.cash_invested,
        });
    })?;

    let buy_days = history
        .iter()
        .filter(|s| matches!(s.action, DailyAction::Buy { .. }))
        .count();
    let sell_days = history
        .iter()
        .filter(|s| matches!(s.action, DailyAction::Sell { .. }))
        .count();

    // run_days rejects empty input, so both ends exist.
    let (start_date, end_date) = match (observations.first(), observations.last()) {
        (Some(first), Some(last)) => (first.date, last.date),
        _ => return Err(DcaError::InvalidInput("empty observation sequence".into())),
    };

    info!(
        "Simulated {} days ({} buys, {} sells): final value {:.2}, invested {:.2}",
        history.len(),
        buy_days,
        sell_days,
        result.final_portfolio_value,
        result.cash_invested
    );

    Ok(SimulationReport {
        params: *params,
        result,
        start_date,
        end_date,
        trading_days: history.len(),
        buy_days,
        sell_days,
        history,
    })
}

/// Plain DCA benchmark: buy `investment_per_day` every day, never sell.
pub fn simulate_plain_dca(
    observations: &[DailyObservation],
    investment_per_day: f64,
) -> Result<SimulationResult> {
    if !(investment_per_day.is_finite() && investment_per_day > 0.0) {
        return Err(DcaError::InvalidInput(format!(
            "investment_per_day must be positive, got {}",
            investment_per_day
        )));
    }
    validate_observations(observations)?;

    let mut state = PortfolioState::new();
    for obs in observations {
        state.deposit(investment_per_day);
        state.buy(investment_per_day, obs.close_price);
    }

    let last_close = last_close(observations)?;
    Ok(SimulationResult::new(
        state.total_value(last_close),
        state.cash_invested,
    ))
}

/// Apply one day of the decision rule to `state`.
fn step(
    state: &mut PortfolioState,
    obs: &DailyObservation,
    params: &StrategyParameters,
) -> DailyAction {
    state.deposit(params.investment_per_day);

    if i32::from(obs.fgi_value) < params.fgi_buy_threshold {
        state.buy(params.investment_per_day, obs.close_price)
    } else {
        state.sell(params.sell_amount, obs.close_price)
    }
}

/// Shared day loop behind every public entry point.
fn run_days<F>(
    observations: &[DailyObservation],
    params: &StrategyParameters,
    mut on_day: F,
) -> Result<SimulationResult>
where
    F: FnMut(&DailyObservation, DailyAction, &PortfolioState),
{
    params.validate()?;
    validate_observations(observations)?;

    let mut state = PortfolioState::new();
    for obs in observations {
        let action = step(&mut state, obs, params);
        if action.is_trade() {
            debug!("{} {} at {:.2}", obs.date, action, obs.close_price);
        }
        on_day(obs, action, &state);
    }

    let last_close = last_close(observations)?;
    Ok(SimulationResult::new(
        state.total_value(last_close),
        state.cash_invested,
    ))
}

fn last_close(observations: &[DailyObservation]) -> Result<f64> {
    observations
        .last()
        .map(|obs| obs.close_price)
        .ok_or_else(|| DcaError::InvalidInput("empty observation sequence".into()))
}
