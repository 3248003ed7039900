//! Core data types for the simulator and optimizer.

use crate::error::{DcaError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest value the Fear & Greed Index can take.
pub const FGI_MAX: u8 = 100;

/// One trading day of market data: closing price and sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyObservation {
    pub date: NaiveDate,
    pub close_price: f64,
    pub fgi_value: u8,
}

impl DailyObservation {
    pub fn new(date: NaiveDate, close_price: f64, fgi_value: u8) -> Self {
        Self {
            date,
            close_price,
            fgi_value,
        }
    }

    /// Whether the close can be used in a trade calculation.
    pub fn has_tradable_price(&self) -> bool {
        self.close_price.is_finite() && self.close_price > 0.0
    }
}

/// Parameters of a single simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyParameters {
    /// Amount deposited every day and spent on a buy day.
    pub investment_per_day: f64,
    /// Buy when the FGI is strictly below this value, otherwise sell.
    pub fgi_buy_threshold: i32,
    /// Cash value of BTC sold on a sell day.
    pub sell_amount: f64,
}

impl StrategyParameters {
    pub fn new(investment_per_day: f64, fgi_buy_threshold: i32, sell_amount: f64) -> Self {
        Self {
            investment_per_day,
            fgi_buy_threshold,
            sell_amount,
        }
    }

    /// Check that both amounts are finite and positive.
    pub fn validate(&self) -> Result<()> {
        if !(self.investment_per_day.is_finite() && self.investment_per_day > 0.0) {
            return Err(DcaError::InvalidInput(format!(
                "investment_per_day must be positive, got {}",
                self.investment_per_day
            )));
        }
        if !(self.sell_amount.is_finite() && self.sell_amount > 0.0) {
            return Err(DcaError::InvalidInput(format!(
                "sell_amount must be positive, got {}",
                self.sell_amount
            )));
        }
        Ok(())
    }
}

impl fmt::Display for StrategyParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invest={:.2}/day, fgi<{}, sell={:.2}",
            self.investment_per_day, self.fgi_buy_threshold, self.sell_amount
        )
    }
}

/// Outcome of one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub final_portfolio_value: f64,
    pub cash_invested: f64,
    pub profit: f64,
}

impl SimulationResult {
    /// Build a result; profit is always derived from the other two fields.
    pub fn new(final_portfolio_value: f64, cash_invested: f64) -> Self {
        Self {
            final_portfolio_value,
            cash_invested,
            profit: final_portfolio_value - cash_invested,
        }
    }
}

/// What the strategy did on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DailyAction {
    /// Spent `amount` of cash on `btc` coins.
    Buy { amount: f64, btc: f64 },
    /// Sold `btc` coins for `value` cash.
    Sell { value: f64, btc: f64 },
    /// Buy signal but not enough cash on hand.
    SkippedBuy,
    /// Sell signal with nothing to sell.
    Hold,
}

impl DailyAction {
    pub fn is_trade(&self) -> bool {
        matches!(self, DailyAction::Buy { .. } | DailyAction::Sell { .. })
    }
}

impl fmt::Display for DailyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DailyAction::Buy { amount, btc } => write!(f, "BUY {:.2} ({:.8} BTC)", amount, btc),
            DailyAction::Sell { value, btc } => write!(f, "SELL {:.2} ({:.8} BTC)", value, btc),
            DailyAction::SkippedBuy => write!(f, "SKIP (insufficient cash)"),
            DailyAction::Hold => write!(f, "HOLD (no BTC to sell)"),
        }
    }
}

/// Portfolio state at the close of one day, after that day's action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    pub action: DailyAction,
    pub close_price: f64,
    pub fgi_value: u8,
    pub cash: f64,
    pub btc_holdings: f64,
    pub btc_value: f64,
    pub portfolio_value: f64,
    pub cash_invested: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profit_is_derived() {
        let result = SimulationResult::new(60.0, 20.0);
        assert_eq!(result.profit, 40.0);
    }

    #[test]
    fn test_parameter_validation() {
        assert!(StrategyParameters::new(10.0, 60, 10.0).validate().is_ok());
        assert!(StrategyParameters::new(0.0, 60, 10.0).validate().is_err());
        assert!(StrategyParameters::new(10.0, 60, -5.0).validate().is_err());
        assert!(StrategyParameters::new(f64::NAN, 60, 10.0).validate().is_err());
    }

    #[test]
    fn test_tradable_price() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(DailyObservation::new(date, 100.0, 50).has_tradable_price());
        assert!(!DailyObservation::new(date, 0.0, 50).has_tradable_price());
        assert!(!DailyObservation::new(date, -1.0, 50).has_tradable_price());
        assert!(!DailyObservation::new(date, f64::INFINITY, 50).has_tradable_price());
    }

    #[test]
    fn test_action_display() {
        assert!(DailyAction::Buy { amount: 10.0, btc: 0.1 }
            .to_string()
            .starts_with("BUY"));
        assert!(DailyAction::Hold.to_string().starts_with("HOLD"));
        assert!(!DailyAction::SkippedBuy.is_trade());
    }
}
