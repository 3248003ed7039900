//! Portfolio state carried through one simulation run.

use crate::types::DailyAction;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Cash, coins and cumulative deployed capital for a single run.
///
/// A fresh zeroed state is created for every run and is never shared between
/// runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    /// Cash on hand: deposits not yet deployed plus sale proceeds.
    pub cash: f64,
    /// BTC held, never negative.
    pub btc_holdings: f64,
    /// Cumulative cash converted into BTC. Never decreases.
    pub cash_invested: f64,
}

impl PortfolioState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the daily contribution to cash.
    pub fn deposit(&mut self, amount: f64) {
        self.cash += amount;
    }

    /// Convert `amount` of cash into BTC at `price`.
    ///
    /// Returns `SkippedBuy` without touching state when cash is short.
    pub fn buy(&mut self, amount: f64, price: f64) -> DailyAction {
        if self.cash < amount {
            trace!(cash = self.cash, amount, "buy skipped, insufficient cash");
            return DailyAction::SkippedBuy;
        }

        let btc = amount / price;
        self.btc_holdings += btc;
        self.cash -= amount;
        self.cash_invested += amount;
        DailyAction::Buy { amount, btc }
    }

    /// Sell up to `amount` worth of BTC at `price`, capped at holdings.
    pub fn sell(&mut self, amount: f64, price: f64) -> DailyAction {
        if self.btc_holdings <= 0.0 {
            return DailyAction::Hold;
        }

        let btc = (amount / price).min(self.btc_holdings);
        let value = btc * price;
        self.btc_holdings -= btc;
        self.cash += value;
        DailyAction::Sell { value, btc }
    }

    /// Mark-to-market value of the coins at `price`.
    pub fn btc_value(&self, price: f64) -> f64 {
        self.btc_holdings * price
    }

    /// Cash plus coins valued at `price`.
    pub fn total_value(&self, price: f64) -> f64 {
        self.cash + self.btc_value(price)
    }
}
