//! Flat tabular and JSON export of results.
//!
//! | Output | Format |
//! |--------|--------|
//! | Trial log | CSV: `fgi_threshold,sell_amount,final_portfolio_value,cash_invested,profit,status,error`, one row per combination |
//! | Daily history | CSV, one row per day |
//! | Reports | pretty JSON |

use crate::engine::SimulationReport;
use crate::error::Result;
use crate::optimizer::{OptimizationReport, TrialRecord};
use crate::types::DailySnapshot;
use chrono::NaiveDate;
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// One row of the daily history CSV.
#[derive(Debug, Serialize)]
struct HistoryRow {
    date: NaiveDate,
    action: String,
    close_price: f64,
    fgi_value: u8,
    cash: f64,
    btc_holdings: f64,
    btc_value: f64,
    portfolio_value: f64,
    cash_invested: f64,
    /// Portfolio value plus deployed capital.
    equity: f64,
}

impl From<&DailySnapshot> for HistoryRow {
    fn from(s: &DailySnapshot) -> Self {
        Self {
            date: s.date,
            action: s.action.to_string(),
            close_price: s.close_price,
            fgi_value: s.fgi_value,
            cash: s.cash,
            btc_holdings: s.btc_holdings,
            btc_value: s.btc_value,
            portfolio_value: s.portfolio_value,
            cash_invested: s.cash_invested,
            equity: s.portfolio_value + s.cash_invested,
        }
    }
}

/// Write the trial log as CSV to any writer.
pub fn write_trials_csv<W: Write>(records: &[TrialRecord], writer: W) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the daily history as CSV to any writer.
pub fn write_history_csv<W: Write>(history: &[DailySnapshot], writer: W) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    for snapshot in history {
        wtr.serialize(HistoryRow::from(snapshot))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Trial log of a sweep as a CSV string.
pub fn trials_to_csv_string(report: &OptimizationReport) -> Result<String> {
    let mut buf = Vec::new();
    write_trials_csv(&report.records(), &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Export the trial log of a sweep to a CSV file.
pub fn export_trials_csv(report: &OptimizationReport, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = BufWriter::new(File::create(path)?);
    let records = report.records();
    write_trials_csv(&records, file)?;
    info!(
        "Wrote {} trials ({} failed) to {}",
        records.len(),
        report.failures.len(),
        path.display()
    );
    Ok(())
}

/// Export the daily history of a run to a CSV file.
pub fn export_history_csv(report: &SimulationReport, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = BufWriter::new(File::create(path)?);
    write_history_csv(&report.history, file)?;
    info!(
        "Wrote {} daily snapshots to {}",
        report.history.len(),
        path.display()
    );
    Ok(())
}

/// Export any serializable report as pretty JSON.
pub fn export_json<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<()> {
    let file = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}
