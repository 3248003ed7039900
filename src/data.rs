//! Loading and validation of the daily price / Fear & Greed table.
//!
//! The expected input is the merged table written by the data fetcher:
//!
//! ```text
//! date,Close,fgi_value,fgi_classification
//! 2024-01-01,42280.23,65,Greed
//! 2024-01-02,44187.14,71,Greed
//! ```
//!
//! Extra columns are ignored. Rows with an empty or `NaN` close or FGI cell
//! are incomplete; they are skipped by default.

use crate::error::{DcaError, Result};
use crate::types::{DailyObservation, FGI_MAX};
use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Raw CSV row with flexible column names.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(
        alias = "Date",
        alias = "DATE",
        alias = "timestamp",
        alias = "Timestamp",
        alias = "datetime"
    )]
    date: String,
    #[serde(alias = "Close", alias = "close_price", alias = "price", alias = "Price")]
    close: Option<f64>,
    #[serde(alias = "fgi", alias = "FGI", alias = "value")]
    fgi_value: Option<f64>,
}

/// Loader configuration.
#[derive(Debug, Clone)]
pub struct DataConfig {
    /// Explicit date format (e.g. "%d/%m/%Y"). Common formats are tried otherwise.
    pub date_format: Option<String>,
    /// CSV delimiter.
    pub delimiter: u8,
    /// Skip rows with a missing close or FGI value instead of failing.
    pub skip_incomplete: bool,
    /// Drop rows before this date.
    pub start_date: Option<NaiveDate>,
    /// Drop rows after this date.
    pub end_date: Option<NaiveDate>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            date_format: None,
            delimiter: b',',
            skip_incomplete: true,
            start_date: None,
            end_date: None,
        }
    }
}

/// Parse a date cell, keeping only the calendar day.
fn parse_date(s: &str, format: Option<&str>) -> Result<NaiveDate> {
    let s = s.trim();

    if let Some(fmt) = format {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in &datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }

    let date_formats = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];
    for fmt in &date_formats {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }

    Err(DcaError::InvalidInput(format!("Could not parse date: '{}'", s)))
}

/// Convert a raw FGI cell to an index value, rejecting fractions and out-of-range values.
fn parse_fgi(raw: f64) -> Option<u8> {
    if raw.fract() != 0.0 || raw < 0.0 || raw > f64::from(FGI_MAX) {
        return None;
    }
    Some(raw as u8)
}

/// Load observations from a CSV file.
pub fn load_observations(
    path: impl AsRef<Path>,
    config: &DataConfig,
) -> Result<Vec<DailyObservation>> {
    let path = path.as_ref();
    info!("Loading observations from: {}", path.display());
    let file = File::open(path)?;
    read_observations(file, config)
}

/// Read observations from any CSV source.
pub fn read_observations<R: Read>(
    source: R,
    config: &DataConfig,
) -> Result<Vec<DailyObservation>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(config.delimiter)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(source);

    let mut observations = Vec::new();
    let mut skipped = 0;

    for (idx, record) in reader.deserialize().enumerate() {
        let row_num = idx + 1;
        let row: CsvRow = record?;
        let date = parse_date(&row.date, config.date_format.as_deref())?;

        if config.start_date.is_some_and(|start| date < start)
            || config.end_date.is_some_and(|end| date > end)
        {
            continue;
        }

        let close = row.close.filter(|c| !c.is_nan());
        let fgi = row.fgi_value.filter(|v| !v.is_nan());

        let (close_price, fgi_raw) = match (close, fgi) {
            (Some(c), Some(f)) => (c, f),
            _ => {
                if config.skip_incomplete {
                    debug!("Skipping incomplete row {} ({})", row_num, date);
                    skipped += 1;
                    continue;
                }
                return Err(DcaError::InvalidInput(format!(
                    "Missing close or fgi_value at row {} ({})",
                    row_num, date
                )));
            }
        };

        let fgi_value = parse_fgi(fgi_raw).ok_or_else(|| {
            DcaError::InvalidInput(format!(
                "fgi_value {} out of range 0..={} at row {}",
                fgi_raw, FGI_MAX, row_num
            ))
        })?;

        observations.push(DailyObservation::new(date, close_price, fgi_value));
    }

    if skipped > 0 {
        warn!("Skipped {} incomplete rows", skipped);
    }

    observations.sort_by_key(|o| o.date);
    let original_len = observations.len();
    observations.dedup_by_key(|o| o.date);
    if observations.len() < original_len {
        warn!(
            "Removed {} duplicate dates",
            original_len - observations.len()
        );
    }

    if observations.is_empty() {
        return Err(DcaError::NoData);
    }

    validate_observations(&observations)?;

    info!(
        "Loaded {} observations from {} to {}",
        observations.len(),
        observations[0].date,
        observations[observations.len() - 1].date
    );

    Ok(observations)
}

/// Check the simulator's preconditions on a series.
///
/// The series must be non-empty, strictly increasing in date, with FGI values
/// in `0..=100` (`InvalidInput`) and positive finite closes (`Arithmetic`).
pub fn validate_observations(observations: &[DailyObservation]) -> Result<()> {
    if observations.is_empty() {
        return Err(DcaError::InvalidInput(
            "observation sequence is empty".to_string(),
        ));
    }

    let mut previous: Option<NaiveDate> = None;
    for obs in observations {
        if let Some(prev) = previous {
            if obs.date <= prev {
                return Err(DcaError::InvalidInput(format!(
                    "dates must be strictly increasing: {} follows {}",
                    obs.date, prev
                )));
            }
        }
        if obs.fgi_value > FGI_MAX {
            return Err(DcaError::InvalidInput(format!(
                "fgi_value {} out of range on {}",
                obs.fgi_value, obs.date
            )));
        }
        if !obs.has_tradable_price() {
            return Err(DcaError::Arithmetic(format!(
                "non-positive close price {} on {}",
                obs.close_price, obs.date
            )));
        }
        previous = Some(obs.date);
    }

    Ok(())
}

/// Descriptive statistics of a loaded series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSummary {
    pub rows: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub min_price: f64,
    pub max_price: f64,
    pub avg_price: f64,
    pub avg_fgi: f64,
    pub min_fgi: u8,
    pub max_fgi: u8,
}

/// Summarize a series; `None` when it is empty.
pub fn summarize(observations: &[DailyObservation]) -> Option<DataSummary> {
    let first = observations.first()?;
    let last = observations.last()?;
    let n = observations.len() as f64;

    let min_price = observations
        .iter()
        .fold(f64::INFINITY, |a, o| a.min(o.close_price));
    let max_price = observations
        .iter()
        .fold(f64::NEG_INFINITY, |a, o| a.max(o.close_price));
    let avg_price = observations.iter().map(|o| o.close_price).sum::<f64>() / n;
    let avg_fgi = observations.iter().map(|o| f64::from(o.fgi_value)).sum::<f64>() / n;

    Some(DataSummary {
        rows: observations.len(),
        start_date: first.date,
        end_date: last.date,
        min_price,
        max_price,
        avg_price,
        avg_fgi,
        min_fgi: observations.iter().map(|o| o.fgi_value).min()?,
        max_fgi: observations.iter().map(|o| o.fgi_value).max()?,
    })
}
