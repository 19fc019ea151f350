use chrono::{DateTime, NaiveDate};
use polars::prelude::*;
use tracing::{debug, info};

use crate::constants::{BUDGET, ID, POPULARITY, RELEASE_DATE, REVENUE, RUNTIME, VOTE_AVERAGE, VOTE_COUNT};
use crate::error::Result;
use crate::pipeline::TableStage;
use crate::table::{self, days_from_date};

// Largest magnitude at which every integral f64 is an exact i64
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Best-effort conversion of designated columns to numbers and dates.
/// Anything that does not parse becomes null; this stage never fails on
/// bad values.
///
/// Integer columns hold whole numbers only, so `1`, `1.0` and `"1.0"` all
/// land as the same `Int64` value and `1.5` becomes null.
pub struct CoerceStage {
    integers: Vec<String>,
    floats: Vec<String>,
    dates: Vec<String>,
}

impl CoerceStage {
    pub fn new(integers: Vec<String>, floats: Vec<String>, dates: Vec<String>) -> Self {
        Self {
            integers,
            floats,
            dates,
        }
    }

    pub fn tmdb_default() -> Self {
        let owned = |names: &[&str]| -> Vec<String> { names.iter().map(|s| s.to_string()).collect() };
        Self::new(
            owned(&[ID, VOTE_COUNT]),
            owned(&[BUDGET, REVENUE, POPULARITY, RUNTIME, VOTE_AVERAGE]),
            owned(&[RELEASE_DATE]),
        )
    }
}

impl TableStage for CoerceStage {
    fn name(&self) -> &'static str {
        "coerce"
    }

    fn apply(&self, mut frame: DataFrame) -> Result<DataFrame> {
        let mut coerced = 0;
        for column in &self.integers {
            if frame.column(column).is_err() {
                debug!("Integer column {} not present", column);
                continue;
            }
            let values = to_integers(table::require_column(&frame, column)?)?;
            frame.with_column(values.with_name(column.as_str().into()).into_series())?;
            coerced += 1;
        }
        for column in &self.floats {
            if frame.column(column).is_err() {
                debug!("Numeric column {} not present", column);
                continue;
            }
            let values = to_floats(table::require_column(&frame, column)?)?;
            frame.with_column(values.with_name(column.as_str().into()).into_series())?;
            coerced += 1;
        }
        for column in &self.dates {
            if frame.column(column).is_err() {
                debug!("Date column {} not present", column);
                continue;
            }
            let values = to_dates(table::require_column(&frame, column)?)?;
            frame.with_column(values)?;
            coerced += 1;
        }
        info!("Coerced {} columns", coerced);
        Ok(frame)
    }
}

/// Text is trimmed and parsed, booleans count as 1/0, non-finite values are null.
pub fn to_floats(series: &Series) -> Result<Float64Chunked> {
    let values: Float64Chunked = match series.dtype() {
        DataType::String => series.str()?.into_iter().map(|text| text.and_then(parse_number)).collect(),
        _ => series
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|value| value.filter(|v| v.is_finite()))
            .collect(),
    };
    Ok(values)
}

pub fn to_integers(series: &Series) -> Result<Int64Chunked> {
    Ok(to_floats(series)?
        .into_iter()
        .map(|value| value.and_then(whole_number))
        .collect())
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn whole_number(value: f64) -> Option<i64> {
    (value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER).then_some(value as i64)
}

/// Text columns are parsed as dates, a `Date` column is kept, any other
/// type becomes all null.
pub fn to_dates(series: &Series) -> Result<Series> {
    let days: Int32Chunked = match series.dtype() {
        DataType::Date => return Ok(series.clone()),
        DataType::String => series
            .str()?
            .into_iter()
            .map(|text| text.and_then(parse_date).map(days_from_date))
            .collect(),
        _ => (0..series.len()).map(|_| None::<i32>).collect(),
    };
    Ok(days.with_name(series.name().clone()).into_series().cast(&DataType::Date)?)
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (its calendar date is kept).
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}
