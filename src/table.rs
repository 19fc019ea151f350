use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde_json::{Map, Number, Value};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::{PipelineError, Result};
use crate::types::{RawRecord, Row};

// Day number of 1970-01-01 counted from 0001-01-01, the epoch polars dates use
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Build the raw movie frame. Columns are the union of record keys in
/// first-seen order and a key a record lacks becomes null.
///
/// A column whose values are all integers is `Int64`, all numbers `Float64`,
/// all booleans `Boolean`. Anything else is a `String` column: scalars keep
/// their text and nested objects or lists are stored as JSON text for the
/// extract stage to parse.
pub fn frame_from_records(records: &[RawRecord]) -> Result<DataFrame> {
    let mut names: Vec<&str> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut objects: Vec<&Map<String, Value>> = Vec::with_capacity(records.len());

    for (position, record) in records.iter().enumerate() {
        let Some(object) = record.as_object() else {
            warn!("Skipping raw record {} that is not a JSON object", position);
            continue;
        };
        for key in object.keys() {
            if seen.insert(key.as_str()) {
                names.push(key.as_str());
            }
        }
        objects.push(object);
    }

    let columns = names
        .iter()
        .map(|name| {
            let values: Vec<Option<&Value>> = objects
                .iter()
                .map(|object| object.get(*name).filter(|v| !v.is_null()))
                .collect();
            raw_column(name, &values).into_column()
        })
        .collect();
    Ok(DataFrame::new(columns)?)
}

fn raw_column(name: &str, values: &[Option<&Value>]) -> Series {
    let present: Vec<&Value> = values.iter().flatten().copied().collect();
    let name = PlSmallStr::from(name);
    if present.is_empty() {
        let nulls: StringChunked = values.iter().map(|_| None::<&str>).collect();
        return nulls.with_name(name).into_series();
    }

    if present.iter().all(|v| v.is_i64()) {
        let ints: Vec<Option<i64>> = values.iter().map(|v| v.and_then(Value::as_i64)).collect();
        Series::new(name, ints)
    } else if present.iter().all(|v| v.is_number()) {
        let floats: Vec<Option<f64>> = values.iter().map(|v| v.and_then(Value::as_f64)).collect();
        Series::new(name, floats)
    } else if present.iter().all(|v| v.is_boolean()) {
        let flags: Vec<Option<bool>> = values.iter().map(|v| v.and_then(Value::as_bool)).collect();
        Series::new(name, flags)
    } else {
        let texts: StringChunked = values.iter().map(|v| v.map(raw_text)).collect();
        texts.with_name(name).into_series()
    }
}

fn raw_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render every row as a JSON object with keys in column order. Dates print
/// as `YYYY-MM-DD` and non-finite floats as null.
pub fn to_rows(frame: &DataFrame) -> Result<Vec<Row>> {
    let columns: Vec<&Series> = frame
        .get_columns()
        .iter()
        .map(Column::as_materialized_series)
        .collect();

    let mut rows = Vec::with_capacity(frame.height());
    for position in 0..frame.height() {
        let mut row = Row::new();
        for series in &columns {
            row.insert(series.name().to_string(), json_value(series.get(position)?));
        }
        rows.push(row);
    }
    Ok(rows)
}

fn json_value(value: AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Int32(i) => i.into(),
        AnyValue::Int64(i) => i.into(),
        AnyValue::UInt32(u) => u.into(),
        AnyValue::UInt64(u) => u.into(),
        AnyValue::Float32(f) => float_value(f64::from(f)),
        AnyValue::Float64(f) => float_value(f),
        AnyValue::Date(days) => date_from_days(days)
            .map(|date| Value::String(date.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null),
        other => Value::String(other.to_string()),
    }
}

fn float_value(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

/// SHA-256 of the JSON rendering; equal frames give equal fingerprints.
pub fn fingerprint(frame: &DataFrame) -> Result<String> {
    let bytes = serde_json::to_vec(&to_rows(frame)?)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

pub fn require_column<'a>(frame: &'a DataFrame, name: &str) -> Result<&'a Series> {
    frame
        .column(name)
        .map(Column::as_materialized_series)
        .map_err(|_| PipelineError::missing_column(name))
}

/// Numeric view of a column; anything that does not cast becomes null.
pub fn floats(frame: &DataFrame, name: &str) -> Result<Float64Chunked> {
    let series = require_column(frame, name)?.cast(&DataType::Float64)?;
    Ok(series.f64()?.clone())
}

/// Text view of a column. Numbers are rendered as text.
pub fn texts(frame: &DataFrame, name: &str) -> Result<StringChunked> {
    let series = require_column(frame, name)?;
    if series.dtype() == &DataType::String {
        return Ok(series.str()?.clone());
    }
    let series = series.cast(&DataType::String)?;
    Ok(series.str()?.clone())
}

/// Calendar view of a `Date` column.
pub fn dates(frame: &DataFrame, name: &str) -> Result<Vec<Option<NaiveDate>>> {
    let series = require_column(frame, name)?.cast(&DataType::Int32)?;
    Ok(series
        .i32()?
        .into_iter()
        .map(|days| days.and_then(date_from_days))
        .collect())
}

pub fn date_from_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

pub fn days_from_date(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

pub fn column_names(frame: &DataFrame) -> Vec<String> {
    frame
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> DataFrame {
        frame_from_records(&[
            json!({"id": 1, "title": "A"}),
            json!({"id": 2, "budget": 5.5}),
            json!({"id": 3, "title": "C", "genres": [{"name": "Drama"}]}),
        ])
        .unwrap()
    }

    #[test]
    fn test_from_records_unions_keys_in_first_seen_order() {
        let frame = sample();
        assert_eq!(column_names(&frame), ["id", "title", "budget", "genres"]);
        assert_eq!(frame.column("id").unwrap().dtype(), &DataType::Int64);
        assert_eq!(frame.column("budget").unwrap().dtype(), &DataType::Float64);
        assert_eq!(floats(&frame, "budget").unwrap().get(0), None);
        assert_eq!(floats(&frame, "budget").unwrap().get(1), Some(5.5));
    }

    #[test]
    fn test_nested_values_are_kept_as_json_text() {
        let frame = sample();
        let genres = texts(&frame, "genres").unwrap();
        assert_eq!(genres.get(2), Some(r#"[{"name":"Drama"}]"#));
        assert_eq!(genres.get(0), None);
    }

    #[test]
    fn test_mixed_scalars_become_text() {
        let frame = frame_from_records(&[json!({"id": 1}), json!({"id": "1.0"}), json!({"id": true})]).unwrap();
        let ids = texts(&frame, "id").unwrap();
        assert_eq!(ids.get(0), Some("1"));
        assert_eq!(ids.get(1), Some("1.0"));
        assert_eq!(ids.get(2), Some("true"));
    }

    #[test]
    fn test_non_object_records_are_skipped() {
        let frame = frame_from_records(&[json!(42), json!({"id": 1})]).unwrap();
        assert_eq!(frame.height(), 1);
    }

    #[test]
    fn test_no_records_gives_empty_frame() {
        let frame = frame_from_records(&[]).unwrap();
        assert_eq!(frame.height(), 0);
        assert_eq!(frame.width(), 0);
    }

    #[test]
    fn test_require_column_reports_name() {
        let frame = sample();
        let err = require_column(&frame, "revenue").unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(ref c) if c == "revenue"));
    }

    #[test]
    fn test_rows_render_in_column_order() {
        let frame = sample().drop("genres").unwrap().drop("budget").unwrap();
        let text = serde_json::to_string(&to_rows(&frame).unwrap()).unwrap();
        assert_eq!(
            text,
            r#"[{"id":1,"title":"A"},{"id":2,"title":null},{"id":3,"title":"C"}]"#
        );
    }

    #[test]
    fn test_dates_render_as_calendar_text() {
        let date = NaiveDate::from_ymd_opt(1999, 3, 30).unwrap();
        let days = Series::new("release_date".into(), [Some(days_from_date(date)), None]);
        let frame = DataFrame::new(vec![days.cast(&DataType::Date).unwrap().into_column()]).unwrap();

        let rows = to_rows(&frame).unwrap();
        assert_eq!(rows[0]["release_date"], "1999-03-30");
        assert!(rows[1]["release_date"].is_null());
        assert_eq!(dates(&frame, "release_date").unwrap(), [Some(date), None]);
    }

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(fingerprint(&sample()).unwrap(), fingerprint(&sample()).unwrap());
        assert_ne!(
            fingerprint(&sample()).unwrap(),
            fingerprint(&sample().head(Some(2))).unwrap()
        );
    }
}
