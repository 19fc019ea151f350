use polars::prelude::*;
use serde_json::Value;
use tracing::{debug, info};

use crate::constants::{
    BELONGS_TO_COLLECTION, CAST, CAST_SIZE, CREDITS, CREW_SIZE, DELIMITER, DIRECTOR, DIRECTOR_JOB,
    GENRES, ORIGIN_COUNTRY, PRODUCTION_COMPANIES, PRODUCTION_COUNTRIES, SPOKEN_LANGUAGES,
};
use crate::error::Result;
use crate::pipeline::TableStage;
use crate::table;

/// One flattening instruction for a nested column
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Pull `key` out of an object, or join it across a list of objects
    Key { column: String, key: String },
    /// Split a credits object into cast, cast_size, director and crew_size
    Credits { column: String },
    /// Join a list of scalars
    ScalarList { column: String },
}

impl Extraction {
    pub fn key(column: &str, key: &str) -> Self {
        Extraction::Key {
            column: column.to_string(),
            key: key.to_string(),
        }
    }

    pub fn credits(column: &str) -> Self {
        Extraction::Credits {
            column: column.to_string(),
        }
    }

    pub fn scalar_list(column: &str) -> Self {
        Extraction::ScalarList {
            column: column.to_string(),
        }
    }
}

/// Flattens nested object/list columns into scalars and `|`-joined text
pub struct ExtractStage {
    plan: Vec<Extraction>,
}

impl ExtractStage {
    pub fn new(plan: Vec<Extraction>) -> Self {
        Self { plan }
    }

    /// Extraction plan for movie detail records from the catalog API
    pub fn tmdb_default() -> Self {
        Self::new(vec![
            Extraction::key(BELONGS_TO_COLLECTION, "name"),
            Extraction::key(GENRES, "name"),
            Extraction::key(PRODUCTION_COMPANIES, "name"),
            Extraction::key(PRODUCTION_COUNTRIES, "name"),
            Extraction::key(SPOKEN_LANGUAGES, "english_name"),
            Extraction::scalar_list(ORIGIN_COUNTRY),
            Extraction::credits(CREDITS),
        ])
    }
}

impl TableStage for ExtractStage {
    fn name(&self) -> &'static str {
        "extract"
    }

    fn apply(&self, mut frame: DataFrame) -> Result<DataFrame> {
        for step in &self.plan {
            let applied = match step {
                Extraction::Key { column, key } => {
                    map_nested(&mut frame, column, |nested| key_values(nested, key))?
                }
                Extraction::ScalarList { column } => map_nested(&mut frame, column, scalar_list)?,
                Extraction::Credits { column } => {
                    extract_credits(&mut frame, column)?;
                    true
                }
            };
            if !applied {
                debug!("Skipped extraction {:?}: column not present", step);
            }
        }
        info!("Flattened nested fields, frame now has {} columns", frame.width());
        Ok(frame)
    }
}

/// Parse a raw cell as a nested JSON object or list. Plain text, scalars and
/// malformed JSON are not nested.
pub fn parse_nested(raw: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
        _ => None,
    }
}

/// Replace a column of JSON text with the flattened text `flatten` yields.
/// Returns false if the column does not exist.
fn map_nested<F>(frame: &mut DataFrame, column: &str, flatten: F) -> Result<bool>
where
    F: Fn(&Value) -> Option<String>,
{
    if frame.column(column).is_err() {
        return Ok(false);
    }
    let raw = table::texts(frame, column)?;
    let flat: StringChunked = raw
        .into_iter()
        .map(|cell| cell.and_then(parse_nested).and_then(|nested| flatten(&nested)))
        .collect();
    frame.with_column(flat.with_name(column.into()).into_series())?;
    Ok(true)
}

/// Value of `key` in an object, or the `|`-joined values of `key` across a
/// list of objects. A nested value under `key` is not a scalar and yields
/// nothing.
pub fn key_values(nested: &Value, key: &str) -> Option<String> {
    match nested {
        Value::Object(object) => object.get(key).and_then(scalar_text),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| item.as_object()?.get(key))
                .filter_map(scalar_text)
                .collect();
            Some(parts.join(DELIMITER))
        }
        _ => None,
    }
}

/// `|`-joined text of a list of scalars
pub fn scalar_list(nested: &Value) -> Option<String> {
    let items = nested.as_array()?;
    let parts: Vec<String> = items.iter().filter_map(scalar_text).collect();
    Some(parts.join(DELIMITER))
}

/// Names, director names and list sizes pulled from one credits cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreditsSummary {
    pub cast: Option<String>,
    pub cast_size: i64,
    pub director: Option<String>,
    pub crew_size: i64,
}

pub fn summarize_credits(credits: Option<&Value>) -> CreditsSummary {
    let object = credits.and_then(Value::as_object);
    let cast = object.and_then(|o| o.get("cast")).and_then(Value::as_array);
    let crew = object.and_then(|o| o.get("crew")).and_then(Value::as_array);

    let cast_names = cast.map(|members| {
        let names: Vec<String> = members
            .iter()
            .filter_map(|m| m.get("name"))
            .filter_map(scalar_text)
            .collect();
        names.join(DELIMITER)
    });
    let director_names = crew.map(|members| {
        let names: Vec<String> = members
            .iter()
            .filter(|m| m.get("job").and_then(Value::as_str) == Some(DIRECTOR_JOB))
            .filter_map(|m| m.get("name"))
            .filter_map(scalar_text)
            .collect();
        names.join(DELIMITER)
    });

    CreditsSummary {
        cast: cast_names,
        cast_size: cast.map_or(0, |c| c.len() as i64),
        director: director_names,
        crew_size: crew.map_or(0, |c| c.len() as i64),
    }
}

/// Derive cast, cast_size, director and crew_size from a credits column and
/// drop the source. Without a credits column the derived columns still
/// appear, with missing names and zero sizes.
pub fn extract_credits(frame: &mut DataFrame, column: &str) -> Result<()> {
    let summaries: Vec<CreditsSummary> = if frame.column(column).is_ok() {
        let raw = table::texts(frame, column)?;
        raw.into_iter()
            .map(|cell| summarize_credits(cell.and_then(parse_nested).as_ref()))
            .collect()
    } else {
        debug!("No {} column, credits fields default to empty", column);
        vec![CreditsSummary::default(); frame.height()]
    };

    let cast: StringChunked = summaries.iter().map(|s| s.cast.as_deref()).collect();
    let cast_size: Int64Chunked = summaries.iter().map(|s| Some(s.cast_size)).collect();
    let director: StringChunked = summaries.iter().map(|s| s.director.as_deref()).collect();
    let crew_size: Int64Chunked = summaries.iter().map(|s| Some(s.crew_size)).collect();

    frame.with_column(cast.with_name(CAST.into()).into_series())?;
    frame.with_column(cast_size.with_name(CAST_SIZE.into()).into_series())?;
    frame.with_column(director.with_name(DIRECTOR.into()).into_series())?;
    frame.with_column(crew_size.with_name(CREW_SIZE.into()).into_series())?;
    if frame.column(column).is_ok() {
        frame.drop_in_place(column)?;
    }
    Ok(())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
