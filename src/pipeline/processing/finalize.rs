use polars::prelude::*;
use tracing::info;

use crate::constants::{
    BUDGET_MUSD, CANONICAL_COLUMNS, CAST_SIZE, CREW_SIZE, ID, POPULARITY, RELEASE_DATE,
    REVENUE_MUSD, RUNTIME, VOTE_AVERAGE, VOTE_COUNT,
};
use crate::error::Result;
use crate::pipeline::TableStage;
use crate::table::column_names;

/// Puts columns in the canonical movie order. Columns outside that order
/// keep their relative position after it.
pub struct FinalizeStage {
    order: Vec<&'static str>,
}

impl FinalizeStage {
    pub fn new(order: Vec<&'static str>) -> Self {
        Self { order }
    }
}

impl Default for FinalizeStage {
    fn default() -> Self {
        Self::new(CANONICAL_COLUMNS.to_vec())
    }
}

impl TableStage for FinalizeStage {
    fn name(&self) -> &'static str {
        "finalize"
    }

    fn apply(&self, frame: DataFrame) -> Result<DataFrame> {
        let frame = reorder_columns(&frame, &self.order)?;
        info!(
            "Finalized frame: {} rows, columns {:?}",
            frame.height(),
            column_names(&frame)
        );
        Ok(frame)
    }
}

pub fn reorder_columns(frame: &DataFrame, order: &[&str]) -> Result<DataFrame> {
    let present = column_names(frame);
    let mut names: Vec<String> = Vec::with_capacity(present.len());
    for name in order {
        if present.iter().any(|p| p == name) && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    for name in present {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    Ok(frame.select(names)?)
}

/// Zero-row movie frame with the canonical columns and their cleaned types
pub fn empty_movie_frame() -> Result<DataFrame> {
    let columns = CANONICAL_COLUMNS
        .iter()
        .map(|name| Series::new_empty((*name).into(), &canonical_dtype(name)).into_column())
        .collect();
    Ok(DataFrame::new(columns)?)
}

fn canonical_dtype(name: &str) -> DataType {
    match name {
        ID | VOTE_COUNT | CAST_SIZE | CREW_SIZE => DataType::Int64,
        BUDGET_MUSD | REVENUE_MUSD | POPULARITY | RUNTIME | VOTE_AVERAGE => DataType::Float64,
        RELEASE_DATE => DataType::Date,
        _ => DataType::String,
    }
}
