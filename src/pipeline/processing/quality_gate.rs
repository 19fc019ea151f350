use std::collections::HashSet;

use polars::prelude::*;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::constants::{ID, STATUS, TITLE};
use crate::error::Result;
use crate::metrics::StageMetrics;
use crate::pipeline::TableStage;
use crate::table;

/// Row-level quality gate.
///
/// Rules run in a fixed order: deduplicate, require id and title, require a
/// minimum number of populated fields, keep released movies only. The field
/// count is taken while the status column is still part of the row.
#[derive(Debug, Clone)]
pub struct QualityGate {
    /// Minimum number of non-missing cells a row needs to be kept
    pub min_non_missing_fields: usize,
    /// Exact status value of a released movie
    pub release_status: String,
}

/// Rows removed by each quality rule
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GateOutcome {
    pub duplicates: usize,
    pub missing_identity: usize,
    pub sparse: usize,
    pub unreleased: usize,
}

impl QualityGate {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            min_non_missing_fields: config.min_non_missing_fields,
            release_status: config.release_status.clone(),
        }
    }

    /// Run every rule and report how many rows each removed
    pub fn filter(&self, frame: &mut DataFrame) -> Result<GateOutcome> {
        let outcome = GateOutcome {
            duplicates: drop_duplicates(frame)?,
            missing_identity: drop_missing_identity(frame)?,
            sparse: drop_sparse_rows(frame, self.min_non_missing_fields)?,
            unreleased: keep_released(frame, &self.release_status)?,
        };

        StageMetrics::record_rows_dropped("duplicate", outcome.duplicates);
        StageMetrics::record_rows_dropped("missing_identity", outcome.missing_identity);
        StageMetrics::record_rows_dropped("sparse", outcome.sparse);
        StageMetrics::record_rows_dropped("unreleased", outcome.unreleased);
        Ok(outcome)
    }
}

impl Default for QualityGate {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl TableStage for QualityGate {
    fn name(&self) -> &'static str {
        "quality_gate"
    }

    fn apply(&self, mut frame: DataFrame) -> Result<DataFrame> {
        let outcome = self.filter(&mut frame)?;
        info!(
            "Quality gate kept {} rows (dropped {} duplicates, {} without id/title, {} sparse, {} unreleased)",
            frame.height(),
            outcome.duplicates,
            outcome.missing_identity,
            outcome.sparse,
            outcome.unreleased
        );
        Ok(frame)
    }
}

/// Keep the first row per `id`, or the first copy of each identical row when
/// there is no id column. Ids are compared as coerced numbers, so `1` and
/// `1.0` are the same movie.
pub fn drop_duplicates(frame: &mut DataFrame) -> Result<usize> {
    let before = frame.height();
    *frame = if frame.column(ID).is_ok() {
        frame
            .clone()
            .lazy()
            .filter(col(ID).is_first_distinct())
            .collect()?
    } else {
        warn!("No {} column, deduplicating on full rows", ID);
        let mut seen = HashSet::new();
        let mut first = Vec::with_capacity(before);
        for row in table::to_rows(frame)? {
            first.push(seen.insert(serde_json::to_string(&row)?));
        }
        let mask: BooleanChunked = first.into_iter().collect();
        frame.filter(&mask)?
    };
    Ok(before - frame.height())
}

/// Drop rows whose id or title is null. Both columns are required.
pub fn drop_missing_identity(frame: &mut DataFrame) -> Result<usize> {
    table::require_column(frame, ID)?;
    table::require_column(frame, TITLE)?;
    let before = frame.height();
    *frame = frame
        .clone()
        .lazy()
        .filter(col(ID).is_not_null().and(col(TITLE).is_not_null()))
        .collect()?;
    Ok(before - frame.height())
}

/// Drop rows with fewer than `threshold` non-null cells.
pub fn drop_sparse_rows(frame: &mut DataFrame, threshold: usize) -> Result<usize> {
    let before = frame.height();
    let mut populated = vec![0usize; before];
    for column in frame.get_columns() {
        let present = column.as_materialized_series().is_not_null();
        for (count, is_present) in populated.iter_mut().zip(&present) {
            *count += usize::from(is_present.unwrap_or(false));
        }
    }
    let mask: BooleanChunked = populated.into_iter().map(|count| count >= threshold).collect();
    *frame = frame.filter(&mask)?;
    Ok(before - frame.height())
}

/// Keep rows whose status equals `status` exactly, then drop the status
/// column. No-op without a status column.
pub fn keep_released(frame: &mut DataFrame, status: &str) -> Result<usize> {
    if frame.column(STATUS).is_err() {
        return Ok(0);
    }
    let before = frame.height();
    *frame = frame
        .clone()
        .lazy()
        .filter(col(STATUS).cast(DataType::String).eq(lit(status)))
        .collect()?
        .drop(STATUS)?;
    Ok(before - frame.height())
}
