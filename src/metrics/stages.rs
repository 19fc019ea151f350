//! Cleaning stage metrics

use crate::metrics::phase_metric;

/// Metrics for the table stages of the cleaning pipeline
pub struct StageMetrics;

impl StageMetrics {
    /// Record one stage execution
    pub fn record_stage(stage: &'static str, rows_in: usize, rows_out: usize, duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "stage", "runs"), "stage" => stage).increment(1);
        ::metrics::counter!(phase_metric!(counter, "stage", "rows_in"), "stage" => stage)
            .increment(rows_in as u64);
        ::metrics::counter!(phase_metric!(counter, "stage", "rows_out"), "stage" => stage)
            .increment(rows_out as u64);
        ::metrics::histogram!(phase_metric!(histogram, "stage", "duration_seconds"), "stage" => stage)
            .record(duration_secs);
    }

    /// Record rows removed by a filter rule
    pub fn record_rows_dropped(rule: &'static str, count: usize) {
        ::metrics::counter!(phase_metric!(counter, "stage", "rows_dropped"), "rule" => rule)
            .increment(count as u64);
    }

    /// Record cells reset to missing by a normalization rule
    pub fn record_cells_masked(rule: &'static str, count: usize) {
        ::metrics::counter!(phase_metric!(counter, "stage", "cells_masked"), "rule" => rule)
            .increment(count as u64);
    }

    /// Record a stage that aborted the run
    pub fn record_stage_error(stage: &'static str) {
        ::metrics::counter!(phase_metric!(counter, "stage", "errors"), "stage" => stage).increment(1);
    }
}
