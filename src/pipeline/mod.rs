// Cleaning pipeline: raw catalog records in, finalized movie table out

pub mod processing;

use std::time::Instant;

use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::{debug, error, info, info_span};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::metrics::StageMetrics;
use crate::table::frame_from_records;
use crate::types::RawRecord;

use processing::coerce::CoerceStage;
use processing::extract::ExtractStage;
use processing::finalize::{empty_movie_frame, FinalizeStage};
use processing::normalize::NormalizeStage;
use processing::prune::PruneStage;
use processing::quality_gate::QualityGate;

/// One step of the cleaning pipeline.
///
/// A stage takes ownership of the frame and hands back the transformed one;
/// returning an error aborts the whole run.
pub trait TableStage {
    fn name(&self) -> &'static str;

    fn apply(&self, frame: DataFrame) -> Result<DataFrame>;
}

/// Row and column counts around one stage execution
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StageReport {
    pub stage: &'static str,
    pub rows_in: usize,
    pub rows_out: usize,
    pub columns_out: usize,
}

/// Finalized movie frame plus what each stage did to it
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub frame: DataFrame,
    pub stages: Vec<StageReport>,
}

/// Ordered list of stages run over a single in-memory frame
pub struct Pipeline {
    stages: Vec<Box<dyn TableStage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn TableStage>>) -> Self {
        Self { stages }
    }

    /// The standard cleaning sequence: prune, extract, coerce, normalize,
    /// filter, finalize.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(vec![
            Box::new(PruneStage::new(config.drop_columns.clone())),
            Box::new(ExtractStage::tmdb_default()),
            Box::new(CoerceStage::tmdb_default()),
            Box::new(NormalizeStage::new(config.placeholder_text.clone())),
            Box::new(QualityGate::from_config(config)),
            Box::new(FinalizeStage::default()),
        ])
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn run(&self, records: &[RawRecord]) -> Result<PipelineOutput> {
        let mut frame = frame_from_records(records)?;
        info!(
            "Built frame from {} raw records: {} rows x {} columns",
            records.len(),
            frame.height(),
            frame.width()
        );
        if frame.height() == 0 {
            info!("No movie records to clean, returning an empty movie table");
            return Ok(PipelineOutput {
                frame: empty_movie_frame()?,
                stages: Vec::new(),
            });
        }

        let mut reports = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            let span = info_span!("stage", name = stage.name());
            let _enter = span.enter();

            let rows_in = frame.height();
            let started = Instant::now();
            frame = match stage.apply(frame) {
                Ok(frame) => frame,
                Err(e) => {
                    error!("Stage {} failed: {}", stage.name(), e);
                    StageMetrics::record_stage_error(stage.name());
                    return Err(e);
                }
            };
            StageMetrics::record_stage(
                stage.name(),
                rows_in,
                frame.height(),
                started.elapsed().as_secs_f64(),
            );
            debug!(
                "Stage {} done: {} -> {} rows, {} columns",
                stage.name(),
                rows_in,
                frame.height(),
                frame.width()
            );

            reports.push(StageReport {
                stage: stage.name(),
                rows_in,
                rows_out: frame.height(),
                columns_out: frame.width(),
            });
        }

        info!("Cleaning finished with {} movies", frame.height());
        Ok(PipelineOutput {
            frame,
            stages: reports,
        })
    }
}

/// Run the standard cleaning sequence and return only the finalized frame
pub fn clean_movies(records: &[RawRecord], config: &PipelineConfig) -> Result<DataFrame> {
    Pipeline::from_config(config).run(records).map(|output| output.frame)
}
