pub mod apis;
pub mod config;
pub mod constants;
pub mod error;
pub mod kpi;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod table;
pub mod types;

pub use config::{CatalogConfig, PipelineConfig};
pub use error::{PipelineError, Result};
pub use kpi::{KpiEngine, KpiReport, KpiView};
pub use pipeline::{clean_movies, Pipeline, PipelineOutput, TableStage};
pub use table::{fingerprint, frame_from_records, to_rows};
pub use types::{RawRecord, Row};
