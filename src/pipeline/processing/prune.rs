use polars::prelude::DataFrame;
use tracing::debug;

use crate::error::Result;
use crate::pipeline::TableStage;

/// Drops columns with no analytical value. Absent names are ignored.
pub struct PruneStage {
    columns: Vec<String>,
}

impl PruneStage {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }
}

impl TableStage for PruneStage {
    fn name(&self) -> &'static str {
        "prune"
    }

    fn apply(&self, mut frame: DataFrame) -> Result<DataFrame> {
        for column in &self.columns {
            if frame.column(column).is_ok() {
                frame.drop_in_place(column)?;
                debug!("Dropped column {}", column);
            }
        }
        Ok(frame)
    }
}
