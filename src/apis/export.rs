use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::info;

use crate::apis::MovieSource;
use crate::error::{PipelineError, Result};
use crate::types::RawRecord;

/// Read raw records from a JSON file holding either an array of records or a
/// listing page with a `results` array.
pub fn load_records(path: &Path) -> Result<Vec<RawRecord>> {
    let content = fs::read_to_string(path)?;
    let records = match serde_json::from_str::<Value>(&content)? {
        Value::Array(records) => records,
        Value::Object(mut page) => match page.remove("results") {
            Some(Value::Array(records)) => records,
            _ => {
                return Err(PipelineError::InvalidInput(format!(
                    "{} is an object without a results array",
                    path.display()
                )))
            }
        },
        _ => {
            return Err(PipelineError::InvalidInput(format!(
                "{} must contain a JSON array of movie records",
                path.display()
            )))
        }
    };
    info!("Loaded {} raw records from {}", records.len(), path.display());
    Ok(records)
}

/// A previously saved catalog export
pub struct ExportFile {
    path: PathBuf,
}

impl ExportFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MovieSource for ExportFile {
    fn source_name(&self) -> &'static str {
        "export_file"
    }

    fn fetch_records(&self) -> Result<Vec<RawRecord>> {
        load_records(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    #[test]
    fn test_array_and_listing_page() {
        let file = file_with(r#"[{"id": 1}, {"id": 2}]"#);
        assert_eq!(load_records(file.path()).unwrap().len(), 2);

        let file = file_with(r#"{"page": 1, "results": [{"id": 3}]}"#);
        let source = ExportFile::new(file.path());
        assert_eq!(source.fetch_records().unwrap()[0]["id"], 3);
    }

    #[test]
    fn test_wrong_shapes_are_rejected() {
        let file = file_with(r#"{"id": 1}"#);
        assert!(matches!(
            load_records(file.path()),
            Err(PipelineError::InvalidInput(_))
        ));

        let file = file_with("42");
        assert!(matches!(
            load_records(file.path()),
            Err(PipelineError::InvalidInput(_))
        ));

        let file = file_with("not json");
        assert!(matches!(load_records(file.path()), Err(PipelineError::Json(_))));
    }
}
