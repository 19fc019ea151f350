use polars::prelude::*;
use tracing::info;

use crate::constants::{
    BUDGET, BUDGET_MUSD, DOLLARS_PER_MILLION, OVERVIEW, REVENUE, REVENUE_MUSD, RUNTIME, TAGLINE,
    VOTE_AVERAGE, VOTE_COUNT,
};
use crate::error::Result;
use crate::metrics::StageMetrics;
use crate::pipeline::TableStage;
use crate::table;

/// Replaces placeholder values with nulls and rescales currency.
///
/// Rules run in a fixed order: zero costs and runtimes, currency to millions,
/// placeholder text, ratings without votes. The zero check sees the raw dollar
/// values, before scaling.
pub struct NormalizeStage {
    placeholders: Vec<String>,
}

impl NormalizeStage {
    pub fn new(placeholders: Vec<String>) -> Self {
        Self {
            placeholders: placeholders.iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    fn is_placeholder(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.placeholders.iter().any(|p| *p == text)
    }

    /// Null out placeholder text in one column. Returns the cells masked.
    fn mask_placeholders(&self, frame: &mut DataFrame, column: &str) -> Result<usize> {
        if frame.column(column).is_err() {
            return Ok(0);
        }
        let texts = table::texts(frame, column)?;
        let mut masked = 0;
        let cleaned: StringChunked = texts
            .into_iter()
            .map(|text| match text {
                Some(t) if self.is_placeholder(t) => {
                    masked += 1;
                    None
                }
                other => other,
            })
            .collect();
        frame.with_column(cleaned.with_name(column.into()).into_series())?;
        Ok(masked)
    }
}

impl TableStage for NormalizeStage {
    fn name(&self) -> &'static str {
        "normalize"
    }

    fn apply(&self, mut frame: DataFrame) -> Result<DataFrame> {
        let zeros = zero_to_missing(&mut frame, &[BUDGET, REVENUE, RUNTIME])?;
        StageMetrics::record_cells_masked("zero_value", zeros);

        let mut frame = scale_to_millions(&frame, BUDGET, BUDGET_MUSD)?;
        frame = scale_to_millions(&frame, REVENUE, REVENUE_MUSD)?;

        let mut placeholders = 0;
        for column in [TAGLINE, OVERVIEW] {
            placeholders += self.mask_placeholders(&mut frame, column)?;
        }
        StageMetrics::record_cells_masked("placeholder_text", placeholders);

        let unrated = clear_unvoted_ratings(&mut frame)?;
        StageMetrics::record_cells_masked("rating_without_votes", unrated);

        info!(
            "Normalized placeholders: {} zero values, {} placeholder texts, {} ratings without votes",
            zeros, placeholders, unrated
        );
        Ok(frame)
    }
}

/// Numeric zero becomes null in each listed column that exists. Returns the
/// cells masked.
pub fn zero_to_missing(frame: &mut DataFrame, columns: &[&str]) -> Result<usize> {
    let mut masked = 0;
    for column in columns {
        if frame.column(column).is_err() {
            continue;
        }
        let values = table::floats(frame, column)?;
        let zeros = values.into_iter().filter(|v| *v == Some(0.0)).count();
        if zeros == 0 {
            continue;
        }
        let cleaned: Float64Chunked = values
            .into_iter()
            .map(|v| v.filter(|x| *x != 0.0))
            .collect();
        frame.with_column(cleaned.with_name((*column).into()).into_series())?;
        masked += zeros;
    }
    Ok(masked)
}

/// Divide `source` by one million into `target` and drop `source`.
/// Values that are not numbers become null.
pub fn scale_to_millions(frame: &DataFrame, source: &str, target: &str) -> Result<DataFrame> {
    table::require_column(frame, source)?;
    let scaled = frame
        .clone()
        .lazy()
        .with_column((col(source).cast(DataType::Float64) / lit(DOLLARS_PER_MILLION)).alias(target))
        .collect()?;
    Ok(scaled.drop(source)?)
}

/// A rating with zero or unknown votes is not meaningful. No-op unless both
/// vote columns exist.
pub fn clear_unvoted_ratings(frame: &mut DataFrame) -> Result<usize> {
    if frame.column(VOTE_AVERAGE).is_err() || frame.column(VOTE_COUNT).is_err() {
        return Ok(0);
    }
    let votes = table::floats(frame, VOTE_COUNT)?;
    let ratings = table::floats(frame, VOTE_AVERAGE)?;

    let mut masked = 0;
    let cleaned: Float64Chunked = votes
        .into_iter()
        .zip(ratings.into_iter())
        .map(|(votes, rating)| {
            if votes.map_or(true, |v| v == 0.0) {
                masked += usize::from(rating.is_some());
                None
            } else {
                rating
            }
        })
        .collect();
    frame.with_column(cleaned.with_name(VOTE_AVERAGE.into()).into_series())?;
    Ok(masked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_PLACEHOLDER_TEXT;
    use crate::error::PipelineError;
    use crate::table::{frame_from_records, texts};
    use serde_json::json;

    fn stage() -> NormalizeStage {
        NormalizeStage::new(DEFAULT_PLACEHOLDER_TEXT.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_zero_budget_missing_and_revenue_scaled() {
        let frame = frame_from_records(&[json!({"budget": 0, "revenue": 20000000, "runtime": 0})]).unwrap();
        let frame = stage().apply(frame).unwrap();

        assert!(frame.column("budget").is_err());
        assert!(frame.column("revenue").is_err());
        assert_eq!(table::floats(&frame, "budget_musd").unwrap().get(0), None);
        assert_eq!(table::floats(&frame, "revenue_musd").unwrap().get(0), Some(20.0));
        assert_eq!(table::floats(&frame, "runtime").unwrap().get(0), None);
    }

    #[test]
    fn test_zero_to_missing_counts_cells() {
        let mut frame = frame_from_records(&[
            json!({"budget": 0, "runtime": 0}),
            json!({"budget": 5, "runtime": 90}),
        ])
        .unwrap();
        assert_eq!(zero_to_missing(&mut frame, &["budget", "runtime", "revenue"]).unwrap(), 2);
        assert_eq!(table::floats(&frame, "budget").unwrap().get(1), Some(5.0));
    }

    #[test]
    fn test_placeholder_text_case_insensitive() {
        let frame = frame_from_records(&[
            json!({"budget": 1, "revenue": 1, "tagline": "no tagline", "overview": "NO DATA"}),
            json!({"budget": 1, "revenue": 1, "tagline": "", "overview": "A hacker learns the truth."}),
            json!({"budget": 1, "revenue": 1, "tagline": "No Tagline here", "overview": null}),
        ])
        .unwrap();
        let frame = stage().apply(frame).unwrap();

        let taglines = texts(&frame, "tagline").unwrap();
        let overviews = texts(&frame, "overview").unwrap();
        assert_eq!(taglines.get(0), None);
        assert_eq!(overviews.get(0), None);
        assert_eq!(taglines.get(1), None);
        assert_eq!(overviews.get(1), Some("A hacker learns the truth."));
        assert_eq!(taglines.get(2), Some("No Tagline here"));
    }

    #[test]
    fn test_rating_cleared_without_votes() {
        let frame = frame_from_records(&[
            json!({"budget": 1, "revenue": 1, "vote_count": 0, "vote_average": 6.0}),
            json!({"budget": 1, "revenue": 1, "vote_count": null, "vote_average": 5.0}),
            json!({"budget": 1, "revenue": 1, "vote_count": 12, "vote_average": 7.1}),
        ])
        .unwrap();
        let frame = stage().apply(frame).unwrap();

        let ratings = table::floats(&frame, "vote_average").unwrap();
        assert_eq!(ratings.get(0), None);
        assert_eq!(ratings.get(1), None);
        assert_eq!(ratings.get(2), Some(7.1));
    }

    #[test]
    fn test_budget_column_required() {
        let frame = frame_from_records(&[json!({"revenue": 1})]).unwrap();
        let err = stage().apply(frame).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(ref c) if c == "budget"));
    }
}
