use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// Stable sort of the whole frame by a numeric column. Null or non-numeric
/// values go last in both directions.
pub fn sort_by_metric(frame: &DataFrame, metric: &str, direction: SortDirection) -> Result<DataFrame> {
    table::require_column(frame, metric)?;
    let options = SortMultipleOptions::default()
        .with_order_descending(direction == SortDirection::Descending)
        .with_nulls_last(true)
        .with_maintain_order(true);
    Ok(frame
        .clone()
        .lazy()
        .sort_by_exprs([col(metric).cast(DataType::Float64)], options)
        .collect()?)
}

/// The first `n` rows of [`sort_by_metric`]
pub fn rank(frame: &DataFrame, metric: &str, direction: SortDirection, n: usize) -> Result<DataFrame> {
    Ok(sort_by_metric(frame, metric, direction)?.head(Some(n)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::frame_from_records;
    use serde_json::json;

    fn movies() -> DataFrame {
        frame_from_records(&[
            json!({"title": "A", "revenue_musd": 10.0}),
            json!({"title": "B", "revenue_musd": null}),
            json!({"title": "C", "revenue_musd": 30.0}),
            json!({"title": "D", "revenue_musd": 10.0}),
            json!({"title": "E", "revenue_musd": 20.0}),
        ])
        .unwrap()
    }

    fn titles(frame: &DataFrame) -> Vec<String> {
        table::texts(frame, "title")
            .unwrap()
            .into_iter()
            .map(|t| t.unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_descending_with_stable_ties_and_missing_last() {
        let sorted = sort_by_metric(&movies(), "revenue_musd", SortDirection::Descending).unwrap();
        assert_eq!(titles(&sorted), ["C", "E", "A", "D", "B"]);
    }

    #[test]
    fn test_ascending_keeps_missing_last() {
        let sorted = sort_by_metric(&movies(), "revenue_musd", SortDirection::Ascending).unwrap();
        assert_eq!(titles(&sorted), ["A", "D", "E", "C", "B"]);
    }

    #[test]
    fn test_non_numeric_values_sort_last() {
        let frame = frame_from_records(&[
            json!({"title": "A", "score": "n/a"}),
            json!({"title": "B", "score": 2}),
            json!({"title": "C", "score": "7"}),
        ])
        .unwrap();
        let sorted = sort_by_metric(&frame, "score", SortDirection::Descending).unwrap();
        assert_eq!(titles(&sorted), ["C", "B", "A"]);
    }

    #[test]
    fn test_rank_is_prefix_of_full_sort() {
        let frame = movies();
        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            let full = sort_by_metric(&frame, "revenue_musd", direction).unwrap();
            for n in 0..=6 {
                let top = rank(&frame, "revenue_musd", direction, n).unwrap();
                assert_eq!(top.height(), n.min(full.height()));
                assert!(top.equals_missing(&full.head(Some(n))));
            }
        }
    }

    #[test]
    fn test_rank_keeps_every_column() {
        let top = rank(&movies(), "revenue_musd", SortDirection::Descending, 2).unwrap();
        assert_eq!(table::column_names(&top), ["title", "revenue_musd"]);
        assert_eq!(table::floats(&top, "revenue_musd").unwrap().get(1), Some(20.0));
    }

    #[test]
    fn test_unknown_metric_is_error() {
        assert!(sort_by_metric(&movies(), "profit", SortDirection::Descending).is_err());
    }
}
