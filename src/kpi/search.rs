use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{CAST, DIRECTOR, GENRES, VOTE_AVERAGE};
use crate::error::Result;
use crate::kpi::ranking::{sort_by_metric, SortDirection};
use crate::metrics::KpiMetrics;
use crate::table;

/// Multi-valued text columns that can be searched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    Genres,
    Cast,
    Director,
}

impl SearchField {
    pub fn column(self) -> &'static str {
        match self {
            SearchField::Genres => GENRES,
            SearchField::Cast => CAST,
            SearchField::Director => DIRECTOR,
        }
    }
}

/// Case-insensitive substring search, all predicates must hold.
/// Results are ordered by rating, best first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieSearch {
    predicates: Vec<(SearchField, String)>,
}

impl MovieSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: SearchField, needle: impl Into<String>) -> Self {
        self.predicates.push((field, needle.into()));
        self
    }

    pub fn genre(self, needle: impl Into<String>) -> Self {
        self.with(SearchField::Genres, needle)
    }

    pub fn cast(self, needle: impl Into<String>) -> Self {
        self.with(SearchField::Cast, needle)
    }

    pub fn director(self, needle: impl Into<String>) -> Self {
        self.with(SearchField::Director, needle)
    }

    pub fn predicates(&self) -> &[(SearchField, String)] {
        &self.predicates
    }

    /// Science fiction action movies starring Bruce Willis
    pub fn scifi_action_bruce_willis() -> Self {
        Self::new()
            .genre("Science Fiction")
            .genre("Action")
            .cast("Bruce Willis")
    }

    /// Movies starring Uma Thurman directed by Quentin Tarantino
    pub fn uma_thurman_tarantino() -> Self {
        Self::new().cast("Uma Thurman").director("Quentin Tarantino")
    }

    pub fn run(&self, frame: &DataFrame) -> Result<DataFrame> {
        let mut keep = vec![true; frame.height()];
        for (field, needle) in &self.predicates {
            let needle = needle.to_lowercase();
            let texts = table::texts(frame, field.column())?;
            for (row, text) in keep.iter_mut().zip(&texts) {
                *row &= text.is_some_and(|t| t.to_lowercase().contains(needle.as_str()));
            }
        }
        table::require_column(frame, VOTE_AVERAGE)?;

        let mask: BooleanChunked = keep.into_iter().collect();
        let found = frame.filter(&mask)?;
        debug!("Search {:?} matched {} movies", self.predicates, found.height());
        KpiMetrics::record_search(found.height());
        sort_by_metric(&found, VOTE_AVERAGE, SortDirection::Descending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::table::frame_from_records;
    use serde_json::json;

    fn movies() -> DataFrame {
        frame_from_records(&[
            json!({"title": "Armageddon", "genres": "Action|Thriller|Science Fiction", "cast": "Bruce Willis|Billy Bob Thornton", "director": "Michael Bay", "vote_average": 6.8}),
            json!({"title": "The Fifth Element", "genres": "Adventure|Fantasy|Action|Science Fiction", "cast": "Bruce Willis|Milla Jovovich", "director": "Luc Besson", "vote_average": 7.5}),
            json!({"title": "Die Hard", "genres": "Action|Thriller", "cast": "Bruce Willis", "director": "John McTiernan", "vote_average": 7.8}),
            json!({"title": "Pulp Fiction", "genres": "Thriller|Crime", "cast": "John Travolta|Uma Thurman", "director": "Quentin Tarantino", "vote_average": 8.5}),
            json!({"title": "Kill Bill: Vol. 1", "genres": "Action|Crime", "cast": "Uma Thurman|Lucy Liu", "director": "Quentin Tarantino", "vote_average": 7.9}),
            json!({"title": "Unknown", "genres": null, "cast": null, "director": null, "vote_average": null}),
        ])
        .unwrap()
    }

    fn titles(frame: &DataFrame) -> Vec<String> {
        table::texts(frame, "title")
            .unwrap()
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_scifi_action_bruce_willis_sorted_by_rating() {
        let found = MovieSearch::scifi_action_bruce_willis().run(&movies()).unwrap();
        assert_eq!(titles(&found), ["The Fifth Element", "Armageddon"]);
    }

    #[test]
    fn test_uma_thurman_tarantino() {
        let found = MovieSearch::uma_thurman_tarantino().run(&movies()).unwrap();
        assert_eq!(titles(&found), ["Pulp Fiction", "Kill Bill: Vol. 1"]);
    }

    #[test]
    fn test_case_insensitive_and_missing_never_matches() {
        let found = MovieSearch::new().cast("bruce WILLIS").run(&movies()).unwrap();
        assert_eq!(found.height(), 3);

        let found = MovieSearch::new().director("").run(&movies()).unwrap();
        assert_eq!(found.height(), 5);
    }

    #[test]
    fn test_missing_search_column_is_error() {
        let frame = frame_from_records(&[json!({"title": "A", "vote_average": 5.0})]).unwrap();
        let err = MovieSearch::new().genre("Drama").run(&frame).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(ref c) if c == "genres"));
    }
}
