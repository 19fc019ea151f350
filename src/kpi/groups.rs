use polars::prelude::*;
use serde::Serialize;

use crate::constants::{
    BELONGS_TO_COLLECTION, BUDGET_MUSD, DELIMITER, DIRECTOR, POPULARITY, REVENUE_MUSD, ROI,
    VOTE_AVERAGE,
};
use crate::error::Result;
use crate::table;

const GROUP: &str = "group";
const MOVIES: &str = "movies";
const MEAN_REVENUE: &str = "mean_revenue_musd";
const TOTAL_REVENUE: &str = "total_revenue_musd";
const MEAN_BUDGET: &str = "mean_budget_musd";
const TOTAL_BUDGET: &str = "total_budget_musd";
const MEDIAN_ROI: &str = "median_roi";
const MEAN_POPULARITY: &str = "mean_popularity";
const MEAN_RATING: &str = "mean_rating";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MovieGroup {
    Franchise,
    Standalone,
}

impl MovieGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            MovieGroup::Franchise => "franchise",
            MovieGroup::Standalone => "standalone",
        }
    }
}

/// Franchise vs. standalone comparison row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupComparison {
    pub group: MovieGroup,
    pub movies: usize,
    pub mean_revenue_musd: Option<f64>,
    pub median_roi: Option<f64>,
    pub mean_budget_musd: Option<f64>,
    pub mean_popularity: Option<f64>,
    pub mean_rating: Option<f64>,
}

impl GroupComparison {
    fn empty(group: MovieGroup) -> Self {
        Self {
            group,
            movies: 0,
            mean_revenue_musd: None,
            median_roi: None,
            mean_budget_musd: None,
            mean_popularity: None,
            mean_rating: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FranchiseStats {
    pub franchise: String,
    pub movies: usize,
    pub total_budget_musd: f64,
    pub mean_budget_musd: Option<f64>,
    pub total_revenue_musd: f64,
    pub mean_revenue_musd: Option<f64>,
    pub mean_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectorStats {
    pub director: String,
    pub movies: usize,
    pub total_revenue_musd: f64,
    pub mean_rating: Option<f64>,
}

/// Non-null, non-empty collection name
fn in_franchise() -> Expr {
    col(BELONGS_TO_COLLECTION)
        .is_not_null()
        .and(col(BELONGS_TO_COLLECTION).cast(DataType::String).neq(lit("")))
}

/// Largest total revenue first, ties in name order
fn by_total_revenue(summary: &DataFrame, name: &str) -> Result<DataFrame> {
    let options = SortMultipleOptions::default()
        .with_order_descending_multi([true, false])
        .with_nulls_last(true)
        .with_maintain_order(true);
    Ok(summary.sort([TOTAL_REVENUE, name], options)?)
}

fn counts(summary: &DataFrame, name: &str) -> Result<Vec<usize>> {
    let series = table::require_column(summary, name)?.cast(&DataType::UInt64)?;
    Ok(series
        .u64()?
        .into_iter()
        .map(|count| count.unwrap_or(0) as usize)
        .collect())
}

/// Split a `|`-joined text column into one row per trimmed, non-empty name.
/// Other columns repeat for every name.
pub fn explode_names(frame: &DataFrame, column: &str, keep: &[&str]) -> Result<DataFrame> {
    let mut selection = vec![col(column).cast(DataType::String).str().split(lit(DELIMITER))];
    selection.extend(keep.iter().map(|name| col(*name)));

    let mut exploded = frame
        .clone()
        .lazy()
        .select(selection)
        .collect()?
        .explode([column])?;
    let names: StringChunked = table::texts(&exploded, column)?
        .into_iter()
        .map(|name| name.map(str::trim).filter(|n| !n.is_empty()))
        .collect();
    exploded.with_column(names.with_name(column.into()).into_series())?;

    Ok(exploded
        .lazy()
        .filter(col(column).is_not_null())
        .collect()?)
}

/// Compare movies that belong to a collection with those that do not.
/// Expects the `roi` column from the KPI engine. Both groups are always
/// reported, an empty one with zero movies.
pub fn franchise_vs_standalone(frame: &DataFrame) -> Result<Vec<GroupComparison>> {
    for column in [BELONGS_TO_COLLECTION, REVENUE_MUSD, BUDGET_MUSD, ROI, POPULARITY, VOTE_AVERAGE] {
        table::require_column(frame, column)?;
    }

    let summary = frame
        .clone()
        .lazy()
        .with_column(
            when(in_franchise())
                .then(lit(MovieGroup::Franchise.as_str()))
                .otherwise(lit(MovieGroup::Standalone.as_str()))
                .alias(GROUP),
        )
        .group_by_stable([col(GROUP)])
        .agg([
            col(REVENUE_MUSD).len().alias(MOVIES),
            col(REVENUE_MUSD).mean().alias(MEAN_REVENUE),
            col(ROI).median().alias(MEDIAN_ROI),
            col(BUDGET_MUSD).mean().alias(MEAN_BUDGET),
            col(POPULARITY).mean().alias(MEAN_POPULARITY),
            col(VOTE_AVERAGE).mean().alias(MEAN_RATING),
        ])
        .collect()?;

    let groups = table::texts(&summary, GROUP)?;
    let movies = counts(&summary, MOVIES)?;
    let revenue = table::floats(&summary, MEAN_REVENUE)?;
    let roi = table::floats(&summary, MEDIAN_ROI)?;
    let budget = table::floats(&summary, MEAN_BUDGET)?;
    let popularity = table::floats(&summary, MEAN_POPULARITY)?;
    let rating = table::floats(&summary, MEAN_RATING)?;

    Ok([MovieGroup::Franchise, MovieGroup::Standalone]
        .into_iter()
        .map(|group| {
            match groups.into_iter().position(|g| g == Some(group.as_str())) {
                Some(row) => GroupComparison {
                    group,
                    movies: movies[row],
                    mean_revenue_musd: revenue.get(row),
                    median_roi: roi.get(row),
                    mean_budget_musd: budget.get(row),
                    mean_popularity: popularity.get(row),
                    mean_rating: rating.get(row),
                },
                None => GroupComparison::empty(group),
            }
        })
        .collect())
}

/// Per-collection totals and means, highest total revenue first.
pub fn franchise_success(frame: &DataFrame) -> Result<Vec<FranchiseStats>> {
    for column in [BELONGS_TO_COLLECTION, REVENUE_MUSD, BUDGET_MUSD, VOTE_AVERAGE] {
        table::require_column(frame, column)?;
    }

    let summary = frame
        .clone()
        .lazy()
        .filter(in_franchise())
        .with_column(col(BELONGS_TO_COLLECTION).cast(DataType::String))
        .group_by_stable([col(BELONGS_TO_COLLECTION)])
        .agg([
            col(REVENUE_MUSD).len().alias(MOVIES),
            col(BUDGET_MUSD).sum().alias(TOTAL_BUDGET),
            col(BUDGET_MUSD).mean().alias(MEAN_BUDGET),
            col(REVENUE_MUSD).sum().alias(TOTAL_REVENUE),
            col(REVENUE_MUSD).mean().alias(MEAN_REVENUE),
            col(VOTE_AVERAGE).mean().alias(MEAN_RATING),
        ])
        .collect()?;
    let summary = by_total_revenue(&summary, BELONGS_TO_COLLECTION)?;

    let names = table::texts(&summary, BELONGS_TO_COLLECTION)?;
    let movies = counts(&summary, MOVIES)?;
    let total_budget = table::floats(&summary, TOTAL_BUDGET)?;
    let mean_budget = table::floats(&summary, MEAN_BUDGET)?;
    let total_revenue = table::floats(&summary, TOTAL_REVENUE)?;
    let mean_revenue = table::floats(&summary, MEAN_REVENUE)?;
    let rating = table::floats(&summary, MEAN_RATING)?;

    Ok((0..summary.height())
        .map(|row| FranchiseStats {
            franchise: names.get(row).unwrap_or_default().to_string(),
            movies: movies[row],
            total_budget_musd: total_budget.get(row).unwrap_or(0.0),
            mean_budget_musd: mean_budget.get(row),
            total_revenue_musd: total_revenue.get(row).unwrap_or(0.0),
            mean_revenue_musd: mean_revenue.get(row),
            mean_rating: rating.get(row),
        })
        .collect())
}

/// Per-director totals, highest total revenue first, limited to `n`.
/// A movie with several directors counts once for each of them.
pub fn director_success(frame: &DataFrame, n: usize) -> Result<Vec<DirectorStats>> {
    for column in [DIRECTOR, REVENUE_MUSD, VOTE_AVERAGE] {
        table::require_column(frame, column)?;
    }

    let credits = explode_names(frame, DIRECTOR, &[REVENUE_MUSD, VOTE_AVERAGE])?;
    let summary = credits
        .lazy()
        .group_by_stable([col(DIRECTOR)])
        .agg([
            col(REVENUE_MUSD).len().alias(MOVIES),
            col(REVENUE_MUSD).sum().alias(TOTAL_REVENUE),
            col(VOTE_AVERAGE).mean().alias(MEAN_RATING),
        ])
        .collect()?;
    let summary = by_total_revenue(&summary, DIRECTOR)?.head(Some(n));

    let names = table::texts(&summary, DIRECTOR)?;
    let movies = counts(&summary, MOVIES)?;
    let total_revenue = table::floats(&summary, TOTAL_REVENUE)?;
    let rating = table::floats(&summary, MEAN_RATING)?;

    Ok((0..summary.height())
        .map(|row| DirectorStats {
            director: names.get(row).unwrap_or_default().to_string(),
            movies: movies[row],
            total_revenue_musd: total_revenue.get(row).unwrap_or(0.0),
            mean_rating: rating.get(row),
        })
        .collect())
}
