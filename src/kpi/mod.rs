//! KPI engine over the cleaned movie frame.
//!
//! Derived metrics (`profit`, `roi`) are added to a copy of the frame, then
//! every ranked view, grouped comparison, preset search and chart series is
//! computed from that copy. The cleaned frame itself is never modified.

pub mod groups;
pub mod ranking;
pub mod search;
pub mod series;

use std::collections::BTreeMap;
use std::time::Instant;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::constants::{
    BUDGET_MUSD, POPULARITY, PROFIT, REVENUE_MUSD, ROI, VOTE_AVERAGE, VOTE_COUNT,
};
use crate::error::Result;
use crate::metrics::KpiMetrics;
use crate::table::{self, to_rows};
use crate::types::Row;

use groups::{DirectorStats, FranchiseStats, GroupComparison};
use ranking::{rank, SortDirection};
use search::MovieSearch;
use series::ChartSeries;

pub fn profit(revenue_musd: Option<f64>, budget_musd: Option<f64>) -> Option<f64> {
    Some(revenue_musd? - budget_musd?)
}

/// Revenue over budget, only for budgets of at least `min_budget_musd`.
pub fn roi(revenue_musd: Option<f64>, budget_musd: Option<f64>, min_budget_musd: f64) -> Option<f64> {
    let budget = budget_musd.filter(|b| *b >= min_budget_musd && *b != 0.0)?;
    Some(revenue_musd? / budget)
}

/// Copy of `frame` with `profit` and `roi` columns appended (or replaced).
pub fn with_derived_metrics(frame: &DataFrame, roi_min_budget_musd: f64) -> Result<DataFrame> {
    let revenue = table::floats(frame, REVENUE_MUSD)?;
    let budget = table::floats(frame, BUDGET_MUSD)?;

    let rois: Float64Chunked = revenue
        .into_iter()
        .zip(budget.into_iter())
        .map(|(rev, bud)| roi(rev, bud, roi_min_budget_musd))
        .collect();

    let mut derived = frame
        .clone()
        .lazy()
        .with_column(
            (col(REVENUE_MUSD).cast(DataType::Float64) - col(BUDGET_MUSD).cast(DataType::Float64))
                .alias(PROFIT),
        )
        .collect()?;
    derived.with_column(rois.with_name(ROI.into()).into_series())?;
    Ok(derived)
}

/// The standard ranked views of the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiView {
    HighestRevenue,
    LowestRevenue,
    HighestBudget,
    LowestBudget,
    HighestProfit,
    LowestProfit,
    HighestRoi,
    LowestRoi,
    MostVoted,
    HighestRated,
    LowestRated,
    MostPopular,
}

impl KpiView {
    pub fn all() -> [KpiView; 12] {
        [
            KpiView::HighestRevenue,
            KpiView::LowestRevenue,
            KpiView::HighestBudget,
            KpiView::LowestBudget,
            KpiView::HighestProfit,
            KpiView::LowestProfit,
            KpiView::HighestRoi,
            KpiView::LowestRoi,
            KpiView::MostVoted,
            KpiView::HighestRated,
            KpiView::LowestRated,
            KpiView::MostPopular,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KpiView::HighestRevenue => "highest_revenue",
            KpiView::LowestRevenue => "lowest_revenue",
            KpiView::HighestBudget => "highest_budget",
            KpiView::LowestBudget => "lowest_budget",
            KpiView::HighestProfit => "highest_profit",
            KpiView::LowestProfit => "lowest_profit",
            KpiView::HighestRoi => "highest_roi",
            KpiView::LowestRoi => "lowest_roi",
            KpiView::MostVoted => "most_voted",
            KpiView::HighestRated => "highest_rated",
            KpiView::LowestRated => "lowest_rated",
            KpiView::MostPopular => "most_popular",
        }
    }

    pub fn metric(self) -> &'static str {
        match self {
            KpiView::HighestRevenue | KpiView::LowestRevenue => REVENUE_MUSD,
            KpiView::HighestBudget | KpiView::LowestBudget => BUDGET_MUSD,
            KpiView::HighestProfit | KpiView::LowestProfit => PROFIT,
            KpiView::HighestRoi | KpiView::LowestRoi => ROI,
            KpiView::MostVoted => VOTE_COUNT,
            KpiView::HighestRated | KpiView::LowestRated => VOTE_AVERAGE,
            KpiView::MostPopular => POPULARITY,
        }
    }

    pub fn direction(self) -> SortDirection {
        match self {
            KpiView::LowestRevenue
            | KpiView::LowestBudget
            | KpiView::LowestProfit
            | KpiView::LowestRoi
            | KpiView::LowestRated => SortDirection::Ascending,
            _ => SortDirection::Descending,
        }
    }

    /// Rows eligible for this view before ranking
    pub fn filter(self, frame: &DataFrame, rating_min_votes: f64) -> Result<DataFrame> {
        let eligible = match self {
            KpiView::HighestRoi | KpiView::LowestRoi => {
                table::require_column(frame, ROI)?;
                col(ROI).is_not_null()
            }
            KpiView::HighestRated | KpiView::LowestRated => {
                table::require_column(frame, VOTE_COUNT)?;
                col(VOTE_COUNT)
                    .cast(DataType::Float64)
                    .gt_eq(lit(rating_min_votes))
            }
            _ => return Ok(frame.clone()),
        };
        Ok(frame.clone().lazy().filter(eligible).collect()?)
    }
}

/// Everything the report command writes out
#[derive(Debug, Clone, Serialize)]
pub struct KpiReport {
    pub movies: usize,
    pub views: BTreeMap<KpiView, Vec<Row>>,
    pub franchise_vs_standalone: Vec<GroupComparison>,
    pub franchise_success: Vec<FranchiseStats>,
    pub director_success: Vec<DirectorStats>,
    pub searches: BTreeMap<String, Vec<Row>>,
    pub charts: ChartSeries,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KpiEngine {
    pub roi_min_budget_musd: f64,
    pub rating_min_votes: f64,
    pub top_n: usize,
}

impl Default for KpiEngine {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl KpiEngine {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            roi_min_budget_musd: config.roi_min_budget_musd,
            rating_min_votes: config.rating_min_votes,
            top_n: config.top_n,
        }
    }

    pub fn derive_metrics(&self, frame: &DataFrame) -> Result<DataFrame> {
        with_derived_metrics(frame, self.roi_min_budget_musd)
    }

    /// Top `top_n` rows of one view. Expects the derived columns.
    pub fn view(&self, frame: &DataFrame, view: KpiView) -> Result<DataFrame> {
        let eligible = view.filter(frame, self.rating_min_votes)?;
        rank(&eligible, view.metric(), view.direction(), self.top_n)
    }

    pub fn standard_views(&self, frame: &DataFrame) -> Result<BTreeMap<KpiView, DataFrame>> {
        let mut views = BTreeMap::new();
        for view in KpiView::all() {
            let ranked = self.view(frame, view)?;
            debug!("View {} holds {} movies", view.as_str(), ranked.height());
            views.insert(view, ranked);
        }
        Ok(views)
    }

    pub fn franchise_vs_standalone(&self, frame: &DataFrame) -> Result<Vec<GroupComparison>> {
        groups::franchise_vs_standalone(frame)
    }

    pub fn franchise_success(&self, frame: &DataFrame) -> Result<Vec<FranchiseStats>> {
        groups::franchise_success(frame)
    }

    pub fn director_success(&self, frame: &DataFrame) -> Result<Vec<DirectorStats>> {
        groups::director_success(frame, self.top_n)
    }

    /// Full report from a cleaned frame
    pub fn report(&self, cleaned: &DataFrame) -> Result<KpiReport> {
        let started = Instant::now();
        let frame = self.derive_metrics(cleaned)?;

        let mut views = BTreeMap::new();
        for (view, ranked) in self.standard_views(&frame)? {
            views.insert(view, to_rows(&ranked)?);
        }

        let mut searches = BTreeMap::new();
        for (name, search) in [
            ("scifi_action_bruce_willis", MovieSearch::scifi_action_bruce_willis()),
            ("uma_thurman_tarantino", MovieSearch::uma_thurman_tarantino()),
        ] {
            searches.insert(name.to_string(), to_rows(&search.run(&frame)?)?);
        }

        let report = KpiReport {
            movies: frame.height(),
            franchise_vs_standalone: self.franchise_vs_standalone(&frame)?,
            franchise_success: self.franchise_success(&frame)?,
            director_success: self.director_success(&frame)?,
            charts: series::chart_series(&frame, self.top_n)?,
            views,
            searches,
        };

        KpiMetrics::record_report(
            report.views.len(),
            report.movies,
            started.elapsed().as_secs_f64(),
        );
        info!(
            "KPI report built for {} movies ({} views)",
            report.movies,
            report.views.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::frame_from_records;
    use serde_json::json;

    fn movies() -> DataFrame {
        frame_from_records(&[
            json!({"id": 1, "title": "Blockbuster", "budget_musd": 200.0, "revenue_musd": 1000.0, "vote_count": 5000, "vote_average": 7.5, "popularity": 90.0}),
            json!({"id": 2, "title": "Indie", "budget_musd": 2.0, "revenue_musd": 40.0, "vote_count": 3, "vote_average": 9.5, "popularity": 4.0}),
            json!({"id": 3, "title": "Flop", "budget_musd": 100.0, "revenue_musd": 20.0, "vote_count": 800, "vote_average": 4.0, "popularity": 12.0}),
            json!({"id": 4, "title": "Unknown Budget", "budget_musd": null, "revenue_musd": 300.0, "vote_count": 50, "vote_average": 6.0, "popularity": 30.0}),
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
    fn test_profit_and_roi() {
        assert_eq!(profit(Some(20.0), Some(5.0)), Some(15.0));
        assert_eq!(profit(None, Some(5.0)), None);
        assert_eq!(roi(Some(50.0), Some(10.0), 10.0), Some(5.0));
        assert_eq!(roi(Some(50.0), Some(9.99), 10.0), None);
        assert_eq!(roi(Some(20.0), Some(0.0), 10.0), None);
        assert_eq!(roi(Some(20.0), Some(0.0), 0.0), None);
    }

    #[test]
    fn test_zero_budget_has_profit_but_no_roi() {
        let frame = frame_from_records(&[json!({"budget_musd": 0.0, "revenue_musd": 20.0})]).unwrap();
        let derived = with_derived_metrics(&frame, 10.0).unwrap();
        assert_eq!(table::floats(&derived, "profit").unwrap().get(0), Some(20.0));
        assert_eq!(table::floats(&derived, "roi").unwrap().get(0), None);
    }

    #[test]
    fn test_derived_metrics_leave_input_untouched() {
        let frame = movies();
        let derived = with_derived_metrics(&frame, 10.0).unwrap();
        assert_eq!(derived.width(), frame.width() + 2);
        assert!(frame.column("profit").is_err());
        assert_eq!(table::floats(&derived, "profit").unwrap().get(3), None);
    }

    #[test]
    fn test_roi_views_skip_small_budgets() {
        let engine = KpiEngine::default();
        let frame = engine.derive_metrics(&movies()).unwrap();

        let best = engine.view(&frame, KpiView::HighestRoi).unwrap();
        assert_eq!(titles(&best), ["Blockbuster", "Flop"]);
        let worst = engine.view(&frame, KpiView::LowestRoi).unwrap();
        assert_eq!(titles(&worst), ["Flop", "Blockbuster"]);
    }

    #[test]
    fn test_rated_views_require_votes() {
        let engine = KpiEngine::default();
        let frame = engine.derive_metrics(&movies()).unwrap();

        let best = engine.view(&frame, KpiView::HighestRated).unwrap();
        assert_eq!(titles(&best), ["Blockbuster", "Unknown Budget", "Flop"]);
        let worst = engine.view(&frame, KpiView::LowestRated).unwrap();
        assert_eq!(titles(&worst), ["Flop", "Unknown Budget", "Blockbuster"]);
    }

    #[test]
    fn test_profit_view_puts_missing_last() {
        let engine = KpiEngine::default();
        let frame = engine.derive_metrics(&movies()).unwrap();

        let lowest = engine.view(&frame, KpiView::LowestProfit).unwrap();
        assert_eq!(titles(&lowest), ["Flop", "Indie", "Blockbuster", "Unknown Budget"]);
    }

    #[test]
    fn test_top_n_limits_every_view() {
        let engine = KpiEngine {
            top_n: 1,
            ..KpiEngine::default()
        };
        let frame = engine.derive_metrics(&movies()).unwrap();
        let views = engine.standard_views(&frame).unwrap();

        assert_eq!(views.len(), 12);
        assert!(views.values().all(|view| view.height() == 1));
        assert_eq!(titles(&views[&KpiView::MostPopular]), ["Blockbuster"]);
        assert_eq!(titles(&views[&KpiView::MostVoted]), ["Blockbuster"]);
    }

    #[test]
    fn test_view_names_match_serde() {
        for view in KpiView::all() {
            assert_eq!(
                serde_json::to_value(view).unwrap(),
                json!(view.as_str())
            );
        }
    }
}
