//! Plot-ready series for the reporting layer. Nothing here renders; each
//! function returns the numbers a chart would be drawn from.

use polars::prelude::*;
use serde::Serialize;

use crate::constants::{
    BUDGET_MUSD, GENRES, POPULARITY, RELEASE_DATE, REVENUE_MUSD, ROI, TITLE, VOTE_AVERAGE,
};
use crate::error::Result;
use crate::kpi::groups::explode_names;
use crate::kpi::ranking::{rank, SortDirection};
use crate::table;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub title: Option<String>,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreRoi {
    pub genre: String,
    pub movies: usize,
    pub mean_roi: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearRevenue {
    pub year: i32,
    pub movies: usize,
    pub total_revenue_musd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopularMovie {
    pub title: Option<String>,
    pub vote_average: Option<f64>,
    pub popularity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub revenue_vs_budget: Vec<ScatterPoint>,
    pub roi_by_genre: Vec<GenreRoi>,
    pub popularity_vs_rating: Vec<ScatterPoint>,
    pub yearly_box_office: Vec<YearRevenue>,
    pub top_popular: Vec<PopularMovie>,
}

/// Build every series from a frame that already carries the `roi` column.
pub fn chart_series(frame: &DataFrame, top_n: usize) -> Result<ChartSeries> {
    Ok(ChartSeries {
        revenue_vs_budget: revenue_vs_budget(frame)?,
        roi_by_genre: roi_by_genre(frame)?,
        popularity_vs_rating: popularity_vs_rating(frame)?,
        yearly_box_office: yearly_box_office(frame)?,
        top_popular: top_by_popularity(frame, top_n)?,
    })
}

fn scatter(frame: &DataFrame, x: &str, y: &str) -> Result<Vec<ScatterPoint>> {
    let titles = table::texts(frame, TITLE)?;
    let xs = table::floats(frame, x)?;
    let ys = table::floats(frame, y)?;
    Ok(titles
        .into_iter()
        .zip(xs.into_iter())
        .zip(ys.into_iter())
        .filter_map(|((title, x), y)| {
            Some(ScatterPoint {
                title: title.map(str::to_string),
                x: x?,
                y: y?,
            })
        })
        .collect())
}

/// Budget on x, revenue on y; movies missing either are left out.
pub fn revenue_vs_budget(frame: &DataFrame) -> Result<Vec<ScatterPoint>> {
    scatter(frame, BUDGET_MUSD, REVENUE_MUSD)
}

/// Rating on x, popularity on y.
pub fn popularity_vs_rating(frame: &DataFrame) -> Result<Vec<ScatterPoint>> {
    scatter(frame, VOTE_AVERAGE, POPULARITY)
}

/// Mean ROI per individual genre, lowest first. Genres without any ROI value
/// are omitted.
pub fn roi_by_genre(frame: &DataFrame) -> Result<Vec<GenreRoi>> {
    table::require_column(frame, ROI)?;
    let with_roi = frame
        .clone()
        .lazy()
        .filter(col(ROI).is_not_null())
        .collect()?;

    let summary = explode_names(&with_roi, GENRES, &[ROI])?
        .lazy()
        .group_by_stable([col(GENRES)])
        .agg([
            col(ROI).len().alias("movies"),
            col(ROI).mean().alias("mean_roi"),
        ])
        .collect()?
        .sort(
            ["mean_roi", GENRES],
            SortMultipleOptions::default().with_maintain_order(true),
        )?;

    let genres = table::texts(&summary, GENRES)?;
    let movies = table::floats(&summary, "movies")?;
    let means = table::floats(&summary, "mean_roi")?;
    Ok((0..summary.height())
        .filter_map(|row| {
            Some(GenreRoi {
                genre: genres.get(row)?.to_string(),
                movies: movies.get(row)? as usize,
                mean_roi: means.get(row)?,
            })
        })
        .collect())
}

/// Total revenue per release year, oldest first. Expects a `Date` column.
pub fn yearly_box_office(frame: &DataFrame) -> Result<Vec<YearRevenue>> {
    table::require_column(frame, RELEASE_DATE)?;
    table::require_column(frame, REVENUE_MUSD)?;

    let summary = frame
        .clone()
        .lazy()
        .filter(col(RELEASE_DATE).is_not_null())
        .group_by_stable([col(RELEASE_DATE).dt().year().alias("year")])
        .agg([
            col(REVENUE_MUSD).len().alias("movies"),
            col(REVENUE_MUSD).sum().alias("total_revenue_musd"),
        ])
        .collect()?
        .sort(["year"], SortMultipleOptions::default())?;

    let years = table::floats(&summary, "year")?;
    let movies = table::floats(&summary, "movies")?;
    let totals = table::floats(&summary, "total_revenue_musd")?;
    Ok((0..summary.height())
        .filter_map(|row| {
            Some(YearRevenue {
                year: years.get(row)? as i32,
                movies: movies.get(row)? as usize,
                total_revenue_musd: totals.get(row).unwrap_or(0.0),
            })
        })
        .collect())
}

pub fn top_by_popularity(frame: &DataFrame, n: usize) -> Result<Vec<PopularMovie>> {
    let top = rank(frame, POPULARITY, SortDirection::Descending, n)?;
    let titles = table::texts(&top, TITLE)?;
    let ratings = table::floats(&top, VOTE_AVERAGE)?;
    let popularity = table::floats(&top, POPULARITY)?;
    Ok((0..top.height())
        .map(|row| PopularMovie {
            title: titles.get(row).map(str::to_string),
            vote_average: ratings.get(row),
            popularity: popularity.get(row),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::coerce::to_dates;
    use crate::table::frame_from_records;
    use serde_json::json;

    fn movies() -> DataFrame {
        let mut frame = frame_from_records(&[
            json!({"title": "A", "genres": "Action|Drama", "roi": 2.0, "release_date": "2001-05-01", "revenue_musd": 100.0, "budget_musd": 50.0, "popularity": 5.0, "vote_average": 6.0}),
            json!({"title": "B", "genres": "Action", "roi": 4.0, "release_date": "2001-09-01", "revenue_musd": null, "budget_musd": 20.0, "popularity": 9.0, "vote_average": null}),
            json!({"title": "C", "genres": "Comedy", "roi": null, "release_date": "1999-01-01", "revenue_musd": 30.0, "budget_musd": null, "popularity": 1.0, "vote_average": 7.0}),
            json!({"title": "D", "genres": "", "roi": 1.0, "release_date": null, "revenue_musd": 10.0, "budget_musd": 10.0, "popularity": null, "vote_average": 8.0}),
        ])
        .unwrap();
        let dates = to_dates(table::require_column(&frame, "release_date").unwrap()).unwrap();
        frame.with_column(dates).unwrap();
        frame
    }

    #[test]
    fn test_roi_by_genre_explodes_and_sorts() {
        let series = roi_by_genre(&movies()).unwrap();
        let names: Vec<&str> = series.iter().map(|g| g.genre.as_str()).collect();
        assert_eq!(names, ["Drama", "Action"]);
        assert_eq!(series[1].mean_roi, 3.0);
        assert_eq!(series[1].movies, 2);
    }

    #[test]
    fn test_yearly_box_office() {
        let series = yearly_box_office(&movies()).unwrap();
        assert_eq!(
            series,
            vec![
                YearRevenue { year: 1999, movies: 1, total_revenue_musd: 30.0 },
                YearRevenue { year: 2001, movies: 2, total_revenue_musd: 100.0 },
            ]
        );
    }

    #[test]
    fn test_revenue_vs_budget_skips_incomplete() {
        let points = revenue_vs_budget(&movies()).unwrap();
        let titles: Vec<_> = points.iter().filter_map(|p| p.title.as_deref()).collect();
        assert_eq!(titles, ["A", "D"]);
    }

    #[test]
    fn test_top_by_popularity() {
        let top = top_by_popularity(&movies(), 2).unwrap();
        assert_eq!(top[0].title.as_deref(), Some("B"));
        assert_eq!(top[0].vote_average, None);
        assert_eq!(top[1].title.as_deref(), Some("A"));
    }
}
