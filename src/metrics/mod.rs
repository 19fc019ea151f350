//! Pipeline metrics
//!
//! Counters and histograms for the cleaning stages and the KPI engine. The
//! crate never installs a recorder; without one every call is a no-op, so a
//! host application decides whether and where these are exported.

pub mod kpi;
pub mod stages;

pub use kpi::KpiMetrics;
pub use stages::StageMetrics;

/// Build a metric name with the crate prefix and the phase it belongs to
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("movie_kpi_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("movie_kpi_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;
