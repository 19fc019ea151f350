use crate::metrics::phase_metric;

/// Metrics for KPI report generation
pub struct KpiMetrics;

impl KpiMetrics {
    pub fn record_report(views: usize, input_rows: usize, duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "kpi", "reports")).increment(1);
        ::metrics::counter!(phase_metric!(counter, "kpi", "views")).increment(views as u64);
        ::metrics::histogram!(phase_metric!(histogram, "kpi", "input_rows")).record(input_rows as f64);
        ::metrics::histogram!(phase_metric!(histogram, "kpi", "duration_seconds")).record(duration_secs);
    }

    pub fn record_search(matches: usize) {
        ::metrics::counter!(phase_metric!(counter, "kpi", "searches")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "kpi", "search_matches")).record(matches as f64);
    }
}
