use segdash_table::{Dataset, MetricField, Record};
use serde::Serialize;
use tracing::debug;

use crate::filters::{apply_filters, paginate_cities, CityPage, FilterState};
use crate::insights::{insight_highlights, preview_rows, InsightHighlights};
use crate::kpis::{compute_kpis, Kpis};
use crate::pivot::{
    city_cluster_totals, city_totals, pivot_city_cluster, Aggregation, CityClusterTotal,
    CityTotal, PivotTable,
};
use crate::profile::{
    city_metric_means, normalize_city_profile, select_comparison, CityMetricTable,
    CITY_MEAN_FIELDS, PROFILE_FIELDS,
};
use crate::segments::{classify_strategy, segment_summary, SegmentSummary, StrategyRecommendation};

/// Everything the dashboard shows for one filter state.
///
/// `filtered` is the full selection across every page; the aggregate tables
/// are computed over `page.rows`, the cities currently on screen.
#[derive(Debug, Clone, Serialize)]
pub struct DerivedView<'a> {
    pub kpis: Kpis,
    pub filtered: Vec<&'a Record>,
    pub page: CityPage<'a>,
    pub customer_pivot: PivotTable,
    pub spend_heatmap: PivotTable,
    pub city_totals: Vec<CityTotal>,
    pub segment_mix: Vec<CityClusterTotal>,
    pub city_profile: CityMetricTable,
    pub comparison: Vec<String>,
    pub city_means: CityMetricTable,
    pub segments: Vec<SegmentSummary>,
    pub strategies: Vec<StrategyRecommendation>,
    pub insights: InsightHighlights,
}

impl<'a> DerivedView<'a> {
    pub fn preview(&self) -> Vec<&'a Record> {
        preview_rows(&self.page.rows)
    }
}

pub fn derive_view<'a>(
    dataset: &'a Dataset,
    filter: &FilterState,
    compare: &[String],
) -> DerivedView<'a> {
    let rows = dataset.rows();
    let filtered = apply_filters(&rows, &filter.cities, &filter.clusters, filter.top_n);
    let pagination = filter.pagination;
    let page = paginate_cities(
        &filtered,
        pagination.page_size,
        pagination.page,
        pagination.show_all,
    );
    debug!(
        filtered = filtered.len(),
        page = page.page,
        total_pages = page.total_pages,
        page_rows = page.rows.len(),
        "derived view"
    );

    let current = &page.rows;
    let city_profile = normalize_city_profile(current, &PROFILE_FIELDS);
    let comparison = select_comparison(&city_profile, compare);
    let segments = segment_summary(current);
    let strategies = classify_strategy(&segments);

    DerivedView {
        kpis: compute_kpis(dataset),
        customer_pivot: pivot_city_cluster(current, MetricField::CustomerCount, Aggregation::Sum),
        spend_heatmap: pivot_city_cluster(
            current,
            MetricField::AvgTotalMonetary,
            Aggregation::Mean,
        ),
        city_totals: city_totals(current),
        segment_mix: city_cluster_totals(current),
        city_means: city_metric_means(current, &CITY_MEAN_FIELDS),
        insights: insight_highlights(current),
        city_profile,
        comparison,
        segments,
        strategies,
        filtered,
        page,
    }
}
