// crates/segdash/src/render.rs

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use segdash_core::insights::InsightHighlights;
use segdash_core::pivot::{CityTotal, PivotTable};
use segdash_core::segments::StrategyRecommendation;
use segdash_core::{CityMetricTable, CityPage, Kpis, Narrative, SegmentSummary};
use segdash_table::{ColumnKind, Dataset, MetricField, Record};

fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn number(value: f64) -> Cell {
    Cell::new(format!("{value:.2}")).set_alignment(CellAlignment::Right)
}

fn maybe_number(value: Option<f64>) -> Cell {
    match value {
        Some(value) => number(value),
        None => Cell::new(""),
    }
}

fn count(value: u64) -> Cell {
    Cell::new(value.to_string()).set_alignment(CellAlignment::Right)
}

pub fn kpis(kpis: &Kpis) -> Table {
    let mut out = table();
    out.set_header(vec![
        "Total Customers",
        "Cities",
        "Segments",
        "Avg Spend per Customer",
    ]);
    out.add_row(vec![
        count(kpis.total_customers),
        count(kpis.city_count as u64),
        count(kpis.segment_count as u64),
        maybe_number(kpis.weighted_avg_spend),
    ]);
    out
}

pub fn narrative(narrative: &Narrative) -> String {
    let mut text = String::from("Key Takeaways\n\n");
    text.push_str(narrative.text().trim_end());
    text.push('\n');
    text
}

pub fn pivot(pivot: &PivotTable) -> Table {
    let mut out = table();
    let mut header = vec![Cell::new("City")];
    header.extend(
        pivot
            .clusters
            .iter()
            .map(|cluster| Cell::new(format!("Cluster {cluster}"))),
    );
    out.set_header(header);

    for (city, values) in pivot.cities.iter().zip(&pivot.values) {
        let mut row = vec![Cell::new(city)];
        row.extend(values.iter().map(|value| number(*value)));
        out.add_row(row);
    }
    out
}

pub fn insights(highlights: &InsightHighlights) -> String {
    highlights.headline()
}

pub fn city_totals(totals: &[CityTotal]) -> Table {
    let mut out = table();
    out.set_header(vec!["City", "Customers"]);
    for entry in totals {
        out.add_row(vec![Cell::new(&entry.city), count(entry.customers)]);
    }
    out
}

pub fn city_metrics(metrics: &CityMetricTable) -> Table {
    let mut out = table();
    let mut header = vec![Cell::new("City")];
    header.extend(metrics.fields.iter().map(|field| Cell::new(field.column_name())));
    out.set_header(header);

    for row in &metrics.rows {
        let mut cells = vec![Cell::new(&row.city)];
        cells.extend(row.values.iter().map(|value| maybe_number(*value)));
        out.add_row(cells);
    }
    out
}

/// Profile rows limited to the compared cities, in comparison order.
pub fn comparison(profile: &CityMetricTable, cities: &[String]) -> Table {
    let mut out = table();
    let mut header = vec![Cell::new("City")];
    header.extend(
        profile
            .fields
            .iter()
            .map(|field| Cell::new(format!("{} (norm)", field.column_name()))),
    );
    out.set_header(header);

    for city in cities {
        let mut cells = vec![Cell::new(city)];
        cells.extend(
            profile
                .fields
                .iter()
                .map(|field| maybe_number(profile.value(city, *field))),
        );
        out.add_row(cells);
    }
    out
}

pub fn segments(summary: &[SegmentSummary]) -> Table {
    let mut out = table();
    let mut header = vec![
        Cell::new("Cluster"),
        Cell::new(MetricField::CustomerCount.column_name()),
    ];
    header.extend(
        MetricField::AVERAGES
            .iter()
            .map(|field| Cell::new(field.column_name())),
    );
    out.set_header(header);

    for row in summary {
        let mut cells = vec![count(row.cluster as u64), count(row.customer_count)];
        cells.extend(
            MetricField::AVERAGES
                .iter()
                .map(|field| maybe_number(row.metric(*field))),
        );
        out.add_row(cells);
    }
    out
}

pub fn strategies(recommendations: &[StrategyRecommendation]) -> String {
    if recommendations.is_empty() {
        return "No segments in current filter.".to_string();
    }
    recommendations
        .iter()
        .map(|rec| format!("- Cluster {} [{}]: {}", rec.cluster, rec.tag, rec.message))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn page_footer(page: &CityPage<'_>) -> String {
    format!(
        "Page {} of {} ({} cities, {} rows)",
        page.page,
        page.total_pages,
        page.cities.len(),
        page.rows.len()
    )
}

pub fn records(dataset: &Dataset, rows: &[&Record]) -> Table {
    let mut out = table();
    out.set_header(dataset.header());
    for record in rows {
        let cells: Vec<Cell> = dataset
            .columns()
            .iter()
            .map(|(_, kind)| record_cell(record, *kind))
            .collect();
        out.add_row(cells);
    }
    out
}

fn record_cell(record: &Record, kind: ColumnKind) -> Cell {
    match kind {
        ColumnKind::City => Cell::new(record.city().unwrap_or("")),
        ColumnKind::Cluster => record
            .cluster
            .map(|id| count(id as u64))
            .unwrap_or_else(|| Cell::new("")),
        ColumnKind::Metric(MetricField::CustomerCount) => record
            .customer_count
            .map(count)
            .unwrap_or_else(|| Cell::new("")),
        ColumnKind::Metric(field) => maybe_number(record.metric(field)),
        ColumnKind::Extra(slot) => Cell::new(record.extra(slot).unwrap_or("")),
    }
}

#[cfg(test)]
mod tests {
    use segdash_core::segments::StrategyTag;

    use super::*;

    #[test]
    fn empty_strategies_say_so() {
        assert_eq!(strategies(&[]), "No segments in current filter.");
    }

    #[test]
    fn strategies_list_one_line_per_cluster() {
        let recs = vec![
            StrategyRecommendation {
                cluster: 2,
                tag: StrategyTag::Premium,
                message: StrategyTag::Premium.recommendation(),
            },
            StrategyRecommendation {
                cluster: 0,
                tag: StrategyTag::ReEngagement,
                message: StrategyTag::ReEngagement.recommendation(),
            },
        ];
        let text = strategies(&recs);
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("- Cluster 2 [premium]"));
    }

    #[test]
    fn kpi_table_blanks_undefined_spend() {
        let rendered = kpis(&Kpis {
            total_customers: 0,
            city_count: 0,
            segment_count: 0,
            weighted_avg_spend: None,
        })
        .to_string();
        assert!(rendered.contains("Avg Spend per Customer"));
        assert!(!rendered.contains("NaN"));
    }
}
