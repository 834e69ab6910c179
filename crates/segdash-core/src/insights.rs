use std::collections::BTreeMap;

use segdash_table::Record;
use serde::Serialize;

use crate::pivot::{city_totals, CityTotal};

pub const LEADING_CITY_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentTotal {
    pub cluster: u32,
    pub customers: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsightHighlights {
    pub leading_cities: Vec<CityTotal>,
    pub leading_segments: Vec<SegmentTotal>,
}

impl InsightHighlights {
    pub fn headline(&self) -> String {
        let cities = if self.leading_cities.is_empty() {
            "N/A".to_string()
        } else {
            self.leading_cities
                .iter()
                .map(|entry| format!("{} ({})", entry.city, entry.customers))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let segments = if self.leading_segments.is_empty() {
            "N/A".to_string()
        } else {
            self.leading_segments
                .iter()
                .map(|entry| format!("Cluster {} ({})", entry.cluster, entry.customers))
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!("Top cities by customers: {cities}. Leading segments: {segments}.")
    }
}

pub fn insight_highlights(rows: &[&Record]) -> InsightHighlights {
    let mut leading_cities = city_totals(rows);
    leading_cities.truncate(LEADING_CITY_COUNT);

    let mut totals: BTreeMap<u32, u64> = BTreeMap::new();
    for record in rows {
        if let Some(cluster) = record.cluster {
            let total = totals.entry(cluster).or_insert(0);
            *total = total.saturating_add(record.customers());
        }
    }
    let mut leading_segments: Vec<SegmentTotal> = totals
        .into_iter()
        .map(|(cluster, customers)| SegmentTotal { cluster, customers })
        .collect();
    leading_segments.sort_by(|a, b| b.customers.cmp(&a.customers));

    InsightHighlights {
        leading_cities,
        leading_segments,
    }
}

/// Rows ordered by city, then cluster, for the data table. Rows with no city sort first.
pub fn preview_rows<'a>(rows: &[&'a Record]) -> Vec<&'a Record> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| (a.city(), a.cluster).cmp(&(b.city(), b.cluster)));
    sorted
}
