use std::cmp::Ordering;
use std::collections::BTreeMap;

use segdash_table::{MetricField, Record};
use serde::Serialize;

use crate::stats::mean;

pub const PROFILE_FIELDS: [MetricField; 3] = [
    MetricField::AvgFrequency,
    MetricField::AvgTotalMonetary,
    MetricField::AvgRecency,
];

pub const CITY_MEAN_FIELDS: [MetricField; 4] = [
    MetricField::AvgAge,
    MetricField::AvgFrequency,
    MetricField::AvgTotalMonetary,
    MetricField::AvgRecency,
];

pub const MAX_COMPARED_CITIES: usize = 4;
pub const DEFAULT_COMPARED_CITIES: usize = 3;

/// Value used for every city when a metric has no spread.
pub const DEGENERATE_NORMALIZED: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityMetrics {
    pub city: String,
    /// Aligned with the table's `fields`.
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityMetricTable {
    pub fields: Vec<MetricField>,
    pub rows: Vec<CityMetrics>,
}

impl CityMetricTable {
    pub fn value(&self, city: &str, field: MetricField) -> Option<f64> {
        let col = self.fields.iter().position(|f| *f == field)?;
        self.rows
            .iter()
            .find(|row| row.city == city)
            .and_then(|row| row.values[col])
    }

    pub fn cities(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.city.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn city_metric_means(rows: &[&Record], fields: &[MetricField]) -> CityMetricTable {
    let mut grouped: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();
    for record in rows {
        if let Some(city) = record.city() {
            grouped.entry(city).or_default().push(*record);
        }
    }

    let metrics = grouped
        .into_iter()
        .map(|(city, members)| CityMetrics {
            city: city.to_string(),
            values: fields
                .iter()
                .map(|field| mean(members.iter().map(|record| record.metric(*field))))
                .collect(),
        })
        .collect();

    CityMetricTable {
        fields: fields.to_vec(),
        rows: metrics,
    }
}

/// Per-city means min-max scaled to `[0, 1]` across the cities present.
/// A field with no spread maps every city to [`DEGENERATE_NORMALIZED`].
pub fn normalize_city_profile(rows: &[&Record], fields: &[MetricField]) -> CityMetricTable {
    let mut table = city_metric_means(rows, fields);

    for col in 0..table.fields.len() {
        let present = table.rows.iter().filter_map(|row| row.values[col]);
        let Some((min, max)) = present.fold(None, |range: Option<(f64, f64)>, value| {
            Some(match range {
                None => (value, value),
                Some((lo, hi)) => (lo.min(value), hi.max(value)),
            })
        }) else {
            continue;
        };

        let spread = max - min;
        for row in &mut table.rows {
            row.values[col] = if spread == 0.0 {
                Some(DEGENERATE_NORMALIZED)
            } else {
                row.values[col].map(|value| (value - min) / spread)
            };
        }
    }

    table
}

/// Cities for the comparison view. At most [`MAX_COMPARED_CITIES`] picks are
/// kept and unknown names are ignored; an empty pick falls back to the top
/// [`DEFAULT_COMPARED_CITIES`] cities by normalised spend.
pub fn select_comparison(profile: &CityMetricTable, picks: &[String]) -> Vec<String> {
    let mut chosen: Vec<String> = Vec::new();
    for pick in picks {
        if chosen.len() == MAX_COMPARED_CITIES {
            break;
        }
        if profile.cities().any(|city| city == pick) && !chosen.contains(pick) {
            chosen.push(pick.clone());
        }
    }
    if !chosen.is_empty() {
        return chosen;
    }

    let mut by_spend: Vec<(&str, Option<f64>)> = profile
        .cities()
        .map(|city| (city, profile.value(city, MetricField::AvgTotalMonetary)))
        .collect();
    by_spend.sort_by(|a, b| descending_missing_last(a.1, b.1));
    by_spend
        .into_iter()
        .take(DEFAULT_COMPARED_CITIES)
        .map(|(city, _)| city.to_string())
        .collect()
}

pub(crate) fn descending_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
