use std::collections::{BTreeMap, BTreeSet};

use segdash_table::{MetricField, Record};
use serde::Serialize;

use crate::stats::mean;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Sum,
    Mean,
}

/// City x cluster table. `values[i][j]` belongs to `cities[i]`, `clusters[j]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable {
    pub field: MetricField,
    pub aggregation: Aggregation,
    pub cities: Vec<String>,
    pub clusters: Vec<u32>,
    pub values: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotCell {
    pub city: String,
    pub cluster: u32,
    pub value: f64,
}

impl PivotTable {
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    pub fn get(&self, city: &str, cluster: u32) -> Option<f64> {
        let row = self.cities.iter().position(|c| c == city)?;
        let col = self.clusters.iter().position(|c| *c == cluster)?;
        Some(self.values[row][col])
    }

    /// Long form, one cell per (city, cluster) including zero fills.
    pub fn to_long(&self) -> Vec<PivotCell> {
        self.cities
            .iter()
            .zip(&self.values)
            .flat_map(|(city, row)| {
                self.clusters
                    .iter()
                    .zip(row)
                    .map(move |(cluster, value)| PivotCell {
                        city: city.clone(),
                        cluster: *cluster,
                        value: *value,
                    })
            })
            .collect()
    }
}

/// Pivots `field` by city (rows) and cluster (columns). Combinations without
/// data are filled with 0 for both aggregations.
pub fn pivot_city_cluster(
    rows: &[&Record],
    field: MetricField,
    aggregation: Aggregation,
) -> PivotTable {
    let mut groups: BTreeMap<(&str, u32), Vec<Option<f64>>> = BTreeMap::new();
    let mut cities = BTreeSet::new();
    let mut clusters = BTreeSet::new();

    for record in rows {
        let (Some(city), Some(cluster)) = (record.city(), record.cluster) else {
            continue;
        };
        cities.insert(city);
        clusters.insert(cluster);
        groups
            .entry((city, cluster))
            .or_default()
            .push(record.metric(field));
    }

    let cities: Vec<&str> = cities.into_iter().collect();
    let clusters: Vec<u32> = clusters.into_iter().collect();
    let values: Vec<Vec<f64>> = cities
        .iter()
        .map(|city| {
            clusters
                .iter()
                .map(|cluster| {
                    groups
                        .get(&(*city, *cluster))
                        .and_then(|cell| aggregate(cell, aggregation))
                        .unwrap_or(0.0)
                })
                .collect()
        })
        .collect();

    PivotTable {
        field,
        aggregation,
        cities: cities.into_iter().map(str::to_string).collect(),
        clusters,
        values,
    }
}

fn aggregate(values: &[Option<f64>], aggregation: Aggregation) -> Option<f64> {
    match aggregation {
        Aggregation::Sum => Some(values.iter().flatten().sum()),
        Aggregation::Mean => mean(values.iter().copied()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityTotal {
    pub city: String,
    pub customers: u64,
}

/// Total customers per city, largest first; equal totals sort by city name.
pub fn city_totals(rows: &[&Record]) -> Vec<CityTotal> {
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    for record in rows {
        if let Some(city) = record.city() {
            let total = totals.entry(city).or_insert(0);
            *total = total.saturating_add(record.customers());
        }
    }

    let mut out: Vec<CityTotal> = totals
        .into_iter()
        .map(|(city, customers)| CityTotal {
            city: city.to_string(),
            customers,
        })
        .collect();
    out.sort_by(|a, b| b.customers.cmp(&a.customers));
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityClusterTotal {
    pub city: String,
    pub cluster: u32,
    pub customers: u64,
}

pub fn city_cluster_totals(rows: &[&Record]) -> Vec<CityClusterTotal> {
    let mut totals: BTreeMap<(&str, u32), u64> = BTreeMap::new();
    for record in rows {
        if let (Some(city), Some(cluster)) = (record.city(), record.cluster) {
            let total = totals.entry((city, cluster)).or_insert(0);
            *total = total.saturating_add(record.customers());
        }
    }

    totals
        .into_iter()
        .map(|((city, cluster), customers)| CityClusterTotal {
            city: city.to_string(),
            cluster,
            customers,
        })
        .collect()
}
