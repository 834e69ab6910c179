use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use crate::schema::{ColumnKind, MetricField};

/// One (city, cluster) rollup row. Unparseable cells are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    pub city: Option<String>,
    pub cluster: Option<u32>,
    pub customer_count: Option<u64>,
    pub avg_age: Option<f64>,
    pub avg_recency: Option<f64>,
    pub avg_frequency: Option<f64>,
    pub avg_avg_monetary: Option<f64>,
    pub avg_total_monetary: Option<f64>,
    /// Raw text of the pass-through columns, in `Dataset::extra_columns` order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,
}

impl Record {
    pub fn new(city: impl Into<String>, cluster: u32, customer_count: u64) -> Self {
        Self {
            city: Some(city.into()),
            cluster: Some(cluster),
            customer_count: Some(customer_count),
            ..Self::default()
        }
    }

    pub fn with_metric(mut self, field: MetricField, value: f64) -> Self {
        self.set_metric(field, Some(value));
        self
    }

    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    /// Customer count with missing treated as zero, the way column sums skip gaps.
    pub fn customers(&self) -> u64 {
        self.customer_count.unwrap_or(0)
    }

    pub fn metric(&self, field: MetricField) -> Option<f64> {
        match field {
            MetricField::CustomerCount => self.customer_count.map(|count| count as f64),
            MetricField::AvgAge => self.avg_age,
            MetricField::AvgRecency => self.avg_recency,
            MetricField::AvgFrequency => self.avg_frequency,
            MetricField::AvgAvgMonetary => self.avg_avg_monetary,
            MetricField::AvgTotalMonetary => self.avg_total_monetary,
        }
    }

    pub fn set_metric(&mut self, field: MetricField, value: Option<f64>) {
        match field {
            MetricField::CustomerCount => {
                self.customer_count = value
                    .filter(|v| *v >= 0.0 && v.fract() == 0.0)
                    .map(|v| v as u64)
            }
            MetricField::AvgAge => self.avg_age = value,
            MetricField::AvgRecency => self.avg_recency = value,
            MetricField::AvgFrequency => self.avg_frequency = value,
            MetricField::AvgAvgMonetary => self.avg_avg_monetary = value,
            MetricField::AvgTotalMonetary => self.avg_total_monetary = value,
        }
    }

    pub fn extra(&self, index: usize) -> Option<&str> {
        self.extras.get(index).map(String::as_str)
    }
}

/// The loaded table. Immutable once built; share it through [`SharedDataset`].
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    columns: Vec<(String, ColumnKind)>,
    extra_columns: Vec<String>,
    records: Vec<Record>,
}

pub type SharedDataset = Arc<Dataset>;

impl Dataset {
    pub(crate) fn from_parts(
        columns: Vec<(String, ColumnKind)>,
        extra_columns: Vec<String>,
        records: Vec<Record>,
    ) -> Self {
        Self {
            columns,
            extra_columns,
            records,
        }
    }

    pub fn from_records(records: Vec<Record>) -> Self {
        let columns = crate::schema::REQUIRED_COLUMNS
            .iter()
            .filter_map(|name| ColumnKind::for_required(name).map(|kind| (name.to_string(), kind)))
            .collect();
        Self {
            columns,
            extra_columns: Vec::new(),
            records,
        }
    }

    pub fn into_shared(self) -> SharedDataset {
        Arc::new(self)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn rows(&self) -> Vec<&Record> {
        self.records.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn columns(&self) -> &[(String, ColumnKind)] {
        &self.columns
    }

    pub fn header(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    pub fn cities(&self) -> Vec<String> {
        self.records
            .iter()
            .filter_map(|record| record.city.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn clusters(&self) -> Vec<u32> {
        self.records
            .iter()
            .filter_map(|record| record.cluster)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
