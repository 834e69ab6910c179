use std::collections::BTreeSet;

use segdash_table::{Dataset, Record};
use serde::Serialize;

use crate::error::{Result, ViewError};

/// Headline numbers. Always computed over the whole dataset, never the current filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_customers: u64,
    pub city_count: usize,
    pub segment_count: usize,
    /// `None` when the dataset holds no customers.
    pub weighted_avg_spend: Option<f64>,
}

pub fn compute_kpis(dataset: &Dataset) -> Kpis {
    let records = dataset.records();
    let total_customers = records
        .iter()
        .map(Record::customers)
        .fold(0, u64::saturating_add);
    let city_count = records
        .iter()
        .filter_map(Record::city)
        .collect::<BTreeSet<_>>()
        .len();
    let segment_count = records
        .iter()
        .filter_map(|record| record.cluster)
        .collect::<BTreeSet<_>>()
        .len();

    Kpis {
        total_customers,
        city_count,
        segment_count,
        weighted_avg_spend: weighted_average_spend(records.iter()).ok(),
    }
}

/// `Σ(spend × count) / Σ(count)`. Rows with no spend add nothing to the
/// numerator but still count toward the denominator.
pub fn weighted_average_spend<'a, I>(records: I) -> Result<f64>
where
    I: IntoIterator<Item = &'a Record>,
{
    let (weighted, customers) = records
        .into_iter()
        .fold((0.0_f64, 0_u64), |(weighted, customers), record| {
            let count = record.customers();
            let spend = record.avg_total_monetary.unwrap_or(0.0);
            (weighted + spend * count as f64, customers.saturating_add(count))
        });

    if customers == 0 {
        return Err(ViewError::DivisionByZero);
    }
    Ok(weighted / customers as f64)
}
