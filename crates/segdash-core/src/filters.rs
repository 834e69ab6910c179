use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroUsize;

use segdash_table::{Dataset, Record};
use serde::Serialize;
use tracing::debug;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page_size: NonZeroUsize,
    /// One-based; clamped into range when the page is cut.
    pub page: usize,
    pub show_all: bool,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_size: NonZeroUsize::new(DEFAULT_PAGE_SIZE).unwrap_or(NonZeroUsize::MIN),
            page: 1,
            show_all: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub cities: BTreeSet<String>,
    pub clusters: BTreeSet<u32>,
    pub top_n: Option<NonZeroUsize>,
    pub pagination: Pagination,
}

impl FilterState {
    pub fn all(dataset: &Dataset) -> Self {
        Self {
            cities: dataset.cities().into_iter().collect(),
            clusters: dataset.clusters().into_iter().collect(),
            top_n: None,
            pagination: Pagination::default(),
        }
    }

    pub fn with_cities<I, S>(mut self, cities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cities = cities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_clusters<I>(mut self, clusters: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        self.clusters = clusters.into_iter().collect();
        self
    }

    pub fn with_top_n(mut self, top_n: Option<NonZeroUsize>) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }
}

/// Rows whose city and cluster are both selected, optionally narrowed to the
/// `top_n` cities by total customers. Original row order is kept.
pub fn apply_filters<'a>(
    rows: &[&'a Record],
    cities: &BTreeSet<String>,
    clusters: &BTreeSet<u32>,
    top_n: Option<NonZeroUsize>,
) -> Vec<&'a Record> {
    let filtered: Vec<&'a Record> = rows
        .iter()
        .copied()
        .filter(|record| {
            let city_ok = record.city().is_some_and(|city| cities.contains(city));
            let cluster_ok = record.cluster.is_some_and(|id| clusters.contains(&id));
            city_ok && cluster_ok
        })
        .collect();

    let Some(limit) = top_n else {
        debug!(rows = filtered.len(), "applied city/cluster filter");
        return filtered;
    };

    let keep: BTreeSet<&str> = top_cities(&filtered, limit.get()).into_iter().collect();
    let narrowed: Vec<&'a Record> = filtered
        .into_iter()
        .filter(|record| record.city().is_some_and(|city| keep.contains(city)))
        .collect();
    debug!(rows = narrowed.len(), top_n = limit.get(), "applied Top-N filter");
    narrowed
}

/// Cities ranked by total customers, descending. Ties keep first-appearance order.
pub fn top_cities<'a>(rows: &[&'a Record], limit: usize) -> Vec<&'a str> {
    let mut order: Vec<&'a str> = Vec::new();
    let mut totals: HashMap<&'a str, u64> = HashMap::new();

    for record in rows {
        let Some(city) = record.city.as_deref() else {
            continue;
        };
        let total = totals.entry(city).or_insert_with(|| {
            order.push(city);
            0
        });
        *total = total.saturating_add(record.customers());
    }

    // stable sort keeps first-appearance order among equal totals
    order.sort_by(|a, b| totals[b].cmp(&totals[a]));
    order.truncate(limit);
    order
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityPage<'a> {
    pub rows: Vec<&'a Record>,
    pub cities: Vec<String>,
    pub page: usize,
    pub total_pages: usize,
}

pub fn paginate_cities<'a>(
    rows: &[&'a Record],
    page_size: NonZeroUsize,
    page: usize,
    show_all: bool,
) -> CityPage<'a> {
    let cities: Vec<String> = distinct_cities(rows);

    if show_all {
        return CityPage {
            rows: rows.to_vec(),
            cities,
            page: 1,
            total_pages: 1,
        };
    }

    let size = page_size.get();
    let total_pages = cities.len().div_ceil(size).max(1);
    let page = page.clamp(1, total_pages);
    let start = ((page - 1) * size).min(cities.len());
    let end = (start + size).min(cities.len());
    let page_cities: Vec<String> = cities[start..end].to_vec();

    let selected: BTreeSet<&str> = page_cities.iter().map(String::as_str).collect();
    let page_rows = rows
        .iter()
        .copied()
        .filter(|record| record.city().is_some_and(|city| selected.contains(city)))
        .collect();

    CityPage {
        rows: page_rows,
        cities: page_cities,
        page,
        total_pages,
    }
}

pub fn distinct_cities(rows: &[&Record]) -> Vec<String> {
    rows.iter()
        .filter_map(|record| record.city())
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
