use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::errors::LoadError;
use crate::model::{Dataset, Record};
use crate::schema::{ColumnKind, MetricField, REQUIRED_COLUMNS};

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub dataset: Dataset,
    pub report: LoadReport,
}

/// What the loader had to paper over while reading the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows: usize,
    /// Non-empty cells that failed numeric parsing, per column.
    pub coerced_cells: BTreeMap<String, usize>,
    pub rows_without_city: usize,
}

impl LoadReport {
    pub fn total_coerced(&self) -> usize {
        self.coerced_cells.values().sum()
    }

    fn note_coerced(&mut self, column: &str) {
        *self.coerced_cells.entry(column.to_string()).or_insert(0) += 1;
    }
}

pub fn load_dataset(path: &Path) -> Result<LoadOutcome, LoadError> {
    let file = File::open(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    read_dataset(file)
}

pub fn parse_dataset(content: &str) -> Result<LoadOutcome, LoadError> {
    read_dataset(content.as_bytes())
}

pub fn read_dataset<R: Read>(reader: R) -> Result<LoadOutcome, LoadError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    if headers.iter().all(|name| name.is_empty()) {
        return Err(LoadError::MissingHeader);
    }
    let (columns, extra_columns) = map_columns(&headers)?;

    let mut report = LoadReport::default();
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record = build_record(&row, &columns, extra_columns.len(), &mut report);
        if record.city.is_none() {
            report.rows_without_city += 1;
        }
        records.push(record);
    }
    report.rows = records.len();

    Ok(LoadOutcome {
        dataset: Dataset::from_parts(columns, extra_columns, records),
        report,
    })
}

fn map_columns(
    headers: &StringRecord,
) -> Result<(Vec<(String, ColumnKind)>, Vec<String>), LoadError> {
    let mut columns = Vec::with_capacity(headers.len());
    let mut extra_columns = Vec::new();
    let mut seen_required = Vec::new();

    for name in headers.iter() {
        let kind = match ColumnKind::for_required(name) {
            Some(kind) if !seen_required.contains(&name) => {
                seen_required.push(name);
                kind
            }
            _ => {
                extra_columns.push(name.to_string());
                ColumnKind::Extra(extra_columns.len() - 1)
            }
        };
        columns.push((name.to_string(), kind));
    }

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| !seen_required.contains(*name))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns { missing });
    }

    Ok((columns, extra_columns))
}

fn build_record(
    row: &StringRecord,
    columns: &[(String, ColumnKind)],
    extra_count: usize,
    report: &mut LoadReport,
) -> Record {
    let mut record = Record {
        extras: vec![String::new(); extra_count],
        ..Record::default()
    };

    for (idx, (name, kind)) in columns.iter().enumerate() {
        let cell = row.get(idx).unwrap_or("");
        match *kind {
            ColumnKind::City => {
                record.city = (!cell.is_empty()).then(|| cell.to_string());
            }
            ColumnKind::Cluster => {
                record.cluster = parse_whole(cell).and_then(|v| u32::try_from(v).ok());
                if record.cluster.is_none() && !cell.is_empty() {
                    report.note_coerced(name);
                }
            }
            ColumnKind::Metric(MetricField::CustomerCount) => {
                record.customer_count = parse_whole(cell);
                if record.customer_count.is_none() && !cell.is_empty() {
                    report.note_coerced(name);
                }
            }
            ColumnKind::Metric(field) => {
                let value = parse_number(cell);
                if value.is_none() && !cell.is_empty() {
                    report.note_coerced(name);
                }
                record.set_metric(field, value);
            }
            ColumnKind::Extra(slot) => {
                record.extras[slot] = cell.to_string();
            }
        }
    }

    record
}

pub fn parse_number(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Non-negative whole number. Accepts `"12"` and `"12.0"`.
fn parse_whole(cell: &str) -> Option<u64> {
    let trimmed = cell.trim();
    if let Ok(value) = trimmed.parse::<u64>() {
        return Some(value);
    }
    parse_number(trimmed)
        .filter(|value| *value >= 0.0 && value.fract() == 0.0 && *value < u64::MAX as f64)
        .map(|value| value as u64)
}
