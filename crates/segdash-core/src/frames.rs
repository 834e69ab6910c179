use polars::prelude::{Column, DataFrame, NamedFrom, PolarsError, Series};
use segdash_table::loader::parse_number;
use segdash_table::{ColumnKind, MetricField, Record, CITY_COLUMN, CLUSTER_COLUMN};

use crate::pivot::PivotTable;
use crate::profile::CityMetricTable;
use crate::segments::SegmentSummary;

/// Materialises rows with the given header layout. Pass-through columns become
/// `f64` when every non-empty cell parses, and stay text otherwise.
pub fn records_frame(
    columns: &[(String, ColumnKind)],
    rows: &[&Record],
) -> Result<DataFrame, PolarsError> {
    let mut out: Vec<Column> = Vec::with_capacity(columns.len());

    for (name, kind) in columns {
        let name = name.as_str();
        let series = match *kind {
            ColumnKind::City => Series::new(
                name.into(),
                rows.iter().map(|r| r.city()).collect::<Vec<Option<&str>>>(),
            ),
            ColumnKind::Cluster => Series::new(
                name.into(),
                rows.iter().map(|r| r.cluster).collect::<Vec<Option<u32>>>(),
            ),
            ColumnKind::Metric(MetricField::CustomerCount) => Series::new(
                name.into(),
                rows.iter()
                    .map(|r| r.customer_count)
                    .collect::<Vec<Option<u64>>>(),
            ),
            ColumnKind::Metric(field) => Series::new(
                name.into(),
                rows.iter()
                    .map(|r| r.metric(field))
                    .collect::<Vec<Option<f64>>>(),
            ),
            ColumnKind::Extra(slot) => extra_series(name, rows, slot),
        };
        out.push(series.into());
    }

    DataFrame::new(out)
}

fn extra_series(name: &str, rows: &[&Record], slot: usize) -> Series {
    let cells: Vec<&str> = rows.iter().map(|r| r.extra(slot).unwrap_or("")).collect();
    let numeric = cells
        .iter()
        .all(|cell| cell.is_empty() || parse_number(cell).is_some());

    if numeric {
        Series::new(
            name.into(),
            cells
                .iter()
                .map(|cell| parse_number(cell))
                .collect::<Vec<Option<f64>>>(),
        )
    } else {
        Series::new(
            name.into(),
            cells
                .iter()
                .map(|cell| (!cell.is_empty()).then_some(*cell))
                .collect::<Vec<Option<&str>>>(),
        )
    }
}

pub fn pivot_frame(pivot: &PivotTable) -> Result<DataFrame, PolarsError> {
    let mut out: Vec<Column> = Vec::with_capacity(pivot.clusters.len() + 1);
    out.push(Series::new(CITY_COLUMN.into(), pivot.cities.clone()).into());

    for (col, cluster) in pivot.clusters.iter().enumerate() {
        let values: Vec<f64> = pivot.values.iter().map(|row| row[col]).collect();
        out.push(Series::new(cluster.to_string().as_str().into(), values).into());
    }

    DataFrame::new(out)
}

pub fn segment_frame(summary: &[SegmentSummary]) -> Result<DataFrame, PolarsError> {
    let mut out: Vec<Column> = Vec::with_capacity(MetricField::ALL.len() + 1);
    out.push(
        Series::new(
            CLUSTER_COLUMN.into(),
            summary.iter().map(|row| row.cluster).collect::<Vec<u32>>(),
        )
        .into(),
    );
    out.push(
        Series::new(
            MetricField::CustomerCount.column_name().into(),
            summary.iter().map(|row| row.customer_count).collect::<Vec<u64>>(),
        )
        .into(),
    );
    for field in MetricField::AVERAGES {
        out.push(
            Series::new(
                field.column_name().into(),
                summary
                    .iter()
                    .map(|row| row.metric(field))
                    .collect::<Vec<Option<f64>>>(),
            )
            .into(),
        );
    }

    DataFrame::new(out)
}

pub fn city_metric_frame(table: &CityMetricTable) -> Result<DataFrame, PolarsError> {
    let mut out: Vec<Column> = Vec::with_capacity(table.fields.len() + 1);
    out.push(
        Series::new(
            CITY_COLUMN.into(),
            table
                .rows
                .iter()
                .map(|row| row.city.as_str())
                .collect::<Vec<&str>>(),
        )
        .into(),
    );
    for (col, field) in table.fields.iter().enumerate() {
        out.push(
            Series::new(
                field.column_name().into(),
                table
                    .rows
                    .iter()
                    .map(|row| row.values[col])
                    .collect::<Vec<Option<f64>>>(),
            )
            .into(),
        );
    }

    DataFrame::new(out)
}
