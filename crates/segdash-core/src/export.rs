use std::fs::File;
use std::io::Write;
use std::path::Path;

use polars::io::parquet::write::{ParquetCompression, ParquetWriter, StatisticsOptions};
use segdash_table::{ColumnKind, Dataset, MetricField, Record};
use tracing::info;

use crate::error::Result;
use crate::frames::records_frame;

pub const DEFAULT_EXPORT_NAME: &str = "filtered_top_kpis.csv";

pub fn write_csv<W: Write>(dataset: &Dataset, rows: &[&Record], writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(dataset.header())?;

    for record in rows {
        let cells = dataset
            .columns()
            .iter()
            .map(|(_, kind)| cell_text(record, *kind));
        out.write_record(cells)?;
    }

    out.flush()?;
    Ok(())
}

pub fn export_csv(dataset: &Dataset, rows: &[&Record], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_csv(dataset, rows, file)?;
    info!(path = %path.display(), rows = rows.len(), "exported filtered rows as CSV");
    Ok(())
}

pub fn export_parquet(dataset: &Dataset, rows: &[&Record], path: &Path) -> Result<()> {
    let mut frame = records_frame(dataset.columns(), rows)?;
    let mut file = File::create(path)?;
    ParquetWriter::new(&mut file)
        .with_compression(ParquetCompression::Zstd(None))
        .with_statistics(StatisticsOptions::default())
        .finish(&mut frame)?;
    info!(path = %path.display(), rows = rows.len(), "exported filtered rows as parquet");
    Ok(())
}

fn cell_text(record: &Record, kind: ColumnKind) -> String {
    match kind {
        ColumnKind::City => record.city.clone().unwrap_or_default(),
        ColumnKind::Cluster => record.cluster.map(|id| id.to_string()).unwrap_or_default(),
        ColumnKind::Metric(MetricField::CustomerCount) => record
            .customer_count
            .map(|count| count.to_string())
            .unwrap_or_default(),
        ColumnKind::Metric(field) => record
            .metric(field)
            .map(|value| value.to_string())
            .unwrap_or_default(),
        ColumnKind::Extra(slot) => record.extra(slot).unwrap_or_default().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use segdash_table::parse_dataset;

    use super::*;

    const TABLE: &str = "CustLocation,Cluster,CustomerCount,AvgAge,AvgRecency,AvgFrequency,AvgAvgMonetary,AvgTotalMonetary,Share\n\
                         PUNE,0,10,30,n/a,2,500,900.5,0.5\n\
                         AGRA,1,20,40,25,1,400,700,\n";

    #[test]
    fn csv_keeps_header_and_blanks_missing() {
        let dataset = parse_dataset(TABLE).expect("parse").dataset;
        let rows = dataset.rows();
        let mut buffer = Vec::new();
        write_csv(&dataset, &rows, &mut buffer).expect("write");

        let text = String::from_utf8(buffer).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "CustLocation,Cluster,CustomerCount,AvgAge,AvgRecency,AvgFrequency,AvgAvgMonetary,AvgTotalMonetary,Share"
        );
        assert_eq!(lines[1], "PUNE,0,10,30,,2,500,900.5,0.5");
        assert_eq!(lines[2], "AGRA,1,20,40,25,1,400,700,");
    }

    #[test]
    fn exported_csv_loads_back() {
        let dataset = parse_dataset(TABLE).expect("parse").dataset;
        let rows = dataset.rows();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(DEFAULT_EXPORT_NAME);
        export_csv(&dataset, &rows, &path).expect("export");

        let reloaded = segdash_table::load_dataset(&path).expect("reload").dataset;
        assert_eq!(reloaded.records(), dataset.records());
        assert_eq!(reloaded.header(), dataset.header());
    }

    #[test]
    fn parquet_export_writes_a_file() {
        let dataset = parse_dataset(TABLE).expect("parse").dataset;
        let rows = dataset.rows();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("filtered.parquet");
        export_parquet(&dataset, &rows, &path).expect("export");
        assert!(std::fs::metadata(&path).expect("metadata").len() > 0);
    }
}
