use std::path::Path;

use segdash_table::{load_dataset, SharedDataset};
use tracing::{info, warn};

use crate::error::Result;

pub fn load_shared_dataset(path: &Path) -> Result<SharedDataset> {
    let outcome = load_dataset(path)?;
    let report = &outcome.report;

    for (column, cells) in &report.coerced_cells {
        warn!(column = %column, cells, "non-numeric cells treated as missing");
    }
    if report.rows_without_city > 0 {
        warn!(rows = report.rows_without_city, "rows without a city are excluded from city views");
    }
    info!(
        path = %path.display(),
        rows = report.rows,
        cities = outcome.dataset.cities().len(),
        clusters = outcome.dataset.clusters().len(),
        "loaded segmentation table"
    );

    Ok(outcome.dataset.into_shared())
}
