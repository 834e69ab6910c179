pub mod errors;
pub mod loader;
pub mod model;
pub mod schema;

pub use errors::LoadError;
pub use loader::{load_dataset, parse_dataset, read_dataset, LoadOutcome, LoadReport};
pub use model::{Dataset, Record, SharedDataset};
pub use schema::{ColumnKind, MetricField, CITY_COLUMN, CLUSTER_COLUMN, REQUIRED_COLUMNS};
