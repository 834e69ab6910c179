pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod filters;
pub mod frames;
pub mod insights;
pub mod kpis;
pub mod narrative;
pub mod pivot;
pub mod profile;
pub mod segments;
pub mod stats;
pub mod view;

pub use config::{ConfigError, DashboardConfig};
pub use dataset::load_shared_dataset;
pub use error::{Result, ViewError};
pub use filters::{apply_filters, paginate_cities, CityPage, FilterState, Pagination};
pub use kpis::{compute_kpis, weighted_average_spend, Kpis};
pub use narrative::{load_narrative, Narrative};
pub use pivot::{pivot_city_cluster, Aggregation, PivotTable};
pub use profile::{normalize_city_profile, select_comparison, CityMetricTable};
pub use segments::{classify_strategy, segment_summary, SegmentSummary, StrategyTag};
pub use view::{derive_view, DerivedView};
