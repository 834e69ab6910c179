use std::fmt;

use serde::Serialize;

pub const CITY_COLUMN: &str = "CustLocation";
pub const CLUSTER_COLUMN: &str = "Cluster";

pub const REQUIRED_COLUMNS: [&str; 8] = [
    CITY_COLUMN,
    CLUSTER_COLUMN,
    "CustomerCount",
    "AvgAge",
    "AvgRecency",
    "AvgFrequency",
    "AvgAvgMonetary",
    "AvgTotalMonetary",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum MetricField {
    CustomerCount,
    AvgAge,
    AvgRecency,
    AvgFrequency,
    AvgAvgMonetary,
    AvgTotalMonetary,
}

impl MetricField {
    pub const ALL: [MetricField; 6] = [
        MetricField::CustomerCount,
        MetricField::AvgAge,
        MetricField::AvgRecency,
        MetricField::AvgFrequency,
        MetricField::AvgAvgMonetary,
        MetricField::AvgTotalMonetary,
    ];

    pub const AVERAGES: [MetricField; 5] = [
        MetricField::AvgAge,
        MetricField::AvgRecency,
        MetricField::AvgFrequency,
        MetricField::AvgAvgMonetary,
        MetricField::AvgTotalMonetary,
    ];

    pub fn column_name(&self) -> &'static str {
        match self {
            MetricField::CustomerCount => "CustomerCount",
            MetricField::AvgAge => "AvgAge",
            MetricField::AvgRecency => "AvgRecency",
            MetricField::AvgFrequency => "AvgFrequency",
            MetricField::AvgAvgMonetary => "AvgAvgMonetary",
            MetricField::AvgTotalMonetary => "AvgTotalMonetary",
        }
    }

    pub fn from_column(name: &str) -> Option<Self> {
        MetricField::ALL
            .into_iter()
            .find(|field| field.column_name() == name)
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    City,
    Cluster,
    Metric(MetricField),
    /// Index into `Record::extras`.
    Extra(usize),
}

impl ColumnKind {
    pub(crate) fn for_required(name: &str) -> Option<Self> {
        match name {
            CITY_COLUMN => Some(ColumnKind::City),
            CLUSTER_COLUMN => Some(ColumnKind::Cluster),
            other => MetricField::from_column(other).map(ColumnKind::Metric),
        }
    }
}
