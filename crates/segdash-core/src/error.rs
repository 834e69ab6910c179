// crates/segdash-core/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewError {
    #[error("Data load failed: {0}")]
    Load(#[from] segdash_table::LoadError),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("CSV writing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Weighted average is undefined: total customer count is zero")]
    DivisionByZero,
}

pub type Result<T> = std::result::Result<T, ViewError>;
