use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// A required input file is not on disk
    #[error("Missing source file: {}", .0.display())]
    MissingSource(PathBuf),
    /// IO operation failed
    #[error("IO error: {0}")]
    IoError(String),
    /// Failed to parse CSV/GeoJSON/TOML content
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Geometry conversion or encoding failed
    #[error("Geometry error: {0}")]
    GeometryError(String),
    /// Snapshot cache could not be read or written
    #[error("Cache error: {0}")]
    CacheError(String),
    /// Invalid input format
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Metric code outside the fixed set of map metrics
    #[error("Unknown metric '{metric}'. Available metrics: {available}")]
    UnknownMetric { metric: String, available: String },
    /// Tab name outside the fixed set of dashboard tabs
    #[error("Unknown tab '{0}'")]
    UnknownTab(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<polars::error::PolarsError> for AppError {
    fn from(err: polars::error::PolarsError) -> Self {
        AppError::ParseError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ParseError(err.to_string())
    }
}

impl From<geojson::Error> for AppError {
    fn from(err: geojson::Error) -> Self {
        AppError::GeometryError(err.to_string())
    }
}

impl From<geozero::error::GeozeroError> for AppError {
    fn from(err: geozero::error::GeozeroError) -> Self {
        AppError::GeometryError(err.to_string())
    }
}

// Custom type alias for Results in this application
pub type AppResult<T> = Result<T, AppError>;
