use std::path::PathBuf;
use thiserror::Error;

use super::worker_status::WorkerStatus;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Could not read result file {0:?}: {1}")]
    FileUnreadable(PathBuf, #[source] std::io::Error),
    #[error("Table section not found between '{start}' and '{end}'")]
    SectionNotFound { start: String, end: String },
    #[error("Row has {found} columns; header has {expected}")]
    ColumnCount { expected: usize, found: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Config has an inverted range for {name}: min {min} is greater than max {max}")]
    InvertedRange { name: String, min: f64, max: f64 },
    #[error("Config does not list any analysis gases")]
    NoAnalysisGases,
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("ReportWriter failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("ReportWriter failed to convert to yaml: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("ReportWriter failed to write a table: {0}")]
    TableError(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor could not read the master directory {0:?}: {1}")]
    BadMasterPath(PathBuf, #[source] std::io::Error),
    #[error("Processor failed due to ReportWriter error: {0}")]
    ReportError(#[from] ReportError),
    #[error("Processor failed due to Send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<WorkerStatus>),
    #[error("Processor failed due to IO error: {0}")]
    IoError(#[from] std::io::Error),
}
