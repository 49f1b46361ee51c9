//! Error types for the export pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors that can occur while exporting a dashboard
#[derive(Error, Debug)]
pub enum ExportError {
    /// The dashboard snapshot could not be obtained
    #[error("Dashboard snapshot unavailable: {0}")]
    SnapshotUnavailable(String),

    /// The rendered document could not be written to disk
    #[error("Failed to save {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The element could not be turned into an image
    #[error("Rasterization failed: {0}")]
    Rasterization(String),

    /// The PDF could not be serialized
    #[error("PDF rendering failed: {0}")]
    Render(String),

    /// WebDriver session could not be created or driven
    #[error("WebDriver error: {0}")]
    WebDriver(String),

    /// A document query failed
    #[error("Document probe failed: {0}")]
    Probe(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<lopdf::Error> for ExportError {
    fn from(err: lopdf::Error) -> Self {
        ExportError::Render(err.to_string())
    }
}

impl From<image::ImageError> for ExportError {
    fn from(err: image::ImageError) -> Self {
        ExportError::Rasterization(err.to_string())
    }
}

impl From<fantoccini::error::CmdError> for ExportError {
    fn from(err: fantoccini::error::CmdError) -> Self {
        ExportError::Probe(err.to_string())
    }
}
