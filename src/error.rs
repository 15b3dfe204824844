//! Structured error types for the export pipeline.
//!
//! One variant per pipeline stage that can fail, plus input parsing and I/O
//! for the CLI. Measurement failures are normally recovered by the export
//! entry point; rasterization and assembly failures are fatal for the call.

use thiserror::Error;

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// The unified error type returned by all public API functions.
#[derive(Debug, Error)]
pub enum ExportError {
    /// JSON input failed to parse as a valid document.
    #[error("failed to parse document: {source}{hint}")]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// The root element is absent or has not been laid out.
    #[error("measurement failed: {0}")]
    Measurement(String),

    /// The rasterizer rejected the tree (unsupported resource, size limit).
    #[error("rasterization failed: {0}")]
    Rasterization(String),

    /// Malformed raster dimensions or an unknown page geometry.
    #[error("assembly failed: {0}")]
    Assembly(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "\n  hint: check for trailing commas, missing quotes, or unescaped characters"
            }
            serde_json::error::Category::Data => {
                "\n  hint: the JSON is valid but doesn't match the document schema; check field names and types"
            }
            serde_json::error::Category::Eof => "\n  hint: unexpected end of input, is the JSON truncated?",
            serde_json::error::Category::Io => "",
        };
        ExportError::Parse {
            source: e,
            hint: hint.to_string(),
        }
    }
}
