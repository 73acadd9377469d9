//! Common error types for PicVerdict
//!
//! **[PV-ERR-010]** Fatal, entry-level errors only. Per-extractor failures
//! are absorbed at the extractor boundary and never surface here.

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for PicVerdict operations
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal error kinds raised before or around an analysis run
#[derive(Error, Debug)]
pub enum Error {
    /// Image file does not exist
    #[error("Image file not found: {0}")]
    NotFound(PathBuf),

    /// File exists but does not decode as a raster image
    #[error("Invalid image file: {0}")]
    InvalidImage(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal engine error
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_are_distinguishable() {
        let not_found = Error::NotFound(PathBuf::from("/missing.jpg"));
        let invalid = Error::InvalidImage("not a raster image".to_string());

        assert!(matches!(not_found, Error::NotFound(_)));
        assert!(matches!(invalid, Error::InvalidImage(_)));
        assert!(not_found.to_string().contains("/missing.jpg"));
    }
}
