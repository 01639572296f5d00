//! Error types for the core model and header extraction.

use std::path::PathBuf;

/// Errors raised while extracting machine identifiers from a header.
#[derive(Debug, thiserror::Error)]
pub enum HeaderError {
    /// The header grammar was not recognized (or matched nothing).
    #[error("cannot parse {}: {reason}", path.display())]
    Parse {
        /// Header that was being parsed.
        path: PathBuf,
        /// Why parsing failed.
        reason: String,
    },

    /// The header could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by library descriptors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A configured library is absent or not recognizable by name.
    #[error("missing expected library {}: {reason}", path.display())]
    MissingLibrary {
        /// Configured library path.
        path: PathBuf,
        /// What the sanity check found.
        reason: String,
    },
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
