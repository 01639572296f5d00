//! Error types for host platform operations.

/// Errors that can occur while describing the build host.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// A host description string could not be understood.
    #[error("invalid host '{spec}': expected <os>-<arch> (e.g., linux-x86_64)")]
    InvalidHost {
        /// The string that failed to parse.
        spec: String,
    },
}

/// Result type for target operations.
pub type Result<T> = std::result::Result<T, TargetError>;
