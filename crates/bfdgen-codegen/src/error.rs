//! Codegen error types.

/// Errors that can occur while reading bootstrap output.
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// A bootstrap output line is not `name<TAB>value<TAB>comment`.
    #[error("malformed bootstrap row {line_number}: {line:?}")]
    MalformedRow { line_number: usize, line: String },
}

/// Result type alias for codegen operations.
pub type Result<T> = std::result::Result<T, CodegenError>;
