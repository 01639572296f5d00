//! Toolchain error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by external tool invocations.
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// The symbol lister is missing, was killed, or exited non-zero.
    #[error("{tool} failed: {message}")]
    ToolInvocation { tool: String, message: String },

    /// The temporary build directory could not be created.
    #[error("cannot create build directory in {}: {source}", dir.display())]
    WorkDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The generated C source did not compile.
    #[error("compiling {} failed: {diagnostics}", file.display())]
    Compile { file: PathBuf, diagnostics: String },

    /// The probe object did not link against the configured libraries.
    #[error("linking {} failed: {diagnostics}", executable.display())]
    Link {
        executable: PathBuf,
        diagnostics: String,
    },

    /// The probe executable failed to run or printed nothing.
    #[error("running {} failed: {message}", executable.display())]
    BootstrapRun { executable: PathBuf, message: String },
}

/// Result type alias for toolchain operations.
pub type Result<T> = std::result::Result<T, ToolchainError>;
