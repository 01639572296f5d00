//! Pipeline errors.

use std::path::PathBuf;

use bfdgen_codegen::CodegenError;
use bfdgen_core::{CoreError, HeaderError};
use bfdgen_toolchain::ToolchainError;
use thiserror::Error;

use crate::progress::Stage;

/// The terminal error of a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error(transparent)]
    Library(#[from] CoreError),

    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    #[error("bootstrap output unreadable: {0}")]
    Codegen(#[from] CodegenError),

    #[error("no supported architectures found in {}", library.display())]
    NoSupportedArchitectures { library: PathBuf },

    /// The probe program printed a table other than the one generated for it.
    #[error("bootstrap output does not match the generated table: {message}")]
    TableMismatch { message: String },

    /// Two architecture names map to the same C macro and Rust constant name.
    #[error("architectures '{first}' and '{second}' both map to macro name {macro_name}")]
    MacroNameCollision {
        macro_name: String,
        first: String,
        second: String,
    },

    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// The stage that failed.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Header(_) => Stage::Header,
            Self::Library(_) => Stage::Libraries,
            Self::Toolchain(ToolchainError::ToolInvocation { .. }) => Stage::Probe,
            Self::Toolchain(_) | Self::Codegen(_) => Stage::Bootstrap,
            Self::NoSupportedArchitectures { .. } => Stage::Probe,
            Self::TableMismatch { .. } => Stage::Bootstrap,
            Self::MacroNameCollision { .. } => Stage::Generate,
            Self::Io { .. } => Stage::Write,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
