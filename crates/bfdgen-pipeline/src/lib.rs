//! Generation orchestrator for bfdgen.
//!
//! [`generate`] threads the stages together in a fixed order:
//! policy -> libraries -> header -> probe -> generate -> bootstrap -> registry -> write.
//! Every stage fails fast; on failure no generated artifact is left half-written
//! and the bootstrap's intermediate files are removed.

pub mod artifacts;
pub mod config;
pub mod error;
pub mod libraries;
pub mod pipeline;
pub mod progress;
pub mod report;

pub use artifacts::{ArtifactStatus, GeneratedArtifact, GeneratedArtifactSet};
pub use config::{LibraryPaths, OutputPaths, PipelineConfig, ToolPaths};
pub use error::PipelineError;
pub use libraries::LibrarySet;
pub use pipeline::{discover, generate, Discovery, PipelineOutput};
pub use progress::{ProgressObserver, RecordingObserver, Silent, Stage};
pub use report::GenerationReport;
