//! Generation report aggregating all pipeline stages.

use std::fmt;

use bfdgen_codegen::RegistryRow;
use bfdgen_targets::PlatformPolicy;
use serde::Serialize;

use crate::artifacts::GeneratedArtifact;

/// Summary of a successful pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    /// Build host description.
    pub host: String,
    /// Linking policy applied.
    pub policy: PlatformPolicy,
    /// Machine identifiers found in the header.
    pub candidates: usize,
    /// Architectures confirmed by the probe program, in table order.
    pub supported: Vec<RegistryRow>,
    /// Total pipeline duration in milliseconds.
    pub duration_ms: u64,
    /// Written files as `(kind, artifact)`.
    pub artifacts: Vec<(String, GeneratedArtifact)>,
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Generation Report ===")?;
        writeln!(f, "Host: {}", self.host)?;
        writeln!(f, "Duration: {} ms", self.duration_ms)?;
        writeln!(
            f,
            "Architectures: {} supported of {} candidates",
            self.supported.len(),
            self.candidates
        )?;

        if !self.artifacts.is_empty() {
            writeln!(f)?;
            writeln!(f, "--- Artifacts ---")?;
            for (kind, artifact) in &self.artifacts {
                writeln!(
                    f,
                    "  {kind:<9} {} ({}, sha256 {})",
                    artifact.path.display(),
                    artifact.status,
                    short_digest(&artifact.digest),
                )?;
            }
        }

        writeln!(f)?;
        writeln!(f, "--- Supported architectures ---")?;
        for row in &self.supported {
            writeln!(f, "{:<20} : {}", row.bfd_name, row.comment)?;
        }
        Ok(())
    }
}

fn short_digest(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}
