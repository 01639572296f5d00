//! Staged writes of generated files.
//!
//! Contents are written to a temporary file beside the target and only
//! renamed into place once every artifact of the run is staged. A target
//! whose bytes already match is left untouched.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bfdgen_codegen::RegistryRow;
use bfdgen_core::hash::digest_hex;
use bfdgen_core::ArchitectureEntry;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::PipelineError;

/// What a run did to one output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactStatus {
    Created,
    Updated,
    Unchanged,
}

impl fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
        })
    }
}

/// One written output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedArtifact {
    pub path: PathBuf,
    /// SHA-256 of the contents, hex.
    pub digest: String,
    pub status: ArtifactStatus,
}

/// The three outputs of a run and the entries they were generated from.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedArtifactSet {
    pub c_source: GeneratedArtifact,
    pub c_header: GeneratedArtifact,
    pub registry: GeneratedArtifact,
    /// Every candidate, supported or not, in header order.
    pub entries: Vec<ArchitectureEntry>,
    /// The rows printed by the probe program.
    pub rows: Vec<RegistryRow>,
}

impl GeneratedArtifactSet {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &GeneratedArtifact)> {
        [
            ("c-source", &self.c_source),
            ("c-header", &self.c_header),
            ("registry", &self.registry),
        ]
        .into_iter()
    }
}

/// Contents waiting to be renamed over their target.
pub(crate) struct StagedArtifact {
    path: PathBuf,
    digest: String,
    status: ArtifactStatus,
    temp: Option<NamedTempFile>,
}

impl StagedArtifact {
    pub(crate) fn status(&self) -> ArtifactStatus {
        self.status
    }

    /// Move the staged contents into place.
    pub(crate) fn persist(self) -> Result<GeneratedArtifact, PipelineError> {
        if let Some(temp) = self.temp {
            temp.persist(&self.path)
                .map_err(|e| PipelineError::Io {
                    path: self.path.clone(),
                    source: e.error,
                })?;
            log::debug!("wrote {}", self.path.display());
        }
        Ok(GeneratedArtifact {
            path: self.path,
            digest: self.digest,
            status: self.status,
        })
    }
}

/// Write `contents` to a temporary file next to `path`, unless `path` already holds them.
pub(crate) fn stage(path: &Path, contents: &str) -> Result<StagedArtifact, PipelineError> {
    let digest = digest_hex(contents.as_bytes());
    let status = match fs::read(path) {
        Ok(existing) if existing == contents.as_bytes() => ArtifactStatus::Unchanged,
        Ok(_) => ArtifactStatus::Updated,
        Err(e) if e.kind() == io::ErrorKind::NotFound => ArtifactStatus::Created,
        Err(e) => return Err(PipelineError::Io { path: path.to_path_buf(), source: e }),
    };
    if status == ArtifactStatus::Unchanged {
        return Ok(StagedArtifact {
            path: path.to_path_buf(),
            digest,
            status,
            temp: None,
        });
    }

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(PipelineError::io(dir))?;
    let mut temp = NamedTempFile::new_in(dir).map_err(PipelineError::io(dir))?;
    temp.write_all(contents.as_bytes())
        .and_then(|()| temp.flush())
        .map_err(PipelineError::io(temp.path()))?;

    Ok(StagedArtifact {
        path: path.to_path_buf(),
        digest,
        status,
        temp: Some(temp),
    })
}
