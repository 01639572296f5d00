//! Pipeline configuration.

use std::fmt;
use std::path::PathBuf;

use bfdgen_core::{HeaderGrammar, PrefixConvention, SymbolConvention};
use bfdgen_targets::HostPlatform;

/// Configured library files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryPaths {
    pub bfd: PathBuf,
    pub opcodes: PathBuf,
    /// Auxiliary static archive, needed when linking statically and on some hosts.
    pub iberty: Option<PathBuf>,
}

/// External programs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub nm: PathBuf,
    pub cc: PathBuf,
}

/// Where the generated files go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// Probe program; consumed by the bootstrap step.
    pub c_source: PathBuf,
    /// Supported-architecture header for extension builds.
    pub c_header: PathBuf,
    /// Registry data module for the binding layer.
    pub registry: PathBuf,
}

impl OutputPaths {
    /// Conventional file names inside `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            c_source: dir.join("bfdgen_probe.c"),
            c_header: dir.join("supported_disasm.h"),
            registry: dir.join("supported_archs.rs"),
        }
    }
}

/// Configuration for one pipeline run.
pub struct PipelineConfig {
    /// Build host; selects the platform linking policy.
    pub host: HostPlatform,
    /// Header declaring the machine identifiers.
    pub header: PathBuf,
    pub grammar: HeaderGrammar,
    /// Maps machine identifiers to disassembler hook symbols.
    pub convention: Box<dyn SymbolConvention>,
    pub libraries: LibraryPaths,
    /// `-I` directories for the probe compile.
    pub include_dirs: Vec<PathBuf>,
    /// Headers included by the probe program.
    pub c_includes: Vec<String>,
    pub tools: ToolPaths,
    pub outputs: OutputPaths,
    /// Directory receiving the probe object and executable.
    pub work_dir: PathBuf,
}

impl PipelineConfig {
    /// binutils defaults for a header at `header`, writing into `out_dir`.
    pub fn binutils(
        host: HostPlatform,
        header: impl Into<PathBuf>,
        libraries: LibraryPaths,
        out_dir: impl Into<PathBuf>,
    ) -> Self {
        let header = header.into();
        let out_dir = out_dir.into();
        let include_dirs = header
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(|dir| vec![dir.to_path_buf()])
            .unwrap_or_default();
        Self {
            host,
            header,
            grammar: HeaderGrammar::binutils(),
            convention: Box::new(PrefixConvention::binutils()),
            libraries,
            include_dirs,
            c_includes: vec!["bfd.h".to_string()],
            tools: ToolPaths {
                nm: PathBuf::from("nm"),
                cc: PathBuf::from("cc"),
            },
            outputs: OutputPaths::in_dir(&out_dir),
            work_dir: out_dir,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("host", &self.host)
            .field("header", &self.header)
            .field("grammar", &self.grammar)
            .field("libraries", &self.libraries)
            .field("include_dirs", &self.include_dirs)
            .field("c_includes", &self.c_includes)
            .field("tools", &self.tools)
            .field("outputs", &self.outputs)
            .field("work_dir", &self.work_dir)
            .finish_non_exhaustive()
    }
}
