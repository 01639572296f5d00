//! Build-host description.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TargetError};

/// Architectures with 64-bit pointers, as named by `std::env::consts::ARCH`.
const WIDE_ARCHES: &[&str] = &[
    "x86_64",
    "aarch64",
    "powerpc64",
    "riscv64",
    "mips64",
    "s390x",
    "sparc64",
    "loongarch64",
];

/// The machine the pipeline runs on (and links the bootstrap program for).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HostPlatform {
    /// Operating system, as named by `std::env::consts::OS` (e.g., "linux", "macos").
    pub os: String,
    /// CPU architecture, as named by `std::env::consts::ARCH`.
    pub arch: String,
    /// Pointer width in bits.
    pub pointer_width: u32,
}

impl HostPlatform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>, pointer_width: u32) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
            pointer_width,
        }
    }

    /// Describe the machine this process runs on.
    pub fn current() -> Self {
        let pointer_width = if cfg!(target_pointer_width = "64") {
            64
        } else if cfg!(target_pointer_width = "16") {
            16
        } else {
            32
        };
        Self::new(std::env::consts::OS, std::env::consts::ARCH, pointer_width)
    }

    /// Parse `<os>-<arch>` (e.g., `macos-aarch64`); the pointer width follows the arch.
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = || TargetError::InvalidHost {
            spec: spec.to_string(),
        };
        let (os, arch) = spec.split_once('-').ok_or_else(invalid)?;
        if os.is_empty() || arch.is_empty() {
            return Err(invalid());
        }
        let pointer_width = if WIDE_ARCHES.contains(&arch) { 64 } else { 32 };
        Ok(Self::new(os, arch, pointer_width))
    }

    pub fn is_macos(&self) -> bool {
        self.os == "macos"
    }

    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} ({}-bit)", self.os, self.arch, self.pointer_width)
    }
}
