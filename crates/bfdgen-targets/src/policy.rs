//! Platform-specific linking policy.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::host::HostPlatform;

/// gettext/libintl locations on macOS: Homebrew, then MacPorts.
const MACOS_INTL_DIRS: &[&str] = &["/usr/local/opt/gettext/lib", "/opt/local/lib"];

/// Extra link requirements of the build host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlatformPolicy {
    /// Additional libraries passed as `-l<name>`, in order.
    pub extra_libraries: Vec<String>,
    /// Candidate library directories, in order (see [`Self::existing_library_dirs`]).
    pub extra_library_dirs: Vec<PathBuf>,
    /// Whether a static libiberty must be linked even when libbfd/libopcodes are shared.
    pub requires_static_libiberty: bool,
    /// Flags passed to every compiler and linker invocation.
    pub compiler_flags: Vec<String>,
    /// Prefix the object format puts in front of C symbol names.
    pub symbol_prefix: String,
}

impl PlatformPolicy {
    /// Resolve the policy for `host`.
    pub fn resolve(host: &HostPlatform) -> Self {
        if host.is_macos() {
            let arch = match (host.pointer_width, host.arch.as_str()) {
                (64, "aarch64") => "arm64",
                (64, arch) => arch,
                _ => "i386",
            };
            return Self {
                extra_libraries: vec!["intl".into()],
                extra_library_dirs: MACOS_INTL_DIRS.iter().map(PathBuf::from).collect(),
                requires_static_libiberty: true,
                compiler_flags: vec!["-arch".into(), arch.into()],
                symbol_prefix: "_".into(),
            };
        }

        if host.is_windows() && host.pointer_width == 32 {
            return Self {
                symbol_prefix: "_".into(),
                ..Self::default()
            };
        }

        Self::default()
    }

    /// The candidate library directories that exist on this machine.
    pub fn existing_library_dirs(&self) -> Vec<PathBuf> {
        self.extra_library_dirs
            .iter()
            .filter(|dir| dir.is_dir())
            .cloned()
            .collect()
    }
}
