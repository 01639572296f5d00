//! Shared data model threading through every pipeline stage.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A toolkit-defined constant naming one CPU architecture, as declared in a header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineIdentifier {
    /// Constant name (e.g., `bfd_arch_i386`).
    pub name: String,
    /// Numeric value of the constant.
    pub value: i64,
    /// Descriptive comment attached to the declaration (may be empty).
    pub comment: String,
}

impl MachineIdentifier {
    pub fn new(name: impl Into<String>, value: i64, comment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            comment: comment.into(),
        }
    }
}

/// How a library file links: shared object or static archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LibraryKind {
    Shared,
    Static,
}

impl fmt::Display for LibraryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryKind::Shared => write!(f, "shared"),
            LibraryKind::Static => write!(f, "static"),
        }
    }
}

/// A configured library file and the way it links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryDescriptor {
    pub path: PathBuf,
    pub kind: LibraryKind,
}

impl LibraryDescriptor {
    /// Describe a library by suffix: `.a` is a static archive, anything else is shared.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = if path.extension().is_some_and(|ext| ext == "a") {
            LibraryKind::Static
        } else {
            LibraryKind::Shared
        };
        Self { path, kind }
    }

    pub fn is_static(&self) -> bool {
        self.kind == LibraryKind::Static
    }

    /// Base name of the library file.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Directory containing the library (empty for a bare file name).
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Name to hand the linker via `-l` (`libopcodes.so.2` -> `opcodes`).
    pub fn link_name(&self) -> Result<String> {
        let file = self.file_name();
        match strip_library_suffix(&file).strip_prefix("lib") {
            Some(name) if !name.is_empty() => Ok(name.to_string()),
            _ => Err(CoreError::MissingLibrary {
                path: self.path.clone(),
                reason: format!("'{file}' is not a lib-prefixed library name"),
            }),
        }
    }

    /// Sanity check: the file exists and is named `lib<expected>...`.
    pub fn check(&self, expected: &str) -> Result<()> {
        if !self.path.is_file() {
            return Err(CoreError::MissingLibrary {
                path: self.path.clone(),
                reason: "file does not exist".into(),
            });
        }
        let file = self.file_name();
        if !file.starts_with(&format!("lib{expected}")) {
            return Err(CoreError::MissingLibrary {
                path: self.path.clone(),
                reason: format!("expected a lib{expected} library, found '{file}'"),
            });
        }
        Ok(())
    }
}

fn strip_library_suffix(file: &str) -> &str {
    if let Some(stem) = file.strip_suffix(".a") {
        return stem;
    }
    if let Some(stem) = file
        .strip_suffix(".dylib")
        .or_else(|| file.strip_suffix(".dll"))
    {
        return stem;
    }
    // libfoo.so, libfoo.so.2, libfoo.so.2.38
    if let Some(pos) = file.rfind(".so") {
        let rest = &file[pos + 3..];
        if rest.is_empty() || rest.starts_with('.') {
            return &file[..pos];
        }
    }
    file
}

/// A candidate architecture after probing: the record every later stage consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectureEntry {
    pub machine: MachineIdentifier,
    /// Whether a disassembler hook for this machine is linked into the library.
    pub supported: bool,
    /// Canonical short name (e.g., `i386`).
    pub bfd_name: String,
}

impl ArchitectureEntry {
    pub fn new(machine: MachineIdentifier, bfd_name: impl Into<String>, supported: bool) -> Self {
        Self {
            machine,
            supported,
            bfd_name: bfd_name.into(),
        }
    }
}

/// The supported subset of `entries`, in order.
pub fn supported(entries: &[ArchitectureEntry]) -> Vec<&ArchitectureEntry> {
    entries.iter().filter(|e| e.supported).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_suffix() {
        assert_eq!(
            LibraryDescriptor::from_path("/usr/lib/libopcodes.a").kind,
            LibraryKind::Static
        );
        assert_eq!(
            LibraryDescriptor::from_path("/usr/lib/libopcodes.so").kind,
            LibraryKind::Shared
        );
        assert_eq!(
            LibraryDescriptor::from_path("/usr/lib/libbfd.so.2.38").kind,
            LibraryKind::Shared
        );
    }

    #[test]
    fn link_names() {
        let cases = [
            ("/usr/lib/libopcodes.so", "opcodes"),
            ("/usr/lib/libbfd.a", "bfd"),
            ("/usr/lib/libbfd.so.2", "bfd"),
            ("/usr/lib/libopcodes-2.38.so", "opcodes-2.38"),
            ("/opt/local/lib/libintl.dylib", "intl"),
        ];
        for (path, expected) in cases {
            assert_eq!(
                LibraryDescriptor::from_path(path).link_name().unwrap(),
                expected,
                "{path}"
            );
        }
    }

    #[test]
    fn link_name_requires_lib_prefix() {
        let err = LibraryDescriptor::from_path("/usr/lib/opcodes.so")
            .link_name()
            .unwrap_err();
        assert!(matches!(err, CoreError::MissingLibrary { .. }));
    }

    #[test]
    fn check_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let lib = LibraryDescriptor::from_path(dir.path().join("libbfd.so"));
        let err = lib.check("bfd").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn check_wrong_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("libz.so");
        std::fs::write(&path, b"").unwrap();
        let err = LibraryDescriptor::from_path(&path).check("opcodes").unwrap_err();
        assert!(err.to_string().contains("expected a libopcodes library"));
    }

    #[test]
    fn check_accepts_matching_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("libopcodes-2.42.so");
        std::fs::write(&path, b"").unwrap();
        assert!(LibraryDescriptor::from_path(&path).check("opcodes").is_ok());
    }

    #[test]
    fn supported_subset_keeps_order() {
        let entries = vec![
            ArchitectureEntry::new(MachineIdentifier::new("EM_386", 3, "Intel 386"), "386", true),
            ArchitectureEntry::new(MachineIdentifier::new("EM_ARM", 40, "ARM"), "arm", false),
            ArchitectureEntry::new(MachineIdentifier::new("EM_MIPS", 8, "MIPS"), "mips", true),
        ];
        let names: Vec<_> = supported(&entries).iter().map(|e| e.bfd_name.as_str()).collect();
        assert_eq!(names, ["386", "mips"]);
    }
}
