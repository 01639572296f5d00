//! `bfdgen.toml` manifest parsing.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bfdgen_core::PrefixConvention;
use serde::{Deserialize, Serialize};

pub const MANIFEST_FILE: &str = "bfdgen.toml";

/// The top-level manifest. Every section and key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BfdgenManifest {
    pub toolchain: ToolchainSection,
    pub libraries: LibrariesSection,
    pub header: HeaderSection,
    /// Hook symbol naming; defaults to the binutils convention.
    pub convention: Option<PrefixConvention>,
    pub output: OutputSection,
}

/// External programs and the build host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ToolchainSection {
    pub nm: Option<PathBuf>,
    pub cc: Option<PathBuf>,
    /// Host override, `<os>-<arch>` (e.g. `macos-aarch64`).
    pub host: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LibrariesSection {
    pub bfd: Option<PathBuf>,
    pub opcodes: Option<PathBuf>,
    pub iberty: Option<PathBuf>,
    pub bfd_include_dir: Option<PathBuf>,
    pub opcodes_include_dir: Option<PathBuf>,
}

/// Where machine identifiers come from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HeaderSection {
    /// Defaults to `<bfd-include-dir>/bfd.h`.
    pub path: Option<PathBuf>,
    pub prefix: Option<String>,
    pub exclude: Option<Vec<String>>,
    /// Headers included by the probe program.
    pub includes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputSection {
    pub dir: Option<PathBuf>,
    pub c_source: Option<PathBuf>,
    pub c_header: Option<PathBuf>,
    pub registry: Option<PathBuf>,
    pub work_dir: Option<PathBuf>,
}

impl BfdgenManifest {
    /// Search upward from `start_dir` for a `bfdgen.toml` file, parse and return it
    /// along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest = Self::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Parse a manifest from a TOML string.
    pub fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Make every relative path in the manifest relative to `base`.
    pub fn anchor(mut self, base: &Path) -> Self {
        let anchor = |path: &mut Option<PathBuf>| {
            if let Some(p) = path.as_mut() {
                if p.is_relative() {
                    *p = base.join(&*p);
                }
            }
        };
        // bare program names are looked up on PATH
        for tool in [&mut self.toolchain.nm, &mut self.toolchain.cc] {
            if tool.as_ref().is_some_and(|p| p.components().count() > 1) {
                anchor(tool);
            }
        }
        anchor(&mut self.libraries.bfd);
        anchor(&mut self.libraries.opcodes);
        anchor(&mut self.libraries.iberty);
        anchor(&mut self.libraries.bfd_include_dir);
        anchor(&mut self.libraries.opcodes_include_dir);
        anchor(&mut self.header.path);
        anchor(&mut self.output.dir);
        anchor(&mut self.output.c_source);
        anchor(&mut self.output.c_header);
        anchor(&mut self.output.registry);
        anchor(&mut self.output.work_dir);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_manifest() {
        let toml_str = r#"
[toolchain]
nm = "/opt/binutils/bin/nm"
cc = "clang"
host = "macos-aarch64"

[libraries]
bfd = "/opt/binutils/lib/libbfd.a"
opcodes = "/opt/binutils/lib/libopcodes.a"
iberty = "/opt/binutils/lib/libiberty.a"
bfd-include-dir = "/opt/binutils/include"

[header]
exclude = ["bfd_arch_last", "bfd_arch_unknown"]
includes = ["bfd.h", "dis-asm.h"]

[convention]
hook-prefix = "print_insn_"
overrides = { i386 = ["print_insn_i386_att"] }

[output]
dir = "generated"
"#;
        let manifest = BfdgenManifest::from_str(toml_str).unwrap();
        assert_eq!(manifest.toolchain.cc.as_deref(), Some(Path::new("clang")));
        assert_eq!(manifest.toolchain.host.as_deref(), Some("macos-aarch64"));
        assert_eq!(manifest.libraries.opcodes_include_dir, None);
        assert_eq!(manifest.header.exclude.as_ref().unwrap().len(), 2);

        let convention = manifest.convention.unwrap();
        assert_eq!(convention.machine_prefix, "bfd_arch_");
        assert!(convention.endian_variants);
        assert_eq!(convention.overrides["i386"], ["print_insn_i386_att"]);
    }

    #[test]
    fn parse_empty_manifest() {
        let manifest = BfdgenManifest::from_str("").unwrap();
        assert!(manifest.toolchain.nm.is_none());
        assert!(manifest.convention.is_none());
    }

    #[test]
    fn mistyped_value_rejected() {
        assert!(BfdgenManifest::from_str("[toolchain]\nnm = 3\n").is_err());
    }

    #[test]
    fn find_and_load_walks_upward() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "[toolchain]\ncc = \"gcc\"\n").unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let (manifest, found) = BfdgenManifest::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(found, dir.path());
        assert_eq!(manifest.toolchain.cc.as_deref(), Some(Path::new("gcc")));
    }

    #[test]
    fn find_and_load_none_without_manifest() {
        let dir = tempfile::tempdir().unwrap();
        assert!(BfdgenManifest::find_and_load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn anchor_resolves_relative_paths() {
        let manifest = BfdgenManifest::from_str(
            "[libraries]\nbfd = \"lib/libbfd.so\"\nopcodes = \"/usr/lib/libopcodes.so\"\n[output]\ndir = \"gen\"\n",
        )
        .unwrap()
        .anchor(Path::new("/project"));
        assert_eq!(manifest.libraries.bfd.as_deref(), Some(Path::new("/project/lib/libbfd.so")));
        assert_eq!(manifest.libraries.opcodes.as_deref(), Some(Path::new("/usr/lib/libopcodes.so")));
        assert_eq!(manifest.output.dir.as_deref(), Some(Path::new("/project/gen")));
    }

    #[test]
    fn anchor_leaves_bare_tool_names() {
        let manifest = BfdgenManifest::from_str("[toolchain]\nnm = \"bin/nm\"\ncc = \"clang\"\n")
            .unwrap()
            .anchor(Path::new("/project"));
        assert_eq!(manifest.toolchain.nm.as_deref(), Some(Path::new("/project/bin/nm")));
        assert_eq!(manifest.toolchain.cc.as_deref(), Some(Path::new("clang")));
    }
}
