//! Layered configuration.
//!
//! Each value is taken from the first layer that sets it: command-line
//! flags, environment variables, `bfdgen.toml`, built-in defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bfdgen_core::{HeaderGrammar, PrefixConvention};
use bfdgen_pipeline::{LibraryPaths, OutputPaths, PipelineConfig, ToolPaths};
use bfdgen_targets::HostPlatform;
use clap::Args;

use crate::manifest::BfdgenManifest;

pub const ENV_NM: &str = "NM";
pub const ENV_CC: &str = "CC";
pub const ENV_BFD_INCLUDE_DIR: &str = "LIBBFD_INCLUDE_DIR";
pub const ENV_BFD_LIBRARY: &str = "LIBBFD_LIBRARY";
pub const ENV_OPCODES_INCLUDE_DIR: &str = "LIBOPCODES_INCLUDE_DIR";
pub const ENV_OPCODES_LIBRARY: &str = "LIBOPCODES_LIBRARY";
pub const ENV_IBERTY_LIBRARY: &str = "LIBIBERTY_LIBRARY";

/// Every environment variable consulted, in documentation order.
pub const ENV_VARS: &[&str] = &[
    ENV_NM,
    ENV_CC,
    ENV_BFD_INCLUDE_DIR,
    ENV_BFD_LIBRARY,
    ENV_OPCODES_INCLUDE_DIR,
    ENV_OPCODES_LIBRARY,
    ENV_IBERTY_LIBRARY,
];

const DEFAULT_INCLUDE_DIR: &str = "/usr/include";
const DEFAULT_BFD_LIBRARY: &str = "/usr/lib/libbfd.so";
const DEFAULT_OPCODES_LIBRARY: &str = "/usr/lib/libopcodes.so";
const DEFAULT_IBERTY_LIBRARY: &str = "/usr/lib/libiberty.a";

/// Flags shared by every subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct Overrides {
    /// Symbol listing tool [env: NM]
    #[arg(long, global = true, value_name = "PATH")]
    pub nm: Option<PathBuf>,
    /// C compiler and linker driver [env: CC]
    #[arg(long, global = true, value_name = "PATH")]
    pub cc: Option<PathBuf>,
    /// Header declaring the machine identifiers (default: <LIBBFD_INCLUDE_DIR>/bfd.h)
    #[arg(long, global = true, value_name = "PATH")]
    pub header: Option<PathBuf>,
    /// libbfd shared object or archive [env: LIBBFD_LIBRARY]
    #[arg(long, global = true, value_name = "PATH")]
    pub bfd_library: Option<PathBuf>,
    /// libopcodes shared object or archive [env: LIBOPCODES_LIBRARY]
    #[arg(long, global = true, value_name = "PATH")]
    pub opcodes_library: Option<PathBuf>,
    /// libiberty archive [env: LIBIBERTY_LIBRARY]
    #[arg(long, global = true, value_name = "PATH")]
    pub iberty_library: Option<PathBuf>,
    /// Additional include directory for the probe compile (repeatable)
    #[arg(short = 'I', long = "include-dir", global = true, value_name = "DIR")]
    pub include_dirs: Vec<PathBuf>,
    /// Directory receiving the generated files
    #[arg(long, global = true, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
    /// Build host as <os>-<arch> (default: this machine)
    #[arg(long, global = true, value_name = "HOST")]
    pub host: Option<String>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub host: HostPlatform,
    pub tools: ToolPaths,
    pub header: PathBuf,
    pub grammar: HeaderGrammar,
    pub convention: PrefixConvention,
    pub libraries: LibraryPaths,
    pub include_dirs: Vec<PathBuf>,
    pub c_includes: Vec<String>,
    pub outputs: OutputPaths,
    pub work_dir: PathBuf,
    /// Directory holding the `bfdgen.toml` that contributed, if any.
    pub manifest_dir: Option<PathBuf>,
}

impl Settings {
    /// Resolve settings for a project rooted at `project_dir`.
    ///
    /// `env` looks up environment variables; empty values count as unset.
    pub fn resolve(
        overrides: &Overrides,
        manifest: Option<(BfdgenManifest, PathBuf)>,
        project_dir: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let (manifest, manifest_dir) = match manifest {
            Some((manifest, dir)) => (manifest.anchor(&dir), Some(dir)),
            None => (BfdgenManifest::default(), None),
        };
        let env_path = |name: &str| env(name).filter(|v| !v.is_empty()).map(PathBuf::from);

        let tools = ToolPaths {
            nm: layer(overrides.nm.clone(), env_path(ENV_NM), manifest.toolchain.nm, || "nm".into()),
            cc: layer(overrides.cc.clone(), env_path(ENV_CC), manifest.toolchain.cc, || "cc".into()),
        };

        let bfd_include = layer(
            None,
            env_path(ENV_BFD_INCLUDE_DIR),
            manifest.libraries.bfd_include_dir,
            || DEFAULT_INCLUDE_DIR.into(),
        );
        let opcodes_include = layer(
            None,
            env_path(ENV_OPCODES_INCLUDE_DIR),
            manifest.libraries.opcodes_include_dir,
            || DEFAULT_INCLUDE_DIR.into(),
        );
        let header = layer(
            overrides.header.clone(),
            env_path(ENV_BFD_INCLUDE_DIR).map(|dir| dir.join("bfd.h")),
            manifest.header.path,
            || bfd_include.join("bfd.h"),
        );

        let mut include_dirs = Vec::new();
        for dir in overrides.include_dirs.iter().cloned().chain([bfd_include, opcodes_include]) {
            if !include_dirs.contains(&dir) {
                include_dirs.push(dir);
            }
        }

        let libraries = LibraryPaths {
            bfd: layer(
                overrides.bfd_library.clone(),
                env_path(ENV_BFD_LIBRARY),
                manifest.libraries.bfd,
                || DEFAULT_BFD_LIBRARY.into(),
            ),
            opcodes: layer(
                overrides.opcodes_library.clone(),
                env_path(ENV_OPCODES_LIBRARY),
                manifest.libraries.opcodes,
                || DEFAULT_OPCODES_LIBRARY.into(),
            ),
            iberty: Some(layer(
                overrides.iberty_library.clone(),
                env_path(ENV_IBERTY_LIBRARY),
                manifest.libraries.iberty,
                || DEFAULT_IBERTY_LIBRARY.into(),
            )),
        };

        let host = match overrides.host.as_deref().or(manifest.toolchain.host.as_deref()) {
            Some(spec) => HostPlatform::parse(spec).with_context(|| format!("resolving host '{spec}'"))?,
            None => HostPlatform::current(),
        };

        let binutils = HeaderGrammar::binutils();
        let grammar = HeaderGrammar {
            prefix: manifest.header.prefix.unwrap_or(binutils.prefix),
            exclude: manifest.header.exclude.unwrap_or(binutils.exclude),
        };
        let c_includes = manifest
            .header
            .includes
            .unwrap_or_else(|| vec!["bfd.h".to_string()]);

        let (outputs, work_dir) = match &overrides.out_dir {
            Some(dir) => (OutputPaths::in_dir(dir), dir.join("build")),
            None => {
                let dir = manifest
                    .output
                    .dir
                    .unwrap_or_else(|| project_dir.join("generated"));
                let defaults = OutputPaths::in_dir(&dir);
                let outputs = OutputPaths {
                    c_source: manifest.output.c_source.unwrap_or(defaults.c_source),
                    c_header: manifest.output.c_header.unwrap_or(defaults.c_header),
                    registry: manifest.output.registry.unwrap_or(defaults.registry),
                };
                let work_dir = manifest.output.work_dir.unwrap_or_else(|| dir.join("build"));
                (outputs, work_dir)
            }
        };

        Ok(Self {
            host,
            tools,
            header,
            grammar,
            convention: manifest.convention.unwrap_or_default(),
            libraries,
            include_dirs,
            c_includes,
            outputs,
            work_dir,
            manifest_dir,
        })
    }

    /// Load `bfdgen.toml` from `cwd` or an ancestor and resolve against the process environment.
    pub fn load(overrides: &Overrides, cwd: &Path) -> Result<Self> {
        let manifest = BfdgenManifest::find_and_load(cwd)?;
        let project_dir = manifest
            .as_ref()
            .map(|(_, dir)| dir.clone())
            .unwrap_or_else(|| cwd.to_path_buf());
        Self::resolve(overrides, manifest, &project_dir, |name| std::env::var(name).ok())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            host: self.host.clone(),
            header: self.header.clone(),
            grammar: self.grammar.clone(),
            convention: Box::new(self.convention.clone()),
            libraries: self.libraries.clone(),
            include_dirs: self.include_dirs.clone(),
            c_includes: self.c_includes.clone(),
            tools: self.tools.clone(),
            outputs: self.outputs.clone(),
            work_dir: self.work_dir.clone(),
        }
    }
}

fn layer<T>(flag: Option<T>, env: Option<T>, manifest: Option<T>, default: impl FnOnce() -> T) -> T {
    flag.or(env).or(manifest).unwrap_or_else(default)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    fn linux() -> Overrides {
        Overrides {
            host: Some("linux-x86_64".into()),
            ..Overrides::default()
        }
    }

    #[test]
    fn defaults_match_system_binutils() {
        let settings = Settings::resolve(&linux(), None, Path::new("/work"), env_of(&[])).unwrap();
        assert_eq!(settings.tools.nm, Path::new("nm"));
        assert_eq!(settings.tools.cc, Path::new("cc"));
        assert_eq!(settings.header, Path::new("/usr/include/bfd.h"));
        assert_eq!(settings.include_dirs, [PathBuf::from("/usr/include")]);
        assert_eq!(settings.libraries.bfd, Path::new("/usr/lib/libbfd.so"));
        assert_eq!(settings.libraries.opcodes, Path::new("/usr/lib/libopcodes.so"));
        assert_eq!(settings.libraries.iberty.as_deref(), Some(Path::new("/usr/lib/libiberty.a")));
        assert_eq!(settings.grammar, HeaderGrammar::binutils());
        assert_eq!(settings.convention, PrefixConvention::binutils());
        assert_eq!(settings.c_includes, ["bfd.h"]);
        assert_eq!(settings.outputs.c_header, Path::new("/work/generated/supported_disasm.h"));
        assert_eq!(settings.work_dir, Path::new("/work/generated/build"));
        assert!(settings.manifest_dir.is_none());
    }

    #[test]
    fn environment_overrides_defaults() {
        let env = env_of(&[
            ("NM", "/opt/bin/nm"),
            ("LIBBFD_INCLUDE_DIR", "/opt/include"),
            ("LIBOPCODES_INCLUDE_DIR", "/opt/opcodes/include"),
            ("LIBOPCODES_LIBRARY", "/opt/lib/libopcodes.a"),
            ("CC", ""),
        ]);
        let settings = Settings::resolve(&linux(), None, Path::new("/work"), env).unwrap();
        assert_eq!(settings.tools.nm, Path::new("/opt/bin/nm"));
        assert_eq!(settings.tools.cc, Path::new("cc"));
        assert_eq!(settings.header, Path::new("/opt/include/bfd.h"));
        assert_eq!(
            settings.include_dirs,
            [PathBuf::from("/opt/include"), PathBuf::from("/opt/opcodes/include")]
        );
        assert_eq!(settings.libraries.opcodes, Path::new("/opt/lib/libopcodes.a"));
    }

    #[test]
    fn flags_beat_environment_beats_manifest() {
        let manifest = BfdgenManifest::from_str(
            "[toolchain]\nnm = \"tools/nm\"\ncc = \"clang\"\n[libraries]\nbfd = \"lib/libbfd.so\"\nopcodes = \"lib/libopcodes.so\"\n",
        )
        .unwrap();
        let overrides = Overrides {
            nm: Some("flag-nm".into()),
            ..linux()
        };
        let env = env_of(&[("CC", "gcc-13")]);
        let settings = Settings::resolve(
            &overrides,
            Some((manifest, PathBuf::from("/project"))),
            Path::new("/project"),
            env,
        )
        .unwrap();
        assert_eq!(settings.tools.nm, Path::new("flag-nm"));
        assert_eq!(settings.tools.cc, Path::new("gcc-13"));
        assert_eq!(settings.libraries.bfd, Path::new("/project/lib/libbfd.so"));
        assert_eq!(settings.manifest_dir.as_deref(), Some(Path::new("/project")));
    }

    #[test]
    fn manifest_sections_apply() {
        let manifest = BfdgenManifest::from_str(
            r#"
[toolchain]
host = "macos-aarch64"

[header]
path = "include/elf.h"
prefix = "EM_"
exclude = []
includes = ["elf.h"]

[convention]
machine-prefix = "EM_"
hook-prefix = "disasm_"
endian-variants = false

[output]
dir = "out"
registry = "src/supported_archs.rs"
"#,
        )
        .unwrap();
        let settings = Settings::resolve(
            &Overrides::default(),
            Some((manifest, PathBuf::from("/p"))),
            Path::new("/p"),
            env_of(&[]),
        )
        .unwrap();
        assert!(settings.host.is_macos());
        assert_eq!(settings.header, Path::new("/p/include/elf.h"));
        assert_eq!(settings.grammar, HeaderGrammar::new("EM_"));
        assert_eq!(settings.convention, PrefixConvention::new("EM_", "disasm_"));
        assert_eq!(settings.c_includes, ["elf.h"]);
        assert_eq!(settings.outputs.c_header, Path::new("/p/out/supported_disasm.h"));
        assert_eq!(settings.outputs.registry, Path::new("/p/src/supported_archs.rs"));
        assert_eq!(settings.work_dir, Path::new("/p/out/build"));
    }

    #[test]
    fn out_dir_flag_replaces_manifest_outputs() {
        let manifest = BfdgenManifest::from_str("[output]\nregistry = \"src/archs.rs\"\n").unwrap();
        let overrides = Overrides {
            out_dir: Some("/tmp/gen".into()),
            ..linux()
        };
        let settings = Settings::resolve(
            &overrides,
            Some((manifest, PathBuf::from("/p"))),
            Path::new("/p"),
            env_of(&[]),
        )
        .unwrap();
        assert_eq!(settings.outputs, OutputPaths::in_dir("/tmp/gen"));
        assert_eq!(settings.work_dir, Path::new("/tmp/gen/build"));
    }

    #[test]
    fn include_flags_come_first() {
        let overrides = Overrides {
            include_dirs: vec!["/opt/extra".into(), "/usr/include".into()],
            ..linux()
        };
        let settings = Settings::resolve(&overrides, None, Path::new("/w"), env_of(&[])).unwrap();
        assert_eq!(
            settings.include_dirs,
            [PathBuf::from("/opt/extra"), PathBuf::from("/usr/include")]
        );
    }

    #[test]
    fn bad_host_rejected() {
        let overrides = Overrides {
            host: Some("nonsense".into()),
            ..Overrides::default()
        };
        let err = Settings::resolve(&overrides, None, Path::new("/w"), env_of(&[])).unwrap_err();
        assert!(format!("{err:#}").contains("resolving host 'nonsense'"));
    }

    #[test]
    fn pipeline_config_carries_settings() {
        let settings = Settings::resolve(&linux(), None, Path::new("/w"), env_of(&[])).unwrap();
        let config = settings.pipeline_config();
        assert_eq!(config.header, settings.header);
        assert_eq!(config.outputs, settings.outputs);
        assert_eq!(config.work_dir, settings.work_dir);
    }
}
