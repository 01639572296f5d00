//! Library descriptors and the link plan derived from them.

use std::path::PathBuf;

use bfdgen_core::{CoreError, LibraryDescriptor};
use bfdgen_targets::PlatformPolicy;
use bfdgen_toolchain::LinkPlan;

use crate::config::LibraryPaths;
use crate::error::PipelineError;

/// The checked libraries of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarySet {
    pub bfd: LibraryDescriptor,
    pub opcodes: LibraryDescriptor,
    pub iberty: Option<LibraryDescriptor>,
}

impl LibrarySet {
    /// Build descriptors from `paths` and sanity-check them.
    ///
    /// libiberty is required when either library is a static archive or the
    /// host policy demands it.
    pub fn resolve(paths: &LibraryPaths, policy: &PlatformPolicy) -> Result<Self, PipelineError> {
        let bfd = LibraryDescriptor::from_path(&paths.bfd);
        bfd.check("bfd")?;
        let opcodes = LibraryDescriptor::from_path(&paths.opcodes);
        opcodes.check("opcodes")?;

        let iberty = if bfd.is_static() || opcodes.is_static() || policy.requires_static_libiberty {
            let path = paths.iberty.clone().ok_or_else(|| CoreError::MissingLibrary {
                path: PathBuf::from("libiberty.a"),
                reason: "libiberty is required for this link but none is configured".into(),
            })?;
            let iberty = LibraryDescriptor::from_path(path);
            iberty.check("iberty")?;
            Some(iberty)
        } else {
            None
        };

        Ok(Self {
            bfd,
            opcodes,
            iberty,
        })
    }

    /// Link order: opcodes, bfd, iberty.
    pub fn iter(&self) -> impl Iterator<Item = &LibraryDescriptor> {
        [Some(&self.opcodes), Some(&self.bfd), self.iberty.as_ref()]
            .into_iter()
            .flatten()
    }

    /// Shared libraries become `-L`/`-l` pairs, static archives extra objects;
    /// the policy's libraries and existing directories follow.
    pub fn link_plan(&self, policy: &PlatformPolicy) -> Result<LinkPlan, PipelineError> {
        let mut plan = LinkPlan::default();
        for library in self.iter() {
            if library.is_static() {
                plan.archives.push(library.path.clone());
            } else {
                push_unique(&mut plan.library_dirs, library.dir().to_path_buf());
                plan.libraries.push(library.link_name()?);
            }
        }
        for dir in policy.existing_library_dirs() {
            push_unique(&mut plan.library_dirs, dir);
        }
        plan.libraries.extend(policy.extra_libraries.iter().cloned());
        Ok(plan)
    }
}

fn push_unique(dirs: &mut Vec<PathBuf>, dir: PathBuf) {
    if !dir.as_os_str().is_empty() && !dirs.contains(&dir) {
        dirs.push(dir);
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::TempDir;

    use super::*;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn shared_libraries_link_by_name() {
        let dir = TempDir::new().unwrap();
        let paths = LibraryPaths {
            bfd: touch(dir.path(), "libbfd.so"),
            opcodes: touch(dir.path(), "libopcodes.so.2"),
            iberty: None,
        };
        let set = LibrarySet::resolve(&paths, &PlatformPolicy::default()).unwrap();
        assert!(set.iberty.is_none());

        let plan = set.link_plan(&PlatformPolicy::default()).unwrap();
        assert_eq!(plan.libraries, ["opcodes", "bfd"]);
        assert_eq!(plan.library_dirs, [dir.path().to_path_buf()]);
        assert!(plan.archives.is_empty());
    }

    #[test]
    fn static_archives_require_libiberty() {
        let dir = TempDir::new().unwrap();
        let mut paths = LibraryPaths {
            bfd: touch(dir.path(), "libbfd.a"),
            opcodes: touch(dir.path(), "libopcodes.a"),
            iberty: None,
        };
        let err = LibrarySet::resolve(&paths, &PlatformPolicy::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Library(CoreError::MissingLibrary { .. })));

        paths.iberty = Some(touch(dir.path(), "libiberty.a"));
        let set = LibrarySet::resolve(&paths, &PlatformPolicy::default()).unwrap();
        let plan = set.link_plan(&PlatformPolicy::default()).unwrap();
        assert_eq!(
            plan.archives,
            [
                dir.path().join("libopcodes.a"),
                dir.path().join("libbfd.a"),
                dir.path().join("libiberty.a"),
            ]
        );
        assert!(plan.libraries.is_empty());
        assert!(plan.library_dirs.is_empty());
    }

    #[test]
    fn policy_libraries_appended() {
        let dir = TempDir::new().unwrap();
        let extra = dir.path().join("gettext");
        fs::create_dir(&extra).unwrap();
        let policy = PlatformPolicy {
            extra_libraries: vec!["intl".into()],
            extra_library_dirs: vec![extra.clone(), dir.path().join("absent")],
            requires_static_libiberty: true,
            ..PlatformPolicy::default()
        };
        let paths = LibraryPaths {
            bfd: touch(dir.path(), "libbfd.dylib"),
            opcodes: touch(dir.path(), "libopcodes.dylib"),
            iberty: Some(touch(dir.path(), "libiberty.a")),
        };
        let set = LibrarySet::resolve(&paths, &policy).unwrap();
        let plan = set.link_plan(&policy).unwrap();
        assert_eq!(plan.libraries, ["opcodes", "bfd", "intl"]);
        assert_eq!(plan.library_dirs, [dir.path().to_path_buf(), extra]);
        assert_eq!(plan.archives, [dir.path().join("libiberty.a")]);
    }

    #[test]
    fn misnamed_library_rejected() {
        let dir = TempDir::new().unwrap();
        let paths = LibraryPaths {
            bfd: touch(dir.path(), "libopcodes.so"),
            opcodes: touch(dir.path(), "libopcodes.so"),
            iberty: None,
        };
        let err = LibrarySet::resolve(&paths, &PlatformPolicy::default()).unwrap_err();
        assert!(err.to_string().contains("expected a libbfd library"));
    }
}
