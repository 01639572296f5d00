//! Bootstrap compile-and-run.
//!
//! The generated probe program is compiled, linked against the real
//! libraries, and executed once; its stdout is the verified architecture
//! table. Object and executable live in a private temporary directory under
//! the work directory, removed on every exit path.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::error::{Result, ToolchainError};
use crate::runner::{command_line, ToolRunner};

/// How the probe executable links against the target libraries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPlan {
    /// `-L` directories, in order.
    pub library_dirs: Vec<PathBuf>,
    /// `-l` names, in order.
    pub libraries: Vec<String>,
    /// Static archives passed as extra objects, in order.
    pub archives: Vec<PathBuf>,
}

impl LinkPlan {
    /// Linker arguments: archives first, then search dirs, then `-l` libraries.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.archives.iter().map(|a| a.clone().into()).collect();
        for dir in &self.library_dirs {
            let mut arg = OsString::from("-L");
            arg.push(dir);
            args.push(arg);
        }
        args.extend(self.libraries.iter().map(|lib| OsString::from(format!("-l{lib}"))));
        args
    }
}

/// Everything needed to build and run the probe program.
#[derive(Debug, Clone)]
pub struct BootstrapRequest<'a> {
    /// C compiler driver (also used as the linker).
    pub compiler: &'a OsStr,
    /// Flags passed to both compile and link.
    pub compiler_flags: &'a [String],
    /// Generated C translation unit.
    pub source: &'a Path,
    /// Directory holding the temporary build directory.
    pub work_dir: &'a Path,
    pub include_dirs: &'a [PathBuf],
    pub link: &'a LinkPlan,
}

/// Object and executable paths for `source` inside `work_dir`.
pub fn resolve_paths(work_dir: &Path, source: &Path) -> (PathBuf, PathBuf) {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bfdgen_probe".to_string());
    let object = work_dir.join(format!("{stem}.o"));
    let executable = work_dir.join(format!("{stem}{}", std::env::consts::EXE_SUFFIX));
    (object, executable)
}

/// Compile, link and run the probe; return its stdout.
pub fn compile_and_run(runner: &dyn ToolRunner, request: &BootstrapRequest<'_>) -> Result<String> {
    let build = tempfile::Builder::new()
        .prefix("bfdgen-")
        .tempdir_in(request.work_dir)
        .map_err(|source| ToolchainError::WorkDir {
            dir: request.work_dir.to_path_buf(),
            source,
        })?;
    let (object, executable) = resolve_paths(build.path(), request.source);

    let stdout = compile_object(runner, request, &object)
        .and_then(|()| link_executable(runner, request, &object, &executable))
        .and_then(|()| run_executable(runner, &executable));

    let dir = build.path().to_path_buf();
    match build.close() {
        Ok(()) => log::debug!("removed {}", dir.display()),
        Err(e) => log::warn!("could not remove {}: {e}", dir.display()),
    }
    stdout
}

/// Compile the translation unit: `cc <flags> -c <src> -o <obj> -I<dir>...`.
pub fn compile_object(
    runner: &dyn ToolRunner,
    request: &BootstrapRequest<'_>,
    object: &Path,
) -> Result<()> {
    let mut args: Vec<OsString> = request.compiler_flags.iter().map(OsString::from).collect();
    args.push("-c".into());
    args.push(request.source.into());
    args.push("-o".into());
    args.push(object.into());
    for dir in request.include_dirs {
        let mut arg = OsString::from("-I");
        arg.push(dir);
        args.push(arg);
    }

    let compile_failed = |diagnostics: String| ToolchainError::Compile {
        file: request.source.to_path_buf(),
        diagnostics,
    };
    let output = runner.run(request.compiler, &args).map_err(|e| {
        compile_failed(format!(
            "failed to invoke compiler ({}): {e}",
            command_line(request.compiler, &args)
        ))
    })?;
    if !output.success() {
        return Err(compile_failed(output.describe_failure()));
    }
    Ok(())
}

/// Link the object: `cc <flags> <obj> -o <exe> <archives> -L<dir>... -l<name>...`.
pub fn link_executable(
    runner: &dyn ToolRunner,
    request: &BootstrapRequest<'_>,
    object: &Path,
    executable: &Path,
) -> Result<()> {
    let mut args: Vec<OsString> = request.compiler_flags.iter().map(OsString::from).collect();
    args.push(object.into());
    args.push("-o".into());
    args.push(executable.into());
    args.extend(request.link.args());

    let link_failed = |diagnostics: String| ToolchainError::Link {
        executable: executable.to_path_buf(),
        diagnostics,
    };
    let output = runner.run(request.compiler, &args).map_err(|e| {
        link_failed(format!(
            "failed to invoke linker ({}): {e}",
            command_line(request.compiler, &args)
        ))
    })?;
    if !output.success() {
        return Err(link_failed(output.describe_failure()));
    }
    Ok(())
}

/// Run the probe with no arguments and capture its stdout.
pub fn run_executable(runner: &dyn ToolRunner, executable: &Path) -> Result<String> {
    let program = runnable(executable);
    let run_failed = |message: String| ToolchainError::BootstrapRun {
        executable: executable.to_path_buf(),
        message,
    };
    let output = runner
        .run(program.as_os_str(), &[])
        .map_err(|e| run_failed(e.to_string()))?;
    if !output.success() {
        return Err(run_failed(output.describe_failure()));
    }
    if output.stdout.trim().is_empty() {
        return Err(run_failed("no output produced".into()));
    }
    Ok(output.stdout)
}

/// A bare file name would be looked up on PATH; anchor it to the current directory.
fn runnable(executable: &Path) -> PathBuf {
    match executable.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => executable.to_path_buf(),
        _ => Path::new(".").join(executable),
    }
}
