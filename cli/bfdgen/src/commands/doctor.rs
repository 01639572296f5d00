//! `bfdgen doctor`: configuration and toolchain diagnostics.

use std::path::Path;
use std::process::Command;

use anyhow::Result;
use bfdgen_core::LibraryDescriptor;
use bfdgen_targets::PlatformPolicy;

use crate::settings::{Settings, ENV_VARS};

/// Print the resolved configuration and whether each input is usable.
pub fn run(settings: &Settings) -> Result<()> {
    println!("=== bfdgen doctor ===");
    println!();
    println!("bfdgen version: {}", env!("CARGO_PKG_VERSION"));
    match &settings.manifest_dir {
        Some(dir) => println!("bfdgen.toml:    {}", dir.join(crate::manifest::MANIFEST_FILE).display()),
        None => println!("bfdgen.toml:    not found"),
    }
    println!();

    println!("--- Host ---");
    let policy = PlatformPolicy::resolve(&settings.host);
    println!("  Platform:       {}", settings.host);
    println!("  Symbol prefix:  {}", display_or_none(&policy.symbol_prefix));
    println!("  Extra libs:     {}", display_or_none(&policy.extra_libraries.join(" ")));
    println!("  Static iberty:  {}", if policy.requires_static_libiberty { "required" } else { "only for static links" });
    println!("  Compiler flags: {}", display_or_none(&policy.compiler_flags.join(" ")));
    for dir in &policy.extra_library_dirs {
        println!("  Library dir:    {} ({})", dir.display(), presence(dir));
    }
    println!();

    println!("--- Tools ---");
    print_tool_status("nm", &settings.tools.nm, &["--version"]);
    print_tool_status("cc", &settings.tools.cc, &["--version"]);
    println!();

    println!("--- Inputs ---");
    println!("  header:   {} ({})", settings.header.display(), presence(&settings.header));
    for dir in &settings.include_dirs {
        println!("  include:  {} ({})", dir.display(), presence(dir));
    }
    print_library("bfd", "bfd", &settings.libraries.bfd);
    print_library("opcodes", "opcodes", &settings.libraries.opcodes);
    if let Some(iberty) = &settings.libraries.iberty {
        print_library("iberty", "iberty", iberty);
    }
    println!();

    println!("--- Outputs ---");
    println!("  c-source: {}", settings.outputs.c_source.display());
    println!("  c-header: {}", settings.outputs.c_header.display());
    println!("  registry: {}", settings.outputs.registry.display());
    println!("  work-dir: {}", settings.work_dir.display());
    println!();

    println!("--- Environment ---");
    for name in ENV_VARS {
        match std::env::var(name) {
            Ok(value) => println!("  {name}={value}"),
            Err(_) => println!("  {name} (unset)"),
        }
    }

    Ok(())
}

fn print_tool_status(label: &str, program: &Path, args: &[&str]) {
    let resolved = match which::which(program) {
        Ok(path) => path,
        Err(_) => {
            println!("  {label}: {} not found", program.display());
            return;
        }
    };
    let version = Command::new(&resolved)
        .args(args)
        .output()
        .ok()
        .and_then(|output| {
            String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(str::to_string)
        })
        .unwrap_or_else(|| "(unknown version)".to_string());
    println!("  {label}: {} ({version})", resolved.display());
}

fn print_library(label: &str, stem: &str, path: &Path) {
    let library = LibraryDescriptor::from_path(path);
    let status = match library.check(stem) {
        Ok(()) => format!("{}, ok", library.kind),
        Err(e) => format!("{e}"),
    };
    println!("  {label:<8}  {} ({status})", path.display());
}

fn presence(path: &Path) -> &'static str {
    if path.exists() {
        "found"
    } else {
        "missing"
    }
}

fn display_or_none(value: &str) -> &str {
    if value.is_empty() {
        "(none)"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::settings::{Overrides, Settings};

    #[test]
    fn doctor_runs_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = Overrides {
            host: Some("linux-x86_64".into()),
            nm: Some(PathBuf::from("definitely-not-a-real-nm")),
            ..Overrides::default()
        };
        let settings = Settings::resolve(&overrides, None, dir.path(), |_| None).unwrap();
        super::run(&settings).unwrap();
    }

    #[test]
    fn presence_and_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(super::presence(dir.path()), "found");
        assert_eq!(super::presence(&dir.path().join("nope")), "missing");
        assert_eq!(super::display_or_none(""), "(none)");
        assert_eq!(super::display_or_none("_"), "_");
    }
}
