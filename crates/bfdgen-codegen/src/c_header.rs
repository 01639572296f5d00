//! The supported-architecture header consumed by extension builds.

use std::fmt::Write;

use bfdgen_core::model::{self, ArchitectureEntry};

use crate::names::{c_comment, macro_name};

/// Include guard of the generated header.
pub const INCLUDE_GUARD: &str = "BFDGEN_SUPPORTED_DISASM_H";
/// Prefix of the per-architecture guard macros.
pub const ARCH_GUARD_PREFIX: &str = "BFDGEN_ARCH_";

/// Render the header for the supported entries.
///
/// Defines `BFDGEN_SUPPORTED_COUNT`, one `BFDGEN_ARCH_<NAME>` guard per
/// architecture, and `BFDGEN_FOR_EACH_ARCH(X)` expanding `X(name, CONSTANT)`
/// once per architecture.
pub fn render_c_header(entries: &[ArchitectureEntry]) -> String {
    let supported = model::supported(entries);

    let mut out = String::new();
    out.push_str("/* @generated by bfdgen: disassemblers linked into libopcodes. Do not edit. */\n");
    let _ = writeln!(out, "#ifndef {INCLUDE_GUARD}");
    let _ = writeln!(out, "#define {INCLUDE_GUARD}\n");
    let _ = writeln!(out, "#define BFDGEN_SUPPORTED_COUNT {}\n", supported.len());

    for entry in &supported {
        let _ = writeln!(
            out,
            "#define {ARCH_GUARD_PREFIX}{} 1 /* {} */",
            macro_name(&entry.bfd_name),
            c_comment(&entry.machine.comment)
        );
    }
    if !supported.is_empty() {
        out.push('\n');
    }

    out.push_str("#define BFDGEN_FOR_EACH_ARCH(X)");
    for entry in &supported {
        let _ = write!(out, " \\\n    X({}, {})", entry.bfd_name, entry.machine.name);
    }
    out.push_str("\n\n");

    let _ = writeln!(out, "#endif /* {INCLUDE_GUARD} */");
    out
}

/// Architecture guard names defined by a rendered header, in order.
pub fn defined_guards(header: &str) -> Vec<&str> {
    header
        .lines()
        .filter_map(|line| line.strip_prefix("#define "))
        .filter_map(|rest| rest.split_whitespace().next())
        .filter(|name| name.starts_with(ARCH_GUARD_PREFIX))
        .collect()
}
