//! The probe translation unit.
//!
//! The table stores each machine's *symbolic* constant, so the value the
//! program prints is the one the real headers define at compile time.
//! Output format: one `name<TAB>value<TAB>comment` line per architecture.

use std::fmt::Write;

use bfdgen_core::model::{supported, ArchitectureEntry};

use crate::names::{c_comment, c_string};

/// `bfd.h` refuses to be included unless the including package identifies itself.
const PACKAGE_PREAMBLE: &str = "\
#ifndef PACKAGE
#define PACKAGE \"bfdgen\"
#endif
#ifndef PACKAGE_VERSION
#define PACKAGE_VERSION \"0\"
#endif
";

const MAIN: &str = "\
int main(void)
{
    const struct bfdgen_arch *arch;

    for (arch = bfdgen_archs; arch->name != NULL; arch++)
        printf(\"%s\\t%ld\\t%s\\n\", arch->name, arch->value, arch->comment);
    return 0;
}
";

/// Render the probe program for the supported entries.
///
/// `includes` are header names (`bfd.h`) or complete include operands
/// (`<bfd.h>`, `"local.h"`).
pub fn render_c_source(entries: &[ArchitectureEntry], includes: &[String]) -> String {
    let mut out = String::new();
    out.push_str("/* @generated by bfdgen: architecture probe. Do not edit. */\n");
    out.push_str(PACKAGE_PREAMBLE);
    out.push('\n');
    out.push_str("#include <stdio.h>\n");
    for include in includes {
        let _ = writeln!(out, "#include {}", include_operand(include));
    }
    out.push('\n');

    out.push_str("struct bfdgen_arch {\n");
    out.push_str("    long value;\n");
    out.push_str("    const char *name;\n");
    out.push_str("    const char *comment;\n");
    out.push_str("};\n\n");

    out.push_str("static const struct bfdgen_arch bfdgen_archs[] = {\n");
    for entry in supported(entries) {
        let _ = writeln!(
            out,
            "    {{ (long) {}, {}, {} }}, /* {} */",
            entry.machine.name,
            c_string(&entry.bfd_name),
            c_string(&entry.machine.comment),
            c_comment(&entry.machine.name),
        );
    }
    out.push_str("    { 0, NULL, NULL }\n");
    out.push_str("};\n\n");

    out.push_str(MAIN);
    out
}

fn include_operand(include: &str) -> String {
    if include.starts_with('<') || include.starts_with('"') {
        include.to_string()
    } else {
        format!("<{include}>")
    }
}
