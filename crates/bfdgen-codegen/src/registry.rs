//! Bootstrap output parsing and the registry data module.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::error::{CodegenError, Result};
use crate::names::macro_name;

/// One architecture as reported by the bootstrap executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRow {
    pub bfd_name: String,
    /// Value of the machine constant as compiled against the real headers.
    pub value: i64,
    pub comment: String,
}

/// Parse the bootstrap's stdout: one `name<TAB>value<TAB>comment` line per
/// architecture. Blank lines are ignored.
pub fn parse_bootstrap_output(text: &str) -> Result<Vec<RegistryRow>> {
    let mut rows = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let malformed = || CodegenError::MalformedRow {
            line_number: index + 1,
            line: line.to_string(),
        };

        let mut fields = line.splitn(3, '\t');
        let (Some(name), Some(value), Some(comment)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(malformed());
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(malformed());
        }
        let value = value.trim().parse::<i64>().map_err(|_| malformed())?;

        rows.push(RegistryRow {
            bfd_name: name.to_string(),
            value,
            comment: comment.trim().to_string(),
        });
    }
    Ok(rows)
}

const PRELUDE: &str = "\
/// An architecture whose disassembler is linked into the installed libopcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedArchitecture {
    /// Canonical short name, as understood by `bfd_scan_arch`.
    pub name: &'static str,
    /// Value of the machine constant in the probed headers.
    pub value: i64,
    pub description: &'static str,
}
";

const LOOKUP: &str = "
/// Find a supported architecture by its canonical short name.
pub fn lookup(name: &str) -> Option<&'static SupportedArchitecture> {
    SUPPORTED_ARCHITECTURES.iter().find(|arch| arch.name == name)
}
";

/// Render the registry module consumed by the runtime binding layer.
pub fn render_registry(rows: &[RegistryRow]) -> String {
    let mut out = String::new();
    out.push_str("// @generated by bfdgen from the bootstrap probe. Do not edit.\n\n");
    out.push_str(PRELUDE);
    out.push('\n');

    for row in rows {
        let _ = writeln!(out, "pub const ARCH_{}: i64 = {};", macro_name(&row.bfd_name), row.value);
    }
    if !rows.is_empty() {
        out.push('\n');
    }

    out.push_str("pub static SUPPORTED_ARCHITECTURES: &[SupportedArchitecture] = &[\n");
    for row in rows {
        let _ = writeln!(
            out,
            "    SupportedArchitecture {{ name: {:?}, value: {}, description: {:?} }},",
            row.bfd_name, row.value, row.comment
        );
    }
    out.push_str("];\n");
    out.push_str(LOOKUP);
    out
}

/// Names listed in a rendered registry module's table, in order.
pub fn registered_names(module: &str) -> Vec<String> {
    module
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix("SupportedArchitecture { name: \""))
        .filter_map(|rest| rest.split_once("\", value:"))
        .map(|(name, _)| name.to_string())
        .collect()
}
