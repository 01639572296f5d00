//! Mapping from machine identifiers to disassembler hook symbols.
//!
//! The naming scheme is toolkit-version dependent, so it sits behind
//! [`SymbolConvention`]. [`PrefixConvention`] covers the prefix-based
//! schemes used by binutils (`bfd_arch_i386` -> `print_insn_i386`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::MachineIdentifier;

/// A pluggable naming convention for hook symbols.
pub trait SymbolConvention {
    /// Canonical short name for a machine (`bfd_arch_i386` -> `i386`).
    fn bfd_name(&self, machine: &MachineIdentifier) -> String;

    /// Every symbol whose presence proves a disassembler for `bfd_name` is linked in.
    fn hook_symbols(&self, bfd_name: &str) -> Vec<String>;
}

/// Prefix-based convention: strip `machine_prefix`, lowercase, prepend `hook_prefix`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PrefixConvention {
    /// Prefix stripped from the machine constant name.
    pub machine_prefix: String,
    /// Prefix of the hook symbol.
    pub hook_prefix: String,
    /// Also accept `<hook_prefix>big_<name>` and `<hook_prefix>little_<name>`.
    pub endian_variants: bool,
    /// Extra hook symbols accepted per architecture.
    pub overrides: BTreeMap<String, Vec<String>>,
}

impl Default for PrefixConvention {
    fn default() -> Self {
        Self::binutils()
    }
}

impl PrefixConvention {
    pub fn new(machine_prefix: impl Into<String>, hook_prefix: impl Into<String>) -> Self {
        Self {
            machine_prefix: machine_prefix.into(),
            hook_prefix: hook_prefix.into(),
            endian_variants: false,
            overrides: BTreeMap::new(),
        }
    }

    /// libopcodes: `bfd_arch_<name>` printed by `print_insn_<name>`, with the
    /// ARM/MIPS/PowerPC style `print_insn_big_<name>`/`print_insn_little_<name>` pairs.
    pub fn binutils() -> Self {
        Self {
            endian_variants: true,
            ..Self::new("bfd_arch_", "print_insn_")
        }
    }

    /// Accept an additional hook symbol for one architecture.
    pub fn with_override(mut self, bfd_name: impl Into<String>, symbol: impl Into<String>) -> Self {
        self.overrides
            .entry(bfd_name.into())
            .or_default()
            .push(symbol.into());
        self
    }
}

impl SymbolConvention for PrefixConvention {
    fn bfd_name(&self, machine: &MachineIdentifier) -> String {
        machine
            .name
            .strip_prefix(self.machine_prefix.as_str())
            .unwrap_or(&machine.name)
            .to_lowercase()
    }

    fn hook_symbols(&self, bfd_name: &str) -> Vec<String> {
        let mut symbols = vec![format!("{}{bfd_name}", self.hook_prefix)];
        if self.endian_variants {
            symbols.push(format!("{}big_{bfd_name}", self.hook_prefix));
            symbols.push(format!("{}little_{bfd_name}", self.hook_prefix));
        }
        if let Some(extra) = self.overrides.get(bfd_name) {
            symbols.extend(extra.iter().cloned());
        }
        symbols
    }
}
