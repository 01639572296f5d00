//! Symbol-table probing.
//!
//! A machine counts as supported only when one of its disassembler hook
//! symbols is *defined* in the library, not merely declared in a header.

use std::collections::BTreeSet;
use std::ffi::{OsStr, OsString};

use bfdgen_core::model::{LibraryDescriptor, LibraryKind, MachineIdentifier};
use bfdgen_core::naming::SymbolConvention;

use crate::error::{Result, ToolchainError};
use crate::runner::ToolRunner;

/// Defined symbol names of one library.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    defined: BTreeSet<String>,
}

impl SymbolTable {
    /// Parse `nm` output, keeping only defined symbols.
    ///
    /// Handles `addr type name` and `type name` lines, archive member
    /// headers (`member.o:`) and `name@VERSION` suffixes. `strip_prefix` is
    /// the object format's C symbol prefix (`_` on Mach-O).
    pub fn parse_nm(output: &str, strip_prefix: &str) -> Self {
        let mut defined = BTreeSet::new();
        for line in output.lines() {
            let line = line.trim_end();
            if line.is_empty() || line.ends_with(':') {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            let (has_address, kind, name) = match fields.as_slice() {
                [_, kind, name, ..] => (true, *kind, *name),
                [kind, name] => (false, *kind, *name),
                _ => continue,
            };
            if kind.len() != 1 {
                continue;
            }
            let undefined = kind == "U" || (!has_address && matches!(kind, "w" | "v"));
            if undefined {
                continue;
            }
            let name = name.split('@').next().unwrap_or(name);
            let name = if strip_prefix.is_empty() {
                name
            } else {
                name.strip_prefix(strip_prefix).unwrap_or(name)
            };
            defined.insert(name.to_string());
        }
        Self { defined }
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.defined.contains(symbol)
    }

    pub fn len(&self) -> usize {
        self.defined.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defined.is_empty()
    }
}

/// Probe outcome for one candidate machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookMatch<'c> {
    pub machine: &'c MachineIdentifier,
    pub bfd_name: String,
    /// The first hook symbol found, if any.
    pub symbol: Option<String>,
}

/// Match every candidate against `table`, in candidate order.
pub fn resolve_hooks<'c>(
    table: &SymbolTable,
    candidates: &'c [MachineIdentifier],
    convention: &dyn SymbolConvention,
) -> Vec<HookMatch<'c>> {
    candidates
        .iter()
        .map(|machine| {
            let bfd_name = convention.bfd_name(machine);
            let symbol = convention
                .hook_symbols(&bfd_name)
                .into_iter()
                .find(|symbol| table.contains(symbol));
            HookMatch {
                machine,
                bfd_name,
                symbol,
            }
        })
        .collect()
}

/// Lists a library's symbols with an external `nm` and probes them for hooks.
pub struct SymbolProber<'r> {
    runner: &'r dyn ToolRunner,
    nm: OsString,
    symbol_prefix: String,
}

impl<'r> SymbolProber<'r> {
    pub fn new(runner: &'r dyn ToolRunner, nm: impl Into<OsString>) -> Self {
        Self {
            runner,
            nm: nm.into(),
            symbol_prefix: String::new(),
        }
    }

    /// Strip `prefix` from every listed symbol (see `PlatformPolicy::symbol_prefix`).
    pub fn with_symbol_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.symbol_prefix = prefix.into();
        self
    }

    /// Arguments for `nm`: the dynamic table of a shared object, the whole of an archive.
    pub fn nm_args(library: &LibraryDescriptor) -> Vec<OsString> {
        match library.kind {
            LibraryKind::Shared => vec![OsString::from("-D"), library.path.clone().into()],
            LibraryKind::Static => vec![library.path.clone().into()],
        }
    }

    /// List the defined symbols of `library`.
    pub fn symbol_table(&self, library: &LibraryDescriptor) -> Result<SymbolTable> {
        let tool = self.tool_name();
        let output = self
            .runner
            .run(&self.nm, &Self::nm_args(library))
            .map_err(|e| ToolchainError::ToolInvocation {
                tool: tool.clone(),
                message: format!("cannot run on {}: {e}", library.path.display()),
            })?;
        if !output.success() {
            return Err(ToolchainError::ToolInvocation {
                tool,
                message: format!(
                    "listing {} failed with {}",
                    library.path.display(),
                    output.describe_failure()
                ),
            });
        }

        let table = SymbolTable::parse_nm(&output.stdout, &self.symbol_prefix);
        log::debug!(
            "{}: {} defined symbols",
            library.path.display(),
            table.len()
        );
        Ok(table)
    }

    /// The candidates whose hook symbol is defined in `library`, in candidate order.
    pub fn probe(
        &self,
        library: &LibraryDescriptor,
        candidates: &[MachineIdentifier],
        convention: &dyn SymbolConvention,
    ) -> Result<Vec<MachineIdentifier>> {
        let table = self.symbol_table(library)?;
        let supported: Vec<MachineIdentifier> = resolve_hooks(&table, candidates, convention)
            .into_iter()
            .filter_map(|hit| {
                let symbol = hit.symbol?;
                log::debug!("{} -> {symbol}", hit.machine.name);
                Some(hit.machine.clone())
            })
            .collect();

        if supported.is_empty() {
            log::warn!(
                "no disassembler hooks for {} candidate machines found in {}",
                candidates.len(),
                library.path.display()
            );
        }
        Ok(supported)
    }

    fn tool_name(&self) -> String {
        let nm: &OsStr = &self.nm;
        nm.to_string_lossy().into_owned()
    }
}
