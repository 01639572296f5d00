//! Header symbol extraction.
//!
//! Recovers the compile-time list of machine identifiers from a
//! `bfd.h`-style header by textual matching. Comments, conditional
//! compilation and line continuations are tolerated; only the declaration
//! forms understood by [`grammar::match_line`] are recognized.

pub mod grammar;

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::HeaderError;
use crate::model::MachineIdentifier;
use grammar::{Declaration, Scope};

/// Selects which declarations in a header are machine identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HeaderGrammar {
    /// Name prefix of machine constants (e.g., `bfd_arch_`).
    pub prefix: String,
    /// Constant names to skip even though they carry the prefix.
    pub exclude: Vec<String>,
}

impl Default for HeaderGrammar {
    fn default() -> Self {
        Self::binutils()
    }
}

impl HeaderGrammar {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            exclude: Vec::new(),
        }
    }

    /// `enum bfd_architecture` in `bfd.h`, minus its `bfd_arch_last` sentinel.
    pub fn binutils() -> Self {
        Self::new("bfd_arch_").exclude("bfd_arch_last")
    }

    pub fn exclude(mut self, name: impl Into<String>) -> Self {
        self.exclude.push(name.into());
        self
    }

    fn selects(&self, name: &str) -> bool {
        name.starts_with(self.prefix.as_str()) && !self.exclude.iter().any(|e| e == name)
    }
}

/// Extract machine identifiers from the header at `path`, in source order.
pub fn extract(path: &Path, grammar: &HeaderGrammar) -> Result<Vec<MachineIdentifier>, HeaderError> {
    let text = std::fs::read_to_string(path).map_err(|source| HeaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    extract_str(&text, path, grammar)
}

/// Extract machine identifiers from header text; `origin` is used in errors.
pub fn extract_str(
    text: &str,
    origin: &Path,
    grammar: &HeaderGrammar,
) -> Result<Vec<MachineIdentifier>, HeaderError> {
    let mut extractor = Extractor::new(grammar);
    for (line_number, line) in join_continuations(text) {
        extractor
            .feed(&line)
            .map_err(|reason| HeaderError::Parse {
                path: origin.to_path_buf(),
                reason: format!("line {line_number}: {reason}"),
            })?;
    }

    if extractor.machines.is_empty() {
        return Err(HeaderError::Parse {
            path: origin.to_path_buf(),
            reason: format!(
                "no machine declarations with prefix '{}' found",
                grammar.prefix
            ),
        });
    }
    log::debug!(
        "{}: {} machine identifiers",
        origin.display(),
        extractor.machines.len()
    );
    Ok(extractor.machines)
}

struct Extractor<'g> {
    grammar: &'g HeaderGrammar,
    machines: Vec<MachineIdentifier>,
    known: HashMap<String, i64>,
    seen: HashSet<String>,
    scope: Scope,
    /// Value of the next implicit enum member; `Err` names the member whose
    /// explicit value could not be evaluated.
    next_value: Result<i64, String>,
    in_comment: bool,
    /// Machine whose trailing comment continues on following lines.
    comment_target: Option<usize>,
}

impl<'g> Extractor<'g> {
    fn new(grammar: &'g HeaderGrammar) -> Self {
        Self {
            grammar,
            machines: Vec::new(),
            known: HashMap::new(),
            seen: HashSet::new(),
            scope: Scope::File,
            next_value: Ok(0),
            in_comment: false,
            comment_target: None,
        }
    }

    /// Consume one logical line. Fails when a selected machine constant has
    /// a value that cannot be computed.
    fn feed(&mut self, line: &str) -> Result<(), String> {
        let mut line = line;
        if self.in_comment {
            match line.find("*/") {
                Some(end) => {
                    self.continue_comment(&line[..end]);
                    self.in_comment = false;
                    self.comment_target = None;
                    line = &line[end + 2..];
                }
                None => {
                    self.continue_comment(line);
                    return Ok(());
                }
            }
        }

        let split = split_comment(line);
        let decls = grammar::match_line(&split.code, self.scope);
        let code = split.code.trim();
        if self.scope == Scope::EnumHead && decls.is_empty() && !code.is_empty() && !code.starts_with('#')
        {
            // `enum foo` turned out to be a return type, not a definition.
            self.scope = Scope::File;
        }

        let mut last = None;
        for decl in decls {
            match decl {
                Declaration::EnumHead => self.scope = Scope::EnumHead,
                Declaration::EnumOpen => {
                    self.scope = Scope::EnumBody;
                    self.next_value = Ok(0);
                }
                Declaration::EnumClose => self.scope = Scope::File,
                Declaration::Member { name, value } => {
                    let value = match value {
                        Some(expr) => match grammar::parse_value(expr, &self.known) {
                            Some(value) => value,
                            None => {
                                self.unevaluable(name, expr)?;
                                self.next_value = Err(name.to_string());
                                continue;
                            }
                        },
                        None => match &self.next_value {
                            Ok(value) => *value,
                            Err(lost) => {
                                if self.grammar.selects(name) {
                                    return Err(format!(
                                        "cannot number {name}: the value of {lost} before it is not a constant expression"
                                    ));
                                }
                                continue;
                            }
                        },
                    };
                    self.next_value = value
                        .checked_add(1)
                        .ok_or_else(|| name.to_string());
                    last = self.record(name, value).or(last);
                }
                Declaration::Define { name, value } => {
                    match grammar::parse_value(value, &self.known) {
                        Some(value) => last = self.record(name, value).or(last),
                        None => self.unevaluable(name, value)?,
                    }
                }
            }
        }

        if let Some(idx) = last {
            self.machines[idx].comment = normalize_comment(&split.comment);
        }
        if split.open {
            self.in_comment = true;
            self.comment_target = last;
        }
        Ok(())
    }

    /// Unknown values are fatal for machine constants and ignored otherwise.
    fn unevaluable(&self, name: &str, expr: &str) -> Result<(), String> {
        if self.grammar.selects(name) {
            return Err(format!("value of {name} is not a constant expression: {expr}"));
        }
        log::trace!("ignoring {name}: value '{expr}' is not a constant expression");
        Ok(())
    }

    fn record(&mut self, name: &str, value: i64) -> Option<usize> {
        self.known.entry(name.to_string()).or_insert(value);
        if !self.grammar.selects(name) {
            return None;
        }
        if !self.seen.insert(name.to_string()) {
            log::warn!("duplicate declaration of {name}; keeping the first");
            return None;
        }
        self.machines.push(MachineIdentifier::new(name, value, ""));
        Some(self.machines.len() - 1)
    }

    fn continue_comment(&mut self, text: &str) {
        let Some(idx) = self.comment_target else {
            return;
        };
        let text = normalize_comment(text.trim().trim_start_matches('*'));
        if text.is_empty() {
            return;
        }
        let comment = &mut self.machines[idx].comment;
        if !comment.is_empty() {
            comment.push(' ');
        }
        comment.push_str(&text);
    }
}

/// A line with its comments separated from its code.
struct SplitLine {
    code: String,
    comment: String,
    /// A block comment opened on this line and is still open at its end.
    open: bool,
}

fn split_comment(line: &str) -> SplitLine {
    let mut code = String::new();
    let mut comments = Vec::new();
    let mut rest = line;
    let mut open = false;

    loop {
        let block = rest.find("/*");
        let line_comment = rest.find("//");
        let block_first = match (block, line_comment) {
            (Some(b), Some(l)) => b < l,
            (Some(_), None) => true,
            _ => false,
        };

        if let (true, Some(start)) = (block_first, block) {
            code.push_str(&rest[..start]);
            code.push(' ');
            let after = &rest[start + 2..];
            match after.find("*/") {
                Some(end) => {
                    comments.push(&after[..end]);
                    rest = &after[end + 2..];
                }
                None => {
                    comments.push(after);
                    open = true;
                    break;
                }
            }
        } else if let Some(start) = line_comment {
            code.push_str(&rest[..start]);
            comments.push(&rest[start + 2..]);
            break;
        } else {
            code.push_str(rest);
            break;
        }
    }

    SplitLine {
        code,
        comment: comments.join(" "),
        open,
    }
}

fn normalize_comment(text: &str) -> String {
    text.trim()
        .trim_start_matches(['*', '<', '!'])
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Join physical lines ending in a backslash into logical lines, each
/// paired with the 1-based number of its first physical line.
fn join_continuations(text: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut first = 1;
    for (idx, raw) in text.lines().enumerate() {
        if current.is_empty() {
            first = idx + 1;
        }
        match raw.strip_suffix('\\') {
            Some(head) => {
                current.push_str(head);
                current.push(' ');
            }
            None => {
                current.push_str(raw);
                lines.push((first, std::mem::take(&mut current)));
            }
        }
    }
    if !current.is_empty() {
        lines.push((first, current));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    const BFD_EXCERPT: &str = r#"
/* Main header file for the bfd library.  */
#ifndef __BFD_H_SEEN__
#define __BFD_H_SEEN__

enum bfd_architecture
{
  bfd_arch_unknown,   /* File arch not known.  */
  bfd_arch_obscure,   /* Arch known, not one of these.  */
  bfd_arch_m68k,      /* Motorola 68xxx.  */
#define bfd_mach_m68000                1
#define bfd_mach_m68008                2
  bfd_arch_vax,       /* DEC Vax.  */
#ifdef BFD64
  bfd_arch_i386,      /* Intel 386.  */
#define bfd_mach_i386_intel_syntax     (1 << 0)
#endif
  bfd_arch_arm,       /* Advanced Risc Machines ARM,
                         including Thumb.  */
  bfd_arch_last
  };

extern const char *bfd_printable_arch_mach
  (enum bfd_architecture arch, unsigned long machine);
#endif
"#;

    fn names(machines: &[MachineIdentifier]) -> Vec<&str> {
        machines.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn binutils_enum_excerpt() {
        let machines =
            extract_str(BFD_EXCERPT, Path::new("bfd.h"), &HeaderGrammar::binutils()).unwrap();
        assert_eq!(
            names(&machines),
            [
                "bfd_arch_unknown",
                "bfd_arch_obscure",
                "bfd_arch_m68k",
                "bfd_arch_vax",
                "bfd_arch_i386",
                "bfd_arch_arm",
            ]
        );
        let values: Vec<i64> = machines.iter().map(|m| m.value).collect();
        assert_eq!(values, [0, 1, 2, 3, 4, 5]);
        assert_eq!(machines[2].comment, "Motorola 68xxx.");
        assert_eq!(
            machines[5].comment,
            "Advanced Risc Machines ARM, including Thumb."
        );
    }

    #[test]
    fn define_declarations_in_source_order() {
        let text = "\
#define EM_386 3 /* Intel 386 */
#define EM_ARM 40 /* ARM */
#define EM_MIPS 8 // MIPS R3000
#define EM_LEGACY EM_386
";
        let grammar = HeaderGrammar::new("EM_");
        let machines = extract_str(text, Path::new("elf.h"), &grammar).unwrap();
        assert_eq!(machines.len(), 4);
        assert_eq!(machines[0], MachineIdentifier::new("EM_386", 3, "Intel 386"));
        assert_eq!(machines[1], MachineIdentifier::new("EM_ARM", 40, "ARM"));
        assert_eq!(machines[2], MachineIdentifier::new("EM_MIPS", 8, "MIPS R3000"));
        assert_eq!(machines[3].value, 3);
    }

    #[test]
    fn explicit_enum_values_reset_counter() {
        let text = "enum machine { M_A = 10, M_B, /* b */\n M_C = 0x20, M_D };";
        let machines = extract_str(text, Path::new("m.h"), &HeaderGrammar::new("M_")).unwrap();
        let values: Vec<i64> = machines.iter().map(|m| m.value).collect();
        assert_eq!(values, [10, 11, 32, 33]);
        assert_eq!(machines[1].comment, "b");
    }

    #[test]
    fn arithmetic_member_keeps_counter() {
        let text = "enum bfd_architecture { bfd_arch_unknown, bfd_arch_alias = bfd_arch_unknown + 1, bfd_arch_i386, bfd_arch_arm, bfd_arch_last };";
        let machines = extract_str(text, Path::new("bfd.h"), &HeaderGrammar::binutils()).unwrap();
        let found: Vec<(&str, i64)> = machines.iter().map(|m| (m.name.as_str(), m.value)).collect();
        assert_eq!(
            found,
            [
                ("bfd_arch_unknown", 0),
                ("bfd_arch_alias", 1),
                ("bfd_arch_i386", 2),
                ("bfd_arch_arm", 3),
            ]
        );
    }

    #[test]
    fn unevaluable_machine_value_is_parse_error() {
        let text = "enum bfd_architecture\n{\n  bfd_arch_unknown,\n  bfd_arch_odd = sizeof (long),\n  bfd_arch_i386,\n};\n";
        let err = extract_str(text, Path::new("bfd.h"), &HeaderGrammar::binutils()).unwrap_err();
        match err {
            HeaderError::Parse { reason, .. } => {
                assert!(reason.starts_with("line 4:"), "{reason}");
                assert!(reason.contains("bfd_arch_odd"), "{reason}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn lost_counter_fails_on_next_implicit_machine() {
        let text = "enum bfd_architecture {\n  helper = sizeof (long),\n  bfd_arch_i386,\n};\n";
        let err = extract_str(text, Path::new("bfd.h"), &HeaderGrammar::binutils()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("line 3"), "{message}");
        assert!(message.contains("bfd_arch_i386"), "{message}");
        assert!(message.contains("helper"), "{message}");
    }

    #[test]
    fn unevaluable_unrelated_values_ignored() {
        let text = "#define BFD_VERSION_STRING \"2.40\"\nenum other { O_A = sizeof (int), O_B };\n#define EM_386 3\n";
        let machines = extract_str(text, Path::new("elf.h"), &HeaderGrammar::new("EM_")).unwrap();
        assert_eq!(names(&machines), ["EM_386"]);
    }

    #[test]
    fn line_continuations_joined() {
        let text = "#define EM_X86_64 \\\n  62 /* AMD x86-64 */\n";
        let machines = extract_str(text, Path::new("elf.h"), &HeaderGrammar::new("EM_")).unwrap();
        assert_eq!(machines, [MachineIdentifier::new("EM_X86_64", 62, "AMD x86-64")]);
    }

    #[test]
    fn duplicate_keeps_first() {
        let text = "#if A\n#define EM_386 3 /* one */\n#else\n#define EM_386 4 /* two */\n#endif\n";
        let machines = extract_str(text, Path::new("elf.h"), &HeaderGrammar::new("EM_")).unwrap();
        assert_eq!(machines, [MachineIdentifier::new("EM_386", 3, "one")]);
    }

    #[test]
    fn commented_out_declarations_ignored() {
        let text = "/*\n#define EM_OLD 1\n*/\n#define EM_NEW 2\n// #define EM_GONE 3\n";
        let machines = extract_str(text, Path::new("elf.h"), &HeaderGrammar::new("EM_")).unwrap();
        assert_eq!(names(&machines), ["EM_NEW"]);
    }

    #[test]
    fn no_declarations_is_parse_error() {
        let err = extract_str("int main(void);\n", Path::new("empty.h"), &HeaderGrammar::binutils())
            .unwrap_err();
        match err {
            HeaderError::Parse { path, reason } => {
                assert_eq!(path, Path::new("empty.h"));
                assert!(reason.contains("bfd_arch_"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn extract_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bfd.h");
        std::fs::write(&path, BFD_EXCERPT).unwrap();
        let machines = extract(&path, &HeaderGrammar::binutils()).unwrap();
        assert_eq!(machines.len(), 6);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract(&dir.path().join("nope.h"), &HeaderGrammar::binutils()).unwrap_err();
        assert!(matches!(err, HeaderError::Io { .. }));
    }
}
