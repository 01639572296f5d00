//! Declaration grammar for machine-constant headers.
//!
//! Not a C parser. [`match_line`] recognizes the narrow set of forms that
//! `bfd.h`-style headers use to declare machine constants; replacing it
//! with a real grammar does not affect [`super::extract`] callers.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

/// Where a line sits relative to an enum declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Outside any enum.
    File,
    /// After `enum name`, waiting for the `{` on a following line.
    EnumHead,
    /// Inside the enum body.
    EnumBody,
}

/// A declaration recognized on one logical (comment-free) line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration<'a> {
    /// `#define NAME VALUE`
    Define { name: &'a str, value: &'a str },
    /// `enum name` with the opening brace still to come.
    EnumHead,
    /// `enum ... {` (or a lone `{` after an enum head).
    EnumOpen,
    /// `NAME` or `NAME = VALUE` inside an enum body.
    Member { name: &'a str, value: Option<&'a str> },
    /// `}` closing the enum body.
    EnumClose,
}

fn define_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^#\s*define\s+([A-Za-z_][A-Za-z0-9_]*)\s+(\S.*?)\s*$").expect("valid regex")
    })
}

fn enum_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:typedef\s+)?enum\b[^{;]*\{(.*)$").expect("valid regex")
    })
}

fn enum_head_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:typedef\s+)?enum\b[^{;()]*$").expect("valid regex"))
}

fn member_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*(?:=\s*(\S.*?))?$").expect("valid regex")
    })
}

/// Recognize the declarations on a comment-free line.
///
/// Lines that match nothing (prototypes, conditional compilation, struct
/// fields) yield an empty vector.
pub fn match_line(code: &str, scope: Scope) -> Vec<Declaration<'_>> {
    let code = code.trim();
    let mut found = Vec::new();
    if code.is_empty() {
        return found;
    }

    if code.starts_with('#') {
        if let Some(caps) = define_re().captures(code) {
            if let (Some(name), Some(value)) = (caps.get(1), caps.get(2)) {
                found.push(Declaration::Define {
                    name: name.as_str(),
                    value: value.as_str(),
                });
            }
        }
        return found;
    }

    let body = match scope {
        Scope::EnumBody => code,
        Scope::EnumHead => match code.strip_prefix('{') {
            Some(rest) => {
                found.push(Declaration::EnumOpen);
                rest
            }
            None => return found,
        },
        Scope::File => match enum_open_re().captures(code).and_then(|caps| caps.get(1)) {
            Some(rest) => {
                found.push(Declaration::EnumOpen);
                rest.as_str()
            }
            None => {
                if enum_head_re().is_match(code) {
                    found.push(Declaration::EnumHead);
                }
                return found;
            }
        },
    };

    let (members, closed) = match body.find('}') {
        Some(end) => (&body[..end], true),
        None => (body, false),
    };
    for piece in members.split(',') {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        if let Some(caps) = member_re().captures(piece) {
            if let Some(name) = caps.get(1) {
                found.push(Declaration::Member {
                    name: name.as_str(),
                    value: caps.get(2).map(|v| v.as_str()),
                });
            }
        }
    }
    if closed {
        found.push(Declaration::EnumClose);
    }
    found
}

/// Evaluate a constant expression: integer literals (any C radix and suffix),
/// references to already-known constants, parentheses, unary `- + ~` and the
/// binary `* / % + - << >> & ^ |` operators with C precedence.
///
/// Returns `None` for anything else (casts, `sizeof`, unknown names) and on
/// overflow.
pub fn parse_value(expr: &str, known: &HashMap<String, i64>) -> Option<i64> {
    let tokens = tokenize(expr)?;
    let mut parser = ExprParser {
        tokens: &tokens,
        pos: 0,
        known,
    };
    let value = parser.binary(0)?;
    (parser.pos == tokens.len()).then_some(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Number(i64),
    Ident(&'a str),
    Op(&'a str),
    Open,
    Close,
}

fn tokenize(expr: &str) -> Option<Vec<Token<'_>>> {
    let mut tokens = Vec::new();
    let mut rest = expr.trim_start();
    while let Some(c) = rest.chars().next() {
        let len = if c.is_ascii_alphanumeric() || c == '_' {
            let len = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(rest.len());
            let word = &rest[..len];
            if c.is_ascii_digit() {
                tokens.push(Token::Number(parse_literal(word)?));
            } else {
                tokens.push(Token::Ident(word));
            }
            len
        } else if rest.starts_with("<<") || rest.starts_with(">>") {
            tokens.push(Token::Op(&rest[..2]));
            2
        } else {
            match c {
                '(' => tokens.push(Token::Open),
                ')' => tokens.push(Token::Close),
                '+' | '-' | '*' | '/' | '%' | '&' | '|' | '^' | '~' => {
                    tokens.push(Token::Op(&rest[..1]))
                }
                _ => return None,
            }
            1
        };
        rest = rest[len..].trim_start();
    }
    Some(tokens)
}

fn precedence(op: &str) -> Option<u8> {
    Some(match op {
        "|" => 1,
        "^" => 2,
        "&" => 3,
        "<<" | ">>" => 4,
        "+" | "-" => 5,
        "*" | "/" | "%" => 6,
        _ => return None,
    })
}

fn apply(op: &str, lhs: i64, rhs: i64) -> Option<i64> {
    match op {
        "|" => Some(lhs | rhs),
        "^" => Some(lhs ^ rhs),
        "&" => Some(lhs & rhs),
        "<<" => lhs.checked_shl(u32::try_from(rhs).ok()?),
        ">>" => lhs.checked_shr(u32::try_from(rhs).ok()?),
        "+" => lhs.checked_add(rhs),
        "-" => lhs.checked_sub(rhs),
        "*" => lhs.checked_mul(rhs),
        "/" => lhs.checked_div(rhs),
        "%" => lhs.checked_rem(rhs),
        _ => None,
    }
}

/// Precedence climbing over a token slice.
struct ExprParser<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
    known: &'t HashMap<String, i64>,
}

impl<'a> ExprParser<'_, 'a> {
    fn next(&mut self) -> Option<Token<'a>> {
        let token = *self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    fn peek_op(&self) -> Option<&'a str> {
        match self.tokens.get(self.pos) {
            Some(Token::Op(op)) => Some(*op),
            _ => None,
        }
    }

    fn binary(&mut self, min_precedence: u8) -> Option<i64> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.peek_op() {
            let Some(prec) = precedence(op).filter(|p| *p >= min_precedence) else {
                break;
            };
            self.pos += 1;
            let rhs = self.binary(prec + 1)?;
            lhs = apply(op, lhs, rhs)?;
        }
        Some(lhs)
    }

    fn unary(&mut self) -> Option<i64> {
        match self.next()? {
            Token::Number(n) => Some(n),
            Token::Ident(name) => self.known.get(name).copied(),
            Token::Op("-") => self.unary()?.checked_neg(),
            Token::Op("+") => self.unary(),
            Token::Op("~") => Some(!self.unary()?),
            Token::Open => {
                let value = self.binary(0)?;
                (self.next()? == Token::Close).then_some(value)
            }
            Token::Op(_) | Token::Close => None,
        }
    }
}

fn parse_literal(literal: &str) -> Option<i64> {
    let digits = literal.trim_end_matches(['u', 'U', 'l', 'L']);
    if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }
    if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        return i64::from_str_radix(bin, 2).ok();
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return i64::from_str_radix(&digits[1..], 8).ok();
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_with_value() {
        assert_eq!(
            match_line("#define EM_386 3", Scope::File),
            [Declaration::Define { name: "EM_386", value: "3" }]
        );
        assert_eq!(
            match_line("#  define bfd_mach_i386_i386 1", Scope::EnumBody),
            [Declaration::Define { name: "bfd_mach_i386_i386", value: "1" }]
        );
    }

    #[test]
    fn function_like_macro_ignored() {
        assert!(match_line("#define bfd_get_arch(abfd) ((abfd)->arch_info->arch)", Scope::File).is_empty());
        assert!(match_line("#ifdef BFD64", Scope::File).is_empty());
        assert!(match_line("#define BFD_H", Scope::File).is_empty());
    }

    #[test]
    fn enum_members() {
        assert_eq!(
            match_line("enum bfd_architecture", Scope::File),
            [Declaration::EnumHead]
        );
        assert_eq!(match_line("{", Scope::EnumHead), [Declaration::EnumOpen]);
        assert_eq!(
            match_line("enum bfd_architecture {", Scope::File),
            [Declaration::EnumOpen]
        );
        assert_eq!(
            match_line("bfd_arch_i386,", Scope::EnumBody),
            [Declaration::Member { name: "bfd_arch_i386", value: None }]
        );
        assert_eq!(
            match_line("bfd_arch_obscure = 0x10,", Scope::EnumBody),
            [Declaration::Member { name: "bfd_arch_obscure", value: Some("0x10") }]
        );
        assert_eq!(match_line("};", Scope::EnumBody), [Declaration::EnumClose]);
    }

    #[test]
    fn one_line_enum() {
        assert_eq!(
            match_line("enum { A, B = 4, C };", Scope::File),
            [
                Declaration::EnumOpen,
                Declaration::Member { name: "A", value: None },
                Declaration::Member { name: "B", value: Some("4") },
                Declaration::Member { name: "C", value: None },
                Declaration::EnumClose,
            ]
        );
    }

    #[test]
    fn prototypes_outside_enum_ignored() {
        assert!(match_line(
            "extern const char *bfd_printable_arch_mach (int, unsigned long);",
            Scope::File
        )
        .is_empty());
        assert!(match_line("enum bfd_architecture bfd_get_arch (const bfd *abfd);", Scope::File).is_empty());
        assert!(match_line("int x;", Scope::File).is_empty());
    }

    #[test]
    fn literal_values() {
        let known = HashMap::new();
        assert_eq!(parse_value("40", &known), Some(40));
        assert_eq!(parse_value("0x28", &known), Some(40));
        assert_eq!(parse_value("050", &known), Some(40));
        assert_eq!(parse_value("0b101000", &known), Some(40));
        assert_eq!(parse_value("40UL", &known), Some(40));
        assert_eq!(parse_value("(-(40))", &known), Some(-40));
        assert_eq!(parse_value("0", &known), Some(0));
    }

    #[test]
    fn identifier_values() {
        let known = HashMap::from([("EM_ARM".to_string(), 40)]);
        assert_eq!(parse_value("EM_ARM", &known), Some(40));
        assert_eq!(parse_value("EM_MIPS", &known), None);
        assert_eq!(parse_value("EM_ARM + 1", &known), Some(41));
    }

    #[test]
    fn binary_operators_follow_c_precedence() {
        let known = HashMap::from([("bfd_arch_unknown".to_string(), 0)]);
        assert_eq!(parse_value("(1) + (2)", &known), Some(3));
        assert_eq!(parse_value("bfd_arch_unknown + 1", &known), Some(1));
        assert_eq!(parse_value("1 << 4 | 1", &known), Some(17));
        assert_eq!(parse_value("2 + 3 * 4", &known), Some(14));
        assert_eq!(parse_value("(2 + 3) * 4", &known), Some(20));
        assert_eq!(parse_value("10 - 4 - 3", &known), Some(3));
        assert_eq!(parse_value("0xff & ~0x0f", &known), Some(0xf0));
        assert_eq!(parse_value("-(1 << 2)", &known), Some(-4));
    }

    #[test]
    fn unevaluable_expressions() {
        let known = HashMap::new();
        assert_eq!(parse_value("sizeof (int)", &known), None);
        assert_eq!(parse_value("(1 + 2", &known), None);
        assert_eq!(parse_value("1 +", &known), None);
        assert_eq!(parse_value("1 / 0", &known), None);
        assert_eq!(parse_value("1 << 64", &known), None);
        assert_eq!(parse_value("\"2.40\"", &known), None);
    }
}
