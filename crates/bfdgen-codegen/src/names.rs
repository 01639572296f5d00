//! Identifier and literal formatting shared by the renderers.

/// Macro/constant suffix for an architecture: uppercase, non-alphanumerics as `_`.
pub fn macro_name(bfd_name: &str) -> String {
    bfd_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// A C string literal, quotes included.
pub fn c_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_ascii_control() => out.push_str(&format!("\\{:03o}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Text safe to place inside a C block comment.
pub fn c_comment(text: &str) -> String {
    text.replace("*/", "* /")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macro_names() {
        assert_eq!(macro_name("i386"), "I386");
        assert_eq!(macro_name("386"), "386");
        assert_eq!(macro_name("m68k"), "M68K");
        assert_eq!(macro_name("sh-dsp"), "SH_DSP");
    }

    #[test]
    fn c_string_escapes() {
        assert_eq!(c_string("Intel 386"), "\"Intel 386\"");
        assert_eq!(c_string(r#"a "b" \c"#), r#""a \"b\" \\c""#);
        assert_eq!(c_string("tab\there"), "\"tab\\there\"");
        assert_eq!(c_string("\u{1}"), "\"\\001\"");
    }

    #[test]
    fn comment_terminator_defused() {
        assert_eq!(c_comment("ARM */ evil"), "ARM * / evil");
    }
}
