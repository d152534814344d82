//! Relaxed-syntax lowerer
//!
//! Line-oriented preprocessor that converts the indented-block "sugar" used
//! in `pre`/`post` phases into canonical template delimiters. Prompt phase
//! content is never modified. The lowerer runs before the parser, so
//! validation only ever sees canonical form.
//!
//! Contracts: idempotent on already-delimited input; preserves empty lines
//! and indentation byte-for-byte.

use std::sync::LazyLock;

use regex::Regex;

use super::PHASE_HEADING_RE;

/// Keywords that open or close a control block
const CONTROL_KEYWORDS: &[&str] = &[
    "if", "elif", "else", "endif", "for", "endfor", "set", "endset", "with", "endwith",
];

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)([A-Za-z_][A-Za-z0-9_]*)(.*)$").expect("token pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Outside any phase, or inside a prompt phase: emit unchanged
    Verbatim,
    /// Inside a pre/post phase: apply the lowering rules
    Sugar,
}

/// Lower a whole document, rewriting only pre/post phase bodies
pub fn lower(source: &str) -> String {
    let mut mode = Mode::Verbatim;
    let mut out: Vec<String> = Vec::new();

    for line in source.split('\n') {
        if let Some(caps) = PHASE_HEADING_RE.captures(line) {
            mode = match caps[1].to_ascii_lowercase().as_str() {
                "pre" | "post" => Mode::Sugar,
                _ => Mode::Verbatim,
            };
            out.push(line.to_string());
            continue;
        }
        match mode {
            Mode::Verbatim => out.push(line.to_string()),
            Mode::Sugar => out.push(lower_line(line)),
        }
    }

    out.join("\n")
}

/// Lower a single pre/post line
fn lower_line(line: &str) -> String {
    // Already-delimited lines pass through so the lowerer is idempotent
    if line.contains("{{") || line.contains("}}") || line.contains("{%") || line.contains("%}") {
        return line.to_string();
    }

    let Some(caps) = TOKEN_RE.captures(line) else {
        // Blank lines, comments, stray punctuation
        return line.to_string();
    };

    let indent = &caps[1];
    let token = &caps[2];
    let rest = &caps[3];

    // A control keyword must stand alone or be followed by whitespace;
    // `set x = 1` is a statement, `set('x', 1)` is a function call.
    if CONTROL_KEYWORDS.contains(&token) && (rest.is_empty() || rest.starts_with(char::is_whitespace))
    {
        return format!("{}{{% {} %}}", indent, line.trim());
    }

    if rest.starts_with('(') {
        return format!("{}{{{{ {} }}}}", indent, line.trim());
    }

    line.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_lines_wrapped() {
        let src = "# pre: a\nif count > 3\nendif";
        let lowered = lower(src);
        assert_eq!(lowered, "# pre: a\n{% if count > 3 %}\n{% endif %}");
    }

    #[test]
    fn test_function_call_wrapped() {
        let src = "# post: a\nset('x', 1)";
        assert_eq!(lower(src), "# post: a\n{{ set('x', 1) }}");
    }

    #[test]
    fn test_set_statement_vs_set_call() {
        assert_eq!(lower("# pre: a\nset x = 1"), "# pre: a\n{% set x = 1 %}");
        assert_eq!(lower("# pre: a\nset('x', 1)"), "# pre: a\n{{ set('x', 1) }}");
    }

    #[test]
    fn test_indentation_preserved() {
        let src = "# pre: a\nif cond\n    set('x', 1)\nendif";
        let expected = "# pre: a\n{% if cond %}\n    {{ set('x', 1) }}\n{% endif %}";
        assert_eq!(lower(src), expected);
    }

    #[test]
    fn test_prompt_phase_untouched() {
        let src = "# prompt: a\nif cond\nset('x', 1)";
        assert_eq!(lower(src), src);
    }

    #[test]
    fn test_idempotent_on_canonical_input() {
        let src = "# pre: a\n{% if cond %}\n  {{ set('x', 1) }}\n{% endif %}\n# prompt: a\nhi";
        assert_eq!(lower(src), src);
        assert_eq!(lower(&lower(src)), lower(src));
    }

    #[test]
    fn test_blank_lines_and_comments_preserved() {
        let src = "# pre: a\n\n# just a note\n   \nplain words";
        assert_eq!(lower(src), src);
    }

    #[test]
    fn test_post_phase_lowered_after_prompt() {
        let src = "# prompt: a\nif untouched\n# post: a\nif cond\nendif";
        let expected = "# prompt: a\nif untouched\n# post: a\n{% if cond %}\n{% endif %}";
        assert_eq!(lower(src), expected);
    }
}
