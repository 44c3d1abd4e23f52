use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static BLOCK_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("block comment pattern compiles"));
static LINE_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(//|#).*").expect("line comment pattern compiles"));

/// Signals that a source file has nothing left to submit for classification.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EmptySource {
    /// The raw text was empty or whitespace only.
    #[error("source file is empty")]
    Blank,
    /// The raw text held only comments and blank lines.
    #[error("source file is empty after comment removal")]
    CommentsOnly,
}

/// Strip block comments, line comments and blank lines from source text.
///
/// Line comments start at the first `//` or `#` on a line, with no awareness of
/// string literals: `"http://host"` loses everything from `//` onward.
pub fn normalize(raw: &str) -> Result<String, EmptySource> {
    if raw.trim().is_empty() {
        return Err(EmptySource::Blank);
    }
    let without_blocks = BLOCK_COMMENT.replace_all(raw, "");
    let without_lines = LINE_COMMENT.replace_all(&without_blocks, "");
    let cleaned = without_lines
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    if cleaned.is_empty() {
        return Err(EmptySource::CommentsOnly);
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_line_comments_and_blank_lines() {
        let input = "// hello\nint x = 1; # trailing\n\n   \n";
        assert_eq!(normalize(input).unwrap(), "int x = 1;");
    }

    #[test]
    fn multi_line_block_comment_collapses() {
        let input = "a();\n/* first\n * second\n */\nb();\n";
        assert_eq!(normalize(input).unwrap(), "a();\nb();");
    }

    #[test]
    fn block_comments_are_non_greedy() {
        let input = "x /* one */ y /* two */ z";
        assert_eq!(normalize(input).unwrap(), "x  y  z");
    }

    #[test]
    fn string_literals_are_not_protected() {
        let input = "url = \"http://example.com\"\ncolor = \"#fff\"";
        assert_eq!(normalize(input).unwrap(), "url = \"http:\ncolor = \"");
    }

    #[test]
    fn crlf_line_endings_are_trimmed() {
        let input = "int a;\r\n\r\n  int b; // c\r\n";
        assert_eq!(normalize(input).unwrap(), "int a;\nint b;");
    }

    #[test]
    fn blank_input_is_reported() {
        assert_eq!(normalize(""), Err(EmptySource::Blank));
        assert_eq!(normalize(" \n\t\n"), Err(EmptySource::Blank));
    }

    #[test]
    fn comment_only_input_is_reported() {
        let input = "/* license\n header */\n# shebang-ish\n// nothing here\n";
        assert_eq!(normalize(input), Err(EmptySource::CommentsOnly));
    }

    fn code_line() -> impl Strategy<Value = String> {
        proptest::string::string_regex(concat!(
            "[ \t]{0,3}",
            "[A-Za-z0-9_(){};=,.+\\-\"' ]{0,24}",
            "( /\\*[a-z ]{0,6}\\*/ )?",
            "(//[a-z ]{0,8}|#[a-z ]{0,8})?",
            "[ \t]{0,3}"
        ))
        .unwrap()
    }

    proptest! {
        #[test]
        fn retained_lines_are_trimmed_and_non_empty(
            lines in proptest::collection::vec(code_line(), 0..16)
        ) {
            let input = lines.join("\n");
            if let Ok(output) = normalize(&input) {
                prop_assert!(!output.ends_with('\n'));
                for line in output.split('\n') {
                    prop_assert!(!line.is_empty());
                    prop_assert_eq!(line, line.trim());
                }
            }
        }

        #[test]
        fn normalizing_twice_is_stable(
            lines in proptest::collection::vec(code_line(), 0..16)
        ) {
            let input = lines.join("\n");
            if let Ok(once) = normalize(&input) {
                prop_assert!(!once.contains("/*"));
                prop_assert_eq!(normalize(&once), Ok(once.clone()));
            }
        }

        #[test]
        fn block_comments_never_survive(
            before in "[a-z ;]{0,12}",
            body in proptest::collection::vec("[a-z ]{0,12}", 1..6),
            after in "[a-z ;]{0,12}"
        ) {
            let input = format!("{before}/*{}*/{after}", body.join("\n"));
            match normalize(&input) {
                Ok(output) => {
                    prop_assert!(!output.contains("/*"));
                    prop_assert!(!output.contains("*/"));
                    let expected = format!("{before}{after}");
                    prop_assert_eq!(output, expected.trim());
                }
                Err(empty) => {
                    prop_assert_eq!(empty, EmptySource::CommentsOnly);
                    let rest = format!("{before}{after}");
                    prop_assert!(rest.trim().is_empty());
                }
            }
        }
    }
}
