//! Stylesheet references: `@import`, `@use` and `@forward` rules.
//!
//! Only quoted targets are references. Remote URLs (`https://...`, `//cdn`,
//! `data:`) and Sass built-in modules (`sass:math`) are skipped.

use regex::Regex;

use super::{SyntaxError, line_at, push_unique};

pub(crate) fn extract(content: &str, scss: bool) -> Result<Vec<String>, SyntaxError> {
    let code = strip_comments(content, scss)?;
    let mut out = Vec::new();

    let (Ok(rules), Ok(quoted_targets)) = (
        Regex::new(r"@(?:import|use|forward)\s+([^;{}]+)"),
        Regex::new(r#"'([^'\n]*)'|"([^"\n]*)""#),
    ) else {
        return Ok(out);
    };

    for rule in rules.captures_iter(&code) {
        let Some(targets) = rule.get(1) else {
            continue;
        };
        for quoted in quoted_targets.captures_iter(targets.as_str()) {
            let Some(target) = quoted.get(1).or_else(|| quoted.get(2)) else {
                continue;
            };
            let target = target.as_str();
            if !target.is_empty() && !is_remote(target) && !target.starts_with("sass:") {
                push_unique(&mut out, target);
            }
        }
    }

    Ok(out)
}

fn is_remote(target: &str) -> bool {
    target.starts_with("//") || target.starts_with("data:") || target.contains("://")
}

/// Replaces comments with whitespace, keeping line breaks and quoted text intact.
fn strip_comments(content: &str, scss: bool) -> Result<String, SyntaxError> {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.char_indices().peekable();
    let mut quote: Option<char> = None;
    let mut prev = '\n';

    while let Some((i, c)) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some((_, escaped)) = chars.next() {
                    out.push(escaped);
                }
            } else if c == q || c == '\n' {
                quote = None;
            }
            prev = c;
            continue;
        }

        match (c, chars.peek().map(|&(_, n)| n)) {
            ('\'' | '"', _) => {
                quote = Some(c);
                out.push(c);
            }
            ('/', Some('*')) => {
                let Some(end) = content[i + 2..].find("*/") else {
                    return Err(SyntaxError::new(line_at(content, i), "unterminated block comment"));
                };
                let comment = &content[i..i + 2 + end + 2];
                out.extend(comment.chars().map(|ch| if ch == '\n' { '\n' } else { ' ' }));
                while chars.peek().is_some_and(|&(j, _)| j < i + comment.len()) {
                    chars.next();
                }
            }
            // `url(http://...)` is not a line comment
            ('/', Some('/')) if scss && prev != ':' => {
                while chars.peek().is_some_and(|&(_, n)| n != '\n') {
                    chars.next();
                }
            }
            _ => out.push(c),
        }
        prev = c;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_imports() {
        let src = r#"
@import "./reset.css";
@import url('../theme/colors.css') screen;
@import url("https://fonts.example.com/inter.css");
/* @import './commented.css'; */
body { background: url('./not-an-import.png'); }
"#;
        assert_eq!(extract(src, false).unwrap(), vec!["./reset.css", "../theme/colors.css"]);
    }

    #[test]
    fn test_scss_use_and_forward() {
        let src = r"
@use 'sass:math';
@use '../tokens/spacing' as spacing;
@forward './mixins' show respond;
// @use './line-commented';
@import 'a', 'b';
";
        assert_eq!(
            extract(src, true).unwrap(),
            vec!["../tokens/spacing", "./mixins", "a", "b"]
        );
    }

    #[test]
    fn test_unterminated_comment() {
        let err = extract("a {}\n/* open\n", false).unwrap_err();
        assert_eq!(err.line, 2);
    }
}
