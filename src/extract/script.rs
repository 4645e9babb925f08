//! JavaScript and TypeScript reference extraction.
//!
//! Sources are parsed with the tree-sitter grammars for JavaScript (which
//! includes JSX), TypeScript and TSX. The syntax tree is walked for module
//! references:
//!
//! - `import x from 's'`, `import type { T } from 's'`, `import 's'`
//! - `export * from 's'`, `export * as ns from 's'`, `export { a } from 's'`
//! - `import('s')` with a literal argument
//! - `require('s')`, including TypeScript's `import x = require('s')`
//!
//! Member accesses (`import.meta`, `module.require(..)`) are not references.
//! A tree containing error or missing nodes is reported at the first one.

use tree_sitter::{Language, Node, Parser};

use super::{SyntaxError, push_unique};

/// Grammar used to parse a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFlavor {
    /// `.js .jsx .mjs .cjs`, markup allowed
    JavaScript,
    /// `.ts .mts .cts`
    TypeScript,
    /// `.tsx`
    Tsx,
}

impl ScriptFlavor {
    fn language(self) -> Language {
        match self {
            Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

pub(crate) fn extract(content: &str, flavor: ScriptFlavor) -> Result<Vec<String>, SyntaxError> {
    let mut parser = Parser::new();
    parser
        .set_language(&flavor.language())
        .map_err(|err| SyntaxError::new(1, format!("cannot load {flavor:?} grammar: {err}")))?;
    let tree = parser
        .parse(content, None)
        .ok_or_else(|| SyntaxError::new(1, "parser produced no syntax tree"))?;

    let root = tree.root_node();
    if root.has_error()
        && let Some(err) = first_error(root, content)
    {
        return Err(err);
    }

    let source = content.as_bytes();
    let mut out = Vec::new();
    visit(root, |node| {
        if let Some(specifier) = reference_of(node, source) {
            push_unique(&mut out, specifier);
        }
    });
    Ok(out)
}

/// Pre-order walk over every node of the tree.
fn visit<'t>(root: Node<'t>, mut f: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    loop {
        f(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

fn first_error(root: Node<'_>, content: &str) -> Option<SyntaxError> {
    let mut found = None;
    visit(root, |node| {
        if found.is_some() || !(node.is_error() || node.is_missing()) {
            return;
        }
        let line = node.start_position().row + 1;
        found = Some(if node.is_missing() {
            SyntaxError::new(line, format!("missing `{}`", node.kind()))
        } else {
            let text = content.get(node.byte_range()).unwrap_or_default();
            let snippet: String = text.lines().next().unwrap_or_default().chars().take(40).collect();
            SyntaxError::new(line, format!("unexpected syntax near `{}`", snippet.trim()))
        });
    });
    found
}

/// Specifier referenced by `node`, if it is an import, re-export or require.
fn reference_of<'s>(node: Node<'_>, source: &'s [u8]) -> Option<&'s str> {
    match node.kind() {
        "import_statement" | "export_statement" => {
            let literal = node.child_by_field_name("source").or_else(|| from_clause(node))?;
            string_value(literal, source)
        }
        "import_require_clause" => string_value(node.child_by_field_name("source")?, source),
        "call_expression" => {
            let function = node.child_by_field_name("function")?;
            let arguments = node.child_by_field_name("arguments")?;
            let first = arguments.named_child(0)?;
            match function.kind() {
                "import" => string_value(first, source),
                "identifier"
                    if function.utf8_text(source).ok() == Some("require")
                        && arguments.named_child_count() == 1 =>
                {
                    string_value(first, source)
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// String child that directly follows a `from` keyword.
fn from_clause<'t>(node: Node<'t>) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).find(|child| {
        child.kind() == "string" && child.prev_sibling().is_some_and(|prev| prev.kind() == "from")
    })
}

/// Contents of a string literal or substitution-free template, without quotes.
fn string_value<'s>(node: Node<'_>, source: &'s [u8]) -> Option<&'s str> {
    match node.kind() {
        "string" => {}
        "template_string" => {
            let mut cursor = node.walk();
            if node.named_children(&mut cursor).any(|c| c.kind() == "template_substitution") {
                return None;
            }
        }
        _ => return None,
    }
    let text = node.utf8_text(source).ok()?;
    text.get(1..text.len().checked_sub(1)?)
}
