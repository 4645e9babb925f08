//! Script regions embedded in component files (Svelte, Vue).
//!
//! Only the bodies of `<script>` elements are scanned. A component may carry
//! more than one (`<script context="module">` next to the instance script, or
//! Vue's `<script setup>`), and the references of all of them are merged.

use super::script::{self, ScriptFlavor};
use super::{SyntaxError, line_at, push_unique};

const OPEN_TAG: &str = "<script";
const CLOSE_TAG: &str = "</script";

pub(crate) fn extract(content: &str) -> Result<Vec<String>, SyntaxError> {
    let mut out = Vec::new();
    let mut pos = 0;

    while let Some(found) = next_script(content, pos) {
        let Some(tag_end) = content[found..].find('>').map(|i| found + i) else {
            return Err(SyntaxError::new(line_at(content, found), "unclosed <script> tag"));
        };
        let attrs = &content[found + OPEN_TAG.len()..tag_end];
        if attrs.trim_end().ends_with('/') {
            pos = tag_end + 1;
            continue;
        }

        let body_start = tag_end + 1;
        let Some(body_end) = content[body_start..].find(CLOSE_TAG).map(|i| body_start + i) else {
            return Err(SyntaxError::new(line_at(content, found), "unclosed <script> element"));
        };

        let line_offset = line_at(content, body_start) - 1;
        let specifiers = script::extract(&content[body_start..body_end], flavor_of(attrs))
            .map_err(|err| SyntaxError::new(err.line + line_offset, err.message))?;
        for specifier in &specifiers {
            push_unique(&mut out, specifier);
        }

        pos = body_end + CLOSE_TAG.len();
    }

    Ok(out)
}

/// Position of the next `<script` opening tag at or after `from`, skipping markup comments.
fn next_script(content: &str, mut from: usize) -> Option<usize> {
    loop {
        let rest = &content[from..];
        let script = rest.find(OPEN_TAG)?;
        if let Some(comment) = rest.find("<!--")
            && comment < script
        {
            let after = from + comment + 4;
            from = content[after..].find("-->").map_or(content.len(), |i| after + i + 3);
            continue;
        }

        let at = from + script;
        let boundary = content[at + OPEN_TAG.len()..].chars().next();
        if matches!(boundary, Some(c) if c.is_whitespace() || c == '>' || c == '/') {
            return Some(at);
        }
        from = at + OPEN_TAG.len();
    }
}

fn flavor_of(attrs: &str) -> ScriptFlavor {
    let lang = ["tsx", "ts"]
        .into_iter()
        .find(|lang| attrs.contains(&format!("lang=\"{lang}\"")) || attrs.contains(&format!("lang='{lang}'")));
    match lang {
        Some("tsx") => ScriptFlavor::Tsx,
        Some(_) => ScriptFlavor::TypeScript,
        None => ScriptFlavor::JavaScript,
    }
}
