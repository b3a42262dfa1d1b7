//! The module wrapper.
//!
//! Every wrapped file is emitted as
//!
//! ```text
//! window.registerModule([["./b","b.js"],["left-pad","module/left-pad/index.js"]], "a.js", function (module, exports, require) {
//! <original text, byte for byte>
//! });
//! ```
//!
//! The header is a single line, so line `n` of the original text is line
//! `n + 1` of the wrapped module and source maps only need a line offset.

use webrequire_graph::{FileId, FileNode};

use crate::Result;
use crate::concat::ConcatPart;

/// Closes the registration call opened by [`wrapper_header`].
pub const WRAPPER_FOOTER: &str = "});\n";

/// The opening line of a registration call.
pub fn wrapper_header(pairs: &[(String, String)], name: &FileId) -> Result<String> {
    Ok(format!(
        "window.registerModule({}, {}, function (module, exports, require) {{\n",
        serde_json::to_string(pairs)?,
        serde_json::to_string(name.as_str())?
    ))
}

/// The concatenation parts a node contributes to its pack.
///
/// The loader is emitted unwrapped. Every other node becomes header, body
/// and footer; only the body is named so only it is source mapped.
pub fn module_parts(node: &FileNode) -> Result<Vec<ConcatPart>> {
    let body = ConcatPart::named(node.contents.clone(), node.id.as_str())
        .with_source_map(node.source_map.clone());

    if !node.is_wrapped() {
        return Ok(vec![body]);
    }

    Ok(vec![
        ConcatPart::text(wrapper_header(&node.wrapper_pairs(), &node.id)?),
        body,
        ConcatPart::text(WRAPPER_FOOTER),
    ])
}

/// The wrapped text of a single node.
pub fn wrap(node: &FileNode) -> Result<String> {
    let mut out = String::new();
    for part in module_parts(node)? {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&part.text);
    }
    Ok(out)
}

/// Text of a module as it appears in the pack, for callers that only have
/// the raw pieces.
pub fn wrap_text(pairs: &[(String, String)], name: &FileId, body: &str) -> Result<String> {
    let mut out = wrapper_header(pairs, name)?;
    out.push_str(body);
    if !body.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(WRAPPER_FOOTER);
    Ok(out)
}

/// Read the requirement pairs and module name back out of a header line.
pub fn parse_wrapper_header(line: &str) -> Option<(Vec<(String, String)>, String)> {
    let arguments = line
        .trim_end()
        .strip_prefix("window.registerModule(")?
        .strip_suffix(", function (module, exports, require) {")?;
    serde_json::from_str(&format!("[{arguments}]")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> FileId {
        s.parse().unwrap()
    }

    #[test]
    fn header_carries_pairs_and_name() {
        let pairs = vec![
            ("./b".to_string(), "b.js".to_string()),
            ("left-pad".to_string(), "module/left-pad/index.js".to_string()),
        ];
        let header = wrapper_header(&pairs, &id("lib/a.js")).unwrap();
        assert_eq!(
            header,
            "window.registerModule([[\"./b\",\"b.js\"],[\"left-pad\",\"module/left-pad/index.js\"]], \"lib/a.js\", function (module, exports, require) {\n"
        );
        assert_eq!(header.matches('\n').count(), 1);
    }

    #[test]
    fn specifiers_are_escaped() {
        let pairs = vec![("./we\"ird".to_string(), "we\"ird.js".to_string())];
        let header = wrapper_header(&pairs, &id("a.js")).unwrap();
        assert!(header.contains(r#"[["./we\"ird","we\"ird.js"]]"#));
    }

    #[test]
    fn headers_parse_back() {
        let pairs = vec![("./b".to_string(), "b.js".to_string())];
        let header = wrapper_header(&pairs, &id("a.js")).unwrap();
        assert_eq!(
            parse_wrapper_header(&header),
            Some((pairs, "a.js".to_string()))
        );
        assert_eq!(parse_wrapper_header("var x = 1;"), None);
    }

    #[test]
    fn body_is_kept_verbatim() {
        let text = wrap_text(&[], &id("a.js"), "module.exports = 1;").unwrap();
        assert_eq!(
            text,
            "window.registerModule([], \"a.js\", function (module, exports, require) {\nmodule.exports = 1;\n});\n"
        );
    }
}
