// Plain-text rendering of rich-text document trees.

use serde_json::Value;

use super::{Node, NodeKind};

/// One level of list nesting.
pub const INDENT_UNIT: &str = "  ";

const MAX_HEADING_LEVEL: u64 = 6;

/// Render a document tree as plain text.
///
/// Returns an empty string when `doc` is absent or has no `content` array.
/// Block nodes are rendered in document order and the result is trimmed at
/// both ends. List items nest one [`INDENT_UNIT`] per level starting from
/// `indent_level`.
///
/// Never panics: unrecognized nodes either pass their children through or
/// render as nothing.
pub fn flatten(doc: Option<&Node>, indent_level: usize) -> String {
    let Some(doc) = doc else {
        return String::new();
    };
    let Some(content) = doc.content.as_deref() else {
        return String::new();
    };

    let mut out = String::new();
    for node in content {
        render_block(node, indent_level, &mut out);
    }
    out.trim().to_string()
}

/// [`flatten`] for raw JSON, e.g. a description field straight from the tracker.
pub fn flatten_value(value: &Value, indent_level: usize) -> String {
    if !value.is_object() {
        return String::new();
    }
    flatten(Some(&Node::from_value(value)), indent_level)
}

fn render_block(node: &Node, indent_level: usize, out: &mut String) {
    match &node.kind {
        NodeKind::Paragraph => {
            render_inline(node.children(), out);
            out.push('\n');
        }
        NodeKind::BulletList => render_list(node, indent_level, out, |_| "* ".to_string()),
        NodeKind::OrderedList => {
            render_list(node, indent_level, out, |ordinal| format!("{ordinal}. "))
        }
        NodeKind::Heading => {
            let level = node.attr_u64("level").unwrap_or(1).clamp(1, MAX_HEADING_LEVEL);
            out.push_str(&"#".repeat(level as usize));
            out.push(' ');
            render_inline(node.children(), out);
            out.push_str("\n\n");
        }
        NodeKind::CodeBlock => {
            let code =
                node.children().first().and_then(|child| child.text.as_deref()).unwrap_or("");
            out.push_str("```");
            if let Some(language) = node.attr_str("language") {
                out.push_str(language);
            }
            out.push('\n');
            out.push_str(code);
            out.push_str("\n```\n\n");
        }
        NodeKind::Panel => {
            out.push_str("--- Panel ---\n");
            out.push_str(&flatten(Some(node), indent_level));
            out.push_str("\n--- End Panel ---\n\n");
        }
        NodeKind::MediaSingle => {
            let url = node
                .children()
                .first()
                .filter(|child| child.kind == NodeKind::Media)
                .and_then(|media| media.attr_str("url"));
            if let Some(url) = url {
                out.push_str(&format!("[Image: {url}]\n\n"));
            }
        }
        NodeKind::Rule => out.push_str("---\n\n"),
        _ => {
            if node.content.is_some() {
                out.push_str(&flatten(Some(node), indent_level));
            }
        }
    }
}

fn render_list<F>(list: &Node, indent_level: usize, out: &mut String, prefix: F)
where
    F: Fn(usize) -> String,
{
    let indent = INDENT_UNIT.repeat(indent_level);
    let items = list.children().iter().filter(|child| child.kind == NodeKind::ListItem);

    for (index, item) in items.enumerate() {
        let body = flatten(Some(item), indent_level + 1);
        out.push_str(&indent);
        out.push_str(&prefix(index + 1));
        out.push_str(body.trim_end());
        out.push('\n');
    }
}

fn render_inline(children: &[Node], out: &mut String) {
    for child in children {
        match child.kind {
            NodeKind::Text => {
                if let Some(text) = &child.text {
                    out.push_str(text);
                }
            }
            NodeKind::HardBreak => out.push('\n'),
            _ => {}
        }
    }
}
