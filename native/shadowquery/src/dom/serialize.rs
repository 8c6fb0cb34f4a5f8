//! Markup serialization
//!
//! Shadow roots are written back as declarative templates, so serialized
//! output parses to the same tree.

use super::document::DocumentView;
use super::node::{NodeId, NodeKind};

enum StackEntry {
    Enter(NodeId),
    Close(&'static str),
    CloseElement(NodeId),
}

/// Serialize a node and its subtree, including attached shadow roots.
///
/// Iterative with an explicit stack so deep trees cannot overflow.
pub fn to_markup(view: &DocumentView<'_>, node_id: NodeId) -> String {
    let mut buf = String::with_capacity(1024);
    let mut stack: Vec<StackEntry> = Vec::with_capacity(64);
    stack.push(StackEntry::Enter(node_id));

    while let Some(entry) = stack.pop() {
        let current_id = match entry {
            StackEntry::Close(name) => {
                buf.push_str("</");
                buf.push_str(name);
                buf.push('>');
                continue;
            }
            StackEntry::CloseElement(id) => {
                buf.push_str("</");
                buf.push_str(view.node_name(id).unwrap_or(""));
                buf.push('>');
                continue;
            }
            StackEntry::Enter(id) => id,
        };

        let Some(node) = view.get_node(current_id) else {
            continue;
        };

        match node.kind {
            NodeKind::Element => {
                buf.push('<');
                buf.push_str(view.node_name(current_id).unwrap_or(""));
                for (name, value) in view.get_attribute_values(current_id) {
                    buf.push(' ');
                    buf.push_str(name);
                    buf.push_str("=\"");
                    escape_to_buf(value, &mut buf);
                    buf.push('"');
                }

                if !node.has_children() && node.shadow_root.is_none() {
                    buf.push_str("/>");
                    continue;
                }
                buf.push('>');
                stack.push(StackEntry::CloseElement(current_id));
                push_children_reversed(view, current_id, &mut stack);
                if let Some(root) = node.shadow_root {
                    stack.push(StackEntry::Enter(root));
                }
            }
            NodeKind::ShadowRoot => {
                let mode = node.mode.map_or("open", |m| m.as_str());
                buf.push_str("<template shadowrootmode=\"");
                buf.push_str(mode);
                buf.push_str("\">");
                stack.push(StackEntry::Close("template"));
                push_children_reversed(view, current_id, &mut stack);
            }
            NodeKind::Document => push_children_reversed(view, current_id, &mut stack),
            NodeKind::Text => escape_to_buf(view.text_content(current_id).unwrap_or(""), &mut buf),
            NodeKind::CData => {
                buf.push_str("<![CDATA[");
                buf.push_str(view.text_content(current_id).unwrap_or(""));
                buf.push_str("]]>");
            }
            NodeKind::Comment => {
                buf.push_str("<!--");
                buf.push_str(view.text_content(current_id).unwrap_or(""));
                buf.push_str("-->");
            }
            NodeKind::ProcessingInstruction => {
                buf.push_str("<?");
                buf.push_str(view.node_name(current_id).unwrap_or(""));
                buf.push_str("?>");
            }
        }
    }

    buf
}

/// Push children last-to-first so they pop in document order
fn push_children_reversed(view: &DocumentView<'_>, id: NodeId, stack: &mut Vec<StackEntry>) {
    let mut child_id = view.get_node(id).and_then(|n| n.last_child);
    while let Some(cid) = child_id {
        stack.push(StackEntry::Enter(cid));
        child_id = view.get_node(cid).and_then(|n| n.prev_sibling);
    }
}

#[inline]
fn escape_to_buf(s: &str, buf: &mut String) {
    for c in s.chars() {
        match c {
            '&' => buf.push_str("&amp;"),
            '<' => buf.push_str("&lt;"),
            '>' => buf.push_str("&gt;"),
            '"' => buf.push_str("&quot;"),
            _ => buf.push(c),
        }
    }
}
