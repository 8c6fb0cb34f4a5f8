//! Shadow Document - Arena-based DOM with declarative shadow roots
//!
//! Efficient DOM storage with:
//! - Arena allocation for nodes and attributes
//! - NodeId indices for traversal
//! - String interning for names and character data
//! - Shadow roots as arena nodes linked to their host both ways
//!
//! A `<template shadowrootmode="open|closed">` whose parent is an element
//! without a shadow root becomes that element's shadow root. The template
//! element itself is not materialised.

use super::node::{DomAttribute, DomNode, NodeId, NodeKind, ShadowRootMode};
use super::strings::StringPool;
use crate::reader::{MarkupEvent, SliceReader, Tag};
use crate::shadow::tree::{BoundaryTree, NodeClass};

/// The document node is always the first arena entry
pub const DOCUMENT_NODE: NodeId = 0;

/// Elements that never have content
const VOID_ELEMENTS: &[&[u8]] = &[
    b"area", b"base", b"br", b"col", b"embed", b"hr", b"img", b"input", b"link", b"meta", b"source",
    b"track", b"wbr",
];

#[inline]
fn is_void_element(name: &[u8]) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// A parsed document that owns all of its data, so it can be stored in a
/// ResourceArc without lifetime issues.
pub struct ShadowDocument {
    nodes: Vec<DomNode>,
    attributes: Vec<DomAttribute>,
    pub strings: StringPool,
    /// First element child of the document node
    root_element: Option<NodeId>,
}

impl ShadowDocument {
    /// Parse markup (lenient: never fails)
    pub fn parse(input: &[u8]) -> Self {
        let mut builder = DomBuilder::new();
        for event in SliceReader::new(input) {
            builder.handle_event(event);
        }
        builder.finish()
    }

    /// Create a borrowed view for querying. O(1).
    pub fn as_view(&self) -> DocumentView<'_> {
        DocumentView {
            nodes: &self.nodes,
            attributes: &self.attributes,
            strings: &self.strings,
            root_element: self.root_element,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn root_name(&self) -> Option<&str> {
        self.root_element.and_then(|id| self.as_view().node_name(id))
    }
}

/// Open element on the builder stack
struct Frame {
    node: NodeId,
    name: Vec<u8>,
}

/// Builds the arena from reader events
struct DomBuilder {
    nodes: Vec<DomNode>,
    attributes: Vec<DomAttribute>,
    strings: StringPool,
    root_element: Option<NodeId>,
    stack: Vec<Frame>,
    /// Adjacent text events are merged into one node
    pending_text: Vec<u8>,
}

impl DomBuilder {
    fn new() -> Self {
        let mut nodes = Vec::with_capacity(256);
        nodes.push(DomNode::document());
        DomBuilder {
            nodes,
            attributes: Vec::with_capacity(128),
            strings: StringPool::new(),
            root_element: None,
            stack: Vec::with_capacity(32),
            pending_text: Vec::new(),
        }
    }

    fn finish(mut self) -> ShadowDocument {
        self.flush_text();
        ShadowDocument {
            nodes: self.nodes,
            attributes: self.attributes,
            strings: self.strings,
            root_element: self.root_element,
        }
    }

    #[inline]
    fn current(&self) -> NodeId {
        self.stack.last().map_or(DOCUMENT_NODE, |frame| frame.node)
    }

    fn handle_event(&mut self, event: MarkupEvent<'_>) {
        if let MarkupEvent::Text(content) = &event {
            self.pending_text.extend_from_slice(content);
            return;
        }
        self.flush_text();

        match event {
            MarkupEvent::StartTag(tag) => self.open_element(&tag, false),
            MarkupEvent::EmptyTag(tag) => self.open_element(&tag, true),
            MarkupEvent::EndTag(name) => self.close_element(name),
            MarkupEvent::CData(content) => self.append_data(NodeKind::CData, content),
            MarkupEvent::Comment(content) => self.append_data(NodeKind::Comment, content),
            MarkupEvent::ProcessingInstruction(target) => {
                self.append_data(NodeKind::ProcessingInstruction, target)
            }
            MarkupEvent::Text(_) => {}
        }
    }

    fn flush_text(&mut self) {
        if self.pending_text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.pending_text);
        self.append_data(NodeKind::Text, &text);
    }

    fn append_data(&mut self, kind: NodeKind, content: &[u8]) {
        let parent = self.current();
        let content_id = self.strings.intern(content);
        let id = self.push_node(DomNode::character_data(kind, content_id, parent));
        self.link_child(parent, id);
    }

    fn open_element(&mut self, tag: &Tag<'_>, self_closing: bool) {
        let parent = self.current();

        if let Some(mode) = self.declarative_shadow_mode(tag, parent) {
            let root = self.push_node(DomNode::shadow_root(parent, mode));
            self.nodes[parent as usize].shadow_root = Some(root);
            if !self_closing {
                self.stack.push(Frame { node: root, name: tag.name.to_vec() });
            }
            return;
        }

        let name_id = self.strings.intern(tag.name);
        let mut node = DomNode::element(name_id, parent);

        let attr_start = self.attributes.len() as u32;
        for attr in tag.attributes.iter().take(u16::MAX as usize) {
            let name_id = self.strings.intern(attr.name);
            let value_id = self.strings.intern(&attr.value);
            self.attributes.push(DomAttribute { name_id, value_id });
        }
        node.attr_start = attr_start;
        node.attr_count = (self.attributes.len() as u32 - attr_start) as u16;

        let id = self.push_node(node);
        self.link_child(parent, id);

        if self.root_element.is_none() && parent == DOCUMENT_NODE {
            self.root_element = Some(id);
        }

        if !self_closing && !is_void_element(tag.name) {
            self.stack.push(Frame { node: id, name: tag.name.to_vec() });
        }
    }

    /// Mode of a template that declares a shadow root for `parent`
    fn declarative_shadow_mode(&self, tag: &Tag<'_>, parent: NodeId) -> Option<ShadowRootMode> {
        if !tag.name.eq_ignore_ascii_case(b"template") {
            return None;
        }
        let host = &self.nodes[parent as usize];
        if !host.is_element() || host.shadow_root.is_some() {
            return None;
        }
        tag.attribute_value("shadowrootmode").and_then(ShadowRootMode::from_attribute)
    }

    /// Pop to the nearest open element with this name; unmatched end tags
    /// are ignored
    fn close_element(&mut self, name: &[u8]) {
        if let Some(pos) = self.stack.iter().rposition(|frame| frame.name.eq_ignore_ascii_case(name)) {
            self.stack.truncate(pos);
        }
    }

    fn push_node(&mut self, node: DomNode) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        id
    }

    /// Link a child node to its parent
    fn link_child(&mut self, parent_id: NodeId, child_id: NodeId) {
        let last_child_opt = self.nodes[parent_id as usize].last_child;

        if let Some(last_child_id) = last_child_opt {
            self.nodes[child_id as usize].prev_sibling = Some(last_child_id);
            self.nodes[last_child_id as usize].next_sibling = Some(child_id);
        } else {
            self.nodes[parent_id as usize].first_child = Some(child_id);
        }
        self.nodes[parent_id as usize].last_child = Some(child_id);
    }
}

/// Borrowed view into a ShadowDocument
///
/// Copyable, so it can be handed to worker threads by value.
#[derive(Clone, Copy)]
pub struct DocumentView<'a> {
    nodes: &'a [DomNode],
    attributes: &'a [DomAttribute],
    pub strings: &'a StringPool,
    root_element: Option<NodeId>,
}

impl<'a> DocumentView<'a> {
    #[inline]
    pub fn document_node_id(&self) -> NodeId {
        DOCUMENT_NODE
    }

    pub fn root_element_id(&self) -> Option<NodeId> {
        self.root_element
    }

    #[inline]
    pub fn get_node(&self, id: NodeId) -> Option<&'a DomNode> {
        self.nodes.get(id as usize)
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get_node(id).map(|n| n.kind)
    }

    #[inline]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.get_node(id).is_some_and(DomNode::is_element)
    }

    /// Element name or processing instruction target
    pub fn node_name(&self, id: NodeId) -> Option<&'a str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Element | NodeKind::ProcessingInstruction => self.strings.get_str(node.name_id),
            _ => None,
        }
    }

    /// Character data of a text, CDATA or comment node
    pub fn text_content(&self, id: NodeId) -> Option<&'a str> {
        let node = self.get_node(id)?;
        match node.kind {
            NodeKind::Text | NodeKind::CData | NodeKind::Comment => self.strings.get_str(node.name_id),
            _ => None,
        }
    }

    /// Concatenated text of all light-tree descendants
    pub fn string_value(&self, id: NodeId) -> String {
        let mut out = String::new();
        if self.get_node(id).is_some_and(DomNode::is_text) {
            out.push_str(self.text_content(id).unwrap_or(""));
            return out;
        }
        for desc in self.descendants(id) {
            if self.get_node(desc).is_some_and(DomNode::is_text) {
                out.push_str(self.text_content(desc).unwrap_or(""));
            }
        }
        out
    }

    /// Attributes of an element
    pub fn attributes(&self, id: NodeId) -> &'a [DomAttribute] {
        let Some(node) = self.get_node(id) else {
            return &[];
        };
        let start = node.attr_start as usize;
        let end = start + node.attr_count as usize;
        self.attributes.get(start..end).unwrap_or(&[])
    }

    /// Attribute value by name (ASCII case-insensitive)
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&'a str> {
        self.attributes(id)
            .iter()
            .find(|attr| {
                self.strings
                    .get(attr.name_id)
                    .is_some_and(|n| n.eq_ignore_ascii_case(name.as_bytes()))
            })
            .and_then(|attr| self.strings.get_str(attr.value_id))
    }

    /// All attribute names and values, in source order
    pub fn get_attribute_values(&self, id: NodeId) -> Vec<(&'a str, &'a str)> {
        self.attributes(id)
            .iter()
            .filter_map(|attr| {
                let name = self.strings.get_str(attr.name_id)?;
                let value = self.strings.get_str(attr.value_id)?;
                Some((name, value))
            })
            .collect()
    }

    /// Parent in the light tree; None for the document and shadow roots
    #[inline]
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id).and_then(|n| n.parent)
    }

    /// Parent if it is an element
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent_of(id).filter(|&p| self.is_element(p))
    }

    #[inline]
    pub fn shadow_root_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id).and_then(|n| n.shadow_root)
    }

    #[inline]
    pub fn host_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id).and_then(|n| n.host)
    }

    pub fn shadow_mode(&self, id: NodeId) -> Option<ShadowRootMode> {
        self.get_node(id).and_then(|n| n.mode)
    }

    /// Iterate over children of a node (shadow roots excluded)
    pub fn children(&self, id: NodeId) -> ChildIter<'a> {
        let first = self.get_node(id).and_then(|n| n.first_child);
        ChildIter { view: *self, next: first }
    }

    /// Iterate over element children of a node
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + 'a {
        let view = *self;
        self.children(id).filter(move |&c| view.is_element(c))
    }

    /// Iterate over all light-tree descendants in document order
    pub fn descendants(&self, id: NodeId) -> DescendantIter<'a> {
        let mut stack = Vec::new();
        if let Some(node) = self.get_node(id) {
            let mut child_id = node.last_child;
            while let Some(cid) = child_id {
                stack.push(cid);
                child_id = self.get_node(cid).and_then(|n| n.prev_sibling);
            }
        }
        DescendantIter { view: *self, stack }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Iterator over child nodes
pub struct ChildIter<'a> {
    view: DocumentView<'a>,
    next: Option<NodeId>,
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.view.get_node(current).and_then(|n| n.next_sibling);
        Some(current)
    }
}

/// Iterator over descendant nodes (depth-first, document order)
pub struct DescendantIter<'a> {
    view: DocumentView<'a>,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for DescendantIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;

        // Children pushed in reverse so the first child is visited first
        if let Some(node) = self.view.get_node(current) {
            let mut child_id = node.last_child;
            while let Some(id) = child_id {
                self.stack.push(id);
                child_id = self.view.get_node(id).and_then(|n| n.prev_sibling);
            }
        }

        Some(current)
    }
}

impl BoundaryTree for DocumentView<'_> {
    type Node = NodeId;

    fn class_of(&self, node: NodeId) -> NodeClass {
        match self.kind(node) {
            Some(NodeKind::Element) => NodeClass::Element,
            Some(NodeKind::Document) => NodeClass::Document,
            Some(NodeKind::ShadowRoot) => NodeClass::ShadowRoot,
            _ => NodeClass::Other,
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.parent_of(node)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        DocumentView::children(self, node).collect()
    }

    fn shadow_root_of(&self, element: NodeId) -> Option<NodeId> {
        DocumentView::shadow_root_of(self, element)
    }

    fn host_of(&self, root: NodeId) -> Option<NodeId> {
        DocumentView::host_of(self, root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let doc = ShadowDocument::parse(b"<root>hello</root>");
        assert_eq!(doc.root_name(), Some("root"));
        let view = doc.as_view();
        let root = view.root_element_id().unwrap();
        assert_eq!(view.string_value(root), "hello");
    }

    #[test]
    fn test_declarative_shadow_root() {
        let doc = ShadowDocument::parse(
            b"<my-host id=\"h\"><template shadowrootmode=\"open\"><p>inner</p></template><span>light</span></my-host>",
        );
        let view = doc.as_view();
        let host = view.root_element_id().unwrap();
        let root = view.shadow_root_of(host).unwrap();

        assert_eq!(view.kind(root), Some(NodeKind::ShadowRoot));
        assert_eq!(view.host_of(root), Some(host));
        assert_eq!(view.parent_of(root), None);
        assert_eq!(view.shadow_mode(root), Some(ShadowRootMode::Open));

        // The template is not a child of the host
        let light: Vec<_> = view.children(host).filter_map(|c| view.node_name(c)).collect();
        assert_eq!(light, vec!["span"]);

        let inner: Vec<_> = view.children(root).filter_map(|c| view.node_name(c)).collect();
        assert_eq!(inner, vec!["p"]);
        let p = view.children(root).next().unwrap();
        assert_eq!(view.parent_of(p), Some(root));
        assert_eq!(view.parent_element(p), None);
    }

    #[test]
    fn test_descendants_stay_in_light_tree() {
        let doc = ShadowDocument::parse(
            b"<div><x-a><template shadowrootmode=\"closed\"><b></b></template><i></i></x-a></div>",
        );
        let view = doc.as_view();
        let root = view.root_element_id().unwrap();
        let names: Vec<_> = view.descendants(root).filter_map(|d| view.node_name(d)).collect();
        assert_eq!(names, vec!["x-a", "i"]);
    }

    #[test]
    fn test_second_template_is_plain_element() {
        let doc = ShadowDocument::parse(
            b"<x-a><template shadowrootmode=\"open\"></template><template shadowrootmode=\"open\"></template></x-a>",
        );
        let view = doc.as_view();
        let host = view.root_element_id().unwrap();
        assert!(view.shadow_root_of(host).is_some());
        let light: Vec<_> = view.children(host).filter_map(|c| view.node_name(c)).collect();
        assert_eq!(light, vec!["template"]);
    }

    #[test]
    fn test_template_without_mode_is_plain_element() {
        let doc = ShadowDocument::parse(b"<x-a><template><p></p></template></x-a>");
        let view = doc.as_view();
        let host = view.root_element_id().unwrap();
        assert!(view.shadow_root_of(host).is_none());
    }

    #[test]
    fn test_void_and_unmatched_tags() {
        let doc = ShadowDocument::parse(b"<div><br><img src=x></span><p>a</p></div>");
        let view = doc.as_view();
        let root = view.root_element_id().unwrap();
        let names: Vec<_> = view.element_children(root).filter_map(|c| view.node_name(c)).collect();
        assert_eq!(names, vec!["br", "img", "p"]);
    }

    #[test]
    fn test_unclosed_elements_close_at_eof() {
        let doc = ShadowDocument::parse(b"<a><b><c>text");
        let view = doc.as_view();
        let root = view.root_element_id().unwrap();
        assert_eq!(view.descendants(root).count(), 3);
    }

    #[test]
    fn test_attribute_lookup() {
        let doc = ShadowDocument::parse(b"<p ID=\"main\" class=\"a b\" hidden></p>");
        let view = doc.as_view();
        let p = view.root_element_id().unwrap();
        assert_eq!(view.get_attribute(p, "id"), Some("main"));
        assert_eq!(view.get_attribute(p, "hidden"), Some(""));
        assert_eq!(view.get_attribute(p, "title"), None);
        assert_eq!(view.get_attribute_values(p).len(), 3);
    }

    #[test]
    fn test_adjacent_text_merged() {
        let doc = ShadowDocument::parse(b"<p>1 < 2 &amp; 3</p>");
        let view = doc.as_view();
        let p = view.root_element_id().unwrap();
        assert_eq!(view.children(p).count(), 1);
        assert_eq!(view.string_value(p), "1 < 2 & 3");
    }

    #[test]
    fn test_boundary_tree_navigation() {
        let doc = ShadowDocument::parse(
            b"<x-a><template shadowrootmode=\"open\"><p>t</p></template></x-a>",
        );
        let view = doc.as_view();
        let host = view.root_element_id().unwrap();
        let root = DocumentView::shadow_root_of(&view, host).unwrap();
        let p = DocumentView::children(&view, root).next().unwrap();
        let text = DocumentView::children(&view, p).next().unwrap();

        assert_eq!(view.class_of(DOCUMENT_NODE), NodeClass::Document);
        assert_eq!(view.class_of(root), NodeClass::ShadowRoot);
        assert_eq!(view.class_of(text), NodeClass::Other);
        assert_eq!(view.root_of(p), root);
        assert_eq!(view.host_element(p), Some(host));
        assert_eq!(view.host_element(host), None);
        assert_eq!(view.get_host(host), DOCUMENT_NODE);
        assert_eq!(BoundaryTree::children(&view, DOCUMENT_NODE), vec![host]);
    }
}
