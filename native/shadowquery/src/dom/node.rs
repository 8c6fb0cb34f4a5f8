//! DOM node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references.

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// Type of DOM node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element node
    Element,
    /// Encapsulated subtree attached to a host element
    ShadowRoot,
    /// Text content
    Text,
    /// CDATA section
    CData,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
}

/// Encapsulation mode of a shadow root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowRootMode {
    Open,
    Closed,
}

impl ShadowRootMode {
    /// Parse a `shadowrootmode` attribute value
    pub fn from_attribute(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("open") {
            Some(ShadowRootMode::Open)
        } else if value.eq_ignore_ascii_case("closed") {
            Some(ShadowRootMode::Closed)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShadowRootMode::Open => "open",
            ShadowRootMode::Closed => "closed",
        }
    }
}

/// A node in the arena
#[derive(Debug, Clone)]
pub struct DomNode {
    pub kind: NodeKind,
    /// Parent node (None for the document and for shadow roots)
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    /// Index into string pool: element name, PI target, or character data
    pub name_id: u32,
    /// Start of attributes in attribute arena (for elements)
    pub attr_start: u32,
    pub attr_count: u16,
    /// Attached shadow root (elements only)
    pub shadow_root: Option<NodeId>,
    /// Host element (shadow roots only)
    pub host: Option<NodeId>,
    /// Encapsulation mode (shadow roots only)
    pub mode: Option<ShadowRootMode>,
}

impl DomNode {
    fn new(kind: NodeKind, name_id: u32, parent: Option<NodeId>) -> Self {
        DomNode {
            kind,
            parent,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name_id,
            attr_start: 0,
            attr_count: 0,
            shadow_root: None,
            host: None,
            mode: None,
        }
    }

    /// Create the document root node
    pub fn document() -> Self {
        Self::new(NodeKind::Document, 0, None)
    }

    pub fn element(name_id: u32, parent: NodeId) -> Self {
        Self::new(NodeKind::Element, name_id, Some(parent))
    }

    /// Create a shadow root; it has a host but no parent
    pub fn shadow_root(host: NodeId, mode: ShadowRootMode) -> Self {
        let mut node = Self::new(NodeKind::ShadowRoot, 0, None);
        node.host = Some(host);
        node.mode = Some(mode);
        node
    }

    /// Create a text, CDATA, comment or PI node
    pub fn character_data(kind: NodeKind, content_id: u32, parent: NodeId) -> Self {
        Self::new(kind, content_id, Some(parent))
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text | NodeKind::CData)
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }
}

/// Stored attribute
#[derive(Debug, Clone, Copy)]
pub struct DomAttribute {
    pub name_id: u32,
    pub value_id: u32,
}
