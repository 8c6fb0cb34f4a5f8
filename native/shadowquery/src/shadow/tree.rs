//! Node model seen by the cross-boundary engine
//!
//! The engine never names a concrete document type. A host document
//! implements `BoundaryTree` for navigation and `PrimitiveMatcher` for
//! selector matching that stays inside one boundary.

use crate::error::QueryError;
use std::fmt::Debug;
use std::hash::Hash;

/// Coarse node classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    Element,
    Document,
    ShadowRoot,
    Other,
}

/// A forest of light trees joined by host/shadow-root edges.
///
/// A shadow root has no parent; it is reached from its host through
/// `shadow_root_of`, and leads back through `host_of`.
pub trait BoundaryTree {
    /// Opaque node handle
    type Node: Copy + Eq + Hash + Debug;

    fn class_of(&self, node: Self::Node) -> NodeClass;

    /// Light-tree parent
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Ordered light-tree children
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Shadow root attached to an element
    fn shadow_root_of(&self, element: Self::Node) -> Option<Self::Node>;

    /// Host element of a shadow root
    fn host_of(&self, root: Self::Node) -> Option<Self::Node>;

    #[inline]
    fn is_element(&self, node: Self::Node) -> bool {
        self.class_of(node) == NodeClass::Element
    }

    #[inline]
    fn is_document(&self, node: Self::Node) -> bool {
        self.class_of(node) == NodeClass::Document
    }

    #[inline]
    fn is_shadow_root(&self, node: Self::Node) -> bool {
        self.class_of(node) == NodeClass::ShadowRoot
    }

    /// Topmost light-tree ancestor: a document, a shadow root, or a
    /// detached node
    fn root_of(&self, node: Self::Node) -> Self::Node {
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Host of the boundary `node` lives in, or None in the document tree
    fn host_element(&self, node: Self::Node) -> Option<Self::Node> {
        let root = self.root_of(node);
        if self.is_shadow_root(root) {
            self.host_of(root)
        } else {
            None
        }
    }

    /// Host of the boundary `node` lives in, falling back to the root of
    /// the document tree
    fn get_host(&self, node: Self::Node) -> Self::Node {
        let root = self.root_of(node);
        if self.is_shadow_root(root) {
            self.host_of(root).unwrap_or(root)
        } else {
            root
        }
    }
}

/// Selector matching confined to a single boundary.
///
/// The native-selector analogue: none of these cross a shadow root, and
/// syntax errors surface as `QueryError::InvalidSelector`.
pub trait PrimitiveMatcher: BoundaryTree {
    /// First descendant of `scope` (document order) matching `predicate`
    fn match_first(&self, predicate: &str, scope: Self::Node) -> Result<Option<Self::Node>, QueryError>;

    /// All descendants of `scope` matching `predicate`, in document order
    fn match_all(&self, predicate: &str, scope: Self::Node) -> Result<Vec<Self::Node>, QueryError>;

    /// Nearest inclusive ancestor of `node` matching `predicate`
    fn closest(&self, node: Self::Node, predicate: &str) -> Result<Option<Self::Node>, QueryError>;
}
