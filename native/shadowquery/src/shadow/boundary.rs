//! Boundary discovery
//!
//! Lazily enumerates the shadow roots reachable from a subject node: the
//! subject's own shadow root, then a pre-order walk of its light subtree
//! yielding each hosted shadow root. In recursive mode every yielded root
//! is pushed on a pending stack and walked once the current subtree is
//! exhausted, so each root is yielded exactly once and the walk terminates.

use super::tree::{BoundaryTree, NodeClass};
use tracing::trace;

/// Iterator over discovered shadow roots
pub struct ShadowRoots<'t, T: BoundaryTree + ?Sized> {
    tree: &'t T,
    recursive: bool,
    /// Subject's own shadow root, yielded first
    own: Option<T::Node>,
    /// Pre-order walk of the subtree being scanned
    walk: Vec<T::Node>,
    /// Roots still to be scanned (recursive mode only)
    pending: Vec<T::Node>,
}

/// Discover the shadow roots reachable from `node`.
///
/// Only element, document and shadow-root subjects have anything to walk;
/// any other node yields nothing. The subject itself is not tested as a
/// host during the walk, only through `own`.
pub fn discover_boundaries<T: BoundaryTree + ?Sized>(
    tree: &T,
    node: T::Node,
    recursive: bool,
) -> ShadowRoots<'_, T> {
    let mut roots = ShadowRoots {
        tree,
        recursive,
        own: None,
        walk: Vec::new(),
        pending: Vec::new(),
    };

    match tree.class_of(node) {
        NodeClass::Element => {
            roots.own = tree.shadow_root_of(node);
            roots.push_children(node);
        }
        NodeClass::Document | NodeClass::ShadowRoot => roots.push_children(node),
        NodeClass::Other => {}
    }

    roots
}

impl<'t, T: BoundaryTree + ?Sized> ShadowRoots<'t, T> {
    /// Queue element children last-to-first so they pop in document order
    fn push_children(&mut self, node: T::Node) {
        let tree = self.tree;
        self.walk
            .extend(tree.children(node).into_iter().rev().filter(|&c| tree.is_element(c)));
    }

    fn found(&mut self, root: T::Node) -> T::Node {
        trace!(?root, "shadow root discovered");
        if self.recursive {
            self.pending.push(root);
        }
        root
    }
}

impl<'t, T: BoundaryTree + ?Sized> Iterator for ShadowRoots<'t, T> {
    type Item = T::Node;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.own.take() {
            return Some(self.found(root));
        }

        loop {
            while let Some(node) = self.walk.pop() {
                self.push_children(node);
                if let Some(root) = self.tree.shadow_root_of(node) {
                    return Some(self.found(root));
                }
            }

            let next_root = self.pending.pop()?;
            self.push_children(next_root);
        }
    }
}
