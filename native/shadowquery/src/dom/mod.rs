//! DOM Module - Arena-based document with shadow roots
//!
//! - Arena allocation for nodes
//! - NodeId (u32) indices for cache-friendly traversal
//! - String interning for names and character data
//! - Declarative shadow roots linked to their hosts

pub mod document;
pub mod node;
pub mod serialize;
pub mod strings;

pub use document::{DocumentView, ShadowDocument, DOCUMENT_NODE};
pub use node::{DomAttribute, DomNode, NodeId, NodeKind, ShadowRootMode};
pub use serialize::to_markup;
pub use strings::StringPool;
