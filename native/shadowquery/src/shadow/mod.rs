//! Cross-boundary querying
//!
//! - Tree: node model and matcher capability traits
//! - Boundary: shadow root discovery
//! - Chain: selector splitting at descendant combinators
//! - Engine: one-hop matching, chain resolution and pipelines

pub mod boundary;
pub mod chain;
pub mod engine;
pub mod tree;

pub use boundary::{discover_boundaries, ShadowRoots};
pub use chain::{split, Chain, ChainSet, Segment};
pub use engine::{
    match_across_one_hop, query_selector, query_selector_all, resolve_chain, satisfies_chain, Find,
    QueryOptions, Selectors,
};
pub use tree::{BoundaryTree, NodeClass, PrimitiveMatcher};
