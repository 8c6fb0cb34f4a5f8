//! Selector engine for a single boundary
//!
//! - Lexer: selector text to tokens
//! - Parser: tokens to a right-to-left selector AST
//! - Cache: compiled selector lists shared across queries
//! - Matcher: element tests and the `PrimitiveMatcher` implementation

pub mod cache;
pub mod lexer;
pub mod matcher;
pub mod parser;

pub use cache::{compile, SELECTOR_CACHE_CAPACITY};
pub use matcher::{matches_complex, matches_list};
pub use parser::{
    parse, AttrOperator, AttributeSelector, Combinator, ComplexSelector, CompoundSelector, Nth, PseudoClass,
    SelectorList, SimpleSelector,
};
