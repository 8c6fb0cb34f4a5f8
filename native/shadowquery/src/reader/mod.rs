//! Markup Reader Module
//!
//! - SliceReader: zero-copy pull reader over a byte slice
//! - Events: markup event types

pub mod events;
pub mod slice;

pub use events::{MarkupEvent, Tag};
pub use slice::SliceReader;
