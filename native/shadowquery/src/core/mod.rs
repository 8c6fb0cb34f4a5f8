//! Markup scanning primitives
//!
//! - Scanner: memchr-accelerated delimiter detection
//! - Entities: character reference decoding (Cow, zero-copy when clean)
//! - Attributes: attribute list parsing for start tags

pub mod attributes;
pub mod entities;
pub mod scanner;
