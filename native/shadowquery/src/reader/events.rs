//! Markup event types
//!
//! Event types for pull-parser style processing.

use crate::core::attributes::Attribute;
use std::borrow::Cow;

/// Markup parsing event
#[derive(Debug, Clone)]
pub enum MarkupEvent<'a> {
    /// Start of an element: <name attrs...>
    StartTag(Tag<'a>),
    /// Self-closing element: <name attrs.../>
    EmptyTag(Tag<'a>),
    /// End of an element: </name>
    EndTag(&'a [u8]),
    /// Text between tags, references decoded
    Text(Cow<'a, [u8]>),
    /// CDATA section content
    CData(&'a [u8]),
    /// Comment content
    Comment(&'a [u8]),
    /// Processing instruction target: <?target data?>
    ProcessingInstruction(&'a [u8]),
}

/// Start or empty tag data
#[derive(Debug, Clone)]
pub struct Tag<'a> {
    pub name: &'a [u8],
    pub attributes: Vec<Attribute<'a>>,
}

impl<'a> Tag<'a> {
    /// Attribute value by name (ASCII case-insensitive, as in HTML)
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name.as_bytes()))
            .and_then(|a| a.value_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_lookup_ignores_case() {
        let tag = Tag {
            name: b"template",
            attributes: vec![Attribute { name: b"ShadowRootMode", value: Cow::Borrowed(b"open") }],
        };
        assert_eq!(tag.attribute_value("shadowrootmode"), Some("open"));
    }
}
