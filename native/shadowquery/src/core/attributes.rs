//! Attribute list parsing
//!
//! Lenient: quoted, unquoted and valueless (boolean) attributes are all
//! accepted, as markup with custom elements routinely mixes them.

use super::entities::decode_text;
use super::scanner::is_whitespace;
use std::borrow::Cow;

/// A parsed attribute
#[derive(Debug, Clone)]
pub struct Attribute<'a> {
    pub name: &'a [u8],
    /// Value with character references decoded
    pub value: Cow<'a, [u8]>,
}

impl<'a> Attribute<'a> {
    pub fn value_str(&self) -> Option<&str> {
        std::str::from_utf8(self.value.as_ref()).ok()
    }
}

/// Parse the attribute section of a tag (everything after the tag name,
/// excluding the closing `>` or `/>`)
pub fn parse_attributes(input: &[u8]) -> Vec<Attribute<'_>> {
    let mut attrs = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if pos >= input.len() {
            break;
        }

        // Stray slashes and quotes carry no attribute
        if matches!(input[pos], b'/' | b'"' | b'\'' | b'=') {
            pos += 1;
            continue;
        }

        let name_start = pos;
        while pos < input.len() && !is_whitespace(input[pos]) && !matches!(input[pos], b'=' | b'/') {
            pos += 1;
        }
        let name = &input[name_start..pos];

        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }

        if pos >= input.len() || input[pos] != b'=' {
            attrs.push(Attribute { name, value: Cow::Borrowed(b"") });
            continue;
        }

        pos += 1;
        while pos < input.len() && is_whitespace(input[pos]) {
            pos += 1;
        }
        if pos >= input.len() {
            attrs.push(Attribute { name, value: Cow::Borrowed(b"") });
            break;
        }

        let value = match input[pos] {
            quote @ (b'"' | b'\'') => {
                let value_start = pos + 1;
                let value_end = input[value_start..]
                    .iter()
                    .position(|&b| b == quote)
                    .map_or(input.len(), |offset| value_start + offset);
                pos = (value_end + 1).min(input.len());
                &input[value_start..value_end]
            }
            _ => {
                let value_start = pos;
                while pos < input.len() && !is_whitespace(input[pos]) {
                    pos += 1;
                }
                &input[value_start..pos]
            }
        };

        attrs.push(Attribute { name, value: decode_text(value) });
    }

    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_attributes() {
        let attrs = parse_attributes(b" id=\"main\" class='card wide'");
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].name, b"id");
        assert_eq!(attrs[0].value_str(), Some("main"));
        assert_eq!(attrs[1].value_str(), Some("card wide"));
    }

    #[test]
    fn test_boolean_and_unquoted() {
        let attrs = parse_attributes(b" hidden data-n=3 disabled");
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs[0].name, b"hidden");
        assert_eq!(attrs[0].value_str(), Some(""));
        assert_eq!(attrs[1].value_str(), Some("3"));
        assert_eq!(attrs[2].name, b"disabled");
    }

    #[test]
    fn test_entity_in_value() {
        let attrs = parse_attributes(b" title=\"&lt;hello&gt;\"");
        assert_eq!(attrs[0].value_str(), Some("<hello>"));
    }

    #[test]
    fn test_whitespace_around_equals() {
        let attrs = parse_attributes(b"  shadowrootmode  =  \"open\"  ");
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].name, b"shadowrootmode");
        assert_eq!(attrs[0].value_str(), Some("open"));
    }
}
