//! Character reference decoding
//!
//! Handles the five predefined references, a handful of common HTML names
//! and numeric references (`&#123;` / `&#x7B;`). Unknown references are kept
//! verbatim. Returns `Cow::Borrowed` when nothing needs decoding.

use memchr::memchr;
use std::borrow::Cow;

#[inline]
pub fn decode_text(input: &[u8]) -> Cow<'_, [u8]> {
    if memchr(b'&', input).is_none() {
        return Cow::Borrowed(input);
    }
    Cow::Owned(decode_entities(input))
}

fn decode_entities(input: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(input.len());
    let mut pos = 0;

    while let Some(amp_offset) = memchr(b'&', &input[pos..]) {
        result.extend_from_slice(&input[pos..pos + amp_offset]);
        pos += amp_offset;

        let decoded = memchr(b';', &input[pos..]).and_then(|semi_offset| {
            decode_entity(&input[pos + 1..pos + semi_offset]).map(|c| (c, semi_offset))
        });

        match decoded {
            Some((c, semi_offset)) => {
                let mut buf = [0u8; 4];
                result.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                pos += semi_offset + 1;
            }
            None => {
                result.push(b'&');
                pos += 1;
            }
        }
    }

    result.extend_from_slice(&input[pos..]);
    result
}

/// Decode a single reference body (without `&` and `;`)
fn decode_entity(entity: &[u8]) -> Option<char> {
    if let Some(numeric) = entity.strip_prefix(b"#") {
        return decode_numeric(numeric);
    }

    match entity {
        b"lt" => Some('<'),
        b"gt" => Some('>'),
        b"amp" => Some('&'),
        b"quot" => Some('"'),
        b"apos" => Some('\''),
        b"nbsp" => Some('\u{00A0}'),
        b"copy" => Some('\u{00A9}'),
        b"mdash" => Some('\u{2014}'),
        b"ndash" => Some('\u{2013}'),
        b"hellip" => Some('\u{2026}'),
        _ => None,
    }
}

fn decode_numeric(entity: &[u8]) -> Option<char> {
    let codepoint = match entity.first()? {
        b'x' | b'X' => u32::from_str_radix(std::str::from_utf8(&entity[1..]).ok()?, 16).ok()?,
        _ => std::str::from_utf8(entity).ok()?.parse::<u32>().ok()?,
    };
    char::from_u32(codepoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_entities_is_borrowed() {
        assert!(matches!(decode_text(b"plain text"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_predefined_entities() {
        assert_eq!(decode_text(b"a &lt;b&gt; &amp; c").as_ref(), b"a <b> & c");
    }

    #[test]
    fn test_numeric_entities() {
        assert_eq!(decode_text(b"&#65;&#x42;").as_ref(), b"AB");
    }

    #[test]
    fn test_unknown_entity_kept() {
        assert_eq!(decode_text(b"&bogus; & x").as_ref(), b"&bogus; & x");
    }
}
