//! Zero-copy slice reader
//!
//! Pulls markup events from a byte slice. Names, comments and CDATA borrow
//! from the input; text is only copied when it contains references.
//! Lenient: malformed constructs degrade to text or are skipped, the reader
//! never fails.

use super::events::{MarkupEvent, Tag};
use crate::core::attributes::parse_attributes;
use crate::core::entities::decode_text;
use crate::core::scanner::{is_name_start_char, Scanner};

/// Zero-copy markup reader over a byte slice
pub struct SliceReader<'a> {
    scanner: Scanner<'a>,
}

impl<'a> SliceReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        SliceReader { scanner: Scanner::new(input) }
    }

    /// Get the next event, or None at end of input
    pub fn next_event(&mut self) -> Option<MarkupEvent<'a>> {
        loop {
            if self.scanner.is_eof() {
                return None;
            }

            if self.scanner.peek() != Some(b'<') {
                return Some(self.read_text());
            }

            if self.scanner.starts_with(b"<!--") {
                let start = self.scanner.position() + 4;
                return Some(MarkupEvent::Comment(self.read_delimited(start, b"-->")));
            }

            if self.scanner.starts_with(b"<![CDATA[") {
                let start = self.scanner.position() + 9;
                return Some(MarkupEvent::CData(self.read_delimited(start, b"]]>")));
            }

            if self.scanner.starts_with(b"<?") {
                if let Some(event) = self.read_processing_instruction() {
                    return Some(event);
                }
                continue;
            }

            if self.scanner.starts_with(b"<!") {
                // DOCTYPE and other declarations carry nothing queryable
                self.skip_tag();
                continue;
            }

            if self.scanner.peek_at(1) == Some(b'/') {
                if let Some(event) = self.read_end_tag() {
                    return Some(event);
                }
                continue;
            }

            if self.scanner.peek_at(1).is_some_and(is_name_start_char) {
                if let Some(event) = self.read_start_tag() {
                    return Some(event);
                }
                continue;
            }

            // A lone '<' is text
            return Some(self.read_text_from_lt());
        }
    }

    fn read_text(&mut self) -> MarkupEvent<'a> {
        let start = self.scanner.position();
        let end = self.scanner.find_tag_start().unwrap_or(self.scanner.end());
        self.scanner.set_position(end);
        MarkupEvent::Text(decode_text(self.scanner.slice(start, end)))
    }

    fn read_text_from_lt(&mut self) -> MarkupEvent<'a> {
        let start = self.scanner.position();
        self.scanner.advance(1);
        let end = self.scanner.find_tag_start().unwrap_or(self.scanner.end());
        self.scanner.set_position(end);
        MarkupEvent::Text(decode_text(self.scanner.slice(start, end)))
    }

    /// Read up to `terminator` (exclusive) and move past it; an unterminated
    /// construct runs to end of input
    fn read_delimited(&mut self, start: usize, terminator: &[u8]) -> &'a [u8] {
        self.scanner.set_position(start);
        match self.scanner.find(terminator) {
            Some(end) => {
                self.scanner.set_position(end + terminator.len());
                self.scanner.slice(start, end)
            }
            None => {
                let end = self.scanner.end();
                self.scanner.set_position(end);
                self.scanner.slice(start, end)
            }
        }
    }

    fn read_processing_instruction(&mut self) -> Option<MarkupEvent<'a>> {
        let start = self.scanner.position() + 2;
        let body = self.read_delimited(start, b"?>");
        let target_len = body
            .iter()
            .position(|&b| crate::core::scanner::is_whitespace(b))
            .unwrap_or(body.len());
        let target = &body[..target_len];

        // The XML declaration is not a node
        if target.is_empty() || target.eq_ignore_ascii_case(b"xml") {
            return None;
        }
        Some(MarkupEvent::ProcessingInstruction(target))
    }

    fn skip_tag(&mut self) {
        match self.scanner.find_tag_end_quoted() {
            Some(end) => self.scanner.set_position(end + 1),
            None => self.scanner.set_position(self.scanner.end()),
        }
    }

    fn read_end_tag(&mut self) -> Option<MarkupEvent<'a>> {
        self.scanner.advance(2);
        let name = self.scanner.read_name();
        self.skip_tag();
        name.map(MarkupEvent::EndTag)
    }

    fn read_start_tag(&mut self) -> Option<MarkupEvent<'a>> {
        self.scanner.advance(1);
        let name = self.scanner.read_name()?;
        let attr_start = self.scanner.position();

        let Some(end) = self.scanner.find_tag_end_quoted() else {
            // Unterminated tag swallows the rest of the input
            self.scanner.set_position(self.scanner.end());
            return None;
        };
        self.scanner.set_position(end + 1);

        let mut attr_end = end;
        let is_empty = attr_end > attr_start && self.scanner.slice(attr_end - 1, attr_end) == b"/";
        if is_empty {
            attr_end -= 1;
        }

        let tag = Tag {
            name,
            attributes: parse_attributes(self.scanner.slice(attr_start, attr_end)),
        };

        Some(if is_empty {
            MarkupEvent::EmptyTag(tag)
        } else {
            MarkupEvent::StartTag(tag)
        })
    }
}

impl<'a> Iterator for SliceReader<'a> {
    type Item = MarkupEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event()
    }
}
