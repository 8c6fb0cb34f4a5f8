//! String interning pool
//!
//! Deduplicated storage for element names, attribute names and values, and
//! character data. Every string is copied into one contiguous buffer, so the
//! pool owns its data and the parsed document needs no reference to its
//! input.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Span of an interned string: (offset_in_data, length)
#[derive(Debug, Clone, Copy)]
struct Entry(u32, u32);

/// String interning pool
///
/// Memory layout:
/// - `entries`: span for each interned string ID
/// - `data`: buffer holding every interned string
/// - `hash_index`: hash -> list of IDs (handles rare collisions)
#[derive(Debug)]
pub struct StringPool {
    entries: Vec<Entry>,
    data: Vec<u8>,
    hash_index: HashMap<u64, Vec<u32>>,
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

impl StringPool {
    pub fn new() -> Self {
        let mut pool = StringPool {
            entries: Vec::with_capacity(256),
            data: Vec::with_capacity(4096),
            hash_index: HashMap::new(),
        };
        // Entry 0 is reserved for the empty string
        pool.entries.push(Entry(0, 0));
        pool
    }

    #[inline]
    fn compute_hash(s: &[u8]) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        hasher.finish()
    }

    /// Intern a string, returning its ID (0 for the empty string)
    pub fn intern(&mut self, s: &[u8]) -> u32 {
        if s.is_empty() {
            return 0;
        }

        let hash = Self::compute_hash(s);
        if let Some(ids) = self.hash_index.get(&hash) {
            for &id in ids {
                if self.get(id) == Some(s) {
                    return id;
                }
            }
        }

        let offset = self.data.len() as u32;
        self.data.extend_from_slice(s);

        let id = self.entries.len() as u32;
        self.entries.push(Entry(offset, s.len() as u32));
        self.hash_index.entry(hash).or_default().push(id);

        id
    }

    /// Get a string by ID
    pub fn get(&self, id: u32) -> Option<&[u8]> {
        let Entry(offset, len) = *self.entries.get(id as usize)?;
        let start = offset as usize;
        self.data.get(start..start + len as usize)
    }

    /// Get a string by ID as UTF-8
    pub fn get_str(&self, id: u32) -> Option<&str> {
        self.get(id).and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Number of unique strings stored, including the reserved empty entry
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern() {
        let mut pool = StringPool::new();
        let id = pool.intern(b"level-one");
        assert!(id > 0);
        assert_eq!(pool.get_str(id), Some("level-one"));
    }

    #[test]
    fn test_intern_duplicate() {
        let mut pool = StringPool::new();
        let id1 = pool.intern(b"slot");
        let id2 = pool.intern(b"slot");
        assert_eq!(id1, id2);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_intern_different() {
        let mut pool = StringPool::new();
        assert_ne!(pool.intern(b"open"), pool.intern(b"closed"));
    }

    #[test]
    fn test_empty_string() {
        let mut pool = StringPool::new();
        assert_eq!(pool.intern(b""), 0);
        assert_eq!(pool.get(0), Some(b"" as &[u8]));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_unknown_id() {
        let pool = StringPool::new();
        assert_eq!(pool.get(42), None);
    }
}
