//! ResourceArc Wrappers
//!
//! Persistent state for parsed shadow documents.

use crate::dom::{DocumentView, ShadowDocument};
use rustler::ResourceArc;
use std::sync::Mutex;

/// Parsed document held across NIF calls, so every query reuses one parse
pub struct DocumentResource {
    pub doc: Mutex<Option<ShadowDocument>>,
}

impl DocumentResource {
    pub fn new(input: &[u8]) -> Self {
        DocumentResource {
            doc: Mutex::new(Some(ShadowDocument::parse(input))),
        }
    }

    /// Run `f` against a borrowed view of the document.
    ///
    /// # Errors
    ///
    /// Returns `"mutex_poisoned"` if the document mutex is poisoned,
    /// or `"no_document"` if no document is present.
    pub fn with_view<F, R>(&self, f: F) -> Result<R, &'static str>
    where
        F: FnOnce(DocumentView<'_>) -> R,
    {
        let guard = self.doc.lock().map_err(|_| "mutex_poisoned")?;
        let doc = guard.as_ref().ok_or("no_document")?;
        Ok(f(doc.as_view()))
    }
}

#[rustler::resource_impl]
impl rustler::Resource for DocumentResource {}

impl Default for DocumentResource {
    fn default() -> Self {
        DocumentResource { doc: Mutex::new(None) }
    }
}

/// Type alias for document ResourceArc
pub type DocumentRef = ResourceArc<DocumentResource>;
