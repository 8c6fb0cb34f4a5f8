//! Compiled selector cache
//!
//! Parsing is cheap but not free, and the cross-boundary engine re-runs the
//! same segments against every discovered shadow root. Compiled selector
//! lists are shared through a process-wide LRU.

use super::parser::{parse, SelectorList};
use crate::error::QueryError;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::trace;

/// Number of distinct selector strings kept compiled
pub const SELECTOR_CACHE_CAPACITY: usize = 256;

static CACHE: OnceLock<Mutex<LruCache<String, Arc<SelectorList>>>> = OnceLock::new();

fn cache() -> &'static Mutex<LruCache<String, Arc<SelectorList>>> {
    CACHE.get_or_init(|| {
        let capacity = NonZeroUsize::MIN.saturating_add(SELECTOR_CACHE_CAPACITY - 1);
        Mutex::new(LruCache::new(capacity))
    })
}

fn compile_uncached(selector: &str) -> Result<SelectorList, QueryError> {
    parse(selector).map_err(|reason| QueryError::invalid(selector, reason))
}

/// Compile a selector, reusing a cached result when one exists.
///
/// Errors are not cached.
pub fn compile(selector: &str) -> Result<Arc<SelectorList>, QueryError> {
    let Ok(mut guard) = cache().lock() else {
        // A panicked holder leaves the cache unusable, not the matcher
        return compile_uncached(selector).map(Arc::new);
    };

    if let Some(list) = guard.get(selector) {
        return Ok(Arc::clone(list));
    }

    trace!(selector, "selector cache miss");
    let list = Arc::new(compile_uncached(selector)?);
    guard.put(selector.to_string(), Arc::clone(&list));
    Ok(list)
}
