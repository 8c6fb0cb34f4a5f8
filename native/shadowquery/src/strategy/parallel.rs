//! Parallel selector evaluation
//!
//! Uses Rayon to evaluate independent selectors against one document.
//! Each selector runs the ordinary cross-boundary query; results come back
//! in input order.

use crate::dom::{DocumentView, NodeId};
use crate::error::QueryError;
use crate::shadow::{query_selector_all, QueryOptions, Selectors};
use rayon::prelude::*;

/// Run `query_selector_all` from `subject` for every selector
pub fn query_parallel(
    view: &DocumentView<'_>,
    selectors: &[String],
    subject: NodeId,
    options: &QueryOptions,
) -> Vec<Result<Vec<NodeId>, QueryError>> {
    let view = *view;
    selectors
        .par_iter()
        .map(|selector| query_selector_all(&view, &Selectors::One(selector.clone()), subject, options))
        .collect()
}
