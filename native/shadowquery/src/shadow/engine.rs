//! Cross-boundary query engine
//!
//! Resolves selectors against a forest of shadow trees using only the
//! single-boundary primitives of a `PrimitiveMatcher`:
//!
//! - one-hop matching: own subtree first, then every shadow root discovered
//!   (recursively) under the subject
//! - chain resolution: target matches inside discovered shadow roots,
//!   filtered by walking ancestor segments up through hosts
//! - pipelines: each stage's matches become the next stage's subjects

use super::boundary::discover_boundaries;
use super::chain::{split, Chain, Segment};
use super::tree::PrimitiveMatcher;
use crate::error::QueryError;
use std::collections::HashSet;
use std::hash::Hash;
use tracing::{debug, trace};

/// Result shape requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Find {
    First,
    All,
}

impl Find {
    /// True once enough has been found to stop searching
    #[inline]
    fn satisfied(self, found: usize) -> bool {
        self == Find::First && found > 0
    }
}

/// A single selector, or a pipeline of selectors applied stage by stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selectors {
    One(String),
    Pipeline(Vec<String>),
}

impl From<&str> for Selectors {
    fn from(selector: &str) -> Self {
        Selectors::One(selector.to_string())
    }
}

impl From<String> for Selectors {
    fn from(selector: String) -> Self {
        Selectors::One(selector)
    }
}

impl From<Vec<String>> for Selectors {
    fn from(stages: Vec<String>) -> Self {
        Selectors::Pipeline(stages)
    }
}

impl From<&[&str]> for Selectors {
    fn from(stages: &[&str]) -> Self {
        Selectors::Pipeline(stages.iter().map(|s| s.to_string()).collect())
    }
}

/// Query options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Split single selectors at descendant combinators and verify the
    /// ancestry across shadow roots
    pub cross_boundary: bool,
}

/// Match one segment in the subject's subtree, then inside every shadow
/// root discovered under it. Own-subtree matches come first.
pub fn match_across_one_hop<M: PrimitiveMatcher + ?Sized>(
    m: &M,
    segment: &str,
    subject: M::Node,
    find: Find,
) -> Result<Vec<M::Node>, QueryError> {
    let mut found = match find {
        Find::First => m.match_first(segment, subject)?.into_iter().collect(),
        Find::All => m.match_all(segment, subject)?,
    };
    if find.satisfied(found.len()) {
        return Ok(found);
    }

    for root in discover_boundaries(m, subject, true) {
        match find {
            Find::First => {
                if let Some(node) = m.match_first(segment, root)? {
                    return Ok(vec![node]);
                }
            }
            Find::All => found.extend(m.match_all(segment, root)?),
        }
    }

    Ok(found)
}

/// Nearest strict ancestor of `node` matching `segment`, climbing to the
/// host of each enclosing shadow root in turn.
fn closest_across_boundaries<M: PrimitiveMatcher + ?Sized>(
    m: &M,
    node: M::Node,
    segment: &str,
) -> Result<Option<M::Node>, QueryError> {
    let mut found = match m.parent(node) {
        Some(parent) if m.is_element(parent) => m.closest(parent, segment)?,
        _ => None,
    };

    let mut current = node;
    while found.is_none() {
        let Some(host) = m.host_element(current) else {
            return Ok(None);
        };
        found = m.closest(host, segment)?;
        current = host;
    }

    Ok(found)
}

/// Check that `candidate` has, in order, a strict ancestor matching each of
/// `ancestors` (outermost first), possibly across any number of hosts.
pub fn satisfies_chain<M: PrimitiveMatcher + ?Sized>(
    m: &M,
    candidate: M::Node,
    ancestors: &[Segment],
) -> Result<bool, QueryError> {
    let mut current = candidate;
    for segment in ancestors.iter().rev() {
        match closest_across_boundaries(m, current, segment)? {
            Some(ancestor) => current = ancestor,
            None => return Ok(false),
        }
    }
    Ok(true)
}

/// Resolve one chain against `subject`.
///
/// A single segment is a one-hop match. Longer chains take their candidates
/// from inside discovered shadow roots only; same-boundary matches of the
/// whole selector are the plain matcher's job.
pub fn resolve_chain<M: PrimitiveMatcher + ?Sized>(
    m: &M,
    chain: &Chain,
    subject: M::Node,
    find: Find,
) -> Result<Vec<M::Node>, QueryError> {
    if chain.len() <= 1 {
        return match_across_one_hop(m, chain.target(), subject, find);
    }

    let mut found = Vec::new();
    for root in discover_boundaries(m, subject, true) {
        for candidate in m.match_all(chain.target(), root)? {
            if satisfies_chain(m, candidate, chain.ancestors())? {
                found.push(candidate);
                if find.satisfied(found.len()) {
                    return Ok(found);
                }
            }
        }
    }

    trace!(segments = chain.len(), matches = found.len(), "chain resolved");
    Ok(found)
}

/// First node matching `selectors` below `subject`
pub fn query_selector<M: PrimitiveMatcher + ?Sized>(
    m: &M,
    selectors: &Selectors,
    subject: M::Node,
    options: &QueryOptions,
) -> Result<Option<M::Node>, QueryError> {
    Ok(query(m, selectors, subject, options, Find::First)?.into_iter().next())
}

/// All nodes matching `selectors` below `subject`, de-duplicated with the
/// first occurrence kept
pub fn query_selector_all<M: PrimitiveMatcher + ?Sized>(
    m: &M,
    selectors: &Selectors,
    subject: M::Node,
    options: &QueryOptions,
) -> Result<Vec<M::Node>, QueryError> {
    query(m, selectors, subject, options, Find::All)
}

fn query<M: PrimitiveMatcher + ?Sized>(
    m: &M,
    selectors: &Selectors,
    subject: M::Node,
    options: &QueryOptions,
    find: Find,
) -> Result<Vec<M::Node>, QueryError> {
    match selectors {
        Selectors::One(selector) => query_single(m, selector, subject, options, find),
        Selectors::Pipeline(stages) => query_pipeline(m, stages, subject, find),
    }
}

fn query_single<M: PrimitiveMatcher + ?Sized>(
    m: &M,
    selector: &str,
    subject: M::Node,
    options: &QueryOptions,
    find: Find,
) -> Result<Vec<M::Node>, QueryError> {
    debug!(selector, cross_boundary = options.cross_boundary, ?find, "query");

    // Malformed selectors are reported by the splitter, before any matching
    let chains = if options.cross_boundary { Some(split(selector)?) } else { None };

    let mut found = match_across_one_hop(m, selector, subject, find)?;
    let Some(chains) = chains else {
        return Ok(dedup_first_seen(found));
    };
    if find.satisfied(found.len()) {
        return Ok(dedup_first_seen(found));
    }
    trace!(alternatives = chains.len(), "selector split");

    // Single-segment alternatives were covered by the one-hop match above
    for chain in chains.iter().filter(|chain| chain.len() > 1) {
        found.extend(resolve_chain(m, chain, subject, find)?);
        if find.satisfied(found.len()) {
            break;
        }
    }

    Ok(dedup_first_seen(found))
}

fn query_pipeline<M: PrimitiveMatcher + ?Sized>(
    m: &M,
    stages: &[String],
    subject: M::Node,
    find: Find,
) -> Result<Vec<M::Node>, QueryError> {
    let mut subjects = vec![subject];

    for (index, stage) in stages.iter().enumerate() {
        let last = index + 1 == stages.len();
        let stage_find = if last { find } else { Find::All };

        let mut matches = Vec::new();
        for &current in &subjects {
            matches.extend(match_across_one_hop(m, stage, current, stage_find)?);
            if stage_find.satisfied(matches.len()) {
                break;
            }
        }

        let matches = dedup_first_seen(matches);
        debug!(stage = index, selector = %stage, subjects = subjects.len(), matches = matches.len(), "pipeline stage");
        if matches.is_empty() {
            return Ok(Vec::new());
        }
        subjects = matches;
    }

    // An empty pipeline never replaced the subject
    if stages.is_empty() {
        return Ok(Vec::new());
    }
    Ok(subjects)
}

fn dedup_first_seen<N: Copy + Eq + Hash>(nodes: Vec<N>) -> Vec<N> {
    if nodes.len() < 2 {
        return nodes;
    }
    let mut seen = HashSet::with_capacity(nodes.len());
    nodes.into_iter().filter(|node| seen.insert(*node)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shadow::tree::fixture::Forest;

    /// document
    ///   outer (shadow:
    ///     target#1
    ///     middle (shadow:
    ///       target#2))
    ///   target#0
    fn forest() -> Forest {
        let mut f = Forest::new();
        let outer = f.element("outer", Forest::DOCUMENT);
        let outer_root = f.attach_shadow(outer);
        f.element("target-1", outer_root);
        let middle = f.element("middle", outer_root);
        let middle_root = f.attach_shadow(middle);
        f.element("target-2", middle_root);
        f.element("target-0", Forest::DOCUMENT);
        f
    }

    #[test]
    fn test_one_hop_own_subtree_first() {
        let mut f = Forest::new();
        let host = f.element("x-host", Forest::DOCUMENT);
        let root = f.attach_shadow(host);
        let hidden = f.element("item", root);
        let light = f.element("item", Forest::DOCUMENT);

        let first = match_across_one_hop(&f, "item", Forest::DOCUMENT, Find::First).unwrap();
        assert_eq!(first, vec![light]);

        let all = match_across_one_hop(&f, "item", Forest::DOCUMENT, Find::All).unwrap();
        assert_eq!(all, vec![light, hidden]);
    }

    #[test]
    fn test_one_hop_reaches_nested_roots() {
        let f = forest();
        let found = match_across_one_hop(&f, "target-2", Forest::DOCUMENT, Find::First).unwrap();
        assert_eq!(found, vec![f.id("target-2")]);
    }

    #[test]
    fn test_satisfies_chain_through_two_hosts() {
        let f = forest();
        let deep = f.id("target-2");
        let ancestors = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        assert!(satisfies_chain(&f, deep, &ancestors(&["middle"])).unwrap());
        assert!(satisfies_chain(&f, deep, &ancestors(&["outer"])).unwrap());
        assert!(satisfies_chain(&f, deep, &ancestors(&["outer", "middle"])).unwrap());
        // Order matters: middle is not above outer
        assert!(!satisfies_chain(&f, deep, &ancestors(&["middle", "outer"])).unwrap());
        assert!(!satisfies_chain(&f, f.id("target-0"), &ancestors(&["outer"])).unwrap());
    }

    #[test]
    fn test_satisfies_chain_is_strict() {
        let f = forest();
        let middle = f.id("middle");
        let ancestors = vec!["middle".to_string()];
        assert!(!satisfies_chain(&f, middle, &ancestors).unwrap());
    }

    #[test]
    fn test_resolve_chain_uses_boundary_interior_candidates() {
        let f = forest();
        let set = split("outer target-1").unwrap();
        let chain = &set.chains()[0];
        let found = resolve_chain(&f, chain, Forest::DOCUMENT, Find::All).unwrap();
        assert_eq!(found, vec![f.id("target-1")]);

        let set = split("middle target-1").unwrap();
        let found = resolve_chain(&f, &set.chains()[0], Forest::DOCUMENT, Find::First).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_pipeline_stages() {
        let f = forest();
        let pipeline = Selectors::from(&["outer", "middle", "target-2"][..]);
        let found = query_selector_all(&f, &pipeline, Forest::DOCUMENT, &QueryOptions::default()).unwrap();
        assert_eq!(found, vec![f.id("target-2")]);

        let first = query_selector(&f, &pipeline, Forest::DOCUMENT, &QueryOptions::default()).unwrap();
        assert_eq!(first, Some(f.id("target-2")));
    }

    #[test]
    fn test_pipeline_empty_stage_short_circuits() {
        let f = forest();
        let pipeline = Selectors::from(&["missing", "target-2"][..]);
        assert!(query_selector_all(&f, &pipeline, Forest::DOCUMENT, &QueryOptions::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_empty_pipeline() {
        let f = forest();
        let pipeline = Selectors::Pipeline(Vec::new());
        let options = QueryOptions::default();
        assert_eq!(query_selector(&f, &pipeline, Forest::DOCUMENT, &options).unwrap(), None);
        assert!(query_selector_all(&f, &pipeline, Forest::DOCUMENT, &options).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_selector_reported_by_splitter_in_cross_boundary_mode() {
        let f = forest();
        let selector = Selectors::from("outer target-1[");

        let err = query_selector(&f, &selector, Forest::DOCUMENT, &QueryOptions { cross_boundary: true }).unwrap_err();
        assert_eq!(err, QueryError::malformed("outer target-1[", 14, "unclosed '['"));

        let err = query_selector(&f, &selector, Forest::DOCUMENT, &QueryOptions::default()).unwrap_err();
        assert!(matches!(err, QueryError::InvalidSelector { .. }));
    }

    #[test]
    fn test_pipeline_stage_dedups_shared_matches() {
        // document > x-nest (shadow: x-nest (shadow: leaf))
        let mut f = Forest::new();
        let outer = f.element("x-nest", Forest::DOCUMENT);
        let outer_root = f.attach_shadow(outer);
        let inner = f.element("x-nest", outer_root);
        let inner_root = f.attach_shadow(inner);
        let leaf = f.element("leaf", inner_root);

        let options = QueryOptions::default();
        let hosts = query_selector_all(&f, &Selectors::from("x-nest"), Forest::DOCUMENT, &options).unwrap();
        assert_eq!(hosts, vec![outer, inner]);

        // Both hosts reach the leaf; it is reported once
        let pipeline = Selectors::from(&["x-nest", "leaf"][..]);
        let found = query_selector_all(&f, &pipeline, Forest::DOCUMENT, &options).unwrap();
        assert_eq!(found, vec![leaf]);
    }

    #[test]
    fn test_dedup_first_seen() {
        assert_eq!(dedup_first_seen(vec![3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }

    #[test]
    fn test_queries_leave_tree_unchanged() {
        let f = forest();
        let before = format!("{f:?}");
        let options = QueryOptions { cross_boundary: true };
        let _ = query_selector_all(&f, &Selectors::from("target-2"), Forest::DOCUMENT, &options).unwrap();
        assert_eq!(format!("{f:?}"), before);
    }
}
