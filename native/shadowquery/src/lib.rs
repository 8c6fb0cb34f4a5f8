//! shadowquery - Cross-boundary selector queries over shadow DOM markup
//!
//! Layers:
//! - Reader: zero-copy markup events (reader, core)
//! - DOM: arena document with declarative shadow roots (dom)
//! - Selector: single-boundary matcher with a compiled cache (selector)
//! - Shadow: boundary discovery, chain splitting, cross-boundary queries (shadow)
//! - Parallel: many selectors on rayon's pool (strategy)

use rustler::{Binary, Encoder, Env, NifResult, ResourceArc, Term};

mod core;
pub mod dom;
pub mod error;
mod reader;
mod resource;
pub mod selector;
pub mod shadow;
pub mod strategy;
mod term;

use dom::{DocumentView, NodeId, ShadowDocument, DOCUMENT_NODE};
use error::QueryError;
use resource::{DocumentRef, DocumentResource};
use shadow::{discover_boundaries, QueryOptions, Selectors};
use term::{
    chain_set_to_term, decode_options, error_to_term, node_to_term, nodes_to_markup_binaries, nodes_to_term,
    SelectorArg,
};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// Documents
// ============================================================================

/// Parse markup into a shadow document (returns ResourceArc)
/// Lenient mode - never fails
#[rustler::nif]
fn parse<'a>(env: Env<'a>, input: Binary<'a>) -> NifResult<Term<'a>> {
    let resource = DocumentResource::new(input.as_slice());
    Ok(ResourceArc::new(resource).encode(env))
}

/// Shadow roots under the document, as `{:shadow_root, mode, children}`
/// terms in discovery order; `deep` also descends into nested roots
#[rustler::nif]
fn shadow_roots<'a>(env: Env<'a>, doc_ref: DocumentRef, deep: bool) -> NifResult<Term<'a>> {
    let result = doc_ref.with_view(|view| {
        let roots: Vec<NodeId> = discover_boundaries(&view, DOCUMENT_NODE, deep).collect();
        nodes_to_term(env, &view, &roots)
    });
    with_view_result(env, result)
}

/// Get root element of a document
#[rustler::nif]
fn get_root<'a>(env: Env<'a>, doc_ref: DocumentRef) -> NifResult<Term<'a>> {
    let result = doc_ref.with_view(|view| match view.root_element_id() {
        Some(root_id) => node_to_term(env, &view, root_id),
        None => rustler::types::atom::nil().encode(env),
    });
    with_view_result(env, result)
}

// ============================================================================
// Selector Splitting
// ============================================================================

/// Split a selector into its chain set: `[[segment]]` or `{:error, reason}`
#[rustler::nif]
fn split_selector<'a>(env: Env<'a>, selector: &str) -> NifResult<Term<'a>> {
    Ok(match shadow::split(selector) {
        Ok(chains) => chain_set_to_term(env, &chains),
        Err(e) => error_to_term(env, &e),
    })
}

// ============================================================================
// Cross-Boundary Queries
// ============================================================================
//
// Nodes cross into Elixir as plain terms with no handle back into the
// arena, so every query here starts at the document node.

/// First matching node, nil, or `{:error, reason}`
#[rustler::nif]
fn query_selector<'a>(env: Env<'a>, doc_ref: DocumentRef, selectors: SelectorArg, opts: Term<'a>) -> NifResult<Term<'a>> {
    let options = decode_options(opts)?;
    let selectors = Selectors::from(selectors);
    let result = doc_ref.with_view(|view| {
        match shadow::query_selector(&view, &selectors, DOCUMENT_NODE, &options) {
            Ok(Some(id)) => node_to_term(env, &view, id),
            Ok(None) => rustler::types::atom::nil().encode(env),
            Err(e) => error_to_term(env, &e),
        }
    });
    with_view_result(env, result)
}

/// All matching nodes, or `{:error, reason}`
#[rustler::nif]
fn query_selector_all<'a>(
    env: Env<'a>,
    doc_ref: DocumentRef,
    selectors: SelectorArg,
    opts: Term<'a>,
) -> NifResult<Term<'a>> {
    let options = decode_options(opts)?;
    let selectors = Selectors::from(selectors);
    let result = doc_ref.with_view(|view| {
        render_all(env, &view, query_all(&view, &selectors, &options), nodes_to_term)
    });
    with_view_result(env, result)
}

/// All matching nodes serialized back to markup binaries (fast path)
/// Bypasses BEAM term construction for the node trees
#[rustler::nif]
fn query_selector_all_raw<'a>(
    env: Env<'a>,
    doc_ref: DocumentRef,
    selectors: SelectorArg,
    opts: Term<'a>,
) -> NifResult<Term<'a>> {
    let options = decode_options(opts)?;
    let selectors = Selectors::from(selectors);
    let result = doc_ref.with_view(|view| {
        render_all(env, &view, query_all(&view, &selectors, &options), nodes_to_markup_binaries)
    });
    with_view_result(env, result)
}

/// Parse and immediately query (convenience function)
#[rustler::nif]
fn parse_and_query<'a>(env: Env<'a>, input: Binary<'a>, selectors: SelectorArg, opts: Term<'a>) -> NifResult<Term<'a>> {
    let options = decode_options(opts)?;
    let selectors = Selectors::from(selectors);
    let doc = ShadowDocument::parse(input.as_slice());
    let view = doc.as_view();
    Ok(render_all(env, &view, query_all(&view, &selectors, &options), nodes_to_term))
}

/// Run independent selectors in parallel
/// Each entry is a node list or `{:error, reason}`, in input order
#[rustler::nif(schedule = "DirtyCpu")]
fn query_parallel<'a>(env: Env<'a>, doc_ref: DocumentRef, selectors: Vec<String>, opts: Term<'a>) -> NifResult<Term<'a>> {
    let options = decode_options(opts)?;
    let result = doc_ref.with_view(|view| {
        let results = strategy::query_parallel(&view, &selectors, DOCUMENT_NODE, &options);

        let mut list = Term::list_new_empty(env);
        for result in results.into_iter().rev() {
            list = list.list_prepend(render_all(env, &view, result, nodes_to_term));
        }
        list
    });
    with_view_result(env, result)
}

// ============================================================================
// Helpers
// ============================================================================

fn query_all(view: &DocumentView<'_>, selectors: &Selectors, options: &QueryOptions) -> Result<Vec<NodeId>, QueryError> {
    shadow::query_selector_all(view, selectors, DOCUMENT_NODE, options)
}

fn render_all<'a>(
    env: Env<'a>,
    view: &DocumentView<'_>,
    result: Result<Vec<NodeId>, QueryError>,
    render: fn(Env<'a>, &DocumentView<'_>, &[NodeId]) -> Term<'a>,
) -> Term<'a> {
    match result {
        Ok(nodes) => render(env, view, &nodes),
        Err(e) => error_to_term(env, &e),
    }
}

/// A poisoned or empty resource reads as `{:error, reason}`
fn with_view_result<'a>(env: Env<'a>, result: Result<Term<'a>, &'static str>) -> NifResult<Term<'a>> {
    Ok(match result {
        Ok(term) => term,
        Err(reason) => (term::error(), reason).encode(env),
    })
}

// ============================================================================
// NIF Initialization
// ============================================================================

rustler::init!("Elixir.ShadowQuery.Native");
