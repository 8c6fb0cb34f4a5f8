//! Elixir Term Conversion Utilities
//!
//! Converts shadow documents, query results and errors to Elixir terms,
//! and decodes query arguments coming the other way.

use crate::dom::{to_markup, DocumentView, NodeId, NodeKind, ShadowRootMode};
use crate::error::QueryError;
use crate::shadow::{ChainSet, QueryOptions, Selectors};
use rustler::{Encoder, Env, NewBinary, NifResult, NifUntaggedEnum, Term};

// Pre-defined atoms for efficiency - created once at compile time
rustler::atoms! {
    element,
    comment,
    pi,
    shadow_root,
    open,
    closed,
    cross_boundary,
    error,
}

/// A selector string or a pipeline of selector strings
#[derive(NifUntaggedEnum)]
pub enum SelectorArg {
    One(String),
    Many(Vec<String>),
}

impl From<SelectorArg> for Selectors {
    fn from(arg: SelectorArg) -> Self {
        match arg {
            SelectorArg::One(selector) => Selectors::One(selector),
            SelectorArg::Many(stages) => Selectors::Pipeline(stages),
        }
    }
}

/// Decode an options map. Missing keys take their defaults and unknown
/// keys are ignored.
pub fn decode_options(opts: Term<'_>) -> NifResult<QueryOptions> {
    if !opts.is_map() {
        return Err(rustler::Error::BadArg);
    }

    let mut options = QueryOptions::default();
    let key = cross_boundary().encode(opts.get_env());
    if let Ok(value) = opts.map_get(key) {
        options.cross_boundary = value.decode()?;
    }
    Ok(options)
}

fn mode_atom(mode: Option<ShadowRootMode>) -> rustler::Atom {
    match mode {
        Some(ShadowRootMode::Closed) => closed(),
        _ => open(),
    }
}

/// Convert a node to an Elixir term.
///
/// Elements are `{:element, name, attrs, children}`; a hosted shadow root
/// comes first among the children as `{:shadow_root, mode, children}`.
pub fn node_to_term<'a>(env: Env<'a>, view: &DocumentView<'_>, node_id: NodeId) -> Term<'a> {
    let Some(node) = view.get_node(node_id) else {
        return rustler::types::atom::nil().encode(env);
    };

    match node.kind {
        NodeKind::Element => {
            let name_term = str_to_binary(env, view.node_name(node_id).unwrap_or(""));

            let mut attrs = Term::list_new_empty(env);
            for (name, value) in view.get_attribute_values(node_id).into_iter().rev() {
                let attr_tuple = (str_to_binary(env, name), str_to_binary(env, value));
                attrs = attrs.list_prepend(attr_tuple.encode(env));
            }

            let mut children = children_to_term(env, view, node_id);
            if let Some(root) = view.shadow_root_of(node_id) {
                children = children.list_prepend(node_to_term(env, view, root));
            }

            (element(), name_term, attrs, children).encode(env)
        }
        NodeKind::ShadowRoot => {
            let children = children_to_term(env, view, node_id);
            (shadow_root(), mode_atom(node.mode), children).encode(env)
        }
        NodeKind::Text | NodeKind::CData => str_to_binary(env, view.text_content(node_id).unwrap_or("")),
        NodeKind::Comment => (comment(), str_to_binary(env, view.text_content(node_id).unwrap_or(""))).encode(env),
        NodeKind::ProcessingInstruction => (pi(), str_to_binary(env, view.node_name(node_id).unwrap_or(""))).encode(env),
        NodeKind::Document => match view.root_element_id() {
            Some(root_id) => node_to_term(env, view, root_id),
            None => rustler::types::atom::nil().encode(env),
        },
    }
}

/// Light-tree children, built by walking last_child -> prev_sibling
fn children_to_term<'a>(env: Env<'a>, view: &DocumentView<'_>, node_id: NodeId) -> Term<'a> {
    let mut children = Term::list_new_empty(env);
    let mut child_id = view.get_node(node_id).and_then(|n| n.last_child);
    while let Some(cid) = child_id {
        children = children.list_prepend(node_to_term(env, view, cid));
        child_id = view.get_node(cid).and_then(|n| n.prev_sibling);
    }
    children
}

/// Convert a list of nodes to a list of node terms
pub fn nodes_to_term<'a>(env: Env<'a>, view: &DocumentView<'_>, nodes: &[NodeId]) -> Term<'a> {
    let mut list = Term::list_new_empty(env);
    for &id in nodes.iter().rev() {
        list = list.list_prepend(node_to_term(env, view, id));
    }
    list
}

/// Convert a list of nodes to a list of markup binaries (fast path)
pub fn nodes_to_markup_binaries<'a>(env: Env<'a>, view: &DocumentView<'_>, nodes: &[NodeId]) -> Term<'a> {
    let mut list = Term::list_new_empty(env);
    for &id in nodes.iter().rev() {
        let markup = to_markup(view, id);
        list = list.list_prepend(bytes_to_binary(env, markup.as_bytes()));
    }
    list
}

/// Convert a chain set to a list of segment lists
pub fn chain_set_to_term<'a>(env: Env<'a>, chains: &ChainSet) -> Term<'a> {
    let mut list = Term::list_new_empty(env);
    for chain in chains.iter().rev() {
        let mut segments = Term::list_new_empty(env);
        for segment in chain.segments().iter().rev() {
            segments = segments.list_prepend(str_to_binary(env, segment));
        }
        list = list.list_prepend(segments);
    }
    list
}

/// `{:error, message}`
pub fn error_to_term<'a>(env: Env<'a>, err: &QueryError) -> Term<'a> {
    (error(), str_to_binary(env, &err.to_string())).encode(env)
}

/// Convert a string to a binary term (more efficient than .encode())
#[inline]
fn str_to_binary<'a>(env: Env<'a>, s: &str) -> Term<'a> {
    bytes_to_binary(env, s.as_bytes())
}

/// Create a binary from bytes
pub fn bytes_to_binary<'a>(env: Env<'a>, bytes: &[u8]) -> Term<'a> {
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}
