//! Selector chain splitting
//!
//! Splits a selector into top-level alternatives (comma separated), and each
//! alternative into segments at top-level descendant combinators. Explicit
//! combinators (`>`, `+`, `~`, `||`) stay inside their segment: the matcher
//! resolves those within one boundary, only the descendant relation has to
//! be verified across shadow roots.
//!
//! Parentheses, brackets, quoted strings and backslash escapes never contain
//! a split point.

use crate::error::QueryError;

/// Selector text with no top-level descendant combinator
pub type Segment = String;

/// One alternative: ancestor segments followed by the target segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain(Vec<Segment>);

impl Chain {
    /// Segment the returned node must match
    pub fn target(&self) -> &str {
        self.0.last().map_or("", String::as_str)
    }

    /// Ancestor segments, outermost first
    pub fn ancestors(&self) -> &[Segment] {
        &self.0[..self.0.len().saturating_sub(1)]
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Alternatives of a selector list, in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainSet(Vec<Chain>);

impl ChainSet {
    pub fn chains(&self) -> &[Chain] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chain> {
        self.0.iter()
    }

    /// Plain nested vectors, for callers outside Rust
    pub fn to_vecs(&self) -> Vec<Vec<String>> {
        self.0.iter().map(|chain| chain.0.clone()).collect()
    }
}

impl<'a> IntoIterator for &'a ChainSet {
    type Item = &'a Chain;
    type IntoIter = std::slice::Iter<'a, Chain>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[inline]
fn is_combinator(c: char) -> bool {
    matches!(c, '>' | '+' | '~' | '|')
}

#[inline]
fn has_content(segment: &str) -> bool {
    segment.chars().any(|c| !c.is_whitespace())
}

/// Split a selector into its chain set.
///
/// Whitespace that does not separate segments is kept verbatim, so a
/// selector without a top-level descendant combinator comes back unchanged
/// and later alternatives keep their leading whitespace. An empty or
/// all-whitespace selector yields an empty set.
pub fn split(predicate: &str) -> Result<ChainSet, QueryError> {
    if !has_content(predicate) {
        return Ok(ChainSet::default());
    }

    let mut chains: Vec<Chain> = Vec::new();
    let mut segments: Vec<Segment> = Vec::new();
    let mut segment = String::new();

    // Whitespace run seen at top level, not yet classified
    let mut pending_ws = String::new();
    // Last non-whitespace character at top level of the current segment
    let mut last_sig: Option<char> = None;

    // Expected closers with the position of their opener
    let mut groups: Vec<(char, usize)> = Vec::new();
    let mut quote: Option<(char, usize)> = None;
    let mut escape_at: Option<usize> = None;

    for (i, c) in predicate.char_indices() {
        if escape_at.take().is_some() {
            segment.push(c);
            continue;
        }

        if let Some((q, _)) = quote {
            segment.push(c);
            match c {
                '\\' => escape_at = Some(i),
                _ if c == q => quote = None,
                _ => {}
            }
            continue;
        }

        let top_level = groups.is_empty();

        if top_level && c.is_whitespace() {
            pending_ws.push(c);
            continue;
        }

        if !pending_ws.is_empty() {
            let splits = c != ','
                && has_content(&segment)
                && !last_sig.is_some_and(is_combinator)
                && !is_combinator(c);
            if splits {
                segments.push(std::mem::take(&mut segment));
                last_sig = None;
                pending_ws.clear();
            } else {
                segment.push_str(&pending_ws);
                pending_ws.clear();
            }
        }

        match c {
            ',' if top_level => {
                if !has_content(&segment) {
                    return Err(QueryError::malformed(predicate, i, "empty alternative"));
                }
                segments.push(std::mem::take(&mut segment));
                chains.push(Chain(std::mem::take(&mut segments)));
                last_sig = None;
                continue;
            }
            '\\' => escape_at = Some(i),
            '"' | '\'' => quote = Some((c, i)),
            '(' => groups.push((')', i)),
            '[' => groups.push((']', i)),
            ')' | ']' => match groups.last() {
                Some(&(closer, _)) if closer == c => {
                    groups.pop();
                }
                _ => {
                    let reason = if c == ')' { "unbalanced ')'" } else { "unbalanced ']'" };
                    return Err(QueryError::malformed(predicate, i, reason));
                }
            },
            _ => {}
        }

        segment.push(c);
        if top_level || groups.is_empty() {
            last_sig = Some(c);
        }
    }

    if let Some(at) = escape_at {
        return Err(QueryError::malformed(predicate, at, "dangling escape"));
    }
    if let Some((_, at)) = quote {
        return Err(QueryError::malformed(predicate, at, "unterminated string"));
    }
    if let Some(&(closer, at)) = groups.first() {
        let reason = if closer == ')' { "unclosed '('" } else { "unclosed '['" };
        return Err(QueryError::malformed(predicate, at, reason));
    }

    segment.push_str(&pending_ws);
    if !has_content(&segment) {
        return Err(QueryError::malformed(predicate, predicate.len(), "empty alternative"));
    }
    segments.push(segment);
    chains.push(Chain(segments));

    Ok(ChainSet(chains))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chains(predicate: &str) -> Vec<Vec<String>> {
        split(predicate).unwrap().to_vecs()
    }

    #[test]
    fn test_universal() {
        assert_eq!(chains("*"), vec![vec!["*"]]);
    }

    #[test]
    fn test_descendant() {
        assert_eq!(chains("div span"), vec![vec!["div", "span"]]);
    }

    #[test]
    fn test_pseudo_class_arguments_not_split() {
        assert_eq!(chains("div:not([hidden]) span"), vec![vec!["div:not([hidden])", "span"]]);
        assert_eq!(
            chains("div:not(:hover, :focus) span"),
            vec![vec!["div:not(:hover, :focus)", "span"]]
        );
        assert_eq!(
            chains("div:is(.foo .bar, .baz) span"),
            vec![vec!["div:is(.foo .bar, .baz)", "span"]]
        );
        assert_eq!(chains("div:nth-child(2n + 1) span"), vec![vec!["div:nth-child(2n + 1)", "span"]]);
    }

    #[test]
    fn test_alternatives_keep_leading_whitespace() {
        assert_eq!(chains("div, span"), vec![vec!["div"], vec![" span"]]);
        assert_eq!(chains("foo, bar, baz"), vec![vec!["foo"], vec![" bar"], vec![" baz"]]);
    }

    #[test]
    fn test_class_id_attribute_compounds() {
        assert_eq!(chains("div.foo bar"), vec![vec!["div.foo", "bar"]]);
        assert_eq!(chains("div#foo bar"), vec![vec!["div#foo", "bar"]]);
        assert_eq!(chains("div[hidden] bar"), vec![vec!["div[hidden]", "bar"]]);
        assert_eq!(chains("div[attr=\"foo\"] bar"), vec![vec!["div[attr=\"foo\"]", "bar"]]);
    }

    #[test]
    fn test_attribute_selectors_are_single_segments() {
        for p in [
            "div[attr=\"foo\" i]",
            "div[attr~=\"foo\"]",
            "div[attr^=\"foo\"]",
            "div[attr$=\"foo\"]",
            "div[attr*=\"foo\"]",
            "div[attr|=\"foo\"]",
        ] {
            assert_eq!(chains(p), vec![vec![p]], "{p}");
        }
    }

    #[test]
    fn test_explicit_combinators_absorbed() {
        assert_eq!(chains("foo > bar baz"), vec![vec!["foo > bar", "baz"]]);
        assert_eq!(chains("foo + bar baz"), vec![vec!["foo + bar", "baz"]]);
        assert_eq!(chains("foo ~ bar baz"), vec![vec!["foo ~ bar", "baz"]]);
        assert_eq!(chains("foo bar > baz"), vec![vec!["foo", "bar > baz"]]);
        assert_eq!(chains("foo>bar baz"), vec![vec!["foo>bar", "baz"]]);
    }

    #[test]
    fn test_whitespace_run_is_one_combinator() {
        assert_eq!(chains("lotsa         whitespace"), vec![vec!["lotsa", "whitespace"]]);
        assert_eq!(chains("a\t\n b"), vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_quotes_and_escapes_not_split() {
        assert_eq!(chains("a[title=\"x y\"] b"), vec![vec!["a[title=\"x y\"]", "b"]]);
        assert_eq!(chains("a[title='x, y'] b"), vec![vec!["a[title='x, y']", "b"]]);
        assert_eq!(chains("a\\ b c"), vec![vec!["a\\ b", "c"]]);
        assert_eq!(chains("a[t=\"q\\\"x y\"]"), vec![vec!["a[t=\"q\\\"x y\"]"]]);
    }

    #[test]
    fn test_outer_whitespace_kept() {
        assert_eq!(chains("  div span "), vec![vec!["  div", "span "]]);
        assert_eq!(chains("div , span"), vec![vec!["div "], vec![" span"]]);
    }

    #[test]
    fn test_empty_selector() {
        assert!(split("").unwrap().is_empty());
        assert!(split("   ").unwrap().is_empty());
    }

    #[test]
    fn test_chain_accessors() {
        let set = split("a b c").unwrap();
        let chain = &set.chains()[0];
        assert_eq!(chain.target(), "c");
        assert_eq!(chain.ancestors(), &["a".to_string(), "b".to_string()]);
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn test_malformed() {
        let cases = [
            ("div[attr", 3, "unclosed '['"),
            ("div:not(a", 7, "unclosed '('"),
            ("div) span", 3, "unbalanced ')'"),
            ("a[b)]", 3, "unbalanced ')'"),
            ("a[title=\"x] b", 8, "unterminated string"),
            ("a\\", 1, "dangling escape"),
            ("a,,b", 2, "empty alternative"),
            ("a, ", 3, "empty alternative"),
            (", a", 0, "empty alternative"),
        ];
        for (p, position, reason) in cases {
            assert_eq!(split(p), Err(QueryError::malformed(p, position, reason)), "{p}");
        }
    }

    fn compound() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,6}(\\.[a-z]{1,5}|#[a-z]{1,5}|\\[[a-z]{1,4}( i)?\\]|:not\\([a-z]{1,4}(, [a-z]{1,4})?\\)){0,3}"
    }

    proptest! {
        /// A selector with no top-level combinator is its own single segment
        #[test]
        fn prop_single_segment_identity(p in compound()) {
            prop_assert_eq!(chains(&p), vec![vec![p.clone()]]);
        }

        /// Compounds joined by whitespace split into one segment each
        #[test]
        fn prop_descendant_chain_length(parts in prop::collection::vec(compound(), 1..6), gap in " {1,4}") {
            let p = parts.join(&gap);
            prop_assert_eq!(chains(&p), vec![parts]);
        }

        /// Top-level commas give one chain per alternative
        #[test]
        fn prop_alternation_preserves_count(parts in prop::collection::vec(compound(), 1..6)) {
            let p = parts.join(", ");
            let set = split(&p).unwrap();
            prop_assert_eq!(set.len(), parts.len());
            prop_assert!(set.iter().all(|chain| chain.len() == 1));
        }
    }
}
