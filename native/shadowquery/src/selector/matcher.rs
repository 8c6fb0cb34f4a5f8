//! Selector matching against a `DocumentView`
//!
//! Matching never leaves the boundary an element lives in: ancestor and
//! sibling relations follow light-tree links only, so a shadow root (or the
//! document) ends every ancestor walk.

use super::cache::compile;
use super::parser::{
    AttrOperator, AttributeSelector, Combinator, ComplexSelector, CompoundSelector, Nth, PseudoClass,
    SelectorList, SimpleSelector,
};
use crate::dom::{DocumentView, NodeId, NodeKind};
use crate::error::QueryError;
use crate::shadow::tree::PrimitiveMatcher;

/// Whether `element` matches any selector of the list
pub fn matches_list(view: &DocumentView, element: NodeId, list: &SelectorList) -> bool {
    list.0.iter().any(|complex| matches_complex(view, element, complex))
}

pub fn matches_complex(view: &DocumentView, element: NodeId, complex: &ComplexSelector) -> bool {
    matches_compound(view, element, &complex.subject) && matches_ancestry(view, element, &complex.ancestry)
}

/// Walk the remaining compounds right to left, backtracking over every
/// candidate a descendant or subsequent-sibling combinator allows
fn matches_ancestry(view: &DocumentView, element: NodeId, ancestry: &[(Combinator, CompoundSelector)]) -> bool {
    let Some(((combinator, compound), rest)) = ancestry.split_first() else {
        return true;
    };
    let fits = |candidate: NodeId| matches_compound(view, candidate, compound) && matches_ancestry(view, candidate, rest);

    match combinator {
        Combinator::Child => view.parent_element(element).is_some_and(fits),
        Combinator::NextSibling => previous_element_sibling(view, element).is_some_and(fits),
        Combinator::Descendant => {
            let mut current = view.parent_element(element);
            while let Some(ancestor) = current {
                if fits(ancestor) {
                    return true;
                }
                current = view.parent_element(ancestor);
            }
            false
        }
        Combinator::SubsequentSibling => {
            let mut current = previous_element_sibling(view, element);
            while let Some(sibling) = current {
                if fits(sibling) {
                    return true;
                }
                current = previous_element_sibling(view, sibling);
            }
            false
        }
    }
}

fn matches_compound(view: &DocumentView, element: NodeId, compound: &CompoundSelector) -> bool {
    if !view.is_element(element) {
        return false;
    }
    if let Some(tag) = &compound.tag {
        if !view.node_name(element).is_some_and(|name| name.eq_ignore_ascii_case(tag)) {
            return false;
        }
    }
    compound.simple.iter().all(|simple| matches_simple(view, element, simple))
}

fn matches_simple(view: &DocumentView, element: NodeId, simple: &SimpleSelector) -> bool {
    match simple {
        SimpleSelector::Id(id) => view.get_attribute(element, "id") == Some(id.as_str()),
        SimpleSelector::Class(class) => view
            .get_attribute(element, "class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class)),
        SimpleSelector::Attribute(attr) => attr.matches(view.get_attribute(element, &attr.name)),
        SimpleSelector::Pseudo(pseudo) => matches_pseudo(view, element, pseudo),
    }
}

impl AttributeSelector {
    /// Test an attribute value; None means the attribute is absent
    pub fn matches(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return false;
        };
        let Some((op, expected)) = &self.matcher else {
            return true;
        };

        let (value, expected) = if self.case_insensitive {
            (value.to_ascii_lowercase(), expected.to_ascii_lowercase())
        } else {
            (value.to_string(), expected.clone())
        };

        match op {
            AttrOperator::Equals => value == expected,
            AttrOperator::Includes => {
                !expected.is_empty()
                    && !expected.contains(char::is_whitespace)
                    && value.split_ascii_whitespace().any(|word| word == expected)
            }
            AttrOperator::DashMatch => {
                value == expected || value.strip_prefix(expected.as_str()).is_some_and(|rest| rest.starts_with('-'))
            }
            AttrOperator::Prefix => !expected.is_empty() && value.starts_with(&expected),
            AttrOperator::Suffix => !expected.is_empty() && value.ends_with(&expected),
            AttrOperator::Substring => !expected.is_empty() && value.contains(&expected),
        }
    }
}

fn matches_pseudo(view: &DocumentView, element: NodeId, pseudo: &PseudoClass) -> bool {
    match pseudo {
        PseudoClass::Not(list) => !matches_list(view, element, list),
        PseudoClass::Is(list) => matches_list(view, element, list),
        PseudoClass::FirstChild => previous_element_sibling(view, element).is_none(),
        PseudoClass::LastChild => next_element_sibling(view, element).is_none(),
        PseudoClass::OnlyChild => {
            previous_element_sibling(view, element).is_none() && next_element_sibling(view, element).is_none()
        }
        PseudoClass::FirstOfType => position(view, element, Direction::Before, true) == 1,
        PseudoClass::LastOfType => position(view, element, Direction::After, true) == 1,
        PseudoClass::OnlyOfType => {
            position(view, element, Direction::Before, true) == 1
                && position(view, element, Direction::After, true) == 1
        }
        PseudoClass::NthChild(nth) => nth_matches(view, element, *nth, Direction::Before, false),
        PseudoClass::NthLastChild(nth) => nth_matches(view, element, *nth, Direction::After, false),
        PseudoClass::NthOfType(nth) => nth_matches(view, element, *nth, Direction::Before, true),
        PseudoClass::NthLastOfType(nth) => nth_matches(view, element, *nth, Direction::After, true),
        PseudoClass::Empty => view.children(element).all(|child| match view.kind(child) {
            Some(NodeKind::Text | NodeKind::CData) => view.text_content(child).is_none_or(str::is_empty),
            Some(NodeKind::Element) => false,
            _ => true,
        }),
        PseudoClass::Root => view.parent_of(element).and_then(|p| view.kind(p)) == Some(NodeKind::Document),
        PseudoClass::UserAction => false,
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Before,
    After,
}

fn nth_matches(view: &DocumentView, element: NodeId, nth: Nth, direction: Direction, of_type: bool) -> bool {
    i32::try_from(position(view, element, direction, of_type)).is_ok_and(|pos| nth.matches(pos))
}

/// 1-based position among element siblings, counted from the start or the
/// end, optionally only among siblings with the same name
fn position(view: &DocumentView, element: NodeId, direction: Direction, of_type: bool) -> usize {
    let name = view.node_name(element);
    let same_kind = |sibling: NodeId| !of_type || view.node_name(sibling).zip(name).is_some_and(|(a, b)| a.eq_ignore_ascii_case(b));
    let step = |id: NodeId| match direction {
        Direction::Before => previous_element_sibling(view, id),
        Direction::After => next_element_sibling(view, id),
    };

    let mut count = 1;
    let mut current = step(element);
    while let Some(sibling) = current {
        if same_kind(sibling) {
            count += 1;
        }
        current = step(sibling);
    }
    count
}

fn previous_element_sibling(view: &DocumentView, id: NodeId) -> Option<NodeId> {
    let mut current = view.get_node(id)?.prev_sibling;
    while let Some(sibling) = current {
        if view.is_element(sibling) {
            return Some(sibling);
        }
        current = view.get_node(sibling)?.prev_sibling;
    }
    None
}

fn next_element_sibling(view: &DocumentView, id: NodeId) -> Option<NodeId> {
    let mut current = view.get_node(id)?.next_sibling;
    while let Some(sibling) = current {
        if view.is_element(sibling) {
            return Some(sibling);
        }
        current = view.get_node(sibling)?.next_sibling;
    }
    None
}

impl PrimitiveMatcher for DocumentView<'_> {
    fn match_first(&self, predicate: &str, scope: NodeId) -> Result<Option<NodeId>, QueryError> {
        let list = compile(predicate)?;
        Ok(self
            .descendants(scope)
            .find(|&node| matches_list(self, node, &list)))
    }

    fn match_all(&self, predicate: &str, scope: NodeId) -> Result<Vec<NodeId>, QueryError> {
        let list = compile(predicate)?;
        Ok(self
            .descendants(scope)
            .filter(|&node| matches_list(self, node, &list))
            .collect())
    }

    fn closest(&self, node: NodeId, predicate: &str) -> Result<Option<NodeId>, QueryError> {
        let list = compile(predicate)?;
        let mut current = Some(node).filter(|&id| self.is_element(id));
        while let Some(element) = current {
            if matches_list(self, element, &list) {
                return Ok(Some(element));
            }
            current = self.parent_element(element);
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ShadowDocument;
    use crate::shadow::{query_selector, query_selector_all, QueryOptions, Selectors};

    /// `<level-one>` hosts `<level-two>` and a paragraph; `<level-two>`
    /// hosts its own paragraph
    const LEVELS: &[u8] = br#"<html><body>
<level-one>
  <template shadowrootmode="open">
    <level-two>
      <template shadowrootmode="open"><p class="level-two-p">I am level 2</p></template>
    </level-two>
    <p class="level-one-p">I am level 1</p>
  </template>
</level-one>
</body></html>"#;

    fn names(view: &DocumentView, ids: &[NodeId]) -> Vec<String> {
        ids.iter().filter_map(|&id| view.node_name(id)).map(str::to_string).collect()
    }

    fn in_document(view: &DocumentView, selector: &str) -> Vec<NodeId> {
        view.match_all(selector, view.document_node_id()).unwrap()
    }

    #[test]
    fn test_finds_same_root_nodes() {
        let doc = ShadowDocument::parse(LEVELS);
        let view = doc.as_view();
        let found = query_selector(&view, &"level-one".into(), 0, &QueryOptions::default()).unwrap();
        assert_eq!(found.and_then(|id| view.node_name(id)), Some("level-one"));
    }

    #[test]
    fn test_finds_nodes_across_shadow_boundaries() {
        let doc = ShadowDocument::parse(LEVELS);
        let view = doc.as_view();
        let host = in_document(&view, "level-one")[0];
        let root = DocumentView::shadow_root_of(&view, host).unwrap();
        let expected = view.match_first("level-two", root).unwrap();

        let found = query_selector(&view, &"level-two".into(), 0, &QueryOptions::default()).unwrap();
        assert!(found.is_some());
        assert_eq!(found, expected);
    }

    #[test]
    fn test_cross_boundary_selector_needs_option() {
        let doc = ShadowDocument::parse(LEVELS);
        let view = doc.as_view();
        let selector = Selectors::from("level-one level-two");

        let found = query_selector(&view, &selector, 0, &QueryOptions::default()).unwrap();
        assert_eq!(found, None);

        let options = QueryOptions { cross_boundary: true };
        let found = query_selector(&view, &selector, 0, &options).unwrap();
        assert_eq!(found.and_then(|id| view.node_name(id)), Some("level-two"));
    }

    #[test]
    fn test_two_level_chain() {
        let doc = ShadowDocument::parse(LEVELS);
        let view = doc.as_view();
        let options = QueryOptions { cross_boundary: true };

        let found = query_selector_all(&view, &"level-one .level-two-p".into(), 0, &options).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(view.string_value(found[0]), "I am level 2");

        let found = query_selector_all(&view, &"body level-two p".into(), 0, &options).unwrap();
        assert_eq!(names(&view, &found), vec!["p"]);

        // level-two is not an ancestor of level-one's own paragraph
        let found = query_selector_all(&view, &"level-two .level-one-p".into(), 0, &options).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_own_subtree_precedes_shadow_matches() {
        let doc = ShadowDocument::parse(LEVELS);
        let view = doc.as_view();
        let all = query_selector_all(&view, &"p".into(), 0, &QueryOptions::default()).unwrap();
        let texts: Vec<_> = all.iter().map(|&id| view.string_value(id)).collect();
        assert_eq!(texts, vec!["I am level 1", "I am level 2"]);
    }

    #[test]
    fn test_own_subtree_first_in_cross_boundary_mode() {
        let doc = ShadowDocument::parse(
            br#"<div><x-host><template shadowrootmode="open"><p id="in"></p></template></x-host><p id="light"></p></div>"#,
        );
        let view = doc.as_view();
        let options = QueryOptions { cross_boundary: true };
        let selector = Selectors::from("div p");
        let id_of = |node: NodeId| view.get_attribute(node, "id");

        let first = query_selector(&view, &selector, 0, &options).unwrap();
        assert_eq!(first.and_then(id_of), Some("light"));

        let all = query_selector_all(&view, &selector, 0, &options).unwrap();
        let ids: Vec<_> = all.into_iter().filter_map(id_of).collect();
        assert_eq!(ids, vec!["light", "in"]);
    }

    #[test]
    fn test_pipeline_matches_chain() {
        let doc = ShadowDocument::parse(LEVELS);
        let view = doc.as_view();
        let pipeline = Selectors::from(&["level-one", "level-two", "p"][..]);
        let via_pipeline = query_selector_all(&view, &pipeline, 0, &QueryOptions::default()).unwrap();

        let options = QueryOptions { cross_boundary: true };
        let via_chain = query_selector_all(&view, &"level-one level-two p".into(), 0, &options).unwrap();
        assert_eq!(via_pipeline, via_chain);
    }

    #[test]
    fn test_repeated_queries_agree() {
        let doc = ShadowDocument::parse(LEVELS);
        let view = doc.as_view();
        let options = QueryOptions { cross_boundary: true };
        let selector = Selectors::from("level-one p, level-two");
        let a = query_selector_all(&view, &selector, 0, &options).unwrap();
        let b = query_selector_all(&view, &selector, 0, &options).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn test_invalid_selector_surfaces() {
        let doc = ShadowDocument::parse(LEVELS);
        let view = doc.as_view();
        let err = query_selector(&view, &"p::before".into(), 0, &QueryOptions::default()).unwrap_err();
        assert!(matches!(err, QueryError::InvalidSelector { .. }));
    }

    #[test]
    fn test_combinators_stay_inside_boundary() {
        let doc = ShadowDocument::parse(
            br#"<div id="top"><x-host><template shadowrootmode="open"><span>in</span></template></x-host><span>out</span></div>"#,
        );
        let view = doc.as_view();
        assert_eq!(in_document(&view, "div span").len(), 1);
        assert_eq!(in_document(&view, "x-host + span").len(), 1);
        let host = in_document(&view, "x-host")[0];
        let root = DocumentView::shadow_root_of(&view, host).unwrap();
        assert!(view.match_all("div span", root).unwrap().is_empty());
        assert_eq!(view.match_all("span", root).unwrap().len(), 1);
    }

    #[test]
    fn test_attribute_operators() {
        let doc = ShadowDocument::parse(
            br#"<ul><li lang="en-US" class="a b" data-k="Hello World"></li><li lang="fr" data-k=""></li></ul>"#,
        );
        let view = doc.as_view();
        for (selector, count) in [
            ("[lang]", 2),
            ("[lang|=en]", 1),
            ("[lang=fr]", 1),
            ("[class~=b]", 1),
            ("[data-k^=Hello]", 1),
            ("[data-k$=world i]", 1),
            ("[data-k$=world]", 0),
            ("[data-k*=\"o W\"]", 1),
            ("[data-k^=\"\"]", 0),
            ("[data-k=\"\"]", 1),
            (".a.b", 1),
            ("li:not(.a)", 1),
        ] {
            assert_eq!(in_document(&view, selector).len(), count, "{selector}");
        }
    }

    #[test]
    fn test_structural_pseudo_classes() {
        let doc = ShadowDocument::parse(b"<ol><li>1</li><b></b><li>2</li><li>3</li><!-- c --></ol>");
        let view = doc.as_view();
        let text = |selector: &str| -> Vec<String> {
            in_document(&view, selector).iter().map(|&id| view.string_value(id)).collect()
        };

        assert_eq!(text("li:first-child"), vec!["1"]);
        assert_eq!(text("li:last-child"), vec!["3"]);
        assert_eq!(text("li:nth-child(odd)"), vec!["1", "2"]);
        assert_eq!(text("li:nth-of-type(2)"), vec!["2"]);
        assert_eq!(text("li:nth-last-of-type(1)"), vec!["3"]);
        assert_eq!(text("li:first-of-type"), vec!["1"]);
        assert_eq!(in_document(&view, "b:only-of-type").len(), 1);
        assert_eq!(in_document(&view, "b:empty").len(), 1);
        assert_eq!(in_document(&view, "ol:root").len(), 1);
        assert!(in_document(&view, "li:hover").is_empty());
        assert_eq!(text("b ~ li"), vec!["2", "3"]);
        assert_eq!(text("li:is(:first-child, :last-child)"), vec!["1", "3"]);
        assert_eq!(text("li:nth-child(n-2147483648)"), vec!["1", "2", "3"]);
        assert!(text("li:nth-last-child(-n-2147483648)").is_empty());
    }

    #[test]
    fn test_closest_is_inclusive_and_scoped() {
        let doc = ShadowDocument::parse(
            br#"<section><x-host><template shadowrootmode="open"><div><em></em></div></template></x-host></section>"#,
        );
        let view = doc.as_view();
        let host = in_document(&view, "x-host")[0];
        let root = DocumentView::shadow_root_of(&view, host).unwrap();
        let em = view.match_first("em", root).unwrap().unwrap();

        assert_eq!(view.closest(em, "em").unwrap(), Some(em));
        assert!(view.closest(em, "div").unwrap().is_some());
        assert_eq!(view.closest(em, "section").unwrap(), None);
        assert_eq!(view.closest(host, "section").unwrap(), view.parent_element(host));
    }
}
