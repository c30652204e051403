use crate::{Document, NodeId};
use veil_core::{PseudoStyle, TreeBackend, VeilError};

struct Fixture {
    doc: Document,
    body: NodeId,
    div_a: NodeId,
    span_x: NodeId,
    p_note: NodeId,
    div_b: NodeId,
    span_y: NodeId,
}

fn make_fixture() -> Fixture {
    let doc = Document::new();
    let body = doc.create_element("body");
    doc.append_child(doc.root(), body);

    let div_a = doc.create_element("div");
    doc.set_attribute(div_a, "id", "a");
    doc.set_attribute(div_a, "class", "content main");
    doc.append_child(body, div_a);

    let span_x = doc.create_element("span");
    doc.set_attribute(span_x, "class", "x");
    doc.set_text(span_x, "hello world");
    doc.append_child(div_a, span_x);

    let p_note = doc.create_element("p");
    doc.set_attribute(p_note, "class", "note");
    doc.set_text(p_note, "fine print");
    doc.append_child(div_a, p_note);

    let div_b = doc.create_element("div");
    doc.set_attribute(div_b, "id", "b");
    doc.set_attribute(div_b, "class", "ad");
    doc.set_attribute(div_b, "data-ad", "true");
    doc.append_child(body, div_b);

    let span_y = doc.create_element("span");
    doc.set_attribute(span_y, "class", "y");
    doc.set_text(span_y, "sponsored");
    doc.append_child(div_b, span_y);

    Fixture { doc, body, div_a, span_x, p_note, div_b, span_y }
}

// ========== Tree structure ==========

#[test]
fn test_parent_and_children() {
    let f = make_fixture();
    assert_eq!(f.doc.parent(&f.div_a), Some(f.body));
    assert_eq!(f.doc.parent(&f.doc.root()), None);
    assert_eq!(f.doc.children(&f.div_a), vec![f.span_x, f.p_note]);
}

#[test]
fn test_all_elements_preorder() {
    let f = make_fixture();
    let all = f.doc.all_elements();
    assert_eq!(all.len(), 7);
    assert_eq!(all[0], f.doc.root());
    assert_eq!(all[1], f.body);
    assert_eq!(all[2], f.div_a);
    assert_eq!(all[6], f.span_y);
}

#[test]
fn test_sibling_navigation() {
    let f = make_fixture();
    assert_eq!(f.doc.next_sibling(&f.span_x), Some(f.p_note));
    assert_eq!(f.doc.next_sibling(&f.p_note), None);
    assert_eq!(f.doc.other_siblings(&f.div_a), vec![f.div_b]);
}

#[test]
fn test_remove_detaches_subtree() {
    let f = make_fixture();
    f.doc.remove(f.div_b);
    assert_eq!(f.doc.all_elements().len(), 5);
    assert_eq!(f.doc.parent(&f.div_b), None);
    // The handle still resolves for style access.
    f.doc.set_display(&f.div_b, "none");
    assert_eq!(f.doc.display(&f.div_b), "none");
}

#[test]
fn test_text_content_spans_subtree() {
    let f = make_fixture();
    assert_eq!(f.doc.text_content(&f.span_x), "hello world");
    let div_text = f.doc.text_content(&f.div_a);
    assert!(div_text.contains("hello world"));
    assert!(div_text.contains("fine print"));
}

// ========== Selector engine ==========

#[test]
fn test_query_all_by_tag_and_id() {
    let f = make_fixture();
    assert_eq!(f.doc.query_all("div").unwrap(), vec![f.div_a, f.div_b]);
    assert_eq!(f.doc.query_all("#a").unwrap(), vec![f.div_a]);
    assert_eq!(f.doc.query_all("span.y").unwrap(), vec![f.span_y]);
}

#[test]
fn test_query_all_selector_list() {
    let f = make_fixture();
    assert_eq!(f.doc.query_all(".x, .note").unwrap(), vec![f.span_x, f.p_note]);
}

#[test]
fn test_query_scoped_excludes_scope() {
    let f = make_fixture();
    assert_eq!(f.doc.query_scoped(&f.div_a, "span").unwrap(), vec![f.span_x]);
    assert!(f.doc.query_scoped(&f.span_x, "span").unwrap().is_empty());
}

#[test]
fn test_matches_compound() {
    let f = make_fixture();
    assert!(f.doc.matches(&f.div_a, "div.content.main#a").unwrap());
    assert!(!f.doc.matches(&f.div_a, "div.ad").unwrap());
}

#[test]
fn test_matches_attribute_operators() {
    let f = make_fixture();
    assert!(f.doc.matches(&f.div_b, "[data-ad]").unwrap());
    assert!(f.doc.matches(&f.div_b, "[data-ad=\"true\"]").unwrap());
    assert!(f.doc.matches(&f.div_b, "[data-ad^=tr]").unwrap());
    assert!(f.doc.matches(&f.div_b, "[data-ad$=ue]").unwrap());
    assert!(f.doc.matches(&f.div_b, "[data-ad*=ru]").unwrap());
    assert!(!f.doc.matches(&f.div_b, "[data-ad=false]").unwrap());
}

#[test]
fn test_bare_attribute_matches_presence_only() {
    let f = make_fixture();
    f.doc.set_bare_attribute(f.div_a, "hidden-marker");
    assert!(f.doc.matches(&f.div_a, "[hidden-marker]").unwrap());
    assert_eq!(f.doc.attribute(&f.div_a, "hidden-marker"), None);
}

#[test]
fn test_combinators() {
    let f = make_fixture();
    assert!(f.doc.matches(&f.span_x, "div > span").unwrap());
    assert!(f.doc.matches(&f.span_x, "body span").unwrap());
    assert!(!f.doc.matches(&f.span_x, "body > span").unwrap());
    assert!(f.doc.matches(&f.p_note, "span + p").unwrap());
    assert!(f.doc.matches(&f.div_b, "div ~ div").unwrap());
    assert!(!f.doc.matches(&f.div_a, "div ~ div").unwrap());
}

#[test]
fn test_invalid_selector_is_error() {
    let f = make_fixture();
    assert!(matches!(f.doc.query_all("> div"), Err(VeilError::Selector(_))));
    assert!(matches!(f.doc.query_all("div >"), Err(VeilError::Selector(_))));
    assert!(matches!(f.doc.query_all(""), Err(VeilError::Selector(_))));
    assert!(matches!(f.doc.query_all("div:hover"), Err(VeilError::Selector(_))));
}

// ========== XPath subset ==========

#[test]
fn test_xpath_absolute() {
    let f = make_fixture();
    let result = f.doc.evaluate_xpath(None, "//div").unwrap();
    assert_eq!(result, vec![f.div_a, f.div_b]);
}

#[test]
fn test_xpath_relative() {
    let f = make_fixture();
    let result = f.doc.evaluate_xpath(Some(&f.div_a), ".//span").unwrap();
    assert_eq!(result, vec![f.span_x]);
}

#[test]
fn test_xpath_absolute_ignores_context() {
    let f = make_fixture();
    let result = f.doc.evaluate_xpath(Some(&f.div_a), "//span").unwrap();
    assert_eq!(result, vec![f.span_x, f.span_y]);
}

#[test]
fn test_xpath_predicates() {
    let f = make_fixture();
    assert_eq!(f.doc.evaluate_xpath(None, "//div[@data-ad]").unwrap(), vec![f.div_b]);
    assert_eq!(f.doc.evaluate_xpath(None, "//*[@id='a']").unwrap(), vec![f.div_a]);
    assert!(f.doc.evaluate_xpath(None, "//div[@data-ad='false']").unwrap().is_empty());
}

#[test]
fn test_xpath_unsupported_expression() {
    let f = make_fixture();
    assert!(matches!(f.doc.evaluate_xpath(None, "/html/body"), Err(VeilError::XPath(_))));
    assert!(matches!(f.doc.evaluate_xpath(None, "//div/following::p"), Err(VeilError::XPath(_))));
}

// ========== Styles, media, location ==========

#[test]
fn test_computed_style_per_pseudo_context() {
    let f = make_fixture();
    f.doc.set_style(f.div_a, "position", "fixed");
    f.doc.set_pseudo_style(f.div_a, PseudoStyle::Before, "content", "\"ad\"");
    assert_eq!(f.doc.computed_style(&f.div_a, None, "position").as_deref(), Some("fixed"));
    assert_eq!(
        f.doc.computed_style(&f.div_a, Some(PseudoStyle::Before), "content").as_deref(),
        Some("\"ad\"")
    );
    assert_eq!(f.doc.computed_style(&f.div_a, Some(PseudoStyle::After), "content"), None);
    assert_eq!(f.doc.computed_style(&f.div_a, Some(PseudoStyle::Before), "position"), None);
}

#[test]
fn test_display_roundtrip() {
    let f = make_fixture();
    assert_eq!(f.doc.display(&f.div_a), "");
    f.doc.set_display(&f.div_a, "flex");
    assert_eq!(f.doc.display(&f.div_a), "flex");
}

#[test]
fn test_viewport_media_queries() {
    let f = make_fixture();
    f.doc.set_viewport(640, 480);
    assert!(f.doc.matches_media("(max-width: 640px)"));
    assert!(!f.doc.matches_media("(min-width: 641px)"));
}

#[test]
fn test_location() {
    let f = make_fixture();
    assert_eq!(f.doc.location_path_query(), "/");
    f.doc.set_location("/news?page=2");
    assert_eq!(f.doc.location_path_query(), "/news?page=2");
}

#[test]
fn test_properties_enumeration() {
    let f = make_fixture();
    f.doc.set_property(f.div_b, "adUnit", "banner-300");
    f.doc.set_property(f.div_b, "slot", "top");
    assert_eq!(
        f.doc.properties(&f.div_b),
        vec![("adUnit".to_string(), "banner-300".to_string()), ("slot".to_string(), "top".to_string())]
    );
}

#[test]
fn test_shared_handles_see_mutations() {
    let f = make_fixture();
    let alias = f.doc.clone();
    alias.set_display(&f.div_a, "none");
    assert_eq!(f.doc.display(&f.div_a), "none");
}
