//! Location inspection: classification, the boundary tie-break rule and
//! completion decisions.
//!
//! Inputs mark the cursor with `|`.

use msproj::ide::{GapKind, LocationKind, Padding, XmlLocation, inspect};
use msproj::{TextRange, TextSize, XsPath, XsTree};
use rstest::rstest;

fn at(marked: &str) -> (String, XsTree, XmlLocation) {
    let offset = marked.find('|').expect("input has no cursor");
    let text = marked.replacen('|', "", 1);
    let tree = XsTree::parse(&text);
    let location = inspect(&tree, TextSize::from(offset as u32));
    (text, tree, location)
}

fn element_name(location: &XmlLocation) -> Option<String> {
    location.element().map(|e| e.name().to_string())
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn test_text_content_classified_with_parent() {
    for marked in [
        "<Project><PropertyGroup><Foo>|1</Foo></PropertyGroup></Project>",
        "<Project><PropertyGroup><Foo>1|</Foo></PropertyGroup></Project>",
    ] {
        let (_, _, location) = at(marked);
        assert_eq!(location.kind(), LocationKind::ElementContent, "{marked}");
        assert_eq!(location.parent().map(|p| p.name().to_string()).as_deref(), Some("Foo"));
    }
}

#[test]
fn test_unclosed_element_can_be_replaced() {
    let (text, _, location) = at("<Project><PropertyGroup><F|oo></PropertyGroup></Project>");
    assert_eq!(location.kind(), LocationKind::ElementName { closing: false });

    let completion = location
        .can_complete_element(Some(&XsPath::parse("/Project/PropertyGroup")))
        .expect("completion in PropertyGroup");
    let replace = completion.replace.expect("element to replace");
    assert_eq!(&text[replace.range()], "<Foo>");
    assert!(!replace.is_valid());
    assert_eq!(completion.parent.map(|p| p.name().to_string()).as_deref(), Some("PropertyGroup"));

    assert!(location.can_complete_element(Some(&XsPath::parse("PropertyGroup"))).is_some());
    assert!(location.can_complete_element(Some(&XsPath::parse("/Project"))).is_none());
}

// ============================================================================
// BOUNDARY MATRIX
// ============================================================================

#[rstest]
#[case::typing_element_name("<Proj|>", LocationKind::ElementName { closing: false }, Some("Proj"))]
#[case::after_open_angle("<|Project/>", LocationKind::ElementName { closing: false }, Some("Project"))]
#[case::empty_element_content("<Project>|</Project>", LocationKind::InsertableGap(GapKind::Content), Some("Project"))]
#[case::closing_name("<Project></Pro|ject>", LocationKind::ElementName { closing: true }, Some("Project"))]
#[case::after_close_angle("<Project></|Project>", LocationKind::ElementName { closing: true }, Some("Project"))]
#[case::typing_attribute_name("<P a|=\"1\"/>", LocationKind::AttributeName, Some("P"))]
#[case::before_opening_quote("<P a=|\"1\"/>", LocationKind::None, Some("P"))]
#[case::empty_value("<P a=\"|\"/>", LocationKind::AttributeValue, Some("P"))]
#[case::typing_value("<P a=\"1|\"/>", LocationKind::AttributeValue, Some("P"))]
#[case::after_closing_quote("<P a=\"1\"|/>", LocationKind::InsertableGap(GapKind::Attributes), Some("P"))]
#[case::start_tag_whitespace("<P a=\"1\" |/>", LocationKind::InsertableGap(GapKind::Attributes), Some("P"))]
#[case::typing_text("<P>text|</P>", LocationKind::ElementContent, Some("P"))]
#[case::before_text("<P>|text</P>", LocationKind::ElementContent, Some("P"))]
#[case::content_whitespace("<P> |<Q/></P>", LocationKind::ElementContent, Some("P"))]
#[case::before_child("<P>|<Q/></P>", LocationKind::InsertableGap(GapKind::Content), Some("P"))]
#[case::after_self_closing_at_eof("<P/>|", LocationKind::InsertableGap(GapKind::Content), None)]
#[case::after_end_tag_at_eof("<P>x</P>|", LocationKind::InsertableGap(GapKind::Content), None)]
#[case::empty_document("|", LocationKind::InsertableGap(GapKind::Content), None)]
#[case::in_comment("<P><!-- c|omment --></P>", LocationKind::ElementContent, Some("P"))]
#[case::in_cdata("<P><![CDATA[ x| ]]></P>", LocationKind::ElementContent, Some("P"))]
fn test_boundary_matrix(
    #[case] marked: &str,
    #[case] kind: LocationKind,
    #[case] element: Option<&str>,
) {
    let (_, _, location) = at(marked);
    assert_eq!(location.kind(), kind, "{marked}");
    assert_eq!(element_name(&location).as_deref(), element, "{marked}");
}

/// Typing a character and inspecting right after it lands on what was typed.
#[rstest]
#[case("<Project><Prop", "Prop")]
#[case("<Project><PropertyGroup Cond", "Cond")]
#[case("<Project><P A=\"$(Conf", "$(Conf")]
#[case("<Project>abc", "abc")]
fn test_just_typed_token_wins(#[case] typed: &str, #[case] token: &str) {
    let tree = XsTree::parse(typed);
    let location = inspect(&tree, TextSize::of(typed));
    let found = location.token().map(|t| t.text().to_string());
    assert_eq!(found.as_deref(), Some(token));
}

#[test]
fn test_offset_past_end_is_clamped() {
    let tree = XsTree::parse("<P/>");
    let location = inspect(&tree, TextSize::from(100));
    assert_eq!(location.offset(), TextSize::from(4));
    assert_eq!(location.kind(), LocationKind::InsertableGap(GapKind::Content));
}

// ============================================================================
// COMPLETION
// ============================================================================

#[rstest]
#[case::needs_leading_space("<P a=\"1\"|/>", Padding::Leading)]
#[case::needs_trailing_space("<P a=\"1\" |b=\"2\"/>", Padding::Trailing)]
#[case::already_spaced("<P |/>", Padding::None)]
#[case::inside_whitespace("<P  |  a=\"1\">", Padding::None)]
fn test_attribute_padding(#[case] marked: &str, #[case] padding: Padding) {
    let (_, _, location) = at(marked);
    let completion = location.can_complete_attribute(None).expect(marked);
    assert_eq!(completion.padding, padding, "{marked}");
    assert!(completion.replace.is_none());
    assert_eq!(completion.element.name(), "P");
}

#[test]
fn test_attribute_name_is_replaced() {
    let (_, _, location) = at("<P a|b=\"1\"/>");
    let completion = location.can_complete_attribute(Some(&XsPath::parse("P"))).unwrap();
    assert_eq!(completion.replace.map(|a| a.name().to_string()).as_deref(), Some("ab"));
    assert_eq!(completion.padding, Padding::None);

    assert!(location.can_complete_attribute(Some(&XsPath::parse("Q"))).is_none());
}

#[test]
fn test_no_completion_in_values_or_text() {
    for marked in ["<P a=\"x|\"/>", "<P>te|xt</P>", "<P></P|>"] {
        let (_, _, location) = at(marked);
        assert!(location.can_complete_element(None).is_none(), "{marked}");
        assert!(location.can_complete_attribute(None).is_none(), "{marked}");
    }
}

#[test]
fn test_element_completion_in_whitespace() {
    let (_, _, location) = at("<Project>\n  |\n</Project>");
    let completion = location.can_complete_element(Some(&XsPath::parse("/Project"))).unwrap();
    assert!(completion.replace.is_none());
    assert_eq!(completion.parent.map(|p| p.name().to_string()).as_deref(), Some("Project"));
}

#[test]
fn test_document_level_completion() {
    let (_, _, location) = at("|");
    let completion = location.can_complete_element(Some(&XsPath::root())).unwrap();
    assert!(completion.parent.is_none());
}

// ============================================================================
// NAVIGATION
// ============================================================================

#[test]
fn test_gap_siblings() {
    let (_, _, location) = at("<P><A/><B/>|<C/></P>");
    let previous = location.previous_sibling().and_then(|n| n.as_element().map(|e| e.name()));
    let next = location.next_sibling().and_then(|n| n.as_element().map(|e| e.name()));
    assert_eq!(previous.as_deref(), Some("B"));
    assert_eq!(next.as_deref(), Some("C"));
}

#[test]
fn test_attribute_siblings() {
    let (_, _, location) = at("<P a=\"1\" b|=\"2\" c=\"3\"/>");
    let attribute = location.attribute().unwrap();
    assert_eq!(attribute.name(), "b");
    let previous = location.previous_sibling().and_then(|n| n.as_attribute().map(|a| a.name()));
    let next = location.next_sibling().and_then(|n| n.as_attribute().map(|a| a.name()));
    assert_eq!(previous.as_deref(), Some("a"));
    assert_eq!(next.as_deref(), Some("c"));
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

#[test]
fn test_expression_in_condition() {
    let (text, _, location) = at("<P Condition=\"'$(Con|fig)' == 'Debug'\"/>");
    let expression = location.expression().unwrap();
    let symbol = expression.range();
    assert_eq!(&text[symbol], "Config");
    assert_eq!(expression.node().name(), Some("Config"));

    let reference = expression.reference().unwrap();
    assert_eq!(&text[expression.to_absolute(reference.range())], "$(Config)");
}

#[test]
fn test_expression_in_text() {
    let (text, _, location) = at("<P>@(Compile|)</P>");
    let expression = location.expression().unwrap();
    let start = text.find("Compile").unwrap() as u32;
    assert_eq!(
        expression.range(),
        TextRange::at(TextSize::from(start), TextSize::from(7))
    );
}

#[test]
fn test_no_expression_outside_values() {
    let (_, _, location) = at("<P a|=\"$(X)\"/>");
    assert!(location.expression().is_none());
}
