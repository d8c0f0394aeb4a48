//! Expressions in documents: simple-list targeting and references.

use msproj::base::{Position, TextSize};
use msproj::expr::{ExpressionNode, parse_attribute_or_text, parse_simple_list};
use msproj::ide::AnalysisHost;
use rstest::rstest;

fn position_of(text: &str, needle: &str, delta: usize) -> Position {
    let offset = text.find(needle).expect("needle") + delta;
    assert!(!text[..offset].contains('\n'));
    Position::zero_based(0, offset as u32)
}

#[rstest]
#[case("A;B;C")]
#[case("A ; B ; C")]
#[case("  A;   B   ;C  ")]
#[case("A;\tB\t;C")]
fn test_list_item_targeting(#[case] value: &str) {
    let text = format!("<Target Name=\"T\" DependsOnTargets=\"{value}\" />");
    let host = AnalysisHost::default();
    let (file, _) = host.open("/p.proj", &text, 1);
    let snapshot = host.snapshot(file).unwrap();

    let item = snapshot
        .find_list_item_at(position_of(&text, "B", 0))
        .unwrap()
        .expect("item at B");
    let range = item.range();
    assert_eq!(&text[range], "B");
    assert_eq!(usize::from(range.start()), text.find('B').unwrap());
    assert_eq!(item.value(), "B");

    // The end of `B` still targets `B`.
    let at_end = snapshot.find_list_item_at(position_of(&text, "B", 1)).unwrap().unwrap();
    assert_eq!(at_end.value(), "B");
}

#[test]
fn test_empty_list_item_between_separators() {
    let text = "<Target DependsOnTargets=\"A;;B\" />";
    let host = AnalysisHost::default();
    let (file, _) = host.open("/p.proj", text, 1);
    let snapshot = host.snapshot(file).unwrap();

    let position = position_of(text, ";;", 1);
    let item = snapshot.find_list_item_at(position).unwrap().unwrap();
    assert!(matches!(item.item(), ExpressionNode::EmptyListItem { .. }));
    let offset = TextSize::from((text.find(";;").unwrap() + 1) as u32);
    assert_eq!(item.range().start(), offset);
    assert!(item.range().is_empty());
    assert_eq!(item.value(), "");
}

#[test]
fn test_is_expression_reports_absolute_range() {
    let text = "<P Include=\"@(Compile->'%(Filename).obj')\" />";
    let host = AnalysisHost::default();
    let (file, _) = host.open("/p.proj", text, 1);
    let snapshot = host.snapshot(file).unwrap();

    let (node, range) = snapshot
        .is_expression(position_of(text, "Filename", 2))
        .unwrap()
        .unwrap();
    assert_eq!(node.name(), Some("Filename"));
    let start = text.find("Filename").unwrap() as u32;
    assert_eq!(range.start, Position::zero_based(0, start));
    assert_eq!(range.end, Position::zero_based(0, start + 8));
}

#[test]
fn test_references_collected() {
    let tree = parse_attribute_or_text("$(A)/@(B)/%(C.D)/$(E.Trim())").unwrap();
    let properties: Vec<_> = tree.property_references().filter_map(|n| n.name()).collect();
    assert_eq!(properties, ["A", "E"]);
    assert_eq!(tree.item_references().count(), 1);
    assert_eq!(tree.metadata_references().filter_map(|n| n.name()).collect::<Vec<_>>(), ["D"]);
}

#[test]
fn test_condition_shape() {
    let tree = parse_attribute_or_text("'$(Configuration)|$(Platform)' == 'Debug|AnyCPU' and !Exists('x')").unwrap();
    let ExpressionNode::BooleanOp { operands, .. } = tree.root() else {
        panic!("expected a boolean operator, got {:?}", tree.root());
    };
    assert!(matches!(operands[0], ExpressionNode::Compare { .. }));
    assert!(matches!(operands[1], ExpressionNode::BooleanOp { .. }));
}

#[test]
fn test_malformed_expression_is_an_error() {
    let err = parse_attribute_or_text("'$(A)' == ").unwrap_err();
    assert_eq!(err.message, "missing operand");
    assert!(parse_attribute_or_text("$(Broken").is_err());
}

#[test]
fn test_simple_list_never_fails() {
    let list = parse_simple_list("A;$(Broken;C");
    assert!(!list.items().is_empty());
    assert_eq!(list.values().next(), Some("A"));
}

#[test]
fn test_escaped_comparison_condition() {
    let text = "<PropertyGroup Condition=\"'$(V)' &gt; '1'\" />";
    let host = AnalysisHost::default();
    let (file, _) = host.open("/p.proj", text, 1);
    let snapshot = host.snapshot(file).unwrap();

    let (node, range) = snapshot
        .is_expression(position_of(text, "V)", 0))
        .unwrap()
        .expect("expression at V");
    assert_eq!(node.name(), Some("V"));
    let start = text.find("V)").unwrap() as u32;
    assert_eq!(range.start, Position::zero_based(0, start));

    // The `;` of `&gt;` does not split the value into list items.
    let item = snapshot.find_list_item_at(position_of(text, "'1'", 1)).unwrap().unwrap();
    assert_eq!(item.list().items().len(), 1);
}

#[test]
fn test_entity_inside_list_item() {
    let text = "<Target DependsOnTargets=\"A&amp;B;C\" />";
    let host = AnalysisHost::default();
    let (file, _) = host.open("/p.proj", text, 1);
    let snapshot = host.snapshot(file).unwrap();

    let item = snapshot.find_list_item_at(position_of(text, "B;", 0)).unwrap().unwrap();
    assert_eq!(item.value(), "A&amp;B");
    assert_eq!(item.list().items().len(), 2);
    let c = snapshot.find_list_item_at(position_of(text, "C", 0)).unwrap().unwrap();
    assert_eq!(c.value(), "C");
}

#[rstest]
#[case::prose_with_and("<Description>Tools and utilities for $(Product)</Description>", "Product")]
#[case::prose_with_or("<Summary>This or that from $(Product)</Summary>", "Product")]
#[case::hyphenated_name("<Out>bin/$(My-Prop)/</Out>", "My-Prop")]
#[case::hyphenated_item("<Out>@(My-Items->'%(Filename)')</Out>", "My-Items")]
fn test_references_in_text(#[case] text: &str, #[case] name: &str) {
    let host = AnalysisHost::default();
    let (file, _) = host.open("/p.proj", text, 1);
    let snapshot = host.snapshot(file).unwrap();

    let (node, range) = snapshot
        .is_expression(position_of(text, name, 1))
        .unwrap()
        .unwrap_or_else(|| panic!("no expression in {text}"));
    assert_eq!(node.name(), Some(name));
    let start = text.find(name).unwrap() as u32;
    assert_eq!(range.start, Position::zero_based(0, start));
    assert_eq!(range.end, Position::zero_based(0, start + name.len() as u32));
}
