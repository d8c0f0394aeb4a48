//! Property-based tests for position conversion and tree shape.
//!
//! - Offsets survive a round trip through line/column positions.
//! - `\r\n` and `\n` documents agree on lines and columns.
//! - Every XS node lies inside its parent and siblings never overlap, for
//!   any input, well-formed or not.

use msproj::base::{LineIndex, Position, TextSize};
use msproj::syntax::{SyntaxNode, XsNode, XsTree};
use proptest::prelude::*;

// ============================================================================
// PROPTEST STRATEGIES
// ============================================================================

/// Text with every kind of line terminator and some multi-byte characters.
fn arb_text() -> impl Strategy<Value = String> {
    "[a-z é\u{1F600}\t\r\n]{0,80}"
}

/// Lines without terminators.
fn arb_lines() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-zA-Z0-9 <>=\"é]{0,20}", 1..12)
}

/// Markup-heavy input, mostly malformed.
fn arb_markup() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("<".to_string()),
            Just("</".to_string()),
            Just(">".to_string()),
            Just("/>".to_string()),
            Just("=".to_string()),
            Just("\"".to_string()),
            Just("'".to_string()),
            Just(" ".to_string()),
            Just("\n".to_string()),
            Just("<!--".to_string()),
            Just("-->".to_string()),
            Just("<![CDATA[".to_string()),
            "[A-Za-z]{1,6}",
            "[a-z$();@%.]{1,6}",
        ],
        0..40,
    )
    .prop_map(|parts| parts.concat())
}

fn assert_nested(node: &SyntaxNode) {
    let range = node.text_range();
    let children: Vec<XsNode> = node.children().filter_map(XsNode::cast).collect();
    for pair in children.windows(2) {
        assert!(
            pair[0].range().end() <= pair[1].range().start(),
            "siblings overlap: {:?} {:?}",
            pair[0].range(),
            pair[1].range()
        );
    }
    for child in node.children() {
        assert!(range.contains_range(child.text_range()));
        assert_nested(&child);
    }
}

proptest! {
    #[test]
    fn prop_offset_round_trip(text in arb_text()) {
        let index = LineIndex::new(&text);
        for (offset, _) in text.char_indices().chain(std::iter::once((text.len(), ' '))) {
            let offset = TextSize::from(offset as u32);
            let position = index.position(offset);
            prop_assert_eq!(index.offset(position), Ok(offset));
        }
    }

    #[test]
    fn prop_line_terminators_agree(lines in arb_lines()) {
        let lf = lines.join("\n");
        let crlf = lines.join("\r\n");
        let lf_index = LineIndex::new(&lf);
        let crlf_index = LineIndex::new(&crlf);
        prop_assert_eq!(lf_index.line_count(), crlf_index.line_count());
        prop_assert_eq!(lf_index.line_count(), lines.len());

        let (mut lf_start, mut crlf_start) = (0usize, 0usize);
        for (line, content) in lines.iter().enumerate() {
            for (col, _) in content.char_indices() {
                let expected = Position::zero_based(line as u32, col as u32);
                prop_assert_eq!(lf_index.position(TextSize::from((lf_start + col) as u32)), expected);
                prop_assert_eq!(crlf_index.position(TextSize::from((crlf_start + col) as u32)), expected);
            }
            lf_start += content.len() + 1;
            crlf_start += content.len() + 2;
        }
    }

    #[test]
    fn prop_tree_is_lossless_and_nested(text in arb_markup()) {
        let tree = XsTree::parse(&text);
        prop_assert_eq!(tree.text(), text.clone());
        assert_nested(&tree.syntax());
    }

    #[test]
    fn prop_inspect_never_panics(text in arb_markup(), offset in 0u32..200) {
        let tree = XsTree::parse(&text);
        let location = msproj::ide::inspect(&tree, TextSize::from(offset));
        prop_assert!(location.offset() <= tree.len());
        let _ = location.can_complete_element(None);
        let _ = location.can_complete_attribute(None);
        let _ = location.expression();
        let _ = location.list_item();
    }
}
