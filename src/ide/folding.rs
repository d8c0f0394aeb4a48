//! Folding ranges: collapsible regions.
//!
//! Every element and comment spanning more than one line folds.

use super::analysis::DocumentSnapshot;
use crate::syntax::XsNode;

/// A folding range with position information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldingRange {
    /// Start line (0-indexed)
    pub start_line: u32,
    /// Start column (0-indexed)
    pub start_col: u32,
    /// End line (0-indexed)
    pub end_line: u32,
    /// End column (0-indexed)
    pub end_col: u32,
    /// Whether this is a comment region
    pub is_comment: bool,
}

/// Get folding ranges for a snapshot, sorted by start line.
pub fn folding_ranges(snapshot: &DocumentSnapshot) -> Vec<FoldingRange> {
    let index = snapshot.line_index();
    let mut ranges: Vec<FoldingRange> = snapshot
        .tree()
        .nodes()
        .filter(|node| matches!(node, XsNode::XsElement(_) | XsNode::XsComment(_)))
        .map(|node| {
            let range = node.range();
            let start = index.line_col(range.start());
            let end = index.line_col(range.end());
            FoldingRange {
                start_line: start.line,
                start_col: start.col,
                end_line: end.line,
                end_col: end.col,
                is_comment: matches!(node, XsNode::XsComment(_)),
            }
        })
        .filter(|r| r.end_line > r.start_line) // Only multiline regions
        .collect();

    ranges.sort_by_key(|r| r.start_line);
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ide::AnalysisHost;

    #[test]
    fn test_multiline_elements_and_comments() {
        let text = "<Project>\n  <!-- one\n  two -->\n  <PropertyGroup>\n    <A>1</A>\n  </PropertyGroup>\n  <!-- single -->\n</Project>";
        let host = AnalysisHost::default();
        let (file, _) = host.open("/p.proj", text, 1);
        let ranges = folding_ranges(&host.snapshot(file).unwrap());

        let spans: Vec<_> = ranges
            .iter()
            .map(|r| (r.start_line, r.end_line, r.is_comment))
            .collect();
        assert_eq!(spans, [(0, 7, false), (1, 2, true), (3, 5, false)]);
        assert_eq!(ranges[2].start_col, 2);
        assert_eq!(ranges[2].end_col, 18);
    }

    #[test]
    fn test_unclosed_element_folds_to_end() {
        let host = AnalysisHost::default();
        let (file, _) = host.open("/p.proj", "<Project>\n  <A>\n", 1);
        let ranges = folding_ranges(&host.snapshot(file).unwrap());
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].end_line, 2);
    }
}
