//! Document links: clickable `Import` paths.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use super::analysis::DocumentSnapshot;
use crate::hir::ObjectKind;

/// A document link target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLink {
    /// The span of the link in the source file.
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
    /// The imported file.
    pub target: PathBuf,
    /// Tooltip text for the link.
    pub tooltip: Cow<'static, str>,
}

/// Get document links for a snapshot.
///
/// Each `<Import Project="...">` links its value to the imported file,
/// resolved against the document's directory. The evaluated path is used
/// when the import was evaluated, the value as written otherwise. Wildcard
/// imports and paths with unexpanded references get no link.
pub fn document_links(snapshot: &DocumentSnapshot) -> Vec<DocumentLink> {
    let index = snapshot.line_index();
    let base = snapshot.path().parent().unwrap_or(Path::new(""));
    let locator = snapshot.locator().ok();
    let mut links = Vec::new();

    for element in snapshot.tree().elements().filter(|e| e.name() == "Import") {
        let Some(attribute) = element.attribute("Project") else {
            continue;
        };
        let Some(range) = attribute.value_range() else {
            continue;
        };

        let evaluated = locator
            .and_then(|l| l.find(element.range().start()))
            .filter(|o| o.kind == ObjectKind::Import && o.range == element.range())
            .and_then(|o| o.value().map(str::to_owned));
        let Some(path) = evaluated.or_else(|| attribute.value().map(|v| v.to_string())) else {
            continue;
        };
        let path = path.trim();
        if path.is_empty() || path.contains('*') || path.contains("$(") {
            continue;
        }

        let target = base.join(path.replace('\\', "/"));
        let start = index.line_col(range.start());
        let end = index.line_col(range.end());
        links.push(DocumentLink {
            start_line: start.line,
            start_col: start.col,
            end_line: end.line,
            end_col: end.col,
            tooltip: Cow::Owned(format!("Open {}", target.display())),
            target,
        });
    }

    links
}
