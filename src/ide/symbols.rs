//! Document symbols: the outline of evaluated declarations.

use smol_str::SmolStr;

use super::analysis::DocumentSnapshot;
use crate::base::Range;
use crate::hir::ObjectKind;
use crate::syntax::XsElement;

/// One declaration in the outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    pub name: SmolStr,
    pub kind: ObjectKind,
    /// The declaring element.
    pub range: Range,
    /// The element's name, or its whole range when it has none.
    pub selection_range: Range,
    /// Final evaluated value.
    pub detail: Option<String>,
    /// `false` for a declaration later overridden.
    pub is_winning: bool,
}

/// Get document symbols for a snapshot, in document order.
///
/// Empty when the snapshot has no object locator.
pub fn document_symbols(snapshot: &DocumentSnapshot) -> Vec<SymbolInfo> {
    let Ok(locator) = snapshot.locator() else {
        return Vec::new();
    };
    let root = snapshot.tree().syntax();
    let index = snapshot.line_index();

    locator
        .objects()
        .iter()
        .map(|located| {
            let name_range = root
                .covering_element(located.range)
                .ancestors()
                .find_map(XsElement::cast)
                .and_then(|e| e.name_range())
                .unwrap_or(located.range);
            SymbolInfo {
                name: located.name.clone(),
                kind: located.kind,
                range: index.range(located.range),
                selection_range: index.range(name_range),
                detail: located.value().map(str::to_owned),
                is_winning: located.is_winning(),
            }
        })
        .collect()
}
