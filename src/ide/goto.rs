//! Goto definition for property references and target names.

use std::path::PathBuf;

use smol_str::SmolStr;

use super::analysis::DocumentSnapshot;
use crate::base::{Position, Range};
use crate::expr::ExpressionNode;
use crate::hir::{EvaluatedProperty, ObjectKind};
use crate::syntax::XsAttribute;

/// Attributes of `Target` whose values are target names.
const TARGET_LIST_ATTRIBUTES: &[&str] = &["DependsOnTargets", "BeforeTargets", "AfterTargets"];

/// Where a definition lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GotoTarget {
    pub path: PathBuf,
    /// The declaring element when it is in the queried document, otherwise
    /// an empty range at the declaration's provenance.
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GotoResult {
    pub kind: ObjectKind,
    pub name: SmolStr,
    pub targets: Vec<GotoTarget>,
}

/// Resolve the definition of what is at `position`.
///
/// A `$(Name)` reference resolves to the declaration that produced the
/// property's final value. A name in a target's `DependsOnTargets`,
/// `BeforeTargets` or `AfterTargets` resolves to the target.
pub fn goto_definition(snapshot: &DocumentSnapshot, position: Position) -> Option<GotoResult> {
    let location = snapshot.inspect(position).ok()?;

    let property = location.expression().and_then(|e| match e.reference() {
        Some(reference @ ExpressionNode::PropertyReference { is_function: false, .. }) => {
            reference.name().map(SmolStr::new)
        }
        _ => None,
    });
    if let Some(name) = property {
        return resolve(snapshot, ObjectKind::Property, name);
    }

    let attribute = location.attribute()?;
    if !is_target_list(&attribute) {
        return None;
    }
    let item = location.list_item()?;
    let name = SmolStr::new(item.value());
    if name.is_empty() {
        return None;
    }
    resolve(snapshot, ObjectKind::Target, name)
}

fn is_target_list(attribute: &XsAttribute) -> bool {
    let on_target = attribute
        .element()
        .is_some_and(|e| e.name() == "Target");
    on_target
        && TARGET_LIST_ATTRIBUTES
            .iter()
            .any(|a| attribute.name().eq_ignore_ascii_case(a))
}

fn resolve(snapshot: &DocumentSnapshot, kind: ObjectKind, name: SmolStr) -> Option<GotoResult> {
    let project = snapshot.project()?;
    let history = match kind {
        ObjectKind::Target => project.target(&name),
        _ => project.property(&name),
    }?;

    let targets = match snapshot.locator() {
        Ok(locator) => {
            let local: Vec<_> = locator
                .declarations(kind, &name)
                .filter(|d| d.is_winning())
                .map(|d| GotoTarget {
                    path: snapshot.path().to_owned(),
                    range: snapshot.line_index().range(d.range),
                })
                .collect();
            if local.is_empty() { provenance_target(history) } else { local }
        }
        Err(_) => provenance_target(history),
    };
    (!targets.is_empty()).then_some(GotoResult {
        kind,
        name,
        targets,
    })
}

fn provenance_target(history: &EvaluatedProperty) -> Vec<GotoTarget> {
    history
        .object
        .provenance
        .iter()
        .map(|p| GotoTarget {
            path: p.file.clone(),
            range: Range::empty(p.position.to_zero_based()),
        })
        .collect()
}
