//! Correlates evaluated objects with the elements that declared them.

use std::sync::Arc;

use smol_str::SmolStr;
use tracing::{debug, warn};

use super::model::{EvaluatedObject, EvaluatedProject, ObjectKind, Provenance};
use crate::base::{LineIndex, TextRange, TextSize};
use crate::syntax::{XsElement, XsTree};

/// One declaring element and what it declares.
///
/// For a redefined property every declaring element gets its own entry.
/// All of them carry the *final* evaluated object, but `range` and
/// `declaration` are the entry's own, and `value_at_declaration` is the
/// value right after that element was evaluated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocatedObject {
    pub kind: ObjectKind,
    pub name: SmolStr,
    /// Range of the declaring element.
    pub range: TextRange,
    pub declaration: Provenance,
    pub value_at_declaration: String,
    /// Final evaluated objects; several for an item element whose
    /// `Include` produced more than one item.
    pub objects: Vec<Arc<EvaluatedObject>>,
}

impl LocatedObject {
    pub fn object(&self) -> Option<&Arc<EvaluatedObject>> {
        self.objects.first()
    }

    /// Final evaluated value.
    pub fn value(&self) -> Option<&str> {
        self.object().map(|o| o.value.as_str())
    }

    /// Whether this element is the declaration that produced the final value.
    pub fn is_winning(&self) -> bool {
        self.objects
            .iter()
            .any(|o| o.provenance.as_ref() == Some(&self.declaration))
    }
}

/// Position index over located objects, sorted by range start.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectLocator {
    entries: Vec<LocatedObject>,
}

struct Declaration {
    kind: ObjectKind,
    object: Arc<EvaluatedObject>,
    provenance: Provenance,
    value: String,
}

impl ObjectLocator {
    /// Build from an evaluation of the document `tree` was parsed from.
    ///
    /// Only declarations in the project's own file are located.
    pub fn build(project: &EvaluatedProject, tree: &XsTree, index: &LineIndex) -> Self {
        let declarations = collect_declarations(project);
        let root = tree.syntax();
        let len = tree.len();

        let mut entries: Vec<LocatedObject> = Vec::with_capacity(declarations.len());
        for decl in declarations {
            let offset = match index.offset(decl.provenance.position) {
                Ok(offset) => offset,
                Err(error) => {
                    warn!(name = %decl.object.name, %error, "provenance outside the document");
                    continue;
                }
            };
            let Some(element) = element_at(&root, offset.min(len)) else {
                warn!(name = %decl.object.name, "no element at provenance");
                continue;
            };
            let range = element.range();

            let existing = entries.iter_mut().find(|e| {
                e.range == range && e.kind == decl.kind && e.name.eq_ignore_ascii_case(&decl.object.name)
            });
            match existing {
                Some(entry) => {
                    if !entry.objects.iter().any(|o| Arc::ptr_eq(o, &decl.object)) {
                        entry.objects.push(decl.object);
                    }
                }
                None => entries.push(LocatedObject {
                    kind: decl.kind,
                    name: decl.object.name.clone(),
                    range,
                    declaration: decl.provenance,
                    value_at_declaration: decl.value,
                    objects: vec![decl.object],
                }),
            }
        }

        entries.sort_by_key(|e| (e.range.start(), std::cmp::Reverse(e.range.end())));
        debug!(objects = entries.len(), "built object locator");
        Self { entries }
    }

    /// The innermost declaring range containing `offset` (end exclusive).
    pub fn find(&self, offset: TextSize) -> Option<&LocatedObject> {
        let upper = self.entries.partition_point(|e| e.range.start() <= offset);
        self.entries[..upper]
            .iter()
            .rev()
            .find(|e| e.range.contains(offset))
    }

    /// All entries in document order.
    pub fn objects(&self) -> &[LocatedObject] {
        &self.entries
    }

    /// Every declaration of `name` of the given kind, in document order.
    pub fn declarations<'a>(
        &'a self,
        kind: ObjectKind,
        name: &'a str,
    ) -> impl Iterator<Item = &'a LocatedObject> {
        self.entries
            .iter()
            .filter(move |e| e.kind == kind && e.name.eq_ignore_ascii_case(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn collect_declarations(project: &EvaluatedProject) -> Vec<Declaration> {
    let own = |p: &Provenance| p.is_in(&project.path);
    let mut out = Vec::new();

    let histories = project
        .properties()
        .map(|p| (ObjectKind::Property, p))
        .chain(project.targets().map(|t| (ObjectKind::Target, t)));
    for (kind, history) in histories {
        for predecessor in history.predecessors.iter().filter(|d| own(&d.provenance)) {
            out.push(Declaration {
                kind,
                object: history.object.clone(),
                provenance: predecessor.provenance.clone(),
                value: predecessor.value.clone(),
            });
        }
        if let Some(provenance) = history.object.provenance.as_ref().filter(|p| own(p)) {
            out.push(Declaration {
                kind,
                object: history.object.clone(),
                provenance: provenance.clone(),
                value: history.object.value.clone(),
            });
        }
    }

    for (kind, object) in project
        .items()
        .iter()
        .map(|o| (ObjectKind::Item, o))
        .chain(project.imports().iter().map(|o| (ObjectKind::Import, o)))
    {
        if let Some(provenance) = object.provenance.as_ref().filter(|p| own(p)) {
            out.push(Declaration {
                kind,
                object: object.clone(),
                provenance: provenance.clone(),
                value: object.value.clone(),
            });
        }
    }
    out
}

/// Element whose text the offset falls on, preferring the token to the
/// right so that an element-start provenance lands on that element.
fn element_at(root: &crate::syntax::SyntaxNode, offset: TextSize) -> Option<XsElement> {
    let token = root.token_at_offset(offset).right_biased()?;
    token.parent()?.ancestors().find_map(XsElement::cast)
}
