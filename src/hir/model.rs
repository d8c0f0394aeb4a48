//! Evaluated build objects as reported by an evaluation engine.
//!
//! The core consumes these; it never owns the evaluation itself. Names are
//! looked up case-insensitively, the way the build engine treats them.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::base::Position;

/// Properties passed in from outside the project. They win over every
/// declaration in the file.
pub type GlobalProperties = IndexMap<String, String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    Property,
    Item,
    Target,
    Import,
}

impl ObjectKind {
    pub fn display(&self) -> &'static str {
        match self {
            ObjectKind::Property => "property",
            ObjectKind::Item => "item",
            ObjectKind::Target => "target",
            ObjectKind::Import => "import",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

/// Where a declaration lives: a file and the position of its element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Provenance {
    pub file: PathBuf,
    /// Usually 1-based; normalize before use.
    pub position: Position,
}

impl Provenance {
    pub fn new(file: impl Into<PathBuf>, position: Position) -> Self {
        Self {
            file: file.into(),
            position,
        }
    }

    pub fn is_in(&self, file: &Path) -> bool {
        self.file == file
    }
}

/// One evaluated property, item, target or import.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvaluatedObject {
    pub kind: ObjectKind,
    pub name: SmolStr,
    pub value: String,
    /// `None` for global and reserved properties.
    pub provenance: Option<Provenance>,
    pub metadata: IndexMap<SmolStr, String>,
}

impl EvaluatedObject {
    pub fn new(kind: ObjectKind, name: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            value: value.into(),
            provenance: None,
            metadata: IndexMap::new(),
        }
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    pub fn with_metadata(mut self, name: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        self.metadata.insert(name.into(), value.into());
        self
    }

    pub fn metadata(&self, name: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An overridden declaration and the value it produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyDeclaration {
    pub provenance: Provenance,
    /// Value right after this declaration was evaluated.
    pub value: String,
}

/// Final state of a property plus the declarations it overrode, oldest
/// first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvaluatedProperty {
    pub object: Arc<EvaluatedObject>,
    pub predecessors: Vec<PropertyDeclaration>,
}

impl EvaluatedProperty {
    pub fn new(object: EvaluatedObject) -> Self {
        Self {
            object: Arc::new(object),
            predecessors: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.object.name
    }

    pub fn value(&self) -> &str {
        &self.object.value
    }

    /// Replace the winner, remembering the previous declaration.
    pub fn redefine(&mut self, object: EvaluatedObject) {
        if let Some(provenance) = self.object.provenance.clone() {
            self.predecessors.push(PropertyDeclaration {
                provenance,
                value: self.object.value.clone(),
            });
        }
        self.object = Arc::new(object);
    }
}

/// Result of evaluating one project file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvaluatedProject {
    pub path: PathBuf,
    properties: IndexMap<SmolStr, EvaluatedProperty>,
    items: Vec<Arc<EvaluatedObject>>,
    targets: IndexMap<SmolStr, EvaluatedProperty>,
    imports: Vec<Arc<EvaluatedObject>>,
}

fn key(name: &str) -> SmolStr {
    SmolStr::new(name.to_ascii_lowercase())
}

impl EvaluatedProject {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn property(&self, name: &str) -> Option<&EvaluatedProperty> {
        self.properties.get(&key(name))
    }

    pub fn property_value(&self, name: &str) -> Option<&str> {
        self.property(name).map(|p| p.value())
    }

    pub fn properties(&self) -> impl Iterator<Item = &EvaluatedProperty> {
        self.properties.values()
    }

    /// Insert or replace a property, keeping its declaration history.
    pub fn insert_property(&mut self, property: EvaluatedProperty) {
        self.properties.insert(key(property.name()), property);
    }

    pub(crate) fn property_mut(&mut self, name: &str) -> Option<&mut EvaluatedProperty> {
        self.properties.get_mut(&key(name))
    }

    pub fn items(&self) -> &[Arc<EvaluatedObject>] {
        &self.items
    }

    pub fn items_of_type<'a>(&'a self, item_type: &'a str) -> impl Iterator<Item = &'a Arc<EvaluatedObject>> {
        self.items
            .iter()
            .filter(move |item| item.name.eq_ignore_ascii_case(item_type))
    }

    pub fn push_item(&mut self, item: EvaluatedObject) {
        self.items.push(Arc::new(item));
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<Arc<EvaluatedObject>> {
        &mut self.items
    }

    pub fn target(&self, name: &str) -> Option<&EvaluatedProperty> {
        self.targets.get(&key(name))
    }

    pub fn targets(&self) -> impl Iterator<Item = &EvaluatedProperty> {
        self.targets.values()
    }

    /// Define a target; a later definition with the same name wins and the
    /// earlier one becomes a predecessor.
    pub fn define_target(&mut self, target: EvaluatedObject) {
        match self.targets.get_mut(&key(&target.name)) {
            Some(existing) => existing.redefine(target),
            None => {
                self.targets
                    .insert(key(&target.name), EvaluatedProperty::new(target));
            }
        }
    }

    pub fn imports(&self) -> &[Arc<EvaluatedObject>] {
        &self.imports
    }

    pub fn push_import(&mut self, import: EvaluatedObject) {
        self.imports.push(Arc::new(import));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declared(name: &str, value: &str, line: u32) -> EvaluatedObject {
        EvaluatedObject::new(ObjectKind::Property, name, value)
            .with_provenance(Provenance::new("/p.proj", Position::one_based(line, 5)))
    }

    #[test]
    fn test_property_lookup_is_case_insensitive() {
        let mut project = EvaluatedProject::new("/p.proj");
        project.insert_property(EvaluatedProperty::new(declared("OutputPath", "bin", 3)));
        assert_eq!(project.property_value("outputpath"), Some("bin"));
        assert_eq!(project.property_value("OUTPUTPATH"), Some("bin"));
    }

    #[test]
    fn test_redefine_records_predecessor() {
        let mut property = EvaluatedProperty::new(declared("P", "false", 3));
        property.redefine(declared("P", "true", 6));

        assert_eq!(property.value(), "true");
        assert_eq!(property.predecessors.len(), 1);
        assert_eq!(property.predecessors[0].value, "false");
        assert_eq!(
            property.predecessors[0].provenance.position,
            Position::zero_based(2, 4)
        );
    }

    #[test]
    fn test_target_redefinition() {
        let mut project = EvaluatedProject::new("/p.proj");
        project.define_target(
            EvaluatedObject::new(ObjectKind::Target, "Build", "")
                .with_provenance(Provenance::new("/p.proj", Position::one_based(2, 3))),
        );
        project.define_target(
            EvaluatedObject::new(ObjectKind::Target, "build", "Compile")
                .with_provenance(Provenance::new("/p.proj", Position::one_based(4, 3))),
        );
        let build = project.target("BUILD").unwrap();
        assert_eq!(build.value(), "Compile");
        assert_eq!(build.predecessors.len(), 1);
        assert_eq!(project.targets().count(), 1);
    }

    #[test]
    fn test_item_metadata_lookup() {
        let item = EvaluatedObject::new(ObjectKind::Item, "Compile", "a.cs")
            .with_metadata("DependentUpon", "b.cs");
        assert_eq!(item.metadata("dependentupon"), Some("b.cs"));
        assert_eq!(item.metadata("Link"), None);
    }
}
