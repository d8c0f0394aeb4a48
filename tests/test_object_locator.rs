//! Finding evaluated objects by position.

use std::path::Path;
use std::sync::Arc;

use msproj::base::Position;
use msproj::hir::{
    EvaluatedObject, EvaluatedProject, EvaluatedProperty, EvaluationEngine, EvaluationError,
    GlobalProperties, ObjectKind, PropertyDeclaration, Provenance,
};
use msproj::ide::{AnalysisHost, DocumentSnapshot};
use msproj::project::{SchemaHelp, Settings};

const REDEFINED: &str = "<Project>
  <PropertyGroup>
    <P>false</P>
    <P Condition=\"'$(P)' == 'false'\">true</P>
  </PropertyGroup>
</Project>";

/// Reports `P` the way an external engine would: 1-based provenance, the
/// final declaration as the object and the first as a predecessor.
struct FakeEngine;

impl EvaluationEngine for FakeEngine {
    fn evaluate(
        &self,
        path: &Path,
        _text: &str,
        _globals: &GlobalProperties,
    ) -> Result<EvaluatedProject, EvaluationError> {
        let mut property = EvaluatedProperty::new(
            EvaluatedObject::new(ObjectKind::Property, "P", "true")
                .with_provenance(Provenance::new(path, Position::one_based(4, 5))),
        );
        property.predecessors.push(PropertyDeclaration {
            provenance: Provenance::new(path, Position::one_based(3, 5)),
            value: "false".into(),
        });
        let mut project = EvaluatedProject::new(path);
        project.insert_property(property);
        Ok(project)
    }
}

fn open(engine: Arc<dyn EvaluationEngine>, text: &str) -> Arc<DocumentSnapshot> {
    let host = AnalysisHost::new(engine, Settings::default(), SchemaHelp::default());
    let (file, _) = host.open("/src/p.proj", text, 1);
    host.snapshot(file).unwrap()
}

fn assert_redefinition(snapshot: &DocumentSnapshot) {
    let text = snapshot.text();
    for (line, declaration) in [(2, "<P>false</P>"), (3, "<P Condition=\"'$(P)' == 'false'\">true</P>")] {
        for col in [4, 6, 12] {
            let object = snapshot
                .find_object_at(Position::zero_based(line, col))
                .unwrap()
                .unwrap_or_else(|| panic!("no object at {line}:{col}"));
            assert_eq!(object.kind, ObjectKind::Property);
            assert_eq!(object.name, "P");
            assert_eq!(object.value(), Some("true"));
            assert_eq!(&text[object.range], declaration);
        }
    }
}

#[test]
fn test_redefinition_with_static_evaluator() {
    let snapshot = open(Arc::new(msproj::hir::StaticEvaluator::new()), REDEFINED);
    assert_redefinition(&snapshot);

    let first = snapshot.find_object_at(Position::zero_based(2, 6)).unwrap().unwrap();
    assert_eq!(first.value_at_declaration, "false");
    assert!(!first.is_winning());
}

#[test]
fn test_redefinition_with_external_engine() {
    let snapshot = open(Arc::new(FakeEngine), REDEFINED);
    assert_redefinition(&snapshot);
}

#[test]
fn test_nothing_between_declarations() {
    let snapshot = open(Arc::new(FakeEngine), REDEFINED);
    assert_eq!(snapshot.find_object_at(Position::zero_based(0, 3)).unwrap(), None);
    assert_eq!(snapshot.find_object_at(Position::zero_based(1, 4)).unwrap(), None);
    // Past the end of the document.
    assert_eq!(snapshot.find_object_at(Position::zero_based(40, 0)).unwrap(), None);
}

#[test]
fn test_item_element_with_several_items() {
    let text = "<Project>\n  <ItemGroup>\n    <Compile Include=\"a.cs;b.cs\" />\n  </ItemGroup>\n</Project>";
    let snapshot = open(Arc::new(msproj::hir::StaticEvaluator::new()), text);

    let located = snapshot.find_object_at(Position::zero_based(2, 8)).unwrap().unwrap();
    assert_eq!(located.kind, ObjectKind::Item);
    let values: Vec<_> = located.objects.iter().map(|o| o.value.as_str()).collect();
    assert_eq!(values, ["a.cs", "b.cs"]);
}

#[test]
fn test_locator_unavailable_for_malformed_xml() {
    let broken = REDEFINED.replace("</PropertyGroup>", "");
    let snapshot = open(Arc::new(FakeEngine), &broken);

    let err = snapshot.find_object_at(Position::zero_based(2, 6)).unwrap_err();
    assert!(err.reason.contains("well-formed"));
}

#[test]
fn test_locator_unavailable_when_evaluation_fails() {
    let text = "<Project><PropertyGroup Condition=\"Frob('x')\"><A>1</A></PropertyGroup></Project>";
    let snapshot = open(Arc::new(msproj::hir::StaticEvaluator::new()), text);

    assert!(snapshot.find_object_at(Position::zero_based(0, 50)).is_err());
    let diagnostic = &snapshot.diagnostics()[0];
    assert_eq!(diagnostic.code.as_deref(), Some("MSB0002"));
}
