//! Hover: schema help and evaluated values.

use super::analysis::DocumentSnapshot;
use super::location::LocationKind;
use crate::base::{Position, Range};
use crate::expr::ExpressionNode;
use crate::hir::ObjectKind;
use crate::project::SchemaHelp;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverResult {
    /// Markdown.
    pub contents: String,
    pub range: Range,
}

/// Hover for what is at `position`.
///
/// Element and attribute names show schema help; an element that declares
/// a property also shows the property's evaluated value. A `$(Name)`
/// reference shows the referenced property's evaluated value.
pub fn hover(snapshot: &DocumentSnapshot, position: Position, schema: &SchemaHelp) -> Option<HoverResult> {
    let location = snapshot.inspect(position).ok()?;
    let index = snapshot.line_index();

    match location.kind() {
        LocationKind::ElementName { .. } => {
            let element = location.element()?;
            let name = element.name();
            let mut sections = Vec::new();
            if let Some(help) = schema.element(&name) {
                sections.push(help.to_owned());
            }
            let declared = snapshot
                .locator()
                .ok()
                .and_then(|l| l.find(element.range().start()))
                .filter(|o| o.kind == ObjectKind::Property && o.range == element.range());
            if let Some(object) = declared {
                sections.push(value_line(&object.name, object.value().unwrap_or_default()));
                if !object.is_winning() {
                    sections.push(format!(
                        "Overridden; this declaration set `{}`.",
                        object.value_at_declaration
                    ));
                }
            }
            let range = location.token()?.text_range();
            finish(sections, index.range(range))
        }
        LocationKind::AttributeName => {
            let attribute = location.attribute()?;
            let element = attribute.element()?;
            let help = schema.attribute(&element.name(), &attribute.name())?;
            finish(vec![help.to_owned()], index.range(attribute.name_range()))
        }
        LocationKind::AttributeValue | LocationKind::ElementContent => {
            let expression = location.expression()?;
            let reference = expression.reference()?;
            let ExpressionNode::PropertyReference {
                is_function: false, ..
            } = reference
            else {
                return None;
            };
            let name = reference.name()?;
            let value = snapshot
                .project()
                .and_then(|p| p.property_value(name))
                .unwrap_or_default();
            let range = expression.to_absolute(reference.range());
            finish(vec![value_line(name, value)], index.range(range))
        }
        _ => None,
    }
}

fn value_line(name: &str, value: &str) -> String {
    format!("`$({name})` = `{value}`")
}

fn finish(sections: Vec<String>, range: Range) -> Option<HoverResult> {
    (!sections.is_empty()).then(|| HoverResult {
        contents: sections.join("\n\n"),
        range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ide::AnalysisHost;

    const TEXT: &str = r#"<Project>
  <PropertyGroup Label="main">
    <Mode>fast</Mode>
    <Mode>slow</Mode>
    <Out>$(Mode)</Out>
  </PropertyGroup>
</Project>"#;

    fn hover_at(line: u32, col: u32) -> Option<HoverResult> {
        let host = AnalysisHost::default();
        let (file, _) = host.open("/p.proj", TEXT, 1);
        let snapshot = host.snapshot(file).unwrap();
        hover(&snapshot, Position::zero_based(line, col), host.schema())
    }

    #[test]
    fn test_element_help() {
        let result = hover_at(1, 5).unwrap();
        assert!(result.contents.contains("Groups property definitions"));
        assert_eq!(result.range.start, Position::zero_based(1, 3));
        assert_eq!(result.range.end, Position::zero_based(1, 16));
    }

    #[test]
    fn test_attribute_help() {
        let result = hover_at(1, 19).unwrap();
        assert!(result.contents.contains("Free-form label"));
        assert_eq!(result.range.start, Position::zero_based(1, 17));
    }

    #[test]
    fn test_overridden_declaration() {
        let result = hover_at(2, 5).unwrap();
        assert!(result.contents.starts_with("`$(Mode)` = `slow`"));
        assert!(result.contents.contains("this declaration set `fast`"));

        let winning = hover_at(3, 5).unwrap();
        assert_eq!(winning.contents, "`$(Mode)` = `slow`");
    }

    #[test]
    fn test_property_reference_value() {
        let result = hover_at(4, 12).unwrap();
        assert_eq!(result.contents, "`$(Mode)` = `slow`");
        assert_eq!(result.range.start, Position::zero_based(4, 9));
        assert_eq!(result.range.end, Position::zero_based(4, 16));
    }

    #[test]
    fn test_nothing_outside_names_and_references() {
        assert_eq!(hover_at(0, 0), None);
        assert_eq!(hover_at(2, 11), None);
    }
}
