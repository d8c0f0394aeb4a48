//! Evaluation engines.
//!
//! [`EvaluationEngine`] is the seam to a real build engine. The
//! [`StaticEvaluator`] is a single-file reference implementation: it reads
//! properties, items, targets and imports in document order, evaluates
//! conditions on the expression tree, and never follows imports or runs
//! targets.

use std::path::Path;

use smol_str::SmolStr;
use thiserror::Error;
use tracing::{debug, instrument};

use super::model::{
    EvaluatedObject, EvaluatedProject, EvaluatedProperty, GlobalProperties, ObjectKind,
    PropertyDeclaration, Provenance,
};
use crate::base::{LineIndex, Position, TextRange, TextSize};
use crate::expr::{self, BoolOp, CompareOp, ExpressionNode};
use crate::syntax::{XsElement, XsTree};

/// The engine rejected the document.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("project XML is not valid: {message}")]
    InvalidXml {
        message: String,
        position: Option<Position>,
    },
    #[error("invalid condition `{condition}`: {message}")]
    InvalidCondition {
        condition: String,
        message: String,
        position: Position,
    },
    #[error("evaluation failed: {0}")]
    Engine(String),
}

impl EvaluationError {
    /// Where the problem is, when the engine knows.
    pub fn position(&self) -> Option<Position> {
        match self {
            EvaluationError::InvalidXml { position, .. } => *position,
            EvaluationError::InvalidCondition { position, .. } => Some(*position),
            EvaluationError::Engine(_) => None,
        }
    }
}

/// Loads and evaluates one project file.
pub trait EvaluationEngine: Send + Sync {
    fn evaluate(
        &self,
        path: &Path,
        text: &str,
        globals: &GlobalProperties,
    ) -> Result<EvaluatedProject, EvaluationError>;
}

/// Reference engine evaluating a single file without imports.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticEvaluator;

impl StaticEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl EvaluationEngine for StaticEvaluator {
    #[instrument(skip_all, fields(file = %path.display()))]
    fn evaluate(
        &self,
        path: &Path,
        text: &str,
        globals: &GlobalProperties,
    ) -> Result<EvaluatedProject, EvaluationError> {
        let tree = XsTree::parse(text);
        let index = LineIndex::new(text);

        if let Some(error) = tree.errors().first() {
            return Err(EvaluationError::InvalidXml {
                message: error.message.clone(),
                position: Some(index.position(error.range.start()).to_one_based()),
            });
        }
        let root = tree
            .root_element()
            .ok_or_else(|| EvaluationError::InvalidXml {
                message: "document has no root element".into(),
                position: None,
            })?;
        if root.name() != "Project" {
            return Err(EvaluationError::InvalidXml {
                message: format!("root element is `{}`, expected `Project`", root.name()),
                position: Some(index.position(root.range().start()).to_one_based()),
            });
        }

        let mut evaluation = Evaluation::new(path, &index, globals);
        evaluation.children(&root)?;
        let project = evaluation.project;

        debug!(
            properties = project.properties().count(),
            items = project.items().len(),
            targets = project.targets().count(),
            "evaluated project"
        );
        Ok(project)
    }
}

struct Evaluation<'a> {
    path: &'a Path,
    index: &'a LineIndex,
    project: EvaluatedProject,
}

impl<'a> Evaluation<'a> {
    fn new(path: &'a Path, index: &'a LineIndex, globals: &GlobalProperties) -> Self {
        let mut project = EvaluatedProject::new(path);
        for (name, value) in reserved_properties(path) {
            project.insert_property(EvaluatedProperty::new(EvaluatedObject::new(
                ObjectKind::Property,
                name,
                value,
            )));
        }
        for (name, value) in globals {
            project.insert_property(EvaluatedProperty::new(EvaluatedObject::new(
                ObjectKind::Property,
                name.as_str(),
                value.as_str(),
            )));
        }
        Self {
            path,
            index,
            project,
        }
    }

    fn provenance(&self, element: &XsElement) -> Provenance {
        let position = self.index.position(element.range().start()).to_one_based();
        Provenance::new(self.path, position)
    }

    /// Children of `Project`, `When` and `Otherwise`.
    fn children(&mut self, parent: &XsElement) -> Result<(), EvaluationError> {
        for child in parent.child_elements() {
            match child.name().as_str() {
                "PropertyGroup" => {
                    if self.condition(&child)? {
                        self.property_group(&child)?;
                    }
                }
                "ItemGroup" => {
                    if self.condition(&child)? {
                        self.item_group(&child)?;
                    }
                }
                "Target" => self.target(&child),
                "Import" => {
                    if self.condition(&child)? {
                        self.import(&child);
                    }
                }
                "Choose" => self.choose(&child)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn choose(&mut self, choose: &XsElement) -> Result<(), EvaluationError> {
        for branch in choose.child_elements() {
            match branch.name().as_str() {
                "When" if self.condition(&branch)? => return self.children(&branch),
                "Otherwise" => return self.children(&branch),
                _ => {}
            }
        }
        Ok(())
    }

    fn property_group(&mut self, group: &XsElement) -> Result<(), EvaluationError> {
        for element in group.child_elements() {
            if !self.condition(&element)? {
                continue;
            }
            let name = element.name();
            let provenance = self.provenance(&element);
            let value = self.expand(&unescape(&element.inner_text()));

            match self.project.property_mut(&name) {
                // Global and reserved properties cannot be overridden.
                Some(existing) if existing.object.provenance.is_none() => {
                    let value = existing.value().to_string();
                    existing
                        .predecessors
                        .push(PropertyDeclaration { provenance, value });
                }
                Some(existing) => existing.redefine(
                    EvaluatedObject::new(ObjectKind::Property, name, value)
                        .with_provenance(provenance),
                ),
                None => self.project.insert_property(EvaluatedProperty::new(
                    EvaluatedObject::new(ObjectKind::Property, name, value)
                        .with_provenance(provenance),
                )),
            }
        }
        Ok(())
    }

    fn item_group(&mut self, group: &XsElement) -> Result<(), EvaluationError> {
        for element in group.child_elements() {
            if !self.condition(&element)? {
                continue;
            }
            let item_type = element.name();
            let metadata = self.item_metadata(&element)?;

            if let Some(remove) = self.attribute(&element, "Remove") {
                let removed = split_list(&remove);
                self.project.items_mut().retain(|item| {
                    !(item.name.eq_ignore_ascii_case(&item_type)
                        && removed.iter().any(|r| r.eq_ignore_ascii_case(&item.value)))
                });
                continue;
            }

            if let Some(update) = self.attribute(&element, "Update") {
                let updated = split_list(&update);
                for item in self.project.items_mut().iter_mut() {
                    let matches = item.name.eq_ignore_ascii_case(&item_type)
                        && updated.iter().any(|u| u.eq_ignore_ascii_case(&item.value));
                    if matches {
                        let item = std::sync::Arc::make_mut(item);
                        item.metadata
                            .extend(metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
                    }
                }
                continue;
            }

            let Some(include) = self.attribute(&element, "Include") else {
                continue;
            };
            let excluded = self
                .attribute(&element, "Exclude")
                .map(|e| split_list(&e))
                .unwrap_or_default();
            let provenance = self.provenance(&element);

            for value in split_list(&include) {
                if excluded.iter().any(|e| e.eq_ignore_ascii_case(&value)) {
                    continue;
                }
                let mut item = EvaluatedObject::new(ObjectKind::Item, item_type.clone(), value)
                    .with_provenance(provenance.clone());
                item.metadata = metadata.clone();
                self.project.push_item(item);
            }
        }
        Ok(())
    }

    fn item_metadata(
        &self,
        element: &XsElement,
    ) -> Result<indexmap::IndexMap<SmolStr, String>, EvaluationError> {
        const RESERVED: [&str; 6] = ["Include", "Exclude", "Remove", "Update", "Condition", "KeepMetadata"];

        let mut metadata = indexmap::IndexMap::new();
        for attribute in element.attributes() {
            let name = attribute.name();
            if RESERVED.contains(&name.as_str()) {
                continue;
            }
            let value = attribute.value().unwrap_or_default();
            metadata.insert(name, self.expand(&unescape(&value)));
        }
        for child in element.child_elements() {
            if self.condition(&child)? {
                let value = self.expand(&unescape(&child.inner_text()));
                metadata.insert(child.name(), value);
            }
        }
        Ok(metadata)
    }

    fn target(&mut self, element: &XsElement) {
        let Some(name) = element.attribute("Name").and_then(|a| a.value()) else {
            return;
        };
        let depends_on = element
            .attribute("DependsOnTargets")
            .and_then(|a| a.value())
            .unwrap_or_default();
        let target = EvaluatedObject::new(ObjectKind::Target, name, depends_on.as_str())
            .with_provenance(self.provenance(element));
        self.project.define_target(target);
    }

    fn import(&mut self, element: &XsElement) {
        let Some(project) = self.attribute(element, "Project") else {
            return;
        };
        let import = EvaluatedObject::new(ObjectKind::Import, project.as_str(), project.as_str())
            .with_provenance(self.provenance(element));
        self.project.push_import(import);
    }

    /// Expanded attribute value.
    fn attribute(&self, element: &XsElement, name: &str) -> Option<String> {
        let value = element.attribute(name)?.value()?;
        Some(self.expand(&unescape(&value)))
    }

    // ------------------------------------------------------------------
    // Expansion and conditions
    // ------------------------------------------------------------------

    /// Substitute property and item references. Property functions are
    /// left as written; metadata references expand to nothing.
    fn expand(&self, text: &str) -> String {
        let Ok(tree) = expr::parse_attribute_or_text(text) else {
            return text.to_string();
        };
        let mut references: Vec<&ExpressionNode> =
            tree.descendants().into_iter().filter(|n| n.is_reference()).collect();
        references.sort_by_key(|n| n.range().start());

        let mut out = String::with_capacity(text.len());
        let mut cursor = TextSize::from(0);
        for node in references {
            let range = node.range();
            // Nested inside a reference already substituted.
            if range.start() < cursor {
                continue;
            }
            out.push_str(&text[TextRange::new(cursor, range.start())]);
            out.push_str(&self.reference_value(node, &text[range]));
            cursor = range.end();
        }
        out.push_str(&text[TextRange::new(cursor, TextSize::of(text))]);
        out
    }

    fn reference_value(&self, node: &ExpressionNode, raw: &str) -> String {
        match node {
            ExpressionNode::PropertyReference {
                is_function: true, ..
            } => raw.to_string(),
            ExpressionNode::PropertyReference { .. } => node
                .name()
                .and_then(|name| self.project.property_value(name))
                .unwrap_or_default()
                .to_string(),
            ExpressionNode::ItemGroupReference { separator, .. } => {
                let separator = separator
                    .as_deref()
                    .map(|s| {
                        let range = s.range();
                        let inner = &raw[usize::from(range.start() - node.range().start()) + 1
                            ..usize::from(range.end() - node.range().start()) - 1];
                        inner.to_string()
                    })
                    .unwrap_or_else(|| ";".to_string());
                let values: Vec<&str> = node
                    .name()
                    .map(|name| {
                        self.project
                            .items_of_type(name)
                            .map(|item| item.value.as_str())
                            .collect()
                    })
                    .unwrap_or_default();
                values.join(&separator)
            }
            _ => String::new(),
        }
    }

    fn condition(&self, element: &XsElement) -> Result<bool, EvaluationError> {
        let Some(attribute) = element.attribute("Condition") else {
            return Ok(true);
        };
        let condition = unescape(&attribute.value().unwrap_or_default());
        let position = self
            .index
            .position(attribute.value_range().unwrap_or(attribute.range()).start())
            .to_one_based();
        let invalid = |message: String| EvaluationError::InvalidCondition {
            condition: condition.clone(),
            message,
            position,
        };

        if condition.trim().is_empty() {
            return Ok(true);
        }
        let tree = expr::parse_condition(&condition).map_err(|e| invalid(e.message))?;
        let conditions = Conditions {
            evaluation: self,
            text: &condition,
        };
        conditions.truth(tree.root()).map_err(invalid)
    }
}

struct Conditions<'e, 'a> {
    evaluation: &'e Evaluation<'a>,
    text: &'e str,
}

impl Conditions<'_, '_> {
    fn truth(&self, node: &ExpressionNode) -> Result<bool, String> {
        match node {
            ExpressionNode::BooleanOp { op, operands, .. } => match (op, operands.as_slice()) {
                (BoolOp::Not, [operand]) => Ok(!self.truth(operand)?),
                (BoolOp::And, [left, right]) => Ok(self.truth(left)? && self.truth(right)?),
                (BoolOp::Or, [left, right]) => Ok(self.truth(left)? || self.truth(right)?),
                _ => Err("malformed boolean expression".into()),
            },
            ExpressionNode::Group { inner, .. } => self.truth(inner),
            ExpressionNode::Compare {
                op, left, right, ..
            } => self.compare(*op, &self.string(left), &self.string(right)),
            ExpressionNode::FunctionCall {
                name, arguments, ..
            } => self.function(name.name().unwrap_or_default(), arguments),
            other => {
                let value = self.string(other);
                if value.eq_ignore_ascii_case("true") {
                    Ok(true)
                } else if value.eq_ignore_ascii_case("false") {
                    Ok(false)
                } else {
                    Err(format!("`{value}` is not a boolean"))
                }
            }
        }
    }

    fn string(&self, node: &ExpressionNode) -> String {
        let range = node.range();
        match node {
            ExpressionNode::QuotedString { .. } => {
                let inner = TextRange::new(range.start() + TextSize::from(1), range.end() - TextSize::from(1));
                self.evaluation.expand(&self.text[inner])
            }
            _ => self.evaluation.expand(&self.text[range]),
        }
    }

    fn compare(&self, op: CompareOp, left: &str, right: &str) -> Result<bool, String> {
        let numbers = (parse_number(left), parse_number(right));
        if let (Some(l), Some(r)) = numbers {
            return Ok(match op {
                CompareOp::Eq => l == r,
                CompareOp::NotEq => l != r,
                CompareOp::Lt => l < r,
                CompareOp::LtEq => l <= r,
                CompareOp::Gt => l > r,
                CompareOp::GtEq => l >= r,
            });
        }
        match op {
            CompareOp::Eq => Ok(left.eq_ignore_ascii_case(right)),
            CompareOp::NotEq => Ok(!left.eq_ignore_ascii_case(right)),
            _ => Err(format!(
                "`{}` needs numeric operands, found `{left}` and `{right}`",
                op.as_str()
            )),
        }
    }

    fn function(&self, name: &str, arguments: &[ExpressionNode]) -> Result<bool, String> {
        let [argument] = arguments else {
            return Err(format!("`{name}` takes one argument"));
        };
        let value = self.string(argument);
        if name.eq_ignore_ascii_case("Exists") {
            if value.trim().is_empty() {
                return Ok(false);
            }
            let base = self.evaluation.path.parent().unwrap_or(Path::new(""));
            return Ok(base.join(value.trim()).exists());
        }
        if name.eq_ignore_ascii_case("HasTrailingSlash") {
            return Ok(value.ends_with('/') || value.ends_with('\\'));
        }
        Err(format!("unknown function `{name}`"))
    }
}

fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok().map(|n| n as f64);
    }
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn split_list(text: &str) -> Vec<String> {
    text.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn reserved_properties(path: &Path) -> Vec<(&'static str, String)> {
    let display = |p: Option<&std::ffi::OsStr>| {
        p.map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    let directory = path
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    vec![
        ("MSBuildProjectFullPath", path.display().to_string()),
        ("MSBuildProjectDirectory", directory),
        ("MSBuildProjectFile", display(path.file_name())),
        ("MSBuildProjectName", display(path.file_stem())),
        ("MSBuildProjectExtension", extension),
    ]
}

/// Decode the predefined XML entities and character references.
pub(crate) fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let Some(semi) = rest.find(';') else {
            break;
        };
        let entity = &rest[1..semi];
        let decoded = match entity {
            "lt" => Some('<'),
            "gt" => Some('>'),
            "amp" => Some('&'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn evaluate(text: &str) -> EvaluatedProject {
        StaticEvaluator
            .evaluate(Path::new("/src/app/app.csproj"), text, &GlobalProperties::new())
            .unwrap()
    }

    #[test]
    fn test_properties_in_document_order() {
        let project = evaluate(
            "<Project>\n  <PropertyGroup>\n    <A>1</A>\n    <B>$(A)-2</B>\n  </PropertyGroup>\n</Project>",
        );
        assert_eq!(project.property_value("B"), Some("1-2"));
        let a = project.property("a").unwrap();
        assert_eq!(
            a.object.provenance.as_ref().map(|p| p.position),
            Some(Position::one_based(3, 5))
        );
    }

    #[test]
    fn test_conditional_redefinition() {
        let project = evaluate(
            "<Project>\n<PropertyGroup>\n<P>false</P>\n<P Condition=\"'$(P)' == 'false'\">true</P>\n</PropertyGroup>\n</Project>",
        );
        let p = project.property("P").unwrap();
        assert_eq!(p.value(), "true");
        assert_eq!(p.predecessors.len(), 1);
        assert_eq!(p.predecessors[0].value, "false");
        assert_eq!(p.predecessors[0].provenance.position, Position::one_based(3, 1));
    }

    #[test]
    fn test_prose_with_keywords_is_expanded() {
        let project = evaluate(
            "<Project><PropertyGroup><Product>Kit</Product>\
             <Description>Tools and utilities for $(Product)</Description>\
             <Summary>$(Product) or nothing</Summary></PropertyGroup></Project>",
        );
        assert_eq!(project.property_value("Description"), Some("Tools and utilities for Kit"));
        assert_eq!(project.property_value("Summary"), Some("Kit or nothing"));
    }

    #[test]
    fn test_escaped_comparison_in_condition() {
        let project = evaluate(
            "<Project><PropertyGroup><V>3</V>\
             <Big Condition=\"'$(V)' &gt; '1'\">yes</Big>\
             <Small Condition=\"'$(V)' &lt;= '1'\">yes</Small></PropertyGroup></Project>",
        );
        assert_eq!(project.property_value("Big"), Some("yes"));
        assert_eq!(project.property_value("Small"), None);
    }

    #[test]
    fn test_hyphenated_property_names() {
        let project = evaluate(
            "<Project><PropertyGroup><My-Prop>x</My-Prop><Out>$(My-Prop)!</Out></PropertyGroup></Project>",
        );
        assert_eq!(project.property_value("Out"), Some("x!"));
    }

    #[test]
    fn test_global_properties_win() {
        let mut globals = GlobalProperties::new();
        globals.insert("Configuration".into(), "Release".into());
        let project = StaticEvaluator
            .evaluate(
                Path::new("/a.proj"),
                "<Project><PropertyGroup><Configuration>Debug</Configuration></PropertyGroup></Project>",
                &globals,
            )
            .unwrap();
        let configuration = project.property("Configuration").unwrap();
        assert_eq!(configuration.value(), "Release");
        assert!(configuration.object.provenance.is_none());
        assert_eq!(configuration.predecessors.len(), 1);
    }

    #[test]
    fn test_reserved_properties() {
        let project = evaluate("<Project/>");
        assert_eq!(project.property_value("MSBuildProjectName"), Some("app"));
        assert_eq!(project.property_value("MSBuildProjectExtension"), Some(".csproj"));
        assert_eq!(
            project.property_value("MSBuildProjectDirectory").map(PathBuf::from),
            Some(PathBuf::from("/src/app"))
        );
    }

    #[test]
    fn test_items_include_exclude_remove_update() {
        let project = evaluate(
            r#"<Project>
  <ItemGroup>
    <Compile Include="a.cs; b.cs;c.cs" Exclude="c.cs" Link="x">
      <DependentUpon>d.cs</DependentUpon>
    </Compile>
    <Compile Remove="b.cs" />
    <Compile Update="a.cs" Visible="false" />
    <None Include="@(Compile)" />
  </ItemGroup>
</Project>"#,
        );
        let compile: Vec<_> = project.items_of_type("Compile").collect();
        assert_eq!(compile.len(), 1);
        assert_eq!(compile[0].value, "a.cs");
        assert_eq!(compile[0].metadata("Link"), Some("x"));
        assert_eq!(compile[0].metadata("DependentUpon"), Some("d.cs"));
        assert_eq!(compile[0].metadata("Visible"), Some("false"));
        assert_eq!(project.items_of_type("None").next().map(|i| i.value.as_str()), Some("a.cs"));
    }

    #[test]
    fn test_targets_and_imports() {
        let project = evaluate(
            r#"<Project>
  <Import Project="$(MSBuildProjectName).props" />
  <Target Name="Build" />
  <Target Name="Build" DependsOnTargets="Compile">
    <PropertyGroup><Inner>x</Inner></PropertyGroup>
  </Target>
</Project>"#,
        );
        assert_eq!(project.imports()[0].name, "app.props");
        let build = project.target("Build").unwrap();
        assert_eq!(build.value(), "Compile");
        assert_eq!(build.predecessors.len(), 1);
        assert_eq!(project.property("Inner"), None);
    }

    #[test]
    fn test_choose() {
        let project = evaluate(
            r#"<Project>
  <PropertyGroup><Os>linux</Os></PropertyGroup>
  <Choose>
    <When Condition="'$(Os)' == 'windows'"><PropertyGroup><Sep>\</Sep></PropertyGroup></When>
    <Otherwise><PropertyGroup><Sep>/</Sep></PropertyGroup></Otherwise>
  </Choose>
</Project>"#,
        );
        assert_eq!(project.property_value("Sep"), Some("/"));
    }

    #[test]
    fn test_condition_semantics() {
        let project = evaluate(
            r#"<Project>
  <PropertyGroup>
    <V>10</V>
    <A Condition="$(V) &gt; 9 and '$(V)' != ''">yes</A>
    <B Condition="'$(Missing)' == '' Or false">yes</B>
    <C Condition="!HasTrailingSlash('dir')">yes</C>
    <D Condition="'ABC' == 'abc'">yes</D>
    <E Condition="Exists('does-not-exist.txt')">yes</E>
  </PropertyGroup>
</Project>"#,
        );
        for name in ["A", "B", "C", "D"] {
            assert_eq!(project.property_value(name), Some("yes"), "{name}");
        }
        assert_eq!(project.property_value("E"), None);
    }

    #[test]
    fn test_invalid_condition() {
        let err = StaticEvaluator
            .evaluate(
                Path::new("/a.proj"),
                "<Project><PropertyGroup Condition=\"Frob('x')\"/></Project>",
                &GlobalProperties::new(),
            )
            .unwrap_err();
        assert!(matches!(err, EvaluationError::InvalidCondition { .. }));
        assert_eq!(err.position(), Some(Position::one_based(1, 36)));
    }

    #[test]
    fn test_invalid_xml() {
        let err = StaticEvaluator
            .evaluate(Path::new("/a.proj"), "<Project><A></Project>", &GlobalProperties::new())
            .unwrap_err();
        assert!(matches!(err, EvaluationError::InvalidXml { .. }));
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("a &lt; b &amp;&amp; &#65;&#x42;"), "a < b && AB");
        assert_eq!(unescape("fish & chips"), "fish & chips");
    }
}
