//! Schema help: descriptions of known elements and attributes, used by hover.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::settings::{SettingsError, read};

/// Read-only help table.
///
/// Element names are looked up exactly, then ignoring ASCII case.
/// Attribute help keyed `Element@Attribute` wins over help keyed by the
/// attribute name alone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaHelp {
    pub elements: IndexMap<String, String>,
    pub attributes: IndexMap<String, String>,
}

const BUILTIN_ELEMENTS: &[(&str, &str)] = &[
    ("Project", "Root element of an MSBuild project file."),
    ("PropertyGroup", "Groups property definitions; properties are evaluated in document order."),
    ("ItemGroup", "Groups item definitions."),
    ("ItemDefinitionGroup", "Default metadata for item types."),
    ("Target", "A named sequence of tasks run as one unit."),
    ("Import", "Imports the contents of another project file at this point."),
    ("Choose", "Selects one of its `When` branches, or `Otherwise`."),
    ("When", "A branch of `Choose`, taken when its condition holds."),
    ("Otherwise", "The branch of `Choose` taken when no `When` applies."),
    ("Sdk", "References an MSBuild project SDK."),
];

const BUILTIN_ATTRIBUTES: &[(&str, &str)] = &[
    ("Condition", "The element is ignored unless this condition evaluates to true."),
    ("Include", "Semicolon-separated item specifications to add."),
    ("Exclude", "Semicolon-separated item specifications to leave out of `Include`."),
    ("Remove", "Semicolon-separated item specifications to remove."),
    ("Update", "Semicolon-separated items whose metadata is updated."),
    ("Label", "Free-form label; has no effect on evaluation."),
    ("Sdk", "Name of the project SDK."),
    ("Project@Sdk", "Semicolon-separated SDKs imported around the project body."),
    ("Import@Project", "Path of the project file to import."),
    ("Target@Name", "Name of the target."),
    ("Target@DependsOnTargets", "Targets that run before this one, as a simple list."),
    ("Target@BeforeTargets", "This target runs before each of these targets."),
    ("Target@AfterTargets", "This target runs after each of these targets."),
];

impl SchemaHelp {
    /// The table used when no file is configured.
    pub fn builtin() -> Self {
        let owned = |table: &[(&str, &str)]| -> IndexMap<String, String> {
            table
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect()
        };
        Self {
            elements: owned(BUILTIN_ELEMENTS),
            attributes: owned(BUILTIN_ATTRIBUTES),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        Self::from_json(&read(path)?)
    }

    pub fn element(&self, name: &str) -> Option<&str> {
        lookup(&self.elements, name)
    }

    pub fn attribute(&self, element: &str, name: &str) -> Option<&str> {
        lookup(&self.attributes, &format!("{element}@{name}"))
            .or_else(|| lookup(&self.attributes, name))
    }
}

fn lookup<'a>(table: &'a IndexMap<String, String>, key: &str) -> Option<&'a str> {
    table
        .get(key)
        .or_else(|| {
            table
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let help = SchemaHelp::builtin();
        assert!(help.element("PropertyGroup").is_some());
        assert_eq!(help.element("propertygroup"), help.element("PropertyGroup"));
        assert_eq!(help.element("Frobnicate"), None);
    }

    #[test]
    fn test_qualified_attribute_wins() {
        let help = SchemaHelp::builtin();
        let qualified = help.attribute("Target", "DependsOnTargets").unwrap();
        assert!(qualified.contains("simple list"));
        assert_eq!(
            help.attribute("PropertyGroup", "Condition"),
            help.attribute("Target", "Condition")
        );
        assert_eq!(help.attribute("ItemGroup", "DependsOnTargets"), None);
    }

    #[test]
    fn test_from_json() {
        let help = SchemaHelp::from_json(
            r#"{ "elements": { "Foo": "A foo." }, "attributes": { "Foo@Bar": "A bar." } }"#,
        )
        .unwrap();
        assert_eq!(help.element("Foo"), Some("A foo."));
        assert_eq!(help.attribute("Foo", "Bar"), Some("A bar."));
        assert_eq!(help.attribute("Baz", "Bar"), None);
    }
}
