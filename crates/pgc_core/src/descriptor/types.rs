//! Serde types for pandoc defaults files.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

use crate::models::ArgumentModel;

/// A pandoc defaults file as far as this application understands it.
///
/// Field order is the order keys are written on save. Absent fields are
/// skipped, unknown keys are ignored on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectDescriptor {
    #[serde(
        default,
        deserialize_with = "string_or_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub input_files: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toc: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_sections: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citeproc: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standalone: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_engine: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    /// One path or a list on disk; always written as a list.
    #[serde(
        default,
        deserialize_with = "string_or_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub bibliography: Vec<String>,

    #[serde(
        default,
        deserialize_with = "variable_map",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub variables: IndexMap<String, VariableValue>,

    #[serde(
        default,
        deserialize_with = "string_or_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub filters: Vec<String>,

    /// Scalar metadata only; nested values are dropped on load.
    #[serde(
        default,
        deserialize_with = "scalar_map",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub metadata: IndexMap<String, String>,
}

impl ProjectDescriptor {
    /// Starter content offered for a new project.
    pub fn template() -> Self {
        let mut variables = IndexMap::new();
        variables.insert("fontsize".to_string(), VariableValue::from("12pt"));
        variables.insert("papersize".to_string(), VariableValue::from("a4paper"));
        variables.insert("geometry".to_string(), VariableValue::from("margin=25mm"));

        let mut metadata = IndexMap::new();
        metadata.insert("title".to_string(), "Document Title".to_string());

        Self {
            output_file: Some("output.pdf".to_string()),
            from: Some("markdown".to_string()),
            to: Some("pdf".to_string()),
            toc: Some(true),
            number_sections: Some(true),
            citeproc: Some(true),
            variables,
            metadata,
            ..Default::default()
        }
    }
}

/// A template variable: pandoc accepts a single value or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum VariableValue {
    Scalar(String),
    List(Vec<String>),
}

impl VariableValue {
    /// Values as a list (a scalar is a one-element list).
    pub fn items(&self) -> Vec<&str> {
        match self {
            VariableValue::Scalar(value) => vec![value.as_str()],
            VariableValue::List(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        VariableValue::Scalar(value.to_string())
    }
}

/// A decoded project: the argument model plus the file-level settings a
/// defaults file carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Project {
    pub args: ArgumentModel,
    /// Inputs, bibliography files included, absolute when a base was known.
    pub input_files: Vec<PathBuf>,
    /// File name only; the directory is never imported.
    pub output_filename: Option<String>,
    /// Directory relative paths are resolved against and written relative to.
    pub base_dir: Option<PathBuf>,
}

/// Stringify a YAML scalar. Mappings, sequences and nulls yield `None`.
pub(crate) fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Tagged(tagged) => scalar_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn scalar_items(items: &[Value]) -> Vec<String> {
    items.iter().filter_map(scalar_string).collect()
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Sequence(items) => scalar_items(&items),
        other => scalar_string(&other).into_iter().collect(),
    })
}

fn variable_map<'de, D>(deserializer: D) -> Result<IndexMap<String, VariableValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<IndexMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::Sequence(items) => VariableValue::List(scalar_items(&items)),
                other => VariableValue::Scalar(scalar_string(&other)?),
            };
            Some((key, value))
        })
        .collect())
}

fn scalar_map<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<IndexMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| scalar_string(&value).map(|v| (key, v)))
        .collect())
}
