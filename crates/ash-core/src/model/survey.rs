// ── Survey questions ──
//
// A template's survey spec is a list of questions, each bound to an extra
// variable. Choices arrive either as a newline-separated string (older
// controllers) or as a JSON list.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::common::null_as_default;

/// Answer widget a survey question expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    #[default]
    Text,
    Textarea,
    Password,
    Integer,
    Float,
    #[serde(rename = "multiplechoice")]
    MultipleChoice,
    #[serde(rename = "multiselect")]
    MultiSelect,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SurveyQuestion {
    #[serde(default, deserialize_with = "null_as_default")]
    pub question_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub question_description: String,
    pub variable: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub required: bool,
    #[serde(rename = "type", default)]
    pub kind: QuestionKind,
    #[serde(default)]
    pub default: Value,
    #[serde(default, deserialize_with = "choice_list")]
    pub choices: Vec<String>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl SurveyQuestion {
    /// Prompt label: the question name, falling back to the variable.
    pub fn label(&self) -> &str {
        if self.question_name.is_empty() {
            &self.variable
        } else {
            &self.question_name
        }
    }

    /// The default as prompt text, if any.
    pub fn default_text(&self) -> Option<String> {
        match &self.default {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Choices pre-selected by the default. Multi-select defaults use the
    /// same newline-or-list encoding as the choices themselves.
    pub fn default_choices(&self) -> Vec<String> {
        match &self.default {
            Value::String(s) => split_lines(s),
            Value::Array(items) => items.iter().map(value_text).collect(),
            _ => Vec::new(),
        }
    }
}

/// The `spec` list from a survey_spec response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SurveySpec {
    #[serde(default, deserialize_with = "null_as_default")]
    pub spec: Vec<SurveyQuestion>,
}

fn choice_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        List(Vec<Value>),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Raw::Text(text)) => split_lines(&text),
        Some(Raw::List(items)) => items.iter().map(value_text).collect(),
    })
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect()
}

fn value_text(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), str::to_owned)
}
