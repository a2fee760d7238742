// ── Launch planning ──
//
// Maps a template's asked variables to launch payload keys, works out the
// default each prompt should offer, and turns typed answers into JSON.
// Nothing here talks to the controller; the shell drives the prompts and
// hands the finished payload to `Platform::launch`.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::model::{QuestionKind, SurveyQuestion};

/// How an asked variable's answer is typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Text,
    /// One of a fixed set of values.
    Choice(&'static [&'static str]),
    Integer { min: Option<i64>, max: Option<i64> },
    Boolean,
    /// A single object id.
    Id,
    /// Comma-separated object ids.
    IdList,
    /// A YAML or JSON mapping merged into `extra_vars`.
    Variables,
}

/// One launch-time parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchParam<'a> {
    /// Name from the `ask_<variable>_on_launch` flag.
    pub variable: &'a str,
    /// Key in the launch payload and in template/job records.
    pub payload_key: &'a str,
    pub kind: ParamKind,
    /// Default when neither a prefill nor the record supplies one.
    pub fallback: Option<&'static str>,
}

const fn param(
    variable: &'static str,
    payload_key: &'static str,
    kind: ParamKind,
) -> LaunchParam<'static> {
    LaunchParam {
        variable,
        payload_key,
        kind,
        fallback: None,
    }
}

const COUNT: ParamKind = ParamKind::Integer {
    min: Some(0),
    max: None,
};

/// Every launch-time parameter the controller knows how to prompt for.
pub const LAUNCH_PARAMS: &[LaunchParam<'static>] = &[
    param("variables", "extra_vars", ParamKind::Variables),
    LaunchParam {
        fallback: Some("all"),
        ..param("limit", "limit", ParamKind::Text)
    },
    param("tags", "job_tags", ParamKind::Text),
    param("skip_tags", "skip_tags", ParamKind::Text),
    param("scm_branch", "scm_branch", ParamKind::Text),
    param("job_type", "job_type", ParamKind::Choice(&["run", "check"])),
    param(
        "verbosity",
        "verbosity",
        ParamKind::Integer {
            min: Some(0),
            max: Some(5),
        },
    ),
    param("diff_mode", "diff_mode", ParamKind::Boolean),
    param("inventory", "inventory", ParamKind::Id),
    param("credential", "credentials", ParamKind::IdList),
    param(
        "execution_environment",
        "execution_environment",
        ParamKind::Id,
    ),
    param("labels", "labels", ParamKind::IdList),
    param("instance_groups", "instance_groups", ParamKind::IdList),
    param("forks", "forks", COUNT),
    param("timeout", "timeout", COUNT),
    param("job_slice_count", "job_slice_count", COUNT),
];

/// Look up the parameter for an asked variable. Unknown variables are sent
/// as text under their own name.
pub fn param_for(variable: &str) -> LaunchParam<'_> {
    LAUNCH_PARAMS
        .iter()
        .copied()
        .find(|p| p.variable == variable)
        .unwrap_or(LaunchParam {
            variable,
            payload_key: variable,
            kind: ParamKind::Text,
            fallback: None,
        })
}

/// The value `record` (a template or a job) currently holds for `param`,
/// rendered as prompt text. `None` when unset or empty.
pub fn current_value(param: &LaunchParam<'_>, record: &Value) -> Option<String> {
    if param.kind == ParamKind::IdList {
        let related = record.get("summary_fields")?.get(param.payload_key)?;
        let items = related
            .get("results")
            .unwrap_or(related)
            .as_array()?;
        let ids: Vec<String> = items
            .iter()
            .filter_map(|item| item.get("id").and_then(Value::as_i64))
            .map(|id| id.to_string())
            .collect();
        return (!ids.is_empty()).then(|| ids.join(","));
    }

    match record.get(param.payload_key)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(m) if m.is_empty() => None,
        other => Some(other.to_string()),
    }
}

/// Default offered by a prompt: the prefill, else the record's current
/// value, else the parameter's fallback.
pub fn prompt_default(
    param: &LaunchParam<'_>,
    prefill: Option<&str>,
    record: &Value,
) -> Option<String> {
    prefill
        .map(str::to_owned)
        .or_else(|| current_value(param, record))
        .or_else(|| param.fallback.map(str::to_owned))
}

/// Capture the launch-time values of a previous run, keyed by asked
/// variable, for use as prompt defaults on the next launch.
pub fn prefills_from(record: &Value, asked: &[String]) -> BTreeMap<String, String> {
    asked
        .iter()
        .filter_map(|variable| {
            let param = param_for(variable);
            current_value(&param, record).map(|value| (variable.clone(), value))
        })
        .collect()
}

/// Convert prompt text into the JSON value the payload carries.
pub fn parse_answer(param: &LaunchParam<'_>, text: &str) -> Result<Value, CoreError> {
    let text = text.trim();
    match param.kind {
        ParamKind::Text => Ok(Value::String(text.to_owned())),
        ParamKind::Choice(options) => {
            if options.contains(&text) {
                Ok(Value::String(text.to_owned()))
            } else {
                Err(CoreError::validation(format!(
                    "{} must be one of: {}",
                    param.variable,
                    options.join(", ")
                )))
            }
        }
        ParamKind::Integer { min, max } => {
            let n = parse_int(param.variable, text)?;
            if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) {
                return Err(CoreError::validation(format!(
                    "{} out of range: {n}",
                    param.variable
                )));
            }
            Ok(Value::from(n))
        }
        ParamKind::Boolean => match text.to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "n" | "0" => Ok(Value::Bool(false)),
            _ => Err(CoreError::validation(format!(
                "{} must be true or false",
                param.variable
            ))),
        },
        ParamKind::Id => parse_int(param.variable, text).map(Value::from),
        ParamKind::IdList => text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| parse_int(param.variable, s).map(Value::from))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        ParamKind::Variables => parse_variables(text).map(Value::Object),
    }
}

fn parse_int(variable: &str, text: &str) -> Result<i64, CoreError> {
    text.parse()
        .map_err(|_| CoreError::validation(format!("{variable} expects an integer, got '{text}'")))
}

/// Parse extra variables written as YAML or JSON. Empty text is an empty
/// mapping.
pub fn parse_variables(text: &str) -> Result<Map<String, Value>, CoreError> {
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value = serde_yaml::from_str(text)
        .map_err(|e| CoreError::validation(format!("extra variables are not valid YAML: {e}")))?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(CoreError::validation("extra variables must be a mapping")),
    }
}

/// Convert a free-text survey answer to the question's JSON type.
pub fn survey_value(question: &SurveyQuestion, text: &str) -> Result<Value, CoreError> {
    let text = text.trim();
    let out_of_range = |n: f64| {
        question.min.is_some_and(|m| n < m) || question.max.is_some_and(|m| n > m)
    };

    match question.kind {
        QuestionKind::Integer => {
            let n = parse_int(&question.variable, text)?;
            #[allow(clippy::cast_precision_loss)]
            let approx = n as f64;
            if out_of_range(approx) {
                return Err(CoreError::validation(format!(
                    "{} out of range: {n}",
                    question.variable
                )));
            }
            Ok(Value::from(n))
        }
        QuestionKind::Float => {
            let n: f64 = text.parse().map_err(|_| {
                CoreError::validation(format!("{} expects a number, got '{text}'", question.variable))
            })?;
            if out_of_range(n) {
                return Err(CoreError::validation(format!(
                    "{} out of range: {n}",
                    question.variable
                )));
            }
            Ok(Value::from(n))
        }
        _ => Ok(Value::String(text.to_owned())),
    }
}

// ── Payload ──────────────────────────────────────────────────────────

/// Launch request body under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaunchPayload {
    fields: Map<String, Value>,
    extra_vars: Map<String, Value>,
}

impl LaunchPayload {
    /// Record the answer for a launch parameter. Variables are merged into
    /// `extra_vars`; everything else is stored under its payload key.
    pub fn set(&mut self, param: &LaunchParam<'_>, value: Value) {
        match (param.kind, value) {
            (ParamKind::Variables, Value::Object(map)) => self.extra_vars.extend(map),
            (_, value) => {
                self.fields.insert(param.payload_key.to_owned(), value);
            }
        }
    }

    /// Record a survey answer under its extra variable.
    pub fn survey_answer(&mut self, variable: &str, value: Value) {
        self.extra_vars.insert(variable.to_owned(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.extra_vars.is_empty()
    }

    pub fn to_value(&self) -> Value {
        let mut body = self.fields.clone();
        if !self.extra_vars.is_empty() {
            body.insert("extra_vars".into(), Value::Object(self.extra_vars.clone()));
        }
        Value::Object(body)
    }
}
