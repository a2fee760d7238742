// ── Job templates ──

use serde::Deserialize;
use serde_json::Value;

use super::common::{Resource, decode, null_as_default, related_name, show_ref};
use super::ResourceKind;
use crate::error::CoreError;

const ASK_PREFIX: &str = "ask_";
const ASK_SUFFIX: &str = "_on_launch";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobTemplate {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub job_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub playbook: String,
    #[serde(default)]
    pub project: Option<i64>,
    #[serde(default)]
    pub inventory: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub survey_enabled: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(skip)]
    data: Value,
}

impl JobTemplate {
    /// Launch-time prompts the template enables, derived from every
    /// `ask_<variable>_on_launch` flag set to `true`, in key order.
    pub fn asked_variables(&self) -> Vec<String> {
        let Some(fields) = self.data.as_object() else {
            return Vec::new();
        };

        let mut asked: Vec<String> = fields
            .iter()
            .filter(|(_, flag)| flag.as_bool() == Some(true))
            .filter_map(|(key, _)| {
                key.strip_prefix(ASK_PREFIX)?
                    .strip_suffix(ASK_SUFFIX)
                    .filter(|v| !v.is_empty())
                    .map(str::to_owned)
            })
            .collect();
        asked.sort();
        asked
    }

    /// Sub-collection of jobs spawned from this template.
    pub fn jobs_endpoint(&self) -> String {
        format!("{}jobs/", self.uri())
    }

    pub fn launch_endpoint(&self) -> String {
        format!("{}launch/", self.uri())
    }

    pub fn survey_endpoint(&self) -> String {
        format!("{}survey_spec/", self.uri())
    }
}

impl Resource for JobTemplate {
    const KIND: ResourceKind = ResourceKind::JobTemplates;

    fn from_value(data: Value) -> Result<Self, CoreError> {
        let mut template: Self = decode(Self::KIND, &data)?;
        template.data = data;
        Ok(template)
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn data(&self) -> &Value {
        &self.data
    }

    fn ui_path(&self) -> String {
        format!("execution/templates/job-template/{}", self.id)
    }

    fn summary(&self) -> Vec<(&'static str, String)> {
        let asked = self.asked_variables();
        vec![
            ("id", self.id.to_string()),
            ("name", self.name.clone()),
            ("description", self.description.clone()),
            ("job type", self.job_type.clone()),
            ("playbook", self.playbook.clone()),
            (
                "project",
                related_name(&self.data, "project").unwrap_or_else(|| show_ref(self.project)),
            ),
            (
                "inventory",
                related_name(&self.data, "inventory")
                    .unwrap_or_else(|| show_ref(self.inventory)),
            ),
            ("last status", self.status.clone()),
            ("survey", self.survey_enabled.to_string()),
            (
                "prompts",
                if asked.is_empty() {
                    "-".into()
                } else {
                    asked.join(", ")
                },
            ),
        ]
    }
}
