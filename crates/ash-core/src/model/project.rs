// ── Projects ──

use serde::Deserialize;
use serde_json::Value;

use super::common::{Resource, decode, null_as_default, related_name, show_ref};
use super::ResourceKind;
use crate::error::CoreError;

/// An SCM-backed project. `status` is the last update status as a plain
/// string: projects report values such as `never updated` and `missing`
/// that jobs never use.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Project {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scm_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scm_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scm_branch: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default)]
    pub organization: Option<i64>,
    #[serde(skip)]
    data: Value,
}

impl Resource for Project {
    const KIND: ResourceKind = ResourceKind::Projects;

    fn from_value(data: Value) -> Result<Self, CoreError> {
        let mut project: Self = decode(Self::KIND, &data)?;
        project.data = data;
        Ok(project)
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
        format!("execution/projects/{}/details", self.id)
    }

    fn summary(&self) -> Vec<(&'static str, String)> {
        vec![
            ("id", self.id.to_string()),
            ("name", self.name.clone()),
            ("description", self.description.clone()),
            ("status", self.status.clone()),
            ("scm type", self.scm_type.clone()),
            ("scm url", self.scm_url.clone()),
            ("scm branch", self.scm_branch.clone()),
            (
                "organization",
                related_name(&self.data, "organization")
                    .unwrap_or_else(|| show_ref(self.organization)),
            ),
        ]
    }
}
