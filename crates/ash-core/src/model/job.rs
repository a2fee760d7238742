// ── Jobs ──

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use strum::{Display, EnumString};

use super::common::{Resource, decode, null_as_default, related_name, show_ref};
use super::ResourceKind;
use crate::error::CoreError;

/// Branch reported for jobs whose project has no branch override.
pub const DEFAULT_SCM_BRANCH: &str = "main";

/// Lifecycle state of a job as reported by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JobStatus {
    #[default]
    New,
    Pending,
    Waiting,
    Running,
    Successful,
    Failed,
    Error,
    Canceled,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Job {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: JobStatus,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub started: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub elapsed: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub scm_branch: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub limit: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub playbook: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub launch_type: String,
    #[serde(default)]
    pub job_template: Option<i64>,
    #[serde(default)]
    pub inventory: Option<i64>,
    #[serde(default)]
    pub project: Option<i64>,
    #[serde(skip)]
    data: Value,
}

impl Job {
    /// A job is done once the controller stamps a finish time.
    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    pub fn stdout_endpoint(&self, start_line: usize) -> String {
        format!("{}stdout/?format=json&start_line={start_line}", self.uri())
    }

    pub fn relaunch_endpoint(&self) -> String {
        format!("{}relaunch/", self.uri())
    }

    pub fn cancel_endpoint(&self) -> String {
        format!("{}cancel/", self.uri())
    }
}

impl Resource for Job {
    const KIND: ResourceKind = ResourceKind::Jobs;

    fn from_value(data: Value) -> Result<Self, CoreError> {
        let mut job: Self = decode(Self::KIND, &data)?;
        if job.scm_branch.is_empty() {
            DEFAULT_SCM_BRANCH.clone_into(&mut job.scm_branch);
        }
        job.data = data;
        Ok(job)
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
        format!("execution/jobs/playbook/{}/output", self.id)
    }

    fn summary(&self) -> Vec<(&'static str, String)> {
        let stamp = |t: Option<DateTime<Utc>>| {
            t.map_or_else(|| "-".into(), |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        };
        vec![
            ("id", self.id.to_string()),
            ("name", self.name.clone()),
            ("status", self.status.to_string()),
            (
                "template",
                related_name(&self.data, "job_template")
                    .unwrap_or_else(|| show_ref(self.job_template)),
            ),
            ("playbook", self.playbook.clone()),
            ("branch", self.scm_branch.clone()),
            (
                "limit",
                if self.limit.is_empty() {
                    "-".into()
                } else {
                    self.limit.clone()
                },
            ),
            ("launched by", self.launch_type.clone()),
            ("created", stamp(self.created)),
            ("started", stamp(self.started)),
            ("finished", stamp(self.finished)),
            ("elapsed", format!("{:.1}s", self.elapsed)),
        ]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn finished_job_decodes_timestamps() {
        let job = Job::from_value(json!({
            "id": 1001,
            "name": "deploy-web",
            "status": "successful",
            "created": "2024-05-01T12:00:00.123456Z",
            "finished": "2024-05-01T12:03:10.5Z",
            "scm_branch": "release/2.1",
            "job_template": 42,
        }))
        .unwrap();

        assert_eq!(job.status, JobStatus::Successful);
        assert!(job.is_finished());
        assert_eq!(job.scm_branch, "release/2.1");
        assert_eq!(job.created.unwrap().timestamp(), 1_714_564_800);
    }

    #[test]
    fn missing_or_empty_branch_defaults_to_main() {
        let omitted = Job::from_value(json!({ "id": 1, "status": "pending" })).unwrap();
        assert_eq!(omitted.scm_branch, DEFAULT_SCM_BRANCH);

        let empty = Job::from_value(json!({ "id": 2, "scm_branch": "" })).unwrap();
        assert_eq!(empty.scm_branch, "main");

        let null = Job::from_value(json!({ "id": 3, "scm_branch": null })).unwrap();
        assert_eq!(null.scm_branch, "main");
    }

    #[test]
    fn running_job_is_not_finished() {
        let job = Job::from_value(json!({ "id": 7, "status": "running", "finished": null })).unwrap();
        assert!(!job.is_finished());
        assert_eq!(job.status, JobStatus::Running);
    }

    #[test]
    fn unknown_status_is_malformed() {
        let err = Job::from_value(json!({ "id": 7, "status": "exploded" })).unwrap_err();
        assert!(matches!(err, CoreError::Model { .. }));
    }

    #[test]
    fn stdout_endpoint_carries_offset() {
        let job = Job::from_value(json!({ "id": 9 })).unwrap();
        assert_eq!(
            job.stdout_endpoint(120),
            "jobs/9/stdout/?format=json&start_line=120"
        );
        assert_eq!(job.ui_path(), "execution/jobs/playbook/9/output");
    }
}
