// ── Resource model ──
//
// Typed views over controller records. Each type is decoded from the raw
// JSON object the API returns and keeps that object alongside the typed
// fields, so `info` can show everything the server sent while the rest of
// the shell works with real types. Unknown keys are ignored on decode.

pub mod common;
pub mod inventory;
pub mod job;
pub mod job_template;
pub mod kind;
pub mod project;
pub mod survey;

// ── Re-exports ──────────────────────────────────────────────────────

pub use common::Resource;
pub use inventory::{Group, Host, Inventory};
pub use job::{Job, JobStatus};
pub use job_template::JobTemplate;
pub use kind::ResourceKind;
pub use project::Project;
pub use survey::{QuestionKind, SurveyQuestion, SurveySpec};
