// ── Presentation ──
//
// Table rows for listings and the prompt string. Pure functions of the
// data; the console decides whether colour is applied.

use chrono::{DateTime, Local, Utc};
use owo_colors::AnsiColors;
use tabled::Tabled;

use ash_core::{Context, Group, Host, Inventory, Job, JobStatus, JobTemplate, Project};

use crate::output::Console;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct TemplateRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Playbook")]
    playbook: String,
}

impl From<&JobTemplate> for TemplateRow {
    fn from(jt: &JobTemplate) -> Self {
        Self {
            id: jt.id,
            name: jt.name.clone(),
            playbook: jt.playbook.clone(),
        }
    }
}

#[derive(Tabled)]
pub struct ProjectRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "SCM URL")]
    scm_url: String,
}

impl From<&Project> for ProjectRow {
    fn from(p: &Project) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            scm_url: p.scm_url.clone(),
        }
    }
}

#[derive(Tabled)]
pub struct InventoryRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Hosts")]
    total_hosts: u64,
}

impl From<&Inventory> for InventoryRow {
    fn from(inv: &Inventory) -> Self {
        Self {
            id: inv.id,
            name: inv.name.clone(),
            total_hosts: inv.total_hosts,
        }
    }
}

#[derive(Tabled)]
pub struct JobRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Finished")]
    finished: String,
}

impl From<&Job> for JobRow {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id,
            name: job.name.clone(),
            status: job.status.to_string(),
            created: timestamp(job.created),
            finished: timestamp(job.finished),
        }
    }
}

#[derive(Tabled)]
pub struct HostRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Enabled")]
    enabled: bool,
    #[tabled(rename = "Failures")]
    failures: bool,
}

impl From<&Host> for HostRow {
    fn from(host: &Host) -> Self {
        Self {
            id: host.id,
            name: host.name.clone(),
            enabled: host.enabled,
            failures: host.has_active_failures,
        }
    }
}

#[derive(Tabled)]
pub struct GroupRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Hosts")]
    total_hosts: u64,
}

impl From<&Group> for GroupRow {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id,
            name: group.name.clone(),
            total_hosts: group.total_hosts,
        }
    }
}

/// Local time, minute precision; `-` when unset.
fn timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(
        || "-".into(),
        |t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
    )
}

// ── Prompt ──────────────────────────────────────────────────────────

pub fn status_color(status: JobStatus) -> AnsiColors {
    match status {
        JobStatus::Successful => AnsiColors::Green,
        JobStatus::Failed | JobStatus::Error => AnsiColors::Red,
        JobStatus::Canceled => AnsiColors::BrightBlack,
        JobStatus::New | JobStatus::Pending | JobStatus::Waiting | JobStatus::Running => {
            AnsiColors::Blue
        }
    }
}

fn context_color(context: &Context) -> AnsiColors {
    match context {
        Context::Root => AnsiColors::White,
        Context::JobTemplate(_) => AnsiColors::Yellow,
        Context::Job(job) => status_color(job.status),
        Context::Inventory(_) => AnsiColors::Cyan,
        Context::Project(_) => AnsiColors::Magenta,
    }
}

/// `ash > ` at root, `ash [jt:42 deploy-web] > ` inside a resource.
pub fn prompt(context: &Context, console: &Console) -> String {
    match context.label() {
        Some(label) => {
            let segment = console.paint(&format!("[{label}]"), context_color(context));
            format!("ash {segment} > ")
        }
        None => "ash > ".into(),
    }
}
