// ── Shell context ──
//
// The resource the shell is currently "in". A plain value: the dispatcher
// takes the current context and hands back the next one, so every
// transition can be driven and checked without a terminal.

use url::Url;

use crate::model::{Inventory, Job, JobTemplate, Project, Resource, ResourceKind};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Context {
    #[default]
    Root,
    Inventory(Inventory),
    Project(Project),
    JobTemplate(JobTemplate),
    Job(Job),
}

impl Context {
    /// Resource type of the selection, `None` at root.
    pub fn kind(&self) -> Option<ResourceKind> {
        match self {
            Context::Root => None,
            Context::Inventory(_) => Some(ResourceKind::Inventories),
            Context::Project(_) => Some(ResourceKind::Projects),
            Context::JobTemplate(_) => Some(ResourceKind::JobTemplates),
            Context::Job(_) => Some(ResourceKind::Jobs),
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Context::Root)
    }

    pub fn id(&self) -> Option<i64> {
        self.with_resource(|r| r.id(), |r| r.id(), |r| r.id(), |r| r.id())
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Context::Root => None,
            Context::Inventory(r) => Some(r.name()),
            Context::Project(r) => Some(r.name()),
            Context::JobTemplate(r) => Some(r.name()),
            Context::Job(r) => Some(r.name()),
        }
    }

    /// Short tag shown in the prompt, e.g. `jt`.
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            Context::Root => None,
            Context::Inventory(_) => Some("inv"),
            Context::Project(_) => Some("project"),
            Context::JobTemplate(_) => Some("jt"),
            Context::Job(_) => Some("job"),
        }
    }

    /// Prompt segment for the selection, e.g. `jt:42 deploy-web`.
    pub fn label(&self) -> Option<String> {
        let tag = self.tag()?;
        let id = self.id()?;
        match self.name().filter(|n| !n.is_empty()) {
            Some(name) => Some(format!("{tag}:{id} {name}")),
            None => Some(format!("{tag}:{id}")),
        }
    }

    /// Key fields of the selection for `info`.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        self.with_resource(
            |r| r.summary(),
            |r| r.summary(),
            |r| r.summary(),
            |r| r.summary(),
        )
        .unwrap_or_default()
    }

    /// Deep link to the selection in the web UI.
    pub fn absolute_url(&self, base: &Url) -> Option<String> {
        self.with_resource(
            |r| r.absolute_url(base),
            |r| r.absolute_url(base),
            |r| r.absolute_url(base),
            |r| r.absolute_url(base),
        )
    }

    /// Raw record of the selection.
    pub fn data(&self) -> Option<&serde_json::Value> {
        match self {
            Context::Root => None,
            Context::Inventory(r) => Some(r.data()),
            Context::Project(r) => Some(r.data()),
            Context::JobTemplate(r) => Some(r.data()),
            Context::Job(r) => Some(r.data()),
        }
    }

    fn with_resource<T>(
        &self,
        inventory: impl FnOnce(&Inventory) -> T,
        project: impl FnOnce(&Project) -> T,
        template: impl FnOnce(&JobTemplate) -> T,
        job: impl FnOnce(&Job) -> T,
    ) -> Option<T> {
        match self {
            Context::Root => None,
            Context::Inventory(r) => Some(inventory(r)),
            Context::Project(r) => Some(project(r)),
            Context::JobTemplate(r) => Some(template(r)),
            Context::Job(r) => Some(job(r)),
        }
    }
}

impl From<Inventory> for Context {
    fn from(r: Inventory) -> Self {
        Context::Inventory(r)
    }
}

impl From<Project> for Context {
    fn from(r: Project) -> Self {
        Context::Project(r)
    }
}

impl From<JobTemplate> for Context {
    fn from(r: JobTemplate) -> Self {
        Context::JobTemplate(r)
    }
}

impl From<Job> for Context {
    fn from(r: Job) -> Self {
        Context::Job(r)
    }
}
