// ── Project sync ──

use ash_core::{Context, Project};

use crate::error::ShellError;
use crate::shell::registry::{CommandResult, Outcome};
use crate::shell::session::Session;

/// Start an SCM update of the selected project, or of the selected job
/// template's project. Does not wait for the update to finish.
pub async fn sync(session: &mut Session, context: &Context, _args: &[String]) -> CommandResult {
    let project = match context {
        Context::Project(project) => project.clone(),
        Context::JobTemplate(jt) => {
            let id = jt.project.ok_or_else(|| {
                ShellError::usage(format!("job template {} has no project", jt.name))
            })?;
            match session.catalog.projects.get(id) {
                Some(project) => project.clone(),
                None => session.platform.fetch::<Project>(id).await?,
            }
        }
        _ => return Err(ShellError::usage("select a project or job template first")),
    };

    session.platform.sync_project(&project).await?;
    session
        .console
        .success(format_args!("Sync started for project {}", project.name));
    Ok(Outcome::Stay)
}
