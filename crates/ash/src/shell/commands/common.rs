// ── Commands shared by every selection ──

use ash_core::{Cataloged, Context, Resource};

use crate::error::ShellError;
use crate::shell::registry::{CommandResult, Outcome};
use crate::shell::session::Session;

#[allow(clippy::unused_async)]
pub async fn info(session: &mut Session, context: &Context, _args: &[String]) -> CommandResult {
    if context.is_root() {
        return Err(ShellError::usage("info needs a selection; cd into one first"));
    }
    let mut fields = context.summary();
    if let Some(url) = context.absolute_url(session.platform.base_url()) {
        fields.push(("url", url));
    }
    session.console.fields(&fields);
    Ok(Outcome::Stay)
}

/// Refetch the selection. Cached kinds are updated in the catalog too, so
/// `cd` and `ls` see the new state.
pub async fn refresh(session: &mut Session, context: &Context, _args: &[String]) -> CommandResult {
    let mut next = context.clone();
    match next {
        Context::Root => return Err(ShellError::usage("nothing selected to refresh")),
        Context::Inventory(ref mut r) => {
            session.platform.refresh(r).await?;
            recatalog(session, r);
        }
        Context::Project(ref mut r) => {
            session.platform.refresh(r).await?;
            recatalog(session, r);
        }
        Context::JobTemplate(ref mut r) => {
            session.platform.refresh(r).await?;
            recatalog(session, r);
        }
        Context::Job(ref mut r) => session.platform.refresh(r).await?,
    }
    session
        .console
        .success(format_args!("Refreshed {}", next.label().unwrap_or_default()));
    Ok(Outcome::Enter(next))
}

fn recatalog<R: Cataloged>(session: &mut Session, resource: &R) {
    R::collection_mut(&mut session.catalog).upsert(resource.clone());
}
