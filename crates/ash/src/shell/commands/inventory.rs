// ── Inventory listings ──
//
// Hosts and groups are fetched on demand and never cached.

use ash_core::{Context, Inventory};

use crate::error::ShellError;
use crate::shell::registry::{CommandResult, Outcome};
use crate::shell::session::Session;
use crate::shell::view::{GroupRow, HostRow};

fn selected(context: &Context) -> Result<&Inventory, ShellError> {
    match context {
        Context::Inventory(inv) => Ok(inv),
        _ => Err(ShellError::usage("select an inventory first")),
    }
}

pub async fn hosts(session: &mut Session, context: &Context, _args: &[String]) -> CommandResult {
    let inventory = selected(context)?;
    let spinner = session
        .console
        .spinner(format!("Fetching hosts of {}", inventory.name));
    let hosts = session.platform.hosts(inventory).await;
    spinner.finish_and_clear();

    let rows: Vec<HostRow> = hosts?.iter().map(HostRow::from).collect();
    session.console.table(&rows);
    Ok(Outcome::Stay)
}

pub async fn groups(session: &mut Session, context: &Context, _args: &[String]) -> CommandResult {
    let inventory = selected(context)?;
    let groups = session.platform.groups(inventory).await?;
    let rows: Vec<GroupRow> = groups.iter().map(GroupRow::from).collect();
    session.console.table(&rows);
    Ok(Outcome::Stay)
}
