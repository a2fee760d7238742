// ── Command registry ──
//
// Which commands each context offers, and the handler behind every name.
// The sets are declared statically; `Registry::validate` runs at startup
// and refuses to start a shell with a declared command left unhandled.

use std::collections::HashMap;

use futures::future::LocalBoxFuture;

use ash_core::Context;

use super::session::Session;
use crate::error::{CliError, ShellError};

/// What the dispatcher does after a command succeeds.
#[derive(Debug)]
pub enum Outcome {
    Stay,
    Enter(Context),
    Exit,
}

pub type CommandResult = Result<Outcome, ShellError>;

pub type Handler = for<'a> fn(
    &'a mut Session,
    &'a Context,
    &'a [String],
) -> LocalBoxFuture<'a, CommandResult>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub help: &'static str,
}

const fn spec(name: &'static str, help: &'static str) -> CommandSpec {
    CommandSpec { name, help }
}

// ── Command sets ────────────────────────────────────────────────────

pub const ROOT_COMMANDS: &[CommandSpec] = &[
    spec("cd", "Change context: cd <job_template|inventory|project|job> <name or id>, cd .. to leave"),
    spec("ls", "List objects: ls <job_templates|inventories|projects|jobs> [key:value ...] [search]"),
    spec("cache", "Reload job templates, projects and inventories from the controller"),
    spec("help", "Show the commands available here"),
    spec("exit", "Quit"),
];

pub const JOB_TEMPLATE_COMMANDS: &[CommandSpec] = &[
    spec("launch", "Launch the selected job template"),
    spec("refresh", "Refresh the selected job template"),
    spec("info", "Show the selected job template"),
    spec("set", "Prefill launch values: set [variable [value]]"),
    spec("jobs", "List recent jobs of the selected job template"),
    spec("sync", "Sync the project of the selected job template"),
];

pub const JOB_COMMANDS: &[CommandSpec] = &[
    spec("info", "Show the selected job"),
    spec("refresh", "Refresh the selected job"),
    spec("retry", "Relaunch the selected job"),
    spec("reuse", "Use the job's launch values as prefills for its template"),
    spec("template", "Switch to the job template of the selected job"),
    spec("cancel", "Cancel the selected job"),
    spec("output", "Show the job output: output [-f|--follow]"),
];

pub const INVENTORY_COMMANDS: &[CommandSpec] = &[
    spec("info", "Show the selected inventory"),
    spec("refresh", "Refresh the selected inventory"),
    spec("hosts", "List hosts in the selected inventory"),
    spec("groups", "List groups in the selected inventory"),
];

pub const PROJECT_COMMANDS: &[CommandSpec] = &[
    spec("info", "Show the selected project"),
    spec("refresh", "Refresh the selected project"),
    spec("sync", "Sync the selected project"),
];

/// Commands specific to `context`; empty at root.
pub fn context_commands(context: &Context) -> &'static [CommandSpec] {
    match context {
        Context::Root => &[],
        Context::JobTemplate(_) => JOB_TEMPLATE_COMMANDS,
        Context::Job(_) => JOB_COMMANDS,
        Context::Inventory(_) => INVENTORY_COMMANDS,
        Context::Project(_) => PROJECT_COMMANDS,
    }
}

/// The active set: the context's own commands, then the root commands.
pub fn command_set(context: &Context) -> impl Iterator<Item = &'static CommandSpec> {
    context_commands(context).iter().chain(ROOT_COMMANDS)
}

fn all_sets() -> [&'static [CommandSpec]; 5] {
    [
        ROOT_COMMANDS,
        JOB_TEMPLATE_COMMANDS,
        JOB_COMMANDS,
        INVENTORY_COMMANDS,
        PROJECT_COMMANDS,
    ]
}

// ── Registry ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct Registry {
    handlers: HashMap<&'static str, Handler>,
}

impl Registry {
    pub fn register(&mut self, name: &'static str, handler: Handler) -> &mut Self {
        self.handlers.insert(name, handler);
        self
    }

    /// Every command declared in any set must have a handler.
    pub fn validate(&self) -> Result<(), CliError> {
        for spec in all_sets().into_iter().flatten() {
            if !self.handlers.contains_key(spec.name) {
                return Err(CliError::UnregisteredCommand {
                    name: spec.name.to_owned(),
                });
            }
        }
        Ok(())
    }

    /// Handler for `name` if the command is available in `context`,
    /// otherwise the message to show.
    pub fn resolve(&self, context: &Context, name: &str) -> Result<Handler, String> {
        if command_set(context).any(|spec| spec.name == name) {
            return self
                .handlers
                .get(name)
                .copied()
                .ok_or_else(|| format!("'{name}' has no handler"));
        }

        let elsewhere = all_sets()
            .into_iter()
            .flatten()
            .any(|spec| spec.name == name);
        if elsewhere {
            Err(format!("'{name}' is not available here; type 'help' for the commands you can use"))
        } else {
            Err(format!("Unknown command '{name}'; type 'help' for a list"))
        }
    }
}
