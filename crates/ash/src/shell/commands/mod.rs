//! Command handlers.
//!
//! Each handler is an `async fn(&mut Session, &Context, &[String])`
//! returning an [`Outcome`]. `registry()` binds them to the names the
//! command sets declare.

mod common;
mod inventory;
mod job;
mod job_template;
mod project;
mod root;

use futures::future::LocalBoxFuture;

use ash_core::Context;

use super::registry::{CommandResult, Handler, Registry};
use super::session::Session;

/// Box an `async fn` handler into a [`Handler`] pointer.
macro_rules! handler {
    ($f:path) => {{
        fn boxed<'a>(
            session: &'a mut Session,
            context: &'a Context,
            args: &'a [String],
        ) -> LocalBoxFuture<'a, CommandResult> {
            Box::pin($f(session, context, args))
        }
        boxed as Handler
    }};
}

pub fn registry() -> Registry {
    let mut registry = Registry::default();
    registry
        // root
        .register("cd", handler!(root::cd))
        .register("ls", handler!(root::ls))
        .register("cache", handler!(root::cache))
        .register("help", handler!(root::help))
        .register("exit", handler!(root::exit))
        // any selection
        .register("info", handler!(common::info))
        .register("refresh", handler!(common::refresh))
        // job_template
        .register("launch", handler!(job_template::launch))
        .register("set", handler!(job_template::set))
        .register("jobs", handler!(job_template::jobs))
        .register("sync", handler!(project::sync))
        // job
        .register("retry", handler!(job::retry))
        .register("reuse", handler!(job::reuse))
        .register("template", handler!(job::template))
        .register("cancel", handler!(job::cancel))
        .register("output", handler!(job::output))
        // inventory
        .register("hosts", handler!(inventory::hosts))
        .register("groups", handler!(inventory::groups));
    registry
}
