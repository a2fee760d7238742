// ── Shell session ──
//
// Everything a command can touch: the controller, the cache and catalog,
// the prompter and the console, plus per-template launch prefills. The
// current context is not held here: `step` takes it and hands back the
// next one.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;

use tracing::{debug, info};

use ash_core::{
    Cache, Catalog, Cataloged, Context, CoreError, Inventory, JobTemplate, Platform, Project,
    Resource,
};

use super::commands;
use super::prompt::Prompter;
use super::registry::{Outcome, Registry};
use crate::error::{CliError, ShellError};
use crate::output::Console;

/// Result of feeding one line to the shell.
#[derive(Debug)]
pub enum Step {
    Continue(Context),
    Exit,
}

pub struct Session {
    pub(crate) platform: Platform,
    pub(crate) cache: Cache,
    pub(crate) catalog: Catalog,
    pub(crate) prompter: Box<dyn Prompter>,
    pub(crate) console: Console,
    /// Launch prompt defaults, by job template id and asked variable.
    pub(crate) prefills: HashMap<i64, BTreeMap<String, String>>,
    registry: Registry,
}

impl Session {
    pub fn new(
        platform: Platform,
        cache: Cache,
        prompter: Box<dyn Prompter>,
        console: Console,
    ) -> Result<Self, CliError> {
        let registry = commands::registry();
        registry.validate()?;
        Ok(Self {
            platform,
            cache,
            catalog: Catalog::default(),
            prompter,
            console,
            prefills: HashMap::new(),
            registry,
        })
    }

    // ── Catalog ──────────────────────────────────────────────────────

    /// Fill the catalog from the cache, fetching any kind the cache has
    /// never held. Failures are reported; the shell starts regardless.
    pub async fn bootstrap(&mut self) {
        if let Err(e) = self.warm::<JobTemplate>().await {
            self.console.error(format!("Could not load job templates: {e}"));
        }
        if let Err(e) = self.warm::<Project>().await {
            self.console.error(format!("Could not load projects: {e}"));
        }
        if let Err(e) = self.warm::<Inventory>().await {
            self.console.error(format!("Could not load inventories: {e}"));
        }
    }

    async fn warm<R: Cataloged>(&mut self) -> Result<(), CoreError> {
        let records = match self.cache.load::<R>()? {
            Some(records) => {
                debug!(kind = R::KIND.collection(), count = records.len(), "catalog loaded from cache");
                records
            }
            None => {
                let spinner = self
                    .console
                    .spinner(format!("Fetching {}", R::KIND.collection()));
                let fetched = self.platform.list::<R>().await;
                spinner.finish_and_clear();
                let fetched = fetched?;
                self.cache.store(&fetched)?;
                fetched
            }
        };
        R::collection_mut(&mut self.catalog).replace(records);
        Ok(())
    }

    /// Refetch every cached kind, then replace the cache and catalog. A
    /// failed fetch leaves both untouched.
    pub async fn reload_catalog(&mut self) -> Result<(), CoreError> {
        let spinner = self.console.spinner("Refreshing cache");
        let fetched = self.fetch_catalog().await;
        spinner.finish_and_clear();
        let (templates, projects, inventories) = fetched?;

        self.cache.clean()?;
        self.cache.store(&templates)?;
        self.cache.store(&projects)?;
        self.cache.store(&inventories)?;

        self.catalog.job_templates.replace(templates);
        self.catalog.projects.replace(projects);
        self.catalog.inventories.replace(inventories);
        info!(
            job_templates = self.catalog.job_templates.len(),
            projects = self.catalog.projects.len(),
            inventories = self.catalog.inventories.len(),
            "cache reloaded"
        );
        Ok(())
    }

    async fn fetch_catalog(
        &self,
    ) -> Result<(Vec<JobTemplate>, Vec<Project>, Vec<Inventory>), CoreError> {
        Ok((
            self.platform.list::<JobTemplate>().await?,
            self.platform.list::<Project>().await?,
            self.platform.list::<Inventory>().await?,
        ))
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Run one input line in `context` and return the context to continue
    /// in. A failing command is reported and leaves the context as it was;
    /// so does Ctrl-C while it runs.
    pub async fn step(&mut self, context: Context, line: &str) -> Step {
        let ctrl_c = async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        self.step_until(context, line, ctrl_c).await
    }

    /// `step`, abandoning the command once `interrupt` resolves. A command
    /// that finishes on the same poll wins, so one that handles Ctrl-C
    /// itself keeps its outcome.
    pub(crate) async fn step_until(
        &mut self,
        context: Context,
        line: &str,
        interrupt: impl Future<Output = ()>,
    ) -> Step {
        let words = match shell_words::split(line) {
            Ok(words) => words,
            Err(e) => {
                self.console.error(format!("Cannot parse input: {e}"));
                return Step::Continue(context);
            }
        };
        let Some((name, args)) = words.split_first() else {
            return Step::Continue(context);
        };

        let handler = match self.registry.resolve(&context, name) {
            Ok(handler) => handler,
            Err(message) => {
                self.console.error(message);
                return Step::Continue(context);
            }
        };

        debug!(command = %name, args = args.len(), "dispatching");
        let result = tokio::select! {
            biased;
            result = handler(self, &context, args) => result,
            () = interrupt => Err(ShellError::Interrupted),
        };
        match result {
            Ok(Outcome::Stay) => Step::Continue(context),
            Ok(Outcome::Enter(next)) => {
                info!(
                    from = context.label().as_deref().unwrap_or("root"),
                    to = next.label().as_deref().unwrap_or("root"),
                    "context changed"
                );
                Step::Continue(next)
            }
            Ok(Outcome::Exit) => Step::Exit,
            Err(err) => {
                self.report(&err);
                Step::Continue(context)
            }
        }
    }

    pub(crate) fn report(&mut self, err: &ShellError) {
        match err {
            ShellError::Interrupted => self.console.warn("Interrupted"),
            ShellError::Core(CoreError::Ambiguous { candidates, .. }) => {
                self.console.error(err);
                for candidate in candidates {
                    self.console.line(format_args!("  {candidate}"));
                }
            }
            _ => self.console.error(err),
        }
    }
}
