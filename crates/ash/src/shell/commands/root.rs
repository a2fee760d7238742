// ── Commands available everywhere ──

use tracing::debug;

use ash_core::store::parse_id;
use ash_core::{
    Context, Inventory, Job, JobTemplate, ListRequest, Project, ResourceCollection, ResourceKind,
};

use crate::error::ShellError;
use crate::shell::registry::{self, CommandResult, Outcome};
use crate::shell::session::Session;
use crate::shell::view::{InventoryRow, JobRow, ProjectRow, TemplateRow};

const CD_USAGE: &str = "cd <job_template|inventory|project|job> <name or id>";
const LS_USAGE: &str = "ls <job_templates|inventories|projects|jobs> [key:value ...] [search]";

// ── cd ──────────────────────────────────────────────────────────────

pub async fn cd(session: &mut Session, _context: &Context, args: &[String]) -> CommandResult {
    let Some((keyword, rest)) = args.split_first() else {
        return Ok(Outcome::Enter(Context::Root));
    };
    if keyword == ".." && rest.is_empty() {
        return Ok(Outcome::Enter(Context::Root));
    }

    let kind = ResourceKind::from_keyword(keyword).ok_or_else(|| ShellError::usage(CD_USAGE))?;
    if rest.is_empty() {
        return Err(ShellError::usage(CD_USAGE));
    }
    let identifier = rest.join(" ");

    let next = match kind {
        ResourceKind::JobTemplates => Context::JobTemplate(
            session
                .catalog
                .job_templates
                .find(&identifier)
                .into_result(&identifier)?
                .clone(),
        ),
        ResourceKind::Inventories => Context::Inventory(
            session
                .catalog
                .inventories
                .find(&identifier)
                .into_result(&identifier)?
                .clone(),
        ),
        // Project names tend to share prefixes, so an exact name settles ties.
        ResourceKind::Projects => Context::Project(
            session
                .catalog
                .projects
                .find_exact_fallback(&identifier)
                .into_result(&identifier)?
                .clone(),
        ),
        ResourceKind::Jobs => Context::Job(find_job(session, &identifier).await?),
        ResourceKind::Hosts | ResourceKind::Groups => return Err(ShellError::usage(CD_USAGE)),
    };
    Ok(Outcome::Enter(next))
}

/// Jobs are not cached: ids go straight to the controller, names are
/// matched against the most recent jobs with a similar name.
async fn find_job(session: &Session, identifier: &str) -> Result<Job, ShellError> {
    if let Some(id) = parse_id(identifier) {
        return Ok(session.platform.fetch::<Job>(id).await?);
    }
    let limit = session.platform.config().job_limit;
    let jobs = session.platform.find_jobs(identifier, limit).await?;
    debug!(identifier, candidates = jobs.len(), "job name lookup");
    let jobs = ResourceCollection::new(jobs);
    Ok(jobs.find(identifier).into_result(identifier)?.clone())
}

// ── ls ──────────────────────────────────────────────────────────────

pub async fn ls(session: &mut Session, _context: &Context, args: &[String]) -> CommandResult {
    let Some((collection, filters)) = args.split_first() else {
        return Err(ShellError::usage(LS_USAGE));
    };
    let kind = collection
        .parse::<ResourceKind>()
        .ok()
        .filter(|k| !matches!(k, ResourceKind::Hosts | ResourceKind::Groups))
        .ok_or_else(|| ShellError::usage(LS_USAGE))?;

    let request = ListRequest::parse(kind, filters)?;
    let limit = session.platform.config().job_limit;

    match kind {
        ResourceKind::JobTemplates => {
            let items: Vec<JobTemplate> = if request.is_unfiltered() {
                session.catalog.job_templates.iter().cloned().collect()
            } else {
                session.platform.retrieve(&request.query(kind, limit)).await?
            };
            let rows: Vec<TemplateRow> = items.iter().map(TemplateRow::from).collect();
            session.console.table(&rows);
        }
        ResourceKind::Projects => {
            let items: Vec<Project> = if request.is_unfiltered() {
                session.catalog.projects.iter().cloned().collect()
            } else {
                session.platform.retrieve(&request.query(kind, limit)).await?
            };
            let rows: Vec<ProjectRow> = items.iter().map(ProjectRow::from).collect();
            session.console.table(&rows);
        }
        ResourceKind::Inventories => {
            let items: Vec<Inventory> = if request.is_unfiltered() {
                session.catalog.inventories.iter().cloned().collect()
            } else {
                session.platform.retrieve(&request.query(kind, limit)).await?
            };
            let rows: Vec<InventoryRow> = items.iter().map(InventoryRow::from).collect();
            session.console.table(&rows);
        }
        ResourceKind::Jobs => {
            let jobs = session.platform.recent_jobs(request.query(kind, limit)).await?;
            let rows: Vec<JobRow> = jobs.iter().map(JobRow::from).collect();
            session.console.table(&rows);
        }
        ResourceKind::Hosts | ResourceKind::Groups => return Err(ShellError::usage(LS_USAGE)),
    }
    Ok(Outcome::Stay)
}

// ── cache / help / exit ─────────────────────────────────────────────

pub async fn cache(session: &mut Session, _context: &Context, _args: &[String]) -> CommandResult {
    session.reload_catalog().await?;
    let catalog = &session.catalog;
    let summary = format!(
        "Cached {} job templates, {} projects, {} inventories",
        catalog.job_templates.len(),
        catalog.projects.len(),
        catalog.inventories.len()
    );
    session.console.success(summary);
    Ok(Outcome::Stay)
}

#[allow(clippy::unused_async)]
pub async fn help(session: &mut Session, context: &Context, _args: &[String]) -> CommandResult {
    let width = registry::command_set(context)
        .map(|spec| spec.name.len())
        .max()
        .unwrap_or(0);
    for spec in registry::command_set(context) {
        session
            .console
            .line(format_args!("  {:<width$}  {}", spec.name, spec.help));
    }
    Ok(Outcome::Stay)
}

#[allow(clippy::unused_async)]
pub async fn exit(_session: &mut Session, _context: &Context, _args: &[String]) -> CommandResult {
    Ok(Outcome::Exit)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use ash_core::{Cataloged, Resource};

    use super::*;
    use crate::shell::commands::testing::{page, run, session};
    use crate::shell::session::Step;

    fn seed(session: &mut Session) {
        session.catalog.job_templates.replace([
            JobTemplate::from_value(json!({ "id": 42, "name": "deploy-web", "playbook": "web.yml" }))
                .unwrap(),
            JobTemplate::from_value(json!({ "id": 43, "name": "deploy-db" })).unwrap(),
        ]);
        Project::collection_mut(&mut session.catalog).replace([
            Project::from_value(json!({ "id": 1, "name": "api-core" })).unwrap(),
            Project::from_value(json!({ "id": 2, "name": "api-edge" })).unwrap(),
            Project::from_value(json!({ "id": 3, "name": "api" })).unwrap(),
            Project::from_value(json!({ "id": 4, "name": "infra-api" })).unwrap(),
            Project::from_value(json!({ "id": 5, "name": "infra-API-tools" })).unwrap(),
        ]);
    }

    // ── cd ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn cd_by_id_enters_the_template() {
        let server = MockServer::start().await;
        let (mut session, _) = session(&server, "");
        seed(&mut session);

        let next = run(&mut session, Context::Root, "cd job_template 42").await;
        assert_eq!(next.id(), Some(42));
        assert!(matches!(next, Context::JobTemplate(_)));
    }

    #[tokio::test]
    async fn cd_to_unknown_id_reports_and_stays() {
        let server = MockServer::start().await;
        let (mut session, out) = session(&server, "");
        seed(&mut session);

        let next = run(&mut session, Context::Root, "cd job_template 99").await;
        assert_eq!(next, Context::Root);
        assert!(out.contents().contains("No job template matches '99'"));
    }

    #[tokio::test]
    async fn cd_by_name_substring_is_case_insensitive() {
        let server = MockServer::start().await;
        let (mut session, _) = session(&server, "");
        seed(&mut session);

        let next = run(&mut session, Context::Root, "cd job_template WEB").await;
        assert_eq!(next.name(), Some("deploy-web"));
    }

    #[tokio::test]
    async fn ambiguous_name_lists_candidates_and_stays() {
        let server = MockServer::start().await;
        let (mut session, out) = session(&server, "");
        seed(&mut session);

        let start = run(&mut session, Context::Root, "cd job_template 43").await;
        let next = run(&mut session, start.clone(), "cd job_template deploy").await;
        assert_eq!(next, start);

        let text = out.contents();
        assert!(text.contains("'deploy' matches 2 job template entries"));
        assert!(text.contains("deploy-web (42)"));
        assert!(text.contains("deploy-db (43)"));
    }

    #[tokio::test]
    async fn project_lookup_falls_back_to_exact_name() {
        let server = MockServer::start().await;
        let (mut session, out) = session(&server, "");
        seed(&mut session);

        // Five substring matches, one exact.
        let next = run(&mut session, Context::Root, "cd project api").await;
        assert_eq!(next.id(), Some(3));

        // Two substring matches, no exact one.
        let next = run(&mut session, Context::Root, "cd project infra").await;
        assert_eq!(next, Context::Root);
        assert!(out.contents().contains("infra-api (4)"));
    }

    #[tokio::test]
    async fn two_partial_project_matches_are_ambiguous() {
        let server = MockServer::start().await;
        let (mut session, out) = session(&server, "");
        Project::collection_mut(&mut session.catalog).replace([
            Project::from_value(json!({ "id": 1, "name": "api-core" })).unwrap(),
            Project::from_value(json!({ "id": 2, "name": "api-edge" })).unwrap(),
        ]);

        let next = run(&mut session, Context::Root, "cd project \"api\"").await;
        assert_eq!(next, Context::Root);
        let text = out.contents();
        assert!(text.contains("api-core (1)"));
        assert!(text.contains("api-edge (2)"));
    }

    #[tokio::test]
    async fn cd_without_arguments_returns_to_root() {
        let server = MockServer::start().await;
        let (mut session, _) = session(&server, "");
        seed(&mut session);

        let inside = run(&mut session, Context::Root, "cd job_template 42").await;
        assert_eq!(run(&mut session, inside.clone(), "cd").await, Context::Root);
        assert_eq!(run(&mut session, inside, "cd ..").await, Context::Root);
    }

    #[tokio::test]
    async fn cd_job_by_id_asks_the_controller() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/jobs/900/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 900, "name": "deploy-web", "status": "running"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (mut session, _) = session(&server, "");
        let next = run(&mut session, Context::Root, "cd job 900").await;
        assert!(matches!(next, Context::Job(ref job) if job.id == 900));
    }

    #[tokio::test]
    async fn cd_with_bad_keyword_prints_usage() {
        let server = MockServer::start().await;
        let (mut session, out) = session(&server, "");

        let next = run(&mut session, Context::Root, "cd host web01").await;
        assert_eq!(next, Context::Root);
        assert!(out.contents().contains("usage: cd <job_template"));
    }

    // ── ls ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn unfiltered_ls_uses_the_catalog() {
        let server = MockServer::start().await;
        let (mut session, out) = session(&server, "");
        seed(&mut session);

        run(&mut session, Context::Root, "ls job_templates").await;
        let text = out.contents();
        assert!(text.contains("deploy-web"));
        assert!(text.contains("web.yml"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn filtered_ls_queries_the_controller() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/job_templates/"))
            .and(query_param("created_by__username__icontains", "alice"))
            .and(query_param("search", "web"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(page(json!([{ "id": 42, "name": "deploy-web" }]))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (mut session, out) = session(&server, "");
        run(&mut session, Context::Root, "ls job_templates created_by:alice web").await;
        assert!(out.contents().contains("deploy-web"));
    }

    #[tokio::test]
    async fn ls_jobs_applies_result_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/jobs/"))
            .and(query_param("order_by", "-finished"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([
                { "id": 3, "name": "c", "status": "failed" },
                { "id": 2, "name": "b", "status": "successful" },
                { "id": 1, "name": "a", "status": "successful" },
            ]))))
            .mount(&server)
            .await;

        let (mut session, out) = session(&server, "");
        run(&mut session, Context::Root, "ls jobs result_limit:2").await;
        let text = out.contents();
        assert!(text.contains("successful"));
        assert!(text.contains("failed"));
        assert!(!text.contains(" a "));
    }

    #[tokio::test]
    async fn bad_filters_are_rejected_without_a_request() {
        let server = MockServer::start().await;
        let (mut session, out) = session(&server, "");

        run(&mut session, Context::Root, "ls jobs result_limit:many").await;
        run(&mut session, Context::Root, "ls projects playbook:site.yml").await;
        run(&mut session, Context::Root, "ls widgets").await;

        let text = out.contents();
        assert!(text.contains("result_limit must be a positive integer"));
        assert!(text.contains("unknown filter 'playbook'"));
        assert!(text.contains("usage: ls"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    // ── cache ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn cache_rebuilds_the_catalog_without_stale_entries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/job_templates/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([
                { "id": 50, "name": "fresh" }
            ]))))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/projects/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]))))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/inventories/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([
                { "id": 7, "name": "prod" }
            ]))))
            .mount(&server)
            .await;

        let (mut session, out) = session(&server, "");
        seed(&mut session);

        run(&mut session, Context::Root, "cache").await;

        let ids: Vec<i64> = session.catalog.job_templates.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![50]);
        assert!(session.catalog.projects.is_empty());
        assert_eq!(session.catalog.inventories.len(), 1);
        assert_eq!(
            session.cache.load::<JobTemplate>().unwrap().unwrap().len(),
            1
        );
        assert_eq!(session.cache.load::<Project>().unwrap(), Some(Vec::new()));
        assert!(out.contents().contains("Cached 1 job templates, 0 projects, 1 inventories"));
    }

    #[tokio::test]
    async fn failed_reload_keeps_the_old_catalog() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/job_templates/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let (mut session, out) = session(&server, "");
        seed(&mut session);

        run(&mut session, Context::Root, "cache").await;
        assert_eq!(session.catalog.job_templates.len(), 2);
        assert!(out.contents().contains("error:"));
    }

    #[tokio::test]
    async fn interrupted_reload_keeps_the_old_catalog() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/job_templates/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(page(json!([])))
                    .set_delay(std::time::Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let (mut session, out) = session(&server, "");
        seed(&mut session);
        let ctx = Context::JobTemplate(session.catalog.job_templates.get(42).unwrap().clone());

        let interrupt = tokio::time::sleep(std::time::Duration::from_millis(50));
        let next = match session.step_until(ctx.clone(), "cache", interrupt).await {
            Step::Continue(next) => next,
            Step::Exit => panic!("'cache' ended the session"),
        };

        assert_eq!(next, ctx);
        assert_eq!(session.catalog.job_templates.len(), 2);
        assert!(out.contents().contains("Interrupted"));
    }

    // ── misc ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn help_lists_the_active_set() {
        let server = MockServer::start().await;
        let (mut session, out) = session(&server, "");
        seed(&mut session);

        let inside = run(&mut session, Context::Root, "cd job_template 42").await;
        run(&mut session, inside, "help").await;
        let text = out.contents();
        assert!(text.contains("launch"));
        assert!(text.contains("cache"));
        assert!(!text.contains("hosts"));
    }

    #[tokio::test]
    async fn exit_ends_the_session_and_blank_lines_do_nothing() {
        let server = MockServer::start().await;
        let (mut session, out) = session(&server, "");

        assert!(matches!(
            session.step(Context::Root, "   ").await,
            Step::Continue(Context::Root)
        ));
        assert!(matches!(session.step(Context::Root, "exit").await, Step::Exit));
        assert!(out.contents().is_empty());
    }

    #[tokio::test]
    async fn unknown_and_out_of_context_commands_keep_the_context() {
        let server = MockServer::start().await;
        let (mut session, out) = session(&server, "");

        assert_eq!(run(&mut session, Context::Root, "launch").await, Context::Root);
        assert_eq!(run(&mut session, Context::Root, "xyzzy").await, Context::Root);
        let text = out.contents();
        assert!(text.contains("'launch' is not available here"));
        assert!(text.contains("Unknown command 'xyzzy'"));
    }
}
