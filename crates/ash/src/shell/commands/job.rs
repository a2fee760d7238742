// ── Job commands ──

use std::io::Write;

use tracing::debug;

use ash_core::{Context, Job, JobTemplate, Resource, launch};

use crate::error::ShellError;
use crate::shell::registry::{CommandResult, Outcome};
use crate::shell::session::Session;
use crate::shell::view::status_color;

fn selected(context: &Context) -> Result<&Job, ShellError> {
    match context {
        Context::Job(job) => Ok(job),
        _ => Err(ShellError::usage("select a job first")),
    }
}

/// Stream `job`'s output until it finishes or the user hits Ctrl-C, then
/// print its final status. A failed poll is reported, not returned: the
/// job exists either way, so callers always move into it. Returns the job
/// as last seen.
pub(super) async fn follow(session: &mut Session, mut job: Job) -> Job {
    let streamed = {
        let Session {
            platform, console, ..
        } = &mut *session;
        let out = console.writer();
        tokio::select! {
            result = platform.follow_stdout(&mut job, out) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        }
    };

    match streamed {
        Some(Ok(())) => {
            let status = session
                .console
                .paint(&job.status.to_string(), status_color(job.status));
            session.console.line(format_args!("Job {} {status}", job.id));
        }
        Some(Err(e)) => {
            session.report(&ShellError::from(e));
            session.console.warn(format_args!(
                "Lost track of job {}; run `output -f` to resume",
                job.id
            ));
        }
        None => {
            debug!(job = job.id, "stopped following output");
            session.console.warn(format_args!(
                "Stopped following job {}; it keeps running on the controller",
                job.id
            ));
        }
    }
    job
}

/// The job's template, from the catalog when cached.
async fn template_of(session: &Session, job: &Job) -> Result<JobTemplate, ShellError> {
    let id = job
        .job_template
        .ok_or_else(|| ShellError::usage(format!("job {} has no job template", job.id)))?;
    if let Some(template) = session.catalog.job_templates.get(id) {
        return Ok(template.clone());
    }
    Ok(session.platform.fetch::<JobTemplate>(id).await?)
}

pub async fn retry(session: &mut Session, context: &Context, _args: &[String]) -> CommandResult {
    let job = selected(context)?;
    let new_job = session.platform.relaunch(job).await?;
    session
        .console
        .success(format_args!("Job {} relaunched as {}", job.id, new_job.id));
    let new_job = follow(session, new_job).await;
    Ok(Outcome::Enter(Context::Job(new_job)))
}

/// Carry this job's launch-time values over as prefills on its template.
pub async fn reuse(session: &mut Session, context: &Context, _args: &[String]) -> CommandResult {
    let job = selected(context)?;
    let template = template_of(session, job).await?;
    let prefills = launch::prefills_from(job.data(), &template.asked_variables());

    if prefills.is_empty() {
        session
            .console
            .line(format_args!("Job {} set nothing {} asks for", job.id, template.name));
    } else {
        let names: Vec<&str> = prefills.keys().map(String::as_str).collect();
        session
            .console
            .success(format_args!("Prefilled {} from job {}", names.join(", "), job.id));
    }
    session.prefills.insert(template.id, prefills);
    Ok(Outcome::Enter(Context::JobTemplate(template)))
}

pub async fn template(session: &mut Session, context: &Context, _args: &[String]) -> CommandResult {
    let job = selected(context)?;
    let template = template_of(session, job).await?;
    Ok(Outcome::Enter(Context::JobTemplate(template)))
}

pub async fn cancel(session: &mut Session, context: &Context, _args: &[String]) -> CommandResult {
    let job = selected(context)?;
    if !session
        .prompter
        .confirm(&format!("Cancel job {}?", job.id))?
    {
        session.console.warn("Cancel aborted");
        return Ok(Outcome::Stay);
    }
    session.platform.cancel(job).await?;
    session
        .console
        .success(format_args!("Cancel requested for job {}", job.id));
    Ok(Outcome::Stay)
}

/// `output` prints what the job has written so far; `output -f` follows it
/// to the end and refreshes the selection.
pub async fn output(session: &mut Session, context: &Context, args: &[String]) -> CommandResult {
    let job = selected(context)?;
    let follow_flag = match args {
        [] => false,
        [flag] if flag == "-f" || flag == "--follow" => true,
        _ => return Err(ShellError::usage("output [-f|--follow]")),
    };

    if follow_flag {
        let job = follow(session, job.clone()).await;
        return Ok(Outcome::Enter(Context::Job(job)));
    }

    let text = session.platform.stdout(job, 0).await?;
    let out = session.console.writer();
    out.write_all(text.as_bytes())?;
    if !text.is_empty() && !text.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(Outcome::Stay)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use ash_core::JobStatus;

    use super::*;
    use crate::shell::commands::testing::{run, session};

    fn job(extra: Value) -> Context {
        let mut data = json!({
            "id": 700, "name": "deploy-web", "status": "successful", "job_template": 42
        });
        data.as_object_mut()
            .unwrap()
            .extend(extra.as_object().unwrap().clone());
        Context::Job(Job::from_value(data).unwrap())
    }

    fn template_json() -> Value {
        json!({
            "id": 42,
            "name": "deploy-web",
            "ask_limit_on_launch": true,
            "ask_verbosity_on_launch": true,
            "ask_tags_on_launch": true,
        })
    }

    // ── retry ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn retry_follows_the_new_job() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/jobs/700/relaunch/"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 701, "name": "deploy-web", "status": "pending"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/jobs/701/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 701, "name": "deploy-web", "status": "failed",
                "finished": "2024-05-01T12:00:00Z"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/jobs/701/stdout/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "content": "fatal: boom\n" })),
            )
            .mount(&server)
            .await;

        let (mut session, out) = session(&server, "");
        let next = run(&mut session, job(json!({})), "retry").await;

        match next {
            Context::Job(job) => {
                assert_eq!(job.id, 701);
                assert_eq!(job.status, JobStatus::Failed);
            }
            other => panic!("expected a job context, got {other:?}"),
        }
        let text = out.contents();
        assert!(text.contains("relaunched as 701"));
        assert!(text.contains("fatal: boom"));
        assert!(text.contains("Job 701 failed"));
    }

    #[tokio::test]
    async fn failed_relaunch_keeps_the_job() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/jobs/700/relaunch/"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_json(json!({ "detail": "You do not have permission" })),
            )
            .mount(&server)
            .await;

        let (mut session, out) = session(&server, "");
        let start = job(json!({}));
        let next = run(&mut session, start.clone(), "retry").await;

        assert_eq!(next, start);
        assert!(out.contents().contains("You do not have permission"));
    }

    #[tokio::test]
    async fn retry_enters_the_new_job_when_its_output_is_gone() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/jobs/700/relaunch/"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 701, "name": "deploy-web", "status": "pending"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/jobs/701/"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Not found." })))
            .expect(1)
            .mount(&server)
            .await;

        let (mut session, out) = session(&server, "");
        let next = run(&mut session, job(json!({})), "retry").await;

        match next {
            Context::Job(job) => assert_eq!(job.id, 701),
            other => panic!("expected a job context, got {other:?}"),
        }
        let text = out.contents();
        assert!(text.contains("relaunched as 701"), "{text}");
        assert!(text.contains("Lost track of job 701"), "{text}");
    }

    // ── reuse / template ────────────────────────────────────────────

    #[tokio::test]
    async fn reuse_prefills_the_template_from_the_job() {
        let server = MockServer::start().await;
        let (mut session, _) = session(&server, "");
        session
            .catalog
            .job_templates
            .replace([JobTemplate::from_value(template_json()).unwrap()]);

        let start = job(json!({ "limit": "db*", "verbosity": 3, "job_tags": "" }));
        let next = run(&mut session, start, "reuse").await;

        assert_eq!(next.id(), Some(42));
        assert!(matches!(next, Context::JobTemplate(_)));
        let prefills = &session.prefills[&42];
        assert_eq!(prefills.get("limit").map(String::as_str), Some("db*"));
        assert_eq!(prefills.get("verbosity").map(String::as_str), Some("3"));
        assert!(!prefills.contains_key("tags"));
    }

    #[tokio::test]
    async fn template_fetches_when_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/job_templates/42/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(template_json()))
            .expect(1)
            .mount(&server)
            .await;

        let (mut session, _) = session(&server, "");
        let next = run(&mut session, job(json!({})), "template").await;
        assert_eq!(next.name(), Some("deploy-web"));
    }

    #[tokio::test]
    async fn template_of_an_ad_hoc_job_is_a_usage_error() {
        let server = MockServer::start().await;
        let (mut session, out) = session(&server, "");
        let start = job(json!({ "job_template": null }));

        let next = run(&mut session, start.clone(), "template").await;
        assert_eq!(next, start);
        assert!(out.contents().contains("job 700 has no job template"));
    }

    // ── cancel ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn cancel_needs_confirmation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/jobs/700/cancel/"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let (mut session, out) = session(&server, "no\nY\n");
        let ctx = job(json!({ "status": "running" }));
        let ctx = run(&mut session, ctx, "cancel").await;
        run(&mut session, ctx, "cancel").await;

        let text = out.contents();
        assert!(text.contains("Cancel aborted"));
        assert!(text.contains("Cancel requested for job 700"));
    }

    #[tokio::test]
    async fn cancel_of_a_finished_job_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/jobs/700/cancel/"))
            .respond_with(ResponseTemplate::new(405).set_body_json(json!({
                "error": "Method not allowed"
            })))
            .mount(&server)
            .await;

        let (mut session, out) = session(&server, "yes\n");
        run(&mut session, job(json!({})), "cancel").await;
        assert!(
            out.contents()
                .contains("cancel rejected by controller (HTTP 405)")
        );
    }

    // ── output ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn output_prints_everything_so_far() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/jobs/700/stdout/"))
            .and(query_param("start_line", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": "PLAY [web]\nok: [web01]"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (mut session, out) = session(&server, "");
        run(&mut session, job(json!({})), "output").await;
        assert_eq!(out.contents(), "PLAY [web]\nok: [web01]\n");
    }

    #[tokio::test]
    async fn output_rejects_unknown_flags() {
        let server = MockServer::start().await;
        let (mut session, out) = session(&server, "");
        run(&mut session, job(json!({})), "output --tail").await;
        assert!(out.contents().contains("usage: output [-f|--follow]"));
    }

    #[tokio::test]
    async fn output_follow_polls_until_finished() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/jobs/700/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 700, "name": "deploy-web", "status": "running"
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/jobs/700/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 700, "name": "deploy-web", "status": "successful",
                "finished": "2024-05-01T12:00:00Z"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/jobs/700/stdout/"))
            .and(query_param("start_line", "0"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "content": "line one\n" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/jobs/700/stdout/"))
            .and(query_param("start_line", "1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "content": "line two\n" })),
            )
            .mount(&server)
            .await;

        let (mut session, out) = session(&server, "");
        let next = run(&mut session, job(json!({ "status": "running" })), "output -f").await;

        assert!(matches!(next, Context::Job(ref j) if j.status == JobStatus::Successful));
        let text = out.contents();
        assert!(text.contains("line one\nline two\n"));
        assert!(text.contains("Job 700 successful"));
    }
}
