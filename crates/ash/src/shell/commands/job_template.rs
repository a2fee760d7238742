// ── Job template commands ──

use serde_json::Value;

use ash_core::launch::{self, LaunchParam, ParamKind};
use ash_core::{Context, JobTemplate, LaunchPayload, QuestionKind, Resource, SurveyQuestion};

use super::job::follow;
use crate::error::ShellError;
use crate::shell::registry::{CommandResult, Outcome};
use crate::shell::session::Session;
use crate::shell::view::JobRow;

fn selected(context: &Context) -> Result<&JobTemplate, ShellError> {
    match context {
        Context::JobTemplate(jt) => Ok(jt),
        _ => Err(ShellError::usage("select a job template first")),
    }
}

// ── launch ──────────────────────────────────────────────────────────

/// Prompt for every asked variable and survey question, confirm, launch,
/// then move into the new job and follow its output.
pub async fn launch(session: &mut Session, context: &Context, _args: &[String]) -> CommandResult {
    let template = selected(context)?;
    let prefills = session
        .prefills
        .get(&template.id)
        .cloned()
        .unwrap_or_default();

    let mut payload = LaunchPayload::default();
    for variable in template.asked_variables() {
        let param = launch::param_for(&variable);
        let default = launch::prompt_default(
            &param,
            prefills.get(&variable).map(String::as_str),
            template.data(),
        );
        if let Some(value) = ask_param(session, &param, default.as_deref())? {
            payload.set(&param, value);
        }
    }

    for question in session.platform.survey_spec(template).await? {
        if let Some(value) = ask_question(session, &question)? {
            payload.survey_answer(&question.variable, value);
        }
    }

    let body = payload.to_value();
    if !payload.is_empty() {
        session.console.line("Launch parameters:");
        session
            .console
            .line(serde_json::to_string_pretty(&body).unwrap_or_default());
    }
    if !session
        .prompter
        .confirm(&format!("Launch '{}'?", template.name))?
    {
        session.console.warn("Launch cancelled");
        return Ok(Outcome::Stay);
    }

    let job = session.platform.launch(template, &body).await?;
    session
        .console
        .success(format_args!("Job {} launched", job.id));
    let job = follow(session, job).await;
    Ok(Outcome::Enter(Context::Job(job)))
}

/// Ask for one launch parameter. `None` when the answer (after defaults)
/// is empty; invalid answers are reported and asked again.
fn ask_param(
    session: &mut Session,
    param: &LaunchParam<'_>,
    default: Option<&str>,
) -> Result<Option<Value>, ShellError> {
    loop {
        let answer = match param.kind {
            ParamKind::Choice(options) => {
                let items: Vec<String> = options.iter().map(ToString::to_string).collect();
                let preselected = default.and_then(|d| options.iter().position(|o| *o == d));
                let index = session
                    .prompter
                    .select(param.variable, &items, preselected)?;
                items.get(index).cloned().unwrap_or_default()
            }
            ParamKind::IdList => session
                .prompter
                .input(&format!("{} (comma-separated ids)", param.variable), default)?,
            _ => session.prompter.input(param.variable, default)?,
        };

        if answer.trim().is_empty() {
            return Ok(None);
        }
        match launch::parse_answer(param, &answer) {
            Ok(value) => return Ok(Some(value)),
            Err(e) => session.console.error(e),
        }
    }
}

/// Ask one survey question. Required questions are repeated until they get
/// an answer.
fn ask_question(
    session: &mut Session,
    question: &SurveyQuestion,
) -> Result<Option<Value>, ShellError> {
    loop {
        let value = match question.kind {
            QuestionKind::MultipleChoice => {
                let preselected = question
                    .default_text()
                    .and_then(|d| question.choices.iter().position(|c| *c == d));
                let index = session
                    .prompter
                    .select(question.label(), &question.choices, preselected)?;
                question.choices.get(index).cloned().map(Value::String)
            }
            QuestionKind::MultiSelect => {
                let preset = question.default_choices();
                let defaults: Vec<bool> = question
                    .choices
                    .iter()
                    .map(|c| preset.contains(c))
                    .collect();
                let picked = session
                    .prompter
                    .multi_select(question.label(), &question.choices, &defaults)?;
                let values: Vec<Value> = picked
                    .into_iter()
                    .filter_map(|i| question.choices.get(i).cloned())
                    .map(Value::String)
                    .collect();
                (!values.is_empty()).then_some(Value::Array(values))
            }
            QuestionKind::Password => {
                let text = session.prompter.secret(question.label())?;
                let text = if text.is_empty() {
                    question.default_text().unwrap_or_default()
                } else {
                    text
                };
                (!text.is_empty()).then_some(Value::String(text))
            }
            QuestionKind::Text
            | QuestionKind::Textarea
            | QuestionKind::Integer
            | QuestionKind::Float => {
                let text = session
                    .prompter
                    .input(question.label(), question.default_text().as_deref())?;
                if text.trim().is_empty() {
                    None
                } else {
                    match launch::survey_value(question, &text) {
                        Ok(value) => Some(value),
                        Err(e) => {
                            session.console.error(e);
                            continue;
                        }
                    }
                }
            }
        };

        match value {
            Some(value) => return Ok(Some(value)),
            None if question.required => session
                .console
                .warn(format_args!("'{}' is required", question.label())),
            None => return Ok(None),
        }
    }
}

// ── set ─────────────────────────────────────────────────────────────

/// `set` lists prefills, `set <variable>` clears one, `set <variable>
/// <value...>` stores one.
#[allow(clippy::unused_async)]
pub async fn set(session: &mut Session, context: &Context, args: &[String]) -> CommandResult {
    let template = selected(context)?;
    let asked = template.asked_variables();

    let Some((variable, value)) = args.split_first() else {
        match session.prefills.get(&template.id).filter(|p| !p.is_empty()) {
            Some(prefills) => {
                let fields: Vec<(&str, String)> = prefills
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.clone()))
                    .collect();
                session.console.fields(&fields);
            }
            None => session.console.line("No prefills set"),
        }
        return Ok(Outcome::Stay);
    };

    if !asked.contains(variable) {
        let expected = if asked.is_empty() {
            "this template asks for nothing on launch".to_owned()
        } else {
            format!("expected one of: {}", asked.join(", "))
        };
        return Err(ShellError::usage(format!(
            "set <variable> [value]; '{variable}' is not asked on launch, {expected}"
        )));
    }

    let prefills = session.prefills.entry(template.id).or_default();
    if value.is_empty() {
        prefills.remove(variable);
        session.console.line(format_args!("Cleared {variable}"));
    } else {
        let value = value.join(" ");
        launch::parse_answer(&launch::param_for(variable), &value)?;
        prefills.insert(variable.clone(), value);
        session.console.success(format_args!("{variable} prefilled"));
    }
    Ok(Outcome::Stay)
}

// ── jobs ────────────────────────────────────────────────────────────

pub async fn jobs(session: &mut Session, context: &Context, _args: &[String]) -> CommandResult {
    let template = selected(context)?;
    let limit = session.platform.config().job_limit;
    let jobs = session.platform.template_jobs(template, limit).await?;
    let rows: Vec<JobRow> = jobs.iter().map(JobRow::from).collect();
    session.console.table(&rows);
    Ok(Outcome::Stay)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use ash_core::JobStatus;

    use super::*;
    use crate::shell::commands::testing::{page, run, session};

    fn template(extra: Value) -> Context {
        let mut data = json!({ "id": 42, "name": "deploy-web", "project": 8 });
        data.as_object_mut()
            .unwrap()
            .extend(extra.as_object().unwrap().clone());
        Context::JobTemplate(JobTemplate::from_value(data).unwrap())
    }

    async fn mount_finished_job(server: &MockServer, id: i64) {
        Mock::given(method("GET"))
            .and(path(format!("/api/v2/jobs/{id}/")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "name": "deploy-web",
                "status": "successful",
                "finished": "2024-05-01T12:05:00Z",
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/api/v2/jobs/{id}/stdout/")))
            .and(query_param("start_line", "0"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "content": "PLAY RECAP\n" })),
            )
            .mount(server)
            .await;
    }

    // ── launch ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn launch_with_default_limit_enters_the_new_job() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/job_templates/42/launch/"))
            .and(body_json(json!({ "limit": "all" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 900, "name": "deploy-web", "status": "pending"
            })))
            .expect(1)
            .mount(&server)
            .await;
        mount_finished_job(&server, 900).await;

        // Empty answer takes the default, then confirm.
        let (mut session, out) = session(&server, "\nyes\n");
        let ctx = template(json!({ "ask_limit_on_launch": true, "ask_tags_on_launch": false }));

        let next = run(&mut session, ctx, "launch").await;
        match next {
            Context::Job(job) => {
                assert_eq!(job.id, 900);
                assert_eq!(job.status, JobStatus::Successful);
            }
            other => panic!("expected a job context, got {other:?}"),
        }
        assert!(out.contents().contains("PLAY RECAP"));
    }

    #[tokio::test]
    async fn lost_output_still_enters_the_launched_job() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/job_templates/42/launch/"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 900, "name": "deploy-web", "status": "pending"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/jobs/900/"))
            .respond_with(
                ResponseTemplate::new(502).set_body_json(json!({ "detail": "bad gateway" })),
            )
            .mount(&server)
            .await;

        let (mut session, out) = session(&server, "y\n");
        let ctx = template(json!({ "ask_limit_on_launch": false, "ask_tags_on_launch": false }));

        let next = run(&mut session, ctx, "launch").await;
        match next {
            Context::Job(job) => {
                assert_eq!(job.id, 900);
                assert_eq!(job.status, JobStatus::Pending);
            }
            other => panic!("expected a job context, got {other:?}"),
        }
        let text = out.contents();
        assert!(text.contains("Job 900 launched"), "{text}");
        assert!(text.contains("HTTP 502: bad gateway"), "{text}");
        assert!(text.contains("Lost track of job 900"), "{text}");
    }

    #[tokio::test]
    async fn declined_launch_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let (mut session, out) = session(&server, "webservers\nnope\n");
        let ctx = template(json!({ "ask_limit_on_launch": true }));

        let next = run(&mut session, ctx.clone(), "launch").await;
        assert_eq!(next, ctx);
        assert!(out.contents().contains("Launch cancelled"));
    }

    #[tokio::test]
    async fn interrupted_prompt_keeps_the_context() {
        let server = MockServer::start().await;
        let (mut session, out) = session(&server, "");
        let ctx = template(json!({ "ask_limit_on_launch": true }));

        let next = run(&mut session, ctx.clone(), "launch").await;
        assert_eq!(next, ctx);
        assert!(out.contents().contains("Interrupted"));
    }

    #[tokio::test]
    async fn rejected_launch_stays_on_the_template() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/job_templates/42/launch/"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({ "inventory": ["Job Template 'inventory' is missing."] })),
            )
            .mount(&server)
            .await;

        let (mut session, out) = session(&server, "y\n");
        let ctx = template(json!({}));

        let next = run(&mut session, ctx.clone(), "launch").await;
        assert_eq!(next, ctx);
        assert!(
            out.contents()
                .contains("launch rejected by controller (HTTP 400)")
        );
    }

    #[tokio::test]
    async fn survey_answers_and_typed_params_build_the_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/job_templates/42/survey_spec/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "spec": [
                    { "question_name": "Release", "variable": "release", "type": "text", "required": true },
                    { "question_name": "Replicas", "variable": "replicas", "type": "integer", "min": 1, "max": 9 },
                    { "question_name": "Region", "variable": "region", "type": "multiplechoice",
                      "choices": "eu\nus", "default": "eu" },
                    { "question_name": "Zones", "variable": "zones", "type": "multiselect",
                      "choices": ["a", "b", "c"] },
                    { "question_name": "Secret", "variable": "secret", "type": "password" }
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v2/job_templates/42/launch/"))
            .and(body_json(json!({
                "job_type": "check",
                "verbosity": 2,
                "credentials": [3, 4],
                "extra_vars": {
                    "env": "prod",
                    "release": "1.2",
                    "replicas": 3,
                    "region": "us",
                    "zones": ["a", "c"],
                    "secret": "hunter2"
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 901, "name": "deploy-web", "status": "pending"
            })))
            .expect(1)
            .mount(&server)
            .await;
        mount_finished_job(&server, 901).await;

        // Asked variables come sorted: credential, job_type, variables,
        // verbosity. The required survey question is left blank once.
        let answers = "3, 4\ncheck\nenv: prod\nloud\n2\n\n1.2\n12\n3\nus\na,c\nhunter2\nyes\n";
        let (mut session, out) = session(&server, answers);
        let ctx = template(json!({
            "survey_enabled": true,
            "ask_credential_on_launch": true,
            "ask_job_type_on_launch": true,
            "ask_variables_on_launch": true,
            "ask_verbosity_on_launch": true,
        }));

        let next = run(&mut session, ctx, "launch").await;
        assert!(matches!(next, Context::Job(ref job) if job.id == 901));
        let text = out.contents();
        assert!(text.contains("'Release' is required"));
        assert!(text.contains("verbosity expects an integer"));
        assert!(text.contains("replicas out of range"));
    }

    #[tokio::test]
    async fn prefills_become_prompt_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/job_templates/42/launch/"))
            .and(body_json(json!({ "limit": "db*" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 902, "name": "deploy-web", "status": "pending"
            })))
            .expect(1)
            .mount(&server)
            .await;
        mount_finished_job(&server, 902).await;

        let (mut session, _) = session(&server, "\ny\n");
        let ctx = template(json!({ "ask_limit_on_launch": true, "limit": "web*" }));

        let ctx = run(&mut session, ctx, "set limit db*").await;
        let next = run(&mut session, ctx, "launch").await;
        assert!(matches!(next, Context::Job(_)));
    }

    // ── set ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn set_lists_stores_and_clears() {
        let server = MockServer::start().await;
        let (mut session, out) = session(&server, "");
        let ctx = template(json!({ "ask_limit_on_launch": true, "ask_verbosity_on_launch": true }));

        let ctx = run(&mut session, ctx, "set").await;
        let ctx = run(&mut session, ctx, "set limit web01 web02").await;
        let ctx = run(&mut session, ctx, "set verbosity nine").await;
        let ctx = run(&mut session, ctx, "set forks 5").await;
        assert_eq!(
            session.prefills[&42].get("limit").map(String::as_str),
            Some("web01 web02")
        );
        assert!(!session.prefills[&42].contains_key("verbosity"));

        let ctx = run(&mut session, ctx, "set limit").await;
        run(&mut session, ctx, "set").await;
        assert!(session.prefills[&42].is_empty());

        let text = out.contents();
        assert!(text.contains("No prefills set"));
        assert!(text.contains("verbosity expects an integer"));
        assert!(text.contains("'forks' is not asked on launch"));
        assert!(text.contains("Cleared limit"));
    }

    // ── jobs ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn jobs_lists_recent_runs_oldest_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/job_templates/42/jobs/"))
            .and(query_param("order_by", "-finished"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([
                { "id": 12, "name": "newest", "status": "failed" },
                { "id": 11, "name": "oldest", "status": "successful" },
            ]))))
            .expect(1)
            .mount(&server)
            .await;

        let (mut session, out) = session(&server, "");
        run(&mut session, template(json!({})), "jobs").await;

        let text = out.contents();
        let oldest = text.find("oldest").unwrap();
        let newest = text.find("newest").unwrap();
        assert!(oldest < newest);
    }
}
