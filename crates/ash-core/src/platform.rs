// ── Platform facade ──
//
// Typed operations over the raw API client: collection fetches decoded
// into resource types, detail refreshes, and the launch/sync/relaunch/
// cancel actions with their expected status codes. Model types stay plain
// data; every call that needs the network goes through here.

use std::io::Write;

use ash_api::transport::{TlsMode, TransportConfig};
use ash_api::{ApiClient, CollectionQuery, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{PlatformConfig, TlsVerification};
use crate::error::CoreError;
use crate::model::{
    Group, Host, Inventory, Job, JobTemplate, Project, Resource, SurveyQuestion, SurveySpec,
};

/// Order used for every job listing; results are reversed afterwards so
/// the newest job prints last.
const JOB_ORDER: &str = "-finished";

/// Consecutive transient poll failures tolerated while following output.
const MAX_POLL_FAILURES: usize = 5;

pub struct Platform {
    client: ApiClient,
    config: PlatformConfig,
}

impl Platform {
    pub fn new(config: PlatformConfig) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let client = ApiClient::new(
            config.url.as_str(),
            &config.api_path,
            &config.token,
            &transport,
        )?;
        Ok(Self { client, config })
    }

    /// Wrap an already-built client (tests point this at a mock server).
    pub fn with_client(client: ApiClient, config: PlatformConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Platform root used for UI deep links.
    pub fn base_url(&self) -> &Url {
        self.client.base_url()
    }

    // ── Collections ──────────────────────────────────────────────────

    /// Run a collection query and decode every record as `R`.
    pub async fn retrieve<R: Resource>(&self, query: &CollectionQuery) -> Result<Vec<R>, CoreError> {
        let records = self.client.retrieve(query).await.inspect_err(|e| {
            warn!(endpoint = query.endpoint(), error = %e, "collection fetch failed");
        })?;
        records.into_iter().map(R::from_value).collect()
    }

    /// Every record of `R`'s type.
    pub async fn list<R: Resource>(&self) -> Result<Vec<R>, CoreError> {
        self.retrieve(&CollectionQuery::new(R::KIND.collection()))
            .await
    }

    /// Most recently finished jobs matching `query`, oldest first.
    pub async fn recent_jobs(&self, query: CollectionQuery) -> Result<Vec<Job>, CoreError> {
        let mut jobs: Vec<Job> = self.retrieve(&query.order_by(JOB_ORDER)).await?;
        jobs.reverse();
        Ok(jobs)
    }

    /// The last `limit` jobs spawned from `template`, oldest first.
    pub async fn template_jobs(
        &self,
        template: &JobTemplate,
        limit: usize,
    ) -> Result<Vec<Job>, CoreError> {
        self.recent_jobs(CollectionQuery::at(template.jobs_endpoint()).limit(limit))
            .await
    }

    /// Jobs whose name contains `name`, newest `limit` only.
    pub async fn find_jobs(&self, name: &str, limit: usize) -> Result<Vec<Job>, CoreError> {
        self.recent_jobs(
            CollectionQuery::new(Job::KIND.collection())
                .filter("name__icontains", name)
                .limit(limit),
        )
        .await
    }

    pub async fn hosts(&self, inventory: &Inventory) -> Result<Vec<Host>, CoreError> {
        self.retrieve(&CollectionQuery::at(format!("{}hosts/", inventory.uri())))
            .await
    }

    pub async fn groups(&self, inventory: &Inventory) -> Result<Vec<Group>, CoreError> {
        self.retrieve(&CollectionQuery::at(format!("{}groups/", inventory.uri())))
            .await
    }

    // ── Details ──────────────────────────────────────────────────────

    /// Fetch one record by id.
    pub async fn fetch<R: Resource>(&self, id: i64) -> Result<R, CoreError> {
        self.fetch_at(&R::KIND.detail_endpoint(id), id).await
    }

    /// Re-fetch `resource` and replace it wholesale. On failure the
    /// resource is left untouched.
    pub async fn refresh<R: Resource>(&self, resource: &mut R) -> Result<(), CoreError> {
        let fresh: R = self.fetch_at(&resource.uri(), resource.id()).await?;
        *resource = fresh;
        Ok(())
    }

    async fn fetch_at<R: Resource>(&self, endpoint: &str, id: i64) -> Result<R, CoreError> {
        let resp = match self.client.get(endpoint).await?.require(StatusCode::OK) {
            Ok(resp) => resp,
            Err(e) if e.is_not_found() => {
                return Err(CoreError::NotFound {
                    kind: R::KIND,
                    identifier: id.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        R::from_value(resp.json::<Value>()?)
    }

    /// Survey questions for `template`, empty when the survey is off.
    pub async fn survey_spec(&self, template: &JobTemplate) -> Result<Vec<SurveyQuestion>, CoreError> {
        if !template.survey_enabled {
            return Ok(Vec::new());
        }
        let spec: SurveySpec = self.client.get_json(&template.survey_endpoint()).await?;
        debug!(template = template.id, questions = spec.spec.len(), "survey loaded");
        Ok(spec.spec)
    }

    // ── Actions ──────────────────────────────────────────────────────

    /// Launch `template`. Only `201 Created` counts as success.
    pub async fn launch(&self, template: &JobTemplate, payload: &Value) -> Result<Job, CoreError> {
        let job = self
            .create_job("launch", &template.launch_endpoint(), payload)
            .await?;
        info!(template = template.id, job = job.id, "job launched");
        Ok(job)
    }

    /// Relaunch `job` with its original parameters.
    pub async fn relaunch(&self, job: &Job) -> Result<Job, CoreError> {
        let new_job = self
            .create_job("relaunch", &job.relaunch_endpoint(), &json!({}))
            .await?;
        info!(from = job.id, job = new_job.id, "job relaunched");
        Ok(new_job)
    }

    /// Start an SCM update of `project`. Returns once the controller has
    /// accepted it (`202`); does not wait for the update to finish.
    pub async fn sync_project(&self, project: &Project) -> Result<(), CoreError> {
        self.accept("sync", &format!("{}update/", project.uri()))
            .await?;
        info!(project = project.id, "project sync started");
        Ok(())
    }

    /// Ask the controller to cancel `job` (`202`).
    pub async fn cancel(&self, job: &Job) -> Result<(), CoreError> {
        self.accept("cancel", &job.cancel_endpoint()).await?;
        info!(job = job.id, "job cancel requested");
        Ok(())
    }

    async fn create_job(&self, action: &str, endpoint: &str, body: &Value) -> Result<Job, CoreError> {
        let resp = self.client.post(endpoint, body).await?;
        if !resp.is(StatusCode::CREATED) {
            warn!(action, status = resp.status().as_u16(), "job not created");
            return Err(CoreError::rejected(action, resp.status().as_u16(), resp.body()));
        }
        Job::from_value(resp.json()?)
    }

    async fn accept(&self, action: &str, endpoint: &str) -> Result<(), CoreError> {
        let resp = self.client.post(endpoint, &json!({})).await?;
        if resp.is(StatusCode::ACCEPTED) {
            Ok(())
        } else {
            warn!(action, status = resp.status().as_u16(), "action not accepted");
            Err(CoreError::rejected(action, resp.status().as_u16(), resp.body()))
        }
    }

    // ── Output ───────────────────────────────────────────────────────

    /// Job output from `start_line` onwards; empty if nothing new.
    pub async fn stdout(&self, job: &Job, start_line: usize) -> Result<String, CoreError> {
        let body: Value = self.client.get_json(&job.stdout_endpoint(start_line)).await?;
        Ok(body
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned())
    }

    /// Stream `job`'s output into `out` until the job finishes.
    ///
    /// Each poll refreshes the job, fetches output past the lines already
    /// written, and sleeps for the configured interval unless the job has
    /// finished. A transient failure skips one poll; after
    /// `MAX_POLL_FAILURES` in a row, or on any other error, the last error
    /// is returned. `job` holds the last state seen either way.
    pub async fn follow_stdout<W: Write + ?Sized>(
        &self,
        job: &mut Job,
        out: &mut W,
    ) -> Result<(), CoreError> {
        let mut offset = 0usize;
        let mut failures = 0usize;
        loop {
            match self.poll_output(job, offset).await {
                Ok(chunk) => {
                    failures = 0;
                    if !chunk.is_empty() {
                        offset += chunk.lines().count();
                        out.write_all(chunk.as_bytes())?;
                        out.flush()?;
                    }
                    if job.is_finished() {
                        debug!(job = job.id, status = %job.status, lines = offset, "job output complete");
                        return Ok(());
                    }
                }
                Err(e) if e.is_transient() && failures + 1 < MAX_POLL_FAILURES => {
                    failures += 1;
                    warn!(job = job.id, failures, error = %e, "output poll failed, retrying");
                }
                Err(e) => return Err(e),
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    async fn poll_output(&self, job: &mut Job, offset: usize) -> Result<String, CoreError> {
        self.refresh(job).await?;
        self.stdout(job, offset).await
    }
}

fn build_transport(config: &PlatformConfig) -> TransportConfig {
    TransportConfig {
        tls: match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        },
        timeout: config.timeout,
    }
}
