// Controller HTTP client
//
// Wraps `reqwest::Client` with base URL + API path construction. Every
// endpoint is expressed relative to the API root (e.g. `jobs/42/`), so the
// same code runs against `/api/v2/` and `/api/controller/v2/` deployments.

use serde::Serialize;
use serde::de::DeserializeOwned;
use secrecy::SecretString;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::response::ApiResponse;
use crate::transport::TransportConfig;

/// API path used by AWX and controller releases before the gateway split.
pub const DEFAULT_API_PATH: &str = "/api/v2/";

/// Raw HTTP client for the automation controller API.
///
/// The verbs return an [`ApiResponse`] for every status code; only
/// connection-level failures (DNS, TLS, timeout) produce an `Err`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    api_path: String,
    api_url: Url,
}

impl ApiClient {
    /// Create a client authenticating with a bearer `token`.
    ///
    /// `base_url` is the platform root (e.g. `https://aap.example.com`),
    /// `api_path` the API prefix under it (e.g. `/api/controller/v2/`).
    pub fn new(
        base_url: &str,
        api_path: &str,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client(token)?;
        Self::with_client(http, base_url, api_path)
    }

    /// Wrap a pre-built `reqwest::Client` (caller manages auth headers).
    pub fn with_client(http: reqwest::Client, base_url: &str, api_path: &str) -> Result<Self, Error> {
        let base_url = normalize_base_url(base_url)?;
        let api_path = normalize_api_path(api_path);
        let api_url = base_url.join(api_path.trim_start_matches('/'))?;

        Ok(Self {
            http,
            base_url,
            api_path,
            api_url,
        })
    }

    /// The platform root, always ending with `/`. Used for UI deep links.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The normalized API prefix (leading and trailing `/`).
    pub fn api_path(&self) -> &str {
        &self.api_path
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Resolve an endpoint relative to the API root.
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, Error> {
        Ok(self.api_url.join(endpoint.trim_start_matches('/'))?)
    }

    /// Turn a server-provided link (absolute URL or absolute path) into an
    /// endpoint relative to the API root by stripping the API prefix.
    pub fn relative_endpoint(&self, link: &str) -> String {
        let link = match Url::parse(link) {
            Ok(abs) => match abs.query() {
                Some(query) => format!("{}?{query}", abs.path()),
                None => abs.path().to_owned(),
            },
            Err(_) => link.to_owned(),
        };

        match link.find(&self.api_path) {
            Some(idx) => link[idx + self.api_path.len()..].to_owned(),
            None => link.trim_start_matches('/').to_owned(),
        }
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request. HTTP error statuses are returned, not raised.
    pub async fn get(&self, endpoint: &str) -> Result<ApiResponse, Error> {
        let url = self.endpoint_url(endpoint)?;
        self.get_url(url).await
    }

    pub(crate) async fn get_url(&self, url: Url) -> Result<ApiResponse, Error> {
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        let resp = ApiResponse::read(resp).await?;
        debug!(status = resp.status().as_u16(), "GET complete");
        Ok(resp)
    }

    /// Send a POST request with a JSON body.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<ApiResponse, Error> {
        let url = self.endpoint_url(endpoint)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        let resp = ApiResponse::read(resp).await?;
        debug!(status = resp.status().as_u16(), "POST complete");
        Ok(resp)
    }

    /// GET an endpoint that must answer `200 OK` and decode its body.
    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, Error> {
        self.get(endpoint)
            .await?
            .require(reqwest::StatusCode::OK)?
            .json()
    }
}

fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn normalize_api_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".into()
    } else {
        format!("/{trimmed}/")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str, api_path: &str) -> ApiClient {
        ApiClient::with_client(reqwest::Client::new(), base, api_path).unwrap()
    }

    #[test]
    fn endpoint_url_joins_api_path() {
        let c = client("https://aap.example.com", "/api/controller/v2/");
        assert_eq!(
            c.endpoint_url("jobs/42/").unwrap().as_str(),
            "https://aap.example.com/api/controller/v2/jobs/42/"
        );
    }

    #[test]
    fn api_path_without_slashes_is_normalized() {
        let c = client("https://aap.example.com/", "api/v2");
        assert_eq!(c.api_path(), "/api/v2/");
        assert_eq!(
            c.endpoint_url("/projects/").unwrap().as_str(),
            "https://aap.example.com/api/v2/projects/"
        );
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let c = client("https://aap.example.com/tower", DEFAULT_API_PATH);
        assert_eq!(c.base_url().as_str(), "https://aap.example.com/tower/");
        assert_eq!(
            c.endpoint_url("inventories/").unwrap().as_str(),
            "https://aap.example.com/tower/api/v2/inventories/"
        );
    }

    #[test]
    fn relative_endpoint_strips_api_prefix_from_path() {
        let c = client("https://aap.example.com", DEFAULT_API_PATH);
        assert_eq!(
            c.relative_endpoint("/api/v2/jobs/?page=2&page_size=100"),
            "jobs/?page=2&page_size=100"
        );
    }

    #[test]
    fn relative_endpoint_accepts_absolute_links() {
        let c = client("https://aap.example.com", "/api/controller/v2/");
        assert_eq!(
            c.relative_endpoint(
                "https://aap.example.com/api/controller/v2/job_templates/?page=3&page_size=100"
            ),
            "job_templates/?page=3&page_size=100"
        );
    }
}
