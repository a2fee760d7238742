// ── Runtime connection configuration ──
//
// Describes how to reach a controller. Carries the token and connection
// tuning but never touches disk: the binary builds a `PlatformConfig` from
// its config file and flags and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. Self-signed controllers are the norm.
    #[default]
    DangerAcceptInvalid,
}

/// Configuration for talking to one controller.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Platform root, e.g. `https://aap.example.com`.
    pub url: Url,
    /// API prefix under the root, e.g. `/api/controller/v2/`.
    pub api_path: String,
    pub token: SecretString,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Delay between polls while following job output.
    pub poll_interval: Duration,
    /// Default ceiling for job listings.
    pub job_limit: usize,
}

impl PlatformConfig {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
    pub const DEFAULT_JOB_LIMIT: usize = 50;

    /// Defaults for everything but the address and token.
    pub fn new(url: Url, token: SecretString) -> Self {
        Self {
            url,
            api_path: ash_api::DEFAULT_API_PATH.into(),
            token,
            tls: TlsVerification::default(),
            timeout: ash_api::transport::DEFAULT_TIMEOUT,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            job_limit: Self::DEFAULT_JOB_LIMIT,
        }
    }
}
