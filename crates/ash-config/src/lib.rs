//! Configuration for the ash shell.
//!
//! YAML config file, credential resolution (env + keyring + plaintext),
//! and translation to `ash_core::PlatformConfig`. The binary layers its
//! command-line overrides on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use ash_core::{PlatformConfig, TlsVerification};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no base_url configured (looked in {})", path.display())]
    MissingBaseUrl { path: PathBuf },

    #[error("no API token configured for {host}")]
    NoCredentials { host: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config file ─────────────────────────────────────────────────────

/// Contents of `config.yml`. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Platform root, e.g. `https://aap.example.com`.
    pub base_url: Option<String>,

    /// API token (plaintext; prefer `token_env` or the keyring).
    pub token: Option<String>,

    /// Environment variable holding the API token.
    pub token_env: Option<String>,

    /// API prefix: `/api/v2/`, or `/api/controller/v2/` behind a gateway.
    pub api_path: String,

    /// Per-request timeout in seconds.
    pub timeout: u64,

    /// Skip TLS verification.
    pub insecure: bool,

    /// CA bundle used when `insecure` is off.
    pub ca_cert: Option<PathBuf>,

    /// Seconds between polls while following job output.
    pub poll_interval: u64,

    /// Default number of jobs listed.
    pub job_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            token_env: None,
            api_path: "/api/v2/".into(),
            timeout: 10,
            insecure: true,
            ca_cert: None,
            poll_interval: 5,
            job_limit: 50,
        }
    }
}

/// Written to the terminal when no usable config exists.
pub const CONFIG_EXAMPLE: &str = "\
base_url: https://aap.example.com
token_env: AAP_TOKEN          # or `token: <value>`, or a keyring entry ash/<host>
api_path: /api/controller/v2/ # /api/v2/ for AWX and controller 4.3 and older
";

const ENV_KEYS: &[&str] = &[
    "base_url",
    "token",
    "token_env",
    "api_path",
    "timeout",
    "insecure",
    "ca_cert",
    "poll_interval",
    "job_limit",
];

// ── Paths ───────────────────────────────────────────────────────────

/// Directory holding `config.yml` and the cache database.
pub fn data_dir() -> PathBuf {
    ProjectDirs::from("", "", "ash").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".local");
            p.push("share");
            p.push("ash");
            p
        },
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

pub fn config_path() -> PathBuf {
    data_dir().join("config.yml")
}

pub fn cache_path() -> PathBuf {
    data_dir().join("cache.db")
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load the config from `path` (a missing file yields defaults) with
/// `ASH_*` environment overrides on top.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Yaml::file(path))
        .merge(Env::prefixed("ASH_").only(ENV_KEYS))
        .extract()?;
    Ok(config)
}

impl Config {
    /// The configured base URL, parsed.
    pub fn url(&self, source: &Path) -> Result<Url, ConfigError> {
        let raw = self
            .base_url
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingBaseUrl {
                path: source.to_path_buf(),
            })?;
        Url::parse(raw.trim()).map_err(|e| ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("{raw}: {e}"),
        })
    }

    pub fn tls(&self) -> TlsVerification {
        if self.insecure {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(ref ca) = self.ca_cert {
            TlsVerification::CustomCa(ca.clone())
        } else {
            TlsVerification::SystemDefaults
        }
    }
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve the API token: `token_env` variable, then the system keyring
/// entry `ash/<host>`, then the plaintext `token`.
pub fn resolve_token(config: &Config, url: &Url) -> Result<SecretString, ConfigError> {
    let host = url.host_str().unwrap_or_default().to_owned();

    // 1. Named env var
    if let Some(ref env_name) = config.token_env {
        if let Ok(val) = std::env::var(env_name) {
            if !val.is_empty() {
                return Ok(SecretString::from(val));
            }
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new("ash", &host) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref token) = config.token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials { host })
}

/// Build a `PlatformConfig` from the config file alone.
pub fn to_platform_config(
    config: &Config,
    source: &Path,
    token: SecretString,
) -> Result<PlatformConfig, ConfigError> {
    if config.job_limit == 0 {
        return Err(ConfigError::Validation {
            field: "job_limit".into(),
            reason: "must be at least 1".into(),
        });
    }

    let mut platform = PlatformConfig::new(config.url(source)?, token);
    platform.api_path.clone_from(&config.api_path);
    platform.tls = config.tls();
    platform.timeout = Duration::from_secs(config.timeout);
    platform.poll_interval = Duration::from_secs(config.poll_interval);
    platform.job_limit = config.job_limit;
    Ok(platform)
}
