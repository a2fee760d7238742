// ── Core error types ──
//
// User-facing errors from ash-core. Consumers never see raw reqwest
// errors or JSON decode failures: the `From<ash_api::Error>` impl turns
// transport-layer failures into domain variants the shell can report.

use thiserror::Error;

use crate::model::ResourceKind;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Controller request timed out")]
    Timeout,

    // ── Lookup errors ────────────────────────────────────────────────
    #[error("No {kind} matches '{identifier}'")]
    NotFound {
        kind: ResourceKind,
        identifier: String,
    },

    #[error("'{identifier}' matches {} {kind} entries", candidates.len())]
    Ambiguous {
        kind: ResourceKind,
        identifier: String,
        /// Display labels of every match, `name (id)`.
        candidates: Vec<String>,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("{action} rejected by controller (HTTP {status}): {message}")]
    Rejected {
        action: String,
        status: u16,
        message: String,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Malformed {kind} record: {message}")]
    Model { kind: ResourceKind, message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Local storage ────────────────────────────────────────────────
    #[error("Cache error: {0}")]
    Cache(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    /// Build a `Rejected` error from an unexpected controller response,
    /// preferring the `detail` field of a JSON body when present.
    pub(crate) fn rejected(action: impl Into<String>, status: u16, body: &str) -> Self {
        Self::Rejected {
            action: action.into(),
            status,
            message: detail_message(body),
        }
    }

    /// A failure worth retrying on the next poll: timeouts, dropped
    /// connections, throttling and server-side errors.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::ConnectionFailed { .. } => true,
            Self::Api {
                status: Some(status),
                ..
            } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<ash_api::Error> for CoreError {
    fn from(err: ash_api::Error) -> Self {
        let status = err.status();
        match err {
            ash_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status,
                    }
                }
            }
            ash_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ash_api::Error::Tls(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {reason}"),
            },
            ash_api::Error::InvalidToken { message } => CoreError::AuthenticationFailed { message },
            ash_api::Error::Http { status, body } if status == 401 || status == 403 => {
                CoreError::AuthenticationFailed {
                    message: format!("HTTP {status}: {}", detail_message(&body)),
                }
            }
            ash_api::Error::Http { status, body } => CoreError::Api {
                message: format!("HTTP {status}: {}", detail_message(&body)),
                status: Some(status),
            },
            ash_api::Error::Deserialization { message, .. } => CoreError::Api {
                message: format!("Unexpected response: {message}"),
                status: None,
            },
        }
    }
}

/// Pull a human-readable message out of a controller error body.
///
/// The controller answers errors with `{"detail": "..."}`; field-level
/// validation failures come back as `{"field": ["msg", ...]}`.
fn detail_message(body: &str) -> String {
    let trimmed = body.trim();
    let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) else {
        return truncate(trimmed);
    };

    if let Some(detail) = value.get("detail").and_then(serde_json::Value::as_str) {
        return detail.to_owned();
    }

    match value.as_object() {
        Some(fields) if !fields.is_empty() => fields
            .iter()
            .map(|(field, msg)| match msg {
                serde_json::Value::Array(items) => {
                    let joined: Vec<String> = items
                        .iter()
                        .map(|i| i.as_str().map_or_else(|| i.to_string(), str::to_owned))
                        .collect();
                    format!("{field}: {}", joined.join(", "))
                }
                serde_json::Value::String(s) => format!("{field}: {s}"),
                other => format!("{field}: {other}"),
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ => truncate(trimmed),
    }
}

fn truncate(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_owned(),
    }
}
