use thiserror::Error;

/// Top-level error type for the `ash-api` crate.
///
/// HTTP-level failures (4xx/5xx) never surface from the raw verbs: those
/// return an [`ApiResponse`](crate::ApiResponse) whose status the caller
/// inspects. `Http` is produced only by helpers that demand a specific
/// status, such as the paginated collection fetch.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Authentication ──────────────────────────────────────────────
    /// The bearer token cannot be encoded as a header value.
    #[error("Invalid API token: {message}")]
    InvalidToken { message: String },

    // ── API ─────────────────────────────────────────────────────────
    /// The controller answered with an unexpected status code.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the controller reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }

    /// HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
