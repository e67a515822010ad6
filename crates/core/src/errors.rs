use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the entire roas-report-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Upstream / Network ──────────────────────────────────────────
    #[error("Authentication rejected by {provider}: {message}")]
    Auth { provider: String, message: String },

    #[error("Rate limited by {provider} after {attempts} attempt(s){}", retry_hint(.retry_after_secs))]
    RateLimit {
        provider: String,
        retry_after_secs: Option<u64>,
        attempts: u32,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("{provider} did not answer within {seconds}s")]
    Timeout { provider: String, seconds: u64 },

    #[error("{provider} returned more than {pages} pages; refusing to report a truncated result")]
    Truncated { provider: String, pages: u32 },

    #[error("API error ({provider}): {message}")]
    Api { provider: String, message: String },

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── Request / Report ────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Partial data: {} failed", join_sources(.failed))]
    PartialData { failed: Vec<String> },

    #[error("No {platform} credential stored for client '{client}'")]
    MissingCredential { platform: String, client: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    match retry_after_secs {
        Some(secs) => format!(" (retry after {secs}s)"),
        None => String::new(),
    }
}

fn join_sources(failed: &[String]) -> String {
    failed.join(", ")
}

/// Flat classification of [`CoreError`], used for warnings and API payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Auth,
    RateLimit,
    Network,
    Timeout,
    Truncated,
    Api,
    Deserialization,
    Validation,
    PartialData,
    MissingCredential,
    Config,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorKind::Auth => "authentication",
            ErrorKind::RateLimit => "rate limit",
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Truncated => "truncated",
            ErrorKind::Api => "api",
            ErrorKind::Deserialization => "invalid response",
            ErrorKind::Validation => "validation",
            ErrorKind::PartialData => "partial data",
            ErrorKind::MissingCredential => "missing credential",
            ErrorKind::Config => "configuration",
        };
        f.write_str(label)
    }
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Auth { .. } => ErrorKind::Auth,
            CoreError::RateLimit { .. } => ErrorKind::RateLimit,
            CoreError::Network(_) => ErrorKind::Network,
            CoreError::Timeout { .. } => ErrorKind::Timeout,
            CoreError::Truncated { .. } => ErrorKind::Truncated,
            CoreError::Api { .. } => ErrorKind::Api,
            CoreError::Deserialization(_) => ErrorKind::Deserialization,
            CoreError::ValidationError(_) => ErrorKind::Validation,
            CoreError::PartialData { .. } => ErrorKind::PartialData,
            CoreError::MissingCredential { .. } => ErrorKind::MissingCredential,
            CoreError::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether a retry may succeed: throttling and transient network failures.
    /// Auth, validation and payload errors are permanent.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::RateLimit { .. } | CoreError::Network(_))
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors carry the full URL; cursor links echo the request parameters.
        let msg = redact_query(&e.to_string());
        if e.is_decode() {
            CoreError::Deserialization(msg)
        } else {
            CoreError::Network(msg)
        }
    }
}

/// Strip everything from the first `?` up to the next whitespace or closing delimiter.
pub fn redact_query(msg: &str) -> String {
    let mut out = String::with_capacity(msg.len());
    let mut rest = msg;
    while let Some(idx) = rest.find('?') {
        out.push_str(&rest[..idx]);
        out.push_str("?<query redacted>");
        let tail = &rest[idx..];
        let end = tail
            .find(|c: char| c.is_whitespace() || c == ')' || c == '"')
            .unwrap_or(tail.len());
        rest = &tail[end..];
    }
    out.push_str(rest);
    out
}
