use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Upstream throttling signal (HTTP 429 or 503).
///
/// Carries the parsed `Retry-After` hint and remaining-quota header so the
/// caller can back off instead of treating the condition as fatal.
#[derive(Debug, Error)]
#[error("rate limited by upstream (status {status}): {message}")]
pub struct RateLimitError {
    pub status: u16,
    /// Parsed `Retry-After`; zero when the header is absent or unparseable.
    pub retry_after: Duration,
    /// Raw `X-Rate-Limit-Remaining` header value, if present.
    pub remaining: Option<String>,
    pub message: String,
}

/// Failures surfaced by the upstream client. No retries happen at this layer;
/// every condition is reported to the caller, which owns backoff policy.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode upstream response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error(transparent)]
    RateLimited(#[from] RateLimitError),

    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },
}

/// Failures on the snapshot write path. Manifest reads and prune deletes are
/// handled tolerantly inside the store and never show up here.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot date must not be empty")]
    EmptyDate,

    #[error("snapshot store has no storage root configured")]
    Unconfigured,

    #[error("failed to {op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SnapshotError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SnapshotError::Io {
            op,
            path: path.into(),
            source,
        }
    }
}
