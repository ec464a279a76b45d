use thiserror::Error;

/// Top-level error type for the `clash-auto-api` crate.
///
/// Every variant describes why a single subscription could not be fetched.
/// `clash-auto-core` treats all of them as per-source, non-fatal failures.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, body read, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup error while building the HTTP client.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Response ────────────────────────────────────────────────────
    /// The subscription server answered with a non-success status.
    #[error("Subscription server returned HTTP {status}")]
    Status { status: u16 },
}

impl Error {
    /// Returns `true` if a later run may well succeed (timeouts, refused
    /// connections, 429 and 5xx).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// The HTTP status code, if the server responded at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
