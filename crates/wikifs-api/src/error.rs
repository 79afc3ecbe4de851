use thiserror::Error;

/// Top-level error type for the `wikifs-api` crate.
///
/// Only conditions the caller can act on surface here. Protocol-level
/// oddities (a submit answered without a redirect, an edit form missing
/// its hidden tokens, a login that yields no session) are logged and
/// degraded inside the client instead. `wikifs-core` maps these into
/// filesystem error codes.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Proxy configuration rejected by the HTTP stack.
    #[error("Invalid proxy '{url}': {reason}")]
    Proxy { url: String, reason: String },

    // ── Remote ──────────────────────────────────────────────────────
    /// The wiki answered a fetch with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    Status { status: u16, url: String },
}

impl Error {
    /// Returns `true` if the remote reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Status { status: 404, .. } => true,
            _ => false,
        }
    }
}
