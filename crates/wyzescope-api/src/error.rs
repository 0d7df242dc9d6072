use thiserror::Error;

/// Top-level error type for the `wyzescope-api` crate.
///
/// Covers every failure mode of the cloud client: authentication,
/// transport, throttling, and payload decoding. `wyzescope-core` maps
/// these into run-level outcomes (fatal vs per-device).
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (wrong credentials, vendor lockout, missing tokens).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Access token expired or was invalidated (vendor code 2001).
    ///
    /// The client refreshes once and retries internally; callers only
    /// see this when refresh is impossible (e.g. no refresh token).
    #[error("Access token expired or invalid")]
    AccessTokenExpired,

    // ── Throttling ──────────────────────────────────────────────────
    /// Rate limited by the cloud API (HTTP 429).
    #[error("Rate limited (remaining={remaining}, retry after {retry_after_secs:?}s)")]
    RateLimited {
        remaining: u32,
        retry_after_secs: Option<u64>,
    },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-success code in the vendor's response envelope.
    #[error("Wyze API error code={code}: {message}")]
    Api { code: String, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates auth has expired
    /// and re-authentication might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AccessTokenExpired)
    }

    /// Returns `true` if this is a throttle signal that should trigger
    /// backoff rather than immediate failure.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::RateLimited { .. } => true,
            _ => false,
        }
    }

    /// The vendor's `Retry-After` hint, if the service provided one.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimited {
                retry_after_secs, ..
            } => *retry_after_secs,
            _ => None,
        }
    }
}
