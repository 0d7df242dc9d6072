// ── Core error types ──
//
// Run-level errors from wyzescope-core. The `From<wyzescope_api::Error>`
// impl translates transport-layer errors into domain-appropriate
// variants; consumers never see raw HTTP failures directly.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Scrape-fatal errors ──────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Device enumeration failed: {message}")]
    Enumeration { message: String },

    // ── Per-unit errors ──────────────────────────────────────────────
    /// The throttle retry budget ran out for one unit of work.
    /// Fatal for that unit, recorded and non-fatal for the run.
    #[error("Rate limit budget exhausted after {attempts} attempts")]
    RateLimitExhausted { attempts: u32 },

    // ── Snapshot / diff errors ───────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("No device with mac {mac} in either snapshot")]
    MacNotFound { mac: String },

    #[error("Snapshot I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {0}")]
    Api(#[from] wyzescope_api::Error),
}

impl CoreError {
    /// Returns `true` when the error should abort the whole scrape
    /// rather than a single device's enrichment.
    pub fn is_scrape_fatal(&self) -> bool {
        matches!(self, Self::Auth { .. } | Self::Enumeration { .. })
    }
}
