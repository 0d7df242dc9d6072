//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable
//! help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use wyzescope_core::CoreError;

/// Exit codes for scripting against the CLI.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Credentials ──────────────────────────────────────────────────

    #[error("Missing credentials: {missing}")]
    #[diagnostic(
        code(wyzescope::no_credentials),
        help(
            "Set WYZE_EMAIL, WYZE_PASSWORD, WYZE_KEY_ID and WYZE_API_KEY,\n\
             or pass --email/--password/--key-id/--api-key.\n\
             Key id + API key come from the Wyze developer portal."
        )
    )]
    NoCredentials { missing: String },

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(wyzescope::auth_failed),
        help(
            "Verify your email, password, key id and API key.\n\
             Accounts with MFA enabled are not supported."
        )
    )]
    AuthFailed { message: String },

    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the Wyze cloud: {message}")]
    #[diagnostic(
        code(wyzescope::connection_failed),
        help(
            "Check your network connection.\n\
             Behind a TLS-inspecting proxy, try --insecure (-k)."
        )
    )]
    ConnectionFailed { message: String },

    #[error("Rate limit budget exhausted after {attempts} attempts")]
    #[diagnostic(
        code(wyzescope::rate_limited),
        help(
            "The Wyze cloud throttled this account. Wait a few minutes\n\
             and retry, or lower --max-concurrent."
        )
    )]
    RateLimited { attempts: u32 },

    // ── Resources ────────────────────────────────────────────────────

    #[error("No device with mac '{mac}' in either snapshot")]
    #[diagnostic(
        code(wyzescope::not_found),
        help("Run `wyzescope diff` without --mac to list all changed devices.")
    )]
    NotFound { mac: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("API error: {message}")]
    #[diagnostic(code(wyzescope::api_error))]
    ApiError { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid input: {message}")]
    #[diagnostic(
        code(wyzescope::validation),
        help("Snapshot files must be produced by `wyzescope scrape`.")
    )]
    Validation { message: String },

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(wyzescope::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Auth { message } => Self::AuthFailed { message },

            CoreError::Enumeration { message } => Self::ApiError {
                message: format!("device enumeration failed: {message}"),
            },

            CoreError::RateLimitExhausted { attempts } => Self::RateLimited { attempts },

            CoreError::Validation { message } => Self::Validation { message },

            CoreError::MacNotFound { mac } => Self::NotFound { mac },

            CoreError::Io { path, source } => Self::Io(std::io::Error::new(
                source.kind(),
                format!("{path}: {source}"),
            )),

            CoreError::Api(api) => match api {
                wyzescope_api::Error::Transport(e) => Self::ConnectionFailed {
                    message: e.to_string(),
                },
                other => Self::ApiError {
                    message: other.to_string(),
                },
            },
        }
    }
}

impl From<wyzescope_api::Error> for CliError {
    fn from(err: wyzescope_api::Error) -> Self {
        Self::from(CoreError::Api(err))
    }
}
