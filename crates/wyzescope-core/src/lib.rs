//! Snapshot capture and structural diff engine for Wyze device fleets.
//!
//! This crate owns the business logic between `wyzescope-api` and the
//! CLI:
//!
//! - **[`scrape()`](scrape::scrape)** — one full capture run: login,
//!   enumerate the account's devices, enrich each one concurrently
//!   under a [`RateGuard`], and assemble an immutable [`Snapshot`].
//!
//! - **[`RateGuard`]** — per-run gate bounding in-flight requests and
//!   applying shared exponential backoff after throttle signals.
//!
//! - **[`diff`]** — pure structural comparison of two snapshot
//!   documents across the three namespaces (`raw`, `device_params`,
//!   `property_list`), producing a deterministic [`DiffReport`].
//!
//! - **Domain model** ([`model`]) — open key-to-value maps rather than
//!   closed structs, because vendor property keys are sparse and vary
//!   by model and firmware.

pub mod differ;
pub mod error;
pub mod model;
pub mod rate_guard;
pub mod scrape;

// ── Primary re-exports ──────────────────────────────────────────────
pub use differ::diff;
pub use error::CoreError;
pub use rate_guard::RateGuard;
pub use scrape::scrape;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    ChangeKind,
    DeviceRecord,
    DiffEntry,
    DiffReport,
    FetchFailure,
    FetchOptions,
    FetchStage,
    Namespace,
    Snapshot,
};
