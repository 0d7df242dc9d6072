// wyzescope-api: Async Rust client for the Wyze cloud API

pub mod auth;
pub mod client;
pub mod error;
pub mod transport;
pub mod wire;

pub use auth::{Credentials, Session, hash_password};
pub use client::WyzeClient;
pub use error::Error;
pub use transport::TransportConfig;
pub use wire::{DeviceInfo, DeviceSummary, PropertyEntry};
