//! `wyzescope scrape` -- capture one snapshot of the account.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use tracing::info;

use wyzescope_api::{Credentials, TransportConfig, WyzeClient};
use wyzescope_core::FetchOptions;

use crate::cli::{GlobalOpts, ScrapeArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(args: ScrapeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let credentials = resolve_credentials(&args)?;

    let transport = TransportConfig {
        timeout: Duration::from_secs(global.timeout),
        danger_accept_invalid_certs: global.insecure,
    };
    let client = WyzeClient::new(credentials, &transport)?;

    let options = FetchOptions {
        include_device_info: !args.no_device_info,
        include_events: args.include_events,
        max_concurrent: args.max_concurrent.max(1),
    };

    info!(
        include_device_info = options.include_device_info,
        include_events = options.include_events,
        max_concurrent = options.max_concurrent,
        "starting scrape"
    );

    let snapshot = wyzescope_core::scrape(&client, options).await?;

    let path = args.out.unwrap_or_else(default_out_path);
    snapshot.save(&path)?;

    output::print_output(&output::scrape_summary(&snapshot, &path), global.quiet);
    Ok(())
}

fn default_out_path() -> PathBuf {
    PathBuf::from(format!("wyzescope_{}.json", chrono::Utc::now().timestamp()))
}

/// Assemble credentials from flags/env, naming every missing field.
fn resolve_credentials(args: &ScrapeArgs) -> Result<Credentials, CliError> {
    let mut missing = Vec::new();
    if args.email.as_deref().is_none_or(str::is_empty) {
        missing.push("email (WYZE_EMAIL)");
    }
    if args.password.as_deref().is_none_or(str::is_empty) {
        missing.push("password (WYZE_PASSWORD)");
    }
    if args.key_id.as_deref().is_none_or(str::is_empty) {
        missing.push("key id (WYZE_KEY_ID)");
    }
    if args.api_key.as_deref().is_none_or(str::is_empty) {
        missing.push("API key (WYZE_API_KEY)");
    }
    if !missing.is_empty() {
        return Err(CliError::NoCredentials {
            missing: missing.join(", "),
        });
    }

    Ok(Credentials {
        email: args.email.clone().unwrap_or_default(),
        password: SecretString::from(args.password.clone().unwrap_or_default()),
        key_id: args.key_id.clone().unwrap_or_default(),
        api_key: SecretString::from(args.api_key.clone().unwrap_or_default()),
    })
}
