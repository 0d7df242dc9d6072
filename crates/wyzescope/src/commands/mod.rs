//! Command handlers.

pub mod diff_cmd;
pub mod scrape_cmd;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a parsed command to its handler.
pub async fn dispatch(command: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match command {
        Command::Scrape(args) => scrape_cmd::handle(args, global).await,
        Command::Diff(args) => diff_cmd::handle(args, global),
        // Completions are handled in main before dispatch.
        Command::Completions(_) => Ok(()),
    }
}
