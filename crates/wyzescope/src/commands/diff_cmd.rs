//! `wyzescope diff` -- compare two snapshot files.

use wyzescope_core::Snapshot;

use crate::cli::{DiffArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub fn handle(args: DiffArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let before = Snapshot::load(&args.before)?;
    let after = Snapshot::load(&args.after)?;

    let report = wyzescope_core::diff(&before, &after, args.mac.as_deref())?;

    let color = output::should_color(&global.color);
    let rendered = output::render_report(&global.output, &report, &before, &after, color);
    output::print_output(&rendered, global.quiet);
    Ok(())
}
