//! `screens watch` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use screens_routes::RouteContext;

use super::{OptionArgs, fs_context, write_output};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the watch command.
#[derive(Args)]
pub(crate) struct WatchArgs {
    #[command(flatten)]
    options: OptionArgs,

    /// Output file, rewritten whenever pages are added or removed.
    #[arg(short, long)]
    out: PathBuf,
}

impl WatchArgs {
    /// Execute the watch command.
    ///
    /// Runs until interrupted. Generation errors are reported and the previous
    /// output is kept until the next relevant change fixes them.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the watcher cannot be started
    /// or the output cannot be written.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let ctx = fs_context(self.options.resolve()?);

        output.watching(&ctx.options().page_dir);

        // Subscribe before the first scan so no change slips in between
        let (events, _handle) = ctx.watch()?;
        regenerate(&ctx, &self.out, &output)?;

        for event in events.iter() {
            if ctx.handle_event(&event) {
                regenerate(&ctx, &self.out, &output)?;
            }
        }

        Ok(())
    }
}

/// Regenerate the routes module and write it if it changed.
fn regenerate(ctx: &RouteContext, out: &Path, output: &Output) -> Result<(), CliError> {
    match ctx.request() {
        Ok(source) => {
            let changed = write_output(out, &source)?;
            output.wrote(out, changed);
        }
        Err(err) => {
            tracing::warn!(error = %err, "Route generation failed");
            output.kept_previous(&err, out);
        }
    }
    Ok(())
}
