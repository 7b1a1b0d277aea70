//! `screens generate` command implementation.

use std::path::PathBuf;

use clap::Args;

use super::{OptionArgs, fs_context, write_output};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the generate command.
#[derive(Args)]
pub(crate) struct GenerateArgs {
    #[command(flatten)]
    options: OptionArgs,

    /// Output file (default: stdout).
    #[arg(short, long)]
    out: Option<PathBuf>,
}

impl GenerateArgs {
    /// Execute the generate command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, pages cannot be scanned, routes
    /// collide or the output cannot be written.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let options = self.options.resolve()?;
        let ctx = fs_context(options);

        let source = ctx.request()?;

        match self.out {
            Some(path) => {
                let changed = write_output(&path, &source)?;
                output.wrote(&path, changed);
            }
            None => output.data(&source)?,
        }

        Ok(())
    }
}
