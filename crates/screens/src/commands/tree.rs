//! `screens tree` command implementation.

use clap::Args;

use super::{OptionArgs, fs_context};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the tree command.
#[derive(Args)]
pub(crate) struct TreeArgs {
    #[command(flatten)]
    options: OptionArgs,
}

impl TreeArgs {
    /// Print the route tree as JSON.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let ctx = fs_context(self.options.resolve()?);

        let routes = ctx.routes()?;
        let mut json = serde_json::to_string_pretty(&routes)?;
        json.push('\n');
        output.data(&json)?;

        Ok(())
    }
}
