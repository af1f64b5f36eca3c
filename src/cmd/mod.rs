//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`] or [`validate`]. Each handler lives in its
//! own submodule.

pub mod run;
pub mod validate;

use crate::cli::{Cli, Commands};
use crate::error::GatewayError;

pub async fn dispatch(cli: Cli) -> Result<(), GatewayError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Validate(ref args)) => validate::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  tollgate v{version}: HTTP gateway with per-client throttling\n\n  \
         No command provided. To get started:\n\n    \
         tollgate run                      Start the gateway (auto-detects ./gateway.json)\n    \
         tollgate run -c routes.yaml       Start with a specific config file\n    \
         tollgate validate routes.yaml     Check a config file\n    \
         tollgate --help                   See all commands and options\n"
    );
}
