//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the matching
//! handler: [`run`], [`init`], [`validate`], or [`health`].

pub mod health;
pub mod init;
pub mod run;
pub mod validate;

use crate::cli::{Cli, Commands};
use crate::error::GatewayError;

pub async fn dispatch(cli: Cli) -> Result<(), GatewayError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Init(ref args)) => init::execute(args),
        Some(Commands::Validate(ref args)) => validate::execute(args),
        Some(Commands::Health(args)) => health::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  servergate v{version} \u{2014} same-origin gateway to server management consoles\n\n  \
         No command provided. To get started:\n\n    \
         servergate run                    Start with built-in defaults (or ./servergate.yaml)\n    \
         servergate init                   Generate a starter config\n    \
         servergate run -c gateway.yaml    Start with a specific config file\n    \
         servergate --help                 See all commands and options\n"
    );
}
