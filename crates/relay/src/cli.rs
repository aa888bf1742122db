use clap::{Parser, Subcommand};

use crate::commands::{self, openapi::OpenapiParams};
use crate::config::ServeParams;

pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "relay", about = "Relay text and image prompts to a hosted generative model")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP gateway
    Serve(ServeParams),
    /// Print the OpenAPI document for the gateway routes
    Openapi(OpenapiParams),
    /// Show relay version
    Version,
}

fn log_error_chain(err: &anyhow::Error) {
    for cause in err.chain().skip(1) {
        eprintln!("Caused by: {cause}");
    }
}

fn handle_error(err: &anyhow::Error) -> ! {
    eprintln!("Error: {err}");
    log_error_chain(err);
    ::std::process::exit(1);
}

pub async fn run_cli(cli: Cli) -> Result<(), anyhow::Error> {
    let cmd_res = match cli.command {
        Commands::Serve(params) => commands::serve::cmd_serve(params).await,
        Commands::Openapi(params) => commands::openapi::cmd_openapi(params),
        Commands::Version => {
            println!("relay version: {CLI_VERSION}");
            Ok(())
        }
    };

    if let Err(e) = cmd_res {
        handle_error(&e);
    }
    Ok(())
}
