//! CLI entry point - the composition root.
//!
//! This is the ONLY place where logging and environment are initialised.
//! Command dispatch routes to handlers.

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use throttle_cli::handlers::live::{self, LiveArgs};
use throttle_cli::handlers::simulate::{self, SimulationPlan};
use throttle_cli::{Cli, CliError, Commands, script};

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        // No command provided - show help
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Simulate {
            interval_ms,
            calls,
            calls_file,
            dispose_at,
            update_action_at,
        } => {
            let calls = match (calls, calls_file) {
                (Some(inline), _) => script::parse_inline(&inline)?,
                (None, Some(path)) => script::load_file(&path)?,
                (None, None) => {
                    return Err(CliError::Arguments(
                        "one of --calls or --calls-file is required".into(),
                    )
                    .into());
                }
            };
            simulate::execute(&SimulationPlan {
                interval_ms,
                calls,
                dispose_at,
                update_action_at,
            })?;
        }
        Commands::Live {
            interval_ms,
            count,
            spacing_ms,
        } => {
            live::execute(LiveArgs {
                interval_ms,
                count,
                spacing_ms,
            })
            .await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Load environment variables before clap reads env fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
        std::process::exit(code);
    }
}
