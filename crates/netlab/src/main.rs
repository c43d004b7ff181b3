mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let Cli { global, command } = cli;
    match command {
        // No project file involved.
        Command::Config(args) => commands::config_cmd::handle(args, &global),
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "netlab", &mut std::io::stdout());
            Ok(())
        }

        Command::Project(args) => {
            let cfg = config::load_config()?;
            commands::project::handle(args, &global, &cfg)
        }

        cmd => {
            let cfg = config::load_config()?;
            let session = commands::Session::open(&global, &cfg)?;
            tracing::debug!(command = ?cmd, project = %session.project.display(), "dispatching command");
            commands::dispatch(cmd, &session).await
        }
    }
}
