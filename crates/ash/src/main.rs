mod cli;
mod config;
mod error;
mod output;
mod shell;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ash_core::{Cache, Platform};

use crate::cli::Cli;
use crate::error::CliError;
use crate::output::Console;
use crate::shell::Session;
use crate::shell::prompt::TerminalPrompter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

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

    // The shell owns stdout; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let platform_config = config::build_platform_config(&cli)?;
    let platform = Platform::new(platform_config)?;

    let cache_path = cli.cache.clone().unwrap_or_else(ash_config::cache_path);
    let cache = Cache::open(&cache_path).map_err(|source| CliError::Cache {
        path: cache_path.display().to_string(),
        source,
    })?;

    let mut session = Session::new(
        platform,
        cache,
        Box::new(TerminalPrompter::new()),
        Console::stdout(),
    )?;
    session.bootstrap().await;

    tracing::debug!("entering shell");
    shell::run(&mut session).await?;
    Ok(())
}
