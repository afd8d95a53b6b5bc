use std::process::ExitCode;

use clap::Parser;
use mailcow_cli::cli::{CliArgs, select_env_from_args};
use mailcow_cli::config::load_env_file;
use mailcow_cli::error::MailcowError;
use mailcow_cli::run;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // The env file has to be loaded before clap reads env-backed flags.
    let select = select_env_from_args(std::env::args());
    if let Err(err) = load_env_file(select.as_deref()) {
        eprintln!("Error: {err}");
        return ExitCode::from(1);
    }

    let args = CliArgs::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            match err.downcast_ref::<MailcowError>() {
                Some(MailcowError::Usage(_)) => ExitCode::from(2),
                _ => ExitCode::from(1),
            }
        }
    }
}
