use clap::Parser;
use modspace::{Cli, commands};
use std::fs::OpenOptions;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_tracing(log_file: Option<&Path>) {
    let log_file = log_file.and_then(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });

    if let Some(file) = log_file {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(file)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref());

    let config = cli.config();
    tracing::debug!("modspace v{} in {:?}", env!("CARGO_PKG_VERSION"), cli.root);

    match commands::run(&cli.root, &config, cli.command).await {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
