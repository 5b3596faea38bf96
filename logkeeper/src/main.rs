//! Logkeeper command-line entry point.

mod cli;

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use cli::{CliArgs, Command};
use logkeeper::{DownloadOptions, Error, LogKeeper, Result};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("logkeeper: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> Result<()> {
    let config = args.to_config()?;
    tracing::info!("Opening logkeeper with config: {:?}", config);
    let keeper = LogKeeper::open(config).await?;

    match args.command {
        Command::Build { build_id } => print_json(&keeper.find_build_by_id(&build_id).await?),
        Command::Test { build_id, test_id } => {
            print_json(&keeper.find_test_by_id(&build_id, &test_id).await?)
        }
        Command::Tests { build_id } => print_json(&keeper.find_tests_for_build(&build_id).await?),
        Command::Download { build_id, test_id } => {
            download(&keeper, &build_id, test_id.as_deref().unwrap_or("")).await
        }
    }
}

async fn download(keeper: &LogKeeper, build_id: &str, test_id: &str) -> Result<()> {
    let cancellation = CancellationToken::new();
    let on_interrupt = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted, cancelling download");
            on_interrupt.cancel();
        }
    });

    let options = DownloadOptions {
        cancellation: Some(cancellation),
    };
    let mut lines = keeper
        .download_log_lines_with_options(build_id, test_id, options)
        .await?;

    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    let mut count = 0u64;
    while let Some(line) = lines.next().await? {
        writeln!(out, "{}", line.data).map_err(io_error)?;
        count += 1;
    }
    out.flush().map_err(io_error)?;
    tracing::info!(build_id, test_id, lines = count, "download complete");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json =
        serde_json::to_string_pretty(value).map_err(|e| Error::Encoding(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

fn io_error(e: std::io::Error) -> Error {
    Error::Internal(format!("failed to write output: {}", e))
}
