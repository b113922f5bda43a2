use clap::Parser;
use dehash::cli::{execute_bulk, execute_verify, Cli, Commands};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Verify(args) => execute_verify(args, cli.config.as_deref(), cli.quiet).await,
        Commands::Bulk(args) => {
            let cancel = CancellationToken::new();
            spawn_interrupt_listener(cancel.clone());
            execute_bulk(args, cli.config.as_deref(), cli.quiet, cancel).await
        }
    };

    match result {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("❌ エラー: {error:#}");
            ExitCode::FAILURE
        }
    }
}

/// Ctrl-Cでエンジンのキャンセルトークンを発火させる
fn spawn_interrupt_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, finishing current batch");
                cancel.cancel();
            }
            Err(e) => warn!(error = %e, "failed to listen for interrupt"),
        }
    });
}
