// Wallet Vault - Application Entry Point
//
// Parses CLI arguments, initializes structured logging (which never carries
// descriptor material), and runs the command on a blocking worker while the
// async side waits for termination signals. On a signal every staged file
// is erased before the process exits.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wallet_vault::cli::{execute, Cli};
use wallet_vault::config::VaultConfig;
use wallet_vault::staging::StagingArea;
use wallet_vault::VaultError;

/// Exit status after an interrupt (128 + SIGINT).
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    // RUST_LOG=wallet_vault=debug shows every adapter call.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wallet_vault=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let (config, staging) = match setup() {
        Ok(setup) => setup,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let worker_staging = staging.clone();
    let worker = tokio::task::spawn_blocking(move || execute(cli.command, &config, worker_staging));

    let outcome = tokio::select! {
        joined = worker => match joined {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(e) => Err(format!("command worker failed: {}", e)),
        },
        signal = shutdown_signal() => {
            let drained = staging.release_all();
            tracing::warn!(signal, drained, "Interrupted, staged files erased");
            std::process::exit(EXIT_INTERRUPTED);
        }
    };

    // Handles release themselves; this only catches leaks from a panicking worker.
    let leftover = staging.release_all();
    if leftover > 0 {
        tracing::warn!(leftover, "Erased staged files left behind by the command");
    }

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn setup() -> Result<(VaultConfig, StagingArea), VaultError> {
    let config = VaultConfig::from_env()?;
    let staging = StagingArea::new(Some(&config.staging_dir), &config.staging_fallback)?;
    Ok((config, staging))
}

/// Resolves with the signal's name on SIGINT, SIGTERM or SIGHUP.
#[cfg(unix)]
async fn shutdown_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut term, mut hangup) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::hangup()),
    ) {
        (Ok(term), Ok(hangup)) => (term, hangup),
        _ => {
            tracing::warn!("Cannot listen for SIGTERM/SIGHUP, only Ctrl+C is handled");
            let _ = tokio::signal::ctrl_c().await;
            return "SIGINT";
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => "SIGINT",
        _ = term.recv() => "SIGTERM",
        _ = hangup.recv() => "SIGHUP",
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "SIGINT"
}
