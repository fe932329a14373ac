//! # Dispatch Server - Entry Point
//! src/main.rs
//!
//! Parsea la configuración, instala el logging y sirve archivos de `--root`
//! con la estrategia de despacho elegida. SIGINT o SIGTERM apagan el
//! servidor de forma ordenada.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dispatch_server::config::Config;
use dispatch_server::handler::FileServingApp;
use dispatch_server::server::{Server, ShutdownHandle};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "dispatch_server=info".into()),
        )
        .init();

    let config = Config::parse();
    config.print_summary();

    let app = Arc::new(FileServingApp::new(&config.root));
    let server = match Server::bind(&config, app) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "fatal error on startup");
            return ExitCode::FAILURE;
        }
    };

    install_signal_handlers(server.shutdown_handle());

    // Bloquea hasta el apagado
    match server.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(unix)]
fn install_signal_handlers(shutdown: ShutdownHandle) {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = match Signals::new([SIGINT, SIGTERM]) {
        Ok(signals) => signals,
        Err(e) => {
            tracing::warn!(error = %e, "cannot install signal handlers");
            return;
        }
    };

    let spawned = std::thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                tracing::info!(signal, "signal received");
                shutdown.trigger();
            }
        });

    if let Err(e) = spawned {
        tracing::warn!(error = %e, "cannot spawn signal thread");
    }
}

#[cfg(not(unix))]
fn install_signal_handlers(_shutdown: ShutdownHandle) {}
