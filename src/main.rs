//! Wallet coordinator daemon.
//!
//! Connects (or restores) a wallet session, logs state and gas updates
//! until SIGINT/SIGTERM, then disconnects cleanly.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use wallet_coordinator::lifecycle::{build_coordinator, load_config, shutdown_signal};
use wallet_coordinator::observability::{init_logging, metrics};
use wallet_coordinator::{Coordinator, ProviderKind, Shutdown};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProviderArg {
    Injected,
    Relay,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Injected => ProviderKind::Injected,
            ProviderArg::Relay => ProviderKind::Relay,
        }
    }
}

#[derive(Parser)]
#[command(name = "wallet-coordinator")]
#[command(about = "Connect a wallet and track its session and gas price", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Transport to connect through.
    #[arg(short, long, value_enum, default_value = "injected")]
    provider: ProviderArg,

    /// Only restore an existing session, never prompt.
    #[arg(long)]
    restore: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "wallet-coordinator starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let coordinator = build_coordinator(&config, None).await?;
    let shutdown = Shutdown::new();
    let watchers = [
        spawn_state_watcher(&coordinator, shutdown.subscribe()),
        spawn_gas_watcher(&coordinator, shutdown.subscribe()),
    ];

    let kind = ProviderKind::from(cli.provider);
    let outcome = if cli.restore {
        coordinator.restore(kind).await.map(|info| info.is_some())
    } else {
        coordinator.connect(kind).await.map(|_| true)
    };
    match outcome {
        Ok(true) => tracing::info!(%kind, "Session active, press Ctrl-C to disconnect"),
        Ok(false) => tracing::info!(%kind, "No session to restore"),
        Err(e) => tracing::error!(%kind, error = %e, "Wallet session not established"),
    }

    shutdown_signal().await;

    coordinator.disconnect().await;
    shutdown.trigger();
    for watcher in watchers {
        let _ = watcher.await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

fn spawn_state_watcher(coordinator: &Coordinator, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
    let mut state = coordinator.subscribe_state();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                changed = state.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let current = state.borrow_and_update().clone();
                    tracing::info!(
                        connection = %current.connection,
                        address = %current.wallet.address,
                        chain = %current.wallet.chain_name,
                        balance_eth = %current.wallet.balance_ether(),
                        error = ?current.error,
                        "Wallet state"
                    );
                }
            }
        }
    })
}

fn spawn_gas_watcher(coordinator: &Coordinator, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
    let mut gas = coordinator.subscribe_gas();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                changed = gas.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let quote = gas.borrow_and_update().clone();
                    if quote.is_loading {
                        continue;
                    }
                    match &quote.error {
                        Some(error) => tracing::warn!(%error, "Gas price unavailable"),
                        None if !quote.last_updated.is_empty() => tracing::info!(
                            gwei = %quote.fee_gwei,
                            updated = %quote.last_updated,
                            "Gas price"
                        ),
                        None => {}
                    }
                }
            }
        }
    })
}
