use mintburn::config::Config;
use mintburn::onchain::{ChainSession, ListenerSignal, MintListener};
use mintburn::reaction::ReactionPipeline;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const CONFIG_PATH: &str = "mintburn.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let config_path = Path::new(CONFIG_PATH);
    let from_file = config_path.exists();
    let config = if from_file {
        Config::load(config_path)?
    } else {
        Config::from_env()?
    };

    // Initialize logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .init();
    }

    info!("mintburn v{} starting", env!("CARGO_PKG_VERSION"));
    if !from_file {
        info!("no {} found, using env-only config", CONFIG_PATH);
    }

    // --- Chain Session ---
    let session = Arc::new(ChainSession::connect(&config.chain).await?);

    // --- Reaction Pipeline ---
    let pipeline = ReactionPipeline::new(session.clone(), &config.reaction);
    info!(
        delay_secs = pipeline.delay().as_secs(),
        policy = ?pipeline.policy(),
        signer = %session.signer_address(),
        "reaction pipeline ready"
    );

    // --- Mint Listener ---
    let (signal_tx, mut signal_rx) = mpsc::unbounded_channel::<ListenerSignal>();
    let listener = MintListener::new(session.clone(), signal_tx).start();

    // --- Main Event Loop ---
    info!("entering main event loop - press Ctrl+C to stop");

    loop {
        tokio::select! {
            signal = signal_rx.recv() => {
                if let Some(signal) = &signal {
                    debug!(signal = %signal, "listener signal");
                }
                match signal {
                    Some(ListenerSignal::Mint(event)) => {
                        // Trigger handle dropped: fire-and-forget.
                        let _ = pipeline.on_mint(&event);
                    }
                    Some(ListenerSignal::Connected) => info!("Mint listener connected"),
                    Some(ListenerSignal::Disconnected { reason }) => {
                        warn!(reason = %reason, "Mint listener disconnected");
                    }
                    None => {
                        warn!("Mint listener stopped");
                        break;
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("shutting down...");
                break;
            }
        }
    }

    if let Some(pending) = pipeline.slot().peek() {
        warn!(
            receiver = %pending.receiver,
            amount = %pending.amount,
            "exiting with an unburned pending reaction"
        );
    }
    listener.abort();

    Ok(())
}
