//! Mint event listener.
//!
//! Watches the token contract for `Mint` logs through the shared chain
//! session and emits typed `ListenerSignal`s via a tokio channel.
//!
//! - WebSocket / IPC endpoints use an `eth_subscribe` log subscription
//! - HTTP endpoints fall back to filter polling
//! - If the stream errors or ends, it re-subscribes with a bounded backoff

use crate::onchain::abi::Mint;
use crate::onchain::session::ChainSession;
use crate::onchain::types::{ListenerSignal, MintEvent};

use alloy::providers::Provider;
use alloy::rpc::types::Log;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Subscribes to Mint events on the session's contract.
pub struct MintListener {
    session: Arc<ChainSession>,
    signal_tx: mpsc::UnboundedSender<ListenerSignal>,
}

impl MintListener {
    pub fn new(session: Arc<ChainSession>, signal_tx: mpsc::UnboundedSender<ListenerSignal>) -> Self {
        Self { session, signal_tx }
    }

    /// Start the listener in a background task. Returns immediately.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run_forever().await;
        })
    }

    /// Main loop: subscribe, forward events, re-subscribe on failure.
    async fn run_forever(&self) {
        let mut consecutive_failures: u32 = 0;

        loop {
            match self.run_session().await {
                Ok(()) => {
                    info!("Mint log stream ended cleanly");
                    consecutive_failures = 0;
                    let _ = self.signal_tx.send(ListenerSignal::Disconnected {
                        reason: "stream ended".to_string(),
                    });
                }
                Err(e) => {
                    error!(error = %e, "Mint log subscription error");
                    consecutive_failures += 1;
                    let _ = self.signal_tx.send(ListenerSignal::Disconnected {
                        reason: e.to_string(),
                    });
                }
            }

            if self.signal_tx.is_closed() {
                info!("signal receiver dropped, stopping Mint listener");
                return;
            }

            let backoff = backoff_for(consecutive_failures);
            info!(
                backoff_secs = backoff.as_secs(),
                failures = consecutive_failures,
                "re-subscribing to Mint events"
            );
            tokio::time::sleep(backoff).await;
        }
    }

    /// A single subscription: open the log stream and forward every Mint.
    async fn run_session(&self) -> anyhow::Result<()> {
        let mut logs = self.open_log_stream().await?;

        let _ = self.signal_tx.send(ListenerSignal::Connected);
        info!(
            contract = %self.session.contract_address(),
            pubsub = self.session.supports_pubsub(),
            "listening for Mint events"
        );

        while let Some(log) = logs.next().await {
            match decode_mint(&log) {
                Ok(event) => {
                    debug!(
                        block = ?event.block_number,
                        tx = ?event.tx_hash,
                        "Mint log received"
                    );
                    if self.signal_tx.send(ListenerSignal::Mint(event)).is_err() {
                        return Ok(());
                    }
                }
                Err(e) => {
                    warn!(error = %e, tx = ?log.transaction_hash, "failed to decode Mint log");
                }
            }
        }

        // Stream ended, caller decides whether to re-subscribe
        Ok(())
    }

    async fn open_log_stream(&self) -> anyhow::Result<BoxStream<'static, Log>> {
        let provider = self.session.provider();
        let filter = self.session.mint_filter();

        if self.session.supports_pubsub() {
            let sub = provider.subscribe_logs(&filter).await?;
            Ok(sub.into_stream().boxed())
        } else {
            let poller = provider
                .watch_logs(&filter)
                .await?
                .with_poll_interval(self.session.poll_interval());
            Ok(poller.into_stream().flat_map(stream::iter).boxed())
        }
    }
}

/// Decode a raw log into a `MintEvent`, copying receiver and amount verbatim.
pub fn decode_mint(log: &Log) -> Result<MintEvent, alloy::sol_types::Error> {
    let decoded = log.log_decode::<Mint>()?;
    let Mint { receiver, amount } = decoded.inner.data;
    Ok(MintEvent {
        receiver,
        amount,
        block_number: log.block_number,
        tx_hash: log.transaction_hash,
    })
}

fn backoff_for(consecutive_failures: u32) -> Duration {
    if consecutive_failures == 0 {
        return INITIAL_BACKOFF;
    }
    let secs = INITIAL_BACKOFF
        .as_secs()
        .saturating_mul(2u64.saturating_pow(consecutive_failures.min(5)));
    Duration::from_secs(secs).min(MAX_BACKOFF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, Bytes, B256, U256};
    use alloy::sol_types::SolEvent;

    fn mint_log(receiver: Address, amount: U256) -> Log {
        let data = Mint { receiver, amount }.encode_data();
        Log {
            inner: alloy::primitives::Log::new_unchecked(
                Address::repeat_byte(0x11),
                vec![Mint::SIGNATURE_HASH],
                Bytes::from(data),
            ),
            block_number: Some(42),
            transaction_hash: Some(B256::repeat_byte(0x77)),
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_mint_copies_payload() {
        let receiver = Address::repeat_byte(0xab);
        // Larger than u64 to exercise the full uint256 range.
        let amount = U256::from(u128::MAX) + U256::from(1);

        let event = decode_mint(&mint_log(receiver, amount)).unwrap();
        assert_eq!(event.receiver, receiver);
        assert_eq!(event.amount, amount);
        assert_eq!(event.block_number, Some(42));
        assert_eq!(event.tx_hash, Some(B256::repeat_byte(0x77)));
    }

    #[test]
    fn test_decode_rejects_truncated_data() {
        let log = Log {
            inner: alloy::primitives::Log::new_unchecked(
                Address::repeat_byte(0x11),
                vec![Mint::SIGNATURE_HASH],
                Bytes::from(vec![0u8; 16]),
            ),
            ..Default::default()
        };
        assert!(decode_mint(&log).is_err());
    }

    #[test]
    fn test_backoff_is_bounded() {
        assert_eq!(backoff_for(0), Duration::from_secs(1));
        assert_eq!(backoff_for(1), Duration::from_secs(2));
        assert_eq!(backoff_for(3), Duration::from_secs(8));
        assert_eq!(backoff_for(10), MAX_BACKOFF);
    }
}
