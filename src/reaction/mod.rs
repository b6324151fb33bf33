//! Mint-to-burn reaction pipeline.
//!
//! Every observed Mint is recorded in a single pending slot and arms a
//! one-shot trigger that fires after a fixed delay (60s by default). When the
//! trigger fires, the executor burns whatever the slot holds and then empties
//! it, whether the burn succeeded or not.
//!
//! - A second Mint before the trigger fires overwrites the slot (no queue)
//! - Triggers cannot be cancelled; with the default policy an early trigger
//!   acts on the newer data and the later one finds the slot empty, or, if
//!   the first burn is still confirming, burns the same reaction again
//! - `TriggerPolicy::Supersede` instead gives each reaction its own timer

pub mod executor;
pub mod slot;

pub use executor::ReactionExecutor;
pub use slot::ReactionSlot;

use crate::config::{ReactionConfig, TriggerPolicy};
use crate::onchain::MintEvent;
use alloy::primitives::{Address, B256, U256};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

/// The one unit of work waiting for its compensating burn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingReaction {
    pub receiver: Address,
    pub amount: U256,
}

impl From<&MintEvent> for PendingReaction {
    fn from(event: &MintEvent) -> Self {
        Self {
            receiver: event.receiver,
            amount: event.amount,
        }
    }
}

#[derive(Error, Debug)]
pub enum BurnError {
    #[error("burn submission failed: {reason}")]
    Submit { reason: String },
    #[error("burn {tx_hash} was not confirmed: {reason}")]
    Confirm { tx_hash: B256, reason: String },
    #[error("burn {tx_hash} reverted")]
    Reverted { tx_hash: B256 },
}

/// A mined, successful burn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurnReceipt {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// What a single trigger firing did.
#[derive(Debug)]
pub enum BurnOutcome {
    /// The slot was empty; nothing was sent.
    NoPending,
    /// The slot holds a newer reaction with its own trigger (`Supersede` only).
    Superseded,
    Confirmed {
        reaction: PendingReaction,
        receipt: BurnReceipt,
    },
    /// Submission or confirmation failed. Logged and dropped.
    Failed {
        reaction: PendingReaction,
        error: BurnError,
    },
}

/// Capability to send `burn(receiver, amount)` and wait for it to be mined.
pub trait BurnSubmitter: Send + Sync + 'static {
    /// Sign and broadcast the burn, returning its transaction hash.
    fn submit_burn(
        &self,
        receiver: Address,
        amount: U256,
    ) -> impl Future<Output = Result<B256, BurnError>> + Send;

    /// Wait until `tx_hash` is mined with a successful status.
    fn confirm_burn(
        &self,
        tx_hash: B256,
    ) -> impl Future<Output = Result<BurnReceipt, BurnError>> + Send;
}

/// Listener-side entry point: records Mints and arms the delayed triggers.
pub struct ReactionPipeline<S> {
    slot: ReactionSlot,
    executor: Arc<ReactionExecutor<S>>,
    delay: Duration,
}

impl<S: BurnSubmitter> ReactionPipeline<S> {
    pub fn new(submitter: Arc<S>, config: &ReactionConfig) -> Self {
        let slot = ReactionSlot::new();
        let executor = ReactionExecutor::new(submitter, slot.clone(), config.trigger_policy);
        Self {
            slot,
            executor: Arc::new(executor),
            delay: config.delay(),
        }
    }

    pub fn slot(&self) -> &ReactionSlot {
        &self.slot
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn policy(&self) -> TriggerPolicy {
        self.executor.policy()
    }

    /// Record the Mint as the pending reaction and schedule exactly one
    /// burn trigger `delay` from now. Must be called inside a tokio runtime.
    ///
    /// The returned handle can be dropped; the trigger runs regardless.
    pub fn on_mint(&self, event: &MintEvent) -> JoinHandle<BurnOutcome> {
        // Deadline is fixed here, not when the spawned task first runs.
        let deadline = Instant::now() + self.delay;

        info!(
            receiver = %event.receiver,
            amount = %event.amount,
            "Mint event detected"
        );

        let (seq, replaced) = self.slot.store(PendingReaction::from(event));
        if let Some(previous) = replaced {
            debug!(
                receiver = %previous.receiver,
                amount = %previous.amount,
                "overwrote unfired reaction"
            );
        }

        let executor = Arc::clone(&self.executor);
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            executor.execute_burn(seq).await
        })
    }
}
