//! Burn executor.
//!
//! Turns the pending reaction into a `burn(receiver, amount)` transaction,
//! waits for it to be mined, and always empties the slot afterwards. Failures
//! are logged and dropped; nothing is retried and nothing is returned as an
//! error to the trigger.

use crate::config::TriggerPolicy;
use crate::reaction::slot::ReactionSlot;
use crate::reaction::{BurnError, BurnOutcome, BurnReceipt, BurnSubmitter, PendingReaction};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct ReactionExecutor<S> {
    submitter: Arc<S>,
    slot: ReactionSlot,
    policy: TriggerPolicy,
}

/// Empties the slot when dropped, so cleanup also happens if the burn task is
/// cancelled or panics mid-flight.
struct ClearOnExit<'a> {
    slot: &'a ReactionSlot,
    /// `Some(seq)` clears only that reaction; `None` clears whatever is there.
    only_seq: Option<u64>,
}

impl Drop for ClearOnExit<'_> {
    fn drop(&mut self) {
        match self.only_seq {
            Some(seq) => {
                if !self.slot.clear_if(seq) {
                    debug!(seq, "slot already holds a newer reaction, leaving it");
                }
            }
            None => {
                self.slot.clear();
            }
        }
    }
}

impl<S: BurnSubmitter> ReactionExecutor<S> {
    pub fn new(submitter: Arc<S>, slot: ReactionSlot, policy: TriggerPolicy) -> Self {
        Self {
            submitter,
            slot,
            policy,
        }
    }

    pub fn policy(&self) -> TriggerPolicy {
        self.policy
    }

    /// Fire one trigger. `armed_seq` is the sequence number of the reaction
    /// that scheduled it; only the `Supersede` policy looks at it.
    pub async fn execute_burn(&self, armed_seq: u64) -> BurnOutcome {
        let Some((seq, reaction)) = self.slot.get() else {
            warn!("no pending reaction found for burning");
            return BurnOutcome::NoPending;
        };

        let only_seq = match self.policy {
            TriggerPolicy::ActOnLatest => None,
            TriggerPolicy::Supersede if seq != armed_seq => {
                debug!(armed_seq, pending_seq = seq, "trigger superseded by a later Mint");
                return BurnOutcome::Superseded;
            }
            TriggerPolicy::Supersede => Some(seq),
        };
        let _cleanup = ClearOnExit {
            slot: &self.slot,
            only_seq,
        };

        match self.burn(&reaction).await {
            Ok(receipt) => {
                info!(
                    receiver = %reaction.receiver,
                    amount = %reaction.amount,
                    tx_hash = %receipt.tx_hash,
                    block = ?receipt.block_number,
                    gas_used = receipt.gas_used,
                    "burn transaction confirmed"
                );
                BurnOutcome::Confirmed { reaction, receipt }
            }
            Err(error) => {
                error!(
                    receiver = %reaction.receiver,
                    amount = %reaction.amount,
                    error = %error,
                    "error executing burn"
                );
                BurnOutcome::Failed { reaction, error }
            }
        }
    }

    async fn burn(&self, reaction: &PendingReaction) -> Result<BurnReceipt, BurnError> {
        let tx_hash = self
            .submitter
            .submit_burn(reaction.receiver, reaction.amount)
            .await?;
        info!(tx_hash = %tx_hash, "burn transaction sent");

        self.submitter.confirm_burn(tx_hash).await
    }
}
