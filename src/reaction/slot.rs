//! Single-slot holder for the pending reaction.
//!
//! At most one reaction is pending at a time. A new Mint overwrites whatever
//! is there (last writer wins, no queue). Every stored reaction gets a fresh
//! sequence number so a trigger can tell whether the slot still holds the
//! reaction it was armed for.

use crate::reaction::PendingReaction;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct SlotState {
    current: Option<(u64, PendingReaction)>,
    next_seq: u64,
}

/// Shared handle to the slot. Clones point at the same slot.
///
/// The lock is only ever held for a short synchronous section and never
/// across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct ReactionSlot {
    inner: Arc<Mutex<SlotState>>,
}

impl ReactionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a reaction, replacing any unfired one. Returns the sequence
    /// number assigned to it and the reaction it displaced, if any.
    pub fn store(&self, reaction: PendingReaction) -> (u64, Option<PendingReaction>) {
        let mut state = self.lock();
        state.next_seq += 1;
        let seq = state.next_seq;
        let replaced = state.current.replace((seq, reaction)).map(|(_, r)| r);
        (seq, replaced)
    }

    /// Current reaction and its sequence number, left in place.
    pub fn get(&self) -> Option<(u64, PendingReaction)> {
        self.lock().current
    }

    pub fn peek(&self) -> Option<PendingReaction> {
        self.get().map(|(_, reaction)| reaction)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().current.is_none()
    }

    /// Empty the slot unconditionally.
    pub fn clear(&self) -> Option<PendingReaction> {
        self.lock().current.take().map(|(_, reaction)| reaction)
    }

    /// Empty the slot only if it still holds reaction `seq`.
    pub fn clear_if(&self, seq: u64) -> bool {
        let mut state = self.lock();
        match state.current {
            Some((current, _)) if current == seq => {
                state.current = None;
                true
            }
            _ => false,
        }
    }

    // A panic while holding the lock cannot leave the Option half-written.
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, U256};

    fn reaction(byte: u8, amount: u64) -> PendingReaction {
        PendingReaction {
            receiver: Address::repeat_byte(byte),
            amount: U256::from(amount),
        }
    }

    #[test]
    fn test_last_writer_wins() {
        let slot = ReactionSlot::new();
        assert!(slot.is_empty());

        let (first, replaced) = slot.store(reaction(0xab, 100));
        assert!(replaced.is_none());
        assert_eq!(slot.peek(), Some(reaction(0xab, 100)));

        let (second, replaced) = slot.store(reaction(0xde, 50));
        assert_eq!(replaced, Some(reaction(0xab, 100)));
        assert!(second > first);
        assert_eq!(slot.get(), Some((second, reaction(0xde, 50))));

        let (_, replaced) = slot.store(reaction(0x01, 1));
        assert_eq!(replaced, Some(reaction(0xde, 50)));
        assert_eq!(slot.peek(), Some(reaction(0x01, 1)));
    }

    #[test]
    fn test_clones_share_state() {
        let slot = ReactionSlot::new();
        let other = slot.clone();
        slot.store(reaction(0xab, 100));
        assert_eq!(other.peek(), Some(reaction(0xab, 100)));
        assert_eq!(other.clear(), Some(reaction(0xab, 100)));
        assert!(slot.is_empty());
        assert_eq!(slot.clear(), None);
    }

    #[test]
    fn test_clear_if_only_matches_current_seq() {
        let slot = ReactionSlot::new();
        let (stale, _) = slot.store(reaction(0xab, 100));
        let (fresh, _) = slot.store(reaction(0xde, 50));

        assert!(!slot.clear_if(stale));
        assert_eq!(slot.peek(), Some(reaction(0xde, 50)));

        assert!(slot.clear_if(fresh));
        assert!(slot.is_empty());
        assert!(!slot.clear_if(fresh));
    }
}
