//! Signal types emitted by the Mint listener.

use alloy::primitives::{Address, B256, U256};

/// A decoded `Mint(address receiver, uint256 amount)` log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintEvent {
    pub receiver: Address,
    pub amount: U256,
    pub block_number: Option<u64>,
    pub tx_hash: Option<B256>,
}

/// Signals emitted by the listener, consumed by the main event loop.
#[derive(Debug, Clone)]
pub enum ListenerSignal {
    /// The contract emitted a Mint event.
    Mint(MintEvent),

    /// The log subscription (or filter poller) is live.
    Connected,

    /// The subscription failed or ended (will re-subscribe).
    Disconnected {
        reason: String,
    },
}

impl std::fmt::Display for ListenerSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mint(event) => {
                write!(f, "Mint(receiver={}, amount={})", event.receiver, event.amount)
            }
            Self::Connected => write!(f, "Connected"),
            Self::Disconnected { reason } => write!(f, "Disconnected({})", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_display() {
        let mint = ListenerSignal::Mint(MintEvent {
            receiver: Address::repeat_byte(0xab),
            amount: U256::from(100),
            block_number: None,
            tx_hash: None,
        });
        let rendered = mint.to_string();
        assert!(rendered.starts_with("Mint(receiver=0x"));
        assert!(rendered.ends_with("amount=100)"));

        assert_eq!(ListenerSignal::Connected.to_string(), "Connected");
        let down = ListenerSignal::Disconnected {
            reason: "stream ended".to_string(),
        };
        assert_eq!(down.to_string(), "Disconnected(stream ended)");
    }
}
