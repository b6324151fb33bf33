//! On-chain side of the bot.
//!
//! - `ChainSession`: signer + provider + contract handle, created once at
//!   startup and shared by the listener and the burn executor
//! - `MintListener`: background task that subscribes to (or polls for) `Mint`
//!   logs and forwards them as `ListenerSignal`s over a `tokio::sync::mpsc`
//!   channel
//! - The main event loop in `main.rs` routes each Mint into the reaction
//!   pipeline

pub mod abi;
pub mod listener;
pub mod session;
pub mod types;

pub use listener::MintListener;
pub use session::{ChainError, ChainSession};
pub use types::{ListenerSignal, MintEvent};
