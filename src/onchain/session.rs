//! The chain session: signer, provider and contract handle, built once at
//! startup and shared (read-only) by the listener and the burn executor.

use crate::config::ChainConfig;
use crate::onchain::abi::{Mint, MintBurnToken};
use crate::reaction::{BurnError, BurnReceipt, BurnSubmitter};

use alloy::network::{EthereumWallet, ReceiptResponse};
use alloy::primitives::{Address, B256, U256};
use alloy::providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy::rpc::types::{BlockNumberOrTag, Filter};
use alloy::signers::local::{LocalSignerError, PrivateKeySigner};
use alloy::sol_types::SolEvent;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("invalid private key (length {key_length}): {source}")]
    InvalidPrivateKey {
        key_length: usize,
        #[source]
        source: LocalSignerError,
    },
    #[error("invalid contract address {address:?}: {reason}")]
    InvalidContractAddress { address: String, reason: String },
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },
}

pub struct ChainSession {
    provider: DynProvider,
    contract: MintBurnToken::MintBurnTokenInstance<DynProvider>,
    signer_address: Address,
    required_confirmations: u64,
    poll_interval: Duration,
    pubsub: bool,
}

impl ChainSession {
    /// Parse the key and address, connect the signing provider and bind the
    /// contract. Any failure here is fatal for the bot.
    pub async fn connect(config: &ChainConfig) -> Result<Self, ChainError> {
        let signer = signer_from_private_key(&config.private_key)?;
        let signer_address = signer.address();

        let contract_address = Address::from_str(config.contract_address.trim()).map_err(|e| {
            ChainError::InvalidContractAddress {
                address: config.contract_address.clone(),
                reason: e.to_string(),
            }
        })?;

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect(&config.rpc_url)
            .await
            .map_err(|e| ChainError::Connect {
                url: config.rpc_url.clone(),
                reason: e.to_string(),
            })?
            .erased();

        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| ChainError::Connect {
                url: config.rpc_url.clone(),
                reason: e.to_string(),
            })?;

        let pubsub = supports_pubsub(&config.rpc_url);
        info!(
            chain_id,
            signer = %signer_address,
            contract = %contract_address,
            pubsub,
            "chain session established"
        );

        Ok(Self {
            contract: MintBurnToken::new(contract_address, provider.clone()),
            provider,
            signer_address,
            required_confirmations: config.required_confirmations,
            poll_interval: config.poll_interval(),
            pubsub,
        })
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    pub fn contract_address(&self) -> Address {
        *self.contract.address()
    }

    pub fn signer_address(&self) -> Address {
        self.signer_address
    }

    /// True when the endpoint can push logs (WebSocket / IPC) rather than
    /// needing filter polling.
    pub fn supports_pubsub(&self) -> bool {
        self.pubsub
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Log filter for Mint events on the watched contract, from the head onward.
    pub fn mint_filter(&self) -> Filter {
        mint_filter(self.contract_address())
    }
}

impl BurnSubmitter for ChainSession {
    async fn submit_burn(&self, receiver: Address, amount: U256) -> Result<B256, BurnError> {
        let pending = self
            .contract
            .burn(receiver, amount)
            .send()
            .await
            .map_err(|e| BurnError::Submit {
                reason: e.to_string(),
            })?;
        Ok(*pending.tx_hash())
    }

    async fn confirm_burn(&self, tx_hash: B256) -> Result<BurnReceipt, BurnError> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx_hash)
            .with_required_confirmations(self.required_confirmations)
            .get_receipt()
            .await
            .map_err(|e| BurnError::Confirm {
                tx_hash,
                reason: e.to_string(),
            })?;

        if !receipt.status() {
            return Err(BurnError::Reverted { tx_hash });
        }

        Ok(BurnReceipt {
            tx_hash,
            block_number: receipt.block_number(),
            gas_used: receipt.gas_used(),
        })
    }
}

pub fn signer_from_private_key(private_key: &str) -> Result<PrivateKeySigner, ChainError> {
    let private_key = private_key.trim();
    private_key
        .parse()
        .map_err(|e: LocalSignerError| ChainError::InvalidPrivateKey {
            key_length: private_key.len(),
            source: e,
        })
}

pub fn mint_filter(contract: Address) -> Filter {
    Filter::new()
        .address(contract)
        .event_signature(Mint::SIGNATURE_HASH)
        .from_block(BlockNumberOrTag::Latest)
}

fn supports_pubsub(url: &str) -> bool {
    let url = url.trim().to_ascii_lowercase();
    !(url.starts_with("http://") || url.starts_with("https://"))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known anvil/hardhat dev account #1.
    const DEV_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    #[test]
    fn test_signer_from_private_key() {
        let signer = signer_from_private_key(DEV_KEY).unwrap();
        assert_eq!(
            signer.address(),
            Address::from_str("0x70997970C51812dc3A010C7d01b50e0d17dc79C8").unwrap()
        );
    }

    #[test]
    fn test_signer_rejects_garbage() {
        let err = signer_from_private_key("not-a-key").unwrap_err();
        assert!(matches!(err, ChainError::InvalidPrivateKey { key_length: 9, .. }));
    }

    #[test]
    fn test_transport_detection() {
        assert!(supports_pubsub("wss://rpc.example.org"));
        assert!(supports_pubsub("ws://127.0.0.1:8545"));
        assert!(!supports_pubsub("https://rpc.example.org"));
        assert!(!supports_pubsub("HTTP://127.0.0.1:8545"));
    }

    #[test]
    fn test_mint_filter_targets_contract_and_topic() {
        let contract = Address::repeat_byte(0xab);
        let filter = mint_filter(contract);
        assert!(filter.address.matches(&contract));
        assert!(!filter.address.matches(&Address::repeat_byte(0xcd)));
        assert!(filter.topics[0].matches(&Mint::SIGNATURE_HASH));
    }
}
