//! # RPC Module
//!
//! Network side of provisioning. [`ChainRpc`] is the seam the provisioner
//! talks to; [`SolanaRpc`] implements it on top of the nonblocking
//! `solana_client` RPC client.

use std::sync::Arc;

use async_trait::async_trait;
use solana_client::{client_error::ClientError, nonblocking::rpc_client::RpcClient};
use solana_sdk::{
    account::Account,
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::{Transaction, TransactionError},
};

use crate::error::{ProvisionError, Result};

/// Bounded signature confirmation
pub mod confirm;

#[cfg(test)]
pub(crate) mod mock;

/// Terminal status of a processed transaction: `Ok(())` or the on-chain error
pub type TransactionStatus = std::result::Result<(), TransactionError>;

#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Fetch an account, `None` when nothing lives at `address`
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>>;

    /// Recent blockhash used as the transaction freshness token
    async fn latest_blockhash(&self) -> Result<Hash>;

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature>;

    /// `None` while the transaction has not reached the configured commitment
    async fn signature_status(&self, signature: &Signature) -> Result<Option<TransactionStatus>>;
}

#[async_trait]
impl<T: ChainRpc + ?Sized> ChainRpc for Arc<T> {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>> {
        (**self).get_account(address).await
    }

    async fn latest_blockhash(&self) -> Result<Hash> {
        (**self).latest_blockhash().await
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        (**self).send_transaction(transaction).await
    }

    async fn signature_status(&self, signature: &Signature) -> Result<Option<TransactionStatus>> {
        (**self).signature_status(signature).await
    }
}

/// Solana JSON-RPC backed implementation
pub struct SolanaRpc {
    rpc_client: RpcClient,
}

impl SolanaRpc {
    pub fn new(rpc_url: &str, commitment: CommitmentConfig) -> Self {
        Self {
            rpc_client: RpcClient::new_with_commitment(rpc_url.to_string(), commitment),
        }
    }

    pub fn url(&self) -> String {
        self.rpc_client.url()
    }
}

fn network_error(err: ClientError) -> ProvisionError {
    ProvisionError::NetworkUnavailable(err.to_string())
}

#[async_trait]
impl ChainRpc for SolanaRpc {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>> {
        let response = self
            .rpc_client
            .get_account_with_commitment(address, self.rpc_client.commitment())
            .await
            .map_err(network_error)?;
        Ok(response.value)
    }

    async fn latest_blockhash(&self) -> Result<Hash> {
        self.rpc_client.get_latest_blockhash().await.map_err(network_error)
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        self.rpc_client
            .send_transaction(transaction)
            .await
            .map_err(|err| match err.get_transaction_error() {
                // Preflight simulation ran the program and it failed
                Some(tx_err) => ProvisionError::ExecutionReverted(tx_err.to_string()),
                None => ProvisionError::SubmissionFailed(err.to_string()),
            })
    }

    async fn signature_status(&self, signature: &Signature) -> Result<Option<TransactionStatus>> {
        self.rpc_client
            .get_signature_status_with_commitment(signature, self.rpc_client.commitment())
            .await
            .map_err(network_error)
    }
}
