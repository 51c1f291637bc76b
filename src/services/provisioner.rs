//! Margin Account Provisioner
//!
//! Ensures a margin account exists, creating it at most once, then reports its
//! current state. On-chain reverts during creation are logged and carried in
//! the report; every other failure aborts.

use serde::Serialize;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};
use tracing::{debug, info, warn};

use crate::config::ConfirmationConfig;
use crate::error::{ProvisionError, Result};
use crate::escrow::{find_margin_account_pda, init_margin_account, AccountState, MarginAccountSeeds};
use crate::rpc::confirm::{wait_for_confirmation, ConfirmationOutcome};
use crate::rpc::ChainRpc;

/// What the provisioning step did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProvisionOutcome {
    /// Account already existed, nothing was submitted
    Skipped,
    Created { signature: String },
    /// Init transaction failed on-chain or in preflight
    Reverted { signature: Option<String>, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvisionReport {
    #[serde(serialize_with = "crate::escrow::state::serialize_pubkey")]
    pub address: Pubkey,
    pub outcome: ProvisionOutcome,
    /// Terminal status of the init transaction, when one was confirmed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<ConfirmationOutcome>,
    pub state: AccountState,
}

impl ProvisionReport {
    pub fn advisory(&self) -> Option<&str> {
        match &self.outcome {
            ProvisionOutcome::Reverted { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// Options that shape a provisioning run beyond the seeds
#[derive(Debug, Clone, Default)]
pub struct ProvisionSettings {
    /// Name stored in the account on creation
    pub margin_name: String,
    pub confirmation: ConfirmationConfig,
}

pub struct Provisioner<C> {
    rpc: C,
    settings: ProvisionSettings,
}

impl<C: ChainRpc> Provisioner<C> {
    pub fn new(rpc: C, settings: ProvisionSettings) -> Self {
        Self { rpc, settings }
    }

    /// Derive, check, create if missing, re-read.
    pub async fn ensure_provisioned(&self, seeds: &MarginAccountSeeds, identity: &Keypair) -> Result<ProvisionReport> {
        let derived = find_margin_account_pda(seeds)?;
        let address = derived.address;
        debug!("Derived margin account {} (bump {}) for margin #{}", address, derived.bump, seeds.margin_nr);

        let existing = self.read(&address).await?;

        let (outcome, confirmation) = if existing.exists {
            info!("Margin account {} already exists, skipping initialization", address);
            (ProvisionOutcome::Skipped, None)
        } else {
            info!("Margin account {} not found, initializing", address);
            match self.create(seeds, identity).await {
                Ok(confirmation) => {
                    let outcome = match &confirmation.err {
                        None => {
                            info!("✅ Margin account initialized: {}", confirmation.signature);
                            ProvisionOutcome::Created { signature: confirmation.signature.clone() }
                        }
                        Some(reason) => {
                            warn!("Transaction {} failed with error: {}", confirmation.signature, reason);
                            ProvisionOutcome::Reverted {
                                signature: Some(confirmation.signature.clone()),
                                reason: reason.clone(),
                            }
                        }
                    };
                    (outcome, Some(confirmation))
                }
                Err(ProvisionError::ExecutionReverted(reason)) => {
                    warn!("Transaction rejected in preflight: {}", reason);
                    (ProvisionOutcome::Reverted { signature: None, reason }, None)
                }
                Err(e) => return Err(e),
            }
        };

        let state = self.read(&address).await?;
        Ok(ProvisionReport { address, outcome, confirmation, state })
    }

    /// Fresh snapshot of `address`
    pub async fn read(&self, address: &Pubkey) -> Result<AccountState> {
        let account = self.rpc.get_account(address).await?;
        AccountState::from_account(*address, account.as_ref())
    }

    /// Build, sign, submit and confirm the init transaction
    async fn create(&self, seeds: &MarginAccountSeeds, identity: &Keypair) -> Result<ConfirmationOutcome> {
        if seeds.owner != identity.pubkey() {
            return Err(ProvisionError::BuilderRejected(format!(
                "seed owner {} does not match signer {}",
                seeds.owner,
                identity.pubkey()
            )));
        }
        let instruction = init_margin_account(seeds, &self.settings.margin_name)?;

        let recent_blockhash = self.rpc.latest_blockhash().await?;
        let transaction = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&identity.pubkey()),
            &[identity],
            recent_blockhash,
        );

        let signature = self.rpc.send_transaction(&transaction).await?;
        info!("Submitted init transaction {}", signature);

        let confirmation = &self.settings.confirmation;
        let outcome =
            wait_for_confirmation(&self.rpc, &signature, confirmation.timeout, confirmation.poll_interval).await?;
        debug!("Confirmation: {:?}", outcome);
        Ok(outcome)
    }
}
