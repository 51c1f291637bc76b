//! Error type shared by every provisioning step.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Seeds could not be turned into a program derived address.
    #[error("invalid margin account seeds: {0}")]
    InvalidSeeds(String),

    /// The RPC endpoint could not be reached or answered with a transport error.
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("instruction builder rejected input: {0}")]
    BuilderRejected(String),

    #[error("transaction submission failed: {0}")]
    SubmissionFailed(String),

    #[error("transaction {signature} not confirmed within {timeout:?}")]
    ConfirmationTimeout { signature: String, timeout: Duration },

    /// The transaction reached the chain (or preflight) and the program returned an error.
    #[error("transaction execution reverted: {0}")]
    ExecutionReverted(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("account {address} is not a margin account: {reason}")]
    InvalidAccountData { address: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
