use std::time::Duration;

use serde::Serialize;
use solana_sdk::signature::Signature;
use tokio::time::{sleep, Instant};

use super::ChainRpc;
use crate::config::MAX_CONFIRM_TIMEOUT_SECS;
use crate::error::{ProvisionError, Result};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Terminal status of a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationOutcome {
    pub signature: String,
    /// On-chain error, `None` on success
    pub err: Option<String>,
}

/// Poll the signature status until it is terminal or `timeout` elapses.
///
/// Status lookups that fail at the transport level count as "not yet" so a
/// single dropped poll does not abort the wait. The window is capped at
/// `MAX_CONFIRM_TIMEOUT_SECS` and the interval floored at 1ms.
pub async fn wait_for_confirmation<C: ChainRpc + ?Sized>(
    rpc: &C,
    signature: &Signature,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<ConfirmationOutcome> {
    let timeout = timeout.min(Duration::from_secs(MAX_CONFIRM_TIMEOUT_SECS));
    let poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
    let deadline = Instant::now() + timeout;

    loop {
        match rpc.signature_status(signature).await {
            Ok(Some(status)) => {
                return Ok(ConfirmationOutcome {
                    signature: signature.to_string(),
                    err: status.err().map(|e| e.to_string()),
                });
            }
            Ok(None) => tracing::debug!("{} not yet confirmed", signature),
            Err(e) => tracing::warn!("status poll for {} failed: {}", signature, e),
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(ProvisionError::ConfirmationTimeout {
                signature: signature.to_string(),
                timeout,
            });
        }
        sleep(poll_interval.min(deadline - now)).await;
    }
}
