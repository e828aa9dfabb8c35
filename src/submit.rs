use std::{fmt, time::Duration};

use log::{debug, info, warn};
use solana_sdk::{
    hash::Hash,
    signature::Signature,
    transaction::{Transaction, TransactionError},
};
use tokio::time::{sleep, Instant};

use crate::{
    config::WagerConfig,
    error::{SubmissionFailure, WagerError, WagerResult},
    rpc::LedgerRpc,
};

/// Where an accepted transaction ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationState {
    Confirmed,
    /// Executed and rejected by a program
    Failed(TransactionError),
    /// Never observed before its blockhash aged out; fate unknown
    Expired,
}

impl ConfirmationState {
    pub fn into_result(self, signature: Signature) -> WagerResult<()> {
        match self {
            ConfirmationState::Confirmed => Ok(()),
            ConfirmationState::Failed(error) => Err(WagerError::ConfirmationFailed { signature, error }),
            ConfirmationState::Expired => Err(WagerError::ConfirmationTimeout { signature }),
        }
    }
}

impl fmt::Display for ConfirmationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfirmationState::Confirmed => write!(f, "confirmed"),
            ConfirmationState::Failed(e) => write!(f, "failed: {}", e),
            ConfirmationState::Expired => write!(f, "expired"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConfirmOptions {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl From<&WagerConfig> for ConfirmOptions {
    fn from(config: &WagerConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            timeout: config.confirm_timeout,
        }
    }
}

/// Broadcasts a signed transaction. The returned signature only means the node
/// accepted it into the pending pool.
pub async fn submit<R>(rpc: &R, transaction: &Transaction) -> WagerResult<Signature>
where
    R: LedgerRpc + ?Sized,
{
    match rpc.send_transaction(transaction).await {
        Ok(signature) => {
            info!("Transaction Signature: {}", signature);
            Ok(signature)
        }
        Err(e) => {
            let reason = SubmissionFailure::from_client_error(&e);
            warn!("submission failed: {}", e);
            Err(WagerError::Submission { reason })
        }
    }
}

async fn poll_status<R>(rpc: &R, signature: &Signature) -> Option<ConfirmationState>
where
    R: LedgerRpc + ?Sized,
{
    match rpc.get_signature_status(signature).await {
        Ok(Some(Ok(()))) => Some(ConfirmationState::Confirmed),
        Ok(Some(Err(e))) => Some(ConfirmationState::Failed(e)),
        Ok(None) => None,
        Err(e) => {
            debug!("status poll for {} failed: {}", signature, e);
            None
        }
    }
}

/// Polls until the signature resolves or its blockhash leaves the validity window.
///
/// RPC errors while polling are not fatal: the transaction is already out, so a
/// flaky node only delays the answer. If nothing resolves before `timeout`, the
/// outcome is reported as [`ConfirmationState::Expired`].
pub async fn await_confirmation<R>(
    rpc: &R,
    signature: &Signature,
    recent_blockhash: &Hash,
    options: ConfirmOptions,
) -> ConfirmationState
where
    R: LedgerRpc + ?Sized,
{
    let deadline = Instant::now() + options.timeout;

    let state = loop {
        if let Some(state) = poll_status(rpc, signature).await {
            break state;
        }

        let expired = match rpc.is_blockhash_valid(recent_blockhash).await {
            Ok(valid) => !valid,
            Err(e) => {
                debug!("blockhash validity check failed: {}", e);
                false
            }
        };
        if expired || Instant::now() >= deadline {
            // it may have landed between the two calls
            break poll_status(rpc, signature)
                .await
                .unwrap_or(ConfirmationState::Expired);
        }

        sleep(options.poll_interval).await;
    };

    match &state {
        ConfirmationState::Confirmed => info!("{} confirmed", signature),
        ConfirmationState::Failed(e) => warn!("{} failed on-chain: {}", signature, e),
        ConfirmationState::Expired => warn!("{} expired before confirmation", signature),
    }
    state
}
