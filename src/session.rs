use std::sync::Arc;

use log::{debug, info, warn};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, signer::Signer};

use crate::{
    composer::WagerTransactionBuilder,
    config::{Preset, WagerConfig},
    error::{SubmissionFailure, WagerError, WagerResult},
    escrow::new_escrow,
    instruction::Side,
    rpc::LedgerRpc,
    signer::{sign, WalletSigner},
    submit::{await_confirmation, submit, ConfirmOptions, ConfirmationState},
};

/// A wager handed to the network whose outcome is not known yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingWager {
    pub signature: Signature,
    pub escrow: Pubkey,
    /// Bounds how long the wager can still land
    pub recent_blockhash: Hash,
}

/// Outcome of one wager that reached the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WagerReceipt {
    pub signature: Signature,
    pub escrow: Pubkey,
    pub state: ConfirmationState,
}

/// A ledger connection plus, while connected, the player's wallet.
///
/// Wagers are not coordinated with each other; a caller placing several from the
/// same wallet should await each one before starting the next.
pub struct WagerSession<R: LedgerRpc + ?Sized> {
    rpc: Arc<R>,
    config: WagerConfig,
    wallet: Option<Arc<dyn WalletSigner>>,
}

impl WagerSession<RpcClient> {
    /// Session against the cluster named in `config`, with no wallet yet.
    pub fn for_cluster(config: WagerConfig) -> Self {
        let rpc = RpcClient::new_with_commitment(config.cluster.url().to_string(), config.commitment);
        Self::new(Arc::new(rpc), config)
    }
}

impl<R: LedgerRpc + ?Sized> WagerSession<R> {
    pub fn new(rpc: Arc<R>, config: WagerConfig) -> Self {
        Self {
            rpc,
            config,
            wallet: None,
        }
    }

    pub fn config(&self) -> &WagerConfig {
        &self.config
    }

    /// Attaches a wallet, replacing any previous one, and returns its public key.
    pub fn connect(&mut self, wallet: Arc<dyn WalletSigner>) -> Pubkey {
        let pubkey = wallet.pubkey();
        self.wallet = Some(wallet);
        info!("[connect] {}", pubkey);
        pubkey
    }

    pub fn disconnect(&mut self) -> Option<Pubkey> {
        let pubkey = self.wallet.take().map(|wallet| wallet.pubkey());
        if let Some(pubkey) = pubkey {
            info!("[disconnect] {}", pubkey);
        }
        pubkey
    }

    pub fn wallet_pubkey(&self) -> Option<Pubkey> {
        self.wallet.as_ref().map(|wallet| wallet.pubkey())
    }

    /// Places a wager of `lamports` on `side` (0 heads, 1 tails) and waits for it.
    ///
    /// [`send_wager`](Self::send_wager) followed by [`confirm_wager`](Self::confirm_wager).
    /// Errors mean nothing reached the ledger. Once the transaction may have gone
    /// out the result is always a receipt, whose state is `Expired` when the
    /// outcome could not be observed in time.
    pub async fn place_wager(&self, side: u8, lamports: u64) -> WagerResult<WagerReceipt> {
        let pending = self.send_wager(side, lamports).await?;
        let state = self.confirm_wager(&pending).await;
        Ok(WagerReceipt {
            signature: pending.signature,
            escrow: pending.escrow,
            state,
        })
    }

    /// Runs fresh escrow, compose, sign and submit, returning as soon as the
    /// transaction is out.
    ///
    /// A broadcast that fails in transit still yields a pending wager: the
    /// signature is the transaction's first signature and is known locally, so
    /// the caller can confirm it like any other.
    pub async fn send_wager(&self, side: u8, lamports: u64) -> WagerResult<PendingWager> {
        let escrow = new_escrow();
        let builder = WagerTransactionBuilder::new(
            self.wallet_pubkey(),
            escrow.pubkey(),
            lamports,
            side,
            self.config.accounts,
        )?
        .space(self.config.escrow_space);

        let transaction = builder
            .compose(self.rpc.as_ref())
            .await?
            .ok_or(WagerError::NoWallet)?;
        let wallet = self.wallet.as_ref().ok_or(WagerError::NoWallet)?;

        debug!("requesting wallet signature for escrow {}", escrow.pubkey());
        let signed = sign(transaction, wallet.as_ref(), &escrow).await?;

        let signature = match submit(self.rpc.as_ref(), &signed).await {
            Ok(signature) => signature,
            Err(WagerError::Submission { reason }) if reason.is_unknown() => {
                let signature = signed.signatures[0];
                warn!("{} may have been sent ({}), confirming anyway", signature, reason);
                signature
            }
            Err(e) => return Err(e),
        };

        Ok(PendingWager {
            signature,
            escrow: escrow.pubkey(),
            recent_blockhash: signed.message.recent_blockhash,
        })
    }

    /// Waits until a sent wager is confirmed, fails, or can no longer land.
    pub async fn confirm_wager(&self, pending: &PendingWager) -> ConfirmationState {
        await_confirmation(
            self.rpc.as_ref(),
            &pending.signature,
            &pending.recent_blockhash,
            ConfirmOptions::from(&self.config),
        )
        .await
    }

    pub async fn place_preset(&self, side: Side, preset: Preset) -> WagerResult<WagerReceipt> {
        self.place_wager(side as u8, preset.lamports()).await
    }

    pub async fn send_preset(&self, side: Side, preset: Preset) -> WagerResult<PendingWager> {
        self.send_wager(side as u8, preset.lamports()).await
    }

    /// Requests test funds for the connected wallet and waits for them to land.
    pub async fn airdrop(&self, lamports: u64) -> WagerResult<Signature> {
        if !self.config.cluster.allows_airdrop() {
            return Err(WagerError::Config(format!(
                "airdrops are not available on {}",
                self.config.cluster
            )));
        }
        let pubkey = self.wallet_pubkey().ok_or(WagerError::NoWallet)?;

        // anchors the confirmation wait; the faucet's own blockhash is at least this new
        let anchor = self
            .rpc
            .get_latest_blockhash()
            .await
            .map_err(WagerError::Composition)?;
        let signature = self
            .rpc
            .request_airdrop(&pubkey, lamports)
            .await
            .map_err(|e| WagerError::Submission {
                reason: SubmissionFailure::from_client_error(&e),
            })?;
        info!("Airdrop Transaction Signature: {}", signature);

        await_confirmation(
            self.rpc.as_ref(),
            &signature,
            &anchor,
            ConfirmOptions::from(&self.config),
        )
        .await
        .into_result(signature)?;
        Ok(signature)
    }
}
