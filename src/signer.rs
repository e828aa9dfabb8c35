use std::path::Path;

use async_trait::async_trait;
use log::{debug, warn};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair},
    signer::{Signer, SignerError},
    transaction::Transaction,
};

use crate::error::{WagerError, WagerResult};

/// An external wallet able to sign on behalf of its public key.
///
/// The secret key never crosses this boundary. Signing may suspend for as long
/// as the wallet needs (a user prompt, a hardware device); a closed prompt comes
/// back as [`SignerError::UserCancel`].
#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    async fn sign_transaction(&self, transaction: Transaction) -> Result<Transaction, SignerError>;
}

/// A wallet backed by a keypair held in process, e.g. loaded from a CLI keypair file.
pub struct KeypairWallet {
    keypair: Keypair,
}

impl KeypairWallet {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> WagerResult<Self> {
        let path = path.as_ref();
        let keypair = read_keypair_file(path)
            .map_err(|e| WagerError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(Self::new(keypair))
    }
}

#[async_trait]
impl WalletSigner for KeypairWallet {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transaction(&self, mut transaction: Transaction) -> Result<Transaction, SignerError> {
        let blockhash = transaction.message.recent_blockhash;
        transaction.try_partial_sign(&[&self.keypair], blockhash)?;
        Ok(transaction)
    }
}

/// Produces a fully signed wager transaction.
///
/// The escrow co-signs locally first, since `create_account` needs the new
/// account's own authorization. The wallet signs second. The result is verified
/// before it is handed back so a wallet that altered the message, or skipped
/// its signature, fails here instead of at the node.
pub async fn sign<S>(mut transaction: Transaction, wallet: &S, escrow: &Keypair) -> WagerResult<Transaction>
where
    S: WalletSigner + ?Sized,
{
    let blockhash = transaction.message.recent_blockhash;
    transaction.try_partial_sign(&[escrow], blockhash)?;
    debug!("escrow {} co-signed", escrow.pubkey());

    let signed = match wallet.sign_transaction(transaction).await {
        Ok(signed) => signed,
        Err(SignerError::UserCancel(reason)) => {
            warn!("wallet signing cancelled: {}", reason);
            return Err(SignerError::UserCancel(reason).into());
        }
        Err(e) => return Err(e.into()),
    };

    signed.verify().map_err(SignerError::TransactionError)?;
    Ok(signed)
}
