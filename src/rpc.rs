use async_trait::async_trait;
use solana_client::{client_error::ClientError, nonblocking::rpc_client::RpcClient};
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::{self, Transaction},
};

/// The slice of ledger RPC the wager pipeline consumes.
///
/// Kept as a trait so the pipeline runs unchanged against a live cluster or an
/// in-memory ledger in tests.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Fetches a fresh blockhash to anchor a transaction.
    async fn get_latest_blockhash(&self) -> Result<Hash, ClientError>;

    /// Serializes and broadcasts a signed transaction. Acceptance into the
    /// pending pool says nothing about execution.
    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, ClientError>;

    /// `None` while the ledger has no record of the signature yet.
    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<transaction::Result<()>>, ClientError>;

    async fn is_blockhash_valid(&self, blockhash: &Hash) -> Result<bool, ClientError>;

    async fn request_airdrop(&self, pubkey: &Pubkey, lamports: u64) -> Result<Signature, ClientError>;
}

#[async_trait]
impl LedgerRpc for RpcClient {
    async fn get_latest_blockhash(&self) -> Result<Hash, ClientError> {
        RpcClient::get_latest_blockhash(self).await
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, ClientError> {
        RpcClient::send_transaction(self, transaction).await
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<transaction::Result<()>>, ClientError> {
        RpcClient::get_signature_status(self, signature).await
    }

    async fn is_blockhash_valid(&self, blockhash: &Hash) -> Result<bool, ClientError> {
        RpcClient::is_blockhash_valid(self, blockhash, self.commitment()).await
    }

    async fn request_airdrop(&self, pubkey: &Pubkey, lamports: u64) -> Result<Signature, ClientError> {
        RpcClient::request_airdrop(self, pubkey, lamports).await
    }
}
