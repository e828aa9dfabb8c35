use solana_client::{
    client_error::{ClientError, ClientErrorKind},
    rpc_request::RpcError,
};
use solana_sdk::{signature::Signature, signer::SignerError, transaction::TransactionError};
use thiserror::Error;

/// Why the ledger refused a signed wager at submission time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionFailure {
    /// The blockhash left the validity window between fetch and send
    #[error("blockhash expired before submission")]
    StaleBlockhash,
    /// Wallet cannot cover the wager plus fees
    #[error("insufficient funds")]
    InsufficientFunds,
    /// A declared signer did not sign
    #[error("transaction is missing a required signature")]
    UnderSigned,
    /// Any other rejection reported by the node
    #[error("{0}")]
    Rejected(String),
    /// The request failed in transit; the node may or may not have the transaction
    #[error("outcome unknown: {0}")]
    Unknown(String),
}

impl SubmissionFailure {
    pub fn from_client_error(err: &ClientError) -> Self {
        match err.get_transaction_error() {
            Some(TransactionError::BlockhashNotFound) => Self::StaleBlockhash,
            Some(TransactionError::InsufficientFundsForFee)
            | Some(TransactionError::InsufficientFundsForRent { .. }) => Self::InsufficientFunds,
            Some(TransactionError::SignatureFailure) => Self::UnderSigned,
            Some(other) => Self::Rejected(other.to_string()),
            None => match err.kind() {
                // the node answered, so it did not take the transaction
                ClientErrorKind::RpcError(RpcError::RpcResponseError { .. })
                | ClientErrorKind::SigningError(_) => Self::Rejected(err.to_string()),
                _ => Self::Unknown(err.to_string()),
            },
        }
    }

    /// True when the node may have accepted the transaction despite the error.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

#[derive(Error, Debug)]
pub enum WagerError {
    /// Payload is not a wager instruction this client understands
    #[error("Invalid Instruction")]
    InvalidInstruction,
    /// No wallet connected to the session
    #[error("No wallet connected")]
    NoWallet,
    /// Side must be 0 (heads) or 1 (tails)
    #[error("Invalid side {0}, expected 0 or 1")]
    InvalidSide(u8),
    /// Zero-lamport wagers are refused
    #[error("Wager amount must be greater than zero")]
    InvalidAmount,
    /// Blockhash fetch failed
    #[error("Failed to compose transaction: {0}")]
    Composition(#[source] ClientError),
    /// Wallet refused to sign or the user closed the prompt
    #[error("Signing failed: {0}")]
    Signing(#[from] SignerError),
    /// Broadcast failed, see `reason` for whether anything got through
    #[error("Submission rejected: {reason}")]
    Submission { reason: SubmissionFailure },
    /// Sent, but not finalized before its blockhash expired
    #[error("Transaction {signature} was not confirmed before its blockhash expired")]
    ConfirmationTimeout { signature: Signature },
    /// Sent and executed, but the program rejected it
    #[error("Transaction {signature} failed on-chain: {error}")]
    ConfirmationFailed {
        signature: Signature,
        error: TransactionError,
    },
    /// Bad environment value, keypair file or cluster choice
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl WagerError {
    /// True when the failure happened before anything reached the network.
    ///
    /// A submission rejection also counts: the node refused the transaction
    /// outright, so nothing will land. A submission lost in transit does not,
    /// and neither do confirmation outcomes.
    pub fn nothing_sent(&self) -> bool {
        match self {
            WagerError::Submission { reason } => !reason.is_unknown(),
            WagerError::ConfirmationTimeout { .. } | WagerError::ConfirmationFailed { .. } => false,
            _ => true,
        }
    }
}

pub type WagerResult<T> = Result<T, WagerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use solana_client::rpc_request::RpcResponseErrorData;
    use std::io;

    #[test]
    fn classifies_stale_blockhash() {
        let err = ClientError::from(TransactionError::BlockhashNotFound);
        assert_eq!(
            SubmissionFailure::from_client_error(&err),
            SubmissionFailure::StaleBlockhash
        );
    }

    #[test]
    fn classifies_missing_signature() {
        let err = ClientError::from(TransactionError::SignatureFailure);
        assert_eq!(
            SubmissionFailure::from_client_error(&err),
            SubmissionFailure::UnderSigned
        );
    }

    #[test]
    fn node_error_responses_are_rejections() {
        let err = ClientError::from(RpcError::RpcResponseError {
            code: -32602,
            message: "invalid transaction".to_string(),
            data: RpcResponseErrorData::Empty,
        });
        assert!(matches!(
            SubmissionFailure::from_client_error(&err),
            SubmissionFailure::Rejected(msg) if msg.contains("invalid transaction")
        ));
    }

    #[test]
    fn transport_errors_leave_the_outcome_unknown() {
        let timed_out = ClientError::from(io::Error::new(io::ErrorKind::TimedOut, "request timed out"));
        let reset = ClientError::from(ClientErrorKind::Custom("connection reset".to_string()));
        for err in [timed_out, reset] {
            let reason = SubmissionFailure::from_client_error(&err);
            assert!(reason.is_unknown());
            assert!(!WagerError::Submission { reason }.nothing_sent());
        }
    }

    #[test]
    fn only_unanswered_sends_and_confirmation_outcomes_count_as_sent() {
        assert!(WagerError::NoWallet.nothing_sent());
        assert!(WagerError::InvalidSide(50).nothing_sent());
        assert!(WagerError::Signing(SignerError::UserCancel("closed".into())).nothing_sent());
        assert!(WagerError::Submission {
            reason: SubmissionFailure::StaleBlockhash
        }
        .nothing_sent());
        assert!(!WagerError::ConfirmationTimeout {
            signature: Signature::default()
        }
        .nothing_sent());
    }
}
