pub mod composer;
pub mod config;
pub mod error;
pub mod escrow;
pub mod instruction;
pub mod rpc;
pub mod session;
pub mod signer;
pub mod submit;

pub use config::{Cluster, Preset, ProtocolAccounts, WagerConfig};
pub use error::{SubmissionFailure, WagerError, WagerResult};
pub use instruction::Side;
pub use session::{PendingWager, WagerReceipt, WagerSession};
pub use signer::{KeypairWallet, WalletSigner};
pub use submit::ConfirmationState;

// Flow of one wager:
// 1. The session generates a fresh escrow keypair (escrow.rs)
// 2. composer.rs validates side and amount, fetches a recent
//      blockhash and builds the unsigned two-instruction
//      transaction, with the wallet as fee payer
// 3. signer.rs has the escrow co-sign locally, then asks the
//      wallet for its signature
// 4. submit.rs broadcasts it and polls until the signature
//      resolves or the blockhash ages out
//
// Session -> Composer (Instruction) -> Signer -> Submit -> Receipt / Error

// The create-account instruction must come first. Instructions in a
// transaction run in order and the whole transaction is rolled back if
// any of them fails, so the escrow is never left funded without a wager.
