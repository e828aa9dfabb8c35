use std::convert::TryFrom;

use log::debug;
use solana_program::{
    hash::Hash,
    instruction::{AccountMeta, Instruction},
    message::Message,
    pubkey::Pubkey,
    system_instruction,
};
use solana_sdk::transaction::Transaction;

use crate::{
    config::{ProtocolAccounts, ESCROW_SPACE},
    error::{WagerError, WagerResult},
    instruction::{Side, WagerInstruction},
    rpc::LedgerRpc,
};

/// The two instructions of a wager, in execution order.
///
/// 1. System program `create_account`: the wallet funds the escrow with the full
///    wager and hands ownership to the wager program.
/// 2. The wager program's place-wager instruction over wallet, escrow, fee and house.
///
/// The runtime executes them in sequence and rolls back both if either fails,
/// so the escrow exists before the program sees it and never exists without the wager.
pub fn wager_instructions(
    wallet: &Pubkey,
    escrow: &Pubkey,
    lamports: u64,
    side: Side,
    accounts: &ProtocolAccounts,
    space: u64,
) -> [Instruction; 2] {
    let create_escrow =
        system_instruction::create_account(wallet, escrow, lamports, space, &accounts.program_id);

    let place_wager = Instruction::new_with_bytes(
        accounts.program_id,
        &WagerInstruction::PlaceWager { side }.pack(),
        vec![
            AccountMeta::new(*wallet, true),
            AccountMeta::new(*escrow, false),
            AccountMeta::new(accounts.fee_account, false),
            AccountMeta::new(accounts.house_account, false),
        ],
    );

    [create_escrow, place_wager]
}

/// Validated wager parameters waiting for a blockhash.
///
/// The blockhash is an argument of [`build`](Self::build) rather than a field that
/// can be patched in later, so an unanchored transaction cannot be produced.
#[derive(Debug, Clone)]
pub struct WagerTransactionBuilder {
    wallet: Option<Pubkey>,
    escrow: Pubkey,
    lamports: u64,
    side: Side,
    accounts: ProtocolAccounts,
    space: u64,
}

impl WagerTransactionBuilder {
    /// Fails on a side other than 0/1 or a zero amount. A missing wallet is not an
    /// error here; [`build`](Self::build) answers it with `None`.
    pub fn new(
        wallet: Option<Pubkey>,
        escrow: Pubkey,
        lamports: u64,
        side: u8,
        accounts: ProtocolAccounts,
    ) -> WagerResult<Self> {
        let side = Side::try_from(side)?;
        if lamports == 0 {
            return Err(WagerError::InvalidAmount);
        }
        Ok(Self {
            wallet,
            escrow,
            lamports,
            side,
            accounts,
            space: ESCROW_SPACE,
        })
    }

    pub fn space(mut self, space: u64) -> Self {
        self.space = space;
        self
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Unsigned transaction paid for by the wallet, or `None` with no wallet.
    pub fn build(&self, recent_blockhash: Hash) -> Option<Transaction> {
        let wallet = self.wallet?;
        let instructions = wager_instructions(
            &wallet,
            &self.escrow,
            self.lamports,
            self.side,
            &self.accounts,
            self.space,
        );
        let message = Message::new_with_blockhash(&instructions, Some(&wallet), &recent_blockhash);
        Some(Transaction::new_unsigned(message))
    }

    /// Fetches a fresh blockhash and builds. Without a wallet nothing is fetched.
    pub async fn compose<R>(&self, rpc: &R) -> WagerResult<Option<Transaction>>
    where
        R: LedgerRpc + ?Sized,
    {
        if self.wallet.is_none() {
            return Ok(None);
        }
        let recent_blockhash = rpc
            .get_latest_blockhash()
            .await
            .map_err(WagerError::Composition)?;
        debug!(
            "composed {} lamport wager on {} with blockhash {}",
            self.lamports, self.side, recent_blockhash
        );
        Ok(self.build(recent_blockhash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::mock::{MockLedger, Outcome};
    use assert_matches::assert_matches;
    use solana_program::system_program;

    fn accounts() -> ProtocolAccounts {
        ProtocolAccounts {
            program_id: Pubkey::new_unique(),
            fee_account: Pubkey::new_unique(),
            house_account: Pubkey::new_unique(),
        }
    }

    #[test]
    fn create_account_funds_escrow_with_full_wager() {
        let (wallet, escrow, accounts) = (Pubkey::new_unique(), Pubkey::new_unique(), accounts());
        let [create, _] = wager_instructions(&wallet, &escrow, 500_000_000, Side::Heads, &accounts, 1024);

        assert_eq!(create.program_id, system_program::id());
        assert_eq!(
            create,
            system_instruction::create_account(&wallet, &escrow, 500_000_000, 1024, &accounts.program_id)
        );
        // u32 discriminant, then lamports, then space
        assert_eq!(create.data[4..12], 500_000_000u64.to_le_bytes());
        assert_eq!(create.data[12..20], 1024u64.to_le_bytes());
    }

    #[test]
    fn place_wager_lists_accounts_in_fixed_order() {
        let (wallet, escrow, accounts) = (Pubkey::new_unique(), Pubkey::new_unique(), accounts());
        let [_, place] = wager_instructions(&wallet, &escrow, 1, Side::Tails, &accounts, 1024);

        assert_eq!(place.program_id, accounts.program_id);
        assert_eq!(place.data, vec![0, 1]);
        assert_eq!(
            place.accounts,
            vec![
                AccountMeta::new(wallet, true),
                AccountMeta::new(escrow, false),
                AccountMeta::new(accounts.fee_account, false),
                AccountMeta::new(accounts.house_account, false),
            ]
        );
    }

    #[test]
    fn build_yields_unsigned_two_instruction_transaction() {
        let (wallet, escrow, accounts) = (Pubkey::new_unique(), Pubkey::new_unique(), accounts());
        let blockhash = Hash::new_unique();
        let tx = WagerTransactionBuilder::new(Some(wallet), escrow, 500_000_000, 0, accounts)
            .unwrap()
            .build(blockhash)
            .unwrap();

        let message = &tx.message;
        assert_eq!(message.instructions.len(), 2);
        assert_eq!(message.account_keys[0], wallet);
        assert_eq!(message.recent_blockhash, blockhash);
        assert_eq!(message.header.num_required_signatures, 2);

        let program_of = |i: usize| message.account_keys[message.instructions[i].program_id_index as usize];
        assert_eq!(program_of(0), system_program::id());
        assert_eq!(program_of(1), accounts.program_id);
        assert_eq!(message.instructions[1].data, vec![0, 0]);
        assert!(!tx.is_signed());
    }

    #[test]
    fn no_wallet_builds_nothing() {
        let builder =
            WagerTransactionBuilder::new(None, Pubkey::new_unique(), 1, 0, accounts()).unwrap();
        assert!(builder.build(Hash::new_unique()).is_none());
    }

    #[test]
    fn invalid_parameters_are_rejected_up_front() {
        let wallet = Some(Pubkey::new_unique());
        assert_matches!(
            WagerTransactionBuilder::new(wallet, Pubkey::new_unique(), 1, 50, accounts()),
            Err(WagerError::InvalidSide(50))
        );
        assert_matches!(
            WagerTransactionBuilder::new(wallet, Pubkey::new_unique(), 0, 1, accounts()),
            Err(WagerError::InvalidAmount)
        );
    }

    #[tokio::test]
    async fn compose_without_wallet_skips_the_network() {
        let ledger = MockLedger::new(Outcome::Confirm);
        let builder =
            WagerTransactionBuilder::new(None, Pubkey::new_unique(), 1, 1, accounts()).unwrap();
        assert!(builder.compose(&ledger).await.unwrap().is_none());
        assert_eq!(ledger.fetch_count(), 0);
    }

    #[tokio::test]
    async fn compose_anchors_to_fetched_blockhash() {
        let ledger = MockLedger::new(Outcome::Confirm);
        let builder =
            WagerTransactionBuilder::new(Some(Pubkey::new_unique()), Pubkey::new_unique(), 1, 1, accounts())
                .unwrap();
        let tx = builder.compose(&ledger).await.unwrap().unwrap();
        assert_eq!(ledger.issued_blockhashes(), vec![tx.message.recent_blockhash]);
    }

    #[tokio::test]
    async fn unreachable_node_is_a_composition_error() {
        let ledger = MockLedger::unreachable();
        let builder =
            WagerTransactionBuilder::new(Some(Pubkey::new_unique()), Pubkey::new_unique(), 1, 1, accounts())
                .unwrap();
        assert_matches!(builder.compose(&ledger).await, Err(WagerError::Composition(_)));
    }
}
