use solana_sdk::signature::Keypair;

/// Fresh single-use escrow identity for one wager.
///
/// The keypair lives only as long as the transaction being built. Its secret half
/// is needed once, to co-sign the create-account instruction that brings it into
/// existence. Nothing is persisted: a failed or cancelled wager simply drops it.
pub fn new_escrow() -> Keypair {
    Keypair::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signer::Signer;

    #[test]
    fn every_escrow_is_distinct() {
        let a = new_escrow();
        let b = new_escrow();
        assert_ne!(a.pubkey(), b.pubkey());
    }
}
