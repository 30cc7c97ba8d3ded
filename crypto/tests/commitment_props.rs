use proptest::prelude::*;

use commons_crypto::{ballot_commitment, keypair_from_seed, sign_payload, verify_payload};
use commons_crypto::FundProposalPayload;
use commons_types::{Address, Amount, DocHash, ProposalId, Timestamp};

proptest! {
    /// Changing the choice or the nonce always changes the commitment.
    #[test]
    fn commitment_detects_single_field_change(
        choice in 0u8..3,
        nonce in 1u64..u64::MAX,
        voter in prop::array::uniform32(0u8..),
    ) {
        let coordinator = Address::new([0xC0; 32]);
        let id = ProposalId::new([0x11; 32]);
        let voter = Address::new(voter);
        let stored = ballot_commitment(&coordinator, &id, &voter, choice, nonce);
        prop_assert_eq!(stored, ballot_commitment(&coordinator, &id, &voter, choice, nonce));
        prop_assert_ne!(stored, ballot_commitment(&coordinator, &id, &voter, choice.wrapping_add(1), nonce));
        prop_assert_ne!(stored, ballot_commitment(&coordinator, &id, &voter, choice, nonce.wrapping_add(1)));
    }

    /// A fund proposal signature does not verify for a different proposer.
    #[test]
    fn fund_signature_bound_to_proposer(
        proposer in prop::array::uniform32(0u8..),
        other in prop::array::uniform32(0u8..),
        amount in 1u128..u128::MAX,
    ) {
        prop_assume!(proposer != other);
        let manager = keypair_from_seed(&[0x42; 32]);
        let payload = FundProposalPayload {
            proposal_id: ProposalId::new([1; 32]),
            title: "Fund",
            start: Timestamp::new(1_000),
            end: Timestamp::new(2_000),
            start_assess: Timestamp::new(100),
            end_assess: Timestamp::new(900),
            doc_hash: DocHash::new([5; 32]),
            amount: Amount::new(amount),
            proposer: Address::new(proposer),
        };
        let sig = sign_payload(&payload, &manager.private).unwrap();
        prop_assert!(verify_payload(&payload, &sig, &manager.public).unwrap());
        let forged = FundProposalPayload { proposer: Address::new(other), ..payload };
        prop_assert!(!verify_payload(&forged, &sig, &manager.public).unwrap());
    }
}
