//! Canonical payloads signed by the vote manager, and the ballot commitment.
//!
//! Each payload is encoded with `bincode` (fixed-width little-endian integers,
//! length-prefixed strings) after a short domain tag, so a signature over one
//! payload kind can never be replayed as another.

use crate::error::CryptoError;
use crate::hash::blake2b_256_multi;
use commons_types::{Address, Amount, Commitment, DocHash, ProposalId, Timestamp};
use serde::Serialize;

/// A message the vote manager co-signs.
pub trait SignedPayload: Serialize {
    const DOMAIN: &'static [u8];

    /// The exact bytes covered by the signature.
    fn signing_bytes(&self) -> Result<Vec<u8>, CryptoError> {
        let mut bytes = Self::DOMAIN.to_vec();
        bincode::serialize_into(&mut bytes, self)?;
        Ok(bytes)
    }
}

/// Fields of a system proposal bound by the creation signature.
#[derive(Clone, Debug, Serialize)]
pub struct SystemProposalPayload<'a> {
    pub proposal_id: ProposalId,
    pub title: &'a str,
    pub start: Timestamp,
    pub end: Timestamp,
    pub doc_hash: DocHash,
}

impl SignedPayload for SystemProposalPayload<'_> {
    const DOMAIN: &'static [u8] = b"commons/system-proposal";
}

/// Fields of a fund proposal bound by the creation signature. The proposer is
/// part of the payload, so a signature cannot be reused by another proposer.
#[derive(Clone, Debug, Serialize)]
pub struct FundProposalPayload<'a> {
    pub proposal_id: ProposalId,
    pub title: &'a str,
    pub start: Timestamp,
    pub end: Timestamp,
    pub start_assess: Timestamp,
    pub end_assess: Timestamp,
    pub doc_hash: DocHash,
    pub amount: Amount,
    pub proposer: Address,
}

impl SignedPayload for FundProposalPayload<'_> {
    const DOMAIN: &'static [u8] = b"commons/fund-proposal";
}

/// Authorization to relay one ballot commitment for one voter.
#[derive(Clone, Debug, Serialize)]
pub struct BallotAuthorization {
    pub proposal_id: ProposalId,
    pub voter: Address,
    pub commitment: Commitment,
}

impl SignedPayload for BallotAuthorization {
    const DOMAIN: &'static [u8] = b"commons/ballot";
}

/// Commitment binding a choice and nonce to one voter on one proposal of one
/// coordinator: Blake2b-256 of the concatenation of coordinator, proposal,
/// voter, choice byte and little-endian nonce.
pub fn ballot_commitment(
    coordinator: &Address,
    proposal_id: &ProposalId,
    voter: &Address,
    choice: u8,
    nonce: u64,
) -> Commitment {
    Commitment::new(blake2b_256_multi(&[
        coordinator.as_bytes(),
        proposal_id.as_bytes(),
        voter.as_bytes(),
        &[choice],
        &nonce.to_le_bytes(),
    ]))
}
