//! Vote-manager co-signatures.
//!
//! The vote manager signs proposal parameters off-chain and co-signs every
//! ballot relay. One [`TrustedRelayer`] capability checks both; a successful
//! check yields a typed authorization the command handlers consume.

use crate::error::GovernanceError;
use commons_crypto::{
    verify_payload, BallotAuthorization, FundProposalPayload, SignedPayload, SystemProposalPayload,
};
use commons_types::{Address, Commitment, ProposalId, PublicKey, Signature};

/// Proof that the vote manager signed exactly these proposal fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProposalAuthorization {
    proposal_id: ProposalId,
}

impl ProposalAuthorization {
    pub fn proposal_id(&self) -> &ProposalId {
        &self.proposal_id
    }
}

/// Proof that the vote manager allowed relaying this commitment for this voter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BallotRelay {
    pub proposal_id: ProposalId,
    pub voter: Address,
    pub commitment: Commitment,
}

/// The vote-manager signing role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrustedRelayer {
    key: PublicKey,
}

impl TrustedRelayer {
    pub fn new(key: PublicKey) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &PublicKey {
        &self.key
    }

    pub fn identity(&self) -> Address {
        Address::from_public_key(&self.key)
    }

    pub fn is_manager(&self, caller: &Address) -> bool {
        &self.identity() == caller
    }

    pub fn authorize_system(
        &self,
        payload: &SystemProposalPayload<'_>,
        signature: &Signature,
    ) -> Result<ProposalAuthorization, GovernanceError> {
        self.check(payload, signature)?;
        Ok(ProposalAuthorization {
            proposal_id: payload.proposal_id,
        })
    }

    pub fn authorize_fund(
        &self,
        payload: &FundProposalPayload<'_>,
        signature: &Signature,
    ) -> Result<ProposalAuthorization, GovernanceError> {
        self.check(payload, signature)?;
        Ok(ProposalAuthorization {
            proposal_id: payload.proposal_id,
        })
    }

    pub fn authorize_ballot(
        &self,
        payload: &BallotAuthorization,
        signature: &Signature,
    ) -> Result<BallotRelay, GovernanceError> {
        self.check(payload, signature)?;
        Ok(BallotRelay {
            proposal_id: payload.proposal_id,
            voter: payload.voter,
            commitment: payload.commitment,
        })
    }

    fn check<P: SignedPayload>(
        &self,
        payload: &P,
        signature: &Signature,
    ) -> Result<(), GovernanceError> {
        if verify_payload(payload, signature, &self.key)? {
            Ok(())
        } else {
            Err(GovernanceError::InvalidSignature)
        }
    }
}
