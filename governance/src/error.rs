use crate::withdrawal::WithdrawCode;
use commons_crypto::CryptoError;
use commons_types::{Address, Amount, ProposalId, TransferError, TypeError};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("signature does not authenticate the submitted fields")]
    InvalidSignature,

    #[error("revealed ballot of {voter} does not match its commitment")]
    CommitmentMismatch { voter: Address },

    #[error("invalid parameter: {0}")]
    InvalidParam(#[from] TypeError),

    #[error("payload encoding: {0}")]
    Encoding(#[from] CryptoError),

    #[error("fee too low: need {required}, paid {paid}")]
    InvalidFee { required: Amount, paid: Amount },

    #[error("proposal {0} not found")]
    NotFoundProposal(ProposalId),

    #[error("proposal {0} already exists")]
    AlreadyExistProposal(ProposalId),

    #[error("{0} is not authorized for this action")]
    NotAuthorized(Address),

    #[error("{0} is not a validator of this proposal")]
    NotValidator(Address),

    #[error("operation not valid for this proposal type")]
    InvalidProposalType,

    #[error("assessment already counted")]
    AlreadyFinishedAssessment,

    #[error("too early")]
    TooEarly,

    #[error("too late")]
    TooLate,

    #[error("wrong phase: {0}")]
    InvalidPhase(String),

    #[error("not all ballots revealed: {revealed} of {submitted}")]
    NotAllRevealed { revealed: usize, submitted: usize },

    #[error("not enough budget: need {needed}, have {available}")]
    NotEnoughBudget { needed: Amount, available: Amount },

    #[error("proposal was not approved")]
    RejectedProposal,

    #[error("vote counting has not finished")]
    NotEndProposal,

    #[error("invalid vote: {0}")]
    InvalidVote(String),

    #[error("funding can no longer be changed")]
    InvalidTime,

    #[error("withdrawal refused: {0}")]
    Withdraw(WithdrawCode),

    #[error("transfer failed after commit: {0}")]
    Transfer(#[from] TransferError),
}

/// The closed set of error categories reported at the boundary.
///
/// Signature failures, commitment mismatches and parameter-domain failures all
/// surface as `InvalidInput` while staying distinct variants of
/// [`GovernanceError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    InvalidFee,
    NotFoundProposal,
    AlreadyExistProposal,
    NotAuthorized,
    InvalidProposalType,
    AlreadyFinishedAssessment,
    TooEarly,
    TooLate,
    InvalidPhase,
    NotAllRevealed,
    NotEnoughBudget,
    RejectedProposal,
    NotEndProposal,
    InvalidVote,
    InvalidTime,
    TransferFailed,
    Withdraw(WithdrawCode),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Withdraw(code) => write!(f, "{code}"),
            other => write!(f, "{other:?}"),
        }
    }
}

impl GovernanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_)
            | Self::InvalidSignature
            | Self::CommitmentMismatch { .. }
            | Self::InvalidParam(_)
            | Self::Encoding(_) => ErrorKind::InvalidInput,
            Self::InvalidFee { .. } => ErrorKind::InvalidFee,
            Self::NotFoundProposal(_) => ErrorKind::NotFoundProposal,
            Self::AlreadyExistProposal(_) => ErrorKind::AlreadyExistProposal,
            Self::NotAuthorized(_) | Self::NotValidator(_) => ErrorKind::NotAuthorized,
            Self::InvalidProposalType => ErrorKind::InvalidProposalType,
            Self::AlreadyFinishedAssessment => ErrorKind::AlreadyFinishedAssessment,
            Self::TooEarly => ErrorKind::TooEarly,
            Self::TooLate => ErrorKind::TooLate,
            Self::InvalidPhase(_) => ErrorKind::InvalidPhase,
            Self::NotAllRevealed { .. } => ErrorKind::NotAllRevealed,
            Self::NotEnoughBudget { .. } => ErrorKind::NotEnoughBudget,
            Self::RejectedProposal => ErrorKind::RejectedProposal,
            Self::NotEndProposal => ErrorKind::NotEndProposal,
            Self::InvalidVote(_) => ErrorKind::InvalidVote,
            Self::InvalidTime => ErrorKind::InvalidTime,
            Self::Transfer(_) => ErrorKind::TransferFailed,
            Self::Withdraw(code) => ErrorKind::Withdraw(*code),
        }
    }
}
