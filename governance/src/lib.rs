//! Governance and treasury engine for a shared commons fund.
//!
//! Validators vote on two kinds of proposals. System proposals are
//! administrative. Fund proposals request a payout from the treasury and must
//! first pass a five-criterion assessment. Votes are commit-reveal; the vote
//! manager co-signs proposal parameters and relays ballots. Approved fund
//! proposals pay out after a withdrawal delay unless the admin refuses.
//!
//! - [`VoteCoordinator`]: validator sets, ballots, assessment scores
//! - [`BudgetLedger`]: proposals, treasury, decision, withdrawal codes
//! - [`GovernanceConfig`]: admin-gated parameters
//! - [`GovernanceEngine`]: wires the three together around a clock and a
//!   value-transfer primitive

pub mod assessment;
pub mod authorization;
pub mod ballot;
pub mod config;
pub mod coordinator;
pub mod decision;
pub mod engine;
pub mod error;
pub mod event;
pub mod ledger;
pub mod proposal;
pub mod validators;
pub mod withdrawal;

pub use assessment::{AssessmentReport, AssessmentScores};
pub use authorization::{BallotRelay, ProposalAuthorization, TrustedRelayer};
pub use ballot::{Ballot, Choice, Reveal};
pub use config::{GovernanceConfig, ParamUpdate};
pub use coordinator::{CountedVote, VoteCoordinator, VoteInfo, VotePhase};
pub use decision::{decide, quorum, VoteTally};
pub use engine::{EngineSetup, GovernanceEngine};
pub use error::{ErrorKind, GovernanceError};
pub use event::{EventBus, GovernanceEvent};
pub use ledger::{BudgetLedger, ProposalRequest};
pub use proposal::{Proposal, ProposalKind, ProposalResult, ProposalState, ProposalTimes};
pub use validators::{FrozenValidatorSet, OpenValidatorSet, ValidatorSet};
pub use withdrawal::{WithdrawCode, WithdrawStatus};
