//! Quorum and margin decision, applied once when vote counting finishes.

use crate::proposal::ProposalResult;
use commons_types::{MarginBasis, MarginPolicy, PPM};
use serde::{Deserialize, Serialize};

/// Revealed vote counts for one proposal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub blank: u64,
    pub positive: u64,
    pub negative: u64,
}

impl VoteTally {
    pub fn new(positive: u64, negative: u64, blank: u64) -> Self {
        Self {
            blank,
            positive,
            negative,
        }
    }

    pub fn total(&self) -> u64 {
        self.blank + self.positive + self.negative
    }
}

/// `floor(validator_count * quorum_factor / 1_000_000)`.
pub fn quorum(validator_count: u64, quorum_factor: u32) -> u64 {
    let scaled = u128::from(validator_count) * u128::from(quorum_factor) / u128::from(PPM);
    scaled as u64
}

/// Decide the result of a counted vote.
///
/// 1. fewer votes than quorum: `InvalidQuorum`
/// 2. positive not above negative: `Rejected`
/// 3. otherwise the margin must clear `policy`, else `Rejected`
pub fn decide(
    tally: &VoteTally,
    validator_count: u64,
    quorum_factor: u32,
    policy: &MarginPolicy,
) -> ProposalResult {
    let total = tally.total();
    let quorum = quorum(validator_count, quorum_factor);
    if total < quorum {
        return ProposalResult::InvalidQuorum;
    }
    if tally.positive <= tally.negative {
        return ProposalResult::Rejected;
    }

    let margin = tally.positive - tally.negative;
    let base = match policy.basis {
        MarginBasis::TotalVotes => total,
        MarginBasis::Quorum => quorum,
        MarginBasis::ValidatorCount => validator_count,
        MarginBasis::Absolute => 0,
    };
    if policy.clears(margin, base) {
        ProposalResult::Approved
    } else {
        ProposalResult::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FACTOR: u32 = 333_333;

    fn run(positive: u64, negative: u64, blank: u64) -> ProposalResult {
        decide(
            &VoteTally::new(positive, negative, blank),
            100,
            FACTOR,
            &MarginPolicy::DEFAULT,
        )
    }

    #[test]
    fn quorum_of_hundred_is_thirty_three() {
        assert_eq!(quorum(100, FACTOR), 33);
        assert_eq!(quorum(0, FACTOR), 0);
        assert_eq!(quorum(3, 1_000_000), 3);
    }

    #[test]
    fn reference_scenarios() {
        assert_eq!(run(50, 0, 0), ProposalResult::Approved);
        assert_eq!(run(20, 10, 3), ProposalResult::Approved);
        assert_eq!(run(20, 10, 2), ProposalResult::InvalidQuorum);
        assert_eq!(run(18, 15, 0), ProposalResult::Rejected);
        assert_eq!(run(33, 33, 14), ProposalResult::Rejected);
        assert_eq!(run(33, 34, 13), ProposalResult::Rejected);
        assert_eq!(run(42, 34, 4), ProposalResult::Approved);
    }

    #[test]
    fn quorum_basis_uses_quorum_size() {
        let policy = MarginPolicy {
            basis: MarginBasis::Quorum,
            factor_ppm: 250_000,
        };
        // quorum 33, bar is 8.25 votes
        let tally = VoteTally::new(20, 11, 2);
        assert_eq!(decide(&tally, 100, FACTOR, &policy), ProposalResult::Approved);
        let tally = VoteTally::new(20, 12, 1);
        assert_eq!(decide(&tally, 100, FACTOR, &policy), ProposalResult::Rejected);
    }

    #[test]
    fn absolute_basis() {
        let policy = MarginPolicy {
            basis: MarginBasis::Absolute,
            factor_ppm: 5,
        };
        assert_eq!(
            decide(&VoteTally::new(40, 35, 0), 100, FACTOR, &policy),
            ProposalResult::Approved
        );
        assert_eq!(
            decide(&VoteTally::new(40, 36, 0), 100, FACTOR, &policy),
            ProposalResult::Rejected
        );
    }

    #[test]
    fn empty_validator_set_without_votes_is_rejected() {
        assert_eq!(
            decide(&VoteTally::default(), 0, FACTOR, &MarginPolicy::DEFAULT),
            ProposalResult::Rejected
        );
    }
}
