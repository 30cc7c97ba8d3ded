//! Five-criterion assessment of fund proposals.

use crate::error::GovernanceError;
use crate::proposal::CRITERIA;
use commons_types::{Address, GovernanceParams};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One validator's scores, each in 0..=10.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentScores([u64; CRITERIA]);

impl AssessmentScores {
    pub fn new(scores: [u64; CRITERIA]) -> Result<Self, GovernanceError> {
        if let Some(bad) = scores
            .iter()
            .find(|s| **s > GovernanceParams::MAX_ASSESSMENT_SCORE)
        {
            return Err(GovernanceError::InvalidInput(format!(
                "assessment score {bad} exceeds {}",
                GovernanceParams::MAX_ASSESSMENT_SCORE
            )));
        }
        Ok(Self(scores))
    }

    pub fn values(&self) -> &[u64; CRITERIA] {
        &self.0
    }
}

/// Counted assessment of one proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub participants: u64,
    pub totals: [u64; CRITERIA],
    pub averages: [u64; CRITERIA],
    pub passed: bool,
}

#[derive(Clone, Debug, Default)]
pub struct AssessmentBook {
    assessors: HashSet<Address>,
    totals: [u64; CRITERIA],
    report: Option<AssessmentReport>,
}

impl AssessmentBook {
    /// Accumulate one validator's scores. A validator submits once.
    pub fn submit(
        &mut self,
        assessor: Address,
        scores: AssessmentScores,
    ) -> Result<(), GovernanceError> {
        if self.assessors.contains(&assessor) {
            return Err(GovernanceError::InvalidVote(format!(
                "{assessor} already assessed this proposal"
            )));
        }
        self.assessors.insert(assessor);
        for (total, score) in self.totals.iter_mut().zip(scores.values()) {
            *total += score;
        }
        Ok(())
    }

    pub fn participants(&self) -> u64 {
        self.assessors.len() as u64
    }

    pub fn report(&self) -> Option<&AssessmentReport> {
        self.report.as_ref()
    }

    /// Compute and store the report. Counting twice fails.
    pub fn count(&mut self, pass_average: u64) -> Result<AssessmentReport, GovernanceError> {
        if self.report.is_some() {
            return Err(GovernanceError::AlreadyFinishedAssessment);
        }
        let report = evaluate(self.totals, self.participants(), pass_average);
        self.report = Some(report);
        Ok(report)
    }
}

/// Integer per-criterion averages; zero participants average to zero and fail.
pub fn evaluate(totals: [u64; CRITERIA], participants: u64, pass_average: u64) -> AssessmentReport {
    let averages = if participants == 0 {
        [0; CRITERIA]
    } else {
        totals.map(|t| t / participants)
    };
    let passed = participants > 0 && averages.iter().all(|avg| *avg >= pass_average);
    AssessmentReport {
        participants,
        totals,
        averages,
        passed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::new([b; 32])
    }

    #[test]
    fn sevens_pass_sixes_fail() {
        let mut book = AssessmentBook::default();
        book.submit(addr(1), AssessmentScores::new([7; 5]).unwrap()).unwrap();
        book.submit(addr(2), AssessmentScores::new([7; 5]).unwrap()).unwrap();
        assert!(book.count(7).unwrap().passed);

        let mut book = AssessmentBook::default();
        book.submit(addr(1), AssessmentScores::new([6; 5]).unwrap()).unwrap();
        book.submit(addr(2), AssessmentScores::new([6; 5]).unwrap()).unwrap();
        assert!(!book.count(7).unwrap().passed);
    }

    #[test]
    fn one_weak_criterion_fails() {
        let report = evaluate([20, 20, 20, 20, 13], 2, 7);
        assert_eq!(report.averages, [10, 10, 10, 10, 6]);
        assert!(!report.passed);
    }

    #[test]
    fn no_participants_fails() {
        let report = evaluate([0; 5], 0, 7);
        assert_eq!(report.averages, [0; 5]);
        assert!(!report.passed);
    }

    #[test]
    fn repeat_submission_and_recount_fail() {
        let mut book = AssessmentBook::default();
        book.submit(addr(1), AssessmentScores::new([8; 5]).unwrap()).unwrap();
        assert!(book
            .submit(addr(1), AssessmentScores::new([9; 5]).unwrap())
            .is_err());
        assert_eq!(book.participants(), 1);
        book.count(7).unwrap();
        assert!(matches!(
            book.count(7),
            Err(GovernanceError::AlreadyFinishedAssessment)
        ));
    }

    #[test]
    fn scores_above_ten_rejected() {
        assert!(AssessmentScores::new([10, 10, 11, 10, 10]).is_err());
    }
}
