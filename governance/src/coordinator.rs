//! Vote coordinator: per-proposal validator sets, commit-reveal ballots and
//! assessment scoring.
//!
//! Every mutating method validates all of its preconditions before touching
//! state, so a rejected call leaves the coordinator unchanged.
//!
//! A validator set locks when the manager finalizes it or, at the latest,
//! when the vote window opens. The time lock is applied lazily by the first
//! successful call at or after `start`, or explicitly by
//! [`VoteCoordinator::lock_if_started`].

use crate::assessment::{AssessmentBook, AssessmentReport, AssessmentScores};
use crate::authorization::TrustedRelayer;
use crate::ballot::{Ballot, BallotBox, Choice, Reveal};
use crate::decision::VoteTally;
use crate::error::GovernanceError;
use crate::proposal::{ProposalKind, ProposalTimes};
use crate::validators::{FrozenValidatorSet, ValidatorSet};
use commons_crypto::{ballot_commitment, BallotAuthorization};
use commons_types::{Address, Commitment, ProposalId, PublicKey, Signature, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Coordinator-side phase of a proposal. Only moves forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VotePhase {
    Created,
    /// Vote window fixed, validators being added.
    Setting,
    /// Validator set frozen, fund proposal under assessment.
    Assessing,
    /// Ballots accepted.
    Running,
    Finished,
}

#[derive(Clone, Debug)]
pub struct VoteInfo {
    pub kind: ProposalKind,
    pub phase: VotePhase,
    pub times: ProposalTimes,
    /// Reveal opens at this time. `EPOCH` until the vote is set up.
    pub open_reveal: Timestamp,
    pub info: String,
    validators: ValidatorSet,
    ballots: BallotBox,
    assessment: AssessmentBook,
    tally: Option<VoteTally>,
}

impl VoteInfo {
    fn new(kind: ProposalKind, times: ProposalTimes) -> Self {
        Self {
            kind,
            phase: VotePhase::Created,
            times,
            open_reveal: Timestamp::EPOCH,
            info: String::new(),
            validators: ValidatorSet::default(),
            ballots: BallotBox::default(),
            assessment: AssessmentBook::default(),
            tally: None,
        }
    }

    pub fn validators(&self) -> &ValidatorSet {
        &self.validators
    }

    pub fn ballots(&self) -> &BallotBox {
        &self.ballots
    }

    pub fn assessment(&self) -> &AssessmentBook {
        &self.assessment
    }

    pub fn tally(&self) -> Option<&VoteTally> {
        self.tally.as_ref()
    }

    /// Phase as of `now`, counting the lock at vote start.
    pub fn phase_at(&self, now: Timestamp) -> VotePhase {
        if self.phase == VotePhase::Setting && now >= self.times.start {
            self.locked_phase()
        } else {
            self.phase
        }
    }

    fn locked_phase(&self) -> VotePhase {
        match self.kind {
            ProposalKind::Fund => VotePhase::Assessing,
            ProposalKind::System => VotePhase::Running,
        }
    }

    /// Freeze the set and leave `Setting`. No-op outside `Setting`.
    fn lock(&mut self) -> bool {
        if self.phase != VotePhase::Setting {
            return false;
        }
        self.validators.freeze();
        self.phase = self.locked_phase();
        true
    }

    fn lock_if_started(&mut self, now: Timestamp) -> bool {
        now >= self.times.start && self.lock()
    }
}

/// Result of a successful `count_vote`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CountedVote {
    pub tally: VoteTally,
    pub validator_count: u64,
}

pub struct VoteCoordinator {
    address: Address,
    manager: TrustedRelayer,
    ledger: Option<Address>,
    votes: HashMap<ProposalId, VoteInfo>,
}

impl VoteCoordinator {
    /// `address` is this coordinator's identity and is bound into every ballot
    /// commitment. The vote manager owns the coordinator.
    pub fn new(address: Address, manager_key: PublicKey) -> Self {
        Self {
            address,
            manager: TrustedRelayer::new(manager_key),
            ledger: None,
            votes: HashMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn manager(&self) -> &TrustedRelayer {
        &self.manager
    }

    pub fn is_owner(&self, caller: &Address) -> bool {
        self.manager.is_manager(caller)
    }

    pub fn ledger(&self) -> Option<Address> {
        self.ledger
    }

    fn ensure_manager(&self, caller: &Address) -> Result<(), GovernanceError> {
        if !self.manager.is_manager(caller) {
            return Err(GovernanceError::NotAuthorized(*caller));
        }
        Ok(())
    }

    fn info(&self, id: &ProposalId) -> Result<&VoteInfo, GovernanceError> {
        self.votes
            .get(id)
            .ok_or(GovernanceError::NotFoundProposal(*id))
    }

    fn info_mut(&mut self, id: &ProposalId) -> Result<&mut VoteInfo, GovernanceError> {
        self.votes
            .get_mut(id)
            .ok_or(GovernanceError::NotFoundProposal(*id))
    }

    // ── Wiring ───────────────────────────────────────────────────────────

    /// Link the coordinator to the budget ledger allowed to call [`Self::init`].
    pub fn change_commons_budget(
        &mut self,
        caller: &Address,
        ledger: Address,
    ) -> Result<(), GovernanceError> {
        self.ensure_manager(caller)?;
        if ledger.is_zero() {
            return Err(GovernanceError::InvalidInput("ledger address is zero".into()));
        }
        info!(%ledger, "coordinator linked to budget ledger");
        self.ledger = Some(ledger);
        Ok(())
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    /// Create the vote record for a new proposal. Only the linked ledger may call.
    pub fn init(
        &mut self,
        caller: &Address,
        id: ProposalId,
        kind: ProposalKind,
        times: ProposalTimes,
    ) -> Result<(), GovernanceError> {
        if self.ledger.as_ref() != Some(caller) {
            return Err(GovernanceError::NotAuthorized(*caller));
        }
        if self.votes.contains_key(&id) {
            return Err(GovernanceError::AlreadyExistProposal(id));
        }
        self.votes.insert(id, VoteInfo::new(kind, times));
        debug!(proposal = %id, ?kind, "vote record created");
        Ok(())
    }

    /// Fix the vote window and reveal time. `start` and `end` must repeat the
    /// proposal's registered window.
    pub fn setup_vote_info(
        &mut self,
        caller: &Address,
        id: &ProposalId,
        start: Timestamp,
        end: Timestamp,
        open_reveal: Timestamp,
        info: String,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        self.ensure_manager(caller)?;
        let vote = self.info(id)?;
        if vote.phase != VotePhase::Created {
            return Err(GovernanceError::InvalidPhase(format!(
                "vote {id} already set up"
            )));
        }
        if start != vote.times.start || end != vote.times.end {
            return Err(GovernanceError::InvalidInput(
                "vote window differs from the proposal".into(),
            ));
        }
        if now >= start {
            return Err(GovernanceError::TooLate);
        }
        if !(start < end && end < open_reveal) {
            return Err(GovernanceError::InvalidInput(
                "require start < end < open_reveal".into(),
            ));
        }

        let vote = self.info_mut(id)?;
        vote.open_reveal = open_reveal;
        vote.info = info;
        vote.phase = VotePhase::Setting;
        info!(proposal = %id, %start, %end, %open_reveal, "vote set up");
        Ok(())
    }

    /// Append validators while the set is open. `finalize` freezes it and
    /// opens assessment (fund) or voting (system). Returns how many were new.
    pub fn add_validators(
        &mut self,
        caller: &Address,
        id: &ProposalId,
        addresses: &[Address],
        finalize: bool,
        now: Timestamp,
    ) -> Result<usize, GovernanceError> {
        self.ensure_manager(caller)?;
        let vote = self.info(id)?;
        if vote.phase != VotePhase::Setting || vote.validators.is_frozen() {
            return Err(GovernanceError::InvalidPhase(format!(
                "validators of {id} cannot be changed in {:?}",
                vote.phase
            )));
        }
        if now >= vote.times.start {
            return Err(GovernanceError::TooLate);
        }
        if addresses.iter().any(Address::is_zero) {
            return Err(GovernanceError::InvalidInput("zero validator address".into()));
        }
        if finalize && vote.validators.is_empty() && addresses.is_empty() {
            return Err(GovernanceError::InvalidInput(
                "cannot finalize an empty validator set".into(),
            ));
        }

        let vote = self.info_mut(id)?;
        let added = match vote.validators.open_mut() {
            Some(open) => open.extend(addresses),
            None => 0,
        };
        if finalize {
            vote.lock();
            info!(
                proposal = %id,
                validators = vote.validators.len(),
                phase = ?vote.phase,
                "validator set finalized"
            );
        } else {
            debug!(proposal = %id, added, total = vote.validators.len(), "validators added");
        }
        Ok(added)
    }

    // ── Assessment ───────────────────────────────────────────────────────

    pub fn submit_assessment(
        &mut self,
        caller: &Address,
        id: &ProposalId,
        scores: AssessmentScores,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        let vote = self.info(id)?;
        if vote.kind != ProposalKind::Fund {
            return Err(GovernanceError::InvalidProposalType);
        }
        if now < vote.times.start_assess {
            return Err(GovernanceError::TooEarly);
        }
        if now >= vote.times.end_assess {
            return Err(GovernanceError::TooLate);
        }
        // registered validators may assess before the manager finalizes
        if !matches!(vote.phase, VotePhase::Setting | VotePhase::Assessing) {
            return Err(GovernanceError::InvalidPhase(format!(
                "vote {id} is not assessing"
            )));
        }
        if !vote.validators.contains(caller) {
            return Err(GovernanceError::NotValidator(*caller));
        }

        self.info_mut(id)?.assessment.submit(*caller, scores)?;
        debug!(proposal = %id, assessor = %caller, "assessment submitted");
        Ok(())
    }

    /// Average the scores once the assessment window has closed. A failed
    /// assessment finishes the vote without a voting phase.
    pub fn count_assessment(
        &mut self,
        caller: &Address,
        id: &ProposalId,
        pass_average: u64,
        now: Timestamp,
    ) -> Result<AssessmentReport, GovernanceError> {
        self.ensure_manager(caller)?;
        let vote = self.info(id)?;
        if vote.kind != ProposalKind::Fund {
            return Err(GovernanceError::InvalidProposalType);
        }
        if vote.assessment.report().is_some() {
            return Err(GovernanceError::AlreadyFinishedAssessment);
        }
        if now < vote.times.end_assess {
            return Err(GovernanceError::TooEarly);
        }
        if now >= vote.times.start {
            return Err(GovernanceError::TooLate);
        }
        if !matches!(vote.phase, VotePhase::Setting | VotePhase::Assessing) {
            return Err(GovernanceError::InvalidPhase(format!(
                "vote {id} is not assessing"
            )));
        }

        let vote = self.info_mut(id)?;
        let report = vote.assessment.count(pass_average)?;
        // counting closes registration
        vote.lock();
        vote.phase = if report.passed {
            VotePhase::Running
        } else {
            VotePhase::Finished
        };
        info!(
            proposal = %id,
            participants = report.participants,
            averages = ?report.averages,
            passed = report.passed,
            "assessment counted"
        );
        Ok(report)
    }

    // ── Commit-reveal ────────────────────────────────────────────────────

    /// Commit a ballot. The vote manager's signature must cover
    /// `(proposal, voter, commitment)`. Re-submission overwrites. Returns
    /// `true` for a voter's first ballot.
    pub fn submit_ballot(
        &mut self,
        caller: &Address,
        id: &ProposalId,
        commitment: Commitment,
        signature: &Signature,
        now: Timestamp,
    ) -> Result<bool, GovernanceError> {
        let vote = self.info(id)?;
        if now < vote.times.start {
            return Err(GovernanceError::TooEarly);
        }
        if now >= vote.times.end {
            return Err(GovernanceError::TooLate);
        }
        if vote.phase_at(now) != VotePhase::Running {
            return Err(GovernanceError::InvalidPhase(format!(
                "vote {id} is not running"
            )));
        }
        if !vote.validators.contains(caller) {
            return Err(GovernanceError::NotValidator(*caller));
        }
        let relay = self.manager.authorize_ballot(
            &BallotAuthorization {
                proposal_id: *id,
                voter: *caller,
                commitment,
            },
            signature,
        )?;

        let vote = self.info_mut(id)?;
        if vote.lock_if_started(now) {
            info!(proposal = %id, validators = vote.validators.len(), "validator set locked at vote start");
        }
        let first = vote.ballots.submit(relay.voter, relay.commitment);
        debug!(proposal = %id, voter = %relay.voter, first, "ballot committed");
        Ok(first)
    }

    /// Reveal a batch of ballots. Any mismatch rejects the whole batch.
    /// Re-revealing an already revealed ballot is a no-op, so overlapping
    /// batches are safe. Returns how many ballots were newly revealed.
    pub fn reveal_ballot(
        &mut self,
        caller: &Address,
        id: &ProposalId,
        voters: &[Address],
        choices: &[Choice],
        nonces: &[u64],
        now: Timestamp,
    ) -> Result<usize, GovernanceError> {
        self.ensure_manager(caller)?;
        let vote = self.info(id)?;
        if voters.len() != choices.len() || voters.len() != nonces.len() {
            return Err(GovernanceError::InvalidInput(format!(
                "reveal arrays differ in length: {} voters, {} choices, {} nonces",
                voters.len(),
                choices.len(),
                nonces.len()
            )));
        }
        if voters.is_empty() {
            return Err(GovernanceError::InvalidInput("empty reveal batch".into()));
        }
        if vote.phase < VotePhase::Setting || now < vote.open_reveal {
            return Err(GovernanceError::TooEarly);
        }
        if vote.phase_at(now) != VotePhase::Running {
            return Err(GovernanceError::InvalidPhase(format!(
                "vote {id} is not running"
            )));
        }

        let mut reveals = Vec::with_capacity(voters.len());
        for ((voter, choice), nonce) in voters.iter().zip(choices).zip(nonces) {
            if *nonce == 0 {
                return Err(GovernanceError::InvalidInput(format!(
                    "zero nonce for {voter}"
                )));
            }
            let ballot = vote.ballots.get(voter).ok_or_else(|| {
                GovernanceError::InvalidInput(format!("no ballot from {voter}"))
            })?;
            let expected = ballot_commitment(&self.address, id, voter, choice.as_u8(), *nonce);
            if expected != ballot.commitment {
                return Err(GovernanceError::CommitmentMismatch { voter: *voter });
            }
            if !ballot.is_revealed() {
                reveals.push((
                    *voter,
                    Reveal {
                        choice: *choice,
                        nonce: *nonce,
                    },
                ));
            }
        }

        let vote = self.info_mut(id)?;
        vote.lock_if_started(now);
        let mut newly = 0;
        for (voter, reveal) in reveals {
            // the same voter may appear twice within one batch
            if vote.ballots.get(&voter).is_some_and(|b| !b.is_revealed()) {
                vote.ballots.record_reveal(&voter, reveal);
                newly += 1;
            }
        }
        debug!(
            proposal = %id,
            newly,
            revealed = vote.ballots.revealed(),
            submitted = vote.ballots.len(),
            "ballots revealed"
        );
        Ok(newly)
    }

    /// Tally the revealed ballots. Every committed ballot must be revealed.
    pub fn count_vote(
        &mut self,
        caller: &Address,
        id: &ProposalId,
        now: Timestamp,
    ) -> Result<CountedVote, GovernanceError> {
        self.ensure_manager(caller)?;
        let vote = self.info(id)?;
        if vote.phase == VotePhase::Finished {
            return Err(GovernanceError::InvalidPhase(format!(
                "vote {id} already finished"
            )));
        }
        if vote.phase < VotePhase::Setting || now < vote.open_reveal {
            return Err(GovernanceError::TooEarly);
        }
        if vote.phase_at(now) != VotePhase::Running {
            return Err(GovernanceError::InvalidPhase(format!(
                "vote {id} is not running"
            )));
        }
        if !vote.ballots.all_revealed() {
            return Err(GovernanceError::NotAllRevealed {
                revealed: vote.ballots.revealed(),
                submitted: vote.ballots.len(),
            });
        }

        let vote = self.info_mut(id)?;
        vote.lock_if_started(now);
        let tally = vote.ballots.tally();
        vote.tally = Some(tally);
        vote.phase = VotePhase::Finished;
        let validator_count = vote.validators.len() as u64;
        info!(
            proposal = %id,
            positive = tally.positive,
            negative = tally.negative,
            blank = tally.blank,
            validator_count,
            "vote counted"
        );
        Ok(CountedVote {
            tally,
            validator_count,
        })
    }

    /// Apply the lock at vote start to a set the manager never finalized.
    /// Returns `true` if this call locked it. Unknown ids are ignored.
    pub fn lock_if_started(&mut self, id: &ProposalId, now: Timestamp) -> bool {
        let Some(vote) = self.votes.get_mut(id) else {
            return false;
        };
        let locked = vote.lock_if_started(now);
        if locked {
            info!(proposal = %id, validators = vote.validators.len(), phase = ?vote.phase, "validator set locked at vote start");
        }
        locked
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn vote_info(&self, id: &ProposalId) -> Option<&VoteInfo> {
        self.votes.get(id)
    }

    pub fn validator_count(&self, id: &ProposalId) -> Result<usize, GovernanceError> {
        Ok(self.info(id)?.validators.len())
    }

    pub fn validator_at(&self, id: &ProposalId, index: usize) -> Result<Address, GovernanceError> {
        self.info(id)?
            .validators
            .get(index)
            .copied()
            .ok_or_else(|| GovernanceError::InvalidInput(format!("validator index {index} out of range")))
    }

    pub fn is_validator(&self, id: &ProposalId, address: &Address) -> bool {
        self.votes
            .get(id)
            .is_some_and(|v| v.validators.contains(address))
    }

    pub fn validators_finalized(&self, id: &ProposalId) -> bool {
        self.frozen_validators(id).is_some()
    }

    pub fn frozen_validators(&self, id: &ProposalId) -> Option<&FrozenValidatorSet> {
        self.votes.get(id).and_then(|v| v.validators.frozen())
    }

    pub fn ballot_count(&self, id: &ProposalId) -> Result<usize, GovernanceError> {
        Ok(self.info(id)?.ballots.len())
    }

    pub fn ballot(&self, id: &ProposalId, voter: &Address) -> Result<&Ballot, GovernanceError> {
        self.info(id)?
            .ballots
            .get(voter)
            .ok_or_else(|| GovernanceError::InvalidInput(format!("no ballot from {voter}")))
    }

    /// Ballot by submission index. Hidden until the vote window has closed.
    pub fn ballot_at(
        &self,
        id: &ProposalId,
        index: usize,
        now: Timestamp,
    ) -> Result<&Ballot, GovernanceError> {
        let vote = self.info(id)?;
        if now < vote.times.end {
            return Err(GovernanceError::TooEarly);
        }
        vote.ballots
            .voter_at(index)
            .and_then(|voter| vote.ballots.get(voter))
            .ok_or_else(|| GovernanceError::InvalidInput(format!("ballot index {index} out of range")))
    }

    /// Counted tally; fails until `count_vote` has run.
    pub fn vote_result(&self, id: &ProposalId) -> Result<VoteTally, GovernanceError> {
        self.info(id)?
            .tally
            .ok_or_else(|| GovernanceError::InvalidPhase(format!("vote {id} not counted")))
    }

    pub fn assessment_result(&self, id: &ProposalId) -> Option<AssessmentReport> {
        self.votes
            .get(id)
            .and_then(|v| v.assessment.report().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use commons_crypto::{keypair_from_seed, sign_payload};
    use commons_types::KeyPair;

    const STRANGER: Address = Address::ZERO;

    struct Fixture {
        coordinator: VoteCoordinator,
        manager: KeyPair,
        manager_addr: Address,
        id: ProposalId,
    }

    fn ledger() -> Address {
        Address::new([0xB0; 32])
    }

    fn voter(i: u8) -> Address {
        Address::new([i; 32])
    }

    fn times() -> ProposalTimes {
        ProposalTimes {
            start: Timestamp::new(1_000),
            end: Timestamp::new(2_000),
            start_assess: Timestamp::new(100),
            end_assess: Timestamp::new(500),
        }
    }

    fn fixture(kind: ProposalKind) -> Fixture {
        let manager = keypair_from_seed(&[0x4D; 32]);
        let manager_addr = Address::from_public_key(&manager.public);
        let mut coordinator = VoteCoordinator::new(Address::new([0xC0; 32]), manager.public);
        coordinator.change_commons_budget(&manager_addr, ledger()).unwrap();
        let id = ProposalId::new([0x11; 32]);
        coordinator.init(&ledger(), id, kind, times()).unwrap();
        Fixture {
            coordinator,
            manager,
            manager_addr,
            id,
        }
    }

    fn running_system(voters: u8) -> Fixture {
        let mut f = fixture(ProposalKind::System);
        f.coordinator
            .setup_vote_info(
                &f.manager_addr,
                &f.id,
                Timestamp::new(1_000),
                Timestamp::new(2_000),
                Timestamp::new(2_030),
                "info".into(),
                Timestamp::new(10),
            )
            .unwrap();
        let validators: Vec<_> = (1..=voters).map(voter).collect();
        f.coordinator
            .add_validators(&f.manager_addr, &f.id, &validators, true, Timestamp::new(10))
            .unwrap();
        f
    }

    fn commit(f: &mut Fixture, who: Address, choice: Choice, nonce: u64) -> Result<bool, GovernanceError> {
        let commitment =
            ballot_commitment(&f.coordinator.address(), &f.id, &who, choice.as_u8(), nonce);
        let sig = sign_payload(
            &BallotAuthorization {
                proposal_id: f.id,
                voter: who,
                commitment,
            },
            &f.manager.private,
        )
        .unwrap();
        f.coordinator
            .submit_ballot(&who, &f.id, commitment, &sig, Timestamp::new(1_500))
    }

    #[test]
    fn init_only_from_linked_ledger() {
        let f = fixture(ProposalKind::System);
        let mut coordinator = f.coordinator;
        let err = coordinator
            .init(&STRANGER, ProposalId::new([2; 32]), ProposalKind::System, times())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthorized);
        let err = coordinator
            .init(&ledger(), f.id, ProposalKind::System, times())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExistProposal);
    }

    #[test]
    fn setup_requires_matching_window_and_runs_once() {
        let mut f = fixture(ProposalKind::System);
        let mgr = f.manager_addr;
        let err = f
            .coordinator
            .setup_vote_info(&mgr, &f.id, Timestamp::new(1_001), Timestamp::new(2_000), Timestamp::new(2_030), String::new(), Timestamp::new(10))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = f
            .coordinator
            .setup_vote_info(&mgr, &f.id, Timestamp::new(1_000), Timestamp::new(2_000), Timestamp::new(2_000), String::new(), Timestamp::new(10))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        f.coordinator
            .setup_vote_info(&mgr, &f.id, Timestamp::new(1_000), Timestamp::new(2_000), Timestamp::new(2_030), String::new(), Timestamp::new(10))
            .unwrap();
        let err = f
            .coordinator
            .setup_vote_info(&mgr, &f.id, Timestamp::new(1_000), Timestamp::new(2_000), Timestamp::new(2_030), String::new(), Timestamp::new(10))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPhase);
    }

    #[test]
    fn validators_locked_after_finalize_and_after_start() {
        let mut f = running_system(3);
        let mgr = f.manager_addr;
        let err = f
            .coordinator
            .add_validators(&mgr, &f.id, &[voter(9)], false, Timestamp::new(20))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPhase);

        let mut g = fixture(ProposalKind::System);
        g.coordinator
            .setup_vote_info(&mgr, &g.id, Timestamp::new(1_000), Timestamp::new(2_000), Timestamp::new(2_030), String::new(), Timestamp::new(10))
            .unwrap();
        let err = g
            .coordinator
            .add_validators(&mgr, &g.id, &[voter(1)], false, Timestamp::new(1_000))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooLate);
    }

    #[test]
    fn overlapping_additions_are_deduplicated() {
        let mut f = fixture(ProposalKind::System);
        let mgr = f.manager_addr;
        f.coordinator
            .setup_vote_info(&mgr, &f.id, Timestamp::new(1_000), Timestamp::new(2_000), Timestamp::new(2_030), String::new(), Timestamp::new(10))
            .unwrap();
        let first: Vec<_> = (1..=5).map(voter).collect();
        let second: Vec<_> = (3..=8).map(voter).collect();
        assert_eq!(f.coordinator.add_validators(&mgr, &f.id, &first, false, Timestamp::new(10)).unwrap(), 5);
        assert_eq!(f.coordinator.add_validators(&mgr, &f.id, &second, true, Timestamp::new(10)).unwrap(), 3);
        assert_eq!(f.coordinator.validator_count(&f.id).unwrap(), 8);
        assert_eq!(f.coordinator.validator_at(&f.id, 5).unwrap(), voter(6));
        assert!(f.coordinator.validators_finalized(&f.id));
    }

    #[test]
    fn ballot_window_and_membership() {
        let mut f = running_system(3);
        assert!(commit(&mut f, voter(1), Choice::Positive, 1).unwrap());
        assert!(!commit(&mut f, voter(1), Choice::Negative, 2).unwrap());
        assert_eq!(f.coordinator.ballot_count(&f.id).unwrap(), 1);
        let err = commit(&mut f, voter(9), Choice::Positive, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthorized);
    }

    #[test]
    fn ballot_needs_manager_signature() {
        let mut f = running_system(3);
        let commitment = Commitment::new([1; 32]);
        let forged = sign_payload(
            &BallotAuthorization {
                proposal_id: f.id,
                voter: voter(1),
                commitment,
            },
            &keypair_from_seed(&[1; 32]).private,
        )
        .unwrap();
        let err = f
            .coordinator
            .submit_ballot(&voter(1), &f.id, commitment, &forged, Timestamp::new(1_500))
            .unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidSignature));
        assert_eq!(f.coordinator.ballot_count(&f.id).unwrap(), 0);
    }

    #[test]
    fn reveal_is_all_or_nothing_and_idempotent() {
        let mut f = running_system(3);
        commit(&mut f, voter(1), Choice::Positive, 11).unwrap();
        commit(&mut f, voter(2), Choice::Negative, 12).unwrap();
        let mgr = f.manager_addr;
        let at = Timestamp::new(2_030);

        let err = f
            .coordinator
            .reveal_ballot(&mgr, &f.id, &[voter(1), voter(2)], &[Choice::Positive, Choice::Positive], &[11, 12], at)
            .unwrap_err();
        assert!(matches!(err, GovernanceError::CommitmentMismatch { .. }));
        assert!(!f.coordinator.ballot(&f.id, &voter(1)).unwrap().is_revealed());

        let err = f
            .coordinator
            .reveal_ballot(&mgr, &f.id, &[voter(1)], &[Choice::Positive], &[11], Timestamp::new(2_029))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooEarly);

        assert_eq!(
            f.coordinator
                .reveal_ballot(&mgr, &f.id, &[voter(1)], &[Choice::Positive], &[11], at)
                .unwrap(),
            1
        );
        let err = f.coordinator.count_vote(&mgr, &f.id, at).unwrap_err();
        assert!(matches!(err, GovernanceError::NotAllRevealed { revealed: 1, submitted: 2 }));

        assert_eq!(
            f.coordinator
                .reveal_ballot(&mgr, &f.id, &[voter(1), voter(2)], &[Choice::Positive, Choice::Negative], &[11, 12], at)
                .unwrap(),
            1
        );
        let counted = f.coordinator.count_vote(&mgr, &f.id, at).unwrap();
        assert_eq!(counted.tally, VoteTally::new(1, 1, 0));
        assert_eq!(counted.validator_count, 3);
        assert_eq!(f.coordinator.vote_result(&f.id).unwrap(), VoteTally::new(1, 1, 0));
        assert_eq!(
            f.coordinator.count_vote(&mgr, &f.id, at).unwrap_err().kind(),
            ErrorKind::InvalidPhase
        );
    }

    #[test]
    fn reveal_rejects_zero_nonce_and_ragged_arrays() {
        let mut f = running_system(2);
        commit(&mut f, voter(1), Choice::Blank, 1).unwrap();
        let mgr = f.manager_addr;
        let at = Timestamp::new(2_030);
        assert!(f
            .coordinator
            .reveal_ballot(&mgr, &f.id, &[voter(1)], &[Choice::Blank], &[0], at)
            .is_err());
        assert!(f
            .coordinator
            .reveal_ballot(&mgr, &f.id, &[voter(1)], &[], &[1], at)
            .is_err());
    }

    #[test]
    fn ballot_at_hidden_during_vote() {
        let mut f = running_system(2);
        commit(&mut f, voter(2), Choice::Blank, 1).unwrap();
        let err = f.coordinator.ballot_at(&f.id, 0, Timestamp::new(1_999)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooEarly);
        assert_eq!(f.coordinator.ballot_at(&f.id, 0, Timestamp::new(2_000)).unwrap().voter, voter(2));
        assert!(f.coordinator.vote_result(&f.id).is_err());
    }

    #[test]
    fn count_before_reveal_time_is_too_early() {
        let mut f = running_system(2);
        let mgr = f.manager_addr;
        let err = f.coordinator.count_vote(&mgr, &f.id, Timestamp::new(2_029)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooEarly);
    }

    #[test]
    fn unfinalized_system_set_locks_on_first_ballot() {
        let mut f = fixture(ProposalKind::System);
        let mgr = f.manager_addr;
        f.coordinator
            .setup_vote_info(&mgr, &f.id, Timestamp::new(1_000), Timestamp::new(2_000), Timestamp::new(2_030), String::new(), Timestamp::new(10))
            .unwrap();
        f.coordinator
            .add_validators(&mgr, &f.id, &[voter(1), voter(2)], false, Timestamp::new(10))
            .unwrap();
        assert!(!f.coordinator.validators_finalized(&f.id));
        commit(&mut f, voter(1), Choice::Positive, 3).unwrap();
        assert!(f.coordinator.validators_finalized(&f.id));
        assert_eq!(f.coordinator.vote_info(&f.id).unwrap().phase, VotePhase::Running);
    }

    #[test]
    fn unfinalized_set_locks_at_vote_start() {
        let mut f = fixture(ProposalKind::System);
        let mgr = f.manager_addr;
        f.coordinator
            .setup_vote_info(&mgr, &f.id, Timestamp::new(1_000), Timestamp::new(2_000), Timestamp::new(2_030), String::new(), Timestamp::new(10))
            .unwrap();
        f.coordinator
            .add_validators(&mgr, &f.id, &[voter(1), voter(2), voter(3)], false, Timestamp::new(10))
            .unwrap();
        let vote = f.coordinator.vote_info(&f.id).unwrap();
        assert_eq!(vote.phase_at(Timestamp::new(999)), VotePhase::Setting);
        assert_eq!(vote.phase_at(Timestamp::new(1_000)), VotePhase::Running);

        assert!(!f.coordinator.lock_if_started(&f.id, Timestamp::new(999)));
        assert!(!f.coordinator.validators_finalized(&f.id));

        // no ballots: counting still decides and locks
        let counted = f.coordinator.count_vote(&mgr, &f.id, Timestamp::new(2_030)).unwrap();
        assert_eq!(counted.tally, VoteTally::new(0, 0, 0));
        assert_eq!(counted.validator_count, 3);
        assert!(f.coordinator.validators_finalized(&f.id));
        assert!(!f.coordinator.lock_if_started(&f.id, Timestamp::new(2_030)));
    }

    #[test]
    fn registered_validator_assesses_before_finalize() {
        let mut f = fixture(ProposalKind::Fund);
        let mgr = f.manager_addr;
        f.coordinator
            .setup_vote_info(&mgr, &f.id, Timestamp::new(1_000), Timestamp::new(2_000), Timestamp::new(2_030), String::new(), Timestamp::new(50))
            .unwrap();
        f.coordinator
            .add_validators(&mgr, &f.id, &[voter(1), voter(2)], false, Timestamp::new(50))
            .unwrap();
        let scores = AssessmentScores::new([9; 5]).unwrap();
        f.coordinator.submit_assessment(&voter(1), &f.id, scores, Timestamp::new(100)).unwrap();
        let err = f
            .coordinator
            .submit_assessment(&voter(7), &f.id, scores, Timestamp::new(100))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthorized);

        let report = f.coordinator.count_assessment(&mgr, &f.id, 7, Timestamp::new(500)).unwrap();
        assert!(report.passed);
        assert!(f.coordinator.validators_finalized(&f.id));
        assert_eq!(f.coordinator.vote_info(&f.id).unwrap().phase, VotePhase::Running);
    }

    #[test]
    fn assessment_flow() {
        let mut f = fixture(ProposalKind::Fund);
        let mgr = f.manager_addr;
        f.coordinator
            .setup_vote_info(&mgr, &f.id, Timestamp::new(1_000), Timestamp::new(2_000), Timestamp::new(2_030), String::new(), Timestamp::new(100))
            .unwrap();
        f.coordinator
            .add_validators(&mgr, &f.id, &[voter(1), voter(2)], true, Timestamp::new(100))
            .unwrap();
        assert_eq!(f.coordinator.vote_info(&f.id).unwrap().phase, VotePhase::Assessing);

        let scores = AssessmentScores::new([8; 5]).unwrap();
        f.coordinator.submit_assessment(&voter(1), &f.id, scores, Timestamp::new(200)).unwrap();
        let err = f
            .coordinator
            .submit_assessment(&voter(1), &f.id, scores, Timestamp::new(201))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidVote);
        let err = f
            .coordinator
            .submit_assessment(&voter(2), &f.id, scores, Timestamp::new(500))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooLate);

        let err = f.coordinator.count_assessment(&mgr, &f.id, 7, Timestamp::new(499)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooEarly);
        let report = f.coordinator.count_assessment(&mgr, &f.id, 7, Timestamp::new(500)).unwrap();
        assert!(report.passed);
        assert_eq!(f.coordinator.vote_info(&f.id).unwrap().phase, VotePhase::Running);
        let err = f.coordinator.count_assessment(&mgr, &f.id, 7, Timestamp::new(501)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyFinishedAssessment);
    }

    #[test]
    fn assessment_on_system_proposal_rejected() {
        let mut f = running_system(2);
        let err = f
            .coordinator
            .submit_assessment(&voter(1), &f.id, AssessmentScores::new([7; 5]).unwrap(), Timestamp::new(200))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidProposalType);
    }
}
