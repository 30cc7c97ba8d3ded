#![allow(dead_code)]

use commons_crypto::{ballot_commitment, keypair_from_seed, sign_payload, BallotAuthorization};
use commons_governance::{
    AssessmentScores, Choice, EngineSetup, GovernanceEngine, ProposalRequest, ProposalResult,
    ProposalTimes,
};
use commons_nullables::{NullClock, NullTransfer};
use commons_types::{Address, Amount, DocHash, GovernanceParams, KeyPair, ProposalId, Timestamp};

pub const DAY: u64 = 86_400;
pub const T0: u64 = 1_000_000;
pub const ASSESS_START: u64 = T0;
pub const ASSESS_END: u64 = T0 + DAY;
pub const VOTE_START: u64 = ASSESS_END + 3_600;
pub const VOTE_END: u64 = VOTE_START + DAY;
pub const REVEAL: u64 = VOTE_END + 30;

pub struct Harness {
    pub engine: GovernanceEngine,
    pub clock: NullClock,
    pub transfer: NullTransfer,
    pub manager: KeyPair,
    pub manager_addr: Address,
    pub admin: Address,
    pub proposer: Address,
    pub validators: Vec<Address>,
}

pub fn validator(index: usize) -> Address {
    let mut bytes = [0x5A; 32];
    bytes[..8].copy_from_slice(&(index as u64).to_be_bytes());
    Address::new(bytes)
}

pub fn proposal_id(seed: u8) -> ProposalId {
    ProposalId::new([seed; 32])
}

pub fn fund_times() -> ProposalTimes {
    ProposalTimes {
        start: Timestamp::new(VOTE_START),
        end: Timestamp::new(VOTE_END),
        start_assess: Timestamp::new(ASSESS_START),
        end_assess: Timestamp::new(ASSESS_END),
    }
}

impl Harness {
    pub fn new(validators: usize, treasury: Amount) -> Self {
        Self::with_params(validators, treasury, GovernanceParams::commons_defaults())
    }

    pub fn with_params(validators: usize, treasury: Amount, params: GovernanceParams) -> Self {
        let manager = keypair_from_seed(&[0x4D; 32]);
        let manager_addr = Address::from_public_key(&manager.public);
        let admin = Address::new([0xAD; 32]);
        let clock = NullClock::new(T0);
        let transfer = NullTransfer::new();
        let setup = EngineSetup {
            ledger_address: Address::new([0xB0; 32]),
            coordinator_address: Address::new([0xC0; 32]),
            admin,
            manager_key: manager.public,
            params,
            treasury,
        };
        let engine =
            GovernanceEngine::new(setup, Box::new(clock.clone()), Box::new(transfer.clone()))
                .expect("engine");
        Self {
            engine,
            clock,
            transfer,
            manager,
            manager_addr,
            admin,
            proposer: Address::new([0xAA; 32]),
            validators: (0..validators).map(validator).collect(),
        }
    }

    pub fn at(&self, secs: u64) {
        self.clock.set(secs);
    }

    pub fn create_fund(&mut self, id: ProposalId, amount: Amount) {
        let request =
            ProposalRequest::fund(id, "Fund proposal", DocHash::new([7; 32]), fund_times(), amount);
        let signature =
            sign_payload(&request.fund_payload(self.proposer), &self.manager.private).unwrap();
        let fee = self
            .engine
            .ledger()
            .required_fee(request.kind, request.amount)
            .unwrap();
        let proposer = self.proposer;
        self.engine
            .create_proposal(&proposer, request, fee, &signature)
            .expect("create fund proposal");
    }

    pub fn create_system(&mut self, id: ProposalId) {
        let request = ProposalRequest::system(
            id,
            "System proposal",
            DocHash::new([8; 32]),
            Timestamp::new(VOTE_START),
            Timestamp::new(VOTE_END),
        );
        let signature = sign_payload(&request.system_payload(), &self.manager.private).unwrap();
        let fee = self.engine.ledger().config().params().system_fee;
        let proposer = self.proposer;
        self.engine
            .create_proposal(&proposer, request, fee, &signature)
            .expect("create system proposal");
    }

    /// Set up the vote and register every validator, finalizing with the last batch.
    pub fn setup_vote(&mut self, id: &ProposalId) {
        self.setup_vote_with(id, true);
    }

    /// Set up the vote and register every validator without finalizing, so
    /// the set only locks at vote start.
    pub fn setup_vote_open(&mut self, id: &ProposalId) {
        self.setup_vote_with(id, false);
    }

    fn setup_vote_with(&mut self, id: &ProposalId, finalize: bool) {
        let manager = self.manager_addr;
        self.engine
            .setup_vote_info(
                &manager,
                id,
                Timestamp::new(VOTE_START),
                Timestamp::new(VOTE_END),
                Timestamp::new(REVEAL),
                "vote".into(),
            )
            .expect("setup vote");
        let batches: Vec<Vec<Address>> = self.validators.chunks(40).map(<[_]>::to_vec).collect();
        let last = batches.len().saturating_sub(1);
        for (i, batch) in batches.iter().enumerate() {
            self.engine
                .add_validators(&manager, id, batch, finalize && i == last)
                .expect("add validators");
        }
    }

    /// The first `assessors` validators each score `score` on every criterion.
    pub fn assess(&mut self, id: &ProposalId, assessors: usize, score: u64) -> bool {
        self.at(ASSESS_START);
        let scores = AssessmentScores::new([score; 5]).unwrap();
        for voter in self.validators.iter().take(assessors) {
            self.engine
                .submit_assessment(voter, id, scores)
                .expect("assessment");
        }
        self.at(ASSESS_END);
        let manager = self.manager_addr;
        self.engine
            .count_assessment(&manager, id)
            .expect("count assessment")
            .passed
    }

    pub fn commit(&mut self, id: &ProposalId, voter: Address, choice: Choice, nonce: u64) {
        let commitment = ballot_commitment(
            &self.engine.coordinator().address(),
            id,
            &voter,
            choice.as_u8(),
            nonce,
        );
        let signature = sign_payload(
            &BallotAuthorization {
                proposal_id: *id,
                voter,
                commitment,
            },
            &self.manager.private,
        )
        .unwrap();
        self.engine
            .submit_ballot(&voter, id, commitment, &signature)
            .expect("submit ballot");
    }

    /// Ballots in validator order: positives, then negatives, then blanks.
    pub fn ballots(&self, positive: usize, negative: usize, blank: usize) -> Vec<(Address, Choice, u64)> {
        let choices = std::iter::repeat(Choice::Positive)
            .take(positive)
            .chain(std::iter::repeat(Choice::Negative).take(negative))
            .chain(std::iter::repeat(Choice::Blank).take(blank));
        self.validators
            .iter()
            .zip(choices)
            .enumerate()
            .map(|(i, (voter, choice))| (*voter, choice, i as u64 + 1))
            .collect()
    }

    pub fn commit_all(&mut self, id: &ProposalId, ballots: &[(Address, Choice, u64)]) {
        self.at(VOTE_START);
        for (voter, choice, nonce) in ballots {
            self.commit(id, *voter, *choice, *nonce);
        }
    }

    pub fn reveal(&mut self, id: &ProposalId, ballots: &[(Address, Choice, u64)]) -> usize {
        self.at(REVEAL);
        let voters: Vec<_> = ballots.iter().map(|b| b.0).collect();
        let choices: Vec<_> = ballots.iter().map(|b| b.1).collect();
        let nonces: Vec<_> = ballots.iter().map(|b| b.2).collect();
        let manager = self.manager_addr;
        self.engine
            .reveal_ballot(&manager, id, &voters, &choices, &nonces)
            .expect("reveal")
    }

    /// Commit, reveal and count a full vote.
    pub fn vote(&mut self, id: &ProposalId, positive: usize, negative: usize, blank: usize) -> ProposalResult {
        let ballots = self.ballots(positive, negative, blank);
        self.commit_all(id, &ballots);
        for batch in ballots.chunks(25) {
            self.reveal(id, batch);
        }
        let manager = self.manager_addr;
        self.engine.count_vote(&manager, id).expect("count vote")
    }

    /// A fund proposal taken through a passing assessment and the given vote.
    pub fn run_fund(&mut self, id: ProposalId, amount: Amount, tally: (usize, usize, usize)) -> ProposalResult {
        self.at(T0);
        self.create_fund(id, amount);
        self.setup_vote(&id);
        assert!(self.assess(&id, 10, 8));
        self.vote(&id, tally.0, tally.1, tally.2)
    }

    pub fn run_system(&mut self, id: ProposalId, tally: (usize, usize, usize)) -> ProposalResult {
        self.at(T0);
        self.create_system(id);
        self.setup_vote(&id);
        self.vote(&id, tally.0, tally.1, tally.2)
    }
}
