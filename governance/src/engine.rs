//! Governance engine: ties the coordinator and the ledger together, reads
//! the clock and performs value transfers as the last effect of a command.

use crate::assessment::{AssessmentReport, AssessmentScores};
use crate::ballot::Choice;
use crate::config::{GovernanceConfig, ParamUpdate};
use crate::coordinator::VoteCoordinator;
use crate::error::GovernanceError;
use crate::event::{EventBus, GovernanceEvent};
use crate::ledger::{BudgetLedger, ProposalRequest};
use crate::proposal::ProposalResult;
use crate::withdrawal::{WithdrawCode, WithdrawStatus};
use commons_types::{
    Address, Amount, Clock, Commitment, GovernanceParams, Payout, ProposalId, PublicKey, Signature,
    Timestamp, ValueTransfer,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// Identities and parameters needed to bring up a governance instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSetup {
    pub ledger_address: Address,
    pub coordinator_address: Address,
    pub admin: Address,
    pub manager_key: PublicKey,
    pub params: GovernanceParams,
    /// Initial treasury balance, credited as a deposit from the admin.
    pub treasury: Amount,
}

pub struct GovernanceEngine {
    ledger: BudgetLedger,
    coordinator: VoteCoordinator,
    clock: Box<dyn Clock>,
    transfer: Box<dyn ValueTransfer>,
    bus: EventBus,
    /// Events for the embedding service to process.
    pending_events: Vec<GovernanceEvent>,
    /// Payouts whose transfer failed after the ledger had committed them.
    undelivered: Vec<Payout>,
}

impl GovernanceEngine {
    pub fn new(
        setup: EngineSetup,
        clock: Box<dyn Clock>,
        transfer: Box<dyn ValueTransfer>,
    ) -> Result<Self, GovernanceError> {
        let config = GovernanceConfig::new(setup.admin, setup.params)?;
        let mut ledger = BudgetLedger::new(setup.ledger_address, config);
        let mut coordinator = VoteCoordinator::new(setup.coordinator_address, setup.manager_key);

        let manager = coordinator.manager().identity();
        coordinator.change_commons_budget(&manager, setup.ledger_address)?;
        ledger.change_vote_param(&setup.admin, setup.manager_key, setup.coordinator_address)?;
        if !setup.treasury.is_zero() {
            ledger.deposit(&setup.admin, setup.treasury)?;
        }
        info!(
            ledger = %setup.ledger_address,
            coordinator = %setup.coordinator_address,
            admin = %setup.admin,
            %manager,
            treasury = %setup.treasury,
            "governance engine ready"
        );

        Ok(Self {
            ledger,
            coordinator,
            clock,
            transfer,
            bus: EventBus::new(),
            pending_events: Vec::new(),
            undelivered: Vec::new(),
        })
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn record(&mut self, event: GovernanceEvent) {
        self.bus.emit(&event);
        self.pending_events.push(event);
    }

    /// Hand payouts to the transfer primitive. State is already committed, so
    /// a failure is logged and reported but nothing is rolled back.
    fn deliver(&mut self, payouts: Vec<Payout>) -> Result<(), GovernanceError> {
        let mut first_failure = None;
        for payout in payouts {
            if let Err(e) = self.transfer.transfer(&payout) {
                error!(to = %payout.to, amount = %payout.amount, reason = ?payout.reason, error = %e, "transfer failed after commit");
                self.undelivered.push(payout);
                first_failure.get_or_insert(e);
            }
        }
        match first_failure {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    // ── Administration ───────────────────────────────────────────────────

    pub fn apply_param(&mut self, caller: &Address, update: ParamUpdate) -> Result<(), GovernanceError> {
        self.ledger.apply_param(caller, update)
    }

    pub fn transfer_admin(&mut self, caller: &Address, new_admin: Address) -> Result<(), GovernanceError> {
        self.ledger.transfer_admin(caller, new_admin)
    }

    pub fn deposit(&mut self, from: &Address, amount: Amount) -> Result<(), GovernanceError> {
        self.ledger.deposit(from, amount)?;
        self.record(GovernanceEvent::Deposited { from: *from, amount });
        Ok(())
    }

    // ── Proposal lifecycle ───────────────────────────────────────────────

    pub fn create_proposal(
        &mut self,
        caller: &Address,
        request: ProposalRequest,
        fee_paid: Amount,
        signature: &Signature,
    ) -> Result<(), GovernanceError> {
        let now = self.now();
        let (id, kind) = (request.id, request.kind);
        self.ledger
            .create_proposal(&mut self.coordinator, caller, request, fee_paid, signature, now)?;
        self.record(GovernanceEvent::ProposalCreated {
            proposal_id: id,
            kind,
            proposer: *caller,
            fee: fee_paid,
        });
        Ok(())
    }

    pub fn setup_vote_info(
        &mut self,
        caller: &Address,
        id: &ProposalId,
        start: Timestamp,
        end: Timestamp,
        open_reveal: Timestamp,
        info: String,
    ) -> Result<(), GovernanceError> {
        let now = self.now();
        self.coordinator
            .setup_vote_info(caller, id, start, end, open_reveal, info, now)
    }

    pub fn add_validators(
        &mut self,
        caller: &Address,
        id: &ProposalId,
        addresses: &[Address],
        finalize: bool,
    ) -> Result<usize, GovernanceError> {
        let now = self.now();
        self.coordinator
            .add_validators(caller, id, addresses, finalize, now)
    }

    /// Pay one batch of voter fees. Returns how many validators were paid.
    pub fn distribute_voter_fees(
        &mut self,
        caller: &Address,
        id: &ProposalId,
        start_index: usize,
    ) -> Result<usize, GovernanceError> {
        let now = self.now();
        self.coordinator.lock_if_started(id, now);
        let payouts =
            self.ledger
                .distribute_voter_fees(&self.coordinator, caller, id, start_index)?;
        let paid = payouts.len();
        let total = payouts.iter().map(|p| p.amount).sum();
        self.record(GovernanceEvent::VoterFeesDistributed {
            proposal_id: *id,
            start_index,
            paid,
            total,
        });
        self.deliver(payouts)?;
        Ok(paid)
    }

    pub fn submit_assessment(
        &mut self,
        caller: &Address,
        id: &ProposalId,
        scores: AssessmentScores,
    ) -> Result<(), GovernanceError> {
        let now = self.now();
        self.coordinator.submit_assessment(caller, id, scores, now)
    }

    pub fn count_assessment(
        &mut self,
        caller: &Address,
        id: &ProposalId,
    ) -> Result<AssessmentReport, GovernanceError> {
        let now = self.now();
        self.ledger.ensure_assessment_pending(id)?;
        let pass_average = self.ledger.config().params().assessment_pass_average;
        let report = self
            .coordinator
            .count_assessment(caller, id, pass_average, now)?;
        self.ledger.record_assessment(id, &report, now)?;
        self.record(GovernanceEvent::AssessmentFinished {
            proposal_id: *id,
            passed: report.passed,
        });
        Ok(report)
    }

    pub fn submit_ballot(
        &mut self,
        caller: &Address,
        id: &ProposalId,
        commitment: Commitment,
        signature: &Signature,
    ) -> Result<bool, GovernanceError> {
        let now = self.now();
        self.coordinator
            .submit_ballot(caller, id, commitment, signature, now)
    }

    pub fn reveal_ballot(
        &mut self,
        caller: &Address,
        id: &ProposalId,
        voters: &[Address],
        choices: &[Choice],
        nonces: &[u64],
    ) -> Result<usize, GovernanceError> {
        let now = self.now();
        self.coordinator
            .reveal_ballot(caller, id, voters, choices, nonces, now)
    }

    /// Count the revealed ballots and decide the proposal.
    pub fn count_vote(&mut self, caller: &Address, id: &ProposalId) -> Result<ProposalResult, GovernanceError> {
        let now = self.now();
        self.ledger.ensure_vote_pending(id)?;
        let counted = self.coordinator.count_vote(caller, id, now)?;
        let result = self.ledger.finish_vote(id, &counted, now)?;
        self.record(GovernanceEvent::VoteFinished {
            proposal_id: *id,
            result,
        });
        Ok(result)
    }

    // ── Funding and withdrawal ───────────────────────────────────────────

    pub fn refuse_funding(&mut self, caller: &Address, id: &ProposalId) -> Result<(), GovernanceError> {
        let now = self.now();
        self.ledger.refuse_funding(caller, id, now)?;
        self.record(GovernanceEvent::FundingRefused { proposal_id: *id });
        Ok(())
    }

    pub fn allow_funding(&mut self, caller: &Address, id: &ProposalId) -> Result<(), GovernanceError> {
        self.ledger.allow_funding(caller, id)?;
        self.record(GovernanceEvent::FundingAllowed { proposal_id: *id });
        Ok(())
    }

    pub fn check_withdraw_state(&self, id: &ProposalId, caller: &Address) -> WithdrawCode {
        self.ledger.check_withdraw_state(id, caller, self.now())
    }

    pub fn withdraw_status(&self, id: &ProposalId, caller: &Address) -> WithdrawStatus {
        self.ledger.withdraw_status(id, caller, self.now())
    }

    pub fn withdraw(&mut self, caller: &Address, id: &ProposalId) -> Result<Payout, GovernanceError> {
        let now = self.now();
        let payout = self.ledger.withdraw(caller, id, now)?;
        self.record(GovernanceEvent::FundTransferred {
            proposal_id: *id,
            to: payout.to,
            amount: payout.amount,
        });
        self.deliver(vec![payout.clone()])?;
        Ok(payout)
    }

    // ── Observation ──────────────────────────────────────────────────────

    pub fn ledger(&self) -> &BudgetLedger {
        &self.ledger
    }

    pub fn coordinator(&self) -> &VoteCoordinator {
        &self.coordinator
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&GovernanceEvent) + Send + Sync>) {
        self.bus.subscribe(listener);
    }

    /// Drain all pending events.
    pub fn drain_events(&mut self) -> Vec<GovernanceEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn undelivered(&self) -> &[Payout] {
        &self.undelivered
    }

    /// Hand undelivered payouts to an operator for out-of-band settlement.
    pub fn take_undelivered(&mut self) -> Vec<Payout> {
        let taken = std::mem::take(&mut self.undelivered);
        if !taken.is_empty() {
            debug!(count = taken.len(), "undelivered payouts taken");
        }
        taken
    }
}
