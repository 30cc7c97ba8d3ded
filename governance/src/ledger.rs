//! Budget ledger: proposal registry, treasury, voter-fee distribution, the
//! quorum decision and the withdrawal state machine.
//!
//! The ledger never moves value itself. Operations that pay out return
//! [`Payout`]s after committing their state change; delivering them is the
//! caller's last step.

use crate::assessment::AssessmentReport;
use crate::authorization::TrustedRelayer;
use crate::config::{GovernanceConfig, ParamUpdate};
use crate::coordinator::{CountedVote, VoteCoordinator};
use crate::decision::decide;
use crate::error::GovernanceError;
use crate::proposal::{Proposal, ProposalKind, ProposalResult, ProposalState, ProposalTimes};
use crate::withdrawal::{self, WithdrawCode, WithdrawStatus};
use commons_crypto::{FundProposalPayload, SystemProposalPayload};
use commons_types::{
    Address, Amount, DocHash, Payout, PayoutReason, ProposalId, PublicKey, Signature, Timestamp,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Fields of a proposal as submitted by its proposer. The vote manager signs
/// exactly these (plus the proposer, for fund proposals).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalRequest {
    pub id: ProposalId,
    pub kind: ProposalKind,
    pub title: String,
    pub doc_hash: DocHash,
    pub times: ProposalTimes,
    /// Requested payout. Zero for system proposals.
    pub amount: Amount,
}

impl ProposalRequest {
    pub fn system(id: ProposalId, title: impl Into<String>, doc_hash: DocHash, start: Timestamp, end: Timestamp) -> Self {
        Self {
            id,
            kind: ProposalKind::System,
            title: title.into(),
            doc_hash,
            times: ProposalTimes {
                start,
                end,
                start_assess: Timestamp::EPOCH,
                end_assess: Timestamp::EPOCH,
            },
            amount: Amount::ZERO,
        }
    }

    pub fn fund(
        id: ProposalId,
        title: impl Into<String>,
        doc_hash: DocHash,
        times: ProposalTimes,
        amount: Amount,
    ) -> Self {
        Self {
            id,
            kind: ProposalKind::Fund,
            title: title.into(),
            doc_hash,
            times,
            amount,
        }
    }

    pub fn system_payload(&self) -> SystemProposalPayload<'_> {
        SystemProposalPayload {
            proposal_id: self.id,
            title: &self.title,
            start: self.times.start,
            end: self.times.end,
            doc_hash: self.doc_hash,
        }
    }

    pub fn fund_payload(&self, proposer: Address) -> FundProposalPayload<'_> {
        FundProposalPayload {
            proposal_id: self.id,
            title: &self.title,
            start: self.times.start,
            end: self.times.end,
            start_assess: self.times.start_assess,
            end_assess: self.times.end_assess,
            doc_hash: self.doc_hash,
            amount: self.amount,
            proposer,
        }
    }

    fn check_times(&self, now: Timestamp) -> Result<(), GovernanceError> {
        let t = &self.times;
        if t.start >= t.end {
            return Err(GovernanceError::InvalidInput("require start < end".into()));
        }
        match self.kind {
            ProposalKind::System if now >= t.start => Err(GovernanceError::InvalidInput(
                "vote must start in the future".into(),
            )),
            ProposalKind::Fund if now > t.start_assess => Err(GovernanceError::InvalidInput(
                "assessment must not start in the past".into(),
            )),
            ProposalKind::Fund if !(t.start_assess < t.end_assess && t.end_assess <= t.start) => {
                Err(GovernanceError::InvalidInput(
                    "require start_assess < end_assess <= start".into(),
                ))
            }
            _ => Ok(()),
        }
    }
}

pub struct BudgetLedger {
    address: Address,
    config: GovernanceConfig,
    relayer: Option<TrustedRelayer>,
    coordinator: Option<Address>,
    proposals: HashMap<ProposalId, Proposal>,
    voter_fees_paid: HashMap<ProposalId, HashSet<Address>>,
    treasury: Amount,
}

impl BudgetLedger {
    pub fn new(address: Address, config: GovernanceConfig) -> Self {
        Self {
            address,
            config,
            relayer: None,
            coordinator: None,
            proposals: HashMap::new(),
            voter_fees_paid: HashMap::new(),
            treasury: Amount::ZERO,
        }
    }

    // ── Wiring and administration ────────────────────────────────────────

    /// Configure the vote-manager key and the coordinator this ledger drives.
    pub fn change_vote_param(
        &mut self,
        caller: &Address,
        manager_key: PublicKey,
        coordinator: Address,
    ) -> Result<(), GovernanceError> {
        self.config.ensure_admin(caller)?;
        if coordinator.is_zero() {
            return Err(GovernanceError::InvalidInput("coordinator address is zero".into()));
        }
        let relayer = TrustedRelayer::new(manager_key);
        info!(manager = %relayer.identity(), %coordinator, "vote parameters changed");
        self.relayer = Some(relayer);
        self.coordinator = Some(coordinator);
        Ok(())
    }

    pub fn apply_param(&mut self, caller: &Address, update: ParamUpdate) -> Result<(), GovernanceError> {
        self.config.apply(caller, update)
    }

    pub fn transfer_admin(&mut self, caller: &Address, new_admin: Address) -> Result<(), GovernanceError> {
        self.config.transfer_admin(caller, new_admin)
    }

    // ── Treasury ─────────────────────────────────────────────────────────

    pub fn deposit(&mut self, from: &Address, amount: Amount) -> Result<(), GovernanceError> {
        if amount.is_zero() {
            return Err(GovernanceError::InvalidInput("deposit of zero".into()));
        }
        self.treasury = self
            .treasury
            .checked_add(amount)
            .ok_or_else(|| GovernanceError::InvalidInput("treasury overflow".into()))?;
        info!(%from, %amount, treasury = %self.treasury, "deposit received");
        Ok(())
    }

    // ── Proposals ────────────────────────────────────────────────────────

    /// Minimum fee for a proposal of `kind` requesting `amount`.
    pub fn required_fee(&self, kind: ProposalKind, amount: Amount) -> Result<Amount, GovernanceError> {
        let params = self.config.params();
        match kind {
            ProposalKind::System => Ok(params.system_fee),
            ProposalKind::Fund => amount
                .permil(params.fund_fee_permil)
                .ok_or_else(|| GovernanceError::InvalidInput("fund amount too large".into())),
        }
    }

    /// Register a proposal co-signed by the vote manager and open its vote
    /// record on `coordinator`. The whole `fee_paid` goes to the treasury.
    pub fn create_proposal(
        &mut self,
        coordinator: &mut VoteCoordinator,
        caller: &Address,
        request: ProposalRequest,
        fee_paid: Amount,
        signature: &Signature,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        let (Some(relayer), Some(linked)) = (self.relayer, self.coordinator) else {
            return Err(GovernanceError::InvalidInput("vote parameters not configured".into()));
        };
        if linked != coordinator.address() {
            return Err(GovernanceError::InvalidInput(format!(
                "coordinator {} is not linked to this ledger",
                coordinator.address()
            )));
        }
        if self.proposals.contains_key(&request.id) {
            return Err(GovernanceError::AlreadyExistProposal(request.id));
        }
        request.check_times(now)?;
        match request.kind {
            ProposalKind::System if !request.amount.is_zero() => {
                return Err(GovernanceError::InvalidInput(
                    "system proposals carry no fund amount".into(),
                ));
            }
            ProposalKind::Fund if request.amount.is_zero() => {
                return Err(GovernanceError::InvalidInput("fund amount is zero".into()));
            }
            _ => {}
        }
        let required = self.required_fee(request.kind, request.amount)?;
        if fee_paid < required {
            return Err(GovernanceError::InvalidFee {
                required,
                paid: fee_paid,
            });
        }
        let treasury = self
            .treasury
            .checked_add(fee_paid)
            .ok_or_else(|| GovernanceError::InvalidInput("treasury overflow".into()))?;
        let authorized = match request.kind {
            ProposalKind::System => relayer.authorize_system(&request.system_payload(), signature)?,
            ProposalKind::Fund => relayer.authorize_fund(&request.fund_payload(*caller), signature)?,
        };

        let mut times = request.times;
        if request.kind == ProposalKind::System {
            times.start_assess = Timestamp::EPOCH;
            times.end_assess = Timestamp::EPOCH;
        }
        coordinator.init(&self.address, *authorized.proposal_id(), request.kind, times)?;

        let proposal = Proposal::new(
            request.id,
            request.kind,
            request.title,
            request.doc_hash,
            times,
            request.amount,
            *caller,
            fee_paid,
        );
        info!(
            proposal = %proposal.id,
            kind = ?proposal.kind,
            proposer = %caller,
            fee = %fee_paid,
            amount = %proposal.fund_amount,
            "proposal created"
        );
        self.proposals.insert(proposal.id, proposal);
        self.treasury = treasury;
        Ok(())
    }

    // ── Voter fees ───────────────────────────────────────────────────────

    /// Pay the voter fee to up to `distribution_batch_size` validators
    /// starting at `start_index`. Validators already paid for this proposal
    /// are skipped, so overlapping calls are safe. The batch is paid in full
    /// or not at all.
    pub fn distribute_voter_fees(
        &mut self,
        coordinator: &VoteCoordinator,
        caller: &Address,
        id: &ProposalId,
        start_index: usize,
    ) -> Result<Vec<Payout>, GovernanceError> {
        self.config.ensure_admin(caller)?;
        if !self.proposals.contains_key(id) {
            return Err(GovernanceError::NotFoundProposal(*id));
        }
        let validators = coordinator.frozen_validators(id).ok_or_else(|| {
            GovernanceError::InvalidPhase(format!("validators of {id} not finalized"))
        })?;
        if start_index >= validators.len() {
            return Err(GovernanceError::InvalidInput(format!(
                "start index {start_index} past {} validators",
                validators.len()
            )));
        }

        let params = self.config.params();
        let paid = self.voter_fees_paid.get(id);
        let unpaid: Vec<Address> = validators
            .window(start_index, params.distribution_batch_size as usize)
            .iter()
            .filter(|v| paid.map_or(true, |set| !set.contains(*v)))
            .copied()
            .collect();
        let total = params
            .voter_fee_for(unpaid.len())
            .ok_or_else(|| GovernanceError::InvalidInput("voter fee overflow".into()))?;
        let remaining = self
            .treasury
            .checked_sub(total)
            .ok_or(GovernanceError::NotEnoughBudget {
                needed: total,
                available: self.treasury,
            })?;

        let fee = params.voter_fee;
        let payouts: Vec<Payout> = unpaid
            .iter()
            .map(|to| Payout {
                to: *to,
                amount: fee,
                reason: PayoutReason::VoterFee(*id),
            })
            .collect();
        self.voter_fees_paid.entry(*id).or_default().extend(unpaid);
        self.treasury = remaining;
        debug!(proposal = %id, start_index, paid = payouts.len(), %total, "voter fees distributed");
        Ok(payouts)
    }

    /// The validator set is frozen and someone in it is still unpaid.
    pub fn can_distribute_voter_fees(&self, coordinator: &VoteCoordinator, id: &ProposalId) -> bool {
        let Some(validators) = coordinator.frozen_validators(id) else {
            return false;
        };
        let paid = self.voter_fees_paid.get(id).map_or(0, HashSet::len);
        self.proposals.contains_key(id) && paid < validators.len()
    }

    pub fn voter_fee_paid(&self, id: &ProposalId, validator: &Address) -> bool {
        self.voter_fees_paid
            .get(id)
            .is_some_and(|set| set.contains(validator))
    }

    // ── Assessment and vote outcomes ─────────────────────────────────────

    fn get(&self, id: &ProposalId) -> Result<&Proposal, GovernanceError> {
        self.proposals
            .get(id)
            .ok_or(GovernanceError::NotFoundProposal(*id))
    }

    fn get_mut(&mut self, id: &ProposalId) -> Result<&mut Proposal, GovernanceError> {
        self.proposals
            .get_mut(id)
            .ok_or(GovernanceError::NotFoundProposal(*id))
    }

    /// The proposal can take an assessment result.
    pub fn ensure_assessment_pending(&self, id: &ProposalId) -> Result<(), GovernanceError> {
        let proposal = self.get(id)?;
        if proposal.kind != ProposalKind::Fund {
            return Err(GovernanceError::InvalidProposalType);
        }
        if proposal.state != ProposalState::Created {
            return Err(GovernanceError::AlreadyFinishedAssessment);
        }
        Ok(())
    }

    /// Copy the assessment outcome. A failed assessment rejects the proposal
    /// for good and counts as the end of counting.
    pub fn record_assessment(
        &mut self,
        id: &ProposalId,
        report: &AssessmentReport,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        self.ensure_assessment_pending(id)?;
        let proposal = self.get_mut(id)?;
        proposal.assess_participant_count = report.participants;
        proposal.assess_score_totals = report.totals;
        if report.passed {
            proposal.advance(ProposalState::Accepted)?;
        } else {
            proposal.conclude(ProposalState::Rejected, ProposalResult::AssessmentFailed, now)?;
        }
        info!(proposal = %id, passed = report.passed, state = ?proposal.state, "assessment recorded");
        Ok(())
    }

    /// The proposal is waiting for its vote to be counted.
    pub fn ensure_vote_pending(&self, id: &ProposalId) -> Result<(), GovernanceError> {
        let proposal = self.get(id)?;
        let ready = match proposal.kind {
            ProposalKind::System => ProposalState::Created,
            ProposalKind::Fund => ProposalState::Accepted,
        };
        match proposal.state {
            state if state == ready => Ok(()),
            ProposalState::Rejected => Err(GovernanceError::RejectedProposal),
            state => Err(GovernanceError::InvalidPhase(format!(
                "proposal {id} cannot be counted in {state:?}"
            ))),
        }
    }

    /// Apply the quorum and margin decision to a counted vote.
    pub fn finish_vote(
        &mut self,
        id: &ProposalId,
        counted: &CountedVote,
        now: Timestamp,
    ) -> Result<ProposalResult, GovernanceError> {
        self.ensure_vote_pending(id)?;
        let params = self.config.params();
        let result = decide(
            &counted.tally,
            counted.validator_count,
            params.quorum_factor,
            &params.margin_policy,
        );
        let proposal = self.get_mut(id)?;
        proposal.record_vote(&counted.tally, counted.validator_count);
        proposal.conclude(ProposalState::Finished, result, now)?;
        info!(
            proposal = %id,
            ?result,
            positive = counted.tally.positive,
            negative = counted.tally.negative,
            blank = counted.tally.blank,
            validators = counted.validator_count,
            "vote finished"
        );
        Ok(result)
    }

    // ── Funding administration ───────────────────────────────────────────

    fn ensure_funding_adjustable(&self, caller: &Address, id: &ProposalId) -> Result<(), GovernanceError> {
        self.config.ensure_admin(caller)?;
        let proposal = self.get(id)?;
        if proposal.kind != ProposalKind::Fund {
            return Err(GovernanceError::InvalidProposalType);
        }
        if !proposal.is_concluded() {
            return Err(GovernanceError::NotEndProposal);
        }
        if proposal.result != ProposalResult::Approved {
            return Err(GovernanceError::RejectedProposal);
        }
        if proposal.withdrawn {
            return Err(GovernanceError::InvalidTime);
        }
        Ok(())
    }

    pub fn refuse_funding(&mut self, caller: &Address, id: &ProposalId, now: Timestamp) -> Result<(), GovernanceError> {
        self.ensure_funding_adjustable(caller, id)?;
        let proposal = self.get_mut(id)?;
        proposal.funding_refused = true;
        proposal.refusal_time = Some(now);
        info!(proposal = %id, "funding refused");
        Ok(())
    }

    pub fn allow_funding(&mut self, caller: &Address, id: &ProposalId) -> Result<(), GovernanceError> {
        self.ensure_funding_adjustable(caller, id)?;
        let proposal = self.get_mut(id)?;
        proposal.funding_refused = false;
        info!(proposal = %id, "funding allowed");
        Ok(())
    }

    // ── Withdrawal ───────────────────────────────────────────────────────

    pub fn check_withdraw_state(&self, id: &ProposalId, caller: &Address, now: Timestamp) -> WithdrawCode {
        withdrawal::evaluate(
            self.proposals.get(id),
            caller,
            now,
            self.treasury,
            self.config.params().withdraw_delay_period,
        )
    }

    pub fn withdraw_status(&self, id: &ProposalId, caller: &Address, now: Timestamp) -> WithdrawStatus {
        WithdrawStatus {
            code: self.check_withdraw_state(id, caller, now),
            counting_finish_time: self
                .proposals
                .get(id)
                .and_then(|p| p.counting_finish_time),
        }
    }

    /// Release the approved amount to its proposer. The proposal is marked
    /// withdrawn and the treasury debited before the payout is handed back.
    pub fn withdraw(&mut self, caller: &Address, id: &ProposalId, now: Timestamp) -> Result<Payout, GovernanceError> {
        let code = self.check_withdraw_state(id, caller, now);
        if !code.is_permitted() {
            return Err(GovernanceError::Withdraw(code));
        }
        let proposal = self.get(id)?;
        let amount = proposal.fund_amount;
        let remaining = self.treasury.checked_sub(amount).ok_or(
            GovernanceError::Withdraw(WithdrawCode::InsufficientTreasury),
        )?;

        let proposal = self.get_mut(id)?;
        proposal.withdrawn = true;
        let to = proposal.proposer;
        self.treasury = remaining;
        info!(proposal = %id, %to, %amount, "funds withdrawn");
        Ok(Payout {
            to,
            amount,
            reason: PayoutReason::Funding(*id),
        })
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn admin(&self) -> Address {
        self.config.admin()
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    pub fn manager(&self) -> Option<&TrustedRelayer> {
        self.relayer.as_ref()
    }

    pub fn coordinator(&self) -> Option<Address> {
        self.coordinator
    }

    pub fn proposal(&self, id: &ProposalId) -> Option<Proposal> {
        self.proposals.get(id).cloned()
    }

    pub fn proposal_count(&self) -> usize {
        self.proposals.len()
    }

    pub fn treasury_balance(&self) -> Amount {
        self.treasury
    }
}
