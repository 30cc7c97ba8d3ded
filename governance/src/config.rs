//! Governance configuration: admin-gated, domain-checked parameter store.

use crate::error::GovernanceError;
use commons_types::params::{
    validate_batch_size, validate_fund_fee_permil, validate_margin_policy, validate_pass_average,
    validate_quorum_factor,
};
use commons_types::{Address, Amount, GovernanceParams, MarginPolicy};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One parameter change, as submitted by the administrator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "param", content = "value", rename_all = "snake_case")]
pub enum ParamUpdate {
    FundFeePermil(u32),
    SystemFee(Amount),
    QuorumFactor(u32),
    VoterFee(Amount),
    WithdrawDelayPeriod(u64),
    DistributionBatchSize(u32),
    AssessmentPassAverage(u64),
    MarginPolicy(MarginPolicy),
}

#[derive(Clone, Debug)]
pub struct GovernanceConfig {
    admin: Address,
    params: GovernanceParams,
}

impl GovernanceConfig {
    pub fn new(admin: Address, params: GovernanceParams) -> Result<Self, GovernanceError> {
        params.validate()?;
        Ok(Self { admin, params })
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn is_admin(&self, caller: &Address) -> bool {
        &self.admin == caller
    }

    pub fn params(&self) -> &GovernanceParams {
        &self.params
    }

    pub fn ensure_admin(&self, caller: &Address) -> Result<(), GovernanceError> {
        if !self.is_admin(caller) {
            return Err(GovernanceError::NotAuthorized(*caller));
        }
        Ok(())
    }

    pub fn transfer_admin(
        &mut self,
        caller: &Address,
        new_admin: Address,
    ) -> Result<(), GovernanceError> {
        self.ensure_admin(caller)?;
        if new_admin.is_zero() {
            return Err(GovernanceError::InvalidInput("admin must not be zero".into()));
        }
        info!(from = %self.admin, to = %new_admin, "admin transferred");
        self.admin = new_admin;
        Ok(())
    }

    pub fn set_fund_fee_permil(&mut self, caller: &Address, value: u32) -> Result<(), GovernanceError> {
        self.ensure_admin(caller)?;
        validate_fund_fee_permil(value)?;
        self.params.fund_fee_permil = value;
        Ok(())
    }

    pub fn set_system_fee(&mut self, caller: &Address, value: Amount) -> Result<(), GovernanceError> {
        self.ensure_admin(caller)?;
        self.params.system_fee = value;
        Ok(())
    }

    pub fn set_quorum_factor(&mut self, caller: &Address, value: u32) -> Result<(), GovernanceError> {
        self.ensure_admin(caller)?;
        validate_quorum_factor(value)?;
        self.params.quorum_factor = value;
        Ok(())
    }

    pub fn set_voter_fee(&mut self, caller: &Address, value: Amount) -> Result<(), GovernanceError> {
        self.ensure_admin(caller)?;
        self.params.voter_fee = value;
        Ok(())
    }

    pub fn set_withdraw_delay_period(
        &mut self,
        caller: &Address,
        secs: u64,
    ) -> Result<(), GovernanceError> {
        self.ensure_admin(caller)?;
        self.params.withdraw_delay_period = secs;
        Ok(())
    }

    pub fn set_distribution_batch_size(
        &mut self,
        caller: &Address,
        value: u32,
    ) -> Result<(), GovernanceError> {
        self.ensure_admin(caller)?;
        validate_batch_size(value)?;
        self.params.distribution_batch_size = value;
        Ok(())
    }

    pub fn set_assessment_pass_average(
        &mut self,
        caller: &Address,
        value: u64,
    ) -> Result<(), GovernanceError> {
        self.ensure_admin(caller)?;
        validate_pass_average(value)?;
        self.params.assessment_pass_average = value;
        Ok(())
    }

    pub fn set_margin_policy(
        &mut self,
        caller: &Address,
        policy: MarginPolicy,
    ) -> Result<(), GovernanceError> {
        self.ensure_admin(caller)?;
        validate_margin_policy(&policy)?;
        self.params.margin_policy = policy;
        Ok(())
    }

    /// Dispatch a [`ParamUpdate`] to its setter.
    pub fn apply(&mut self, caller: &Address, update: ParamUpdate) -> Result<(), GovernanceError> {
        match update {
            ParamUpdate::FundFeePermil(v) => self.set_fund_fee_permil(caller, v),
            ParamUpdate::SystemFee(v) => self.set_system_fee(caller, v),
            ParamUpdate::QuorumFactor(v) => self.set_quorum_factor(caller, v),
            ParamUpdate::VoterFee(v) => self.set_voter_fee(caller, v),
            ParamUpdate::WithdrawDelayPeriod(v) => self.set_withdraw_delay_period(caller, v),
            ParamUpdate::DistributionBatchSize(v) => self.set_distribution_batch_size(caller, v),
            ParamUpdate::AssessmentPassAverage(v) => self.set_assessment_pass_average(caller, v),
            ParamUpdate::MarginPolicy(p) => self.set_margin_policy(caller, p),
        }
    }
}
