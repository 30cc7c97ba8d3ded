//! Governance parameters: fees, quorum, voter incentive, withdrawal delay,
//! distribution batch size, assessment threshold and the approval-margin policy.
//!
//! Every field is tunable by the administrator through the governance config.

use crate::amount::Amount;
use crate::error::TypeError;
use serde::{Deserialize, Serialize};

/// Parts per million; the denominator of `quorum_factor` and `MarginPolicy::factor_ppm`.
pub const PPM: u64 = 1_000_000;

/// What a positive vote margin is measured against when deciding approval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginBasis {
    /// Margin relative to every vote cast (positive + negative + blank).
    TotalVotes,
    /// Margin relative to the quorum.
    Quorum,
    /// Margin relative to the frozen validator set size.
    ValidatorCount,
    /// `factor_ppm` read as an absolute minimum margin in votes.
    Absolute,
}

/// Minimum-approval-margin rule applied once quorum is met and positive > negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginPolicy {
    pub basis: MarginBasis,
    pub factor_ppm: u32,
}

impl MarginPolicy {
    /// Margin must be at least 10% of all votes cast.
    pub const DEFAULT: Self = Self {
        basis: MarginBasis::TotalVotes,
        factor_ppm: 100_000,
    };

    /// Whether `margin` clears the bar. `base` is the quantity named by `basis`.
    pub fn clears(&self, margin: u64, base: u64) -> bool {
        match self.basis {
            MarginBasis::Absolute => margin >= u64::from(self.factor_ppm),
            _ => u128::from(margin) * u128::from(PPM) >= u128::from(base) * u128::from(self.factor_ppm),
        }
    }
}

impl Default for MarginPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// All tunable governance parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceParams {
    // ── Fees ─────────────────────────────────────────────────────────────
    /// Minimum fund-proposal fee as permille of the requested amount.
    pub fund_fee_permil: u32,

    /// Flat minimum fee for a system proposal.
    pub system_fee: Amount,

    /// Incentive paid from the treasury to each validator of a proposal.
    pub voter_fee: Amount,

    // ── Decision ─────────────────────────────────────────────────────────
    /// Quorum as parts per million of the validator set. Must lie in `(0, PPM]`.
    pub quorum_factor: u32,

    pub margin_policy: MarginPolicy,

    /// Every assessment criterion must average at least this (0..=10).
    pub assessment_pass_average: u64,

    // ── Withdrawal ───────────────────────────────────────────────────────
    /// Cooling-off period (seconds) between vote counting and payout.
    pub withdraw_delay_period: u64,

    // ── Work limits ──────────────────────────────────────────────────────
    /// Validators paid per `distribute_voter_fees` call.
    pub distribution_batch_size: u32,
}

impl GovernanceParams {
    pub const MAX_ASSESSMENT_SCORE: u64 = 10;

    pub fn commons_defaults() -> Self {
        Self {
            fund_fee_permil: 10, // 1%
            system_fee: Amount::coins(100),
            voter_fee: Amount::new(400_000 * 1_000_000_000), // 0.0004 coin
            quorum_factor: 333_333, // one third
            margin_policy: MarginPolicy::DEFAULT,
            assessment_pass_average: 7,
            withdraw_delay_period: 24 * 3600, // 1 day
            distribution_batch_size: 100,
        }
    }

    /// Check every field against its domain.
    pub fn validate(&self) -> Result<(), TypeError> {
        validate_fund_fee_permil(self.fund_fee_permil)?;
        validate_quorum_factor(self.quorum_factor)?;
        validate_margin_policy(&self.margin_policy)?;
        validate_pass_average(self.assessment_pass_average)?;
        validate_batch_size(self.distribution_batch_size)?;
        Ok(())
    }

    /// Voter fees owed for one batch of `validators` validators.
    pub fn voter_fee_for(&self, validators: usize) -> Option<Amount> {
        self.voter_fee.checked_mul(validators as u128)
    }
}

impl Default for GovernanceParams {
    fn default() -> Self {
        Self::commons_defaults()
    }
}

pub fn validate_fund_fee_permil(value: u32) -> Result<(), TypeError> {
    if value > 1000 {
        return Err(invalid("fund_fee_permil", format!("{value} exceeds 1000")));
    }
    Ok(())
}

pub fn validate_quorum_factor(value: u32) -> Result<(), TypeError> {
    if value == 0 || u64::from(value) > PPM {
        return Err(invalid("quorum_factor", format!("{value} outside (0, {PPM}]")));
    }
    Ok(())
}

pub fn validate_margin_policy(policy: &MarginPolicy) -> Result<(), TypeError> {
    if policy.basis != MarginBasis::Absolute && u64::from(policy.factor_ppm) > PPM {
        return Err(invalid(
            "margin_policy",
            format!("factor {} exceeds {PPM}", policy.factor_ppm),
        ));
    }
    Ok(())
}

pub fn validate_pass_average(value: u64) -> Result<(), TypeError> {
    if value == 0 || value > GovernanceParams::MAX_ASSESSMENT_SCORE {
        return Err(invalid(
            "assessment_pass_average",
            format!("{value} outside 1..=10"),
        ));
    }
    Ok(())
}

pub fn validate_batch_size(value: u32) -> Result<(), TypeError> {
    if value == 0 {
        return Err(invalid("distribution_batch_size", "must be positive".into()));
    }
    Ok(())
}

fn invalid(field: &'static str, reason: String) -> TypeError {
    TypeError::InvalidParam { field, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let params = GovernanceParams::default();
        params.validate().unwrap();
        assert_eq!(params.quorum_factor, 333_333);
        assert_eq!(params.withdraw_delay_period, 86_400);
    }

    #[test]
    fn quorum_factor_domain() {
        assert!(validate_quorum_factor(0).is_err());
        assert!(validate_quorum_factor(1).is_ok());
        assert!(validate_quorum_factor(1_000_000).is_ok());
        assert!(validate_quorum_factor(1_000_001).is_err());
    }

    #[test]
    fn default_margin_is_ten_percent_of_votes() {
        let policy = MarginPolicy::DEFAULT;
        assert!(policy.clears(10, 33));
        assert!(!policy.clears(3, 33));
        assert!(policy.clears(8, 80));
        assert!(!policy.clears(7, 80));
    }

    #[test]
    fn absolute_margin_ignores_base() {
        let policy = MarginPolicy {
            basis: MarginBasis::Absolute,
            factor_ppm: 5,
        };
        assert!(policy.clears(5, 1_000));
        assert!(!policy.clears(4, 0));
    }

    #[test]
    fn partial_toml_like_input_uses_defaults() {
        let params: GovernanceParams =
            serde_json::from_str(r#"{ "quorum_factor": 500000 }"#).unwrap();
        assert_eq!(params.quorum_factor, 500_000);
        assert_eq!(params.fund_fee_permil, 10);
    }
}
