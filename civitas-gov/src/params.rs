use civitas_core::coins::{is_all_gte, validate_coins};
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{coins, Api, Coin, Decimal};

use crate::error::ContractError;

/// Upper bound on every period, roughly a century.
pub const MAX_PERIOD: u64 = 100 * 365 * 24 * 60 * 60;

/// Governance parameters. Durations are in seconds.
#[cw_serde]
pub struct Params {
    /// Deposit that moves a proposal into voting.
    pub min_deposit: Vec<Coin>,
    pub max_deposit_period: u64,
    pub voting_period: u64,
    /// Fraction of bonded stake that must vote.
    pub quorum: Decimal,
    /// Yes fraction of non-abstain power needed to pass.
    pub threshold: Decimal,
    /// NoWithVeto fraction of participation above which the proposal is vetoed.
    pub veto_threshold: Decimal,
    /// Share of `min_deposit` the proposer must put up on submission.
    pub min_initial_deposit_ratio: Decimal,
    /// Share of each deposit burned when the proposer cancels.
    pub proposal_cancel_ratio: Decimal,
    /// Receives the unburned part of canceled deposits; empty refunds depositors.
    pub proposal_cancel_dest: String,
    /// Fraction of the current period during which cancellation is allowed.
    pub proposal_cancel_max_period: Decimal,
    pub expedited_voting_period: u64,
    pub expedited_threshold: Decimal,
    pub expedited_min_deposit: Vec<Coin>,
    pub burn_vote_quorum: bool,
    pub burn_proposal_deposit_prevote: bool,
    pub burn_vote_veto: bool,
    /// Smallest share of `min_deposit` a single deposit message may carry.
    pub min_deposit_ratio: Decimal,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            min_deposit: coins(10_000_000, "stake"),
            max_deposit_period: 172_800,
            voting_period: 172_800,
            quorum: Decimal::permille(334),
            threshold: Decimal::percent(50),
            veto_threshold: Decimal::permille(334),
            min_initial_deposit_ratio: Decimal::zero(),
            proposal_cancel_ratio: Decimal::percent(50),
            proposal_cancel_dest: String::new(),
            proposal_cancel_max_period: Decimal::percent(50),
            expedited_voting_period: 86_400,
            expedited_threshold: Decimal::permille(667),
            expedited_min_deposit: coins(50_000_000, "stake"),
            burn_vote_quorum: false,
            burn_proposal_deposit_prevote: false,
            burn_vote_veto: true,
            min_deposit_ratio: Decimal::percent(1),
        }
    }
}

fn invalid(reason: impl Into<String>) -> ContractError {
    ContractError::InvalidParams {
        reason: reason.into(),
    }
}

fn check_period(name: &str, secs: u64) -> Result<(), ContractError> {
    if secs == 0 {
        return Err(invalid(format!("{name} must be positive")));
    }
    if secs > MAX_PERIOD {
        return Err(invalid(format!("{name} of {secs}s exceeds {MAX_PERIOD}s")));
    }
    Ok(())
}

fn check_unit_interval(name: &str, value: Decimal, allow_zero: bool) -> Result<(), ContractError> {
    if value > Decimal::one() {
        return Err(invalid(format!("{name} must not exceed 1: {value}")));
    }
    if !allow_zero && value.is_zero() {
        return Err(invalid(format!("{name} must be positive")));
    }
    Ok(())
}

impl Params {
    pub fn validate(&self, api: &dyn Api) -> Result<(), ContractError> {
        if self.min_deposit.is_empty() {
            return Err(invalid("min deposit cannot be empty"));
        }
        validate_coins(&self.min_deposit)?;
        if self.expedited_min_deposit.is_empty() {
            return Err(invalid("expedited min deposit cannot be empty"));
        }
        validate_coins(&self.expedited_min_deposit)?;
        if !is_all_gte(&self.expedited_min_deposit, &self.min_deposit) {
            return Err(invalid(
                "expedited min deposit must be at least the regular min deposit",
            ));
        }

        check_period("max deposit period", self.max_deposit_period)?;
        check_period("voting period", self.voting_period)?;
        check_period("expedited voting period", self.expedited_voting_period)?;
        if self.expedited_voting_period >= self.voting_period {
            return Err(invalid(format!(
                "expedited voting period {} must be shorter than voting period {}",
                self.expedited_voting_period, self.voting_period
            )));
        }

        check_unit_interval("quorum", self.quorum, true)?;
        check_unit_interval("threshold", self.threshold, false)?;
        check_unit_interval("veto threshold", self.veto_threshold, false)?;
        check_unit_interval("expedited threshold", self.expedited_threshold, false)?;
        if self.expedited_threshold <= self.threshold {
            return Err(invalid("expedited threshold must be above the regular threshold"));
        }
        check_unit_interval("min initial deposit ratio", self.min_initial_deposit_ratio, true)?;
        check_unit_interval("proposal cancel ratio", self.proposal_cancel_ratio, true)?;
        check_unit_interval("proposal cancel max period", self.proposal_cancel_max_period, true)?;
        check_unit_interval("min deposit ratio", self.min_deposit_ratio, true)?;

        if !self.proposal_cancel_dest.is_empty() {
            api.addr_validate(&self.proposal_cancel_dest)
                .map_err(|_| ContractError::InvalidAddress {
                    address: self.proposal_cancel_dest.clone(),
                })?;
        }
        Ok(())
    }

    pub fn min_deposit_for(&self, expedited: bool) -> &[Coin] {
        if expedited {
            &self.expedited_min_deposit
        } else {
            &self.min_deposit
        }
    }

    pub fn threshold_for(&self, expedited: bool) -> Decimal {
        if expedited {
            self.expedited_threshold
        } else {
            self.threshold
        }
    }

    pub fn voting_period_for(&self, expedited: bool) -> u64 {
        if expedited {
            self.expedited_voting_period
        } else {
            self.voting_period
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::testing::MockApi;

    #[test]
    fn defaults_are_valid() {
        Params::default().validate(&MockApi::default()).unwrap();
    }

    #[test]
    fn rejects_out_of_range_values() {
        let api = MockApi::default();

        let mut params = Params::default();
        params.threshold = Decimal::zero();
        assert!(params.validate(&api).is_err());

        let mut params = Params::default();
        params.quorum = Decimal::percent(101);
        assert!(params.validate(&api).is_err());

        let mut params = Params::default();
        params.expedited_voting_period = params.voting_period;
        assert!(params.validate(&api).is_err());

        let mut params = Params::default();
        params.expedited_threshold = params.threshold;
        assert!(params.validate(&api).is_err());

        let mut params = Params::default();
        params.expedited_min_deposit = coins(1, "stake");
        assert!(params.validate(&api).is_err());

        let mut params = Params::default();
        params.proposal_cancel_dest = "not an address".to_string();
        assert_eq!(
            params.validate(&api),
            Err(ContractError::InvalidAddress {
                address: "not an address".to_string()
            })
        );
    }

    #[test]
    fn periods_must_be_positive_and_bounded() {
        let api = MockApi::default();

        let mut params = Params::default();
        params.voting_period = 0;
        assert!(params.validate(&api).is_err());

        let mut params = Params::default();
        params.max_deposit_period = u64::MAX / 1_000_000_000 + 1;
        assert!(matches!(
            params.validate(&api),
            Err(ContractError::InvalidParams { .. })
        ));

        let mut params = Params::default();
        params.voting_period = MAX_PERIOD + 1;
        assert!(params.validate(&api).is_err());

        let mut params = Params::default();
        params.max_deposit_period = MAX_PERIOD;
        params.voting_period = MAX_PERIOD;
        params.validate(&api).unwrap();
    }

    #[test]
    fn expedited_variants_are_selected() {
        let params = Params::default();
        assert_eq!(params.voting_period_for(true), 86_400);
        assert_eq!(params.threshold_for(false), Decimal::percent(50));
        assert_eq!(params.min_deposit_for(true), coins(50_000_000, "stake").as_slice());
    }
}
