use civitas_core::authz::{AcceptResponse, Authorization};
use civitas_core::msg::validate_addr;
use civitas_core::{AnyMsg, CoreError, TypeUrl};
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Api, Coin, Deps, Env};

use crate::msg::{MsgDelegate, MsgUndelegate};

#[cw_serde]
pub enum AuthorizationType {
    Delegate,
    Undelegate,
}

#[cw_serde]
pub enum Validators {
    AllowList { addresses: Vec<String> },
    DenyList { addresses: Vec<String> },
}

/// Lets the grantee delegate or undelegate the granter's tokens, capped by
/// `max_tokens` when set and filtered by validator.
#[cw_serde]
pub struct StakeAuthorization {
    pub max_tokens: Option<Coin>,
    pub validators: Validators,
    pub authorization_type: AuthorizationType,
}

impl TypeUrl for StakeAuthorization {
    const TYPE_URL: &'static str = "/cosmos.staking.v1beta1.StakeAuthorization";
}

impl StakeAuthorization {
    fn validator_allowed(&self, validator: &str) -> bool {
        match &self.validators {
            Validators::AllowList { addresses } => addresses.iter().any(|a| a == validator),
            Validators::DenyList { addresses } => !addresses.iter().any(|a| a == validator),
        }
    }

    fn decode_target(&self, msg: &AnyMsg) -> Result<(String, Coin), CoreError> {
        match self.authorization_type {
            AuthorizationType::Delegate => {
                let msg = MsgDelegate::from_any(msg)?;
                Ok((msg.validator_address, msg.amount))
            }
            AuthorizationType::Undelegate => {
                let msg = MsgUndelegate::from_any(msg)?;
                Ok((msg.validator_address, msg.amount))
            }
        }
    }
}

impl Authorization for StakeAuthorization {
    fn msg_type_url(&self) -> String {
        match self.authorization_type {
            AuthorizationType::Delegate => MsgDelegate::TYPE_URL.to_string(),
            AuthorizationType::Undelegate => MsgUndelegate::TYPE_URL.to_string(),
        }
    }

    fn validate_basic(&self, api: &dyn Api) -> Result<(), CoreError> {
        if let Some(max) = &self.max_tokens {
            if max.amount.is_zero() {
                return Err(CoreError::InvalidCoins {
                    reason: "max tokens must be positive".to_string(),
                });
            }
        }
        let addresses = match &self.validators {
            Validators::AllowList { addresses } | Validators::DenyList { addresses } => addresses,
        };
        if addresses.is_empty() {
            return Err(CoreError::InvalidAddress {
                address: "validator list cannot be empty".to_string(),
            });
        }
        for address in addresses {
            validate_addr(api, address)?;
        }
        Ok(())
    }

    fn accept(&self, _deps: Deps, _env: &Env, msg: &AnyMsg) -> Result<AcceptResponse, CoreError> {
        let (validator, amount) = self.decode_target(msg)?;
        if !self.validator_allowed(&validator) {
            return Ok(AcceptResponse::rejected());
        }

        let Some(max) = &self.max_tokens else {
            return Ok(AcceptResponse::accepted());
        };
        if amount.denom != max.denom {
            return Err(CoreError::InvalidCoins {
                reason: format!("expected {} but got {}", max.denom, amount.denom),
            });
        }
        if amount.amount > max.amount {
            return Ok(AcceptResponse::rejected());
        }

        let remaining = max.amount - amount.amount;
        if remaining.is_zero() {
            return Ok(AcceptResponse::consumed());
        }
        let updated = StakeAuthorization {
            max_tokens: Some(Coin::new(remaining, max.denom.clone())),
            validators: self.validators.clone(),
            authorization_type: self.authorization_type.clone(),
        };
        Ok(AcceptResponse::updated(updated.to_any()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::testing::{mock_dependencies, mock_env};
    use cosmwasm_std::coin;

    fn delegate(delegator: &str, validator: &str, amount: u128) -> AnyMsg {
        MsgDelegate {
            delegator_address: delegator.to_string(),
            validator_address: validator.to_string(),
            amount: coin(amount, "stake"),
        }
        .to_any()
        .unwrap()
    }

    #[test]
    fn capped_delegation_decrements_the_cap() {
        let deps = mock_dependencies();
        let val = deps.api.addr_make("val").to_string();
        let granter = deps.api.addr_make("granter").to_string();
        let auth = StakeAuthorization {
            max_tokens: Some(coin(50, "stake")),
            validators: Validators::AllowList {
                addresses: vec![val.clone()],
            },
            authorization_type: AuthorizationType::Delegate,
        };
        assert_eq!(auth.msg_type_url(), MsgDelegate::TYPE_URL);
        auth.validate_basic(&deps.api).unwrap();

        let res = auth
            .accept(deps.as_ref(), &mock_env(), &delegate(&granter, &val, 20))
            .unwrap();
        let updated = StakeAuthorization::from_any(&res.updated.unwrap()).unwrap();
        assert_eq!(updated.max_tokens, Some(coin(30, "stake")));

        let res = updated
            .accept(deps.as_ref(), &mock_env(), &delegate(&granter, &val, 30))
            .unwrap();
        assert_eq!(res, AcceptResponse::consumed());

        let res = auth
            .accept(deps.as_ref(), &mock_env(), &delegate(&granter, &val, 51))
            .unwrap();
        assert!(!res.accept);
    }

    #[test]
    fn deny_list_blocks_listed_validators() {
        let deps = mock_dependencies();
        let bad = deps.api.addr_make("bad").to_string();
        let good = deps.api.addr_make("good").to_string();
        let auth = StakeAuthorization {
            max_tokens: None,
            validators: Validators::DenyList {
                addresses: vec![bad.clone()],
            },
            authorization_type: AuthorizationType::Delegate,
        };

        let res = auth
            .accept(deps.as_ref(), &mock_env(), &delegate("g", &bad, 1))
            .unwrap();
        assert!(!res.accept);
        let res = auth
            .accept(deps.as_ref(), &mock_env(), &delegate("g", &good, 1_000))
            .unwrap();
        assert_eq!(res, AcceptResponse::accepted());
    }

    #[test]
    fn undelegate_grants_govern_undelegate_messages() {
        let deps = mock_dependencies();
        let val = deps.api.addr_make("val").to_string();
        let auth = StakeAuthorization {
            max_tokens: None,
            validators: Validators::AllowList {
                addresses: vec![val.clone()],
            },
            authorization_type: AuthorizationType::Undelegate,
        };
        assert_eq!(auth.msg_type_url(), MsgUndelegate::TYPE_URL);
        let err = auth
            .accept(deps.as_ref(), &mock_env(), &delegate("g", &val, 1))
            .unwrap_err();
        assert!(matches!(err, CoreError::UnexpectedMsgType { .. }));
    }
}
