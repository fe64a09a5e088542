use std::collections::BTreeSet;

use civitas_core::authz::{AcceptResponse, Authorization};
use civitas_core::coins::{is_all_gte, normalize, sub_coins, validate_coins};
use civitas_core::msg::validate_addr;
use civitas_core::{AnyMsg, CoreError, TypeUrl};
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Api, Coin, Deps, Env};

use crate::msg::MsgSend;

/// Lets the grantee send up to `spend_limit` from the granter, optionally
/// only to the addresses in `allow_list`.
#[cw_serde]
pub struct SendAuthorization {
    pub spend_limit: Vec<Coin>,
    #[serde(default)]
    pub allow_list: Vec<String>,
}

impl SendAuthorization {
    pub fn new(spend_limit: Vec<Coin>) -> Self {
        Self {
            spend_limit,
            allow_list: vec![],
        }
    }
}

impl TypeUrl for SendAuthorization {
    const TYPE_URL: &'static str = "/cosmos.bank.v1beta1.SendAuthorization";
}

impl Authorization for SendAuthorization {
    fn msg_type_url(&self) -> String {
        MsgSend::TYPE_URL.to_string()
    }

    fn validate_basic(&self, api: &dyn Api) -> Result<(), CoreError> {
        if self.spend_limit.is_empty() {
            return Err(CoreError::InvalidCoins {
                reason: "spend limit cannot be empty".to_string(),
            });
        }
        validate_coins(&self.spend_limit)?;

        let mut seen = BTreeSet::new();
        for address in &self.allow_list {
            validate_addr(api, address)?;
            if !seen.insert(address.as_str()) {
                return Err(CoreError::InvalidAddress {
                    address: format!("{address} is listed twice"),
                });
            }
        }
        Ok(())
    }

    fn accept(&self, _deps: Deps, _env: &Env, msg: &AnyMsg) -> Result<AcceptResponse, CoreError> {
        let send = MsgSend::from_any(msg)?;

        if !self.allow_list.is_empty() && !self.allow_list.contains(&send.to_address) {
            return Ok(AcceptResponse::rejected());
        }
        let amount = normalize(&send.amount)?;
        if !is_all_gte(&self.spend_limit, &amount) {
            return Ok(AcceptResponse::rejected());
        }

        let remaining = sub_coins(&self.spend_limit, &amount)?;
        if remaining.is_empty() {
            return Ok(AcceptResponse::consumed());
        }
        let updated = SendAuthorization {
            spend_limit: remaining,
            allow_list: self.allow_list.clone(),
        };
        Ok(AcceptResponse::updated(updated.to_any()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::coin;
    use cosmwasm_std::testing::{mock_dependencies, mock_env, MockApi, MockQuerier};
    use cosmwasm_std::{MemoryStorage, OwnedDeps};

    type TestDeps = OwnedDeps<MemoryStorage, MockApi, MockQuerier>;

    fn send(deps: &TestDeps, to: &str, amount: u128) -> AnyMsg {
        MsgSend {
            from_address: deps.api.addr_make("granter").to_string(),
            to_address: deps.api.addr_make(to).to_string(),
            amount: vec![coin(amount, "stake")],
        }
        .to_any()
        .unwrap()
    }

    #[test]
    fn partial_spend_shrinks_the_limit() {
        let deps = mock_dependencies();
        let auth = SendAuthorization::new(vec![coin(100, "stake")]);

        let res = auth
            .accept(deps.as_ref(), &mock_env(), &send(&deps, "carol", 30))
            .unwrap();
        assert!(res.accept);
        assert!(!res.delete);
        let updated = SendAuthorization::from_any(&res.updated.unwrap()).unwrap();
        assert_eq!(updated.spend_limit, vec![coin(70, "stake")]);
    }

    #[test]
    fn exact_spend_consumes_the_grant() {
        let deps = mock_dependencies();
        let auth = SendAuthorization::new(vec![coin(70, "stake")]);
        let res = auth
            .accept(deps.as_ref(), &mock_env(), &send(&deps, "carol", 70))
            .unwrap();
        assert_eq!(res, AcceptResponse::consumed());
    }

    #[test]
    fn overspend_and_unlisted_recipients_are_rejected() {
        let deps = mock_dependencies();
        let auth = SendAuthorization::new(vec![coin(10, "stake")]);
        let res = auth
            .accept(deps.as_ref(), &mock_env(), &send(&deps, "carol", 11))
            .unwrap();
        assert!(!res.accept);

        let auth = SendAuthorization {
            spend_limit: vec![coin(10, "stake")],
            allow_list: vec![deps.api.addr_make("dave").to_string()],
        };
        let res = auth
            .accept(deps.as_ref(), &mock_env(), &send(&deps, "carol", 1))
            .unwrap();
        assert!(!res.accept);
        let res = auth
            .accept(deps.as_ref(), &mock_env(), &send(&deps, "dave", 1))
            .unwrap();
        assert!(res.accept);
    }

    #[test]
    fn validate_basic_checks_limit_and_list() {
        let deps = mock_dependencies();
        assert!(SendAuthorization::new(vec![]).validate_basic(&deps.api).is_err());
        assert!(SendAuthorization::new(vec![coin(1, "stake")])
            .validate_basic(&deps.api)
            .is_ok());

        let dave = deps.api.addr_make("dave").to_string();
        let dup = SendAuthorization {
            spend_limit: vec![coin(1, "stake")],
            allow_list: vec![dave.clone(), dave],
        };
        assert!(dup.validate_basic(&deps.api).is_err());
    }
}
