use civitas_core::queue::TimeQueue;
use civitas_core::AnyMsg;
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, StdResult, Storage, Timestamp};
use cw_storage_plus::Map;

use crate::error::ContractError;

#[cw_serde]
pub struct Grant {
    pub authorization: AnyMsg,
    /// No expiry when `None`.
    pub expiration: Option<Timestamp>,
}

impl Grant {
    /// A grant is dead from its expiration instant onwards.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expiration.is_some_and(|exp| exp <= now)
    }
}

/// (granter, grantee, msg_type_url)
pub type GrantKey = (Addr, Addr, String);

pub const GRANTS: Map<(&Addr, &Addr, &str), Grant> = Map::new("\u{10}");
pub const GRANT_QUEUE: TimeQueue<GrantKey> = TimeQueue::new("\u{11}");

fn queue_key(granter: &Addr, grantee: &Addr, msg_type_url: &str) -> GrantKey {
    (granter.clone(), grantee.clone(), msg_type_url.to_string())
}

pub fn load_grant(
    store: &dyn Storage,
    granter: &Addr,
    grantee: &Addr,
    msg_type_url: &str,
) -> StdResult<Option<Grant>> {
    GRANTS.may_load(store, (granter, grantee, msg_type_url))
}

/// Writes `grant`, moving its expiry queue entry if one existed.
pub fn save_grant(
    store: &mut dyn Storage,
    granter: &Addr,
    grantee: &Addr,
    msg_type_url: &str,
    grant: &Grant,
) -> StdResult<()> {
    if let Some(old) = load_grant(store, granter, grantee, msg_type_url)? {
        if let Some(exp) = old.expiration {
            GRANT_QUEUE.remove(store, exp, queue_key(granter, grantee, msg_type_url));
        }
    }
    GRANTS.save(store, (granter, grantee, msg_type_url), grant)?;
    if let Some(exp) = grant.expiration {
        GRANT_QUEUE.insert(store, exp, queue_key(granter, grantee, msg_type_url))?;
    }
    Ok(())
}

/// Replaces the authorization of an existing grant, keeping its expiration.
pub fn update_authorization(
    store: &mut dyn Storage,
    granter: &Addr,
    grantee: &Addr,
    msg_type_url: &str,
    authorization: AnyMsg,
) -> Result<(), ContractError> {
    let mut grant = load_grant(store, granter, grantee, msg_type_url)?.ok_or_else(|| {
        grant_not_found(granter, grantee, msg_type_url)
    })?;
    grant.authorization = authorization;
    GRANTS.save(store, (granter, grantee, msg_type_url), &grant)?;
    Ok(())
}

pub fn delete_grant(
    store: &mut dyn Storage,
    granter: &Addr,
    grantee: &Addr,
    msg_type_url: &str,
) -> Result<Grant, ContractError> {
    let grant = load_grant(store, granter, grantee, msg_type_url)?.ok_or_else(|| {
        grant_not_found(granter, grantee, msg_type_url)
    })?;
    if let Some(exp) = grant.expiration {
        GRANT_QUEUE.remove(store, exp, queue_key(granter, grantee, msg_type_url));
    }
    GRANTS.remove(store, (granter, grantee, msg_type_url));
    Ok(grant)
}

pub fn grant_not_found(granter: &Addr, grantee: &Addr, msg_type_url: &str) -> ContractError {
    ContractError::GrantNotFound {
        granter: granter.to_string(),
        grantee: grantee.to_string(),
        msg_type_url: msg_type_url.to_string(),
    }
}
