use civitas_core::keepers::AccountKeeper;
use civitas_core::router::response_events;
use civitas_core::store::with_branch;
use civitas_core::versions::set_module_version;
use civitas_core::{AnyMsg, Router};
use cosmwasm_std::{
    to_json_binary, Addr, Api, Binary, Deps, DepsMut, Env, Event, Order, Response, StdError,
    StdResult, Storage,
};
use cw_storage_plus::Bound;

use crate::error::ContractError;
use crate::module::AuthzModule;
use crate::msg::{
    ExecResponse, ExecuteMsg, GrantAuthorization, GrantsResponse, InstantiateMsg, MsgExec,
    MsgGrant, MsgRevoke, QueryMsg,
};
use crate::state::{
    delete_grant, grant_not_found, load_grant, save_grant, update_authorization, Grant, GRANTS,
    GRANT_QUEUE,
};

const CONTRACT_NAME: &str = "crates.io:civitas-authz";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

// ─── Instantiate ──────────────────────────────────────────────────────

pub fn instantiate(
    deps: DepsMut,
    env: Env,
    authz: &AuthzModule,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_module_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let mut loaded = 0u32;
    for entry in msg.grants {
        let granter = deps.api.addr_validate(&entry.granter)?;
        let grantee = deps.api.addr_validate(&entry.grantee)?;
        if granter == grantee {
            return Err(ContractError::GranteeIsGranter);
        }
        let grant = Grant {
            authorization: entry.authorization,
            expiration: entry.expiration,
        };
        if grant.is_expired(env.block.time) {
            continue;
        }
        let authorization = authz
            .registry
            .decode(&grant.authorization)
            .map_err(|err| ContractError::InvalidAuthorization {
                reason: err.to_string(),
            })?;
        authorization.validate_basic(deps.api)?;
        save_grant(
            deps.storage,
            &granter,
            &grantee,
            &authorization.msg_type_url(),
            &grant,
        )?;
        loaded += 1;
    }

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("module", "authz")
        .add_attribute("grants", loaded.to_string()))
}

// ─── Execute ──────────────────────────────────────────────────────────

pub fn execute(
    deps: DepsMut,
    env: &Env,
    authz: &AuthzModule,
    router: &Router,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::Grant(msg) => execute_grant(deps, env, authz, router, msg),
        ExecuteMsg::Revoke(msg) => execute_revoke(deps, msg),
        ExecuteMsg::Exec(msg) => execute_exec(deps, env, authz, router, msg),
    }
}

fn validate_pair(
    api: &dyn Api,
    granter: &str,
    grantee: &str,
) -> Result<(Addr, Addr), ContractError> {
    let granter = api.addr_validate(granter)?;
    let grantee = api.addr_validate(grantee)?;
    if granter == grantee {
        return Err(ContractError::GranteeIsGranter);
    }
    Ok((granter, grantee))
}

fn grant_event(ty: &str, granter: &Addr, grantee: &Addr, msg_type_url: &str) -> Event {
    Event::new(ty)
        .add_attribute("granter", granter)
        .add_attribute("grantee", grantee)
        .add_attribute("msg_type_url", msg_type_url)
}

// ─── Grant ────────────────────────────────────────────────────────────

/// Checks `grant` against the router and the block time, returning the type
/// url of the message it authorizes.
fn validate_grant(
    api: &dyn Api,
    env: &Env,
    authz: &AuthzModule,
    router: &Router,
    grant: &Grant,
) -> Result<String, ContractError> {
    let authorization = authz
        .registry
        .decode(&grant.authorization)
        .map_err(|err| ContractError::InvalidAuthorization {
            reason: err.to_string(),
        })?;
    authorization.validate_basic(api)?;

    let msg_type_url = authorization.msg_type_url();
    if router.handler(&msg_type_url).is_none() {
        return Err(ContractError::InvalidAuthorization {
            reason: format!("{msg_type_url} is not a routable message type"),
        });
    }

    if let Some(expiration) = grant.expiration {
        if expiration <= env.block.time {
            return Err(ContractError::InvalidExpiration {
                reason: format!(
                    "expiration {expiration} must be after block time {}",
                    env.block.time
                ),
            });
        }
    }
    Ok(msg_type_url)
}

fn ensure_account(
    store: &mut dyn Storage,
    accounts: &dyn AccountKeeper,
    addr: &Addr,
) -> StdResult<()> {
    if !accounts.has_account(store, addr)? {
        let account = accounts.new_account_with_address(store, addr)?;
        accounts.set_account(store, &account)?;
    }
    Ok(())
}

fn execute_grant(
    deps: DepsMut,
    env: &Env,
    authz: &AuthzModule,
    router: &Router,
    msg: MsgGrant,
) -> Result<Response, ContractError> {
    let (granter, grantee) = validate_pair(deps.api, &msg.granter, &msg.grantee)?;
    let msg_type_url = validate_grant(deps.api, env, authz, router, &msg.grant)?;

    ensure_account(deps.storage, authz.accounts.as_ref(), &grantee)?;
    save_grant(deps.storage, &granter, &grantee, &msg_type_url, &msg.grant)?;

    tracing::debug!(
        target: "authz",
        granter = %granter,
        grantee = %grantee,
        msg_type_url = msg_type_url.as_str(),
        "grant saved"
    );

    Ok(Response::new()
        .add_attribute("action", "grant")
        .add_event(grant_event("grant_created", &granter, &grantee, &msg_type_url)))
}

// ─── Revoke ───────────────────────────────────────────────────────────

fn execute_revoke(deps: DepsMut, msg: MsgRevoke) -> Result<Response, ContractError> {
    let (granter, grantee) = validate_pair(deps.api, &msg.granter, &msg.grantee)?;
    if msg.msg_type_url.is_empty() {
        return Err(ContractError::InvalidAuthorization {
            reason: "message type url must not be empty".to_string(),
        });
    }
    delete_grant(deps.storage, &granter, &grantee, &msg.msg_type_url)?;

    Ok(Response::new()
        .add_attribute("action", "revoke")
        .add_event(grant_event(
            "grant_revoked",
            &granter,
            &grantee,
            &msg.msg_type_url,
        )))
}

// ─── Exec ─────────────────────────────────────────────────────────────

/// Runs the grant `granter -> grantee` for `msg` through its authorization
/// and applies the resulting delete or update.
fn accept_grant(
    deps: DepsMut,
    env: &Env,
    authz: &AuthzModule,
    granter: &Addr,
    grantee: &Addr,
    msg: &AnyMsg,
) -> Result<(), ContractError> {
    let msg_type_url = msg.type_url.as_str();
    let grant = load_grant(deps.storage, granter, grantee, msg_type_url)?
        .filter(|grant| !grant.is_expired(env.block.time))
        .ok_or_else(|| ContractError::Unauthorized {
            reason: format!("no live grant from {granter} to {grantee} for {msg_type_url}"),
        })?;

    let authorization = authz.registry.decode(&grant.authorization)?;
    let res = authorization.accept(deps.as_ref(), env, msg)?;
    if !res.accept {
        return Err(ContractError::Unauthorized {
            reason: format!("authorization for {msg_type_url} rejected the message"),
        });
    }

    if res.delete {
        delete_grant(deps.storage, granter, grantee, msg_type_url)?;
    } else if let Some(updated) = res.updated {
        update_authorization(deps.storage, granter, grantee, msg_type_url, updated)?;
    }
    Ok(())
}

fn execute_exec(
    mut deps: DepsMut,
    env: &Env,
    authz: &AuthzModule,
    router: &Router,
    msg: MsgExec,
) -> Result<Response, ContractError> {
    let grantee = deps.api.addr_validate(&msg.grantee)?;
    if msg.msgs.is_empty() {
        return Err(ContractError::EmptyMsgs);
    }
    if msg.msgs.len() > authz.config.max_msgs_per_exec {
        return Err(ContractError::TooManyMsgs {
            max: authz.config.max_msgs_per_exec,
            got: msg.msgs.len(),
        });
    }

    let mut results = Vec::with_capacity(msg.msgs.len());
    let mut events = vec![];
    for (index, inner) in msg.msgs.iter().enumerate() {
        router.validate_basic(deps.api, inner)?;
        let signers = router.signers(deps.api, inner)?;
        let [granter] = signers.as_slice() else {
            return Err(ContractError::MultiSignerNotSupported {
                index,
                signers: signers.len(),
            });
        };

        let (data, inner_events) = with_branch(deps.branch(), |mut branch| {
            let mut out = vec![];
            if *granter != grantee {
                accept_grant(branch.branch(), env, authz, granter, &grantee, inner)?;
            }

            let res = router.dispatch(branch.branch(), env, inner)?;
            let data = res.data.clone().unwrap_or_default();
            let module = router.handler(&inner.type_url).map_or("unknown", |m| m.name());
            out.extend(response_events(module, res));

            if *granter != grantee {
                out.push(
                    grant_event("grant_used", granter, &grantee, &inner.type_url)
                        .add_attribute("msg_index", index.to_string()),
                );
            }
            Ok::<_, ContractError>((data, out))
        })?;

        results.push(data);
        events.extend(inner_events);
    }

    Ok(Response::new()
        .add_attribute("action", "exec")
        .add_attribute("grantee", grantee)
        .add_attribute("msgs", msg.msgs.len().to_string())
        .add_events(events)
        .set_data(to_json_binary(&ExecResponse { results })?))
}

// ─── End Block ────────────────────────────────────────────────────────

/// Deletes every grant whose expiration is at or before the block time.
pub fn end_block(deps: DepsMut, env: &Env) -> Result<Vec<Event>, ContractError> {
    let due = GRANT_QUEUE.due(deps.storage, env.block.time)?;
    for (at, (granter, grantee, msg_type_url)) in due {
        GRANTS.remove(deps.storage, (&granter, &grantee, msg_type_url.as_str()));
        tracing::debug!(
            target: "authz",
            granter = %granter,
            grantee = %grantee,
            msg_type_url = msg_type_url.as_str(),
            "expired grant pruned"
        );
        GRANT_QUEUE.remove(deps.storage, at, (granter, grantee, msg_type_url));
    }
    Ok(vec![])
}

// ─── Query ────────────────────────────────────────────────────────────

pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Grants {
            granter,
            grantee,
            msg_type_url,
            start_after,
            limit,
        } => query_grants(deps, granter, grantee, msg_type_url, start_after, limit),
        QueryMsg::GranterGrants {
            granter,
            start_after,
            limit,
        } => query_granter_grants(deps, granter, start_after, limit),
        QueryMsg::GranteeGrants {
            grantee,
            start_after,
            limit,
        } => query_grantee_grants(deps, grantee, start_after, limit),
    }
}

fn grant_authorization(
    granter: &Addr,
    grantee: &Addr,
    msg_type_url: String,
    grant: Grant,
) -> GrantAuthorization {
    GrantAuthorization {
        granter: granter.to_string(),
        grantee: grantee.to_string(),
        msg_type_url,
        authorization: grant.authorization,
        expiration: grant.expiration,
    }
}

fn query_grants(
    deps: Deps,
    granter: String,
    grantee: String,
    msg_type_url: Option<String>,
    start_after: Option<String>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let granter = deps.api.addr_validate(&granter)?;
    let grantee = deps.api.addr_validate(&grantee)?;

    if let Some(msg_type_url) = msg_type_url {
        let grant = load_grant(deps.storage, &granter, &grantee, &msg_type_url)?.ok_or_else(
            || StdError::generic_err(grant_not_found(&granter, &grantee, &msg_type_url).to_string()),
        )?;
        return to_json_binary(&GrantsResponse {
            grants: vec![grant_authorization(&granter, &grantee, msg_type_url, grant)],
        });
    }

    let limit = limit.unwrap_or(30).min(100) as usize;
    let grants = GRANTS
        .prefix((&granter, &grantee))
        .range(
            deps.storage,
            start_after.as_deref().map(Bound::exclusive),
            None,
            Order::Ascending,
        )
        .take(limit)
        .map(|item| {
            item.map(|(url, grant)| grant_authorization(&granter, &grantee, url, grant))
        })
        .collect::<StdResult<Vec<_>>>()?;
    to_json_binary(&GrantsResponse { grants })
}

fn query_granter_grants(
    deps: Deps,
    granter: String,
    start_after: Option<(String, String)>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let granter = deps.api.addr_validate(&granter)?;
    let limit = limit.unwrap_or(30).min(100) as usize;
    let start = start_after
        .map(|(grantee, url)| deps.api.addr_validate(&grantee).map(|grantee| (grantee, url)))
        .transpose()?;

    let grants = GRANTS
        .sub_prefix(&granter)
        .range(
            deps.storage,
            start
                .as_ref()
                .map(|(grantee, url)| Bound::exclusive((grantee, url.as_str()))),
            None,
            Order::Ascending,
        )
        .take(limit)
        .map(|item| {
            item.map(|((grantee, url), grant)| grant_authorization(&granter, &grantee, url, grant))
        })
        .collect::<StdResult<Vec<_>>>()?;
    to_json_binary(&GrantsResponse { grants })
}

/// Grants are keyed by granter first, so this walks the whole table.
fn query_grantee_grants(
    deps: Deps,
    grantee: String,
    start_after: Option<(String, String)>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let grantee = deps.api.addr_validate(&grantee)?;
    let limit = limit.unwrap_or(30).min(100) as usize;
    let start = start_after
        .map(|(granter, url)| deps.api.addr_validate(&granter).map(|granter| (granter, url)))
        .transpose()?;

    let grants = GRANTS
        .range(
            deps.storage,
            start
                .as_ref()
                .map(|(granter, url)| Bound::exclusive((granter, &grantee, url.as_str()))),
            None,
            Order::Ascending,
        )
        .filter(|item| match item {
            Ok(((_, holder, _), _)) => *holder == grantee,
            Err(_) => true,
        })
        .take(limit)
        .map(|item| {
            item.map(|((granter, _, url), grant)| grant_authorization(&granter, &grantee, url, grant))
        })
        .collect::<StdResult<Vec<_>>>()?;
    to_json_binary(&GrantsResponse { grants })
}
