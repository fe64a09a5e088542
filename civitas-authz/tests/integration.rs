use cosmwasm_schema::cw_serde;
use cosmwasm_std::testing::{mock_dependencies, mock_env, MockApi, MockQuerier};
use cosmwasm_std::{
    coin, coins, from_json, Addr, Api, DepsMut, Env, MemoryStorage, OwnedDeps, Response,
    Timestamp, Uint128,
};

use civitas_bank::msg::MsgSend;
use civitas_bank::{BankModule, BaseKeeper, SendAuthorization};
use civitas_core::accounts::BaseAccountKeeper;
use civitas_core::authz::AuthorizationRegistry;
use civitas_core::keepers::{AccountKeeper, BankKeeper};
use civitas_core::{AnyMsg, CoreError, Module, Router, TypeUrl};
use civitas_authz::contract::{end_block, execute, instantiate, query};
use civitas_authz::error::ContractError;
use civitas_authz::msg::*;
use civitas_authz::state::{Grant, GRANT_QUEUE};
use civitas_authz::{AuthzConfig, AuthzModule, CountAuthorization, GenericAuthorization};
use civitas_staking::authorization::{AuthorizationType, StakeAuthorization, Validators};
use civitas_staking::msg::{GenesisValidator, InstantiateMsg as StakingInit, MsgDelegate};
use civitas_staking::StakingModule;

type TestDeps = OwnedDeps<MemoryStorage, MockApi, MockQuerier>;

// ─── A two-signer message for signer checks ───────────────────────────

#[cw_serde]
struct MsgJoint {
    first: String,
    second: String,
}

impl TypeUrl for MsgJoint {
    const TYPE_URL: &'static str = "/test.MsgJoint";
}

struct JointModule;

impl Module for JointModule {
    fn name(&self) -> &'static str {
        "joint"
    }

    fn msg_type_urls(&self) -> Vec<&'static str> {
        vec![MsgJoint::TYPE_URL]
    }

    fn signers(&self, msg: &AnyMsg) -> Result<Vec<String>, CoreError> {
        let msg = MsgJoint::from_any(msg)?;
        Ok(vec![msg.first, msg.second])
    }

    fn validate_basic(&self, _api: &dyn Api, _msg: &AnyMsg) -> Result<(), CoreError> {
        Ok(())
    }

    fn execute(
        &self,
        _deps: DepsMut,
        _env: &Env,
        _router: &Router,
        _msg: &AnyMsg,
    ) -> Result<Response, CoreError> {
        Ok(Response::new())
    }
}

// ─── Fixture ──────────────────────────────────────────────────────────

struct Fixture {
    router: Router,
    pool: Addr,
    val: Addr,
    granter: Addr,
    grantee: Addr,
    carol: Addr,
}

impl Fixture {
    fn authz(&self) -> AuthzModule {
        authz_module(AuthzConfig::default())
    }
}

fn authz_module(config: AuthzConfig) -> AuthzModule {
    let mut registry = AuthorizationRegistry::new();
    registry.register::<SendAuthorization>().unwrap();
    registry.register::<StakeAuthorization>().unwrap();
    AuthzModule::new(config, registry, Box::new(BaseAccountKeeper)).unwrap()
}

fn setup(deps: &mut TestDeps) -> Fixture {
    let authority = deps.api.addr_make("authority");
    let pool = deps.api.addr_make("bonded_pool");
    let val = deps.api.addr_make("val");
    let granter = deps.api.addr_make("granter");
    let grantee = deps.api.addr_make("grantee");
    let carol = deps.api.addr_make("carol");

    let staking = StakingModule::new(Box::new(BaseKeeper), pool.clone());
    civitas_staking::contract::instantiate(
        deps.as_mut(),
        mock_env(),
        &staking,
        StakingInit {
            bond_denom: "stake".to_string(),
            validators: vec![GenesisValidator {
                operator: val.to_string(),
                self_delegation: Uint128::new(500),
                bonded: true,
            }],
            delegations: vec![],
        },
    )
    .unwrap();
    BaseKeeper
        .mint_coins(&mut deps.storage, &granter, &coins(1_000, "stake"))
        .unwrap();

    let authz = authz_module(AuthzConfig::default());
    instantiate(deps.as_mut(), mock_env(), &authz, InstantiateMsg::default()).unwrap();

    let router = Router::new()
        .with(Box::new(BankModule::new(authority)))
        .unwrap()
        .with(Box::new(staking))
        .unwrap()
        .with(Box::new(JointModule))
        .unwrap()
        .with(Box::new(authz))
        .unwrap();

    Fixture {
        router,
        pool,
        val,
        granter,
        grantee,
        carol,
    }
}

fn at(secs: u64) -> Env {
    let mut env = mock_env();
    env.block.time = env.block.time.plus_seconds(secs);
    env
}

fn balance(deps: &TestDeps, addr: &Addr) -> u128 {
    BaseKeeper.balance(&deps.storage, addr, "stake").unwrap().u128()
}

fn grant(
    deps: &mut TestDeps,
    f: &Fixture,
    env: &Env,
    authorization: AnyMsg,
    expiration: Option<Timestamp>,
) -> Result<Response, ContractError> {
    execute(
        deps.as_mut(),
        env,
        &f.authz(),
        &f.router,
        ExecuteMsg::Grant(MsgGrant {
            granter: f.granter.to_string(),
            grantee: f.grantee.to_string(),
            grant: Grant {
                authorization,
                expiration,
            },
        }),
    )
}

fn exec(
    deps: &mut TestDeps,
    f: &Fixture,
    env: &Env,
    msgs: Vec<AnyMsg>,
) -> Result<Response, ContractError> {
    execute(
        deps.as_mut(),
        env,
        &f.authz(),
        &f.router,
        ExecuteMsg::Exec(MsgExec {
            grantee: f.grantee.to_string(),
            msgs,
        }),
    )
}

fn send_from(from: &Addr, to: &Addr, amount: u128) -> AnyMsg {
    MsgSend {
        from_address: from.to_string(),
        to_address: to.to_string(),
        amount: coins(amount, "stake"),
    }
    .to_any()
    .unwrap()
}

fn send_limit(amount: u128) -> AnyMsg {
    SendAuthorization::new(coins(amount, "stake")).to_any().unwrap()
}

fn grants(deps: &TestDeps, f: &Fixture) -> Vec<GrantAuthorization> {
    let res: GrantsResponse = from_json(
        query(
            deps.as_ref(),
            mock_env(),
            QueryMsg::Grants {
                granter: f.granter.to_string(),
                grantee: f.grantee.to_string(),
                msg_type_url: None,
                start_after: None,
                limit: None,
            },
        )
        .unwrap(),
    )
    .unwrap();
    res.grants
}

// ─── Grant / Revoke ───────────────────────────────────────────────────

#[test]
fn grant_is_stored_and_creates_grantee_account() {
    let mut deps = mock_dependencies();
    let f = setup(&mut deps);
    let env = mock_env();
    assert!(!BaseAccountKeeper.has_account(&deps.storage, &f.grantee).unwrap());

    let res = grant(&mut deps, &f, &env, send_limit(100), None).unwrap();
    assert!(res.events.iter().any(|e| e.ty == "grant_created"
        && e.attributes
            .iter()
            .any(|a| a.key == "msg_type_url" && a.value == MsgSend::TYPE_URL)));

    assert!(BaseAccountKeeper.has_account(&deps.storage, &f.grantee).unwrap());
    let stored = grants(&deps, &f);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].authorization, send_limit(100));
    assert_eq!(stored[0].expiration, None);
}

#[test]
fn invalid_grants_are_rejected() {
    let mut deps = mock_dependencies();
    let f = setup(&mut deps);
    let env = mock_env();

    let err = execute(
        deps.as_mut(),
        &env,
        &f.authz(),
        &f.router,
        ExecuteMsg::Grant(MsgGrant {
            granter: f.granter.to_string(),
            grantee: f.granter.to_string(),
            grant: Grant {
                authorization: send_limit(100),
                expiration: None,
            },
        }),
    )
    .unwrap_err();
    assert_eq!(err, ContractError::GranteeIsGranter);

    let unroutable = GenericAuthorization::new("/test.MsgNowhere").to_any().unwrap();
    let err = grant(&mut deps, &f, &env, unroutable, None).unwrap_err();
    assert!(matches!(err, ContractError::InvalidAuthorization { .. }));

    let unknown = AnyMsg::new("/test.Unknown", Default::default());
    let err = grant(&mut deps, &f, &env, unknown, None).unwrap_err();
    assert!(matches!(err, ContractError::InvalidAuthorization { .. }));

    let err = grant(&mut deps, &f, &env, send_limit(100), Some(env.block.time)).unwrap_err();
    assert!(matches!(err, ContractError::InvalidExpiration { .. }));

    assert!(grants(&deps, &f).is_empty());
}

#[test]
fn regrant_replaces_authorization_and_expiry() {
    let mut deps = mock_dependencies();
    let f = setup(&mut deps);
    let env = mock_env();

    grant(&mut deps, &f, &env, send_limit(100), Some(env.block.time.plus_seconds(50))).unwrap();
    grant(&mut deps, &f, &env, send_limit(300), Some(env.block.time.plus_seconds(90))).unwrap();

    let stored = grants(&deps, &f);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].authorization, send_limit(300));
    let queue = GRANT_QUEUE.entries(&deps.storage).unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].0, env.block.time.plus_seconds(90));
}

#[test]
fn revoke_removes_grant_once() {
    let mut deps = mock_dependencies();
    let f = setup(&mut deps);
    let env = mock_env();
    grant(&mut deps, &f, &env, send_limit(100), Some(env.block.time.plus_seconds(50))).unwrap();

    let revoke = || {
        ExecuteMsg::Revoke(MsgRevoke {
            granter: f.granter.to_string(),
            grantee: f.grantee.to_string(),
            msg_type_url: MsgSend::TYPE_URL.to_string(),
        })
    };
    let res = execute(deps.as_mut(), &env, &f.authz(), &f.router, revoke()).unwrap();
    assert!(res.events.iter().any(|e| e.ty == "grant_revoked"));
    assert!(grants(&deps, &f).is_empty());
    assert!(GRANT_QUEUE.entries(&deps.storage).unwrap().is_empty());

    let err = execute(deps.as_mut(), &env, &f.authz(), &f.router, revoke()).unwrap_err();
    assert!(matches!(err, ContractError::GrantNotFound { .. }));
}

// ─── Exec ─────────────────────────────────────────────────────────────

#[test]
fn exec_spends_down_send_authorization() {
    let mut deps = mock_dependencies();
    let f = setup(&mut deps);
    let env = mock_env();
    grant(&mut deps, &f, &env, send_limit(100), None).unwrap();

    let res = exec(&mut deps, &f, &env, vec![send_from(&f.granter, &f.carol, 30)]).unwrap();
    assert_eq!(balance(&deps, &f.granter), 970);
    assert_eq!(balance(&deps, &f.carol), 30);
    assert_eq!(grants(&deps, &f)[0].authorization, send_limit(70));

    let used = res.events.iter().find(|e| e.ty == "grant_used").unwrap();
    assert!(used
        .attributes
        .iter()
        .any(|a| a.key == "granter" && a.value == f.granter.as_str()));
    assert!(used
        .attributes
        .iter()
        .any(|a| a.key == "msg_index" && a.value == "0"));
    let data: ExecResponse = from_json(res.data.unwrap()).unwrap();
    assert_eq!(data.results.len(), 1);

    exec(&mut deps, &f, &env, vec![send_from(&f.granter, &f.carol, 70)]).unwrap();
    assert_eq!(balance(&deps, &f.carol), 100);
    assert!(grants(&deps, &f).is_empty());
}

#[test]
fn exec_over_limit_is_unauthorized() {
    let mut deps = mock_dependencies();
    let f = setup(&mut deps);
    let env = mock_env();
    grant(&mut deps, &f, &env, send_limit(100), None).unwrap();

    let err = exec(&mut deps, &f, &env, vec![send_from(&f.granter, &f.carol, 101)]).unwrap_err();
    assert!(matches!(err, ContractError::Unauthorized { .. }));
    assert_eq!(balance(&deps, &f.granter), 1_000);
    assert_eq!(grants(&deps, &f)[0].authorization, send_limit(100));
}

#[test]
fn exec_without_grant_is_unauthorized_but_own_messages_pass() {
    let mut deps = mock_dependencies();
    let f = setup(&mut deps);
    let env = mock_env();

    let err = exec(&mut deps, &f, &env, vec![send_from(&f.granter, &f.carol, 10)]).unwrap_err();
    assert!(matches!(err, ContractError::Unauthorized { .. }));

    BaseKeeper
        .mint_coins(&mut deps.storage, &f.grantee, &coins(50, "stake"))
        .unwrap();
    let res = exec(&mut deps, &f, &env, vec![send_from(&f.grantee, &f.carol, 10)]).unwrap();
    assert_eq!(balance(&deps, &f.carol), 10);
    assert!(!res.events.iter().any(|e| e.ty == "grant_used"));
}

#[test]
fn failed_handler_rolls_back_grant_mutation() {
    let mut deps = mock_dependencies();
    let f = setup(&mut deps);
    let env = mock_env();
    let count = CountAuthorization {
        msg: MsgSend::TYPE_URL.to_string(),
        count: 2,
    }
    .to_any()
    .unwrap();
    grant(&mut deps, &f, &env, count.clone(), None).unwrap();

    // more than the granter holds
    let err = exec(&mut deps, &f, &env, vec![send_from(&f.granter, &f.carol, 5_000)]).unwrap_err();
    assert!(matches!(
        err,
        ContractError::Core(CoreError::InsufficientFunds { .. })
    ));
    assert_eq!(grants(&deps, &f)[0].authorization, count);

    exec(&mut deps, &f, &env, vec![send_from(&f.granter, &f.carol, 5)]).unwrap();
    exec(&mut deps, &f, &env, vec![send_from(&f.granter, &f.carol, 5)]).unwrap();
    assert!(grants(&deps, &f).is_empty());
    assert_eq!(balance(&deps, &f.carol), 10);
}

#[test]
fn exec_delegates_through_stake_authorization() {
    let mut deps = mock_dependencies();
    let f = setup(&mut deps);
    let env = mock_env();
    let auth = StakeAuthorization {
        max_tokens: Some(coin(200, "stake")),
        validators: Validators::AllowList {
            addresses: vec![f.val.to_string()],
        },
        authorization_type: AuthorizationType::Delegate,
    };
    grant(&mut deps, &f, &env, auth.to_any().unwrap(), None).unwrap();

    let delegate = MsgDelegate {
        delegator_address: f.granter.to_string(),
        validator_address: f.val.to_string(),
        amount: coin(150, "stake"),
    }
    .to_any()
    .unwrap();
    exec(&mut deps, &f, &env, vec![delegate]).unwrap();

    assert_eq!(balance(&deps, &f.pool), 650);
    assert_eq!(balance(&deps, &f.granter), 850);
    let remaining = StakeAuthorization {
        max_tokens: Some(coin(50, "stake")),
        ..auth
    };
    let res: GrantsResponse = from_json(
        query(
            deps.as_ref(),
            mock_env(),
            QueryMsg::Grants {
                granter: f.granter.to_string(),
                grantee: f.grantee.to_string(),
                msg_type_url: Some(MsgDelegate::TYPE_URL.to_string()),
                start_after: None,
                limit: None,
            },
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(res.grants[0].authorization, remaining.to_any().unwrap());
}

#[test]
fn exec_message_count_and_signers_are_checked() {
    let mut deps = mock_dependencies();
    let f = setup(&mut deps);
    let env = mock_env();

    let err = exec(&mut deps, &f, &env, vec![]).unwrap_err();
    assert_eq!(err, ContractError::EmptyMsgs);

    let tight = authz_module(AuthzConfig {
        max_msgs_per_exec: 1,
    });
    let err = execute(
        deps.as_mut(),
        &env,
        &tight,
        &f.router,
        ExecuteMsg::Exec(MsgExec {
            grantee: f.grantee.to_string(),
            msgs: vec![
                send_from(&f.grantee, &f.carol, 1),
                send_from(&f.grantee, &f.carol, 1),
            ],
        }),
    )
    .unwrap_err();
    assert_eq!(err, ContractError::TooManyMsgs { max: 1, got: 2 });

    let joint = MsgJoint {
        first: f.granter.to_string(),
        second: f.grantee.to_string(),
    }
    .to_any()
    .unwrap();
    let err = exec(&mut deps, &f, &env, vec![joint]).unwrap_err();
    assert_eq!(
        err,
        ContractError::MultiSignerNotSupported {
            index: 0,
            signers: 2
        }
    );
}

// ─── Expiry ───────────────────────────────────────────────────────────

#[test]
fn expired_grants_are_pruned_at_end_block() {
    let mut deps = mock_dependencies();
    let f = setup(&mut deps);
    let env = mock_env();
    grant(&mut deps, &f, &env, send_limit(100), Some(at(50).block.time)).unwrap();

    end_block(deps.as_mut(), &at(49)).unwrap();
    assert_eq!(grants(&deps, &f).len(), 1);

    end_block(deps.as_mut(), &at(50)).unwrap();
    assert!(grants(&deps, &f).is_empty());
    assert!(GRANT_QUEUE.entries(&deps.storage).unwrap().is_empty());

    let err = exec(&mut deps, &f, &at(51), vec![send_from(&f.granter, &f.carol, 10)]).unwrap_err();
    assert!(matches!(err, ContractError::Unauthorized { .. }));
}

#[test]
fn expired_grant_is_dead_before_the_sweep() {
    let mut deps = mock_dependencies();
    let f = setup(&mut deps);
    let env = mock_env();
    grant(&mut deps, &f, &env, send_limit(100), Some(at(50).block.time)).unwrap();

    let err = exec(&mut deps, &f, &at(50), vec![send_from(&f.granter, &f.carol, 10)]).unwrap_err();
    assert!(matches!(err, ContractError::Unauthorized { .. }));
    exec(&mut deps, &f, &at(49), vec![send_from(&f.granter, &f.carol, 10)]).unwrap();
}

#[test]
fn genesis_skips_expired_grants() {
    let mut deps = mock_dependencies();
    let granter = deps.api.addr_make("granter");
    let grantee = deps.api.addr_make("grantee");
    let env = at(100);

    let entry = |expiration: Option<Timestamp>, msg: &str| GenesisGrant {
        granter: granter.to_string(),
        grantee: grantee.to_string(),
        authorization: GenericAuthorization::new(msg).to_any().unwrap(),
        expiration,
    };
    let res = instantiate(
        deps.as_mut(),
        env.clone(),
        &authz_module(AuthzConfig::default()),
        InstantiateMsg {
            grants: vec![
                entry(Some(at(100).block.time), "/test.MsgA"),
                entry(Some(at(150).block.time), "/test.MsgB"),
                entry(None, "/test.MsgC"),
            ],
        },
    )
    .unwrap();
    assert!(res
        .attributes
        .iter()
        .any(|a| a.key == "grants" && a.value == "2"));
    assert_eq!(GRANT_QUEUE.entries(&deps.storage).unwrap().len(), 1);
}

// ─── Queries ──────────────────────────────────────────────────────────

#[test]
fn grants_are_listed_by_granter_and_grantee() {
    let mut deps = mock_dependencies();
    let f = setup(&mut deps);
    let env = mock_env();
    grant(&mut deps, &f, &env, send_limit(100), None).unwrap();
    let delegate_any = GenericAuthorization::new(MsgDelegate::TYPE_URL).to_any().unwrap();
    grant(&mut deps, &f, &env, delegate_any, None).unwrap();
    execute(
        deps.as_mut(),
        &env,
        &f.authz(),
        &f.router,
        ExecuteMsg::Grant(MsgGrant {
            granter: f.carol.to_string(),
            grantee: f.grantee.to_string(),
            grant: Grant {
                authorization: send_limit(5),
                expiration: None,
            },
        }),
    )
    .unwrap();

    let by_granter: GrantsResponse = from_json(
        query(
            deps.as_ref(),
            mock_env(),
            QueryMsg::GranterGrants {
                granter: f.granter.to_string(),
                start_after: None,
                limit: None,
            },
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(by_granter.grants.len(), 2);

    let by_grantee: GrantsResponse = from_json(
        query(
            deps.as_ref(),
            mock_env(),
            QueryMsg::GranteeGrants {
                grantee: f.grantee.to_string(),
                start_after: None,
                limit: None,
            },
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(by_grantee.grants.len(), 3);

    let first = &by_grantee.grants[0];
    let rest: GrantsResponse = from_json(
        query(
            deps.as_ref(),
            mock_env(),
            QueryMsg::GranteeGrants {
                grantee: f.grantee.to_string(),
                start_after: Some((
                    first.granter.clone(),
                    first.msg_type_url.clone(),
                )),
                limit: Some(10),
            },
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(rest.grants.len(), 2);

    let err = query(
        deps.as_ref(),
        mock_env(),
        QueryMsg::Grants {
            granter: f.granter.to_string(),
            grantee: f.grantee.to_string(),
            msg_type_url: Some("/test.MsgNone".to_string()),
            start_after: None,
            limit: None,
        },
    )
    .unwrap_err();
    assert!(err.to_string().contains("no grant"));
}
