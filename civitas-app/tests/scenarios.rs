use cosmwasm_std::testing::{mock_dependencies, mock_env, MockApi, MockQuerier};
use cosmwasm_std::{coins, from_json, Addr, Decimal, MemoryStorage, Timestamp, Uint128};

use civitas_app::{App, AppConfig, AppError, BlockEvents, DeliverResult, Genesis};
use civitas_authz::msg::{GrantsResponse, MsgExec, MsgGrant, QueryMsg as AuthzQuery};
use civitas_authz::state::{Grant, GRANT_QUEUE};
use civitas_bank::msg::{
    Balance, BalanceResponse, InstantiateMsg as BankInit, MsgSend, QueryMsg as BankQuery,
};
use civitas_bank::SendAuthorization;
use civitas_core::{AnyMsg, TypeUrl};
use civitas_gov::msg::{
    InstantiateMsg as GovInit, MsgSubmitProposal, MsgVote, ProposalResponse,
    QueryMsg as GovQuery, SubmitProposalResponse,
};
use civitas_gov::params::Params;
use civitas_gov::state::{Proposal, ProposalStatus, TallyResult, VoteOption};
use civitas_staking::msg::{GenesisValidator, InstantiateMsg as StakingInit};
use cw_multi_test::IntoAddr;

type TestApp = App<MemoryStorage, MockApi, MockQuerier>;

struct Accounts {
    authority: Addr,
    escrow: Addr,
    val1: Addr,
    val2: Addr,
    alice: Addr,
    granter: Addr,
    grantee: Addr,
    carol: Addr,
}

fn scenario_params() -> Params {
    Params {
        min_deposit: coins(100, "stake"),
        max_deposit_period: 100,
        voting_period: 100,
        quorum: Decimal::percent(50),
        threshold: Decimal::percent(50),
        veto_threshold: Decimal::permille(334),
        expedited_voting_period: 50,
        expedited_min_deposit: coins(200, "stake"),
        ..Params::default()
    }
}

/// Two bonded validators splitting 1000 stake as `val1_power` / the rest.
fn setup(val1_power: u128) -> (TestApp, Accounts) {
    let deps = mock_dependencies();
    let a = Accounts {
        authority: "gov_authority".into_addr(),
        escrow: "gov_escrow".into_addr(),
        val1: "val1".into_addr(),
        val2: "val2".into_addr(),
        alice: "alice".into_addr(),
        granter: "granter".into_addr(),
        grantee: "grantee".into_addr(),
        carol: "carol".into_addr(),
    };
    let pool = "bonded_pool".into_addr();

    let genesis = Genesis {
        bank: BankInit {
            balances: vec![
                Balance {
                    address: a.alice.to_string(),
                    coins: coins(1_000, "stake"),
                },
                Balance {
                    address: a.granter.to_string(),
                    coins: coins(1_000, "stake"),
                },
                Balance {
                    address: a.authority.to_string(),
                    coins: coins(500, "stake"),
                },
            ],
            send_enabled: vec![],
        },
        staking: StakingInit {
            bond_denom: "stake".to_string(),
            validators: vec![
                GenesisValidator {
                    operator: a.val1.to_string(),
                    self_delegation: Uint128::new(val1_power),
                    bonded: true,
                },
                GenesisValidator {
                    operator: a.val2.to_string(),
                    self_delegation: Uint128::new(1_000 - val1_power),
                    bonded: true,
                },
            ],
            delegations: vec![],
        },
        gov: GovInit {
            params: scenario_params(),
            starting_proposal_id: None,
        },
        authz: Default::default(),
    };

    let config = AppConfig::new(a.authority.clone(), a.escrow.clone(), pool);
    let app = App::new(deps, config, genesis, mock_env()).unwrap();
    (app, a)
}

fn t(secs: u64) -> Timestamp {
    mock_env().block.time.plus_seconds(secs)
}

fn block(app: &mut TestApp, secs: u64, msgs: &[AnyMsg]) -> (Vec<DeliverResult>, BlockEvents) {
    app.run_block(t(secs), msgs).unwrap()
}

fn balance(app: &TestApp, addr: &Addr) -> u128 {
    let res: BalanceResponse = from_json(
        app.query_bank(BankQuery::Balance {
            address: addr.to_string(),
            denom: "stake".to_string(),
        })
        .unwrap(),
    )
    .unwrap();
    res.amount.amount.u128()
}

fn proposal(app: &TestApp, id: u64) -> Proposal {
    let res: ProposalResponse =
        from_json(app.query_gov(GovQuery::Proposal { proposal_id: id }).unwrap()).unwrap();
    res.proposal
}

fn submit(proposer: &Addr, messages: Vec<AnyMsg>) -> AnyMsg {
    MsgSubmitProposal {
        messages,
        initial_deposit: coins(100, "stake"),
        proposer: proposer.to_string(),
        metadata: String::new(),
        title: "Signal".to_string(),
        summary: "Scenario proposal".to_string(),
        expedited: false,
    }
    .to_any()
    .unwrap()
}

fn vote(voter: &Addr, id: u64, option: VoteOption) -> AnyMsg {
    MsgVote {
        proposal_id: id,
        voter: voter.to_string(),
        option,
        metadata: String::new(),
    }
    .to_any()
    .unwrap()
}

fn send(from: &Addr, to: &Addr, amount: u128) -> AnyMsg {
    MsgSend {
        from_address: from.to_string(),
        to_address: to.to_string(),
        amount: coins(amount, "stake"),
    }
    .to_any()
    .unwrap()
}

fn grant_send(a: &Accounts, limit: u128, expiration: Option<Timestamp>) -> AnyMsg {
    MsgGrant {
        granter: a.granter.to_string(),
        grantee: a.grantee.to_string(),
        grant: Grant {
            authorization: SendAuthorization::new(coins(limit, "stake")).to_any().unwrap(),
            expiration,
        },
    }
    .to_any()
    .unwrap()
}

fn exec(a: &Accounts, msgs: Vec<AnyMsg>) -> AnyMsg {
    MsgExec {
        grantee: a.grantee.to_string(),
        msgs,
    }
    .to_any()
    .unwrap()
}

fn send_grants(app: &TestApp, a: &Accounts) -> GrantsResponse {
    from_json(
        app.query_authz(AuthzQuery::Grants {
            granter: a.granter.to_string(),
            grantee: a.grantee.to_string(),
            msg_type_url: None,
            start_after: None,
            limit: None,
        })
        .unwrap(),
    )
    .unwrap()
}

fn submitted_id(result: &DeliverResult) -> u64 {
    assert!(result.is_ok(), "{}", result.log);
    let data: SubmitProposalResponse = from_json(result.data.as_ref().unwrap()).unwrap();
    data.proposal_id
}

fn has_event(events: &BlockEvents, ty: &str, key: &str, value: &str) -> bool {
    events
        .all()
        .any(|e| e.ty == ty && e.attributes.iter().any(|a| a.key == key && a.value == value))
}

// ─── Governance ───────────────────────────────────────────────────────

#[test]
fn happy_path_proposal_passes() {
    let (mut app, a) = setup(600);

    let (results, _) = block(&mut app, 0, &[submit(&a.alice, vec![])]);
    let id = submitted_id(&results[0]);
    let p = proposal(&app, id);
    assert_eq!(p.status, ProposalStatus::VotingPeriod);
    assert_eq!(p.voting_start_time, Some(t(0)));
    assert_eq!(p.voting_end_time, Some(t(100)));
    assert_eq!(balance(&app, &a.alice), 900);

    let (results, _) = block(&mut app, 10, &[vote(&a.val1, id, VoteOption::Yes)]);
    assert!(results[0].is_ok(), "{}", results[0].log);

    let (_, events) = block(&mut app, 99, &[]);
    assert!(events.end.is_empty());
    assert_eq!(proposal(&app, id).status, ProposalStatus::VotingPeriod);

    let (_, events) = block(&mut app, 100, &[]);
    assert!(has_event(&events, "proposal_status_changed", "new", "passed"));
    let p = proposal(&app, id);
    assert_eq!(p.status, ProposalStatus::Passed);
    assert_eq!(
        p.final_tally,
        TallyResult {
            yes_count: Uint128::new(600),
            ..TallyResult::default()
        }
    );
    assert_eq!(balance(&app, &a.alice), 1_000);
    assert_eq!(balance(&app, &a.escrow), 0);
}

#[test]
fn vetoed_proposal_burns_deposit() {
    let (mut app, a) = setup(700);

    let (results, _) = block(&mut app, 0, &[submit(&a.alice, vec![])]);
    let id = submitted_id(&results[0]);
    block(&mut app, 10, &[vote(&a.val1, id, VoteOption::NoWithVeto)]);
    block(&mut app, 100, &[]);

    let p = proposal(&app, id);
    assert_eq!(p.status, ProposalStatus::Rejected);
    assert_eq!(
        p.final_tally,
        TallyResult {
            no_with_veto_count: Uint128::new(700),
            ..TallyResult::default()
        }
    );
    assert_eq!(balance(&app, &a.alice), 900);
    assert_eq!(balance(&app, &a.escrow), 0);
}

#[test]
fn quorum_failure_refunds_deposit() {
    let (mut app, a) = setup(400);

    let (results, _) = block(&mut app, 0, &[submit(&a.alice, vec![])]);
    let id = submitted_id(&results[0]);
    block(&mut app, 10, &[vote(&a.val1, id, VoteOption::Yes)]);
    block(&mut app, 100, &[]);

    let p = proposal(&app, id);
    assert_eq!(p.status, ProposalStatus::Rejected);
    assert_eq!(p.final_tally.yes_count, Uint128::new(400));
    assert_eq!(balance(&app, &a.alice), 1_000);
}

#[test]
fn passed_proposal_messages_run_through_the_router() {
    let (mut app, a) = setup(600);

    let payout = send(&a.authority, &a.carol, 250);
    let (results, _) = block(&mut app, 0, &[submit(&a.alice, vec![payout])]);
    let id = submitted_id(&results[0]);
    block(&mut app, 10, &[vote(&a.val1, id, VoteOption::Yes)]);
    let (_, events) = block(&mut app, 100, &[]);

    assert_eq!(proposal(&app, id).status, ProposalStatus::Passed);
    assert!(has_event(&events, "proposal_executed", "result", "success"));
    assert!(has_event(&events, "message", "module", "bank"));
    assert_eq!(balance(&app, &a.carol), 250);
    assert_eq!(balance(&app, &a.authority), 250);
}

// ─── Authorization ────────────────────────────────────────────────────

#[test]
fn grant_based_send_spends_down_then_consumes() {
    let (mut app, a) = setup(600);

    let (results, _) = block(&mut app, 0, &[grant_send(&a, 100, Some(t(1_000)))]);
    assert!(results[0].is_ok(), "{}", results[0].log);

    let (results, events) = block(&mut app, 5, &[exec(&a, vec![send(&a.granter, &a.carol, 30)])]);
    assert!(results[0].is_ok(), "{}", results[0].log);
    assert!(has_event(&events, "grant_used", "msg_index", "0"));
    assert_eq!(balance(&app, &a.granter), 970);
    assert_eq!(balance(&app, &a.carol), 30);
    let grants = send_grants(&app, &a).grants;
    assert_eq!(
        grants[0].authorization,
        SendAuthorization::new(coins(70, "stake")).to_any().unwrap()
    );

    let (results, _) = block(&mut app, 6, &[exec(&a, vec![send(&a.granter, &a.carol, 70)])]);
    assert!(results[0].is_ok(), "{}", results[0].log);
    assert_eq!(balance(&app, &a.carol), 100);
    assert!(send_grants(&app, &a).grants.is_empty());
    assert!(GRANT_QUEUE.entries(app.deps().storage).unwrap().is_empty());
}

#[test]
fn expired_grant_is_pruned_and_unusable() {
    let (mut app, a) = setup(600);

    block(&mut app, 0, &[grant_send(&a, 100, Some(t(50)))]);
    block(&mut app, 49, &[]);
    assert_eq!(send_grants(&app, &a).grants.len(), 1);

    block(&mut app, 50, &[]);
    assert!(send_grants(&app, &a).grants.is_empty());

    let (results, events) = block(&mut app, 51, &[exec(&a, vec![send(&a.granter, &a.carol, 10)])]);
    assert_eq!(results[0].codespace, "authz");
    assert_eq!(results[0].code, 2);
    assert_eq!(events.deliver, vec![(0, vec![])]);
    assert_eq!(balance(&app, &a.granter), 1_000);
}

// ─── Driver ───────────────────────────────────────────────────────────

#[test]
fn rejected_messages_leave_no_state_and_keep_their_ordinal() {
    let (mut app, a) = setup(600);

    let (results, events) = block(
        &mut app,
        0,
        &[
            send(&a.alice, &a.carol, 5_000),
            send(&a.alice, &a.carol, 10),
            AnyMsg::new("/test.Unknown", Default::default()),
        ],
    );
    assert_eq!(results.len(), 3);
    assert_eq!((results[0].codespace.as_str(), results[0].code), ("sdk", 5));
    assert!(results[1].is_ok());
    assert_eq!((results[2].codespace.as_str(), results[2].code), ("sdk", 6));

    let ordinals: Vec<u32> = events.deliver.iter().map(|(i, _)| *i).collect();
    assert_eq!(ordinals, vec![0, 1, 2]);
    assert!(events.deliver[0].1.is_empty());
    assert!(!events.deliver[1].1.is_empty());
    assert_eq!(balance(&app, &a.alice), 990);
    assert_eq!(balance(&app, &a.carol), 10);
}

#[test]
fn block_phases_must_be_in_order() {
    let (mut app, a) = setup(600);

    assert_eq!(
        app.deliver(&[send(&a.alice, &a.carol, 1)]).unwrap_err(),
        AppError::NoBlock
    );
    assert_eq!(app.end_block().unwrap_err(), AppError::NoBlock);

    let height = app.env().block.height + 1;
    app.begin_block(height, t(1)).unwrap();
    assert_eq!(
        app.begin_block(height + 1, t(2)).unwrap_err(),
        AppError::BlockInProgress { height }
    );
    let events = app.end_block().unwrap();
    assert_eq!(events.height, height);
    assert_eq!(app.env().block.time, t(1));
}

#[test]
fn genesis_stamps_app_and_module_versions() {
    let (app, _) = setup(600);

    let version = app.contract_version().unwrap();
    assert_eq!(version.contract, "crates.io:civitas-app");

    let modules: Vec<String> = app
        .module_versions()
        .unwrap()
        .into_iter()
        .map(|v| v.contract)
        .collect();
    assert_eq!(
        modules,
        vec![
            "crates.io:civitas-authz",
            "crates.io:civitas-bank",
            "crates.io:civitas-gov",
            "crates.io:civitas-staking",
        ]
    );
    assert_eq!(app.router().module_names(), vec!["bank", "staking", "gov", "authz"]);
}
