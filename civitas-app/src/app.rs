use civitas_core::router::response_events;
use civitas_core::store::with_branch;
use civitas_core::versions::module_versions;
use civitas_core::{AnyMsg, CoreError, Router};
use cosmwasm_std::{
    Api, Binary, Deps, Env, Event, OwnedDeps, Querier, StdResult, Storage, Timestamp,
};
use cw2::ContractVersion;

use crate::config::{AppConfig, Genesis};
use crate::error::AppError;

const CONTRACT_NAME: &str = "crates.io:civitas-app";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything emitted during one block, in emission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockEvents {
    pub height: u64,
    pub begin: Vec<Event>,
    /// Keyed by the message ordinal within the block. Rejected messages
    /// appear with no events.
    pub deliver: Vec<(u32, Vec<Event>)>,
    pub end: Vec<Event>,
}

impl BlockEvents {
    pub fn all(&self) -> impl Iterator<Item = &Event> {
        self.begin
            .iter()
            .chain(self.deliver.iter().flat_map(|(_, events)| events))
            .chain(self.end.iter())
    }
}

/// Outcome of one delivered message. `code == 0` means it was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliverResult {
    pub ordinal: u32,
    pub code: u32,
    pub codespace: String,
    pub log: String,
    pub data: Option<Binary>,
    pub events: Vec<Event>,
}

impl DeliverResult {
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

pub struct App<S: Storage, A: Api, Q: Querier> {
    deps: OwnedDeps<S, A, Q>,
    config: AppConfig,
    router: Router,
    env: Env,
    block: Option<BlockEvents>,
    next_ordinal: u32,
}

fn genesis_err(module: &str, err: impl Into<CoreError>) -> AppError {
    AppError::Genesis {
        module: module.to_string(),
        source: err.into(),
    }
}

impl<S: Storage, A: Api, Q: Querier> App<S, A, Q> {
    /// Runs every module's genesis against `deps` at `env` and registers the
    /// modules in end-block order: bank, staking, gov, authz.
    pub fn new(
        mut deps: OwnedDeps<S, A, Q>,
        config: AppConfig,
        genesis: Genesis,
        env: Env,
    ) -> Result<Self, AppError> {
        cw2::set_contract_version(&mut deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

        let bank = config.bank();
        civitas_bank::contract::instantiate(deps.as_mut(), env.clone(), &bank, genesis.bank)
            .map_err(|err| genesis_err("bank", err))?;

        let staking = config.staking();
        civitas_staking::contract::instantiate(
            deps.as_mut(),
            env.clone(),
            &staking,
            genesis.staking,
        )
        .map_err(|err| genesis_err("staking", err))?;

        let gov = config.gov();
        civitas_gov::contract::instantiate(deps.as_mut(), env.clone(), &gov, genesis.gov)
            .map_err(|err| genesis_err("gov", err))?;

        let authz = config.authz()?;
        civitas_authz::contract::instantiate(deps.as_mut(), env.clone(), &authz, genesis.authz)
            .map_err(|err| genesis_err("authz", err))?;

        let router = Router::new()
            .with(Box::new(bank))?
            .with(Box::new(staking))?
            .with(Box::new(gov))?
            .with(Box::new(authz))?;

        tracing::info!(
            target: "app",
            height = env.block.height,
            modules = ?router.module_names(),
            "genesis complete"
        );

        Ok(Self {
            deps,
            config,
            router,
            env,
            block: None,
            next_ordinal: 0,
        })
    }

    pub fn begin_block(&mut self, height: u64, time: Timestamp) -> Result<(), AppError> {
        if let Some(block) = &self.block {
            return Err(AppError::BlockInProgress {
                height: block.height,
            });
        }
        self.env.block.height = height;
        self.env.block.time = time;

        let begin = self.router.begin_block(self.deps.as_mut(), &self.env)?;
        self.block = Some(BlockEvents {
            height,
            begin,
            ..BlockEvents::default()
        });
        self.next_ordinal = 0;

        tracing::debug!(target: "app", height, time = %time, "begin block");
        Ok(())
    }

    /// Applies `msgs` in order. Each message runs in its own branch, so a
    /// rejected message leaves no trace in state.
    pub fn deliver(&mut self, msgs: &[AnyMsg]) -> Result<Vec<DeliverResult>, AppError> {
        let block = self.block.as_mut().ok_or(AppError::NoBlock)?;
        let router = &self.router;
        let env = &self.env;

        let mut results = Vec::with_capacity(msgs.len());
        for msg in msgs {
            let ordinal = self.next_ordinal;
            self.next_ordinal += 1;

            let outcome = with_branch(self.deps.as_mut(), |deps| {
                router.validate_basic(deps.api, msg)?;
                if router.signers(deps.api, msg)?.is_empty() {
                    return Err(CoreError::InvalidAddress {
                        address: format!("{} declares no signer", msg.type_url),
                    });
                }
                router.dispatch(deps, env, msg)
            });

            match outcome {
                Ok(res) => {
                    let data = res.data.clone();
                    let module = router.handler(&msg.type_url).map_or("unknown", |m| m.name());
                    let events = response_events(module, res);
                    block.deliver.push((ordinal, events.clone()));
                    results.push(DeliverResult {
                        ordinal,
                        code: 0,
                        codespace: String::new(),
                        log: String::new(),
                        data,
                        events,
                    });
                }
                Err(err) => {
                    tracing::debug!(
                        target: "app",
                        ordinal,
                        type_url = msg.type_url.as_str(),
                        codespace = err.codespace(),
                        code = err.code(),
                        error = %err,
                        "message rejected"
                    );
                    block.deliver.push((ordinal, vec![]));
                    results.push(DeliverResult {
                        ordinal,
                        code: err.code(),
                        codespace: err.codespace().to_string(),
                        log: err.to_string(),
                        data: None,
                        events: vec![],
                    });
                }
            }
        }
        Ok(results)
    }

    /// Runs the end-block hooks and hands back the block's events. An error
    /// here is fatal: the store may be half-swept.
    pub fn end_block(&mut self) -> Result<BlockEvents, AppError> {
        let mut block = self.block.take().ok_or(AppError::NoBlock)?;
        block.end = self
            .router
            .end_block(self.deps.as_mut(), &self.env)
            .map_err(|source| {
                tracing::error!(target: "app", height = block.height, error = %source, "end block failed");
                AppError::EndBlock {
                    height: block.height,
                    source,
                }
            })?;

        tracing::debug!(target: "app", height = block.height, events = block.end.len(), "end block");
        Ok(block)
    }

    /// One full block at the next height.
    pub fn run_block(
        &mut self,
        time: Timestamp,
        msgs: &[AnyMsg],
    ) -> Result<(Vec<DeliverResult>, BlockEvents), AppError> {
        self.begin_block(self.env.block.height + 1, time)?;
        let results = self.deliver(msgs)?;
        let events = self.end_block()?;
        Ok((results, events))
    }

    pub fn deps(&self) -> Deps {
        self.deps.as_ref()
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn contract_version(&self) -> StdResult<ContractVersion> {
        cw2::get_contract_version(&self.deps.storage)
    }

    pub fn module_versions(&self) -> StdResult<Vec<ContractVersion>> {
        module_versions(&self.deps.storage)
    }

    // ─── Queries ──────────────────────────────────────────────────────

    pub fn query_bank(&self, msg: civitas_bank::msg::QueryMsg) -> StdResult<Binary> {
        civitas_bank::contract::query(self.deps(), self.env.clone(), &self.config.bank(), msg)
    }

    pub fn query_staking(&self, msg: civitas_staking::msg::QueryMsg) -> StdResult<Binary> {
        civitas_staking::contract::query(
            self.deps(),
            self.env.clone(),
            &self.config.staking(),
            msg,
        )
    }

    pub fn query_gov(&self, msg: civitas_gov::msg::QueryMsg) -> StdResult<Binary> {
        civitas_gov::contract::query(self.deps(), self.env.clone(), &self.config.gov(), msg)
    }

    pub fn query_authz(&self, msg: civitas_authz::msg::QueryMsg) -> StdResult<Binary> {
        civitas_authz::contract::query(self.deps(), self.env.clone(), msg)
    }
}
