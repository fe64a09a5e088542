use civitas_authz::{AuthzConfig, AuthzModule};
use civitas_bank::{BankModule, BaseKeeper, SendAuthorization};
use civitas_core::authz::AuthorizationRegistry;
use civitas_core::accounts::BaseAccountKeeper;
use civitas_core::CoreError;
use civitas_gov::{GovConfig, GovModule};
use civitas_staking::{Keeper, StakeAuthorization, StakingModule};
use cosmwasm_schema::cw_serde;
use cosmwasm_std::Addr;

/// Initial state handed to each module's `instantiate`.
#[cw_serde]
pub struct Genesis {
    pub bank: civitas_bank::msg::InstantiateMsg,
    pub staking: civitas_staking::msg::InstantiateMsg,
    #[serde(default)]
    pub gov: civitas_gov::msg::InstantiateMsg,
    #[serde(default)]
    pub authz: civitas_authz::msg::InstantiateMsg,
}

/// Construction-time wiring shared by every module instance the app builds.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub gov: GovConfig,
    pub bonded_pool: Addr,
    pub authz: AuthzConfig,
}

impl AppConfig {
    pub fn new(authority: Addr, gov_escrow: Addr, bonded_pool: Addr) -> Self {
        Self {
            gov: GovConfig::new(authority, gov_escrow),
            bonded_pool,
            authz: AuthzConfig::default(),
        }
    }

    /// Send-enabled flags are governed by the same authority as gov params.
    pub fn bank(&self) -> BankModule {
        BankModule::new(self.gov.authority.clone())
    }

    pub fn staking(&self) -> StakingModule {
        StakingModule::new(Box::new(BaseKeeper), self.bonded_pool.clone())
    }

    pub fn gov(&self) -> GovModule {
        GovModule::new(self.gov.clone(), Box::new(BaseKeeper), Box::new(Keeper))
    }

    pub fn authz(&self) -> Result<AuthzModule, CoreError> {
        let mut registry = AuthorizationRegistry::new();
        registry.register::<SendAuthorization>()?;
        registry.register::<StakeAuthorization>()?;
        AuthzModule::new(self.authz.clone(), registry, Box::new(BaseAccountKeeper))
    }
}
