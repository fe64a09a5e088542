use cosmwasm_std::{Order, StdResult, Storage};
use cw2::ContractVersion;
use cw_storage_plus::Map;

/// Per-module version stamps. All modules share one store, so the single
/// cw2 `contract_info` slot is reserved for the application itself.
pub const MODULE_VERSIONS: Map<&str, ContractVersion> = Map::new("\u{ff}");

pub fn set_module_version(store: &mut dyn Storage, module: &str, version: &str) -> StdResult<()> {
    MODULE_VERSIONS.save(
        store,
        module,
        &ContractVersion {
            contract: module.to_string(),
            version: version.to_string(),
        },
    )
}

pub fn get_module_version(store: &dyn Storage, module: &str) -> StdResult<Option<ContractVersion>> {
    MODULE_VERSIONS.may_load(store, module)
}

pub fn module_versions(store: &dyn Storage) -> StdResult<Vec<ContractVersion>> {
    MODULE_VERSIONS
        .range(store, None, None, Order::Ascending)
        .map(|item| item.map(|(_, v)| v))
        .collect()
}
