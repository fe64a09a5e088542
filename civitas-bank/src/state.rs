use cosmwasm_std::{Addr, Uint128};
use cw_storage_plus::Map;

/// Balance per `(holder, denom)`. Zero balances are removed.
pub const BALANCES: Map<(&Addr, &str), Uint128> = Map::new("\u{30}");
pub const SUPPLY: Map<&str, Uint128> = Map::new("\u{31}");
/// Per-denom transfer switch; a missing entry means enabled.
pub const SEND_ENABLED: Map<&str, bool> = Map::new("\u{32}");
