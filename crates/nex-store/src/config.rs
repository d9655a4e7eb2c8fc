//! Tunables for the store, the sweeper and the query layer.
//!
//! Each section deserializes from its own TOML table and falls back to the
//! built-in defaults for any key left out.

use std::time::Duration;

use nex_core::{
    DEFAULT_AUTOJOIN_WINDOW_SECS, DEFAULT_LOGIN_CAPACITY, DEFAULT_RETENTION_SECS,
    DEFAULT_SERVERS_LIMIT, DEFAULT_SWEEP_INTERVAL_SECS, DEFAULT_TIER_CAPACITY,
};
use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Entries retained per tier.
    pub tier_capacity: usize,
    /// Login and status records retained.
    pub login_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            tier_capacity: DEFAULT_TIER_CAPACITY,
            login_capacity: DEFAULT_LOGIN_CAPACITY,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweeperConfig {
    pub interval_secs: u64,
    pub retention_secs: u64,
}

impl SweeperConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            retention_secs: DEFAULT_RETENTION_SECS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryConfig {
    pub autojoin_window_secs: u64,
    pub servers_limit: usize,
}

impl QueryConfig {
    pub fn autojoin_window(&self) -> Duration {
        Duration::from_secs(self.autojoin_window_secs)
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            autojoin_window_secs: DEFAULT_AUTOJOIN_WINDOW_SECS,
            servers_limit: DEFAULT_SERVERS_LIMIT,
        }
    }
}
