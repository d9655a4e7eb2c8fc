//! Read-side views over the store: autojoin recency filter, per-identifier
//! dedup, aggregate stats and the administrative token decoder.
//!
//! All results are owned copies; nothing borrows the store past the call.

use std::collections::HashSet;
use std::time::Duration;

use nex_core::constants::RECENT_STATUS_COUNT;
use nex_core::time::{duration_millis, now_unix_millis};
use nex_core::{Entry, ServerSummary, Tier, UserStatus, invert};
use serde::Serialize;

use crate::error::{Result, StoreError};
use crate::store::TieredStore;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntryCounts {
    #[serde(rename = "NORMAL")]
    pub normal: usize,
    #[serde(rename = "HIGH")]
    pub high: usize,
    #[serde(rename = "TOP")]
    pub top: usize,
    pub total: u64,
    pub hopper: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivity {
    pub total_logins: usize,
    pub recent_logins: Vec<UserStatus>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    pub highest_magnitude: f64,
    pub last_ingested_at: Option<String>,
    pub uptime_secs: u64,
}

/// Point-in-time aggregate served by `/stats`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub entries: EntryCounts,
    pub users: UserActivity,
    pub system: SystemInfo,
}

impl TieredStore {
    /// Entries of `tier` no older than `window`, newest first.
    pub fn recent_for_autojoin(&self, tier: Tier, window: Duration) -> Vec<Entry> {
        self.recent_for_autojoin_at(tier, window, now_unix_millis())
    }

    /// Entries with an unparseable timestamp are left out: an automated
    /// consumer must never be handed data whose age is unknown.
    pub fn recent_for_autojoin_at(&self, tier: Tier, window: Duration, now_millis: u64) -> Vec<Entry> {
        let window_ms = duration_millis(window);
        self.with_tier(tier, |log| {
            log.iter()
                .filter(|e| e.age_millis(now_millis).is_some_and(|age| age <= window_ms))
                .cloned()
                .collect()
        })
    }

    /// First (newest) occurrence of each identifier in `tier`, up to `limit`
    /// distinct identifiers.
    pub fn unique_servers(&self, tier: Tier, limit: usize) -> Vec<ServerSummary> {
        self.with_tier(tier, |log| {
            let mut seen = HashSet::new();
            let mut out = Vec::new();
            for entry in log.iter() {
                if out.len() >= limit {
                    break;
                }
                if seen.insert(entry.identifier.as_str()) {
                    out.push(entry.summary());
                }
            }
            out
        })
    }

    pub fn stats(&self) -> StatsSnapshot {
        let counters = self.server_stats();
        StatsSnapshot {
            entries: EntryCounts {
                normal: self.tier_len(Tier::Normal),
                high: self.tier_len(Tier::High),
                top: self.tier_len(Tier::Top),
                total: counters.total_accepted,
                hopper: counters.hopper_accepted,
            },
            users: UserActivity {
                total_logins: self.status_count(),
                recent_logins: self.recent_statuses(RECENT_STATUS_COUNT),
            },
            system: SystemInfo {
                highest_magnitude: counters.highest_magnitude,
                last_ingested_at: counters.last_ingested_at,
                uptime_secs: self.uptime().as_secs(),
            },
        }
    }
}

/// Reverse the job-token obfuscation. Empty output counts as failure.
pub fn decode_token(token: &str, key_hex: &str) -> Result<String> {
    match invert(token, key_hex) {
        Some(decoded) if !decoded.is_empty() => Ok(decoded),
        Some(_) => Err(StoreError::Transform(
            "token is not valid hex or is empty".to_string(),
        )),
        None => Err(StoreError::Transform("key decodes to zero bytes".to_string())),
    }
}
