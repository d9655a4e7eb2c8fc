use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use nex_core::time::{now_unix_millis, unix_millis_to_iso8601};
use nex_core::{
    Entry, IdentifierForm, LoginRecord, NewEntry, NewLogin, OBFUSCATION_KEY_HEX, Origin, Tier,
    UserStatus, transform,
};
use parking_lot::Mutex;
use serde::Serialize;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::ring::BoundedLog;

/// Process-wide counters. Zero at start, never persisted.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStats {
    pub total_accepted: u64,
    pub hopper_accepted: u64,
    pub highest_magnitude: f64,
    pub last_ingested_at: Option<String>,
}

/// In-memory home of every entry, login and counter.
///
/// Each tier, the login log, the status log and the counters sit behind
/// their own lock. Share it as `Arc<TieredStore>` between request handlers
/// and the sweeper.
pub struct TieredStore {
    config: StoreConfig,
    obfuscation_key: Cow<'static, str>,
    tiers: [Mutex<BoundedLog<Entry>>; 3],
    logins: Mutex<BoundedLog<LoginRecord>>,
    statuses: Mutex<BoundedLog<UserStatus>>,
    stats: Mutex<ServerStats>,
    next_seq: AtomicU64,
    started: Instant,
}

impl TieredStore {
    pub fn new(config: StoreConfig) -> Self {
        let tier_log = || Mutex::new(BoundedLog::new(config.tier_capacity));
        Self {
            tiers: [tier_log(), tier_log(), tier_log()],
            logins: Mutex::new(BoundedLog::new(config.login_capacity)),
            statuses: Mutex::new(BoundedLog::new(config.login_capacity)),
            stats: Mutex::new(ServerStats::default()),
            next_seq: AtomicU64::new(0),
            started: Instant::now(),
            obfuscation_key: Cow::Borrowed(OBFUSCATION_KEY_HEX),
            config,
        }
    }

    /// Replace the key used to obfuscate notify-path job tokens.
    pub fn with_obfuscation_key(mut self, key_hex: impl Into<Cow<'static, str>>) -> Self {
        self.obfuscation_key = key_hex.into();
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    // --- Ingestion ---

    pub fn ingest(&self, new: NewEntry) -> Result<Entry> {
        self.ingest_at(new, now_unix_millis())
    }

    /// Classify, stamp and file an entry as if it arrived at `now_millis`.
    pub fn ingest_at(&self, new: NewEntry, now_millis: u64) -> Result<Entry> {
        let tier = new.tier()?;
        let (identifier, identifier_form) = self.protect_identifier(&new);

        let entry = {
            let mut log = self.tiers[tier.index()].lock();
            let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
            let entry = Entry {
                id: format!("{now_millis}-{seq}"),
                name: new.name,
                value_per_second: new.value_per_second,
                magnitude: new.magnitude,
                tier,
                identifier,
                identifier_form,
                origin: new.origin,
                owner: new.owner,
                occupancy: new.occupancy,
                timestamp: unix_millis_to_iso8601(now_millis),
            };
            let dropped = log.push_front(entry.clone());
            if dropped > 0 {
                tracing::trace!(%tier, dropped, "tier at capacity, oldest entries dropped");
            }
            entry
        };

        self.record_accepted(&entry);
        tracing::debug!(
            %tier,
            id = %entry.id,
            magnitude = entry.magnitude,
            origin = ?entry.origin,
            "entry ingested"
        );
        Ok(entry)
    }

    fn protect_identifier(&self, new: &NewEntry) -> (String, IdentifierForm) {
        if !new.obfuscate {
            return (new.job_id.clone(), IdentifierForm::Clear);
        }
        match transform(&new.job_id, &self.obfuscation_key) {
            Some(hidden) if !hidden.is_empty() => (hidden, IdentifierForm::Obfuscated),
            _ => {
                tracing::warn!("job token obfuscation failed, storing it in clear");
                (new.job_id.clone(), IdentifierForm::Clear)
            }
        }
    }

    fn record_accepted(&self, entry: &Entry) {
        let mut stats = self.stats.lock();
        stats.total_accepted += 1;
        if entry.origin == Origin::Hopper {
            stats.hopper_accepted += 1;
        }
        if entry.magnitude > stats.highest_magnitude {
            stats.highest_magnitude = entry.magnitude;
        }
        // Fixed-width ISO-8601 strings order the same as the instants they name
        if stats.last_ingested_at.as_deref() < Some(entry.timestamp.as_str()) {
            stats.last_ingested_at = Some(entry.timestamp.clone());
        }
    }

    // --- Logins ---

    pub fn record_login(&self, new: NewLogin) -> LoginRecord {
        self.record_login_at(new, now_unix_millis())
    }

    pub fn record_login_at(&self, new: NewLogin, now_millis: u64) -> LoginRecord {
        let timestamp = unix_millis_to_iso8601(now_millis);
        let record = LoginRecord {
            username: new.username,
            user_id: new.user_id,
            executor: new.executor,
            place_id: new.place_id,
            timestamp: timestamp.clone(),
        };

        self.logins.lock().push_front(record.clone());
        self.statuses.lock().push_front(UserStatus {
            username: record.username.clone(),
            last_seen: timestamp,
            online: true,
        });

        tracing::debug!(username = %record.username, executor = %record.executor, "login recorded");
        record
    }

    pub fn logins(&self) -> Vec<LoginRecord> {
        self.logins.lock().to_vec()
    }

    pub fn status_count(&self) -> usize {
        self.statuses.lock().len()
    }

    /// The `n` most recent statuses, newest first.
    pub fn recent_statuses(&self, n: usize) -> Vec<UserStatus> {
        self.statuses.lock().iter().take(n).cloned().collect()
    }

    // --- Reads ---

    /// Everything retained for `tier`, newest first.
    pub fn list_tier(&self, tier: Tier) -> Vec<Entry> {
        self.tiers[tier.index()].lock().to_vec()
    }

    /// [`list_tier`](Self::list_tier) for a tier name taken from a request.
    pub fn list_tier_named(&self, name: &str) -> Result<Vec<Entry>> {
        let tier: Tier = name.parse()?;
        Ok(self.list_tier(tier))
    }

    pub fn tier_len(&self, tier: Tier) -> usize {
        self.tiers[tier.index()].lock().len()
    }

    pub fn server_stats(&self) -> ServerStats {
        self.stats.lock().clone()
    }

    /// Run `f` against a tier while holding its lock.
    pub(crate) fn with_tier<R>(&self, tier: Tier, f: impl FnOnce(&BoundedLog<Entry>) -> R) -> R {
        f(&self.tiers[tier.index()].lock())
    }

    pub(crate) fn with_tier_mut<R>(
        &self,
        tier: Tier,
        f: impl FnOnce(&mut BoundedLog<Entry>) -> R,
    ) -> R {
        f(&mut self.tiers[tier.index()].lock())
    }
}

impl Default for TieredStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use nex_core::{ValidationError, invert};

    const T0: u64 = 1_771_632_000_000;

    fn new_entry(name: &str, magnitude: f64, job: &str) -> NewEntry {
        NewEntry {
            name: name.to_string(),
            value_per_second: "x/s".to_string(),
            magnitude,
            job_id: job.to_string(),
            obfuscate: false,
            origin: Origin::Manual,
            owner: "owner".to_string(),
            occupancy: "1/8".to_string(),
        }
    }

    fn small_store(capacity: usize) -> TieredStore {
        TieredStore::new(StoreConfig {
            tier_capacity: capacity,
            login_capacity: 3,
        })
    }

    #[test]
    fn test_ingest_files_by_tier() {
        let store = TieredStore::default();
        let e = store.ingest_at(new_entry("a", 500_000.0, "J1"), T0).unwrap();
        assert_eq!(e.tier, Tier::Normal);
        let e = store.ingest_at(new_entry("b", 10_000_000.0, "J2"), T0).unwrap();
        assert_eq!(e.tier, Tier::High);
        let e = store.ingest_at(new_entry("c", 400_000_000.0, "J3"), T0).unwrap();
        assert_eq!(e.tier, Tier::Top);

        for tier in Tier::ALL {
            assert_eq!(store.tier_len(tier), 1);
        }
    }

    #[test]
    fn test_ingest_below_floor_rejected() {
        let store = TieredStore::default();
        let err = store.ingest_at(new_entry("a", 499_999.0, "J1"), T0).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::BelowFloor(_))
        ));
        assert_eq!(store.server_stats().total_accepted, 0);
        for tier in Tier::ALL {
            assert_eq!(store.tier_len(tier), 0);
        }
    }

    #[test]
    fn test_capacity_keeps_newest_first() {
        let store = small_store(5);
        for i in 0..6 {
            store
                .ingest_at(new_entry(&format!("e{i}"), 1e6, "J"), T0 + i)
                .unwrap();
        }
        let names: Vec<String> = store
            .list_tier(Tier::Normal)
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["e5", "e4", "e3", "e2", "e1"]);
    }

    #[test]
    fn test_ids_unique_within_same_millisecond() {
        let store = TieredStore::default();
        let a = store.ingest_at(new_entry("a", 1e6, "J"), T0).unwrap();
        let b = store.ingest_at(new_entry("b", 1e6, "J"), T0).unwrap();
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with(&T0.to_string()));
    }

    #[test]
    fn test_timestamp_assigned_at_ingest() {
        let store = TieredStore::default();
        let e = store.ingest_at(new_entry("a", 1e6, "J"), T0).unwrap();
        assert_eq!(e.timestamp, "2026-02-21T00:00:00.000Z");
    }

    #[test]
    fn test_notify_path_obfuscates() {
        let store = TieredStore::default();
        let mut n = new_entry("a", 1e6, "job-123");
        n.obfuscate = true;
        let e = store.ingest_at(n, T0).unwrap();
        assert_eq!(e.identifier_form, IdentifierForm::Obfuscated);
        assert_ne!(e.identifier, "job-123");
        assert_eq!(
            invert(&e.identifier, OBFUSCATION_KEY_HEX).as_deref(),
            Some("job-123")
        );
    }

    #[test]
    fn test_obfuscation_failure_stores_clear() {
        let store = TieredStore::default().with_obfuscation_key("");
        let mut n = new_entry("a", 1e6, "job-123");
        n.obfuscate = true;
        let e = store.ingest_at(n, T0).unwrap();
        assert_eq!(e.identifier_form, IdentifierForm::Clear);
        assert_eq!(e.identifier, "job-123");
    }

    #[test]
    fn test_counters() {
        let store = TieredStore::default();
        store.ingest_at(new_entry("a", 2e6, "J"), T0).unwrap();
        let mut hopped = new_entry("b", 5e8, "J");
        hopped.origin = Origin::Hopper;
        store.ingest_at(hopped, T0 + 1000).unwrap();
        store.ingest_at(new_entry("c", 3e6, "J"), T0 + 2000).unwrap();

        let stats = store.server_stats();
        assert_eq!(stats.total_accepted, 3);
        assert_eq!(stats.hopper_accepted, 1);
        assert_eq!(stats.highest_magnitude, 5e8);
        assert_eq!(
            stats.last_ingested_at.as_deref(),
            Some("2026-02-21T00:00:02.000Z")
        );
    }

    #[test]
    fn test_last_ingested_never_moves_backwards() {
        let store = TieredStore::default();
        store.ingest_at(new_entry("late", 2e6, "J"), T0 + 5000).unwrap();
        store.ingest_at(new_entry("early", 2e7, "J"), T0).unwrap();

        let stats = store.server_stats();
        assert_eq!(stats.total_accepted, 2);
        assert_eq!(
            stats.last_ingested_at.as_deref(),
            Some("2026-02-21T00:00:05.000Z")
        );
    }

    #[test]
    fn test_list_tier_named() {
        let store = TieredStore::default();
        store.ingest_at(new_entry("a", 2e7, "J"), T0).unwrap();
        assert_eq!(store.list_tier_named("HIGH").unwrap().len(), 1);
        let err = store.list_tier_named("SECRETS").unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::InvalidTier(_))
        ));
    }

    #[test]
    fn test_logins_capped_newest_first() {
        let store = small_store(5);
        for i in 0..5 {
            store.record_login_at(
                NewLogin {
                    username: format!("user{i}"),
                    user_id: "N/A".to_string(),
                    executor: "Unknown".to_string(),
                    place_id: "N/A".to_string(),
                },
                T0 + i,
            );
        }
        let names: Vec<String> = store.logins().into_iter().map(|l| l.username).collect();
        assert_eq!(names, vec!["user4", "user3", "user2"]);
        assert_eq!(store.status_count(), 3);
        let recent = store.recent_statuses(2);
        assert_eq!(recent[0].username, "user4");
        assert!(recent[0].online);
        assert_eq!(recent.len(), 2);
    }
}
