//! Periodic retention pass.
//!
//! Entries older than the retention age are evicted from every tier. An
//! entry whose timestamp does not parse is evicted too, so malformed data
//! cannot pile up. Each tier is swept with one linear pass under its own
//! lock; other tiers stay available meanwhile.

use std::sync::Arc;
use std::time::Duration;

use nex_core::Tier;
use nex_core::time::{duration_millis, now_unix_millis};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::SweeperConfig;
use crate::store::TieredStore;

/// What one sweep removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: usize,
    pub malformed: usize,
}

impl SweepReport {
    pub fn evicted(&self) -> usize {
        self.expired + self.malformed
    }
}

impl TieredStore {
    pub fn sweep(&self, retention: Duration) -> SweepReport {
        self.sweep_at(now_unix_millis(), retention)
    }

    pub fn sweep_at(&self, now_millis: u64, retention: Duration) -> SweepReport {
        let retention_ms = duration_millis(retention);
        let mut report = SweepReport::default();

        for tier in Tier::ALL {
            let mut expired = 0;
            let mut malformed = 0;
            self.with_tier_mut(tier, |log| {
                log.retain(|entry| match entry.age_millis(now_millis) {
                    Some(age) if age > retention_ms => {
                        expired += 1;
                        false
                    }
                    Some(_) => true,
                    None => {
                        malformed += 1;
                        false
                    }
                });
            });

            if malformed > 0 {
                tracing::warn!(%tier, malformed, "evicted entries with unparseable timestamps");
            }
            report.expired += expired;
            report.malformed += malformed;
        }

        report
    }
}

/// Run [`TieredStore::sweep`] every `config.interval()` until `cancel` fires.
///
/// The first sweep happens one full interval after spawning.
pub fn spawn_sweeper(
    store: Arc<TieredStore>,
    config: SweeperConfig,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = config.interval();
        let retention = config.retention();
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = period.as_secs(),
            retention_secs = retention.as_secs(),
            "retention sweeper started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let report = store.sweep(retention);
                    if report.evicted() > 0 {
                        tracing::info!(
                            expired = report.expired,
                            malformed = report.malformed,
                            "sweep evicted entries"
                        );
                    } else {
                        tracing::debug!("sweep found nothing to evict");
                    }
                }
            }
        }

        tracing::info!("retention sweeper stopped");
    })
}
