//! In-memory tiered store for nexhub: bounded newest-first history per
//! tier, login feed, counters, retention sweeper and read-side queries.

pub mod config;
pub mod error;
pub mod query;
pub mod ring;
pub mod store;
pub mod sweeper;

pub use config::{QueryConfig, StoreConfig, SweeperConfig};
pub use error::{Result, StoreError};
pub use query::{StatsSnapshot, decode_token};
pub use ring::BoundedLog;
pub use store::{ServerStats, TieredStore};
pub use sweeper::{SweepReport, spawn_sweeper};
