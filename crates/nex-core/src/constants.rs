/// Magnitude at or above which an entry lands in the TOP tier.
pub const TOP_FLOOR: f64 = 400_000_000.0;

/// Magnitude at or above which an entry lands in the HIGH tier.
pub const HIGH_FLOOR: f64 = 10_000_000.0;

/// Lowest accepted magnitude. Anything below is rejected outright.
pub const NORMAL_FLOOR: f64 = 500_000.0;

/// Entries kept per tier unless configured otherwise.
pub const DEFAULT_TIER_CAPACITY: usize = 50;

/// Login and status records kept.
pub const DEFAULT_LOGIN_CAPACITY: usize = 100;

/// Age after which the sweeper evicts an entry (1 hour).
pub const DEFAULT_RETENTION_SECS: u64 = 60 * 60;

/// Period between sweeps (30 minutes).
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 30 * 60;

/// Recency window for autojoin consumers (10 minutes).
pub const DEFAULT_AUTOJOIN_WINDOW_SECS: u64 = 600;

/// Distinct servers returned by the servers view.
pub const DEFAULT_SERVERS_LIMIT: usize = 20;

/// Statuses surfaced in the stats snapshot.
pub const RECENT_STATUS_COUNT: usize = 5;

/// Repeating XOR key applied to job tokens on the notify path.
pub const OBFUSCATION_KEY_HEX: &str = "4a535c82318325579c09e87bf9510f41901a4bd71b5e5944a9bb147189ff938de46de369523aec37c66be06e4e400e925487e49c0bdcb5e0b779bb78b864913168e5ba4678ec7fbdc2a5a763bcc45d7645a28a12fb6ed1de";

/// Default owner when the client does not report one.
pub const UNKNOWN_OWNER: &str = "Unknown";

/// Default occupancy when the client does not report one.
pub const UNKNOWN_OCCUPANCY: &str = "0/0";
