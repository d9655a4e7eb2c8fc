//! Pure building blocks of the nexhub ingestion service.
//!
//! Tier classification, abbreviated value formatting, reversible token
//! obfuscation and validation of ingress payloads into canonical records.
//!
//! Zero I/O: no opinions about transport, storage or logging.

pub mod constants;
pub mod entry;
pub mod error;
pub mod request;
pub mod tier;
pub mod time;
pub mod transform;
pub mod value;

pub use constants::{
    DEFAULT_AUTOJOIN_WINDOW_SECS, DEFAULT_LOGIN_CAPACITY, DEFAULT_RETENTION_SECS,
    DEFAULT_SERVERS_LIMIT, DEFAULT_SWEEP_INTERVAL_SECS, DEFAULT_TIER_CAPACITY, HIGH_FLOOR,
    NORMAL_FLOOR, OBFUSCATION_KEY_HEX, TOP_FLOOR,
};
pub use entry::{Entry, IdentifierForm, LoginRecord, NewEntry, NewLogin, Origin, ServerSummary, UserStatus};
pub use error::ValidationError;
pub use request::{HopperRequest, IngestRequest, LoginRequest, MagnitudeField, NotifyRequest};
pub use tier::{Tier, classify};
pub use transform::{invert, transform};
pub use value::{format_value, parse_value};
