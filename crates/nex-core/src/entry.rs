use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::tier::Tier;
use crate::time::parse_iso8601;

/// Where an entry came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    #[default]
    Manual,
    Hopper,
    Script,
    Status,
}

/// Whether an entry's identifier is stored as sent or XOR-obfuscated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierForm {
    Clear,
    Obfuscated,
}

/// One observed item as retained by the store. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    pub name: String,
    pub value_per_second: String,
    pub magnitude: f64,
    pub tier: Tier,
    pub identifier: String,
    pub identifier_form: IdentifierForm,
    pub origin: Origin,
    pub owner: String,
    pub occupancy: String,
    pub timestamp: String,
}

impl Entry {
    /// Age relative to `now_millis`, or `None` when the timestamp does not
    /// parse. Timestamps in the future count as age zero.
    pub fn age_millis(&self, now_millis: u64) -> Option<u64> {
        parse_iso8601(&self.timestamp).map(|ts| now_millis.saturating_sub(ts))
    }

    pub fn summary(&self) -> ServerSummary {
        ServerSummary {
            identifier: self.identifier.clone(),
            name: self.name.clone(),
            value_per_second: self.value_per_second.clone(),
            magnitude: self.magnitude,
            owner: self.owner.clone(),
            occupancy: self.occupancy.clone(),
            origin: self.origin,
        }
    }
}

/// Validated ingestion input, ready for the store to stamp and file.
#[derive(Clone, Debug, PartialEq)]
pub struct NewEntry {
    pub name: String,
    pub value_per_second: String,
    pub magnitude: f64,
    pub job_id: String,
    /// Obfuscate `job_id` before storing it.
    pub obfuscate: bool,
    pub origin: Origin,
    pub owner: String,
    pub occupancy: String,
}

impl NewEntry {
    pub fn tier(&self) -> Result<Tier, ValidationError> {
        Tier::classify(self.magnitude).ok_or(ValidationError::BelowFloor(self.magnitude))
    }
}

/// Narrow projection served by the unique-servers view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSummary {
    pub identifier: String,
    pub name: String,
    pub value_per_second: String,
    pub magnitude: f64,
    pub owner: String,
    pub occupancy: String,
    pub origin: Origin,
}

/// A client check-in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRecord {
    pub username: String,
    pub user_id: String,
    pub executor: String,
    pub place_id: String,
    pub timestamp: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewLogin {
    pub username: String,
    pub user_id: String,
    pub executor: String,
    pub place_id: String,
}

/// Last-seen marker recorded alongside each login.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatus {
    pub username: String,
    pub last_seen: String,
    pub online: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_entry(timestamp: &str) -> Entry {
        Entry {
            id: "1-0".to_string(),
            name: "Thing".to_string(),
            value_per_second: "1.0M/s".to_string(),
            magnitude: 1_000_000.0,
            tier: Tier::Normal,
            identifier: "J1".to_string(),
            identifier_form: IdentifierForm::Clear,
            origin: Origin::Manual,
            owner: "someone".to_string(),
            occupancy: "3/8".to_string(),
            timestamp: timestamp.to_string(),
        }
    }

    #[test]
    fn test_age_millis() {
        let e = make_entry("1970-01-01T00:00:10.000Z");
        assert_eq!(e.age_millis(15_000), Some(5_000));
        // Future timestamps clamp to zero
        assert_eq!(e.age_millis(1_000), Some(0));
    }

    #[test]
    fn test_age_unparseable() {
        let e = make_entry("not a time");
        assert_eq!(e.age_millis(15_000), None);
    }

    #[test]
    fn test_summary_projection() {
        let e = make_entry("1970-01-01T00:00:10.000Z");
        let s = e.summary();
        assert_eq!(s.identifier, "J1");
        assert_eq!(s.occupancy, "3/8");
        assert_eq!(s.origin, Origin::Manual);
    }

    #[test]
    fn test_entry_json_is_camel_case() {
        let e = make_entry("1970-01-01T00:00:10.000Z");
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["valuePerSecond"], "1.0M/s");
        assert_eq!(json["identifierForm"], "clear");
        assert_eq!(json["tier"], "NORMAL");
        assert_eq!(json["origin"], "manual");
    }

    #[test]
    fn test_new_entry_tier() {
        let mut n = NewEntry {
            name: "x".to_string(),
            value_per_second: String::new(),
            magnitude: 499_999.0,
            job_id: "j".to_string(),
            obfuscate: false,
            origin: Origin::Manual,
            owner: String::new(),
            occupancy: String::new(),
        };
        assert_eq!(n.tier(), Err(ValidationError::BelowFloor(499_999.0)));
        n.magnitude = 400_000_000.0;
        assert_eq!(n.tier(), Ok(Tier::Top));
    }
}
