//! Ingress shapes and their validation into canonical records.
//!
//! Every field is optional at the serde level so that a missing field
//! surfaces as a [`ValidationError`] naming it, not as a generic decode
//! failure. Field aliases accept the payload names older clients send.

use serde::Deserialize;

use crate::constants::{UNKNOWN_OCCUPANCY, UNKNOWN_OWNER};
use crate::entry::{NewEntry, NewLogin, Origin};
use crate::error::ValidationError;
use crate::value::{format_value, parse_value};

/// A magnitude as clients send it: a JSON number or a numeric string.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MagnitudeField {
    Number(f64),
    Text(String),
}

impl MagnitudeField {
    /// Resolve to a finite, non-negative number.
    pub fn resolve(&self) -> Result<f64, ValidationError> {
        let value = match self {
            MagnitudeField::Number(n) => *n,
            MagnitudeField::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                ValidationError::malformed("magnitude", format!("`{s}` is not a number"))
            })?,
        };
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::malformed(
                "magnitude",
                format!("{value} is not a finite non-negative number"),
            ));
        }
        Ok(value)
    }
}

/// `POST /notify`: manual, script and status reports. The job token is
/// obfuscated before storage.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyRequest {
    #[serde(alias = "brainrotName")]
    pub name: Option<String>,
    pub value_per_second: Option<String>,
    #[serde(alias = "valueNum")]
    pub magnitude: Option<MagnitudeField>,
    pub job_id: Option<String>,
    #[serde(alias = "plotOwner")]
    pub owner: Option<String>,
    #[serde(alias = "playersOnline")]
    pub occupancy: Option<String>,
    pub origin: Option<Origin>,
}

/// `POST /hopper`: server-hopper reports. The magnitude may be given
/// directly or only as a display string; the job token stays in clear.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HopperRequest {
    #[serde(alias = "brainrotName")]
    pub name: Option<String>,
    pub job_id: Option<String>,
    #[serde(alias = "valuePerSecond")]
    pub generation: Option<String>,
    #[serde(alias = "valueNum")]
    pub magnitude: Option<MagnitudeField>,
    #[serde(alias = "plotOwner")]
    pub owner: Option<String>,
    #[serde(alias = "playersOnline")]
    pub occupancy: Option<String>,
}

/// One variant per ingress shape.
#[derive(Clone, Debug)]
pub enum IngestRequest {
    Notify(NotifyRequest),
    Hopper(HopperRequest),
}

impl IngestRequest {
    pub fn validate(self) -> Result<NewEntry, ValidationError> {
        match self {
            IngestRequest::Notify(req) => req.validate(),
            IngestRequest::Hopper(req) => req.validate(),
        }
    }
}

impl NotifyRequest {
    pub fn validate(self) -> Result<NewEntry, ValidationError> {
        let name = required("name", self.name)?;
        let job_id = required("jobId", self.job_id)?;
        let magnitude = self
            .magnitude
            .ok_or(ValidationError::MissingField("magnitude"))?
            .resolve()?;

        let origin = self.origin.unwrap_or_default();
        if origin == Origin::Hopper {
            return Err(ValidationError::malformed(
                "origin",
                "hopper reports belong on the hopper route",
            ));
        }

        Ok(NewEntry {
            name,
            value_per_second: present(self.value_per_second)
                .unwrap_or_else(|| per_second(magnitude)),
            magnitude,
            job_id,
            obfuscate: true,
            origin,
            owner: present(self.owner).unwrap_or_else(|| UNKNOWN_OWNER.to_string()),
            occupancy: present(self.occupancy).unwrap_or_else(|| UNKNOWN_OCCUPANCY.to_string()),
        })
    }
}

impl HopperRequest {
    pub fn validate(self) -> Result<NewEntry, ValidationError> {
        let name = required("name", self.name)?;
        let job_id = required("jobId", self.job_id)?;
        let generation = present(self.generation);

        let magnitude = match (self.magnitude, generation.as_deref()) {
            (Some(field), _) => field.resolve()?,
            (None, Some(display)) => {
                let parsed = parse_value(display);
                if parsed <= 0.0 {
                    return Err(ValidationError::malformed(
                        "generation",
                        format!("`{display}` carries no value"),
                    ));
                }
                parsed
            }
            (None, None) => return Err(ValidationError::MissingField("magnitude")),
        };

        Ok(NewEntry {
            name,
            value_per_second: generation.unwrap_or_else(|| per_second(magnitude)),
            magnitude,
            job_id,
            obfuscate: false,
            origin: Origin::Hopper,
            owner: present(self.owner).unwrap_or_else(|| UNKNOWN_OWNER.to_string()),
            occupancy: present(self.occupancy).unwrap_or_else(|| UNKNOWN_OCCUPANCY.to_string()),
        })
    }
}

/// `POST /login`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(alias = "name")]
    pub username: Option<String>,
    pub user_id: Option<serde_json::Value>,
    pub executor: Option<String>,
    pub place_id: Option<serde_json::Value>,
}

impl LoginRequest {
    pub fn validate(self) -> Result<NewLogin, ValidationError> {
        Ok(NewLogin {
            username: required("username", self.username)?,
            user_id: self.user_id.and_then(loose_string).unwrap_or_else(|| "N/A".to_string()),
            executor: present(self.executor).unwrap_or_else(|| "Unknown".to_string()),
            place_id: self.place_id.and_then(loose_string).unwrap_or_else(|| "N/A".to_string()),
        })
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    present(value).ok_or(ValidationError::MissingField(field))
}

/// Empty and whitespace-only strings count as absent.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Ids arrive as numbers from some clients and strings from others.
fn loose_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => present(Some(s)),
        other => Some(other.to_string()),
    }
}

fn per_second(magnitude: f64) -> String {
    format!("{}/s", format_value(magnitude))
}
