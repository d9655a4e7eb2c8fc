use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{HIGH_FLOOR, NORMAL_FLOOR, TOP_FLOOR};
use crate::error::ValidationError;

/// Value bucket an entry is filed under. Ordered `Normal < High < Top`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Normal,
    High,
    Top,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Normal, Tier::High, Tier::Top];

    /// Classify a magnitude, or `None` when it falls below the NORMAL floor.
    pub fn classify(magnitude: f64) -> Option<Tier> {
        if magnitude >= TOP_FLOOR {
            Some(Tier::Top)
        } else if magnitude >= HIGH_FLOOR {
            Some(Tier::High)
        } else if magnitude >= NORMAL_FLOOR {
            Some(Tier::Normal)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Normal => "NORMAL",
            Tier::High => "HIGH",
            Tier::Top => "TOP",
        }
    }

    /// Stable slot index, used by the store to address per-tier state.
    pub fn index(self) -> usize {
        match self {
            Tier::Normal => 0,
            Tier::High => 1,
            Tier::Top => 2,
        }
    }
}

/// Free-function form of [`Tier::classify`].
pub fn classify(magnitude: f64) -> Option<Tier> {
    Tier::classify(magnitude)
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NORMAL" => Ok(Tier::Normal),
            "HIGH" => Ok(Tier::High),
            "TOP" => Ok(Tier::Top),
            other => Err(ValidationError::InvalidTier(other.to_string())),
        }
    }
}
