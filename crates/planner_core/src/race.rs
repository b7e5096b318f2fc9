//! Race identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlannerError;

/// The playable races a build order can be planned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Race {
    /// Terran - SCVs, MULEs and add-ons.
    Terran,
    /// Protoss - probes, warp-ins and chrono boost.
    Protoss,
    /// Zerg - drones, larva and injects.
    Zerg,
}

impl Race {
    /// All races in catalog order.
    pub const ALL: [Self; 3] = [Self::Terran, Self::Protoss, Self::Zerg];

    /// Get the display name for this race.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Terran => "Terran",
            Self::Protoss => "Protoss",
            Self::Zerg => "Zerg",
        }
    }

    /// Lowercase identifier used on the command line and in files.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Terran => "terran",
            Self::Protoss => "protoss",
            Self::Zerg => "zerg",
        }
    }
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Race {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|race| race.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PlannerError::UnknownRace(s.to_string()))
    }
}
