//! Optimization targets.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::data::RaceData;
use crate::error::PlannerError;
use crate::simulation::BuildOrderRun;

/// What an optimization pass tries to achieve.
///
/// Parsed from strings such as `fastest`, `supply:30` or `count:Marine:4`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// Minimize the terminal frame.
    Fastest,
    /// Minimize the frame the supply cap first rises.
    SupplyCap,
    /// Minimize the first frame supply used reaches the value.
    Supply(u32),
    /// Minimize the frame the `count`-th `name` completes.
    Count {
        /// Catalog entry.
        name: String,
        /// Number of completions.
        count: u32,
    },
    /// Re-place supply structures where the build first gets supply blocked.
    SupplyStructures,
    /// Insert workers as long as the finish is not delayed.
    Workers,
}

impl Target {
    /// Frame this target minimizes, `None` when the run never reaches it.
    ///
    /// Insertion targets score by terminal frame.
    #[must_use]
    pub fn metric(&self, run: &BuildOrderRun) -> Option<u32> {
        if !run.is_valid() {
            return None;
        }
        match self {
            Self::Fastest | Self::SupplyStructures | Self::Workers => Some(run.frame),
            Self::SupplyCap => {
                let initial = run.supply_changes.first()?.cap;
                run.supply_changes
                    .iter()
                    .find(|c| c.cap > initial)
                    .map(|c| c.frame)
            }
            Self::Supply(target) => run
                .supply_changes
                .iter()
                .find(|c| c.used >= *target)
                .map(|c| c.frame),
            Self::Count { name, count } => {
                let nth = usize::try_from(*count).ok()?.checked_sub(1)?;
                run.completions(name).get(nth).copied()
            }
        }
    }

    /// Names of the entries whose actions this target may move.
    ///
    /// `None` means every action may move.
    #[must_use]
    pub fn movable(&self, data: &RaceData) -> Option<BTreeSet<String>> {
        match self {
            Self::Fastest | Self::Workers => None,
            Self::SupplyCap | Self::SupplyStructures => Some(
                data.entries
                    .iter()
                    .filter(|e| e.supply_provided > 0)
                    .map(|e| e.name.clone())
                    .collect(),
            ),
            Self::Supply(_) => Some(
                data.entries
                    .iter()
                    .filter(|e| e.supply > 0 || e.supply_provided > 0)
                    .map(|e| e.name.clone())
                    .collect(),
            ),
            Self::Count { name, .. } => Some(prerequisite_chain(data, name)),
        }
    }

    /// Whether this target may move `action`.
    #[must_use]
    pub fn is_movable(&self, data: &RaceData, action: &Action) -> bool {
        self.movable(data)
            .map_or(true, |names| names.contains(&action.name))
    }
}

/// `name` plus everything it requires or is produced by, transitively.
///
/// Workers and larva only join the chain as `name` itself: as producers
/// they exist from the start.
fn prerequisite_chain(data: &RaceData, name: &str) -> BTreeSet<String> {
    let mut chain = BTreeSet::from([name.to_string()]);
    let mut pending = vec![name.to_string()];
    while let Some(current) = pending.pop() {
        let Some(entry) = data.get(&current) else {
            continue;
        };
        for next in entry.requires.iter().chain(&entry.produced_by) {
            if *next == data.worker || data.larva_name() == Some(next.as_str()) {
                continue;
            }
            if chain.insert(next.clone()) {
                pending.push(next.clone());
            }
        }
    }
    chain
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fastest => f.write_str("fastest"),
            Self::SupplyCap => f.write_str("supply_cap"),
            Self::Supply(n) => write!(f, "supply:{n}"),
            Self::Count { name, count } => write!(f, "count:{name}:{count}"),
            Self::SupplyStructures => f.write_str("supply_structures"),
            Self::Workers => f.write_str("workers"),
        }
    }
}

impl FromStr for Target {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PlannerError::InvalidTarget(s.to_string());
        let parts: Vec<&str> = s.trim().split(':').map(str::trim).collect();
        let target = match parts.as_slice() {
            ["fastest"] => Self::Fastest,
            ["supply_cap"] => Self::SupplyCap,
            ["supply_structures"] => Self::SupplyStructures,
            ["workers"] => Self::Workers,
            ["supply", n] => Self::Supply(n.parse().map_err(|_| invalid())?),
            ["count", name, count] if !name.is_empty() => {
                let count: u32 = count.parse().map_err(|_| invalid())?;
                if count == 0 {
                    return Err(invalid());
                }
                Self::Count {
                    name: (*name).to_string(),
                    count,
                }
            }
            _ => return Err(invalid()),
        };
        Ok(target)
    }
}
