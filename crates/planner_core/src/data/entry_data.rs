//! Catalog entry data structures.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a catalog entry, also used as the display category of events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// The race's worker unit.
    Worker,
    /// Any other unit.
    Unit,
    /// A structure, including add-ons and morphs.
    Structure,
    /// A one-time research.
    Upgrade,
    /// A custom action such as moving workers or casting an ability.
    Action,
}

impl EntryKind {
    /// Lowercase name of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Worker => "worker",
            Self::Unit => "unit",
            Self::Structure => "structure",
            Self::Upgrade => "upgrade",
            Self::Action => "action",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Add-on attached to a producing structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddonKind {
    /// Lets the structure train two units at once.
    Reactor,
    /// Unlocks advanced units and research.
    TechLab,
}

/// Energy profile of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyData {
    /// Energy when the entity is created.
    pub start: u32,
    /// Energy cap.
    pub max: u32,
}

/// Behaviour of a custom action.
///
/// Durations are in real seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionEffect {
    /// Move one worker from minerals to gas.
    WorkerToGas,
    /// Move one worker from gas to minerals.
    WorkerToMinerals,
    /// Hold the build order for a number of seconds.
    Wait(u32),
    /// Spend caster energy on a temporary mining unit.
    CallDownMule {
        /// Entity that pays the energy.
        caster: String,
        /// Energy cost.
        energy: u32,
        /// Lifetime of the MULE.
        duration: u32,
    },
    /// Spend caster energy to speed up a busy structure.
    Chronoboost {
        /// Entity that pays the energy.
        caster: String,
        /// Energy cost.
        energy: u32,
        /// Boost duration.
        duration: u32,
        /// Structure that must be busy to be boosted.
        target: String,
    },
    /// Spend caster energy to spawn extra larva on a town hall.
    InjectLarva {
        /// Entity that pays the energy.
        caster: String,
        /// Energy cost.
        energy: u32,
        /// Delay before the larva pop.
        delay: u32,
        /// Larva spawned.
        larva: u32,
    },
}

/// A single producible entry (unit, structure, upgrade or custom action).
///
/// # Example RON
///
/// ```ron
/// EntryData(
///     name: "Barracks",
///     kind: Structure,
///     minerals: 150,
///     build_time: 46,
///     produced_by: ["SCV"],
///     requires: ["SupplyDepot"],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryData {
    /// Unique name within its race, used by build orders.
    pub name: String,

    /// Entry category.
    pub kind: EntryKind,

    /// Human readable name if it differs from `name`.
    #[serde(default)]
    pub display_name: Option<String>,

    /// Mineral cost.
    #[serde(default)]
    pub minerals: u32,

    /// Gas cost.
    #[serde(default)]
    pub gas: u32,

    /// Supply used while alive.
    #[serde(default)]
    pub supply: u32,

    /// Supply cap granted on completion.
    #[serde(default)]
    pub supply_provided: u32,

    /// Build time in real seconds.
    #[serde(default)]
    pub build_time: u32,

    /// Names of entities able to produce this entry.
    #[serde(default)]
    pub produced_by: Vec<String>,

    /// Entries that must be completed first.
    #[serde(default)]
    pub requires: Vec<String>,

    /// Counts as a base for income and spawns larva.
    #[serde(default)]
    pub town_hall: bool,

    /// Opens a geyser for gas mining.
    #[serde(default)]
    pub geyser: bool,

    /// Transforms its producer instead of creating a new entity.
    #[serde(default)]
    pub morph: bool,

    /// Add-on attached to the producer on completion.
    #[serde(default)]
    pub addon: Option<AddonKind>,

    /// Producer must carry a tech lab.
    #[serde(default)]
    pub needs_techlab: bool,

    /// Energy profile of the created entity.
    #[serde(default)]
    pub energy: Option<EnergyData>,

    /// Custom-action behaviour.
    #[serde(default)]
    pub effect: Option<ActionEffect>,

    /// Entries this shortcut expands to when inserted.
    #[serde(default)]
    pub expands_to: Vec<String>,

    /// Icon reference for timeline rendering.
    #[serde(default)]
    pub icon: Option<String>,
}

impl EntryData {
    /// Create a bare entry; the remaining fields are set with the builder methods.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            display_name: None,
            minerals: 0,
            gas: 0,
            supply: 0,
            supply_provided: 0,
            build_time: 0,
            produced_by: Vec::new(),
            requires: Vec::new(),
            town_hall: false,
            geyser: false,
            morph: false,
            addon: None,
            needs_techlab: false,
            energy: None,
            effect: None,
            expands_to: Vec::new(),
            icon: None,
        }
    }

    /// Set the resource cost.
    #[must_use]
    pub fn with_cost(mut self, minerals: u32, gas: u32) -> Self {
        self.minerals = minerals;
        self.gas = gas;
        self
    }

    /// Set the build time in seconds.
    #[must_use]
    pub fn with_build_time(mut self, seconds: u32) -> Self {
        self.build_time = seconds;
        self
    }

    /// Set the producers.
    #[must_use]
    pub fn with_producers(mut self, producers: &[&str]) -> Self {
        self.produced_by = producers.iter().map(ToString::to_string).collect();
        self
    }

    /// Set the requirements.
    #[must_use]
    pub fn with_requires(mut self, requires: &[&str]) -> Self {
        self.requires = requires.iter().map(ToString::to_string).collect();
        self
    }

    /// Name shown to users.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Icon reference, falling back to the entry name.
    #[must_use]
    pub fn image_ref(&self) -> &str {
        self.icon.as_deref().unwrap_or(&self.name)
    }

    /// Whether this entry is only a shortcut for other entries.
    #[must_use]
    pub fn is_shortcut(&self) -> bool {
        !self.expands_to.is_empty()
    }

    /// Whether building this entry goes through the production system.
    #[must_use]
    pub fn is_producible(&self) -> bool {
        self.effect.is_none() && !self.is_shortcut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_defaults_from_ron() {
        let entry: EntryData =
            ron::from_str(r#"(name: "Pylon", kind: Structure, minerals: 100, supply_provided: 8)"#)
                .unwrap();
        assert_eq!(entry.minerals, 100);
        assert_eq!(entry.gas, 0);
        assert_eq!(entry.supply_provided, 8);
        assert!(entry.produced_by.is_empty());
        assert!(entry.is_producible());
        assert_eq!(entry.label(), "Pylon");
        assert_eq!(entry.image_ref(), "Pylon");
    }

    #[test]
    fn test_effect_from_ron() {
        let entry: EntryData = ron::from_str(
            r#"(
                name: "call_down_mule",
                kind: Action,
                display_name: Some("Call down MULE"),
                effect: Some(CallDownMule(caster: "OrbitalCommand", energy: 50, duration: 64)),
            )"#,
        )
        .unwrap();
        assert!(!entry.is_producible());
        assert_eq!(entry.label(), "Call down MULE");
        assert!(matches!(
            entry.effect,
            Some(ActionEffect::CallDownMule { energy: 50, .. })
        ));
    }

    #[test]
    fn test_shortcut_is_not_producible() {
        let mut entry = EntryData::new("3worker_to_gas", EntryKind::Action);
        entry.expands_to = vec!["worker_to_gas".to_string(); 3];
        assert!(entry.is_shortcut());
        assert!(!entry.is_producible());
    }
}
