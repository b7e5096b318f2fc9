//! Race data structure combining all race-specific definitions.

use serde::{Deserialize, Serialize};

use super::entry_data::{ActionEffect, EntryData, EntryKind};
use crate::race::Race;

/// How a worker is tied up when it builds a structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerBuildMode {
    /// The worker is busy for the whole build time.
    Occupied,
    /// The worker is busy for the given travel time in seconds.
    Travel(u32),
    /// The worker becomes the structure.
    Consumed,
}

/// Larva mechanics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LarvaData {
    /// Producer name used by larva-born entries.
    pub name: String,
    /// Natural larva cap per town hall.
    pub max_per_hatchery: u32,
    /// Seconds between natural larva spawns.
    pub spawn_interval: u32,
    /// Larva on a starting town hall.
    #[serde(default)]
    pub starting: u32,
}

/// Race-specific resource tracked in the resource history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialResource {
    /// Ability charges: caster energy divided by the ability cost.
    Energy {
        /// Entity holding the energy.
        caster: String,
        /// Energy per charge.
        cost: u32,
    },
    /// Total larva across town halls.
    Larva,
}

/// Complete race data definition.
///
/// Contains every catalog entry for one race plus the rules for workers,
/// supply and the race-specific resource.
///
/// # Example RON
///
/// ```ron
/// RaceData(
///     race: Terran,
///     worker: "SCV",
///     town_hall: "CommandCenter",
///     supply_structure: "SupplyDepot",
///     geyser_structure: "Refinery",
///     worker_build: Occupied,
///     special: Energy(caster: "OrbitalCommand", cost: 50),
///     entries: [...],
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceData {
    /// Race identifier.
    pub race: Race,

    /// Worker entry name.
    pub worker: String,

    /// Town hall entry name used for starting bases.
    pub town_hall: String,

    /// Default supply structure.
    pub supply_structure: String,

    /// Geyser structure.
    pub geyser_structure: String,

    /// How workers build structures.
    pub worker_build: WorkerBuildMode,

    /// Larva mechanics, if the race uses them.
    #[serde(default)]
    pub larva: Option<LarvaData>,

    /// Race-specific resource.
    pub special: SpecialResource,

    /// Extra entities present at the start besides town halls and workers.
    #[serde(default)]
    pub starting_units: Vec<String>,

    /// Hard supply cap.
    #[serde(default = "default_max_supply")]
    pub max_supply: u32,

    /// All entries of the race.
    pub entries: Vec<EntryData>,
}

const fn default_max_supply() -> u32 {
    200
}

impl RaceData {
    /// Find an entry by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&EntryData> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Get all entries of a kind.
    pub fn entries_of_kind(&self, kind: EntryKind) -> impl Iterator<Item = &EntryData> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }

    /// Name of the larva producer, if any.
    #[must_use]
    pub fn larva_name(&self) -> Option<&str> {
        self.larva.as_ref().map(|l| l.name.as_str())
    }

    /// Whether `name` refers to something that can appear as a producer.
    fn is_known_producer(&self, name: &str) -> bool {
        self.get(name).is_some() || self.larva_name() == Some(name)
    }

    /// Validate internal consistency of race data.
    ///
    /// Checks for:
    /// - Duplicate entry names
    /// - Producers, requirements and shortcut targets that do not exist
    /// - Producible entries without a build time or producer
    /// - Race-level references (worker, town hall, casters)
    ///
    /// Returns a list of validation errors.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let race = self.race;

        for (i, entry) in self.entries.iter().enumerate() {
            if self.entries[..i].iter().any(|e| e.name == entry.name) {
                errors.push(format!("{race}: duplicate entry '{}'", entry.name));
            }

            for producer in &entry.produced_by {
                if !self.is_known_producer(producer) {
                    errors.push(format!(
                        "{race}: '{}' produced by unknown '{producer}'",
                        entry.name
                    ));
                }
            }

            for requirement in &entry.requires {
                if self.get(requirement).is_none() {
                    errors.push(format!(
                        "{race}: '{}' requires unknown '{requirement}'",
                        entry.name
                    ));
                }
            }

            for target in &entry.expands_to {
                match self.get(target) {
                    None => errors.push(format!(
                        "{race}: shortcut '{}' expands to unknown '{target}'",
                        entry.name
                    )),
                    Some(t) if t.is_shortcut() => errors.push(format!(
                        "{race}: shortcut '{}' expands to another shortcut '{target}'",
                        entry.name
                    )),
                    Some(_) => {}
                }
            }

            if entry.is_producible() {
                if entry.build_time == 0 {
                    errors.push(format!("{race}: '{}' has zero build time", entry.name));
                }
                if entry.produced_by.is_empty() {
                    errors.push(format!("{race}: '{}' has no producer", entry.name));
                }
                if (entry.morph || entry.addon.is_some()) && entry.produced_by.len() != 1 {
                    errors.push(format!(
                        "{race}: '{}' must have exactly one producer",
                        entry.name
                    ));
                }
            }

            if let Some(effect) = &entry.effect {
                let caster = match effect {
                    ActionEffect::CallDownMule { caster, .. }
                    | ActionEffect::Chronoboost { caster, .. }
                    | ActionEffect::InjectLarva { caster, .. } => Some(caster),
                    _ => None,
                };
                if let Some(caster) = caster {
                    if self.get(caster).is_none() {
                        errors.push(format!(
                            "{race}: '{}' cast by unknown '{caster}'",
                            entry.name
                        ));
                    }
                }
                if let ActionEffect::Chronoboost { target, .. } = effect {
                    if self.get(target).is_none() {
                        errors.push(format!(
                            "{race}: '{}' boosts unknown '{target}'",
                            entry.name
                        ));
                    }
                }
            }
        }

        for (field, name) in [
            ("worker", &self.worker),
            ("town_hall", &self.town_hall),
            ("supply_structure", &self.supply_structure),
            ("geyser_structure", &self.geyser_structure),
        ] {
            if self.get(name).is_none() {
                errors.push(format!("{race}: {field} '{name}' not found"));
            }
        }

        if let SpecialResource::Energy { caster, cost } = &self.special {
            if self.get(caster).is_none() {
                errors.push(format!("{race}: special resource caster '{caster}' not found"));
            }
            if *cost == 0 {
                errors.push(format!("{race}: special resource cost must be positive"));
            }
        }

        if self.special == SpecialResource::Larva && self.larva.is_none() {
            errors.push(format!("{race}: larva resource without larva data"));
        }

        for unit in &self.starting_units {
            if self.get(unit).is_none() {
                errors.push(format!("{race}: starting unit '{unit}' not found"));
            }
        }

        errors
    }
}
