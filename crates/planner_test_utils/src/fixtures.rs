//! Test fixtures and helpers.
//!
//! Pre-built simulators and build orders for consistent testing.

use planner_core::action::Action;
use planner_core::catalog::Catalog;
use planner_core::race::Race;
use planner_core::settings::Settings;
use planner_core::simulation::GameLogic;
use serde::Deserialize;

/// Standard Terran opening: depot, barracks, refinery, expand.
pub const TERRAN_OPENING: &[&str] = &[
    "SCV",
    "SCV",
    "SupplyDepot",
    "SCV",
    "SCV",
    "Barracks",
    "Refinery",
    "SCV",
    "SCV",
    "SCV",
    "CommandCenter",
];

/// Standard Protoss opening: pylon, gateway, gas, cybernetics core.
pub const PROTOSS_OPENING: &[&str] = &[
    "Probe",
    "Probe",
    "Pylon",
    "Probe",
    "Probe",
    "Gateway",
    "Assimilator",
    "Probe",
    "Probe",
    "CyberneticsCore",
];

/// Standard Zerg opening: overlord, pool, hatchery.
pub const ZERG_OPENING: &[&str] = &[
    "Drone",
    "Overlord",
    "Drone",
    "Drone",
    "SpawningPool",
    "Drone",
    "Drone",
    "Hatchery",
];

/// Simulator for a race with the built-in catalog and default settings.
///
/// # Panics
///
/// Panics if the built-in catalog fails to load.
#[must_use]
pub fn logic(race: Race) -> GameLogic {
    let catalog = Catalog::builtin().expect("built-in catalog loads");
    GameLogic::new(catalog, race).expect("built-in catalog has every race")
}

/// Terran simulator with default settings.
#[must_use]
pub fn terran_logic() -> GameLogic {
    logic(Race::Terran)
}

/// Protoss simulator with default settings.
#[must_use]
pub fn protoss_logic() -> GameLogic {
    logic(Race::Protoss)
}

/// Zerg simulator with default settings.
#[must_use]
pub fn zerg_logic() -> GameLogic {
    logic(Race::Zerg)
}

/// Simulator with custom settings.
#[must_use]
pub fn logic_with(race: Race, settings: Settings) -> GameLogic {
    logic(race).with_settings(settings)
}

/// Build an action list from entry names.
///
/// # Panics
///
/// Panics if a name is not in the race's catalog.
#[must_use]
pub fn build_order(logic: &GameLogic, names: &[&str]) -> Vec<Action> {
    logic
        .actions(names)
        .unwrap_or_else(|e| panic!("invalid fixture build order {names:?}: {e}"))
}

/// The standard opening of a race.
#[must_use]
pub fn opening(race: Race) -> &'static [&'static str] {
    match race {
        Race::Terran => TERRAN_OPENING,
        Race::Protoss => PROTOSS_OPENING,
        Race::Zerg => ZERG_OPENING,
    }
}

/// A named build order scenario, as written in RON test data.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Race.
    pub race: Race,
    /// Entry names in order.
    pub actions: Vec<String>,
}

impl Scenario {
    /// Parse a scenario from RON.
    ///
    /// # Panics
    ///
    /// Panics on malformed RON.
    #[must_use]
    pub fn from_ron(source: &str) -> Self {
        ron::from_str(source).unwrap_or_else(|e| panic!("invalid scenario RON: {e}"))
    }

    /// Simulator and action list of this scenario.
    #[must_use]
    pub fn load(&self) -> (GameLogic, Vec<Action>) {
        let logic = logic(self.race);
        let names: Vec<&str> = self.actions.iter().map(String::as_str).collect();
        let actions = build_order(&logic, &names);
        (logic, actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openings_are_valid() {
        for race in Race::ALL {
            let logic = logic(race);
            let actions = build_order(&logic, opening(race));
            let run = logic.simulated_build_order(&actions);
            assert!(run.is_valid(), "{race} opening failed: {:?}", run.error);
        }
    }

    #[test]
    fn test_scenario_from_ron() {
        let scenario = Scenario::from_ron(
            r#"(name: "depot", race: Terran, actions: ["SCV", "SupplyDepot"])"#,
        );
        assert_eq!(scenario.name, "depot");
        let (logic, actions) = scenario.load();
        assert_eq!(logic.race(), Race::Terran);
        assert_eq!(actions.len(), 2);
    }
}
