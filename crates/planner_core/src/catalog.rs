//! The action catalog.
//!
//! Read-only lookup of every producible entry per race. The built-in
//! catalog is embedded at compile time from `data/*.ron`; custom catalogs can
//! be parsed from any RON string.

use std::collections::BTreeMap;

use crate::action::Action;
use crate::data::{EntryData, RaceData};
use crate::error::{PlannerError, Result};
use crate::race::Race;

const TERRAN_RON: &str = include_str!("../data/terran.ron");
const PROTOSS_RON: &str = include_str!("../data/protoss.ron");
const ZERG_RON: &str = include_str!("../data/zerg.ron");

/// Race catalogs keyed by race.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    races: BTreeMap<Race, RaceData>,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the embedded catalog for all races.
    pub fn builtin() -> Result<Self> {
        let mut catalog = Self::new();
        for (path, source) in [
            ("data/terran.ron", TERRAN_RON),
            ("data/protoss.ron", PROTOSS_RON),
            ("data/zerg.ron", ZERG_RON),
        ] {
            catalog.insert(Self::parse_race(path, source)?);
        }
        tracing::debug!(races = catalog.races.len(), "Loaded built-in catalog");
        Ok(catalog)
    }

    /// Parse a single race definition from RON.
    pub fn parse_race(path: &str, source: &str) -> Result<RaceData> {
        ron::from_str(source).map_err(|e| PlannerError::DataParseError {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Build a catalog from RON sources, rejecting data that fails validation.
    pub fn from_ron_sources<'a>(
        sources: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self> {
        let mut catalog = Self::new();
        for (path, source) in sources {
            catalog.insert(Self::parse_race(path, source)?);
        }
        let errors = catalog.validate();
        if errors.is_empty() {
            Ok(catalog)
        } else {
            Err(PlannerError::InvalidCatalog(errors))
        }
    }

    /// Add or replace a race definition.
    pub fn insert(&mut self, data: RaceData) {
        self.races.insert(data.race, data);
    }

    /// Races present in the catalog.
    pub fn races(&self) -> impl Iterator<Item = Race> + '_ {
        self.races.keys().copied()
    }

    /// Get the data of one race.
    pub fn race(&self, race: Race) -> Result<&RaceData> {
        self.races
            .get(&race)
            .ok_or_else(|| PlannerError::UnknownRace(race.to_string()))
    }

    /// Look up an entry by name.
    pub fn entry(&self, race: Race, name: &str) -> Result<&EntryData> {
        self.race(race)?
            .get(name)
            .ok_or_else(|| PlannerError::UnknownAction {
                race: race.to_string(),
                name: name.to_string(),
            })
    }

    /// Create an action for a named entry.
    pub fn action(&self, race: Race, name: &str) -> Result<Action> {
        self.entry(race, name).map(Action::from_entry)
    }

    /// Create actions for a list of names.
    pub fn actions<S: AsRef<str>>(&self, race: Race, names: &[S]) -> Result<Vec<Action>> {
        names
            .iter()
            .map(|name| self.action(race, name.as_ref()))
            .collect()
    }

    /// Validate every race, returning all problems found.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        self.races.values().flat_map(RaceData::validate).collect()
    }
}
