//! Build order files.
//!
//! A build order file is RON:
//!
//! ```ron
//! (
//!     race: Terran,
//!     settings: [(name: "starting_minerals", value: 50)],
//!     optimize_settings: [(name: "tolerance_frames", value: 5)],
//!     actions: ["SCV", "SCV", "SupplyDepot", "Barracks"],
//! )
//! ```

use std::path::Path;

use planner_core::action::Action;
use planner_core::catalog::Catalog;
use planner_core::race::Race;
use planner_core::settings::{OptimizeSettings, SettingEntry, Settings};
use planner_core::simulation::GameLogic;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolError};

/// A build order as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildOrderFile {
    /// Race the build order is for.
    pub race: Race,
    /// Simulation settings, in order.
    #[serde(default)]
    pub settings: Vec<SettingEntry>,
    /// Optimizer settings, in order.
    #[serde(default)]
    pub optimize_settings: Vec<SettingEntry>,
    /// Entry names in order.
    pub actions: Vec<String>,
}

impl BuildOrderFile {
    /// Parse a build order from RON text. `path` is only used in errors.
    pub fn parse(path: &str, source: &str) -> Result<Self> {
        ron::from_str(source).map_err(|e| ToolError::BuildOrderFile {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Read and parse a build order file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| ToolError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&path.display().to_string(), &source)
    }

    /// Simulator for this file's race and settings.
    pub fn logic(&self, catalog: Catalog) -> Result<GameLogic> {
        let settings = Settings::from_entries(&self.settings)?;
        let optimize_settings = OptimizeSettings::from_entries(&self.optimize_settings)?;
        Ok(GameLogic::new(catalog, self.race)?
            .with_settings(settings)
            .with_optimize_settings(optimize_settings))
    }

    /// The action list, resolved against the simulator's catalog.
    pub fn actions(&self, logic: &GameLogic) -> Result<Vec<Action>> {
        Ok(logic.actions(&self.actions)?)
    }
}
