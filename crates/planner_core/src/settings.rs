//! Simulation and optimizer settings.
//!
//! Settings travel as ordered `{name, value}` entries so they can be stored
//! and exchanged without a fixed schema. They are read once into typed
//! structs: unknown names are ignored and missing names keep their default.

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};

/// A setting value as stored in an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// Integer value.
    Number(i64),
    /// Text value.
    Text(String),
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for SettingValue {
    fn from(value: i32) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<u32> for SettingValue {
    fn from(value: u32) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A named setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingEntry {
    /// Setting name.
    #[serde(alias = "n")]
    pub name: String,
    /// Setting value.
    #[serde(alias = "v")]
    pub value: SettingValue,
}

impl SettingEntry {
    /// Create an entry.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<SettingValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Largest worker count a game can start with.
pub const MAX_STARTING_WORKERS: u32 = 200;
/// Largest starting stock of minerals or gas.
pub const MAX_STARTING_RESOURCES: u32 = 1_000_000;
/// Largest number of starting town halls.
pub const MAX_STARTING_BASES: u32 = 20;
/// Longest idle limit, one day of game time.
pub const MAX_IDLE_LIMIT_SECONDS: u32 = 86_400;
/// Largest optimizer tolerance, one day of game time in frames.
pub const MAX_TOLERANCE_FRAMES: u32 = 1_935_360;

fn as_u32(name: &str, value: &SettingValue, max: u32) -> Result<u32> {
    let invalid = |message: String| PlannerError::InvalidSetting {
        name: name.to_string(),
        message,
    };
    let number = match value {
        SettingValue::Number(n) => {
            u32::try_from(*n).map_err(|_| invalid(format!("{n} is out of range")))?
        }
        SettingValue::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| invalid(format!("expected a non-negative number, got '{text}'")))?,
    };
    if number > max {
        return Err(invalid(format!("{number} is above the limit of {max}")));
    }
    Ok(number)
}

fn as_bool(name: &str, value: &SettingValue) -> Result<bool> {
    match value {
        SettingValue::Number(0) => Ok(false),
        SettingValue::Number(1) => Ok(true),
        SettingValue::Text(text) if text.eq_ignore_ascii_case("true") => Ok(true),
        SettingValue::Text(text) if text.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(PlannerError::InvalidSetting {
            name: name.to_string(),
            message: format!("expected 0/1 or true/false, got {other:?}"),
        }),
    }
}

/// Starting conditions and limits of a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Workers mining minerals at frame 0.
    pub starting_workers: u32,
    /// Minerals at frame 0.
    pub starting_minerals: u32,
    /// Gas at frame 0.
    pub starting_gas: u32,
    /// Town halls at frame 0.
    pub starting_bases: u32,
    /// Longest time a single action may wait before the run fails.
    pub idle_limit_seconds: u32,
    /// Mine geysers beyond two per base from afar.
    pub long_distance_gas: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            starting_workers: 12,
            starting_minerals: 50,
            starting_gas: 0,
            starting_bases: 1,
            idle_limit_seconds: 300,
            long_distance_gas: true,
        }
    }
}

impl Settings {
    /// Build settings from entries.
    pub fn from_entries(entries: &[SettingEntry]) -> Result<Self> {
        let mut settings = Self::default();
        for entry in entries {
            settings.set(&entry.name, &entry.value)?;
        }
        Ok(settings)
    }

    /// Apply a single named value. Unknown names are ignored.
    pub fn set(&mut self, name: &str, value: &SettingValue) -> Result<()> {
        match name {
            "starting_workers" => self.starting_workers = as_u32(name, value, MAX_STARTING_WORKERS)?,
            "starting_minerals" => self.starting_minerals = as_u32(name, value, MAX_STARTING_RESOURCES)?,
            "starting_gas" => self.starting_gas = as_u32(name, value, MAX_STARTING_RESOURCES)?,
            "starting_bases" => self.starting_bases = as_u32(name, value, MAX_STARTING_BASES)?,
            "idle_limit_seconds" => self.idle_limit_seconds = as_u32(name, value, MAX_IDLE_LIMIT_SECONDS)?,
            "long_distance_gas" => self.long_distance_gas = as_bool(name, value)?,
            _ => tracing::debug!(name, "Ignoring unknown setting"),
        }
        Ok(())
    }

    /// Copy with every value capped at its limit.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            starting_workers: self.starting_workers.min(MAX_STARTING_WORKERS),
            starting_minerals: self.starting_minerals.min(MAX_STARTING_RESOURCES),
            starting_gas: self.starting_gas.min(MAX_STARTING_RESOURCES),
            starting_bases: self.starting_bases.min(MAX_STARTING_BASES),
            idle_limit_seconds: self.idle_limit_seconds.min(MAX_IDLE_LIMIT_SECONDS),
            long_distance_gas: self.long_distance_gas,
        }
    }

    /// Convert back to entries.
    #[must_use]
    pub fn to_entries(&self) -> Vec<SettingEntry> {
        vec![
            SettingEntry::new("starting_workers", i64::from(self.starting_workers)),
            SettingEntry::new("starting_minerals", i64::from(self.starting_minerals)),
            SettingEntry::new("starting_gas", i64::from(self.starting_gas)),
            SettingEntry::new("starting_bases", i64::from(self.starting_bases)),
            SettingEntry::new("idle_limit_seconds", i64::from(self.idle_limit_seconds)),
            SettingEntry::new("long_distance_gas", i64::from(self.long_distance_gas)),
        ]
    }
}

/// Optimizer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizeSettings {
    /// Frames a candidate may lose against the baseline and still be accepted.
    pub tolerance_frames: u32,
    /// Full passes over the build order per metric target.
    pub max_passes: u32,
    /// Worker count the `workers` target stops at.
    pub max_workers: u32,
    /// Actions a single target may insert.
    pub max_insertions: u32,
}

impl Default for OptimizeSettings {
    fn default() -> Self {
        Self {
            tolerance_frames: 3,
            max_passes: 2,
            max_workers: 70,
            max_insertions: 30,
        }
    }
}

impl OptimizeSettings {
    /// Build optimizer settings from entries.
    pub fn from_entries(entries: &[SettingEntry]) -> Result<Self> {
        let mut settings = Self::default();
        for entry in entries {
            settings.set(&entry.name, &entry.value)?;
        }
        Ok(settings)
    }

    /// Apply a single named value. Unknown names are ignored.
    pub fn set(&mut self, name: &str, value: &SettingValue) -> Result<()> {
        match name {
            "tolerance_frames" => self.tolerance_frames = as_u32(name, value, MAX_TOLERANCE_FRAMES)?,
            "max_passes" => self.max_passes = as_u32(name, value, u32::MAX)?,
            "max_workers" => self.max_workers = as_u32(name, value, u32::MAX)?,
            "max_insertions" => self.max_insertions = as_u32(name, value, u32::MAX)?,
            _ => tracing::debug!(name, "Ignoring unknown optimize setting"),
        }
        Ok(())
    }

    /// Convert back to entries.
    #[must_use]
    pub fn to_entries(&self) -> Vec<SettingEntry> {
        vec![
            SettingEntry::new("tolerance_frames", i64::from(self.tolerance_frames)),
            SettingEntry::new("max_passes", i64::from(self.max_passes)),
            SettingEntry::new("max_workers", i64::from(self.max_workers)),
            SettingEntry::new("max_insertions", i64::from(self.max_insertions)),
        ]
    }
}
