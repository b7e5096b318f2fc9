//! Data structures for race catalogs.
//!
//! This module contains pure data structures that define each race's
//! producible entries and mechanics. All structs are designed to be
//! deserialized from RON files.
//!
//! **Note:** This module contains no IO - it only defines data types.
//! The built-in RON files are embedded by [`crate::catalog`].

mod entry_data;
mod race_data;

pub use entry_data::{ActionEffect, AddonKind, EnergyData, EntryData, EntryKind};
pub use race_data::{LarvaData, RaceData, SpecialResource, WorkerBuildMode};
