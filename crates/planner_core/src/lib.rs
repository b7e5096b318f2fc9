//! # Planner Core
//!
//! Deterministic build order simulator and optimizer for StarCraft II style
//! real-time strategy games.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO (race catalogs are embedded at compile time)
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! This separation enables:
//! - Byte-identical reruns of the same build order
//! - Search over thousands of candidate build orders
//! - Headless tools and tests
//!
//! ## Crate Structure
//!
//! - [`catalog`] - Race catalogs loaded from RON
//! - [`income`] - Mineral and gas income model
//! - [`simulation`] - Frame-stepped build order simulation
//! - [`timeline`] - Events and resource history of a run
//! - [`optimize`] - Prepone search and optimization targets
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod action;
pub mod catalog;
pub mod data;
pub mod error;
pub mod income;
pub mod math;
pub mod optimize;
pub mod production;
pub mod race;
pub mod settings;
pub mod simulation;
pub mod timeline;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::action::Action;
    pub use crate::catalog::Catalog;
    pub use crate::data::{EntryData, EntryKind, RaceData};
    pub use crate::error::{PlannerError, Result};
    pub use crate::income::{income_minerals, income_vespene, IncomeModel};
    pub use crate::math::{format_clock, seconds_to_frames, Fixed};
    pub use crate::optimize::{
        CancelToken, Constraint, ConstraintKind, EvaluationBudget, OptimizeReport, Optimizer,
        PreponeMode, PreponeOutcome, SearchControl, Target, TargetStatus, Unbounded,
    };
    pub use crate::race::Race;
    pub use crate::settings::{OptimizeSettings, SettingEntry, Settings};
    pub use crate::simulation::{BuildOrderRun, GameLogic, SimulationError, Unsatisfiable};
    pub use crate::timeline::{Event, ResourceHistory};
}
