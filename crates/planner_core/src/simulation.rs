//! Frame-stepped build order simulation.
//!
//! [`GameLogic`] replays an ordered list of actions from a fresh starting
//! state and returns a [`BuildOrderRun`]: the event timeline, the per-frame
//! resource history, the terminal frame and an error flag.
//!
//! Each action is committed as soon as its requirements, producer, supply
//! and resources allow. While it waits, time advances one frame at a time
//! and every frame writes a resource sample. After the last action the
//! simulation keeps running until all production has finished.
//!
//! # Determinism
//!
//! All operations in this module are fully deterministic:
//! - No floating-point math (uses fixed-point via [`Fixed`])
//! - Consistent iteration order (entities are stored in creation order)
//! - Every run starts from a fresh state
//! - Same inputs always produce byte-identical runs
//!
//! # Example
//!
//! ```
//! use planner_core::catalog::Catalog;
//! use planner_core::race::Race;
//! use planner_core::simulation::GameLogic;
//!
//! let logic = GameLogic::new(Catalog::builtin()?, Race::Terran)?;
//! let actions = logic.actions(&["SCV", "SCV", "SupplyDepot"])?;
//! let run = logic.simulated_build_order(&actions);
//!
//! assert!(run.is_valid());
//! assert_eq!(run.events.len(), 3);
//! # Ok::<(), planner_core::error::PlannerError>(())
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::action::Action;
use crate::catalog::Catalog;
use crate::data::{
    ActionEffect, AddonKind, EntryData, EntryKind, RaceData, SpecialResource, WorkerBuildMode,
};
use crate::error::{PlannerError, Result};
use crate::income::IncomeModel;
use crate::math::{format_clock, per_frame, ratio, seconds_to_frames, Fixed};
use crate::production::{ProducerRef, ProductionItem, ProductionQueue};
use crate::race::Race;
use crate::settings::{OptimizeSettings, Settings};
use crate::timeline::{Event, ResourceHistory, ResourceSample, SupplyChange};

/// Upper bound on actions `add_item_to_bo` inserts to make an item executable.
pub const MAX_AUTO_INSERTIONS: usize = 8;

/// Energy regenerated per frame (0.7875 per second).
#[must_use]
pub fn energy_regen_per_frame() -> Fixed {
    ratio(9, 256)
}

/// Why an action can never be executed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum Unsatisfiable {
    /// The name is not in this race's catalog.
    #[error("not in the catalog")]
    UnknownAction,
    /// A shortcut was placed in a build order without being expanded.
    #[error("is a shortcut and must be inserted with add_item_to_bo")]
    UnexpandedShortcut,
    /// A required entry is neither finished nor in production.
    #[error("requires {0}")]
    MissingRequirement(String),
    /// No producer exists or is being made.
    #[error("no {0} to produce it")]
    MissingProducer(String),
    /// No producer carries a tech lab.
    #[error("no {0} with a tech lab")]
    MissingTechLab(String),
    /// Not enough supply and none in production.
    #[error("supply blocked")]
    SupplyBlocked,
    /// Would exceed the hard supply cap.
    #[error("supply capped")]
    SupplyCapped,
    /// Not enough resources and no income of that resource.
    #[error("cannot be afforded")]
    Unaffordable,
    /// No entity able to cast the ability.
    #[error("no {0} to cast it")]
    NoCaster(String),
    /// No busy structure to boost.
    #[error("no busy {0} to boost")]
    NothingToBoost(String),
    /// Every geyser already has three workers.
    #[error("gas is saturated")]
    GasSaturated,
    /// No worker is mining gas.
    #[error("no workers on gas")]
    NoGasWorkers,
    /// The upgrade is finished or in progress.
    #[error("already researched")]
    AlreadyResearched,
    /// The action waited longer than the idle limit.
    #[error("waited longer than the idle limit")]
    IdleLimit,
}

/// The action that halted a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[error("{name} (#{action_index}) cannot be executed at frame {frame}: {reason}")]
pub struct SimulationError {
    /// Index of the failing action.
    pub action_index: usize,
    /// Name of the failing action.
    pub name: String,
    /// Frame the run stopped.
    pub frame: u32,
    /// Why it failed.
    pub reason: Unsatisfiable,
}

/// Result of simulating a build order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildOrderRun {
    /// Race the build order was simulated for.
    pub race: Race,
    /// The simulated actions.
    pub actions: Vec<Action>,
    /// One event per committed action, in action order.
    pub events: Vec<Event>,
    /// Per-frame resource history.
    pub history: ResourceHistory,
    /// Changes of supply used and supply cap, starting at frame 0.
    pub supply_changes: Vec<SupplyChange>,
    /// Terminal frame.
    pub frame: u32,
    /// Set when an action could not be executed.
    pub error: Option<SimulationError>,
}

impl BuildOrderRun {
    /// Whether every action was executed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Event of the action at `index`.
    #[must_use]
    pub fn event_for_action(&self, index: usize) -> Option<&Event> {
        self.events.get(index).filter(|e| e.id == index)
    }

    /// Start frame of the action at `index`.
    #[must_use]
    pub fn start_of(&self, index: usize) -> Option<u32> {
        self.event_for_action(index).map(|e| e.start)
    }

    /// Completion frames of every finished `name`, in completion order.
    #[must_use]
    pub fn completions(&self, name: &str) -> Vec<u32> {
        let mut ends: Vec<u32> = self
            .events
            .iter()
            .filter(|e| e.name == name)
            .filter_map(|e| e.end)
            .collect();
        ends.sort_unstable();
        ends
    }

    /// Game clock of the terminal frame.
    #[must_use]
    pub fn clock(&self) -> String {
        format_clock(self.frame)
    }

    /// Encode the run with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| PlannerError::Serialization(e.to_string()))
    }

    /// Decode a run encoded with [`Self::to_bytes`].
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data).map_err(|e| PlannerError::Serialization(e.to_string()))
    }

    /// Hash of the whole run, for cheap determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// Result of [`GameLogic::add_item_to_bo`].
#[derive(Debug, Clone)]
pub struct Insertion {
    /// The new build order.
    pub actions: Vec<Action>,
    /// Its simulation.
    pub run: BuildOrderRun,
    /// Number of actions inserted.
    pub inserted: usize,
}

/// Build order simulator for one race.
#[derive(Debug, Clone)]
pub struct GameLogic {
    catalog: Catalog,
    data: RaceData,
    settings: Settings,
    optimize_settings: OptimizeSettings,
}

impl GameLogic {
    /// Create a simulator with default settings.
    pub fn new(catalog: Catalog, race: Race) -> Result<Self> {
        let data = catalog.race(race)?.clone();
        Ok(Self {
            catalog,
            data,
            settings: Settings::default(),
            optimize_settings: OptimizeSettings::default(),
        })
    }

    /// Replace the simulation settings.
    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Replace the optimizer settings.
    #[must_use]
    pub fn with_optimize_settings(mut self, optimize_settings: OptimizeSettings) -> Self {
        self.optimize_settings = optimize_settings;
        self
    }

    /// The catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The simulated race.
    #[must_use]
    pub fn race(&self) -> Race {
        self.data.race
    }

    /// Catalog data of the simulated race.
    #[must_use]
    pub fn data(&self) -> &RaceData {
        &self.data
    }

    /// Simulation settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Optimizer settings.
    #[must_use]
    pub fn optimize_settings(&self) -> &OptimizeSettings {
        &self.optimize_settings
    }

    /// Create an action for a catalog entry of this race.
    pub fn action(&self, name: &str) -> Result<Action> {
        self.catalog.action(self.race(), name)
    }

    /// Create actions for a list of names.
    pub fn actions<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Action>> {
        self.catalog.actions(self.race(), names)
    }

    /// Fresh starting state at frame 0.
    #[must_use]
    pub fn set_start(&self) -> GameState<'_> {
        GameState::new(&self.data, self.settings)
    }

    /// Simulate a build order from a fresh state.
    #[must_use]
    pub fn simulated_build_order(&self, actions: &[Action]) -> BuildOrderRun {
        self.set_start().run_until_end(actions)
    }

    /// Insert `item` at `at` and simulate the result.
    ///
    /// Shortcuts expand to their target actions. When an inserted action then
    /// fails for a missing requirement, a missing producer or a supply block,
    /// the missing entry is inserted in front of it, up to
    /// [`MAX_AUTO_INSERTIONS`] times.
    pub fn add_item_to_bo(&self, actions: &[Action], item: &str, at: usize) -> Result<Insertion> {
        let entry = self.catalog.entry(self.race(), item)?;
        let derived = if entry.is_shortcut() {
            self.actions(&entry.expands_to)?
        } else {
            vec![Action::from_entry(entry)]
        };

        let at = at.min(actions.len());
        let mut list = actions[..at].to_vec();
        list.extend(derived.iter().cloned());
        list.extend_from_slice(&actions[at..]);
        let mut inserted = derived.len();
        let mut run = self.simulated_build_order(&list);

        for _ in 0..MAX_AUTO_INSERTIONS {
            let Some(error) = &run.error else {
                break;
            };
            if error.action_index < at || error.action_index >= at + inserted {
                break;
            }
            let Some(fix) = self.fix_for(&error.reason) else {
                break;
            };
            tracing::debug!(
                item,
                fix = %fix.name,
                reason = %error.reason,
                "Inserting missing entry"
            );
            list.insert(error.action_index, fix);
            inserted += 1;
            run = self.simulated_build_order(&list);
        }

        Ok(Insertion {
            actions: list,
            run,
            inserted,
        })
    }

    /// Entry that resolves an unsatisfiable reason, if there is one.
    fn fix_for(&self, reason: &Unsatisfiable) -> Option<Action> {
        let entry = match reason {
            Unsatisfiable::MissingRequirement(name) | Unsatisfiable::MissingProducer(name) => {
                self.data.get(name)
            }
            Unsatisfiable::MissingTechLab(producer) => self.data.entries.iter().find(|e| {
                e.addon == Some(AddonKind::TechLab) && e.produced_by.iter().any(|p| p == producer)
            }),
            Unsatisfiable::SupplyBlocked => self.data.get(&self.data.supply_structure),
            _ => None,
        }?;
        entry.is_producible().then(|| Action::from_entry(entry))
    }
}

/// A structure or unit tracked by the simulation.
#[derive(Debug, Clone)]
struct Entity {
    name: String,
    former_names: Vec<String>,
    queue: ProductionQueue,
    addon: Option<AddonKind>,
    energy: Fixed,
    max_energy: Fixed,
    town_hall: bool,
    larva: u32,
    larva_timer: u32,
    inject: Option<(u32, u32)>,
    chrono_until: u32,
}

impl Entity {
    fn is(&self, name: &str) -> bool {
        self.name == name || self.former_names.iter().any(|n| n == name)
    }

    fn has_energy(&self, amount: u32) -> bool {
        self.energy >= Fixed::from_num(amount)
    }
}

/// How a ready action will be executed.
#[derive(Debug, Clone, Copy)]
enum Plan {
    Entity(usize),
    Worker,
    Larva(usize),
    WorkerToGas,
    WorkerToMinerals,
    Wait(u32),
    Mule { caster: usize },
    Chrono { caster: usize, target: usize },
    Inject { caster: usize, hall: usize },
}

/// Outcome of one readiness check.
#[derive(Debug, Clone)]
enum Gate<T> {
    Open(T),
    Wait,
    Closed(Unsatisfiable),
}

impl<T> Gate<T> {
    fn reason(&self) -> Option<&Unsatisfiable> {
        match self {
            Self::Closed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Mutable state of one simulation run.
///
/// Created by [`GameLogic::set_start`] and consumed by
/// [`GameState::run_until_end`].
#[derive(Debug, Clone)]
pub struct GameState<'a> {
    data: &'a RaceData,
    settings: Settings,
    income: IncomeModel,
    frame: u32,
    minerals: Fixed,
    vespene: Fixed,
    supply_used: u32,
    supply_provided: u32,
    workers_minerals: u32,
    workers_gas: u32,
    bases: u32,
    geysers: u32,
    entities: Vec<Entity>,
    construction: ProductionQueue,
    mules: Vec<u32>,
    returning_workers: Vec<u32>,
    blocked_until: u32,
    researched: BTreeSet<String>,
    events: Vec<Event>,
    history: ResourceHistory,
    supply_changes: Vec<SupplyChange>,
    error: Option<SimulationError>,
}

impl<'a> GameState<'a> {
    fn new(data: &'a RaceData, settings: Settings) -> Self {
        let settings = settings.clamped();
        let mut state = Self {
            data,
            settings,
            income: IncomeModel::new(settings.long_distance_gas),
            frame: 0,
            minerals: Fixed::saturating_from_num(settings.starting_minerals),
            vespene: Fixed::saturating_from_num(settings.starting_gas),
            supply_used: 0,
            supply_provided: 0,
            workers_minerals: settings.starting_workers,
            workers_gas: 0,
            bases: 0,
            geysers: 0,
            entities: Vec::new(),
            construction: ProductionQueue::unbounded(),
            mules: Vec::new(),
            returning_workers: Vec::new(),
            blocked_until: 0,
            researched: BTreeSet::new(),
            events: Vec::new(),
            history: ResourceHistory::default(),
            supply_changes: Vec::new(),
            error: None,
        };

        let worker_supply = data.get(&data.worker).map_or(1, |w| w.supply);
        state.supply_used = settings.starting_workers.saturating_mul(worker_supply);

        if let Some(hall) = data.get(&data.town_hall) {
            let starting_larva = data.larva.as_ref().map_or(0, |l| l.starting);
            for _ in 0..settings.starting_bases {
                if let Some(index) = state.add_entity(hall) {
                    state.entities[index].larva = starting_larva;
                }
            }
        }
        for name in &data.starting_units {
            if let Some(entry) = data.get(name) {
                state.add_entity(entry);
            }
        }

        state.record_supply(0);
        state
    }

    /// Current frame.
    #[must_use]
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Minerals banked.
    #[must_use]
    pub fn minerals(&self) -> Fixed {
        self.minerals
    }

    /// Gas banked.
    #[must_use]
    pub fn vespene(&self) -> Fixed {
        self.vespene
    }

    /// Supply in use.
    #[must_use]
    pub fn supply_used(&self) -> u32 {
        self.supply_used
    }

    /// Supply cap, limited by the race maximum.
    #[must_use]
    pub fn supply_cap(&self) -> u32 {
        self.supply_provided.min(self.data.max_supply)
    }

    /// Workers mining minerals.
    #[must_use]
    pub fn workers_on_minerals(&self) -> u32 {
        self.workers_minerals
    }

    /// Workers mining gas.
    #[must_use]
    pub fn workers_on_gas(&self) -> u32 {
        self.workers_gas
    }

    /// Town halls counted for income.
    #[must_use]
    pub fn bases(&self) -> u32 {
        self.bases
    }

    /// Number of finished entities with the given name.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.entities.iter().filter(|e| e.name == name).count()
    }

    /// Events committed so far.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Resource history so far.
    #[must_use]
    pub fn history(&self) -> &ResourceHistory {
        &self.history
    }

    /// Commit every action in order, then advance until all production is done.
    ///
    /// Stops at the first action that can never be executed and records it
    /// as the run's error.
    #[must_use]
    pub fn run_until_end(mut self, actions: &[Action]) -> BuildOrderRun {
        for (index, action) in actions.iter().enumerate() {
            if let Err(reason) = self.execute(index, action) {
                tracing::debug!(
                    index,
                    action = %action.name,
                    frame = self.frame,
                    %reason,
                    "Build order halted"
                );
                self.error = Some(SimulationError {
                    action_index: index,
                    name: action.name.clone(),
                    frame: self.frame,
                    reason,
                });
                break;
            }
        }

        if self.error.is_none() {
            while self.has_pending_work() {
                self.advance();
            }
        }

        BuildOrderRun {
            race: self.data.race,
            actions: actions.to_vec(),
            events: self.events,
            history: self.history,
            supply_changes: self.supply_changes,
            frame: self.frame,
            error: self.error,
        }
    }

    /// Wait until the action can be committed, then commit it.
    pub fn execute(&mut self, index: usize, action: &Action) -> std::result::Result<(), Unsatisfiable> {
        let data = self.data;
        let entry = data.get(&action.name).ok_or(Unsatisfiable::UnknownAction)?;
        let idle_limit = seconds_to_frames(self.settings.idle_limit_seconds);
        let waiting_since = self.frame;

        loop {
            match self.check(entry) {
                Gate::Open(plan) => {
                    self.commit(index, entry, plan);
                    return Ok(());
                }
                Gate::Wait => {
                    if self.frame - waiting_since >= idle_limit {
                        return Err(Unsatisfiable::IdleLimit);
                    }
                    self.advance();
                }
                Gate::Closed(reason) => return Err(reason),
            }
        }
    }

    fn has_pending_work(&self) -> bool {
        self.frame < self.blocked_until
            || !self.construction.is_empty()
            || self.entities.iter().any(|e| !e.queue.is_empty())
    }

    // ------------------------------------------------------------------
    // Readiness checks
    // ------------------------------------------------------------------

    fn check(&self, entry: &'a EntryData) -> Gate<Plan> {
        if self.frame < self.blocked_until {
            return Gate::Wait;
        }
        if entry.is_shortcut() {
            return Gate::Closed(Unsatisfiable::UnexpandedShortcut);
        }
        if entry.kind == EntryKind::Upgrade
            && (self.researched.contains(&entry.name) || self.in_production(&entry.name))
        {
            return Gate::Closed(Unsatisfiable::AlreadyResearched);
        }

        let requirements = self.requirements_gate(entry);
        let producer = self.producer_gate(entry);
        let supply = self.supply_gate(entry);
        let resources = self.resources_gate(entry);

        if let Some(reason) = requirements
            .reason()
            .or(producer.reason())
            .or(supply.reason())
            .or(resources.reason())
        {
            return Gate::Closed(reason.clone());
        }

        match (requirements, producer, supply, resources) {
            (Gate::Open(()), Gate::Open(plan), Gate::Open(()), Gate::Open(())) => Gate::Open(plan),
            _ => Gate::Wait,
        }
    }

    fn requirements_gate(&self, entry: &EntryData) -> Gate<()> {
        for requirement in &entry.requires {
            if self.has_finished(requirement) {
                continue;
            }
            if self.in_production(requirement) {
                return Gate::Wait;
            }
            return Gate::Closed(Unsatisfiable::MissingRequirement(requirement.clone()));
        }
        Gate::Open(())
    }

    fn producer_gate(&self, entry: &EntryData) -> Gate<Plan> {
        if let Some(effect) = &entry.effect {
            return self.effect_gate(effect);
        }

        let data = self.data;
        if entry.produced_by.iter().any(|p| *p == data.worker) {
            return if self.workers_minerals > 0 {
                Gate::Open(Plan::Worker)
            } else if self.workers_incoming() {
                Gate::Wait
            } else {
                Gate::Closed(Unsatisfiable::MissingProducer(data.worker.clone()))
            };
        }

        if let Some(larva) = data.larva_name() {
            if entry.produced_by.iter().any(|p| p == larva) {
                return if let Some(hall) = self.entities.iter().position(|e| e.larva > 0) {
                    Gate::Open(Plan::Larva(hall))
                } else if self.entities.iter().any(|e| e.town_hall) {
                    Gate::Wait
                } else {
                    Gate::Closed(Unsatisfiable::MissingProducer(larva.to_string()))
                };
            }
        }

        let exclusive = entry.morph || entry.addon.is_some();
        let suitable = |e: &Entity| {
            entry.produced_by.iter().any(|p| *p == e.name)
                && (!entry.needs_techlab || e.addon == Some(AddonKind::TechLab))
                && (entry.addon.is_none() || e.addon.is_none())
        };
        let free = |e: &Entity| {
            if exclusive {
                e.queue.is_empty()
            } else {
                !e.queue.is_full()
            }
        };

        if let Some(index) = self.entities.iter().position(|e| suitable(e) && free(e)) {
            return Gate::Open(Plan::Entity(index));
        }
        if self.entities.iter().any(suitable) {
            return Gate::Wait;
        }
        if entry.produced_by.iter().any(|p| self.in_production(p)) {
            return Gate::Wait;
        }

        let candidates: Vec<&Entity> = self
            .entities
            .iter()
            .filter(|e| entry.produced_by.iter().any(|p| *p == e.name))
            .collect();
        if entry.needs_techlab && !candidates.is_empty() {
            let techlab_coming = candidates.iter().any(|e| {
                e.queue.iter().any(|item| {
                    data.get(&item.entry)
                        .is_some_and(|i| i.addon == Some(AddonKind::TechLab))
                })
            });
            return if techlab_coming {
                Gate::Wait
            } else {
                Gate::Closed(Unsatisfiable::MissingTechLab(candidates[0].name.clone()))
            };
        }

        let producer = entry.produced_by.first().cloned().unwrap_or_default();
        Gate::Closed(Unsatisfiable::MissingProducer(producer))
    }

    fn effect_gate(&self, effect: &ActionEffect) -> Gate<Plan> {
        match effect {
            ActionEffect::WorkerToGas => {
                if self.workers_gas >= self.geysers * crate::income::WORKERS_PER_GEYSER {
                    if self.in_production(&self.data.geyser_structure) {
                        Gate::Wait
                    } else {
                        Gate::Closed(Unsatisfiable::GasSaturated)
                    }
                } else if self.workers_minerals > 0 {
                    Gate::Open(Plan::WorkerToGas)
                } else if self.workers_incoming() {
                    Gate::Wait
                } else {
                    Gate::Closed(Unsatisfiable::MissingProducer(self.data.worker.clone()))
                }
            }
            ActionEffect::WorkerToMinerals => {
                if self.workers_gas > 0 {
                    Gate::Open(Plan::WorkerToMinerals)
                } else {
                    Gate::Closed(Unsatisfiable::NoGasWorkers)
                }
            }
            ActionEffect::Wait(seconds) => Gate::Open(Plan::Wait(*seconds)),
            ActionEffect::CallDownMule { caster, energy, .. } => {
                match self.caster_gate(caster, *energy) {
                    Gate::Open(index) => Gate::Open(Plan::Mule { caster: index }),
                    Gate::Wait => Gate::Wait,
                    Gate::Closed(reason) => Gate::Closed(reason),
                }
            }
            ActionEffect::Chronoboost {
                caster,
                energy,
                target,
                ..
            } => {
                let busy: Vec<usize> = self
                    .entities
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| e.name == *target && !e.queue.is_empty())
                    .map(|(i, _)| i)
                    .collect();
                if busy.is_empty() {
                    return Gate::Closed(Unsatisfiable::NothingToBoost(target.clone()));
                }
                let Some(&target) = busy
                    .iter()
                    .find(|&&i| self.entities[i].chrono_until <= self.frame)
                else {
                    return Gate::Wait;
                };
                match self.caster_gate(caster, *energy) {
                    Gate::Open(caster) => Gate::Open(Plan::Chrono { caster, target }),
                    Gate::Wait => Gate::Wait,
                    Gate::Closed(reason) => Gate::Closed(reason),
                }
            }
            ActionEffect::InjectLarva { caster, energy, .. } => {
                let caster = match self.caster_gate(caster, *energy) {
                    Gate::Open(index) => index,
                    Gate::Wait => return Gate::Wait,
                    Gate::Closed(reason) => return Gate::Closed(reason),
                };
                if let Some(hall) = self
                    .entities
                    .iter()
                    .position(|e| e.town_hall && e.inject.is_none())
                {
                    Gate::Open(Plan::Inject { caster, hall })
                } else if self.entities.iter().any(|e| e.town_hall) {
                    Gate::Wait
                } else {
                    Gate::Closed(Unsatisfiable::MissingProducer(self.data.town_hall.clone()))
                }
            }
        }
    }

    fn caster_gate(&self, caster: &str, energy: u32) -> Gate<usize> {
        if let Some(index) = self
            .entities
            .iter()
            .position(|e| e.name == caster && e.has_energy(energy))
        {
            Gate::Open(index)
        } else if self.entities.iter().any(|e| e.name == caster) || self.in_production(caster) {
            Gate::Wait
        } else {
            Gate::Closed(Unsatisfiable::NoCaster(caster.to_string()))
        }
    }

    fn supply_gate(&self, entry: &EntryData) -> Gate<()> {
        if entry.supply == 0 {
            return Gate::Open(());
        }
        let needed = self.supply_used + entry.supply;
        if needed > self.data.max_supply {
            return Gate::Closed(Unsatisfiable::SupplyCapped);
        }
        if needed <= self.supply_cap() {
            return Gate::Open(());
        }
        let coming = (self.supply_provided + self.supply_in_production()).min(self.data.max_supply);
        if needed <= coming {
            Gate::Wait
        } else {
            Gate::Closed(Unsatisfiable::SupplyBlocked)
        }
    }

    fn resources_gate(&self, entry: &EntryData) -> Gate<()> {
        let mut gate = Gate::Open(());
        if self.minerals < Fixed::from_num(entry.minerals) {
            let earning = (self.workers_minerals > 0 || !self.mules.is_empty()) && self.bases > 0;
            if earning || self.workers_incoming() {
                gate = Gate::Wait;
            } else {
                return Gate::Closed(Unsatisfiable::Unaffordable);
            }
        }
        if self.vespene < Fixed::from_num(entry.gas) {
            if self.workers_gas > 0 {
                gate = Gate::Wait;
            } else {
                return Gate::Closed(Unsatisfiable::Unaffordable);
            }
        }
        gate
    }

    fn has_finished(&self, name: &str) -> bool {
        self.researched.contains(name)
            || self.entities.iter().any(|e| e.is(name))
            || (name == self.data.worker && self.workers_minerals + self.workers_gas > 0)
    }

    fn in_production(&self, name: &str) -> bool {
        self.construction.contains(name) || self.entities.iter().any(|e| e.queue.contains(name))
    }

    fn workers_incoming(&self) -> bool {
        !self.returning_workers.is_empty()
            || self
                .construction
                .iter()
                .any(|item| item.producer == ProducerRef::Worker)
            || self.in_production(&self.data.worker)
    }

    fn supply_in_production(&self) -> u32 {
        let data = self.data;
        self.construction
            .iter()
            .chain(self.entities.iter().flat_map(|e| e.queue.iter()))
            .filter_map(|item| data.get(&item.entry))
            .filter(|entry| !entry.morph)
            .map(|entry| entry.supply_provided)
            .sum()
    }

    // ------------------------------------------------------------------
    // Commit
    // ------------------------------------------------------------------

    fn commit(&mut self, index: usize, entry: &'a EntryData, plan: Plan) {
        let supply_before = self.supply_used;
        self.minerals -= Fixed::from_num(entry.minerals);
        self.vespene -= Fixed::from_num(entry.gas);
        if entry.supply > 0 {
            self.supply_used += entry.supply;
            self.record_supply(self.frame);
        }

        let mut end = None;
        let build_frames = seconds_to_frames(entry.build_time);
        let item = |producer| ProductionItem::new(index, entry.name.clone(), build_frames, producer);

        match plan {
            Plan::Entity(producer) => {
                let id = producer as u32;
                if let Err(err) = self.entities[producer]
                    .queue
                    .add(item(ProducerRef::Entity(id)))
                {
                    tracing::warn!(%err, entry = %entry.name, "Producer rejected item");
                }
            }
            Plan::Worker => {
                self.workers_minerals -= 1;
                let producer = match self.data.worker_build {
                    WorkerBuildMode::Occupied => ProducerRef::Worker,
                    WorkerBuildMode::Travel(seconds) => {
                        self.returning_workers
                            .push(self.frame + seconds_to_frames(seconds));
                        ProducerRef::Unattended
                    }
                    WorkerBuildMode::Consumed => {
                        let worker_supply = self.data.get(&self.data.worker).map_or(1, |w| w.supply);
                        self.supply_used = self.supply_used.saturating_sub(worker_supply);
                        self.record_supply(self.frame);
                        ProducerRef::Unattended
                    }
                };
                self.push_construction(item(producer));
            }
            Plan::Larva(hall) => {
                self.entities[hall].larva -= 1;
                self.push_construction(item(ProducerRef::Larva));
            }
            Plan::WorkerToGas => {
                self.workers_minerals -= 1;
                self.workers_gas += 1;
            }
            Plan::WorkerToMinerals => {
                self.workers_gas -= 1;
                self.workers_minerals += 1;
            }
            Plan::Wait(seconds) => {
                self.blocked_until = self.frame + seconds_to_frames(seconds);
                end = Some(self.blocked_until);
            }
            Plan::Mule { caster } => {
                if let Some(ActionEffect::CallDownMule {
                    energy, duration, ..
                }) = &entry.effect
                {
                    self.entities[caster].energy -= Fixed::from_num(*energy);
                    self.mules.push(self.frame + seconds_to_frames(*duration));
                }
            }
            Plan::Chrono { caster, target } => {
                if let Some(ActionEffect::Chronoboost {
                    energy, duration, ..
                }) = &entry.effect
                {
                    self.entities[caster].energy -= Fixed::from_num(*energy);
                    self.entities[target].chrono_until = self.frame + seconds_to_frames(*duration);
                }
            }
            Plan::Inject { caster, hall } => {
                if let Some(ActionEffect::InjectLarva {
                    energy,
                    delay,
                    larva,
                    ..
                }) = &entry.effect
                {
                    self.entities[caster].energy -= Fixed::from_num(*energy);
                    self.entities[hall].inject = Some((self.frame + seconds_to_frames(*delay), *larva));
                }
            }
        }

        tracing::debug!(
            index,
            action = %entry.name,
            frame = self.frame,
            supply = supply_before,
            "Committed action"
        );

        self.events.push(Event {
            id: index,
            kind: entry.kind,
            name: entry.name.clone(),
            start: self.frame,
            end,
            supply: supply_before,
            image_ref: entry.image_ref().to_string(),
            minerals: entry.minerals,
            gas: entry.gas,
        });
    }

    fn push_construction(&mut self, item: ProductionItem) {
        if let Err(err) = self.construction.add(item) {
            tracing::warn!(%err, "Construction rejected item");
        }
    }

    // ------------------------------------------------------------------
    // Time
    // ------------------------------------------------------------------

    /// Advance the simulation by one frame and record its resource sample.
    pub fn advance(&mut self) {
        let data = self.data;
        let frame = self.frame;
        let next = frame + 1;

        let mules = self.mules.len() as u32;
        self.minerals = self
            .minerals
            .saturating_add(per_frame(self.income.minerals(self.workers_minerals, self.bases, mules)));
        self.vespene = self
            .vespene
            .saturating_add(per_frame(self.income.vespene(self.workers_gas, self.geysers, self.bases)));

        let regen = energy_regen_per_frame();
        for entity in &mut self.entities {
            if entity.energy < entity.max_energy {
                entity.energy = (entity.energy + regen).min(entity.max_energy);
            }
        }

        if let Some(larva) = &data.larva {
            let interval = seconds_to_frames(larva.spawn_interval);
            for hall in self.entities.iter_mut().filter(|e| e.town_hall) {
                if hall.larva < larva.max_per_hatchery {
                    hall.larva_timer += 1;
                    if hall.larva_timer >= interval {
                        hall.larva += 1;
                        hall.larva_timer = 0;
                    }
                } else {
                    hall.larva_timer = 0;
                }
            }
        }

        let mut finished = Vec::new();
        for entity in &mut self.entities {
            let boosted = entity.chrono_until > frame;
            finished.extend(entity.queue.tick(boosted));
        }
        finished.extend(self.construction.tick(false));
        for item in finished {
            self.complete(&item, next);
        }

        self.mules.retain(|&expires| expires > next);
        let before = self.returning_workers.len();
        self.returning_workers.retain(|&arrives| arrives > next);
        self.workers_minerals += (before - self.returning_workers.len()) as u32;
        for hall in &mut self.entities {
            if let Some((pops, larva)) = hall.inject {
                if pops <= next {
                    hall.larva += larva;
                    hall.inject = None;
                }
            }
        }

        self.frame = next;
        let sample = self.sample();
        self.history.push(sample);
    }

    fn complete(&mut self, item: &ProductionItem, frame: u32) {
        let data = self.data;
        let Some(entry) = data.get(&item.entry) else {
            return;
        };

        if let Some(event) = self.events.get_mut(item.action_index) {
            if event.id == item.action_index {
                event.end = Some(frame);
            }
        }

        if item.producer == ProducerRef::Worker {
            self.workers_minerals += 1;
        }

        let producer = match item.producer {
            ProducerRef::Entity(id) => Some(id as usize),
            _ => None,
        };

        if entry.morph {
            if let Some(entity) = producer.and_then(|p| self.entities.get_mut(p)) {
                let old = std::mem::replace(&mut entity.name, entry.name.clone());
                entity.former_names.push(old);
                entity.town_hall |= entry.town_hall;
                if let Some(energy) = entry.energy {
                    entity.energy = Fixed::from_num(energy.start);
                    entity.max_energy = Fixed::from_num(energy.max);
                }
            }
        } else {
            if let Some(addon) = entry.addon {
                if let Some(entity) = producer.and_then(|p| self.entities.get_mut(p)) {
                    entity.addon = Some(addon);
                    if addon == AddonKind::Reactor {
                        entity.queue.capacity = 2;
                    }
                }
            }
            self.add_entity(entry);
            self.record_supply(frame);
        }

        tracing::debug!(
            index = item.action_index,
            action = %entry.name,
            frame,
            "Completed action"
        );
    }

    /// Add a finished entry to the state. Returns the entity index when one
    /// was created.
    fn add_entity(&mut self, entry: &EntryData) -> Option<usize> {
        self.supply_provided += entry.supply_provided;
        if entry.geyser {
            self.geysers += 1;
        }
        match entry.kind {
            EntryKind::Worker => {
                self.workers_minerals += 1;
                return None;
            }
            EntryKind::Upgrade => {
                self.researched.insert(entry.name.clone());
                return None;
            }
            EntryKind::Action => return None,
            EntryKind::Unit | EntryKind::Structure => {}
        }
        if entry.town_hall {
            self.bases += 1;
        }
        let (energy, max_energy) = entry.energy.map_or((Fixed::ZERO, Fixed::ZERO), |e| {
            (Fixed::from_num(e.start), Fixed::from_num(e.max))
        });
        self.entities.push(Entity {
            name: entry.name.clone(),
            former_names: Vec::new(),
            queue: ProductionQueue::new(),
            addon: None,
            energy,
            max_energy,
            town_hall: entry.town_hall,
            larva: 0,
            larva_timer: 0,
            inject: None,
            chrono_until: 0,
        });
        Some(self.entities.len() - 1)
    }

    fn record_supply(&mut self, frame: u32) {
        let change = SupplyChange {
            frame,
            used: self.supply_used,
            cap: self.supply_cap(),
        };
        let unchanged = self
            .supply_changes
            .last()
            .is_some_and(|last| last.used == change.used && last.cap == change.cap);
        if !unchanged {
            self.supply_changes.push(change);
        }
    }

    fn sample(&self) -> ResourceSample {
        let race_specific: u32 = match &self.data.special {
            SpecialResource::Energy { caster, cost } => {
                let cost = Fixed::from_num((*cost).max(1));
                self.entities
                    .iter()
                    .filter(|e| e.name == *caster)
                    .map(|e| (e.energy / cost).saturating_to_num::<u32>())
                    .sum()
            }
            SpecialResource::Larva => self.entities.iter().map(|e| e.larva).sum(),
        };
        ResourceSample {
            minerals: self.minerals.saturating_to_num::<u32>(),
            vespene: self.vespene.saturating_to_num::<u32>(),
            supply_left: self.supply_cap() as i32 - self.supply_used as i32,
            race_specific,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logic(race: Race) -> GameLogic {
        GameLogic::new(Catalog::builtin().unwrap(), race).unwrap()
    }

    fn run(race: Race, names: &[&str]) -> BuildOrderRun {
        let logic = logic(race);
        let actions = logic.actions(names).unwrap();
        logic.simulated_build_order(&actions)
    }

    #[test]
    fn test_starting_state() {
        let logic = logic(Race::Terran);
        let state = logic.set_start();
        assert_eq!(state.frame(), 0);
        assert_eq!(state.minerals(), Fixed::from_num(50));
        assert_eq!(state.supply_used(), 12);
        assert_eq!(state.supply_cap(), 15);
        assert_eq!(state.workers_on_minerals(), 12);
        assert_eq!(state.bases(), 1);
        assert_eq!(state.count("CommandCenter"), 1);
    }

    #[test]
    fn test_huge_settings_do_not_overflow() {
        let settings = Settings {
            starting_minerals: u32::MAX,
            starting_gas: u32::MAX,
            idle_limit_seconds: u32::MAX,
            ..Settings::default()
        };
        let logic = logic(Race::Terran).with_settings(settings);
        let run = logic.simulated_build_order(&logic.actions(&["SCV", "SupplyDepot"]).unwrap());
        assert!(run.is_valid());
        assert!(run.history.sample(0).unwrap().minerals >= crate::settings::MAX_STARTING_RESOURCES - 100);

        let crowded = Settings {
            starting_workers: u32::MAX,
            ..Settings::default()
        };
        let logic = self::logic(Race::Terran).with_settings(crowded);
        let run = logic.simulated_build_order(&logic.actions(&["SCV"]).unwrap());
        assert!(!run.is_valid());
    }

    #[test]
    fn test_zerg_starting_supply_includes_overlord() {
        let logic = logic(Race::Zerg);
        let state = logic.set_start();
        assert_eq!(state.supply_cap(), 14);
        assert_eq!(state.count("Overlord"), 1);
    }

    #[test]
    fn test_empty_build_order() {
        let run = run(Race::Terran, &[]);
        assert!(run.is_valid());
        assert!(run.events.is_empty());
        assert!(run.history.is_empty());
        assert_eq!(run.frame, 0);
    }

    #[test]
    fn test_worker_build_time() {
        let run = run(Race::Terran, &["SCV"]);
        let event = &run.events[0];
        assert_eq!(event.start, 0);
        assert_eq!(event.end, Some(seconds_to_frames(12)));
        assert_eq!(event.supply, 12);
        assert_eq!(run.frame, seconds_to_frames(12));
        assert_eq!(run.history.len(), run.frame as usize);
    }

    #[test]
    fn test_same_producer_never_overlaps() {
        let run = run(Race::Terran, &["SCV", "SCV", "SCV"]);
        assert!(run.is_valid());
        for pair in run.events.windows(2) {
            assert!(pair[1].start >= pair[0].end.unwrap());
        }
    }

    #[test]
    fn test_supply_cap_rises_on_completion() {
        let run = run(Race::Terran, &["SupplyDepot"]);
        let depot = &run.events[0];
        let raise = run
            .supply_changes
            .iter()
            .find(|c| c.cap == 23)
            .expect("cap raised");
        assert_eq!(Some(raise.frame), depot.end);
        let before = depot.end.unwrap() as usize - 2;
        assert_eq!(run.history.supply_left[before], 3);
        assert_eq!(*run.history.supply_left.last().unwrap(), 11);
    }

    #[test]
    fn test_supply_block_is_reported() {
        let run = run(Race::Terran, &["SCV", "SCV", "SCV", "SCV"]);
        let error = run.error.expect("supply blocked");
        assert_eq!(error.action_index, 3);
        assert_eq!(error.reason, Unsatisfiable::SupplyBlocked);
        assert_eq!(run.events.len(), 3);
    }

    #[test]
    fn test_missing_requirement() {
        let run = run(Race::Terran, &["Factory"]);
        assert_eq!(
            run.error.unwrap().reason,
            Unsatisfiable::MissingRequirement("Barracks".to_string())
        );
    }

    #[test]
    fn test_missing_producer() {
        let run = run(Race::Terran, &["Marine"]);
        assert_eq!(
            run.error.unwrap().reason,
            Unsatisfiable::MissingProducer("Barracks".to_string())
        );
    }

    #[test]
    fn test_wrong_race_action() {
        let logic = logic(Race::Terran);
        let actions = vec![Action::new("Probe", EntryKind::Worker)];
        let run = logic.simulated_build_order(&actions);
        assert_eq!(run.error.unwrap().reason, Unsatisfiable::UnknownAction);
    }

    #[test]
    fn test_unexpanded_shortcut_fails() {
        let run = run(Race::Terran, &["3worker_to_gas"]);
        assert_eq!(run.error.unwrap().reason, Unsatisfiable::UnexpandedShortcut);
    }

    #[test]
    fn test_requirement_waits_for_production() {
        let run = run(Race::Terran, &["SupplyDepot", "Barracks"]);
        assert!(run.is_valid());
        assert!(run.events[1].start >= run.events[0].end.unwrap());
    }

    #[test]
    fn test_wait_action_delays_next() {
        let run = run(Race::Terran, &["do_nothing_5_sec", "SCV"]);
        assert!(run.is_valid());
        assert_eq!(run.events[0].end, Some(seconds_to_frames(5)));
        assert_eq!(run.events[1].start, seconds_to_frames(5));
    }

    #[test]
    fn test_trailing_wait_extends_run() {
        let run = run(Race::Terran, &["do_nothing_1_sec"]);
        assert_eq!(run.frame, seconds_to_frames(1));
    }

    #[test]
    fn test_gas_workers() {
        let run = run(
            Race::Terran,
            &["SupplyDepot", "Refinery", "worker_to_gas", "worker_to_gas", "worker_to_gas"],
        );
        assert!(run.is_valid());
        let refinery_done = run.events[1].end.unwrap();
        for event in &run.events[2..] {
            assert_eq!(event.start, refinery_done);
            assert_eq!(event.end, None);
        }
        assert_eq!(run.history.vespene.last(), Some(&0));
    }

    #[test]
    fn test_gas_saturation() {
        let run = run(
            Race::Terran,
            &["Refinery", "worker_to_gas", "worker_to_gas", "worker_to_gas", "worker_to_gas"],
        );
        let error = run.error.unwrap();
        assert_eq!(error.action_index, 4);
        assert_eq!(error.reason, Unsatisfiable::GasSaturated);
    }

    #[test]
    fn test_no_gas_income_is_unaffordable() {
        let run = run(Race::Terran, &["SupplyDepot", "Barracks", "Factory"]);
        let error = run.error.unwrap();
        assert_eq!(error.action_index, 2);
        assert_eq!(error.reason, Unsatisfiable::Unaffordable);
    }

    #[test]
    fn test_orbital_and_mule() {
        let run = run(
            Race::Terran,
            &["SupplyDepot", "Barracks", "OrbitalCommand", "call_down_mule"],
        );
        assert!(run.is_valid(), "{:?}", run.error);
        let orbital_done = run.events[2].end.unwrap();
        // starts with 50 energy, exactly one charge
        assert_eq!(run.events[3].start, orbital_done);
        let sample = run.history.sample(orbital_done as usize - 1).unwrap();
        assert_eq!(sample.race_specific, 1);
    }

    #[test]
    fn test_mule_without_orbital_fails() {
        let run = run(Race::Terran, &["call_down_mule"]);
        assert_eq!(
            run.error.unwrap().reason,
            Unsatisfiable::NoCaster("OrbitalCommand".to_string())
        );
    }

    #[test]
    fn test_techlab_unit() {
        let mut settings = Settings::default();
        settings.starting_gas = 100;
        let logic = logic(Race::Terran).with_settings(settings);
        let actions = logic
            .actions(&["SupplyDepot", "Barracks", "Marauder"])
            .unwrap();
        let run = logic.simulated_build_order(&actions);
        assert_eq!(
            run.error.unwrap().reason,
            Unsatisfiable::MissingTechLab("Barracks".to_string())
        );
    }

    #[test]
    fn test_reactor_trains_two() {
        let mut settings = Settings::default();
        settings.starting_minerals = 1000;
        settings.starting_gas = 200;
        let logic = logic(Race::Terran).with_settings(settings);
        let actions = logic
            .actions(&["SupplyDepot", "Barracks", "BarracksReactor", "Marine", "Marine"])
            .unwrap();
        let run = logic.simulated_build_order(&actions);
        assert!(run.is_valid(), "{:?}", run.error);
        assert_eq!(run.events[3].start, run.events[4].start);
    }

    #[test]
    fn test_upgrade_once() {
        let mut settings = Settings::default();
        settings.starting_gas = 500;
        settings.starting_minerals = 1000;
        let logic = logic(Race::Terran).with_settings(settings);
        let actions = logic
            .actions(&["SupplyDepot", "Barracks", "BarracksTechLab", "Stimpack", "Stimpack"])
            .unwrap();
        let run = logic.simulated_build_order(&actions);
        let error = run.error.unwrap();
        assert_eq!(error.action_index, 4);
        assert_eq!(error.reason, Unsatisfiable::AlreadyResearched);
    }

    #[test]
    fn test_protoss_probe_returns() {
        let run = run(Race::Protoss, &["Pylon", "Gateway"]);
        assert!(run.is_valid());
        assert_eq!(run.events[0].duration(), Some(seconds_to_frames(18)));
        // the probe is back on minerals long before the pylon finishes
        assert!(run.events[1].start >= run.events[0].end.unwrap());
    }

    #[test]
    fn test_chronoboost_speeds_up_production() {
        let plain = run(Race::Protoss, &["Probe"]);
        let boosted = run(Race::Protoss, &["Probe", "chronoboost_busy_nexus"]);
        assert!(boosted.is_valid(), "{:?}", boosted.error);
        assert!(boosted.events[0].end.unwrap() < plain.events[0].end.unwrap());
    }

    #[test]
    fn test_chronoboost_needs_busy_target() {
        let run = run(Race::Protoss, &["chronoboost_busy_nexus"]);
        assert_eq!(
            run.error.unwrap().reason,
            Unsatisfiable::NothingToBoost("Nexus".to_string())
        );
    }

    #[test]
    fn test_zerg_drone_uses_larva() {
        let mut settings = Settings::default();
        settings.starting_minerals = 300;
        let logic = logic(Race::Zerg).with_settings(settings);
        let actions = logic
            .actions(&["Drone", "Drone", "Overlord", "Drone"])
            .unwrap();
        let run = logic.simulated_build_order(&actions);
        assert!(run.is_valid(), "{:?}", run.error);
        // three starting larva are spent at once, the fourth drone waits
        assert!(run.events[..3].iter().all(|e| e.start == 0));
        assert!(run.events[3].start >= seconds_to_frames(11));
        assert_eq!(run.history.race_specific[0], 0);
    }

    #[test]
    fn test_zerg_structure_consumes_drone() {
        let run = run(Race::Zerg, &["SpawningPool"]);
        assert!(run.is_valid());
        assert_eq!(run.events[0].supply, 12);
        let after = run.supply_changes.last().unwrap();
        assert_eq!(after.used, 11);
    }

    #[test]
    fn test_queen_inject() {
        let mut settings = Settings::default();
        settings.starting_minerals = 400;
        let logic = logic(Race::Zerg).with_settings(settings);
        let actions = logic
            .actions(&["SpawningPool", "Queen", "inject_larva"])
            .unwrap();
        let run = logic.simulated_build_order(&actions);
        assert!(run.is_valid(), "{:?}", run.error);
        assert_eq!(run.events[2].start, run.events[1].end.unwrap());
        assert_eq!(run.events[2].end, None);
    }

    #[test]
    fn test_idle_limit() {
        let mut settings = Settings::default();
        settings.idle_limit_seconds = 1;
        let logic = logic(Race::Terran).with_settings(settings);
        let actions = logic.actions(&["CommandCenter"]).unwrap();
        let run = logic.simulated_build_order(&actions);
        let error = run.error.unwrap();
        assert_eq!(error.reason, Unsatisfiable::IdleLimit);
        assert_eq!(error.frame, seconds_to_frames(1));
        assert_eq!(run.frame, error.frame);
    }

    #[test]
    fn test_add_item_expands_shortcut() {
        let logic = logic(Race::Terran);
        let base = logic.actions(&["SupplyDepot", "Refinery"]).unwrap();
        let insertion = logic.add_item_to_bo(&base, "3worker_to_gas", 2).unwrap();
        assert_eq!(insertion.inserted, 3);
        assert_eq!(insertion.actions.len(), 5);
        assert!(insertion.actions[2..].iter().all(|a| a.name == "worker_to_gas"));
        assert!(insertion.run.is_valid());
    }

    #[test]
    fn test_add_item_inserts_missing_requirements() {
        let logic = logic(Race::Terran);
        let insertion = logic.add_item_to_bo(&[], "Marine", 0).unwrap();
        let names: Vec<_> = insertion.actions.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["SupplyDepot", "Barracks", "Marine"]);
        assert_eq!(insertion.inserted, 3);
        assert!(insertion.run.is_valid());
    }

    #[test]
    fn test_add_item_inserts_supply_structure() {
        let logic = logic(Race::Terran);
        let base = logic.actions(&["SCV", "SCV", "SCV"]).unwrap();
        let insertion = logic.add_item_to_bo(&base, "SCV", 3).unwrap();
        assert_eq!(insertion.actions[3].name, "SupplyDepot");
        assert_eq!(insertion.actions[4].name, "SCV");
        assert_eq!(insertion.inserted, 2);
        assert!(insertion.run.is_valid());
    }

    #[test]
    fn test_add_item_unknown_name() {
        let logic = logic(Race::Terran);
        assert!(matches!(
            logic.add_item_to_bo(&[], "Zealot", 0),
            Err(PlannerError::UnknownAction { .. })
        ));
    }

    #[test]
    fn test_run_bytes_roundtrip() {
        let run = run(Race::Terran, &["SCV", "SupplyDepot"]);
        let bytes = run.to_bytes().unwrap();
        assert_eq!(BuildOrderRun::from_bytes(&bytes).unwrap(), run);
    }
}
