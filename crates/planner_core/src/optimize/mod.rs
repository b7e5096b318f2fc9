//! Build order optimization.
//!
//! The [`Optimizer`] never reasons about game rules itself. It generates
//! candidate build orders explicitly (an action moved earlier, an action
//! removed, a worker inserted) and scores each one with a full run of the
//! simulator.
//!
//! Targets run in order and each one starts from the result of the
//! previous one. Every target writes exactly one [`TargetLog`].
//!
//! # Example
//!
//! ```
//! use planner_core::catalog::Catalog;
//! use planner_core::optimize::{Optimizer, Target, Unbounded};
//! use planner_core::race::Race;
//! use planner_core::simulation::GameLogic;
//!
//! let logic = GameLogic::new(Catalog::builtin()?, Race::Terran)?;
//! let actions = logic.actions(&["SCV", "SCV", "SCV", "SupplyDepot"])?;
//!
//! let report = Optimizer::new(&logic).optimize(&actions, &[Target::SupplyCap], &[], &mut Unbounded);
//! assert!(report.complete);
//! assert_eq!(report.logs.len(), 1);
//! # Ok::<(), planner_core::error::PlannerError>(())
//! ```

mod constraint;
mod control;
mod prepone;
mod target;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use constraint::{Constraint, ConstraintKind};
pub use control::{CancelToken, EvaluationBudget, SearchControl, SearchProgress, Unbounded};
pub use prepone::{PreponeMode, PreponeOutcome, PreponeResult};
pub use target::Target;

use crate::action::{move_earlier, Action};
use crate::math::format_clock;
use crate::simulation::{BuildOrderRun, GameLogic, Unsatisfiable};
use constraint::ConstraintSet;
use control::Search;

/// How a target ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetStatus {
    /// The build order changed and scores better.
    Improved,
    /// Nothing better was found, or nothing needed to change.
    Unchanged,
    /// The constraints or the build order rule out any solution.
    NoSolution,
    /// The search was cancelled before or during this target.
    Cancelled,
}

/// Log line of one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetLog {
    /// The target, as written.
    pub target: String,
    /// How it ended.
    pub status: TargetStatus,
    /// Human readable outcome.
    pub message: String,
}

impl TargetLog {
    fn new(target: &Target, status: TargetStatus, message: impl Into<String>) -> Self {
        let log = Self {
            target: target.to_string(),
            status,
            message: message.into(),
        };
        match status {
            TargetStatus::Improved | TargetStatus::Unchanged => {
                info!(target_name = %log.target, outcome = %log.message, "Target finished");
            }
            TargetStatus::NoSolution | TargetStatus::Cancelled => {
                warn!(target_name = %log.target, outcome = %log.message, "Target not solved");
            }
        }
        log
    }
}

impl fmt::Display for TargetLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.target, self.message)
    }
}

/// Result of [`Optimizer::optimize`].
#[derive(Debug, Clone)]
pub struct OptimizeReport {
    /// The optimized build order.
    pub actions: Vec<Action>,
    /// Its simulation.
    pub run: BuildOrderRun,
    /// One line per target.
    pub logs: Vec<TargetLog>,
    /// False when the search was cancelled.
    pub complete: bool,
    /// Simulations run.
    pub evaluations: usize,
}

/// A build order under consideration with its simulation.
///
/// `ids` tracks where each action came from: baseline actions keep their
/// baseline index, inserted actions get fresh ids past the baseline.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub(crate) actions: Vec<Action>,
    pub(crate) ids: Vec<usize>,
    pub(crate) run: BuildOrderRun,
    next_id: usize,
}

impl Candidate {
    fn baseline(search: &mut Search<'_>, logic: &GameLogic, actions: &[Action]) -> Self {
        let run = search.evaluate(logic, actions);
        Self {
            actions: actions.to_vec(),
            ids: (0..actions.len()).collect(),
            run,
            next_id: actions.len(),
        }
    }

    /// Position of the action with the given id.
    pub(crate) fn position_of(&self, id: usize) -> Option<usize> {
        self.ids.iter().position(|&i| i == id)
    }

    pub(crate) fn moved(
        &self,
        search: &mut Search<'_>,
        logic: &GameLogic,
        from: usize,
        to: usize,
    ) -> Self {
        let actions = move_earlier(&self.actions, from, to);
        let run = search.evaluate(logic, &actions);
        Self {
            actions,
            ids: move_earlier(&self.ids, from, to),
            run,
            next_id: self.next_id,
        }
    }

    fn removed(&self, search: &mut Search<'_>, logic: &GameLogic, positions: &[usize]) -> Self {
        let actions: Vec<Action> = self
            .actions
            .iter()
            .enumerate()
            .filter(|(i, _)| !positions.contains(i))
            .map(|(_, a)| a.clone())
            .collect();
        let ids = self
            .ids
            .iter()
            .enumerate()
            .filter(|(i, _)| !positions.contains(i))
            .map(|(_, &id)| id)
            .collect();
        let run = search.evaluate(logic, &actions);
        Self {
            actions,
            ids,
            run,
            next_id: self.next_id,
        }
    }

    fn inserted(
        &self,
        search: &mut Search<'_>,
        logic: &GameLogic,
        at: usize,
        action: &Action,
    ) -> Self {
        let mut actions = self.actions.clone();
        actions.insert(at, action.clone());
        let mut ids = self.ids.clone();
        ids.insert(at, self.next_id);
        let run = search.evaluate(logic, &actions);
        Self {
            actions,
            ids,
            run,
            next_id: self.next_id + 1,
        }
    }
}

/// Searches for better build orders, using a [`GameLogic`] as its oracle.
#[derive(Debug, Clone, Copy)]
pub struct Optimizer<'a> {
    logic: &'a GameLogic,
}

impl<'a> Optimizer<'a> {
    /// Create an optimizer for a simulator and its settings.
    #[must_use]
    pub const fn new(logic: &'a GameLogic) -> Self {
        Self { logic }
    }

    /// Tolerance in frames from the optimizer settings.
    fn tolerance(&self) -> u32 {
        self.logic.optimize_settings().tolerance_frames
    }

    /// Run every target in order.
    ///
    /// When the constraints cannot be applied, every target reports
    /// [`TargetStatus::NoSolution`] and the input is returned unchanged. When
    /// `control` cancels, the best validated build order so far is returned
    /// with `complete == false`.
    pub fn optimize(
        &self,
        actions: &[Action],
        targets: &[Target],
        constraints: &[Constraint],
        control: &mut dyn SearchControl,
    ) -> OptimizeReport {
        let mut search = Search::new(control);
        let baseline = Candidate::baseline(&mut search, self.logic, actions);

        let prepared = ConstraintSet::resolve(constraints, &baseline, self.tolerance())
            .and_then(|set| self.apply_removals(&mut search, &baseline, set));
        let (mut current, set) = match prepared {
            Ok(prepared) => prepared,
            Err(reason) => {
                let logs = targets
                    .iter()
                    .map(|t| TargetLog::new(t, TargetStatus::NoSolution, format!("no solution: {reason}")))
                    .collect();
                return OptimizeReport {
                    actions: baseline.actions,
                    run: baseline.run,
                    logs,
                    complete: !search.is_cancelled(),
                    evaluations: search.evaluations(),
                };
            }
        };

        let mut logs = Vec::with_capacity(targets.len());
        for (index, target) in targets.iter().enumerate() {
            if search.is_cancelled() {
                logs.push(TargetLog::new(target, TargetStatus::Cancelled, "cancelled"));
                continue;
            }
            search.set_target(index);
            let (next, log) = match target {
                Target::Workers => self.add_workers(&mut search, current, &set, target),
                Target::SupplyStructures => {
                    self.replace_supply_structures(&mut search, current, &set, target)
                }
                _ => self.improve_metric(&mut search, current, &set, target),
            };
            current = next;
            logs.push(log);
            search.checkpoint();
        }

        OptimizeReport {
            actions: current.actions,
            run: current.run,
            logs,
            complete: !search.is_cancelled(),
            evaluations: search.evaluations(),
        }
    }

    /// Delete removed actions and check the rest still satisfies the pins.
    fn apply_removals(
        &self,
        search: &mut Search<'_>,
        baseline: &Candidate,
        set: ConstraintSet,
    ) -> Result<(Candidate, ConstraintSet), String> {
        let current = if set.removals().is_empty() {
            baseline.clone()
        } else {
            baseline.removed(search, self.logic, set.removals())
        };
        if let Some(error) = &current.run.error {
            return Err(format!(
                "{} (#{}) cannot be executed: {}",
                error.name, error.action_index, error.reason
            ));
        }
        if !set.satisfied(&current) {
            return Err("constraints cannot be met after removals".to_string());
        }
        Ok((current, set))
    }

    /// Whether a candidate may replace the current build order.
    fn acceptable(candidate: &Candidate, set: &ConstraintSet) -> bool {
        candidate.run.is_valid() && set.satisfied(candidate)
    }

    /// Move actions earlier while the target metric improves.
    fn improve_metric(
        &self,
        search: &mut Search<'_>,
        current: Candidate,
        set: &ConstraintSet,
        target: &Target,
    ) -> (Candidate, TargetLog) {
        let Some(initial) = target.metric(&current.run) else {
            let log = TargetLog::new(target, TargetStatus::NoSolution, "no solution: target is never reached");
            return (current, log);
        };

        let data = self.logic.data();
        let movable = target.movable(data);
        let mut best = current;
        let mut score = (initial, best.run.frame);
        let mut moves = 0;

        for _ in 0..self.logic.optimize_settings().max_passes {
            let mut improved = false;
            for index in 1..best.actions.len() {
                if search.is_cancelled() {
                    break;
                }
                let name = &best.actions[index].name;
                if movable.as_ref().is_some_and(|names| !names.contains(name)) {
                    continue;
                }
                let mut found = None;
                for to in (0..index).rev() {
                    let candidate = best.moved(search, self.logic, index, to);
                    if search.is_cancelled() {
                        break;
                    }
                    if !Self::acceptable(&candidate, set) {
                        continue;
                    }
                    let Some(metric) = target.metric(&candidate.run) else {
                        continue;
                    };
                    let candidate_score = (metric, candidate.run.frame);
                    if candidate_score < score {
                        score = candidate_score;
                        found = Some(candidate);
                    }
                }
                if let Some(candidate) = found {
                    best = candidate;
                    moves += 1;
                    improved = true;
                }
            }
            if !improved || search.is_cancelled() {
                break;
            }
        }

        let summary = format!(
            "moved {moves} action(s) earlier, {} -> {}",
            format_clock(initial),
            format_clock(score.0)
        );
        let log = if search.is_cancelled() {
            TargetLog::new(target, TargetStatus::Cancelled, format!("cancelled after {summary}"))
        } else if moves > 0 {
            TargetLog::new(target, TargetStatus::Improved, summary)
        } else {
            TargetLog::new(target, TargetStatus::Unchanged, "cannot be preponed")
        };
        (best, log)
    }

    /// Insert workers as early as possible without delaying the finish.
    fn add_workers(
        &self,
        search: &mut Search<'_>,
        current: Candidate,
        set: &ConstraintSet,
        target: &Target,
    ) -> (Candidate, TargetLog) {
        let data = self.logic.data();
        let settings = self.logic.optimize_settings();
        let worker = match self.logic.action(&data.worker) {
            Ok(worker) => worker,
            Err(e) => {
                let log = TargetLog::new(target, TargetStatus::NoSolution, format!("no solution: {e}"));
                return (current, log);
            }
        };
        let planned = current.actions.iter().filter(|a| a.name == worker.name).count();
        let mut workers = self.logic.settings().starting_workers as usize + planned;
        let max_workers = settings.max_workers as usize;
        if workers >= max_workers {
            return (current, TargetLog::new(target, TargetStatus::Unchanged, "no change needed"));
        }

        let limit = current.run.frame.saturating_add(self.tolerance());
        let initial_frame = current.run.frame;
        let mut best = current;
        let mut inserted = 0;
        while workers < max_workers && inserted < settings.max_insertions && !search.is_cancelled() {
            let mut found = None;
            for at in 0..=best.actions.len() {
                let candidate = best.inserted(search, self.logic, at, &worker);
                if search.is_cancelled() {
                    break;
                }
                if Self::acceptable(&candidate, set) && candidate.run.frame <= limit {
                    found = Some(candidate);
                    break;
                }
            }
            let Some(candidate) = found else {
                break;
            };
            best = candidate;
            workers += 1;
            inserted += 1;
        }

        let summary = format!(
            "inserted {inserted} worker(s), {} -> {}",
            format_clock(initial_frame),
            format_clock(best.run.frame)
        );
        let log = if search.is_cancelled() {
            TargetLog::new(target, TargetStatus::Cancelled, format!("cancelled after {summary}"))
        } else if inserted > 0 {
            TargetLog::new(target, TargetStatus::Improved, summary)
        } else {
            TargetLog::new(target, TargetStatus::Unchanged, "no change needed")
        };
        (best, log)
    }

    /// Strip supply structures and re-add each one where supply runs out.
    fn replace_supply_structures(
        &self,
        search: &mut Search<'_>,
        current: Candidate,
        set: &ConstraintSet,
        target: &Target,
    ) -> (Candidate, TargetLog) {
        let data = self.logic.data();
        let supply = match self.logic.action(&data.supply_structure) {
            Ok(supply) => supply,
            Err(e) => {
                let log = TargetLog::new(target, TargetStatus::NoSolution, format!("no solution: {e}"));
                return (current, log);
            }
        };
        let positions: Vec<usize> = current
            .actions
            .iter()
            .enumerate()
            .filter(|(i, a)| a.name == supply.name && !set.is_pinned(current.ids[*i]))
            .map(|(i, _)| i)
            .collect();
        if positions.is_empty() {
            return (current, TargetLog::new(target, TargetStatus::Unchanged, "no change needed"));
        }

        let mut stripped = current.removed(search, self.logic, &positions);
        let mut added = Vec::new();
        for _ in 0..self.logic.optimize_settings().max_insertions {
            if search.is_cancelled() {
                break;
            }
            let Some(error) = &stripped.run.error else {
                break;
            };
            let needs_supply = match &error.reason {
                Unsatisfiable::SupplyBlocked => true,
                Unsatisfiable::MissingRequirement(name) | Unsatisfiable::MissingProducer(name) => {
                    *name == supply.name
                }
                _ => false,
            };
            if !needs_supply {
                break;
            }
            added.push(stripped.next_id);
            stripped = stripped.inserted(search, self.logic, error.action_index, &supply);
        }

        for id in &added {
            if search.is_cancelled() {
                break;
            }
            let Some(index) = stripped.position_of(*id) else {
                continue;
            };
            if let Some((candidate, _)) =
                self.prepone_candidate(search, &stripped, index, PreponeMode::Fastest, set)
            {
                stripped = candidate;
            }
        }

        if search.is_cancelled() {
            let log = TargetLog::new(target, TargetStatus::Cancelled, "cancelled");
            return (current, log);
        }
        if Self::acceptable(&stripped, set) && stripped.run.frame <= current.run.frame {
            let message = format!(
                "re-placed {} supply structure(s), {} -> {}",
                added.len(),
                format_clock(current.run.frame),
                format_clock(stripped.run.frame)
            );
            (stripped, TargetLog::new(target, TargetStatus::Improved, message))
        } else {
            let log = TargetLog::new(target, TargetStatus::Unchanged, "cannot be preponed");
            (current, log)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::race::Race;
    use std::ops::ControlFlow;

    fn terran() -> GameLogic {
        GameLogic::new(Catalog::builtin().unwrap(), Race::Terran).unwrap()
    }

    #[test]
    fn test_candidate_tracks_ids() {
        let logic = terran();
        let actions = logic.actions(&["SCV", "SupplyDepot", "SCV"]).unwrap();
        let mut control = Unbounded;
        let mut search = Search::new(&mut control);
        let base = Candidate::baseline(&mut search, &logic, &actions);

        let moved = base.moved(&mut search, &logic, 2, 0);
        assert_eq!(moved.ids, vec![2, 0, 1]);
        assert_eq!(moved.position_of(1), Some(2));

        let scv = logic.action("SCV").unwrap();
        let inserted = moved.inserted(&mut search, &logic, 1, &scv);
        assert_eq!(inserted.ids, vec![2, 3, 0, 1]);

        let removed = inserted.removed(&mut search, &logic, &[0, 3]);
        assert_eq!(removed.ids, vec![3, 0]);
        assert_eq!(search.evaluations(), 4);
    }

    #[test]
    fn test_supply_cap_target_moves_depot_earlier() {
        let logic = terran();
        let actions = logic
            .actions(&["SCV", "SCV", "SCV", "SupplyDepot"])
            .unwrap();
        let baseline = logic.simulated_build_order(&actions);
        let before = Target::SupplyCap.metric(&baseline).unwrap();

        let report = Optimizer::new(&logic).optimize(&actions, &[Target::SupplyCap], &[], &mut Unbounded);
        assert!(report.complete);
        assert!(report.run.is_valid());
        let after = Target::SupplyCap.metric(&report.run).unwrap();
        assert!(after <= before);

        let depot = report
            .actions
            .iter()
            .position(|a| a.name == "SupplyDepot")
            .unwrap();
        assert!(depot <= 3);
    }

    #[test]
    fn test_bad_constraint_is_no_solution_for_every_target() {
        let logic = terran();
        let actions = logic.actions(&["SCV", "SupplyDepot"]).unwrap();
        let constraints = [Constraint::new(5, ConstraintKind::After)];
        let report = Optimizer::new(&logic).optimize(
            &actions,
            &[Target::Fastest, Target::Workers],
            &constraints,
            &mut Unbounded,
        );
        assert_eq!(report.actions, actions);
        assert_eq!(report.logs.len(), 2);
        for log in &report.logs {
            assert_eq!(log.status, TargetStatus::NoSolution);
            assert!(log.message.starts_with("no solution"));
        }
    }

    #[test]
    fn test_remove_and_pin_same_action_is_no_solution() {
        let logic = terran();
        let actions = logic.actions(&["SCV", "SupplyDepot"]).unwrap();
        let constraints = [
            Constraint::new(1, ConstraintKind::Remove),
            Constraint::new(1, ConstraintKind::At),
        ];
        let report = Optimizer::new(&logic).optimize(&actions, &[Target::Fastest], &constraints, &mut Unbounded);
        assert_eq!(report.logs[0].status, TargetStatus::NoSolution);
        assert_eq!(report.actions.len(), 2);
    }

    #[test]
    fn test_remove_constraint_drops_action() {
        let logic = terran();
        let actions = logic.actions(&["SCV", "SupplyDepot", "SCV"]).unwrap();
        let constraints = [Constraint::new(1, ConstraintKind::Remove)];
        let report = Optimizer::new(&logic).optimize(&actions, &[Target::Fastest], &constraints, &mut Unbounded);
        assert_eq!(report.actions.len(), 2);
        assert!(report.actions.iter().all(|a| a.name == "SCV"));
    }

    #[test]
    fn test_workers_target_respects_max_workers() {
        let logic = terran().with_optimize_settings(crate::settings::OptimizeSettings {
            max_workers: 12,
            ..Default::default()
        });
        let actions = logic.actions(&["SupplyDepot"]).unwrap();
        let report = Optimizer::new(&logic).optimize(&actions, &[Target::Workers], &[], &mut Unbounded);
        assert_eq!(report.logs[0].status, TargetStatus::Unchanged);
        assert_eq!(report.logs[0].message, "no change needed");
        assert_eq!(report.actions, actions);
    }

    #[test]
    fn test_workers_target_never_delays_finish() {
        let logic = terran();
        let actions = logic.actions(&["SupplyDepot", "Barracks"]).unwrap();
        let baseline = logic.simulated_build_order(&actions);
        let report = Optimizer::new(&logic).optimize(&actions, &[Target::Workers], &[], &mut Unbounded);
        assert!(report.run.is_valid());
        assert!(report.run.frame <= baseline.frame + 3);
        let workers = report.actions.iter().filter(|a| a.name == "SCV").count();
        assert!(workers > 0);
        assert_eq!(report.logs[0].status, TargetStatus::Improved);
    }

    #[test]
    fn test_cancel_before_second_target() {
        let logic = terran();
        let actions = logic.actions(&["SCV", "SCV", "SupplyDepot"]).unwrap();
        let mut control = |p: SearchProgress| {
            if p.target > 0 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };
        let report = Optimizer::new(&logic).optimize(
            &actions,
            &[Target::Fastest, Target::Fastest],
            &[],
            &mut control,
        );
        assert!(!report.complete);
        assert!(report.run.is_valid());
        assert_eq!(report.logs[1].status, TargetStatus::Cancelled);
    }

    #[test]
    fn test_target_log_display() {
        let log = TargetLog {
            target: "fastest".to_string(),
            status: TargetStatus::Unchanged,
            message: "cannot be preponed".to_string(),
        };
        assert_eq!(log.to_string(), "fastest: cannot be preponed");
    }
}
