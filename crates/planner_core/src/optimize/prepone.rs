//! Moving a single action earlier.

use serde::{Deserialize, Serialize};

use super::constraint::ConstraintSet;
use super::control::{Search, SearchControl};
use super::{Candidate, Optimizer};
use crate::action::Action;
use crate::simulation::BuildOrderRun;

/// How far an action may be moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PreponeMode {
    /// Earliest finishing position; ties go to the farther move.
    #[default]
    Fastest,
    /// Farthest position reached before the first candidate that fails or
    /// finishes later than the tolerance allows.
    MinimalDisturbance,
    /// As `MinimalDisturbance`, also stopping at the first candidate that
    /// delays another action beyond the tolerance.
    Strict,
}

/// Outcome of a prepone request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreponeOutcome {
    /// The action moved.
    Moved {
        /// Original index.
        from: usize,
        /// New index.
        to: usize,
        /// Positions moved.
        distance: usize,
    },
    /// No earlier position is acceptable; the build order is unchanged.
    CannotPrepone,
}

/// Result of [`Optimizer::prepone`].
#[derive(Debug, Clone)]
pub struct PreponeResult {
    /// Resulting build order.
    pub actions: Vec<Action>,
    /// Its simulation.
    pub run: BuildOrderRun,
    /// What happened.
    pub outcome: PreponeOutcome,
    /// False when the search was cancelled.
    pub complete: bool,
}

impl Optimizer<'_> {
    /// Move the action at `index` earlier according to `mode`.
    ///
    /// Every earlier position is simulated as its own candidate list. An
    /// invalid input build order or an `index` of 0 or out of range yields
    /// [`PreponeOutcome::CannotPrepone`].
    pub fn prepone(
        &self,
        actions: &[Action],
        index: usize,
        mode: PreponeMode,
        control: &mut dyn SearchControl,
    ) -> PreponeResult {
        let mut search = Search::new(control);
        let base = Candidate::baseline(&mut search, self.logic, actions);
        let set = ConstraintSet::default();

        let found = if base.run.is_valid() && index > 0 && index < actions.len() {
            self.prepone_candidate(&mut search, &base, index, mode, &set)
        } else {
            None
        };
        let complete = !search.is_cancelled();

        match found {
            Some((candidate, to)) => {
                tracing::debug!(index, to, ?mode, "Preponed action");
                PreponeResult {
                    actions: candidate.actions,
                    run: candidate.run,
                    outcome: PreponeOutcome::Moved {
                        from: index,
                        to,
                        distance: index - to,
                    },
                    complete,
                }
            }
            None => PreponeResult {
                actions: base.actions,
                run: base.run,
                outcome: PreponeOutcome::CannotPrepone,
                complete,
            },
        }
    }

    /// Best earlier position for the action at `index`, with its candidate.
    pub(crate) fn prepone_candidate(
        &self,
        search: &mut Search<'_>,
        base: &Candidate,
        index: usize,
        mode: PreponeMode,
        set: &ConstraintSet,
    ) -> Option<(Candidate, usize)> {
        let tolerance = self.tolerance();
        let frame_limit = base.run.frame.saturating_add(tolerance);
        let mut bound = base.run.frame;
        let mut accepted = None;

        for to in (0..index).rev() {
            let candidate = base.moved(search, self.logic, index, to);
            if search.is_cancelled() {
                break;
            }
            let ok = candidate.run.is_valid() && set.satisfied(&candidate);
            match mode {
                PreponeMode::Fastest => {
                    if ok && candidate.run.frame <= bound {
                        bound = candidate.run.frame;
                        accepted = Some((candidate, to));
                    }
                }
                PreponeMode::MinimalDisturbance | PreponeMode::Strict => {
                    if !ok || candidate.run.frame > frame_limit {
                        break;
                    }
                    if mode == PreponeMode::Strict && delays_others(base, &candidate, tolerance) {
                        break;
                    }
                    accepted = Some((candidate, to));
                }
            }
        }
        accepted
    }
}

/// Whether any action except the last one starts later than in `base` by
/// more than `tolerance` frames.
fn delays_others(base: &Candidate, candidate: &Candidate, tolerance: u32) -> bool {
    let last = base.ids.last().copied();
    candidate.ids.iter().enumerate().any(|(position, &id)| {
        if Some(id) == last {
            return false;
        }
        let before = base.position_of(id).and_then(|p| base.run.start_of(p));
        match (before, candidate.run.start_of(position)) {
            (Some(before), Some(after)) => after > before.saturating_add(tolerance),
            _ => true,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::optimize::{EvaluationBudget, Unbounded};
    use crate::race::Race;
    use crate::simulation::GameLogic;

    fn terran() -> GameLogic {
        GameLogic::new(Catalog::builtin().unwrap(), Race::Terran).unwrap()
    }

    #[test]
    fn test_cannot_prepone_past_requirement() {
        let logic = terran();
        let actions = logic.actions(&["SupplyDepot", "Barracks"]).unwrap();
        let result = Optimizer::new(&logic).prepone(&actions, 1, PreponeMode::Fastest, &mut Unbounded);
        assert_eq!(result.outcome, PreponeOutcome::CannotPrepone);
        assert_eq!(result.actions, actions);
        assert!(result.complete);
    }

    #[test]
    fn test_cannot_prepone_first_action() {
        let logic = terran();
        let actions = logic.actions(&["SCV", "SCV"]).unwrap();
        for index in [0, 2, 9] {
            let result = Optimizer::new(&logic).prepone(&actions, index, PreponeMode::Fastest, &mut Unbounded);
            assert_eq!(result.outcome, PreponeOutcome::CannotPrepone);
        }
    }

    #[test]
    fn test_fastest_moves_depot_before_workers() {
        let logic = terran();
        let actions = logic
            .actions(&["SCV", "SCV", "SCV", "SupplyDepot", "Barracks"])
            .unwrap();
        let baseline = logic.simulated_build_order(&actions);
        let result = Optimizer::new(&logic).prepone(&actions, 3, PreponeMode::Fastest, &mut Unbounded);

        match result.outcome {
            PreponeOutcome::Moved { from, to, distance } => {
                assert_eq!(from, 3);
                assert!(to < 3);
                assert_eq!(distance, from - to);
                assert_eq!(result.actions[to].name, "SupplyDepot");
            }
            PreponeOutcome::CannotPrepone => panic!("depot should move"),
        }
        assert!(result.run.is_valid());
        assert!(result.run.frame <= baseline.frame);
    }

    #[test]
    fn test_minimal_disturbance_stays_within_tolerance() {
        let logic = terran();
        let actions = logic
            .actions(&["SCV", "SCV", "SCV", "SupplyDepot", "Barracks"])
            .unwrap();
        let baseline = logic.simulated_build_order(&actions);
        let tolerance = logic.optimize_settings().tolerance_frames;
        let optimizer = Optimizer::new(&logic);

        for mode in [PreponeMode::MinimalDisturbance, PreponeMode::Strict] {
            let result = optimizer.prepone(&actions, 3, mode, &mut Unbounded);
            assert!(result.run.is_valid());
            assert!(result.run.frame <= baseline.frame + tolerance);
        }
    }

    #[test]
    fn test_strict_refuses_to_delay_earlier_actions() {
        let logic = terran();
        let actions = logic.actions(&["SCV", "SCV", "SupplyDepot"]).unwrap();
        let baseline = logic.simulated_build_order(&actions);
        let tolerance = logic.optimize_settings().tolerance_frames;
        let optimizer = Optimizer::new(&logic);

        // The depot fits before the second SCV, but spends the minerals it needed.
        let minimal = optimizer.prepone(&actions, 2, PreponeMode::MinimalDisturbance, &mut Unbounded);
        assert_eq!(
            minimal.outcome,
            PreponeOutcome::Moved {
                from: 2,
                to: 1,
                distance: 1
            }
        );
        assert!(minimal.run.frame <= baseline.frame + tolerance);
        let second_scv = minimal.run.start_of(2).unwrap();
        assert!(second_scv > baseline.start_of(1).unwrap() + tolerance);

        let strict = optimizer.prepone(&actions, 2, PreponeMode::Strict, &mut Unbounded);
        assert_eq!(strict.outcome, PreponeOutcome::CannotPrepone);
        assert_eq!(strict.actions, actions);
        for index in 0..actions.len() {
            assert_eq!(strict.run.start_of(index), baseline.start_of(index));
        }
    }

    #[test]
    fn test_delays_others_ignores_last_action() {
        let logic = terran();
        let actions = logic.actions(&["SCV", "SCV", "SupplyDepot"]).unwrap();
        let mut control = Unbounded;
        let mut search = Search::new(&mut control);
        let base = Candidate::baseline(&mut search, &logic, &actions);
        let tolerance = logic.optimize_settings().tolerance_frames;

        assert!(!delays_others(&base, &base, tolerance));
        let moved = base.moved(&mut search, &logic, 2, 1);
        assert!(delays_others(&base, &moved, tolerance));
    }

    #[test]
    fn test_budget_marks_incomplete() {
        let logic = terran();
        let actions = logic
            .actions(&["SCV", "SCV", "SCV", "SupplyDepot"])
            .unwrap();
        let mut budget = EvaluationBudget::new(2);
        let result = Optimizer::new(&logic).prepone(&actions, 3, PreponeMode::Fastest, &mut budget);
        assert!(!result.complete);
        assert!(result.run.is_valid());
    }
}
