//! Cooperative cancellation for optimizer searches.
//!
//! The optimizer calls [`SearchControl::checkpoint`] after every candidate
//! simulation and between targets. Returning [`ControlFlow::Break`] stops
//! the search promptly; the optimizer then returns the best validated build
//! order found so far and flags the result as incomplete.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::action::Action;
use crate::simulation::{BuildOrderRun, GameLogic};

/// Progress reported at every checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchProgress {
    /// Simulations run so far.
    pub evaluations: usize,
    /// Index of the target being optimized.
    pub target: usize,
    /// Earliest terminal frame of any valid candidate so far.
    pub best_frame: Option<u32>,
}

/// Decides whether a search keeps going.
pub trait SearchControl {
    /// Called after every simulation and between targets.
    fn checkpoint(&mut self, progress: SearchProgress) -> ControlFlow<()>;
}

impl<F> SearchControl for F
where
    F: FnMut(SearchProgress) -> ControlFlow<()>,
{
    fn checkpoint(&mut self, progress: SearchProgress) -> ControlFlow<()> {
        self(progress)
    }
}

/// Never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl SearchControl for Unbounded {
    fn checkpoint(&mut self, _progress: SearchProgress) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

/// Cancellation flag shared with another thread or a UI.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

impl SearchControl for CancelToken {
    fn checkpoint(&mut self, _progress: SearchProgress) -> ControlFlow<()> {
        if self.is_cancelled() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

/// Cancels once a number of simulations has been run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationBudget {
    limit: usize,
}

impl EvaluationBudget {
    /// Allow `limit` simulations.
    #[must_use]
    pub const fn new(limit: usize) -> Self {
        Self { limit }
    }
}

impl SearchControl for EvaluationBudget {
    fn checkpoint(&mut self, progress: SearchProgress) -> ControlFlow<()> {
        if progress.evaluations >= self.limit {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

/// Bookkeeping of one optimizer call.
pub(crate) struct Search<'c> {
    control: &'c mut dyn SearchControl,
    evaluations: usize,
    target: usize,
    best_frame: Option<u32>,
    cancelled: bool,
}

impl<'c> Search<'c> {
    pub(crate) fn new(control: &'c mut dyn SearchControl) -> Self {
        Self {
            control,
            evaluations: 0,
            target: 0,
            best_frame: None,
            cancelled: false,
        }
    }

    /// Simulate a candidate and report progress.
    pub(crate) fn evaluate(&mut self, logic: &GameLogic, actions: &[Action]) -> BuildOrderRun {
        let run = logic.simulated_build_order(actions);
        self.evaluations += 1;
        if run.is_valid() {
            self.best_frame = Some(self.best_frame.map_or(run.frame, |f| f.min(run.frame)));
        }
        self.checkpoint();
        run
    }

    /// Report progress without a simulation.
    pub(crate) fn checkpoint(&mut self) {
        if self.cancelled {
            return;
        }
        let progress = SearchProgress {
            evaluations: self.evaluations,
            target: self.target,
            best_frame: self.best_frame,
        };
        if self.control.checkpoint(progress).is_break() {
            tracing::warn!(evaluations = self.evaluations, "Search cancelled");
            self.cancelled = true;
        }
    }

    pub(crate) fn set_target(&mut self, target: usize) {
        self.target = target;
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub(crate) fn evaluations(&self) -> usize {
        self.evaluations
    }
}
