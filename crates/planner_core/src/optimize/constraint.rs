//! User constraints on action placement.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Candidate;
use crate::error::PlannerError;

/// How a constraint pins an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// Must not start earlier than in the baseline.
    After,
    /// Must start when it does in the baseline.
    At,
    /// Must not start later than in the baseline.
    Before,
    /// Delete the action before searching.
    Remove,
}

impl ConstraintKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::After => "after",
            Self::At => "at",
            Self::Before => "before",
            Self::Remove => "remove",
        }
    }
}

/// A constraint on one action of the baseline build order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraint {
    /// Index of the action in the baseline.
    pub index: usize,
    /// Constraint kind.
    pub kind: ConstraintKind,
}

impl Constraint {
    /// Create a constraint.
    #[must_use]
    pub const fn new(index: usize, kind: ConstraintKind) -> Self {
        Self { index, kind }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index, self.kind.as_str())
    }
}

impl FromStr for Constraint {
    type Err = PlannerError;

    /// Parse `INDEX:KIND`, e.g. `3:remove`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PlannerError::InvalidConstraint(s.to_string());
        let (index, kind) = s.split_once(':').ok_or_else(invalid)?;
        let index = index.trim().parse().map_err(|_| invalid())?;
        let kind = match kind.trim().to_ascii_lowercase().as_str() {
            "after" => ConstraintKind::After,
            "at" => ConstraintKind::At,
            "before" => ConstraintKind::Before,
            "remove" => ConstraintKind::Remove,
            _ => return Err(invalid()),
        };
        Ok(Self { index, kind })
    }
}

/// A timing constraint resolved against the baseline run.
#[derive(Debug, Clone, Copy)]
struct Pin {
    origin: usize,
    kind: ConstraintKind,
    reference: u32,
}

/// Constraints of one optimizer call, resolved against the baseline.
#[derive(Debug, Clone, Default)]
pub(crate) struct ConstraintSet {
    pins: Vec<Pin>,
    removals: Vec<usize>,
    tolerance: u32,
}

impl ConstraintSet {
    /// Resolve constraints against the baseline candidate.
    ///
    /// Fails with a readable reason for out-of-range indices, an action that
    /// is both removed and pinned, or a pinned action that never starts.
    pub(crate) fn resolve(
        constraints: &[Constraint],
        baseline: &Candidate,
        tolerance: u32,
    ) -> Result<Self, String> {
        let len = baseline.actions.len();
        let mut set = Self {
            pins: Vec::new(),
            removals: Vec::new(),
            tolerance,
        };

        for constraint in constraints {
            if constraint.index >= len {
                return Err(format!(
                    "constraint {constraint} is out of range for {len} action(s)"
                ));
            }
            if constraint.kind == ConstraintKind::Remove {
                if !set.removals.contains(&constraint.index) {
                    set.removals.push(constraint.index);
                }
                continue;
            }
            let reference = baseline
                .run
                .start_of(constraint.index)
                .ok_or_else(|| format!("action #{} never starts in the baseline", constraint.index))?;
            set.pins.push(Pin {
                origin: constraint.index,
                kind: constraint.kind,
                reference,
            });
        }

        if let Some(pin) = set.pins.iter().find(|p| set.removals.contains(&p.origin)) {
            return Err(format!("action #{} is both removed and pinned", pin.origin));
        }
        set.removals.sort_unstable();
        Ok(set)
    }

    /// Baseline indices to delete before searching.
    pub(crate) fn removals(&self) -> &[usize] {
        &self.removals
    }

    /// Whether the baseline action `origin` is pinned.
    pub(crate) fn is_pinned(&self, origin: usize) -> bool {
        self.pins.iter().any(|p| p.origin == origin)
    }

    /// Whether a candidate honours every pin.
    pub(crate) fn satisfied(&self, candidate: &Candidate) -> bool {
        self.pins.iter().all(|pin| {
            let Some(position) = candidate.position_of(pin.origin) else {
                return false;
            };
            let Some(start) = candidate.run.start_of(position) else {
                return false;
            };
            let not_early = start.saturating_add(self.tolerance) >= pin.reference;
            let not_late = start <= pin.reference.saturating_add(self.tolerance);
            match pin.kind {
                ConstraintKind::After => not_early,
                ConstraintKind::Before => not_late,
                ConstraintKind::At => not_early && not_late,
                ConstraintKind::Remove => true,
            }
        })
    }
}
