//! Build order actions.

use serde::{Deserialize, Serialize};

use crate::data::{EntryData, EntryKind};

/// One step of a build order.
///
/// Actions are identified by their position in the list; two actions with
/// the same name are different steps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    /// Catalog entry name.
    pub name: String,
    /// Entry category.
    pub kind: EntryKind,
}

impl Action {
    /// Create an action.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Create the action that builds a catalog entry.
    #[must_use]
    pub fn from_entry(entry: &EntryData) -> Self {
        Self::new(entry.name.clone(), entry.kind)
    }
}

/// Move the element at `from` to the earlier position `to`.
///
/// Elements in between shift one place later. `from` must be in bounds and
/// `to <= from`.
#[must_use]
pub fn move_earlier<T: Clone>(items: &[T], from: usize, to: usize) -> Vec<T> {
    debug_assert!(to <= from && from < items.len());
    let mut moved = Vec::with_capacity(items.len());
    moved.extend_from_slice(&items[..to]);
    moved.push(items[from].clone());
    moved.extend_from_slice(&items[to..from]);
    moved.extend_from_slice(&items[from + 1..]);
    moved
}
