//! Timeline and resource history produced by a simulation run.

use serde::{Deserialize, Serialize};

use crate::data::EntryKind;

/// A committed action on the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    /// Index of the action in the build order.
    pub id: usize,
    /// Display category.
    pub kind: EntryKind,
    /// Catalog entry name.
    pub name: String,
    /// Frame the action was committed.
    pub start: u32,
    /// Frame the action completed. `None` for instant actions and for items
    /// still in production when the run stopped.
    pub end: Option<u32>,
    /// Supply used when the action started.
    pub supply: u32,
    /// Icon reference.
    pub image_ref: String,
    /// Minerals paid.
    pub minerals: u32,
    /// Gas paid.
    pub gas: u32,
}

impl Event {
    /// Frames between start and completion.
    #[must_use]
    pub fn duration(&self) -> Option<u32> {
        self.end.map(|end| end - self.start)
    }
}

/// State of the economy at the end of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceSample {
    /// Whole minerals banked.
    pub minerals: u32,
    /// Whole gas banked.
    pub vespene: u32,
    /// Supply cap minus supply used.
    pub supply_left: i32,
    /// Race-specific resource (MULE or chrono charges, or larva).
    pub race_specific: u32,
}

/// Per-frame resource history.
///
/// The four sequences always have the same length; sample `i` is the state
/// at the end of frame `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceHistory {
    /// Minerals per frame.
    pub minerals: Vec<u32>,
    /// Gas per frame.
    pub vespene: Vec<u32>,
    /// Remaining supply per frame.
    pub supply_left: Vec<i32>,
    /// Race-specific resource per frame.
    pub race_specific: Vec<u32>,
}

impl ResourceHistory {
    /// Append a sample.
    pub fn push(&mut self, sample: ResourceSample) {
        self.minerals.push(sample.minerals);
        self.vespene.push(sample.vespene);
        self.supply_left.push(sample.supply_left);
        self.race_specific.push(sample.race_specific);
    }

    /// Number of frames recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.minerals.len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.minerals.is_empty()
    }

    /// Sample at the end of `frame`.
    #[must_use]
    pub fn sample(&self, frame: usize) -> Option<ResourceSample> {
        Some(ResourceSample {
            minerals: *self.minerals.get(frame)?,
            vespene: *self.vespene.get(frame)?,
            supply_left: *self.supply_left.get(frame)?,
            race_specific: *self.race_specific.get(frame)?,
        })
    }
}

/// Change of supply used or supply cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SupplyChange {
    /// Frame of the change.
    pub frame: u32,
    /// Supply used after the change.
    pub used: u32,
    /// Supply cap after the change.
    pub cap: u32,
}
