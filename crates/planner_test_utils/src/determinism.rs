//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulator produces identical
//! runs given identical inputs.
//!
//! # Testing Strategy
//!
//! The optimizer compares thousands of candidate runs and must be able to
//! trust that a difference in score comes from the build order alone.
//! Sources of non-determinism include:
//!
//! - **Floating-point math**: We use fixed-point arithmetic via
//!   [`planner_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Catalogs use `BTreeMap` and entities are kept in creation order.
//!
//! - **Shared state between runs**: Every run starts from a fresh state.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual rules (income, production, energy)
//! 2. **Property tests**: Random build orders still produce deterministic runs
//! 3. **Integration tests**: Full openings are reproducible
//! 4. **Parallel tests**: Running N simulations on threads all match

use std::thread;

use planner_core::action::Action;
use planner_core::simulation::{BuildOrderRun, GameLogic};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Terminal frame of the first run.
    pub frames: u32,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Frames: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.frames,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run something multiple times and verify it hashes the same every time.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `run` - Function producing a result
/// * `hash` - Function to compute the result's hash
pub fn verify_determinism<S, Run, HashFn>(runs: usize, run: Run, hash: HashFn) -> DeterminismResult
where
    Run: Fn() -> S,
    HashFn: Fn(&S) -> u64,
{
    let hashes: Vec<u64> = (0..runs).map(|_| hash(&run())).collect();
    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        frames: 0,
    }
}

/// Simulate a build order several times and compare the runs.
///
/// Runs are compared by [`BuildOrderRun::state_hash`] and by their bincode
/// bytes, so a difference in any event or history sample is caught.
#[must_use]
pub fn verify_build_order_determinism(
    logic: &GameLogic,
    actions: &[Action],
    runs: usize,
) -> DeterminismResult {
    let results: Vec<BuildOrderRun> = (0..runs)
        .map(|_| logic.simulated_build_order(actions))
        .collect();
    let hashes: Vec<u64> = results.iter().map(BuildOrderRun::state_hash).collect();
    let bytes: Vec<Option<Vec<u8>>> = results.iter().map(|r| r.to_bytes().ok()).collect();

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1])
        && bytes.iter().all(Option::is_some)
        && bytes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        frames: results.first().map_or(0, |r| r.frame),
    }
}

/// Result of parallel simulation runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// State hash of each simulation.
    pub hashes: Vec<u64>,
    /// Number of simulations run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all simulations produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all simulations matched.
    ///
    /// # Panics
    ///
    /// Panics if simulations produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel simulations diverged!\n\
                 Simulations: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_sims,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Simulate the same build order on `num_sims` scoped threads.
///
/// # Panics
///
/// Panics if a simulation thread panics.
#[must_use]
pub fn run_parallel_simulations(
    logic: &GameLogic,
    actions: &[Action],
    num_sims: usize,
) -> ParallelSimResult {
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| s.spawn(|| logic.simulated_build_order(actions).state_hash()))
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    ParallelSimResult { hashes, num_sims }
}

/// Compare two runs frame by frame, finding the first divergence.
///
/// # Returns
///
/// `None` if the resource histories match, `Some(frame)` for the first
/// frame whose sample differs (or where one history ends early).
#[must_use]
pub fn find_first_divergence(a: &BuildOrderRun, b: &BuildOrderRun) -> Option<u32> {
    let len = a.history.len().max(b.history.len());
    (0..len)
        .find(|&i| a.history.sample(i) != b.history.sample(i))
        .map(|i| u32::try_from(i).unwrap_or(u32::MAX))
}

/// Verify that a bincode round-trip preserves a run exactly.
#[must_use]
pub fn verify_serialization_determinism(run: &BuildOrderRun) -> bool {
    let Ok(bytes) = run.to_bytes() else {
        return false;
    };
    let Ok(restored) = BuildOrderRun::from_bytes(&bytes) else {
        return false;
    };
    restored.state_hash() == run.state_hash() && restored == *run
}

/// Proptest strategies for determinism testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of the simulator and optimizer.
pub mod strategies {
    use proptest::prelude::*;
    use planner_core::race::Race;
    use planner_core::simulation::GameLogic;

    /// Any race.
    pub fn arb_race() -> impl Strategy<Value = Race> {
        prop_oneof![Just(Race::Terran), Just(Race::Protoss), Just(Race::Zerg)]
    }

    /// Worker counts from none to well past saturation.
    ///
    /// Range: 0 to 100
    pub fn arb_workers() -> impl Strategy<Value = u32> {
        0u32..100u32
    }

    /// Base counts.
    ///
    /// Range: 0 to 5
    pub fn arb_bases() -> impl Strategy<Value = u32> {
        0u32..6u32
    }

    /// Names of every non-shortcut entry of the logic's race.
    #[must_use]
    pub fn entry_names(logic: &GameLogic) -> Vec<String> {
        logic
            .data()
            .entries
            .iter()
            .filter(|e| !e.is_shortcut())
            .map(|e| e.name.clone())
            .collect()
    }

    /// A random list of entry names of the logic's race.
    ///
    /// Most such lists fail somewhere; that is part of what is tested.
    pub fn arb_build_order(
        logic: &GameLogic,
        max_len: usize,
    ) -> impl Strategy<Value = Vec<String>> {
        proptest::collection::vec(proptest::sample::select(entry_names(logic)), 0..max_len)
    }

    /// A random list drawn only from workers and the supply structure.
    ///
    /// Such lists are usually valid, so they exercise long runs.
    pub fn arb_economy_build_order(
        logic: &GameLogic,
        max_len: usize,
    ) -> impl Strategy<Value = Vec<String>> {
        let data = logic.data();
        let names = vec![data.worker.clone(), data.supply_structure.clone()];
        proptest::collection::vec(proptest::sample::select(names), 0..max_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{build_order, logic, opening, terran_logic, zerg_logic};
    use planner_core::race::Race;
    use proptest::prelude::*;

    // =========================================================================
    // Basic determinism tests
    // =========================================================================

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, || 100u64, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_detects_non_determinism() {
        let counter = std::cell::Cell::new(0u64);
        let result = verify_determinism(
            2,
            || {
                counter.set(counter.get() + 1);
                counter.get()
            },
            |n| *n,
        );
        assert!(!result.is_deterministic);
        assert_eq!(result.unique_hashes().len(), 2);
    }

    #[test]
    fn test_empty_build_order_determinism() {
        let logic = terran_logic();
        verify_build_order_determinism(&logic, &[], 3).assert_deterministic();
    }

    #[test]
    fn test_openings_are_deterministic() {
        for race in Race::ALL {
            let logic = logic(race);
            let actions = build_order(&logic, opening(race));
            let result = verify_build_order_determinism(&logic, &actions, 3);
            result.assert_deterministic();
            assert!(result.frames > 0);
        }
    }

    #[test]
    fn test_find_divergence() {
        let logic = terran_logic();
        let a = logic.simulated_build_order(&build_order(&logic, &["SCV", "SupplyDepot"]));
        let b = logic.simulated_build_order(&build_order(&logic, &["SCV", "SupplyDepot"]));
        assert!(find_first_divergence(&a, &b).is_none());

        let c = logic.simulated_build_order(&build_order(&logic, &["SupplyDepot", "SCV"]));
        assert_eq!(find_first_divergence(&a, &c), Some(0));
    }

    // =========================================================================
    // Serialization round-trip tests
    // =========================================================================

    #[test]
    fn test_serialization_preserves_runs() {
        let logic = zerg_logic();
        let run = logic.simulated_build_order(&build_order(&logic, opening(Race::Zerg)));
        assert!(verify_serialization_determinism(&run));

        let failed = logic.simulated_build_order(&build_order(&logic, &["Roach"]));
        assert!(!failed.is_valid());
        assert!(verify_serialization_determinism(&failed));
    }

    // =========================================================================
    // Parallel tests
    // =========================================================================

    #[test]
    fn test_parallel_simulations() {
        let logic = terran_logic();
        let actions = build_order(&logic, opening(Race::Terran));
        let result = run_parallel_simulations(&logic, &actions, 4);
        assert_eq!(result.num_sims, 4);
        result.assert_deterministic();
    }

    // =========================================================================
    // Property-based tests using proptest
    // =========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Random build orders, valid or not, replay identically.
        #[test]
        fn prop_random_build_orders_are_deterministic(
            (race, names) in strategies::arb_race().prop_flat_map(|race| {
                let logic = logic(race);
                (Just(race), strategies::arb_build_order(&logic, 12))
            }),
        ) {
            let logic = logic(race);
            let actions = logic.actions(&names).unwrap();
            let result = verify_build_order_determinism(&logic, &actions, 2);
            prop_assert!(result.is_deterministic);
        }

        /// Events never start before the previous action's event.
        #[test]
        fn prop_events_are_committed_in_order(
            names in strategies::arb_economy_build_order(&terran_logic(), 10),
        ) {
            let logic = terran_logic();
            let actions = logic.actions(&names).unwrap();
            let run = logic.simulated_build_order(&actions);
            for pair in run.events.windows(2) {
                prop_assert!(pair[0].start <= pair[1].start);
            }
            for (index, event) in run.events.iter().enumerate() {
                prop_assert_eq!(event.id, index);
            }
        }
    }
}
