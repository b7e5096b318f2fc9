//! Resource income model.
//!
//! Pure functions mapping worker, base and geyser counts to income per
//! second. Mineral income assumes the "human" saturation players actually
//! achieve: workers are split evenly between close and far patches, two per
//! patch, with any excess stacked as third workers.
//!
//! Rates come from community measurements of mining speed and are kept as
//! integer ratios so results are identical on every platform.

use serde::{Deserialize, Serialize};

use crate::math::{ratio, Fixed};

/// Close mineral patches per base.
pub const CLOSE_PATCHES: u32 = 4;

/// Far mineral patches per base.
pub const FAR_PATCHES: u32 = 4;

/// Workers that fully saturate the mineral line of one base.
pub const FULL_SATURATION: u32 = 3 * (CLOSE_PATCHES + FAR_PATCHES);

/// Workers that fully saturate one geyser.
pub const WORKERS_PER_GEYSER: u32 = 3;

/// Geysers that belong to one base.
pub const GEYSERS_PER_BASE: u32 = 2;

/// Long-distance geyser mining ratios (trip length relative to a base geyser),
/// in the order extra geysers are used. Stored as thousandths.
const LONG_DISTANCE_RATIOS: [i32; 4] = [8175, 8950, 10_400, 14_800];

/// Minerals per minute for a worker paired on a close patch (62.5).
fn close_pair_rate() -> Fixed {
    ratio(125, 2)
}

/// Minerals per minute for a worker paired on a far patch (54.75).
fn far_pair_rate() -> Fixed {
    ratio(219, 4)
}

/// Minerals per minute of a fully stacked patch.
fn three_worker_rate() -> Fixed {
    Fixed::from_num(145)
}

/// Marginal rate of a third worker on a patch.
fn third_worker_rate(pair_rate: Fixed) -> Fixed {
    (three_worker_rate() - pair_rate * 2).max(Fixed::ZERO)
}

/// Minerals per second contributed by one MULE.
#[must_use]
pub fn mule_rate() -> Fixed {
    ratio(225, 64)
}

/// Mineral income per second.
///
/// Workers beyond `24 * bases` do not mine. With several bases the first
/// base takes the remainder of an even split and all MULEs; this is an
/// approximation of how players spread workers, not an optimum.
#[must_use]
pub fn income_minerals(workers: u32, bases: u32, mules: u32) -> Fixed {
    if (workers == 0 && mules == 0) || bases == 0 {
        return Fixed::ZERO;
    }

    let workers = workers.min(FULL_SATURATION * bases);
    if bases > 1 {
        let per_base = workers / bases;
        let remainder = workers % bases;
        let first = income_minerals(per_base + remainder, 1, mules);
        let others = income_minerals(per_base, 1, 0) * Fixed::from_num(bases - 1);
        return first + others;
    }

    let mut far = workers * FAR_PATCHES / (CLOSE_PATCHES + FAR_PATCHES);
    let mut close = workers - far;
    let mut third_far = 0;
    let mut third_close = 0;
    if far > FAR_PATCHES * 2 {
        third_far = far - FAR_PATCHES * 2;
        far = FAR_PATCHES * 2;
    }
    if close > CLOSE_PATCHES * 2 {
        third_close = close - CLOSE_PATCHES * 2;
        close = CLOSE_PATCHES * 2;
    }

    let per_minute = close_pair_rate() * Fixed::from_num(close)
        + far_pair_rate() * Fixed::from_num(far)
        + third_worker_rate(far_pair_rate()) * Fixed::from_num(third_far)
        + third_worker_rate(close_pair_rate()) * Fixed::from_num(third_close);

    per_minute / Fixed::from_num(60) + mule_rate() * Fixed::from_num(mules)
}

/// Gas income per second of a single geyser.
#[must_use]
pub fn income_vespene_per_geyser(workers: u32) -> Fixed {
    match workers {
        0 => Fixed::ZERO,
        WORKERS_PER_GEYSER => ratio(27, 10),
        w => ratio(9833, 10_000) * Fixed::from_num(w),
    }
}

/// Gas income per second including long-distance geysers.
#[must_use]
pub fn income_vespene(workers: u32, geysers: u32, bases: u32) -> Fixed {
    IncomeModel::default().vespene(workers, geysers, bases)
}

/// Income model configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeModel {
    /// Whether geysers beyond two per base are mined from afar.
    pub long_distance_gas: bool,
}

impl Default for IncomeModel {
    fn default() -> Self {
        Self {
            long_distance_gas: true,
        }
    }
}

impl IncomeModel {
    /// Create a model with the given long-distance gas policy.
    #[must_use]
    pub const fn new(long_distance_gas: bool) -> Self {
        Self { long_distance_gas }
    }

    /// Mineral income per second.
    #[must_use]
    pub fn minerals(&self, workers: u32, bases: u32, mules: u32) -> Fixed {
        income_minerals(workers, bases, mules)
    }

    /// Gas income per second.
    ///
    /// Geysers at a base (two per base) are filled evenly first; any workers
    /// left over go to long-distance geysers in ratio order.
    #[must_use]
    pub fn vespene(&self, workers: u32, geysers: u32, bases: u32) -> Fixed {
        if workers == 0 || geysers == 0 {
            return Fixed::ZERO;
        }

        let close_geysers = geysers.min(bases * GEYSERS_PER_BASE);
        let mut income = Fixed::ZERO;
        let mut remaining = workers;
        if close_geysers > 0 {
            let close_workers = (WORKERS_PER_GEYSER * close_geysers).min(workers);
            let even = close_workers / close_geysers;
            let left = close_workers % close_geysers;
            let marginal =
                income_vespene_per_geyser(even + 1) - income_vespene_per_geyser(even);
            income += income_vespene_per_geyser(even) * Fixed::from_num(close_geysers)
                + marginal * Fixed::from_num(left);
            remaining -= close_workers;
        }

        if !self.long_distance_gas {
            return income;
        }

        let saturated = income_vespene_per_geyser(WORKERS_PER_GEYSER);
        let far_geysers = (geysers - close_geysers) as usize;
        for &thousandths in LONG_DISTANCE_RATIOS.iter().take(far_geysers) {
            let capacity = (thousandths as u32 * WORKERS_PER_GEYSER) / 1000;
            let assigned = capacity.min(remaining);
            if assigned == 0 {
                break;
            }
            remaining -= assigned;
            income += saturated * Fixed::from_num(assigned) / Fixed::from_num(WORKERS_PER_GEYSER)
                / ratio(thousandths, 1000);
        }
        income
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn per_minute(value: Fixed) -> Fixed {
        value * Fixed::from_num(60)
    }

    #[test]
    fn test_zero_inputs_yield_zero() {
        assert_eq!(income_minerals(0, 1, 0), Fixed::ZERO);
        assert_eq!(income_minerals(12, 0, 0), Fixed::ZERO);
        assert_eq!(income_minerals(12, 0, 2), Fixed::ZERO);
        assert_eq!(income_vespene(0, 2, 1), Fixed::ZERO);
        assert_eq!(income_vespene(3, 0, 1), Fixed::ZERO);
    }

    #[test]
    fn test_starting_workers_income() {
        // 6 close and 6 far workers
        let expected = ratio(125, 2) * Fixed::from_num(6) + ratio(219, 4) * Fixed::from_num(6);
        let diff = (per_minute(income_minerals(12, 1, 0)) - expected).abs();
        assert!(diff < ratio(1, 1000), "diff {diff}");
    }

    #[test]
    fn test_oversaturation_is_ignored() {
        assert_eq!(income_minerals(24, 1, 0), income_minerals(40, 1, 0));
        assert_eq!(income_minerals(48, 2, 0), income_minerals(60, 2, 0));
    }

    #[test]
    fn test_full_saturation_rate() {
        // every patch stacked with three workers: 8 * 145 per minute
        let diff = (per_minute(income_minerals(24, 1, 0)) - Fixed::from_num(8 * 145)).abs();
        assert!(diff < ratio(1, 1000), "diff {diff}");
    }

    #[test]
    fn test_mules_only() {
        assert_eq!(income_minerals(0, 1, 1), mule_rate());
        assert_eq!(income_minerals(0, 3, 2), mule_rate() * 2);
    }

    #[test]
    fn test_second_base_splits_workers() {
        let two_bases = income_minerals(32, 2, 0);
        let split = income_minerals(16, 1, 0) * 2;
        assert_eq!(two_bases, split);
        assert!(two_bases > income_minerals(32, 1, 0));
    }

    #[test]
    fn test_gas_per_geyser() {
        assert_eq!(income_vespene_per_geyser(0), Fixed::ZERO);
        assert_eq!(income_vespene_per_geyser(3), ratio(27, 10));
        assert_eq!(income_vespene_per_geyser(2), ratio(9833, 10_000) * 2);
    }

    #[test]
    fn test_gas_spreads_over_close_geysers() {
        // 4 workers on 2 geysers: 2 + 2
        assert_eq!(income_vespene(4, 2, 1), income_vespene_per_geyser(2) * 2);
        // 5 workers: 2 + 3
        assert_eq!(
            income_vespene(5, 2, 1),
            income_vespene_per_geyser(2) + income_vespene_per_geyser(3)
        );
        // saturated geysers ignore extra workers without far geysers
        assert_eq!(income_vespene(9, 2, 1), income_vespene(6, 2, 1));
    }

    #[test]
    fn test_long_distance_gas() {
        let near_only = income_vespene(6, 2, 1);
        let with_far = income_vespene(9, 3, 1);
        assert!(with_far > near_only);

        let disabled = IncomeModel::new(false).vespene(9, 3, 1);
        assert_eq!(disabled, near_only);
    }

    #[test]
    fn test_long_distance_capacity() {
        // first far geyser takes floor(8.175 * 3) = 24 workers
        let at_capacity = income_vespene(6 + 24, 3, 1);
        assert_eq!(income_vespene(6 + 30, 3, 1), at_capacity);
    }
}
