// THEORY:
// The `assignment` module decides which indicator "owns" which region. The
// decision has to look arbitrary to the user but be perfectly reproducible:
// the same photo with the same indicators must always produce the same face.
//
// Key architectural principles:
// 1.  **Content-Derived Seed**: The seed hashes the photo bytes, then every
//     indicator's identity and values in list order, then a shuffle salt. Any
//     change to any of those yields a new, but again stable, mapping.
// 2.  **Shuffle then Round Robin**: The indicator list is permuted with
//     `seeded_shuffle` and dealt out over the unlocked regions in catalog order.
//     With fewer indicators than regions, indicators repeat.
// 3.  **Fixed-Size Table**: `RegionMap` is an array keyed by `RegionId`, so a
//     lookup can never miss a key or be handed an unknown region name. Slots
//     store indices into the caller's indicator snapshot.

use crate::core_modules::hashing::{PolyHasher, seeded_shuffle};
use crate::core_modules::indicator::Indicator;
use crate::core_modules::region::{RegionId, unlocked_regions};

/// Which indicator (by index into the render's indicator list) drives each region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegionMap {
    slots: [Option<usize>; RegionId::COUNT],
    seed: u32,
}

impl RegionMap {
    /// A map with no assignments.
    pub fn empty(seed: u32) -> Self {
        Self {
            slots: [None; RegionId::COUNT],
            seed,
        }
    }

    pub fn assign(&mut self, region: RegionId, indicator_index: usize) {
        self.slots[region.index()] = Some(indicator_index);
    }

    pub fn index_of(&self, region: RegionId) -> Option<usize> {
        self.slots[region.index()]
    }

    /// The indicator assigned to `region`, resolved against `indicators`.
    pub fn indicator_for<'a>(&self, region: RegionId, indicators: &'a [Indicator]) -> Option<&'a Indicator> {
        self.index_of(region).and_then(|i| indicators.get(i))
    }

    /// The seed the map was built from. Downstream per-region randomness derives from it.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Assigned regions in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (RegionId, usize)> + '_ {
        RegionId::ALL
            .iter()
            .filter_map(|&id| self.index_of(id).map(|i| (id, i)))
    }
}

/// Seed for a (photo, indicator list, salt) triple.
pub fn assignment_seed(photo_bytes: &[u8], indicators: &[Indicator], salt: u32) -> u32 {
    let mut hasher = PolyHasher::new();
    hasher.update(photo_bytes);
    assignment_seed_from(hasher, indicators, salt)
}

/// Same as [`assignment_seed`], continuing from a hasher that already consumed the photo.
pub fn assignment_seed_from(mut hasher: PolyHasher, indicators: &[Indicator], salt: u32) -> u32 {
    for indicator in indicators {
        hasher
            .update(indicator.id.as_bytes())
            .update(format!(":{}:{}:{};", indicator.current, indicator.min, indicator.max).as_bytes());
    }
    if salt != 0 {
        hasher.update(format!("#{salt}").as_bytes());
    }
    hasher.finish()
}

/// Shuffles the indicator list with `seed` and deals it round-robin over the
/// unlocked, non-background regions.
pub fn build_region_map(indicators: &[Indicator], seed: u32) -> RegionMap {
    let mut map = RegionMap::empty(seed);
    if indicators.is_empty() {
        return map;
    }

    let order: Vec<usize> = (0..indicators.len()).collect();
    let shuffled = seeded_shuffle(&order, seed);
    let targets = unlocked_regions(indicators.len())
        .into_iter()
        .filter(|r| r.id != RegionId::Background);

    for (slot, region) in targets.enumerate() {
        map.assign(region.id, shuffled[slot % shuffled.len()]);
    }
    map
}
