// THEORY:
// The `voronoi` module subdivides a colored region into cells. It never builds
// an explicit diagram: each pixel simply asks which seed it is closest to and
// lets that seed nudge the region's magnitude.
//
// Key architectural principles:
// 1.  **Clipped Rejection Sampling**: Candidate seeds are drawn in the unit
//     square from a `SeededRng` and kept only when they land inside the
//     region polygon. Attempts are capped at five per requested seed, so small
//     regions legitimately come back under-filled.
// 2.  **Magnitude Drives Texture**: Stronger indicators get more seeds (denser
//     cells) and more jitter. Export resolution uses its own, denser formula
//     so a large render gains cells instead of merely blowing them up.
// 3.  **Ephemeral**: Seed sets are rebuilt every render pass from (region,
//     seed, magnitude) and never stored.

use crate::core_modules::assignment::RegionMap;
use crate::core_modules::compositor::Resolution;
use crate::core_modules::hashing::{SeededRng, hash};
use crate::core_modules::indicator::{Indicator, normalize};
use crate::core_modules::region::{Point, Region, RegionId, point_in_polygon};

const ATTEMPTS_PER_SEED: usize = 5;
const JITTER_SPAN: f64 = 0.1;

/// Draws up to `count` seeds inside `polygon` and returns them in pixel space.
///
/// `bounds` is the `(width, height)` the normalized points are scaled by.
pub fn generate_clipped_seeds(count: usize, polygon: &[Point], bounds: (f64, f64), seed: u32, magnitude: f64) -> Vec<Point> {
    let mut rng = SeededRng::new(seed);
    let mut seeds = Vec::with_capacity(count);
    let max_attempts = count * ATTEMPTS_PER_SEED;
    let mut attempts = 0;

    while seeds.len() < count && attempts < max_attempts {
        attempts += 1;
        let candidate = Point::new(rng.next_f64(), rng.next_f64());
        if !point_in_polygon(candidate, polygon) {
            continue;
        }
        let jitter_x = (rng.next_f64() - 0.5) * magnitude * JITTER_SPAN;
        let jitter_y = (rng.next_f64() - 0.5) * magnitude * JITTER_SPAN;
        seeds.push(Point::new(candidate.x + jitter_x, candidate.y + jitter_y).scaled(bounds.0, bounds.1));
    }
    seeds
}

/// Squared-distance nearest seed. Ties go to the earliest seed in the list.
pub fn find_nearest_seed(point: Point, seeds: &[Point]) -> Option<Point> {
    let mut best: Option<(Point, f64)> = None;
    for seed in seeds {
        let d = point.distance_squared(seed);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((*seed, d)),
        }
    }
    best.map(|(seed, _)| seed)
}

/// Seed density for `magnitude` at `resolution`.
pub fn seed_count(magnitude: f64, resolution: Resolution) -> usize {
    let (per_unit, base) = match resolution {
        Resolution::Preview => (10.0, 2),
        Resolution::Export => (20.0, 5),
    };
    (magnitude.clamp(0.0, 1.0) * per_unit).ceil() as usize + base
}

/// Secondary magnitude of a seed: `hash("<x>,<y>") mod 100 / 100`.
pub fn seed_magnitude(seed: Point) -> f64 {
    (hash(format!("{},{}", seed.x, seed.y)) % 100) as f64 / 100.0
}

/// Per-region seed lists for one render pass.
#[derive(Debug, Clone, Default)]
pub struct SeedSets {
    sets: [Vec<Point>; RegionId::COUNT],
}

impl SeedSets {
    /// Builds seed lists for every assigned, non-background region in `regions`.
    pub fn build(
        regions: &[Region],
        indicators: &[Indicator],
        region_map: &RegionMap,
        resolution: Resolution,
        bounds: (f64, f64),
    ) -> Self {
        let mut sets: [Vec<Point>; RegionId::COUNT] = Default::default();
        for region in regions {
            if region.id == RegionId::Background {
                continue;
            }
            let Some(indicator) = region_map.indicator_for(region.id, indicators) else {
                continue;
            };
            let magnitude = normalize(indicator);
            let region_seed = hash(format!("{}:{}", region_map.seed(), region.id.name()));
            sets[region.id.index()] = generate_clipped_seeds(
                seed_count(magnitude, resolution),
                &region.polygon,
                bounds,
                region_seed,
                magnitude,
            );
        }
        Self { sets }
    }

    /// The seed list for `region`, or `None` when it has no seeds.
    pub fn get(&self, region: RegionId) -> Option<&[Point]> {
        let set = &self.sets[region.index()];
        (!set.is_empty()).then_some(set.as_slice())
    }

    pub fn total(&self) -> usize {
        self.sets.iter().map(Vec::len).sum()
    }
}
