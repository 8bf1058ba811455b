use iyf_portrait::core_modules::affine_warp::Affine;
use iyf_portrait::core_modules::hashing::{SeededRng, hash, seeded_shuffle};
use iyf_portrait::core_modules::indicator::{Indicator, IndicatorCategory, normalize};
use iyf_portrait::core_modules::region::{
    Point, REGION_CATALOG, RegionId, Tier, point_in_polygon, region_at, unlocked_regions,
};
use iyf_portrait::core_modules::voronoi::find_nearest_seed;
use proptest::prelude::*;

fn finite() -> impl Strategy<Value = f64> {
    -1.0e6..1.0e6
}

fn point(range: f64) -> impl Strategy<Value = Point> {
    (-range..range, -range..range).prop_map(|(x, y)| Point::new(x, y))
}

fn cross(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

proptest! {
    #[test]
    fn normalize_is_bounded(current in finite(), min in finite(), max in finite()) {
        let m = normalize(&Indicator::new("x", current, min, max, IndicatorCategory::Growth));
        prop_assert!((0.0..=1.0).contains(&m));
        if max <= min {
            prop_assert_eq!(m, 0.5);
        }
    }

    #[test]
    fn normalize_is_monotonic(a in finite(), b in finite(), min in -100.0..0.0f64, span in 0.001..200.0f64) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let max = min + span;
        let m_lo = normalize(&Indicator::new("x", lo, min, max, IndicatorCategory::Social));
        let m_hi = normalize(&Indicator::new("x", hi, min, max, IndicatorCategory::Social));
        prop_assert!(m_lo <= m_hi);
    }

    #[test]
    fn rng_is_reproducible(seed in any::<u32>()) {
        let a: Vec<f64> = SeededRng::new(seed).take(32).collect();
        let b: Vec<f64> = SeededRng::new(seed).take(32).collect();
        prop_assert_eq!(&a, &b);
        prop_assert!(a.iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn shuffle_is_a_permutation(items in prop::collection::vec(any::<u16>(), 0..40), seed in any::<u32>()) {
        let shuffled = seeded_shuffle(&items, seed);
        prop_assert_eq!(&shuffled, &seeded_shuffle(&items, seed));
        let mut a = items.clone();
        let mut b = shuffled;
        a.sort();
        b.sort();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn hash_is_stable(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        prop_assert_eq!(hash(&bytes), hash(&bytes));
    }

    #[test]
    fn point_in_polygon_ignores_rotation(
        region in 0..RegionId::COUNT,
        shift in 0usize..8,
        x in 0.0..1.0f64,
        y in 0.0..1.0f64,
    ) {
        let polygon = REGION_CATALOG[region].polygon.to_vec();
        let mut rotated = polygon.clone();
        rotated.rotate_left(shift % polygon.len());
        let p = Point::new(x, y);
        prop_assert_eq!(point_in_polygon(p, &polygon), point_in_polygon(p, &rotated));
    }

    #[test]
    fn region_at_stays_in_candidate_set(count in 0usize..12, x in 0.0..1.0f64, y in 0.0..1.0f64) {
        let id = region_at(x, y, count, None);
        let unlocked: Vec<RegionId> = unlocked_regions(count).iter().map(|r| r.id).collect();
        prop_assert!(id == RegionId::Background || unlocked.contains(&id));
        if (1..=3).contains(&count) {
            let tier = REGION_CATALOG[id.index()].tier;
            prop_assert!(id == RegionId::Background || tier == Tier::Primary);
        }
    }

    #[test]
    fn affine_maps_source_triple_onto_target(
        s0 in point(500.0), s1 in point(500.0), s2 in point(500.0),
        t0 in point(500.0), t1 in point(500.0), t2 in point(500.0),
    ) {
        prop_assume!(cross(s0, s1, s2).abs() > 10.0);
        prop_assume!(cross(t0, t1, t2).abs() > 10.0);
        let m = Affine::solve(&[s0, s1, s2], &[t0, t1, t2]).expect("non-collinear");
        for (s, t) in [(s0, t0), (s1, t1), (s2, t2)] {
            let mapped = m.apply(s);
            let tol = 1e-6 * (1.0 + t.x.abs().max(t.y.abs()));
            prop_assert!((mapped.x - t.x).abs() <= tol);
            prop_assert!((mapped.y - t.y).abs() <= tol);
        }
    }

    #[test]
    fn single_seed_is_always_nearest(p in point(1000.0), s in point(1000.0)) {
        prop_assert_eq!(find_nearest_seed(p, &[s]), Some(s));
    }
}

#[test]
fn nearest_of_nothing_is_none() {
    assert_eq!(find_nearest_seed(Point::new(3.0, 4.0), &[]), None);
}
