// THEORY:
// The `region` module defines the face as the renderer sees it: nine named
// polygons in a normalized unit square. It is the spatial vocabulary every
// other layer speaks.
//
// Key architectural principles:
// 1.  **Static Catalog**: `REGION_CATALOG` is process-wide immutable data. The
//     polygons are the visual contract of the product and are never mutated;
//     distortion produces new `Region` values instead (see `distortion`).
// 2.  **Priority Resolution**: Regions overlap on purpose (the nose sits on top
//     of the cheeks). When a point lies in several polygons, the one with the
//     highest priority wins and `Background` catches everything else.
// 3.  **Tiered Unlocking**: The more indicators the caller supplies, the more
//     of the face participates. Tier gating is a pure function of the count.
// 4.  **Per-Frame Sorting**: `region_at` is the convenient one-shot form. The
//     raster loop uses `RegionLookup`, which sorts the candidates once per frame
//     instead of once per pixel.

use std::fmt;

/// A 2D point. Whether it is normalized or in pixels depends on the caller;
/// the two spaces are only mixed through explicit scaling.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn scaled(&self, width: f64, height: f64) -> Self {
        Self::new(self.x * width, self.y * height)
    }

    pub fn distance_squared(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// The closed set of facial regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegionId {
    Forehead,
    Nose,
    Eyes,
    Mouth,
    Cheeks,
    Chin,
    Hair,
    Neck,
    Background,
}

impl RegionId {
    pub const COUNT: usize = 9;

    /// Every region in catalog order.
    pub const ALL: [RegionId; RegionId::COUNT] = [
        RegionId::Forehead,
        RegionId::Nose,
        RegionId::Eyes,
        RegionId::Mouth,
        RegionId::Cheeks,
        RegionId::Chin,
        RegionId::Hair,
        RegionId::Neck,
        RegionId::Background,
    ];

    /// Position in catalog order; doubles as the key of fixed-size region tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            RegionId::Forehead => "forehead",
            RegionId::Nose => "nose",
            RegionId::Eyes => "eyes",
            RegionId::Mouth => "mouth",
            RegionId::Cheeks => "cheeks",
            RegionId::Chin => "chin",
            RegionId::Hair => "hair",
            RegionId::Neck => "neck",
            RegionId::Background => "background",
        }
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unlock gating. Ordered so that `tier <= unlocked` reads naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    Primary,
    Secondary,
    Auxiliary,
}

impl Tier {
    /// Highest tier unlocked by `indicator_count` indicators.
    pub fn unlocked_by(indicator_count: usize) -> Tier {
        match indicator_count {
            0..=3 => Tier::Primary,
            4..=6 => Tier::Secondary,
            _ => Tier::Auxiliary,
        }
    }
}

/// A named polygon on the normalized face canvas.
///
/// The first three vertices are load-bearing: the warp engine solves its
/// affine map from them, so they must never be collinear in a template.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub id: RegionId,
    pub priority: i32,
    pub tier: Tier,
    pub polygon: Vec<Point>,
}

/// Static template backing `REGION_CATALOG`.
#[derive(Debug)]
pub struct RegionTemplate {
    pub id: RegionId,
    pub priority: i32,
    pub tier: Tier,
    pub polygon: &'static [Point],
}

impl RegionTemplate {
    pub fn to_region(&self) -> Region {
        Region {
            id: self.id,
            priority: self.priority,
            tier: self.tier,
            polygon: self.polygon.to_vec(),
        }
    }
}

const fn p(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

/// The nine facial regions, in catalog order.
pub static REGION_CATALOG: [RegionTemplate; RegionId::COUNT] = [
    RegionTemplate {
        id: RegionId::Forehead,
        priority: 5,
        tier: Tier::Primary,
        polygon: &[p(0.30, 0.18), p(0.70, 0.18), p(0.74, 0.34), p(0.26, 0.34)],
    },
    RegionTemplate {
        id: RegionId::Nose,
        priority: 9,
        tier: Tier::Secondary,
        polygon: &[p(0.46, 0.40), p(0.54, 0.40), p(0.58, 0.60), p(0.50, 0.63), p(0.42, 0.60)],
    },
    RegionTemplate {
        id: RegionId::Eyes,
        priority: 8,
        tier: Tier::Primary,
        polygon: &[p(0.24, 0.36), p(0.76, 0.36), p(0.78, 0.41), p(0.76, 0.46), p(0.24, 0.46), p(0.22, 0.41)],
    },
    RegionTemplate {
        id: RegionId::Mouth,
        priority: 8,
        tier: Tier::Primary,
        polygon: &[p(0.38, 0.66), p(0.50, 0.64), p(0.62, 0.66), p(0.60, 0.74), p(0.40, 0.74)],
    },
    RegionTemplate {
        id: RegionId::Cheeks,
        priority: 4,
        tier: Tier::Secondary,
        polygon: &[p(0.22, 0.46), p(0.78, 0.46), p(0.74, 0.66), p(0.26, 0.66)],
    },
    RegionTemplate {
        id: RegionId::Chin,
        priority: 6,
        tier: Tier::Secondary,
        polygon: &[p(0.36, 0.74), p(0.64, 0.74), p(0.58, 0.86), p(0.42, 0.86)],
    },
    RegionTemplate {
        id: RegionId::Hair,
        priority: 2,
        tier: Tier::Auxiliary,
        polygon: &[p(0.20, 0.04), p(0.80, 0.04), p(0.84, 0.30), p(0.74, 0.18), p(0.26, 0.18), p(0.16, 0.30)],
    },
    RegionTemplate {
        id: RegionId::Neck,
        priority: 3,
        tier: Tier::Auxiliary,
        polygon: &[p(0.40, 0.86), p(0.60, 0.86), p(0.64, 1.00), p(0.36, 1.00)],
    },
    RegionTemplate {
        id: RegionId::Background,
        priority: 0,
        tier: Tier::Auxiliary,
        polygon: &[p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)],
    },
];

/// The template for `id`.
pub fn template(id: RegionId) -> &'static RegionTemplate {
    &REGION_CATALOG[id.index()]
}

/// Catalog regions whose tier is unlocked by `indicator_count`, in catalog order.
pub fn unlocked_regions(indicator_count: usize) -> Vec<Region> {
    let unlocked = Tier::unlocked_by(indicator_count);
    REGION_CATALOG
        .iter()
        .filter(|t| t.tier <= unlocked)
        .map(RegionTemplate::to_region)
        .collect()
}

/// Even-odd ray casting. The closing edge (last vertex back to first) is included.
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Vertex mean of a polygon.
pub fn centroid(polygon: &[Point]) -> Point {
    if polygon.is_empty() {
        return Point::default();
    }
    let n = polygon.len() as f64;
    let (sx, sy) = polygon.iter().fold((0.0, 0.0), |(sx, sy), v| (sx + v.x, sy + v.y));
    Point::new(sx / n, sy / n)
}

/// Axis-aligned bounds as `(min, max)`.
pub fn bounds(polygon: &[Point]) -> Option<(Point, Point)> {
    let first = *polygon.first()?;
    Some(polygon.iter().fold((first, first), |(lo, hi), v| {
        (Point::new(lo.x.min(v.x), lo.y.min(v.y)), Point::new(hi.x.max(v.x), hi.y.max(v.y)))
    }))
}

/// Candidate regions pre-sorted by descending priority.
///
/// Ties keep their incoming order, so equal-priority regions resolve in
/// catalog order.
#[derive(Debug, Clone)]
pub struct RegionLookup<'a> {
    sorted: Vec<&'a Region>,
}

impl<'a> RegionLookup<'a> {
    pub fn new(regions: &'a [Region]) -> Self {
        let mut sorted: Vec<&Region> = regions.iter().collect();
        sorted.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { sorted }
    }

    /// Highest-priority region containing the normalized point, or `Background`.
    pub fn resolve(&self, nx: f64, ny: f64) -> RegionId {
        self.resolve_region(nx, ny).map(|r| r.id).unwrap_or(RegionId::Background)
    }

    /// Like `resolve`, but hands back the matching region itself.
    pub fn resolve_region(&self, nx: f64, ny: f64) -> Option<&'a Region> {
        let point = Point::new(nx, ny);
        self.sorted.iter().copied().find(|r| point_in_polygon(point, &r.polygon))
    }
}

/// One-shot region resolution. Candidates are `dynamic_regions` when given,
/// else the regions unlocked by `indicator_count`.
pub fn region_at(nx: f64, ny: f64, indicator_count: usize, dynamic_regions: Option<&[Region]>) -> RegionId {
    match dynamic_regions {
        Some(regions) => RegionLookup::new(regions).resolve(nx, ny),
        None => {
            let regions = unlocked_regions(indicator_count);
            RegionLookup::new(&regions).resolve(nx, ny)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<Point> {
        vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)]
    }

    #[test]
    fn catalog_is_in_id_order() {
        for (i, t) in REGION_CATALOG.iter().enumerate() {
            assert_eq!(t.id.index(), i);
            assert!(t.polygon.len() >= 3);
        }
    }

    #[test]
    fn catalog_leading_triples_are_not_collinear() {
        for t in REGION_CATALOG.iter() {
            let [a, b, c] = [t.polygon[0], t.polygon[1], t.polygon[2]];
            let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
            assert!(cross.abs() > 1e-6, "{} has a collinear leading triple", t.id);
        }
    }

    #[test]
    fn tiers_unlock_by_count() {
        let ids = |n| unlocked_regions(n).into_iter().map(|r| r.id).collect::<Vec<_>>();
        assert_eq!(ids(0), vec![RegionId::Forehead, RegionId::Eyes, RegionId::Mouth]);
        assert_eq!(ids(3), vec![RegionId::Forehead, RegionId::Eyes, RegionId::Mouth]);
        assert_eq!(ids(4).len(), 6);
        assert_eq!(ids(6).len(), 6);
        assert_eq!(ids(7).len(), 9);
    }

    #[test]
    fn point_in_polygon_basics() {
        let square = unit_square();
        assert!(point_in_polygon(p(0.5, 0.5), &square));
        assert!(!point_in_polygon(p(1.5, 0.5), &square));
        assert!(!point_in_polygon(p(0.5, -0.1), &square));
    }

    #[test]
    fn point_in_polygon_uses_closing_edge() {
        // Triangle whose closing edge is the hypotenuse.
        let tri = vec![p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0)];
        assert!(point_in_polygon(p(0.2, 0.2), &tri));
        assert!(!point_in_polygon(p(0.8, 0.8), &tri));
    }

    #[test]
    fn degenerate_polygon_contains_nothing() {
        assert!(!point_in_polygon(p(0.0, 0.0), &[p(0.0, 0.0), p(1.0, 1.0)]));
    }

    #[test]
    fn nose_beats_cheeks() {
        assert_eq!(region_at(0.5, 0.5, 6, None), RegionId::Nose);
        assert_eq!(region_at(0.3, 0.55, 6, None), RegionId::Cheeks);
    }

    #[test]
    fn locked_regions_fall_to_background() {
        // Nose is secondary tier; with one indicator it cannot be returned.
        assert_eq!(region_at(0.5, 0.5, 1, None), RegionId::Background);
        assert_eq!(region_at(0.5, 0.25, 1, None), RegionId::Forehead);
    }

    #[test]
    fn dynamic_candidates_override_tiers() {
        let only_neck = vec![template(RegionId::Neck).to_region()];
        assert_eq!(region_at(0.5, 0.95, 1, Some(&only_neck)), RegionId::Neck);
        assert_eq!(region_at(0.5, 0.25, 1, Some(&only_neck)), RegionId::Background);
    }

    #[test]
    fn centroid_and_bounds() {
        let c = centroid(&unit_square());
        assert_eq!(c, p(0.5, 0.5));
        assert_eq!(bounds(&unit_square()), Some((p(0.0, 0.0), p(1.0, 1.0))));
        assert_eq!(bounds(&[]), None);
    }
}
