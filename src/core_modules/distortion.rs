// THEORY:
// The `distortion` module is where economics becomes caricature. Each region
// that has an indicator gets a region-specific geometric treatment whose
// strength follows the indicator's magnitude `m` in [0, 1].
//
// Treatments:
// - Forehead: vertical stretch about its top edge, plus a shift.
// - Mouth: non-uniform scale about the centroid.
// - Chin: horizontal skew growing with depth; above m = 0.5 the skew becomes
//   lopsided (1.5x right of center, 0.5x left).
// - Eyes, Cheeks: rotation about the centroid; above m = 0.6 an extra
//   asymmetric horizontal squeeze (1.2x left of center, 0.9x right).
// - Everything else passes through as a fresh copy of its template.
//
// The two threshold branches are stylistic kinks. They are strict comparisons
// (`m > 0.5`, `m > 0.6`) and must not be smoothed.

use crate::core_modules::assignment::RegionMap;
use crate::core_modules::indicator::{Indicator, normalize};
use crate::core_modules::region::{Point, REGION_CATALOG, Region, RegionId, centroid};

const FOREHEAD_STRETCH: f64 = 0.6;
const FOREHEAD_SHIFT: f64 = 0.15;
const CHIN_SKEW: f64 = 0.2;
const ROTATION_RANGE_DEGREES: f64 = 30.0;
const ASYMMETRY_THRESHOLD: f64 = 0.6;

/// Distorts `polygon` as region `id` would be at magnitude `m`.
pub fn distort_polygon(id: RegionId, polygon: &[Point], m: f64) -> Vec<Point> {
    match id {
        RegionId::Forehead => stretch_forehead(polygon, m),
        RegionId::Mouth => scale_mouth(polygon, m),
        RegionId::Chin => skew_chin(polygon, m),
        RegionId::Eyes | RegionId::Cheeks => rotate_about_centroid(polygon, m),
        _ => polygon.to_vec(),
    }
}

fn top_y(polygon: &[Point]) -> f64 {
    polygon.iter().map(|v| v.y).fold(f64::INFINITY, f64::min)
}

fn stretch_forehead(polygon: &[Point], m: f64) -> Vec<Point> {
    let scale_y = 1.0 + (m - 0.5) * FOREHEAD_STRETCH;
    let shift_y = (m - 0.5) * FOREHEAD_SHIFT;
    let top = top_y(polygon);
    polygon
        .iter()
        .map(|v| Point::new(v.x, top + (v.y - top) * scale_y - shift_y))
        .collect()
}

fn scale_mouth(polygon: &[Point], m: f64) -> Vec<Point> {
    let scale_x = 0.6 + m * 0.8;
    let scale_y = 0.8 + m * 0.4;
    let c = centroid(polygon);
    polygon
        .iter()
        .map(|v| Point::new(c.x + (v.x - c.x) * scale_x, c.y + (v.y - c.y) * scale_y))
        .collect()
}

fn skew_chin(polygon: &[Point], m: f64) -> Vec<Point> {
    let skew_x = (m - 0.5) * CHIN_SKEW;
    let top = top_y(polygon);
    polygon
        .iter()
        .map(|v| {
            let factor = if m > 0.5 {
                if v.x > 0.5 { 1.5 } else { 0.5 }
            } else {
                1.0
            };
            Point::new(v.x + skew_x * factor * (v.y - top), v.y)
        })
        .collect()
}

fn rotate_about_centroid(polygon: &[Point], m: f64) -> Vec<Point> {
    let angle = ((m - 0.5) * ROTATION_RANGE_DEGREES).to_radians();
    let (sin, cos) = angle.sin_cos();
    let c = centroid(polygon);
    polygon
        .iter()
        .map(|v| {
            let dx = v.x - c.x;
            let dy = v.y - c.y;
            let mut x = c.x + dx * cos - dy * sin;
            let y = c.y + dx * sin + dy * cos;
            if m > ASYMMETRY_THRESHOLD {
                let factor = if x < 0.5 { 1.2 } else { 0.9 };
                x = c.x + (x - c.x) * factor;
            }
            Point::new(x, y)
        })
        .collect()
}

/// Recomputes every catalog region for the current indicators.
///
/// Regions without an assigned indicator come back as plain copies of their
/// templates. The result is in catalog order and is meant to be thrown away
/// after one render pass.
pub fn dynamic_regions(indicators: &[Indicator], region_map: &RegionMap) -> Vec<Region> {
    REGION_CATALOG
        .iter()
        .map(|template| {
            let mut region = template.to_region();
            if let Some(indicator) = region_map.indicator_for(template.id, indicators) {
                region.polygon = distort_polygon(template.id, template.polygon, normalize(indicator));
            }
            region
        })
        .collect()
}
