// THEORY:
// The `affine_warp` module moves the photograph's content into the distorted
// face. For every region it solves the affine map that carries the template's
// first three vertices onto the distorted polygon's first three vertices, then
// paints the transformed photo inside the distorted outline.
//
// Key architectural principles:
// 1.  **Three-Point Solve**: An affine map has six unknowns; three point pairs
//     pin it down exactly. The solve inverts the 3x3 source matrix with
//     Cramer's rule. A near-zero determinant (collinear triple on either side)
//     means there is no usable map, and the region is skipped.
// 2.  **Clip, Transform, Draw, Restore**: The canvas starts white. Each region
//     only ever writes inside its target polygon, and nothing carries over from
//     one region to the next except the pixels themselves.
// 3.  **Inverse Sampling**: Rather than pushing source pixels forward (which
//     leaves holes), each destination pixel in the clip is pulled back through
//     the inverse map and bilinearly sampled. Preimages outside the photo leave
//     the canvas untouched, like drawing an image that does not cover the clip.
// 4.  **Catalog Order**: Regions are painted in catalog order and later ones
//     overwrite earlier ones. This is deliberately not the priority order the
//     color pass uses.

use crate::core_modules::pixel::pixel::Pixel;
use crate::core_modules::region::{Point, Region, RegionId, bounds, point_in_polygon, template};
use image::{Rgba, RgbaImage};
use log::{debug, warn};

/// Below this, a point triple is treated as collinear.
pub const DETERMINANT_EPSILON: f64 = 1e-10;

/// `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

fn triangle_determinant(p: &[Point; 3]) -> f64 {
    p[0].x * (p[1].y - p[2].y) - p[0].y * (p[1].x - p[2].x) + (p[1].x * p[2].y - p[2].x * p[1].y)
}

impl Affine {
    /// The unique map taking `src[i]` to `dst[i]`, or `None` when either triple is collinear.
    pub fn solve(src: &[Point; 3], dst: &[Point; 3]) -> Option<Affine> {
        let det = triangle_determinant(src);
        if det.abs() < DETERMINANT_EPSILON || triangle_determinant(dst).abs() < DETERMINANT_EPSILON {
            return None;
        }

        // Rows of the inverse of [[x0 y0 1] [x1 y1 1] [x2 y2 1]] (adjugate / det).
        let [p0, p1, p2] = *src;
        let inv = [
            [(p1.y - p2.y) / det, (p2.y - p0.y) / det, (p0.y - p1.y) / det],
            [(p2.x - p1.x) / det, (p0.x - p2.x) / det, (p1.x - p0.x) / det],
            [
                (p1.x * p2.y - p2.x * p1.y) / det,
                (p2.x * p0.y - p0.x * p2.y) / det,
                (p0.x * p1.y - p1.x * p0.y) / det,
            ],
        ];
        let solve_row = |row: &[f64; 3], values: [f64; 3]| row[0] * values[0] + row[1] * values[1] + row[2] * values[2];
        let us = [dst[0].x, dst[1].x, dst[2].x];
        let vs = [dst[0].y, dst[1].y, dst[2].y];

        Some(Affine {
            a: solve_row(&inv[0], us),
            c: solve_row(&inv[1], us),
            e: solve_row(&inv[2], us),
            b: solve_row(&inv[0], vs),
            d: solve_row(&inv[1], vs),
            f: solve_row(&inv[2], vs),
        })
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(self.a * p.x + self.c * p.y + self.e, self.b * p.x + self.d * p.y + self.f)
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    pub fn invert(&self) -> Option<Affine> {
        let det = self.determinant();
        if det.abs() < DETERMINANT_EPSILON {
            return None;
        }
        Some(Affine {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }
}

/// Leading vertex triple of a polygon scaled into pixel space.
fn leading_triple(polygon: &[Point], width: f64, height: f64) -> Option<[Point; 3]> {
    match polygon {
        [a, b, c, ..] => Some([a.scaled(width, height), b.scaled(width, height), c.scaled(width, height)]),
        _ => None,
    }
}

/// Bilinear sample at continuous pixel coordinates (pixel centers at +0.5).
/// Returns `None` when the point is outside the image.
fn sample_bilinear(image: &RgbaImage, x: f64, y: f64) -> Option<Pixel> {
    let (w, h) = image.dimensions();
    if x < 0.0 || y < 0.0 || x >= w as f64 || y >= h as f64 {
        return None;
    }
    let fx = (x - 0.5).clamp(0.0, (w - 1) as f64);
    let fy = (y - 0.5).clamp(0.0, (h - 1) as f64);
    let x0 = fx.floor() as u32;
    let y0 = fy.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let tx = fx - x0 as f64;
    let ty = fy - y0 as f64;

    let corners = [
        image.get_pixel(x0, y0).0,
        image.get_pixel(x1, y0).0,
        image.get_pixel(x0, y1).0,
        image.get_pixel(x1, y1).0,
    ];
    let mut out = [0u8; 4];
    for (i, channel) in out.iter_mut().enumerate() {
        let top = corners[0][i] as f64 * (1.0 - tx) + corners[1][i] as f64 * tx;
        let bottom = corners[2][i] as f64 * (1.0 - tx) + corners[3][i] as f64 * tx;
        *channel = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
    }
    Some(Pixel::from(&out[..]))
}

/// Paints `source` through `transform` onto `canvas`, clipped to `clip` (pixel space).
fn draw_clipped(canvas: &mut RgbaImage, source: &RgbaImage, transform: &Affine, clip: &[Point]) {
    let Some(inverse) = transform.invert() else {
        return;
    };
    let Some((lo, hi)) = bounds(clip) else {
        return;
    };
    let (w, h) = canvas.dimensions();
    let x_start = lo.x.floor().max(0.0) as u32;
    let y_start = lo.y.floor().max(0.0) as u32;
    let x_end = (hi.x.ceil().max(0.0) as u32).min(w);
    let y_end = (hi.y.ceil().max(0.0) as u32).min(h);

    for y in y_start..y_end {
        for x in x_start..x_end {
            let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
            if !point_in_polygon(center, clip) {
                continue;
            }
            let src = inverse.apply(center);
            if let Some(sampled) = sample_bilinear(source, src.x, src.y) {
                let blended = Pixel::from(canvas.get_pixel(x, y)).blend_normal(&sampled, 1.0);
                canvas.put_pixel(x, y, Rgba::from(blended));
            }
        }
    }
}

/// Redraws `source` region by region into a white canvas of the same size,
/// following the distorted polygons in `targets`.
///
/// Each target is paired with its catalog template by id. `Background` is
/// never drawn, and regions whose map is degenerate are skipped.
pub fn warp_regions(source: &RgbaImage, targets: &[Region]) -> RgbaImage {
    let (w, h) = source.dimensions();
    let (width, height) = (w as f64, h as f64);
    let mut canvas = RgbaImage::from_pixel(w, h, Rgba::from(Pixel::WHITE));

    let mut ordered: Vec<&Region> = targets.iter().filter(|r| r.id != RegionId::Background).collect();
    ordered.sort_by_key(|r| r.id.index());

    for target in ordered {
        let source_shape = template(target.id);
        let (Some(src), Some(dst)) = (
            leading_triple(source_shape.polygon, width, height),
            leading_triple(&target.polygon, width, height),
        ) else {
            warn!("region {} has fewer than three vertices, skipping warp", target.id);
            continue;
        };
        let Some(transform) = Affine::solve(&src, &dst) else {
            warn!("degenerate affine for region {}, skipping warp", target.id);
            continue;
        };

        let clip: Vec<Point> = target.polygon.iter().map(|p| p.scaled(width, height)).collect();
        draw_clipped(&mut canvas, source, &transform, &clip);
        debug!("warped region {} ({}x{})", target.id, w, h);
    }
    canvas
}
