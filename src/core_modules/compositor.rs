// THEORY:
// The `compositor` is the raster back end. It turns the per-frame region set,
// the indicator assignment and the warped line art into the final RGBA canvas.
//
// Passes, in order:
// 1.  **Coloring** (`rasterize`): every pixel is normalized, resolved to a
//     region by priority, and painted with that region's indicator color. With
//     subdivision on, the nearest Voronoi seed pulls the magnitude halfway
//     towards its own hash-derived value before coloring.
// 2.  **Line Art** (`composite_line_art`): the warped edge drawing is scaled to
//     the canvas and laid on top, multiplied at full opacity in affine mode, or
//     normal-blended at 0.8 in basic mode.
// 3.  **Grain** (`apply_grain`): a sprinkle of single-pixel white/black dots at
//     low opacity. This is the one intentionally non-reproducible element; the
//     caller supplies the randomness.
//
// Two historical variants live side by side as explicit modes:
// - `Affine` (default): indicator-category colors, unassigned and Background
//   pixels left unset (transparent until the line art covers them).
// - `Basic`: legacy palette-index colors with a neutral 0.5 fill for
//   unassigned and Background pixels.

use crate::core_modules::assignment::RegionMap;
use crate::core_modules::indicator::{Indicator, PaletteType, Rgb, color_for, normalize, palette_index_color};
use crate::core_modules::pixel::pixel::Pixel;
use crate::core_modules::region::{Point, Region, RegionId, RegionLookup};
use crate::core_modules::voronoi::{SeedSets, find_nearest_seed, seed_magnitude};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use rand::Rng;
use serde::{Deserialize, Serialize};

const NEUTRAL_MAGNITUDE: f64 = 0.5;
const BASIC_LINE_ART_OPACITY: f32 = 0.8;

/// Output resolution. Carries every resolution-dependent constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    #[default]
    Preview,
    Export,
}

impl Resolution {
    /// Side length of the square output canvas.
    pub fn side(&self) -> u32 {
        match self {
            Resolution::Preview => 512,
            Resolution::Export => 2048,
        }
    }

    pub fn grain_count(&self) -> usize {
        match self {
            Resolution::Preview => 5_000,
            Resolution::Export => 20_000,
        }
    }

    pub fn grain_opacity(&self) -> f32 {
        match self {
            Resolution::Preview => 0.05,
            Resolution::Export => 0.03,
        }
    }
}

/// Which compositor variant renders the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompositorMode {
    #[default]
    Affine,
    Basic,
}

/// What happens to pixels with no indicator (including Background).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundPolicy {
    /// Leave the pixel unset (transparent).
    Skip,
    /// Paint it at magnitude 0.5.
    NeutralFill,
}

impl CompositorMode {
    pub fn warps(&self) -> bool {
        matches!(self, CompositorMode::Affine)
    }

    pub fn background_policy(&self) -> BackgroundPolicy {
        match self {
            CompositorMode::Affine => BackgroundPolicy::Skip,
            CompositorMode::Basic => BackgroundPolicy::NeutralFill,
        }
    }
}

/// Everything the coloring pass reads for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameInputs<'a> {
    pub regions: &'a [Region],
    pub indicators: &'a [Indicator],
    pub region_map: &'a RegionMap,
    pub palette: PaletteType,
    pub subdivision: bool,
    pub mode: CompositorMode,
    pub width: u32,
    pub height: u32,
}

impl FrameInputs<'_> {
    /// Indicator driving `region`, if any. Background never has one.
    fn indicator(&self, region: RegionId) -> Option<&Indicator> {
        if region == RegionId::Background {
            return None;
        }
        self.region_map.indicator_for(region, self.indicators)
    }

    fn color(&self, indicator: Option<&Indicator>, magnitude: f64) -> Rgb {
        match (self.mode, indicator) {
            (CompositorMode::Affine, Some(ind)) => color_for(ind, magnitude, self.palette),
            _ => palette_index_color(self.palette, magnitude),
        }
    }
}

/// Per-region color decision made once per frame.
#[derive(Debug, Clone, Copy)]
struct RegionPaint<'a> {
    indicator: Option<&'a Indicator>,
    magnitude: f64,
    base: Rgb,
}

/// Coloring pass. Returns a fresh canvas; unset pixels are transparent.
pub fn rasterize(inputs: &FrameInputs<'_>, seeds: Option<&SeedSets>) -> RgbaImage {
    let (w, h) = (inputs.width, inputs.height);
    let mut canvas = RgbaImage::from_pixel(w, h, Rgba::from(Pixel::TRANSPARENT));
    if w == 0 || h == 0 {
        return canvas;
    }

    let lookup = RegionLookup::new(inputs.regions);
    let policy = inputs.mode.background_policy();

    let mut paints: [Option<RegionPaint<'_>>; RegionId::COUNT] = [None; RegionId::COUNT];
    for id in RegionId::ALL {
        let indicator = inputs.indicator(id);
        paints[id.index()] = match (indicator, policy) {
            (Some(ind), _) => {
                let magnitude = normalize(ind);
                Some(RegionPaint { indicator, magnitude, base: inputs.color(indicator, magnitude) })
            }
            (None, BackgroundPolicy::NeutralFill) => Some(RegionPaint {
                indicator: None,
                magnitude: NEUTRAL_MAGNITUDE,
                base: inputs.color(None, NEUTRAL_MAGNITUDE),
            }),
            (None, BackgroundPolicy::Skip) => None,
        };
    }

    let seeds = seeds.filter(|_| inputs.subdivision);
    for y in 0..h {
        let ny = y as f64 / h as f64;
        for x in 0..w {
            let nx = x as f64 / w as f64;
            let region = lookup.resolve(nx, ny);
            let Some(paint) = paints[region.index()] else {
                continue;
            };

            let nearest = seeds
                .and_then(|s| s.get(region))
                .and_then(|set| find_nearest_seed(Point::new(x as f64, y as f64), set));
            let color = match nearest {
                Some(seed) => {
                    let blended = (paint.magnitude + seed_magnitude(seed)) / 2.0;
                    inputs.color(paint.indicator, blended)
                }
                None => paint.base,
            };
            canvas.put_pixel(x, y, Rgba::from(Pixel::opaque(color.0)));
        }
    }
    canvas
}

/// Lays `line_art` (scaled to the canvas) over `canvas` in the mode's blend.
pub fn composite_line_art(canvas: &mut RgbaImage, line_art: &RgbaImage, mode: CompositorMode) {
    let (w, h) = canvas.dimensions();
    let scaled;
    let art = if line_art.dimensions() == (w, h) {
        line_art
    } else {
        scaled = imageops::resize(line_art, w, h, FilterType::Triangle);
        &scaled
    };

    for (dst, src) in canvas.pixels_mut().zip(art.pixels()) {
        let back = Pixel::from(*dst);
        let top = Pixel::from(src);
        let out = match mode {
            CompositorMode::Affine => back.blend_multiply(&top, 1.0),
            CompositorMode::Basic => back.blend_normal(&top, BASIC_LINE_ART_OPACITY),
        };
        *dst = Rgba::from(out);
    }
}

/// Scatters `resolution.grain_count()` single-pixel dots, alternating white and black.
pub fn apply_grain<R: Rng + ?Sized>(canvas: &mut RgbaImage, resolution: Resolution, rng: &mut R) {
    let (w, h) = canvas.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let opacity = resolution.grain_opacity();
    for i in 0..resolution.grain_count() {
        let x = rng.gen_range(0..w);
        let y = rng.gen_range(0..h);
        let dot = if i % 2 == 0 { Pixel::WHITE } else { Pixel::BLACK };
        let back = Pixel::from(canvas.get_pixel(x, y));
        canvas.put_pixel(x, y, Rgba::from(back.blend_normal(&dot, opacity)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::indicator::IndicatorCategory;
    use crate::core_modules::region::{template, unlocked_regions};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn forehead_frame() -> (Vec<Region>, Vec<Indicator>, RegionMap) {
        let regions = unlocked_regions(1);
        let indicators = vec![Indicator::new("gdp", 10.0, 0.0, 10.0, IndicatorCategory::Growth)];
        let mut map = RegionMap::empty(11);
        map.assign(RegionId::Forehead, 0);
        (regions, indicators, map)
    }

    fn inputs<'a>(
        regions: &'a [Region],
        indicators: &'a [Indicator],
        map: &'a RegionMap,
        mode: CompositorMode,
    ) -> FrameInputs<'a> {
        FrameInputs {
            regions,
            indicators,
            region_map: map,
            palette: PaletteType::Vibrant,
            subdivision: false,
            mode,
            width: 64,
            height: 64,
        }
    }

    #[test]
    fn resolution_constants() {
        assert_eq!(Resolution::Preview.side(), 512);
        assert_eq!(Resolution::Export.side(), 2048);
        assert_eq!(Resolution::Export.grain_count(), 20_000);
    }

    #[test]
    fn affine_mode_skips_unassigned_pixels() {
        let (regions, indicators, map) = forehead_frame();
        let canvas = rasterize(&inputs(&regions, &indicators, &map, CompositorMode::Affine), None);
        let expected = color_for(&indicators[0], 1.0, PaletteType::Vibrant);
        // (32, 16) -> (0.5, 0.25), inside the forehead.
        assert_eq!(canvas.get_pixel(32, 16).0, [expected.0[0], expected.0[1], expected.0[2], 255]);
        // Top-left corner is background.
        assert_eq!(canvas.get_pixel(0, 0).0, [0, 0, 0, 0]);
        // Eyes are unlocked but unassigned here.
        assert_eq!(canvas.get_pixel(32, 26).0[3], 0);
    }

    #[test]
    fn basic_mode_fills_background_neutral() {
        let (regions, indicators, map) = forehead_frame();
        let canvas = rasterize(&inputs(&regions, &indicators, &map, CompositorMode::Basic), None);
        let neutral = palette_index_color(PaletteType::Vibrant, 0.5);
        assert_eq!(canvas.get_pixel(0, 0).0, [neutral.0[0], neutral.0[1], neutral.0[2], 255]);
        let full = palette_index_color(PaletteType::Vibrant, 1.0);
        assert_eq!(canvas.get_pixel(32, 16).0, [full.0[0], full.0[1], full.0[2], 255]);
    }

    #[test]
    fn subdivision_changes_some_pixels() {
        let (regions, indicators, map) = forehead_frame();
        let mut frame = inputs(&regions, &indicators, &map, CompositorMode::Affine);
        let plain = rasterize(&frame, None);

        // A large seeding polygon so the forehead is guaranteed seeds.
        let mut seeding = template(RegionId::Forehead).to_region();
        seeding.polygon = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)];
        let seeds = SeedSets::build(&[seeding], &indicators, &map, Resolution::Preview, (64.0, 64.0));
        assert!(seeds.get(RegionId::Forehead).is_some());

        // Ignored while subdivision is off.
        assert_eq!(rasterize(&frame, Some(&seeds)), plain);

        frame.subdivision = true;
        let divided = rasterize(&frame, Some(&seeds));
        // Blended magnitude is below 1.0, so the forehead color shifts.
        assert_ne!(plain.get_pixel(32, 16), divided.get_pixel(32, 16));
        // Unassigned pixels are unaffected by subdivision.
        assert_eq!(plain.get_pixel(0, 63), divided.get_pixel(0, 63));
    }

    #[test]
    fn line_art_multiply_covers_transparent_pixels() {
        let mut canvas = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0]));
        canvas.put_pixel(1, 1, Rgba([200, 100, 50, 255]));
        let art = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255]));
        composite_line_art(&mut canvas, &art, CompositorMode::Affine);
        assert_eq!(canvas.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(canvas.get_pixel(1, 1).0, [200, 100, 50, 255]);
    }

    #[test]
    fn line_art_is_scaled_to_canvas() {
        let mut canvas = RgbaImage::from_pixel(16, 16, Rgba([255, 255, 255, 255]));
        let art = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        composite_line_art(&mut canvas, &art, CompositorMode::Affine);
        assert!(canvas.pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn basic_line_art_is_translucent() {
        let mut canvas = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        let art = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        composite_line_art(&mut canvas, &art, CompositorMode::Basic);
        assert_eq!(canvas.get_pixel(0, 0).0, [51, 51, 51, 255]);
    }

    #[test]
    fn grain_touches_only_a_few_pixels_lightly() {
        let mut canvas = RgbaImage::from_pixel(128, 128, Rgba([128, 128, 128, 255]));
        let mut rng = StdRng::seed_from_u64(3);
        apply_grain(&mut canvas, Resolution::Preview, &mut rng);
        assert!(canvas.pixels().any(|p| p.0 != [128, 128, 128, 255]));
        assert!(canvas.pixels().all(|p| (p.0[0] as i32 - 128).abs() <= 40 && p.0[3] == 255));
    }
}
