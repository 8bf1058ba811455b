// THEORY:
// The `pipeline` module is the top-level API of the portrait engine. It wires
// the leaf modules into one render pass and owns the little state that lives
// between passes: the last good frame, the cached region assignment and the
// shuffle counter.
//
// A render pass walks a fixed state machine:
//   Idle -> Processing (edge extraction) -> Warping -> Coloring -> Compositing -> Idle
// Any failure is logged, the state snaps back to Idle, and the previous frame
// stays on display. No half-drawn canvas ever replaces it.
//
// The only suspension points are decoding the upload (`Photo::decode`, run on
// the blocking pool) and the edge collaborator. Everything else is CPU-bound
// and synchronous. `render` borrows the pipeline mutably, so one pipeline can
// never run two passes at once.

use crate::core_modules::affine_warp::warp_regions;
use crate::core_modules::assignment::{RegionMap, assignment_seed_from, build_region_map};
use crate::core_modules::compositor::{
    CompositorMode, FrameInputs, Resolution, apply_grain, composite_line_art, rasterize,
};
use crate::core_modules::distortion::dynamic_regions;
use crate::core_modules::edge::{EdgeExtractor, PassthroughEdges};
use crate::core_modules::hashing::PolyHasher;
use crate::core_modules::region::{Region, Tier};
use crate::core_modules::utils::image_helper::image_helper;
use crate::core_modules::voronoi::SeedSets;
use crate::error::{PortraitError, Result};
use image::RgbaImage;
use image::imageops::{self, FilterType};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

// Re-export key data structures for the public API.
pub use crate::core_modules::indicator::{Indicator, IndicatorCategory, PaletteType};
pub use crate::core_modules::region::RegionId;

/// The configuration snapshot a render reads. Never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub indicators: Option<Vec<Indicator>>,
    #[serde(default)]
    pub palette: PaletteType,
    #[serde(default)]
    pub subdivision: bool,
    #[serde(default)]
    pub mode: CompositorMode,
    /// Mixed into the assignment seed. 0 reproduces the base assignment.
    #[serde(default)]
    pub shuffle_salt: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            indicators: None,
            palette: PaletteType::default(),
            subdivision: false,
            mode: CompositorMode::default(),
            shuffle_salt: 0,
        }
    }
}

impl RenderConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Where a render pass currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    Processing,
    Warping,
    Coloring,
    Compositing,
}

/// A decoded upload plus the hash state of its encoded bytes.
#[derive(Debug, Clone)]
pub struct Photo {
    image: RgbaImage,
    identity: PolyHasher,
}

impl Photo {
    /// Decodes `bytes` on the blocking pool, capped to
    /// `DEFAULT_MAX_SIDE` and passed once through the JPEG encoder. The
    /// identity still hashes the bytes as uploaded.
    pub async fn decode(bytes: Vec<u8>) -> Result<Photo> {
        tokio::task::spawn_blocking(move || {
            let upload = image_helper::decode(&bytes)?;
            let jpeg = image_helper::downscale_to_jpeg(
                &upload,
                image_helper::DEFAULT_MAX_SIDE,
                image_helper::DEFAULT_JPEG_QUALITY,
            )?;
            let image = image_helper::decode(&jpeg)?;
            Ok(Photo::from_parts(image, &bytes))
        })
        .await?
    }

    /// Wraps an already-decoded raster, identified by `identity_bytes`.
    pub fn from_parts(image: RgbaImage, identity_bytes: &[u8]) -> Photo {
        let mut identity = PolyHasher::new();
        identity.update(identity_bytes);
        Photo { image, identity }
    }

    /// Wraps a raster, identified by its own pixel data.
    pub fn from_image(image: RgbaImage) -> Photo {
        let mut identity = PolyHasher::new();
        identity.update(image.as_raw());
        Photo { image, identity }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn identity(&self) -> u32 {
        self.identity.finish()
    }
}

/// A finished export.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub filename: String,
    pub png: Vec<u8>,
}

/// `iyf-portrait-<unix-epoch-ms>.png`
pub fn export_filename(epoch_millis: u128) -> String {
    format!("iyf-portrait-{epoch_millis}.png")
}

/// The main, top-level struct for the portrait engine.
pub struct PortraitPipeline {
    edge_extractor: Option<Arc<dyn EdgeExtractor>>,
    state: RenderState,
    last_frame: Option<RgbaImage>,
    cached_map: Option<((u32, usize), RegionMap)>,
    salt_offset: u32,
}

impl Default for PortraitPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl PortraitPipeline {
    /// A pipeline without an edge extractor; the photo itself stands in for line art.
    pub fn new() -> Self {
        Self {
            edge_extractor: None,
            state: RenderState::Idle,
            last_frame: None,
            cached_map: None,
            salt_offset: 0,
        }
    }

    pub fn with_edge_extractor(mut self, extractor: Arc<dyn EdgeExtractor>) -> Self {
        self.edge_extractor = Some(extractor);
        self
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// The last successfully rendered preview.
    pub fn last_frame(&self) -> Option<&RgbaImage> {
        self.last_frame.as_ref()
    }

    /// Moves to the next assignment for every later render.
    pub fn reshuffle(&mut self) {
        self.salt_offset = self.salt_offset.wrapping_add(1);
        debug!("reshuffle -> salt offset {}", self.salt_offset);
    }

    /// Renders a preview and keeps it as the last good frame.
    pub async fn render(&mut self, photo: &Photo, config: &RenderConfig) -> Result<&RgbaImage> {
        let frame = self.render_at(photo, config, Resolution::Preview).await?;
        let frame: &RgbaImage = self.last_frame.insert(frame);
        Ok(frame)
    }

    /// Renders at `resolution` without touching the last good frame.
    pub async fn render_at(&mut self, photo: &Photo, config: &RenderConfig, resolution: Resolution) -> Result<RgbaImage> {
        let started = Instant::now();
        match self.run(photo, config, resolution).await {
            Ok(frame) => {
                self.transition(RenderState::Idle);
                info!(
                    "rendered {}x{} {:?} frame in {} ms",
                    frame.width(),
                    frame.height(),
                    resolution,
                    started.elapsed().as_millis()
                );
                Ok(frame)
            }
            Err(err) => {
                error!("render failed: {err}");
                self.transition(RenderState::Idle);
                Err(err)
            }
        }
    }

    /// Renders at export resolution and encodes the result as PNG.
    pub async fn export(&mut self, photo: &Photo, config: &RenderConfig) -> Result<ExportArtifact> {
        let frame = self.render_at(photo, config, Resolution::Export).await?;
        let png = image_helper::encode_png(&frame)?;
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        Ok(ExportArtifact {
            filename: export_filename(millis),
            png,
        })
    }

    fn transition(&mut self, next: RenderState) {
        debug!("render state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Assignment for this photo and indicator list, reusing the cached one when unchanged.
    pub fn region_map(&mut self, photo: &Photo, indicators: &[Indicator], salt: u32) -> RegionMap {
        let seed = assignment_seed_from(photo.identity, indicators, salt.wrapping_add(self.salt_offset));
        let key = (seed, indicators.len());
        if let Some((cached_key, map)) = self.cached_map {
            if cached_key == key {
                return map;
            }
        }
        let map = build_region_map(indicators, seed);
        self.cached_map = Some((key, map));
        map
    }

    async fn extract_line_art(&self, image: &RgbaImage) -> Result<RgbaImage> {
        let line_art = match &self.edge_extractor {
            Some(extractor) => extractor.extract(image).await?,
            None => PassthroughEdges.extract(image).await?,
        };

        let expected = image.dimensions();
        let actual = line_art.dimensions();
        if actual.0 == 0 || actual.1 == 0 {
            return Err(PortraitError::DimensionMismatch { expected, actual });
        }
        if actual != expected {
            warn!("edge map is {actual:?}, expected {expected:?}; resizing");
            return Ok(imageops::resize(&line_art, expected.0, expected.1, FilterType::Triangle));
        }
        Ok(line_art)
    }

    async fn run(&mut self, photo: &Photo, config: &RenderConfig, resolution: Resolution) -> Result<RgbaImage> {
        let (w, h) = photo.image.dimensions();
        if w == 0 || h == 0 {
            return Err(PortraitError::EmptyImage { width: w, height: h });
        }

        // Stage 1: Edge extraction
        self.transition(RenderState::Processing);
        let line_art = self.extract_line_art(&photo.image).await?;

        let indicators = config.indicators.as_deref().unwrap_or_default();
        let region_map = self.region_map(photo, indicators, config.shuffle_salt);

        // Stage 2: Warp the line art into the distorted face
        self.transition(RenderState::Warping);
        let line_art = warp_line_art(line_art, indicators, &region_map, config.mode);

        // Stage 3: Region coloring
        self.transition(RenderState::Coloring);
        let regions = frame_regions(indicators, &region_map);
        let side = resolution.side();
        let seeds = config
            .subdivision
            .then(|| SeedSets::build(&regions, indicators, &region_map, resolution, (side as f64, side as f64)));
        if let Some(seeds) = &seeds {
            debug!("generated {} voronoi seeds", seeds.total());
        }
        let inputs = FrameInputs {
            regions: &regions,
            indicators,
            region_map: &region_map,
            palette: config.palette,
            subdivision: config.subdivision,
            mode: config.mode,
            width: side,
            height: side,
        };
        let mut canvas = rasterize(&inputs, seeds.as_ref());

        // Stage 4: Line art and grain
        self.transition(RenderState::Compositing);
        composite_line_art(&mut canvas, &line_art, config.mode);
        apply_grain(&mut canvas, resolution, &mut rand::thread_rng());

        Ok(canvas)
    }
}

/// Warps `line_art` through every non-background dynamic region, locked or
/// not. Modes without a warp hand the line art back untouched.
fn warp_line_art(
    line_art: RgbaImage,
    indicators: &[Indicator],
    region_map: &RegionMap,
    mode: CompositorMode,
) -> RgbaImage {
    if !mode.warps() {
        return line_art;
    }
    warp_regions(&line_art, &dynamic_regions(indicators, region_map))
}

/// The dynamic regions that take part in the coloring pass: those unlocked by the indicator count.
pub fn frame_regions(indicators: &[Indicator], region_map: &RegionMap) -> Vec<Region> {
    let unlocked = Tier::unlocked_by(indicators.len());
    dynamic_regions(indicators, region_map)
        .into_iter()
        .filter(|r| r.tier <= unlocked)
        .collect()
}
