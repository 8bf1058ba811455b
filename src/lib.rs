// THEORY:
// This file is the main entry point for the `iyf_portrait` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers (an upload form, a gallery, a
// batch exporter).
//
// The primary export is `PortraitPipeline` with its `RenderConfig` and
// `Photo` inputs: hand it a photograph and a snapshot of indicator sliders and
// it returns an economic caricature. The leaf components (`core_modules`) stay
// public for callers that want a single stage, such as resolving regions or
// solving an affine map, but the pipeline is the intended front door.

pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use core_modules::compositor::{CompositorMode, Resolution};
pub use core_modules::edge::{CannyEdges, EdgeExtractor, PassthroughEdges};
pub use error::{PortraitError, Result};
pub use pipeline::{
    ExportArtifact, Indicator, IndicatorCategory, PaletteType, Photo, PortraitPipeline, RegionId, RenderConfig,
    RenderState,
};
