// THEORY:
// Edge extraction is a collaborator, not part of the core. The renderer only
// relies on its contract: one raster in, one raster of the same size out,
// black lines on white, no side effects. The call may suspend (a remote model,
// a GPU queue), so the trait hands back a boxed future.
//
// Two implementations ship with the crate:
// - `PassthroughEdges`: returns its input. This is what runs when no extractor
//   is configured.
// - `CannyEdges`: a local Canny detector from imageproc, inverted so edges
//   come out black on a white field like a line drawing.

use crate::error::{PortraitError, Result};
use futures::future::{self, BoxFuture};
use image::{Luma, Rgba, RgbaImage};

/// Black-box image-to-image edge filter.
pub trait EdgeExtractor: Send + Sync {
    fn extract<'a>(&'a self, image: &'a RgbaImage) -> BoxFuture<'a, Result<RgbaImage>>;
}

/// Fallback used when no extractor is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughEdges;

impl EdgeExtractor for PassthroughEdges {
    fn extract<'a>(&'a self, image: &'a RgbaImage) -> BoxFuture<'a, Result<RgbaImage>> {
        Box::pin(future::ready(Ok(image.clone())))
    }
}

/// Canny hysteresis thresholds, on gradient magnitude.
#[derive(Debug, Clone, Copy)]
pub struct CannyEdges {
    pub low_threshold: f32,
    pub high_threshold: f32,
}

impl Default for CannyEdges {
    fn default() -> Self {
        Self {
            low_threshold: 40.0,
            high_threshold: 100.0,
        }
    }
}

impl CannyEdges {
    /// Synchronous body of the filter.
    pub fn line_art(&self, image: &RgbaImage) -> Result<RgbaImage> {
        if !(self.low_threshold > 0.0 && self.high_threshold >= self.low_threshold) {
            return Err(PortraitError::EdgeExtraction(format!(
                "invalid thresholds {} / {}",
                self.low_threshold, self.high_threshold
            )));
        }
        let gray = image::imageops::grayscale(image);
        let edges = imageproc::edges::canny(&gray, self.low_threshold, self.high_threshold);
        let (w, h) = edges.dimensions();
        Ok(RgbaImage::from_fn(w, h, |x, y| {
            let Luma([v]) = *edges.get_pixel(x, y);
            if v > 0 { Rgba([0, 0, 0, 255]) } else { Rgba([255, 255, 255, 255]) }
        }))
    }
}

impl EdgeExtractor for CannyEdges {
    fn extract<'a>(&'a self, image: &'a RgbaImage) -> BoxFuture<'a, Result<RgbaImage>> {
        Box::pin(async move { self.line_art(image) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_image() -> RgbaImage {
        RgbaImage::from_fn(40, 40, |x, _| if x < 20 { Rgba([0, 0, 0, 255]) } else { Rgba([255, 255, 255, 255]) })
    }

    #[tokio::test]
    async fn passthrough_returns_input() {
        let img = split_image();
        let out = PassthroughEdges.extract(&img).await.unwrap();
        assert_eq!(out, img);
    }

    #[tokio::test]
    async fn canny_is_binary_and_same_size() {
        let img = split_image();
        let out = CannyEdges::default().extract(&img).await.unwrap();
        assert_eq!(out.dimensions(), img.dimensions());
        assert!(out.pixels().all(|p| p.0 == [0, 0, 0, 255] || p.0 == [255, 255, 255, 255]));
        // The vertical step produces at least one black edge pixel.
        assert!(out.pixels().any(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn canny_flat_image_is_white() {
        let flat = RgbaImage::from_pixel(16, 16, Rgba([90, 90, 90, 255]));
        let out = CannyEdges::default().line_art(&flat).unwrap();
        assert!(out.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn bad_thresholds_are_rejected() {
        let flat = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let bad = CannyEdges { low_threshold: 50.0, high_threshold: 10.0 };
        assert!(matches!(bad.line_art(&flat), Err(PortraitError::EdgeExtraction(_))));
    }
}
