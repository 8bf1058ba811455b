// Encode/decode helpers at the edge of the engine. The core only ever sees
// decoded `RgbaImage`s; these functions are the bridge to bytes and files.

pub mod image_helper {
    use crate::error::{PortraitError, Result};
    use image::codecs::jpeg::JpegEncoder;
    use image::codecs::png::PngEncoder;
    use image::imageops::FilterType;
    use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};
    use std::io::Cursor;
    use std::path::Path;

    pub const DEFAULT_MAX_SIDE: u32 = 1024;
    pub const DEFAULT_JPEG_QUALITY: u8 = 85;

    /// Decodes any format `image` recognizes into RGBA.
    pub fn decode(bytes: &[u8]) -> Result<RgbaImage> {
        let img = image::load_from_memory(bytes).map_err(PortraitError::Decode)?;
        let rgba = img.into_rgba8();
        if rgba.width() == 0 || rgba.height() == 0 {
            return Err(PortraitError::EmptyImage {
                width: rgba.width(),
                height: rgba.height(),
            });
        }
        Ok(rgba)
    }

    /// Lossless PNG encoding of an RGBA raster.
    pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgba8)
            .map_err(PortraitError::Encode)?;
        Ok(bytes)
    }

    /// Shrinks `image` so its longer side is at most `max_side` and re-encodes
    /// it as JPEG at `quality`. Smaller images are re-encoded at their size.
    pub fn downscale_to_jpeg(image: &RgbaImage, max_side: u32, quality: u8) -> Result<Vec<u8>> {
        let (w, h) = image.dimensions();
        let longest = w.max(h);
        let rgb = if longest > max_side && max_side > 0 {
            let scale = max_side as f64 / longest as f64;
            let nw = ((w as f64 * scale).round() as u32).max(1);
            let nh = ((h as f64 * scale).round() as u32).max(1);
            DynamicImage::ImageRgba8(image::imageops::resize(image, nw, nh, FilterType::Triangle)).into_rgb8()
        } else {
            DynamicImage::ImageRgba8(image.clone()).into_rgb8()
        };

        let mut cursor = Cursor::new(Vec::new());
        JpegEncoder::new_with_quality(&mut cursor, quality)
            .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
            .map_err(PortraitError::Encode)?;
        Ok(cursor.into_inner())
    }

    pub fn save_png(path: impl AsRef<Path>, image: &RgbaImage) -> Result<()> {
        let bytes = encode_png(image)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {

    use super::image_helper::*;
    use crate::error::PortraitError;
    use image::{Rgba, RgbaImage};

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255]))
    }

    #[test]
    fn png_round_trip_is_lossless() {
        let img = gradient(40, 30);
        let bytes = encode_png(&img).expect("Error encoding PNG.");
        assert_eq!(decode(&bytes).expect("Error decoding PNG."), img);
    }

    #[test]
    fn downscale_caps_longest_side() {
        let img = gradient(2000, 1000);
        let jpeg = downscale_to_jpeg(&img, DEFAULT_MAX_SIDE, DEFAULT_JPEG_QUALITY).unwrap();
        let back = decode(&jpeg).unwrap();
        assert_eq!(back.dimensions(), (1024, 512));
    }

    #[test]
    fn small_images_keep_their_size() {
        let img = gradient(64, 48);
        let jpeg = downscale_to_jpeg(&img, DEFAULT_MAX_SIDE, DEFAULT_JPEG_QUALITY).unwrap();
        assert_eq!(decode(&jpeg).unwrap().dimensions(), (64, 48));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(decode(b"definitely not an image"), Err(PortraitError::Decode(_))));
    }

    #[test]
    fn save_writes_a_readable_file() {
        let path = std::env::temp_dir().join(format!("iyf-portrait-helper-{}.png", std::process::id()));
        let img = gradient(10, 10);
        save_png(&path, &img).expect("Error Saving File.");
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(decode(&bytes).unwrap(), img);
        std::fs::remove_file(&path).ok();
    }
}
