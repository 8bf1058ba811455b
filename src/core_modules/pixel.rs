// THEORY:
// The `Pixel` module is the smallest unit of the compositor. It is a "dumb"
// RGBA container plus the two single-pixel blend modes the render passes need.
//
// Key architectural principles:
// 1.  **Data Purity**: Channels are stored as raw `u8`, exactly as they sit in
//     an `RgbaImage` buffer. Conversions to and from `image::Rgba<u8>` and byte
//     slices are free of interpretation.
// 2.  **Blend Math in Floats**: Blending is done in normalized f32 and rounded
//     back to bytes once, so repeated passes (color, line art, grain) do not
//     accumulate truncation error mid-formula.
// 3.  **Separable Alpha**: Both blend modes follow the usual source-over
//     compositing equations with non-premultiplied inputs. Multiply falls back
//     to the plain source color where the backdrop is transparent, which is what
//     lets skipped (unset) pixels pick up the line art unchanged.

pub mod pixel {
    use image::Rgba;

    pub type Channel = u8;

    const CHANNELS: usize = 4;

    /// A single non-premultiplied RGBA pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        pub red: Channel,
        pub green: Channel,
        pub blue: Channel,
        pub alpha: Channel,
    }

    impl Pixel {
        pub const TRANSPARENT: Pixel = Pixel::new(0, 0, 0, 0);
        pub const WHITE: Pixel = Pixel::new(255, 255, 255, 255);
        pub const BLACK: Pixel = Pixel::new(0, 0, 0, 255);

        pub const fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Pixel { red, green, blue, alpha }
        }

        pub const fn opaque(rgb: [Channel; 3]) -> Self {
            Pixel::new(rgb[0], rgb[1], rgb[2], 255)
        }

        fn normalized(&self) -> [f32; 4] {
            [
                self.red as f32 / 255.0,
                self.green as f32 / 255.0,
                self.blue as f32 / 255.0,
                self.alpha as f32 / 255.0,
            ]
        }

        fn from_normalized(rgb: [f32; 3], alpha: f32) -> Self {
            let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as Channel;
            Pixel::new(to_byte(rgb[0]), to_byte(rgb[1]), to_byte(rgb[2]), to_byte(alpha))
        }

        /// Composites `top` over `self` with a separable blend function `mix(backdrop, source)`.
        fn composite(&self, top: &Pixel, opacity: f32, mix: impl Fn(f32, f32) -> f32) -> Pixel {
            let back = self.normalized();
            let src = top.normalized();
            let alpha_s = src[3] * opacity.clamp(0.0, 1.0);
            let alpha_b = back[3];
            let alpha_o = alpha_s + alpha_b * (1.0 - alpha_s);
            if alpha_o <= f32::EPSILON {
                return Pixel::TRANSPARENT;
            }

            let mut rgb = [0.0f32; 3];
            for i in 0..3 {
                let mixed = (1.0 - alpha_b) * src[i] + alpha_b * mix(back[i], src[i]);
                let premultiplied = alpha_s * mixed + (1.0 - alpha_s) * alpha_b * back[i];
                rgb[i] = premultiplied / alpha_o;
            }
            Pixel::from_normalized(rgb, alpha_o)
        }

        /// Normal ("source-over") blend of `top` at `opacity`.
        pub fn blend_normal(&self, top: &Pixel, opacity: f32) -> Pixel {
            self.composite(top, opacity, |_, source| source)
        }

        /// Multiply blend of `top` at `opacity`.
        pub fn blend_multiply(&self, top: &Pixel, opacity: f32) -> Pixel {
            self.composite(top, opacity, |backdrop, source| backdrop * source)
        }
    }

    impl From<&[u8]> for Pixel {
        fn from(bytes: &[u8]) -> Self {
            if bytes.len() != CHANNELS {
                panic!("Cannot convert {} bytes into pixel.", bytes.len());
            }
            Pixel::new(bytes[0], bytes[1], bytes[2], bytes[3])
        }
    }

    impl From<Rgba<u8>> for Pixel {
        fn from(rgba: Rgba<u8>) -> Self {
            let [red, green, blue, alpha] = rgba.0;
            Pixel::new(red, green, blue, alpha)
        }
    }

    impl From<&Rgba<u8>> for Pixel {
        fn from(rgba: &Rgba<u8>) -> Self {
            Pixel::from(*rgba)
        }
    }

    impl From<Pixel> for Rgba<u8> {
        fn from(pixel: Pixel) -> Self {
            Rgba([pixel.red, pixel.green, pixel.blue, pixel.alpha])
        }
    }
}
