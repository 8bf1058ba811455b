// THEORY:
// The `indicator` module translates economic readings into the two things the
// renderer consumes: a magnitude in [0, 1] and a color.
//
// Key architectural principles:
// 1.  **Graceful Normalization**: Indicators are owned by the caller and may be
//     malformed. `normalize` never fails; a degenerate range (`max <= min`)
//     collapses to the midpoint 0.5 and everything else is clamped.
// 2.  **Category Families**: `color_for` picks a base color family from the
//     indicator's category and interpolates it by magnitude. The palette then
//     post-processes the result (desaturate, soften or push saturation).
// 3.  **Legacy Lookup**: `palette_index_color` is the older index-into-a-list
//     scheme. It is kept because the basic compositor mode still draws with it.
//
// All channel arithmetic happens in f64 and is clamped to [0, 255] before it
// becomes an `Rgb`.

use serde::{Deserialize, Serialize};

/// Broad family an indicator belongs to. Drives the base color family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorCategory {
    Growth,
    Stability,
    Social,
    #[default]
    #[serde(other)]
    Other,
}

/// A single economic metric as snapshotted from the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub current: f64,
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub category: IndicatorCategory,
}

impl Indicator {
    pub fn new(id: impl Into<String>, current: f64, min: f64, max: f64, category: IndicatorCategory) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            current,
            min,
            max,
            unit: String::new(),
            category,
        }
    }
}

/// `clamp((current - min) / (max - min), 0, 1)`, or `0.5` when `max <= min`.
pub fn normalize(indicator: &Indicator) -> f64 {
    if !(indicator.max > indicator.min) {
        return 0.5;
    }
    let value = (indicator.current - indicator.min) / (indicator.max - indicator.min);
    if value.is_nan() {
        return 0.5;
    }
    value.clamp(0.0, 1.0)
}

/// A 24-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self([red, green, blue])
    }

    /// Builds a color from floating channels, clamping each to [0, 255].
    pub fn from_channels(red: f64, green: f64, blue: f64) -> Self {
        let clamp = |c: f64| c.round().clamp(0.0, 255.0) as u8;
        Self([clamp(red), clamp(green), clamp(blue)])
    }
}

/// The three built-in palettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaletteType {
    #[default]
    Vibrant,
    Neutral,
    Monochrome,
}

const VIBRANT_COLORS: [Rgb; 5] = [
    Rgb::new(0xff, 0x6b, 0x6b),
    Rgb::new(0x4e, 0xcd, 0xc4),
    Rgb::new(0x45, 0xb7, 0xd1),
    Rgb::new(0xff, 0xa0, 0x7a),
    Rgb::new(0x98, 0xd8, 0xc8),
];

const NEUTRAL_COLORS: [Rgb; 5] = [
    Rgb::new(0x8b, 0x7d, 0x6b),
    Rgb::new(0xa0, 0x93, 0x7d),
    Rgb::new(0xb8, 0xa9, 0x9a),
    Rgb::new(0xd4, 0xc5, 0xb9),
    Rgb::new(0xe8, 0xdc, 0xc4),
];

const MONOCHROME_COLORS: [Rgb; 5] = [
    Rgb::new(0x1a, 0x1a, 0x1a),
    Rgb::new(0x4d, 0x4d, 0x4d),
    Rgb::new(0x80, 0x80, 0x80),
    Rgb::new(0xb3, 0xb3, 0xb3),
    Rgb::new(0xe6, 0xe6, 0xe6),
];

impl PaletteType {
    /// The fixed, ordered color list used by the legacy lookup.
    pub fn colors(&self) -> &'static [Rgb] {
        match self {
            PaletteType::Vibrant => &VIBRANT_COLORS,
            PaletteType::Neutral => &NEUTRAL_COLORS,
            PaletteType::Monochrome => &MONOCHROME_COLORS,
        }
    }
}

/// Low/high endpoints of a category's color family.
type Family = ([f64; 3], [f64; 3]);

const GROWTH_FAMILY: Family = ([40.0, 90.0, 150.0], [40.0, 200.0, 190.0]);
const STABILITY_FAMILY: Family = ([235.0, 150.0, 70.0], [200.0, 40.0, 40.0]);
const SOCIAL_PURPLE: Family = ([170.0, 130.0, 200.0], [110.0, 50.0, 160.0]);
const SOCIAL_GREEN: Family = ([140.0, 200.0, 130.0], [40.0, 150.0, 80.0]);
const NEUTRAL_FAMILY: Family = ([235.0, 220.0, 195.0], [200.0, 180.0, 150.0]);

fn lerp_family((low, high): Family, t: f64) -> [f64; 3] {
    let t = t.clamp(0.0, 1.0);
    [
        low[0] + (high[0] - low[0]) * t,
        low[1] + (high[1] - low[1]) * t,
        low[2] + (high[2] - low[2]) * t,
    ]
}

fn base_channels(category: IndicatorCategory, magnitude: f64) -> [f64; 3] {
    match category {
        IndicatorCategory::Growth => lerp_family(GROWTH_FAMILY, magnitude),
        IndicatorCategory::Stability => lerp_family(STABILITY_FAMILY, magnitude),
        // Social splits at the midpoint: purple below, green above.
        IndicatorCategory::Social if magnitude < 0.5 => lerp_family(SOCIAL_PURPLE, magnitude * 2.0),
        IndicatorCategory::Social => lerp_family(SOCIAL_GREEN, (magnitude - 0.5) * 2.0),
        IndicatorCategory::Other => lerp_family(NEUTRAL_FAMILY, magnitude),
    }
}

fn luma(channels: [f64; 3]) -> f64 {
    0.299 * channels[0] + 0.587 * channels[1] + 0.114 * channels[2]
}

/// Category-family color for `indicator` at `magnitude`, post-processed by `palette`.
pub fn color_for(indicator: &Indicator, magnitude: f64, palette: PaletteType) -> Rgb {
    let magnitude = if magnitude.is_nan() { 0.5 } else { magnitude.clamp(0.0, 1.0) };
    let mut channels = base_channels(indicator.category, magnitude);

    match palette {
        PaletteType::Monochrome => {
            let l = luma(channels);
            channels = [l, l, l];
        }
        PaletteType::Neutral => {
            let l = luma(channels);
            for c in channels.iter_mut() {
                *c = *c * 0.7 + l * 0.3;
            }
        }
        PaletteType::Vibrant => match indicator.category {
            IndicatorCategory::Growth => {
                channels[0] *= 0.5;
                channels[2] = 255.0;
            }
            IndicatorCategory::Stability => {
                channels[0] = 255.0;
                channels[2] *= 0.5;
            }
            IndicatorCategory::Social if magnitude < 0.5 => {
                channels[1] *= 0.5;
                channels[2] = 255.0;
            }
            IndicatorCategory::Social => {
                channels[0] *= 0.5;
                channels[1] = 255.0;
            }
            IndicatorCategory::Other => {
                for c in channels.iter_mut() {
                    *c *= 1.2;
                }
            }
        },
    }

    Rgb::from_channels(channels[0], channels[1], channels[2])
}

/// Legacy lookup: `colors[floor(magnitude * (len - 1))]`.
pub fn palette_index_color(palette: PaletteType, magnitude: f64) -> Rgb {
    let colors = palette.colors();
    let magnitude = if magnitude.is_nan() { 0.5 } else { magnitude.clamp(0.0, 1.0) };
    let index = (magnitude * (colors.len() - 1) as f64).floor() as usize;
    colors[index.min(colors.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gdp(current: f64) -> Indicator {
        Indicator::new("gdp", current, -5.0, 10.0, IndicatorCategory::Growth)
    }

    #[test]
    fn normalize_clamps_and_scales() {
        assert_eq!(normalize(&gdp(10.0)), 1.0);
        assert_eq!(normalize(&gdp(-5.0)), 0.0);
        assert_eq!(normalize(&gdp(2.5)), 0.5);
        assert_eq!(normalize(&gdp(50.0)), 1.0);
        assert_eq!(normalize(&gdp(-50.0)), 0.0);
    }

    #[test]
    fn degenerate_range_is_midpoint() {
        let flat = Indicator::new("flat", 3.0, 2.0, 2.0, IndicatorCategory::Social);
        let inverted = Indicator::new("inv", 3.0, 5.0, 1.0, IndicatorCategory::Social);
        assert_eq!(normalize(&flat), 0.5);
        assert_eq!(normalize(&inverted), 0.5);
    }

    #[test]
    fn monochrome_is_gray() {
        for category in [
            IndicatorCategory::Growth,
            IndicatorCategory::Stability,
            IndicatorCategory::Social,
            IndicatorCategory::Other,
        ] {
            let ind = Indicator::new("x", 0.0, 0.0, 1.0, category);
            let Rgb([r, g, b]) = color_for(&ind, 0.73, PaletteType::Monochrome);
            assert_eq!(r, g);
            assert_eq!(g, b);
        }
    }

    #[test]
    fn neutral_pulls_toward_luminance() {
        let ind = gdp(0.0);
        let vivid = Rgb::from_channels(40.0, 90.0, 150.0);
        let soft = color_for(&ind, 0.0, PaletteType::Neutral);
        let l = luma([40.0, 90.0, 150.0]);
        let spread = |c: Rgb| c.0.iter().map(|&v| (v as f64 - l).abs()).sum::<f64>();
        assert!(spread(soft) < spread(vivid));
    }

    #[test]
    fn vibrant_overrides_dominant_channel() {
        assert_eq!(color_for(&gdp(0.0), 0.3, PaletteType::Vibrant).0[2], 255);
        let infl = Indicator::new("inflation", 0.0, 0.0, 1.0, IndicatorCategory::Stability);
        assert_eq!(color_for(&infl, 0.3, PaletteType::Vibrant).0[0], 255);
    }

    #[test]
    fn social_splits_at_midpoint() {
        let ind = Indicator::new("gini", 0.0, 0.0, 1.0, IndicatorCategory::Social);
        let below = color_for(&ind, 0.49, PaletteType::Vibrant);
        let above = color_for(&ind, 0.51, PaletteType::Vibrant);
        assert_eq!(below.0[2], 255);
        assert_eq!(above.0[1], 255);
    }

    #[test]
    fn legacy_index_lookup() {
        assert_eq!(palette_index_color(PaletteType::Vibrant, 0.0), VIBRANT_COLORS[0]);
        assert_eq!(palette_index_color(PaletteType::Vibrant, 0.5), VIBRANT_COLORS[2]);
        assert_eq!(palette_index_color(PaletteType::Vibrant, 0.99), VIBRANT_COLORS[3]);
        assert_eq!(palette_index_color(PaletteType::Vibrant, 1.0), VIBRANT_COLORS[4]);
    }

    #[test]
    fn unknown_category_deserializes_as_other() {
        let ind: Indicator = serde_json::from_str(
            r#"{"id":"x","current":1,"min":0,"max":2,"category":"housing"}"#,
        )
        .unwrap();
        assert_eq!(ind.category, IndicatorCategory::Other);
    }
}
