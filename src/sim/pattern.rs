//! Pattern descriptors and the factory that synthesizes them
//!
//! A pattern is a declarative tile: a shape family drawn in a foreground
//! color over a contrasting background. Rendering is the host's business.

use std::fmt;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::difficulty::DifficultyProfile;
use crate::consts::*;

/// Decorative shape families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Dots,
    Stripes,
    Zigzag,
    Waves,
    Checkerboard,
    Crosshatch,
    Star,
    Polygon,
    Scribble,
    Burst,
    Ellipse,
}

impl ShapeType {
    pub const ALL: [ShapeType; 11] = [
        ShapeType::Dots,
        ShapeType::Stripes,
        ShapeType::Zigzag,
        ShapeType::Waves,
        ShapeType::Checkerboard,
        ShapeType::Crosshatch,
        ShapeType::Star,
        ShapeType::Polygon,
        ShapeType::Scribble,
        ShapeType::Burst,
        ShapeType::Ellipse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeType::Dots => "dots",
            ShapeType::Stripes => "stripes",
            ShapeType::Zigzag => "zigzag",
            ShapeType::Waves => "waves",
            ShapeType::Checkerboard => "checkerboard",
            ShapeType::Crosshatch => "crosshatch",
            ShapeType::Star => "star",
            ShapeType::Polygon => "polygon",
            ShapeType::Scribble => "scribble",
            ShapeType::Burst => "burst",
            ShapeType::Ellipse => "ellipse",
        }
    }
}

/// 24-bit color, serialized as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (leading `#` optional)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Shift each channel independently by up to `±max_delta`, clamped to [0, 255]
    pub fn jitter<R: Rng + ?Sized>(&self, rng: &mut R, max_delta: f32) -> Rgb {
        let mut adjust = |c: u8| {
            let delta = ((rng.random::<f32>() - 0.5) * 2.0 * max_delta).round();
            (c as f32 + delta).clamp(0.0, 255.0) as u8
        };
        Rgb::new(adjust(self.r), adjust(self.g), adjust(self.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Rgb::from_hex(&value).ok_or_else(|| format!("invalid color: {value}"))
    }
}

/// Vibrant, child-friendly palette (all entries distinct)
pub const PALETTE: [Rgb; 12] = [
    Rgb::new(0xFF, 0x6B, 0x6B),
    Rgb::new(0x4E, 0xCD, 0xC4),
    Rgb::new(0xFF, 0xE6, 0x6D),
    Rgb::new(0xFF, 0x9F, 0x43),
    Rgb::new(0xA2, 0x9B, 0xFE),
    Rgb::new(0x55, 0xE6, 0xC1),
    Rgb::new(0xFD, 0x79, 0xA8),
    Rgb::new(0xFA, 0xB1, 0xA0),
    Rgb::new(0x00, 0xD2, 0xD3),
    Rgb::new(0x54, 0xA0, 0xFF),
    Rgb::new(0x5F, 0x27, 0xCD),
    Rgb::new(0x1D, 0xD1, 0xA1),
];

/// Opaque pattern identifier (used by renderers as a definition key)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternId(pub u64);

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pattern-{:016x}", self.0)
    }
}

/// Per-family geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ShapeParams {
    Plain,
    Star { points: u8 },
    Polygon { sides: u8 },
    Burst { lines: u8 },
    /// Quadratic scribble through four points in tile space
    Scribble { control: [Vec2; 4] },
}

/// One decorative tile descriptor (immutable once built)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: PatternId,
    pub shape: ShapeType,
    pub params: ShapeParams,
    pub background: Rgb,
    pub foreground: Rgb,
    /// Tile size in canvas units
    pub size: f32,
    /// Degrees, [0, 360)
    pub rotation: f32,
    pub opacity: f32,
}

/// Synthesizes random pattern tiles for a difficulty profile
pub struct PatternFactory;

impl PatternFactory {
    /// Generate one tile.
    ///
    /// # Panics
    /// If `profile.allowed_shapes` is empty. Profiles reach the engine through
    /// [`super::DifficultyTable`], which rejects that case at build time.
    pub fn generate<R: Rng + ?Sized>(profile: &DifficultyProfile, rng: &mut R) -> Pattern {
        let shape = profile.allowed_shapes[rng.random_range(0..profile.allowed_shapes.len())];

        let bg_index = rng.random_range(0..PALETTE.len());
        let mut fg_index = rng.random_range(0..PALETTE.len() - 1);
        if fg_index >= bg_index {
            fg_index += 1;
        }

        let size = rng.random_range(PATTERN_MIN_SIZE..=PATTERN_MAX_SIZE);

        Pattern {
            id: PatternId(rng.random()),
            shape,
            params: Self::params_for(shape, size, rng),
            background: PALETTE[bg_index],
            foreground: PALETTE[fg_index],
            size,
            rotation: rng.random_range(0.0..360.0),
            opacity: rng.random_range(PATTERN_MIN_OPACITY..=PATTERN_MAX_OPACITY),
        }
    }

    fn params_for<R: Rng + ?Sized>(shape: ShapeType, size: f32, rng: &mut R) -> ShapeParams {
        match shape {
            ShapeType::Star => ShapeParams::Star {
                points: rng.random_range(4..=8),
            },
            ShapeType::Polygon => ShapeParams::Polygon {
                sides: rng.random_range(3..=8),
            },
            ShapeType::Burst => ShapeParams::Burst {
                lines: rng.random_range(6..=15),
            },
            ShapeType::Scribble => {
                let mut point =
                    || Vec2::new(rng.random::<f32>() * size, rng.random::<f32>() * size);
                ShapeParams::Scribble {
                    control: [point(), point(), point(), point()],
                }
            }
            _ => ShapeParams::Plain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Difficulty, DifficultyTable};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_palette_is_distinct() {
        for (i, a) in PALETTE.iter().enumerate() {
            for b in &PALETTE[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_hex_parse_and_format() {
        let c = Rgb::from_hex("#4ECDC4").unwrap();
        assert_eq!(c, Rgb::new(0x4E, 0xCD, 0xC4));
        assert_eq!(c.to_string(), "#4ecdc4");
        assert_eq!(Rgb::from_hex("4ecdc4"), Some(c));
        assert_eq!(Rgb::from_hex("#4ecd"), None);
        assert_eq!(Rgb::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn test_color_serializes_as_hex() {
        let json = serde_json::to_string(&Rgb::new(255, 0, 16)).unwrap();
        assert_eq!(json, "\"#ff0010\"");
        let back: Rgb = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Rgb::new(255, 0, 16));
    }

    #[test]
    fn test_jitter_clamps() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..200 {
            let c = Rgb::new(0, 255, 128).jitter(&mut rng, 10.0);
            assert!(c.g >= 245);
            assert!(c.r <= 10);
            assert!((118..=138).contains(&c.b));
        }
    }

    #[test]
    fn test_params_match_shape() {
        let table = DifficultyTable::standard();
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..500 {
            let p = PatternFactory::generate(table.profile(Difficulty::High), &mut rng);
            match (p.shape, &p.params) {
                (ShapeType::Star, ShapeParams::Star { points }) => {
                    assert!((4..=8).contains(points))
                }
                (ShapeType::Polygon, ShapeParams::Polygon { sides }) => {
                    assert!((3..=8).contains(sides))
                }
                (ShapeType::Burst, ShapeParams::Burst { lines }) => {
                    assert!((6..=15).contains(lines))
                }
                (ShapeType::Scribble, ShapeParams::Scribble { control }) => {
                    assert!(control.iter().all(|v| v.x <= p.size && v.y <= p.size));
                }
                (_, ShapeParams::Plain) => {}
                other => panic!("mismatched params: {:?}", other),
            }
        }
    }

    proptest! {
        #[test]
        fn prop_pattern_within_ranges(seed in any::<u64>(), level in 0usize..3) {
            let table = DifficultyTable::standard();
            let profile = table.profile(Difficulty::ALL[level]);
            let mut rng = Pcg32::seed_from_u64(seed);
            let p = PatternFactory::generate(profile, &mut rng);

            prop_assert_ne!(p.foreground, p.background);
            prop_assert!(profile.allowed_shapes.contains(&p.shape));
            prop_assert!((PATTERN_MIN_SIZE..=PATTERN_MAX_SIZE).contains(&p.size));
            prop_assert!((0.0..360.0).contains(&p.rotation));
            prop_assert!((PATTERN_MIN_OPACITY..=PATTERN_MAX_OPACITY).contains(&p.opacity));
        }
    }
}
