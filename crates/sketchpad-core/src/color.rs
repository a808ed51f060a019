//! CSS color values used by shape styles and the wire format.

use crate::error::SketchError;
use peniko::Color;
use peniko::color::{Hsl, Srgb, parse_color};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An RGBA8 color that reads and writes CSS color strings.
///
/// Parsing accepts any CSS Color Level 4 syntax (hex, `rgb()`/`rgba()` in
/// comma or space form, `hsl()`, `hwb()`, `lab()`, the full named-color
/// table and `transparent`). The value is stored as 8-bit sRGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CssColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl CssColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Build from an alpha fraction in `0..=1`, the way `rgba()` strings do.
    pub fn rgba(r: u8, g: u8, b: u8, alpha: f64) -> Self {
        Self::new(r, g, b, alpha_to_u8(alpha))
    }

    pub const fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    pub const fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Alpha as a fraction in `0..=1`.
    pub fn alpha(&self) -> f64 {
        f64::from(self.a) / 255.0
    }

    pub fn with_alpha(self, alpha: f64) -> Self {
        Self {
            a: alpha_to_u8(alpha),
            ..self
        }
    }

    /// Reduce HSL lightness by `amount` (0..1), keeping hue, saturation and alpha.
    pub fn darken(self, amount: f64) -> Self {
        let amount = amount as f32;
        let darker = Color::from(self)
            .convert::<Hsl>()
            .map_lightness(|l| (l - amount).clamp(0.0, 1.0))
            .convert::<Srgb>();
        Self {
            a: self.a,
            ..Self::from(darker)
        }
    }
}

fn alpha_to_u8(alpha: f64) -> u8 {
    (alpha.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl FromStr for CssColor {
    type Err = SketchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = parse_color(s).map_err(|source| SketchError::InvalidColor {
            input: s.to_string(),
            source,
        })?;
        Ok(Self::from(parsed.to_alpha_color::<Srgb>()))
    }
}

impl fmt::Display for CssColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            let alpha = (self.alpha() * 100.0).round() / 100.0;
            write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
        }
    }
}

impl Serialize for CssColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CssColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl From<Color> for CssColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<CssColor> for Color {
    fn from(color: CssColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}
