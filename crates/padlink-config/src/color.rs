/// Peer colors, stored in config and rendered into highlight styles.
///
/// Serialized as `"#RRGGBB"` or `"#RRGGBBAA"` strings; `"#RGB"` is also read.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl HexColor {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#RGB`, `#RRGGBB` or `#RRGGBBAA`. Short form digits are doubled.
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix('#')?;
        if !s.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
        match s.len() {
            3 => {
                let mut digits = [0u8; 3];
                for (slot, c) in digits.iter_mut().zip(s.chars()) {
                    let d = c.to_digit(16)? as u8;
                    *slot = d * 16 + d;
                }
                Some(Self::rgb(digits[0], digits[1], digits[2]))
            }
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    /// Uppercase hex, without the alpha byte when fully opaque.
    pub fn to_hex(self) -> String {
        self.to_string()
    }

    /// Opaque CSS `rgb()` value, for hosts without `rgba()` support.
    pub fn to_css_rgb(self) -> String {
        let Self { r, g, b, .. } = self;
        format!("rgb({r},{g},{b})")
    }

    /// CSS `rgba()` value with the given opacity, ignoring the color's own alpha.
    pub fn to_css_rgba(self, alpha: f32) -> String {
        let Self { r, g, b, .. } = self;
        format!("rgba({r},{g},{b},{})", alpha.clamp(0.0, 1.0))
    }

    /// Class name used for a peer's highlighted selection, e.g. `selection-FF8800`.
    pub fn selection_class(self) -> String {
        let hex = self.to_hex();
        format!("selection-{}", hex.trim_start_matches('#'))
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02X}", self.a)?;
        }
        Ok(())
    }
}

impl FromStr for HexColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s).ok_or_else(|| format!("invalid hex color: {s}"))
    }
}

impl Serialize for HexColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HexColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
