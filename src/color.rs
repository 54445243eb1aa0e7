//! RGB / hex / CMYK conversions used by the color pickers and layer styles.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        rgb_to_hex(self.r, self.g, self.b)
    }

    pub fn to_cmyk(self) -> Cmyk {
        rgb_to_cmyk(self.r, self.g, self.b)
    }
}

/// Percentages, each 0–100.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Cmyk {
    pub c: u8,
    pub m: u8,
    pub y: u8,
    pub k: u8,
}

impl Cmyk {
    pub const fn new(c: u8, m: u8, y: u8, k: u8) -> Self {
        Self { c, m, y, k }
    }

    pub fn to_rgb(self) -> Rgb {
        cmyk_to_rgb(self.c, self.m, self.y, self.k)
    }
}

impl fmt::Display for Cmyk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C={} M={} Y={} K={}", self.c, self.m, self.y, self.k)
    }
}

/// A fill or stroke color. Style fields accept the literal `transparent`
/// in addition to hex colors.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum Paint {
    #[default]
    Transparent,
    Solid(Rgb),
}

impl Paint {
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("transparent") {
            Paint::Transparent
        } else {
            Paint::Solid(hex_to_rgb(value))
        }
    }

    /// Strict form for typed input: `transparent`, or three or six hex
    /// digits with or without a leading `#`.
    pub fn from_input(value: &str) -> Option<Self> {
        let value = value.trim();
        let digits = value.strip_prefix('#').unwrap_or(value);
        if value.eq_ignore_ascii_case("transparent") {
            Some(Paint::Transparent)
        } else if matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(Paint::parse(value))
        } else {
            None
        }
    }

    pub fn solid(hex: &str) -> Self {
        Paint::Solid(hex_to_rgb(hex))
    }

    pub fn rgb(&self) -> Option<Rgb> {
        match self {
            Paint::Transparent => None,
            Paint::Solid(rgb) => Some(*rgb),
        }
    }

    pub fn to_css(&self) -> String {
        match self {
            Paint::Transparent => "transparent".to_string(),
            Paint::Solid(rgb) => rgb.to_hex(),
        }
    }
}

/// Accepts `#rgb`, `rgb`, `#rrggbb` or `rrggbb`. Anything else is black.
pub fn hex_to_rgb(hex: &str) -> Rgb {
    let clean = hex.trim().trim_start_matches('#');
    let expanded: String = if clean.len() == 3 {
        clean.chars().flat_map(|c| [c, c]).collect()
    } else {
        clean.to_string()
    };

    if expanded.len() != 6 || !expanded.chars().all(|c| c.is_ascii_hexdigit()) {
        return Rgb::BLACK;
    }

    match u32::from_str_radix(&expanded, 16) {
        Ok(value) => Rgb::new(
            ((value >> 16) & 0xff) as u8,
            ((value >> 8) & 0xff) as u8,
            (value & 0xff) as u8,
        ),
        Err(_) => Rgb::BLACK,
    }
}

pub fn rgb_to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

pub fn rgb_to_cmyk(r: u8, g: u8, b: u8) -> Cmyk {
    if r == 0 && g == 0 && b == 0 {
        return Cmyk::new(0, 0, 0, 100);
    }

    let c = 1.0 - r as f64 / 255.0;
    let m = 1.0 - g as f64 / 255.0;
    let y = 1.0 - b as f64 / 255.0;
    let k = c.min(m).min(y);

    if k >= 1.0 {
        return Cmyk::new(0, 0, 0, 100);
    }

    let scale = 1.0 - k;
    Cmyk::new(
        percent((c - k) / scale),
        percent((m - k) / scale),
        percent((y - k) / scale),
        percent(k),
    )
}

pub fn cmyk_to_rgb(c: u8, m: u8, y: u8, k: u8) -> Rgb {
    let ink = |v: u8| 1.0 - (v.min(100) as f64 / 100.0);
    let key = ink(k);
    let channel = |v: u8| (255.0 * ink(v) * key).round().clamp(0.0, 255.0) as u8;
    Rgb::new(channel(c), channel(m), channel(y))
}

fn percent(v: f64) -> u8 {
    (v * 100.0).round().clamp(0.0, 100.0) as u8
}
