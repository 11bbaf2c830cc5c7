//! Colour types and HSV conversion
//!
//! Hue spans the full `u16` range (0..=65535 for one turn of the colour
//! wheel); saturation, brightness and RGB channels are 0..=255.

use serde::{Deserialize, Serialize};

/// Largest hue value
pub const HUE_MAX: u16 = u16::MAX;

/// An RGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

/// Hue, saturation and brightness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Hsb {
    pub hue: u16,
    pub saturation: u8,
    pub brightness: u8,
}

impl Rgb {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Whether all channels are zero
    pub fn is_black(&self) -> bool {
        self.red == 0 && self.green == 0 && self.blue == 0
    }

    /// Convert to hue/saturation/brightness
    pub fn to_hsb(self) -> Hsb {
        let r = f64::from(self.red);
        let g = f64::from(self.green);
        let b = f64::from(self.blue);

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let degrees = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };

        let saturation = if max == 0.0 { 0.0 } else { delta / max * 255.0 };

        Hsb {
            hue: (degrees / 360.0 * f64::from(HUE_MAX)).round() as u16,
            saturation: saturation.round() as u8,
            brightness: self.red.max(self.green).max(self.blue),
        }
    }
}

impl Hsb {
    pub const fn new(hue: u16, saturation: u8, brightness: u8) -> Self {
        Self {
            hue,
            saturation,
            brightness,
        }
    }

    /// Convert to RGB
    pub fn to_rgb(self) -> Rgb {
        let value = f64::from(self.brightness) / 255.0;
        let saturation = f64::from(self.saturation) / 255.0;
        let degrees = f64::from(self.hue) / f64::from(HUE_MAX) * 360.0;

        let chroma = value * saturation;
        let sector = (degrees / 60.0) % 6.0;
        let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
        let m = value - chroma;

        let (r, g, b) = match sector as u8 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };

        let channel = |c: f64| ((c + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgb::new(channel(r), channel(g), channel(b))
    }
}
