use crate::data::JoinedDataset;
use serde::Deserialize;
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 24-bit color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const RED: Rgb = Rgb(255, 0, 0);

    /// Build from unit-range channels, rounding like matplotlib's `to_hex`
    pub fn from_unit(r: f64, g: f64, b: f64) -> Self {
        let q = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgb(q(r), q(g), q(b))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color '{0}'")]
pub struct ParseColorError(pub String);

impl FromStr for Rgb {
    type Err = ParseColorError;

    /// Accepts `#rrggbb` or one of a few basic color names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "black" => return Ok(Rgb::BLACK),
            "white" => return Ok(Rgb::WHITE),
            "red" => return Ok(Rgb::RED),
            "blue" => return Ok(Rgb(0, 0, 255)),
            "green" => return Ok(Rgb(0, 128, 0)),
            "yellow" => return Ok(Rgb(255, 255, 0)),
            _ => {}
        }
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ParseColorError(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ParseColorError(s.to_string()))
        };
        Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// Continuous color ramp mapping a ratio in [0, 1] to a color
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorRamp {
    /// matplotlib "rainbow": purple-blue through green and yellow to red
    #[default]
    Rainbow,
    /// Piecewise linear blue -> green -> yellow -> red
    Bgyr,
}

impl ColorRamp {
    pub fn color_at(self, ratio: f64) -> Rgb {
        let x = ratio.clamp(0.0, 1.0);
        match self {
            ColorRamp::Rainbow => Rgb::from_unit(
                (2.0 * x - 0.5).abs(),
                (PI * x).sin(),
                (PI * x / 2.0).cos(),
            ),
            ColorRamp::Bgyr => {
                const STOPS: [(f64, f64, f64); 4] = [
                    (0.0, 0.0, 1.0),
                    (0.0, 128.0 / 255.0, 0.0),
                    (1.0, 1.0, 0.0),
                    (1.0, 0.0, 0.0),
                ];
                let pos = x * (STOPS.len() - 1) as f64;
                let i = (pos.floor() as usize).min(STOPS.len() - 2);
                let t = pos - i as f64;
                let (a, b) = (STOPS[i], STOPS[i + 1]);
                Rgb::from_unit(
                    a.0 + (b.0 - a.0) * t,
                    a.1 + (b.1 - a.1) * t,
                    a.2 + (b.2 - a.2) * t,
                )
            }
        }
    }
}

/// Observed range of non-null accident counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorScale {
    pub min: u64,
    pub max: u64,
}

impl ColorScale {
    /// `None` when no region has a known accident count
    pub fn from_values(values: impl IntoIterator<Item = u64>) -> Option<Self> {
        values.into_iter().fold(None, |acc, v| match acc {
            None => Some(ColorScale { min: v, max: v }),
            Some(s) => Some(ColorScale {
                min: s.min.min(v),
                max: s.max.max(v),
            }),
        })
    }

    pub fn from_dataset(dataset: &JoinedDataset) -> Option<Self> {
        Self::from_values(dataset.iter().filter_map(|r| r.accidents))
    }

    /// Position of `value` within the range; 0 when the range is a single value
    pub fn ratio(&self, value: u64) -> f64 {
        if self.max == self.min {
            return 0.0;
        }
        let v = value.clamp(self.min, self.max);
        (v - self.min) as f64 / (self.max - self.min) as f64
    }
}
