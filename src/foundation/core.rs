use crate::foundation::error::{TenebraError, TenebraResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Milliseconds. Used both for clock readings and for offsets relative to session start.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct TimeMs(pub u64);

impl TimeMs {
    /// Zero milliseconds.
    pub const ZERO: Self = Self(0);

    /// Build from whole seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * 1000)
    }

    /// `self - earlier`, clamped at zero.
    pub fn saturating_sub(self, earlier: TimeMs) -> TimeMs {
        TimeMs(self.0.saturating_sub(earlier.0))
    }

    /// `self + delta`, saturating.
    pub fn saturating_add(self, delta: TimeMs) -> TimeMs {
        TimeMs(self.0.saturating_add(delta.0))
    }

    /// Value in milliseconds as `f64`.
    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }

    /// Value in seconds.
    pub fn as_secs_f64(self) -> f64 {
        (self.0 as f64) / 1000.0
    }
}

impl std::fmt::Display for TimeMs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Half-open time range `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimeRange {
    /// Inclusive start.
    pub start: TimeMs,
    /// Exclusive end.
    pub end: TimeMs,
}

impl TimeRange {
    /// Create a validated range.
    pub fn new(start: TimeMs, end: TimeMs) -> TenebraResult<Self> {
        if start > end {
            return Err(TenebraError::validation("TimeRange start must be <= end"));
        }
        Ok(Self { start, end })
    }

    /// Shorthand for `new(TimeMs(start), TimeMs(end))`.
    pub fn ms(start: u64, end: u64) -> TenebraResult<Self> {
        Self::new(TimeMs(start), TimeMs(end))
    }

    /// Range length.
    pub fn len(self) -> TimeMs {
        self.end.saturating_sub(self.start)
    }

    /// True if `start == end`.
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Half-open membership test.
    pub fn contains(self, t: TimeMs) -> bool {
        self.start <= t && t < self.end
    }

    /// True if the two ranges share at least one instant.
    pub fn overlaps(self, other: TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Offset of `t` from the range start (clamped at zero).
    pub fn local(self, t: TimeMs) -> TimeMs {
        t.saturating_sub(self.start)
    }
}

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Color with alpha given as `0.0..=1.0`.
    pub fn rgba(r: u8, g: u8, b: u8, alpha: f64) -> Self {
        Self {
            r,
            g,
            b,
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
        }
    }

    /// Fully transparent black.
    pub const fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Same color with the alpha multiplied by `factor`.
    pub fn with_alpha_scaled(self, factor: f64) -> Self {
        Self {
            a: ((f64::from(self.a) * factor.clamp(0.0, 1.0)).round()) as u8,
            ..self
        }
    }

    /// Linear interpolation in straight-alpha space.
    pub fn lerp(self, other: Rgba8, t: f64) -> Rgba8 {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| -> u8 {
            let af = f64::from(a);
            let bf = f64::from(b);
            (af + (bf - af) * t).round().clamp(0.0, 255.0) as u8
        };
        Rgba8 {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    /// Convert to premultiplied RGBA8 bytes.
    pub fn to_premul(self) -> [u8; 4] {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        [
            premul(self.r, self.a),
            premul(self.g, self.a),
            premul(self.b, self.a),
            self.a,
        ]
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(s: &str) -> TenebraResult<Self> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| TenebraError::validation(format!("color '{s}' must start with '#'")))?;
        let byte = |i: usize| -> TenebraResult<u8> {
            hex.get(i..i + 2)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| TenebraError::validation(format!("invalid hex color '{s}'")))
        };
        match hex.len() {
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: byte(6)?,
            }),
            _ => Err(TenebraError::validation(format!(
                "hex color '{s}' must have 6 or 8 digits"
            ))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
