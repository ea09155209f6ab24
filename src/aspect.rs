use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Output frame presets. The layout is never re-run; only the outer SVG size changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AspectRatio {
    #[default]
    Auto,
    Widescreen,
    Standard,
    A4Portrait,
    A4Landscape,
    Square,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown aspect ratio '{0}' (expected auto, 16:9, 4:3, a4-portrait, a4-landscape or square)")]
pub struct UnknownAspectRatio(pub String);

impl AspectRatio {
    pub const ALL: [AspectRatio; 6] = [
        Self::Auto,
        Self::Widescreen,
        Self::Standard,
        Self::A4Portrait,
        Self::A4Landscape,
        Self::Square,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Widescreen => "16:9",
            Self::Standard => "4:3",
            Self::A4Portrait => "a4-portrait",
            Self::A4Landscape => "a4-landscape",
            Self::Square => "square",
        }
    }

    /// Width over height, or `None` for the natural size.
    pub fn ratio(self) -> Option<f64> {
        match self {
            Self::Auto => None,
            Self::Widescreen => Some(16.0 / 9.0),
            Self::Standard => Some(4.0 / 3.0),
            Self::A4Portrait => Some(1.0 / 1.414),
            Self::A4Landscape => Some(1.414),
            Self::Square => Some(1.0),
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AspectRatio {
    type Err = UnknownAspectRatio;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|ratio| ratio.name() == wanted)
            .ok_or_else(|| UnknownAspectRatio(s.to_string()))
    }
}

impl TryFrom<String> for AspectRatio {
    type Error = UnknownAspectRatio;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AspectRatio> for String {
    fn from(value: AspectRatio) -> Self {
        value.name().to_string()
    }
}

/// Fits `(width, height)` to `ratio` by shrinking whichever side is too long.
pub fn adjust(width: u32, height: u32, ratio: Option<AspectRatio>) -> (u32, u32) {
    let Some(target) = ratio.and_then(AspectRatio::ratio) else {
        return (width, height);
    };
    if height == 0 {
        return (width, height);
    }
    let (w, h) = (f64::from(width), f64::from(height));
    if w / h > target {
        ((h * target).round() as u32, height)
    } else {
        (width, (w / target).round() as u32)
    }
}
