use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Coarse content-shape tag derived from exact pixel dimensions.
///
/// Only exact 16:9 (after flooring) counts; a 1921x1080 video is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectRatio {
    Landscape,
    Portrait,
    Other,
}

impl AspectRatio {
    pub fn classify(width: u32, height: u32) -> Self {
        let (width, height) = (u64::from(width), u64::from(height));

        if width == 16 * height / 9 {
            AspectRatio::Landscape
        } else if height == 16 * width / 9 {
            AspectRatio::Portrait
        } else {
            AspectRatio::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "landscape",
            AspectRatio::Portrait => "portrait",
            AspectRatio::Other => "other",
        }
    }
}

impl Display for AspectRatio {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "landscape" => Ok(AspectRatio::Landscape),
            "portrait" => Ok(AspectRatio::Portrait),
            "other" => Ok(AspectRatio::Other),
            _ => Err(anyhow::anyhow!("Invalid aspect ratio: {}", s)),
        }
    }
}
