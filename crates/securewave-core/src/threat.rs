//! Threat marker types for the offline threat visualization

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Unique identifier for a synthesized threat marker
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreatId(pub String);

impl ThreatId {
    /// Build an id from a creation timestamp and a random suffix
    pub fn new(timestamp_ms: i64, suffix: u64) -> Self {
        Self(format!("threat-{}-{:016x}", timestamp_ms, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThreatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the (simulated) sensor picked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatCategory {
    Motion,
    Presence,
}

impl ThreatCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Motion => "motion",
            Self::Presence => "presence",
        }
    }
}

/// Severity of a threat, ordered by visual intensity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown threat level: {0}")]
pub struct ThreatLevelParseError(pub String);

impl ThreatLevel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Marker color as 0xRRGGBB
    pub fn color_hex(&self) -> u32 {
        match self {
            Self::Low => 0x00ff00,
            Self::Medium => 0xffff00,
            Self::High => 0xff0000,
        }
    }
}

impl FromStr for ThreatLevel {
    type Err = ThreatLevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ThreatLevelParseError(s.to_string())),
        }
    }
}

/// Color used for levels that could not be identified
pub const UNKNOWN_LEVEL_COLOR: u32 = 0xffffff;

/// Opacity shared by every marker material
pub const MARKER_OPACITY: f32 = 0.7;

/// Resolve a marker color from a level label, falling back to white
pub fn color_for_label(label: &str) -> u32 {
    match label.parse::<ThreatLevel>() {
        Ok(level) => level.color_hex(),
        Err(err) => {
            tracing::debug!(%err, "Unrecognized threat level, using fallback color");
            UNKNOWN_LEVEL_COLOR
        }
    }
}

/// Split 0xRRGGBB into sRGB components (0.0-1.0)
pub fn hex_to_rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

/// A synthesized threat marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threat {
    pub id: ThreatId,
    /// World position (x, y, z), Y up
    pub position: [f32; 3],
    #[serde(rename = "type")]
    pub category: ThreatCategory,
    pub level: ThreatLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threat_id_format() {
        let id = ThreatId::new(1_700_000_000_000, 0xabc);
        assert_eq!(id.as_str(), "threat-1700000000000-0000000000000abc");
        assert_eq!(id.to_string(), id.as_str());
    }

    #[test]
    fn test_threat_id_distinct_suffix() {
        assert_ne!(ThreatId::new(42, 1), ThreatId::new(42, 2));
    }

    #[test]
    fn test_level_colors() {
        assert_eq!(ThreatLevel::Low.color_hex(), 0x00ff00);
        assert_eq!(ThreatLevel::Medium.color_hex(), 0xffff00);
        assert_eq!(ThreatLevel::High.color_hex(), 0xff0000);
    }

    #[test]
    fn test_level_ordering() {
        assert!(ThreatLevel::Low < ThreatLevel::Medium);
        assert!(ThreatLevel::Medium < ThreatLevel::High);
    }

    #[test]
    fn test_color_for_unknown_label() {
        assert_eq!(color_for_label("HIGH"), 0xff0000);
        assert_eq!(color_for_label("critical"), UNKNOWN_LEVEL_COLOR);
        assert!("critical".parse::<ThreatLevel>().is_err());
    }

    #[test]
    fn test_hex_to_rgb() {
        assert_eq!(hex_to_rgb(0xff0000), [1.0, 0.0, 0.0]);
        assert_eq!(hex_to_rgb(0x00ff00), [0.0, 1.0, 0.0]);
        let [r, g, b] = hex_to_rgb(0x1a1a2e);
        assert!((r - 26.0 / 255.0).abs() < 1e-6);
        assert!((g - 26.0 / 255.0).abs() < 1e-6);
        assert!((b - 46.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_threat_serializes_lowercase() {
        let threat = Threat {
            id: ThreatId::new(1, 2),
            position: [0.0, 1.0, 0.0],
            category: ThreatCategory::Presence,
            level: ThreatLevel::Medium,
        };
        let json = serde_json::to_value(&threat).unwrap();
        assert_eq!(json["type"], "presence");
        assert_eq!(json["level"], "medium");
    }
}
