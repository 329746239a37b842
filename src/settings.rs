//! Match settings: table size and the respot toggle.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Number of reds racked at the start of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RedBallCount {
    Six,
    Ten,
    #[default]
    Fifteen,
}

impl RedBallCount {
    pub const ALL: [RedBallCount; 3] = [RedBallCount::Six, RedBallCount::Ten, RedBallCount::Fifteen];

    pub fn count(self) -> u8 {
        match self {
            RedBallCount::Six => 6,
            RedBallCount::Ten => 10,
            RedBallCount::Fifteen => 15,
        }
    }

    pub fn from_count(count: u64) -> Option<Self> {
        match count {
            6 => Some(RedBallCount::Six),
            10 => Some(RedBallCount::Ten),
            15 => Some(RedBallCount::Fifteen),
            _ => None,
        }
    }

    /// Lenient conversion from a persisted value: numbers and numeric
    /// strings are accepted, anything else yields `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_u64().and_then(Self::from_count),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for RedBallCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.count())
    }
}

/// Error for an unsupported red count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRedCount(pub String);

impl fmt::Display for InvalidRedCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unsupported number of reds: '{}' (expected 6, 10 or 15)", self.0)
    }
}

impl std::error::Error for InvalidRedCount {}

impl FromStr for RedBallCount {
    type Err = InvalidRedCount;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .ok()
            .and_then(Self::from_count)
            .ok_or_else(|| InvalidRedCount(s.to_string()))
    }
}

impl Serialize for RedBallCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.count())
    }
}

impl<'de> Deserialize<'de> for RedBallCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Self::from_json(&value)
            .ok_or_else(|| serde::de::Error::custom(InvalidRedCount(value.to_string())))
    }
}

/// Settings persisted alongside the scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settings {
    pub reds: RedBallCount,
    /// Colored balls go back on the spot after potting. Stored only.
    pub respot: bool,
}

impl Settings {
    /// Read settings field by field, keeping defaults for anything absent or
    /// mistyped.
    pub fn from_json_lenient(value: Option<&serde_json::Value>) -> Self {
        let mut settings = Settings::default();
        let Some(value) = value else {
            return settings;
        };
        if let Some(reds) = value.get("reds").and_then(RedBallCount::from_json) {
            settings.reds = reds;
        }
        if let Some(respot) = value.get("respot").and_then(|v| v.as_bool()) {
            settings.respot = respot;
        }
        settings
    }
}
