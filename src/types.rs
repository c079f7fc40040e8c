//! Core data types shared by the monitor and the receiver

use serde::de::{value, IntoDeserializer};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A 2-D point in normalized image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate (normalized 0.0-1.0)
    pub x: f64,
    /// Y coordinate (normalized 0.0-1.0)
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(&self, other: &Position) -> Position {
        Position {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }
}

/// A single landmark as reported by the perception model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    /// Detection confidence (0.0-1.0). Sources that don't report one are trusted.
    #[serde(default)]
    pub visibility: Option<f64>,
}

impl Landmark {
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn visibility(&self) -> f64 {
        self.visibility.unwrap_or(1.0)
    }
}

/// Landmarks the classifier consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkId {
    Nose,
    RightWrist,
    LeftHip,
    RightHip,
    LeftAnkle,
    RightAnkle,
}

/// Everything the perception model saw in one video frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Ids the classifier doesn't consume are dropped while parsing.
    #[serde(default, deserialize_with = "known_landmarks")]
    pub landmarks: HashMap<LandmarkId, Landmark>,
}

fn known_landmarks<'de, D>(deserializer: D) -> Result<HashMap<LandmarkId, Landmark>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = HashMap::<String, Landmark>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(name, landmark)| {
            let id: Result<LandmarkId, value::Error> = LandmarkId::deserialize(name.as_str().into_deserializer());
            id.ok().map(|id| (id, landmark))
        })
        .collect())
}

impl LandmarkFrame {
    pub fn get(&self, id: LandmarkId) -> Option<&Landmark> {
        self.landmarks.get(&id)
    }

    pub fn with(mut self, id: LandmarkId, landmark: Landmark) -> Self {
        self.landmarks.insert(id, landmark);
        self
    }
}

/// A tracked body cue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Hand,
    Hip,
    Leg,
    Head,
}

impl Signal {
    /// Evaluation order of a classification pass.
    pub const ALL: [Signal; 4] = [Signal::Hand, Signal::Hip, Signal::Leg, Signal::Head];

    pub(crate) fn index(self) -> usize {
        match self {
            Signal::Hand => 0,
            Signal::Hip => 1,
            Signal::Leg => 2,
            Signal::Head => 3,
        }
    }
}

/// Behavioral alert sent to the feedback device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertCode {
    StopSwaying,
    SwingingLegs,
    MoveHead,
    FidgetingHands,
}

impl AlertCode {
    pub const ALL: [AlertCode; 4] = [
        AlertCode::StopSwaying,
        AlertCode::SwingingLegs,
        AlertCode::MoveHead,
        AlertCode::FidgetingHands,
    ];

    /// Textual form used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCode::StopSwaying => "STOP_SWAYING",
            AlertCode::SwingingLegs => "SWINGING_LEGS",
            AlertCode::MoveHead => "MOVE_HEAD",
            AlertCode::FidgetingHands => "FIDGETING_HANDS",
        }
    }

    /// Human-readable message shown on the display
    pub fn message(&self) -> &'static str {
        match self {
            AlertCode::StopSwaying => "Stop swaying",
            AlertCode::SwingingLegs => "Stop swinging legs",
            AlertCode::MoveHead => "Move your head",
            AlertCode::FidgetingHands => "Stop fidgeting hands",
        }
    }
}

impl fmt::Display for AlertCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown alert code: {0:?}")]
pub struct UnknownAlertCode(pub String);

impl FromStr for AlertCode {
    type Err = UnknownAlertCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlertCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| UnknownAlertCode(s.to_string()))
    }
}
