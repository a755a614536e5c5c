// src/upstream/models/event.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use utoipa::ToSchema;

/// Campaign event category.
///
/// The backend spells these a few different ways (`BloodDrive`,
/// `blood_drive`, `Blood Donation Drive`, ...), so matching is by substring.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(from = "String")]
pub enum EventCategory {
    BloodDrive,
    Training,
    Advocacy,
    Other(String),
}

impl EventCategory {
    pub fn parse(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        if lowered.contains("blood") {
            Self::BloodDrive
        } else if lowered.contains("training") {
            Self::Training
        } else if lowered.contains("advocacy") {
            Self::Advocacy
        } else {
            Self::Other(raw.trim().to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::BloodDrive => "BloodDrive",
            Self::Training => "Training",
            Self::Advocacy => "Advocacy",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for EventCategory {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl Serialize for EventCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Normalized view of the event embedded in (or referenced by) a request.
///
/// Timestamps arrive as ISO strings, epoch numbers, or `{"$date": ...}`
/// wrappers; `upstream::normalize` folds all of those into UTC datetimes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub title: Option<String>,
    pub location: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub category: Option<EventCategory>,
    /// Event-level status string, if the backend nests one.
    pub status: Option<String>,
    /// Blood drives: donation target for the drive.
    pub target_donations: Option<i64>,
    /// Trainings: participant cap.
    pub max_participants: Option<i64>,
    /// Advocacy sessions: expected audience size.
    pub expected_audience: Option<i64>,
}
