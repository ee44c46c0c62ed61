use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// The fixed set of mood categories a sample or journal entry can carry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "mood_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum MoodType {
    Happy,
    Calm,
    Tired,
    Anxious,
    Focused,
    Sad,
    Excited,
    Stressed,
    Peaceful,
    Energetic,
}

/// One logged mood observation. Never updated once written.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MoodSample {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub mood_type: MoodType,
    pub intensity: i32,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Direct COUNT/AVG over a user's window, independent of any grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq, FromRow)]
pub struct WindowTotals {
    pub count: i64,
    pub average_intensity: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LogMoodRequest {
    #[serde(rename = "type")]
    pub mood_type: MoodType,

    #[validate(range(min = 1, max = 10, message = "Intensity must be between 1 and 10"))]
    pub intensity: i32,

    #[validate(length(max = 500, message = "Note must be at most 500 characters"))]
    pub note: Option<String>,
}

impl LogMoodRequest {
    /// Trimmed note, with blank notes stored as NULL.
    pub fn normalized_note(&self) -> Option<String> {
        self.note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from)
    }
}

#[derive(Debug, Deserialize)]
pub struct MoodListQuery {
    pub limit: Option<i64>,
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub days: Option<i64>,
}

/// One row of the per-type breakdown.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MoodDistribution {
    pub mood: MoodType,
    pub count: i64,
    pub average_intensity: f64,
}

/// One UTC calendar day of samples.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyTrend {
    pub date: String,
    pub moods: Vec<MoodType>,
    pub count: i64,
    pub average_intensity: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MoodSummary {
    pub total_moods: i64,
    pub average_intensity: f64,
    pub most_frequent_mood: MoodType,
    pub period: String,
    pub distribution: Vec<MoodDistribution>,
    pub daily_trends: Vec<DailyTrend>,
}
