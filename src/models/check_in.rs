use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::achievement::Achievement;
use super::mood::Mood;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct CheckIn {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(rename = "check_in_date")]
    pub date: NaiveDate,
    pub mood: Mood,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Mood arrives as a raw label so unknown values surface as `InvalidInput`
/// instead of a generic body rejection.
#[derive(Debug, Deserialize, Validate)]
pub struct RecordCheckInRequest {
    pub mood: String,
    #[validate(length(max = 5000, message = "Notes must be under 5000 characters"))]
    pub notes: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct CheckInQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct CheckedInResponse {
    pub date: NaiveDate,
    pub checked_in: bool,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct StreakSummary {
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Everything the presentation layer needs after a successful check-in.
#[derive(Debug, Serialize)]
pub struct CheckInOutcome {
    pub check_in: CheckIn,
    pub streak: StreakSummary,
    pub new_achievements: Vec<Achievement>,
}

#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub mood: Option<Mood>,
}

#[derive(Debug, Serialize)]
pub struct MoodCount {
    pub mood: Mood,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct MoodTrend {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days_checked_in: i64,
    pub dominant_mood: Option<Mood>,
    pub distribution: Vec<MoodCount>,
    pub series: Vec<TrendPoint>,
}
