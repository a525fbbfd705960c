use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Metric an achievement threshold is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    CurrentStreak,
    ChallengesCompleted,
}

/// Catalog entry. Definitions are static data, not rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub metric: Metric,
    pub threshold: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct AchievementUnlock {
    pub user_id: Uuid,
    pub achievement_id: String,
    pub earned_at: DateTime<Utc>,
}

/// Catalog entry joined with the user's unlock state.
#[derive(Debug, Serialize)]
pub struct AchievementStatus {
    #[serde(flatten)]
    pub achievement: Achievement,
    pub earned_at: Option<DateTime<Utc>>,
}
