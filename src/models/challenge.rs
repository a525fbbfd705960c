use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::achievement::Achievement;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ChallengeCompletion {
    pub id: Uuid,
    pub user_id: Uuid,
    pub challenge_date: NaiveDate,
    pub response: String,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CompleteChallengeRequest {
    #[validate(length(min = 1, max = 5000, message = "Response must be 1-5000 characters"))]
    pub response: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct ChallengeOutcome {
    pub completion: ChallengeCompletion,
    pub total_completed: u32,
    pub new_achievements: Vec<Achievement>,
}
