//! Persistence seam for the check-in core.
//!
//! `PgStore` is the production backend. `MemoryStore` backs tests and
//! local runs without a database.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::achievement::AchievementUnlock;
use crate::models::challenge::ChallengeCompletion;
use crate::models::check_in::{CheckIn, StreakSummary};
use crate::models::mood::Mood;
use crate::models::preferences::UserPreferences;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone)]
pub struct NewCheckIn {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub mood: Mood,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewChallengeCompletion {
    pub user_id: Uuid,
    pub challenge_date: NaiveDate,
    pub response: String,
}

#[async_trait]
pub trait MoodStore: Send + Sync {
    // Check-in ledger

    /// Insert guarded by `(user_id, date)`. Returns `None` when a row for
    /// that day already exists; the existing row is left untouched.
    async fn insert_check_in(&self, new: NewCheckIn) -> StoreResult<Option<CheckIn>>;

    async fn find_check_in(&self, user_id: Uuid, date: NaiveDate) -> StoreResult<Option<CheckIn>>;

    /// Inclusive range, ascending by date.
    async fn list_check_ins(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<CheckIn>>;

    /// Every check-in date of the user, ascending, read in one snapshot.
    /// The ledger is append-only, so the length doubles as a watermark.
    async fn check_in_dates(&self, user_id: Uuid) -> StoreResult<Vec<NaiveDate>>;

    // Preferences

    /// Returns defaults when the user has no row yet.
    async fn load_preferences(&self, user_id: Uuid) -> StoreResult<UserPreferences>;

    /// Overwrite the cached streak computed for calendar day `as_of` from a
    /// ledger scan that saw `watermark` rows. Returns `None` without writing
    /// when the cache already holds a scan with a higher watermark.
    /// The cached longest streak never decreases.
    async fn save_streak(
        &self,
        user_id: Uuid,
        streak: StreakSummary,
        as_of: NaiveDate,
        watermark: i64,
        recomputed_at: DateTime<Utc>,
    ) -> StoreResult<Option<UserPreferences>>;

    // Achievements

    async fn list_unlocks(&self, user_id: Uuid) -> StoreResult<Vec<AchievementUnlock>>;

    /// Insert-if-absent. `true` only for the call that created the row.
    async fn insert_unlock(
        &self,
        user_id: Uuid,
        achievement_id: &str,
        earned_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    // Challenges

    /// Insert-if-absent on `(user_id, challenge_date)`; returns the stored row either way.
    async fn insert_challenge_completion(
        &self,
        new: NewChallengeCompletion,
    ) -> StoreResult<ChallengeCompletion>;

    async fn count_challenge_completions(&self, user_id: Uuid) -> StoreResult<i64>;

    // Health

    async fn ping(&self) -> StoreResult<()>;
}
