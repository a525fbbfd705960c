use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{MoodStore, NewChallengeCompletion, NewCheckIn, StoreResult};
use crate::models::achievement::AchievementUnlock;
use crate::models::challenge::ChallengeCompletion;
use crate::models::check_in::{CheckIn, StreakSummary};
use crate::models::preferences::UserPreferences;

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MoodStore for PgStore {
    async fn insert_check_in(&self, new: NewCheckIn) -> StoreResult<Option<CheckIn>> {
        // Unique (user_id, check_in_date) turns a concurrent second insert into zero rows.
        let row = sqlx::query_as::<_, CheckIn>(
            r#"
            INSERT INTO check_ins (id, user_id, check_in_date, mood, notes)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, check_in_date) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.date)
        .bind(new.mood)
        .bind(&new.notes)
        .fetch_optional(&self.db)
        .await?;

        Ok(row)
    }

    async fn find_check_in(&self, user_id: Uuid, date: NaiveDate) -> StoreResult<Option<CheckIn>> {
        let row = sqlx::query_as::<_, CheckIn>(
            "SELECT * FROM check_ins WHERE user_id = $1 AND check_in_date = $2",
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.db)
        .await?;

        Ok(row)
    }

    async fn list_check_ins(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<CheckIn>> {
        let rows = sqlx::query_as::<_, CheckIn>(
            r#"
            SELECT * FROM check_ins
            WHERE user_id = $1 AND check_in_date BETWEEN $2 AND $3
            ORDER BY check_in_date ASC
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    async fn check_in_dates(&self, user_id: Uuid) -> StoreResult<Vec<NaiveDate>> {
        let dates = sqlx::query_scalar::<_, NaiveDate>(
            r#"
            SELECT check_in_date FROM check_ins
            WHERE user_id = $1
            ORDER BY check_in_date ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(dates)
    }

    async fn load_preferences(&self, user_id: Uuid) -> StoreResult<UserPreferences> {
        let prefs = sqlx::query_as::<_, UserPreferences>(
            "SELECT * FROM user_preferences WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(prefs.unwrap_or_else(|| UserPreferences::new(user_id)))
    }

    async fn save_streak(
        &self,
        user_id: Uuid,
        streak: StreakSummary,
        as_of: NaiveDate,
        watermark: i64,
        recomputed_at: DateTime<Utc>,
    ) -> StoreResult<Option<UserPreferences>> {
        // The conflict row is locked while the WHERE is evaluated, so a slower
        // scan of an older ledger can never land after a newer one.
        let prefs = sqlx::query_as::<_, UserPreferences>(
            r#"
            INSERT INTO user_preferences
                (user_id, current_streak, longest_streak, streak_as_of,
                 streak_watermark, streak_recomputed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE SET
                current_streak = EXCLUDED.current_streak,
                longest_streak = GREATEST(user_preferences.longest_streak, EXCLUDED.longest_streak),
                streak_as_of = EXCLUDED.streak_as_of,
                streak_watermark = EXCLUDED.streak_watermark,
                streak_recomputed_at = EXCLUDED.streak_recomputed_at,
                updated_at = NOW()
            WHERE user_preferences.streak_watermark <= EXCLUDED.streak_watermark
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(streak.current_streak as i32)
        .bind(streak.longest_streak as i32)
        .bind(as_of)
        .bind(watermark)
        .bind(recomputed_at)
        .fetch_optional(&self.db)
        .await?;

        Ok(prefs)
    }

    async fn list_unlocks(&self, user_id: Uuid) -> StoreResult<Vec<AchievementUnlock>> {
        let rows = sqlx::query_as::<_, AchievementUnlock>(
            "SELECT * FROM achievement_unlocks WHERE user_id = $1 ORDER BY earned_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    async fn insert_unlock(
        &self,
        user_id: Uuid,
        achievement_id: &str,
        earned_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO achievement_unlocks (user_id, achievement_id, earned_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, achievement_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(achievement_id)
        .bind(earned_at)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn insert_challenge_completion(
        &self,
        new: NewChallengeCompletion,
    ) -> StoreResult<ChallengeCompletion> {
        let row = sqlx::query_as::<_, ChallengeCompletion>(
            r#"
            INSERT INTO challenge_completions (id, user_id, challenge_date, response)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, challenge_date) DO UPDATE
                SET response = challenge_completions.response  -- no-op update to trigger RETURNING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.challenge_date)
        .bind(&new.response)
        .fetch_one(&self.db)
        .await?;

        Ok(row)
    }

    async fn count_challenge_completions(&self, user_id: Uuid) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM challenge_completions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.db)
            .await?;
        Ok(())
    }
}
