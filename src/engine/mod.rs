//! Daily check-in core: ledger, streak derivation and achievement unlocks.
//!
//! Flow for one check-in: ledger insert, streak recompute against the
//! just-written ledger, achievement evaluation, unlock persistence. Only
//! unlocks whose row this call created are returned, so a retry or a racing
//! tab never announces the same badge twice.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::achievement::{Achievement, AchievementStatus};
use crate::models::challenge::ChallengeOutcome;
use crate::models::check_in::{CheckInOutcome, StreakSummary};
use crate::models::mood::Mood;
use crate::store::{MoodStore, NewChallengeCompletion};

pub mod achievements;
pub mod ledger;
pub mod streak;

pub use achievements::AchievementEvaluator;
pub use ledger::CheckInLedger;
pub use streak::StreakCalculator;

#[derive(Clone)]
pub struct MoodEngine {
    store: Arc<dyn MoodStore>,
    pub ledger: CheckInLedger,
    pub streaks: StreakCalculator,
    pub evaluator: AchievementEvaluator,
}

impl MoodEngine {
    pub fn new(store: Arc<dyn MoodStore>) -> Self {
        Self {
            ledger: CheckInLedger::new(store.clone()),
            streaks: StreakCalculator::new(store.clone()),
            evaluator: AchievementEvaluator::default(),
            store,
        }
    }

    pub async fn check_in(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        mood: Mood,
        notes: Option<String>,
        today: NaiveDate,
    ) -> AppResult<CheckInOutcome> {
        let check_in = self.ledger.record_check_in(user_id, date, mood, notes).await?;
        let state = self.streaks.recompute(user_id, today).await?;
        let challenges = self.store.count_challenge_completions(user_id).await?;
        let new_achievements = self
            .award(user_id, i64::from(state.current_streak), challenges)
            .await?;

        Ok(CheckInOutcome {
            check_in,
            streak: StreakSummary {
                current_streak: state.current_streak,
                longest_streak: state.longest_streak,
            },
            new_achievements,
        })
    }

    /// Same-day repeats return the stored completion and unlock nothing new.
    pub async fn complete_challenge(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        response: String,
        today: NaiveDate,
    ) -> AppResult<ChallengeOutcome> {
        let completion = self
            .store
            .insert_challenge_completion(NewChallengeCompletion {
                user_id,
                challenge_date: date,
                response,
            })
            .await?;
        let total = self.store.count_challenge_completions(user_id).await?;
        let state = self.streaks.current(user_id, today).await?;
        let new_achievements = self
            .award(user_id, i64::from(state.current_streak), total)
            .await?;

        Ok(ChallengeOutcome {
            completion,
            total_completed: total.max(0) as u32,
            new_achievements,
        })
    }

    pub async fn achievements(&self, user_id: Uuid) -> AppResult<Vec<AchievementStatus>> {
        let unlocks = self.store.list_unlocks(user_id).await?;
        Ok(self.evaluator.statuses(&unlocks))
    }

    async fn award(
        &self,
        user_id: Uuid,
        current_streak: i64,
        challenges_completed: i64,
    ) -> AppResult<Vec<Achievement>> {
        let already: HashSet<String> = self
            .store
            .list_unlocks(user_id)
            .await?
            .into_iter()
            .map(|u| u.achievement_id)
            .collect();

        let candidates =
            self.evaluator
                .evaluate(user_id, current_streak, challenges_completed, &already)?;

        let earned_at = Utc::now();
        let mut announced = Vec::with_capacity(candidates.len());
        for achievement in candidates {
            if self.store.insert_unlock(user_id, achievement.id, earned_at).await? {
                tracing::info!(
                    user_id = %user_id,
                    achievement = achievement.id,
                    "Achievement unlocked"
                );
                announced.push(achievement);
            }
        }
        Ok(announced)
    }
}
