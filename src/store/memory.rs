use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{MoodStore, NewChallengeCompletion, NewCheckIn, StoreError, StoreResult};
use crate::models::achievement::AchievementUnlock;
use crate::models::challenge::ChallengeCompletion;
use crate::models::check_in::{CheckIn, StreakSummary};
use crate::models::preferences::UserPreferences;

/// In-process store (for tests and single-instance local runs).
/// The (user, date) keyed maps give the same uniqueness guarantees as the
/// Postgres constraints.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    offline: Arc<AtomicBool>,
}

#[derive(Default)]
struct Inner {
    check_ins: BTreeMap<(Uuid, NaiveDate), CheckIn>,
    preferences: HashMap<Uuid, UserPreferences>,
    unlocks: BTreeMap<(Uuid, String), AchievementUnlock>,
    challenges: BTreeMap<(Uuid, NaiveDate), ChallengeCompletion>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an unreachable backend; every call fails with `Unavailable`.
    #[cfg(test)]
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub async fn set_tier(
        &self,
        user_id: Uuid,
        tier: crate::models::preferences::SubscriptionTier,
    ) {
        let mut inner = self.inner.lock().await;
        inner
            .preferences
            .entry(user_id)
            .or_insert_with(|| UserPreferences::new(user_id))
            .subscription_tier = tier;
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl MoodStore for MemoryStore {
    async fn insert_check_in(&self, new: NewCheckIn) -> StoreResult<Option<CheckIn>> {
        self.check_online()?;
        let mut inner = self.inner.lock().await;
        let key = (new.user_id, new.date);
        if inner.check_ins.contains_key(&key) {
            return Ok(None);
        }

        let row = CheckIn {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            date: new.date,
            mood: new.mood,
            notes: new.notes,
            created_at: Utc::now(),
        };
        inner.check_ins.insert(key, row.clone());
        Ok(Some(row))
    }

    async fn find_check_in(&self, user_id: Uuid, date: NaiveDate) -> StoreResult<Option<CheckIn>> {
        self.check_online()?;
        let inner = self.inner.lock().await;
        Ok(inner.check_ins.get(&(user_id, date)).cloned())
    }

    async fn list_check_ins(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<CheckIn>> {
        self.check_online()?;
        if from > to {
            return Ok(Vec::new());
        }
        let inner = self.inner.lock().await;
        Ok(inner
            .check_ins
            .range((user_id, from)..=(user_id, to))
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn check_in_dates(&self, user_id: Uuid) -> StoreResult<Vec<NaiveDate>> {
        self.check_online()?;
        let inner = self.inner.lock().await;
        Ok(inner
            .check_ins
            .range((user_id, NaiveDate::MIN)..=(user_id, NaiveDate::MAX))
            .map(|((_, date), _)| *date)
            .collect())
    }

    async fn load_preferences(&self, user_id: Uuid) -> StoreResult<UserPreferences> {
        self.check_online()?;
        let inner = self.inner.lock().await;
        Ok(inner
            .preferences
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| UserPreferences::new(user_id)))
    }

    async fn save_streak(
        &self,
        user_id: Uuid,
        streak: StreakSummary,
        as_of: NaiveDate,
        watermark: i64,
        recomputed_at: DateTime<Utc>,
    ) -> StoreResult<Option<UserPreferences>> {
        self.check_online()?;
        let mut inner = self.inner.lock().await;
        let prefs = inner
            .preferences
            .entry(user_id)
            .or_insert_with(|| UserPreferences::new(user_id));
        if prefs.streak_watermark > watermark {
            return Ok(None);
        }
        prefs.current_streak = streak.current_streak as i32;
        prefs.longest_streak = prefs.longest_streak.max(streak.longest_streak as i32);
        prefs.streak_as_of = Some(as_of);
        prefs.streak_watermark = watermark;
        prefs.streak_recomputed_at = Some(recomputed_at);
        prefs.updated_at = Utc::now();
        Ok(Some(prefs.clone()))
    }

    async fn list_unlocks(&self, user_id: Uuid) -> StoreResult<Vec<AchievementUnlock>> {
        self.check_online()?;
        let inner = self.inner.lock().await;
        let mut rows: Vec<AchievementUnlock> = inner
            .unlocks
            .values()
            .filter(|u| u.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|u| u.earned_at);
        Ok(rows)
    }

    async fn insert_unlock(
        &self,
        user_id: Uuid,
        achievement_id: &str,
        earned_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        self.check_online()?;
        let mut inner = self.inner.lock().await;
        let key = (user_id, achievement_id.to_string());
        if inner.unlocks.contains_key(&key) {
            return Ok(false);
        }
        inner.unlocks.insert(
            key,
            AchievementUnlock {
                user_id,
                achievement_id: achievement_id.to_string(),
                earned_at,
            },
        );
        Ok(true)
    }

    async fn insert_challenge_completion(
        &self,
        new: NewChallengeCompletion,
    ) -> StoreResult<ChallengeCompletion> {
        self.check_online()?;
        let mut inner = self.inner.lock().await;
        let row = inner
            .challenges
            .entry((new.user_id, new.challenge_date))
            .or_insert_with(|| ChallengeCompletion {
                id: Uuid::new_v4(),
                user_id: new.user_id,
                challenge_date: new.challenge_date,
                response: new.response,
                completed_at: Utc::now(),
            });
        Ok(row.clone())
    }

    async fn count_challenge_completions(&self, user_id: Uuid) -> StoreResult<i64> {
        self.check_online()?;
        let inner = self.inner.lock().await;
        Ok(inner.challenges.keys().filter(|(uid, _)| *uid == user_id).count() as i64)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check_online()
    }
}
