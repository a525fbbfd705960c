//! Streak derivation over the check-in ledger.
//!
//! The ledger is authoritative. The cached values in `user_preferences` are
//! rewritten from a full scan on every recompute and never incremented.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::check_in::StreakSummary;
use crate::models::preferences::StreakState;
use crate::store::MoodStore;

/// Consecutive checked-in days ending at `today`, or at `today - 1` when
/// today has no check-in yet (grace day). Two trailing empty days reset to 0.
///
/// `dates` must be ascending and free of duplicates. Dates after `today` are ignored.
pub fn current_streak(dates: &[NaiveDate], today: NaiveDate) -> u32 {
    let yesterday = today - Duration::days(1);
    let anchor = if dates.binary_search(&today).is_ok() {
        today
    } else if dates.binary_search(&yesterday).is_ok() {
        yesterday
    } else {
        return 0;
    };

    let mut streak = 0u32;
    let mut check_date = anchor;
    for date in dates.iter().rev() {
        if *date > check_date {
            continue;
        }
        if *date != check_date {
            break;
        }
        streak += 1;
        check_date -= Duration::days(1);
    }
    streak
}

/// Longest run of consecutive days anywhere in `dates` (ascending).
pub fn longest_streak(dates: &[NaiveDate]) -> u32 {
    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;

    for date in dates {
        run = match prev {
            Some(p) if *date == p + Duration::days(1) => run + 1,
            Some(p) if *date == p => run,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(*date);
    }
    longest
}

#[derive(Clone)]
pub struct StreakCalculator {
    store: Arc<dyn MoodStore>,
}

impl StreakCalculator {
    pub fn new(store: Arc<dyn MoodStore>) -> Self {
        Self { store }
    }

    /// Pure read: scans the ledger, touches no cache.
    pub async fn compute(&self, user_id: Uuid, today: NaiveDate) -> AppResult<StreakSummary> {
        Ok(self.scan(user_id, today).await?.0)
    }

    /// Streak as of `today` plus the number of ledger rows the scan saw.
    async fn scan(&self, user_id: Uuid, today: NaiveDate) -> AppResult<(StreakSummary, i64)> {
        let mut dates = self.store.check_in_dates(user_id).await?;
        let watermark = dates.len() as i64;
        dates.retain(|d| *d <= today);
        let summary = StreakSummary {
            current_streak: current_streak(&dates, today),
            longest_streak: longest_streak(&dates),
        };
        Ok((summary, watermark))
    }

    /// Scan the ledger and overwrite the cached streak. A scan that lost a race
    /// against a scan of a newer ledger leaves the cache alone.
    pub async fn recompute(&self, user_id: Uuid, today: NaiveDate) -> AppResult<StreakState> {
        let (summary, watermark) = self.scan(user_id, today).await?;
        let recomputed_at = Utc::now();
        let saved = self
            .store
            .save_streak(user_id, summary, today, watermark, recomputed_at)
            .await?;

        let Some(prefs) = saved else {
            tracing::debug!(
                user_id = %user_id,
                %today,
                watermark,
                "Stale streak scan discarded"
            );
            return Ok(StreakState {
                user_id,
                current_streak: summary.current_streak,
                longest_streak: summary.longest_streak,
                last_recomputed_at: recomputed_at,
            });
        };

        tracing::debug!(
            user_id = %user_id,
            %today,
            current_streak = summary.current_streak,
            "Streak recomputed"
        );

        Ok(StreakState {
            user_id,
            current_streak: summary.current_streak,
            longest_streak: summary.longest_streak.max(prefs.longest_streak.max(0) as u32),
            last_recomputed_at: prefs.streak_recomputed_at.unwrap_or(prefs.updated_at),
        })
    }

    /// Serve the cache when it was computed for the same `today`, otherwise recompute.
    /// Every check-in write recomputes, so a cache computed for `today` is current.
    pub async fn current(&self, user_id: Uuid, today: NaiveDate) -> AppResult<StreakState> {
        let prefs = self.store.load_preferences(user_id).await?;
        match (prefs.streak_as_of, prefs.streak_recomputed_at) {
            (Some(as_of), Some(at)) if as_of == today => Ok(StreakState {
                user_id,
                current_streak: prefs.current_streak.max(0) as u32,
                longest_streak: prefs.longest_streak.max(0) as u32,
                last_recomputed_at: at,
            }),
            _ => self.recompute(user_id, today).await,
        }
    }
}
