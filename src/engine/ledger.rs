use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::check_in::{CheckIn, MoodCount, MoodTrend, TrendPoint};
use crate::models::mood::Mood;
use crate::store::{MoodStore, NewCheckIn};

/// Append-only record of one mood per user per calendar day.
#[derive(Clone)]
pub struct CheckInLedger {
    store: Arc<dyn MoodStore>,
}

impl CheckInLedger {
    pub fn new(store: Arc<dyn MoodStore>) -> Self {
        Self { store }
    }

    /// Fails with `DuplicateCheckIn` if the day already has a row; the existing
    /// row is never overwritten.
    pub async fn record_check_in(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        mood: Mood,
        notes: Option<String>,
    ) -> AppResult<CheckIn> {
        let inserted = self
            .store
            .insert_check_in(NewCheckIn {
                user_id,
                date,
                mood,
                notes,
            })
            .await?;

        match inserted {
            Some(check_in) => {
                tracing::info!(user_id = %user_id, %date, mood = %mood, "Check-in recorded");
                Ok(check_in)
            }
            None => {
                tracing::debug!(user_id = %user_id, %date, "Duplicate check-in rejected");
                Err(AppError::DuplicateCheckIn { date })
            }
        }
    }

    pub async fn has_checked_in_on(&self, user_id: Uuid, date: NaiveDate) -> AppResult<bool> {
        Ok(self.store.find_check_in(user_id, date).await?.is_some())
    }

    /// Inclusive range, ascending by date.
    pub async fn list_check_ins(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<CheckIn>> {
        if from > to {
            return Err(AppError::InvalidInput(format!(
                "start_date {from} is after end_date {to}"
            )));
        }
        Ok(self.store.list_check_ins(user_id, from, to).await?)
    }

    pub async fn trend(&self, user_id: Uuid, from: NaiveDate, to: NaiveDate) -> AppResult<MoodTrend> {
        let check_ins = self.list_check_ins(user_id, from, to).await?;
        Ok(mood_trend(&check_ins, from, to))
    }
}

/// Day-by-day series over `[from, to]` plus the mood distribution.
/// Ties for the dominant mood go to the earlier label in `Mood::ALL`.
pub fn mood_trend(check_ins: &[CheckIn], from: NaiveDate, to: NaiveDate) -> MoodTrend {
    let by_date: BTreeMap<NaiveDate, Mood> = check_ins.iter().map(|c| (c.date, c.mood)).collect();

    let mut series = Vec::new();
    let mut date = from;
    while date <= to {
        series.push(TrendPoint {
            date,
            mood: by_date.get(&date).copied(),
        });
        date += Duration::days(1);
    }

    let distribution: Vec<MoodCount> = Mood::ALL
        .into_iter()
        .map(|mood| MoodCount {
            mood,
            count: by_date.values().filter(|m| **m == mood).count() as i64,
        })
        .collect();

    let dominant_mood = distribution
        .iter()
        .filter(|c| c.count > 0)
        .fold(None::<&MoodCount>, |best, c| match best {
            Some(b) if b.count >= c.count => Some(b),
            _ => Some(c),
        })
        .map(|c| c.mood);

    MoodTrend {
        start_date: from,
        end_date: to,
        days_checked_in: by_date.len() as i64,
        dominant_mood,
        distribution,
        series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, day).unwrap()
    }

    fn ledger() -> (MemoryStore, CheckInLedger) {
        let store = MemoryStore::new();
        let ledger = CheckInLedger::new(Arc::new(store.clone()));
        (store, ledger)
    }

    #[tokio::test]
    async fn test_duplicate_check_in_keeps_first_row() {
        let (_, ledger) = ledger();
        let user = Uuid::new_v4();
        ledger
            .record_check_in(user, d(3), Mood::Happy, Some("sunny".into()))
            .await
            .unwrap();

        let err = ledger
            .record_check_in(user, d(3), Mood::Angry, Some("rewrite".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateCheckIn { date } if date == d(3)));

        let rows = ledger.list_check_ins(user, d(3), d(3)).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].mood, Mood::Happy);
        assert_eq!(rows[0].notes.as_deref(), Some("sunny"));
    }

    #[tokio::test]
    async fn test_round_trip_returns_rows_in_date_order() {
        let (_, ledger) = ledger();
        let user = Uuid::new_v4();
        let submitted = [
            (d(5), Mood::Sad, Some("rain")),
            (d(2), Mood::Happy, None),
            (d(4), Mood::Neutral, Some("meh")),
        ];
        for (date, mood, notes) in submitted {
            ledger
                .record_check_in(user, date, mood, notes.map(String::from))
                .await
                .unwrap();
        }

        let rows = ledger.list_check_ins(user, d(1), d(30)).await.unwrap();
        let got: Vec<(NaiveDate, Mood, Option<&str>)> = rows
            .iter()
            .map(|c| (c.date, c.mood, c.notes.as_deref()))
            .collect();
        assert_eq!(
            got,
            vec![
                (d(2), Mood::Happy, None),
                (d(4), Mood::Neutral, Some("meh")),
                (d(5), Mood::Sad, Some("rain")),
            ]
        );
    }

    #[tokio::test]
    async fn test_has_checked_in_on() {
        let (_, ledger) = ledger();
        let user = Uuid::new_v4();
        assert!(!ledger.has_checked_in_on(user, d(7)).await.unwrap());
        ledger.record_check_in(user, d(7), Mood::Surprised, None).await.unwrap();
        assert!(ledger.has_checked_in_on(user, d(7)).await.unwrap());
        assert!(!ledger.has_checked_in_on(Uuid::new_v4(), d(7)).await.unwrap());
    }

    #[tokio::test]
    async fn test_store_failure_is_not_a_duplicate() {
        let (store, ledger) = ledger();
        store.set_offline(true);
        let err = ledger
            .record_check_in(Uuid::new_v4(), d(1), Mood::Happy, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Persistence(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_inverted_range_is_invalid_input() {
        let (_, ledger) = ledger();
        let err = ledger
            .list_check_ins(Uuid::new_v4(), d(10), d(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_notes_are_stored_verbatim() {
        let (store, ledger) = ledger();
        let user = Uuid::new_v4();
        for (day, notes) in [(1, "   "), (2, "  padded\n")] {
            ledger
                .record_check_in(user, d(day), Mood::Neutral, Some(notes.into()))
                .await
                .unwrap();
        }

        let rows = store.list_check_ins(user, d(1), d(2)).await.unwrap();
        assert_eq!(rows[0].notes.as_deref(), Some("   "));
        assert_eq!(rows[1].notes.as_deref(), Some("  padded\n"));
    }

    #[tokio::test]
    async fn test_trend_fills_missing_days_and_picks_dominant() {
        let (_, ledger) = ledger();
        let user = Uuid::new_v4();
        for (day, mood) in [(1, Mood::Sad), (2, Mood::Happy), (4, Mood::Happy)] {
            ledger.record_check_in(user, d(day), mood, None).await.unwrap();
        }

        let trend = ledger.trend(user, d(1), d(5)).await.unwrap();
        assert_eq!(trend.series.len(), 5);
        assert_eq!(trend.series[2].mood, None);
        assert_eq!(trend.days_checked_in, 3);
        assert_eq!(trend.dominant_mood, Some(Mood::Happy));
        let happy = trend.distribution.iter().find(|c| c.mood == Mood::Happy).unwrap();
        assert_eq!(happy.count, 2);
    }

    #[test]
    fn test_trend_of_empty_window_has_no_dominant_mood() {
        let trend = mood_trend(&[], d(1), d(3));
        assert_eq!(trend.dominant_mood, None);
        assert_eq!(trend.series.len(), 3);
        assert!(trend.distribution.iter().all(|c| c.count == 0));
    }
}
