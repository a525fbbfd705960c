use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::achievement::{Achievement, AchievementStatus, AchievementUnlock, Metric};

/// Badge catalog. Declaration order is the order simultaneous unlocks are reported in.
pub const CATALOG: &[Achievement] = &[
    Achievement {
        id: "streak_7",
        title: "Week Warrior",
        description: "Checked in seven days in a row",
        metric: Metric::CurrentStreak,
        threshold: 7,
    },
    Achievement {
        id: "streak_30",
        title: "Monthly Master",
        description: "Checked in thirty days in a row",
        metric: Metric::CurrentStreak,
        threshold: 30,
    },
    Achievement {
        id: "first_challenge",
        title: "First Step",
        description: "Completed your first daily challenge",
        metric: Metric::ChallengesCompleted,
        threshold: 1,
    },
    Achievement {
        id: "challenges_10",
        title: "Challenge Seeker",
        description: "Completed ten daily challenges",
        metric: Metric::ChallengesCompleted,
        threshold: 10,
    },
    Achievement {
        id: "challenges_50",
        title: "Challenge Champion",
        description: "Completed fifty daily challenges",
        metric: Metric::ChallengesCompleted,
        threshold: 50,
    },
];

impl Achievement {
    fn is_met(&self, current_streak: u64, challenges_completed: u64) -> bool {
        let value = match self.metric {
            Metric::CurrentStreak => current_streak,
            Metric::ChallengesCompleted => challenges_completed,
        };
        value >= u64::from(self.threshold)
    }
}

/// Stateless: the caller owns the earned set and persists unlocks.
#[derive(Debug, Clone, Copy)]
pub struct AchievementEvaluator {
    catalog: &'static [Achievement],
}

impl Default for AchievementEvaluator {
    fn default() -> Self {
        Self { catalog: CATALOG }
    }
}

impl AchievementEvaluator {
    /// Catalog entries not in `already_earned` whose threshold is met, in catalog order.
    ///
    /// Negative metrics are a caller bug and fail with `InvalidInput`.
    pub fn evaluate(
        &self,
        user_id: Uuid,
        current_streak: i64,
        challenges_completed: i64,
        already_earned: &HashSet<String>,
    ) -> AppResult<Vec<Achievement>> {
        if current_streak < 0 || challenges_completed < 0 {
            return Err(AppError::InvalidInput(format!(
                "metrics must be non-negative (streak={current_streak}, challenges={challenges_completed})"
            )));
        }

        let unlocked: Vec<Achievement> = self
            .catalog
            .iter()
            .filter(|a| !already_earned.contains(a.id))
            .filter(|a| a.is_met(current_streak as u64, challenges_completed as u64))
            .cloned()
            .collect();

        if !unlocked.is_empty() {
            tracing::debug!(
                user_id = %user_id,
                count = unlocked.len(),
                "Achievement thresholds crossed"
            );
        }
        Ok(unlocked)
    }

    /// Full catalog joined with the user's unlock rows.
    pub fn statuses(&self, unlocks: &[AchievementUnlock]) -> Vec<AchievementStatus> {
        let earned: HashMap<&str, DateTime<Utc>> = unlocks
            .iter()
            .map(|u| (u.achievement_id.as_str(), u.earned_at))
            .collect();

        self.catalog
            .iter()
            .map(|a| AchievementStatus {
                achievement: a.clone(),
                earned_at: earned.get(a.id).copied(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[Achievement]) -> Vec<&'static str> {
        list.iter().map(|a| a.id).collect()
    }

    fn earned(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_seven_day_streak_unlocks_only_week_badge() {
        let eval = AchievementEvaluator::default();
        let got = eval.evaluate(Uuid::new_v4(), 7, 0, &HashSet::new()).unwrap();
        assert_eq!(ids(&got), vec!["streak_7"]);
    }

    #[test]
    fn test_batch_challenge_jump_reports_ten_once() {
        let eval = AchievementEvaluator::default();
        let user = Uuid::new_v4();
        let before = earned(&["first_challenge"]);

        let got = eval.evaluate(user, 0, 11, &before).unwrap();
        assert_eq!(ids(&got), vec!["challenges_10"]);

        let after = earned(&["first_challenge", "challenges_10"]);
        assert!(eval.evaluate(user, 0, 11, &after).unwrap().is_empty());
    }

    #[test]
    fn test_evaluate_is_idempotent_for_same_inputs() {
        let eval = AchievementEvaluator::default();
        let user = Uuid::new_v4();
        let already = earned(&["streak_7"]);
        let first = eval.evaluate(user, 31, 3, &already).unwrap();
        let second = eval.evaluate(user, 31, 3, &already).unwrap();
        assert_eq!(first, second);
        assert_eq!(ids(&first), vec!["streak_30", "first_challenge"]);
    }

    #[test]
    fn test_simultaneous_unlocks_follow_catalog_order() {
        let eval = AchievementEvaluator::default();
        let got = eval.evaluate(Uuid::new_v4(), 30, 50, &HashSet::new()).unwrap();
        assert_eq!(
            ids(&got),
            vec!["streak_7", "streak_30", "first_challenge", "challenges_10", "challenges_50"]
        );
    }

    #[test]
    fn test_lower_streak_never_reports_earned_badges() {
        let eval = AchievementEvaluator::default();
        let already = earned(&["streak_7", "streak_30"]);
        let got = eval.evaluate(Uuid::new_v4(), 0, 0, &already).unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn test_negative_metrics_are_rejected() {
        let eval = AchievementEvaluator::default();
        let err = eval.evaluate(Uuid::new_v4(), -1, 0, &HashSet::new()).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(eval.evaluate(Uuid::new_v4(), 0, -5, &HashSet::new()).is_err());
    }

    #[test]
    fn test_statuses_mark_earned_entries() {
        let eval = AchievementEvaluator::default();
        let user = Uuid::new_v4();
        let now = Utc::now();
        let unlocks = vec![AchievementUnlock {
            user_id: user,
            achievement_id: "first_challenge".into(),
            earned_at: now,
        }];

        let statuses = eval.statuses(&unlocks);
        assert_eq!(statuses.len(), CATALOG.len());
        for status in statuses {
            if status.achievement.id == "first_challenge" {
                assert_eq!(status.earned_at, Some(now));
            } else {
                assert!(status.earned_at.is_none());
            }
        }
    }

    #[test]
    fn test_catalog_ids_are_unique() {
        let unique: HashSet<&str> = CATALOG.iter().map(|a| a.id).collect();
        assert_eq!(unique.len(), CATALOG.len());
    }
}
