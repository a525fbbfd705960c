use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Per-user preferences row. The streak columns are a cache over the
/// check-in ledger and are overwritten on every recompute.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct UserPreferences {
    pub user_id: Uuid,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub streak_as_of: Option<NaiveDate>,
    /// Ledger row count seen by the scan that produced the cached streak.
    pub streak_watermark: i64,
    pub streak_recomputed_at: Option<DateTime<Utc>>,
    pub subscription_tier: SubscriptionTier,
    pub updated_at: DateTime<Utc>,
}

impl UserPreferences {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            current_streak: 0,
            longest_streak: 0,
            streak_as_of: None,
            streak_watermark: 0,
            streak_recomputed_at: None,
            subscription_tier: SubscriptionTier::default(),
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "subscription_tier", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Premium,
}

/// Cached streak as reported to clients.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct StreakState {
    pub user_id: Uuid,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_recomputed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct UserEntitlements {
    pub ai_prompts: bool,
    pub trend_days: i64,
}

impl UserEntitlements {
    pub fn for_tier(tier: SubscriptionTier) -> Self {
        match tier {
            SubscriptionTier::Free => Self {
                ai_prompts: false,
                trend_days: 30,
            },
            SubscriptionTier::Premium => Self {
                ai_prompts: true,
                trend_days: 365,
            },
        }
    }
}
