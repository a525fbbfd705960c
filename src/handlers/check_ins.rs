use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Duration;
use validator::Validate;

use super::{client_date, server_today, ws::broadcast};
use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::check_in::{
    CheckIn, CheckInOutcome, CheckInQuery, CheckedInResponse, DayQuery, MoodTrend,
    RecordCheckInRequest, TrendQuery,
};
use crate::models::mood::Mood;
use crate::models::preferences::UserEntitlements;
use crate::AppState;

pub async fn record_check_in(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<RecordCheckInRequest>,
) -> AppResult<Json<CheckInOutcome>> {
    body.validate()?;
    let mood: Mood = body.mood.parse()?;
    let server_today = server_today();
    let date = client_date(body.date, server_today)?;
    // A client ahead of UTC checks in for "tomorrow"; the streak is measured from there.
    let today = date.max(server_today);

    let outcome = state
        .engine
        .check_in(auth_user.id, date, mood, body.notes, today)
        .await?;

    broadcast(
        &state,
        auth_user.id,
        "check_in_recorded",
        serde_json::json!({
            "check_in_id": outcome.check_in.id,
            "date": outcome.check_in.date,
            "current_streak": outcome.streak.current_streak,
        }),
    );
    for achievement in &outcome.new_achievements {
        broadcast(
            &state,
            auth_user.id,
            "achievement_unlocked",
            serde_json::json!({ "id": achievement.id, "title": achievement.title }),
        );
    }

    Ok(Json(outcome))
}

pub async fn list_check_ins(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<CheckInQuery>,
) -> AppResult<Json<Vec<CheckIn>>> {
    let today = server_today();
    let start = query.start_date.unwrap_or(today - Duration::days(30));
    let end = query.end_date.unwrap_or(today + Duration::days(1));

    let check_ins = state.engine.ledger.list_check_ins(auth_user.id, start, end).await?;
    Ok(Json(check_ins))
}

pub async fn checked_in_on(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<DayQuery>,
) -> AppResult<Json<CheckedInResponse>> {
    let date = client_date(query.date, server_today())?;
    let checked_in = state.engine.ledger.has_checked_in_on(auth_user.id, date).await?;
    Ok(Json(CheckedInResponse { date, checked_in }))
}

pub async fn get_trend(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<TrendQuery>,
) -> AppResult<Json<MoodTrend>> {
    let prefs = state.store.load_preferences(auth_user.id).await?;
    let entitlements = UserEntitlements::for_tier(prefs.subscription_tier);
    let days = query.days.unwrap_or(30).clamp(1, entitlements.trend_days);

    let end = server_today();
    let start = end - Duration::days(days - 1);
    let trend = state.engine.ledger.trend(auth_user.id, start, end).await?;
    Ok(Json(trend))
}
