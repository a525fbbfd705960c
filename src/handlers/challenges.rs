use axum::{extract::State, Extension, Json};
use validator::Validate;

use super::{client_date, server_today, ws::broadcast};
use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::challenge::{ChallengeOutcome, CompleteChallengeRequest};
use crate::AppState;

pub async fn complete_challenge(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CompleteChallengeRequest>,
) -> AppResult<Json<ChallengeOutcome>> {
    body.validate()?;
    let server_today = server_today();
    let date = client_date(body.date, server_today)?;

    let outcome = state
        .engine
        .complete_challenge(auth_user.id, date, body.response, date.max(server_today))
        .await?;

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
