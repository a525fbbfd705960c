use axum::{extract::State, Extension, Json};

use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::achievement::AchievementStatus;
use crate::AppState;

pub async fn list_achievements(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<AchievementStatus>>> {
    Ok(Json(state.engine.achievements(auth_user.id).await?))
}
