use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::{client_date, server_today};
use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::preferences::StreakState;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StreakQuery {
    pub today: Option<NaiveDate>,
}

pub async fn get_streak(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<StreakQuery>,
) -> AppResult<Json<StreakState>> {
    let today = client_date(query.today, server_today())?;
    let streak = state.engine.streaks.current(auth_user.id, today).await?;
    Ok(Json(streak))
}
