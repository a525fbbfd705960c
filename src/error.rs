use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde_json::json;

use crate::models::mood::UnknownMood;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Business-rule rejection, not a fault.
    #[error("Already checked in on {date}")]
    DuplicateCheckIn { date: NaiveDate },

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl AppError {
    /// Stable machine-readable discriminator for clients.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "unauthorized",
            AppError::NotFound(_) => "not_found",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::DuplicateCheckIn { .. } => "duplicate_check_in",
            AppError::Persistence(_) => "persistence",
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(errors.to_string())
    }
}

impl From<UnknownMood> for AppError {
    fn from(err: UnknownMood) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::InvalidInput(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::DuplicateCheckIn { .. } => (
                StatusCode::CONFLICT,
                "You already checked in today. Come back tomorrow!".into(),
            ),
            AppError::Persistence(e) => {
                tracing::error!(error = %e, "Persistence error");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Could not save right now, please try again".into(),
                )
            }
        };

        let body = json!({
            "error": {
                "message": message,
                "code": status.as_u16(),
                "kind": self.kind(),
            }
        });

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
