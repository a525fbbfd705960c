use chrono::{NaiveDate, Utc};

use crate::error::{AppError, AppResult};

pub mod achievements;
pub mod challenges;
pub mod check_ins;
pub mod health;
pub mod prompts;
pub mod streaks;
pub mod ws;

/// Server-side calendar day (UTC).
pub fn server_today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Clients may send their own local calendar date; it must be within ±1 day
/// of the server's UTC date.
pub fn client_date(requested: Option<NaiveDate>, server_today: NaiveDate) -> AppResult<NaiveDate> {
    let date = requested.unwrap_or(server_today);
    if (date - server_today).num_days().abs() > 1 {
        return Err(AppError::InvalidInput(
            "date must be within ±1 day of today".into(),
        ));
    }
    Ok(date)
}
