//! Delivery log listing under `/api/logs`.

mod list;

use crate::error::ApiError;
use actix_web::web::{get, scope};
use actix_web::Scope;
use chrono::NaiveDate;

const API_PATH: &str = "/api/logs";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("", get().to(list::process))
}

/// Parses a `date` query value (`YYYY-MM-DD`).
pub(crate) fn parse_day(raw: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("Invalid date '{}', expected YYYY-MM-DD", raw))),
        None => Ok(None),
    }
}
