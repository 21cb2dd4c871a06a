//! Sent recipients under `/api/contacts`, as JSON or as a CSV download.

mod export;
mod list;

use crate::error::ApiError;
use crate::services::logs::parse_day;
use crate::store::logs::ContactFilter;
use actix_web::web::{get, scope};
use actix_web::Scope;
use common::requests::ContactQuery;

const API_PATH: &str = "/api/contacts";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list::process))
        .route("/export", get().to(export::process))
}

fn contact_filter(query: &ContactQuery) -> Result<ContactFilter<'_>, ApiError> {
    Ok(ContactFilter {
        search: query.search.as_deref(),
        day: parse_day(query.date.as_deref())?,
        order: query.order,
    })
}
