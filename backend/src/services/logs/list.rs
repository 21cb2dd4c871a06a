use crate::error::ApiError;
use crate::services::logs::parse_day;
use crate::store::logs::LogFilter;
use crate::store::Store;
use actix_web::{web, HttpResponse};
use chrono::{TimeDelta, Utc};
use common::requests::LogQuery;

const RECENT_WINDOW_HOURS: i64 = 24;

/// `GET /api/logs`: delivery log rows of the last 24 hours (every row with
/// `all=true`), optionally for one template or one day, sorted by date or
/// status.
pub(crate) async fn process(
    store: web::Data<Store>,
    query: web::Query<LogQuery>,
) -> Result<HttpResponse, ApiError> {
    let filter = LogFilter {
        template_id: query.template_id.as_deref(),
        since: (!query.all).then(|| Utc::now() - TimeDelta::hours(RECENT_WINDOW_HOURS)),
        day: parse_day(query.date.as_deref())?,
        sort: query.sort,
        order: query.order,
    };
    let logs = store.list_logs(&filter)?;
    Ok(HttpResponse::Ok().json(logs))
}
