use crate::error::ApiError;
use crate::services::contacts::contact_filter;
use crate::store::Store;
use actix_web::{web, HttpResponse};
use common::requests::ContactQuery;

/// `GET /api/contacts[?search=...&date=...&order=asc|desc]`
pub(crate) async fn process(
    store: web::Data<Store>,
    query: web::Query<ContactQuery>,
) -> Result<HttpResponse, ApiError> {
    let contacts = store.list_contacts(&contact_filter(&query)?)?;
    Ok(HttpResponse::Ok().json(contacts))
}
