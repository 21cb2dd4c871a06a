//! # Template Retrieval Service
//!
//! Backs `GET /api/templates/{template_id}` and `GET /api/templates`.
//! Content comes back exactly as stored; sanitizing happens when a row is
//! rendered for preview, never on read.

use crate::error::ApiError;
use crate::store::Store;
use actix_web::{web, HttpResponse};

/// Handler for `GET /api/templates/{template_id}`.
///
/// # Returns
/// - `200 OK` with the `Template` as JSON.
/// - `404 Not Found` when no template has that id.
/// - `503 Service Unavailable` when the database cannot be read.
pub async fn process(
    store: web::Data<Store>,
    template_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let template = store.get_template(&template_id)?;
    Ok(HttpResponse::Ok().json(template))
}

/// Handler for `GET /api/templates`.
pub async fn list(store: web::Data<Store>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(store.list_templates()?))
}
