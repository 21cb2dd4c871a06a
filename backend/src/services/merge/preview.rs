use crate::error::ApiError;
use crate::pipeline::render::preview_document;
use crate::services::data_sources::DatasetsState;
use crate::services::merge::load_session;
use crate::store::Store;
use actix_web::{web, HttpResponse};
use common::requests::PreviewRequest;

/// `POST /api/merge/preview`: one row rendered and sanitized.
///
/// JSON by default; with `document: true` the sanitized content comes back as
/// a standalone HTML page ready for an isolated frame.
pub(crate) async fn process(
    store: web::Data<Store>,
    datasets: web::Data<DatasetsState>,
    payload: web::Json<PreviewRequest>,
) -> Result<HttpResponse, ApiError> {
    let session = load_session(&store, &datasets, &payload.merge).await?;
    let preview = session.preview(payload.row)?;

    if payload.document {
        return Ok(HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(preview_document(&preview.html)));
    }
    Ok(HttpResponse::Ok().json(preview))
}
