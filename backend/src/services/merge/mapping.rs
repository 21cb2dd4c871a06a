use crate::error::ApiError;
use crate::services::data_sources::DatasetsState;
use crate::services::merge::load_session;
use crate::store::Store;
use actix_web::{web, HttpResponse};
use common::requests::MergeRequest;

/// `POST /api/merge/mapping`: the placeholder-to-column mapping, the detected
/// email and name columns, and the placeholders still unmapped.
pub(crate) async fn process(
    store: web::Data<Store>,
    datasets: web::Data<DatasetsState>,
    payload: web::Json<MergeRequest>,
) -> Result<HttpResponse, ApiError> {
    let session = load_session(&store, &datasets, &payload).await?;
    Ok(HttpResponse::Ok().json(session.report()))
}
