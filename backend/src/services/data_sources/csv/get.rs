use crate::error::ApiError;
use crate::services::data_sources::DatasetsState;
use actix_web::{web, HttpResponse};

pub(crate) async fn process(
    dataset_id: web::Path<String>,
    state: web::Data<DatasetsState>,
) -> Result<HttpResponse, ApiError> {
    let dataset_id = dataset_id.into_inner();
    match state.get(&dataset_id).await {
        Some(dataset) => Ok(HttpResponse::Ok().json(dataset.summary(&dataset_id))),
        None => Err(ApiError::NotFound(format!("Dataset '{}' not found", dataset_id))),
    }
}
