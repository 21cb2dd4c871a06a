use crate::error::ApiError;
use crate::job_controller::state::JobsState;
use actix_web::{web, HttpResponse};
use log::info;

/// `POST /api/merge/cancel/{job_id}`. The run stops before its next batch;
/// batches already answered keep their outcomes.
pub(crate) async fn process(
    job_id: web::Path<String>,
    state: web::Data<JobsState>,
) -> Result<HttpResponse, ApiError> {
    if !state.cancel(&job_id).await {
        return Err(ApiError::NotFound(format!("No running job {}", job_id)));
    }
    info!("Cancellation requested for job {}", job_id);
    Ok(HttpResponse::Accepted().json(serde_json::json!({ "job_id": job_id.as_str() })))
}
