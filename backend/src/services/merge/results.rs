use crate::error::ApiError;
use crate::job_controller::state::JobsState;
use actix_web::{web, HttpResponse};

/// `GET /api/merge/results/{job_id}`: the final report of a finished run.
pub(crate) async fn process(
    job_id: web::Path<String>,
    state: web::Data<JobsState>,
) -> Result<HttpResponse, ApiError> {
    if let Some(report) = state.report(&job_id).await {
        return Ok(HttpResponse::Ok().json(report));
    }
    match state.status(&job_id).await {
        Some(_) => Err(ApiError::NotFound(format!("Job {} has not finished yet", job_id))),
        None => Err(ApiError::NotFound("Job ID not found".to_string())),
    }
}
