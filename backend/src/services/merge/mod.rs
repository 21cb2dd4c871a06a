//! # Merge Service Module
//!
//! Everything the bulk-send screen does once a template and a recipient file
//! are chosen: mapping, preview, a single test send, and the background bulk
//! run with its status, results and cancellation.
//!
//! Every request names the template and the uploaded dataset and may carry
//! manual column assignments; a fresh [`MergeSession`] is built from them each
//! time, so the server keeps no per-screen state besides the uploads.

mod cancel;
mod mapping;
mod preview;
mod results;
mod start;
mod status;
mod test_send;

use crate::error::ApiError;
use crate::pipeline::session::MergeSession;
use crate::services::data_sources::DatasetsState;
use crate::store::Store;
use actix_web::web;
use common::requests::MergeRequest;

const API_PATH: &str = "/api/merge";

/// Configures and returns the Actix `Scope` for all merge-related routes.
pub fn configure_routes() -> actix_web::Scope {
    web::scope(API_PATH)
        .route("/mapping", web::post().to(mapping::process))
        .route("/preview", web::post().to(preview::process))
        .route("/test", web::post().to(test_send::process))
        .route("/start", web::post().to(start::process))
        .route("/status/{job_id}", web::get().to(status::process))
        .route("/results/{job_id}", web::get().to(results::process))
        .route("/cancel/{job_id}", web::post().to(cancel::process))
}

/// Builds the session a request describes: stored template, uploaded
/// dataset, automatic mapping, then the request's manual assignments.
pub(crate) async fn load_session(
    store: &Store,
    datasets: &DatasetsState,
    request: &MergeRequest,
) -> Result<MergeSession, ApiError> {
    let template = store.get_template(&request.template_id)?;
    let dataset = datasets.get(&request.dataset_id).await.ok_or_else(|| {
        ApiError::NotFound(format!("Dataset '{}' not found", request.dataset_id))
    })?;

    let mut session = MergeSession::new();
    session.set_template(template);
    session.set_dataset(dataset);
    session.assign_all(&request.assignments)?;
    Ok(session)
}
