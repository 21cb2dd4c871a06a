//! Recipient spreadsheet uploads.
//!
//! - `POST /api/data_sources/csv/upload`: multipart/form-data with a `file`
//!   field holding a `.csv` file. The bytes are parsed into a dataset and kept
//!   in memory under the MD5 of the upload, which is returned as `dataset_id`
//!   together with the column titles and row count.
//!
//! - `GET /api/data_sources/csv/{dataset_id}`: the same summary for an upload
//!   made earlier.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod get;
mod upload;

const API_PATH: &str = "/api/data_sources/csv";

/// Configures and returns the Actix scope for CSV data source routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/upload", post().to(upload::process))
        .route("/{dataset_id}", get().to(get::process))
}
