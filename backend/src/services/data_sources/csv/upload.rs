use crate::config::Config;
use crate::error::ApiError;
use crate::pipeline::ingest::parse_delimited;
use crate::services::data_sources::DatasetsState;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use common::model::datasource::DatasetSummary;
use futures_util::StreamExt;
use log::info;
use md5::Context;

/// HTTP handler wrapper that converts the upload result to an `HttpResponse`.
///
/// - On success: `200 OK` with the `DatasetSummary` as JSON.
/// - On failure: `400 Bad Request` with the error message.
pub async fn process(
    payload: Multipart,
    state: web::Data<DatasetsState>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let summary = upload_data_source(payload, &state, config.max_upload_bytes).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Reads the `file` part, parses it and registers the dataset under the MD5
/// of the uploaded bytes.
pub async fn upload_data_source(
    mut payload: Multipart,
    state: &DatasetsState,
    max_bytes: usize,
) -> Result<DatasetSummary, ApiError> {
    let mut upload: Option<(Vec<u8>, String)> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let field_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        if field_name.as_deref() != Some("file") {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
            .unwrap_or_default();
        if !filename.to_lowercase().ends_with(".csv") {
            return Err(ApiError::BadRequest("The file must end with .csv".to_string()));
        }

        let mut md5_hasher = Context::new();
        let mut buffer = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| ApiError::BadRequest(e.to_string()))?;
            if buffer.len() + chunk.len() > max_bytes {
                return Err(ApiError::BadRequest(format!(
                    "The file is larger than {} bytes",
                    max_bytes
                )));
            }
            md5_hasher.consume(&chunk);
            buffer.extend_from_slice(&chunk);
        }
        upload = Some((buffer, format!("{:x}", md5_hasher.finalize())));
    }

    let (bytes, dataset_id) =
        upload.ok_or_else(|| ApiError::BadRequest("Missing file".to_string()))?;
    let dataset = parse_delimited(&bytes)?;
    let summary = dataset.summary(&dataset_id);

    info!(
        "Registered dataset {}: {} columns, {} rows",
        dataset_id,
        summary.headers.len(),
        summary.row_count
    );
    state.insert(&dataset_id, dataset).await;

    Ok(summary)
}
