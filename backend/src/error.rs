use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::time::Duration;
use thiserror::Error;

/// Failure to turn an uploaded file into a dataset. Always user facing.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("The uploaded file is empty")]
    Empty,

    #[error("The uploaded file is not valid UTF-8 text")]
    InvalidEncoding,

    #[error("CSV header cell {0} is empty")]
    EmptyHeader(usize),

    #[error("CSV header contains the column '{0}' more than once")]
    DuplicateHeader(String),

    #[error("Could not parse CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Failure to complete a call to the send endpoint at all.
///
/// Distinct from a per-recipient failure reported inside a successful response,
/// which is data and never surfaces as an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("Send endpoint did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Could not reach the send endpoint: {0}")]
    Connect(String),

    #[error("Send endpoint returned HTTP {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Send endpoint returned a malformed response: {0}")]
    MalformedResponse(String),
}

/// Why a bulk run stopped before its last batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("Batch {batch} of {batches} failed: {source}")]
    Transport {
        batch: usize,
        batches: usize,
        #[source]
        source: TransportError,
    },

    #[error("Run cancelled before batch {batch} of {batches}")]
    Cancelled { batch: usize, batches: usize },
}

/// Invalid selection or manual mapping handed to a merge session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("No template selected")]
    MissingTemplate,

    #[error("No recipient file uploaded")]
    MissingDataset,

    #[error("Template has no placeholder named '{0}'")]
    UnknownPlaceholder(String),

    #[error("Recipient file has no column named '{0}'")]
    UnknownColumn(String),

    #[error("Row {row} is out of range, the file has {rows} rows")]
    RowOutOfRange { row: usize, rows: usize },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Error returned by HTTP handlers; maps every failure kind to a status code
/// and a single plain-text message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Could not write CSV: {0}")]
    Export(#[source] csv::Error),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Ingest(_) | ApiError::Session(_) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Store(StoreError::NotFound { .. }) | ApiError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Store(StoreError::Sqlite(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Transport(TransportError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Transport(_) => StatusCode::BAD_GATEWAY,
            ApiError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).body(format!("Error: {}", self))
    }
}
