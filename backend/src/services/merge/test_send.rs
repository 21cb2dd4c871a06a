use crate::clients::send::HttpSendEndpoint;
use crate::config::Config;
use crate::error::{ApiError, SessionError};
use crate::pipeline::dispatch::{send_single, SendContext};
use crate::services::data_sources::DatasetsState;
use crate::services::merge::load_session;
use crate::store::Store;
use actix_web::{web, HttpResponse};
use common::requests::TestSendRequest;
use log::{info, warn};

/// `POST /api/merge/test`: sends row `row` alone, with its values as one
/// shared parameter set, and returns that recipient's outcome.
///
/// A transport failure comes back as `502`/`504`; a recipient the endpoint
/// rejects is a `200` with `success: false`.
pub(crate) async fn process(
    store: web::Data<Store>,
    datasets: web::Data<DatasetsState>,
    endpoint: web::Data<HttpSendEndpoint>,
    config: web::Data<Config>,
    payload: web::Json<TestSendRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = payload.into_inner();
    let session = load_session(&store, &datasets, &request.merge).await?;

    let mut recipients = session.recipients()?;
    let rows = recipients.len();
    if request.row >= rows {
        return Err(SessionError::RowOutOfRange { row: request.row, rows }.into());
    }
    let recipient = recipients.swap_remove(request.row);
    let parameters = recipient.parameters.clone();

    let context = SendContext {
        user_key: config.user_key.clone(),
        service_id: request.service_id.clone(),
        template_id: request.merge.template_id.clone(),
    };

    info!(
        "Test send of template {} to {}",
        context.template_id, recipient.email_address
    );
    let outcome = send_single(
        endpoint.get_ref(),
        &context,
        recipient,
        parameters,
        config.test_send_timeout(),
    )
    .await?;

    if let Err(e) = store.record_outcomes(
        &context.template_id,
        &context.service_id,
        std::slice::from_ref(&outcome),
    ) {
        warn!("Could not log test send outcome: {}", e);
    }

    Ok(HttpResponse::Ok().json(outcome))
}
