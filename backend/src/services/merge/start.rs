//! # Bulk Send Start Service
//!
//! Provides `POST /api/merge/start`, which starts a background bulk run of a
//! template over every row of an uploaded dataset.
//!
//! ## Workflow:
//!
//! 1.  **HTTP Request**: `process` receives a `StartMergeRequest` naming the
//!     template, the dataset, the service id and optional manual assignments.
//!
//! 2.  **Snapshot**: the session is built and turned into the recipient list
//!     up front. The run owns that list; nothing the console does afterwards
//!     changes what goes out.
//!
//! 3.  **Job Scheduling**: `schedule_merge_job` registers a `Pending` job,
//!     returns its `job_id` immediately and spawns the run.
//!
//! 4.  **Progress Reporting**: the dispatcher publishes a `Progress` after every
//!     answered batch. A forwarding task turns each into
//!     `JobStatus::InProgress(percent)` for the central job controller.
//!
//! 5.  **Completion**: outcomes are written to the delivery log, the final
//!     report is stored for `/results/{job_id}`, and the job ends as
//!     `Completed`, `Failed` (transport error) or `Cancelled`.

use crate::clients::send::HttpSendEndpoint;
use crate::config::Config;
use crate::error::{ApiError, DispatchError};
use crate::job_controller::state::{JobUpdate, JobsState};
use crate::pipeline::dispatch::{BatchDispatcher, DispatchConfig, DispatchReport, Progress, SendContext};
use crate::services::data_sources::DatasetsState;
use crate::services::merge::load_session;
use crate::store::Store;
use actix_web::{web, HttpResponse};
use common::jobs::JobStatus;
use common::model::merge::Recipient;
use common::requests::StartMergeRequest;
use log::{error, info};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Everything a spawned run needs, moved into the task.
struct MergeJob {
    job_id: String,
    context: SendContext,
    recipients: Vec<Recipient>,
    dispatch_config: DispatchConfig,
}

/// The Actix web handler for `POST /api/merge/start`.
///
/// # Returns
/// `200 OK` with `{ "job_id": ... }`; the client polls `/status/{job_id}`.
pub(crate) async fn process(
    state: web::Data<JobsState>,
    store: web::Data<Store>,
    datasets: web::Data<DatasetsState>,
    endpoint: web::Data<HttpSendEndpoint>,
    config: web::Data<Config>,
    payload: web::Json<StartMergeRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = payload.into_inner();

    let mut dispatch_config = config.dispatch_config();
    if let Some(batch_size) = request.batch_size {
        if batch_size == 0 {
            return Err(ApiError::BadRequest("Batch size must be at least 1".to_string()));
        }
        dispatch_config.batch_size = batch_size;
    }

    let session = load_session(&store, &datasets, &request.merge).await?;
    let job = MergeJob {
        job_id: Uuid::new_v4().to_string(),
        context: SendContext {
            user_key: config.user_key.clone(),
            service_id: request.service_id,
            template_id: request.merge.template_id,
        },
        recipients: session.recipients()?,
        dispatch_config,
    };

    let job_id = schedule_merge_job(
        state.get_ref().clone(),
        store.get_ref().clone(),
        endpoint.get_ref().clone(),
        job,
    )
    .await;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "job_id": job_id })))
}

/// Registers the job as `Pending` and spawns the run. Returns the job id.
async fn schedule_merge_job(
    state: JobsState,
    store: Store,
    endpoint: HttpSendEndpoint,
    job: MergeJob,
) -> String {
    let job_id = job.job_id.clone();
    let cancel = state.register(&job_id).await;

    info!(
        "Scheduled bulk send {} of template {} to {} recipients",
        job_id,
        job.context.template_id,
        job.recipients.len()
    );

    tokio::spawn(async move {
        let MergeJob {
            job_id,
            context,
            recipients,
            dispatch_config,
        } = job;

        // Translate dispatcher progress into job controller updates.
        let (progress_tx, mut progress_rx) = mpsc::channel::<Progress>(100);
        let updater_tx = state.tx.clone();
        let job_id_for_updater = job_id.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(progress) = progress_rx.recv().await {
                let percent = progress.percent().floor() as u32;
                let _ = updater_tx
                    .send(JobUpdate::new(
                        job_id_for_updater.clone(),
                        JobStatus::InProgress(percent),
                    ))
                    .await;
            }
        });

        let dispatcher = BatchDispatcher::new(endpoint, dispatch_config);
        let report = dispatcher
            .dispatch(&context, recipients, Some(progress_tx), &cancel)
            .await;
        // The progress sender is gone with the run; let the last update land
        // before the final status.
        let _ = forwarder.await;

        if let Err(e) =
            store.record_outcomes(&context.template_id, &context.service_id, &report.outcomes)
        {
            error!("Could not write delivery log for job {}: {}", job_id, e);
        }

        let status = final_status(&report);
        info!("Bulk send {} finished: {:?}", job_id, status);
        state.finish(&job_id, report.summary()).await;
        let _ = state.tx.send(JobUpdate::new(job_id, status)).await;
    });

    job_id
}

fn final_status(report: &DispatchReport) -> JobStatus {
    let headline = report.summary().headline();
    match &report.error {
        None => JobStatus::Completed(headline),
        Some(err @ DispatchError::Cancelled { .. }) => {
            JobStatus::Cancelled(format!("{}. {}", err, headline))
        }
        Some(err @ DispatchError::Transport { .. }) => {
            JobStatus::Failed(format!("{}. {}", err, headline))
        }
    }
}
