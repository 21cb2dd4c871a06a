//! Batched, throttled delivery of a recipient list through the send endpoint.
//!
//! Recipients are cut into fixed-size batches that go out strictly one after
//! another, with a pause between batches so the upstream provider never sees a
//! burst. Each batch is one request; whatever fan-out happens behind the
//! endpoint is its own business.
//!
//! Two kinds of failure are kept apart:
//!
//! * a recipient the endpoint reports as failed inside a successful response
//!   is recorded as a [`DispatchOutcome`] with `success = false` and the run
//!   carries on;
//! * a batch call that cannot be completed (timeout, connection error, non-2xx,
//!   unreadable body) stops the run. Batches already answered keep their
//!   outcomes and later batches are never attempted.
//!
//! Progress is published on an mpsc channel after every answered batch.

use crate::error::{DispatchError, TransportError};
use common::model::merge::{
    DispatchOutcome, DispatchSummary, Parameters, Recipient, SendRequest, SendResponse,
};
use log::{debug, info, warn};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_BATCH_SIZE: usize = 5;
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(10);

/// The external send endpoint, seen as a capability.
pub trait SendEndpoint {
    fn send(
        &self,
        request: &SendRequest,
    ) -> impl Future<Output = Result<SendResponse, TransportError>> + Send;
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchConfig {
    pub batch_size: usize,
    /// Pause between the end of one batch and the start of the next.
    pub batch_delay: Duration,
    /// Upper bound on a single batch call.
    pub batch_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: DEFAULT_BATCH_DELAY,
            batch_timeout: DEFAULT_BATCH_TIMEOUT,
        }
    }
}

/// Account and template a run sends on behalf of.
#[derive(Debug, Clone, PartialEq)]
pub struct SendContext {
    pub user_key: String,
    pub service_id: String,
    pub template_id: String,
}

impl SendContext {
    /// Request carrying per-recipient parameters.
    pub fn batch_request(&self, recipients: Vec<Recipient>) -> SendRequest {
        SendRequest {
            user_key: self.user_key.clone(),
            service_id: self.service_id.clone(),
            template_id: self.template_id.clone(),
            recipients,
            parameters: None,
        }
    }

    /// Request sharing one parameter set across its recipients.
    pub fn shared_request(&self, recipients: Vec<Recipient>, parameters: Parameters) -> SendRequest {
        let recipients = recipients
            .into_iter()
            .map(|r| Recipient {
                parameters: Parameters::new(),
                ..r
            })
            .collect();
        SendRequest {
            parameters: Some(parameters),
            ..self.batch_request(recipients)
        }
    }
}

/// Published after each answered batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
    pub batch: usize,
    pub batches: usize,
}

impl Progress {
    /// Share of recipients processed, 0 to 100. An empty run counts as done.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.processed as f64 * 100.0 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Chunking,
    SendingBatch(usize),
    AwaitingResult(usize),
    Completed,
    Aborted,
}

/// Everything a run produced, including how it ended.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReport {
    pub total: usize,
    pub batches: usize,
    /// One per processed recipient, in input order.
    pub outcomes: Vec<DispatchOutcome>,
    pub state: DispatchState,
    /// Set when the run stopped before its last batch.
    pub error: Option<DispatchError>,
}

impl DispatchReport {
    pub fn is_complete(&self) -> bool {
        self.state == DispatchState::Completed
    }

    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn summary(&self) -> DispatchSummary {
        DispatchSummary {
            total: self.total,
            processed: self.processed(),
            succeeded: self.succeeded(),
            failed: self.failed(),
            completed: self.is_complete(),
            error: self.error.as_ref().map(ToString::to_string),
            outcomes: self.outcomes.clone(),
        }
    }
}

enum BatchResult {
    Answered(SendResponse),
    Failed(TransportError),
    Cancelled,
}

pub struct BatchDispatcher<S> {
    endpoint: S,
    config: DispatchConfig,
}

impl<S: SendEndpoint> BatchDispatcher<S> {
    pub fn new(endpoint: S, config: DispatchConfig) -> Self {
        Self { endpoint, config }
    }

    /// Sends `recipients` batch by batch until done, aborted or cancelled.
    ///
    /// The recipient list is owned by the run, so later changes to the
    /// session it came from cannot leak into it.
    pub async fn dispatch(
        &self,
        context: &SendContext,
        recipients: Vec<Recipient>,
        progress: Option<mpsc::Sender<Progress>>,
        cancel: &CancellationToken,
    ) -> DispatchReport {
        let total = recipients.len();
        let mut state = DispatchState::Idle;
        advance(&mut state, DispatchState::Chunking);

        let batch_size = self.config.batch_size.max(1);
        let batches: Vec<&[Recipient]> = recipients.chunks(batch_size).collect();
        let batch_count = batches.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut error = None;

        info!(
            "Dispatching {} recipients for template {} in {} batches of up to {}",
            total, context.template_id, batch_count, batch_size
        );

        if total == 0 {
            publish(&progress, Progress { processed: 0, total: 0, batch: 0, batches: 0 }).await;
        }

        for (idx, batch) in batches.iter().enumerate() {
            let number = idx + 1;

            if idx > 0 && !self.pause(cancel).await {
                error = Some(DispatchError::Cancelled { batch: number, batches: batch_count });
                break;
            }
            if cancel.is_cancelled() {
                error = Some(DispatchError::Cancelled { batch: number, batches: batch_count });
                break;
            }

            advance(&mut state, DispatchState::SendingBatch(number));
            let request = context.batch_request(batch.to_vec());
            advance(&mut state, DispatchState::AwaitingResult(number));

            let response = match self.send_batch(&request, cancel).await {
                BatchResult::Answered(response) => response,
                BatchResult::Failed(source) => {
                    warn!("Batch {}/{} aborted the run: {}", number, batch_count, source);
                    error = Some(DispatchError::Transport { batch: number, batches: batch_count, source });
                    break;
                }
                BatchResult::Cancelled => {
                    error = Some(DispatchError::Cancelled { batch: number, batches: batch_count });
                    break;
                }
            };

            let batch_outcomes = outcomes_for_batch(batch, &response);
            let failed = batch_outcomes.iter().filter(|o| !o.success).count();
            info!(
                "Batch {}/{} answered: {} sent, {} failed",
                number,
                batch_count,
                batch_outcomes.len() - failed,
                failed
            );
            outcomes.extend(batch_outcomes);

            publish(
                &progress,
                Progress { processed: outcomes.len(), total, batch: number, batches: batch_count },
            )
            .await;
        }

        let final_state = if error.is_some() {
            DispatchState::Aborted
        } else {
            DispatchState::Completed
        };
        advance(&mut state, final_state);

        DispatchReport { total, batches: batch_count, outcomes, state, error }
    }

    /// Waits out the inter-batch delay. `false` when cancelled meanwhile.
    async fn pause(&self, cancel: &CancellationToken) -> bool {
        if self.config.batch_delay.is_zero() {
            return true;
        }
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = sleep(self.config.batch_delay) => true,
        }
    }

    async fn send_batch(&self, request: &SendRequest, cancel: &CancellationToken) -> BatchResult {
        let limit = self.config.batch_timeout;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => BatchResult::Cancelled,
            result = timeout(limit, self.endpoint.send(request)) => match result {
                Ok(Ok(response)) => BatchResult::Answered(response),
                Ok(Err(err)) => BatchResult::Failed(err),
                Err(_) => BatchResult::Failed(TransportError::Timeout(limit)),
            },
        }
    }
}

/// Sends one recipient with a shared parameter set, as the console's test
/// send does. Any transport problem is returned as the error.
pub async fn send_single<S: SendEndpoint>(
    endpoint: &S,
    context: &SendContext,
    recipient: Recipient,
    parameters: Parameters,
    limit: Duration,
) -> Result<DispatchOutcome, TransportError> {
    let request = context.shared_request(vec![recipient.clone()], parameters);
    let response = timeout(limit, endpoint.send(&request))
        .await
        .map_err(|_| TransportError::Timeout(limit))??;

    let outcome = outcomes_for_batch(std::slice::from_ref(&recipient), &response)
        .pop()
        .unwrap_or_else(|| {
            DispatchOutcome::failed(&recipient.email_address, "No result reported")
                .with_name(&recipient.name)
        });
    Ok(outcome)
}

fn advance(state: &mut DispatchState, next: DispatchState) {
    debug!("Dispatch state {:?} -> {:?}", state, next);
    *state = next;
}

async fn publish(progress: &Option<mpsc::Sender<Progress>>, update: Progress) {
    if let Some(tx) = progress {
        // A caller that stopped listening does not stop the run.
        let _ = tx.send(update).await;
    }
}

/// One outcome per recipient of `batch`, in batch order.
///
/// Per-address results are matched by email (case-insensitive, each result
/// used once). Without per-address results the response's overall verdict
/// applies to the whole batch.
pub fn outcomes_for_batch(batch: &[Recipient], response: &SendResponse) -> Vec<DispatchOutcome> {
    match &response.results {
        Some(results) => {
            let mut used = vec![false; results.len()];
            batch
                .iter()
                .map(|recipient| {
                    let found = results.iter().enumerate().find(|(idx, r)| {
                        !used[*idx] && r.email.eq_ignore_ascii_case(&recipient.email_address)
                    });
                    match found {
                        Some((idx, result)) => {
                            used[idx] = true;
                            DispatchOutcome {
                                email_address: recipient.email_address.clone(),
                                name: recipient.name.clone(),
                                success: result.success,
                                message: result.message.clone(),
                            }
                        }
                        None => DispatchOutcome {
                            email_address: recipient.email_address.clone(),
                            name: recipient.name.clone(),
                            success: false,
                            message: "No result reported for this recipient".to_string(),
                        },
                    }
                })
                .collect()
        }
        None => {
            let message = overall_message(response);
            batch
                .iter()
                .map(|recipient| DispatchOutcome {
                    email_address: recipient.email_address.clone(),
                    name: recipient.name.clone(),
                    success: response.success,
                    message: message.clone(),
                })
                .collect()
        }
    }
}

fn overall_message(response: &SendResponse) -> String {
    if let Some(message) = response.message.as_ref().filter(|m| !m.is_empty()) {
        return message.clone();
    }
    match &response.errors {
        Some(errors) if !errors.is_empty() => errors.join("; "),
        _ if response.success => "Email sent".to_string(),
        _ => "Send failed".to_string(),
    }
}
