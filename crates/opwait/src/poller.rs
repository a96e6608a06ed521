//! Operation completion poller
//!
//! After a mutating API call returns, the remote operation keeps running.
//! [`OperationPoller`] probes the resource until its status reaches a
//! success or failure classification, the timeout elapses, or the wait is
//! cancelled.
//!
//! ```text
//!  delay ─▶ probe ─▶ classify ──▶ Failure ─────────────▶ Err(OperationFailed)
//!             ▲         │
//!             │         ├──▶ Success (streak >= N) ──▶ Ok(Reached)
//!             │         │
//!             │         └──▶ Pending / short streak
//!             │                    │
//!             └── interval ◀── elapsed < timeout ──▶ Err(Timeout)
//! ```
//!
//! Sleeps and in-flight probes are both cut off at `started + timeout`, so a
//! probe that never answers still ends in [`WaitError::Timeout`].

use crate::classify::{Classification, Classify};
use crate::config::PollConfig;
use crate::error::{ProbeError, WaitError};
use async_trait::async_trait;
use std::future::Future;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

/// Read-only status query against a remote resource
///
/// Implemented for any `FnMut()` returning an owned (`'static`) future of
/// `Result<R, ProbeError>`, e.g. `move || { let c = client.clone(); async move { .. } }`.
#[async_trait]
pub trait Probe: Send {
    type Response: Send;

    async fn probe(&mut self) -> Result<Self::Response, ProbeError>;
}

#[async_trait]
impl<F, Fut, R> Probe for F
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<R, ProbeError>> + Send + 'static,
    R: Send + 'static,
{
    type Response = R;

    async fn probe(&mut self) -> Result<R, ProbeError> {
        (self)().await
    }
}

/// Successful end of a wait
#[derive(Debug, Clone, PartialEq)]
pub enum Completion<R> {
    /// The response whose classification completed the wait
    Reached(R),
    /// The resource is gone and the config treats that as done
    NotFound,
}

impl<R> Completion<R> {
    pub fn response(&self) -> Option<&R> {
        match self {
            Self::Reached(response) => Some(response),
            Self::NotFound => None,
        }
    }

    pub fn into_response(self) -> Option<R> {
        match self {
            Self::Reached(response) => Some(response),
            Self::NotFound => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

pub type WaitResult<R> = Result<Completion<R>, WaitError<R>>;

/// A single wait for one long-running operation
///
/// Built once per wait and consumed by [`wait`](Self::wait).
pub struct OperationPoller<P, C> {
    label: String,
    probe: P,
    classifier: C,
    config: PollConfig,
    cancel: Option<CancellationToken>,
}

impl<P, C> OperationPoller<P, C>
where
    P: Probe,
    C: Classify<P::Response>,
{
    pub fn new(probe: P, classifier: C, config: PollConfig) -> Self {
        Self {
            label: "operation".to_string(),
            probe,
            classifier,
            config,
            cancel: None,
        }
    }

    /// Name used in log output, e.g. `graph-create/8a1c`
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll until the operation settles
    pub async fn wait(self) -> WaitResult<P::Response> {
        self.config.validate()?;
        self.classifier.validate()?;

        let span = info_span!("wait", operation = %self.label);
        self.run().instrument(span).await
    }

    async fn run(self) -> WaitResult<P::Response> {
        let Self {
            mut probe,
            classifier,
            config,
            cancel,
            ..
        } = self;
        let cancel = cancel.as_ref();
        let started = Instant::now();
        let deadline = started + config.timeout;
        let mut attempts: u32 = 0;
        let mut streak: u32 = 0;
        let mut last = None;

        if !pause(started + config.first_delay(), deadline, cancel).await {
            return Err(cancelled(last));
        }

        loop {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                return Err(cancelled(last));
            }

            attempts += 1;
            // A probe already answered when first polled beats a due deadline
            let outcome = tokio::select! {
                biased;
                _ = cancellation(cancel) => return Err(cancelled(last)),
                outcome = probe.probe() => outcome,
                _ = sleep_until(deadline) => {
                    debug!(attempts, "Status probe still running at the deadline");
                    return Err(timed_out(&config, attempts, last));
                }
            };

            let response = match outcome {
                Ok(response) => response,
                Err(ProbeError::NotFound(what)) if config.not_found_is_success => {
                    info!(attempts, "Resource is gone ({}), treating as complete", what);
                    return Ok(Completion::NotFound);
                }
                Err(e) => {
                    warn!(attempts, "Status probe failed: {}", e);
                    return Err(WaitError::Probe(e));
                }
            };

            match classifier.classify(&response) {
                Classification::Failure { status } => {
                    warn!(attempts, status = %status, "Operation reached a failure status");
                    return Err(WaitError::OperationFailed {
                        status,
                        last: response,
                    });
                }
                Classification::Success => {
                    streak += 1;
                    if streak >= config.required_consecutive_successes {
                        info!(
                            attempts,
                            elapsed = ?started.elapsed(),
                            "Operation completed"
                        );
                        return Ok(Completion::Reached(response));
                    }
                    debug!(
                        attempts,
                        streak,
                        required = config.required_consecutive_successes,
                        "Target status observed, waiting for it to settle"
                    );
                }
                Classification::Pending => {
                    if streak > 0 {
                        debug!(attempts, streak, "Target status regressed to pending");
                    } else {
                        debug!(attempts, "Operation still pending");
                    }
                    streak = 0;
                }
            }
            last = Some(response);

            if Instant::now() >= deadline {
                return Err(timed_out(&config, attempts, last));
            }

            if !pause(Instant::now() + config.interval, deadline, cancel).await {
                return Err(cancelled(last));
            }
        }
    }
}

/// Wait for a long-running operation to settle
///
/// Shorthand for `OperationPoller::new(probe, classifier, config).wait()`.
pub async fn wait_until_terminal<P, C>(
    probe: P,
    classifier: C,
    config: PollConfig,
) -> WaitResult<P::Response>
where
    P: Probe,
    C: Classify<P::Response>,
{
    OperationPoller::new(probe, classifier, config).wait().await
}

fn cancelled<R>(last: Option<R>) -> WaitError<R> {
    debug!("Wait cancelled");
    WaitError::Cancelled { last }
}

fn timed_out<R>(config: &PollConfig, attempts: u32, last: Option<R>) -> WaitError<R> {
    warn!(
        attempts,
        timeout = ?config.timeout,
        "Timed out waiting for operation"
    );
    WaitError::Timeout {
        timeout: config.timeout,
        attempts,
        last,
    }
}

/// Sleep until `wake`, never past `deadline`; false when cancelled
async fn pause(wake: Instant, deadline: Instant, cancel: Option<&CancellationToken>) -> bool {
    tokio::select! {
        biased;
        _ = cancellation(cancel) => false,
        _ = sleep_until(wake.min(deadline)) => true,
    }
}

/// Resolves once `cancel` fires; never without a token
async fn cancellation(cancel: Option<&CancellationToken>) {
    match cancel {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}
