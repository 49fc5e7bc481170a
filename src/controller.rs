use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use crate::{
    transport::AttemptEvents, DefaultStatusPolicy, HttpTransport, Payload, RequestError,
    RequestOptions, Response, ResponseMeta, Result, StatusDecision, StatusPolicy, Timer, Timings,
    Transport,
};

/// Completion callback, invoked at most once with `(error, response)`.
pub type Completion = Box<dyn FnOnce(Option<RequestError>, Option<Response>) + Send + 'static>;

/// Formats the request target as `<protocol>//<host>:<port><path>`.
///
/// Example: `("http:", "yandex.com", 443, "/search")` → `"http://yandex.com:443/search"`
///
/// Inputs are concatenated verbatim, without escaping or validation.
pub fn build_url(protocol: &str, host: &str, port: impl fmt::Display, path: &str) -> String {
    format!("{protocol}//{host}:{port}{path}")
}

/// Lifecycle phase of a [`RequestController`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Executing,
    Finalizing,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Executing => "executing",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Accept,
    Retry,
    Reject,
}

fn next_step(decision: StatusDecision, used: usize, limit: usize) -> Step {
    if decision.accept {
        Step::Accept
    } else if decision.is_retry_allowed && used < limit {
        Step::Retry
    } else {
        Step::Reject
    }
}

/// Drives one logical HTTP request through its attempts to a single
/// completion.
///
/// A controller is created per request and discarded once done; calling
/// [`RequestController::execute`] a second time is rejected.
pub struct RequestController<T = HttpTransport> {
    options: Arc<RequestOptions>,
    transport: T,
    policy: Box<dyn StatusPolicy>,
    completion: Option<Completion>,
    phase: Phase,
    retries: usize,
    execution: Timer,
    network: Timer,
    last_payload: Option<Payload>,
}

impl<T> fmt::Debug for RequestController<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestController")
            .field("options", &self.options)
            .field("phase", &self.phase)
            .field("retries", &self.retries)
            .field("timers", &self.timers())
            .field("has_completion", &self.completion.is_some())
            .finish()
    }
}

impl RequestController<HttpTransport> {
    /// Creates a controller on the default `reqwest` transport.
    pub fn new(options: RequestOptions) -> Self {
        Self::with_transport(options, HttpTransport::new())
    }
}

impl<T> RequestController<T> {
    /// Creates a controller on a custom transport.
    pub fn with_transport(options: RequestOptions, transport: T) -> Self {
        Self {
            options: Arc::new(options),
            transport,
            policy: Box::new(DefaultStatusPolicy),
            completion: None,
            phase: Phase::Idle,
            retries: 0,
            execution: Timer::default(),
            network: Timer::default(),
            last_payload: None,
        }
    }

    /// Sets the completion callback.
    ///
    /// Without one, the request still finalizes but nobody is notified.
    pub fn on_complete<F>(mut self, completion: F) -> Self
    where
        F: FnOnce(Option<RequestError>, Option<Response>) + Send + 'static,
    {
        self.completion = Some(Box::new(completion));
        self
    }

    /// Replaces the default status policy.
    pub fn with_policy<P: StatusPolicy + 'static>(mut self, policy: P) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True between `execute` and the terminal completion.
    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Executing | Phase::Finalizing)
    }

    /// Retries performed beyond the first attempt.
    pub fn retries(&self) -> usize {
        self.retries
    }

    pub fn url(&self) -> String {
        build_url(
            &self.options.protocol,
            &self.options.host,
            self.options.port,
            &self.options.path,
        )
    }

    pub fn timers(&self) -> Timings {
        Timings {
            network: self.network.reading(),
            total: self.execution.reading(),
        }
    }

    /// Time since `execute` without stopping the execution timer.
    pub fn elapsed(&self) -> Option<Duration> {
        self.execution.peek()
    }

    /// Snapshot of the current timings, options and retry counters.
    pub fn response_meta(&self) -> ResponseMeta {
        ResponseMeta::snapshot(self.timers(), &self.options, self.retries)
    }

    pub fn status_code_filter(&self, status: u16) -> StatusDecision {
        self.policy.classify(status)
    }

    /// Finalizes the request and hands `(error, response)` to the callback.
    ///
    /// The callback runs at most once; later calls only keep the controller done.
    pub fn done(&mut self, error: Option<RequestError>, response: Option<Response>) {
        self.phase = Phase::Done;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            request_id = ?self.options.request_id,
            failed = error.is_some(),
            retries = self.retries,
            "request finished"
        );

        if let Some(completion) = self.completion.take() {
            completion(error, response);
        }
    }

    /// Finalizes successfully with the last attempt data.
    ///
    /// Without an explicit `meta`, the current [`RequestController::response_meta`] is used.
    pub fn resolve(&mut self, meta: Option<ResponseMeta>) {
        let meta = meta.unwrap_or_else(|| self.response_meta());
        let response = Response {
            payload: self.last_payload.take(),
            meta,
        };
        self.done(None, Some(response));
    }

    fn reject(&mut self, error: RequestError) {
        let error = error.with_meta(self.response_meta());
        self.done(Some(error), None);
    }

    fn finalize(&mut self) {
        self.execution.stop();
        self.phase = Phase::Finalizing;
    }

    fn next_step_for(&self, outcome: &Result<Payload>) -> Step {
        let decision = match outcome {
            Ok(payload) => self.policy.classify(payload.status),
            Err(error) if self.policy.retry_transport_error(error) => StatusDecision::retry(),
            Err(_) => StatusDecision::fail(),
        };
        next_step(decision, self.retries, self.options.max_retries)
    }
}

impl<T: Transport> RequestController<T> {
    /// Runs the request to completion, retrying per the status policy.
    ///
    /// The outcome is delivered to the completion callback; the returned
    /// error only reports a controller that is not idle.
    pub async fn execute(&mut self) -> Result<()> {
        if self.phase != Phase::Idle {
            #[cfg(feature = "tracing")]
            tracing::warn!(phase = %self.phase, "execute called on a non-idle controller");
            return Err(RequestError::NotIdle(self.phase));
        }

        self.phase = Phase::Executing;
        self.execution.start();
        let url = self.url();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            request_id = ?self.options.request_id,
            method = %self.options.method,
            url = %url,
            max_retries = self.options.max_retries,
            "executing request"
        );

        loop {
            self.network.reset();
            let events = AttemptEvents::new(
                &mut self.network,
                &self.execution,
                &self.options,
                self.retries,
            );
            let outcome = self.transport.attempt(&self.options, &url, events).await;
            self.network.stop();

            let step = self.next_step_for(&outcome);

            trace_attempt(&outcome, step);

            match (step, outcome) {
                (Step::Retry, _) => {
                    wait_before_retry(self.options.retry_backoff_ms, self.retries).await;
                    self.retries += 1;

                    #[cfg(feature = "tracing")]
                    tracing::debug!(meta = ?self.response_meta(), "retrying request");
                }
                (Step::Accept, Ok(payload)) => {
                    self.last_payload = Some(payload);
                    self.finalize();
                    self.resolve(None);
                    return Ok(());
                }
                (_, Ok(payload)) => {
                    let error = RequestError::http(payload.status, payload.headers, payload.body);
                    self.finalize();
                    self.reject(error);
                    return Ok(());
                }
                (_, Err(error)) => {
                    self.finalize();
                    self.reject(error);
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(feature = "tracing")]
fn trace_attempt(outcome: &Result<Payload>, step: Step) {
    match outcome {
        Ok(payload) => tracing::debug!(status = payload.status, ?step, "attempt completed"),
        Err(error) => tracing::debug!(%error, ?step, "attempt failed"),
    }
}

#[cfg(not(feature = "tracing"))]
fn trace_attempt(_outcome: &Result<Payload>, _step: Step) {}

/// Waits before the next attempt with exponential backoff.
async fn wait_before_retry(backoff_ms: u64, attempt: usize) {
    if backoff_ms == 0 {
        return;
    }
    let exp = attempt.min(16) as u32;
    let multiplier = 1u64 << exp;
    let delay_ms = backoff_ms.saturating_mul(multiplier);

    #[cfg(feature = "tracing")]
    tracing::debug!("retrying request after {} ms", delay_ms);

    sleep(Duration::from_millis(delay_ms)).await;
}
