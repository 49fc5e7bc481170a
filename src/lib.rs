//! `timed-http` drives a single logical HTTP request to exactly one completion.
//!
//! A [`RequestController`] wraps network attempts with timing instrumentation
//! and a status-driven retry policy:
//! - [`RequestController::execute`] runs attempts until accepted, rejected or out of retries
//! - [`RequestController::timers`] reports network and total elapsed time
//! - [`RequestController::response_meta`] snapshots timings, options and retry counters
//!
//! The outcome is delivered once to the callback given to
//! [`RequestController::on_complete`] as `(error, response)`.

mod controller;
mod error;
mod options;
mod policy;
mod timer;
mod transport;
mod types;

pub use controller::{build_url, Completion, Phase, RequestController};
pub use error::RequestError;
pub use options::RequestOptions;
pub use policy::{DefaultStatusPolicy, StatusDecision, StatusPolicy};
pub use timer::{Timer, TimerReading};
pub use transport::{AttemptEvents, HttpTransport, Transport};
pub use types::{Payload, Response, ResponseMeta, RetryCounters, Timings};

pub type Result<T> = std::result::Result<T, RequestError>;
