//! Start/stop stopwatch used for the network and execution timings.

use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};

/// Observed state of a [`Timer`].
///
/// The three states are distinct on purpose: consumers check for
/// [`TimerReading::Running`] to tell an in-flight (or abandoned) phase
/// from one that never began.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimerReading {
    /// The timer was never started.
    #[default]
    NotStarted,
    /// The timer was started but not stopped yet.
    Running,
    /// The timer was started and stopped.
    Elapsed(Duration),
}

impl TimerReading {
    /// Elapsed time as fractional milliseconds.
    ///
    /// Returns `None` when never started and `Some(f64::NAN)` while running.
    pub fn as_millis_f64(&self) -> Option<f64> {
        match self {
            Self::NotStarted => None,
            Self::Running => Some(f64::NAN),
            Self::Elapsed(elapsed) => Some(elapsed.as_secs_f64() * 1_000.0),
        }
    }

    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            Self::Elapsed(elapsed) => Some(*elapsed),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Elapsed(_))
    }
}

// `null` / `"running"` / milliseconds, since JSON has no NaN.
impl Serialize for TimerReading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::NotStarted => serializer.serialize_none(),
            Self::Running => serializer.serialize_str("running"),
            Self::Elapsed(elapsed) => serializer.serialize_f64(elapsed.as_secs_f64() * 1_000.0),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Timer {
    started: Option<Instant>,
    elapsed: Option<Duration>,
}

impl Timer {
    /// Starts (or restarts) the timer, discarding any previous result.
    pub fn start(&mut self) {
        self.started = Some(Instant::now());
        self.elapsed = None;
    }

    /// Stops a running timer and returns its reading.
    ///
    /// Stopping a timer that was never started leaves it untouched, and
    /// stopping twice keeps the first result.
    pub fn stop(&mut self) -> TimerReading {
        if let (Some(started), None) = (self.started, self.elapsed) {
            self.elapsed = Some(started.elapsed());
        }
        self.reading()
    }

    /// Returns the timer to the never-started state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn reading(&self) -> TimerReading {
        match (self.started, self.elapsed) {
            (None, _) => TimerReading::NotStarted,
            (Some(_), None) => TimerReading::Running,
            (Some(_), Some(elapsed)) => TimerReading::Elapsed(elapsed),
        }
    }

    /// Time since start without stopping; final value once stopped.
    pub fn peek(&self) -> Option<Duration> {
        match (self.started, self.elapsed) {
            (None, _) => None,
            (Some(started), None) => Some(started.elapsed()),
            (Some(_), Some(elapsed)) => Some(elapsed),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{Timer, TimerReading};

    #[test]
    fn fresh_timer_is_not_started() {
        let timer = Timer::default();
        assert_eq!(timer.reading(), TimerReading::NotStarted);
        assert_eq!(timer.reading().as_millis_f64(), None);
        assert_eq!(timer.peek(), None);
    }

    #[test]
    fn started_timer_reads_as_nan() {
        let mut timer = Timer::default();
        timer.start();

        assert_eq!(timer.reading(), TimerReading::Running);
        assert!(timer.reading().as_millis_f64().is_some_and(f64::is_nan));
        assert!(timer.peek().is_some());
    }

    #[test]
    fn stop_resolves_elapsed_and_is_sticky() {
        let mut timer = Timer::default();
        timer.start();
        std::thread::sleep(Duration::from_millis(2));

        let first = timer.stop();
        let second = timer.stop();

        let elapsed = first.elapsed().expect("stopped timer must have a value");
        assert!(elapsed >= Duration::from_millis(2));
        assert_eq!(first, second);
        assert!(first.as_millis_f64().is_some_and(|ms| ms >= 2.0));
    }

    #[test]
    fn stop_without_start_is_a_no_op() {
        let mut timer = Timer::default();
        assert_eq!(timer.stop(), TimerReading::NotStarted);
    }

    #[test]
    fn independent_timers_do_not_interfere() {
        let mut network = Timer::default();
        let mut total = Timer::default();
        total.start();
        network.start();
        network.stop();

        assert!(network.reading().is_resolved());
        assert_eq!(total.reading(), TimerReading::Running);
    }

    #[test]
    fn restart_and_reset_clear_previous_result() {
        let mut timer = Timer::default();
        timer.start();
        timer.stop();
        timer.start();
        assert_eq!(timer.reading(), TimerReading::Running);

        timer.reset();
        assert_eq!(timer.reading(), TimerReading::NotStarted);
    }

    #[test]
    fn reading_serializes_without_nan() {
        assert_eq!(
            serde_json::to_value(TimerReading::NotStarted).unwrap(),
            serde_json::Value::Null
        );
        assert_eq!(
            serde_json::to_value(TimerReading::Running).unwrap(),
            serde_json::json!("running")
        );
        assert_eq!(
            serde_json::to_value(TimerReading::Elapsed(Duration::from_millis(12))).unwrap(),
            serde_json::json!(12.0)
        );
    }
}
