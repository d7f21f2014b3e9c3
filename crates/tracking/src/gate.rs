//! Readiness gate: hold spawning until the tracker reports a usable pose.
//!
//! The gate polls on a fixed interval, first poll immediate. Every poll that
//! is not `Tracking` invokes the caller's waiting callback (the UI turns this
//! into a short "still acquiring" notice). Waiting stops on the first
//! `Tracking` poll, on cancellation, or when the optional deadline elapses.
//! With no deadline the wait is unbounded; only cancellation ends it.

use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, MissedTickBehavior};

use crate::cancel::CancelToken;
use crate::tracker::{Tracker, TrackingStatus};

/// Smallest poll interval accepted; zero would spin.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Waiting,
    Ready,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("tracking wait cancelled")]
    Cancelled,
    #[error("tracking not acquired within {waited:?}")]
    TimedOut { waited: Duration },
}

/// Outcome of a successful wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateReport {
    /// Polls that came back not ready.
    pub polls: u32,
    pub waited: Duration,
}

#[derive(Debug, Clone)]
pub struct ReadinessGate {
    poll_interval: Duration,
    deadline: Option<Duration>,
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), None)
    }
}

impl ReadinessGate {
    pub fn new(poll_interval: Duration, deadline: Option<Duration>) -> Self {
        Self {
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
            deadline,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Single poll, no waiting.
    pub fn check(&self, tracker: &dyn Tracker) -> GateState {
        if tracker.tracking_status().is_tracking() {
            GateState::Ready
        } else {
            GateState::Waiting
        }
    }

    /// Wait until `Ready`.
    ///
    /// `on_waiting` is called once per not-ready poll and never after
    /// cancellation has been observed.
    pub async fn wait<F>(
        &self,
        tracker: &dyn Tracker,
        cancel: &CancelToken,
        mut on_waiting: F,
    ) -> Result<GateReport, GateError>
    where
        F: FnMut(TrackingStatus) + Send,
    {
        let started = Instant::now();
        let deadline = self.deadline.map(|d| started + d);
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut polls = 0u32;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    log::debug!("Readiness gate cancelled after {} polls", polls);
                    return Err(GateError::Cancelled);
                }
                _ = sleep_until_opt(deadline) => {
                    let waited = started.elapsed();
                    log::warn!("Tracking not acquired after {:?} ({} polls)", waited, polls);
                    return Err(GateError::TimedOut { waited });
                }
                _ = ticker.tick() => {}
            }

            let status = tracker.tracking_status();
            if status.is_tracking() {
                let waited = started.elapsed();
                log::info!("Tracking acquired after {:?} ({} polls waiting)", waited, polls);
                return Ok(GateReport { polls, waited });
            }
            if cancel.is_cancelled() {
                return Err(GateError::Cancelled);
            }
            polls += 1;
            log::debug!("Tracking status {} on poll {}", status.name(), polls);
            on_waiting(status);
        }
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::ScriptedTracker;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn ready_immediately_needs_no_notices() {
        let tracker = ScriptedTracker::tracking();
        let gate = ReadinessGate::default();
        let mut notices = 0;
        let report = gate.wait(&tracker, &CancelToken::new(), |_| notices += 1).await.unwrap();
        assert_eq!(report.polls, 0);
        assert_eq!(notices, 0);
        assert_eq!(report.waited, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn polls_once_per_interval_until_tracking() {
        let tracker = ScriptedTracker::new([
            TrackingStatus::Acquiring,
            TrackingStatus::Acquiring,
            TrackingStatus::Lost,
            TrackingStatus::Tracking,
        ]);
        let gate = ReadinessGate::new(Duration::from_secs(1), None);
        let mut seen = Vec::new();
        let report = gate
            .wait(&tracker, &CancelToken::new(), |s| seen.push(s))
            .await
            .unwrap();
        assert_eq!(report.polls, 3);
        assert_eq!(report.waited, Duration::from_secs(3));
        assert_eq!(
            seen,
            vec![TrackingStatus::Acquiring, TrackingStatus::Acquiring, TrackingStatus::Lost]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_times_out() {
        let tracker = ScriptedTracker::new([TrackingStatus::Acquiring]);
        let gate = ReadinessGate::new(Duration::from_secs(1), Some(Duration::from_millis(4500)));
        let err = gate.wait(&tracker, &CancelToken::new(), |_| {}).await.unwrap_err();
        assert_eq!(err, GateError::TimedOut { waited: Duration::from_millis(4500) });
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_notices() {
        let tracker = Arc::new(ScriptedTracker::new([TrackingStatus::Acquiring]));
        let cancel = CancelToken::new();
        let notices = Arc::new(AtomicU32::new(0));

        let task = {
            let tracker = tracker.clone();
            let cancel = cancel.clone();
            let notices = notices.clone();
            tokio::spawn(async move {
                ReadinessGate::default()
                    .wait(tracker.as_ref(), &cancel, |_| {
                        notices.fetch_add(1, Ordering::SeqCst);
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(2500)).await;
        cancel.cancel();
        assert_eq!(task.await.unwrap(), Err(GateError::Cancelled));
        let at_cancel = notices.load(Ordering::SeqCst);
        assert_eq!(at_cancel, 3);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(notices.load(Ordering::SeqCst), at_cancel);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let gate = ReadinessGate::new(Duration::ZERO, None);
        assert_eq!(gate.poll_interval(), MIN_POLL_INTERVAL);
        assert_eq!(gate.check(&ScriptedTracker::tracking()), GateState::Ready);
    }
}
