//! Scripted tracker for headless runs and tests.

use std::collections::VecDeque;

use engine_core::Transform;
use parking_lot::Mutex;

use crate::tracker::{Tracker, TrackingStatus};

/// Replays a status script, one entry per `tracking_status` call; the last
/// entry repeats forever.
#[derive(Debug)]
pub struct ScriptedTracker {
    script: Mutex<VecDeque<TrackingStatus>>,
    pose: Mutex<Option<Transform>>,
}

impl ScriptedTracker {
    pub fn new(script: impl IntoIterator<Item = TrackingStatus>) -> Self {
        let mut script: VecDeque<_> = script.into_iter().collect();
        if script.is_empty() {
            script.push_back(TrackingStatus::Acquiring);
        }
        Self {
            script: Mutex::new(script),
            pose: Mutex::new(Some(Transform::default())),
        }
    }

    /// Tracking from the first poll, viewer at the origin.
    pub fn tracking() -> Self {
        Self::new([TrackingStatus::Tracking])
    }

    /// `acquiring_polls` not-ready polls, then tracking.
    pub fn after(acquiring_polls: usize) -> Self {
        let mut script = vec![TrackingStatus::Acquiring; acquiring_polls];
        script.push(TrackingStatus::Tracking);
        Self::new(script)
    }

    pub fn with_pose(self, pose: Option<Transform>) -> Self {
        *self.pose.lock() = pose;
        self
    }

    pub fn set_pose(&self, pose: Option<Transform>) {
        *self.pose.lock() = pose;
    }
}

impl Tracker for ScriptedTracker {
    fn current_pose(&self) -> Option<Transform> {
        *self.pose.lock()
    }

    fn tracking_status(&self) -> TrackingStatus {
        let mut script = self.script.lock();
        if script.len() > 1 {
            script.pop_front().unwrap_or_default()
        } else {
            script.front().copied().unwrap_or_default()
        }
    }
}
