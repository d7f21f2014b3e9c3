//! Tracking collaborator interface.

use engine_core::Transform;

/// Tracking quality reported by the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrackingStatus {
    /// Still building a map of the surroundings.
    #[default]
    Acquiring,
    /// Pose is usable.
    Tracking,
    /// Tracking was lost after having been acquired.
    Lost,
}

impl TrackingStatus {
    pub fn is_tracking(&self) -> bool {
        *self == TrackingStatus::Tracking
    }

    pub fn name(&self) -> &'static str {
        match self {
            TrackingStatus::Acquiring => "ACQUIRING",
            TrackingStatus::Tracking => "TRACKING",
            TrackingStatus::Lost => "LOST",
        }
    }
}

/// The device's pose tracker. Calls are cheap, synchronous snapshots.
pub trait Tracker: Send + Sync {
    /// Viewpoint pose right now, if one can be produced.
    fn current_pose(&self) -> Option<Transform>;

    fn tracking_status(&self) -> TrackingStatus;
}
