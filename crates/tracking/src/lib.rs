//! Spatial tracking seam and the readiness gate that waits on it.

pub mod cancel;
pub mod gate;
pub mod scripted;
pub mod tracker;

pub use cancel::*;
pub use gate::*;
pub use scripted::*;
pub use tracker::*;
