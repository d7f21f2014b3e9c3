//! Where the collectible goes relative to the viewer.

use engine_core::{Transform, Vec3};
use rand::Rng;
use thiserror::Error;

use crate::config::PlacementConfig;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementError {
    #[error("no viewer pose available")]
    NoPose,
}

/// Viewer pose composed with a fixed local offset plus lateral jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementEngine {
    offset: Vec3,
    lateral_jitter: f32,
}

impl Default for PlacementEngine {
    fn default() -> Self {
        Self::from_config(&PlacementConfig::default())
    }
}

impl PlacementEngine {
    pub fn new(offset: Vec3, lateral_jitter: f32) -> Self {
        Self {
            offset,
            lateral_jitter: lateral_jitter.abs(),
        }
    }

    pub fn from_config(cfg: &PlacementConfig) -> Self {
        Self::new(Vec3::new(cfg.offset_x, cfg.offset_y, cfg.offset_z), cfg.lateral_jitter)
    }

    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    /// Local offset for one placement, `dx` drawn from `[-jitter, jitter)` around the base.
    pub fn local_offset<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        let j = self.lateral_jitter;
        let dx = if j > 0.0 { rng.gen_range(-j..j) } else { 0.0 };
        self.offset + Vec3::new(dx, 0.0, 0.0)
    }

    pub fn place<R: Rng + ?Sized>(&self, viewpoint: Option<Transform>, rng: &mut R) -> Result<Transform, PlacementError> {
        let viewpoint = viewpoint.ok_or(PlacementError::NoPose)?;
        let local = Transform::from_position(self.local_offset(rng));
        Ok(viewpoint.compose(&local))
    }
}
