//! ECS components for spawned collectibles.

use serde::{Deserialize, Serialize};

/// Model reference component - links an entity to the asset it renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInstance {
    /// Asset path understood by the renderer (e.g. `treasure_chest.glb`).
    pub model_ref: String,
    /// Uniform scale so the model's largest extent equals this many metres.
    #[serde(default = "default_scale_to_units")]
    pub scale_to_units: f32,
}

fn default_scale_to_units() -> f32 {
    0.5
}

impl ModelInstance {
    pub fn new(model_ref: impl Into<String>, scale_to_units: f32) -> Self {
        Self {
            model_ref: model_ref.into(),
            scale_to_units,
        }
    }
}

impl Default for ModelInstance {
    fn default() -> Self {
        Self::new("treasure_chest.glb", default_scale_to_units())
    }
}

/// Whether tap events on the entity are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Touchable {
    pub enabled: bool,
}

impl Touchable {
    pub fn enabled() -> Self {
        Self { enabled: true }
    }
}

impl Default for Touchable {
    fn default() -> Self {
        Self::enabled()
    }
}

/// Animation playback state for a spawned model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnimationState {
    /// Posed at frame zero (animation stopped on spawn).
    #[default]
    Stopped,
    /// Playing clip `index` once.
    PlayingOnce { index: usize },
}

/// Component storing the animation state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Animation {
    pub state: AnimationState,
}

impl Animation {
    pub fn play_once(&mut self, index: usize) {
        self.state = AnimationState::PlayingOnce { index };
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, AnimationState::PlayingOnce { .. })
    }
}
