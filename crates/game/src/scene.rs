//! Rendering collaborator seam and a headless ECS-backed scene.

use engine_core::{Animation, ModelInstance, Touchable, Transform};
use hecs::{Entity, World};
use parking_lot::Mutex;

/// Opaque id of an instantiated collectible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneHandle(pub u64);

/// Clip played when the chest opens.
pub const REVEAL_CLIP: usize = 0;

/// What the session needs from the renderer. Calls are cheap and non-blocking.
pub trait Scene: Send + Sync {
    /// Load `model` at `transform`, posed at frame zero and touchable.
    fn instantiate(&self, transform: Transform, model: &ModelInstance) -> SceneHandle;

    fn set_touchable(&self, handle: SceneHandle, touchable: bool);

    fn play_reveal(&self, handle: SceneHandle);

    /// Unknown or already destroyed handles are ignored.
    fn destroy(&self, handle: SceneHandle);
}

/// Headless scene: one `hecs` entity per collectible.
#[derive(Default)]
pub struct WorldScene {
    world: Mutex<World>,
}

fn entity(handle: SceneHandle) -> Option<Entity> {
    Entity::from_bits(handle.0)
}

impl WorldScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulated tap. Returns true only for a live, touchable entity; the
    /// caller forwards it to `Session::on_interaction`.
    pub fn tap(&self, handle: SceneHandle) -> bool {
        let Some(e) = entity(handle) else {
            return false;
        };
        let world = self.world.lock();
        let touchable = world.get::<&Touchable>(e).map(|t| t.enabled).unwrap_or(false);
        touchable
    }

    pub fn transform_of(&self, handle: SceneHandle) -> Option<Transform> {
        let e = entity(handle)?;
        let world = self.world.lock();
        let t = world.get::<&Transform>(e).ok().map(|t| *t);
        t
    }

    pub fn is_revealing(&self, handle: SceneHandle) -> bool {
        let Some(e) = entity(handle) else {
            return false;
        };
        let world = self.world.lock();
        let playing = world.get::<&Animation>(e).map(|a| a.is_playing()).unwrap_or(false);
        playing
    }

    /// Live collectibles.
    pub fn len(&self) -> usize {
        self.world.lock().len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Scene for WorldScene {
    fn instantiate(&self, transform: Transform, model: &ModelInstance) -> SceneHandle {
        let e = self
            .world
            .lock()
            .spawn((transform, model.clone(), Touchable::enabled(), Animation::default()));
        log::debug!("Spawned {} at {:?}", model.model_ref, transform.position);
        SceneHandle(e.to_bits().get())
    }

    fn set_touchable(&self, handle: SceneHandle, touchable: bool) {
        let Some(e) = entity(handle) else { return };
        if let Ok(mut t) = self.world.lock().get::<&mut Touchable>(e) {
            t.enabled = touchable;
        }
    }

    fn play_reveal(&self, handle: SceneHandle) {
        let Some(e) = entity(handle) else { return };
        if let Ok(mut a) = self.world.lock().get::<&mut Animation>(e) {
            a.play_once(REVEAL_CLIP);
        }
    }

    fn destroy(&self, handle: SceneHandle) {
        if let Some(e) = entity(handle) {
            self.world.lock().despawn(e).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tap_respects_touchable() {
        let scene = WorldScene::new();
        let h = scene.instantiate(Transform::from_translation(0.1, -0.5, -0.8), &ModelInstance::default());
        assert!(scene.tap(h));
        scene.set_touchable(h, false);
        assert!(!scene.tap(h));
    }

    #[test]
    fn reveal_and_destroy() {
        let scene = WorldScene::new();
        let h = scene.instantiate(Transform::default(), &ModelInstance::default());
        assert!(!scene.is_revealing(h));
        scene.play_reveal(h);
        assert!(scene.is_revealing(h));
        assert_eq!(scene.len(), 1);
        scene.destroy(h);
        scene.destroy(h);
        assert!(scene.is_empty());
        assert!(!scene.tap(h));
        assert!(scene.transform_of(h).is_none());
    }

    #[test]
    fn transform_is_kept() {
        let scene = WorldScene::new();
        let t = Transform::from_translation(1.0, 2.0, 3.0);
        let h = scene.instantiate(t, &ModelInstance::default());
        assert_eq!(scene.transform_of(h), Some(t));
    }
}
