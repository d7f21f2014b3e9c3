//! Instrumented collaborators for session tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use catalog::{
    CatalogError, CatalogStore, MemoryCatalog, SubZone, SubZoneId, Treasure, TreasureId, Zone, ZoneId,
};
use engine_core::{ModelInstance, Transform};
use parking_lot::Mutex;
use tracking::{ScriptedTracker, Tracker, TrackingStatus};

use crate::notice::{Notice, Notifier};
use crate::scene::{Scene, SceneHandle, WorldScene};

/// Zone W15 with sub-zone Lab (7): treasure 1 uncollected, 2 collected.
pub fn lab_catalog() -> MemoryCatalog {
    let c = MemoryCatalog::new();
    c.insert_zone(Zone::new(1, "W15", "Engineering Hall"));
    c.insert_sub_zone(SubZone::new(7, 1, "Lab")).unwrap();
    c.insert_treasure(Treasure::new(1, 7, "Brass Compass").with_image("compass.png")).unwrap();
    c.insert_treasure(Treasure::new(2, 7, "Old Key").collected(true)).unwrap();
    c
}

/// Counts `mark_collected` calls and fails the first `failures` of them.
pub struct CountingCatalog {
    pub inner: MemoryCatalog,
    pub writes: AtomicUsize,
    failures: AtomicUsize,
}

impl CountingCatalog {
    pub fn new(inner: MemoryCatalog) -> Self {
        Self::failing(inner, 0)
    }

    pub fn failing(inner: MemoryCatalog, failures: usize) -> Self {
        Self {
            inner,
            writes: AtomicUsize::new(0),
            failures: AtomicUsize::new(failures),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl CatalogStore for CountingCatalog {
    fn list_zones(&self) -> Vec<Zone> {
        self.inner.list_zones()
    }

    fn list_sub_zones(&self, zone_id: ZoneId) -> Vec<SubZone> {
        self.inner.list_sub_zones(zone_id)
    }

    fn list_treasures(&self, sub_zone_id: SubZoneId) -> Vec<Treasure> {
        self.inner.list_treasures(sub_zone_id)
    }

    fn treasure(&self, id: TreasureId) -> Option<Treasure> {
        self.inner.treasure(id)
    }

    fn treasure_by_name(&self, name: &str) -> Option<Treasure> {
        self.inner.treasure_by_name(name)
    }

    fn uncollected(&self, scope: Option<SubZoneId>) -> Vec<Treasure> {
        self.inner.uncollected(scope)
    }

    fn count_treasures(&self, sub_zone_id: SubZoneId) -> usize {
        self.inner.count_treasures(sub_zone_id)
    }

    fn count_collected(&self, sub_zone_id: SubZoneId) -> usize {
        self.inner.count_collected(sub_zone_id)
    }

    fn count_total_treasures(&self) -> usize {
        self.inner.count_total_treasures()
    }

    fn count_total_collected(&self) -> usize {
        self.inner.count_total_collected()
    }

    fn mark_collected(&self, id: TreasureId) -> catalog::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(CatalogError::Io {
                path: "treasure.ron".into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            });
        }
        self.inner.mark_collected(id)
    }
}

/// Scripted tracker that counts status polls.
pub struct CountingTracker {
    inner: ScriptedTracker,
    pub polls: AtomicUsize,
}

impl CountingTracker {
    pub fn new(inner: ScriptedTracker) -> Self {
        Self { inner, polls: AtomicUsize::new(0) }
    }

    pub fn never_ready() -> Self {
        Self::new(ScriptedTracker::new([TrackingStatus::Acquiring]))
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

impl Tracker for CountingTracker {
    fn current_pose(&self) -> Option<Transform> {
        self.inner.current_pose()
    }

    fn tracking_status(&self) -> TrackingStatus {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.inner.tracking_status()
    }
}

/// `WorldScene` plus call counters.
#[derive(Default)]
pub struct RecordingScene {
    pub world: WorldScene,
    pub instantiated: AtomicUsize,
    pub destroyed: AtomicUsize,
}

impl RecordingScene {
    pub fn instantiated(&self) -> usize {
        self.instantiated.load(Ordering::SeqCst)
    }
}

impl Scene for RecordingScene {
    fn instantiate(&self, transform: Transform, model: &ModelInstance) -> SceneHandle {
        self.instantiated.fetch_add(1, Ordering::SeqCst);
        self.world.instantiate(transform, model)
    }

    fn set_touchable(&self, handle: SceneHandle, touchable: bool) {
        self.world.set_touchable(handle, touchable)
    }

    fn play_reveal(&self, handle: SceneHandle) {
        self.world.play_reveal(handle)
    }

    fn destroy(&self, handle: SceneHandle) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        self.world.destroy(handle)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn count(&self, notice: &Notice) -> usize {
        self.notices.lock().iter().filter(|n| *n == notice).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

/// Everything a session test inspects afterwards.
pub struct Rig {
    pub catalog: Arc<CountingCatalog>,
    pub tracker: Arc<CountingTracker>,
    pub scene: Arc<RecordingScene>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Rig {
    pub fn new(catalog: CountingCatalog, tracker: CountingTracker) -> Self {
        Self {
            catalog: Arc::new(catalog),
            tracker: Arc::new(tracker),
            scene: Arc::new(RecordingScene::default()),
            notifier: Arc::new(RecordingNotifier::default()),
        }
    }

    pub fn context(&self) -> crate::session::SessionContext {
        crate::session::SessionContext {
            catalog: self.catalog.clone(),
            tracker: self.tracker.clone(),
            scene: self.scene.clone(),
            notifier: self.notifier.clone(),
        }
    }
}
