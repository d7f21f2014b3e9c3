//! One hunt: select a treasure, wait for tracking, place it, collect it.
//!
//! `run()` drives the awaited transitions. The guard transitions
//! (`try_spawn`, `on_interaction`, `acknowledge`, `cancel`) are synchronous
//! and may be called from any thread; each checks and sets the phase under
//! one lock, so duplicate triggers are no-ops. The phase lock is never held
//! across an await.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use catalog::{CatalogStore, SubZoneId, Treasure};
use engine_core::{ModelInstance, Transform};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use thiserror::Error;
use tokio::sync::watch;
use tracking::{CancelToken, GateError, GateState, ReadinessGate, Tracker};

use crate::config::{GameConfig, SessionConfig};
use crate::notice::{Notice, Notifier, RevealCard};
use crate::placement::PlacementEngine;
use crate::scene::{Scene, SceneHandle};
use crate::selection::{SelectionMiss, SelectionPolicy};

/// Collaborators a session runs against. The host builds these once and
/// shares the catalog between sessions.
#[derive(Clone)]
pub struct SessionContext {
    pub catalog: Arc<dyn CatalogStore>,
    pub tracker: Arc<dyn Tracker>,
    pub scene: Arc<dyn Scene>,
    pub notifier: Arc<dyn Notifier>,
}

/// The spawned collectible. Lives only as long as the session.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRecord {
    pub treasure: Treasure,
    pub placement: Transform,
    pub handle: SceneHandle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    NothingLeft,
    NotFound { name: String },
    ScopeExhausted { sub_zone_id: SubZoneId },
    NoPose,
    TrackingTimeout,
    Cancelled,
}

impl From<SelectionMiss> for AbortReason {
    fn from(miss: SelectionMiss) -> Self {
        match miss {
            SelectionMiss::NotFound { name } => AbortReason::NotFound { name },
            SelectionMiss::NothingLeft => AbortReason::NothingLeft,
            SelectionMiss::ScopeExhausted { sub_zone_id } => AbortReason::ScopeExhausted { sub_zone_id },
        }
    }
}

/// Observable phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseKind {
    Idle,
    Selecting,
    AwaitingTracking,
    Spawned,
    Collecting,
    Collected,
    Done,
    Aborted(AbortReason),
}

impl PhaseKind {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PhaseKind::Done | PhaseKind::Aborted(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Completed { treasure: Treasure },
    Aborted(AbortReason),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("session already started")]
    AlreadyStarted,
}

/// Result of [`Session::try_spawn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnAttempt {
    Spawned(SceneHandle),
    /// Another trigger got there first.
    AlreadyClaimed,
    NoPose,
    /// The tracker is not reporting a usable pose yet; try again later.
    NotReady,
    /// Not waiting for tracking (not started, or ended).
    Inactive,
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Selecting,
    AwaitingTracking { treasure: Treasure },
    /// Placement in flight; reported as `AwaitingTracking`.
    Placing { treasure: Treasure },
    Spawned(SpawnRecord),
    Collecting(SpawnRecord),
    Collected(SpawnRecord),
    Done,
    Aborted(AbortReason),
}

impl Phase {
    fn kind(&self) -> PhaseKind {
        match self {
            Phase::Idle => PhaseKind::Idle,
            Phase::Selecting => PhaseKind::Selecting,
            Phase::AwaitingTracking { .. } | Phase::Placing { .. } => PhaseKind::AwaitingTracking,
            Phase::Spawned(_) => PhaseKind::Spawned,
            Phase::Collecting(_) => PhaseKind::Collecting,
            Phase::Collected(_) => PhaseKind::Collected,
            Phase::Done => PhaseKind::Done,
            Phase::Aborted(reason) => PhaseKind::Aborted(reason.clone()),
        }
    }

    fn record(&self) -> Option<&SpawnRecord> {
        match self {
            Phase::Spawned(r) | Phase::Collecting(r) | Phase::Collected(r) => Some(r),
            _ => None,
        }
    }
}

struct Shared {
    ctx: SessionContext,
    config: SessionConfig,
    policy: SelectionPolicy,
    placement: PlacementEngine,
    gate: ReadinessGate,
    model: ModelInstance,
    rng: Mutex<StdRng>,
    started: AtomicBool,
    phase: Mutex<Phase>,
    phase_tx: watch::Sender<PhaseKind>,
    cancel: CancelToken,
}

/// Observed cancellation inside `run`.
struct Cancelled;

#[derive(Clone)]
pub struct Session {
    shared: Arc<Shared>,
}

impl Session {
    pub fn new(ctx: SessionContext, policy: SelectionPolicy, config: &GameConfig, rng: StdRng) -> Self {
        let (phase_tx, _) = watch::channel(PhaseKind::Idle);
        Self {
            shared: Arc::new(Shared {
                ctx,
                config: config.session.clone(),
                policy,
                placement: PlacementEngine::from_config(&config.placement),
                gate: ReadinessGate::new(config.session.poll_interval(), config.session.tracking_timeout()),
                model: config.model.clone(),
                rng: Mutex::new(rng),
                started: AtomicBool::new(false),
                phase: Mutex::new(Phase::Idle),
                phase_tx,
                cancel: CancelToken::new(),
            }),
        }
    }

    pub fn phase(&self) -> PhaseKind {
        self.shared.phase.lock().kind()
    }

    pub fn subscribe(&self) -> watch::Receiver<PhaseKind> {
        self.shared.phase_tx.subscribe()
    }

    /// The spawned collectible, while there is one.
    pub fn spawn_record(&self) -> Option<SpawnRecord> {
        self.shared.phase.lock().record().cloned()
    }

    /// Drive the session to its end. Callable once.
    pub async fn run(&self) -> Result<SessionOutcome, SessionError> {
        if self.shared.started.swap(true, Ordering::SeqCst) {
            return Err(SessionError::AlreadyStarted);
        }
        {
            let mut phase = self.shared.phase.lock();
            match &*phase {
                Phase::Idle => self.transition(&mut phase, Phase::Selecting),
                Phase::Aborted(reason) => return Ok(SessionOutcome::Aborted(reason.clone())),
                _ => return Err(SessionError::AlreadyStarted),
            }
        }
        Ok(self.drive().await)
    }

    async fn drive(&self) -> SessionOutcome {
        let cfg = &self.shared.config;

        if self.sleep(cfg.settle_delay()).await.is_err() {
            return self.settle_cancelled(None);
        }

        let shared = self.shared.clone();
        let selected = blocking(move || {
            let mut rng = shared.rng.lock();
            shared.policy.select(shared.ctx.catalog.as_ref(), &mut *rng)
        })
        .await;
        if self.shared.cancel.is_cancelled() {
            return self.settle_cancelled(None);
        }
        let treasure = match selected {
            Ok(selection) => selection.treasure,
            Err(miss) => {
                let notice = miss.notice();
                return self.abort_with_notice(miss.into(), notice).await;
            }
        };

        {
            let mut phase = self.shared.phase.lock();
            if !matches!(*phase, Phase::Selecting) {
                drop(phase);
                return self.settle_cancelled(None);
            }
            self.transition(&mut phase, Phase::AwaitingTracking { treasure: treasure.clone() });
        }

        loop {
            match self.await_tracking().await {
                Ok(true) => match self.try_spawn() {
                    SpawnAttempt::Spawned(_) => break,
                    // Tracking dropped after the gate opened, or another trigger is still placing.
                    SpawnAttempt::NotReady | SpawnAttempt::AlreadyClaimed => {
                        if self.sleep(cfg.poll_interval()).await.is_err() {
                            return self.settle_cancelled(None);
                        }
                    }
                    SpawnAttempt::NoPose => return SessionOutcome::Aborted(AbortReason::NoPose),
                    SpawnAttempt::Inactive => return self.settle_cancelled(None),
                },
                Ok(false) => break,
                Err(GateError::Cancelled) => return self.settle_cancelled(None),
                Err(GateError::TimedOut { waited }) => {
                    log::warn!("Giving up on {:?} after {:?} without tracking", treasure.name, waited);
                    return self
                        .abort_with_notice(AbortReason::TrackingTimeout, Notice::TrackingTimedOut)
                        .await;
                }
            }
        }

        // Spawned; wait for the player to touch it.
        let record = {
            let mut rx = self.subscribe();
            let reached = tokio::select! {
                biased;
                _ = self.shared.cancel.cancelled() => Err(Cancelled),
                _ = wait_phase(&mut rx, |k| matches!(k, PhaseKind::Collecting) || k.is_terminal()) => Ok(()),
            };
            if reached.is_err() {
                return self.settle_cancelled(None);
            }
            let phase = self.shared.phase.lock().clone();
            match phase {
                Phase::Collecting(record) => record,
                Phase::Aborted(reason) => return SessionOutcome::Aborted(reason),
                _ => return self.settle_cancelled(None),
            }
        };

        if self.write_collected(&record).await.is_err() {
            return self.settle_cancelled(None);
        }

        self.shared.ctx.scene.play_reveal(record.handle);
        if self.sleep(cfg.reveal_delay()).await.is_err() {
            return self.settle_cancelled(None);
        }
        {
            let mut phase = self.shared.phase.lock();
            if !matches!(*phase, Phase::Collecting(_)) {
                drop(phase);
                return self.settle_cancelled(None);
            }
            self.transition(&mut phase, Phase::Collected(record.clone()));
        }
        self.shared
            .ctx
            .notifier
            .notify(Notice::Revealed(RevealCard::new(&record.treasure)));

        let mut rx = self.subscribe();
        let acknowledged = tokio::select! {
            biased;
            _ = self.shared.cancel.cancelled() => Err(Cancelled),
            _ = wait_phase(&mut rx, PhaseKind::is_terminal) => Ok(()),
        };
        if acknowledged.is_err() {
            return self.settle_cancelled(Some(&record.treasure));
        }
        if cfg.close_host_on_done {
            self.shared.ctx.notifier.notify(Notice::CloseHost);
        }
        log::info!("Session complete: collected {:?}", record.treasure.name);
        SessionOutcome::Completed { treasure: record.treasure }
    }

    /// `Ok(true)` when the gate opened, `Ok(false)` when the phase moved on
    /// (another trigger spawned, or the session ended).
    async fn await_tracking(&self) -> Result<bool, GateError> {
        let notifier = self.shared.ctx.notifier.clone();
        let mut rx = self.subscribe();
        tokio::select! {
            biased;
            _ = wait_phase(&mut rx, |k| *k != PhaseKind::AwaitingTracking) => Ok(false),
            report = self.shared.gate.wait(self.shared.ctx.tracker.as_ref(), &self.shared.cancel, move |_| {
                notifier.notify(Notice::StillAcquiring)
            }) => report.map(|r| {
                log::debug!("Gate open after {} polls", r.polls);
                true
            }),
        }
    }

    /// Persist the collection, retrying with capped backoff. Nothing is
    /// written once cancellation has been observed.
    async fn write_collected(&self, record: &SpawnRecord) -> Result<(), Cancelled> {
        let mut attempt = 0u32;
        loop {
            if self.shared.cancel.is_cancelled() {
                return Err(Cancelled);
            }
            let store = self.shared.ctx.catalog.clone();
            let id = record.treasure.id;
            match blocking(move || store.mark_collected(id)).await {
                Ok(()) => {
                    log::info!("Collected treasure {} ({:?})", id, record.treasure.name);
                    return Ok(());
                }
                Err(e) => {
                    attempt += 1;
                    let backoff = self.shared.config.write_backoff(attempt);
                    log::warn!("Collection write failed (attempt {}): {}; retrying in {:?}", attempt, e, backoff);
                    self.sleep(backoff).await?;
                }
            }
        }
    }

    /// Claim the spawn and place the collectible. Safe to call from any
    /// number of triggers; only the first one in `AwaitingTracking` with the
    /// tracker reporting `Tracking` spawns. A claim made before that is given
    /// back and the call returns `NotReady`.
    pub fn try_spawn(&self) -> SpawnAttempt {
        let treasure = {
            let mut phase = self.shared.phase.lock();
            match &*phase {
                Phase::AwaitingTracking { treasure } => {
                    let treasure = treasure.clone();
                    *phase = Phase::Placing { treasure: treasure.clone() };
                    treasure
                }
                Phase::Idle | Phase::Selecting | Phase::Aborted(_) => return SpawnAttempt::Inactive,
                _ => return SpawnAttempt::AlreadyClaimed,
            }
        };

        if self.shared.gate.check(self.shared.ctx.tracker.as_ref()) != GateState::Ready {
            let mut phase = self.shared.phase.lock();
            if !matches!(*phase, Phase::Placing { .. }) {
                return SpawnAttempt::Inactive;
            }
            // Same kind as `Placing`, nothing to publish.
            *phase = Phase::AwaitingTracking { treasure };
            return SpawnAttempt::NotReady;
        }

        let pose = self.shared.ctx.tracker.current_pose();
        let placed = {
            let mut rng = self.shared.rng.lock();
            self.shared.placement.place(pose, &mut *rng)
        };

        let mut phase = self.shared.phase.lock();
        let still_placing = matches!(*phase, Phase::Placing { .. });
        let placement = match placed {
            Ok(t) => t,
            Err(e) => {
                if !still_placing {
                    return SpawnAttempt::Inactive;
                }
                log::warn!("Cannot place {:?}: {}", treasure.name, e);
                self.transition(&mut phase, Phase::Aborted(AbortReason::NoPose));
                return SpawnAttempt::NoPose;
            }
        };
        drop(phase);

        let handle = self.shared.ctx.scene.instantiate(placement, &self.shared.model);

        let mut phase = self.shared.phase.lock();
        if !matches!(*phase, Phase::Placing { .. }) {
            drop(phase);
            self.shared.ctx.scene.destroy(handle);
            return SpawnAttempt::Inactive;
        }
        log::info!("Spawned {:?} at {:?}", treasure.name, placement.position);
        self.transition(&mut phase, Phase::Spawned(SpawnRecord { treasure, placement, handle }));
        drop(phase);
        self.shared.ctx.notifier.notify(Notice::TreasureSpotted);
        SpawnAttempt::Spawned(handle)
    }

    /// Touch on a scene object. Only the first touch on the spawned handle counts.
    pub fn on_interaction(&self, handle: SceneHandle) -> bool {
        let mut phase = self.shared.phase.lock();
        let record = match &*phase {
            Phase::Spawned(record) if record.handle == handle => record.clone(),
            _ => return false,
        };
        self.shared.ctx.scene.set_touchable(handle, false);
        self.transition(&mut phase, Phase::Collecting(record));
        true
    }

    /// Player dismissed the reveal card.
    pub fn acknowledge(&self) -> bool {
        let mut phase = self.shared.phase.lock();
        let handle = match &*phase {
            Phase::Collected(record) => record.handle,
            _ => return false,
        };
        self.shared.ctx.scene.destroy(handle);
        self.transition(&mut phase, Phase::Done);
        true
    }

    pub fn cancel(&self) {
        self.shared.cancel.cancel();
        self.settle_cancelled(None);
    }

    /// Release whatever the session holds and end it. Idempotent.
    fn settle_cancelled(&self, collected: Option<&Treasure>) -> SessionOutcome {
        let mut phase = self.shared.phase.lock();
        match &*phase {
            Phase::Done => {
                return match collected {
                    Some(t) => SessionOutcome::Completed { treasure: t.clone() },
                    None => SessionOutcome::Aborted(AbortReason::Cancelled),
                }
            }
            Phase::Aborted(reason) => return SessionOutcome::Aborted(reason.clone()),
            Phase::Collected(record) => {
                let treasure = record.treasure.clone();
                self.shared.ctx.scene.destroy(record.handle);
                self.transition(&mut phase, Phase::Done);
                return SessionOutcome::Completed { treasure };
            }
            Phase::Spawned(record) | Phase::Collecting(record) => {
                self.shared.ctx.scene.destroy(record.handle);
            }
            _ => {}
        }
        log::info!("Session cancelled in {:?}", phase.kind());
        self.transition(&mut phase, Phase::Aborted(AbortReason::Cancelled));
        SessionOutcome::Aborted(AbortReason::Cancelled)
    }

    /// Terminal miss: show the notice, hold it, then ask the host to close.
    async fn abort_with_notice(&self, reason: AbortReason, notice: Notice) -> SessionOutcome {
        {
            let mut phase = self.shared.phase.lock();
            if phase.kind().is_terminal() {
                drop(phase);
                return self.settle_cancelled(None);
            }
            self.transition(&mut phase, Phase::Aborted(reason.clone()));
        }
        log::info!("Session aborted: {:?}", reason);
        let notifier = &self.shared.ctx.notifier;
        notifier.notify(notice);
        if self.sleep(self.shared.config.terminal_notice()).await.is_ok() {
            notifier.notify(Notice::CloseHost);
        }
        SessionOutcome::Aborted(reason)
    }

    fn transition(&self, phase: &mut Phase, next: Phase) {
        log::debug!("Session phase {:?} -> {:?}", phase.kind(), next.kind());
        *phase = next;
        self.shared.phase_tx.send_replace(phase.kind());
    }

    async fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        tokio::select! {
            biased;
            _ = self.shared.cancel.cancelled() => Err(Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}

async fn wait_phase<F>(rx: &mut watch::Receiver<PhaseKind>, mut pred: F)
where
    F: FnMut(&PhaseKind) -> bool,
{
    let reached = rx.wait_for(|k| pred(k)).await.is_ok();
    if !reached {
        std::future::pending::<()>().await;
    }
}

/// Run store work on the blocking pool.
async fn blocking<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(v) => v,
        Err(e) => std::panic::resume_unwind(e.into_panic()),
    }
}
