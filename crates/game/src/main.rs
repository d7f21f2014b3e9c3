//! Headless treasure hunt: seeds the catalog on first run, shows progress,
//! then plays one hunt against a scripted tracker and an ECS scene.
//!
//! Usage: `treasure-hunt [--scope <sub-zone id> | <treasure name>]`

use std::sync::Arc;

use anyhow::{Context, Result};
use catalog::{CatalogStore, MemoryCatalog, SeedDocument, Tally};
use engine_core::Transform;
use game::{
    ensure_seeded, CatalogBrowser, CatalogRow, GameConfig, LaunchError, LogNotifier, Notice, Notifier, PhaseKind,
    Preferences, Session, SessionContext, SessionOutcome, SelectionPolicy, WorldScene,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracking::ScriptedTracker;

const BUNDLED_SEED: &str = include_str!("../assets/treasure_data.json");

/// Not-ready polls before the scripted tracker locks on.
const SCRIPTED_ACQUIRE_POLLS: usize = 2;

/// Eye height of the scripted viewer, in metres.
const VIEWER_HEIGHT: f32 = 1.6;

enum Launch {
    Scope(u32),
    Name(String),
    Remembered,
}

fn parse_args() -> Result<Launch> {
    let mut args = std::env::args().skip(1);
    match args.next() {
        None => Ok(Launch::Remembered),
        Some(flag) if flag == "--scope" => {
            let id = args.next().context("--scope needs a sub-zone id")?;
            Ok(Launch::Scope(id.parse().with_context(|| format!("invalid sub-zone id {:?}", id))?))
        }
        Some(name) => Ok(Launch::Name(name)),
    }
}

fn progress(tally: &Tally) -> String {
    let done = if tally.is_complete() { ", complete" } else { "" };
    format!("{} ({:.0}%{})", tally, tally.fraction() * 100.0, done)
}

fn print_catalog(browser: &CatalogBrowser) {
    for row in browser.rows() {
        match row {
            CatalogRow::Header { code } => println!("[{}]", code),
            CatalogRow::SubZone { id, title, tally, .. } => {
                println!("  {:>3}  {:<20} {}", id, title, progress(tally))
            }
        }
    }
    println!("Total: {}", progress(&browser.total_progress()));
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let launch = parse_args()?;
    let config = GameConfig::load();
    if !GameConfig::path().exists() {
        config.save();
    }
    log::info!("Starting treasure hunt (catalog {:?})", config.data.catalog);

    let store = Arc::new(
        MemoryCatalog::open(&config.data.catalog)
            .with_context(|| format!("opening catalog {:?}", config.data.catalog))?,
    );
    let mut prefs = Preferences::load(&config.data.preferences);
    let doc = match &config.data.seed {
        Some(path) => SeedDocument::load(path).with_context(|| format!("loading seed {:?}", path))?,
        None => SeedDocument::from_json(BUNDLED_SEED).context("parsing bundled seed")?,
    };
    let was_initialized = prefs.initialized;
    ensure_seeded(&store, &mut prefs, &doc).context("seeding catalog")?;
    if prefs.initialized != was_initialized {
        prefs
            .save(&config.data.preferences)
            .with_context(|| format!("saving {:?}", config.data.preferences))?;
    }

    let catalog: Arc<dyn CatalogStore> = store;
    let mut browser = CatalogBrowser::new(catalog.clone(), prefs, Some(config.data.preferences.clone()));
    print_catalog(&browser);

    let notifier = Arc::new(LogNotifier);
    let policy = match launch {
        Launch::Name(name) => SelectionPolicy::ByName(name),
        Launch::Scope(id) => {
            let list = browser
                .open_sub_zone(id)
                .with_context(|| format!("no sub-zone {}", id))?;
            println!("{} ({})", list.title, list.tally);
            SelectionPolicy::from_preferences(browser.preferences(), config.session.scope_fallback)?
        }
        Launch::Remembered => {
            match SelectionPolicy::from_preferences(browser.preferences(), config.session.scope_fallback) {
                Ok(policy) => policy,
                Err(LaunchError::NoScopeChosen) => {
                    notifier.notify(Notice::ChooseScopeFirst);
                    return Ok(());
                }
            }
        }
    };

    let scene = Arc::new(WorldScene::new());
    let tracker = ScriptedTracker::after(SCRIPTED_ACQUIRE_POLLS)
        .with_pose(Some(Transform::from_translation(0.0, VIEWER_HEIGHT, 0.0)));
    let ctx = SessionContext {
        catalog: catalog.clone(),
        tracker: Arc::new(tracker),
        scene: scene.clone(),
        notifier,
    };

    let outcome = hunt(ctx, scene, policy, &config).await?;
    match &outcome {
        SessionOutcome::Completed { treasure } => println!("Collected {} (ID: {})", treasure.name, treasure.id),
        SessionOutcome::Aborted(reason) => println!("Hunt ended: {:?}", reason),
    }

    browser.on_visible();
    print_catalog(&browser);
    Ok(())
}

/// Play one session, tapping the chest as soon as it appears and dismissing
/// the reveal card.
async fn hunt(
    ctx: SessionContext,
    scene: Arc<WorldScene>,
    policy: SelectionPolicy,
    config: &GameConfig,
) -> Result<SessionOutcome> {
    let session = Session::new(ctx, policy, config, StdRng::from_entropy());
    let mut phases = session.subscribe();
    let runner = {
        let session = session.clone();
        tokio::spawn(async move { session.run().await })
    };

    loop {
        if phases.changed().await.is_err() {
            break;
        }
        let phase = phases.borrow_and_update().clone();
        match phase {
            PhaseKind::Spawned => {
                if let Some(record) = session.spawn_record() {
                    if scene.tap(record.handle) {
                        session.on_interaction(record.handle);
                    }
                }
            }
            PhaseKind::Collected => {
                session.acknowledge();
            }
            kind if kind.is_terminal() => break,
            _ => {}
        }
    }

    let outcome = runner.await.context("session task failed")??;
    Ok(outcome)
}
