//! Application lifecycle management.
//!
//! Headless game loop: scripted or queued input in, HUD snapshots out.
//! Each frame applies finished asset loads, feeds due input, ticks the
//! session, drains game events and logs HUD changes.
//!
//! Asset loads never block the loop. Stepped runs hold the frame counter
//! and the script cursor while initial loads are in flight, so replays
//! see the same scene on frame 0 regardless of disk speed.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use ecosort_common::WorldError;
use ecosort_gameplay::{
    run_until_cancelled, GameEvent, GameSession, HudAction, HudState, InputEvent, IntentState, LoopControl,
};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, error, info, warn};

use crate::asset_loader::{AssetLoader, AssetManifest, AssetStats};
use crate::audio::{CueFeedback, PlaybackStats};
use crate::config::EngineConfig;
use crate::script::{InputScript, ReplayAction, ScriptError, ScriptPlayer};
use crate::timing::{CancelHandle, SteppedScheduler, WallClockScheduler};

/// Longest stepped runs hold frame 0 for the initial asset loads.
pub const ASSET_WAIT: Duration = Duration::from_secs(10);

/// Frame limit for runs with neither a script nor `max_frames`.
pub const DEFAULT_HEADLESS_FRAMES: u64 = 600;

/// Frames kept running after the last scripted input.
pub const SCRIPT_TAIL_FRAMES: u64 = 120;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input script
    #[error("input script error: {0}")]
    Script(#[from] ScriptError),

    /// Session could not be built
    #[error("scene error: {0}")]
    World(#[from] WorldError),

    /// Async runtime could not start
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// What a finished run looked like.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Frames ticked
    pub frames: u64,
    /// Sessions thrown away by restarts
    pub restarts: u32,
    /// HUD at shutdown
    pub hud: HudState,
    /// Asset loads of the last session
    pub assets: AssetStats,
    /// Cue playback of the last session
    pub cues: PlaybackStats,
    /// Game events drained over the whole run
    pub events: EventTally,
}

/// Game events seen by the loop, by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventTally {
    /// Entities added to the registry
    pub spawned: u64,
    /// Items picked up
    pub picked_up: u64,
    /// Items deposited into a bin
    pub deposited: u64,
    /// Score updates
    pub score_changes: u64,
    /// Terminal transitions
    pub games_ended: u64,
}

impl EventTally {
    fn record(&mut self, event: &GameEvent) {
        match event {
            GameEvent::EntitySpawned { .. } => self.spawned += 1,
            GameEvent::TrashPickedUp { .. } => self.picked_up += 1,
            GameEvent::TrashDeposited { .. } => self.deposited += 1,
            GameEvent::ScoreChanged { .. } => self.score_changes += 1,
            GameEvent::GameEnded { .. } => self.games_ended += 1,
        }
    }
}

/// The running application.
pub struct EcosortApp {
    /// Engine configuration
    config: EngineConfig,
    /// Runtime for asset loads and signal handling
    runtime: Runtime,
    /// Manifest, kept for restarts
    manifest: Option<AssetManifest>,
    /// Directory model paths resolve against
    manifest_dir: PathBuf,

    // === Session ===
    /// Current playthrough
    session: GameSession,
    /// Loader feeding the current session
    loader: AssetLoader,
    /// Cue counters of the current session
    playback: Arc<Mutex<PlaybackStats>>,
    /// Frames are held for the session's initial loads until this instant
    asset_deadline: Option<Instant>,
    /// Held movement keys
    intent: IntentState,

    // === Input ===
    /// Producer side handed to input sources
    input_tx: Sender<InputEvent>,
    /// Drained between ticks
    input_rx: Receiver<InputEvent>,
    /// Scripted input
    script: ScriptPlayer,

    // === Loop State ===
    /// Frames ticked so far
    frame: u64,
    /// Stop after this many frames
    frame_limit: u64,
    /// Restarts so far
    restarts: u32,
    /// HUD as last logged
    last_hud: HudState,
    /// Events drained so far
    events: EventTally,
    /// Stops the scheduler
    cancel: CancelHandle,
}

impl EcosortApp {
    /// Builds the runtime and the first session.
    pub fn new(config: EngineConfig, script: Option<&InputScript>) -> Result<Self, AppError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("ecosort-loader")
            .enable_all()
            .build()?;

        let manifest = match AssetManifest::load(&config.asset_manifest) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                warn!(error = %e, "Asset manifest unavailable, starting with an empty scene");
                None
            },
        };
        let manifest_dir = config
            .asset_manifest
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let script_player = match script {
            Some(script) => ScriptPlayer::new(script)?,
            None => ScriptPlayer::empty(),
        };
        let frame_limit = config.max_frames.unwrap_or_else(|| {
            script
                .and_then(InputScript::last_frame)
                .map_or(DEFAULT_HEADLESS_FRAMES, |last| last + SCRIPT_TAIL_FRAMES)
        });

        let cancel = CancelHandle::new();
        let interrupt = cancel.clone();
        runtime.spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, shutting down");
                interrupt.cancel();
            }
        });

        let (session, loader, playback) =
            Self::start_session(&config, &runtime, manifest.as_ref(), &manifest_dir)?;
        let asset_deadline = Self::asset_deadline(&config, &loader);
        let (input_tx, input_rx) = unbounded();

        Ok(Self {
            last_hud: session.hud().clone(),
            config,
            runtime,
            manifest,
            manifest_dir,
            session,
            loader,
            playback,
            asset_deadline,
            intent: IntentState::new(),
            input_tx,
            input_rx,
            script: script_player,
            frame: 0,
            frame_limit,
            restarts: 0,
            events: EventTally::default(),
            cancel,
        })
    }

    fn start_session(
        config: &EngineConfig,
        runtime: &Runtime,
        manifest: Option<&AssetManifest>,
        manifest_dir: &Path,
    ) -> Result<(GameSession, AssetLoader, Arc<Mutex<PlaybackStats>>), AppError> {
        let feedback = CueFeedback::new(&config.sound_dir, config.sfx_volume);
        let playback = feedback.stats_handle();
        let session = GameSession::new(config.gameplay.clone(), Box::new(feedback))?;

        let mut loader = AssetLoader::new(runtime.handle().clone(), manifest_dir);
        if let Some(manifest) = manifest {
            loader.request_manifest(manifest);
        }
        Ok((session, loader, playback))
    }

    /// Stepped runs hold the frame counter until loads finish; wall-clock runs never do.
    fn asset_deadline(config: &EngineConfig, loader: &AssetLoader) -> Option<Instant> {
        (config.is_deterministic() && loader.pending() > 0).then(|| Instant::now() + ASSET_WAIT)
    }

    /// Sender for feeding key edges from outside the loop.
    #[must_use]
    pub fn input_sender(&self) -> Sender<InputEvent> {
        self.input_tx.clone()
    }

    /// Handle that stops the loop.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Current session.
    #[must_use]
    pub const fn session(&self) -> &GameSession {
        &self.session
    }

    /// Applies a request from the HUD.
    pub fn handle_hud_action(&mut self, action: HudAction) -> Result<(), AppError> {
        match action {
            HudAction::Restart => self.restart(),
        }
    }

    fn restart(&mut self) -> Result<(), AppError> {
        info!(score = self.session.progress().score(), "Restarting game");
        self.teardown_session();

        let (session, loader, playback) =
            Self::start_session(&self.config, &self.runtime, self.manifest.as_ref(), &self.manifest_dir)?;
        self.asset_deadline = Self::asset_deadline(&self.config, &loader);
        self.session = session;
        self.loader = loader;
        self.playback = playback;
        self.intent = IntentState::new();
        self.restarts += 1;
        Ok(())
    }

    /// Detaches the current session from input and pending loads.
    fn teardown_session(&mut self) {
        self.loader.teardown();
        let discarded = self.input_rx.try_iter().count();
        if discarded > 0 {
            debug!(discarded, "Discarded queued input");
        }
        self.intent.freeze();
    }

    /// Runs frames until the limit, the end of the script, or cancellation.
    pub fn run(&mut self) -> RunSummary {
        let cancel = self.cancel.clone();
        let started = Instant::now();
        info!(frame_limit = self.frame_limit, "Entering game loop");

        let steps = match self.config.fixed_delta {
            Some(delta) => {
                let mut scheduler = SteppedScheduler::new(delta, cancel);
                run_until_cancelled(&mut scheduler, |dt| self.frame(dt))
            },
            None => {
                let mut scheduler = WallClockScheduler::new(self.config.target_fps, cancel);
                let steps = run_until_cancelled(&mut scheduler, |dt| self.frame(dt));
                info!(
                    "Average frame rate {:.1} fps ({:.2} ms/frame)",
                    scheduler.timing().current_fps(),
                    scheduler.timing().average_frame_time_ms()
                );
                steps
            },
        };

        self.cancel.cancel();
        self.teardown_session();
        self.drain_events();
        let frames = self.frame;
        info!(
            "Ran {frames} frames ({steps} scheduler steps) in {:.2}s",
            started.elapsed().as_secs_f32()
        );

        RunSummary {
            frames,
            restarts: self.restarts,
            hud: self.session.hud().clone(),
            assets: self.loader.stats(),
            cues: *self.playback.lock(),
            events: self.events,
        }
    }

    fn frame(&mut self, delta: f32) -> LoopControl {
        if self.frame >= self.frame_limit {
            info!("Frame limit reached");
            return LoopControl::Stop;
        }

        self.loader.apply_completions(&mut self.session);
        self.drain_events();
        if self.holding_for_assets() {
            std::thread::yield_now();
            return LoopControl::Continue;
        }

        for action in self.script.due(self.frame) {
            match action {
                ReplayAction::Input(event) => {
                    let _ = self.input_tx.send(event);
                },
                ReplayAction::Restart => {
                    if let Err(e) = self.handle_hud_action(HudAction::Restart) {
                        error!(error = %e, "Restart failed");
                        return LoopControl::Stop;
                    }
                },
            }
        }

        while let Ok(event) = self.input_rx.try_recv() {
            if let Err(e) = self.session.handle_input(event, &mut self.intent) {
                error!(?event, error = %e, "Interaction failed");
            }
        }

        if let Err(e) = self.session.tick(&self.intent, delta) {
            error!(error = %e, "Tick failed");
        }
        self.frame += 1;
        self.drain_events();
        self.log_hud();

        if self.script.is_finished() && self.session.state().is_terminal() {
            info!("Script finished and the game is over");
            return LoopControl::Stop;
        }
        LoopControl::Continue
    }

    /// Whether this step should skip the tick while initial loads finish.
    fn holding_for_assets(&mut self) -> bool {
        let Some(deadline) = self.asset_deadline else {
            return false;
        };
        let pending = self.loader.pending();
        if pending == 0 {
            debug!(frame = self.frame, "Initial assets ready");
            self.asset_deadline = None;
            return false;
        }
        if Instant::now() >= deadline {
            warn!(pending, "Initial assets still loading, starting without them");
            self.asset_deadline = None;
            return false;
        }
        true
    }

    fn drain_events(&mut self) {
        for event in self.session.events().drain() {
            debug!(frame = self.frame, ?event, "Game event");
            self.events.record(&event);
        }
    }

    fn log_hud(&mut self) {
        let hud = self.session.hud();
        if *hud == self.last_hud {
            return;
        }
        if self.config.log_hud {
            info!(
                frame = self.frame,
                score = hud.score,
                state = ?hud.game_state,
                carrying = ?hud.carrying,
                "{}",
                hud.message
            );
        }
        self.last_hud = hud.clone();
    }
}

/// Loads everything and runs the game to completion.
pub fn run(config: EngineConfig, script: Option<&InputScript>) -> Result<RunSummary, AppError> {
    info!("Configuration loaded:");
    info!("  Asset manifest: {}", config.asset_manifest.display());
    match config.fixed_delta {
        Some(delta) => info!("  Fixed delta: {delta}s"),
        None => info!("  Target FPS: {}", config.target_fps),
    }

    let mut app = EcosortApp::new(config, script)?;
    let summary = app.run();

    info!(
        "Final score {} ({:?}), {} restarts, {} assets loaded, {} failed",
        summary.hud.score, summary.hud.game_state, summary.restarts, summary.assets.loaded, summary.assets.failed
    );
    Ok(summary)
}
