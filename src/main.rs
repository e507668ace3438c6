#![deny(clippy::all)]

//! Replays a recorded recognizer script through a dictation session
//!
//! Usage: `dictation-replay <script.json> [--save]`

use anyhow::Context;
use dictation_engine::config::EngineConfig;
use dictation_engine::dictation::{SessionController, SessionEvent, SessionSnapshot};
use dictation_engine::platform::{Haptics, PowerLockError, PowerLockHandle, PowerLockHost};
use dictation_engine::preferences::{self, Preferences};
use dictation_engine::recognizer::{Script, ScriptedRecognizerFactory};
use dictation_engine::{storage, AppError};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tracing::{error, info, warn};

/// How long the queue must stay empty before the script is considered done
const QUIET_PERIOD: Duration = Duration::from_millis(750);

/// Wake lock stand-in for a terminal host
struct ConsolePowerLock;

struct ConsoleLockHandle;

impl PowerLockHost for ConsolePowerLock {
    fn request(&mut self) -> Result<Box<dyn PowerLockHandle>, PowerLockError> {
        info!("Wake lock granted");
        Ok(Box::new(ConsoleLockHandle))
    }
}

impl PowerLockHandle for ConsoleLockHandle {
    fn release(self: Box<Self>) {
        info!("Wake lock returned");
    }
}

/// Haptics stand-in that logs the requested pattern
struct ConsoleHaptics;

impl Haptics for ConsoleHaptics {
    fn vibrate(&self, pattern_ms: &[u32]) {
        info!(?pattern_ms, "Haptic feedback");
    }
}

/// Load engine configuration and user preferences
fn load_settings() -> Result<(EngineConfig, Preferences), AppError> {
    let config = EngineConfig::load()?;
    let prefs = preferences::load_preferences();
    Ok((config, prefs))
}

/// Save the transcript where the preferences say transcripts go
fn export_transcript(transcript: &str, prefs: &Preferences) -> Result<PathBuf, AppError> {
    Ok(storage::save_transcript(transcript, prefs)?)
}

/// Log session notifications as they happen
fn spawn_event_logger(mut events: broadcast::Receiver<SessionEvent>) {
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                SessionEvent::StateChanged { state } => info!(%state, "Session state"),
                SessionEvent::TranscriptChanged { text } => info!("Transcript: {}", text),
                SessionEvent::Restarting { attempt } => {
                    warn!(attempt, "Recognizer restarting");
                }
                SessionEvent::RestartFailed => error!("Recognizer could not be restarted"),
                SessionEvent::Error { message } => error!("{}", message),
            }
        }
    });
}

/// Run the session until the script goes quiet, then stop it
#[tracing::instrument(skip(controller))]
async fn run_session(controller: &mut SessionController) -> SessionSnapshot {
    controller.start_listening();
    while let Ok(Some(())) = timeout(QUIET_PERIOD, controller.process_next()).await {}

    controller.stop_listening();
    // Let the recognizer's final events through
    while let Ok(Some(())) = timeout(QUIET_PERIOD, controller.process_next()).await {}

    controller.snapshot()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for structured logging
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let script_path = args
        .next()
        .context("usage: dictation-replay <script.json> [--save]")?;
    let save = args.any(|arg| arg == "--save");

    let (config, prefs) = load_settings()?;
    let mut options = config.session_options();
    prefs.apply(&mut options);

    let json = std::fs::read_to_string(&script_path)
        .with_context(|| format!("Failed to read script {}", script_path))?;
    let script = Script::from_json(&json).context("Invalid recognizer script")?;
    info!(takes = script.takes.len(), "Loaded recognizer script");

    let factory = ScriptedRecognizerFactory::new(script);
    let mut controller =
        SessionController::new(Box::new(factory), options).with_power_lock(Box::new(ConsolePowerLock));
    if prefs.haptics_enabled() {
        controller = controller.with_haptics(Box::new(ConsoleHaptics));
    }

    spawn_event_logger(controller.subscribe());
    let snapshot = run_session(&mut controller).await;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    if save {
        let path = export_transcript(&snapshot.transcript, &prefs)?;
        println!("Saved to {}", path.display());
    }

    Ok(())
}
