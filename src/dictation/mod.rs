//! Continuous dictation session controller
//!
//! Turns an unreliable recognizer stream into one stable, growing transcript.
//! The controller owns exactly one live recognizer at a time, restarts it
//! transparently when the platform ends the stream on its own, holds a wake
//! lock while listening and exposes start / pause / stop / reset / set to the
//! UI.
//!
//! # Event model
//! All recognizer events, restart timers and host notifications go through a
//! single queue owned by the controller and are handled one at a time by
//! [`SessionController::process_next`] or [`SessionController::process_pending`].
//! Control methods run synchronously on the same owner. Events stamped with
//! the generation of a detached recognizer are discarded.

mod error;
mod reconcile;
mod restart;
mod session;
#[cfg(test)]
mod tests;

pub use error::ControlError;
pub use reconcile::{merge, MAX_OVERLAP_CHARS};
pub use restart::{
    RestartDecision, RestartPolicy, RestartTracker, DEFAULT_MAX_RESTART_ATTEMPTS,
    DEFAULT_RESTART_DELAY, DEFAULT_RESTART_WINDOW,
};
pub use session::{SessionSnapshot, SessionState, TranscriptBuffer};

use crate::activity::{ActivityDebouncer, DEFAULT_ACTIVITY_WINDOW};
use crate::platform::{
    quirks_for, DeviceClass, HapticFeedback, Haptics, PowerLockHost, PowerLockManager, QuirkConfig,
};
use crate::recognizer::{
    partition_segments, Recognizer, RecognizerConfig, RecognizerErrorCode, RecognizerEvent,
    RecognizerEventSink, RecognizerFactory, ResultSegment,
};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

/// Notifications for the UI layer
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    StateChanged { state: SessionState },
    /// The displayed transcript changed (finalized plus interim text)
    TranscriptChanged { text: String },
    /// The recognizer ended unexpectedly and is being reopened
    Restarting { attempt: u32 },
    /// Gave up reopening the recognizer after repeated failures
    RestartFailed,
    /// Terminal error the user has to see
    Error { message: String },
}

/// Work items on the controller queue
#[derive(Debug)]
pub(crate) enum Envelope {
    Recognizer {
        generation: u64,
        event: RecognizerEvent,
    },
    RestartDue {
        generation: u64,
    },
    Visibility {
        visible: bool,
    },
    PowerLockRevoked,
}

/// Posts host notifications onto the controller queue
#[derive(Debug, Clone)]
pub struct HostNotifier {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl HostNotifier {
    /// The page or app became visible or hidden
    pub fn visibility_changed(&self, visible: bool) {
        let _ = self.tx.send(Envelope::Visibility { visible });
    }

    /// The host invalidated the wake lock
    pub fn power_lock_revoked(&self) {
        let _ = self.tx.send(Envelope::PowerLockRevoked);
    }
}

/// Session settings, normally derived from [`crate::config::EngineConfig`]
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub language: String,
    pub interim_results: bool,
    pub device_class: DeviceClass,
    pub restart: RestartPolicy,
    pub activity_window: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            interim_results: true,
            device_class: DeviceClass::default(),
            restart: RestartPolicy::default(),
            activity_window: DEFAULT_ACTIVITY_WINDOW,
        }
    }
}

struct ActiveRecognizer {
    generation: u64,
    handle: Box<dyn Recognizer>,
}

/// Owner of one dictation session
///
/// Must be used from within a Tokio runtime: restart and activity timers are
/// spawned tasks. Dropping the controller releases the recognizer and the
/// wake lock.
pub struct SessionController {
    options: SessionOptions,
    quirks: QuirkConfig,
    factory: Box<dyn RecognizerFactory>,
    recognizer: Option<ActiveRecognizer>,
    generation: u64,
    state: SessionState,
    /// Set when the current stream is ending on purpose; suppresses restarts
    stop_intent: bool,
    transcript: TranscriptBuffer,
    activity: ActivityDebouncer,
    power: PowerLockManager,
    haptics: HapticFeedback,
    restarts: RestartTracker,
    pending_restart: Option<JoinHandle<()>>,
    queue_tx: mpsc::UnboundedSender<Envelope>,
    queue_rx: mpsc::UnboundedReceiver<Envelope>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub fn new(factory: Box<dyn RecognizerFactory>, options: SessionOptions) -> Self {
        let quirks = quirks_for(options.device_class);
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(100);
        info!(
            device_class = %options.device_class,
            continuous = quirks.continuous_mode,
            language = %options.language,
            "Creating dictation session controller"
        );
        Self {
            activity: ActivityDebouncer::new(options.activity_window),
            restarts: RestartTracker::new(options.restart),
            haptics: HapticFeedback::new(quirks.haptics_enabled),
            power: PowerLockManager::unsupported(),
            options,
            quirks,
            factory,
            recognizer: None,
            generation: 0,
            state: SessionState::Idle,
            stop_intent: false,
            transcript: TranscriptBuffer::default(),
            pending_restart: None,
            queue_tx,
            queue_rx,
            event_tx,
        }
    }

    /// Keep the device awake through the given host while listening
    pub fn with_power_lock(mut self, host: Box<dyn PowerLockHost>) -> Self {
        self.power = PowerLockManager::new(host);
        self
    }

    /// Vibrate through the given device on start and stop, if the device class allows it
    pub fn with_haptics(mut self, device: Box<dyn Haptics>) -> Self {
        self.haptics.attach(device);
        self
    }

    /// Subscribe to session notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Handle for posting host visibility and wake lock notifications
    pub fn host_notifier(&self) -> HostNotifier {
        HostNotifier {
            tx: self.queue_tx.clone(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == SessionState::Listening
    }

    pub fn is_paused(&self) -> bool {
        self.state == SessionState::Paused
    }

    pub fn is_detecting_speech(&self) -> bool {
        self.activity.is_detecting()
    }

    /// Displayed transcript: finalized text plus current interim text
    pub fn transcript(&self) -> String {
        self.transcript.display()
    }

    /// Finalized text only
    pub fn accumulated_transcript(&self) -> &str {
        self.transcript.accumulated()
    }

    pub fn holds_power_lock(&self) -> bool {
        self.power.is_held()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            is_listening: self.is_listening(),
            is_paused: self.is_paused(),
            is_detecting_speech: self.is_detecting_speech(),
            transcript: self.transcript(),
        }
    }

    /// Open a fresh recognizer and start listening
    ///
    /// Valid from `Idle` or `Paused`. The session becomes `Listening` once the
    /// recognizer reports that it started.
    pub fn start_listening(&mut self) {
        if self.state == SessionState::Listening {
            debug!("Already listening, ignoring start");
            return;
        }
        info!(state = %self.state, "Starting dictation");
        self.stop_intent = false;
        self.restarts.reset();
        self.cancel_pending_restart();
        self.open_recognizer();
    }

    /// Stop the recognizer but keep the session resumable
    pub fn pause_listening(&mut self) {
        if !self.is_listening() && !self.is_starting() {
            debug!(state = %self.state, "Not listening, ignoring pause");
            return;
        }
        info!("Pausing dictation");
        self.halt(SessionState::Paused);
    }

    /// Stop the recognizer and end the session
    pub fn stop_listening(&mut self) {
        if self.state == SessionState::Idle && !self.is_starting() {
            debug!("Already idle, ignoring stop");
            return;
        }
        info!("Stopping dictation");
        self.halt(SessionState::Idle);
    }

    /// Clear the transcript
    ///
    /// # Errors
    /// Rejected with [`ControlError::ResetWhileListening`] while listening or
    /// starting, to avoid racing in-flight results. Stop or pause first.
    pub fn reset_transcript(&mut self) -> Result<(), ControlError> {
        if self.is_listening() || self.is_starting() {
            warn!("Transcript reset requested while listening");
            return Err(ControlError::ResetWhileListening);
        }
        // Late results from a stopped recognizer must not refill the cleared transcript
        self.detach_recognizer();
        self.cancel_pending_restart();
        self.stop_intent = false;
        self.activity.clear();
        self.transcript.clear();
        info!("Transcript reset");
        self.publish_transcript();
        Ok(())
    }

    /// Replace the transcript with caller-edited text
    pub fn set_transcript(&mut self, text: &str) {
        self.transcript.overwrite(text);
        debug!(chars = text.chars().count(), "Transcript overwritten");
        self.publish_transcript();
    }

    /// Wait for the next queued event and handle it
    ///
    /// The controller keeps its own sender, so the queue never closes and this
    /// waits indefinitely when nothing is pending. Callers that need to give up
    /// on a quiet session wrap it in `tokio::time::timeout`.
    pub async fn process_next(&mut self) -> Option<()> {
        let envelope = self.queue_rx.recv().await?;
        self.dispatch(envelope);
        Some(())
    }

    /// Handle every event already queued, returning how many were handled
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(envelope) = self.queue_rx.try_recv() {
            self.dispatch(envelope);
            handled += 1;
        }
        handled
    }

    /// Release the recognizer, the wake lock and all timers
    ///
    /// Called on drop; the transcript stays readable.
    pub fn shutdown(&mut self) {
        self.stop_intent = true;
        self.cancel_pending_restart();
        self.detach_recognizer();
        self.power.release();
        self.activity.clear();
        if self.state != SessionState::Idle {
            info!("Dictation session shut down");
            self.state = SessionState::Idle;
        }
    }

    /// A recognizer has been opened, or a restart is pending, but no `Start`
    /// has been reported yet
    fn is_starting(&self) -> bool {
        let opening = self.recognizer.is_some() || self.pending_restart.is_some();
        opening && !self.stop_intent && !self.is_listening()
    }

    fn dispatch(&mut self, envelope: Envelope) {
        match envelope {
            Envelope::Recognizer { generation, event } => {
                if !self.is_live(generation) {
                    debug!(generation, ?event, "Discarding event from detached recognizer");
                    return;
                }
                self.handle_recognizer_event(event);
            }
            Envelope::RestartDue { generation } => self.handle_restart_due(generation),
            Envelope::Visibility { visible } => self.power.on_visibility_change(visible),
            Envelope::PowerLockRevoked => self.power.on_revoked(),
        }
    }

    fn is_live(&self, generation: u64) -> bool {
        self.recognizer
            .as_ref()
            .is_some_and(|active| active.generation == generation)
    }

    fn handle_recognizer_event(&mut self, event: RecognizerEvent) {
        match event {
            RecognizerEvent::Start => self.on_start(),
            RecognizerEvent::Result { segments } => self.on_result(&segments),
            RecognizerEvent::SpeechDetected => self.activity.trigger(),
            RecognizerEvent::Error { code } => self.on_error(&code),
            RecognizerEvent::End => self.on_end(),
        }
    }

    fn on_start(&mut self) {
        if self.stop_intent {
            debug!("Recognizer started after stop was requested, ignoring");
            return;
        }
        let was_listening = self.is_listening();
        self.set_state(SessionState::Listening);
        self.power.acquire();
        if !was_listening {
            self.haptics.start_pulse();
        }
    }

    fn on_result(&mut self, segments: &[ResultSegment]) {
        let (finals, interim) = partition_segments(segments);
        let mut heard = !interim.trim().is_empty();

        for chunk in finals {
            if chunk.trim().is_empty() {
                continue;
            }
            heard = true;
            if self.transcript.commit_final(chunk) {
                debug!(chunk = %chunk, "Committed final chunk");
            } else {
                debug!(chunk = %chunk, "Final chunk already in transcript");
            }
        }
        self.transcript.set_interim(interim);

        if heard {
            self.activity.trigger();
            self.restarts.reset();
        }
        self.publish_transcript();
    }

    fn on_error(&mut self, code: &RecognizerErrorCode) {
        if code.is_ignorable() {
            debug!(code = %code, "No speech in window");
            return;
        }
        if code.is_terminal() {
            error!(code = %code, "Recognizer refused service, ending session");
            self.end_session();
            self.emit(SessionEvent::Error {
                message: code.user_message(),
            });
            return;
        }
        warn!(code = %code, "Transient recognizer error, waiting for end event");
    }

    fn on_end(&mut self) {
        // The instance is finished; nothing it sends afterwards is relevant
        if let Some(active) = self.recognizer.take() {
            debug!(generation = active.generation, "Recognizer ended");
        }

        // No final result is coming for interim text of an ended stream
        self.transcript.freeze();
        if !self.stop_intent {
            self.schedule_restart();
            return;
        }

        if self.is_listening() {
            self.set_state(SessionState::Idle);
        }
        self.power.release();
        self.activity.clear();
        self.haptics.stop_pattern();
        info!(state = %self.state, "Recognizer stopped on request");
    }

    fn schedule_restart(&mut self) {
        match self.restarts.next_attempt(Instant::now()) {
            RestartDecision::Retry { attempt, delay } => {
                warn!(
                    attempt,
                    max_attempts = self.options.restart.max_attempts,
                    "Recognizer ended unexpectedly, restarting"
                );
                self.emit(SessionEvent::Restarting { attempt });

                let tx = self.queue_tx.clone();
                let generation = self.generation;
                self.cancel_pending_restart();
                self.pending_restart = Some(tokio::spawn(async move {
                    sleep(delay).await;
                    let _ = tx.send(Envelope::RestartDue { generation });
                }));
            }
            RestartDecision::GiveUp { attempts } => {
                error!(attempts, "Recognizer keeps ending, giving up");
                self.end_session();
                self.emit(SessionEvent::RestartFailed);
                self.emit(SessionEvent::Error {
                    message: "Dictation stopped: speech recognition kept disconnecting."
                        .to_string(),
                });
            }
        }
    }

    fn handle_restart_due(&mut self, generation: u64) {
        self.pending_restart = None;
        if generation != self.generation || self.stop_intent || self.recognizer.is_some() {
            debug!(generation, "Dropping stale restart");
            return;
        }
        info!("Reopening recognizer");
        self.open_recognizer();
    }

    fn open_recognizer(&mut self) {
        self.detach_recognizer();
        self.generation += 1;
        let generation = self.generation;

        let config = RecognizerConfig {
            continuous: self.quirks.continuous_mode,
            interim_results: self.options.interim_results,
            language: self.options.language.clone(),
        };
        let sink = RecognizerEventSink::new(generation, self.queue_tx.clone());
        let mut handle = self.factory.create(&config, sink);
        debug!(generation, "Opening recognizer");

        let started = handle.start();
        self.recognizer = Some(ActiveRecognizer { generation, handle });

        if let Err(e) = started {
            error!("Recognizer failed to start: {}", e);
            self.on_error(&e.code());
            // A failed start behaves like a stream that ended right away
            if self.is_live(generation) {
                self.on_end();
            }
        }
    }

    /// Stop and forget the live recognizer; its later events are dropped
    fn detach_recognizer(&mut self) {
        if let Some(mut active) = self.recognizer.take() {
            debug!(generation = active.generation, "Detaching recognizer");
            active.handle.stop();
        }
    }

    /// Request a deliberate stop, leaving the session in `target`
    fn halt(&mut self, target: SessionState) {
        self.stop_intent = true;
        self.cancel_pending_restart();
        if let Some(active) = self.recognizer.as_mut() {
            active.handle.stop();
        }
        self.transcript.freeze();
        self.set_state(target);
        self.power.release();
        self.activity.clear();
        self.publish_transcript();
    }

    /// Terminal end: no restart, back to idle, lock released
    fn end_session(&mut self) {
        self.stop_intent = true;
        self.cancel_pending_restart();
        self.transcript.freeze();
        self.set_state(SessionState::Idle);
        self.power.release();
        self.activity.clear();
        self.publish_transcript();
    }

    fn cancel_pending_restart(&mut self) {
        if let Some(task) = self.pending_restart.take() {
            task.abort();
        }
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state == state {
            return;
        }
        info!(from = %self.state, to = %state, "Session state changed");
        self.state = state;
        self.emit(SessionEvent::StateChanged { state });
    }

    fn publish_transcript(&self) {
        self.emit(SessionEvent::TranscriptChanged {
            text: self.transcript.display(),
        });
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
