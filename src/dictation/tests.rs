use super::*;
use crate::platform::power::testing::{FakeHost, LockLog};
use crate::platform::{Haptics, START_PULSE, STOP_PATTERN};
use crate::recognizer::{RecognizerError, Script, ScriptedRecognizerFactory};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Harness {
    sinks: Vec<RecognizerEventSink>,
    configs: Vec<RecognizerConfig>,
    starts: u32,
    stops: u32,
    fail_start: Option<RecognizerErrorCode>,
    unsupported: bool,
}

type Shared = Arc<Mutex<Harness>>;

struct FakeFactory(Shared);

struct FakeRecognizer(Shared);

impl RecognizerFactory for FakeFactory {
    fn create(
        &mut self,
        config: &RecognizerConfig,
        sink: RecognizerEventSink,
    ) -> Box<dyn Recognizer> {
        let mut harness = self.0.lock().unwrap();
        harness.configs.push(config.clone());
        harness.sinks.push(sink);
        Box::new(FakeRecognizer(self.0.clone()))
    }
}

impl Recognizer for FakeRecognizer {
    fn start(&mut self) -> Result<(), RecognizerError> {
        let mut harness = self.0.lock().unwrap();
        if harness.unsupported {
            return Err(RecognizerError::Unsupported);
        }
        if let Some(code) = harness.fail_start.clone() {
            return Err(RecognizerError::StartFailed {
                code,
                message: "refused".to_string(),
            });
        }
        harness.starts += 1;
        Ok(())
    }

    fn stop(&mut self) {
        self.0.lock().unwrap().stops += 1;
    }
}

struct RecordingHaptics(Arc<Mutex<Vec<Vec<u32>>>>);

impl Haptics for RecordingHaptics {
    fn vibrate(&self, pattern_ms: &[u32]) {
        self.0.lock().unwrap().push(pattern_ms.to_vec());
    }
}

struct Fixture {
    controller: SessionController,
    harness: Shared,
    locks: Arc<Mutex<LockLog>>,
}

impl Fixture {
    fn new(device_class: DeviceClass) -> Self {
        let harness = Shared::default();
        let locks = Arc::new(Mutex::new(LockLog::default()));
        let options = SessionOptions {
            device_class,
            ..SessionOptions::default()
        };
        let controller = SessionController::new(Box::new(FakeFactory(harness.clone())), options)
            .with_power_lock(Box::new(FakeHost(locks.clone())));
        Self {
            controller,
            harness,
            locks,
        }
    }

    fn desktop() -> Self {
        Self::new(DeviceClass::Desktop)
    }

    /// Emit an event from the most recently created recognizer and handle it
    fn emit(&mut self, event: RecognizerEvent) {
        let sink = self.harness.lock().unwrap().sinks.last().cloned().unwrap();
        sink.emit(event);
        self.controller.process_pending();
    }

    /// Emit an event from the recognizer at `index` and handle it
    fn emit_from(&mut self, index: usize, event: RecognizerEvent) {
        let sink = self.harness.lock().unwrap().sinks[index].clone();
        sink.emit(event);
        self.controller.process_pending();
    }

    fn created(&self) -> usize {
        self.harness.lock().unwrap().sinks.len()
    }

    fn locks_held(&self) -> u32 {
        self.locks.lock().unwrap().held()
    }

    fn start_and_confirm(&mut self) {
        self.controller.start_listening();
        self.emit(RecognizerEvent::Start);
        assert!(self.controller.is_listening());
    }

    /// Let the restart delay elapse and handle the resulting restart
    async fn wait_for_restart(&mut self) {
        sleep(DEFAULT_RESTART_DELAY + Duration::from_millis(50)).await;
        self.controller.process_pending();
    }
}

fn final_result(text: &str) -> RecognizerEvent {
    RecognizerEvent::Result {
        segments: vec![ResultSegment::final_text(text)],
    }
}

fn interim_result(text: &str) -> RecognizerEvent {
    RecognizerEvent::Result {
        segments: vec![ResultSegment::interim_text(text)],
    }
}

fn drain(events: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }
    received
}

#[tokio::test(start_paused = true)]
async fn test_start_event_enters_listening_and_takes_lock() {
    let mut fx = Fixture::desktop();
    fx.controller.start_listening();

    // Not listening until the recognizer confirms
    assert_eq!(fx.controller.state(), SessionState::Idle);
    assert_eq!(fx.locks_held(), 0);

    fx.emit(RecognizerEvent::Start);
    assert!(fx.controller.is_listening());
    assert!(fx.controller.holds_power_lock());
    assert_eq!(fx.locks_held(), 1);

    let harness = fx.harness.lock().unwrap();
    assert_eq!(harness.starts, 1);
    assert_eq!(
        harness.configs[0],
        RecognizerConfig {
            continuous: true,
            interim_results: true,
            language: "en-US".to_string(),
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_start_while_listening_is_ignored() {
    let mut fx = Fixture::desktop();
    fx.start_and_confirm();
    fx.controller.start_listening();
    assert_eq!(fx.created(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_results_merge_and_display_interim() {
    let mut fx = Fixture::desktop();
    let mut events = fx.controller.subscribe();
    fx.start_and_confirm();

    fx.emit(RecognizerEvent::Result {
        segments: vec![
            ResultSegment::final_text("patient is stable"),
            ResultSegment::interim_text("heart rate"),
        ],
    });
    assert_eq!(fx.controller.accumulated_transcript(), "Patient is stable");
    assert_eq!(fx.controller.transcript(), "Patient is stable.\nHeart rate");
    assert!(fx.controller.is_detecting_speech());

    fx.emit(final_result("heart rate normal"));
    assert_eq!(
        fx.controller.transcript(),
        "Patient is stable.\nHeart rate normal"
    );

    let published: Vec<String> = drain(&mut events)
        .into_iter()
        .filter_map(|event| match event {
            SessionEvent::TranscriptChanged { text } => Some(text),
            _ => None,
        })
        .collect();
    assert_eq!(
        published,
        vec![
            "Patient is stable.\nHeart rate".to_string(),
            "Patient is stable.\nHeart rate normal".to_string(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_finals_are_not_duplicated() {
    let mut fx = Fixture::desktop();
    fx.start_and_confirm();

    fx.emit(final_result("the patient reports pain"));
    fx.emit(final_result("reports pain in the chest"));
    fx.emit(final_result("in the chest"));
    assert_eq!(
        fx.controller.transcript(),
        "The patient reports pain in the chest"
    );
}

#[tokio::test(start_paused = true)]
async fn test_unexpected_end_restarts_and_preserves_content() {
    let mut fx = Fixture::desktop();
    let mut events = fx.controller.subscribe();
    fx.start_and_confirm();
    fx.emit(final_result("patient is stable"));

    fx.emit(RecognizerEvent::End);
    assert!(fx.controller.is_listening());
    assert!(fx.controller.holds_power_lock());
    assert_eq!(fx.created(), 1);

    fx.wait_for_restart().await;
    assert_eq!(fx.created(), 2);
    assert_eq!(fx.harness.lock().unwrap().starts, 2);

    fx.emit(RecognizerEvent::Start);
    fx.emit(final_result("heart rate normal"));
    assert_eq!(
        fx.controller.transcript(),
        "Patient is stable.\nHeart rate normal"
    );
    assert!(fx.controller.is_listening());
    assert_eq!(fx.locks_held(), 1);
    assert!(drain(&mut events).contains(&SessionEvent::Restarting { attempt: 1 }));
}

#[tokio::test(start_paused = true)]
async fn test_interim_survives_unexpected_end() {
    let mut fx = Fixture::desktop();
    fx.start_and_confirm();
    fx.emit(final_result("patient is stable"));
    fx.emit(interim_result("no distress"));

    fx.emit(RecognizerEvent::End);
    assert_eq!(
        fx.controller.accumulated_transcript(),
        "Patient is stable.\nNo distress"
    );
}

#[tokio::test(start_paused = true)]
async fn test_stale_recognizer_events_are_discarded() {
    let mut fx = Fixture::desktop();
    fx.start_and_confirm();
    fx.emit(final_result("patient is stable"));
    fx.emit(RecognizerEvent::End);
    fx.wait_for_restart().await;

    // The first instance is detached; a slow event from it changes nothing
    fx.emit_from(0, final_result("ghost text"));
    fx.emit_from(0, RecognizerEvent::End);
    assert_eq!(fx.controller.transcript(), "Patient is stable");

    sleep(Duration::from_millis(500)).await;
    fx.controller.process_pending();
    assert_eq!(fx.created(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stop_suppresses_restart() {
    let mut fx = Fixture::desktop();
    fx.start_and_confirm();

    fx.controller.stop_listening();
    assert_eq!(fx.controller.state(), SessionState::Idle);
    assert_eq!(fx.harness.lock().unwrap().stops, 1);

    fx.emit(RecognizerEvent::End);
    sleep(Duration::from_millis(500)).await;
    fx.controller.process_pending();

    assert_eq!(fx.controller.state(), SessionState::Idle);
    assert_eq!(fx.created(), 1);
    assert_eq!(fx.locks_held(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_restart_delay_before_start() {
    let mut fx = Fixture::desktop();
    fx.controller.start_listening();
    fx.emit(RecognizerEvent::Error {
        code: RecognizerErrorCode::Network,
    });
    fx.emit(RecognizerEvent::End);
    assert_eq!(fx.controller.state(), SessionState::Idle);

    fx.controller.stop_listening();
    fx.wait_for_restart().await;
    assert_eq!(fx.created(), 1);

    // Nothing live remains to move the session back into listening
    fx.emit(RecognizerEvent::Start);
    assert_eq!(fx.controller.state(), SessionState::Idle);
    assert_eq!(fx.locks_held(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_pause_during_restart_delay_on_resume() {
    let mut fx = Fixture::desktop();
    fx.start_and_confirm();
    fx.emit(final_result("patient is stable"));
    fx.controller.pause_listening();
    fx.emit(RecognizerEvent::End);

    // Resume, but the new stream ends before confirming
    fx.controller.start_listening();
    assert_eq!(fx.created(), 2);
    fx.emit(RecognizerEvent::End);
    assert!(fx.controller.is_paused());

    fx.controller.pause_listening();
    fx.wait_for_restart().await;
    assert_eq!(fx.created(), 2);
    assert!(fx.controller.is_paused());
    assert_eq!(fx.locks_held(), 0);
    assert_eq!(fx.controller.transcript(), "Patient is stable");
}

#[tokio::test(start_paused = true)]
async fn test_in_flight_results_after_stop_are_kept() {
    let mut fx = Fixture::desktop();
    fx.start_and_confirm();
    fx.emit(final_result("patient is stable"));

    fx.controller.stop_listening();
    fx.emit(final_result("heart rate normal"));
    fx.emit(RecognizerEvent::End);

    assert_eq!(
        fx.controller.transcript(),
        "Patient is stable.\nHeart rate normal"
    );
    assert_eq!(fx.controller.state(), SessionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_pause_folds_interim_and_stays_paused() {
    let mut fx = Fixture::desktop();
    fx.start_and_confirm();
    fx.emit(final_result("patient is stable"));
    fx.emit(interim_result("heart rate"));

    fx.controller.pause_listening();
    assert!(fx.controller.is_paused());
    assert!(!fx.controller.holds_power_lock());
    assert_eq!(
        fx.controller.accumulated_transcript(),
        "Patient is stable.\nHeart rate"
    );

    // The recognizer finalizing what was already folded in adds nothing
    fx.emit(final_result("heart rate"));
    fx.emit(RecognizerEvent::End);
    assert!(fx.controller.is_paused());
    assert_eq!(fx.controller.transcript(), "Patient is stable.\nHeart rate");

    sleep(Duration::from_millis(500)).await;
    fx.controller.process_pending();
    assert_eq!(fx.created(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_lock_held_only_while_listening() {
    let mut fx = Fixture::desktop();

    fx.start_and_confirm();
    assert_eq!(fx.locks_held(), 1);

    fx.controller.pause_listening();
    assert_eq!(fx.locks_held(), 0);
    fx.emit(RecognizerEvent::End);
    assert!(fx.controller.is_paused());

    fx.controller.start_listening();
    assert_eq!(fx.locks_held(), 0);
    fx.emit(RecognizerEvent::Start);
    assert!(fx.controller.is_listening());
    assert_eq!(fx.locks_held(), 1);

    fx.controller.stop_listening();
    fx.emit(RecognizerEvent::End);
    assert_eq!(fx.controller.state(), SessionState::Idle);

    let locks = fx.locks.lock().unwrap();
    assert_eq!(locks.acquired, 2);
    assert_eq!(locks.released, 2);
}

#[tokio::test(start_paused = true)]
async fn test_stop_before_start_event() {
    let mut fx = Fixture::desktop();
    fx.controller.start_listening();
    fx.controller.stop_listening();

    // The recognizer confirms start after the user already stopped
    fx.emit(RecognizerEvent::Start);
    assert_eq!(fx.controller.state(), SessionState::Idle);
    assert_eq!(fx.locks_held(), 0);

    fx.emit(RecognizerEvent::End);
    sleep(Duration::from_millis(500)).await;
    fx.controller.process_pending();
    assert_eq!(fx.created(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_no_speech_error_is_ignored() {
    let mut fx = Fixture::desktop();
    let mut events = fx.controller.subscribe();
    fx.start_and_confirm();

    fx.emit(RecognizerEvent::Error {
        code: RecognizerErrorCode::NoSpeech,
    });
    assert!(fx.controller.is_listening());
    assert!(!drain(&mut events)
        .iter()
        .any(|event| matches!(event, SessionEvent::Error { .. })));

    // The end that follows is recovered like any platform timeout
    fx.emit(RecognizerEvent::End);
    fx.wait_for_restart().await;
    assert_eq!(fx.created(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_permission_denied_is_terminal() {
    let mut fx = Fixture::desktop();
    let mut events = fx.controller.subscribe();
    fx.start_and_confirm();
    fx.emit(final_result("patient is stable"));

    fx.emit(RecognizerEvent::Error {
        code: RecognizerErrorCode::NotAllowed,
    });
    assert_eq!(fx.controller.state(), SessionState::Idle);
    assert_eq!(fx.locks_held(), 0);

    fx.emit(RecognizerEvent::End);
    sleep(Duration::from_millis(500)).await;
    fx.controller.process_pending();
    assert_eq!(fx.created(), 1);
    assert_eq!(fx.controller.transcript(), "Patient is stable");

    let errors: Vec<SessionEvent> = drain(&mut events)
        .into_iter()
        .filter(|event| matches!(event, SessionEvent::Error { .. }))
        .collect();
    assert_eq!(
        errors,
        vec![SessionEvent::Error {
            message: RecognizerErrorCode::NotAllowed.user_message()
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_transient_error_recovers_through_end() {
    let mut fx = Fixture::desktop();
    fx.start_and_confirm();

    fx.emit(RecognizerEvent::Error {
        code: RecognizerErrorCode::Network,
    });
    assert!(fx.controller.is_listening());

    fx.emit(RecognizerEvent::End);
    fx.wait_for_restart().await;
    assert_eq!(fx.created(), 2);
    assert!(fx.controller.is_listening());
}

#[tokio::test(start_paused = true)]
async fn test_refused_start_is_terminal() {
    let mut fx = Fixture::desktop();
    let mut events = fx.controller.subscribe();
    fx.harness.lock().unwrap().fail_start = Some(RecognizerErrorCode::ServiceNotAllowed);

    fx.controller.start_listening();
    assert_eq!(fx.controller.state(), SessionState::Idle);

    sleep(Duration::from_millis(500)).await;
    fx.controller.process_pending();
    assert_eq!(fx.created(), 1);
    assert!(drain(&mut events)
        .iter()
        .any(|event| matches!(event, SessionEvent::Error { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_recognizer_is_terminal() {
    let mut fx = Fixture::desktop();
    let mut events = fx.controller.subscribe();
    fx.harness.lock().unwrap().unsupported = true;

    fx.controller.start_listening();
    fx.wait_for_restart().await;

    assert_eq!(fx.controller.state(), SessionState::Idle);
    assert_eq!(fx.created(), 1);
    assert_eq!(fx.locks_held(), 0);
    assert!(drain(&mut events)
        .iter()
        .any(|event| matches!(event, SessionEvent::Error { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_restart_attempts_are_capped() {
    let mut fx = Fixture::desktop();
    let mut events = fx.controller.subscribe();
    fx.start_and_confirm();
    fx.emit(final_result("patient is stable"));

    for _ in 0..DEFAULT_MAX_RESTART_ATTEMPTS {
        fx.emit(RecognizerEvent::End);
        fx.wait_for_restart().await;
    }
    let attempts = usize::try_from(DEFAULT_MAX_RESTART_ATTEMPTS).unwrap();
    assert_eq!(fx.created(), 1 + attempts);
    assert!(fx.controller.is_listening());

    fx.emit(RecognizerEvent::End);
    fx.wait_for_restart().await;
    assert_eq!(fx.created(), 1 + attempts);
    assert_eq!(fx.controller.state(), SessionState::Idle);
    assert_eq!(fx.locks_held(), 0);
    assert_eq!(fx.controller.transcript(), "Patient is stable");
    assert!(drain(&mut events).contains(&SessionEvent::RestartFailed));
}

#[tokio::test(start_paused = true)]
async fn test_speech_resets_restart_budget() {
    let mut fx = Fixture::desktop();
    fx.start_and_confirm();

    for round in 0..(DEFAULT_MAX_RESTART_ATTEMPTS * 2) {
        fx.emit(RecognizerEvent::End);
        fx.wait_for_restart().await;
        fx.emit(final_result(&format!("note {}", round)));
    }
    assert!(fx.controller.is_listening());
}

#[tokio::test(start_paused = true)]
async fn test_reset_rejected_while_listening() {
    let mut fx = Fixture::desktop();
    fx.start_and_confirm();
    fx.emit(final_result("patient is stable"));

    assert_eq!(
        fx.controller.reset_transcript(),
        Err(ControlError::ResetWhileListening)
    );
    assert_eq!(fx.controller.transcript(), "Patient is stable");
}

#[tokio::test(start_paused = true)]
async fn test_reset_after_pause_clears_and_ignores_late_results() {
    let mut fx = Fixture::desktop();
    fx.start_and_confirm();
    fx.emit(final_result("patient is stable"));
    fx.controller.pause_listening();

    assert_eq!(fx.controller.reset_transcript(), Ok(()));
    assert_eq!(fx.controller.transcript(), "");

    fx.emit(final_result("late words"));
    fx.emit(RecognizerEvent::End);
    assert_eq!(fx.controller.transcript(), "");

    // The session can be resumed normally afterwards
    fx.start_and_confirm();
    fx.emit(final_result("new note"));
    assert_eq!(fx.controller.transcript(), "New note");
}

#[tokio::test(start_paused = true)]
async fn test_set_transcript_overwrites_without_state_change() {
    let mut fx = Fixture::desktop();
    fx.start_and_confirm();
    fx.emit(final_result("patient is stable"));

    fx.controller.set_transcript("Patient is stable, edited.");
    assert!(fx.controller.is_listening());
    assert_eq!(fx.controller.transcript(), "Patient is stable, edited.");

    fx.emit(final_result("heart rate normal"));
    assert_eq!(
        fx.controller.transcript(),
        "Patient is stable, edited.\nHeart rate normal"
    );
}

#[tokio::test(start_paused = true)]
async fn test_speech_activity_decays() {
    let mut fx = Fixture::desktop();
    fx.start_and_confirm();

    fx.emit(RecognizerEvent::SpeechDetected);
    assert!(fx.controller.is_detecting_speech());
    assert!(fx.controller.snapshot().is_detecting_speech);

    sleep(DEFAULT_ACTIVITY_WINDOW + Duration::from_millis(100)).await;
    tokio::task::yield_now().await;
    assert!(!fx.controller.is_detecting_speech());
}

#[tokio::test(start_paused = true)]
async fn test_intentional_end_clears_activity() {
    let mut fx = Fixture::desktop();
    fx.start_and_confirm();
    fx.emit(interim_result("heart"));
    assert!(fx.controller.is_detecting_speech());

    fx.controller.stop_listening();
    fx.emit(RecognizerEvent::End);
    assert!(!fx.controller.is_detecting_speech());
}

#[tokio::test(start_paused = true)]
async fn test_lock_reacquired_when_visible_again() {
    let mut fx = Fixture::desktop();
    fx.start_and_confirm();
    let notifier = fx.controller.host_notifier();

    notifier.power_lock_revoked();
    fx.locks.lock().unwrap().released += 1;
    fx.controller.process_pending();
    assert!(!fx.controller.holds_power_lock());

    notifier.visibility_changed(true);
    fx.controller.process_pending();
    assert!(fx.controller.holds_power_lock());
    assert_eq!(fx.locks.lock().unwrap().acquired, 2);
}

#[tokio::test(start_paused = true)]
async fn test_no_reacquire_when_paused() {
    let mut fx = Fixture::desktop();
    fx.start_and_confirm();
    fx.controller.pause_listening();

    fx.controller.host_notifier().visibility_changed(true);
    fx.controller.process_pending();
    assert!(!fx.controller.holds_power_lock());
}

#[tokio::test(start_paused = true)]
async fn test_restricted_mobile_quirks_and_haptics() {
    let harness = Shared::default();
    let vibrations = Arc::new(Mutex::new(Vec::new()));
    let options = SessionOptions {
        device_class: DeviceClass::RestrictedMobile,
        ..SessionOptions::default()
    };
    let mut controller = SessionController::new(Box::new(FakeFactory(harness.clone())), options)
        .with_haptics(Box::new(RecordingHaptics(vibrations.clone())));

    controller.start_listening();
    let sink = harness.lock().unwrap().sinks[0].clone();
    assert!(!harness.lock().unwrap().configs[0].continuous);

    sink.emit(RecognizerEvent::Start);
    controller.process_pending();
    controller.stop_listening();
    sink.emit(RecognizerEvent::End);
    controller.process_pending();

    assert_eq!(
        *vibrations.lock().unwrap(),
        vec![START_PULSE.to_vec(), STOP_PATTERN.to_vec()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_desktop_does_not_vibrate() {
    let harness = Shared::default();
    let vibrations = Arc::new(Mutex::new(Vec::new()));
    let mut controller =
        SessionController::new(Box::new(FakeFactory(harness.clone())), SessionOptions::default())
            .with_haptics(Box::new(RecordingHaptics(vibrations.clone())));

    controller.start_listening();
    let sink = harness.lock().unwrap().sinks[0].clone();
    sink.emit(RecognizerEvent::Start);
    controller.process_pending();
    assert!(vibrations.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_drop_releases_recognizer_and_lock() {
    let mut fx = Fixture::desktop();
    fx.start_and_confirm();
    let Fixture {
        controller,
        harness,
        locks,
    } = fx;

    drop(controller);
    assert_eq!(locks.lock().unwrap().held(), 0);
    assert_eq!(harness.lock().unwrap().stops, 1);
}

#[tokio::test(start_paused = true)]
async fn test_process_next_waits_for_events() {
    let mut fx = Fixture::desktop();
    fx.controller.start_listening();
    let sink = fx.harness.lock().unwrap().sinks[0].clone();

    tokio::spawn(async move {
        sleep(Duration::from_millis(10)).await;
        sink.emit(RecognizerEvent::Start);
    });
    assert_eq!(fx.controller.process_next().await, Some(()));
    assert!(fx.controller.is_listening());
}

#[tokio::test(start_paused = true)]
async fn test_process_next_keeps_waiting_on_quiet_queue() {
    let mut fx = Fixture::desktop();
    let waited = tokio::time::timeout(Duration::from_secs(5), fx.controller.process_next()).await;
    assert!(waited.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_scripted_session_end_to_end() {
    let script = Script::from_json(include_str!("../../demos/restart.json")).unwrap();
    let mut controller = SessionController::new(
        Box::new(ScriptedRecognizerFactory::new(script)),
        SessionOptions::default(),
    );

    controller.start_listening();
    while let Ok(Some(())) =
        tokio::time::timeout(Duration::from_millis(750), controller.process_next()).await
    {}
    assert!(controller.is_listening());

    controller.stop_listening();
    controller.process_pending();
    assert_eq!(controller.state(), SessionState::Idle);
    assert_eq!(
        controller.transcript(),
        "Patient reports chest pain since yesterday.\nNo shortness of breath.\nPlan: ECG and troponin"
    );
}
