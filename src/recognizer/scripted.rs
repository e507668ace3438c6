//! Recognizer that replays pre-recorded event scripts
//!
//! Each recognizer instance created by the factory plays the next "take" of
//! the script. Once the takes run out, new instances start and then stay
//! silent until stopped.

use super::{
    Recognizer, RecognizerConfig, RecognizerError, RecognizerErrorCode, RecognizerEvent,
    RecognizerEventSink, RecognizerFactory,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info};

fn default_step_ms() -> u64 {
    20
}

/// A sequence of takes, one per recognizer instance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub takes: Vec<Vec<RecognizerEvent>>,
    /// Delay between replayed events
    #[serde(default = "default_step_ms")]
    pub step_ms: u64,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

pub struct ScriptedRecognizerFactory {
    takes: VecDeque<Vec<RecognizerEvent>>,
    step: Duration,
    created: usize,
}

impl ScriptedRecognizerFactory {
    pub fn new(script: Script) -> Self {
        Self {
            takes: script.takes.into(),
            step: Duration::from_millis(script.step_ms),
            created: 0,
        }
    }

    /// Number of recognizer instances handed out so far
    pub fn created(&self) -> usize {
        self.created
    }
}

impl RecognizerFactory for ScriptedRecognizerFactory {
    fn create(
        &mut self,
        config: &RecognizerConfig,
        sink: RecognizerEventSink,
    ) -> Box<dyn Recognizer> {
        self.created += 1;
        let take = self.takes.pop_front();
        debug!(
            generation = sink.generation(),
            continuous = config.continuous,
            language = %config.language,
            has_take = take.is_some(),
            "Creating scripted recognizer"
        );
        Box::new(ScriptedRecognizer {
            take,
            sink,
            step: self.step,
            task: None,
            started: false,
        })
    }
}

struct ScriptedRecognizer {
    take: Option<Vec<RecognizerEvent>>,
    sink: RecognizerEventSink,
    step: Duration,
    task: Option<JoinHandle<()>>,
    started: bool,
}

impl Recognizer for ScriptedRecognizer {
    fn start(&mut self) -> Result<(), RecognizerError> {
        if self.started {
            return Err(RecognizerError::StartFailed {
                code: RecognizerErrorCode::Other("invalid-state".to_string()),
                message: "recognizer already started".to_string(),
            });
        }
        self.started = true;

        let events = self.take.take().unwrap_or_else(|| {
            info!("Script exhausted, recognizer will stay silent");
            vec![RecognizerEvent::Start]
        });
        let sink = self.sink.clone();
        let step = self.step;
        self.task = Some(tokio::spawn(async move {
            for event in events {
                sleep(step).await;
                if !sink.emit(event) {
                    break;
                }
            }
        }));
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.sink.emit(RecognizerEvent::End);
        }
    }
}

impl Drop for ScriptedRecognizer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
