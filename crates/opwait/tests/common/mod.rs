#![allow(dead_code)]

use async_trait::async_trait;
use opwait::{Probe, ProbeError, StatusTable, TableClassifier, status};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// One scripted probe answer
#[derive(Debug, Clone)]
pub enum Step {
    Body(Value),
    NotFound,
    Error(&'static str),
}

/// Status as a bare JSON string body
pub fn status_body(s: &str) -> Step {
    Step::Body(json!(s))
}

/// Probe replaying a fixed script; the last step repeats forever
pub struct ScriptedProbe {
    steps: VecDeque<Step>,
    calls: Arc<AtomicU32>,
}

impl ScriptedProbe {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        let steps: VecDeque<Step> = steps.into_iter().collect();
        assert!(!steps.is_empty(), "script must have at least one step");
        Self {
            steps,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn statuses(statuses: &[&str]) -> Self {
        Self::new(statuses.iter().map(|s| status_body(s)))
    }

    /// Shared probe call counter, readable after the probe is moved away
    pub fn calls(&self) -> Arc<AtomicU32> {
        self.calls.clone()
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    type Response = Value;

    async fn probe(&mut self) -> Result<Value, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = if self.steps.len() > 1 {
            self.steps.pop_front().unwrap()
        } else {
            self.steps.front().cloned().unwrap()
        };
        match step {
            Step::Body(body) => Ok(body),
            Step::NotFound => Err(ProbeError::not_found("resource")),
            Step::Error(message) => Err(ProbeError::request(message)),
        }
    }
}

pub fn count(calls: &Arc<AtomicU32>) -> u32 {
    calls.load(Ordering::SeqCst)
}

/// `PENDING` / `COMPLETED` table reading the body itself as status
pub fn completion_table() -> TableClassifier<impl Fn(&Value) -> Option<String> + Clone> {
    StatusTable::new()
        .pending(["PENDING"])
        .success(["COMPLETED"])
        .failure(["FAILED"])
        .with_extractor(status::json_status(""))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
