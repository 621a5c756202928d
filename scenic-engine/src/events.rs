use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use crate::runner::CaseStatus;

#[derive(Debug, Clone)]
pub enum Event {
    CaseStarted {
        run_id: Uuid,
        name: String,
    },
    CaseFinished {
        run_id: Uuid,
        name: String,
        status: CaseStatus,
    },
    StepStarted {
        run_id: Uuid,
        step_id: String,
    },
    StepFinished {
        run_id: Uuid,
        step_id: String,
        passed: bool,
    },
    StepErrored {
        run_id: Uuid,
        step_id: String,
        error: String,
    },
    TeardownStarted {
        run_id: Uuid,
        teardown_id: String,
    },
    TeardownFinished {
        run_id: Uuid,
        teardown_id: String,
        succeeded: bool,
    },
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: Event);
}

pub struct CompositeEventSink {
    sinks: Vec<Box<dyn EventSink>>,
}

impl Default for CompositeEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeEventSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }
}

#[async_trait]
impl EventSink for CompositeEventSink {
    async fn emit(&self, event: Event) {
        for sink in &self.sinks {
            let event_clone = event.clone();
            sink.emit(event_clone).await;
        }
    }
}

pub struct StdoutEventSink;

#[async_trait]
impl EventSink for StdoutEventSink {
    async fn emit(&self, event: Event) {
        let json = match event {
            Event::CaseStarted { run_id, name } => {
                json!({ "type": "case.started", "run_id": run_id.to_string(), "name": name })
            }
            Event::CaseFinished { run_id, name, status } => {
                json!({ "type": "case.finished", "run_id": run_id.to_string(), "name": name, "status": status.as_str() })
            }
            Event::StepStarted { run_id, step_id } => {
                json!({ "type": "step.started", "run_id": run_id.to_string(), "step_id": step_id })
            }
            Event::StepFinished { run_id, step_id, passed } => {
                json!({ "type": "step.finished", "run_id": run_id.to_string(), "step_id": step_id, "passed": passed })
            }
            Event::StepErrored { run_id, step_id, error } => {
                json!({ "type": "step.errored", "run_id": run_id.to_string(), "step_id": step_id, "error": error })
            }
            Event::TeardownStarted { run_id, teardown_id } => {
                json!({ "type": "teardown.started", "run_id": run_id.to_string(), "teardown_id": teardown_id })
            }
            Event::TeardownFinished { run_id, teardown_id, succeeded } => {
                json!({ "type": "teardown.finished", "run_id": run_id.to_string(), "teardown_id": teardown_id, "succeeded": succeeded })
            }
        };
        println!("{}", serde_json::to_string(&json).unwrap_or_default());
    }
}

pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: Event) {}
}
