use scenic_core::types::AnyValue;
use serde_json::json;

use crate::error::ResolutionErrorKind;

/// Per-scenario mutable store of captured step results and run-scoped
/// globals. Created fresh for every run and discarded afterwards; it is
/// never shared across scenarios, so no locking is needed.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    steps: serde_json::Map<String, AnyValue>,
    globals: serde_json::Map<String, AnyValue>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a step capture under its id. When the body is an object
    /// the HTTP status is additionally injected as `_status_code`, the
    /// convention existing case files use to reach the status through
    /// expressions.
    pub fn record(&mut self, step_id: &str, status: u16, body: AnyValue) {
        let mut value = body;
        if let AnyValue::Object(map) = &mut value {
            map.insert("_status_code".to_string(), json!(status));
        }
        self.steps.insert(step_id.to_string(), value);
    }

    /// Record a capture as-is, without status injection. Used for
    /// teardown outcomes, which have no HTTP status of their own.
    pub fn record_value(&mut self, step_id: &str, value: AnyValue) {
        self.steps.insert(step_id.to_string(), value);
    }

    pub fn get_step(&self, step_id: &str) -> Result<&AnyValue, ResolutionErrorKind> {
        self.steps
            .get(step_id)
            .ok_or_else(|| ResolutionErrorKind::UnexecutedStep(step_id.to_string()))
    }

    pub fn has_step(&self, step_id: &str) -> bool {
        self.steps.contains_key(step_id)
    }

    pub fn set_global(&mut self, namespace: &str, value: AnyValue) {
        self.globals.insert(namespace.to_string(), value);
    }

    pub fn get_global(&self, namespace: &str) -> Option<&AnyValue> {
        self.globals.get(namespace)
    }

    /// Merge one key into an object-valued namespace, creating the
    /// namespace if needed. A non-object namespace is replaced.
    pub fn update_global(&mut self, namespace: &str, key: &str, value: AnyValue) {
        let entry = self
            .globals
            .entry(namespace.to_string())
            .or_insert_with(|| AnyValue::Object(Default::default()));
        if !entry.is_object() {
            *entry = AnyValue::Object(Default::default());
        }
        if let AnyValue::Object(map) = entry {
            map.insert(key.to_string(), value);
        }
    }
}
