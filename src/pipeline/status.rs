// src/pipeline/status.rs
//
// Explicit, injectable processing-status store. The orchestration layer
// owns one store and hands per-video handles into each run; no ambient
// process-wide state.

use crate::types::SeverityLevel;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProcessingStatus {
    Queued,
    Processing { progress: f32 },
    Done { severity: SeverityLevel },
    Failed { reason: String },
}

/// Keyed map of per-video processing status, shared by handle.
#[derive(Debug, Clone, Default)]
pub struct StatusStore {
    inner: Arc<Mutex<HashMap<String, ProcessingStatus>>>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: &str, status: ProcessingStatus) {
        self.inner
            .lock()
            .expect("status store poisoned")
            .insert(key.to_string(), status);
    }

    pub fn get(&self, key: &str) -> Option<ProcessingStatus> {
        self.inner
            .lock()
            .expect("status store poisoned")
            .get(key)
            .cloned()
    }

    pub fn snapshot(&self) -> HashMap<String, ProcessingStatus> {
        self.inner.lock().expect("status store poisoned").clone()
    }

    /// Handle bound to one video's key, passed into the pipeline run.
    pub fn handle(&self, key: impl Into<String>) -> StatusHandle {
        StatusHandle {
            store: self.clone(),
            key: key.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusHandle {
    store: StatusStore,
    key: String,
}

impl StatusHandle {
    pub fn queued(&self) {
        self.store.set(&self.key, ProcessingStatus::Queued);
    }

    pub fn processing(&self, progress: f32) {
        self.store
            .set(&self.key, ProcessingStatus::Processing { progress });
    }

    pub fn done(&self, severity: SeverityLevel) {
        self.store.set(&self.key, ProcessingStatus::Done { severity });
    }

    pub fn failed(&self, reason: impl Into<String>) {
        self.store.set(
            &self.key,
            ProcessingStatus::Failed {
                reason: reason.into(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_updates_store() {
        let store = StatusStore::new();
        let handle = store.handle("cam1.mp4");

        handle.queued();
        assert!(matches!(
            store.get("cam1.mp4"),
            Some(ProcessingStatus::Queued)
        ));

        handle.processing(42.0);
        match store.get("cam1.mp4") {
            Some(ProcessingStatus::Processing { progress }) => {
                assert!((progress - 42.0).abs() < f32::EPSILON)
            }
            other => panic!("unexpected status {other:?}"),
        }

        handle.done(SeverityLevel::High);
        assert!(matches!(
            store.get("cam1.mp4"),
            Some(ProcessingStatus::Done {
                severity: SeverityLevel::High
            })
        ));
    }

    #[test]
    fn test_stores_are_independent_per_key() {
        let store = StatusStore::new();
        store.handle("a").queued();
        store.handle("b").failed("decode error");

        assert_eq!(store.snapshot().len(), 2);
        assert!(matches!(store.get("a"), Some(ProcessingStatus::Queued)));
        assert!(matches!(store.get("b"), Some(ProcessingStatus::Failed { .. })));
    }
}
