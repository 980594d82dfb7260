#![allow(dead_code, unreachable_pub)]

use parking_lot::Mutex;
use std::sync::Arc;
use tether_emitter::Handler;

/// Collects handler invocations as `label(payload)` or `label(type, payload)`.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handler(&self, label: impl Into<String>) -> Handler<u32> {
        let label = label.into();
        let recorder = self.clone();
        Handler::new(move |n: &u32| recorder.push(format!("{label}({n})")))
    }

    pub fn wildcard(&self, label: impl Into<String>) -> Handler<u32> {
        let label = label.into();
        let recorder = self.clone();
        Handler::wildcard(move |ty: &str, n: &u32| recorder.push(format!("{label}({ty}, {n})")))
    }

    pub fn push(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn reset(&self) {
        self.calls.lock().clear();
    }
}

/// A slot a handler can read its own registration from.
pub type SelfRef = Arc<Mutex<Option<Handler<u32>>>>;
