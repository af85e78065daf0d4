//! User-facing notices — trait for surfacing submission outcomes to the
//! presentation layer (toasts, CLI output, whatever sits in front).
//!
//! Modules accept an `Arc<dyn NoticeSink>` so the delivery path never
//! depends on how notices are rendered.

use std::sync::Mutex;
use uuid::Uuid;

/// Outcome of a dispatched segment submission. `SegmentSent` means the
/// transport settled without error; it says nothing about what the
/// collector did with the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    SegmentSent {
        delivery_id: Uuid,
    },
    SegmentFailed {
        delivery_id: Uuid,
        reason: String,
    },
}

/// Trait for surfacing notices to the user.
pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// No-op sink for tests and headless runs.
pub struct NoOpSink;

impl NoticeSink for NoOpSink {
    fn notify(&self, _notice: Notice) {}
}

/// Sink that emits notices through structured logs.
pub struct LogSink;

impl NoticeSink for LogSink {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::SegmentSent { delivery_id } => {
                tracing::info!(delivery_id = %delivery_id, "Segment sent to collector");
            }
            Notice::SegmentFailed {
                delivery_id,
                reason,
            } => {
                tracing::error!(delivery_id = %delivery_id, reason = %reason, "Segment delivery failed");
            }
        }
    }
}

/// In-memory sink that captures notices for testing.
#[derive(Default)]
pub struct CaptureSink {
    notices: Mutex<Vec<Notice>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self {
            notices: Mutex::new(Vec::new()),
        }
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().expect("notice mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.notices.lock().expect("notice mutex poisoned").len()
    }

    pub fn clear(&self) {
        self.notices.lock().expect("notice mutex poisoned").clear();
    }
}

impl NoticeSink for CaptureSink {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .expect("notice mutex poisoned")
            .push(notice);
    }
}
