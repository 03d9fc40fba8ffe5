//! In-memory notifier for tests.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::alerts::Notifier;

/// Records every message and reports success unless the message contains
/// one of the configured failure markers.
#[derive(Default)]
pub struct RecordingNotifier {
    fail_markers: Vec<String>,
    fail_all: bool,
    sent: Mutex<Vec<String>>,
    attempts: Mutex<usize>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every message.
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    /// Reject messages that contain `marker` (an order id, say).
    pub fn failing_for(mut self, marker: impl Into<String>) -> Self {
        self.fail_markers.push(marker.into());
        self
    }

    /// Messages that were accepted.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &str) -> bool {
        *self.attempts.lock().unwrap_or_else(PoisonError::into_inner) += 1;

        let rejected =
            self.fail_all || self.fail_markers.iter().any(|marker| message.contains(marker));
        if rejected {
            return false;
        }

        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
        true
    }
}
