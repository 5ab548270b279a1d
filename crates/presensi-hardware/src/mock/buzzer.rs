//! Mock buzzer that records played patterns.

use crate::{
    Result,
    traits::{BeepPattern, Buzzer},
};
use std::sync::{Arc, Mutex};

/// Mock buzzer. Patterns are appended in play order and inspected through
/// the handle.
#[derive(Debug)]
pub struct MockBuzzer {
    played: Arc<Mutex<Vec<BeepPattern>>>,
}

impl MockBuzzer {
    /// Create a new mock buzzer and its handle.
    pub fn new() -> (Self, MockBuzzerHandle) {
        let played = Arc::new(Mutex::new(Vec::new()));
        let buzzer = Self {
            played: Arc::clone(&played),
        };
        (buzzer, MockBuzzerHandle { played })
    }
}

impl Buzzer for MockBuzzer {
    async fn play(&mut self, pattern: BeepPattern) -> Result<()> {
        self.played.lock().expect("buzzer log poisoned").push(pattern);
        Ok(())
    }
}

/// Handle for inspecting a [`MockBuzzer`] from tests.
#[derive(Debug, Clone)]
pub struct MockBuzzerHandle {
    played: Arc<Mutex<Vec<BeepPattern>>>,
}

impl MockBuzzerHandle {
    /// All patterns played so far, oldest first.
    pub fn played(&self) -> Vec<BeepPattern> {
        self.played.lock().expect("buzzer log poisoned").clone()
    }

    /// The most recently played pattern, if any.
    pub fn last(&self) -> Option<BeepPattern> {
        self.played
            .lock()
            .expect("buzzer log poisoned")
            .last()
            .copied()
    }
}
