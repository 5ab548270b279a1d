//! Mock LCD that records every screen the terminal renders.

use crate::{Result, traits::TerminalDisplay};
use std::sync::{Arc, Mutex};

/// A rendered screen, as recorded by [`MockDisplay`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Message { line1: String, line2: String },
    Idle { clock: String },
    Pairing { student_name: String },
    Result { line1: String, line2: String },
    Error { message: String },
}

/// Mock LCD. Screens are appended in render order and inspected through the
/// handle.
#[derive(Debug)]
pub struct MockDisplay {
    screens: Arc<Mutex<Vec<Screen>>>,
}

impl MockDisplay {
    /// Create a new mock display and its handle.
    pub fn new() -> (Self, MockDisplayHandle) {
        let screens = Arc::new(Mutex::new(Vec::new()));
        let display = Self {
            screens: Arc::clone(&screens),
        };
        (display, MockDisplayHandle { screens })
    }

    fn record(&self, screen: Screen) {
        self.screens
            .lock()
            .expect("display log poisoned")
            .push(screen);
    }
}

impl TerminalDisplay for MockDisplay {
    async fn show_message(&mut self, line1: &str, line2: &str) -> Result<()> {
        self.record(Screen::Message {
            line1: line1.to_string(),
            line2: line2.to_string(),
        });
        Ok(())
    }

    async fn show_idle(&mut self, clock: &str) -> Result<()> {
        self.record(Screen::Idle {
            clock: clock.to_string(),
        });
        Ok(())
    }

    async fn show_pairing(&mut self, student_name: &str) -> Result<()> {
        self.record(Screen::Pairing {
            student_name: student_name.to_string(),
        });
        Ok(())
    }

    async fn show_result(&mut self, line1: &str, line2: &str) -> Result<()> {
        self.record(Screen::Result {
            line1: line1.to_string(),
            line2: line2.to_string(),
        });
        Ok(())
    }

    async fn show_error(&mut self, message: &str) -> Result<()> {
        self.record(Screen::Error {
            message: message.to_string(),
        });
        Ok(())
    }
}

/// Handle for inspecting a [`MockDisplay`] from tests.
#[derive(Debug, Clone)]
pub struct MockDisplayHandle {
    screens: Arc<Mutex<Vec<Screen>>>,
}

impl MockDisplayHandle {
    /// All screens rendered so far, oldest first.
    pub fn screens(&self) -> Vec<Screen> {
        self.screens.lock().expect("display log poisoned").clone()
    }

    /// The most recently rendered screen, if any.
    pub fn last(&self) -> Option<Screen> {
        self.screens
            .lock()
            .expect("display log poisoned")
            .last()
            .cloned()
    }
}
