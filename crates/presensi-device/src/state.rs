//! Device state machine.
//!
//! A single machine owns the terminal's lifecycle from power-on to the
//! idle/tap/result cycle. Transitions are validated against a fixed relation;
//! an invalid transition is a programming error surfaced as
//! `Error::InvalidStateTransition`, never silently applied.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use presensi_core::{Error, Result};

/// How many transitions the history ring keeps.
const HISTORY_CAPACITY: usize = 100;

/// Lifecycle states of the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceState {
    /// Power-on, peripherals initializing.
    Initializing,
    /// Waiting for the network link.
    ConnectingNetwork,
    /// Validating the API key against the backend.
    ValidatingCredential,
    /// Ready for card taps, clock on the display.
    Idle,
    /// Admin-initiated pairing session active; taps register cards.
    PairingMode,
    /// A tap is being processed against the backend.
    ProcessingCard,
    /// Tap result on the display for a fixed window.
    ShowingResult,
    /// Network link lost; taps disabled.
    ErrorNetwork,
    /// API key rejected; requires reconfiguration or backend fix.
    ErrorCredential,
}

impl DeviceState {
    /// Whether the machine may move from `self` to `target`.
    ///
    /// Same-state "transitions" are not part of the relation; they are
    /// handled as no-ops by [`DeviceStateMachine::transition_to`].
    #[must_use]
    pub fn can_transition_to(&self, target: DeviceState) -> bool {
        use DeviceState::*;
        matches!(
            (*self, target),
            (Initializing, ConnectingNetwork)
                | (ConnectingNetwork, ValidatingCredential)
                | (ConnectingNetwork, ErrorNetwork)
                | (ValidatingCredential, Idle)
                | (ValidatingCredential, ErrorCredential)
                | (ValidatingCredential, ErrorNetwork)
                | (Idle, PairingMode)
                | (Idle, ProcessingCard)
                | (Idle, ErrorNetwork)
                | (PairingMode, Idle)
                | (PairingMode, ProcessingCard)
                | (ProcessingCard, ShowingResult)
                | (ShowingResult, Idle)
                | (ErrorNetwork, Idle)
                | (ErrorNetwork, ConnectingNetwork)
                | (ErrorCredential, ValidatingCredential)
        )
    }

    /// Whether card taps are accepted in this state.
    #[must_use]
    pub fn accepts_cards(&self) -> bool {
        matches!(self, DeviceState::Idle | DeviceState::PairingMode)
    }

    /// Whether this is an error state.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, DeviceState::ErrorNetwork | DeviceState::ErrorCredential)
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            DeviceState::Initializing => "initializing",
            DeviceState::ConnectingNetwork => "connecting_network",
            DeviceState::ValidatingCredential => "validating_credential",
            DeviceState::Idle => "idle",
            DeviceState::PairingMode => "pairing_mode",
            DeviceState::ProcessingCard => "processing_card",
            DeviceState::ShowingResult => "showing_result",
            DeviceState::ErrorNetwork => "error_network",
            DeviceState::ErrorCredential => "error_credential",
        };
        write!(f, "{name}")
    }
}

/// A recorded state change.
#[derive(Debug, Clone)]
pub struct StateTransition {
    pub from: DeviceState,
    pub to: DeviceState,
    pub at: Instant,
}

/// The terminal's state machine.
///
/// Also owns the pairing subject (the student name shown during a pairing
/// session): the subject must survive the `PairingMode -> ProcessingCard`
/// transition so the tap that happens mid-session still routes to pairing.
#[derive(Debug)]
pub struct DeviceStateMachine {
    current: DeviceState,
    previous: Option<DeviceState>,
    entered_at: Instant,
    pairing_subject: Option<String>,
    history: VecDeque<StateTransition>,
}

impl DeviceStateMachine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: DeviceState::Initializing,
            previous: None,
            entered_at: Instant::now(),
            pairing_subject: None,
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    #[must_use]
    pub fn current_state(&self) -> DeviceState {
        self.current
    }

    #[must_use]
    pub fn previous_state(&self) -> Option<DeviceState> {
        self.previous
    }

    /// Time spent in the current state.
    #[must_use]
    pub fn time_in_state(&self) -> Duration {
        self.entered_at.elapsed()
    }

    /// Whether the current state has been held longer than `timeout`.
    #[must_use]
    pub fn has_timed_out(&self, timeout: Duration) -> bool {
        self.time_in_state() >= timeout
    }

    /// Whether card taps are accepted right now.
    #[must_use]
    pub fn is_ready_for_card(&self) -> bool {
        self.current.accepts_cards()
    }

    #[must_use]
    pub fn is_in_pairing_mode(&self) -> bool {
        self.current == DeviceState::PairingMode
    }

    #[must_use]
    pub fn is_in_error_state(&self) -> bool {
        self.current.is_error()
    }

    /// Student name of the active pairing session, if any.
    ///
    /// Outlives a `PairingMode -> ProcessingCard` transition; cleared only by
    /// [`exit_pairing_mode`](Self::exit_pairing_mode).
    #[must_use]
    pub fn pairing_subject(&self) -> Option<&str> {
        self.pairing_subject.as_deref()
    }

    /// Move to `target`.
    ///
    /// Returns `Ok(None)` when `target` is the current state (no-op) and
    /// `Ok(Some(transition))` when the change was applied.
    ///
    /// # Errors
    /// Returns `Error::InvalidStateTransition` when the relation forbids the
    /// move; the machine stays in its current state.
    pub fn transition_to(&mut self, target: DeviceState) -> Result<Option<StateTransition>> {
        if self.current == target {
            debug!(state = %self.current, "transition to current state ignored");
            return Ok(None);
        }

        if !self.current.can_transition_to(target) {
            warn!(from = %self.current, to = %target, "invalid transition rejected");
            return Err(Error::InvalidStateTransition {
                from: self.current.to_string(),
                to: target.to_string(),
            });
        }

        let transition = StateTransition {
            from: self.current,
            to: target,
            at: Instant::now(),
        };

        info!(from = %self.current, to = %target, "state transition");
        self.previous = Some(self.current);
        self.current = target;
        self.entered_at = transition.at;

        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(transition.clone());

        Ok(Some(transition))
    }

    /// Enter pairing mode for `subject`.
    ///
    /// # Errors
    /// Returns `Error::PairingNotAllowed` unless the machine is idle.
    pub fn enter_pairing_mode(&mut self, subject: impl Into<String>) -> Result<()> {
        if self.current != DeviceState::Idle {
            return Err(Error::PairingNotAllowed {
                state: self.current.to_string(),
            });
        }
        self.pairing_subject = Some(subject.into());
        self.transition_to(DeviceState::PairingMode)?;
        Ok(())
    }

    /// Leave pairing mode and clear the subject.
    ///
    /// # Errors
    /// Propagates `Error::InvalidStateTransition` if the machine is in a
    /// state with no path back to idle.
    pub fn exit_pairing_mode(&mut self) -> Result<()> {
        self.pairing_subject = None;
        if self.current == DeviceState::PairingMode {
            self.transition_to(DeviceState::Idle)?;
        }
        Ok(())
    }

    /// Recent transitions, oldest first.
    #[must_use]
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }
}

impl Default for DeviceStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
