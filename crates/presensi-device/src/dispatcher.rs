//! Card tap dispatcher.
//!
//! Routes each accepted tap to attendance recording or pairing registration.
//! The routing decision is snapshotted BEFORE the machine leaves its ready
//! state: once the tap moves the machine to `ProcessingCard`,
//! `is_in_pairing_mode()` is false even for a tap that arrived during a
//! pairing session, so the mode at tap time is what must decide the route.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::Result;
use crate::state::{DeviceState, DeviceStateMachine};
use presensi_api::{AttendanceGateway, AttendanceOutcome, PairingOutcome};
use presensi_core::CardUid;

/// Why a tap was refused before any network traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfflineReason {
    /// Server URL or API key missing.
    NotConfigured,
    /// API key not yet accepted by the backend.
    NotValidated,
    /// Network link down.
    Disconnected,
}

impl OfflineReason {
    /// Short line for the result screen.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            OfflineReason::NotConfigured => "Belum Dikonfig",
            OfflineReason::NotValidated => "Belum Validasi",
            OfflineReason::Disconnected => "Jaringan Putus",
        }
    }
}

/// Outcome of one dispatched tap.
#[derive(Debug, Clone)]
pub enum TapResult {
    /// Tap refused locally; the raw UID is shown so the card can still be
    /// identified by hand.
    Offline { uid: CardUid, reason: OfflineReason },
    /// Tap routed to attendance recording.
    Attendance(AttendanceOutcome),
    /// Tap routed to pairing registration.
    Pairing(PairingOutcome),
    /// Backend unreachable after the full retry budget.
    Unreachable,
}

/// Accepts, rate-limits, and routes card taps.
#[derive(Debug)]
pub struct CardEventDispatcher {
    cooldown: Duration,
    last_accepted: Option<Instant>,
}

impl CardEventDispatcher {
    #[must_use]
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_accepted: None,
        }
    }

    /// Whether a tap right now would be inside the cooldown window.
    #[must_use]
    pub fn in_cooldown(&self) -> bool {
        self.last_accepted
            .is_some_and(|at| at.elapsed() < self.cooldown)
    }

    /// Process one tap.
    ///
    /// Returns `Ok(None)` for a tap suppressed by the cooldown window.
    /// Otherwise the machine moves `ready -> ProcessingCard -> ShowingResult`
    /// and the result describes what happened.
    ///
    /// # Errors
    /// Propagates state machine errors; transport exhaustion is folded into
    /// `TapResult::Unreachable`, not an error.
    pub async fn dispatch(
        &mut self,
        uid: CardUid,
        machine: &mut DeviceStateMachine,
        gateway: &AttendanceGateway,
        connected: bool,
    ) -> Result<Option<TapResult>> {
        if self.in_cooldown() {
            debug!(%uid, "tap inside cooldown window ignored");
            return Ok(None);
        }

        // Snapshot the route before ProcessingCard clears the ready state.
        let route_to_pairing = machine.is_in_pairing_mode();

        machine.transition_to(DeviceState::ProcessingCard)?;
        self.last_accepted = Some(Instant::now());

        let result = if !gateway.is_configured() {
            TapResult::Offline {
                uid,
                reason: OfflineReason::NotConfigured,
            }
        } else if !connected {
            TapResult::Offline {
                uid,
                reason: OfflineReason::Disconnected,
            }
        } else if !gateway.is_validated() {
            TapResult::Offline {
                uid,
                reason: OfflineReason::NotValidated,
            }
        } else if route_to_pairing {
            match gateway.process_pairing(&uid).await {
                Ok(outcome) => TapResult::Pairing(outcome),
                Err(e) => {
                    warn!(%uid, error = %e, "pairing unreachable");
                    TapResult::Unreachable
                }
            }
        } else {
            match gateway.record_attendance(&uid).await {
                Ok(outcome) => TapResult::Attendance(outcome),
                Err(e) => {
                    warn!(%uid, error = %e, "attendance unreachable");
                    TapResult::Unreachable
                }
            }
        };

        machine.transition_to(DeviceState::ShowingResult)?;
        Ok(Some(result))
    }
}
