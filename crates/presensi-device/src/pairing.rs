//! Pairing session coordinator.
//!
//! Polls the backend for an admin-initiated pairing session and drives the
//! machine in and out of `PairingMode` to match. The poll is rate-limited and
//! gated: it only runs when the gateway is usable, the link is up, and the
//! machine could act on the answer. A tap being processed suppresses the
//! poll entirely so a session change can never interleave with a dispatch.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::Result;
use crate::state::DeviceStateMachine;
use presensi_api::AttendanceGateway;

/// What a coordinator tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingUpdate {
    /// Gate closed or interval not due; no request made.
    Skipped,
    /// Polled; machine already matched the backend session.
    NoChange,
    /// Session appeared; machine entered pairing mode for this student.
    Entered(String),
    /// Session ended; machine returned to idle.
    Exited,
}

/// Rate-limited poll of the backend pairing session.
#[derive(Debug)]
pub struct PairingCoordinator {
    poll_interval: Duration,
    last_poll: Option<Instant>,
}

impl PairingCoordinator {
    #[must_use]
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            last_poll: None,
        }
    }

    /// Whether the next tick would actually poll (gate aside).
    #[must_use]
    pub fn poll_due(&self) -> bool {
        self.last_poll
            .is_none_or(|at| at.elapsed() >= self.poll_interval)
    }

    /// Run one coordinator step.
    ///
    /// # Errors
    /// Propagates state machine errors; the poll itself is total and cannot
    /// fail (a failed request reads as "no session").
    pub async fn tick(
        &mut self,
        machine: &mut DeviceStateMachine,
        gateway: &AttendanceGateway,
        connected: bool,
    ) -> Result<PairingUpdate> {
        if !gateway.is_configured()
            || !gateway.is_validated()
            || !connected
            || !machine.is_ready_for_card()
            || !self.poll_due()
        {
            return Ok(PairingUpdate::Skipped);
        }

        let session = gateway.check_pairing_status().await;
        self.last_poll = Some(Instant::now());

        if session.active && !machine.is_in_pairing_mode() {
            info!(student = %session.student_name, "pairing session started");
            machine.enter_pairing_mode(session.student_name.clone())?;
            return Ok(PairingUpdate::Entered(session.student_name));
        }

        // The subject can outlive PairingMode (tap processed, machine back in
        // Idle); a session that ended clears it either way.
        if !session.active && (machine.is_in_pairing_mode() || machine.pairing_subject().is_some())
        {
            info!("pairing session ended");
            machine.exit_pairing_mode()?;
            return Ok(PairingUpdate::Exited);
        }

        debug!(active = session.active, "pairing session unchanged");
        Ok(PairingUpdate::NoChange)
    }
}
