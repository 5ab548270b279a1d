//! The terminal control loop.
//!
//! One cooperative loop owns every peripheral and the whole control state.
//! Each iteration runs to completion before the next begins; network calls
//! are awaited in place, so no two operations ever interleave and the state
//! machine needs no locking.

use std::time::Duration;

use chrono::Local;
use tracing::{debug, error, info, warn};

use crate::config::TerminalConfig;
use crate::dispatcher::CardEventDispatcher;
use crate::error::Result;
use crate::feedback::feedback_for;
use crate::pairing::{PairingCoordinator, PairingUpdate};
use crate::state::{DeviceState, DeviceStateMachine};
use presensi_api::{AttendanceGateway, GatewayError, HttpClient};
use presensi_core::constants::{
    CARD_COOLDOWN, LOOP_TICK, NETWORK_CONNECT_TIMEOUT, PAIRING_POLL_INTERVAL,
    RESULT_DISPLAY_WINDOW,
};
use presensi_hardware::{BeepPattern, Buzzer, CardReader, Connectivity, TerminalDisplay};

/// Loop timing knobs. Production uses [`Default`]; tests shrink the windows.
#[derive(Debug, Clone, Copy)]
pub struct TerminalTiming {
    pub pairing_poll: Duration,
    pub card_cooldown: Duration,
    pub result_window: Duration,
    pub loop_tick: Duration,
    /// How long boot waits for the network link before giving up.
    pub network_connect: Duration,
    /// How long to sit in `ErrorCredential` before revalidating the key.
    pub credential_retry: Duration,
}

impl Default for TerminalTiming {
    fn default() -> Self {
        Self {
            pairing_poll: PAIRING_POLL_INTERVAL,
            card_cooldown: CARD_COOLDOWN,
            result_window: RESULT_DISPLAY_WINDOW,
            loop_tick: LOOP_TICK,
            network_connect: NETWORK_CONNECT_TIMEOUT,
            credential_retry: Duration::from_secs(30),
        }
    }
}

/// The attendance terminal: state machine, gateway, and peripherals.
pub struct Terminal<R, D, B, C>
where
    R: CardReader,
    D: TerminalDisplay,
    B: Buzzer,
    C: Connectivity,
{
    config: TerminalConfig,
    machine: DeviceStateMachine,
    coordinator: PairingCoordinator,
    dispatcher: CardEventDispatcher,
    gateway: AttendanceGateway,
    reader: R,
    display: D,
    buzzer: B,
    link: C,
    timing: TerminalTiming,
}

impl<R, D, B, C> Terminal<R, D, B, C>
where
    R: CardReader,
    D: TerminalDisplay,
    B: Buzzer,
    C: Connectivity,
{
    pub fn new(config: TerminalConfig, reader: R, display: D, buzzer: B, link: C) -> Self {
        Self::with_timing(config, reader, display, buzzer, link, TerminalTiming::default())
    }

    pub fn with_timing(
        config: TerminalConfig,
        reader: R,
        display: D,
        buzzer: B,
        link: C,
        timing: TerminalTiming,
    ) -> Self {
        let gateway = AttendanceGateway::new(HttpClient::new(&config.server_url), &config.api_key);
        Self {
            config,
            machine: DeviceStateMachine::new(),
            coordinator: PairingCoordinator::new(timing.pairing_poll),
            dispatcher: CardEventDispatcher::new(timing.card_cooldown),
            gateway,
            reader,
            display,
            buzzer,
            link,
            timing,
        }
    }

    #[must_use]
    pub fn state(&self) -> DeviceState {
        self.machine.current_state()
    }

    #[must_use]
    pub fn gateway(&self) -> &AttendanceGateway {
        &self.gateway
    }

    fn clock() -> String {
        Local::now().format("%H:%M:%S").to_string()
    }

    async fn is_connected(&self) -> bool {
        match self.link.is_connected().await {
            Ok(connected) => connected,
            Err(e) => {
                warn!(error = %e, "link status check failed");
                false
            }
        }
    }

    /// Wait up to the connect timeout for the link to come up.
    async fn wait_for_link(&self) -> bool {
        let deadline = std::time::Instant::now() + self.timing.network_connect;
        loop {
            if self.is_connected().await {
                return true;
            }
            if std::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(self.timing.loop_tick).await;
        }
    }

    /// Bring the terminal from power-on to idle (or an error state).
    ///
    /// # Errors
    /// Only state machine and display errors propagate; a failed validation
    /// or missing link parks the machine in the matching error state.
    pub async fn boot(&mut self) -> Result<()> {
        info!(version = presensi_core::VERSION, "terminal starting");
        self.display
            .show_message("Presensi RFID", "Memulai...")
            .await?;

        self.machine.transition_to(DeviceState::ConnectingNetwork)?;
        self.display
            .show_message("WiFi", self.link.ssid())
            .await?;

        if !self.wait_for_link().await {
            self.machine.transition_to(DeviceState::ErrorNetwork)?;
            self.display.show_error("WiFi Gagal").await?;
            self.buzzer.play(BeepPattern::NetworkError).await?;
            return Ok(());
        }

        self.machine
            .transition_to(DeviceState::ValidatingCredential)?;
        self.display.show_message("Validasi...", "").await?;
        self.validate_and_settle().await
    }

    /// Run `ValidatingCredential` to its conclusion: idle on success, an
    /// error state otherwise. The machine must already be validating.
    async fn validate_and_settle(&mut self) -> Result<()> {
        match self.gateway.validate_credential().await {
            Ok(validation) if validation.valid => {
                self.machine.transition_to(DeviceState::Idle)?;
                self.buzzer.play(BeepPattern::Startup).await?;
                self.display.show_idle(&Self::clock()).await?;
                info!(device_id = ?self.gateway.device_id(), "terminal ready");
                Ok(())
            }
            Ok(validation) => {
                error!(message = %validation.message, "api key rejected");
                self.machine.transition_to(DeviceState::ErrorCredential)?;
                self.display.show_error("API Key Salah").await?;
                self.buzzer.play(BeepPattern::Error).await?;
                Ok(())
            }
            Err(GatewayError::NotConfigured) => {
                error!("server url or api key missing");
                self.machine.transition_to(DeviceState::ErrorCredential)?;
                self.display.show_error("Belum Dikonfig").await?;
                self.buzzer.play(BeepPattern::Error).await?;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "credential validation unreachable");
                self.machine.transition_to(DeviceState::ErrorNetwork)?;
                self.display.show_error("Server Gagal").await?;
                self.buzzer.play(BeepPattern::NetworkError).await?;
                Ok(())
            }
        }
    }

    /// One loop iteration: reconcile the link, poll pairing, handle a tap,
    /// expire the result screen.
    pub async fn run_once(&mut self) -> Result<()> {
        let connected = self.is_connected().await;

        // Link reconciliation. A drop mid-session also ends pairing mode.
        if !connected && self.machine.is_ready_for_card() {
            warn!("network link lost");
            if self.machine.is_in_pairing_mode() {
                self.machine.exit_pairing_mode()?;
            }
            self.machine.transition_to(DeviceState::ErrorNetwork)?;
            self.display.show_error("Jaringan Putus").await?;
            self.buzzer.play(BeepPattern::NetworkError).await?;
            return Ok(());
        }
        if connected && self.machine.current_state() == DeviceState::ErrorNetwork {
            info!("network link restored");
            if self.gateway.is_validated() {
                self.machine.transition_to(DeviceState::Idle)?;
                self.display.show_idle(&Self::clock()).await?;
            } else {
                // Parked here before validation ever succeeded (link down at
                // boot, or the backend unreachable during it): going straight
                // to Idle would refuse every tap. Re-run the boot tail.
                self.machine.transition_to(DeviceState::ConnectingNetwork)?;
                self.machine
                    .transition_to(DeviceState::ValidatingCredential)?;
                self.display.show_message("Validasi...", "").await?;
                return self.validate_and_settle().await;
            }
        }

        // Credential retry after a rejection.
        if self.machine.current_state() == DeviceState::ErrorCredential
            && self.machine.has_timed_out(self.timing.credential_retry)
        {
            self.machine
                .transition_to(DeviceState::ValidatingCredential)?;
            self.display.show_message("Validasi...", "").await?;
            return self.validate_and_settle().await;
        }

        // Pairing session poll.
        match self
            .coordinator
            .tick(&mut self.machine, &self.gateway, connected)
            .await?
        {
            PairingUpdate::Entered(student) => {
                self.display.show_pairing(&student).await?;
                self.buzzer.play(BeepPattern::PairingOk).await?;
            }
            PairingUpdate::Exited => {
                if self.machine.current_state() == DeviceState::Idle {
                    self.display.show_idle(&Self::clock()).await?;
                }
            }
            PairingUpdate::Skipped | PairingUpdate::NoChange => {}
        }

        // Card taps.
        if self.machine.is_ready_for_card() && self.reader.card_present().await? {
            match self.reader.read_uid().await {
                Ok(uid) => {
                    self.reader.halt().await?;
                    let dispatched = self
                        .dispatcher
                        .dispatch(uid, &mut self.machine, &self.gateway, connected)
                        .await?;
                    if let Some(result) = dispatched {
                        let feedback = feedback_for(&result);
                        self.display
                            .show_result(&feedback.line1, &feedback.line2)
                            .await?;
                        self.buzzer.play(feedback.beep).await?;
                    }
                }
                Err(e) => {
                    // Partial reads happen when a card leaves the field early.
                    debug!(error = %e, "card read failed");
                }
            }
        }

        // Result screen expiry.
        if self.machine.current_state() == DeviceState::ShowingResult
            && self.machine.has_timed_out(self.timing.result_window)
        {
            self.machine.transition_to(DeviceState::Idle)?;
            self.display.show_idle(&Self::clock()).await?;
        }

        Ok(())
    }

    /// Boot, then iterate the loop forever.
    ///
    /// # Errors
    /// Returns the first unrecoverable error (state machine bug or
    /// peripheral failure).
    pub async fn run(&mut self) -> Result<()> {
        self.boot().await?;
        info!(ssid = %self.link.ssid(), configured = self.config.is_configured(), "entering main loop");
        loop {
            self.run_once().await?;
            tokio::time::sleep(self.timing.loop_tick).await;
        }
    }
}
