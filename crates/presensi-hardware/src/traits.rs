//! Peripheral trait definitions.
//!
//! These traits establish the contract between the terminal core and its
//! peripherals (RFID reader, LCD, buzzer, network link), enabling easy
//! substitution between mock and real hardware implementations.
//!
//! # Object Safety and Dynamic Dispatch
//!
//! These traits are NOT object-safe because `async fn` methods return
//! `impl Future` (Edition 2024 RPITIT). Use generic type parameters:
//!
//! ```no_run
//! use presensi_hardware::{CardReader, Result};
//!
//! async fn poll<R: CardReader>(reader: &mut R) -> Result<bool> {
//!     reader.card_present().await
//! }
//! ```

#![allow(async_fn_in_trait)]

use crate::error::Result;
use presensi_core::CardUid;

/// Buzzer feedback patterns.
///
/// Each pattern maps to a fixed beep sequence on the device:
/// - `Startup`: 1x long, played once the boot sequence reaches idle
/// - `Success`: 1x short, attendance recorded
/// - `PairingOk`: 2x short, card paired or pairing mode entered
/// - `Error`: 3x short, rejected card or backend validation error
/// - `NetworkError`: 2x long, transport failure or connectivity loss
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeepPattern {
    Startup,
    Success,
    PairingOk,
    Error,
    NetworkError,
}

/// RFID card reader abstraction.
///
/// The terminal polls `card_present()` every loop iteration and only calls
/// `read_uid()` when a card is on the antenna. `halt()` releases the card so
/// the next physical presentation is detectable; the loop calls it after
/// every read, including taps suppressed by the cooldown window.
pub trait CardReader: Send + Sync {
    /// Non-blocking check whether a card is currently on the reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader cannot be queried.
    async fn card_present(&mut self) -> Result<bool>;

    /// Read the UID of the presented card.
    ///
    /// Must only be called after `card_present()` reported `true`.
    ///
    /// # Errors
    ///
    /// Returns an error if the card moved away mid-read or the UID is
    /// malformed.
    async fn read_uid(&mut self) -> Result<CardUid>;

    /// Release the card and stop communication, allowing the next
    /// presentation to be detected.
    ///
    /// # Errors
    ///
    /// Returns an error on communication failure.
    async fn halt(&mut self) -> Result<()>;
}

/// 16x2 LCD abstraction.
///
/// Implementations own text truncation to the panel width; callers may pass
/// longer strings.
pub trait TerminalDisplay: Send + Sync {
    /// Show two free-form lines.
    async fn show_message(&mut self, line1: &str, line2: &str) -> Result<()>;

    /// Show the idle screen ("Tap Kartu..." plus the wall clock).
    async fn show_idle(&mut self, clock: &str) -> Result<()>;

    /// Show the pairing-mode screen with the student being paired.
    async fn show_pairing(&mut self, student_name: &str) -> Result<()>;

    /// Show a tap result (name/status or error summary).
    async fn show_result(&mut self, line1: &str, line2: &str) -> Result<()>;

    /// Show an error screen.
    async fn show_error(&mut self, message: &str) -> Result<()>;
}

/// Buzzer abstraction.
pub trait Buzzer: Send + Sync {
    /// Play a feedback pattern to completion.
    async fn play(&mut self, pattern: BeepPattern) -> Result<()>;
}

/// Network link abstraction.
///
/// Association/reconnection is handled outside the core; the loop only needs
/// the current link state to gate network calls and drive the
/// idle/network-error reconciliation.
pub trait Connectivity: Send + Sync {
    /// Whether the network link is currently up.
    async fn is_connected(&self) -> Result<bool>;

    /// SSID of the configured network, for the connecting screen.
    fn ssid(&self) -> &str;
}
