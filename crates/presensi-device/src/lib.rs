//! Control core of the attendance terminal.
//!
//! - [`state`]: the device lifecycle state machine.
//! - [`dispatcher`]: accepts, rate-limits, and routes card taps.
//! - [`pairing`]: keeps the machine in sync with the backend pairing session.
//! - [`feedback`]: maps tap results to display lines and beep patterns.
//! - [`terminal`]: the cooperative loop tying it all together over the
//!   peripheral traits.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod feedback;
pub mod pairing;
pub mod state;
pub mod terminal;

pub use config::TerminalConfig;
pub use dispatcher::{CardEventDispatcher, OfflineReason, TapResult};
pub use error::{DeviceError, Result};
pub use feedback::{Feedback, feedback_for};
pub use pairing::{PairingCoordinator, PairingUpdate};
pub use state::{DeviceState, DeviceStateMachine, StateTransition};
pub use terminal::{Terminal, TerminalTiming};
