//! Peripheral abstraction for the attendance terminal.
//!
//! The terminal core talks to four peripherals: an RFID card reader, a 16x2
//! LCD, a buzzer, and the network link. Each is a trait so the device logic
//! can run against real drivers or the mock implementations in [`mock`].
//!
//! All traits use native `async fn` methods (Edition 2024 RPITIT); consumers
//! take them as generic type parameters rather than trait objects.

pub mod error;
pub mod mock;
pub mod traits;

pub use error::{HardwareError, Result};
pub use traits::{BeepPattern, Buzzer, CardReader, Connectivity, TerminalDisplay};
