//! Mock peripheral implementations for testing and the terminal simulator.
//!
//! Each mock comes with a handle that drives or inspects it from the test
//! side: the reader handle queues card presentations, the display and buzzer
//! handles record what the terminal rendered and played, the connectivity
//! handle toggles the link state.

mod buzzer;
mod connectivity;
mod display;
mod reader;

pub use buzzer::{MockBuzzer, MockBuzzerHandle};
pub use connectivity::{MockConnectivity, MockConnectivityHandle};
pub use display::{MockDisplay, MockDisplayHandle, Screen};
pub use reader::{MockCardReader, MockCardReaderHandle};
