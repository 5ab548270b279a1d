//! Mock RFID reader.

use crate::{Result, traits::CardReader};
use presensi_core::CardUid;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Mock RFID reader backed by a shared queue of presented cards.
///
/// The terminal polls `card_present()`, so the mock models presentations as
/// a queue rather than a blocking channel: the handle pushes UIDs, the
/// reader reports a card present while the queue is non-empty and pops on
/// `read_uid()`.
///
/// # Examples
///
/// ```
/// use presensi_hardware::mock::MockCardReader;
/// use presensi_hardware::CardReader;
/// use presensi_core::CardUid;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> presensi_hardware::Result<()> {
///     let (mut reader, handle) = MockCardReader::new();
///
///     handle.present_card(CardUid::new("A1B2C3D4").unwrap());
///     assert!(reader.card_present().await?);
///
///     let uid = reader.read_uid().await?;
///     assert_eq!(uid.as_str(), "A1B2C3D4");
///     reader.halt().await?;
///
///     assert!(!reader.card_present().await?);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockCardReader {
    queue: Arc<Mutex<VecDeque<CardUid>>>,
    halt_count: Arc<Mutex<usize>>,
}

impl MockCardReader {
    /// Create a new mock reader and its handle.
    pub fn new() -> (Self, MockCardReaderHandle) {
        let queue = Arc::new(Mutex::new(VecDeque::new()));
        let halt_count = Arc::new(Mutex::new(0));

        let reader = Self {
            queue: Arc::clone(&queue),
            halt_count: Arc::clone(&halt_count),
        };
        let handle = MockCardReaderHandle { queue, halt_count };

        (reader, handle)
    }
}

impl CardReader for MockCardReader {
    async fn card_present(&mut self) -> Result<bool> {
        Ok(!self.queue.lock().expect("reader queue poisoned").is_empty())
    }

    async fn read_uid(&mut self) -> Result<CardUid> {
        self.queue
            .lock()
            .expect("reader queue poisoned")
            .pop_front()
            .ok_or_else(|| crate::HardwareError::card_read("no card on reader"))
    }

    async fn halt(&mut self) -> Result<()> {
        *self.halt_count.lock().expect("halt counter poisoned") += 1;
        Ok(())
    }
}

/// Handle for driving a [`MockCardReader`] from tests.
#[derive(Debug, Clone)]
pub struct MockCardReaderHandle {
    queue: Arc<Mutex<VecDeque<CardUid>>>,
    halt_count: Arc<Mutex<usize>>,
}

impl MockCardReaderHandle {
    /// Queue a card presentation.
    pub fn present_card(&self, uid: CardUid) {
        self.queue
            .lock()
            .expect("reader queue poisoned")
            .push_back(uid);
    }

    /// Number of `halt()` calls the terminal has issued.
    pub fn halt_count(&self) -> usize {
        *self.halt_count.lock().expect("halt counter poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_without_card_fails() {
        let (mut reader, _handle) = MockCardReader::new();
        assert!(!reader.card_present().await.unwrap());
        assert!(reader.read_uid().await.is_err());
    }

    #[tokio::test]
    async fn test_presentations_are_fifo() {
        let (mut reader, handle) = MockCardReader::new();
        handle.present_card(CardUid::new("A1B2C3D4").unwrap());
        handle.present_card(CardUid::new("0102030405060708").unwrap());

        assert_eq!(reader.read_uid().await.unwrap().as_str(), "A1B2C3D4");
        assert_eq!(
            reader.read_uid().await.unwrap().as_str(),
            "0102030405060708"
        );
    }

    #[tokio::test]
    async fn test_halt_is_counted() {
        let (mut reader, handle) = MockCardReader::new();
        reader.halt().await.unwrap();
        reader.halt().await.unwrap();
        assert_eq!(handle.halt_count(), 2);
    }
}
