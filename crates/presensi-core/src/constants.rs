//! Core constants for the attendance terminal.
//!
//! These values mirror the timing budget of the target hardware: a single
//! cooperative loop where network calls are the only blocking operations.
//! Changing the retry/timeout values changes the worst-case time a card tap
//! can stall the loop (`timeout * attempts + delays`).

use std::time::Duration;

// ============================================================================
// Backend endpoints
// ============================================================================

/// API key validation endpoint (POST, `{api_key}`).
pub const ENDPOINT_VALIDATE_KEY: &str = "/api/v1/public/devices/validate-key";

/// Attendance recording endpoint (POST, `{api_key, rfid_code}`).
pub const ENDPOINT_ATTENDANCE_RFID: &str = "/api/v1/public/attendance/rfid";

/// Card pairing registration endpoint (POST, `{api_key, rfid_code}`).
pub const ENDPOINT_PAIRING_RFID: &str = "/api/v1/public/pairing/rfid";

/// Pairing session status endpoint prefix (GET, `/{device_id}` appended).
pub const ENDPOINT_PAIRING_STATUS: &str = "/api/v1/public/pairing/status";

// ============================================================================
// Network timing
// ============================================================================

/// How long boot waits for the network link before giving up.
pub const NETWORK_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-attempt HTTP timeout.
pub const API_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Retry budget for a single logical API call.
pub const API_MAX_ATTEMPTS: u32 = 3;

/// Delay between attempts of state-changing (POST) calls.
pub const POST_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Delay between attempts of read-only (GET) calls.
pub const GET_RETRY_DELAY: Duration = Duration::from_millis(500);

// ============================================================================
// Loop timing
// ============================================================================

/// Interval between pairing-session status polls.
pub const PAIRING_POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// Minimum time between two accepted card taps. Taps inside the window are
/// acknowledged at the reader but produce no processing.
pub const CARD_COOLDOWN: Duration = Duration::from_millis(1000);

/// How long a tap result stays on the display before returning to idle.
pub const RESULT_DISPLAY_WINDOW: Duration = Duration::from_millis(1500);

/// Pause between cooperative loop iterations.
pub const LOOP_TICK: Duration = Duration::from_millis(50);

// ============================================================================
// Card UIDs
// ============================================================================

/// Minimum UID length in hex characters (4-byte ISO 14443 UID).
pub const MIN_UID_HEX_LEN: usize = 8;

/// Maximum UID length in hex characters (10-byte ISO 14443 UID).
pub const MAX_UID_HEX_LEN: usize = 20;

// ============================================================================
// Display
// ============================================================================

/// Character width of the terminal LCD (16x2). Collaborators truncate to this.
pub const LCD_COLS: usize = 16;
