use crate::{
    Result,
    constants::{MAX_UID_HEX_LEN, MIN_UID_HEX_LEN},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// RFID card UID as an uppercase hex string (8-20 characters).
///
/// # Security
/// This type implements constant-time comparison to prevent timing attacks
/// when comparing card UIDs during routing decisions.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct CardUid(String);

impl CardUid {
    /// Create a new card UID with validation.
    ///
    /// The UID is normalized (trimmed and converted to uppercase) before
    /// validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidCardUid` if:
    /// - The length is not between 8-20 characters (4-10 byte UIDs)
    /// - The length is odd (UIDs are whole bytes)
    /// - Any character is not a hex digit
    pub fn new(raw: &str) -> Result<Self> {
        let uid = raw.trim().to_uppercase();

        let len = uid.len();
        if !(MIN_UID_HEX_LEN..=MAX_UID_HEX_LEN).contains(&len) || len % 2 != 0 {
            return Err(Error::InvalidCardUid(format!(
                "UID must be {MIN_UID_HEX_LEN}-{MAX_UID_HEX_LEN} hex chars (even), got {len}"
            )));
        }

        if !uid.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidCardUid(format!("UID must be hex: {uid}")));
        }

        Ok(CardUid(uid))
    }

    /// Format raw UID bytes as an uppercase hex UID.
    ///
    /// # Errors
    /// Returns `Error::InvalidCardUid` if the byte count is outside 4-10.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let uid: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
        CardUid::new(&uid)
    }

    /// Get the UID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardUid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CardUid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CardUid::new(s)
    }
}

/// Constant-time comparison so equality checks take the same time regardless
/// of where the strings differ.
impl PartialEq for CardUid {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl std::hash::Hash for CardUid {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// Attendance result status reported by the backend.
///
/// The RFID endpoint reports `check_in`/`check_out` in its `type` field while
/// the schedule policy reports `on_time`/`late`/`very_late` in `status`;
/// unrecognized values are carried through as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    OnTime,
    Late,
    VeryLate,
    CheckIn,
    CheckOut,
    Other(String),
}

impl AttendanceStatus {
    /// Parse a backend status string. Never fails; unknown values map to
    /// `Other`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "on_time" => AttendanceStatus::OnTime,
            "late" => AttendanceStatus::Late,
            "very_late" => AttendanceStatus::VeryLate,
            "check_in" => AttendanceStatus::CheckIn,
            "check_out" => AttendanceStatus::CheckOut,
            other => AttendanceStatus::Other(other.to_string()),
        }
    }

    /// Backend wire value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            AttendanceStatus::OnTime => "on_time",
            AttendanceStatus::Late => "late",
            AttendanceStatus::VeryLate => "very_late",
            AttendanceStatus::CheckIn => "check_in",
            AttendanceStatus::CheckOut => "check_out",
            AttendanceStatus::Other(s) => s,
        }
    }

    /// User-facing label for the result screen.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            AttendanceStatus::OnTime => "Tepat Waktu",
            AttendanceStatus::Late => "Terlambat",
            AttendanceStatus::VeryLate => "Sangat Terlambat",
            AttendanceStatus::CheckIn => "Absen Masuk",
            AttendanceStatus::CheckOut => "Absen Pulang",
            AttendanceStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Backend validation error codes, parsed once at the gateway boundary.
///
/// The backend reports errors as free-form `VAL_*` strings; this closed set
/// keeps routing in the dispatcher and display layers exhaustive. Codes the
/// device has no specific handling for land in `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendErrorCode {
    /// No attendance schedule covers the current time.
    NoSchedule,
    /// Student already checked in for this schedule.
    AlreadyCheckedIn,
    /// Student already checked out today.
    AlreadyCheckedOut,
    /// RFID code is not registered to any student.
    InvalidRfid,
    /// Card is already paired to another student.
    RfidUsed,
    /// Device has been deactivated in the admin panel.
    DeviceInactive,
    /// Pairing session expired before the card was presented.
    SessionExpired,
    /// Any other backend code, carried verbatim.
    Unknown(String),
}

impl BackendErrorCode {
    /// Parse a backend error code string. Never fails.
    #[must_use]
    pub fn parse(code: &str) -> Self {
        match code {
            "VAL_NO_SCHEDULE" => BackendErrorCode::NoSchedule,
            "VAL_ALREADY_CHECKED_IN" => BackendErrorCode::AlreadyCheckedIn,
            "VAL_ALREADY_CHECKED_OUT" => BackendErrorCode::AlreadyCheckedOut,
            "VAL_INVALID_RFID" => BackendErrorCode::InvalidRfid,
            "VAL_RFID_USED" => BackendErrorCode::RfidUsed,
            "VAL_DEVICE_INACTIVE" => BackendErrorCode::DeviceInactive,
            "VAL_SESSION_EXPIRED" => BackendErrorCode::SessionExpired,
            other => BackendErrorCode::Unknown(other.to_string()),
        }
    }

    /// Backend wire code.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            BackendErrorCode::NoSchedule => "VAL_NO_SCHEDULE",
            BackendErrorCode::AlreadyCheckedIn => "VAL_ALREADY_CHECKED_IN",
            BackendErrorCode::AlreadyCheckedOut => "VAL_ALREADY_CHECKED_OUT",
            BackendErrorCode::InvalidRfid => "VAL_INVALID_RFID",
            BackendErrorCode::RfidUsed => "VAL_RFID_USED",
            BackendErrorCode::DeviceInactive => "VAL_DEVICE_INACTIVE",
            BackendErrorCode::SessionExpired => "VAL_SESSION_EXPIRED",
            BackendErrorCode::Unknown(code) => code,
        }
    }

    /// Short user-facing message for the result screen.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            BackendErrorCode::NoSchedule => "Tidak Ada Jadwal",
            BackendErrorCode::AlreadyCheckedIn => "Sudah Absen",
            BackendErrorCode::AlreadyCheckedOut => "Sudah Pulang",
            BackendErrorCode::InvalidRfid => "Kartu Tdk Dikenal",
            BackendErrorCode::RfidUsed => "Kartu Terpakai",
            BackendErrorCode::DeviceInactive => "Device Nonaktif",
            BackendErrorCode::SessionExpired => "Sesi Berakhir",
            BackendErrorCode::Unknown(_) => "Gagal",
        }
    }
}

impl fmt::Display for BackendErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a1b2c3d4", "A1B2C3D4")]
    #[case(" 04AABBCC ", "04AABBCC")]
    #[case("04AABBCCDDEE77", "04AABBCCDDEE77")]
    #[case("0102030405060708090A", "0102030405060708090A")]
    fn test_card_uid_valid(#[case] input: &str, #[case] expected: &str) {
        let uid = CardUid::new(input).unwrap();
        assert_eq!(uid.as_str(), expected);
    }

    #[rstest]
    #[case("A1B2C3")] // too short
    #[case("0102030405060708090A0B")] // too long
    #[case("A1B2C3D")] // odd length
    #[case("A1B2C3GG")] // non-hex
    fn test_card_uid_invalid(#[case] input: &str) {
        assert!(CardUid::new(input).is_err());
    }

    #[test]
    fn test_card_uid_from_bytes() {
        let uid = CardUid::from_bytes(&[0x04, 0xAB, 0xCD, 0xEF]).unwrap();
        assert_eq!(uid.as_str(), "04ABCDEF");

        assert!(CardUid::from_bytes(&[0x01, 0x02]).is_err());
        assert!(CardUid::from_bytes(&[0x01; 11]).is_err());
    }

    #[test]
    fn test_card_uid_eq_ignores_case_via_normalization() {
        let a = CardUid::new("a1b2c3d4").unwrap();
        let b = CardUid::new("A1B2C3D4").unwrap();
        assert_eq!(a, b);
    }

    #[rstest]
    #[case("on_time", AttendanceStatus::OnTime, "Tepat Waktu")]
    #[case("late", AttendanceStatus::Late, "Terlambat")]
    #[case("very_late", AttendanceStatus::VeryLate, "Sangat Terlambat")]
    #[case("check_in", AttendanceStatus::CheckIn, "Absen Masuk")]
    #[case("check_out", AttendanceStatus::CheckOut, "Absen Pulang")]
    fn test_attendance_status_parse(
        #[case] input: &str,
        #[case] expected: AttendanceStatus,
        #[case] label: &str,
    ) {
        let status = AttendanceStatus::parse(input);
        assert_eq!(status, expected);
        assert_eq!(status.label(), label);
        assert_eq!(status.as_str(), input);
    }

    #[test]
    fn test_attendance_status_other_fallback() {
        let status = AttendanceStatus::parse("half_day");
        assert_eq!(status, AttendanceStatus::Other("half_day".to_string()));
        assert_eq!(status.label(), "half_day");
    }

    #[rstest]
    #[case("VAL_NO_SCHEDULE", BackendErrorCode::NoSchedule)]
    #[case("VAL_ALREADY_CHECKED_IN", BackendErrorCode::AlreadyCheckedIn)]
    #[case("VAL_ALREADY_CHECKED_OUT", BackendErrorCode::AlreadyCheckedOut)]
    #[case("VAL_INVALID_RFID", BackendErrorCode::InvalidRfid)]
    #[case("VAL_RFID_USED", BackendErrorCode::RfidUsed)]
    #[case("VAL_DEVICE_INACTIVE", BackendErrorCode::DeviceInactive)]
    #[case("VAL_SESSION_EXPIRED", BackendErrorCode::SessionExpired)]
    fn test_backend_error_code_parse(#[case] input: &str, #[case] expected: BackendErrorCode) {
        let code = BackendErrorCode::parse(input);
        assert_eq!(code, expected);
        assert_eq!(code.code(), input);
    }

    #[test]
    fn test_backend_error_code_unknown_fallback() {
        let code = BackendErrorCode::parse("VAL_SOMETHING_NEW");
        assert_eq!(
            code,
            BackendErrorCode::Unknown("VAL_SOMETHING_NEW".to_string())
        );
        assert_eq!(code.code(), "VAL_SOMETHING_NEW");
        assert_eq!(code.user_message(), "Gagal");
    }
}
