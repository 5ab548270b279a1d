//! Tap result to display/buzzer feedback mapping.

use crate::dispatcher::TapResult;
use presensi_api::AttendanceError;
use presensi_core::constants::LCD_COLS;
use presensi_hardware::BeepPattern;

/// What to show and play for a tap result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub line1: String,
    pub line2: String,
    pub beep: BeepPattern,
}

fn fit(s: &str) -> String {
    s.chars().take(LCD_COLS).collect()
}

/// Map a tap result to its user feedback.
#[must_use]
pub fn feedback_for(result: &TapResult) -> Feedback {
    match result {
        TapResult::Attendance(outcome) if outcome.success => Feedback {
            line1: fit(&outcome.student_name),
            line2: fit(outcome.status.label()),
            beep: BeepPattern::Success,
        },
        TapResult::Attendance(outcome) => match &outcome.error {
            Some(AttendanceError::Network { status }) => Feedback {
                line1: "Error Jaringan".to_string(),
                line2: format!("HTTP {status}"),
                beep: BeepPattern::NetworkError,
            },
            _ => Feedback {
                line1: "Gagal".to_string(),
                line2: fit(&outcome.message),
                beep: BeepPattern::Error,
            },
        },
        TapResult::Pairing(outcome) if outcome.success => Feedback {
            line1: fit(&outcome.student_name),
            line2: "Pairing OK".to_string(),
            beep: BeepPattern::PairingOk,
        },
        TapResult::Pairing(outcome) => Feedback {
            line1: "Gagal".to_string(),
            line2: fit(&outcome.message),
            beep: BeepPattern::Error,
        },
        TapResult::Offline { uid, reason } => Feedback {
            line1: fit(uid.as_str()),
            line2: reason.label().to_string(),
            beep: BeepPattern::Error,
        },
        TapResult::Unreachable => Feedback {
            line1: "Error Jaringan".to_string(),
            line2: "Coba Lagi".to_string(),
            beep: BeepPattern::NetworkError,
        },
    }
}
