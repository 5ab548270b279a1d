//! Attendance operations on top of the transport layer.
//!
//! Each operation builds the request payload, sends it through
//! [`HttpClient`] with the retry policy matching its method, and translates
//! the response into a typed outcome. Backend rejections of a card tap
//! (unknown card, duplicate check-in, expired session) are data, not errors:
//! they come back inside [`AttendanceOutcome`] / [`PairingOutcome`] so the
//! caller can show them and return to idle. Only transport exhaustion and
//! configuration problems surface as `Err`.

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::{GatewayError, TransportError};
use crate::http::{HttpClient, Method, RetryPolicy};
use presensi_core::constants::{
    ENDPOINT_ATTENDANCE_RFID, ENDPOINT_PAIRING_RFID, ENDPOINT_PAIRING_STATUS,
    ENDPOINT_VALIDATE_KEY,
};
use presensi_core::{AttendanceStatus, BackendErrorCode, CardUid};

/// Result of API key validation.
#[derive(Debug, Clone)]
pub struct CredentialValidation {
    pub valid: bool,
    pub device_id: Option<u64>,
    pub school_id: Option<u64>,
    pub message: String,
}

/// Why an attendance tap did not record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceError {
    /// Backend rejected the tap with a validation code.
    Backend(BackendErrorCode),
    /// Backend answered 200 but the payload named no student.
    CardNotFound,
    /// Backend answered with an unexpected HTTP status.
    Network { status: u16 },
}

/// Outcome of a single attendance tap.
#[derive(Debug, Clone)]
pub struct AttendanceOutcome {
    pub success: bool,
    pub student_name: String,
    pub status: AttendanceStatus,
    pub error: Option<AttendanceError>,
    pub message: String,
}

/// Why a pairing tap did not register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingError {
    /// Card already paired to another student (HTTP 409).
    CardAlreadyUsed,
    /// Backend rejected the request (HTTP 400), message carries the reason.
    BadRequest,
    /// Backend answered with an unexpected HTTP status.
    Network { status: u16 },
}

/// Outcome of a pairing tap.
#[derive(Debug, Clone)]
pub struct PairingOutcome {
    pub success: bool,
    pub student_name: String,
    pub error: Option<PairingError>,
    pub message: String,
}

/// Current pairing session as reported by the status poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingSession {
    pub active: bool,
    pub student_name: String,
}

impl PairingSession {
    /// The no-session value, also used when the poll fails.
    #[must_use]
    pub fn inactive() -> Self {
        Self {
            active: false,
            student_name: String::new(),
        }
    }
}

// Wire shapes. Every field is optional or defaulted: the backend has grown
// fields over time and the device must keep working against older payloads.

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<ErrorDetail>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ValidationData {
    #[serde(default)]
    valid: Option<bool>,
    #[serde(default)]
    device_id: Option<u64>,
    #[serde(default)]
    school_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct StudentRef {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AttendanceData {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    student_name: Option<String>,
    #[serde(default)]
    student: Option<StudentRef>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl AttendanceData {
    fn name(&self) -> Option<&str> {
        self.student_name
            .as_deref()
            .or_else(|| self.student.as_ref().and_then(|s| s.name.as_deref()))
            .filter(|n| !n.is_empty())
    }
}

/// Pairing registration answer. The backend emits the name flat next to
/// `success`; older builds nested it under `data`. Both shapes are read.
#[derive(Debug, Deserialize)]
struct PairingBody {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    student_name: Option<String>,
    data: Option<PairingData>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PairingData {
    #[serde(default)]
    student_name: Option<String>,
}

impl PairingBody {
    fn name(&self) -> Option<&str> {
        self.student_name
            .as_deref()
            .or_else(|| self.data.as_ref().and_then(|d| d.student_name.as_deref()))
            .filter(|n| !n.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct PairingStatusData {
    #[serde(default)]
    active: bool,
    #[serde(default)]
    student_name: Option<String>,
}

/// Gateway to the attendance backend, bound to one device's API key.
///
/// Holds the device id assigned by credential validation; until validation
/// succeeds the device-scoped operations report themselves unavailable.
#[derive(Debug, Clone)]
pub struct AttendanceGateway {
    http: HttpClient,
    api_key: String,
    device_id: Option<u64>,
}

impl AttendanceGateway {
    #[must_use]
    pub fn new(http: HttpClient, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            device_id: None,
        }
    }

    /// Whether both a server URL and an API key are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.http.is_configured() && !self.api_key.is_empty()
    }

    /// Whether credential validation has assigned a device id.
    #[must_use]
    pub fn is_validated(&self) -> bool {
        self.device_id.is_some()
    }

    /// Device id assigned by the backend, if validated.
    #[must_use]
    pub fn device_id(&self) -> Option<u64> {
        self.device_id
    }

    /// Override the cached device id. Used when the id is restored from
    /// persisted configuration instead of a fresh validation.
    pub fn set_device_id(&mut self, device_id: u64) {
        self.device_id = Some(device_id);
    }

    /// Validate the API key against the backend and cache the assigned
    /// device id on success.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::NotConfigured` without any network traffic if
    /// the URL or key is missing, `Transport` on retry exhaustion.
    pub async fn validate_credential(&mut self) -> Result<CredentialValidation, GatewayError> {
        if !self.is_configured() {
            return Err(GatewayError::NotConfigured);
        }

        let body = json!({ "api_key": self.api_key });
        let response = self
            .http
            .send(
                Method::Post,
                ENDPOINT_VALIDATE_KEY,
                Some(&body),
                RetryPolicy::mutating(),
            )
            .await?;

        if response.is_ok() {
            let envelope: Envelope<ValidationData> = serde_json::from_str(&response.body)
                .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
            let data = envelope.data.unwrap_or_default();
            // `data.valid` is the primary signal; older backends omit it and
            // validity falls back to success plus an assigned device id.
            let valid = data
                .valid
                .unwrap_or(envelope.success && data.device_id.is_some());
            if valid && let Some(id) = data.device_id {
                self.device_id = Some(id);
            }
            info!(valid, device_id = ?data.device_id, "credential validated");
            return Ok(CredentialValidation {
                valid,
                device_id: data.device_id,
                school_id: data.school_id,
                message: envelope.message.unwrap_or_default(),
            });
        }

        if response.status == 401 || response.status == 403 || response.status == 404 {
            let message = parse_error_message(&response.body)
                .unwrap_or_else(|| "invalid api key".to_string());
            warn!(status = response.status, %message, "credential rejected");
            return Ok(CredentialValidation {
                valid: false,
                device_id: None,
                school_id: None,
                message,
            });
        }

        Err(GatewayError::UnexpectedStatus {
            status: response.status,
        })
    }

    /// Record an attendance tap for `uid`.
    ///
    /// Backend rejections come back inside the outcome; only transport
    /// exhaustion is an `Err`.
    ///
    /// A payload that names a student is treated as a successful record even
    /// when its `success` flags say otherwise. The backend has been observed
    /// to set `success: false` on records it nonetheless stored; showing the
    /// student an error for a stored record is the worse failure.
    pub async fn record_attendance(
        &self,
        uid: &CardUid,
    ) -> Result<AttendanceOutcome, TransportError> {
        let body = json!({ "api_key": self.api_key, "rfid_code": uid.as_str() });
        let response = self
            .http
            .send(
                Method::Post,
                ENDPOINT_ATTENDANCE_RFID,
                Some(&body),
                RetryPolicy::mutating(),
            )
            .await?;

        if response.is_ok() {
            return Ok(self.parse_attendance_success(&response.body));
        }

        if response.status == 400 || response.status == 404 {
            let error = match parse_error_code(&response.body) {
                Some(code) => AttendanceError::Backend(code),
                None => AttendanceError::CardNotFound,
            };
            let message = match &error {
                AttendanceError::Backend(code) => code.user_message().to_string(),
                _ => parse_error_message(&response.body)
                    .unwrap_or_else(|| "card_not_found".to_string()),
            };
            debug!(status = response.status, ?error, "attendance rejected");
            return Ok(AttendanceOutcome {
                success: false,
                student_name: String::new(),
                status: AttendanceStatus::Other(String::new()),
                error: Some(error),
                message,
            });
        }

        warn!(status = response.status, "unexpected attendance status");
        Ok(AttendanceOutcome {
            success: false,
            student_name: String::new(),
            status: AttendanceStatus::Other(String::new()),
            error: Some(AttendanceError::Network {
                status: response.status,
            }),
            message: format!("HTTP {}", response.status),
        })
    }

    fn parse_attendance_success(&self, body: &str) -> AttendanceOutcome {
        let envelope: Envelope<AttendanceData> = match serde_json::from_str(body) {
            Ok(env) => env,
            Err(e) => {
                warn!(error = %e, "unparseable attendance payload");
                return AttendanceOutcome {
                    success: false,
                    student_name: String::new(),
                    status: AttendanceStatus::Other(String::new()),
                    error: Some(AttendanceError::CardNotFound),
                    message: "card_not_found".to_string(),
                };
            }
        };

        let data = envelope.data;
        let name = data
            .as_ref()
            .and_then(AttendanceData::name)
            .unwrap_or_default()
            .to_string();
        let status_str = data
            .as_ref()
            .and_then(|d| d.kind.as_deref().or(d.status.as_deref()))
            .unwrap_or_default();
        let status = AttendanceStatus::parse(status_str);
        let mut success = envelope.success || data.as_ref().is_some_and(|d| d.success);

        // A record that names a student was stored, whatever the flags say.
        if !name.is_empty() {
            success = true;
        }

        // The record's own message sits in `data`; the envelope message is a
        // transport-level summary and only a fallback.
        let message = data
            .as_ref()
            .and_then(|d| d.message.clone())
            .or(envelope.message)
            .unwrap_or_default();

        if success {
            info!(student = %name, status = %status, "attendance recorded");
            AttendanceOutcome {
                success: true,
                student_name: name,
                status,
                error: None,
                message,
            }
        } else {
            AttendanceOutcome {
                success: false,
                student_name: name,
                status,
                error: Some(AttendanceError::CardNotFound),
                message: "card_not_found".to_string(),
            }
        }
    }

    /// Register `uid` for the active pairing session.
    pub async fn process_pairing(&self, uid: &CardUid) -> Result<PairingOutcome, TransportError> {
        let body = json!({ "api_key": self.api_key, "rfid_code": uid.as_str() });
        let response = self
            .http
            .send(
                Method::Post,
                ENDPOINT_PAIRING_RFID,
                Some(&body),
                RetryPolicy::mutating(),
            )
            .await?;

        if response.is_ok() {
            let parsed: Result<PairingBody, _> = serde_json::from_str(&response.body);
            let (success, name, message) = match parsed {
                Ok(body) => (
                    body.success,
                    body.name().unwrap_or_default().to_string(),
                    body.message.unwrap_or_default(),
                ),
                Err(_) => (false, String::new(), String::new()),
            };
            if success {
                info!(student = %name, "card paired");
            }
            return Ok(PairingOutcome {
                success,
                student_name: name,
                error: None,
                message,
            });
        }

        let outcome = match response.status {
            409 => PairingOutcome {
                success: false,
                student_name: String::new(),
                error: Some(PairingError::CardAlreadyUsed),
                message: BackendErrorCode::RfidUsed.user_message().to_string(),
            },
            400 => PairingOutcome {
                success: false,
                student_name: String::new(),
                error: Some(PairingError::BadRequest),
                message: parse_error_message(&response.body)
                    .unwrap_or_else(|| "pairing rejected".to_string()),
            },
            status => PairingOutcome {
                success: false,
                student_name: String::new(),
                error: Some(PairingError::Network { status }),
                message: format!("HTTP {status}"),
            },
        };
        debug!(status = response.status, ?outcome.error, "pairing rejected");
        Ok(outcome)
    }

    /// Poll whether a pairing session is active for this device.
    ///
    /// Total: any failure (not validated, transport exhaustion, bad payload)
    /// reads as "no session" so the poll can never wedge the loop.
    pub async fn check_pairing_status(&self) -> PairingSession {
        let Some(device_id) = self.device_id else {
            return PairingSession::inactive();
        };

        let path = format!("{ENDPOINT_PAIRING_STATUS}/{device_id}");
        let response = match self
            .http
            .send(Method::Get, &path, None, RetryPolicy::read())
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                debug!(error = %e, "pairing status poll failed");
                return PairingSession::inactive();
            }
        };

        if !response.is_ok() {
            return PairingSession::inactive();
        }

        match serde_json::from_str::<Envelope<PairingStatusData>>(&response.body) {
            Ok(env) => {
                let data = env.data.unwrap_or(PairingStatusData {
                    active: false,
                    student_name: None,
                });
                PairingSession {
                    active: data.active,
                    student_name: data.student_name.unwrap_or_default(),
                }
            }
            Err(e) => {
                debug!(error = %e, "unparseable pairing status payload");
                PairingSession::inactive()
            }
        }
    }
}

fn parse_error_code(body: &str) -> Option<BackendErrorCode> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let code = parsed.error?.code?;
    Some(BackendErrorCode::parse(&code))
}

fn parse_error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .error
        .and_then(|e| e.message)
        .or(parsed.message)
        .filter(|m| !m.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_configured_without_key() {
        let gateway = AttendanceGateway::new(HttpClient::new("http://localhost:3000"), "");
        assert!(!gateway.is_configured());

        let gateway = AttendanceGateway::new(HttpClient::new(""), "psk_abc123");
        assert!(!gateway.is_configured());
    }

    #[test]
    fn test_device_id_cache() {
        let mut gateway =
            AttendanceGateway::new(HttpClient::new("http://localhost:3000"), "psk_abc123");
        assert!(!gateway.is_validated());
        gateway.set_device_id(7);
        assert!(gateway.is_validated());
        assert_eq!(gateway.device_id(), Some(7));
    }

    #[test]
    fn test_parse_error_code_shapes() {
        let body = r#"{"success":false,"error":{"code":"VAL_NO_SCHEDULE","message":"no schedule"}}"#;
        assert_eq!(
            parse_error_code(body),
            Some(BackendErrorCode::NoSchedule)
        );
        assert_eq!(parse_error_message(body), Some("no schedule".to_string()));

        assert_eq!(parse_error_code("not json"), None);
        assert_eq!(parse_error_code(r#"{"success":false}"#), None);
    }
}
