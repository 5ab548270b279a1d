//! Gateway integration tests against a mock backend.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use presensi_api::{
    AttendanceError, AttendanceGateway, HttpClient, Method, PairingError, RetryPolicy,
    TransportError,
};
use presensi_core::constants::{
    ENDPOINT_ATTENDANCE_RFID, ENDPOINT_PAIRING_RFID, ENDPOINT_PAIRING_STATUS,
    ENDPOINT_VALIDATE_KEY,
};
use presensi_core::{AttendanceStatus, BackendErrorCode, CardUid};

const API_KEY: &str = "psk_test_key";

fn short_client(server: &MockServer) -> HttpClient {
    HttpClient::with_timeout(&server.uri(), Duration::from_millis(100))
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(50))
}

fn uid() -> CardUid {
    CardUid::new("04AABBCC").unwrap()
}

// --------------------------------------------------------------------------
// Transport retries
// --------------------------------------------------------------------------

#[tokio::test]
async fn test_send_retries_past_timeouts() {
    let server = MockServer::start().await;

    // First two attempts hang past the per-attempt timeout, third answers.
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .mount(&server)
        .await;

    let client = short_client(&server);
    let response = client
        .send(Method::Get, "/ping", None, fast_retry())
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "pong");
}

#[tokio::test]
async fn test_send_exhausts_retry_budget() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .expect(3)
        .mount(&server)
        .await;

    let client = short_client(&server);
    let err = client
        .send(Method::Get, "/ping", None, fast_retry())
        .await
        .unwrap_err();

    match err {
        TransportError::RetriesExhausted { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn test_send_does_not_retry_http_errors() {
    let server = MockServer::start().await;

    // A 404 is a response; exactly one request must reach the server.
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .mount(&server)
        .await;

    let client = short_client(&server);
    let response = client
        .send(Method::Get, "/missing", None, fast_retry())
        .await
        .unwrap();

    assert_eq!(response.status, 404);
}

// --------------------------------------------------------------------------
// Credential validation
// --------------------------------------------------------------------------

#[tokio::test]
async fn test_validate_credential_caches_device_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT_VALIDATE_KEY))
        .and(body_json_string(
            json!({ "api_key": API_KEY }).to_string(),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "device_id": 12, "school_id": 3, "device_name": "Gerbang Utama" },
        })))
        .mount(&server)
        .await;

    let mut gateway = AttendanceGateway::new(short_client(&server), API_KEY);
    let validation = gateway.validate_credential().await.unwrap();

    assert!(validation.valid);
    assert_eq!(validation.device_id, Some(12));
    assert_eq!(validation.school_id, Some(3));
    assert!(gateway.is_validated());
    assert_eq!(gateway.device_id(), Some(12));
}

#[tokio::test]
async fn test_validate_credential_explicit_valid_flag() {
    let server = MockServer::start().await;

    // Backend says valid: false even though a device id is attached; the
    // explicit flag wins and nothing is cached.
    Mock::given(method("POST"))
        .and(path(ENDPOINT_VALIDATE_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "valid": false, "device_id": 12 },
        })))
        .mount(&server)
        .await;

    let mut gateway = AttendanceGateway::new(short_client(&server), API_KEY);
    let validation = gateway.validate_credential().await.unwrap();

    assert!(!validation.valid);
    assert_eq!(validation.device_id, Some(12));
    assert!(!gateway.is_validated());
}

#[tokio::test]
async fn test_validate_credential_rejected_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT_VALIDATE_KEY))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "error": { "code": "AUTH_INVALID_KEY", "message": "api key not recognized" },
        })))
        .mount(&server)
        .await;

    let mut gateway = AttendanceGateway::new(short_client(&server), API_KEY);
    let validation = gateway.validate_credential().await.unwrap();

    assert!(!validation.valid);
    assert_eq!(validation.message, "api key not recognized");
    assert!(!gateway.is_validated());
}

#[tokio::test]
async fn test_validate_credential_unconfigured_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT_VALIDATE_KEY))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut gateway = AttendanceGateway::new(short_client(&server), "");
    assert!(gateway.validate_credential().await.is_err());
}

// --------------------------------------------------------------------------
// Attendance recording
// --------------------------------------------------------------------------

#[tokio::test]
async fn test_record_attendance_on_time() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT_ATTENDANCE_RFID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "success": true,
                "student": { "name": "Budi Santoso" },
                "type": "check_in",
                "status": "on_time",
                "message": "Absen masuk tercatat",
            },
        })))
        .mount(&server)
        .await;

    let gateway = AttendanceGateway::new(short_client(&server), API_KEY);
    let outcome = gateway.record_attendance(&uid()).await.unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.student_name, "Budi Santoso");
    assert_eq!(outcome.status, AttendanceStatus::CheckIn);
    assert!(outcome.error.is_none());
    // The record's message comes from `data`, not the envelope.
    assert_eq!(outcome.message, "Absen masuk tercatat");
}

#[tokio::test]
async fn test_record_attendance_name_overrides_false_flags() {
    let server = MockServer::start().await;

    // Observed backend quirk: stored record reported with success: false.
    Mock::given(method("POST"))
        .and(path(ENDPOINT_ATTENDANCE_RFID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "data": {
                "success": false,
                "student_name": "Ali Akbar",
                "status": "late",
            },
        })))
        .mount(&server)
        .await;

    let gateway = AttendanceGateway::new(short_client(&server), API_KEY);
    let outcome = gateway.record_attendance(&uid()).await.unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.student_name, "Ali Akbar");
    assert_eq!(outcome.status, AttendanceStatus::Late);
}

#[tokio::test]
async fn test_record_attendance_backend_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT_ATTENDANCE_RFID))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "error": {
                "code": "VAL_ALREADY_CHECKED_IN",
                "message": "student already checked in",
            },
        })))
        .mount(&server)
        .await;

    let gateway = AttendanceGateway::new(short_client(&server), API_KEY);
    let outcome = gateway.record_attendance(&uid()).await.unwrap();

    assert!(!outcome.success);
    assert_eq!(
        outcome.error,
        Some(AttendanceError::Backend(BackendErrorCode::AlreadyCheckedIn))
    );
    assert_eq!(outcome.message, "Sudah Absen");
}

#[tokio::test]
async fn test_record_attendance_unknown_card() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT_ATTENDANCE_RFID))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let gateway = AttendanceGateway::new(short_client(&server), API_KEY);
    let outcome = gateway.record_attendance(&uid()).await.unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.error, Some(AttendanceError::CardNotFound));
}

#[tokio::test]
async fn test_record_attendance_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT_ATTENDANCE_RFID))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let gateway = AttendanceGateway::new(short_client(&server), API_KEY);
    let outcome = gateway.record_attendance(&uid()).await.unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.error, Some(AttendanceError::Network { status: 500 }));
}

// --------------------------------------------------------------------------
// Pairing
// --------------------------------------------------------------------------

#[tokio::test]
async fn test_process_pairing_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT_PAIRING_RFID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "student_name": "Siti Rahma" },
            "message": "card registered",
        })))
        .mount(&server)
        .await;

    let gateway = AttendanceGateway::new(short_client(&server), API_KEY);
    let outcome = gateway.process_pairing(&uid()).await.unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.student_name, "Siti Rahma");
}

#[tokio::test]
async fn test_process_pairing_flat_body() {
    let server = MockServer::start().await;

    // The backend answers the registration flat, name next to success.
    Mock::given(method("POST"))
        .and(path(ENDPOINT_PAIRING_RFID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "student_name": "Siti Rahma",
            "message": "card registered",
        })))
        .mount(&server)
        .await;

    let gateway = AttendanceGateway::new(short_client(&server), API_KEY);
    let outcome = gateway.process_pairing(&uid()).await.unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.student_name, "Siti Rahma");
    assert_eq!(outcome.message, "card registered");
}

#[tokio::test]
async fn test_process_pairing_card_already_used() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT_PAIRING_RFID))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "success": false,
            "error": { "code": "VAL_RFID_USED", "message": "card already paired" },
        })))
        .mount(&server)
        .await;

    let gateway = AttendanceGateway::new(short_client(&server), API_KEY);
    let outcome = gateway.process_pairing(&uid()).await.unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.error, Some(PairingError::CardAlreadyUsed));
    assert_eq!(outcome.message, "Kartu Terpakai");
}

#[tokio::test]
async fn test_process_pairing_bad_request_carries_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT_PAIRING_RFID))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "error": { "code": "VAL_SESSION_EXPIRED", "message": "session expired" },
        })))
        .mount(&server)
        .await;

    let gateway = AttendanceGateway::new(short_client(&server), API_KEY);
    let outcome = gateway.process_pairing(&uid()).await.unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.error, Some(PairingError::BadRequest));
    assert_eq!(outcome.message, "session expired");
}

// --------------------------------------------------------------------------
// Pairing status poll
// --------------------------------------------------------------------------

#[tokio::test]
async fn test_check_pairing_status_active_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{ENDPOINT_PAIRING_STATUS}/12")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "active": true, "student_name": "Dewi Lestari" },
        })))
        .mount(&server)
        .await;

    let mut gateway = AttendanceGateway::new(short_client(&server), API_KEY);
    gateway.set_device_id(12);
    let session = gateway.check_pairing_status().await;

    assert!(session.active);
    assert_eq!(session.student_name, "Dewi Lestari");
}

#[tokio::test]
async fn test_check_pairing_status_total_on_failure() {
    let server = MockServer::start().await;

    // Unvalidated gateway polls nothing and reads as inactive.
    let gateway = AttendanceGateway::new(short_client(&server), API_KEY);
    assert!(!gateway.check_pairing_status().await.active);

    // Garbage payload also reads as inactive.
    Mock::given(method("GET"))
        .and(path(format!("{ENDPOINT_PAIRING_STATUS}/12")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let mut gateway = AttendanceGateway::new(short_client(&server), API_KEY);
    gateway.set_device_id(12);
    let session = gateway.check_pairing_status().await;

    assert!(!session.active);
    assert!(session.student_name.is_empty());
}
