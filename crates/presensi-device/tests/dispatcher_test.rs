//! Dispatcher routing and rate limiting against a mock backend.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use presensi_api::{AttendanceGateway, HttpClient};
use presensi_core::CardUid;
use presensi_core::constants::{ENDPOINT_ATTENDANCE_RFID, ENDPOINT_PAIRING_RFID};
use presensi_device::state::{DeviceState, DeviceStateMachine};
use presensi_device::{CardEventDispatcher, OfflineReason, TapResult};

const API_KEY: &str = "psk_test_key";

fn uid() -> CardUid {
    CardUid::new("04AABBCC").unwrap()
}

fn idle_machine() -> DeviceStateMachine {
    let mut machine = DeviceStateMachine::new();
    machine
        .transition_to(DeviceState::ConnectingNetwork)
        .unwrap();
    machine
        .transition_to(DeviceState::ValidatingCredential)
        .unwrap();
    machine.transition_to(DeviceState::Idle).unwrap();
    machine
}

fn gateway_for(server: &MockServer) -> AttendanceGateway {
    let mut gateway = AttendanceGateway::new(
        HttpClient::with_timeout(&server.uri(), Duration::from_millis(200)),
        API_KEY,
    );
    gateway.set_device_id(12);
    gateway
}

fn attendance_ok_body() -> serde_json::Value {
    json!({
        "success": true,
        "data": {
            "success": true,
            "student": { "name": "Budi Santoso" },
            "type": "check_in",
            "status": "on_time",
        },
    })
}

#[tokio::test]
async fn test_tap_routes_to_attendance_when_idle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT_ATTENDANCE_RFID))
        .respond_with(ResponseTemplate::new(200).set_body_json(attendance_ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let mut machine = idle_machine();
    let mut dispatcher = CardEventDispatcher::new(Duration::from_millis(100));

    let result = dispatcher
        .dispatch(uid(), &mut machine, &gateway_for(&server), true)
        .await
        .unwrap()
        .unwrap();

    match result {
        TapResult::Attendance(outcome) => {
            assert!(outcome.success);
            assert_eq!(outcome.student_name, "Budi Santoso");
        }
        other => panic!("expected attendance result, got {other:?}"),
    }
    assert_eq!(machine.current_state(), DeviceState::ShowingResult);
}

#[tokio::test]
async fn test_tap_during_pairing_routes_to_pairing() {
    let server = MockServer::start().await;
    // The attendance endpoint must never see this tap.
    Mock::given(method("POST"))
        .and(path(ENDPOINT_ATTENDANCE_RFID))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT_PAIRING_RFID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "student_name": "Siti Rahma" },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut machine = idle_machine();
    machine.enter_pairing_mode("Siti Rahma").unwrap();
    let mut dispatcher = CardEventDispatcher::new(Duration::from_millis(100));

    let result = dispatcher
        .dispatch(uid(), &mut machine, &gateway_for(&server), true)
        .await
        .unwrap()
        .unwrap();

    // The machine left PairingMode the moment processing started; the route
    // must reflect the mode at tap time.
    assert!(!machine.is_in_pairing_mode());
    match result {
        TapResult::Pairing(outcome) => {
            assert!(outcome.success);
            assert_eq!(outcome.student_name, "Siti Rahma");
        }
        other => panic!("expected pairing result, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cooldown_suppresses_second_tap() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT_ATTENDANCE_RFID))
        .respond_with(ResponseTemplate::new(200).set_body_json(attendance_ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let mut machine = idle_machine();
    let mut dispatcher = CardEventDispatcher::new(Duration::from_secs(60));
    let gateway = gateway_for(&server);

    let first = dispatcher
        .dispatch(uid(), &mut machine, &gateway, true)
        .await
        .unwrap();
    assert!(first.is_some());

    machine.transition_to(DeviceState::Idle).unwrap();
    let second = dispatcher
        .dispatch(uid(), &mut machine, &gateway, true)
        .await
        .unwrap();
    assert!(second.is_none());
    // Suppressed tap leaves the machine where it was.
    assert_eq!(machine.current_state(), DeviceState::Idle);
}

#[tokio::test]
async fn test_unconfigured_tap_short_circuits() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT_ATTENDANCE_RFID))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let gateway = AttendanceGateway::new(HttpClient::new(&server.uri()), "");
    let mut machine = idle_machine();
    let mut dispatcher = CardEventDispatcher::new(Duration::from_millis(100));

    let result = dispatcher
        .dispatch(uid(), &mut machine, &gateway, true)
        .await
        .unwrap()
        .unwrap();

    match result {
        TapResult::Offline { uid, reason } => {
            assert_eq!(uid.as_str(), "04AABBCC");
            assert_eq!(reason, OfflineReason::NotConfigured);
        }
        other => panic!("expected offline result, got {other:?}"),
    }
    // The result screen still runs so the UID is visible.
    assert_eq!(machine.current_state(), DeviceState::ShowingResult);
}

#[tokio::test]
async fn test_disconnected_tap_short_circuits() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT_ATTENDANCE_RFID))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut machine = idle_machine();
    let mut dispatcher = CardEventDispatcher::new(Duration::from_millis(100));

    let result = dispatcher
        .dispatch(uid(), &mut machine, &gateway_for(&server), false)
        .await
        .unwrap()
        .unwrap();

    assert!(matches!(
        result,
        TapResult::Offline {
            reason: OfflineReason::Disconnected,
            ..
        }
    ));
}

#[tokio::test]
async fn test_unreachable_backend_folds_into_result() {
    // Nothing listens on this port; every attempt fails at connect.
    let gateway = AttendanceGateway::new(
        HttpClient::with_timeout("http://127.0.0.1:1", Duration::from_millis(100)),
        API_KEY,
    );
    let mut validated = gateway;
    validated.set_device_id(12);

    let mut machine = idle_machine();
    let mut dispatcher = CardEventDispatcher::new(Duration::from_millis(100));

    let result = dispatcher
        .dispatch(uid(), &mut machine, &validated, true)
        .await
        .unwrap()
        .unwrap();

    assert!(matches!(result, TapResult::Unreachable));
    assert_eq!(machine.current_state(), DeviceState::ShowingResult);
}
