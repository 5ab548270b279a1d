//! Backend communication for the attendance terminal.
//!
//! Two layers, mirroring the split on the device:
//!
//! - [`http`]: a transport-only HTTP client with a fixed retry budget and
//!   per-attempt timeout. It knows nothing about attendance semantics.
//! - [`gateway`]: the attendance operations (credential validation,
//!   attendance recording, pairing registration and status) built on top of
//!   the transport, translating payloads into typed outcomes.

pub mod error;
pub mod gateway;
pub mod http;

pub use error::{GatewayError, TransportError};
pub use gateway::{
    AttendanceError, AttendanceGateway, AttendanceOutcome, CredentialValidation, PairingError,
    PairingOutcome, PairingSession,
};
pub use http::{HttpClient, HttpResponse, Method, RetryPolicy};
