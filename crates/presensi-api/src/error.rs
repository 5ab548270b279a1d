use thiserror::Error;

/// Transport-level failures from [`crate::HttpClient`].
///
/// An HTTP error status (4xx/5xx) is NOT a transport failure: any status
/// received within the timeout ends the retry loop successfully. Only a
/// missing response (connect error, DNS failure, timeout) retries, and only
/// exhaustion of the budget surfaces here.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No response after the full retry budget.
    #[error("No response after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// The HTTP client itself could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Failures from [`crate::AttendanceGateway`] operations that return errors
/// (credential validation). Card-tap operations fold backend rejections into
/// their typed outcomes instead.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Server URL or API key missing.
    #[error("Gateway not configured")]
    NotConfigured,

    /// Transport failure after the retry budget.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Backend answered with an unexpected HTTP status.
    #[error("Unexpected HTTP status {status}")]
    UnexpectedStatus { status: u16 },

    /// Backend answered 200 with a body we could not interpret.
    #[error("Invalid response payload: {0}")]
    InvalidResponse(String),
}
