use thiserror::Error;

/// Errors from the device control layer.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error(transparent)]
    Core(#[from] presensi_core::Error),

    #[error(transparent)]
    Hardware(#[from] presensi_hardware::HardwareError),

    #[error(transparent)]
    Gateway(#[from] presensi_api::GatewayError),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
