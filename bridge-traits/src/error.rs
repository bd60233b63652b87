use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// The host rejected a payload (e.g. an oversized notification bitmap).
    #[error("Payload rejected by host: {0}")]
    PayloadRejected(String),

    /// A platform exception escaped the host callback and was converted here.
    #[error("Platform error: {0}")]
    Platform(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
