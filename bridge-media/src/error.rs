use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Invalid value for bridge operation: {0}")]
    InvalidValue(String),

    #[error("Resource supply exhausted: {0}")]
    Exhausted(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
