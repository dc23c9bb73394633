use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlayError>;

#[derive(Error, Debug)]
pub enum PlayError {
    #[error("Zapgate core error: {0}")]
    Core(#[from] zapgate_core::GateError),

    #[error("A payment session is already active")]
    Busy,

    #[error("Invalid session state: {0}")]
    InvalidState(String),

    #[error("Payment not completed: {0}")]
    RemoteNotCompleted(String),

    #[error("Session cancelled")]
    Cancelled,

    #[error("Insufficient balance: need {need} sats, have {available} sats")]
    InsufficientBalance { need: u64, available: u64 },
}
