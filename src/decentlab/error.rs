use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid hex payload: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("payload too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("protocol version {actual} doesn't match v{expected}")]
    ProtocolVersion { expected: u8, actual: u8 },

    #[error("payload has an odd number of data bytes: {0}")]
    OddLength(usize),

    #[error("insufficient data: flagged sensors need {expected} words, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    #[error("trailing data: flagged sensors need {expected} words, got {actual}")]
    TrailingData { expected: usize, actual: usize },

    #[error("{name} is out of range for this payload")]
    OutOfRange { name: &'static str },

    #[error("unknown sensor family: {0}")]
    UnknownFamily(String),
}

pub type Result<T> = std::result::Result<T, DecodeError>;
