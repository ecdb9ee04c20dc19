use std::io;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Serial(#[from] tokio_serial::Error),

    #[error(transparent)]
    Message(#[from] message::Error),

    #[error("baud candidates must be non-empty and strictly descending, got {0:?}")]
    InvalidCandidates(Vec<u32>),

    #[error("baud candidates must be a comma-separated list of rates, got {0:?}")]
    UnparsableCandidates(String),

    #[error("measurement period must be 1..=65535 ms, got {0:?}")]
    InvalidMeasurementPeriod(std::time::Duration),

    #[error("track file {path} is {size} bytes, shorter than its trailer")]
    TruncatedTrack { path: String, size: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;
