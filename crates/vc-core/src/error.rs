use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("invalid stride")]
    InvalidStride,
    #[error("buffer too short: need {expected} bytes after header, got {actual}")]
    TruncatedBuffer { expected: usize, actual: usize },
}
