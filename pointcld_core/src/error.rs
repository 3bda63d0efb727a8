use std::io;

use thiserror::Error;

/// Failures reported by the container.
///
/// There is no partial success anywhere in the API: an operation either
/// completes or returns one of these. Nothing is rolled back on failure —
/// a failed append may leave a trailing incomplete record and a stale
/// header frame count, and a failed navigation leaves the cursor in an
/// unspecified position.
#[derive(Debug, Error)]
pub enum Error {
    /// Structurally impossible data: bad magic, non-positive or oversized
    /// length prefix, zero-length size marker, hop past the header.
    #[error("format error: {0}")]
    Format(String),

    /// Short read/write, failed seek, or any other storage fault.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Operation not permitted in the mode the container was opened in.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
