use std::io;

use thiserror::Error;

/// Specialized [`Result`] type for archive inspection.
pub type RarResult<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
/// A fatal error that may occur while inspecting a RAR file.
pub enum Error {
    /// No RAR signature was found in the file.
    #[error("Not a RAR file")]
    NotArchive,

    /// The archive uses a format or feature we cannot build a record for.
    #[error("unsupported archive: {0}")]
    Unsupported(&'static str),

    /// Tried to read past the end of the stream while decoding.
    #[error("expected more data")]
    UnexpectedEof,

    /// A header reported a tag, flag or size that contradicts the format.
    #[error("corrupt header")]
    CorruptHeader,

    /// A variable-length integer ran past its maximum width.
    #[error("malformed variable-length integer")]
    MalformedVint,

    /// Unknown I/O error.
    #[error(transparent)]
    Io(io::Error),
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        match value.kind() {
            io::ErrorKind::UnexpectedEof => Self::UnexpectedEof,
            _ => Self::Io(value),
        }
    }
}
