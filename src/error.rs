use std::io;

/// Errors produced by the core delta engine.
///
/// Every variant maps onto one of the error kinds in the design: invalid
/// input sizes, a corrupt header, a codec failure, a script that references
/// bytes out of bounds, a script that runs out of stream data before the
/// target size is reached, or outright resource exhaustion.
#[derive(Debug, thiserror::Error)]
pub enum DeltaError {
    #[error("invalid input size: {0}")]
    InvalidInput(&'static str),

    #[error("invalid or corrupt patch header: {0}")]
    InvalidHeader(&'static str),

    #[error("block codec failure: {0}")]
    Codec(&'static str),

    #[error("control triple references bytes out of bounds: {0}")]
    ScriptBounds(&'static str),

    #[error("control stream exhausted before target size was reached")]
    ScriptUnderrun,

    #[error("input exceeds the maximum supported size ({0} bytes)")]
    TooLarge(u64),

    #[error("failed to allocate working buffer: {0}")]
    ResourceExhausted(&'static str),
}

impl From<DeltaError> for io::Error {
    fn from(e: DeltaError) -> io::Error {
        let kind = match e {
            DeltaError::InvalidInput(_) => io::ErrorKind::InvalidInput,
            DeltaError::InvalidHeader(_) => io::ErrorKind::InvalidData,
            DeltaError::Codec(_) => io::ErrorKind::InvalidData,
            DeltaError::ScriptBounds(_) => io::ErrorKind::InvalidData,
            DeltaError::ScriptUnderrun => io::ErrorKind::UnexpectedEof,
            DeltaError::TooLarge(_) => io::ErrorKind::InvalidInput,
            DeltaError::ResourceExhausted(_) => io::ErrorKind::Other,
        };
        io::Error::new(kind, e)
    }
}

/// Result alias used throughout the crate-internal core.
pub type Result<T> = std::result::Result<T, DeltaError>;

/// Maximum supported length of a byte sequence: a signed 63-bit count, the
/// same ceiling the sign-magnitude wire format can express.
pub const MAX_LENGTH: u64 = (1u64 << 63) - 1;

/// Checks a length against [`MAX_LENGTH`].
pub fn check_length(len: usize) -> Result<()> {
    if len as u64 > MAX_LENGTH {
        Err(DeltaError::TooLarge(MAX_LENGTH))
    } else {
        Ok(())
    }
}
