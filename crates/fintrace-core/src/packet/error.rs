use thiserror::Error;

/// Errors returned by the packet reader and parser.
///
/// These never escape [`crate::decode`]: the scan loop turns them into
/// counters on [`crate::DecodeReport`].
///
/// # Examples
/// ```
/// use fintrace_core::PacketError;
///
/// let err = PacketError::TooShort { needed: 18, actual: 10 };
/// assert!(err.to_string().contains("too short"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    #[error("payload too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("no fixed layout for tag {tag:#04x}")]
    NoLayout { tag: u8 },
}
