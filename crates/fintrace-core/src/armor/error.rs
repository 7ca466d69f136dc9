use thiserror::Error;

/// Errors returned when an armored record line cannot be decoded.
///
/// # Examples
/// ```
/// use fintrace_core::ArmorError;
///
/// let err = ArmorError::InvalidCharacter { ch: '"', position: 3 };
/// assert!(err.to_string().contains("invalid character"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArmorError {
    #[error("invalid character {ch:?} at position {position}")]
    InvalidCharacter { ch: char, position: usize },
    #[error("invalid base85 group ending at position {position}")]
    Overflow { position: usize },
    #[error("invalid base64: {0}")]
    Base64(String),
}
