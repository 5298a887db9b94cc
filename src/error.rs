use thiserror::Error;

/// Failure of a seal or open call.
///
/// Messages never carry plaintext, passphrases or key material.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SealError {
    /// The envelope does not split into three well-formed, correctly sized fields.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Fields were well formed but the ciphertext did not unpad under the derived key.
    #[error("decryption failed: wrong passphrase or corrupted message")]
    DecryptionFailed,

    /// The operating system random generator could not be used.
    #[error("OS random generator unavailable")]
    EntropySourceFailure,

    /// Input rejected before any cryptographic work was done.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}

/// Fieldless discriminant of [`SealError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedEnvelope,
    DecryptionFailed,
    EntropySourceFailure,
    InvalidInput,
}

impl SealError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SealError::MalformedEnvelope(_) => ErrorKind::MalformedEnvelope,
            SealError::DecryptionFailed => ErrorKind::DecryptionFailed,
            SealError::EntropySourceFailure => ErrorKind::EntropySourceFailure,
            SealError::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }

    /// Returns `false` only when the process cannot safely continue sealing.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SealError::EntropySourceFailure)
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        SealError::MalformedEnvelope(reason.into())
    }
}
