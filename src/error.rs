//! Error types for the router core
//!
//! One taxonomy covers both subsystems:
//! - Structural decode failures (truncation, out-of-domain field values)
//! - Integrity failures (single-byte header checksum, response-record digest)
//! - Key-material failures at Verifier/Signer construction
//!
//! A failed signature *verification* is not an error — verifiers return
//! `false` and callers decide policy. Decode errors abort only the message
//! being decoded; other in-flight messages are unaffected.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the router core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Declared or required length exceeds the bytes actually available.
    #[error("truncated message: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    /// A field value outside its allowed domain (unknown message type,
    /// record count over capacity, bad flag combination).
    #[error("invalid field: {0}")]
    InvalidField(String),

    /// Header checksum byte does not match the payload digest.
    ///
    /// The checksum is a single truncated digest byte, so a mismatch is
    /// advisory corruption detection, not an integrity guarantee.
    #[error("checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// Full-digest integrity check failed (build response record hash).
    #[error("record digest mismatch")]
    DigestMismatch,

    /// Key or signature bytes of the wrong length for the algorithm
    /// family. Raised at construction time; there is no way to recover a
    /// correct length from truncated input.
    #[error("malformed key material: {0}")]
    KeyMaterial(String),

    /// Failure surfaced by an underlying cryptographic primitive.
    #[error("crypto error: {0}")]
    Crypto(String),
}

impl Error {
    /// Convenience constructor for truncation checks.
    pub fn truncated(needed: usize, available: usize) -> Self {
        Error::Truncated { needed, available }
    }

    /// Whether this error may be logged and tolerated rather than
    /// rejecting the message.
    ///
    /// Only the single-byte header checksum qualifies: it catches
    /// accidental corruption but carries no cryptographic weight.
    pub fn is_advisory(&self) -> bool {
        matches!(self, Error::ChecksumMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advisory_classification() {
        assert!(Error::ChecksumMismatch {
            expected: 0xab,
            actual: 0xcd
        }
        .is_advisory());

        assert!(!Error::truncated(16, 4).is_advisory());
        assert!(!Error::DigestMismatch.is_advisory());
        assert!(!Error::KeyMaterial("short key".into()).is_advisory());
    }

    #[test]
    fn truncated_message_formatting() {
        let err = Error::truncated(528, 100);
        assert_eq!(
            err.to_string(),
            "truncated message: need 528 bytes, have 100"
        );
    }
}
