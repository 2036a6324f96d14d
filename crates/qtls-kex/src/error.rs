//! Error types for key-exchange operations.
//!
//! Every failure carries its kind and, through [`Error::alert`], the TLS
//! alert the handshake layer should send before aborting. Callers never see
//! a partial secret or artifact alongside an error: operations either return
//! the full payload or an `Error`.

use thiserror::Error;

/// Result type alias for key-exchange operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Key-exchange operation errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Peer-supplied input has the wrong length.
    #[error("Invalid input length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length in bytes.
        expected: usize,
        /// Actual length received in bytes.
        actual: usize,
    },

    /// Peer-supplied bytes fail to parse as a valid point, key, or ciphertext.
    #[error("Malformed peer value: {0}")]
    Decode(String),

    /// The underlying curve or KEM primitive reported failure.
    #[error("Key exchange primitive failed: {0}")]
    Primitive(String),

    /// A requested algorithm has no implementation in this build.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// An operation was invoked in a state that does not permit it.
    #[error("Invalid key share state: {0}")]
    InvalidState(&'static str),

    /// The group does not support private-key serialization.
    #[error("Private key serialization is not supported for this group")]
    SerializationUnsupported,
}

/// TLS alert descriptions surfaced by this subsystem (RFC 8446 §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Alert {
    /// `decode_error` (50): a peer message could not be decoded.
    DecodeError = 50,
    /// `internal_error` (80): a local failure unrelated to the peer.
    InternalError = 80,
}

impl Alert {
    /// Wire value of the alert description byte.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl Error {
    /// The alert the handshake should send for this failure.
    ///
    /// Malformed peer input maps to `decode_error`; everything else is a
    /// local condition and maps to `internal_error`.
    pub fn alert(&self) -> Alert {
        match self {
            Error::InvalidLength { .. } | Error::Decode(_) => Alert::DecodeError,
            Error::Primitive(_)
            | Error::UnsupportedAlgorithm(_)
            | Error::InvalidState(_)
            | Error::SerializationUnsupported => Alert::InternalError,
        }
    }
}
