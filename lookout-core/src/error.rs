//! Error types for the lookout core library.

use thiserror::Error;

use crate::types::Address;

/// Top-level error type for fallible lookout operations.
///
/// Only configuration and I/O surface as errors. Everything that touches the
/// remote process degrades to "absent" instead, see [`DecodeError`].
#[derive(Error, Debug)]
pub enum LookoutError {
    /// Configuration could not be parsed or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a remote structure could not be decoded.
///
/// These never leave the registry or the classifiers; they are logged,
/// counted and turned into `None`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// A pointer that must be set was null.
    #[error("null pointer where {what} was expected")]
    NullPointer {
        /// What the pointer should have pointed at.
        what: &'static str,
    },

    /// The remote read itself failed (unmapped or freed memory).
    #[error("read of {len} bytes at {address} failed")]
    ReadFailed {
        /// Start of the read.
        address: Address,
        /// Bytes requested.
        len: usize,
    },

    /// Data was read but cannot be real (torn snapshot or stale pointer).
    #[error("implausible {what}: {value}")]
    Implausible {
        /// Which field looked wrong.
        what: &'static str,
        /// Offending raw value.
        value: u64,
    },
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, LookoutError>;

/// Result of decoding remote memory.
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;
