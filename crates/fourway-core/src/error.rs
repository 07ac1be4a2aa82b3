//! Error type for fourway-core
//!
//! A no_std compatible error type covering frame construction and record
//! parsing. Transport and retry errors live in `fourway-link`.

use core::fmt;

/// Core error type, no_std compatible
///
/// Every variant indicates a caller contract violation; none of these is
/// retryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Payload is empty; read/write frames require at least one byte
    EmptyPayload,
    /// Payload exceeds the 256 bytes a frame can carry
    PayloadTooLarge(usize),
    /// Requested read length outside 1..=256
    BadReadLength(usize),
    /// EEPROM settings buffer is not exactly 48 bytes
    BadSettingsLength(usize),
    /// MSP envelope payload exceeds the one-byte length field
    MspPayloadTooLarge(usize),
}

/// Result type for fourway-core operations
pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "frame payload must not be empty"),
            Self::PayloadTooLarge(len) => {
                write!(f, "frame payload of {} bytes exceeds 256", len)
            }
            Self::BadReadLength(len) => {
                write!(f, "read length {} outside 1..=256", len)
            }
            Self::BadSettingsLength(len) => {
                write!(f, "settings buffer is {} bytes, expected 48", len)
            }
            Self::MspPayloadTooLarge(len) => {
                write!(f, "MSP payload of {} bytes exceeds 255", len)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
