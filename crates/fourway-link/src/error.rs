//! Error types for link operations
//!
//! The taxonomy separates caller bugs (framing), retryable transport faults
//! (CRC mismatch, timeout), definitive device refusals (NAK) and the
//! terminal outcomes of the flashing workflow. Terminal errors carry the
//! last address and page/chunk position so the caller can report precisely;
//! no user-facing text formatting happens below the CLI.

use std::time::Duration;

use thiserror::Error;

/// Link and flashing errors
#[derive(Debug, Error)]
pub enum LinkError {
    /// Malformed input to a command builder; a caller bug, never retried
    #[error("frame construction failed: {0}")]
    Framing(#[from] fourway_core::Error),

    /// Reply failed the CRC check; retried up to the budget
    #[error("reply CRC mismatch")]
    CrcMismatch,

    /// No acknowledgment arrived in time; retried up to the budget
    #[error("no acknowledgment within {0:?}")]
    Timeout(Duration),

    /// Device actively reported failure; never retried
    #[error("device NAK 0x{status:02X} for command 0x{opcode:02X} at address 0x{address:04X}")]
    DeviceNak {
        /// Echoed opcode the device refused
        opcode: u8,
        /// Non-zero status byte from the reply
        status: u8,
        /// Address echoed in the reply header
        address: u16,
    },

    /// Retry budget spent on CRC mismatches and timeouts
    #[error("retry budget exhausted after {attempts} attempts at address 0x{address:04X} (page {page})")]
    RetryBudgetExhausted {
        /// Attempts made before giving up
        attempts: u32,
        /// Page index being written or read when the budget ran out
        page: usize,
        /// First address of the failing page or chunk
        address: u16,
    },

    /// Read-back byte differs from the source image
    #[error("verification mismatch at image offset {offset}: expected 0x{expected:02X}, found 0x{found:02X}")]
    VerificationMismatch {
        /// Byte offset into the source image
        offset: usize,
        /// Byte the image holds
        expected: u8,
        /// Byte the device returned
        found: u8,
    },

    /// The init-flash handshake never acknowledged
    #[error("ESC not connected")]
    NotConnected,

    /// Image does not fit between the flash base and the end of the 16-bit
    /// address space
    #[error("image of {0} bytes does not fit in the device address space")]
    ImageTooLarge(usize),

    /// Operation cancelled between chunks
    #[error("operation cancelled")]
    Cancelled,

    /// Reply shorter than expected for the issued command
    #[error("short reply: expected {expected} payload bytes, got {got}")]
    ShortReply {
        /// Bytes requested
        expected: usize,
        /// Bytes the reply carried
        got: usize,
    },

    /// Failed to establish a transport connection
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Serial port error
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error during communication
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LinkError {
    /// Whether the flashing loops may spend retry budget on this error
    pub fn is_retryable(&self) -> bool {
        matches!(self, LinkError::CrcMismatch | LinkError::Timeout(_))
    }
}

/// Result type for link operations
pub type Result<T> = std::result::Result<T, LinkError>;
