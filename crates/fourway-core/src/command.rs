//! Semantic command builders
//!
//! Pure mapping from flashing intent to concrete frames. Every builder goes
//! through [`frame::build`], so all commands share one CRC path; existing
//! tooling ships the erase-all CRC bytes `0xCD 0xF9` verbatim, and those
//! are exactly what the shared CRC computes for that frame.

use alloc::vec::Vec;

use crate::error::{Error, Result};
use crate::frame::{self, wrap_len};
use crate::protocol::{DeviceCommand, CMD_ERASE_ALL, CMD_ERASE_PAGE, CMD_READ, CMD_WRITE};

/// Read `len` bytes (1..=256) from a device address
pub fn read(address: u16, len: usize) -> Result<Vec<u8>> {
    if len == 0 || len > 256 {
        return Err(Error::BadReadLength(len));
    }
    frame::build(CMD_READ, address, &[wrap_len(len)])
}

/// Write 1..=256 data bytes to a device address
pub fn write(address: u16, data: &[u8]) -> Result<Vec<u8>> {
    frame::build(CMD_WRITE, address, data)
}

/// Erase a single flash page
pub fn erase_page(page: u8) -> Result<Vec<u8>> {
    frame::build(CMD_ERASE_PAGE, 0, &[page])
}

/// Erase the entire flash
pub fn erase_all() -> Result<Vec<u8>> {
    frame::build(CMD_ERASE_ALL, 0, &[0x00])
}

/// Generic device command addressed to an ESC device number
pub fn device(cmd: DeviceCommand, device_number: u8) -> Result<Vec<u8>> {
    frame::build(cmd.opcode(), 0, &[device_number])
}
