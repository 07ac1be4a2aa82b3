//! FourWay protocol constants
//!
//! Frame layout: `[escape, opcode, addr_hi, addr_lo, length, payload..., crc_hi, crc_lo]`
//! where a length byte of 0 means 256 payload bytes. The CRC is
//! CRC-16/CCITT (XMODEM) over everything except the two CRC bytes.

/// Escape byte opening every host-to-device frame
pub const ESCAPE_HOST: u8 = 0x2F;
/// Escape byte opening device replies
pub const ESCAPE_DEVICE: u8 = 0x2E;

/// Ack status byte for success; any other value is a device NAK
pub const ACK_OK: u8 = 0x00;

// Command opcodes
/// Keep-alive probe
pub const CMD_TEST_ALIVE: u8 = 0x30;
/// Query protocol version
pub const CMD_GET_VERSION: u8 = 0x31;
/// Query interface name
pub const CMD_GET_IF_NAME: u8 = 0x32;
/// Leave the FourWay interface
pub const CMD_EXIT_INTERFACE: u8 = 0x34;
/// Reset the target device
pub const CMD_RESET: u8 = 0x35;
/// Initialize the flash interface; its ack doubles as the connectivity check
pub const CMD_INIT_FLASH: u8 = 0x37;
/// Erase the entire flash
pub const CMD_ERASE_ALL: u8 = 0x38;
/// Erase a single page
pub const CMD_ERASE_PAGE: u8 = 0x39;
/// Read device memory
pub const CMD_READ: u8 = 0x3A;
/// Write device memory
pub const CMD_WRITE: u8 = 0x3B;
/// Select the pass-through interface
pub const CMD_SET_INTERFACE: u8 = 0x3F;

/// Flash write base address
pub const FLASH_BASE: u16 = 0x2000;
/// Verification read base address
pub const VERIFY_BASE: u16 = 0x1000;
/// Address of the 48-byte EEPROM settings record
pub const EEPROM_ADDR: u16 = 0x7C00;

/// Flashing page size in bytes (four write chunks)
pub const PAGE_SIZE: usize = 1024;
/// Write chunk size; the largest payload a frame can carry
pub const CHUNK_SIZE: usize = 256;
/// Verification read chunk size
pub const VERIFY_CHUNK_SIZE: usize = 128;

/// Generic device commands carrying a device number payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DeviceCommand {
    /// Keep-alive probe
    TestAlive = CMD_TEST_ALIVE,
    /// Query protocol version
    GetVersion = CMD_GET_VERSION,
    /// Query interface name
    GetInterfaceName = CMD_GET_IF_NAME,
    /// Leave the FourWay interface
    ExitInterface = CMD_EXIT_INTERFACE,
    /// Reset the target device
    Reset = CMD_RESET,
    /// Initialize the flash interface
    InitFlash = CMD_INIT_FLASH,
    /// Select the pass-through interface
    SetInterface = CMD_SET_INTERFACE,
}

impl DeviceCommand {
    /// The opcode byte placed in the frame
    pub fn opcode(self) -> u8 {
        self as u8
    }
}
