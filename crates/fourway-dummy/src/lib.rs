//! fourway-dummy - In-memory ESC bootloader emulator
//!
//! Emulates the device side of the FourWay protocol behind the
//! [`Transport`] trait, with a 64 KiB address space holding flash contents
//! and the EEPROM settings record. Fault injection (corrupted replies,
//! NAKs, dropped replies) makes the lossy-transport retry paths testable
//! without hardware.

use std::collections::VecDeque;
use std::time::Duration;

use fourway_core::crc::{crc16, crc_bytes, verify_crc};
use fourway_core::eeprom::RECORD_LEN;
use fourway_core::frame::{unwrap_len, wrap_len};
use fourway_core::protocol::{
    ACK_OK, CMD_ERASE_ALL, CMD_ERASE_PAGE, CMD_EXIT_INTERFACE, CMD_INIT_FLASH, CMD_READ,
    CMD_WRITE, EEPROM_ADDR, ESCAPE_DEVICE, FLASH_BASE, PAGE_SIZE, VERIFY_BASE,
};
use fourway_link::{LinkError, Result, Transport};

/// Status byte the emulator uses for refused commands
pub const NAK_STATUS: u8 = 0x08;

/// Size of the emulated address space
const MEMORY_SIZE: usize = 0x1_0000;

#[derive(Default)]
struct FaultPlan {
    corrupt_all: bool,
    corrupt_once_at: Vec<u16>,
    drop_once_at: Vec<u16>,
    nak_at: Vec<u16>,
}

/// Emulated ESC bootloader implementing [`Transport`]
pub struct DummyEsc {
    memory: Vec<u8>,
    pending: VecDeque<Vec<u8>>,
    faults: FaultPlan,
    passthrough: bool,
    connected: bool,
    write_log: Vec<u16>,
}

impl DummyEsc {
    /// Create an emulator with erased flash and a valid settings record
    pub fn new() -> Self {
        let mut memory = vec![0xFF; MEMORY_SIZE];
        let record = &mut memory[EEPROM_ADDR as usize..EEPROM_ADDR as usize + RECORD_LEN];
        record.fill(0);
        record[0] = 0x01;
        Self {
            memory,
            pending: VecDeque::new(),
            faults: FaultPlan::default(),
            passthrough: false,
            connected: false,
            write_log: Vec::new(),
        }
    }

    /// Mark the settings record as absent (presence byte cleared)
    pub fn clear_settings(&mut self) {
        self.memory[EEPROM_ADDR as usize] = 0x00;
    }

    /// Corrupt the CRC of every reply from now on
    pub fn corrupt_all_replies(&mut self) {
        self.faults.corrupt_all = true;
    }

    /// Corrupt the CRC of the next reply to a command at `address`, once
    pub fn corrupt_reply_once_at(&mut self, address: u16) {
        self.faults.corrupt_once_at.push(address);
    }

    /// Swallow the next reply to a command at `address`, once
    pub fn drop_reply_once_at(&mut self, address: u16) {
        self.faults.drop_once_at.push(address);
    }

    /// NAK every write touching `address`
    pub fn nak_writes_at(&mut self, address: u16) {
        self.faults.nak_at.push(address);
    }

    /// The emulated address space
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Mutable access, for planting verification mismatches
    pub fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    /// Addresses of every accepted write command, in arrival order
    pub fn write_log(&self) -> &[u16] {
        &self.write_log
    }

    /// Whether pass-through was requested
    pub fn passthrough_started(&self) -> bool {
        self.passthrough
    }

    /// Whether the flash interface is active (init-flash accepted, no
    /// exit-interface since)
    pub fn flash_initialized(&self) -> bool {
        self.connected
    }

    fn reply(&mut self, opcode: u8, address: u16, params: &[u8], status: u8) {
        let mut raw = vec![
            ESCAPE_DEVICE,
            opcode,
            (address >> 8) as u8,
            (address & 0xFF) as u8,
            wrap_len(params.len().max(1)),
        ];
        if params.is_empty() {
            raw.push(0x00);
        } else {
            raw.extend_from_slice(params);
        }
        raw.push(status);
        raw.extend_from_slice(&crc_bytes(crc16(&raw)));

        if self.faults.corrupt_all || take_match(&mut self.faults.corrupt_once_at, address) {
            let n = raw.len();
            raw[n - 1] ^= 0xFF;
        }
        if take_match(&mut self.faults.drop_once_at, address) {
            return;
        }
        self.pending.push_back(raw);
    }

    fn handle_frame(&mut self, frame: &[u8]) {
        if frame.len() < 8 || !verify_crc(frame) {
            // A garbled command would be ignored by the bootloader; the
            // host sees a timeout.
            log::debug!("dummy: dropping garbled {} byte frame", frame.len());
            return;
        }

        let opcode = frame[1];
        let address = u16::from_be_bytes([frame[2], frame[3]]);
        let declared = unwrap_len(frame[4]);
        if 5 + declared + 2 != frame.len() {
            log::debug!("dummy: dropping frame with bad declared length");
            return;
        }
        let payload = &frame[5..5 + declared];

        match opcode {
            CMD_INIT_FLASH => {
                self.connected = true;
                self.reply(opcode, address, &[], ACK_OK);
            }
            CMD_EXIT_INTERFACE => {
                self.connected = false;
                self.reply(opcode, address, &[], ACK_OK);
            }
            CMD_WRITE => {
                if self.faults.nak_at.contains(&address) {
                    self.reply(opcode, address, &[], NAK_STATUS);
                    return;
                }
                self.write_log.push(address);
                let start = address as usize;
                self.memory[start..start + payload.len()].copy_from_slice(payload);
                self.reply(opcode, address, &[], ACK_OK);
            }
            CMD_READ => {
                let len = unwrap_len(payload[0]);
                // The bootloader exposes flash written at 0x2000 through a
                // read window at 0x1000.
                let start = if (VERIFY_BASE..FLASH_BASE).contains(&address) {
                    address as usize + (FLASH_BASE - VERIFY_BASE) as usize
                } else {
                    address as usize
                };
                let data = self.memory[start..start + len].to_vec();
                self.reply(opcode, address, &data, ACK_OK);
            }
            CMD_ERASE_PAGE => {
                let start = payload[0] as usize * PAGE_SIZE;
                self.memory[start..start + PAGE_SIZE].fill(0xFF);
                self.reply(opcode, address, &[], ACK_OK);
            }
            CMD_ERASE_ALL => {
                let eeprom = EEPROM_ADDR as usize;
                self.memory[..eeprom].fill(0xFF);
                self.reply(opcode, address, &[], ACK_OK);
            }
            _ => {
                self.reply(opcode, address, &[], ACK_OK);
            }
        }
    }
}

impl Default for DummyEsc {
    fn default() -> Self {
        Self::new()
    }
}

fn take_match(list: &mut Vec<u16>, address: u16) -> bool {
    if let Some(pos) = list.iter().position(|&a| a == address) {
        list.remove(pos);
        true
    } else {
        false
    }
}

impl Transport for DummyEsc {
    fn send(&mut self, data: &[u8]) -> Result<()> {
        if data.first() == Some(&0x24) {
            // MSP envelope; only pass-through enable reaches us.
            self.passthrough = true;
            return Ok(());
        }
        self.handle_frame(data);
        Ok(())
    }

    fn receive(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        self.pending
            .pop_front()
            .ok_or(LinkError::Timeout(timeout))
    }
}
