//! FourWay device session
//!
//! One session owns one transport and speaks strict half-duplex: a command
//! goes out, exactly one reply is awaited and classified before the next
//! command may be sent. Single commands (connect handshake, settings and
//! erase operations) retry in place up to the configured budget; the
//! page-rewind retry discipline for flashing lives in [`crate::flash`].

use std::time::Duration;

use fourway_core::ack::{self, Reply};
use fourway_core::eeprom::{SettingsRecord, RECORD_LEN};
use fourway_core::protocol::{DeviceCommand, EEPROM_ADDR, PAGE_SIZE};
use fourway_core::{command, msp};

use crate::error::{LinkError, Result};
use crate::transport::Transport;

/// Session configuration
///
/// The retry budget is a parameter rather than a constant; noisy links
/// want more attempts, bench setups fewer.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// How long to wait for an acknowledgment before treating the command
    /// as lost
    pub ack_timeout: Duration,
    /// Attempts per command (or per page while flashing) before giving up
    pub retry_budget: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            ack_timeout: Duration::from_millis(250),
            retry_budget: 8,
        }
    }
}

/// Classified reply with the payload copied out of the receive buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Response {
    /// Plain acknowledgment
    Ack,
    /// Init-flash acknowledgment
    Connected,
    /// Read reply payload
    Data(Vec<u8>),
}

/// A FourWay session over a transport
pub struct FourWay<T: Transport> {
    transport: T,
    config: LinkConfig,
    passthrough_started: bool,
    connected: bool,
}

impl<T: Transport> FourWay<T> {
    /// Create a session with the default configuration
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, LinkConfig::default())
    }

    /// Create a session with an explicit configuration
    pub fn with_config(transport: T, config: LinkConfig) -> Self {
        Self {
            transport,
            config,
            passthrough_started: false,
            connected: false,
        }
    }

    /// The session configuration
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Whether the init-flash handshake has succeeded
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Mutable access to the underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the session, returning the transport
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Ask the flight controller to enter serial pass-through mode
    ///
    /// Sent once per session, before the first FourWay frame. The FC does
    /// not reply in a FourWay frame; anything it echoes is drained.
    pub fn enable_passthrough(&mut self) -> Result<()> {
        if self.passthrough_started {
            return Ok(());
        }

        let request = msp::envelope(msp::MSP_SET_PASSTHROUGH, &[])?;
        self.transport.send(&request)?;
        self.drain();
        self.passthrough_started = true;
        log::info!("pass-through enabled");
        Ok(())
    }

    /// Initialize the flash interface of one ESC (device numbers 0..=3)
    ///
    /// Retries up to the budget; a NAK or a spent budget both surface as
    /// [`LinkError::NotConnected`].
    pub fn connect(&mut self, device_number: u8) -> Result<()> {
        let frame = command::device(DeviceCommand::InitFlash, device_number)?;
        match self.transact_retry(&frame, 0) {
            Ok(Response::Connected) => {
                self.connected = true;
                log::info!("ESC {} connected", device_number);
                Ok(())
            }
            Ok(_) => {
                self.connected = false;
                Err(LinkError::NotConnected)
            }
            Err(LinkError::DeviceNak { .. }) | Err(LinkError::RetryBudgetExhausted { .. }) => {
                self.connected = false;
                Err(LinkError::NotConnected)
            }
            Err(e) => Err(e),
        }
    }

    /// Read `len` bytes (1..=256) from a device address, with retries
    pub fn read(&mut self, address: u16, len: usize) -> Result<Vec<u8>> {
        let frame = command::read(address, len)?;
        match self.transact_retry(&frame, address)? {
            Response::Data(payload) => {
                if payload.len() != len {
                    return Err(LinkError::ShortReply {
                        expected: len,
                        got: payload.len(),
                    });
                }
                Ok(payload)
            }
            _ => Err(LinkError::ShortReply {
                expected: len,
                got: 0,
            }),
        }
    }

    /// Write 1..=256 bytes to a device address, with retries
    pub fn write(&mut self, address: u16, data: &[u8]) -> Result<()> {
        let frame = command::write(address, data)?;
        self.transact_retry(&frame, address)?;
        Ok(())
    }

    /// Erase one flash page
    pub fn erase_page(&mut self, page: u8) -> Result<()> {
        let frame = command::erase_page(page)?;
        self.transact_retry(&frame, 0)?;
        Ok(())
    }

    /// Erase the entire flash
    pub fn erase_all(&mut self) -> Result<()> {
        let frame = command::erase_all()?;
        self.transact_retry(&frame, 0)?;
        Ok(())
    }

    /// Send a generic device command
    pub fn device_command(&mut self, cmd: DeviceCommand, device_number: u8) -> Result<()> {
        let frame = command::device(cmd, device_number)?;
        self.transact_retry(&frame, 0)?;
        Ok(())
    }

    /// Read the 48-byte EEPROM settings record
    pub fn read_settings(&mut self) -> Result<SettingsRecord> {
        let raw = self.read(EEPROM_ADDR, RECORD_LEN)?;
        Ok(SettingsRecord::from_bytes(&raw)?)
    }

    /// Write the settings record back to the device
    pub fn write_settings(&mut self, record: &SettingsRecord) -> Result<()> {
        self.write(EEPROM_ADDR, record.as_bytes())
    }

    /// Leave the FourWay interface, best effort
    pub fn shutdown(&mut self) {
        if self.connected {
            if let Ok(frame) = command::device(DeviceCommand::ExitInterface, 0) {
                if self.transport.send(&frame).is_ok() {
                    self.drain();
                    log::debug!("exit-interface sent");
                }
            }
            self.connected = false;
        }
    }

    /// Send one frame and classify the single reply; no retries
    pub(crate) fn transact(&mut self, frame: &[u8]) -> Result<Response> {
        self.transport.send(frame)?;
        let raw = self.transport.receive(self.config.ack_timeout)?;

        match ack::classify(&raw) {
            Reply::BadCrc => Err(LinkError::CrcMismatch),
            Reply::Nak {
                opcode,
                status,
                address,
            } => Err(LinkError::DeviceNak {
                opcode,
                status,
                address,
            }),
            Reply::Connected => Ok(Response::Connected),
            Reply::Ack { .. } => Ok(Response::Ack),
            Reply::Data { payload } => Ok(Response::Data(payload.to_vec())),
        }
    }

    /// Send a frame, retrying CRC mismatches and timeouts up to the budget
    ///
    /// NAKs are definitive and propagate immediately.
    fn transact_retry(&mut self, frame: &[u8], address: u16) -> Result<Response> {
        let budget = self.config.retry_budget.max(1);
        let mut attempts = 0;
        loop {
            match self.transact(frame) {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() => {
                    attempts += 1;
                    log::warn!(
                        "command at 0x{:04X} failed ({}), attempt {}/{}",
                        address,
                        e,
                        attempts,
                        budget
                    );
                    if attempts >= budget {
                        return Err(LinkError::RetryBudgetExhausted {
                            attempts,
                            page: address as usize / PAGE_SIZE,
                            address,
                        });
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Discard whatever is sitting in the receive buffer
    fn drain(&mut self) {
        while self
            .transport
            .receive(Duration::from_millis(50))
            .map(|b| !b.is_empty())
            .unwrap_or(false)
        {}
    }
}
