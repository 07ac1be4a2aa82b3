//! fourway-core - FourWay ESC bootloader protocol
//!
//! This crate implements the pure, transport-free part of the FourWay
//! protocol used to talk to an ESC bootloader through a flight-controller
//! pass-through link: frame construction and parsing, the CRC-16/XMODEM
//! integrity check, semantic command builders, reply classification, the
//! 48-byte EEPROM settings record and the outer MSP envelope used to enter
//! pass-through mode.
//!
//! All functions here are pure over byte buffers; sending frames and the
//! retry discipline live in `fourway-link`.
//!
//! # Example
//!
//! ```
//! use fourway_core::command;
//!
//! // Write 256 bytes to flash address 0x2000; the length byte wraps to 0.
//! let frame = command::write(0x2000, &[0u8; 256]).unwrap();
//! assert_eq!(frame[4], 0x00);
//! assert!(fourway_core::crc::verify_crc(&frame));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod ack;
pub mod command;
pub mod crc;
pub mod eeprom;
pub mod error;
pub mod frame;
pub mod msp;
pub mod protocol;

pub use ack::Reply;
pub use eeprom::{SettingFlag, SettingsRecord};
pub use error::{Error, Result};
