//! Reply classification
//!
//! A device reply echoes the command header, carries reply parameters, then
//! a status byte at offset `len - 3` and the trailing CRC. Classification
//! is the only place reply bytes are interpreted; the session and the
//! flashing loops act on the outcome without touching the raw buffer.

use crate::crc::verify_crc;
use crate::frame::unwrap_len;
use crate::protocol::{ACK_OK, CMD_INIT_FLASH, CMD_READ};

/// Bytes before the reply parameters: escape, opcode echo, address, length
const REPLY_HEADER_LEN: usize = 5;
/// Status byte plus CRC after the parameters
const REPLY_TRAILER_LEN: usize = 3;

/// Classified inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply<'a> {
    /// Device acknowledged the echoed opcode
    Ack {
        /// Opcode echoed at offset 1
        opcode: u8,
    },
    /// Acknowledged read reply carrying extracted payload bytes
    Data {
        /// Payload declared at offset 4, starting at offset 5
        payload: &'a [u8],
    },
    /// Acknowledged init-flash reply: connectivity signal, not data
    Connected,
    /// Device actively reported failure
    Nak {
        /// Opcode echoed at offset 1
        opcode: u8,
        /// Non-zero status byte
        status: u8,
        /// Address echoed in the reply header
        address: u16,
    },
    /// CRC mismatch or structurally malformed reply; retryable
    BadCrc,
}

/// Classify a raw received buffer
///
/// Fails closed: anything too short to carry the echoed header, a status
/// byte and a CRC is reported as [`Reply::BadCrc`], as is a read reply
/// whose declared payload length disagrees with the buffer size.
pub fn classify(raw: &[u8]) -> Reply<'_> {
    if raw.len() < REPLY_HEADER_LEN + REPLY_TRAILER_LEN || !verify_crc(raw) {
        log::debug!("reply of {} bytes failed the CRC check", raw.len());
        return Reply::BadCrc;
    }

    let opcode = raw[1];
    let status = raw[raw.len() - REPLY_TRAILER_LEN];
    if status != ACK_OK {
        let address = u16::from_be_bytes([raw[2], raw[3]]);
        return Reply::Nak {
            opcode,
            status,
            address,
        };
    }

    match opcode {
        CMD_READ => {
            let declared = unwrap_len(raw[4]);
            if REPLY_HEADER_LEN + declared + REPLY_TRAILER_LEN != raw.len() {
                return Reply::BadCrc;
            }
            Reply::Data {
                payload: &raw[REPLY_HEADER_LEN..REPLY_HEADER_LEN + declared],
            }
        }
        CMD_INIT_FLASH => Reply::Connected,
        _ => Reply::Ack { opcode },
    }
}
