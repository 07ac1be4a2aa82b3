//! MSP pass-through envelope
//!
//! The flight controller speaks MSP until pass-through is enabled; the core
//! only needs the envelope builder to send that one request (and the exit
//! command) before FourWay frames flow. Envelope:
//! `[0x24, 0x4D, 0x3C, len, command, payload..., checksum]` where the
//! checksum XORs every byte from the length field onward.

use alloc::vec::Vec;

use crate::error::{Error, Result};

/// `$M<` direction-to-FC header
pub const MSP_HEADER: [u8; 3] = [0x24, 0x4D, 0x3C];
/// Enable serial pass-through to the ESC
pub const MSP_SET_PASSTHROUGH: u8 = 0xF5;

/// Build an MSP request envelope
pub fn envelope(command: u8, payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > 255 {
        return Err(Error::MspPayloadTooLarge(payload.len()));
    }

    let mut msg = Vec::with_capacity(MSP_HEADER.len() + 3 + payload.len());
    msg.extend_from_slice(&MSP_HEADER);
    msg.push(payload.len() as u8);
    msg.push(command);
    msg.extend_from_slice(payload);

    let checksum = msg[3..].iter().fold(0u8, |acc, &b| acc ^ b);
    msg.push(checksum);
    Ok(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_request_shape() {
        let msg = envelope(MSP_SET_PASSTHROUGH, &[]).unwrap();
        // len 0, command 0xF5, checksum = 0 ^ 0xF5
        assert_eq!(msg, [0x24, 0x4D, 0x3C, 0x00, 0xF5, 0xF5]);
    }

    #[test]
    fn checksum_covers_length_command_and_payload() {
        let msg = envelope(0x42, &[0x01, 0x02, 0x03]).unwrap();
        assert_eq!(msg[3], 3);
        assert_eq!(msg[4], 0x42);
        let expected = 3u8 ^ 0x42 ^ 0x01 ^ 0x02 ^ 0x03;
        assert_eq!(*msg.last().unwrap(), expected);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        assert_eq!(
            envelope(0x42, &[0u8; 256]),
            Err(Error::MspPayloadTooLarge(256))
        );
    }
}
