//! Frame construction
//!
//! A FourWay frame is `[0x2F, opcode, addr_hi, addr_lo, length, payload...,
//! crc_hi, crc_lo]`. The length byte wraps: 0 encodes 256 payload bytes,
//! 1..=255 are literal. Frames are built once per outgoing command and
//! never mutated.

use alloc::vec::Vec;

use crate::crc::{crc16, crc_bytes};
use crate::error::{Error, Result};
use crate::protocol::ESCAPE_HOST;

/// Bytes of header before the payload: escape, opcode, address, length
pub const HEADER_LEN: usize = 5;
/// Trailing CRC bytes
pub const CRC_LEN: usize = 2;

/// Encode a payload length into the wire length byte (256 wraps to 0)
pub fn wrap_len(len: usize) -> u8 {
    if len == 256 {
        0
    } else {
        len as u8
    }
}

/// Decode a wire length byte (0 means 256)
pub fn unwrap_len(byte: u8) -> usize {
    if byte == 0 {
        256
    } else {
        byte as usize
    }
}

/// Build a complete frame for an opcode, target address and payload
///
/// The payload must be 1..=256 bytes; the CRC is computed over every byte
/// written so far and appended high byte first.
pub fn build(opcode: u8, address: u16, payload: &[u8]) -> Result<Vec<u8>> {
    if payload.is_empty() {
        return Err(Error::EmptyPayload);
    }
    if payload.len() > 256 {
        return Err(Error::PayloadTooLarge(payload.len()));
    }

    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len() + CRC_LEN);
    frame.push(ESCAPE_HOST);
    frame.push(opcode);
    frame.push((address >> 8) as u8);
    frame.push((address & 0xFF) as u8);
    frame.push(wrap_len(payload.len()));
    frame.extend_from_slice(payload);
    frame.extend_from_slice(&crc_bytes(crc16(&frame)));
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc::verify_crc;
    use crate::protocol::CMD_WRITE;

    #[test]
    fn length_invariant() {
        for len in [1usize, 2, 128, 255, 256] {
            let payload = alloc::vec![0xAB; len];
            let frame = build(CMD_WRITE, 0x2000, &payload).unwrap();
            assert_eq!(frame.len(), HEADER_LEN + len + CRC_LEN);
            assert!(verify_crc(&frame));
        }
    }

    #[test]
    fn length_byte_wraps_at_256() {
        let frame = build(CMD_WRITE, 0x2000, &[0u8; 256]).unwrap();
        assert_eq!(frame[4], 0x00);

        let frame = build(CMD_WRITE, 0x2000, &[0u8; 255]).unwrap();
        assert_eq!(frame[4], 0xFF);
    }

    #[test]
    fn address_is_big_endian() {
        let frame = build(CMD_WRITE, 0x2464, &[0x55]).unwrap();
        assert_eq!(&frame[..5], &[ESCAPE_HOST, CMD_WRITE, 0x24, 0x64, 0x01]);
    }

    #[test]
    fn rejects_empty_and_oversized_payloads() {
        assert_eq!(build(CMD_WRITE, 0, &[]), Err(Error::EmptyPayload));
        assert_eq!(
            build(CMD_WRITE, 0, &[0u8; 257]),
            Err(Error::PayloadTooLarge(257))
        );
    }

    #[test]
    fn wrap_is_inverse_of_unwrap() {
        for len in 1..=256usize {
            assert_eq!(unwrap_len(wrap_len(len)), len);
        }
    }
}
