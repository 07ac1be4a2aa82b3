//! CRC-16/CCITT (XMODEM) integrity check
//!
//! Polynomial 0x1021, initial value 0, MSB-first, no reflection, no final
//! XOR. Every FourWay frame carries this CRC over all bytes except the two
//! trailing CRC bytes, transmitted high byte first.

/// Compute the CRC over a byte buffer
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// Split a CRC into its wire representation, high byte first
pub fn crc_bytes(crc: u16) -> [u8; 2] {
    [(crc >> 8) as u8, (crc & 0xFF) as u8]
}

/// Check the trailing CRC of a received frame
///
/// Recomputes over everything except the last two bytes and compares
/// byte-for-byte. Fails closed: buffers too short to carry a CRC yield
/// false.
pub fn verify_crc(frame: &[u8]) -> bool {
    if frame.len() < 3 {
        return false;
    }
    let (body, trailer) = frame.split_at(frame.len() - 2);
    crc_bytes(crc16(body)) == [trailer[0], trailer[1]]
}
