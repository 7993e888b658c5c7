//! CRC-8 used on every LT8722 SPI frame (polynomial 0x07, initial value 0x00).

use crc::{Crc, CRC_8_SMBUS};

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);

/// Compute the checksum of a frame segment.
#[inline]
pub fn compute_checksum(bytes: &[u8]) -> u8 {
    CRC8.checksum(bytes)
}

/// Recompute the checksum of `bytes` and compare it against the received one.
///
/// Returns the calculated checksum on mismatch so it can be reported.
pub fn verify_checksum(bytes: &[u8], rcvd: u8) -> Result<(), u8> {
    let calc = compute_checksum(bytes);

    match calc == rcvd {
        true => Ok(()),
        false => Err(calc),
    }
}
