//! R30x frame checksum
//!
//! From the module datasheet: the checksum covers the packet type byte, the
//! two length bytes and every payload byte, summed as unsigned bytes and
//! truncated to 16 bits. The device address and header are not covered.

use tracing::trace;

/// Calculate the frame checksum for a packet type and payload
///
/// The length field is derived from the payload (payload bytes plus the
/// two checksum bytes), exactly as it appears on the wire.
///
/// # Examples
///
/// ```
/// use r309_core::checksum;
///
/// // VfyPwd acknowledgment with code 0x00:
/// // type 0x07 + len 0x0003 + payload 0x00 = 0x000A
/// assert_eq!(checksum::calculate(0x07, &[0x00]), 0x000A);
/// ```
pub fn calculate(kind: u8, payload: &[u8]) -> u16 {
    let length = (payload.len() + 2) as u16;

    let mut sum: u32 = kind as u32;
    sum += (length >> 8) as u32;
    sum += (length & 0xFF) as u32;
    for &b in payload {
        sum += b as u32;
    }

    let checksum = (sum & 0xFFFF) as u16;

    trace!(
        kind = format!("0x{:02X}", kind),
        payload_len = payload.len(),
        checksum = format!("0x{:04X}", checksum),
        "Calculated checksum"
    );

    checksum
}

/// Verify a received checksum
pub fn verify(kind: u8, payload: &[u8], expected: u16) -> bool {
    calculate(kind, payload) == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_empty_payload() {
        // type 0x01, length 0x0002, no payload
        assert_eq!(calculate(0x01, &[]), 0x0003);
    }

    #[test]
    fn test_checksum_known_command() {
        // GenImg command: opcode 0x01 + default password 00000000
        // type 0x01 + len 0x0007 + 0x01 = 0x0009
        let payload = [0x01, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(calculate(0x01, &payload), 0x0009);
    }

    #[test]
    fn test_checksum_truncates_to_16_bits() {
        let payload = vec![0xFF; 300];
        let expected = (0x01u32 + 0x01 + 0x2E + 300 * 0xFF) & 0xFFFF;
        assert_eq!(calculate(0x01, &payload) as u32, expected);
    }

    #[test]
    fn test_checksum_verify() {
        let payload = [0x13, 0x00, 0x00, 0x12, 0x34];
        let checksum = calculate(0x01, &payload);

        assert!(verify(0x01, &payload, checksum));
        assert!(!verify(0x01, &payload, checksum.wrapping_add(1)));
    }

    #[test]
    fn test_checksum_covers_length_bytes() {
        // Same bytes, different payload lengths must differ through the
        // length field contribution.
        let cs1 = calculate(0x07, &[0x00]);
        let cs2 = calculate(0x07, &[0x00, 0x00]);

        assert_ne!(cs1, cs2);
    }
}
