use std::convert::TryInto;

use crate::SlipError;

/// Two's complement of the 16-bit sum of `data`.
pub fn checksum(data: &[u8]) -> u16 {
    let sum = data
        .iter()
        .fold(0u16, |sum, byte| sum.wrapping_add(u16::from(*byte)));
    (!sum).wrapping_add(1)
}

/// Checks the little-endian checksum trailing `packet`, returning the bytes it covers.
///
/// `packet` must be at least two bytes long.
pub fn verify(packet: &[u8]) -> Result<&[u8], SlipError> {
    let len = packet.len().saturating_sub(2);
    let (data, trailer) = packet.split_at(len);

    let found = trailer
        .try_into()
        .map(u16::from_le_bytes)
        .unwrap_or_default();
    let expected = checksum(data);

    if found != expected {
        return Err(SlipError::MismatchedCrc { expected, found });
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_zero() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum(&[0; 32]), 0);
    }

    #[test]
    fn test_known_value() {
        // READ_PARAMETER, seq 1, MAC address.
        let data = [0x0A, 0x01, 0x00, 0x08, 0x00, 0x01, 0x00, 0x01];
        assert_eq!(checksum(&data), 0xFFEB);
    }

    #[test]
    fn test_sum_wraps() {
        let data = vec![0xFF; 600];
        let sum = (600u32 * 0xFF) as u16;
        assert_eq!(checksum(&data), (!sum).wrapping_add(1));
    }

    #[test]
    fn test_verify() {
        let mut packet = vec![0x07, 0x02, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00];
        let crc = checksum(&packet);
        packet.extend_from_slice(&crc.to_le_bytes());

        assert_eq!(verify(&packet), Ok(&packet[..8]));

        for index in 0..8 {
            let mut corrupted = packet.clone();
            corrupted[index] ^= 0x01;
            assert!(verify(&corrupted).is_err(), "flipped byte {}", index);
        }
    }

    #[test]
    fn test_verify_reports_values() {
        let packet = [0x01, 0x02, 0x34, 0x12];
        assert_eq!(
            verify(&packet),
            Err(SlipError::MismatchedCrc {
                expected: 0xFFFD,
                found: 0x1234
            })
        );
    }
}
