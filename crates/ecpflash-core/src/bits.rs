//! Conversions between SPI command bytes, hex nibble strings, and the
//! bit order of JTAG shift registers.
//!
//! Two orderings are needed because the two shift directions disagree:
//! SPI command and response bytes move through the passthrough DR
//! most-significant-bit first with byte order preserved, while JTAG
//! instructions (and the fixed DR patterns of the ECP5 configuration
//! logic) shift least-significant-bit first, low byte last.
//!
//! Bits are ordered by shift time: index 0 is the first bit clocked
//! through the TAP.

use crate::error::{Error, Result};

/// Decode a hex nibble string into bytes.
///
/// Odd-length input is left-padded with one zero nibble, so `"ABC"`
/// decodes to `[0x0A, 0xBC]`.
pub fn hex_to_bytes(s: &str) -> Result<Vec<u8>> {
    let mut nibbles = Vec::with_capacity(s.len() + 1);
    if s.len() % 2 == 1 {
        nibbles.push(0);
    }
    for c in s.chars() {
        nibbles.push(c.to_digit(16).ok_or(Error::InvalidHex(c))? as u8);
    }
    Ok(nibbles.chunks(2).map(|n| (n[0] << 4) | n[1]).collect())
}

/// Format bytes as a lowercase hex string.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Encode bytes for a command-direction DR shift: each byte MSb-first,
/// byte order preserved.
pub fn cmd_bits(bytes: &[u8]) -> Vec<bool> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for byte in bytes {
        for i in (0..8).rev() {
            bits.push(byte >> i & 1 == 1);
        }
    }
    bits
}

/// Decode bits captured during a command-direction DR shift back into
/// bytes. Exact inverse of [`cmd_bits`].
pub fn cmd_bytes(bits: &[bool]) -> Result<Vec<u8>> {
    if bits.len() % 8 != 0 {
        return Err(Error::UnalignedBits { len: bits.len() });
    }
    Ok(bits
        .chunks(8)
        .map(|byte| byte.iter().fold(0u8, |acc, &b| acc << 1 | b as u8))
        .collect())
}

/// Encode bytes for an instruction-direction shift: byte order reversed,
/// each byte LSb-first.
pub fn ir_bits(bytes: &[u8]) -> Vec<bool> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for byte in bytes.iter().rev() {
        for i in 0..8 {
            bits.push(byte >> i & 1 == 1);
        }
    }
    bits
}

/// Decode bits shifted in instruction order back into bytes. Exact
/// inverse of [`ir_bits`].
pub fn ir_bytes(bits: &[bool]) -> Result<Vec<u8>> {
    if bits.len() % 8 != 0 {
        return Err(Error::UnalignedBits { len: bits.len() });
    }
    let mut bytes: Vec<u8> = bits
        .chunks(8)
        .map(|byte| byte.iter().rev().fold(0u8, |acc, &b| acc << 1 | b as u8))
        .collect();
    bytes.reverse();
    Ok(bytes)
}

/// Assemble captured DR bits into a little-endian word: the first
/// captured bit is bit 0, the JTAG IDCODE convention.
pub fn bits_to_u32_le(bits: &[bool]) -> u32 {
    bits.iter()
        .take(32)
        .enumerate()
        .fold(0, |acc, (i, &b)| acc | (b as u32) << i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_decodes_pairs() {
        assert_eq!(hex_to_bytes("68FE").unwrap(), vec![0x68, 0xFE]);
        assert_eq!(hex_to_bytes("00").unwrap(), vec![0x00]);
    }

    #[test]
    fn odd_hex_left_pads_zero_nibble() {
        assert_eq!(hex_to_bytes("ABC").unwrap(), vec![0x0A, 0xBC]);
        // The low nibble of every byte is unchanged by the padding.
        assert_eq!(hex_to_bytes("3").unwrap(), vec![0x03]);
    }

    #[test]
    fn hex_rejects_non_hex_digits() {
        assert!(matches!(hex_to_bytes("0g").unwrap_err(), Error::InvalidHex('g')));
    }

    #[test]
    fn hex_formats_back() {
        assert_eq!(bytes_to_hex(&[0x0A, 0xBC]), "0abc");
    }

    #[test]
    fn cmd_bits_shift_msb_first() {
        assert_eq!(
            cmd_bits(&[0x80, 0x01]),
            vec![
                true, false, false, false, false, false, false, false,
                false, false, false, false, false, false, false, true,
            ]
        );
    }

    #[test]
    fn ir_bits_shift_lsb_first_low_byte_last() {
        // 0x68FE shifts as 0xFE LSb-first, then 0x68 LSb-first.
        let bits = ir_bits(&[0x68, 0xFE]);
        assert_eq!(
            &bits[..8],
            &[false, true, true, true, true, true, true, true]
        );
        assert_eq!(
            &bits[8..],
            &[false, false, false, true, false, true, true, false]
        );
    }

    #[test]
    fn cmd_round_trip() {
        let data: Vec<u8> = (0..=255).collect();
        assert_eq!(cmd_bytes(&cmd_bits(&data)).unwrap(), data);
    }

    #[test]
    fn ir_round_trip() {
        let data: Vec<u8> = (0..=255).rev().collect();
        assert_eq!(ir_bytes(&ir_bits(&data)).unwrap(), data);
    }

    #[test]
    fn unaligned_bits_rejected() {
        let bits = vec![true; 12];
        assert!(matches!(
            cmd_bytes(&bits).unwrap_err(),
            Error::UnalignedBits { len: 12 }
        ));
        assert!(matches!(
            ir_bytes(&bits).unwrap_err(),
            Error::UnalignedBits { len: 12 }
        ));
    }

    #[test]
    fn idcode_assembles_little_endian() {
        let idcode = 0x4111_3043u32;
        let bits: Vec<bool> = (0..32).map(|i| idcode >> i & 1 == 1).collect();
        assert_eq!(bits_to_u32_le(&bits), idcode);
    }
}
