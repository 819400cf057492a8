//! Mode S parity
//!
//! The parity is a 24-bit CRC (generator polynomial `0xfff409`) over the data
//! bits of a frame. Instead of running the polynomial division we XOR together
//! one precomputed row per set bit, which is how dump1090 and most ADS-B
//! decoders do it.
//!
//! For frames with address/parity (AP) fields the transmitted parity is XORed
//! with the aircraft address, so `AP ^ parity` recovers the address. This only
//! yields the right address if the frame was received without errors.

use crate::{
    LENGTH_SHORT,
    bits::RawMessage,
};

/// Contribution of each of the 112 bit positions of a long frame.
///
/// The last 24 rows are zero, so the parity field itself doesn't contribute.
/// Short frames use the last 56 rows.
#[rustfmt::skip]
pub const PARITY_TABLE: [u32; 112] = [
    0x3935ea, 0x1c9af5, 0xf1b77e, 0x78dbbf, 0xc397db, 0x9e31e9, 0xb0e2f0, 0x587178,
    0x2c38bc, 0x161c5e, 0x0b0e2f, 0xfa7d13, 0x82c48d, 0xbe9842, 0x5f4c21, 0xd05c14,
    0x682e0a, 0x341705, 0xe5f186, 0x72f8c3, 0xc68665, 0x9cb936, 0x4e5c9b, 0xd8d449,
    0x939020, 0x49c810, 0x24e408, 0x127204, 0x093902, 0x049c81, 0xfdb444, 0x7eda22,
    0x3f6d11, 0xe04c8c, 0x702646, 0x381323, 0xe3f395, 0x8e03ce, 0x4701e7, 0xdc7af7,
    0x91c77f, 0xb719bb, 0xa476d9, 0xadc168, 0x56e0b4, 0x2b705a, 0x15b82d, 0xf52612,
    0x7a9309, 0xc2b380, 0x6159c0, 0x30ace0, 0x185670, 0x0c2b38, 0x06159c, 0x030ace,
    0x018567, 0xff38b7, 0x80665f, 0xbfc92b, 0xa01e91, 0xaff54c, 0x57faa6, 0x2bfd53,
    0xea04ad, 0x8af852, 0x457c29, 0xdd4410, 0x6ea208, 0x375104, 0x1ba882, 0x0dd441,
    0xf91024, 0x7c8812, 0x3e4409, 0xe0d800, 0x706c00, 0x383600, 0x1c1b00, 0x0e0d80,
    0x0706c0, 0x038360, 0x01c1b0, 0x00e0d8, 0x00706c, 0x003836, 0x001c1b, 0xfff409,
    0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000,
    0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000,
    0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000, 0x000000,
];

/// Computes the 24-bit parity of a frame.
pub fn parity(raw: &RawMessage) -> u32 {
    let bytes = raw.as_bytes();
    let offset = if bytes.len() == LENGTH_SHORT { 56 } else { 0 };

    let mut parity = 0;
    for (i, byte) in bytes.iter().enumerate() {
        for j in 0..8 {
            if byte & (0x80 >> j) != 0 {
                parity ^= PARITY_TABLE[offset + i * 8 + j];
            }
        }
    }
    parity
}

#[cfg(test)]
mod tests {
    use super::parity;
    use crate::bits::RawMessage;

    const CRC_24_MODES: crc::Algorithm<u32> = crc::Algorithm {
        width: 24,
        poly: 0xfff409,
        init: 0,
        refin: false,
        refout: false,
        xorout: 0,
        check: 0,
        residue: 0,
    };

    fn raw(hex: &str) -> RawMessage {
        RawMessage::from_bytes(&hex::decode(hex).unwrap()).unwrap()
    }

    fn parity_field(raw: &RawMessage) -> u32 {
        let [a, b, c] = raw.parity_field();
        u32::from_be_bytes([0, a, b, c])
    }

    #[test]
    fn valid_extended_squitters_have_matching_parity() {
        for hex in [
            "8da9450d60bde138e8638c939134",
            "8da8028758ab0028de078689d437",
            "8dacf84e23101332cf3ca037ef13",
            "8d4074b52315a676dd13a0662967",
        ] {
            let raw = raw(hex);
            assert_eq!(parity(&raw), parity_field(&raw), "{hex}");
        }
    }

    #[test]
    fn it_detects_a_flipped_bit() {
        let mut bytes = hex::decode("8da9450d60bde138e8638c939134").unwrap();
        bytes[6] ^= 0x10;
        let raw = RawMessage::from_bytes(&bytes).unwrap();
        assert_ne!(parity(&raw), parity_field(&raw));
    }

    #[test]
    fn it_matches_the_crc_polynomial() {
        const CRC: crc::Crc<u32> = crc::Crc::<u32>::new(&CRC_24_MODES);

        for hex in [
            "5dac22c54b7a07",
            "20001910bc45e9",
            "28001b0601970d",
            "a0000f9820057273df8d20e2cf30",
            "ac19b29573482f6963663636022b",
            "8dab9448589ff40a4e62a6c8b7a6",
        ] {
            let raw = raw(hex);
            let data = &raw.as_bytes()[..raw.len() - 3];
            assert_eq!(parity(&raw), CRC.checksum(data), "{hex}");
        }
    }
}
