//! Bit-addressable view of a raw Mode S frame.
//!
//! Bits are numbered the way the ICAO documents number them: bit 1 is the most
//! significant bit of the first byte, and ranges are inclusive.

use std::fmt::Debug;

use crate::{
    DecodeError,
    LENGTH_LONG,
    LENGTH_SHORT,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BitRangeError {
    #[error("bit numbers start at 1")]
    ZeroIndex,

    #[error("bit range {first}..={last} is reversed")]
    Reversed { first: usize, last: usize },

    #[error("bit range {first}..={last} is wider than 64 bits")]
    TooWide { first: usize, last: usize },

    #[error("bit {bit} is out of bounds for a {length}-bit frame")]
    OutOfBounds { bit: usize, length: usize },
}

/// A short (56 bit) or long (112 bit) Mode S frame.
///
/// The length is fixed on construction, so any value of this type is a
/// well-formed buffer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawMessage {
    Short([u8; LENGTH_SHORT]),
    Long([u8; LENGTH_LONG]),
}

impl RawMessage {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        if let Ok(bytes) = <[u8; LENGTH_SHORT]>::try_from(bytes) {
            Ok(Self::Short(bytes))
        }
        else if let Ok(bytes) = <[u8; LENGTH_LONG]>::try_from(bytes) {
            Ok(Self::Long(bytes))
        }
        else {
            Err(DecodeError::InvalidLength {
                length: bytes.len(),
            })
        }
    }

    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Short(bytes) => &bytes[..],
            Self::Long(bytes) => &bytes[..],
        }
    }

    /// Length in bytes (7 or 14)
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    #[inline(always)]
    pub fn bit_len(&self) -> usize {
        self.len() * 8
    }

    pub fn is_long(&self) -> bool {
        matches!(self, Self::Long(_))
    }

    /// Returns bit `n`.
    pub fn bit(&self, n: usize) -> Result<bool, BitRangeError> {
        if n == 0 {
            return Err(BitRangeError::ZeroIndex);
        }
        if n > self.bit_len() {
            return Err(BitRangeError::OutOfBounds {
                bit: n,
                length: self.bit_len(),
            });
        }

        let n = n - 1;
        Ok(self.as_bytes()[n / 8] & (0x80 >> (n % 8)) != 0)
    }

    /// Returns bits `first..=last` as an unsigned integer, most significant bit
    /// first.
    pub fn bits(&self, first: usize, last: usize) -> Result<u64, BitRangeError> {
        if first == 0 {
            return Err(BitRangeError::ZeroIndex);
        }
        if first > last {
            return Err(BitRangeError::Reversed { first, last });
        }
        if last - first >= 64 {
            return Err(BitRangeError::TooWide { first, last });
        }
        if last > self.bit_len() {
            return Err(BitRangeError::OutOfBounds {
                bit: last,
                length: self.bit_len(),
            });
        }

        let mut value = 0;
        for n in first..=last {
            value = (value << 1) | u64::from(self.bit(n)?);
        }
        Ok(value)
    }

    /// Returns `N` bytes starting at bit `first`.
    pub fn bytes<const N: usize>(&self, first: usize) -> Result<[u8; N], BitRangeError> {
        let mut bytes = [0; N];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = self.bits(first + 8 * i, first + 8 * i + 7)? as u8;
        }
        Ok(bytes)
    }

    /// Returns the trailing 24-bit field (AP or PI).
    pub fn parity_field(&self) -> [u8; 3] {
        let bytes = self.as_bytes();
        let n = bytes.len();
        [bytes[n - 3], bytes[n - 2], bytes[n - 1]]
    }
}

impl Debug for RawMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawMessage(")?;
        for byte in self.as_bytes() {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

impl AsRef<[u8]> for RawMessage {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BitRangeError,
        RawMessage,
    };
    use crate::DecodeError;

    fn raw(hex: &str) -> RawMessage {
        RawMessage::from_bytes(&hex::decode(hex).unwrap()).unwrap()
    }

    #[test]
    fn it_numbers_bits_from_one() {
        let raw = raw("8da9450d60bde138e8638c939134");
        assert!(raw.bit(1).unwrap());
        assert!(!raw.bit(2).unwrap());
        assert!(!raw.bit(112).unwrap());
        assert_eq!(raw.bits(1, 5).unwrap(), 17);
        assert_eq!(raw.bits(9, 32).unwrap(), 0xa9450d);
        assert_eq!(raw.bits(89, 112).unwrap(), 0x939134);
        assert_eq!(raw.bits(6, 6).unwrap(), 1);
        assert_eq!(raw.bytes::<3>(9).unwrap(), [0xa9, 0x45, 0x0d]);
        assert_eq!(raw.bytes::<2>(13).unwrap(), [0x94, 0x50]);
        assert!(raw.bytes::<4>(89).is_err());
    }

    #[test]
    fn it_extracts_64_bits() {
        let raw = raw("ffffffffffffffff000000000000");
        assert_eq!(raw.bits(1, 64).unwrap(), u64::MAX);
        assert_eq!(
            raw.bits(1, 65),
            Err(BitRangeError::TooWide { first: 1, last: 65 })
        );
    }

    #[test]
    fn it_rejects_invalid_ranges() {
        let raw = raw("5dac22c54b7a07");
        assert_eq!(raw.bit(0), Err(BitRangeError::ZeroIndex));
        assert_eq!(
            raw.bit(57),
            Err(BitRangeError::OutOfBounds {
                bit: 57,
                length: 56
            })
        );
        assert_eq!(raw.bits(0, 4), Err(BitRangeError::ZeroIndex));
        assert_eq!(
            raw.bits(9, 8),
            Err(BitRangeError::Reversed { first: 9, last: 8 })
        );
        assert_eq!(
            raw.bits(33, 60),
            Err(BitRangeError::OutOfBounds {
                bit: 60,
                length: 56
            })
        );
    }

    #[test]
    fn it_rejects_invalid_lengths() {
        for length in [0, 6, 8, 13, 15] {
            match RawMessage::from_bytes(&vec![0; length]) {
                Err(DecodeError::InvalidLength { length: l }) => assert_eq!(l, length),
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }
}
