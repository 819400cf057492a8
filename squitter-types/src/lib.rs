//! Value types shared by the Mode S decoder, the Beast codec and the CLI.

use std::{
    fmt::{
        Debug,
        Display,
    },
    str::FromStr,
};

/// 24-bit aircraft address.
///
/// Addresses announced in DF18 frames with a non-ICAO code format are flagged
/// and displayed with a leading `~`, the way readsb does it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde_with::SerializeDisplay, serde_with::DeserializeFromStr)
)]
pub struct IcaoAddress {
    address: u32,
    non_icao: bool,
}

impl IcaoAddress {
    pub const fn from_u32_unchecked(address: u32) -> Self {
        Self {
            address,
            non_icao: false,
        }
    }

    pub fn from_u32(address: u32) -> Option<Self> {
        (address < 0x1000000).then(|| Self::from_u32_unchecked(address))
    }

    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::from_u32_unchecked(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
    }

    pub const fn with_non_icao_flag(self) -> Self {
        Self {
            address: self.address,
            non_icao: true,
        }
    }

    pub fn non_icao(&self) -> bool {
        self.non_icao
    }

    pub fn as_u32(&self) -> u32 {
        self.address
    }

    pub fn as_bytes(&self) -> [u8; 3] {
        let b = self.address.to_be_bytes();
        [b[1], b[2], b[3]]
    }
}

impl Display for IcaoAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.non_icao {
            write!(f, "~")?;
        }
        write!(f, "{:06x}", self.address)
    }
}

impl Debug for IcaoAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IcaoAddress({self})")
    }
}

impl FromStr for IcaoAddress {
    type Err = IcaoAddressFromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || {
            IcaoAddressFromStrError {
                input: s.to_owned(),
            }
        };

        let (hex, non_icao) = match s.strip_prefix('~') {
            Some(rest) => (rest, true),
            None => (s, false),
        };
        if hex.len() != 6 {
            return Err(err());
        }

        let address = u32::from_str_radix(hex, 16).map_err(|_| err())?;
        let mut address = Self::from_u32(address).ok_or_else(err)?;
        address.non_icao = non_icao;
        Ok(address)
    }
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("invalid ICAO address: {input}")]
pub struct IcaoAddressFromStrError {
    pub input: String,
}

impl From<IcaoAddress> for u32 {
    fn from(value: IcaoAddress) -> Self {
        value.address
    }
}

/// Mode A code, four octal digits.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde_with::SerializeDisplay, serde_with::DeserializeFromStr)
)]
pub struct Squawk {
    code: u16,
}

impl Squawk {
    pub const VFR_STANDARD: Self = Self::from_u16_unchecked(0o1200);
    pub const AIRCRAFT_HIJACKING: Self = Self::from_u16_unchecked(0o7500);
    pub const RADIO_FAILURE: Self = Self::from_u16_unchecked(0o7600);
    pub const EMERGENCY: Self = Self::from_u16_unchecked(0o7700);

    pub const fn from_u16_unchecked(code: u16) -> Self {
        Self { code }
    }

    pub fn from_u16(code: u16) -> Option<Self> {
        (code < 0o10000).then(|| Self::from_u16_unchecked(code))
    }

    /// Builds a code from its octal digits, most significant first.
    pub fn from_digits(digits: [u8; 4]) -> Option<Self> {
        digits.iter().try_fold(0u16, |code, digit| {
            (*digit < 8).then(|| (code << 3) | u16::from(*digit))
        })
        .map(Self::from_u16_unchecked)
    }

    pub fn digits(&self) -> [u8; 4] {
        [
            ((self.code >> 9) & 0o7) as u8,
            ((self.code >> 6) & 0o7) as u8,
            ((self.code >> 3) & 0o7) as u8,
            (self.code & 0o7) as u8,
        ]
    }

    pub fn as_u16(&self) -> u16 {
        self.code
    }

    pub fn is_emergency(&self) -> bool {
        *self == Self::AIRCRAFT_HIJACKING || *self == Self::RADIO_FAILURE || *self == Self::EMERGENCY
    }
}

impl Display for Squawk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04o}", self.code)
    }
}

impl Debug for Squawk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Squawk({:04o})", self.code)
    }
}

impl FromStr for Squawk {
    type Err = SquawkFromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || {
            SquawkFromStrError {
                input: s.to_owned(),
            }
        };
        if s.len() != 4 {
            return Err(err());
        }
        let code = u16::from_str_radix(s, 8).map_err(|_| err())?;
        Self::from_u16(code).ok_or_else(err)
    }
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("invalid squawk code: {input}")]
pub struct SquawkFromStrError {
    pub input: String,
}

impl From<Squawk> for u16 {
    fn from(value: Squawk) -> Self {
        value.code
    }
}

#[cfg(test)]
mod tests {
    use super::{
        IcaoAddress,
        Squawk,
    };

    #[test]
    fn it_parses_and_displays_icao_addresses() {
        let address: IcaoAddress = "a9450d".parse().unwrap();
        assert_eq!(address, IcaoAddress::from_bytes([0xa9, 0x45, 0x0d]));
        assert_eq!(address.to_string(), "a9450d");
        assert!(!address.non_icao());

        let address: IcaoAddress = "~00012f".parse().unwrap();
        assert!(address.non_icao());
        assert_eq!(address.as_u32(), 0x12f);
        assert_eq!(address.to_string(), "~00012f");

        assert!("1000000".parse::<IcaoAddress>().is_err());
        assert!("xyz123".parse::<IcaoAddress>().is_err());
    }

    #[test]
    fn it_keeps_leading_zeros_in_squawks() {
        let squawk = Squawk::from_digits([0, 5, 2, 0]).unwrap();
        assert_eq!(squawk.to_string(), "0520");
        assert_eq!(squawk.digits(), [0, 5, 2, 0]);
        assert_eq!("0520".parse::<Squawk>().unwrap(), squawk);
    }

    #[test]
    fn it_rejects_non_octal_squawks() {
        assert!(Squawk::from_digits([7, 7, 8, 0]).is_none());
        assert!("7780".parse::<Squawk>().is_err());
        assert!("777".parse::<Squawk>().is_err());
        assert!(Squawk::from_u16(0o10000).is_none());
    }

    #[test]
    fn it_recognizes_emergency_codes() {
        assert!("7700".parse::<Squawk>().unwrap().is_emergency());
        assert!("7500".parse::<Squawk>().unwrap().is_emergency());
        assert!(!Squawk::VFR_STANDARD.is_emergency());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn it_serializes_as_strings() {
        let address = IcaoAddress::from_u32_unchecked(0xa3696e);
        assert_eq!(serde_json::to_string(&address).unwrap(), "\"a3696e\"");
        let squawk: Squawk = serde_json::from_str("\"3452\"").unwrap();
        assert_eq!(squawk.as_u16(), 0o3452);
    }
}
