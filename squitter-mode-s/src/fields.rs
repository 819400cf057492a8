//! Small fixed-width fields shared by several downlink formats.
//!
//! <https://mode-s.org/1090mhz/content/mode-s/3-surveillance.html>

use squitter_types::{
    IcaoAddress,
    Squawk,
};

use crate::gillham::decode_identity;

/// 3-bit capability
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Capability(u8);

impl Capability {
    /// Signifies Level 1 transponder (surveillance only), and no ability to
    /// set "CA" code 7, and either on the ground or airborne
    pub const LEVEL1_GROUND_AIRBORNE: Self = Self(0b000);

    /// Signifies Level 2 or above transponder, and the ability to set "CA"
    /// code 7, and on the ground
    pub const LEVEL2_GROUND: Self = Self(0b100);

    /// Signifies Level 2 or above transponder, and the ability to set "CA"
    /// code 7, and airborne
    pub const LEVEL2_AIRBORNE: Self = Self(0b101);

    /// Signifies Level 2 or above transponder, and the ability to set "CA"
    /// code 7, and either on the ground or airborne
    pub const LEVEL2_GROUND_AIRBORNE: Self = Self(0b110);

    /// Signifies the "DR" field is NOT equal to ZERO (0), or the "FS"
    /// field equals 2, 3, 4, or 5, and either on the ground or airborne.
    pub const DR_NOT_ZERO_FS_EQUAL_2345_GROUND_AIRBORNE: Self = Self(0b111);

    pub const fn from_u8_unchecked(byte: u8) -> Self {
        Self(byte)
    }

    pub const fn from_u8(byte: u8) -> Option<Self> {
        if byte & 0b11111000 == 0 {
            Some(Self(byte))
        }
        else {
            None
        }
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

/// 3-bit code format of DF18 frames
///
/// Determines the kind of non-transponder extended squitter and whether the
/// announced address is an ICAO address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CodeFormat(u8);

impl CodeFormat {
    pub const ADSB_WITH_ICAO_ADDRESS: Self = Self(0);
    pub const ADSB_WITH_NON_ICAO_ADDRESS: Self = Self(1);
    pub const TISB_FINE_WITH_ICAO_ADDRESS: Self = Self(2);
    pub const TISB_COARSE: Self = Self(3);
    pub const TISB_AND_ADSR_MANAGEMENT: Self = Self(4);
    pub const TISB_FINE_WITH_NON_ICAO_ADDRESS: Self = Self(5);
    pub const ADSB_REBROADCAST: Self = Self(6);
    pub const RESERVED: Self = Self(7);

    pub const fn from_u8_unchecked(byte: u8) -> Self {
        Self(byte)
    }

    pub const fn from_u8(byte: u8) -> Option<Self> {
        if byte & 0b11111000 == 0 {
            Some(Self(byte))
        }
        else {
            None
        }
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }

    /// Returns `true` if the ME field has the extended squitter layout.
    pub fn has_extended_squitter(&self) -> bool {
        matches!(self.0, 0 | 1 | 2 | 5 | 6)
    }

    pub fn is_non_icao(&self) -> bool {
        *self == Self::ADSB_WITH_NON_ICAO_ADDRESS || *self == Self::TISB_FINE_WITH_NON_ICAO_ADDRESS
    }
}

/// 3-bit flight status
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlightStatus(u8);

impl FlightStatus {
    pub const NO_ALERT_NO_SPI_AIRBORNE: Self = Self(0b000);
    pub const NO_ALERT_NO_SPI_GROUND: Self = Self(0b001);
    pub const ALERT_NO_SPI_AIRBORNE: Self = Self(0b010);
    pub const ALERT_NO_SPI_GROUND: Self = Self(0b011);
    pub const ALERT_SPI_AIRBORNE_GROUND: Self = Self(0b100);
    pub const NO_ALERT_SPI_AIRBORNE_GROUND: Self = Self(0b101);

    pub const fn from_u8_unchecked(byte: u8) -> Self {
        Self(byte)
    }

    pub const fn from_u8(byte: u8) -> Option<Self> {
        if byte & 0b11111000 == 0 {
            Some(Self(byte))
        }
        else {
            None
        }
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }

    pub fn alert(&self) -> bool {
        *self == Self::ALERT_NO_SPI_AIRBORNE
            || *self == Self::ALERT_NO_SPI_GROUND
            || *self == Self::ALERT_SPI_AIRBORNE_GROUND
    }

    pub fn spi(&self) -> bool {
        *self == Self::ALERT_SPI_AIRBORNE_GROUND || *self == Self::NO_ALERT_SPI_AIRBORNE_GROUND
    }

    /// Returns `true` if the aircraft might be airborne.
    pub fn airborne(&self) -> bool {
        *self == Self::NO_ALERT_NO_SPI_AIRBORNE
            || *self == Self::ALERT_NO_SPI_AIRBORNE
            || *self == Self::ALERT_SPI_AIRBORNE_GROUND
            || *self == Self::NO_ALERT_SPI_AIRBORNE_GROUND
    }

    /// Returns `true` if the aircraft might be on the ground.
    pub fn ground(&self) -> bool {
        *self == Self::NO_ALERT_NO_SPI_GROUND
            || *self == Self::ALERT_NO_SPI_GROUND
            || *self == Self::ALERT_SPI_AIRBORNE_GROUND
            || *self == Self::NO_ALERT_SPI_AIRBORNE_GROUND
    }
}

/// Vertical status of air-air surveillance replies
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VerticalStatus {
    Airborne,
    Ground,
}

impl VerticalStatus {
    pub fn from_bit(bit: bool) -> Self {
        if bit { Self::Ground } else { Self::Airborne }
    }
}

/// 2-bit surveillance status of airborne positions
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurveillanceStatus(u8);

impl SurveillanceStatus {
    pub const NO_CONDITION: Self = Self(0);
    pub const PERMANENT_ALERT: Self = Self(1);
    pub const TEMPORARY_ALERT: Self = Self(2);
    pub const SPI_CONDITION: Self = Self(3);

    pub const fn from_u8_unchecked(byte: u8) -> Self {
        Self(byte)
    }

    pub const fn from_u8(byte: u8) -> Option<Self> {
        if byte & 0b11111100 == 0 {
            Some(Self(byte))
        }
        else {
            None
        }
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

/// 13-bit identity (Mode A) code
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdentityCode(u16);

impl IdentityCode {
    pub const fn from_u16_unchecked(word: u16) -> Self {
        Self(word)
    }

    pub const fn from_u16(word: u16) -> Option<Self> {
        if word & 0b1110_0000_0000_0000 == 0 {
            Some(Self(word))
        }
        else {
            None
        }
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    pub fn squawk(&self) -> Squawk {
        decode_identity(self.0)
    }
}

/// 24-bit address/parity field
///
/// The parity of the frame XORed with the aircraft address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AddressParity(pub [u8; 3]);

impl AddressParity {
    pub fn as_u32(&self) -> u32 {
        u32::from_be_bytes([0, self.0[0], self.0[1], self.0[2]])
    }

    /// Recovers the address given the computed parity of the frame.
    ///
    /// If the frame was corrupted this silently returns a wrong address.
    pub fn recover_address(&self, parity: u32) -> IcaoAddress {
        IcaoAddress::from_u32_unchecked((self.as_u32() ^ parity) & 0xffffff)
    }
}

/// 24-bit parity/interrogator field
///
/// For squitters this should be equal to the computed parity. Replies to an
/// interrogation have the interrogator code XORed into it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParityInterrogator(pub [u8; 3]);

impl ParityInterrogator {
    pub fn as_u32(&self) -> u32 {
        u32::from_be_bytes([0, self.0[0], self.0[1], self.0[2]])
    }

    /// Returns the interrogator code given the computed parity of the frame.
    pub fn interrogator_code(&self, parity: u32) -> u32 {
        (self.as_u32() ^ parity) & 0xffffff
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AddressParity,
        CodeFormat,
        FlightStatus,
    };

    #[test]
    fn flight_status_flags() {
        assert!(FlightStatus::NO_ALERT_NO_SPI_AIRBORNE.airborne());
        assert!(!FlightStatus::NO_ALERT_NO_SPI_AIRBORNE.ground());
        assert!(FlightStatus::ALERT_NO_SPI_GROUND.ground());
        assert!(FlightStatus::ALERT_NO_SPI_GROUND.alert());
        assert!(!FlightStatus::ALERT_NO_SPI_GROUND.airborne());

        let either = FlightStatus::from_u8(4).unwrap();
        assert!(either.airborne() && either.ground() && either.alert() && either.spi());
    }

    #[test]
    fn code_format_gating() {
        let with_es = [0, 1, 2, 5, 6];
        for cf in 0..8 {
            let code_format = CodeFormat::from_u8(cf).unwrap();
            assert_eq!(code_format.has_extended_squitter(), with_es.contains(&cf));
        }
        assert!(CodeFormat::ADSB_WITH_NON_ICAO_ADDRESS.is_non_icao());
        assert!(!CodeFormat::ADSB_WITH_ICAO_ADDRESS.is_non_icao());
    }

    #[test]
    fn it_recovers_the_address() {
        let ap = AddressParity([0x12, 0x34, 0x56]);
        assert_eq!(ap.recover_address(0x123456).as_u32(), 0);
        assert_eq!(ap.recover_address(0x020406).as_u32(), 0x103050);
    }
}
