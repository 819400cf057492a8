//! Altitude codes
//!
//! Surveillance replies carry a 13-bit altitude code (AC), extended squitter
//! airborne positions a 12-bit one that lacks the M bit.
//!
//! <https://mode-s.org/1090mhz/content/mode-s/3-surveillance.html>
//! <http://www.aeroelectric.com/articles/Altitude_Encoding/modec.htm>

use std::fmt::Debug;

use crate::gillham::{
    InvalidGillhamAltitude,
    decode_gillham_altitude,
};

const M_BIT: u16 = 0b0_0000_0100_0000;
const Q_BIT: u16 = 0b0_0000_0001_0000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AltitudeError {
    #[error("metric altitudes are not supported")]
    Metric,

    #[error(transparent)]
    InvalidGillham(#[from] InvalidGillhamAltitude),
}

/// 13-bit altitude / Mode C code
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AltitudeCode(u16);

impl AltitudeCode {
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

    /// Converts the 12-bit code of an extended squitter by splicing in M=0.
    pub const fn from_ac12(word: u16) -> Self {
        Self(((word & 0b1111_1100_0000) << 1) | (word & 0b0000_0011_1111))
    }

    /// Encodes an altitude in feet with 25 ft resolution (Q=1).
    ///
    /// Returns `None` if the altitude isn't a multiple of 25 ft or is out of
    /// the range -1000 ft to 50175 ft.
    pub fn from_feet(feet: i32) -> Option<Self> {
        let n = feet.checked_add(1000)?;
        if n < 0 || n % 25 != 0 {
            return None;
        }
        let n = u16::try_from(n / 25).ok().filter(|n| *n < 0b1000_0000_0000)?;
        Some(Self(
            ((n & 0b111_1110_0000) << 2) | ((n & 0b000_0001_0000) << 1) | Q_BIT | (n & 0b1111),
        ))
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    pub fn is_metric(&self) -> bool {
        self.0 & M_BIT != 0
    }

    /// Decodes the altitude in feet.
    ///
    /// A code of 0 means the altitude is unknown and decodes to 0.
    pub fn decode(&self) -> Result<i32, AltitudeError> {
        // bit  0 1234 5678 9abc
        //      a aaaa amaq aaaa
        if self.0 == 0 {
            Ok(0)
        }
        else if self.is_metric() {
            Err(AltitudeError::Metric)
        }
        else if self.0 & Q_BIT != 0 {
            let n = ((self.0 & 0b1_1111_1000_0000) >> 2)
                | ((self.0 & 0b0_0000_0010_0000) >> 1)
                | (self.0 & 0b0_0000_0000_1111);
            Ok(25 * i32::from(n) - 1000)
        }
        else {
            Ok(decode_gillham_altitude(self.0)?)
        }
    }
}

impl Debug for AltitudeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.decode() {
            Ok(feet) => write!(f, "AltitudeCode({feet} ft)"),
            Err(_) => write!(f, "AltitudeCode({:#06x})", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AltitudeCode,
        AltitudeError,
    };

    fn ac13_decode_to_feet(ac13: u16) -> i32 {
        AltitudeCode::from_u16(ac13).unwrap().decode().unwrap()
    }

    #[test]
    fn it_decodes_ac13() {
        assert_eq!(ac13_decode_to_feet(6320), 38600);
        assert_eq!(ac13_decode_to_feet(3601), 21425);
        assert_eq!(ac13_decode_to_feet(4152), 25200);
        assert_eq!(ac13_decode_to_feet(3129), 18825);
        assert_eq!(ac13_decode_to_feet(5913), 36025);
        assert_eq!(ac13_decode_to_feet(4757), 28725);
        assert_eq!(ac13_decode_to_feet(5776), 35000);
        assert_eq!(ac13_decode_to_feet(5800), 9100);
        assert_eq!(ac13_decode_to_feet(6064), 37000);
        assert_eq!(ac13_decode_to_feet(2203), 12875);
        assert_eq!(ac13_decode_to_feet(5272), 32000);
        assert_eq!(ac13_decode_to_feet(442), 2050);
        assert_eq!(ac13_decode_to_feet(412), 1700);
        assert_eq!(ac13_decode_to_feet(6552), 40000);
        assert_eq!(ac13_decode_to_feet(4130), 2200);
        assert_eq!(ac13_decode_to_feet(1343), 7775);
        assert_eq!(ac13_decode_to_feet(2332), 13700);
        assert_eq!(ac13_decode_to_feet(5560), 34000);
    }

    #[test]
    fn it_decodes_ac12() {
        // ME bits 9-20 of 8da9450d60bde1... and 8dab9448589ff4...
        assert_eq!(AltitudeCode::from_ac12(0xbde).decode().unwrap(), 36950);
        assert_eq!(AltitudeCode::from_ac12(0x9ff).decode().unwrap(), 30975);
    }

    #[test]
    fn zero_means_unknown() {
        assert_eq!(AltitudeCode::from_u16_unchecked(0).decode(), Ok(0));
    }

    #[test]
    fn it_rejects_metric_altitudes() {
        assert_eq!(
            AltitudeCode::from_u16_unchecked(0x0040).decode(),
            Err(AltitudeError::Metric)
        );
    }

    #[test]
    fn binary_altitudes_round_trip() {
        for feet in (-1000..=50175).step_by(25) {
            let code = AltitudeCode::from_feet(feet).unwrap();
            assert!(!code.is_metric());
            assert_eq!(code.decode().unwrap(), feet);
        }
        assert!(AltitudeCode::from_feet(1010).is_none());
        assert!(AltitudeCode::from_feet(-1025).is_none());
        assert!(AltitudeCode::from_feet(50200).is_none());
    }
}
