//! ADS-B message (ME) field of extended squitters
//!
//! ```plain
//! ME bit  1    5 6 8 9         20 21 22 23            39 40            56
//!         ttttt sss aaaaaaaaaaaa  T  F  llllllllllllllll LLLLLLLLLLLLLLLLL
//! ```
//!
//! ME bit `n` is bit `32 + n` of the frame.

use crate::{
    altitude::AltitudeCode,
    bits::{
        BitRangeError,
        RawMessage,
    },
    callsign::{
        EmitterCategory,
        EncodedCallsign,
    },
    cpr::{
        CoordinateCode,
        Cpr,
        Format,
        PositionCode,
    },
    fields::SurveillanceStatus,
};

/// Returns bits `first..=last` of the ME field.
#[inline(always)]
fn me(raw: &RawMessage, first: usize, last: usize) -> Result<u64, BitRangeError> {
    raw.bits(32 + first, 32 + last)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Message {
    /// Type code 0: no position information, but may carry an altitude.
    NoPosition { altitude_code: AltitudeCode },
    AircraftIdentification(AircraftIdentification),
    AirbornePosition(AirbornePosition),
    /// Any other type code. The data is the whole ME field.
    Other { type_code: u8, data: [u8; 7] },
}

impl Message {
    pub fn decode(raw: &RawMessage) -> Result<Self, BitRangeError> {
        let type_code = me(raw, 1, 5)? as u8;

        let message = match type_code {
            0 => {
                Self::NoPosition {
                    altitude_code: AltitudeCode::from_ac12(me(raw, 9, 20)? as u16),
                }
            }
            1..=4 => Self::AircraftIdentification(AircraftIdentification::decode(raw, type_code)?),
            9..=18 => Self::AirbornePosition(AirbornePosition::decode(raw, type_code)?),
            _ => {
                Self::Other {
                    type_code,
                    data: raw.bytes(33)?,
                }
            }
        };

        Ok(message)
    }

    pub fn type_code(&self) -> u8 {
        match self {
            Self::NoPosition { .. } => 0,
            Self::AircraftIdentification(identification) => identification.type_code,
            Self::AirbornePosition(position) => position.type_code,
            Self::Other { type_code, .. } => *type_code,
        }
    }

    /// The 12-bit altitude code, if this type carries one.
    pub fn altitude_code(&self) -> Option<AltitudeCode> {
        match self {
            Self::NoPosition { altitude_code } => Some(*altitude_code),
            Self::AirbornePosition(position) => Some(position.altitude_code),
            _ => None,
        }
    }
}

/// Type codes 1 to 4
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AircraftIdentification {
    pub type_code: u8,
    pub emitter_category: EmitterCategory,
    pub callsign: EncodedCallsign,
}

impl AircraftIdentification {
    pub fn decode(raw: &RawMessage, type_code: u8) -> Result<Self, BitRangeError> {
        Ok(Self {
            type_code,
            emitter_category: EmitterCategory::from_type_code_and_category_unchecked(
                type_code,
                me(raw, 6, 8)? as u8,
            ),
            callsign: EncodedCallsign::from_u64_unchecked(me(raw, 9, 56)?),
        })
    }
}

/// Type codes 9 to 18 (barometric altitude)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AirbornePosition {
    pub type_code: u8,
    pub surveillance_status: SurveillanceStatus,
    pub single_antenna: bool,
    pub altitude_code: AltitudeCode,
    pub cpr: Cpr,
}

impl AirbornePosition {
    pub fn decode(raw: &RawMessage, type_code: u8) -> Result<Self, BitRangeError> {
        Ok(Self {
            type_code,
            surveillance_status: SurveillanceStatus::from_u8_unchecked(me(raw, 6, 7)? as u8),
            single_antenna: me(raw, 8, 8)? != 0,
            altitude_code: AltitudeCode::from_ac12(me(raw, 9, 20)? as u16),
            cpr: Cpr::airborne(
                Format::from_bit(me(raw, 22, 22)? != 0),
                me(raw, 21, 21)? != 0,
                PositionCode {
                    latitude: CoordinateCode::from_u32_unchecked(me(raw, 23, 39)? as u32),
                    longitude: CoordinateCode::from_u32_unchecked(me(raw, 40, 56)? as u32),
                },
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Message;
    use crate::{
        bits::RawMessage,
        cpr::Format,
    };

    fn decode(hex: &str) -> Message {
        let raw = RawMessage::from_bytes(&hex::decode(hex).unwrap()).unwrap();
        Message::decode(&raw).unwrap()
    }

    #[test]
    fn it_decodes_identification() {
        let Message::AircraftIdentification(identification) =
            decode("8dacf84e23101332cf3ca037ef13")
        else {
            panic!("expected identification");
        };
        assert_eq!(identification.type_code, 4);
        assert_eq!(identification.emitter_category.to_string(), "A3");
        assert_eq!(identification.callsign.decode(), "DAL2332");
    }

    #[test]
    fn it_decodes_airborne_positions() {
        let message = decode("8da9450d60bde138e8638c939134");
        assert_eq!(message.type_code(), 12);

        let Message::AirbornePosition(position) = message
        else {
            panic!("expected airborne position");
        };
        assert_eq!(position.surveillance_status.as_u8(), 0);
        assert!(!position.single_antenna);
        assert_eq!(position.altitude_code.decode().unwrap(), 36950);
        assert_eq!(position.cpr.format, Format::Even);
        assert!(!position.cpr.time_synchronized);
        assert_eq!(position.cpr.bits, 17);
        assert_eq!(position.cpr.position.latitude.as_u32(), 40052);
        assert_eq!(position.cpr.position.longitude.as_u32(), 25484);
    }

    #[test]
    fn other_type_codes_keep_the_payload() {
        // TC19 airborne velocity
        let message = decode("8d485020994409940838175b284f");
        assert_eq!(message.type_code(), 19);
        assert_eq!(message.altitude_code(), None);
        assert!(matches!(
            message,
            Message::Other {
                type_code: 19,
                data: [0x99, 0x44, 0x09, 0x94, 0x08, 0x38, 0x17]
            }
        ));
    }
}
