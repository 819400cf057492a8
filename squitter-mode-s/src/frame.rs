//! Downlink formats
//!
//! One struct per downlink format, each holding only the fields that format
//! carries.
//!
//! <https://mode-s.org/1090mhz/content/mode-s/1-basics.html>

use squitter_types::IcaoAddress;

use crate::{
    LENGTH_LONG,
    LENGTH_SHORT,
    adsb,
    altitude::AltitudeCode,
    bits::{
        BitRangeError,
        RawMessage,
    },
    commb::CommB,
    fields::{
        AddressParity,
        Capability,
        CodeFormat,
        FlightStatus,
        IdentityCode,
        ParityInterrogator,
        VerticalStatus,
    },
};

/// Downlink format
///
/// First 5 bits of a Mode S frame determine the kind of frame.
///
/// # Exception
///
/// [`CommD`][Self::CommD] is determined only by the first 2 bits, which must
/// both be 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DownlinkFormat {
    ShortAirAirSurveillance,
    SurveillanceAltitudeReply,
    SurveillanceIdentityReply,
    AllCallReply,
    LongAirAirSurveillance,
    ExtendedSquitter,
    ExtendedSquitterNonTransponder,
    MilitaryExtendedSquitter,
    CommBAltitudeReply,
    CommBIdentityReply,
    CommD,
}

impl DownlinkFormat {
    pub fn from_u8(byte: u8) -> Option<Self> {
        if byte & 0b11000 == 0b11000 {
            Some(Self::CommD)
        }
        else {
            match byte {
                0 => Some(Self::ShortAirAirSurveillance),
                4 => Some(Self::SurveillanceAltitudeReply),
                5 => Some(Self::SurveillanceIdentityReply),
                11 => Some(Self::AllCallReply),
                16 => Some(Self::LongAirAirSurveillance),
                17 => Some(Self::ExtendedSquitter),
                18 => Some(Self::ExtendedSquitterNonTransponder),
                19 => Some(Self::MilitaryExtendedSquitter),
                20 => Some(Self::CommBAltitudeReply),
                21 => Some(Self::CommBIdentityReply),
                _ => None,
            }
        }
    }

    /// The DF number. Comm-D is reported as 24.
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::ShortAirAirSurveillance => 0,
            Self::SurveillanceAltitudeReply => 4,
            Self::SurveillanceIdentityReply => 5,
            Self::AllCallReply => 11,
            Self::LongAirAirSurveillance => 16,
            Self::ExtendedSquitter => 17,
            Self::ExtendedSquitterNonTransponder => 18,
            Self::MilitaryExtendedSquitter => 19,
            Self::CommBAltitudeReply => 20,
            Self::CommBIdentityReply => 21,
            Self::CommD => 24,
        }
    }

    pub fn frame_length(&self) -> usize {
        match self {
            Self::ShortAirAirSurveillance
            | Self::SurveillanceAltitudeReply
            | Self::SurveillanceIdentityReply
            | Self::AllCallReply => LENGTH_SHORT,
            _ => LENGTH_LONG,
        }
    }
}

#[inline(always)]
fn field(raw: &RawMessage, first: usize, last: usize) -> Result<u8, BitRangeError> {
    Ok(raw.bits(first, last)? as u8)
}

#[inline(always)]
fn address_parity(raw: &RawMessage) -> Result<AddressParity, BitRangeError> {
    Ok(AddressParity(raw.bytes(raw.bit_len() - 23)?))
}

#[inline(always)]
fn parity_interrogator(raw: &RawMessage) -> Result<ParityInterrogator, BitRangeError> {
    Ok(ParityInterrogator(raw.bytes(raw.bit_len() - 23)?))
}

#[inline(always)]
fn address_announced(raw: &RawMessage) -> Result<IcaoAddress, BitRangeError> {
    Ok(IcaoAddress::from_bytes(raw.bytes(9)?))
}

#[inline(always)]
fn altitude_code(raw: &RawMessage) -> Result<AltitudeCode, BitRangeError> {
    Ok(AltitudeCode::from_u16_unchecked(raw.bits(20, 32)? as u16))
}

#[inline(always)]
fn identity_code(raw: &RawMessage) -> Result<IdentityCode, BitRangeError> {
    Ok(IdentityCode::from_u16_unchecked(raw.bits(20, 32)? as u16))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Frame {
    ShortAirAirSurveillance(ShortAirAirSurveillance),
    SurveillanceAltitudeReply(SurveillanceAltitudeReply),
    SurveillanceIdentityReply(SurveillanceIdentityReply),
    AllCallReply(AllCallReply),
    LongAirAirSurveillance(LongAirAirSurveillance),
    ExtendedSquitter(ExtendedSquitter),
    ExtendedSquitterNonTransponder(ExtendedSquitterNonTransponder),
    MilitaryExtendedSquitter(MilitaryExtendedSquitter),
    CommBAltitudeReply(CommBAltitudeReply),
    CommBIdentityReply(CommBIdentityReply),
    CommD(CommD),
}

impl Frame {
    /// Decodes the fields for the given downlink format.
    ///
    /// The frame length must already have been checked against the format.
    pub fn decode(
        downlink_format: DownlinkFormat,
        raw: &RawMessage,
    ) -> Result<Self, BitRangeError> {
        let frame = match downlink_format {
            DownlinkFormat::ShortAirAirSurveillance => {
                Self::ShortAirAirSurveillance(ShortAirAirSurveillance::decode(raw)?)
            }
            DownlinkFormat::SurveillanceAltitudeReply => {
                Self::SurveillanceAltitudeReply(SurveillanceAltitudeReply::decode(raw)?)
            }
            DownlinkFormat::SurveillanceIdentityReply => {
                Self::SurveillanceIdentityReply(SurveillanceIdentityReply::decode(raw)?)
            }
            DownlinkFormat::AllCallReply => Self::AllCallReply(AllCallReply::decode(raw)?),
            DownlinkFormat::LongAirAirSurveillance => {
                Self::LongAirAirSurveillance(LongAirAirSurveillance::decode(raw)?)
            }
            DownlinkFormat::ExtendedSquitter => {
                Self::ExtendedSquitter(ExtendedSquitter::decode(raw)?)
            }
            DownlinkFormat::ExtendedSquitterNonTransponder => {
                Self::ExtendedSquitterNonTransponder(ExtendedSquitterNonTransponder::decode(raw)?)
            }
            DownlinkFormat::MilitaryExtendedSquitter => {
                Self::MilitaryExtendedSquitter(MilitaryExtendedSquitter::decode(raw)?)
            }
            DownlinkFormat::CommBAltitudeReply => {
                Self::CommBAltitudeReply(CommBAltitudeReply::decode(raw)?)
            }
            DownlinkFormat::CommBIdentityReply => {
                Self::CommBIdentityReply(CommBIdentityReply::decode(raw)?)
            }
            DownlinkFormat::CommD => Self::CommD(CommD::decode(raw)?),
        };

        Ok(frame)
    }

    pub fn downlink_format(&self) -> DownlinkFormat {
        match self {
            Frame::ShortAirAirSurveillance(_) => DownlinkFormat::ShortAirAirSurveillance,
            Frame::SurveillanceAltitudeReply(_) => DownlinkFormat::SurveillanceAltitudeReply,
            Frame::SurveillanceIdentityReply(_) => DownlinkFormat::SurveillanceIdentityReply,
            Frame::AllCallReply(_) => DownlinkFormat::AllCallReply,
            Frame::LongAirAirSurveillance(_) => DownlinkFormat::LongAirAirSurveillance,
            Frame::ExtendedSquitter(_) => DownlinkFormat::ExtendedSquitter,
            Frame::ExtendedSquitterNonTransponder(_) => {
                DownlinkFormat::ExtendedSquitterNonTransponder
            }
            Frame::MilitaryExtendedSquitter(_) => DownlinkFormat::MilitaryExtendedSquitter,
            Frame::CommBAltitudeReply(_) => DownlinkFormat::CommBAltitudeReply,
            Frame::CommBIdentityReply(_) => DownlinkFormat::CommBIdentityReply,
            Frame::CommD(_) => DownlinkFormat::CommD,
        }
    }

    pub fn length(&self) -> usize {
        self.downlink_format().frame_length()
    }

    /// Returns the ADS-B message, if this frame carries one.
    pub fn adsb_message(&self) -> Option<&adsb::Message> {
        match self {
            Frame::ExtendedSquitter(frame) => Some(&frame.adsb_message),
            Frame::ExtendedSquitterNonTransponder(frame) => frame.adsb_message.as_ref(),
            Frame::MilitaryExtendedSquitter(MilitaryExtendedSquitter::Adsb {
                adsb_message, ..
            }) => Some(adsb_message),
            _ => None,
        }
    }
}

/// DF0
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShortAirAirSurveillance {
    pub vertical_status: VerticalStatus,
    pub cross_link_capability: bool,
    pub sensitivity_level: u8,
    pub reply_information: u8,
    pub altitude_code: AltitudeCode,
    pub address_parity: AddressParity,
}

impl ShortAirAirSurveillance {
    pub fn decode(raw: &RawMessage) -> Result<Self, BitRangeError> {
        Ok(Self {
            vertical_status: VerticalStatus::from_bit(raw.bit(6)?),
            cross_link_capability: raw.bit(7)?,
            sensitivity_level: field(raw, 9, 11)?,
            reply_information: field(raw, 14, 17)?,
            altitude_code: altitude_code(raw)?,
            address_parity: address_parity(raw)?,
        })
    }
}

/// DF4
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurveillanceAltitudeReply {
    pub flight_status: FlightStatus,
    pub downlink_request: u8,
    pub utility_message: u8,
    pub altitude_code: AltitudeCode,
    pub address_parity: AddressParity,
}

impl SurveillanceAltitudeReply {
    pub fn decode(raw: &RawMessage) -> Result<Self, BitRangeError> {
        Ok(Self {
            flight_status: FlightStatus::from_u8_unchecked(field(raw, 6, 8)?),
            downlink_request: field(raw, 9, 13)?,
            utility_message: field(raw, 14, 19)?,
            altitude_code: altitude_code(raw)?,
            address_parity: address_parity(raw)?,
        })
    }
}

/// DF5
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurveillanceIdentityReply {
    pub flight_status: FlightStatus,
    pub downlink_request: u8,
    pub utility_message: u8,
    pub identity_code: IdentityCode,
    pub address_parity: AddressParity,
}

impl SurveillanceIdentityReply {
    pub fn decode(raw: &RawMessage) -> Result<Self, BitRangeError> {
        Ok(Self {
            flight_status: FlightStatus::from_u8_unchecked(field(raw, 6, 8)?),
            downlink_request: field(raw, 9, 13)?,
            utility_message: field(raw, 14, 19)?,
            identity_code: identity_code(raw)?,
            address_parity: address_parity(raw)?,
        })
    }
}

/// DF11
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllCallReply {
    pub capability: Capability,
    pub address_announced: IcaoAddress,
    pub parity_interrogator: ParityInterrogator,
}

impl AllCallReply {
    pub fn decode(raw: &RawMessage) -> Result<Self, BitRangeError> {
        Ok(Self {
            capability: Capability::from_u8_unchecked(field(raw, 6, 8)?),
            address_announced: address_announced(raw)?,
            parity_interrogator: parity_interrogator(raw)?,
        })
    }
}

/// DF16
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LongAirAirSurveillance {
    pub vertical_status: VerticalStatus,
    pub sensitivity_level: u8,
    pub reply_information: u8,
    pub altitude_code: AltitudeCode,
    /// ACAS message, not decoded
    pub mv: [u8; 7],
    pub address_parity: AddressParity,
}

impl LongAirAirSurveillance {
    pub fn decode(raw: &RawMessage) -> Result<Self, BitRangeError> {
        Ok(Self {
            vertical_status: VerticalStatus::from_bit(raw.bit(6)?),
            sensitivity_level: field(raw, 9, 11)?,
            reply_information: field(raw, 14, 17)?,
            altitude_code: altitude_code(raw)?,
            mv: raw.bytes(33)?,
            address_parity: address_parity(raw)?,
        })
    }
}

/// DF17
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtendedSquitter {
    pub capability: Capability,
    pub address_announced: IcaoAddress,
    pub adsb_message: adsb::Message,
    pub parity_interrogator: ParityInterrogator,
}

impl ExtendedSquitter {
    pub fn decode(raw: &RawMessage) -> Result<Self, BitRangeError> {
        Ok(Self {
            capability: Capability::from_u8_unchecked(field(raw, 6, 8)?),
            address_announced: address_announced(raw)?,
            adsb_message: adsb::Message::decode(raw)?,
            parity_interrogator: parity_interrogator(raw)?,
        })
    }
}

/// DF18
///
/// The ME field has the ADS-B layout only for some code formats (see
/// [`CodeFormat::has_extended_squitter`]). For the others only the raw data is
/// available.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtendedSquitterNonTransponder {
    pub code_format: CodeFormat,
    pub address_announced: IcaoAddress,
    pub adsb_message: Option<adsb::Message>,
    pub data: [u8; 7],
    pub parity_interrogator: ParityInterrogator,
}

impl ExtendedSquitterNonTransponder {
    pub fn decode(raw: &RawMessage) -> Result<Self, BitRangeError> {
        let code_format = CodeFormat::from_u8_unchecked(field(raw, 6, 8)?);

        let mut address_announced = address_announced(raw)?;
        if code_format.is_non_icao() {
            address_announced = address_announced.with_non_icao_flag();
        }

        let adsb_message = if code_format.has_extended_squitter() {
            Some(adsb::Message::decode(raw)?)
        }
        else {
            None
        };

        Ok(Self {
            code_format,
            address_announced,
            adsb_message,
            data: raw.bytes(33)?,
            parity_interrogator: parity_interrogator(raw)?,
        })
    }
}

/// DF19
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MilitaryExtendedSquitter {
    Adsb {
        address_announced: IcaoAddress,
        adsb_message: adsb::Message,
        parity_interrogator: ParityInterrogator,
    },
    /// Reserved for military applications
    Reserved {
        /// 1..=7
        application_field: u8,

        data: [u8; 13],
    },
}

impl MilitaryExtendedSquitter {
    pub fn decode(raw: &RawMessage) -> Result<Self, BitRangeError> {
        let application_field = field(raw, 6, 8)?;
        if application_field == 0 {
            Ok(Self::Adsb {
                address_announced: address_announced(raw)?,
                adsb_message: adsb::Message::decode(raw)?,
                parity_interrogator: parity_interrogator(raw)?,
            })
        }
        else {
            Ok(Self::Reserved {
                application_field,
                data: raw.bytes(9)?,
            })
        }
    }
}

/// DF20
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommBAltitudeReply {
    pub flight_status: FlightStatus,
    pub downlink_request: u8,
    pub utility_message: u8,
    pub altitude_code: AltitudeCode,
    pub comm_b: CommB,
    pub address_parity: AddressParity,
}

impl CommBAltitudeReply {
    pub fn decode(raw: &RawMessage) -> Result<Self, BitRangeError> {
        Ok(Self {
            flight_status: FlightStatus::from_u8_unchecked(field(raw, 6, 8)?),
            downlink_request: field(raw, 9, 13)?,
            utility_message: field(raw, 14, 19)?,
            altitude_code: altitude_code(raw)?,
            comm_b: CommB::decode(raw)?,
            address_parity: address_parity(raw)?,
        })
    }
}

/// DF21
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommBIdentityReply {
    pub flight_status: FlightStatus,
    pub downlink_request: u8,
    pub utility_message: u8,
    pub identity_code: IdentityCode,
    pub comm_b: CommB,
    pub address_parity: AddressParity,
}

impl CommBIdentityReply {
    pub fn decode(raw: &RawMessage) -> Result<Self, BitRangeError> {
        Ok(Self {
            flight_status: FlightStatus::from_u8_unchecked(field(raw, 6, 8)?),
            downlink_request: field(raw, 9, 13)?,
            utility_message: field(raw, 14, 19)?,
            identity_code: identity_code(raw)?,
            comm_b: CommB::decode(raw)?,
            address_parity: address_parity(raw)?,
        })
    }
}

/// DF24
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommD {
    pub control: bool,
    pub segment_number: u8,
    pub data: [u8; 10],
    pub address_parity: AddressParity,
}

impl CommD {
    pub fn decode(raw: &RawMessage) -> Result<Self, BitRangeError> {
        Ok(Self {
            control: raw.bit(4)?,
            segment_number: field(raw, 5, 8)?,
            data: raw.bytes(9)?,
            address_parity: address_parity(raw)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DownlinkFormat,
        Frame,
        MilitaryExtendedSquitter,
    };
    use crate::bits::RawMessage;

    fn decode(hex: &str) -> Frame {
        let raw = RawMessage::from_bytes(&hex::decode(hex).unwrap()).unwrap();
        let downlink_format = DownlinkFormat::from_u8(raw.bits(1, 5).unwrap() as u8).unwrap();
        Frame::decode(downlink_format, &raw).unwrap()
    }

    #[test]
    fn it_maps_downlink_formats() {
        for df in [0, 4, 5, 11, 16, 17, 18, 19, 20, 21] {
            assert_eq!(DownlinkFormat::from_u8(df).unwrap().as_u8(), df);
        }
        for df in 24..32 {
            assert_eq!(DownlinkFormat::from_u8(df), Some(DownlinkFormat::CommD));
        }
        for df in [1, 2, 3, 6, 10, 12, 15, 22, 23] {
            assert_eq!(DownlinkFormat::from_u8(df), None);
        }
        assert_eq!(DownlinkFormat::AllCallReply.frame_length(), 7);
        assert_eq!(DownlinkFormat::CommD.frame_length(), 14);
    }

    #[test]
    fn it_decodes_short_air_air_surveillance() {
        let Frame::ShortAirAirSurveillance(frame) = decode("02e19718e70f6c")
        else {
            panic!("expected DF0");
        };
        assert_eq!(frame.altitude_code.decode().unwrap(), 36000);
        assert_eq!(frame.sensitivity_level, 7);
    }

    #[test]
    fn it_decodes_identity_replies() {
        let Frame::SurveillanceIdentityReply(frame) = decode("28001b0601970d")
        else {
            panic!("expected DF5");
        };
        assert_eq!(frame.identity_code.squawk().to_string(), "3452");
        assert_eq!(frame.flight_status.as_u8(), 0);
    }

    #[test]
    fn it_decodes_comm_b_replies() {
        let Frame::CommBIdentityReply(frame) = decode("ac19b29573482f6963663636022b")
        else {
            panic!("expected DF21");
        };
        assert_eq!(frame.flight_status.as_u8(), 4);
        assert_eq!(frame.identity_code.squawk().to_string(), "6017");
        assert_eq!(frame.comm_b.0[0], 0x73);
    }

    #[test]
    fn it_gates_non_transponder_squitters() {
        // CF 1: ADS-B with non-ICAO address
        let Frame::ExtendedSquitterNonTransponder(frame) = decode("91acf84e23101332cf3ca037ef13")
        else {
            panic!("expected DF18");
        };
        assert!(frame.address_announced.non_icao());
        assert_eq!(frame.adsb_message.unwrap().type_code(), 4);

        // CF 3: coarse TIS-B
        let Frame::ExtendedSquitterNonTransponder(frame) = decode("93acf84e23101332cf3ca037ef13")
        else {
            panic!("expected DF18");
        };
        assert!(!frame.address_announced.non_icao());
        assert!(frame.adsb_message.is_none());
        assert_eq!(frame.data[0], 0x23);
    }

    #[test]
    fn it_decodes_military_squitters() {
        let frame = decode("98acf84e23101332cf3ca037ef13");
        assert!(matches!(
            frame,
            Frame::MilitaryExtendedSquitter(MilitaryExtendedSquitter::Adsb { .. })
        ));
        assert_eq!(frame.adsb_message().unwrap().type_code(), 4);

        let Frame::MilitaryExtendedSquitter(MilitaryExtendedSquitter::Reserved {
            application_field,
            data,
        }) = decode("9facf84e23101332cf3ca037ef13")
        else {
            panic!("expected reserved DF19");
        };
        assert_eq!(application_field, 7);
        assert_eq!(data[0], 0xac);
        assert_eq!(data[12], 0x13);
    }

    #[test]
    fn it_decodes_comm_d() {
        let Frame::CommD(frame) = decode("ff0000000000ff000000000000ff")
        else {
            panic!("expected DF24");
        };
        assert!(frame.control);
        assert_eq!(frame.segment_number, 0xf);
        assert_eq!(frame.data, [0, 0, 0, 0, 0, 0xff, 0, 0, 0, 0]);
    }
}
