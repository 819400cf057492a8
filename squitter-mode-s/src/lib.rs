//! Mode S frame decoder
//!
//! [The 1090 Megahertz Riddle][1]
//!
//! # Notes
//!
//! short = 56 bits / 7 bytes
//! long = 112 bits / 14 bytes
//!
//! Fields are read lazily from the raw frame through [`Message`]. Asking for a
//! field the downlink format doesn't carry returns
//! [`FieldError::NotAvailable`], which callers can skip silently.
//!
//! [1]: https://mode-s.org/1090mhz/content/mode-s/1-basics.html

pub mod adsb;
pub mod altitude;
pub mod bits;
pub mod callsign;
pub mod commb;
pub mod cpr;
pub mod fields;
pub mod frame;
pub mod gillham;
pub mod parity;

use squitter_types::{
    IcaoAddress,
    Squawk,
};

pub use crate::{
    altitude::{
        AltitudeCode,
        AltitudeError,
    },
    bits::{
        BitRangeError,
        RawMessage,
    },
    callsign::{
        Callsign,
        EmitterCategory,
    },
    cpr::Cpr,
    fields::{
        Capability,
        CodeFormat,
        FlightStatus,
        SurveillanceStatus,
        VerticalStatus,
    },
    frame::{
        DownlinkFormat,
        Frame,
    },
};

/// Length of a short mode-s frame
pub const LENGTH_SHORT: usize = 7;

/// Length of a long mode-s frame
pub const LENGTH_LONG: usize = 14;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid frame length: {length} bytes")]
    InvalidLength { length: usize },

    #[error("{downlink_format:?} frames are {expected} bytes long, but got {length} bytes")]
    LengthMismatch {
        downlink_format: DownlinkFormat,
        expected: usize,
        length: usize,
    },

    #[error("unsupported downlink format: {downlink_format}")]
    UnsupportedFormat {
        downlink_format: u8,
        raw: RawMessage,
    },

    #[error(transparent)]
    Bits(#[from] BitRangeError),
}

#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    #[error("{field} is not available for {downlink_format:?}")]
    NotAvailable {
        field: &'static str,
        downlink_format: DownlinkFormat,
    },

    #[error(transparent)]
    Bits(#[from] BitRangeError),

    #[error(transparent)]
    Altitude(#[from] AltitudeError),
}

impl FieldError {
    pub fn is_not_available(&self) -> bool {
        matches!(self, Self::NotAvailable { .. })
    }
}

/// A decoded Mode S frame
///
/// Holds the raw frame, its computed parity and the fields of its downlink
/// format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Message {
    raw: RawMessage,
    parity: u32,
    frame: Frame,
}

impl Message {
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::from_raw(RawMessage::from_bytes(bytes)?)
    }

    pub fn from_raw(raw: RawMessage) -> Result<Self, DecodeError> {
        let df = raw.bits(1, 5)? as u8;
        let downlink_format =
            DownlinkFormat::from_u8(df).ok_or(DecodeError::UnsupportedFormat {
                downlink_format: df,
                raw,
            })?;

        let expected = downlink_format.frame_length();
        if raw.len() != expected {
            return Err(DecodeError::LengthMismatch {
                downlink_format,
                expected,
                length: raw.len(),
            });
        }

        let parity = parity::parity(&raw);
        let frame = Frame::decode(downlink_format, &raw)?;
        tracing::trace!(?raw, ?frame, "decoded mode-s frame");

        Ok(Self { raw, parity, frame })
    }

    pub fn raw(&self) -> &RawMessage {
        &self.raw
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn downlink_format(&self) -> DownlinkFormat {
        self.frame.downlink_format()
    }

    /// Computed 24-bit parity of the frame
    pub fn parity(&self) -> u32 {
        self.parity
    }

    /// Checks the parity for frames with a plain parity field.
    ///
    /// Returns `None` for formats with the address overlaid on the parity,
    /// since those can't be checked without knowing the address.
    pub fn is_valid(&self) -> Option<bool> {
        match &self.frame {
            Frame::AllCallReply(frame) => Some(frame.parity_interrogator.as_u32() == self.parity),
            Frame::ExtendedSquitter(frame) => {
                Some(frame.parity_interrogator.as_u32() == self.parity)
            }
            Frame::ExtendedSquitterNonTransponder(frame) => {
                Some(frame.parity_interrogator.as_u32() == self.parity)
            }
            _ => None,
        }
    }

    fn not_available(&self, field: &'static str) -> FieldError {
        FieldError::NotAvailable {
            field,
            downlink_format: self.downlink_format(),
        }
    }

    /// The aircraft address.
    ///
    /// For formats with an address/parity field this is recovered from the
    /// parity and is only correct if the frame was received without errors.
    pub fn icao(&self) -> Result<IcaoAddress, FieldError> {
        let address_parity = match &self.frame {
            Frame::AllCallReply(frame) => return Ok(frame.address_announced),
            Frame::ExtendedSquitter(frame) => return Ok(frame.address_announced),
            Frame::ExtendedSquitterNonTransponder(frame) => return Ok(frame.address_announced),
            Frame::MilitaryExtendedSquitter(frame::MilitaryExtendedSquitter::Adsb {
                address_announced,
                ..
            }) => return Ok(*address_announced),
            Frame::MilitaryExtendedSquitter(frame::MilitaryExtendedSquitter::Reserved {
                ..
            }) => return Err(self.not_available("icao")),
            Frame::ShortAirAirSurveillance(frame) => frame.address_parity,
            Frame::SurveillanceAltitudeReply(frame) => frame.address_parity,
            Frame::SurveillanceIdentityReply(frame) => frame.address_parity,
            Frame::LongAirAirSurveillance(frame) => frame.address_parity,
            Frame::CommBAltitudeReply(frame) => frame.address_parity,
            Frame::CommBIdentityReply(frame) => frame.address_parity,
            Frame::CommD(frame) => frame.address_parity,
        };

        Ok(address_parity.recover_address(self.parity))
    }

    /// Altitude in feet.
    pub fn altitude(&self) -> Result<i32, FieldError> {
        let altitude_code = match &self.frame {
            Frame::ShortAirAirSurveillance(frame) => frame.altitude_code,
            Frame::SurveillanceAltitudeReply(frame) => frame.altitude_code,
            Frame::LongAirAirSurveillance(frame) => frame.altitude_code,
            Frame::CommBAltitudeReply(frame) => frame.altitude_code,
            frame => {
                frame
                    .adsb_message()
                    .and_then(|message| message.altitude_code())
                    .ok_or_else(|| self.not_available("altitude"))?
            }
        };

        Ok(altitude_code.decode()?)
    }

    pub fn squawk(&self) -> Result<Squawk, FieldError> {
        match &self.frame {
            Frame::SurveillanceIdentityReply(frame) => Ok(frame.identity_code.squawk()),
            Frame::CommBIdentityReply(frame) => Ok(frame.identity_code.squawk()),
            _ => Err(self.not_available("squawk")),
        }
    }

    /// Callsign from an aircraft identification squitter or a Comm-B
    /// identification reply.
    pub fn callsign(&self) -> Result<Callsign, FieldError> {
        let encoded = match &self.frame {
            Frame::CommBAltitudeReply(frame) => frame.comm_b.identification(),
            Frame::CommBIdentityReply(frame) => frame.comm_b.identification(),
            frame => {
                match frame.adsb_message() {
                    Some(adsb::Message::AircraftIdentification(identification)) => {
                        Some(identification.callsign)
                    }
                    _ => None,
                }
            }
        };

        encoded
            .map(|encoded| encoded.decode())
            .ok_or_else(|| self.not_available("callsign"))
    }

    pub fn cpr(&self) -> Result<Cpr, FieldError> {
        match self.frame.adsb_message() {
            Some(adsb::Message::AirbornePosition(position)) => Ok(position.cpr),
            _ => Err(self.not_available("cpr")),
        }
    }

    pub fn capability(&self) -> Result<Capability, FieldError> {
        match &self.frame {
            Frame::AllCallReply(frame) => Ok(frame.capability),
            Frame::ExtendedSquitter(frame) => Ok(frame.capability),
            _ => Err(self.not_available("capability")),
        }
    }

    pub fn code_format(&self) -> Result<CodeFormat, FieldError> {
        match &self.frame {
            Frame::ExtendedSquitterNonTransponder(frame) => Ok(frame.code_format),
            _ => Err(self.not_available("code format")),
        }
    }

    pub fn flight_status(&self) -> Result<FlightStatus, FieldError> {
        match &self.frame {
            Frame::SurveillanceAltitudeReply(frame) => Ok(frame.flight_status),
            Frame::SurveillanceIdentityReply(frame) => Ok(frame.flight_status),
            Frame::CommBAltitudeReply(frame) => Ok(frame.flight_status),
            Frame::CommBIdentityReply(frame) => Ok(frame.flight_status),
            _ => Err(self.not_available("flight status")),
        }
    }

    pub fn vertical_status(&self) -> Result<VerticalStatus, FieldError> {
        match &self.frame {
            Frame::ShortAirAirSurveillance(frame) => Ok(frame.vertical_status),
            Frame::LongAirAirSurveillance(frame) => Ok(frame.vertical_status),
            _ => Err(self.not_available("vertical status")),
        }
    }

    /// Extended squitter type code
    pub fn type_code(&self) -> Result<u8, FieldError> {
        self.frame
            .adsb_message()
            .map(|message| message.type_code())
            .ok_or_else(|| self.not_available("type code"))
    }

    pub fn surveillance_status(&self) -> Result<SurveillanceStatus, FieldError> {
        match self.frame.adsb_message() {
            Some(adsb::Message::AirbornePosition(position)) => Ok(position.surveillance_status),
            _ => Err(self.not_available("surveillance status")),
        }
    }

    pub fn emitter_category(&self) -> Result<EmitterCategory, FieldError> {
        match self.frame.adsb_message() {
            Some(adsb::Message::AircraftIdentification(identification)) => {
                Ok(identification.emitter_category)
            }
            _ => Err(self.not_available("emitter category")),
        }
    }
}
