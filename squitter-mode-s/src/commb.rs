//! Comm-B replies
//!
//! Only the aircraft identification register (BDS 2,0) is decoded.

use crate::{
    bits::{
        BitRangeError,
        RawMessage,
    },
    callsign::EncodedCallsign,
};

/// 56-bit Comm-B message (MB) field of DF20 and DF21 replies
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CommB(pub [u8; 7]);

impl CommB {
    /// First byte of an aircraft identification reply
    pub const BDS_IDENTIFICATION: u8 = 0x20;

    pub fn decode(raw: &RawMessage) -> Result<Self, BitRangeError> {
        Ok(Self(raw.bytes(33)?))
    }

    /// Returns the encoded callsign if this is an identification reply.
    pub fn identification(&self) -> Option<EncodedCallsign> {
        if self.0[0] == Self::BDS_IDENTIFICATION {
            let [_, a, b, c, d, e, f] = self.0;
            Some(EncodedCallsign::from_u64_unchecked(u64::from_be_bytes([
                0, 0, a, b, c, d, e, f,
            ])))
        }
        else {
            None
        }
    }
}
