//! BEAST format
//!
//! The BEAST format is a stream protocol to transmit Mode S related data
//! frames as they're captured by a receiver. It's an escaped format: frames
//! start with an escape byte followed by the frame type, and any occurance of
//! the escape byte in the frame body is sent as two escape bytes. This allows
//! for finding the start of a frame and skipping malformed or unrecognized
//! frames.
//!
//! ```plain
//! 0x1a  type  timestamp (6 bytes)  signal (1 byte)  payload (2, 7 or 14 bytes)
//! ```
//!
//! - [`FrameDecoder`] is a push state machine that turns bytes into frames.
//!   It can also be driven from a [`BufRead`](std::io::BufRead).
//! - [`Reader`] wraps an [`AsyncRead`](tokio::io::AsyncRead) into a
//!   [`Stream`](futures_util::Stream) of frames.
//!
//! - [Original documentation][1]
//! - [wiedehopf/readsb encoding][2]
//!
//! [1]: https://wiki.jetvision.de/wiki/Mode-S_Beast:Data_Output_Formats
//! [2]: https://github.com/wiedehopf/readsb/blob/75decb53c0e66f4c12cf24127578a3fe7d919219/net_io.c#L1754

use std::{
    fmt::Debug,
    time::Duration,
};

use bytes::BufMut;
use squitter_mode_s::Message;

mod decoder;
mod reader;

pub use crate::{
    decoder::{
        FrameDecoder,
        MAX_SEEK,
    },
    reader::Reader,
};

/// the "escape" byte.
pub const ESCAPE: u8 = 0x1a;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("escape byte followed by 0x{byte:02x} inside a frame")]
    Corrupt { byte: u8 },

    #[error("frame of type 0x{frame_type:02x} truncated after {length} bytes")]
    Truncated { frame_type: u8, length: usize },

    #[error("unsupported frame type: 0x{frame_type:02x}")]
    UnsupportedFrameType { frame_type: u8 },

    #[error("frame of type 0x{frame_type:02x} must be {expected} bytes long, but is {length}")]
    InvalidLength {
        frame_type: u8,
        expected: usize,
        length: usize,
    },

    #[error("no frame marker found in {skipped} bytes")]
    NoFrameMarker { skipped: usize },

    #[error("unexpected end of stream inside a frame")]
    UnexpectedEof,

    #[error("io error")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether decoding can continue with the next frame after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Corrupt { .. }
                | Self::Truncated { .. }
                | Self::UnsupportedFrameType { .. }
                | Self::InvalidLength { .. }
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameType {
    ModeAc = 0x31,
    ModeSShort = 0x32,
    ModeSLong = 0x33,
    /// Receiver status. Not decoded.
    Status = 0x34,
}

impl FrameType {
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x31 => Some(Self::ModeAc),
            0x32 => Some(Self::ModeSShort),
            0x33 => Some(Self::ModeSLong),
            0x34 => Some(Self::Status),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Total length of the unescaped frame, including marker and type.
    pub fn frame_length(&self) -> Option<usize> {
        match self {
            Self::ModeAc => Some(11),
            Self::ModeSShort => Some(16),
            Self::ModeSLong => Some(23),
            Self::Status => None,
        }
    }
}

/// 48-bit counter of a 12 MHz clock.
///
/// Some values have special meaning. See [readsb][1].
///
/// [1]: https://github.com/wiedehopf/readsb/blob/75decb53c0e66f4c12cf24127578a3fe7d919219/readsb.h#L341
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MlatTimestamp(pub [u8; 6]);

impl MlatTimestamp {
    pub const SYNTHETIC_MLAT: Self = Self(*b"\xFF\x00\x4D\x4C\x41\x54");
    pub const SYNTHETIC_UAT: Self = Self(*b"\xFF\x00\x4D\x4C\x41\x55");
    pub const NO_FORWARD: Self = Self(*b"\xFF\x00\x4D\x4C\x41\x60");
    pub const ANY_TIMESTAMP: Self = Self([0xff; 6]);

    pub fn from_ticks(ticks: u64) -> Self {
        let [_, _, a, b, c, d, e, f] = ticks.to_be_bytes();
        Self([a, b, c, d, e, f])
    }

    pub fn ticks(&self) -> u64 {
        let [a, b, c, d, e, f] = self.0;
        u64::from_be_bytes([0, 0, a, b, c, d, e, f])
    }

    /// Nanoseconds, rounded to the nearest half microsecond.
    pub fn as_nanos(&self) -> u64 {
        let nanos = self.ticks() * 1000 / 12;
        (nanos + 250) / 500 * 500
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_nanos(self.as_nanos())
    }

    pub fn is_synthetic(&self) -> bool {
        *self == Self::SYNTHETIC_MLAT || *self == Self::SYNTHETIC_UAT
    }
}

impl Debug for MlatTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MlatTimestamp({})", self.ticks())
    }
}

/// ```c
/// sig = nearbyint(sqrt(mm->signalLevel) * 255);
/// ```
/// <https://github.com/wiedehopf/readsb/blob/75decb53c0e66f4c12cf24127578a3fe7d919219/net_io.c#L1777>
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SignalLevel(pub u8);

impl SignalLevel {
    /// RSSI as a fraction of full-scale power, in `[0, 1]`.
    pub fn decode(&self) -> f32 {
        (f32::from(self.0) / 255.0).clamp(0.0, 1.0).powi(2)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Payload {
    ModeAc([u8; 2]),
    ModeSShort([u8; 7]),
    ModeSLong([u8; 14]),
}

impl Payload {
    pub fn frame_type(&self) -> FrameType {
        match self {
            Self::ModeAc(_) => FrameType::ModeAc,
            Self::ModeSShort(_) => FrameType::ModeSShort,
            Self::ModeSLong(_) => FrameType::ModeSLong,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::ModeAc(data) => &data[..],
            Self::ModeSShort(data) => &data[..],
            Self::ModeSLong(data) => &data[..],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Frame {
    pub timestamp: MlatTimestamp,
    pub signal_level: SignalLevel,
    pub payload: Payload,
}

impl Frame {
    /// Decodes an unescaped frame, starting with the escape byte and frame
    /// type.
    pub fn decode(frame: &[u8]) -> Result<Self, Error> {
        let (marker, frame_type, body) = match frame {
            [marker, frame_type, body @ ..] => (*marker, *frame_type, body),
            _ => {
                return Err(Error::NoFrameMarker {
                    skipped: frame.len(),
                });
            }
        };
        if marker != ESCAPE {
            return Err(Error::NoFrameMarker {
                skipped: frame.len(),
            });
        }

        let expected = FrameType::from_u8(frame_type)
            .and_then(|frame_type| frame_type.frame_length())
            .ok_or(Error::UnsupportedFrameType { frame_type })?;
        if frame.len() != expected {
            return Err(Error::InvalidLength {
                frame_type,
                expected,
                length: frame.len(),
            });
        }

        let timestamp = MlatTimestamp([body[0], body[1], body[2], body[3], body[4], body[5]]);
        let signal_level = SignalLevel(body[6]);
        let data = &body[7..];

        // the length check above makes these infallible
        let payload = match frame_type {
            0x31 => data.try_into().ok().map(Payload::ModeAc),
            0x32 => data.try_into().ok().map(Payload::ModeSShort),
            _ => data.try_into().ok().map(Payload::ModeSLong),
        }
        .ok_or(Error::InvalidLength {
            frame_type,
            expected,
            length: frame.len(),
        })?;

        Ok(Self {
            timestamp,
            signal_level,
            payload,
        })
    }

    /// Decodes a frame as it appears on the wire, with doubled escape bytes.
    pub fn from_wire(wire: &[u8]) -> Result<Self, Error> {
        match wire {
            [ESCAPE, body @ ..] => {
                let mut frame = Vec::with_capacity(wire.len());
                frame.push(ESCAPE);
                frame.extend(unescape(body));
                Self::decode(&frame)
            }
            _ => Self::decode(wire),
        }
    }

    pub fn frame_type(&self) -> FrameType {
        self.payload.frame_type()
    }

    /// Writes the escaped wire form of this frame.
    pub fn encode<B: BufMut>(&self, buffer: &mut B) {
        buffer.put_u8(ESCAPE);
        buffer.put_u8(self.frame_type().as_u8());

        escape(&self.timestamp.0, buffer);
        escape(&[self.signal_level.0], buffer);
        escape(self.payload.as_bytes(), buffer);
    }

    pub fn to_wire(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(2 * 23);
        self.encode(&mut buffer);
        buffer
    }

    /// The Mode A/C reply code, for frames of type 0x31.
    pub fn mode_ac(&self) -> Option<[u8; 2]> {
        match self.payload {
            Payload::ModeAc(data) => Some(data),
            _ => None,
        }
    }

    /// Decodes the Mode S payload. Returns `None` for Mode A/C frames.
    pub fn message(&self) -> Option<Result<Message, squitter_mode_s::DecodeError>> {
        match &self.payload {
            Payload::ModeAc(_) => None,
            Payload::ModeSShort(data) => Some(Message::decode(data)),
            Payload::ModeSLong(data) => Some(Message::decode(data)),
        }
    }
}

/// Writes `data` with every escape byte doubled.
///
/// This is for frame bodies. The leading escape byte of a frame marker must be
/// written as is.
pub fn escape<B: BufMut>(data: &[u8], buffer: &mut B) {
    for &byte in data {
        if byte == ESCAPE {
            buffer.put_u8(ESCAPE);
        }
        buffer.put_u8(byte);
    }
}

/// Collapses doubled escape bytes in a frame body.
///
/// A single escape byte is kept as is.
pub fn unescape(data: &[u8]) -> Vec<u8> {
    let mut unescaped = Vec::with_capacity(data.len());
    let mut escape = false;

    for &byte in data {
        if escape {
            escape = false;
            if byte == ESCAPE {
                continue;
            }
        }
        else if byte == ESCAPE {
            escape = true;
        }
        unescaped.push(byte);
    }

    unescaped
}
