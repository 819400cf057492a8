//! BEAST frame decoder

use std::io::BufRead;

use crate::{
    ESCAPE,
    Error,
    Frame,
    FrameType,
};

/// Maximum number of bytes skipped while looking for a frame marker.
pub const MAX_SEEK: usize = 100;

/// Longest unescaped frame (Mode S long).
const FRAME_BUFFER_SIZE: usize = 23;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Seeking {
        /// The previous byte was an escape.
        escape: bool,
        skipped: usize,
    },
    ReadingFrame {
        frame_type: FrameType,
        length: usize,
        escape: bool,
    },
}

impl Default for State {
    fn default() -> Self {
        Self::Seeking {
            escape: false,
            skipped: 0,
        }
    }
}

/// Push decoder for the BEAST output format.
///
/// Bytes are fed one at a time with [`push`](Self::push). A frame, or an
/// error, is returned as soon as the byte completing it has been pushed. After
/// any error the decoder starts looking for the next frame marker, so
/// decoding can continue if the error [is
/// recoverable](Error::is_recoverable).
#[derive(Debug)]
pub struct FrameDecoder {
    state: State,
    buffer: [u8; FRAME_BUFFER_SIZE],
    buffer_write_pos: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self {
            state: State::default(),
            buffer: [0; FRAME_BUFFER_SIZE],
            buffer_write_pos: 0,
        }
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the decoder is between frames.
    pub fn is_idle(&self) -> bool {
        self.state == State::default()
    }

    pub fn push(&mut self, byte: u8) -> Option<Result<Frame, Error>> {
        match self.state {
            State::Seeking { escape, skipped } => self.seek(escape, skipped, byte),
            State::ReadingFrame {
                frame_type,
                length,
                escape,
            } => self.read_frame(frame_type, length, escape, byte),
        }
    }

    fn seek(&mut self, escape: bool, skipped: usize, byte: u8) -> Option<Result<Frame, Error>> {
        if escape && FrameType::from_u8(byte).is_some() {
            return self.start_frame(byte);
        }

        if !escape && byte == ESCAPE {
            self.state = State::Seeking {
                escape: true,
                skipped,
            };
            return None;
        }

        // either garbage, a doubled escape byte inside a frame we didn't see the
        // start of, or an escape byte not followed by a frame type.
        tracing::trace!(byte, "skipping garbage");
        let skipped = skipped + if escape { 2 } else { 1 };

        if skipped > MAX_SEEK {
            tracing::warn!(skipped, "no frame marker found");
            self.reset();
            Some(Err(Error::NoFrameMarker { skipped }))
        }
        else {
            self.state = State::Seeking {
                escape: false,
                skipped,
            };
            None
        }
    }

    /// Called after an escape byte followed by the frame type `byte`.
    fn start_frame(&mut self, byte: u8) -> Option<Result<Frame, Error>> {
        let supported = FrameType::from_u8(byte).and_then(|frame_type| {
            frame_type
                .frame_length()
                .map(|length| (frame_type, length))
        });

        match supported {
            Some((frame_type, length)) => {
                self.buffer[0] = ESCAPE;
                self.buffer[1] = byte;
                self.buffer_write_pos = 2;
                self.state = State::ReadingFrame {
                    frame_type,
                    length,
                    escape: false,
                };
                None
            }
            None => {
                tracing::debug!(frame_type = byte, "skipping unsupported frame");
                self.reset();
                Some(Err(Error::UnsupportedFrameType { frame_type: byte }))
            }
        }
    }

    fn read_frame(
        &mut self,
        frame_type: FrameType,
        length: usize,
        escape: bool,
        byte: u8,
    ) -> Option<Result<Frame, Error>> {
        if escape {
            if byte != ESCAPE {
                let truncated_length = self.buffer_write_pos;

                if FrameType::from_u8(byte).is_some() {
                    // the escape byte started the next frame
                    tracing::debug!(
                        frame_type = frame_type.as_u8(),
                        length = truncated_length,
                        "frame truncated"
                    );
                    // a status frame has no known length, so its body is
                    // skipped while seeking the next marker.
                    if let Some(Err(error)) = self.start_frame(byte) {
                        tracing::debug!(%error, "not reading frame after truncated frame");
                    }
                    return Some(Err(Error::Truncated {
                        frame_type: frame_type.as_u8(),
                        length: truncated_length,
                    }));
                }

                tracing::debug!(byte, "corrupt escape sequence");
                self.reset();
                return Some(Err(Error::Corrupt { byte }));
            }
        }
        else if byte == ESCAPE {
            self.state = State::ReadingFrame {
                frame_type,
                length,
                escape: true,
            };
            return None;
        }

        self.buffer[self.buffer_write_pos] = byte;
        self.buffer_write_pos += 1;

        if self.buffer_write_pos < length {
            self.state = State::ReadingFrame {
                frame_type,
                length,
                escape: false,
            };
            return None;
        }

        let result = Frame::decode(&self.buffer[..self.buffer_write_pos]);
        tracing::trace!(buffer = ?&self.buffer[..self.buffer_write_pos], ?result, "decoded frame");
        self.reset();
        Some(result)
    }

    /// Signals the end of the stream.
    ///
    /// Fails if the stream ended inside a frame, or if only garbage was read
    /// since the last frame.
    pub fn finish(&mut self) -> Result<(), Error> {
        let state = self.state;
        self.reset();

        match state {
            State::Seeking {
                escape: false,
                skipped: 0,
            } => Ok(()),
            State::Seeking { escape, skipped } => {
                Err(Error::NoFrameMarker {
                    skipped: skipped + usize::from(escape),
                })
            }
            State::ReadingFrame { .. } => Err(Error::UnexpectedEof),
        }
    }

    pub fn reset(&mut self) {
        self.state = State::default();
        self.buffer_write_pos = 0;
    }

    /// Reads the next frame from a buffered reader.
    ///
    /// Returns `Ok(None)` if the reader is at EOF between frames. Only the
    /// bytes up to the end of the returned frame are consumed.
    pub fn next_frame<R: BufRead>(&mut self, reader: &mut R) -> Result<Option<Frame>, Error> {
        loop {
            let (consumed, result) = {
                let buffer = reader.fill_buf()?;
                if buffer.is_empty() {
                    self.finish()?;
                    return Ok(None);
                }

                let mut consumed = 0;
                let mut result = None;
                for &byte in buffer {
                    consumed += 1;
                    result = self.push(byte);
                    if result.is_some() {
                        break;
                    }
                }
                (consumed, result)
            };

            reader.consume(consumed);

            if let Some(result) = result {
                return result.map(Some);
            }
        }
    }
}
