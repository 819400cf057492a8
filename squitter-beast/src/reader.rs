//! Async BEAST reader

use std::{
    pin::Pin,
    task::{
        Context,
        Poll,
    },
};

use futures_util::Stream;
use pin_project_lite::pin_project;
use tokio::io::{
    AsyncRead,
    ReadBuf,
};

use crate::{
    Error,
    Frame,
    FrameDecoder,
};

/// Bytes requested per read. Frames are at most 46 bytes on the wire.
const RECEIVE_BUFFER_SIZE: usize = 512;

pin_project! {
    /// Stream of frames read from an [`AsyncRead`].
    ///
    /// Recoverable errors are yielded and decoding continues with the next
    /// frame. The stream ends after EOF or the first fatal error.
    #[derive(Debug)]
    pub struct Reader<R> {
        #[pin]
        reader: R,
        receive_buffer: ReceiveBuffer,
        decoder: FrameDecoder,
        done: bool,
    }
}

impl<R> Reader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            receive_buffer: Default::default(),
            decoder: Default::default(),
            done: false,
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: AsyncRead> Stream for Reader<R> {
    type Item = Result<Frame, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            let this = self.as_mut().project();

            if *this.done {
                return Poll::Ready(None);
            }

            if this.receive_buffer.has_data() {
                while let Some(byte) = this.receive_buffer.next_byte() {
                    if let Some(result) = this.decoder.push(byte) {
                        if let Err(error) = &result {
                            *this.done = !error.is_recoverable();
                        }
                        return Poll::Ready(Some(result));
                    }
                }
            }
            else {
                // if there is no data in the receiver buffer, we need to receive some
                this.receive_buffer.reset();

                let mut read_buf = ReadBuf::new(&mut this.receive_buffer.buffer);
                match this.reader.poll_read(cx, &mut read_buf) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(Err(error)) => {
                        *this.done = true;
                        return Poll::Ready(Some(Err(error.into())));
                    }
                    Poll::Ready(Ok(())) => {
                        let num_bytes_read = read_buf.filled().len();

                        // if no data was received, the underlying reader reached EOF
                        if num_bytes_read == 0 {
                            *this.done = true;
                            return Poll::Ready(this.decoder.finish().err().map(Err));
                        }

                        this.receive_buffer.write_pos = num_bytes_read;
                    }
                }
            }
        }
    }
}

#[derive(Debug)]
struct ReceiveBuffer {
    buffer: [u8; RECEIVE_BUFFER_SIZE],
    read_pos: usize,
    write_pos: usize,
}

impl Default for ReceiveBuffer {
    fn default() -> Self {
        Self {
            buffer: [0; RECEIVE_BUFFER_SIZE],
            read_pos: 0,
            write_pos: 0,
        }
    }
}

impl ReceiveBuffer {
    #[inline(always)]
    fn has_data(&self) -> bool {
        self.read_pos < self.write_pos
    }

    #[inline(always)]
    fn reset(&mut self) {
        self.read_pos = 0;
        self.write_pos = 0;
    }

    #[inline(always)]
    fn next_byte(&mut self) -> Option<u8> {
        self.has_data().then(|| {
            let byte = self.buffer[self.read_pos];
            self.read_pos += 1;
            byte
        })
    }
}
