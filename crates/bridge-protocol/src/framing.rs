//! Bounded line framing over a byte stream.

use std::io::{self, BufRead, BufReader, Read};
use std::mem;

use crate::FramingError;

/// Largest accepted line, excluding its terminator.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Splits a stream into `\n`-terminated lines without ever buffering more than
/// the configured limit.
///
/// Bytes that follow a terminator stay buffered for the next call, so one
/// reader can serve several sequential envelopes on the same stream. When the
/// stream has a read timeout configured and it elapses, [`read_line`] returns
/// an error for which [`FramingError::is_timeout`] is true and the partial line
/// is retained; calling [`read_line`] again resumes where it stopped.
///
/// [`read_line`]: LineReader::read_line
#[derive(Debug)]
pub struct LineReader<R> {
    inner: BufReader<R>,
    pending: Vec<u8>,
    limit: usize,
}

impl<R: Read> LineReader<R> {
    /// Wraps `reader` with the default [`MAX_LINE_BYTES`] limit.
    pub fn new(reader: R) -> Self {
        Self::with_limit(reader, MAX_LINE_BYTES)
    }

    /// Wraps `reader` with a custom line limit.
    pub fn with_limit(reader: R, limit: usize) -> Self {
        Self {
            inner: BufReader::new(reader),
            pending: Vec::new(),
            limit,
        }
    }

    /// Reads the next line, without its `\n` terminator.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly on a line boundary.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::Unterminated`] when the stream ends mid-line,
    /// [`FramingError::TooLarge`] when the line exceeds the limit, and
    /// [`FramingError::Io`] when the stream fails or its read timeout elapses.
    pub fn read_line(&mut self) -> Result<Option<Vec<u8>>, FramingError> {
        loop {
            let available = match self.inner.fill_buf() {
                Ok(bytes) => bytes,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(FramingError::Io(error)),
            };

            if available.is_empty() {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                let buffered = self.pending.len();
                self.pending.clear();
                return Err(FramingError::Unterminated { buffered });
            }

            if let Some(position) = available.iter().position(|byte| *byte == b'\n') {
                let (head, _) = available.split_at(position);
                self.pending.extend_from_slice(head);
                self.inner.consume(position + 1);
                self.enforce_limit()?;
                return Ok(Some(mem::take(&mut self.pending)));
            }

            let consumed = available.len();
            self.pending.extend_from_slice(available);
            self.inner.consume(consumed);
            self.enforce_limit()?;
        }
    }

    /// Returns true while part of a line has been received but not its
    /// terminator.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty() || !self.inner.buffer().is_empty()
    }

    /// Borrows the underlying stream.
    pub fn get_ref(&self) -> &R {
        self.inner.get_ref()
    }

    /// Mutably borrows the underlying stream, for writing replies.
    ///
    /// Reading from the returned stream directly would bypass the buffer.
    pub fn get_mut(&mut self) -> &mut R {
        self.inner.get_mut()
    }

    fn enforce_limit(&mut self) -> Result<(), FramingError> {
        let size = self.pending.len();
        if size > self.limit {
            self.pending.clear();
            return Err(FramingError::TooLarge {
                size,
                max: self.limit,
            });
        }
        Ok(())
    }
}
