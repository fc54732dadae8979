//! Encoders that do not allocate.

use crate::errors::CodecError;
use crate::types::Encoder;

/// Encoder writing into a caller-provided buffer.
///
/// Unlike the `Vec<u8>` encoder this never grows, a write that does not fit
/// fails with [`CodecError::BufferTooSmall`] and leaves the buffer as it was
/// before that write.
#[derive(Debug)]
pub struct SliceEncoder<'b> {
    buf: &'b mut [u8],
    at: usize,
}

impl<'b> SliceEncoder<'b> {
    /// Wraps a buffer, starting at its beginning.
    pub fn new(buf: &'b mut [u8]) -> Self {
        Self { buf, at: 0 }
    }

    /// Returns the number of bytes written so far.
    pub fn written(&self) -> usize {
        self.at
    }
}

impl Encoder for SliceEncoder<'_> {
    fn write_buf(&mut self, buf: &[u8]) -> Result<(), CodecError> {
        let end = self.at + buf.len();
        if end > self.buf.len() {
            return Err(CodecError::BufferTooSmall {
                needed: end,
                available: self.buf.len(),
            });
        }

        self.buf[self.at..end].copy_from_slice(buf);
        self.at = end;
        Ok(())
    }
}

/// Encoder that only counts how many bytes would be written.
#[derive(Copy, Clone, Debug, Default)]
pub struct SizeCounter {
    len: usize,
}

impl SizeCounter {
    /// Creates a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bytes counted so far.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns if nothing has been counted.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Encoder for SizeCounter {
    fn write_buf(&mut self, buf: &[u8]) -> Result<(), CodecError> {
        self.len += buf.len();
        Ok(())
    }
}
