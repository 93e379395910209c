//! The typed output stream of the bio binary format: a growable buffer of
//! big-endian fields with the length-mode discipline of record bodies,
//! where length prefixes are 2 bytes wide by default and 4 bytes wide
//! while a large object is being emitted.

use byteordered::ByteOrdered;
use snafu::{ensure, ResultExt};

use crate::error::{
    AsciiTextSnafu, LengthOverflowSnafu, Result, TagCodeOverflowSnafu, WriteBytesSnafu,
};

/// A growable output buffer of big-endian typed fields.
///
/// The stream carries the *length mode* bit: when unset, every length
/// prefix written through [`write_length`](WriteStream::write_length) (and
/// therefore every string, blob and element count) is a `u16`; when set,
/// they are `u32`. The caller flips the mode when emitting a large object's
/// record body and restores it afterwards.
#[derive(Debug, Clone, Default)]
pub struct WriteStream {
    buf: Vec<u8>,
    length_as_int: bool,
}

impl WriteStream {
    /// Create an empty output stream in the default (2-byte) length mode.
    pub fn new() -> Self {
        WriteStream::default()
    }

    /// Create an empty output stream with a pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        WriteStream {
            buf: Vec::with_capacity(capacity),
            length_as_int: false,
        }
    }

    /// The number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Whether length prefixes are currently 4 bytes wide.
    pub fn length_as_int(&self) -> bool {
        self.length_as_int
    }

    /// Set the length mode, returning the previous mode so the caller can
    /// restore it.
    pub fn set_length_as_int(&mut self, length_as_int: bool) -> bool {
        std::mem::replace(&mut self.length_as_int, length_as_int)
    }

    /// View the bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the stream into its byte buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Append raw bytes without a length prefix.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        ByteOrdered::be(&mut self.buf)
            .write_u8(value)
            .context(WriteBytesSnafu)
    }

    /// Write an unsigned 16-bit integer.
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        ByteOrdered::be(&mut self.buf)
            .write_u16(value)
            .context(WriteBytesSnafu)
    }

    /// Write an unsigned 32-bit integer.
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        ByteOrdered::be(&mut self.buf)
            .write_u32(value)
            .context(WriteBytesSnafu)
    }

    /// Write a signed 16-bit integer.
    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        ByteOrdered::be(&mut self.buf)
            .write_i16(value)
            .context(WriteBytesSnafu)
    }

    /// Write a signed 32-bit integer.
    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        ByteOrdered::be(&mut self.buf)
            .write_i32(value)
            .context(WriteBytesSnafu)
    }

    /// Write a signed 64-bit integer.
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        ByteOrdered::be(&mut self.buf)
            .write_i64(value)
            .context(WriteBytesSnafu)
    }

    /// Write a 32-bit IEEE-754 floating point number.
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        ByteOrdered::be(&mut self.buf)
            .write_f32(value)
            .context(WriteBytesSnafu)
    }

    /// Write a 64-bit IEEE-754 floating point number.
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        ByteOrdered::be(&mut self.buf)
            .write_f64(value)
            .context(WriteBytesSnafu)
    }

    /// Write a boolean as one byte, `1` for true and `0` for false.
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(u8::from(value))
    }

    /// Write a length prefix in the current length mode.
    pub fn write_length(&mut self, len: usize) -> Result<()> {
        if self.length_as_int {
            ensure!(
                u32::try_from(len).is_ok(),
                LengthOverflowSnafu { len, width: 4_usize }
            );
            self.write_u32(len as u32)
        } else {
            ensure!(
                u16::try_from(len).is_ok(),
                LengthOverflowSnafu { len, width: 2_usize }
            );
            self.write_u16(len as u16)
        }
    }

    /// Write a tag code: 2 bytes by default, 1 byte for dictionaries using
    /// compact tag codes.
    pub fn write_tag_code(&mut self, code: u16, compact: bool) -> Result<()> {
        if compact {
            ensure!(code <= u16::from(u8::MAX), TagCodeOverflowSnafu { code });
            self.write_u8(code as u8)
        } else {
            self.write_u16(code)
        }
    }

    /// Write a length-prefixed ASCII string. Non-ASCII input is rejected.
    pub fn write_ascii(&mut self, text: &str) -> Result<()> {
        ensure!(
            text.is_ascii(),
            AsciiTextSnafu {
                position: self.buf.len()
            }
        );
        self.write_blob(text.as_bytes())
    }

    /// Write a length-prefixed UTF-8 string.
    pub fn write_utf(&mut self, text: &str) -> Result<()> {
        self.write_blob(text.as_bytes())
    }

    /// Write a length-prefixed byte blob in the current length mode.
    pub fn write_blob(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_length(bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }
}
