//! The typed input stream of the bio binary format: a read cursor over a
//! caller-owned byte slice, mirroring the output stream field for field.

use byteordered::ByteOrdered;
use snafu::{ensure, ResultExt};

use crate::error::{
    AsciiTextSnafu, ReadBytesSnafu, Result, UnexpectedEndOfStreamSnafu, Utf8TextSnafu,
};

/// A read cursor over a borrowed byte slice.
///
/// The stream does not take ownership of the input; blob reads hand back
/// sub-slices of it. The length mode mirrors
/// [`WriteStream`](crate::encode::WriteStream): length prefixes are `u16`
/// by default and `u32` while a large object's record body is being read.
#[derive(Debug, Clone)]
pub struct ReadStream<'a> {
    data: &'a [u8],
    pos: usize,
    length_as_int: bool,
}

impl<'a> ReadStream<'a> {
    /// Create a stream over the given bytes, in the default length mode.
    pub fn new(data: &'a [u8]) -> Self {
        ReadStream {
            data,
            pos: 0,
            length_as_int: false,
        }
    }

    /// The current read position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The number of bytes left to read.
    pub fn available(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Whether length prefixes are currently 4 bytes wide.
    pub fn length_as_int(&self) -> bool {
        self.length_as_int
    }

    /// Set the length mode, returning the previous mode so the caller can
    /// restore it after a nested read.
    pub fn set_length_as_int(&mut self, length_as_int: bool) -> bool {
        std::mem::replace(&mut self.length_as_int, length_as_int)
    }

    /// Look ahead at `len` bytes starting `offset` bytes past the cursor,
    /// without advancing. Returns `None` when not enough bytes remain.
    pub fn peek(&self, offset: usize, len: usize) -> Option<&'a [u8]> {
        let start = self.pos.checked_add(offset)?;
        let end = start.checked_add(len)?;
        self.data.get(start..end)
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8]> {
        ensure!(
            needed <= self.available(),
            UnexpectedEndOfStreamSnafu {
                position: self.pos,
                needed,
                available: self.available(),
            }
        );
        let chunk = &self.data[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(chunk)
    }

    /// Advance the cursor over `count` bytes without interpreting them.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.take(count).map(|_| ())
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        let chunk = self.take(1)?;
        ByteOrdered::be(chunk).read_u8().context(ReadBytesSnafu)
    }

    /// Read an unsigned 16-bit integer.
    pub fn read_u16(&mut self) -> Result<u16> {
        let chunk = self.take(2)?;
        ByteOrdered::be(chunk).read_u16().context(ReadBytesSnafu)
    }

    /// Read an unsigned 32-bit integer.
    pub fn read_u32(&mut self) -> Result<u32> {
        let chunk = self.take(4)?;
        ByteOrdered::be(chunk).read_u32().context(ReadBytesSnafu)
    }

    /// Read a signed 16-bit integer.
    pub fn read_i16(&mut self) -> Result<i16> {
        let chunk = self.take(2)?;
        ByteOrdered::be(chunk).read_i16().context(ReadBytesSnafu)
    }

    /// Read a signed 32-bit integer.
    pub fn read_i32(&mut self) -> Result<i32> {
        let chunk = self.take(4)?;
        ByteOrdered::be(chunk).read_i32().context(ReadBytesSnafu)
    }

    /// Read a signed 64-bit integer.
    pub fn read_i64(&mut self) -> Result<i64> {
        let chunk = self.take(8)?;
        ByteOrdered::be(chunk).read_i64().context(ReadBytesSnafu)
    }

    /// Read a 32-bit IEEE-754 floating point number.
    pub fn read_f32(&mut self) -> Result<f32> {
        let chunk = self.take(4)?;
        ByteOrdered::be(chunk).read_f32().context(ReadBytesSnafu)
    }

    /// Read a 64-bit IEEE-754 floating point number.
    pub fn read_f64(&mut self) -> Result<f64> {
        let chunk = self.take(8)?;
        ByteOrdered::be(chunk).read_f64().context(ReadBytesSnafu)
    }

    /// Read a boolean byte; any non-zero value reads as true.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Read a length prefix in the current length mode.
    pub fn read_length(&mut self) -> Result<usize> {
        if self.length_as_int {
            Ok(self.read_u32()? as usize)
        } else {
            Ok(usize::from(self.read_u16()?))
        }
    }

    /// Read a tag code: 2 bytes by default, 1 byte for dictionaries using
    /// compact tag codes.
    pub fn read_tag_code(&mut self, compact: bool) -> Result<u16> {
        if compact {
            Ok(u16::from(self.read_u8()?))
        } else {
            self.read_u16()
        }
    }

    /// Read a length-prefixed ASCII string.
    pub fn read_ascii(&mut self) -> Result<String> {
        let position = self.pos;
        let bytes = self.read_blob()?;
        ensure!(bytes.is_ascii(), AsciiTextSnafu { position });
        // ASCII is valid UTF-8
        Ok(std::str::from_utf8(bytes)
            .context(Utf8TextSnafu { position })?
            .to_owned())
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_utf(&mut self) -> Result<String> {
        let position = self.pos;
        let bytes = self.read_blob()?;
        Ok(std::str::from_utf8(bytes)
            .context(Utf8TextSnafu { position })?
            .to_owned())
    }

    /// Read a length-prefixed byte blob in the current length mode,
    /// returning a sub-slice of the input.
    pub fn read_blob(&mut self) -> Result<&'a [u8]> {
        let len = self.read_length()?;
        self.take(len)
    }

    /// Read all remaining bytes, returning a sub-slice of the input.
    pub fn read_remaining(&mut self) -> &'a [u8] {
        let chunk = &self.data[self.pos..];
        self.pos = self.data.len();
        chunk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirrored_scalar_reads() {
        let data: &[u8] = &[0x0A, 0x0B, 0xFF, 0xFF, 0xFF, 0xFE, 0x01];
        let mut input = ReadStream::new(data);
        assert_eq!(input.read_u16().unwrap(), 0x0A0B);
        assert_eq!(input.read_i32().unwrap(), -2);
        assert!(input.read_bool().unwrap());
        assert_eq!(input.available(), 0);
    }

    #[test]
    fn length_mode_switches_prefix_width() {
        let data: &[u8] = &[0x00, 0x03, 0x00, 0x00, 0x00, 0x03];
        let mut input = ReadStream::new(data);
        assert_eq!(input.read_length().unwrap(), 3);
        input.set_length_as_int(true);
        assert_eq!(input.read_length().unwrap(), 3);
    }

    #[test]
    fn blob_reads_are_bounded() {
        let data: &[u8] = &[0x00, 0x05, b'a', b'b'];
        let mut input = ReadStream::new(data);
        let err = input.read_blob().unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::UnexpectedEndOfStream {
                needed: 5,
                available: 2,
                ..
            }
        ));
    }

    #[test]
    fn peek_does_not_advance() {
        let data: &[u8] = &[1, 2, 3, 4];
        let input = ReadStream::new(data);
        assert_eq!(input.peek(1, 2), Some(&[2, 3][..]));
        assert_eq!(input.peek(3, 2), None);
        assert_eq!(input.position(), 0);
    }

    #[test]
    fn strings_round_trip() {
        let data: &[u8] = &[0x00, 0x02, b'h', b'i', 0x00, 0x03, 0xE2, 0x82, 0xAC];
        let mut input = ReadStream::new(data);
        assert_eq!(input.read_ascii().unwrap(), "hi");
        assert_eq!(input.read_utf().unwrap(), "€");
    }
}
