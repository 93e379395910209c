//! The pluggable compressor seam and the default Deflate implementation.

use std::fmt::Debug;
use std::io::{self, Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

/// A synchronous byte-in/byte-out compressor.
///
/// The frame codec records the uncompressed length next to the compressed
/// payload, so `decompress` receives the expected original size and must
/// fail when the recovered data does not match it.
pub trait Compressor: Debug {
    /// Compress the given bytes.
    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>>;

    /// Decompress the given bytes, which must inflate to exactly
    /// `original_len` bytes.
    fn decompress(&self, data: &[u8], original_len: usize) -> io::Result<Vec<u8>>;
}

/// The default compressor: raw Deflate.
#[derive(Debug, Default, Copy, Clone)]
pub struct Deflate;

impl Compressor for Deflate {
    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(&self, data: &[u8], original_len: usize) -> io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(original_len);
        DeflateDecoder::new(data).read_to_end(&mut out)?;
        if out.len() != original_len {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "decompressed to {} bytes, expected {}",
                    out.len(),
                    original_len
                ),
            ));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deflate_round_trip() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(8);
        let compressed = Deflate.compress(&data).unwrap();
        assert!(compressed.len() < data.len());
        let restored = Deflate.decompress(&compressed, data.len()).unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn deflate_rejects_wrong_declared_length() {
        let compressed = Deflate.compress(b"abcd").unwrap();
        assert!(Deflate.decompress(&compressed, 3).is_err());
    }

    #[test]
    fn zeros_compress_well() {
        let data = vec![0u8; 1024];
        let compressed = Deflate.compress(&data).unwrap();
        assert!(compressed.len() + 4 < data.len());
    }
}
