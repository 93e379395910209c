//! The pluggable encrypter seam.
//!
//! The codec ships no cipher of its own; deployments supply an
//! implementation at configuration time.

use std::fmt::Debug;
use std::io;

/// A synchronous byte-in/byte-out encrypter.
///
/// `decrypt(encrypt(x))` must reproduce `x` exactly; the codec applies the
/// transform to a whole inner frame at once.
pub trait Encrypter: Debug {
    /// Encrypt the given bytes.
    fn encrypt(&self, data: &[u8]) -> io::Result<Vec<u8>>;

    /// Decrypt the given bytes.
    fn decrypt(&self, data: &[u8]) -> io::Result<Vec<u8>>;
}
