//! The parser error taxonomy shared by the record, properties and frame
//! codecs.

use bio_core::{Container, TypeTag};
use bio_encoding::xml::BridgeError;
use snafu::{Backtrace, Snafu};

/// Type alias for a result from this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type of the bio codecs.
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The record references a dictionary absent from the registry.
    #[snafu(display("unknown dictionary {}", dictionary))]
    UnknownDictionary {
        dictionary: u8,
        backtrace: Backtrace,
    },

    /// The record references an object absent from its dictionary.
    #[snafu(display("unknown object ({},{})", dictionary, code))]
    UnknownObject {
        dictionary: u8,
        code: u16,
        backtrace: Backtrace,
    },

    /// A value does not match the shape its tag declares.
    #[snafu(display(
        "tag `{}` on object `{}` expects {} but the value is {}",
        tag,
        object,
        expected,
        got
    ))]
    TypeMismatch {
        tag: String,
        object: String,
        expected: String,
        got: &'static str,
        backtrace: Backtrace,
    },

    /// A `(type, container)` pair has no wire encoding in this lane.
    #[snafu(display("unsupported type {} as {} under tag `{}`", ty, container, tag))]
    UnsupportedType {
        tag: String,
        ty: TypeTag,
        container: Container,
        backtrace: Backtrace,
    },

    /// A nested blob declared as a properties record holds something else.
    #[snafu(display("expected a properties record under tag `{}`", tag))]
    ExpectedProperties { tag: String, backtrace: Backtrace },

    /// An unknown type tag byte was found on the wire.
    #[snafu(display("invalid type tag {:#04x} at position {}", value, position))]
    InvalidTypeTag {
        value: u8,
        position: usize,
        backtrace: Backtrace,
    },

    /// An unknown container marker byte was found on the wire.
    #[snafu(display("invalid container marker {:#04x} at position {}", value, position))]
    InvalidContainer {
        value: u8,
        position: usize,
        backtrace: Backtrace,
    },

    /// Failed to read the 5-byte record header.
    #[snafu(display("failed to decode the record header"))]
    DecodeHead { source: bio_encoding::Error },

    /// Failed to write a record header or tag header.
    #[snafu(display("failed to encode record of object `{}`", object))]
    EncodeRecord {
        object: String,
        source: bio_encoding::Error,
    },

    /// Failed to read a record header or tag header.
    #[snafu(display("failed to decode record of object `{}`", object))]
    DecodeRecord {
        object: String,
        source: bio_encoding::Error,
    },

    /// Failed to write a value.
    #[snafu(display("failed to encode value under tag `{}` on object `{}`", tag, object))]
    EncodeValue {
        tag: String,
        object: String,
        source: bio_encoding::Error,
    },

    /// Failed to read a value.
    #[snafu(display("failed to decode value under tag `{}` on object `{}`", tag, object))]
    DecodeValue {
        tag: String,
        object: String,
        source: bio_encoding::Error,
    },

    /// Failed to read the outer frame.
    #[snafu(display("failed to read the frame"))]
    ReadFrame { source: bio_encoding::Error },

    /// Failed to write the outer frame.
    #[snafu(display("failed to write the frame"))]
    WriteFrame { source: bio_encoding::Error },

    /// The inner frame exceeds the 4-byte original-length prefix.
    #[snafu(display("frame of {} bytes exceeds the u32 length prefix", len))]
    OversizedFrame { len: usize, backtrace: Backtrace },

    /// An array or list holds more elements than the u16 count can carry.
    #[snafu(display("{} elements exceed the u16 frame count", count))]
    TooManyElements { count: usize, backtrace: Backtrace },

    /// The pluggable compressor failed to compress.
    #[snafu(display("compression failed"))]
    Compress {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// The pluggable compressor failed to decompress.
    #[snafu(display("decompression failed"))]
    Decompress {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// The pluggable encrypter failed to encrypt.
    #[snafu(display("encryption failed"))]
    Encrypt {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// The pluggable encrypter failed to decrypt.
    #[snafu(display("decryption failed"))]
    Decrypt {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// An encrypted frame was requested or found, but no encrypter is
    /// configured.
    #[snafu(display("no encrypter is configured on this codec"))]
    NoEncrypter { backtrace: Backtrace },

    /// A lossless frame was requested or found, but no XML bridge is
    /// configured.
    #[snafu(display("no XML bridge is configured on this codec"))]
    NoXmlBridge { backtrace: Backtrace },

    /// The XML bridge failed to serialize or parse a record.
    #[snafu(display("XML bridge failed"))]
    Xml {
        source: BridgeError,
        backtrace: Backtrace,
    },
}
