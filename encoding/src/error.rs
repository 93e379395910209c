//! Crate-level error types.

use snafu::{Backtrace, Snafu};

/// Type alias for a result from this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for stream-level encoding and decoding failures.
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The input stream ended before a field could be fully read.
    #[snafu(display(
        "unexpected end of stream at position {}: needed {} bytes but only {} available",
        position,
        needed,
        available
    ))]
    UnexpectedEndOfStream {
        /// Read cursor position at the failed read.
        position: usize,
        /// Number of bytes the field required.
        needed: usize,
        /// Number of bytes remaining in the stream.
        available: usize,
        /// Error backtrace.
        backtrace: Backtrace,
    },

    /// A length does not fit the current length prefix width.
    #[snafu(display("length {} exceeds the {}-byte length prefix", len, width))]
    LengthOverflow {
        /// The length that was to be emitted.
        len: usize,
        /// Width of the length prefix in bytes.
        width: usize,
        /// Error backtrace.
        backtrace: Backtrace,
    },

    /// A tag code does not fit the dictionary's compact 8-bit code width.
    #[snafu(display("tag code {} exceeds the compact 8-bit code width", code))]
    TagCodeOverflow {
        /// The tag code that was to be emitted.
        code: u16,
        /// Error backtrace.
        backtrace: Backtrace,
    },

    /// An ASCII string field held or produced non-ASCII data.
    #[snafu(display("non-ASCII data in ASCII string field at position {}", position))]
    AsciiText {
        /// Stream position of the offending field.
        position: usize,
        /// Error backtrace.
        backtrace: Backtrace,
    },

    /// A UTF-8 string field held malformed data.
    #[snafu(display("malformed UTF-8 in string field at position {}", position))]
    Utf8Text {
        /// Stream position of the offending field.
        position: usize,
        /// The underlying decoding error.
        source: std::str::Utf8Error,
        /// Error backtrace.
        backtrace: Backtrace,
    },

    /// Writing to the underlying buffer failed.
    #[snafu(display("failed to write to the output buffer"))]
    WriteBytes {
        /// The underlying I/O error.
        source: std::io::Error,
        /// Error backtrace.
        backtrace: Backtrace,
    },

    /// Reading from the underlying buffer failed.
    #[snafu(display("failed to read from the input buffer"))]
    ReadBytes {
        /// The underlying I/O error.
        source: std::io::Error,
        /// Error backtrace.
        backtrace: Backtrace,
    },
}
