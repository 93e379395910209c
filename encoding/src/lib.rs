#![crate_type = "lib"]
#![deny(trivial_casts, trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(missing_debug_implementations, unused_qualifications)]

//! Byte-level primitives of the bio binary codec: the big-endian typed
//! output and input streams with their length-mode discipline, and the
//! collaborator traits for compression, encryption and the lossless XML
//! lane.

pub mod compress;
pub mod decode;
pub mod encode;
pub mod encrypt;
pub mod error;
pub mod xml;

pub use compress::{Compressor, Deflate};
pub use decode::ReadStream;
pub use encode::WriteStream;
pub use encrypt::Encrypter;
pub use error::{Error, Result};
pub use xml::XmlBridge;
