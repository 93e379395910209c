#![crate_type = "lib"]
#![deny(trivial_casts, trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(missing_debug_implementations, unused_qualifications)]

//! Mid-level codecs of the bio binary format.
//!
//! This crate turns in-memory records into self-framing byte blobs and
//! back: the record codec with its schema-driven per-tag dispatch, the
//! schema-less properties lane, and the outer frame with its flag byte,
//! optional compression and encryption, and the lossless XML lane.

pub mod error;
pub mod factory;
pub mod frame;
mod props;
pub mod record;

pub use error::{Error, Result};
pub use factory::{GenericFactory, RecordFactory};
pub use frame::{
    BioCodec, Payload, FLAG_ARRAY, FLAG_COMPRESSED, FLAG_ENCRYPTED, FLAG_LIST, FLAG_XML,
};
pub use record::{RecordDecoder, RecordEncoder};
