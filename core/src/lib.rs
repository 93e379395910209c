#![crate_type = "lib"]
#![deny(trivial_casts, trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(
    missing_debug_implementations,
    missing_docs,
    unused_qualifications,
    unused_import_braces
)]

//! This is the core library of the bio binary codec, containing the concepts
//! and data structures shared by all layers of the stack: the wire-level type
//! tags, the typed value model, the in-memory record, and the schema
//! dictionary through which records are interpreted.
//!
//! The encoding primitives and the codecs themselves live in the
//! `bio-encoding` and `bio-parser` crates.

pub mod dictionary;
pub mod header;
pub mod record;
pub mod value;

pub use dictionary::{BioDictionary, Dictionary, EnumDef, ObjDef, SchemaRegistry, TagDef};
pub use header::{Container, RecordHead, TypeTag};
pub use record::BioRecord;
pub use value::{BioEnum, CastValueError, Scalar, Seq, Value, C};
