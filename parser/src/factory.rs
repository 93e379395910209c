//! The record factory seam.
//!
//! The decoder instantiates in-memory records through this trait instead of
//! hard-wiring a constructor, so deployments can pre-shape records per
//! object (the dictionary loader registers the builders at init time). The
//! header metadata is overwritten with the wire values after construction.

use std::fmt::Debug;

use bio_core::{BioRecord, ObjDef};

/// A factory of in-memory records, consulted by the decoder for every
/// record body it reads.
pub trait RecordFactory: Debug {
    /// Create the record for the given object schema.
    fn new_record(&self, obj: &ObjDef) -> BioRecord;
}

/// The default factory: a plain [`BioRecord`] named after the object.
#[derive(Debug, Default, Copy, Clone)]
pub struct GenericFactory;

impl RecordFactory for GenericFactory {
    fn new_record(&self, obj: &ObjDef) -> BioRecord {
        BioRecord::new(obj.dictionary, obj.code, obj.version).with_name(obj.name.clone())
    }
}
