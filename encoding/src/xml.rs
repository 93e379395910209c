//! The bridge to the external XML serializer backing the lossless lane.
//!
//! The XML representation itself is owned by a collaborator; the codec only
//! moves its UTF-8 bytes through the frame.

use std::fmt::Debug;

use bio_core::BioRecord;

/// The boxed error type produced by a bridge implementation.
pub type BridgeError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A serializer/parser pair for the textual (lossless) representation of a
/// record.
pub trait XmlBridge: Debug {
    /// Serialize a record to its XML form.
    fn to_xml(&self, record: &BioRecord) -> Result<String, BridgeError>;

    /// Parse a record back from its XML form.
    fn from_xml(&self, xml: &[u8]) -> Result<BioRecord, BridgeError>;
}
