//! An in-memory bio record: the record header metadata plus an
//! insertion-ordered mapping from tag names to typed values.

use indexmap::IndexMap;

use crate::header::RecordHead;
use crate::value::Value;

/// An in-memory bio record.
///
/// The record carries the `(dictionary, code, version)` triple identifying
/// its schema, an informational name, and its tag values. Iteration follows
/// insertion order, which is also the order tags take on the wire.
///
/// A record with `code == 0 && version == 0` is a *properties* record:
/// schema-less, its keys are carried on the wire by name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BioRecord {
    dictionary: u8,
    code: u16,
    version: u16,
    name: Option<String>,
    entries: IndexMap<String, Value>,
}

impl BioRecord {
    /// Create an empty record for the given schema coordinates.
    pub fn new(dictionary: u8, code: u16, version: u16) -> Self {
        BioRecord {
            dictionary,
            code,
            version,
            name: None,
            entries: IndexMap::new(),
        }
    }

    /// Create an empty schema-less properties record
    /// (`code = 0`, `version = 0`).
    pub fn properties(dictionary: u8) -> Self {
        BioRecord::new(dictionary, 0, 0)
    }

    /// Set the informational record name, builder style.
    pub fn with_name<N: Into<String>>(mut self, name: N) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Insert a tag value, builder style.
    pub fn with<N: Into<String>, V: Into<Value>>(mut self, name: N, value: V) -> Self {
        self.put(name, value);
        self
    }

    /// The identifier of the dictionary holding this record's schema.
    pub fn dictionary(&self) -> u8 {
        self.dictionary
    }

    /// The object code identifying this record's schema.
    pub fn code(&self) -> u16 {
        self.code
    }

    /// The schema version of this record.
    pub fn version(&self) -> u16 {
        self.version
    }

    /// The informational record name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Replace the informational record name.
    pub fn set_name<N: Into<String>>(&mut self, name: Option<N>) {
        self.name = name.map(Into::into);
    }

    /// The wire header of this record.
    pub fn head(&self) -> RecordHead {
        RecordHead::new(self.dictionary, self.code, self.version)
    }

    /// Replace the schema coordinates of this record. Used by the decoder to
    /// carry over the header values found in the blob.
    pub fn set_head(&mut self, head: RecordHead) {
        self.dictionary = head.dictionary;
        self.code = head.code;
        self.version = head.version;
    }

    /// Whether this is a schema-less properties record.
    pub fn is_properties(&self) -> bool {
        self.head().is_properties()
    }

    /// Insert a tag value, returning the previous value under the same name
    /// if there was one.
    pub fn put<N: Into<String>, V: Into<Value>>(&mut self, name: N, value: V) -> Option<Value> {
        self.entries.insert(name.into(), value.into())
    }

    /// Fetch a tag value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Remove a tag value by name, preserving the order of the remaining
    /// entries.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.entries.shift_remove(name)
    }

    /// Iterate over `(tag name, value)` entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The number of tag values in this record.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this record has no tag values.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Scalar;

    #[test]
    fn entries_keep_insertion_order() {
        let mut rec = BioRecord::new(1, 10, 1);
        rec.put("z", 1_i32);
        rec.put("a", 2_i32);
        rec.put("m", 3_i32);
        let keys: Vec<_> = rec.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn put_replaces_and_returns_previous() {
        let mut rec = BioRecord::new(1, 10, 1);
        assert_eq!(rec.put("x", 1_i32), None);
        assert_eq!(
            rec.put("x", 2_i32),
            Some(Value::Scalar(Scalar::Int(1)))
        );
        assert_eq!(rec.len(), 1);
    }

    #[test]
    fn properties_record_head() {
        let rec = BioRecord::properties(3);
        assert!(rec.is_properties());
        assert_eq!(rec.head(), RecordHead::new(3, 0, 0));
    }
}
