//! This module contains the concept of a bio schema dictionary: the
//! descriptors for objects, tags and enums, and the read-only registry
//! trait through which the codecs interpret records.
//!
//! How a registry is populated (annotations, XML, JSON) is out of this
//! crate's scope; the [`BioDictionary`] type offers plain builder-style
//! registration for process startup and for tests.

pub mod registry;

pub use self::registry::{BioDictionary, Dictionary};

use std::collections::HashMap;
use std::fmt::Debug;

use crate::header::{Container, TypeTag};
use crate::value::BioEnum;

/// The descriptor of a tag within an object schema or at dictionary scope
/// (a "super tag"). A tag is identified on the wire by its numeric code,
/// never by its name.
#[derive(Debug, Clone, PartialEq)]
pub struct TagDef {
    /// The numeric tag code carried on the wire.
    pub code: u16,
    /// The tag name, the key under which values live in a record.
    pub name: String,
    /// The wire type of values under this tag.
    pub ty: TypeTag,
    /// The container kind this tag declares: scalar, array or list.
    pub container: Container,
    /// Whether values under this tag appear on the wire at all.
    pub encodable: bool,
    /// For tags of type [`TypeTag::Enum`], the code of the enum object
    /// declaring the ordinals.
    pub enum_code: Option<u16>,
}

impl TagDef {
    /// Create a scalar, encodable tag descriptor.
    pub fn new<N: Into<String>>(code: u16, name: N, ty: TypeTag) -> Self {
        TagDef {
            code,
            name: name.into(),
            ty,
            container: Container::Scalar,
            encodable: true,
            enum_code: None,
        }
    }

    /// Declare this tag as carrying an array, builder style.
    pub fn array(mut self) -> Self {
        self.container = Container::Array;
        self
    }

    /// Declare this tag as carrying a list, builder style.
    pub fn list(mut self) -> Self {
        self.container = Container::List;
        self
    }

    /// Exclude this tag from encoding, builder style.
    pub fn non_encodable(mut self) -> Self {
        self.encodable = false;
        self
    }

    /// Reference the enum object declaring this tag's ordinals,
    /// builder style.
    pub fn with_enum(mut self, enum_code: u16) -> Self {
        self.enum_code = Some(enum_code);
        self
    }
}

/// The descriptor of an object schema: its coordinates, its tags indexed by
/// code and by name, and the flag selecting 4-byte length prefixes for its
/// record bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjDef {
    /// The identifier of the dictionary owning this object.
    pub dictionary: u8,
    /// The object code, unique within the dictionary.
    pub code: u16,
    /// The schema version.
    pub version: u16,
    /// The object name, unique within the dictionary.
    pub name: String,
    /// Whether record bodies of this object use 4-byte length prefixes
    /// instead of the default 2 bytes.
    pub large: bool,
    tags: Vec<TagDef>,
    by_code: HashMap<u16, usize>,
    by_name: HashMap<String, usize>,
}

impl ObjDef {
    /// Create an object descriptor with no tags.
    pub fn new<N: Into<String>>(dictionary: u8, code: u16, version: u16, name: N) -> Self {
        ObjDef {
            dictionary,
            code,
            version,
            name: name.into(),
            large: false,
            tags: Vec::new(),
            by_code: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Mark this object as large (4-byte length prefixes), builder style.
    pub fn large(mut self) -> Self {
        self.large = true;
        self
    }

    /// Register a tag on this object, builder style. A tag registered later
    /// shadows an earlier one under the same code or name.
    pub fn with_tag(mut self, tag: TagDef) -> Self {
        let index = self.tags.len();
        self.by_code.insert(tag.code, index);
        self.by_name.insert(tag.name.clone(), index);
        self.tags.push(tag);
        self
    }

    /// Fetch a tag descriptor by its wire code.
    pub fn tag_by_code(&self, code: u16) -> Option<&TagDef> {
        self.by_code.get(&code).map(|&i| &self.tags[i])
    }

    /// Fetch a tag descriptor by its name.
    pub fn tag_by_name(&self, name: &str) -> Option<&TagDef> {
        self.by_name.get(name).map(|&i| &self.tags[i])
    }

    /// Iterate over the registered tag descriptors in registration order.
    pub fn tags(&self) -> impl Iterator<Item = &TagDef> {
        self.tags.iter()
    }
}

/// The descriptor of an enum object: a code, a name, and the ordered
/// variant names which define the on-wire ordinals.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    /// The enum object code, unique within the dictionary.
    pub code: u16,
    /// The enum object name.
    pub name: String,
    variants: Vec<String>,
}

impl EnumDef {
    /// Create an enum descriptor with no variants.
    pub fn new<N: Into<String>>(code: u16, name: N) -> Self {
        EnumDef {
            code,
            name: name.into(),
            variants: Vec::new(),
        }
    }

    /// Append variants in ordinal order, builder style.
    pub fn with_variants<I>(mut self, variants: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.variants.extend(variants.into_iter().map(Into::into));
        self
    }

    /// Fetch the variant name declared at the given ordinal.
    pub fn variant(&self, ordinal: i32) -> Option<&str> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|i| self.variants.get(i))
            .map(String::as_str)
    }

    /// Fetch the ordinal declared for the given variant name.
    pub fn ordinal(&self, name: &str) -> Option<i32> {
        self.variants.iter().position(|v| v == name).map(|i| i as i32)
    }

    /// Build the enumeration value at the given ordinal.
    pub fn bio_enum(&self, ordinal: i32) -> Option<BioEnum> {
        self.variant(ordinal).map(|name| BioEnum::new(ordinal, name))
    }
}

/// Type trait for a read-only view over the registered schema dictionaries.
///
/// The registry is built once at process startup and read without locking
/// thereafter; codecs only consume this trait. The methods have no generic
/// parameters so the trait remains object safe.
pub trait SchemaRegistry: Debug {
    /// Fetch a dictionary by its identifier.
    fn dictionary(&self, id: u8) -> Option<&Dictionary>;

    /// Fetch an object descriptor by `(dictionary, code)`.
    fn obj_by_code(&self, id: u8, code: u16) -> Option<&ObjDef> {
        self.dictionary(id).and_then(|d| d.obj_by_code(code))
    }

    /// Fetch an object descriptor by `(dictionary, name)`.
    fn obj_by_name(&self, id: u8, name: &str) -> Option<&ObjDef> {
        self.dictionary(id).and_then(|d| d.obj_by_name(name))
    }

    /// Fetch a dictionary-scoped super tag by its wire code.
    fn super_tag_by_code(&self, id: u8, code: u16) -> Option<&TagDef> {
        self.dictionary(id).and_then(|d| d.super_tag_by_code(code))
    }

    /// Fetch a dictionary-scoped super tag by its name.
    fn super_tag_by_name(&self, id: u8, name: &str) -> Option<&TagDef> {
        self.dictionary(id).and_then(|d| d.super_tag_by_name(name))
    }

    /// Fetch an enum descriptor by `(dictionary, code)`.
    fn enum_def(&self, id: u8, code: u16) -> Option<&EnumDef> {
        self.dictionary(id).and_then(|d| d.enum_def(code))
    }
}

impl<T: SchemaRegistry + ?Sized> SchemaRegistry for &T {
    fn dictionary(&self, id: u8) -> Option<&Dictionary> {
        (**self).dictionary(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_def_ordinal_mapping() {
        let def = EnumDef::new(5, "Status").with_variants(["NEW", "OPEN", "CLOSED"]);
        assert_eq!(def.variant(1), Some("OPEN"));
        assert_eq!(def.variant(3), None);
        assert_eq!(def.variant(-1), None);
        assert_eq!(def.ordinal("CLOSED"), Some(2));
        assert_eq!(def.bio_enum(0), Some(BioEnum::new(0, "NEW")));
    }

    #[test]
    fn obj_def_tag_lookup() {
        let obj = ObjDef::new(1, 10, 1, "greeting")
            .with_tag(TagDef::new(1, "text", TypeTag::Utf))
            .with_tag(TagDef::new(2, "count", TypeTag::Int).array());
        assert_eq!(obj.tag_by_code(1).unwrap().name, "text");
        assert_eq!(obj.tag_by_name("count").unwrap().container, Container::Array);
        assert!(obj.tag_by_code(3).is_none());
    }
}
