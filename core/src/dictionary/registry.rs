//! The concrete schema registry: one [`Dictionary`] per namespace and the
//! process-wide [`BioDictionary`] set, built once at startup and read-only
//! afterwards.

use std::collections::HashMap;

use super::{EnumDef, ObjDef, SchemaRegistry, TagDef};

/// A single schema namespace: objects and enums by code, objects by name,
/// dictionary-scoped super tags, and the per-dictionary wire width of tag
/// codes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    id: u8,
    compact_tag_codes: bool,
    objects: Vec<ObjDef>,
    by_code: HashMap<u16, usize>,
    by_name: HashMap<String, usize>,
    enums: HashMap<u16, EnumDef>,
    super_tags: Vec<TagDef>,
    super_by_code: HashMap<u16, usize>,
    super_by_name: HashMap<String, usize>,
}

impl Dictionary {
    /// Create an empty dictionary under the given identifier.
    pub fn new(id: u8) -> Self {
        Dictionary {
            id,
            ..Dictionary::default()
        }
    }

    /// The identifier of this dictionary.
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Declare that this dictionary emits 8-bit tag codes on the wire
    /// instead of the default 16 bits, builder style.
    pub fn compact_tag_codes(mut self) -> Self {
        self.compact_tag_codes = true;
        self
    }

    /// Whether this dictionary emits 8-bit tag codes on the wire.
    pub fn uses_compact_tag_codes(&self) -> bool {
        self.compact_tag_codes
    }

    /// Register an object schema, builder style. An object registered later
    /// shadows an earlier one under the same code or name.
    pub fn with_object(mut self, obj: ObjDef) -> Self {
        let index = self.objects.len();
        self.by_code.insert(obj.code, index);
        self.by_name.insert(obj.name.clone(), index);
        self.objects.push(obj);
        self
    }

    /// Register an enum object, builder style.
    pub fn with_enum(mut self, def: EnumDef) -> Self {
        self.enums.insert(def.code, def);
        self
    }

    /// Register a dictionary-scoped super tag, usable by any object lacking
    /// its own definition under the same code or name, builder style.
    pub fn with_super_tag(mut self, tag: TagDef) -> Self {
        let index = self.super_tags.len();
        self.super_by_code.insert(tag.code, index);
        self.super_by_name.insert(tag.name.clone(), index);
        self.super_tags.push(tag);
        self
    }

    /// Fetch an object descriptor by code.
    pub fn obj_by_code(&self, code: u16) -> Option<&ObjDef> {
        self.by_code.get(&code).map(|&i| &self.objects[i])
    }

    /// Fetch an object descriptor by name.
    pub fn obj_by_name(&self, name: &str) -> Option<&ObjDef> {
        self.by_name.get(name).map(|&i| &self.objects[i])
    }

    /// Fetch an enum descriptor by code.
    pub fn enum_def(&self, code: u16) -> Option<&EnumDef> {
        self.enums.get(&code)
    }

    /// Fetch a super tag by its wire code.
    pub fn super_tag_by_code(&self, code: u16) -> Option<&TagDef> {
        self.super_by_code.get(&code).map(|&i| &self.super_tags[i])
    }

    /// Fetch a super tag by its name.
    pub fn super_tag_by_name(&self, name: &str) -> Option<&TagDef> {
        self.super_by_name.get(name).map(|&i| &self.super_tags[i])
    }
}

/// The process-wide set of schema dictionaries, keyed by dictionary
/// identifier.
///
/// Build it during initialization, then hand out shared references to codec
/// instances; all lookups are read-only.
#[derive(Debug, Clone, Default)]
pub struct BioDictionary {
    dictionaries: HashMap<u8, Dictionary>,
}

impl BioDictionary {
    /// Create an empty registry.
    pub fn new() -> Self {
        BioDictionary::default()
    }

    /// Register a dictionary, builder style. A dictionary registered later
    /// replaces an earlier one under the same identifier.
    pub fn with_dictionary(mut self, dict: Dictionary) -> Self {
        self.register(dict);
        self
    }

    /// Register a dictionary, replacing any earlier one under the same
    /// identifier.
    pub fn register(&mut self, dict: Dictionary) {
        self.dictionaries.insert(dict.id(), dict);
    }
}

impl SchemaRegistry for BioDictionary {
    fn dictionary(&self, id: u8) -> Option<&Dictionary> {
        self.dictionaries.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::TypeTag;

    fn sample() -> BioDictionary {
        BioDictionary::new().with_dictionary(
            Dictionary::new(1)
                .with_object(
                    ObjDef::new(1, 10, 1, "greeting")
                        .with_tag(TagDef::new(1, "text", TypeTag::Utf)),
                )
                .with_enum(EnumDef::new(5, "Status").with_variants(["NEW", "OPEN"]))
                .with_super_tag(TagDef::new(900, "trace", TypeTag::Str)),
        )
    }

    #[test]
    fn registry_lookups() {
        let reg = sample();
        assert!(reg.dictionary(1).is_some());
        assert!(reg.dictionary(2).is_none());
        assert_eq!(reg.obj_by_code(1, 10).unwrap().name, "greeting");
        assert_eq!(reg.obj_by_name(1, "greeting").unwrap().code, 10);
        assert_eq!(reg.enum_def(1, 5).unwrap().variant(1), Some("OPEN"));
        assert_eq!(reg.super_tag_by_code(1, 900).unwrap().name, "trace");
        assert_eq!(reg.super_tag_by_name(1, "trace").unwrap().code, 900);
    }

    #[test]
    fn registry_through_reference() {
        let reg = sample();
        let view = &reg;
        assert!(view.obj_by_code(1, 10).is_some());
    }
}
