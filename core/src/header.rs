//! This module contains the wire-level concepts shared by every encoded
//! value: the type tag, the container marker, and the record header that
//! opens every record body.

use std::fmt;

/// The type tag carried on the wire by every encoded value, one byte.
///
/// The numeric assignments are fixed for wire compatibility with existing
/// producers and must never be reordered.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum TypeTag {
    /// A single byte.
    Byte = 1,
    /// 16-bit signed integer.
    Short = 2,
    /// 32-bit signed integer.
    Int = 3,
    /// 64-bit signed integer.
    Long = 4,
    /// IEEE-754 32-bit floating point number.
    Float = 5,
    /// IEEE-754 64-bit floating point number.
    Double = 6,
    /// Boolean, one byte, `0` or `1`.
    Boolean = 7,
    /// Length-prefixed ASCII string.
    Str = 8,
    /// Length-prefixed UTF-8 string.
    Utf = 9,
    /// Time instant as milliseconds since the Unix epoch, 64-bit signed.
    Time = 10,
    /// Enumeration value, encoded as its 32-bit ordinal.
    Enum = 11,
    /// Opaque length-prefixed byte blob, carried verbatim and never
    /// interpreted by the codec.
    Opaque = 12,
    /// A nested record, framed as a length-prefixed blob.
    Object = 13,
    /// A nested schema-less (properties) record, framed as a
    /// length-prefixed blob.
    Properties = 14,
}

impl TypeTag {
    /// Obtain the type tag corresponding to the given wire byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        use TypeTag::*;
        match value {
            1 => Some(Byte),
            2 => Some(Short),
            3 => Some(Int),
            4 => Some(Long),
            5 => Some(Float),
            6 => Some(Double),
            7 => Some(Boolean),
            8 => Some(Str),
            9 => Some(Utf),
            10 => Some(Time),
            11 => Some(Enum),
            12 => Some(Opaque),
            13 => Some(Object),
            14 => Some(Properties),
            _ => None,
        }
    }

    /// Retrieve a descriptive name of this type, suitable for diagnostics.
    pub fn name(self) -> &'static str {
        use TypeTag::*;
        match self {
            Byte => "Byte",
            Short => "Short",
            Int => "Int",
            Long => "Long",
            Float => "Float",
            Double => "Double",
            Boolean => "Boolean",
            Str => "Str",
            Utf => "Utf",
            Time => "Time",
            Enum => "Enum",
            Opaque => "Opaque",
            Object => "Object",
            Properties => "Properties",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The container marker following the type tag on the wire, one byte.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum Container {
    /// A single value.
    Scalar = 0,
    /// A homogeneous array of values, count-prefixed.
    Array = 1,
    /// A homogeneous list of values. Same wire shape as an array, but the
    /// decoder reconstructs the list container kind.
    List = 2,
}

impl Container {
    /// Obtain the container marker corresponding to the given wire byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Container::Scalar),
            1 => Some(Container::Array),
            2 => Some(Container::List),
            _ => None,
        }
    }

    /// Retrieve a descriptive name of this container, suitable for
    /// diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Container::Scalar => "scalar",
            Container::Array => "array",
            Container::List => "list",
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The header opening every record body on the wire:
/// `[dictionary: u8][code: u16][version: u16]`, all big endian.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub struct RecordHead {
    /// The identifier of the dictionary holding this record's schema.
    pub dictionary: u8,
    /// The object code identifying the schema within the dictionary.
    pub code: u16,
    /// The schema version.
    pub version: u16,
}

impl RecordHead {
    /// Create a new record header.
    pub fn new(dictionary: u8, code: u16, version: u16) -> Self {
        RecordHead {
            dictionary,
            code,
            version,
        }
    }

    /// Whether this header marks a schema-less properties record
    /// (`code == 0 && version == 0`), which bypasses dictionary validation.
    pub fn is_properties(&self) -> bool {
        self.code == 0 && self.version == 0
    }
}

impl fmt::Display for RecordHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},v{})", self.dictionary, self.code, self.version)
    }
}
