//! This module includes the typed value model of a bio record: the scalar
//! variants, the homogeneous sequences backing arrays and lists, and the
//! full value type distinguishing the container kind.

use chrono::{DateTime, TimeZone, Utc};
use smallvec::SmallVec;
use snafu::Snafu;

use crate::header::{Container, TypeTag};
use crate::record::BioRecord;

/// An aggregation of one or more elements in a sequence value.
pub type C<T> = SmallVec<[T; 2]>;

/// An enumeration value: an ordinal resolved to a variant name through the
/// dictionary's enum object. On the wire only the ordinal is carried.
#[derive(Debug, Clone, Eq, Hash, PartialEq)]
pub struct BioEnum {
    /// The ordinal carried on the wire.
    pub ordinal: i32,
    /// The variant name, as declared by the enum object.
    pub name: String,
}

impl BioEnum {
    /// Create a new enumeration value.
    pub fn new<N: Into<String>>(ordinal: i32, name: N) -> Self {
        BioEnum {
            ordinal,
            name: name.into(),
        }
    }
}

/// A single (non-container) value of a bio record.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// A single byte.
    Byte(u8),
    /// A 16-bit signed integer.
    Short(i16),
    /// A 32-bit signed integer.
    Int(i32),
    /// A 64-bit signed integer.
    Long(i64),
    /// A 32-bit floating point number.
    Float(f32),
    /// A 64-bit floating point number.
    Double(f64),
    /// A boolean.
    Boolean(bool),
    /// An ASCII string.
    Str(String),
    /// A UTF-8 string.
    Utf(String),
    /// A time instant in milliseconds since the Unix epoch.
    Time(i64),
    /// An enumeration value.
    Enum(BioEnum),
    /// An opaque byte blob, carried verbatim.
    Opaque(Vec<u8>),
    /// A nested record.
    Object(BioRecord),
    /// A nested schema-less (properties) record.
    Properties(BioRecord),
}

impl Scalar {
    /// Retrieve the wire type tag of this scalar.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Scalar::Byte(_) => TypeTag::Byte,
            Scalar::Short(_) => TypeTag::Short,
            Scalar::Int(_) => TypeTag::Int,
            Scalar::Long(_) => TypeTag::Long,
            Scalar::Float(_) => TypeTag::Float,
            Scalar::Double(_) => TypeTag::Double,
            Scalar::Boolean(_) => TypeTag::Boolean,
            Scalar::Str(_) => TypeTag::Str,
            Scalar::Utf(_) => TypeTag::Utf,
            Scalar::Time(_) => TypeTag::Time,
            Scalar::Enum(_) => TypeTag::Enum,
            Scalar::Opaque(_) => TypeTag::Opaque,
            Scalar::Object(_) => TypeTag::Object,
            Scalar::Properties(_) => TypeTag::Properties,
        }
    }

    /// Interpret a `Time` scalar as a UTC date-time.
    ///
    /// Returns `None` if the value is not a time or the millisecond count is
    /// out of chrono's representable range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match *self {
            Scalar::Time(ms) => Utc.timestamp_millis_opt(ms).single(),
            _ => None,
        }
    }
}

/// A homogeneous sequence of values, the payload of both arrays and lists.
#[derive(Debug, Clone, PartialEq)]
pub enum Seq {
    /// A sequence of bytes.
    Byte(C<u8>),
    /// A sequence of 16-bit signed integers.
    Short(C<i16>),
    /// A sequence of 32-bit signed integers.
    Int(C<i32>),
    /// A sequence of 64-bit signed integers.
    Long(C<i64>),
    /// A sequence of 32-bit floating point numbers.
    Float(C<f32>),
    /// A sequence of 64-bit floating point numbers.
    Double(C<f64>),
    /// A sequence of booleans.
    Boolean(C<bool>),
    /// A sequence of ASCII strings.
    Str(Vec<String>),
    /// A sequence of UTF-8 strings.
    Utf(Vec<String>),
    /// A sequence of time instants in milliseconds since the Unix epoch.
    Time(C<i64>),
    /// A sequence of enumeration values.
    Enum(Vec<BioEnum>),
    /// A sequence of opaque byte blobs.
    Opaque(Vec<Vec<u8>>),
    /// A sequence of nested records.
    Object(Vec<BioRecord>),
    /// A sequence of nested schema-less (properties) records.
    Properties(Vec<BioRecord>),
}

impl Seq {
    /// Retrieve the wire type tag of this sequence's elements.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Seq::Byte(_) => TypeTag::Byte,
            Seq::Short(_) => TypeTag::Short,
            Seq::Int(_) => TypeTag::Int,
            Seq::Long(_) => TypeTag::Long,
            Seq::Float(_) => TypeTag::Float,
            Seq::Double(_) => TypeTag::Double,
            Seq::Boolean(_) => TypeTag::Boolean,
            Seq::Str(_) => TypeTag::Str,
            Seq::Utf(_) => TypeTag::Utf,
            Seq::Time(_) => TypeTag::Time,
            Seq::Enum(_) => TypeTag::Enum,
            Seq::Opaque(_) => TypeTag::Opaque,
            Seq::Object(_) => TypeTag::Object,
            Seq::Properties(_) => TypeTag::Properties,
        }
    }

    /// Obtain the number of elements in the sequence.
    pub fn len(&self) -> usize {
        match self {
            Seq::Byte(v) => v.len(),
            Seq::Short(v) => v.len(),
            Seq::Int(v) => v.len(),
            Seq::Long(v) => v.len(),
            Seq::Float(v) => v.len(),
            Seq::Double(v) => v.len(),
            Seq::Boolean(v) => v.len(),
            Seq::Str(v) => v.len(),
            Seq::Utf(v) => v.len(),
            Seq::Time(v) => v.len(),
            Seq::Enum(v) => v.len(),
            Seq::Opaque(v) => v.len(),
            Seq::Object(v) => v.len(),
            Seq::Properties(v) => v.len(),
        }
    }

    /// Whether the sequence has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A full bio record value: a scalar, a homogeneous array or list, or a
/// dynamic expression placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A single value.
    Scalar(Scalar),
    /// A homogeneous array of values.
    Array(Seq),
    /// A homogeneous list of values. Same wire shape as an array, except for
    /// the container marker, so that the decoder rebuilds the same kind.
    List(Seq),
    /// A dynamic expression placeholder. Never encoded; the codec skips the
    /// carrying tag entirely.
    Dynamic(String),
}

impl Value {
    /// Create an ASCII string scalar value.
    pub fn ascii<S: Into<String>>(s: S) -> Self {
        Value::Scalar(Scalar::Str(s.into()))
    }

    /// Create an array value from a sequence.
    pub fn array<S: Into<Seq>>(seq: S) -> Self {
        Value::Array(seq.into())
    }

    /// Create a list value from a sequence.
    pub fn list<S: Into<Seq>>(seq: S) -> Self {
        Value::List(seq.into())
    }

    /// Retrieve the wire type tag of the contained value, or `None` for a
    /// dynamic expression placeholder.
    pub fn type_tag(&self) -> Option<TypeTag> {
        match self {
            Value::Scalar(s) => Some(s.type_tag()),
            Value::Array(s) | Value::List(s) => Some(s.type_tag()),
            Value::Dynamic(_) => None,
        }
    }

    /// Retrieve the container kind of this value, or `None` for a dynamic
    /// expression placeholder.
    pub fn container(&self) -> Option<Container> {
        match self {
            Value::Scalar(_) => Some(Container::Scalar),
            Value::Array(_) => Some(Container::Array),
            Value::List(_) => Some(Container::List),
            Value::Dynamic(_) => None,
        }
    }

    /// Retrieve a descriptive name of this value's shape, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Scalar(s) => s.type_tag().name(),
            Value::Array(_) => "array",
            Value::List(_) => "list",
            Value::Dynamic(_) => "dynamic expression",
        }
    }

    /// Retrieve the value as a string slice, if it is an ASCII or UTF-8
    /// string scalar.
    pub fn string(&self) -> Result<&str, CastValueError> {
        match self {
            Value::Scalar(Scalar::Str(s)) | Value::Scalar(Scalar::Utf(s)) => Ok(s),
            other => CastValueSnafu {
                requested: "string",
                got: other.type_name(),
            }
            .fail(),
        }
    }

    /// Retrieve the value as a 32-bit integer, if it is an `Int` scalar.
    pub fn int(&self) -> Result<i32, CastValueError> {
        match self {
            Value::Scalar(Scalar::Int(v)) => Ok(*v),
            other => CastValueSnafu {
                requested: "Int",
                got: other.type_name(),
            }
            .fail(),
        }
    }

    /// Retrieve the value as a 64-bit integer, if it is a `Long` scalar.
    pub fn long(&self) -> Result<i64, CastValueError> {
        match self {
            Value::Scalar(Scalar::Long(v)) => Ok(*v),
            other => CastValueSnafu {
                requested: "Long",
                got: other.type_name(),
            }
            .fail(),
        }
    }

    /// Retrieve the value as a 64-bit float, if it is a `Double` scalar.
    pub fn double(&self) -> Result<f64, CastValueError> {
        match self {
            Value::Scalar(Scalar::Double(v)) => Ok(*v),
            other => CastValueSnafu {
                requested: "Double",
                got: other.type_name(),
            }
            .fail(),
        }
    }

    /// Retrieve the value as a boolean, if it is a `Boolean` scalar.
    pub fn boolean(&self) -> Result<bool, CastValueError> {
        match self {
            Value::Scalar(Scalar::Boolean(v)) => Ok(*v),
            other => CastValueSnafu {
                requested: "Boolean",
                got: other.type_name(),
            }
            .fail(),
        }
    }

    /// Retrieve the value as a nested record, schema-ful or properties.
    pub fn record(&self) -> Result<&BioRecord, CastValueError> {
        match self {
            Value::Scalar(Scalar::Object(r)) | Value::Scalar(Scalar::Properties(r)) => Ok(r),
            other => CastValueSnafu {
                requested: "record",
                got: other.type_name(),
            }
            .fail(),
        }
    }

    /// Retrieve the value as an enumeration value.
    pub fn enum_value(&self) -> Result<&BioEnum, CastValueError> {
        match self {
            Value::Scalar(Scalar::Enum(e)) => Ok(e),
            other => CastValueSnafu {
                requested: "Enum",
                got: other.type_name(),
            }
            .fail(),
        }
    }

    /// Retrieve the element sequence of an array or list value.
    pub fn items(&self) -> Result<&Seq, CastValueError> {
        match self {
            Value::Array(s) | Value::List(s) => Ok(s),
            other => CastValueSnafu {
                requested: "array or list",
                got: other.type_name(),
            }
            .fail(),
        }
    }
}

/// An error raised when requesting a value under an incompatible type.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(display("bad value cast: requested {} but value is {}", requested, got))]
pub struct CastValueError {
    /// The type requested by the caller.
    pub requested: &'static str,
    /// The name of the type effectively held by the value.
    pub got: &'static str,
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Scalar(Scalar::Byte(v))
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Scalar(Scalar::Short(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Scalar(Scalar::Int(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Scalar(Scalar::Long(v))
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Scalar(Scalar::Float(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Scalar(Scalar::Double(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Scalar(Scalar::Boolean(v))
    }
}

/// String conversions produce UTF-8 string values; use [`Value::ascii`]
/// for the ASCII string type.
impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Scalar(Scalar::Utf(v.to_owned()))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Scalar(Scalar::Utf(v))
    }
}

impl From<BioEnum> for Value {
    fn from(v: BioEnum) -> Self {
        Value::Scalar(Scalar::Enum(v))
    }
}

/// A time instant converts to a `Time` scalar in epoch milliseconds.
impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Scalar(Scalar::Time(v.timestamp_millis()))
    }
}

/// A record converts to a `Properties` scalar when its header marks a
/// schema-less record, and to an `Object` scalar otherwise.
impl From<BioRecord> for Value {
    fn from(v: BioRecord) -> Self {
        if v.is_properties() {
            Value::Scalar(Scalar::Properties(v))
        } else {
            Value::Scalar(Scalar::Object(v))
        }
    }
}

macro_rules! impl_seq_from_vec {
    ($t:ty, $variant:ident, small) => {
        impl From<Vec<$t>> for Seq {
            fn from(v: Vec<$t>) -> Self {
                Seq::$variant(v.into_iter().collect())
            }
        }
    };
    ($t:ty, $variant:ident) => {
        impl From<Vec<$t>> for Seq {
            fn from(v: Vec<$t>) -> Self {
                Seq::$variant(v)
            }
        }
    };
}

impl_seq_from_vec!(u8, Byte, small);
impl_seq_from_vec!(i16, Short, small);
impl_seq_from_vec!(i32, Int, small);
impl_seq_from_vec!(i64, Long, small);
impl_seq_from_vec!(f32, Float, small);
impl_seq_from_vec!(f64, Double, small);
impl_seq_from_vec!(bool, Boolean, small);
impl_seq_from_vec!(String, Utf);
impl_seq_from_vec!(BioEnum, Enum);
impl_seq_from_vec!(BioRecord, Object);

/// A vector of values converts to an array by default; use [`Value::list`]
/// for the list container kind.
impl<T> From<Vec<T>> for Value
where
    Seq: From<Vec<T>>,
{
    fn from(v: Vec<T>) -> Self {
        Value::Array(Seq::from(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_type_tags() {
        assert_eq!(Scalar::Int(1).type_tag(), TypeTag::Int);
        assert_eq!(Scalar::Utf("x".into()).type_tag(), TypeTag::Utf);
        assert_eq!(
            Scalar::Enum(BioEnum::new(0, "A")).type_tag(),
            TypeTag::Enum
        );
    }

    #[test]
    fn value_container_kinds() {
        let v = Value::from(vec![1_i32, 2, 3]);
        assert_eq!(v.container(), Some(Container::Array));
        assert_eq!(v.type_tag(), Some(TypeTag::Int));

        let v = Value::list(vec![1_i32, 2]);
        assert_eq!(v.container(), Some(Container::List));

        let v = Value::Dynamic("${now}".into());
        assert_eq!(v.container(), None);
        assert_eq!(v.type_tag(), None);
    }

    #[test]
    fn checked_accessors() {
        let v = Value::from(7_i32);
        assert_eq!(v.int().unwrap(), 7);
        let err = v.string().unwrap_err();
        assert_eq!(err.requested, "string");
        assert_eq!(err.got, "Int");
    }

    #[test]
    fn time_conversion() {
        let dt = Utc.timestamp_millis_opt(1_700_000_000_123).single().unwrap();
        let v = Value::from(dt);
        assert_eq!(v, Value::Scalar(Scalar::Time(1_700_000_000_123)));
        match v {
            Value::Scalar(s) => assert_eq!(s.to_datetime(), Some(dt)),
            _ => unreachable!(),
        }
    }
}
