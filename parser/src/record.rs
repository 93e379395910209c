//! The record codec: schema-driven encoding and decoding of single record
//! bodies, with per-tag dispatch across every `(type, container)` pair.
//!
//! A record body is `[dictionary: u8][code: u16][version: u16]` followed by
//! tag entries until the end of the blob. Each entry is
//! `[type: u8][container: u8][tag code][payload]`; nested records are framed
//! as length-prefixed blobs in the enclosing object's length mode.

use bio_core::{
    BioEnum, BioRecord, Container, Dictionary, EnumDef, ObjDef, RecordHead, Scalar,
    SchemaRegistry, Seq, TagDef, TypeTag, Value, C,
};
use bio_encoding::{ReadStream, WriteStream};
use snafu::{ensure, OptionExt, ResultExt};
use tracing::warn;

use crate::error::{
    DecodeHeadSnafu, DecodeRecordSnafu, DecodeValueSnafu, EncodeRecordSnafu, EncodeValueSnafu,
    ExpectedPropertiesSnafu, InvalidContainerSnafu, InvalidTypeTagSnafu, Result, TypeMismatchSnafu,
    UnknownDictionarySnafu, UnknownObjectSnafu,
};
use crate::factory::{GenericFactory, RecordFactory};
use crate::props;

const MAX_PREALLOC: usize = 1024;

/// A stateful encoder of record bodies against a schema registry.
///
/// In lenient mode (the default), records of unregistered schemas are
/// omitted; in validated mode they raise
/// [`UnknownDictionary`](crate::Error::UnknownDictionary) or
/// [`UnknownObject`](crate::Error::UnknownObject).
#[derive(Debug)]
pub struct RecordEncoder<'a, D> {
    dict: &'a D,
    validated: bool,
}

impl<'a, D> RecordEncoder<'a, D>
where
    D: SchemaRegistry,
{
    /// Create a lenient encoder over the given registry.
    pub fn new(dict: &'a D) -> Self {
        RecordEncoder {
            dict,
            validated: false,
        }
    }

    /// Set strict validation, builder style.
    pub fn validated(mut self, validated: bool) -> Self {
        self.validated = validated;
        self
    }

    /// Encode one record into its body bytes.
    ///
    /// Returns `None` when the record's schema is unknown and the encoder is
    /// lenient, so the caller can omit the element.
    pub fn encode(&self, record: &BioRecord) -> Result<Option<Vec<u8>>> {
        let mut out = WriteStream::new();
        if self.write_record(&mut out, record)? {
            Ok(Some(out.into_bytes()))
        } else {
            Ok(None)
        }
    }

    /// Encode one record into the given stream. Returns whether anything
    /// was written.
    pub fn write_record(&self, out: &mut WriteStream, record: &BioRecord) -> Result<bool> {
        if record.is_properties() {
            props::write_properties(self, out, record)?;
            return Ok(true);
        }
        let dictionary = match self.dict.dictionary(record.dictionary()) {
            Some(d) => d,
            None => {
                ensure!(
                    !self.validated,
                    UnknownDictionarySnafu {
                        dictionary: record.dictionary(),
                    }
                );
                warn!(
                    dictionary = record.dictionary(),
                    "unknown dictionary, record omitted"
                );
                return Ok(false);
            }
        };
        let obj = match dictionary.obj_by_code(record.code()) {
            Some(o) => o,
            None => {
                ensure!(
                    !self.validated,
                    UnknownObjectSnafu {
                        dictionary: record.dictionary(),
                        code: record.code(),
                    }
                );
                warn!(
                    dictionary = record.dictionary(),
                    code = record.code(),
                    "unknown object, record omitted"
                );
                return Ok(false);
            }
        };

        // large objects switch every length prefix of this body to 4 bytes
        let previous = out.set_length_as_int(obj.large);
        let outcome = self.write_record_body(out, record, dictionary, obj);
        out.set_length_as_int(previous);
        outcome?;
        Ok(true)
    }

    fn write_record_body(
        &self,
        out: &mut WriteStream,
        record: &BioRecord,
        dictionary: &Dictionary,
        obj: &ObjDef,
    ) -> Result<()> {
        let head = record.head();
        out.write_u8(head.dictionary)
            .and_then(|()| out.write_u16(head.code))
            .and_then(|()| out.write_u16(head.version))
            .context(EncodeRecordSnafu {
                object: obj.name.as_str(),
            })?;
        for (key, value) in record.iter() {
            self.write_value(out, dictionary, obj, key, value)?;
        }
        Ok(())
    }

    fn write_value(
        &self,
        out: &mut WriteStream,
        dictionary: &Dictionary,
        obj: &ObjDef,
        key: &str,
        value: &Value,
    ) -> Result<()> {
        let tag = match obj
            .tag_by_name(key)
            .or_else(|| dictionary.super_tag_by_name(key))
        {
            Some(t) => t,
            None => {
                warn!(tag = key, object = %obj.name, "tag not in schema, value skipped");
                return Ok(());
            }
        };
        if !tag.encodable {
            return Ok(());
        }
        if matches!(value, Value::Dynamic(_)) {
            // dynamic expressions are resolved elsewhere, never carried
            return Ok(());
        }
        let compact = dictionary.uses_compact_tag_codes();
        match (tag.container, value) {
            (Container::Scalar, Value::Scalar(scalar)) => {
                self.write_scalar(out, obj, tag, scalar, compact)
            }
            (Container::Array, Value::Array(seq)) => {
                self.write_seq(out, obj, tag, Container::Array, seq, compact)
            }
            (Container::List, Value::List(seq)) => {
                self.write_seq(out, obj, tag, Container::List, seq, compact)
            }
            _ => TypeMismatchSnafu {
                tag: tag.name.as_str(),
                object: obj.name.as_str(),
                expected: format!("a {} {}", tag.ty, tag.container),
                got: value.type_name(),
            }
            .fail(),
        }
    }

    fn write_scalar(
        &self,
        out: &mut WriteStream,
        obj: &ObjDef,
        tag: &TagDef,
        scalar: &Scalar,
        compact: bool,
    ) -> Result<()> {
        ensure!(
            scalar.type_tag() == tag.ty,
            TypeMismatchSnafu {
                tag: tag.name.as_str(),
                object: obj.name.as_str(),
                expected: format!("a {} scalar", tag.ty),
                got: scalar.type_tag().name(),
            }
        );
        match scalar {
            Scalar::Object(nested) => {
                // unknown nested schemas omit the whole tag, so the nested
                // body is produced before the tag header
                let bytes = match self.nested_record_bytes(nested)? {
                    Some(b) => b,
                    None => return Ok(()),
                };
                self.write_tag_head(out, obj, tag, TypeTag::Object, Container::Scalar, compact)?;
                out.write_blob(&bytes).context(EncodeValueSnafu {
                    tag: tag.name.as_str(),
                    object: obj.name.as_str(),
                })?;
            }
            Scalar::Properties(nested) => {
                let bytes = self.properties_bytes(nested)?;
                self.write_tag_head(
                    out,
                    obj,
                    tag,
                    TypeTag::Properties,
                    Container::Scalar,
                    compact,
                )?;
                out.write_blob(&bytes).context(EncodeValueSnafu {
                    tag: tag.name.as_str(),
                    object: obj.name.as_str(),
                })?;
            }
            _ => {
                self.write_tag_head(out, obj, tag, scalar.type_tag(), Container::Scalar, compact)?;
                write_plain_scalar(out, scalar).context(EncodeValueSnafu {
                    tag: tag.name.as_str(),
                    object: obj.name.as_str(),
                })?;
            }
        }
        Ok(())
    }

    fn write_seq(
        &self,
        out: &mut WriteStream,
        obj: &ObjDef,
        tag: &TagDef,
        container: Container,
        seq: &Seq,
        compact: bool,
    ) -> Result<()> {
        ensure!(
            seq.type_tag() == tag.ty,
            TypeMismatchSnafu {
                tag: tag.name.as_str(),
                object: obj.name.as_str(),
                expected: format!("a {} {}", tag.ty, container),
                got: seq.type_tag().name(),
            }
        );
        match seq {
            Seq::Object(items) => {
                let mut blobs = Vec::with_capacity(items.len());
                for nested in items {
                    if let Some(bytes) = self.nested_record_bytes(nested)? {
                        blobs.push(bytes);
                    }
                }
                self.write_tag_head(out, obj, tag, TypeTag::Object, container, compact)?;
                self.write_blob_elements(out, obj, tag, &blobs)?;
            }
            Seq::Properties(items) => {
                let mut blobs = Vec::with_capacity(items.len());
                for nested in items {
                    blobs.push(self.properties_bytes(nested)?);
                }
                self.write_tag_head(out, obj, tag, TypeTag::Properties, container, compact)?;
                self.write_blob_elements(out, obj, tag, &blobs)?;
            }
            _ => {
                self.write_tag_head(out, obj, tag, seq.type_tag(), container, compact)?;
                write_plain_elements(out, seq).context(EncodeValueSnafu {
                    tag: tag.name.as_str(),
                    object: obj.name.as_str(),
                })?;
            }
        }
        Ok(())
    }

    fn write_tag_head(
        &self,
        out: &mut WriteStream,
        obj: &ObjDef,
        tag: &TagDef,
        ty: TypeTag,
        container: Container,
        compact: bool,
    ) -> Result<()> {
        out.write_u8(ty as u8)
            .and_then(|()| out.write_u8(container as u8))
            .and_then(|()| out.write_tag_code(tag.code, compact))
            .context(EncodeValueSnafu {
                tag: tag.name.as_str(),
                object: obj.name.as_str(),
            })
    }

    fn write_blob_elements(
        &self,
        out: &mut WriteStream,
        obj: &ObjDef,
        tag: &TagDef,
        blobs: &[Vec<u8>],
    ) -> Result<()> {
        out.write_length(blobs.len()).context(EncodeValueSnafu {
            tag: tag.name.as_str(),
            object: obj.name.as_str(),
        })?;
        for bytes in blobs {
            out.write_blob(bytes).context(EncodeValueSnafu {
                tag: tag.name.as_str(),
                object: obj.name.as_str(),
            })?;
        }
        Ok(())
    }

    /// Produce the framed body of a nested record, or `None` when the tag
    /// carrying it must be omitted.
    pub(crate) fn nested_record_bytes(&self, nested: &BioRecord) -> Result<Option<Vec<u8>>> {
        if !nested.is_properties() && self.dict.dictionary(nested.dictionary()).is_none() {
            // unknown nested dictionaries omit silently even when validated
            warn!(
                dictionary = nested.dictionary(),
                "nested record under unknown dictionary, tag omitted"
            );
            return Ok(None);
        }
        self.encode(nested)
    }

    /// Produce the body of a record encoded through the schema-less
    /// properties lane.
    pub(crate) fn properties_bytes(&self, nested: &BioRecord) -> Result<Vec<u8>> {
        let mut sub = WriteStream::new();
        props::write_properties(self, &mut sub, nested)?;
        Ok(sub.into_bytes())
    }
}

/// A stateful decoder of record bodies against a schema registry.
///
/// Mirrors [`RecordEncoder`]: lenient by default, validated on request.
/// Records are instantiated through the configured [`RecordFactory`].
#[derive(Debug)]
pub struct RecordDecoder<'a, D, F = GenericFactory> {
    dict: &'a D,
    factory: F,
    validated: bool,
}

impl<'a, D> RecordDecoder<'a, D, GenericFactory>
where
    D: SchemaRegistry,
{
    /// Create a lenient decoder over the given registry, using the generic
    /// record factory.
    pub fn new(dict: &'a D) -> Self {
        RecordDecoder {
            dict,
            factory: GenericFactory,
            validated: false,
        }
    }
}

impl<'a, D, F> RecordDecoder<'a, D, F>
where
    D: SchemaRegistry,
    F: RecordFactory,
{
    /// Create a lenient decoder with a custom record factory.
    pub fn with_factory(dict: &'a D, factory: F) -> Self {
        RecordDecoder {
            dict,
            factory,
            validated: false,
        }
    }

    /// Set strict validation, builder style.
    pub fn validated(mut self, validated: bool) -> Self {
        self.validated = validated;
        self
    }

    /// Decode one record body.
    ///
    /// Returns `None` when the blob's schema is unknown and the decoder is
    /// lenient.
    pub fn decode(&self, bytes: &[u8]) -> Result<Option<BioRecord>> {
        let mut input = ReadStream::new(bytes);
        self.read_record(&mut input)
    }

    /// Decode one record body from the given stream, consuming it whole.
    pub fn read_record(&self, input: &mut ReadStream<'_>) -> Result<Option<BioRecord>> {
        let head = read_head(input).context(DecodeHeadSnafu)?;
        if head.is_properties() {
            return props::read_properties(self, input, head).map(Some);
        }
        let dictionary = match self.dict.dictionary(head.dictionary) {
            Some(d) => d,
            None => {
                ensure!(
                    !self.validated,
                    UnknownDictionarySnafu {
                        dictionary: head.dictionary,
                    }
                );
                warn!(dictionary = head.dictionary, "unknown dictionary, record dropped");
                input.read_remaining();
                return Ok(None);
            }
        };
        let obj = match dictionary.obj_by_code(head.code) {
            Some(o) => o,
            None => {
                ensure!(
                    !self.validated,
                    UnknownObjectSnafu {
                        dictionary: head.dictionary,
                        code: head.code,
                    }
                );
                warn!(
                    dictionary = head.dictionary,
                    code = head.code,
                    "unknown object, record dropped"
                );
                input.read_remaining();
                return Ok(None);
            }
        };

        let previous = input.set_length_as_int(obj.large);
        let outcome = self.read_record_body(input, dictionary, obj, head);
        input.set_length_as_int(previous);
        outcome.map(Some)
    }

    fn read_record_body(
        &self,
        input: &mut ReadStream<'_>,
        dictionary: &Dictionary,
        obj: &ObjDef,
        head: RecordHead,
    ) -> Result<BioRecord> {
        let mut record = self.factory.new_record(obj);
        record.set_head(head);
        let compact = dictionary.uses_compact_tag_codes();
        while input.available() > 0 {
            let position = input.position();
            let ty_raw = input.read_u8().context(DecodeRecordSnafu {
                object: obj.name.as_str(),
            })?;
            let ty = TypeTag::from_u8(ty_raw).context(InvalidTypeTagSnafu {
                value: ty_raw,
                position,
            })?;
            let container_raw = input.read_u8().context(DecodeRecordSnafu {
                object: obj.name.as_str(),
            })?;
            let container = Container::from_u8(container_raw).context(InvalidContainerSnafu {
                value: container_raw,
                position,
            })?;
            let code = input.read_tag_code(compact).context(DecodeRecordSnafu {
                object: obj.name.as_str(),
            })?;
            match obj
                .tag_by_code(code)
                .or_else(|| dictionary.super_tag_by_code(code))
            {
                Some(tag) => {
                    let enum_def = tag.enum_code.and_then(|c| dictionary.enum_def(c));
                    if let Some(value) =
                        self.read_value(input, obj.name.as_str(), &tag.name, enum_def, ty, container)?
                    {
                        record.put(tag.name.clone(), value);
                    }
                }
                None => {
                    // a newer schema on the producer side; consume exactly
                    // the payload bytes and move on
                    warn!(code, object = %obj.name, "unknown tag on wire, bytes skipped");
                    skip_payload(input, ty, container).context(DecodeRecordSnafu {
                        object: obj.name.as_str(),
                    })?;
                }
            }
        }
        Ok(record)
    }

    /// Read one value of the observed `(type, container)` shape. Returns
    /// `None` when the value must be dropped (unresolvable enum, nested
    /// record of an unknown schema).
    pub(crate) fn read_value(
        &self,
        input: &mut ReadStream<'_>,
        object: &str,
        tag_name: &str,
        enum_def: Option<&EnumDef>,
        ty: TypeTag,
        container: Container,
    ) -> Result<Option<Value>> {
        match container {
            Container::Scalar => Ok(self
                .read_scalar(input, object, tag_name, enum_def, ty)?
                .map(Value::Scalar)),
            Container::Array => Ok(self
                .read_elements(input, object, tag_name, enum_def, ty)?
                .map(Value::Array)),
            Container::List => Ok(self
                .read_elements(input, object, tag_name, enum_def, ty)?
                .map(Value::List)),
        }
    }

    fn read_scalar(
        &self,
        input: &mut ReadStream<'_>,
        object: &str,
        tag_name: &str,
        enum_def: Option<&EnumDef>,
        ty: TypeTag,
    ) -> Result<Option<Scalar>> {
        macro_rules! plain {
            ($read:ident, $variant:ident) => {
                Scalar::$variant(input.$read().context(DecodeValueSnafu {
                    tag: tag_name,
                    object,
                })?)
            };
        }
        let scalar = match ty {
            TypeTag::Byte => plain!(read_u8, Byte),
            TypeTag::Short => plain!(read_i16, Short),
            TypeTag::Int => plain!(read_i32, Int),
            TypeTag::Long => plain!(read_i64, Long),
            TypeTag::Float => plain!(read_f32, Float),
            TypeTag::Double => plain!(read_f64, Double),
            TypeTag::Boolean => plain!(read_bool, Boolean),
            TypeTag::Str => plain!(read_ascii, Str),
            TypeTag::Utf => plain!(read_utf, Utf),
            TypeTag::Time => plain!(read_i64, Time),
            TypeTag::Opaque => Scalar::Opaque(
                input
                    .read_blob()
                    .context(DecodeValueSnafu {
                        tag: tag_name,
                        object,
                    })?
                    .to_vec(),
            ),
            TypeTag::Enum => {
                let ordinal = input.read_i32().context(DecodeValueSnafu {
                    tag: tag_name,
                    object,
                })?;
                return Ok(resolve_enum(enum_def, ordinal, tag_name).map(Scalar::Enum));
            }
            TypeTag::Object => {
                let blob = input.read_blob().context(DecodeValueSnafu {
                    tag: tag_name,
                    object,
                })?;
                let mut sub = ReadStream::new(blob);
                return Ok(self.read_record(&mut sub)?.map(Scalar::Object));
            }
            TypeTag::Properties => {
                let blob = input.read_blob().context(DecodeValueSnafu {
                    tag: tag_name,
                    object,
                })?;
                let mut sub = ReadStream::new(blob);
                return self
                    .read_properties_blob(&mut sub, tag_name)
                    .map(|r| Some(Scalar::Properties(r)));
            }
        };
        Ok(Some(scalar))
    }

    fn read_elements(
        &self,
        input: &mut ReadStream<'_>,
        object: &str,
        tag_name: &str,
        enum_def: Option<&EnumDef>,
        ty: TypeTag,
    ) -> Result<Option<Seq>> {
        let count = input.read_length().context(DecodeValueSnafu {
            tag: tag_name,
            object,
        })?;
        // the declared count is untrusted input; never pre-allocate more
        // than a sane bound before the elements actually materialize
        let capacity = count.min(MAX_PREALLOC);
        macro_rules! gather {
            ($read:ident, $variant:ident) => {{
                let mut items = C::new();
                for _ in 0..count {
                    items.push(input.$read().context(DecodeValueSnafu {
                        tag: tag_name,
                        object,
                    })?);
                }
                Seq::$variant(items)
            }};
        }
        let seq = match ty {
            TypeTag::Byte => gather!(read_u8, Byte),
            TypeTag::Short => gather!(read_i16, Short),
            TypeTag::Int => gather!(read_i32, Int),
            TypeTag::Long => gather!(read_i64, Long),
            TypeTag::Float => gather!(read_f32, Float),
            TypeTag::Double => gather!(read_f64, Double),
            TypeTag::Boolean => gather!(read_bool, Boolean),
            TypeTag::Time => gather!(read_i64, Time),
            TypeTag::Str => {
                let mut items = Vec::with_capacity(capacity);
                for _ in 0..count {
                    items.push(input.read_ascii().context(DecodeValueSnafu {
                        tag: tag_name,
                        object,
                    })?);
                }
                Seq::Str(items)
            }
            TypeTag::Utf => {
                let mut items = Vec::with_capacity(capacity);
                for _ in 0..count {
                    items.push(input.read_utf().context(DecodeValueSnafu {
                        tag: tag_name,
                        object,
                    })?);
                }
                Seq::Utf(items)
            }
            TypeTag::Opaque => {
                let mut items = Vec::with_capacity(capacity);
                for _ in 0..count {
                    items.push(
                        input
                            .read_blob()
                            .context(DecodeValueSnafu {
                                tag: tag_name,
                                object,
                            })?
                            .to_vec(),
                    );
                }
                Seq::Opaque(items)
            }
            TypeTag::Enum => {
                // consume every ordinal before deciding, so an unresolvable
                // enum drops the value without desynchronizing the stream
                let mut ordinals = Vec::with_capacity(capacity);
                for _ in 0..count {
                    ordinals.push(input.read_i32().context(DecodeValueSnafu {
                        tag: tag_name,
                        object,
                    })?);
                }
                let mut items = Vec::with_capacity(ordinals.len());
                for ordinal in ordinals {
                    match resolve_enum(enum_def, ordinal, tag_name) {
                        Some(value) => items.push(value),
                        None => return Ok(None),
                    }
                }
                Seq::Enum(items)
            }
            TypeTag::Object => {
                let mut items = Vec::with_capacity(capacity);
                for _ in 0..count {
                    let blob = input.read_blob().context(DecodeValueSnafu {
                        tag: tag_name,
                        object,
                    })?;
                    let mut sub = ReadStream::new(blob);
                    if let Some(rec) = self.read_record(&mut sub)? {
                        items.push(rec);
                    }
                }
                Seq::Object(items)
            }
            TypeTag::Properties => {
                let mut items = Vec::with_capacity(capacity);
                for _ in 0..count {
                    let blob = input.read_blob().context(DecodeValueSnafu {
                        tag: tag_name,
                        object,
                    })?;
                    let mut sub = ReadStream::new(blob);
                    items.push(self.read_properties_blob(&mut sub, tag_name)?);
                }
                Seq::Properties(items)
            }
        };
        Ok(Some(seq))
    }

    fn read_properties_blob(
        &self,
        input: &mut ReadStream<'_>,
        tag_name: &str,
    ) -> Result<BioRecord> {
        let head = read_head(input).context(DecodeHeadSnafu)?;
        ensure!(
            head.is_properties(),
            ExpectedPropertiesSnafu { tag: tag_name }
        );
        props::read_properties(self, input, head)
    }
}

pub(crate) fn read_head(input: &mut ReadStream<'_>) -> bio_encoding::Result<RecordHead> {
    let dictionary = input.read_u8()?;
    let code = input.read_u16()?;
    let version = input.read_u16()?;
    Ok(RecordHead::new(dictionary, code, version))
}

fn resolve_enum(enum_def: Option<&EnumDef>, ordinal: i32, tag_name: &str) -> Option<BioEnum> {
    match enum_def.and_then(|def| def.bio_enum(ordinal)) {
        Some(value) => Some(value),
        None => {
            warn!(tag = tag_name, ordinal, "unresolvable enum ordinal, value dropped");
            None
        }
    }
}

/// Write the payload of a scalar that needs no framing decisions.
pub(crate) fn write_plain_scalar(
    out: &mut WriteStream,
    scalar: &Scalar,
) -> bio_encoding::Result<()> {
    match scalar {
        Scalar::Byte(v) => out.write_u8(*v),
        Scalar::Short(v) => out.write_i16(*v),
        Scalar::Int(v) => out.write_i32(*v),
        Scalar::Long(v) => out.write_i64(*v),
        Scalar::Float(v) => out.write_f32(*v),
        Scalar::Double(v) => out.write_f64(*v),
        Scalar::Boolean(v) => out.write_bool(*v),
        Scalar::Str(v) => out.write_ascii(v),
        Scalar::Utf(v) => out.write_utf(v),
        Scalar::Time(v) => out.write_i64(*v),
        Scalar::Enum(v) => out.write_i32(v.ordinal),
        Scalar::Opaque(v) => out.write_blob(v),
        Scalar::Object(_) | Scalar::Properties(_) => {
            unreachable!("nested records are framed by the caller")
        }
    }
}

/// Write the count and elements of a sequence that needs no framing
/// decisions.
pub(crate) fn write_plain_elements(out: &mut WriteStream, seq: &Seq) -> bio_encoding::Result<()> {
    out.write_length(seq.len())?;
    match seq {
        Seq::Byte(items) => items.iter().try_for_each(|v| out.write_u8(*v)),
        Seq::Short(items) => items.iter().try_for_each(|v| out.write_i16(*v)),
        Seq::Int(items) => items.iter().try_for_each(|v| out.write_i32(*v)),
        Seq::Long(items) => items.iter().try_for_each(|v| out.write_i64(*v)),
        Seq::Float(items) => items.iter().try_for_each(|v| out.write_f32(*v)),
        Seq::Double(items) => items.iter().try_for_each(|v| out.write_f64(*v)),
        Seq::Boolean(items) => items.iter().try_for_each(|v| out.write_bool(*v)),
        Seq::Str(items) => items.iter().try_for_each(|v| out.write_ascii(v)),
        Seq::Utf(items) => items.iter().try_for_each(|v| out.write_utf(v)),
        Seq::Time(items) => items.iter().try_for_each(|v| out.write_i64(*v)),
        Seq::Enum(items) => items.iter().try_for_each(|v| out.write_i32(v.ordinal)),
        Seq::Opaque(items) => items.iter().try_for_each(|v| out.write_blob(v)),
        Seq::Object(_) | Seq::Properties(_) => {
            unreachable!("nested records are framed by the caller")
        }
    }
}

/// Consume the payload of an entry whose tag is not in the schema, leaving
/// the cursor exactly past it.
fn skip_payload(
    input: &mut ReadStream<'_>,
    ty: TypeTag,
    container: Container,
) -> bio_encoding::Result<()> {
    match container {
        Container::Scalar => skip_element(input, ty),
        Container::Array | Container::List => {
            let count = input.read_length()?;
            for _ in 0..count {
                skip_element(input, ty)?;
            }
            Ok(())
        }
    }
}

fn skip_element(input: &mut ReadStream<'_>, ty: TypeTag) -> bio_encoding::Result<()> {
    match ty {
        TypeTag::Byte | TypeTag::Boolean => input.skip(1),
        TypeTag::Short => input.skip(2),
        TypeTag::Int | TypeTag::Float | TypeTag::Enum => input.skip(4),
        TypeTag::Long | TypeTag::Double | TypeTag::Time => input.skip(8),
        TypeTag::Str | TypeTag::Utf | TypeTag::Opaque | TypeTag::Object | TypeTag::Properties => {
            input.read_blob().map(|_| ())
        }
    }
}

#[cfg(test)]
mod tests {
    use bio_core::{BioDictionary, Dictionary, EnumDef, ObjDef, TagDef};

    use super::*;
    use crate::error::Error;

    fn registry() -> BioDictionary {
        BioDictionary::new().with_dictionary(
            Dictionary::new(1)
                .with_object(
                    ObjDef::new(1, 10, 1, "greeting")
                        .with_tag(TagDef::new(1, "greeting", TypeTag::Utf)),
                )
                .with_object(
                    ObjDef::new(1, 20, 1, "vector")
                        .with_tag(TagDef::new(1, "xs", TypeTag::Int).array())
                        .with_tag(TagDef::new(2, "names", TypeTag::Utf).list()),
                )
                .with_object(
                    ObjDef::new(1, 30, 2, "session")
                        .with_tag(TagDef::new(1, "id", TypeTag::Long))
                        .with_tag(TagDef::new(2, "token", TypeTag::Str))
                        .with_tag(TagDef::new(3, "status", TypeTag::Enum).with_enum(7))
                        .with_tag(TagDef::new(4, "child", TypeTag::Object))
                        .with_tag(TagDef::new(5, "items", TypeTag::Object).list())
                        .with_tag(TagDef::new(6, "opened", TypeTag::Time))
                        .with_tag(TagDef::new(7, "ratio", TypeTag::Double))
                        .with_tag(TagDef::new(8, "extras", TypeTag::Properties))
                        .with_tag(TagDef::new(9, "secret", TypeTag::Str).non_encodable())
                        .with_tag(TagDef::new(10, "blob", TypeTag::Opaque)),
                )
                .with_enum(
                    EnumDef::new(7, "Status").with_variants(["NEW", "OPEN", "CLOSED", "STALE"]),
                )
                .with_super_tag(TagDef::new(900, "trace", TypeTag::Str)),
        )
    }

    fn codec(reg: &BioDictionary) -> (RecordEncoder<'_, BioDictionary>, RecordDecoder<'_, BioDictionary>) {
        (RecordEncoder::new(reg), RecordDecoder::new(reg))
    }

    #[test]
    fn minimal_record_body_bytes() {
        let reg = registry();
        let (encoder, decoder) = codec(&reg);
        let record = BioRecord::new(1, 10, 1)
            .with_name("greeting")
            .with("greeting", "hi");
        let bytes = encoder.encode(&record).unwrap().unwrap();
        assert_eq!(
            bytes,
            [
                0x01, 0x00, 0x0A, 0x00, 0x01, // dictionary, code, version
                0x09, 0x00, 0x00, 0x01, // Utf scalar under tag 1
                0x00, 0x02, b'h', b'i',
            ]
        );
        let decoded = decoder.decode(&bytes).unwrap().unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn scalars_round_trip() {
        let reg = registry();
        let (encoder, decoder) = codec(&reg);
        let record = BioRecord::new(1, 30, 2)
            .with_name("session")
            .with("id", 77_i64)
            .with("token", Value::ascii("t0k3n"))
            .with("status", BioEnum::new(1, "OPEN"))
            .with("opened", Scalar::Time(1_700_000_000_000))
            .with("ratio", 0.5_f64)
            .with("blob", Value::Scalar(Scalar::Opaque(vec![0xDE, 0xAD])))
            .with("trace", Value::ascii("t-123"));
        let bytes = encoder.encode(&record).unwrap().unwrap();
        let decoded = decoder.decode(&bytes).unwrap().unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn non_encodable_tags_stay_off_the_wire() {
        let reg = registry();
        let (encoder, decoder) = codec(&reg);
        let record = BioRecord::new(1, 30, 2)
            .with_name("session")
            .with("id", 1_i64)
            .with("secret", Value::ascii("hunter2"));
        let bytes = encoder.encode(&record).unwrap().unwrap();
        let decoded = decoder.decode(&bytes).unwrap().unwrap();
        assert_eq!(decoded.get("id"), Some(&Value::from(1_i64)));
        assert!(decoded.get("secret").is_none());
    }

    #[test]
    fn dynamic_expressions_stay_off_the_wire() {
        let reg = registry();
        let (encoder, decoder) = codec(&reg);
        let record = BioRecord::new(1, 30, 2)
            .with_name("session")
            .with("token", Value::Dynamic("${session.token}".into()))
            .with("id", 5_i64);
        let bytes = encoder.encode(&record).unwrap().unwrap();
        let decoded = decoder.decode(&bytes).unwrap().unwrap();
        assert!(decoded.get("token").is_none());
        assert_eq!(decoded.get("id"), Some(&Value::from(5_i64)));
    }

    #[test]
    fn arrays_and_lists_keep_their_container_kind() {
        let reg = registry();
        let (encoder, decoder) = codec(&reg);
        let record = BioRecord::new(1, 20, 1)
            .with_name("vector")
            .with("xs", vec![1_i32, 2, 3])
            .with("names", Value::list(vec!["a".to_owned(), "b".to_owned()]));
        let bytes = encoder.encode(&record).unwrap().unwrap();
        let decoded = decoder.decode(&bytes).unwrap().unwrap();
        assert_eq!(decoded, record);
        assert!(matches!(decoded.get("xs"), Some(Value::Array(_))));
        assert!(matches!(decoded.get("names"), Some(Value::List(_))));
    }

    #[test]
    fn int_array_payload_layout() {
        let reg = registry();
        let (encoder, _) = codec(&reg);
        let record = BioRecord::new(1, 20, 1)
            .with_name("vector")
            .with("xs", vec![1_i32, 2, 3]);
        let bytes = encoder.encode(&record).unwrap().unwrap();
        assert_eq!(
            &bytes[5..],
            [
                0x03, 0x01, 0x00, 0x01, // Int array under tag 1
                0x00, 0x03, // count
                0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x03,
            ]
        );
    }

    #[test]
    fn nested_records_round_trip() {
        let reg = registry();
        let (encoder, decoder) = codec(&reg);
        let child = BioRecord::new(1, 10, 1)
            .with_name("greeting")
            .with("greeting", "hello");
        let extras = BioRecord::properties(1).with("note", "n1");
        let record = BioRecord::new(1, 30, 2)
            .with_name("session")
            .with("child", child.clone())
            .with(
                "items",
                Value::list(vec![child.clone(), child.clone()]),
            )
            .with("extras", Value::Scalar(Scalar::Properties(extras.clone())));
        let bytes = encoder.encode(&record).unwrap().unwrap();
        let decoded = decoder.decode(&bytes).unwrap().unwrap();
        assert_eq!(decoded, record);
        match decoded.get("items") {
            Some(Value::List(Seq::Object(items))) => assert_eq!(items.len(), 2),
            other => panic!("items decoded as {:?}", other),
        }
    }

    #[test]
    fn unknown_wire_tags_are_skipped_exactly() {
        // a producer with a newer schema for `greeting`
        let newer = BioDictionary::new().with_dictionary(
            Dictionary::new(1).with_object(
                ObjDef::new(1, 10, 1, "greeting")
                    .with_tag(TagDef::new(1, "greeting", TypeTag::Utf))
                    .with_tag(TagDef::new(99, "extra", TypeTag::Int).array())
                    .with_tag(TagDef::new(98, "note", TypeTag::Utf)),
            ),
        );
        let record = BioRecord::new(1, 10, 1)
            .with_name("greeting")
            .with("extra", vec![7_i32, 8])
            .with("note", "ignored")
            .with("greeting", "hi");
        let bytes = RecordEncoder::new(&newer).encode(&record).unwrap().unwrap();

        let older = registry();
        let decoded = RecordDecoder::new(&older).decode(&bytes).unwrap().unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded.get("greeting").unwrap().string().unwrap(), "hi");
    }

    #[test]
    fn values_without_a_schema_tag_are_not_encoded() {
        let reg = registry();
        let (encoder, _) = codec(&reg);
        let record = BioRecord::new(1, 10, 1)
            .with_name("greeting")
            .with("greeting", "hi")
            .with("no_such_tag", 9_i32);
        let with_unknown = encoder.encode(&record).unwrap().unwrap();
        let mut plain = record.clone();
        plain.remove("no_such_tag");
        let without = encoder.encode(&plain).unwrap().unwrap();
        assert_eq!(with_unknown, without);
    }

    #[test]
    fn strict_mode_rejects_unknown_schemas() {
        let reg = registry();
        let record = BioRecord::new(9, 10, 1).with("greeting", "hi");
        let err = RecordEncoder::new(&reg)
            .validated(true)
            .encode(&record)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownDictionary { dictionary: 9, .. }));

        let record = BioRecord::new(1, 99, 1);
        let err = RecordEncoder::new(&reg)
            .validated(true)
            .encode(&record)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownObject {
                dictionary: 1,
                code: 99,
                ..
            }
        ));
    }

    #[test]
    fn lenient_mode_omits_unknown_schemas() {
        let reg = registry();
        let record = BioRecord::new(9, 10, 1).with("greeting", "hi");
        assert_eq!(RecordEncoder::new(&reg).encode(&record).unwrap(), None);
    }

    #[test]
    fn container_mismatch_is_fatal() {
        let reg = registry();
        let (encoder, _) = codec(&reg);
        let record = BioRecord::new(1, 20, 1)
            .with_name("vector")
            .with("xs", 7_i32);
        let err = encoder.encode(&record).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn type_mismatch_is_fatal() {
        let reg = registry();
        let (encoder, _) = codec(&reg);
        let record = BioRecord::new(1, 30, 2)
            .with_name("session")
            .with("id", 7_i32); // declared Long
        let err = encoder.encode(&record).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn enum_ordinals_map_through_the_dictionary() {
        let reg = registry();
        let (encoder, decoder) = codec(&reg);
        let record = BioRecord::new(1, 30, 2)
            .with_name("session")
            .with("status", BioEnum::new(3, "STALE"));
        let bytes = encoder.encode(&record).unwrap().unwrap();
        // Enum scalar payload is a plain 4-byte ordinal
        assert_eq!(&bytes[5..], [0x0B, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x03]);
        let decoded = decoder.decode(&bytes).unwrap().unwrap();
        assert_eq!(
            decoded.get("status").unwrap().enum_value().unwrap(),
            &BioEnum::new(3, "STALE")
        );
    }

    #[test]
    fn unresolvable_enum_ordinals_are_dropped() {
        let reg = registry();
        let (encoder, decoder) = codec(&reg);
        let record = BioRecord::new(1, 30, 2)
            .with_name("session")
            .with("status", BioEnum::new(40, "FUTURE"))
            .with("id", 1_i64);
        let bytes = encoder.encode(&record).unwrap().unwrap();
        let decoded = decoder.decode(&bytes).unwrap().unwrap();
        assert!(decoded.get("status").is_none());
        assert_eq!(decoded.get("id"), Some(&Value::from(1_i64)));
    }

    #[test]
    fn nested_record_of_unknown_dictionary_omits_the_tag() {
        let reg = registry();
        let (encoder, decoder) = codec(&reg);
        let stray = BioRecord::new(9, 10, 1).with("greeting", "hi");
        let record = BioRecord::new(1, 30, 2)
            .with_name("session")
            .with("child", stray)
            .with("id", 3_i64);
        let bytes = encoder.encode(&record).unwrap().unwrap();
        let decoded = decoder.decode(&bytes).unwrap().unwrap();
        assert!(decoded.get("child").is_none());
        assert_eq!(decoded.get("id"), Some(&Value::from(3_i64)));
    }
}
