//! The schema-less properties lane.
//!
//! A properties record (`code == 0 && version == 0`) bypasses the
//! dictionary: after the 5-byte header, the body is a run of
//! `[key: utf][type: u8][container: u8][payload]` entries, keys carried by
//! name instead of tag code. Values use the same payload machinery as the
//! record codec; enums are rejected since an ordinal is meaningless
//! without a schema.

use bio_core::{BioRecord, Container, RecordHead, Scalar, SchemaRegistry, Seq, TypeTag, Value};
use bio_encoding::{ReadStream, WriteStream};
use snafu::{ensure, OptionExt, ResultExt};

use crate::error::{
    DecodeRecordSnafu, DecodeValueSnafu, EncodeRecordSnafu, EncodeValueSnafu,
    InvalidContainerSnafu, InvalidTypeTagSnafu, Result, UnsupportedTypeSnafu,
};
use crate::factory::RecordFactory;
use crate::record::{write_plain_elements, write_plain_scalar, RecordDecoder, RecordEncoder};

const OBJECT: &str = "properties";

pub(crate) fn write_properties<D>(
    enc: &RecordEncoder<'_, D>,
    out: &mut WriteStream,
    record: &BioRecord,
) -> Result<()>
where
    D: SchemaRegistry,
{
    out.write_u8(record.dictionary())
        .and_then(|()| out.write_u16(0))
        .and_then(|()| out.write_u16(0))
        .context(EncodeRecordSnafu { object: OBJECT })?;
    for (key, value) in record.iter() {
        let (ty, container) = match (value.type_tag(), value.container()) {
            (Some(ty), Some(container)) => (ty, container),
            // dynamic expressions are never carried
            _ => continue,
        };
        ensure!(
            ty != TypeTag::Enum,
            UnsupportedTypeSnafu {
                tag: key,
                ty,
                container,
            }
        );
        match value {
            Value::Scalar(Scalar::Object(nested)) => {
                let bytes = match enc.nested_record_bytes(nested)? {
                    Some(b) => b,
                    None => continue,
                };
                write_entry_head(out, key, ty, container)?;
                out.write_blob(&bytes).context(EncodeValueSnafu {
                    tag: key,
                    object: OBJECT,
                })?;
            }
            Value::Scalar(Scalar::Properties(nested)) => {
                let bytes = enc.properties_bytes(nested)?;
                write_entry_head(out, key, ty, container)?;
                out.write_blob(&bytes).context(EncodeValueSnafu {
                    tag: key,
                    object: OBJECT,
                })?;
            }
            Value::Scalar(scalar) => {
                write_entry_head(out, key, ty, container)?;
                write_plain_scalar(out, scalar).context(EncodeValueSnafu {
                    tag: key,
                    object: OBJECT,
                })?;
            }
            Value::Array(Seq::Object(items)) | Value::List(Seq::Object(items)) => {
                let mut blobs = Vec::with_capacity(items.len());
                for nested in items {
                    if let Some(bytes) = enc.nested_record_bytes(nested)? {
                        blobs.push(bytes);
                    }
                }
                write_entry_head(out, key, ty, container)?;
                write_blobs(out, key, &blobs)?;
            }
            Value::Array(Seq::Properties(items)) | Value::List(Seq::Properties(items)) => {
                let mut blobs = Vec::with_capacity(items.len());
                for nested in items {
                    blobs.push(enc.properties_bytes(nested)?);
                }
                write_entry_head(out, key, ty, container)?;
                write_blobs(out, key, &blobs)?;
            }
            Value::Array(seq) | Value::List(seq) => {
                write_entry_head(out, key, ty, container)?;
                write_plain_elements(out, seq).context(EncodeValueSnafu {
                    tag: key,
                    object: OBJECT,
                })?;
            }
            Value::Dynamic(_) => continue,
        }
    }
    Ok(())
}

fn write_entry_head(
    out: &mut WriteStream,
    key: &str,
    ty: TypeTag,
    container: Container,
) -> Result<()> {
    out.write_utf(key)
        .and_then(|()| out.write_u8(ty as u8))
        .and_then(|()| out.write_u8(container as u8))
        .context(EncodeValueSnafu {
            tag: key,
            object: OBJECT,
        })
}

fn write_blobs(out: &mut WriteStream, key: &str, blobs: &[Vec<u8>]) -> Result<()> {
    out.write_length(blobs.len()).context(EncodeValueSnafu {
        tag: key,
        object: OBJECT,
    })?;
    for bytes in blobs {
        out.write_blob(bytes).context(EncodeValueSnafu {
            tag: key,
            object: OBJECT,
        })?;
    }
    Ok(())
}

pub(crate) fn read_properties<D, F>(
    dec: &RecordDecoder<'_, D, F>,
    input: &mut ReadStream<'_>,
    head: RecordHead,
) -> Result<BioRecord>
where
    D: SchemaRegistry,
    F: RecordFactory,
{
    let mut record = BioRecord::properties(head.dictionary);
    while input.available() > 0 {
        let key = input.read_utf().context(DecodeRecordSnafu { object: OBJECT })?;
        let position = input.position();
        let ty_raw = input.read_u8().context(DecodeValueSnafu {
            tag: key.as_str(),
            object: OBJECT,
        })?;
        let ty = TypeTag::from_u8(ty_raw).context(InvalidTypeTagSnafu {
            value: ty_raw,
            position,
        })?;
        let container_raw = input.read_u8().context(DecodeValueSnafu {
            tag: key.as_str(),
            object: OBJECT,
        })?;
        let container = Container::from_u8(container_raw).context(InvalidContainerSnafu {
            value: container_raw,
            position,
        })?;
        ensure!(
            ty != TypeTag::Enum,
            UnsupportedTypeSnafu {
                tag: key.as_str(),
                ty,
                container,
            }
        );
        if let Some(value) = dec.read_value(input, OBJECT, &key, None, ty, container)? {
            record.put(key, value);
        }
    }
    Ok(record)
}
