//! The outer frame codec: the flag byte, optional compression and
//! encryption, the array/list wrappers, and the lossless XML lane.
//!
//! The frame layout is
//! `[flag: u8]` followed by either `[origLen: u32][compressed payload]`
//! when the compressed bit is set, or the raw payload. An array or list
//! payload is `[count: u16]` followed by each element framed as a
//! length-prefixed blob.

use std::borrow::Cow;

use bio_core::{BioRecord, SchemaRegistry};
use bio_encoding::{Compressor, Deflate, Encrypter, ReadStream, WriteStream, XmlBridge};
use snafu::{ensure, OptionExt, ResultExt};

use crate::error::{
    CompressSnafu, DecompressSnafu, DecryptSnafu, EncryptSnafu, NoEncrypterSnafu, NoXmlBridgeSnafu,
    OversizedFrameSnafu, ReadFrameSnafu, Result, TooManyElementsSnafu, WriteFrameSnafu, XmlSnafu,
};
use crate::record::{RecordDecoder, RecordEncoder};

/// Frame flag: the payload is compressed and preceded by its original
/// length.
pub const FLAG_COMPRESSED: u8 = 0x01;
/// Frame flag: the payload is a count-prefixed array of records.
pub const FLAG_ARRAY: u8 = 0x02;
/// Frame flag: the payload is a count-prefixed list of records.
pub const FLAG_LIST: u8 = 0x04;
/// Frame flag: the payload is encrypted.
pub const FLAG_ENCRYPTED: u8 = 0x08;
/// Frame flag: the payload carries the textual (lossless) representation.
pub const FLAG_XML: u8 = 0x10;

/// The shape of a frame's content: a single record, an array, or a list of
/// records of the same schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// One record.
    Single(BioRecord),
    /// A homogeneous array of records.
    Array(Vec<BioRecord>),
    /// A homogeneous list of records.
    List(Vec<BioRecord>),
}

impl From<BioRecord> for Payload {
    fn from(record: BioRecord) -> Self {
        Payload::Single(record)
    }
}

/// The top-level codec, turning payloads into self-framing byte blobs and
/// back.
///
/// A codec instance carries its configuration (the compressed, encrypted,
/// lossless and validated switches, plus the pluggable compressor,
/// encrypter and XML bridge) but no per-call state; two instances may run
/// on two threads against the same registry.
#[derive(Debug)]
pub struct BioCodec<D> {
    dict: D,
    compressed: bool,
    encrypted: bool,
    lossless: bool,
    validated: bool,
    compressor: Box<dyn Compressor>,
    encrypter: Option<Box<dyn Encrypter>>,
    xml: Option<Box<dyn XmlBridge>>,
}

impl<D> BioCodec<D>
where
    D: SchemaRegistry,
{
    /// Create a codec over the given registry with every switch off and the
    /// default Deflate compressor.
    pub fn new(dict: D) -> Self {
        BioCodec {
            dict,
            compressed: false,
            encrypted: false,
            lossless: false,
            validated: false,
            compressor: Box::new(Deflate),
            encrypter: None,
            xml: None,
        }
    }

    /// Request compression of encoded frames, builder style. Compression is
    /// kept only when it actually pays for its length prefix.
    pub fn compressed(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    /// Request encryption of encoded frames, builder style.
    pub fn encrypted(mut self, encrypted: bool) -> Self {
        self.encrypted = encrypted;
        self
    }

    /// Select the lossless (XML) lane, builder style.
    pub fn lossless(mut self, lossless: bool) -> Self {
        self.lossless = lossless;
        self
    }

    /// Set strict schema validation, builder style. A validated codec fails
    /// on unknown dictionaries and objects instead of omitting them.
    pub fn validated(mut self, validated: bool) -> Self {
        self.validated = validated;
        self
    }

    /// Replace the compressor, builder style.
    pub fn with_compressor(mut self, compressor: Box<dyn Compressor>) -> Self {
        self.compressor = compressor;
        self
    }

    /// Install an encrypter, builder style.
    pub fn with_encrypter(mut self, encrypter: Box<dyn Encrypter>) -> Self {
        self.encrypter = Some(encrypter);
        self
    }

    /// Install the XML bridge backing the lossless lane, builder style.
    pub fn with_xml_bridge(mut self, bridge: Box<dyn XmlBridge>) -> Self {
        self.xml = Some(bridge);
        self
    }

    /// Encode a payload into a self-framing byte blob.
    pub fn encode(&self, payload: &Payload) -> Result<Vec<u8>> {
        let mut flag = 0u8;
        if self.lossless {
            flag |= FLAG_XML;
        }
        let inner = match payload {
            Payload::Single(record) => self.encode_single(record)?,
            Payload::Array(records) => {
                flag |= FLAG_ARRAY;
                self.encode_elements(records)?
            }
            Payload::List(records) => {
                flag |= FLAG_LIST;
                self.encode_elements(records)?
            }
        };
        let inner = if self.encrypted {
            flag |= FLAG_ENCRYPTED;
            self.encrypter
                .as_deref()
                .context(NoEncrypterSnafu)?
                .encrypt(&inner)
                .context(EncryptSnafu)?
        } else {
            inner
        };
        let mut out = WriteStream::with_capacity(inner.len() + 5);
        if self.compressed {
            let packed = self.compressor.compress(&inner).context(CompressSnafu)?;
            // compression is kept only when it also covers the 4-byte
            // original-length prefix
            if packed.len() + 4 < inner.len() {
                let original = u32::try_from(inner.len())
                    .ok()
                    .context(OversizedFrameSnafu { len: inner.len() })?;
                out.write_u8(flag | FLAG_COMPRESSED)
                    .and_then(|()| out.write_u32(original))
                    .context(WriteFrameSnafu)?;
                out.write_bytes(&packed);
                return Ok(out.into_bytes());
            }
        }
        out.write_u8(flag).context(WriteFrameSnafu)?;
        out.write_bytes(&inner);
        Ok(out.into_bytes())
    }

    /// Decode a self-framing byte blob back into its payload.
    ///
    /// Returns `None` for a frame whose single record was omitted by a
    /// lenient encoder or dropped by this lenient decoder.
    pub fn decode(&self, bytes: &[u8]) -> Result<Option<Payload>> {
        let mut input = ReadStream::new(bytes);
        let flag = input.read_u8().context(ReadFrameSnafu)?;
        let payload: Cow<'_, [u8]> = if flag & FLAG_COMPRESSED != 0 {
            let original = input.read_u32().context(ReadFrameSnafu)? as usize;
            let packed = input.read_remaining();
            Cow::Owned(
                self.compressor
                    .decompress(packed, original)
                    .context(DecompressSnafu)?,
            )
        } else {
            Cow::Borrowed(input.read_remaining())
        };
        let payload: Cow<'_, [u8]> = if flag & FLAG_ENCRYPTED != 0 {
            Cow::Owned(
                self.encrypter
                    .as_deref()
                    .context(NoEncrypterSnafu)?
                    .decrypt(&payload)
                    .context(DecryptSnafu)?,
            )
        } else {
            payload
        };
        let xml = flag & FLAG_XML != 0;
        let mut inner = ReadStream::new(&payload);
        if flag & FLAG_ARRAY != 0 {
            self.decode_elements(&mut inner, xml)
                .map(|items| Some(Payload::Array(items)))
        } else if flag & FLAG_LIST != 0 {
            self.decode_elements(&mut inner, xml)
                .map(|items| Some(Payload::List(items)))
        } else {
            self.decode_single(&mut inner, xml)
                .map(|record| record.map(Payload::Single))
        }
    }

    fn bridge(&self) -> Result<&dyn XmlBridge> {
        self.xml.as_deref().context(NoXmlBridgeSnafu)
    }

    fn encode_single(&self, record: &BioRecord) -> Result<Vec<u8>> {
        if self.lossless {
            let xml = self.bridge()?.to_xml(record).context(XmlSnafu)?;
            return Ok(xml.into_bytes());
        }
        let encoder = RecordEncoder::new(&self.dict).validated(self.validated);
        Ok(encoder.encode(record)?.unwrap_or_default())
    }

    fn encode_elements(&self, records: &[BioRecord]) -> Result<Vec<u8>> {
        let mut out = WriteStream::new();
        if self.lossless {
            ensure!(
                records.len() <= usize::from(u16::MAX),
                TooManyElementsSnafu {
                    count: records.len(),
                }
            );
            out.write_u16(records.len() as u16).context(WriteFrameSnafu)?;
            for record in records {
                let xml = self.bridge()?.to_xml(record).context(XmlSnafu)?;
                out.write_blob(xml.as_bytes()).context(WriteFrameSnafu)?;
            }
            return Ok(out.into_bytes());
        }
        let encoder = RecordEncoder::new(&self.dict).validated(self.validated);
        let mut elements = Vec::with_capacity(records.len());
        for record in records {
            if let Some(bytes) = encoder.encode(record)? {
                let large = self
                    .dict
                    .obj_by_code(record.dictionary(), record.code())
                    .map_or(false, |obj| obj.large);
                elements.push((bytes, large));
            }
        }
        ensure!(
            elements.len() <= usize::from(u16::MAX),
            TooManyElementsSnafu {
                count: elements.len(),
            }
        );
        out.write_u16(elements.len() as u16).context(WriteFrameSnafu)?;
        for (bytes, large) in &elements {
            // element framing follows the element object's length width
            let previous = out.set_length_as_int(*large);
            let outcome = out.write_blob(bytes);
            out.set_length_as_int(previous);
            outcome.context(WriteFrameSnafu)?;
        }
        Ok(out.into_bytes())
    }

    fn decode_single(&self, input: &mut ReadStream<'_>, xml: bool) -> Result<Option<BioRecord>> {
        if input.available() == 0 {
            return Ok(None);
        }
        if xml {
            let bytes = input.read_remaining();
            return self.bridge()?.from_xml(bytes).context(XmlSnafu).map(Some);
        }
        let decoder = RecordDecoder::new(&self.dict).validated(self.validated);
        decoder.read_record(input)
    }

    fn decode_elements(&self, input: &mut ReadStream<'_>, xml: bool) -> Result<Vec<BioRecord>> {
        let count = usize::from(input.read_u16().context(ReadFrameSnafu)?);
        let decoder = RecordDecoder::new(&self.dict).validated(self.validated);
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            if xml {
                let blob = input.read_blob().context(ReadFrameSnafu)?;
                items.push(self.bridge()?.from_xml(blob).context(XmlSnafu)?);
            } else {
                let large = self.element_is_large(input);
                let previous = input.set_length_as_int(large);
                let blob = input.read_blob();
                input.set_length_as_int(previous);
                let mut sub = ReadStream::new(blob.context(ReadFrameSnafu)?);
                if let Some(record) = decoder.read_record(&mut sub)? {
                    items.push(record);
                }
            }
        }
        Ok(items)
    }

    /// Recover the length width the encoder used for the next element's
    /// framing. Both sides share the schemas out-of-band, so peeking the
    /// candidate record header behind each width and asking the registry
    /// reproduces the encoder's choice; unknown objects default to the
    /// 2-byte width, which is also what a lenient encoder emits.
    fn element_is_large(&self, input: &ReadStream<'_>) -> bool {
        if let Some(head) = input.peek(2, 5) {
            let code = u16::from_be_bytes([head[1], head[2]]);
            let version = u16::from_be_bytes([head[3], head[4]]);
            if code == 0 && version == 0 {
                // properties records have no object, always default framing
                return false;
            }
            if let Some(obj) = self.dict.obj_by_code(head[0], code) {
                if !obj.large {
                    return false;
                }
            }
        }
        if let Some(head) = input.peek(4, 5) {
            let code = u16::from_be_bytes([head[1], head[2]]);
            if let Some(obj) = self.dict.obj_by_code(head[0], code) {
                if obj.large {
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use bio_core::{BioDictionary, Dictionary, ObjDef, Scalar, TagDef, TypeTag, Value};

    use super::*;

    fn registry() -> BioDictionary {
        BioDictionary::new().with_dictionary(
            Dictionary::new(1)
                .with_object(
                    ObjDef::new(1, 10, 1, "greeting")
                        .with_tag(TagDef::new(1, "greeting", TypeTag::Utf)),
                )
                .with_object(
                    ObjDef::new(1, 40, 1, "bulk")
                        .large()
                        .with_tag(TagDef::new(1, "data", TypeTag::Opaque)),
                ),
        )
    }

    fn greeting(text: &str) -> BioRecord {
        BioRecord::new(1, 10, 1)
            .with_name("greeting")
            .with("greeting", text)
    }

    #[test]
    fn single_record_frame_layout() {
        let reg = registry();
        let codec = BioCodec::new(&reg);
        let bytes = codec.encode(&Payload::Single(greeting("hi"))).unwrap();
        assert_eq!(
            bytes,
            [
                0x00, // flag
                0x01, 0x00, 0x0A, 0x00, 0x01, // dictionary, code, version
                0x09, 0x00, 0x00, 0x01, // Utf scalar under tag 1
                0x00, 0x02, b'h', b'i',
            ]
        );
        let decoded = codec.decode(&bytes).unwrap().unwrap();
        assert_eq!(decoded, Payload::Single(greeting("hi")));
    }

    #[test]
    fn array_and_list_frames_round_trip() {
        let reg = registry();
        let codec = BioCodec::new(&reg);
        let records = vec![greeting("a"), greeting("b")];

        let bytes = codec.encode(&Payload::Array(records.clone())).unwrap();
        assert_eq!(bytes[0], FLAG_ARRAY);
        assert_eq!(&bytes[1..3], [0x00, 0x02]);
        assert_eq!(
            codec.decode(&bytes).unwrap().unwrap(),
            Payload::Array(records.clone())
        );

        let bytes = codec.encode(&Payload::List(records.clone())).unwrap();
        assert_eq!(bytes[0], FLAG_LIST);
        assert_eq!(
            codec.decode(&bytes).unwrap().unwrap(),
            Payload::List(records)
        );
    }

    #[test]
    fn lenient_arrays_omit_unknown_elements() {
        let reg = registry();
        let codec = BioCodec::new(&reg);
        let stray = BioRecord::new(9, 10, 1).with("greeting", "lost");
        let bytes = codec
            .encode(&Payload::Array(vec![greeting("kept"), stray]))
            .unwrap();
        assert_eq!(&bytes[1..3], [0x00, 0x01]);
        assert_eq!(
            codec.decode(&bytes).unwrap().unwrap(),
            Payload::Array(vec![greeting("kept")])
        );
    }

    #[test]
    fn empty_single_frame_decodes_to_none() {
        let reg = registry();
        let codec = BioCodec::new(&reg);
        let stray = BioRecord::new(9, 10, 1);
        let bytes = codec.encode(&Payload::Single(stray)).unwrap();
        assert_eq!(bytes, [0x00]);
        assert_eq!(codec.decode(&bytes).unwrap(), None);
    }

    #[test]
    fn compression_is_kept_only_when_it_pays() {
        let reg = registry();
        let plain = BioCodec::new(&reg);
        let packed = BioCodec::new(&reg).compressed(true);

        let big = BioRecord::new(1, 40, 1)
            .with_name("bulk")
            .with("data", Value::Scalar(Scalar::Opaque(vec![0u8; 1024])));
        let raw = plain.encode(&Payload::Single(big.clone())).unwrap();
        let compressed = packed.encode(&Payload::Single(big.clone())).unwrap();
        assert_eq!(compressed[0] & FLAG_COMPRESSED, FLAG_COMPRESSED);
        assert!(compressed.len() < raw.len());
        let original = u32::from_be_bytes([
            compressed[1],
            compressed[2],
            compressed[3],
            compressed[4],
        ]);
        assert_eq!(original as usize, raw.len() - 1);
        assert_eq!(
            packed.decode(&compressed).unwrap().unwrap(),
            Payload::Single(big)
        );

        // a tiny frame cannot beat the 4-byte length prefix
        let small = greeting("x");
        let raw = plain.encode(&Payload::Single(small.clone())).unwrap();
        let attempted = packed.encode(&Payload::Single(small)).unwrap();
        assert_eq!(attempted, raw);
        assert_eq!(attempted[0] & FLAG_COMPRESSED, 0);
    }

    #[test]
    fn large_objects_use_wide_framing() {
        let reg = registry();
        let codec = BioCodec::new(&reg);
        let big = BioRecord::new(1, 40, 1)
            .with_name("bulk")
            .with("data", Value::Scalar(Scalar::Opaque(vec![0xAB; 70_000])));

        // single: the in-record blob length needs 4 bytes
        let bytes = codec.encode(&Payload::Single(big.clone())).unwrap();
        assert_eq!(
            codec.decode(&bytes).unwrap().unwrap(),
            Payload::Single(big.clone())
        );

        // array: the element framing needs 4 bytes too
        let bytes = codec
            .encode(&Payload::Array(vec![big.clone(), greeting("mix")]))
            .unwrap();
        assert_eq!(
            codec.decode(&bytes).unwrap().unwrap(),
            Payload::Array(vec![big, greeting("mix")])
        );
    }
}
