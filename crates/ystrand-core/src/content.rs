//! Item content payloads and their V1 encoding

use ystrand_codec::Any;

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{Error, Result};

pub const BLOCK_GC_REF_NUMBER: u8 = 0;
pub const BLOCK_ITEM_DELETED_REF_NUMBER: u8 = 1;
pub const BLOCK_ITEM_JSON_REF_NUMBER: u8 = 2;
pub const BLOCK_ITEM_BINARY_REF_NUMBER: u8 = 3;
pub const BLOCK_ITEM_STRING_REF_NUMBER: u8 = 4;
pub const BLOCK_ITEM_EMBED_REF_NUMBER: u8 = 5;
pub const BLOCK_ITEM_FORMAT_REF_NUMBER: u8 = 6;
pub const BLOCK_ITEM_TYPE_REF_NUMBER: u8 = 7;
pub const BLOCK_ITEM_ANY_REF_NUMBER: u8 = 8;
pub const BLOCK_ITEM_DOC_REF_NUMBER: u8 = 9;
pub const BLOCK_SKIP_REF_NUMBER: u8 = 10;
pub const BLOCK_ITEM_MOVE_REF_NUMBER: u8 = 11;

/// Unit used to measure content length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetKind {
    /// UTF-8 bytes
    Bytes,
    /// UTF-16 code units, the unit clocks are counted in
    Utf16,
}

pub const TYPE_REFS_ARRAY: u8 = 0;
pub const TYPE_REFS_MAP: u8 = 1;
pub const TYPE_REFS_TEXT: u8 = 2;
pub const TYPE_REFS_XML_ELEMENT: u8 = 3;
pub const TYPE_REFS_XML_FRAGMENT: u8 = 4;
pub const TYPE_REFS_XML_HOOK: u8 = 5;
pub const TYPE_REFS_XML_TEXT: u8 = 6;

/// Kind of shared type created by a type item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Array,
    Map,
    Text,
    XmlElement(String),
    XmlFragment,
    XmlHook(String),
    XmlText,
}

impl TypeRef {
    pub fn kind(&self) -> u8 {
        match self {
            TypeRef::Array => TYPE_REFS_ARRAY,
            TypeRef::Map => TYPE_REFS_MAP,
            TypeRef::Text => TYPE_REFS_TEXT,
            TypeRef::XmlElement(_) => TYPE_REFS_XML_ELEMENT,
            TypeRef::XmlFragment => TYPE_REFS_XML_FRAGMENT,
            TypeRef::XmlHook(_) => TYPE_REFS_XML_HOOK,
            TypeRef::XmlText => TYPE_REFS_XML_TEXT,
        }
    }

    pub fn encode<E: Encoder>(&self, encoder: &mut E) {
        encoder.write_type_ref(self.kind());
        match self {
            TypeRef::XmlElement(name) | TypeRef::XmlHook(name) => encoder.write_key(name),
            _ => {}
        }
    }

    pub fn decode<D: Decoder>(decoder: &mut D) -> Result<Self> {
        match decoder.read_type_ref()? {
            TYPE_REFS_ARRAY => Ok(TypeRef::Array),
            TYPE_REFS_MAP => Ok(TypeRef::Map),
            TYPE_REFS_TEXT => Ok(TypeRef::Text),
            TYPE_REFS_XML_ELEMENT => Ok(TypeRef::XmlElement(decoder.read_key()?)),
            TYPE_REFS_XML_FRAGMENT => Ok(TypeRef::XmlFragment),
            TYPE_REFS_XML_HOOK => Ok(TypeRef::XmlHook(decoder.read_key()?)),
            TYPE_REFS_XML_TEXT => Ok(TypeRef::XmlText),
            other => {
                decoder.exhaust();
                Err(Error::UnknownTypeRef(other))
            }
        }
    }
}

/// Payload of an item
#[derive(Debug, Clone, PartialEq)]
pub enum ItemContent {
    /// Tombstone for `n` deleted clocks
    Deleted(u32),
    Json(Vec<serde_json::Value>),
    Binary(Vec<u8>),
    String(String),
    Embed(serde_json::Value),
    Format {
        key: String,
        value: serde_json::Value,
    },
    Type(TypeRef),
    Any(Vec<Any>),
    /// Subdocument reference
    Doc { guid: String, opts: Any },
    /// Range move. Only its ref number is known.
    Move,
}

impl ItemContent {
    pub fn ref_number(&self) -> u8 {
        match self {
            ItemContent::Deleted(_) => BLOCK_ITEM_DELETED_REF_NUMBER,
            ItemContent::Json(_) => BLOCK_ITEM_JSON_REF_NUMBER,
            ItemContent::Binary(_) => BLOCK_ITEM_BINARY_REF_NUMBER,
            ItemContent::String(_) => BLOCK_ITEM_STRING_REF_NUMBER,
            ItemContent::Embed(_) => BLOCK_ITEM_EMBED_REF_NUMBER,
            ItemContent::Format { .. } => BLOCK_ITEM_FORMAT_REF_NUMBER,
            ItemContent::Type(_) => BLOCK_ITEM_TYPE_REF_NUMBER,
            ItemContent::Any(_) => BLOCK_ITEM_ANY_REF_NUMBER,
            ItemContent::Doc { .. } => BLOCK_ITEM_DOC_REF_NUMBER,
            ItemContent::Move => BLOCK_ITEM_MOVE_REF_NUMBER,
        }
    }

    /// Whether the content counts towards the length of its parent type
    pub fn is_countable(&self) -> bool {
        !matches!(
            self,
            ItemContent::Deleted(_) | ItemContent::Format { .. } | ItemContent::Move
        )
    }

    /// Number of clocks (for `Utf16`) the content occupies
    pub fn len(&self, kind: OffsetKind) -> u32 {
        match self {
            ItemContent::Deleted(len) => *len,
            ItemContent::Json(values) => values.len() as u32,
            ItemContent::Any(values) => values.len() as u32,
            ItemContent::String(s) => match kind {
                OffsetKind::Bytes => s.len() as u32,
                OffsetKind::Utf16 => s.encode_utf16().count() as u32,
            },
            _ => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len(OffsetKind::Utf16) == 0
    }

    /// Whether the content can be written starting `offset` clocks in
    pub fn check_offset(&self, offset: u32) -> Result<()> {
        if let ItemContent::Move = self {
            return Err(Error::UnsupportedContent(BLOCK_ITEM_MOVE_REF_NUMBER));
        }
        let len = self.len(OffsetKind::Utf16);
        if offset > len || (offset > 0 && !self.is_sliceable()) {
            return Err(Error::InvalidOffset { offset, len });
        }
        Ok(())
    }

    /// Write the content, skipping its first `offset` clocks
    pub fn encode<E: Encoder>(&self, encoder: &mut E, offset: u32) -> Result<()> {
        self.check_offset(offset)?;
        let len = self.len(OffsetKind::Utf16);
        let skip = offset as usize;

        match self {
            ItemContent::Deleted(len) => encoder.write_len(len - offset),
            ItemContent::Json(values) => {
                encoder.write_len(len - offset);
                for value in &values[skip..] {
                    encoder.write_json(value)?;
                }
            }
            ItemContent::Binary(buf) => encoder.write_buf(buf),
            ItemContent::String(s) => {
                if offset == 0 {
                    encoder.write_string(s);
                } else {
                    let units: Vec<u16> = s.encode_utf16().skip(skip).collect();
                    encoder.write_string(&String::from_utf16_lossy(&units));
                }
            }
            ItemContent::Embed(value) => encoder.write_json(value)?,
            ItemContent::Format { key, value } => {
                encoder.write_key(key);
                encoder.write_json(value)?;
            }
            ItemContent::Type(type_ref) => type_ref.encode(encoder),
            ItemContent::Any(values) => {
                encoder.write_len(len - offset);
                for value in &values[skip..] {
                    encoder.write_any(value);
                }
            }
            ItemContent::Doc { guid, opts } => {
                encoder.write_string(guid);
                encoder.write_any(opts);
            }
            ItemContent::Move => return Err(Error::UnsupportedContent(BLOCK_ITEM_MOVE_REF_NUMBER)),
        }
        Ok(())
    }

    /// Read the payload of an item whose info byte carried `ref_number`
    pub fn decode<D: Decoder>(decoder: &mut D, ref_number: u8) -> Result<Self> {
        match ref_number {
            BLOCK_ITEM_DELETED_REF_NUMBER => Ok(ItemContent::Deleted(decoder.read_len()?)),
            BLOCK_ITEM_JSON_REF_NUMBER => {
                let len = decoder.read_len()?;
                let mut values = Vec::new();
                for _ in 0..len {
                    let json = decoder.read_string()?;
                    // undefined has no JSON form
                    if json == "undefined" {
                        values.push(serde_json::Value::Null);
                        continue;
                    }
                    match serde_json::from_str(&json) {
                        Ok(value) => values.push(value),
                        Err(e) => {
                            decoder.exhaust();
                            return Err(e.into());
                        }
                    }
                }
                Ok(ItemContent::Json(values))
            }
            BLOCK_ITEM_BINARY_REF_NUMBER => Ok(ItemContent::Binary(decoder.read_buf()?)),
            BLOCK_ITEM_STRING_REF_NUMBER => Ok(ItemContent::String(decoder.read_string()?)),
            BLOCK_ITEM_EMBED_REF_NUMBER => Ok(ItemContent::Embed(decoder.read_json()?)),
            BLOCK_ITEM_FORMAT_REF_NUMBER => {
                let key = decoder.read_key()?;
                let value = decoder.read_json()?;
                Ok(ItemContent::Format { key, value })
            }
            BLOCK_ITEM_TYPE_REF_NUMBER => Ok(ItemContent::Type(TypeRef::decode(decoder)?)),
            BLOCK_ITEM_ANY_REF_NUMBER => {
                let len = decoder.read_len()?;
                let mut values = Vec::new();
                for _ in 0..len {
                    values.push(decoder.read_any()?);
                }
                Ok(ItemContent::Any(values))
            }
            BLOCK_ITEM_DOC_REF_NUMBER => {
                let guid = decoder.read_string()?;
                let opts = decoder.read_any()?;
                Ok(ItemContent::Doc { guid, opts })
            }
            BLOCK_ITEM_MOVE_REF_NUMBER => {
                decoder.exhaust();
                Err(Error::UnsupportedContent(ref_number))
            }
            other => {
                decoder.exhaust();
                Err(Error::UnknownRefNumber(other))
            }
        }
    }

    fn is_sliceable(&self) -> bool {
        matches!(
            self,
            ItemContent::Deleted(_)
                | ItemContent::Json(_)
                | ItemContent::Any(_)
                | ItemContent::String(_)
        )
    }
}

impl From<&str> for ItemContent {
    fn from(s: &str) -> Self {
        ItemContent::String(s.to_string())
    }
}

impl From<Vec<Any>> for ItemContent {
    fn from(values: Vec<Any>) -> Self {
        ItemContent::Any(values)
    }
}

impl From<TypeRef> for ItemContent {
    fn from(type_ref: TypeRef) -> Self {
        ItemContent::Type(type_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::DecoderV1;
    use crate::encoder::EncoderV1;
    use ystrand_codec::Read;

    fn encode(content: &ItemContent, offset: u32) -> Result<Vec<u8>> {
        let mut encoder = EncoderV1::new();
        content.encode(&mut encoder, offset)?;
        Ok(encoder.to_bytes().to_vec())
    }

    fn round_trip(content: ItemContent) {
        let data = encode(&content, 0).unwrap();
        let mut decoder = DecoderV1::new(&data);
        assert_eq!(
            ItemContent::decode(&mut decoder, content.ref_number()).unwrap(),
            content
        );
        assert!(!decoder.has_content());
    }

    #[test]
    fn test_countable_kinds() {
        assert!(ItemContent::from("a").is_countable());
        assert!(ItemContent::Any(vec![]).is_countable());
        assert!(ItemContent::Binary(vec![1]).is_countable());
        assert!(ItemContent::Type(TypeRef::Map).is_countable());
        assert!(!ItemContent::Deleted(3).is_countable());
        assert!(!ItemContent::Move.is_countable());
        assert!(!ItemContent::Format {
            key: "bold".into(),
            value: serde_json::Value::Bool(true)
        }
        .is_countable());
    }

    #[test]
    fn test_string_length_units() {
        let content = ItemContent::from("a𐐷中");
        assert_eq!(content.len(OffsetKind::Utf16), 4);
        assert_eq!(content.len(OffsetKind::Bytes), 8);
        assert_eq!(ItemContent::Binary(vec![1, 2, 3]).len(OffsetKind::Utf16), 1);
    }

    #[test]
    fn test_encode_string_with_offset() {
        let content = ItemContent::from("hello");
        assert_eq!(encode(&content, 0).unwrap(), b"\x05hello");
        assert_eq!(encode(&content, 2).unwrap(), b"\x03llo");
        assert_eq!(encode(&content, 5).unwrap(), b"\x00");
        assert!(matches!(
            encode(&content, 6),
            Err(Error::InvalidOffset { offset: 6, len: 5 })
        ));
    }

    #[test]
    fn test_encode_deleted_and_any_with_offset() {
        assert_eq!(encode(&ItemContent::Deleted(5), 2).unwrap(), [0x03]);
        let content = ItemContent::Any(vec![Any::Integer(1), Any::Null, Any::Bool(true)]);
        assert_eq!(encode(&content, 1).unwrap(), [0x02, 0x7e, 0x78]);
    }

    #[test]
    fn test_offset_on_unit_content_is_invalid() {
        assert!(matches!(
            encode(&ItemContent::Binary(vec![1]), 1),
            Err(Error::InvalidOffset { .. })
        ));
    }

    #[test]
    fn test_move_has_no_encoding() {
        assert!(matches!(
            encode(&ItemContent::Move, 0),
            Err(Error::UnsupportedContent(BLOCK_ITEM_MOVE_REF_NUMBER))
        ));
        let mut decoder = DecoderV1::new(&[0x00]);
        assert!(matches!(
            ItemContent::decode(&mut decoder, BLOCK_ITEM_MOVE_REF_NUMBER),
            Err(Error::UnsupportedContent(11))
        ));
    }

    #[test]
    fn test_content_round_trips() {
        round_trip(ItemContent::Deleted(42));
        round_trip(ItemContent::Json(vec![
            serde_json::json!({ "a": 1 }),
            serde_json::Value::Null,
        ]));
        round_trip(ItemContent::Binary(vec![0, 255, 7]));
        round_trip(ItemContent::from("Hello,中国！𐐷"));
        round_trip(ItemContent::Embed(serde_json::json!({ "image": "x.png" })));
        round_trip(ItemContent::Format {
            key: "bold".into(),
            value: serde_json::Value::Bool(true),
        });
        round_trip(ItemContent::Type(TypeRef::XmlElement("div".into())));
        round_trip(ItemContent::Type(TypeRef::Text));
        round_trip(ItemContent::Any(vec![Any::from("a"), Any::Integer(-3)]));
        round_trip(ItemContent::Doc {
            guid: "sub".into(),
            opts: Any::Null,
        });
    }

    #[test]
    fn test_json_undefined_decodes_as_null() {
        let mut decoder = DecoderV1::new(b"\x01\x09undefined");
        assert_eq!(
            ItemContent::decode(&mut decoder, BLOCK_ITEM_JSON_REF_NUMBER).unwrap(),
            ItemContent::Json(vec![serde_json::Value::Null])
        );
    }

    #[test]
    fn test_unknown_type_ref() {
        let mut decoder = DecoderV1::new(&[0x09]);
        assert!(matches!(
            TypeRef::decode(&mut decoder),
            Err(Error::UnknownTypeRef(9))
        ));
    }
}
