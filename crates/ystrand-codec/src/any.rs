//! Self-describing dynamic values
//!
//! Every value is a tag byte followed by a tag-specific body:
//!
//! | tag | value        | body                                    |
//! |-----|--------------|-----------------------------------------|
//! | 127 | undefined    | -                                       |
//! | 126 | null         | -                                       |
//! | 125 | i32          | var-int                                 |
//! | 124 | f32          | 4 bytes, big-endian                     |
//! | 123 | f64          | 8 bytes, big-endian                     |
//! | 122 | i64          | 8 bytes, big-endian                     |
//! | 121 | false        | -                                       |
//! | 120 | true         | -                                       |
//! | 119 | string       | var-string                              |
//! | 118 | map          | var-uint count, (var-string, value)*    |
//! | 117 | array        | var-uint count, value*                  |
//! | 116 | byte array   | var-uint length, bytes                  |

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::number::is_safe_integer;
use crate::read::Read;
use crate::write::Write;

pub const TAG_UNDEFINED: u8 = 127;
pub const TAG_NULL: u8 = 126;
pub const TAG_INTEGER: u8 = 125;
pub const TAG_FLOAT32: u8 = 124;
pub const TAG_FLOAT64: u8 = 123;
pub const TAG_BIGINT: u8 = 122;
pub const TAG_FALSE: u8 = 121;
pub const TAG_TRUE: u8 = 120;
pub const TAG_STRING: u8 = 119;
pub const TAG_MAP: u8 = 118;
pub const TAG_ARRAY: u8 = 117;
pub const TAG_BUFFER: u8 = 116;

/// Deepest array/map nesting `Any::decode` accepts
pub const MAX_NESTING_DEPTH: usize = 128;

/// A dynamically typed value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Any {
    Undefined,
    #[default]
    Null,
    Bool(bool),
    Integer(i32),
    Float32(f32),
    Float64(f64),
    BigInt(i64),
    String(String),
    Buffer(Vec<u8>),
    Array(Vec<Any>),
    Map(HashMap<String, Any>),
}

impl Any {
    /// Write the tagged encoding of this value.
    ///
    /// Numbers take the smallest tag that round-trips: integers in `i32`
    /// range use the var-int tag, whole floats inside the safe-integer range
    /// are written as integers, and floats that survive `f32` precision use
    /// the 4-byte float tag.
    pub fn encode<W: Write>(&self, w: &mut W) {
        match self {
            Any::Undefined => w.write_u8(TAG_UNDEFINED),
            Any::Null => w.write_u8(TAG_NULL),
            Any::Bool(true) => w.write_u8(TAG_TRUE),
            Any::Bool(false) => w.write_u8(TAG_FALSE),
            Any::Integer(n) => {
                w.write_u8(TAG_INTEGER);
                w.write_var_i32(*n);
            }
            Any::BigInt(n) => write_integer(w, *n),
            Any::Float32(n) => {
                w.write_u8(TAG_FLOAT32);
                w.write_f32(*n);
            }
            Any::Float64(n) => write_float64(w, *n),
            Any::String(s) => {
                w.write_u8(TAG_STRING);
                w.write_string(s);
            }
            Any::Map(map) => {
                w.write_u8(TAG_MAP);
                w.write_var_u64(map.len() as u64);
                for (key, value) in map {
                    w.write_string(key);
                    value.encode(w);
                }
            }
            Any::Array(items) => {
                w.write_u8(TAG_ARRAY);
                w.write_var_u64(items.len() as u64);
                for item in items {
                    item.encode(w);
                }
            }
            Any::Buffer(buf) => {
                w.write_u8(TAG_BUFFER);
                w.write_buf(buf);
            }
        }
    }

    /// Read one tagged value. The result has exactly the type its tag names.
    ///
    /// Arrays and maps nested deeper than [`MAX_NESTING_DEPTH`] fail with
    /// [`Error::NestingTooDeep`].
    pub fn decode<R: Read>(r: &mut R) -> Result<Any> {
        Self::decode_nested(r, 0)
    }

    fn decode_nested<R: Read>(r: &mut R, depth: usize) -> Result<Any> {
        if depth > MAX_NESTING_DEPTH {
            return r.fail(Error::NestingTooDeep {
                depth,
                limit: MAX_NESTING_DEPTH,
            });
        }
        let tag = r.read_u8()?;
        match tag {
            TAG_UNDEFINED => Ok(Any::Undefined),
            TAG_NULL => Ok(Any::Null),
            TAG_INTEGER => Ok(Any::Integer(r.read_var_i32()?)),
            TAG_FLOAT32 => Ok(Any::Float32(r.read_f32()?)),
            TAG_FLOAT64 => Ok(Any::Float64(r.read_f64()?)),
            TAG_BIGINT => Ok(Any::BigInt(r.read_i64()?)),
            TAG_FALSE => Ok(Any::Bool(false)),
            TAG_TRUE => Ok(Any::Bool(true)),
            TAG_STRING => Ok(Any::String(r.read_string()?)),
            TAG_MAP => {
                let len = r.read_var_u64()?;
                let mut map = HashMap::new();
                for _ in 0..len {
                    let key = r.read_string()?;
                    let value = Any::decode_nested(r, depth + 1)?;
                    map.insert(key, value);
                }
                Ok(Any::Map(map))
            }
            TAG_ARRAY => {
                let len = r.read_var_u64()?;
                let mut items = Vec::new();
                for _ in 0..len {
                    items.push(Any::decode_nested(r, depth + 1)?);
                }
                Ok(Any::Array(items))
            }
            TAG_BUFFER => Ok(Any::Buffer(r.read_buf()?)),
            other => r.fail(Error::UnknownTag(other)),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Any::Null)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Any::Undefined)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Any::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Any::Integer(n) => Some(*n as i64),
            Any::BigInt(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Any::Float32(n) => Some(*n as f64),
            Any::Float64(n) => Some(*n),
            Any::Integer(n) => Some(*n as f64),
            Any::BigInt(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Any::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Any>> {
        match self {
            Any::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Any>> {
        match self {
            Any::Map(map) => Some(map),
            _ => None,
        }
    }
}

fn write_integer<W: Write>(w: &mut W, num: i64) {
    match i32::try_from(num) {
        Ok(small) => {
            w.write_u8(TAG_INTEGER);
            w.write_var_i32(small);
        }
        Err(_) => {
            w.write_u8(TAG_BIGINT);
            w.write_i64(num);
        }
    }
}

fn write_float64<W: Write>(w: &mut W, num: f64) {
    if is_safe_integer(num) {
        write_integer(w, num as i64);
    } else if (num as f32) as f64 == num {
        w.write_u8(TAG_FLOAT32);
        w.write_f32(num as f32);
    } else {
        w.write_u8(TAG_FLOAT64);
        w.write_f64(num);
    }
}

impl From<bool> for Any {
    fn from(v: bool) -> Self {
        Any::Bool(v)
    }
}

impl From<i32> for Any {
    fn from(v: i32) -> Self {
        Any::Integer(v)
    }
}

impl From<i64> for Any {
    fn from(v: i64) -> Self {
        Any::BigInt(v)
    }
}

impl From<f32> for Any {
    fn from(v: f32) -> Self {
        Any::Float32(v)
    }
}

impl From<f64> for Any {
    fn from(v: f64) -> Self {
        Any::Float64(v)
    }
}

impl From<String> for Any {
    fn from(v: String) -> Self {
        Any::String(v)
    }
}

impl From<&str> for Any {
    fn from(v: &str) -> Self {
        Any::String(v.to_string())
    }
}

impl From<Vec<u8>> for Any {
    fn from(v: Vec<u8>) -> Self {
        Any::Buffer(v)
    }
}

impl From<Vec<Any>> for Any {
    fn from(v: Vec<Any>) -> Self {
        Any::Array(v)
    }
}

impl From<HashMap<String, Any>> for Any {
    fn from(v: HashMap<String, Any>) -> Self {
        Any::Map(v)
    }
}

impl TryFrom<serde_json::Value> for Any {
    type Error = Error;

    fn try_from(json: serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Null => Ok(Any::Null),
            serde_json::Value::Bool(b) => Ok(Any::Bool(b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(i32::try_from(i).map_or(Any::BigInt(i), Any::Integer))
                } else if n.is_u64() {
                    Err(Error::UnsupportedType(format!(
                        "unsigned integer {} exceeds the signed 64-bit range",
                        n
                    )))
                } else {
                    n.as_f64()
                        .map(Any::Float64)
                        .ok_or_else(|| Error::UnsupportedType(format!("number {}", n)))
                }
            }
            serde_json::Value::String(s) => Ok(Any::String(s)),
            serde_json::Value::Array(arr) => {
                let items: Result<Vec<Any>> = arr.into_iter().map(Any::try_from).collect();
                Ok(Any::Array(items?))
            }
            serde_json::Value::Object(obj) => {
                let mut map = HashMap::new();
                for (k, v) in obj {
                    map.insert(k, Any::try_from(v)?);
                }
                Ok(Any::Map(map))
            }
        }
    }
}

impl From<Any> for serde_json::Value {
    fn from(any: Any) -> Self {
        use serde_json::Value as JsonValue;

        fn float(n: f64) -> JsonValue {
            serde_json::Number::from_f64(n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null)
        }

        match any {
            Any::Undefined | Any::Null => JsonValue::Null,
            Any::Bool(b) => JsonValue::Bool(b),
            Any::Integer(n) => JsonValue::Number(n.into()),
            Any::BigInt(n) => JsonValue::Number(n.into()),
            Any::Float32(n) => float(n as f64),
            Any::Float64(n) => float(n),
            Any::String(s) => JsonValue::String(s),
            Any::Buffer(buf) => JsonValue::Array(buf.into_iter().map(JsonValue::from).collect()),
            Any::Array(items) => JsonValue::Array(items.into_iter().map(JsonValue::from).collect()),
            Any::Map(map) => JsonValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, JsonValue::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::Cursor;
    use crate::write::BufferWrite;

    fn encode(any: &Any) -> Vec<u8> {
        let mut w = BufferWrite::new();
        any.encode(&mut w);
        w.as_slice().to_vec()
    }

    fn decode(data: &[u8]) -> Result<Any> {
        Any::decode(&mut Cursor::new(data))
    }

    #[test]
    fn test_encode_basic_values() {
        assert_eq!(encode(&Any::Undefined), [0x7f]);
        assert_eq!(encode(&Any::Null), [0x7e]);
        assert_eq!(encode(&Any::Integer(0)), [0x7d, 0x00]);
        assert_eq!(encode(&Any::Bool(true)), [0x78]);
        assert_eq!(encode(&Any::Bool(false)), [0x79]);
        assert_eq!(
            encode(&Any::from("Hello world!")),
            b"\x77\x0cHello world!".to_vec()
        );
    }

    #[test]
    fn test_encode_integer_widths() {
        assert_eq!(encode(&Any::BigInt(-1)), [0x7d, 0x41]);
        assert_eq!(
            encode(&Any::BigInt(2147483647)),
            [0x7d, 0xbf, 0xff, 0xff, 0xff, 0x0f]
        );
        assert_eq!(
            encode(&Any::BigInt(i64::MIN)),
            [0x7a, 0x80, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_encode_float_reduction() {
        // whole numbers collapse to integers
        assert_eq!(encode(&Any::Float64(18.0)), [0x7d, 0x12]);
        assert_eq!(
            encode(&Any::Float64(4294967296.0)),
            [0x7a, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]
        );
        // exact in f32
        assert_eq!(encode(&Any::Float64(0.5)), [0x7c, 0x3f, 0x00, 0x00, 0x00]);
        // needs full precision
        assert_eq!(
            encode(&Any::Float64(f64::MAX)),
            [0x7b, 0x7f, 0xef, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
        assert_eq!(
            encode(&Any::Float64(123.45)),
            [0x7b, 0x40, 0x5e, 0xdc, 0xcc, 0xcc, 0xcc, 0xcc, 0xcd]
        );
    }

    #[test]
    fn test_decode_basic_values() {
        assert_eq!(decode(&[0x7f]).unwrap(), Any::Undefined);
        assert_eq!(decode(&[0x7e]).unwrap(), Any::Null);
        assert_eq!(decode(&[0x7d, 0x00]).unwrap(), Any::Integer(0));
        assert_eq!(decode(&[0x7d, 0x41]).unwrap(), Any::Integer(-1));
        assert_eq!(
            decode(&[0x7d, 0xbf, 0xff, 0xff, 0xff, 0x0f]).unwrap(),
            Any::Integer(i32::MAX)
        );
        assert_eq!(
            decode(&[0x7a, 0x80, 0, 0, 0, 0, 0, 0, 0]).unwrap(),
            Any::BigInt(i64::MIN)
        );
        assert_eq!(
            decode(&[0x7c, 0x3f, 0xff, 0xff, 0xff]).unwrap(),
            Any::Float32(1.9999998807907104)
        );
        assert_eq!(
            decode(&[0x7b, 0x7f, 0xef, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]).unwrap(),
            Any::Float64(f64::MAX)
        );
        assert_eq!(decode(&[0x78]).unwrap(), Any::Bool(true));
        assert_eq!(decode(&[0x79]).unwrap(), Any::Bool(false));
        assert_eq!(
            decode(b"\x77\x0cHello world!").unwrap(),
            Any::from("Hello world!")
        );
    }

    #[test]
    fn test_decode_byte_array() {
        assert_eq!(
            decode(&[0x74, 0x04, 0x2a, 0x3b, 0x4c, 0x9d]).unwrap(),
            Any::Buffer(vec![0x2a, 0x3b, 0x4c, 0x9d])
        );
    }

    #[test]
    fn test_decode_map() {
        assert_eq!(decode(&[0x76, 0x00]).unwrap(), Any::Map(HashMap::new()));

        let data = b"\x76\x02\x04name\x77\x06J. Mes\x03age\x7d\x12";
        let value = decode(data).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.get("name"), Some(&Any::from("J. Mes")));
        assert_eq!(map.get("age"), Some(&Any::Integer(18)));
    }

    #[test]
    fn test_decode_array() {
        let data = [0x75, 0x03, 0x7f, 0x7d, 0xbf, 0x03, 0x7c, 0xcf, 0x00, 0x00, 0x00];
        assert_eq!(
            decode(&data).unwrap(),
            Any::Array(vec![
                Any::Undefined,
                Any::Integer(255),
                Any::Float32(-2147483648.0),
            ])
        );
    }

    #[test]
    fn test_decode_unknown_tag() {
        let mut cursor = Cursor::new(&[0x73, 0x00]);
        assert_eq!(Any::decode(&mut cursor), Err(Error::UnknownTag(0x73)));
        assert!(!crate::read::Read::has_content(&cursor));
    }

    #[test]
    fn test_decode_truncated_value() {
        assert!(matches!(
            decode(&[0x77, 0x05, b'a']),
            Err(Error::EndOfBuffer { .. })
        ));
    }

    fn nested_arrays(depth: usize) -> Vec<u8> {
        let mut data = [TAG_ARRAY, 0x01].repeat(depth);
        data.push(TAG_NULL);
        data
    }

    #[test]
    fn test_decode_nesting_limit() {
        assert!(decode(&nested_arrays(MAX_NESTING_DEPTH)).is_ok());

        let data = nested_arrays(200_000);
        let mut cursor = Cursor::new(&data);
        assert_eq!(
            Any::decode(&mut cursor),
            Err(Error::NestingTooDeep {
                depth: MAX_NESTING_DEPTH + 1,
                limit: MAX_NESTING_DEPTH
            })
        );
        assert!(!crate::read::Read::has_content(&cursor));
    }

    #[test]
    fn test_nested_round_trip() {
        let mut map = HashMap::new();
        map.insert("list".to_string(), Any::Array(vec![Any::Integer(1), Any::Null]));
        map.insert("bytes".to_string(), Any::Buffer(vec![1, 2, 3]));
        map.insert("big".to_string(), Any::BigInt(1 << 40));
        let value = Any::Map(map);
        assert_eq!(decode(&encode(&value)).unwrap(), value);
    }

    #[test]
    fn test_json_conversion() {
        let json = serde_json::json!({ "name": "test", "value": 42, "ratio": 0.25, "tags": ["a"] });
        let any = Any::try_from(json.clone()).unwrap();
        assert_eq!(any.as_map().unwrap().get("value"), Some(&Any::Integer(42)));
        assert_eq!(serde_json::Value::from(any), json);
    }

    #[test]
    fn test_json_unsigned_overflow_is_unsupported() {
        let json = serde_json::json!(u64::MAX);
        assert!(matches!(Any::try_from(json), Err(Error::UnsupportedType(_))));
    }
}
