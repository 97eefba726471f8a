//! Writing primitives into growable byte buffers
//!
//! Byte orders follow the wire format: `u16`/`u32` little-endian, a
//! dedicated big-endian `u32`, and big-endian `u64`/`i64`/`f32`/`f64`.
//! Writes only append and never fail.

use bytes::{BufMut, Bytes, BytesMut};

use crate::any::Any;

/// Sink for encoded values
pub trait Write {
    /// Append raw bytes
    fn write_all(&mut self, buf: &[u8]);

    fn write_u8(&mut self, num: u8) {
        self.write_all(&[num]);
    }

    fn write_u16(&mut self, num: u16) {
        self.write_all(&num.to_le_bytes());
    }

    fn write_u32(&mut self, num: u32) {
        self.write_all(&num.to_le_bytes());
    }

    fn write_u32_be(&mut self, num: u32) {
        self.write_all(&num.to_be_bytes());
    }

    fn write_u64(&mut self, num: u64) {
        self.write_all(&num.to_be_bytes());
    }

    fn write_i64(&mut self, num: i64) {
        self.write_all(&num.to_be_bytes());
    }

    fn write_f32(&mut self, num: f32) {
        self.write_all(&num.to_be_bytes());
    }

    fn write_f64(&mut self, num: f64) {
        self.write_all(&num.to_be_bytes());
    }

    /// Unsigned LEB128: 7 payload bits per byte, high bit set while more follow
    fn write_var_u64(&mut self, mut num: u64) {
        while num >= 0b1000_0000 {
            self.write_u8((num & 0b0111_1111) as u8 | 0b1000_0000);
            num >>= 7;
        }
        self.write_u8(num as u8);
    }

    fn write_var_u32(&mut self, num: u32) {
        self.write_var_u64(num as u64);
    }

    /// Signed var-int from an explicit sign flag and magnitude.
    ///
    /// First byte: continuation (bit 7), sign (bit 6), 6 low magnitude bits.
    /// Following bytes carry 7 magnitude bits each. Passing `negative` with
    /// a zero magnitude produces the negative-zero form used by run-length
    /// encoders to flag repeated zeros.
    fn write_signed_var(&mut self, negative: bool, magnitude: u64) {
        let mut num = magnitude;
        let mut first = (num & 0b0011_1111) as u8;
        if num > 0b0011_1111 {
            first |= 0b1000_0000;
        }
        if negative {
            first |= 0b0100_0000;
        }
        self.write_u8(first);
        num >>= 6;
        while num > 0 {
            let mut b = (num & 0b0111_1111) as u8;
            if num > 0b0111_1111 {
                b |= 0b1000_0000;
            }
            self.write_u8(b);
            num >>= 7;
        }
    }

    fn write_var_i64(&mut self, num: i64) {
        self.write_signed_var(num < 0, num.unsigned_abs());
    }

    fn write_var_i32(&mut self, num: i32) {
        self.write_var_i64(num as i64);
    }

    /// Length-prefixed byte array
    fn write_buf(&mut self, buf: &[u8]) {
        self.write_var_u64(buf.len() as u64);
        self.write_all(buf);
    }

    /// Length-prefixed UTF-8 string
    fn write_string(&mut self, s: &str) {
        self.write_buf(s.as_bytes());
    }

    fn write_any(&mut self, any: &Any)
    where
        Self: Sized,
    {
        any.encode(self);
    }
}

impl Write for BytesMut {
    fn write_all(&mut self, buf: &[u8]) {
        self.put_slice(buf);
    }
}

impl Write for Vec<u8> {
    fn write_all(&mut self, buf: &[u8]) {
        self.extend_from_slice(buf);
    }
}

/// Growable in-memory encoder buffer
#[derive(Debug, Clone, Default)]
pub struct BufferWrite {
    buf: BytesMut,
}

impl BufferWrite {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// View of everything written so far
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Snapshot of the written bytes; later writes do not affect it
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.buf)
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

impl Write for BufferWrite {
    fn write_all(&mut self, buf: &[u8]) {
        self.buf.put_slice(buf);
    }
}
