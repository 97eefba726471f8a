//! Structured encoder for CRDT fields on top of the byte codec

use bytes::Bytes;
use ystrand_codec::{BufferWrite, Write};

use crate::error::Result;
use crate::id::{ClientID, ID};

/// Writes the CRDT-specific fields of an update.
///
/// Each protocol version decides how these fields land in the byte stream.
pub trait Encoder: Write {
    /// Finalized output of everything written so far
    fn to_bytes(&self) -> Bytes;

    /// Start a new client section of the delete set
    fn reset_ds_cur_val(&mut self);

    fn write_ds_clock(&mut self, clock: u32);

    fn write_ds_len(&mut self, len: u32);

    fn write_left_id(&mut self, id: &ID);

    fn write_right_id(&mut self, id: &ID);

    fn write_client(&mut self, client: ClientID);

    fn write_info(&mut self, info: u8);

    /// `true` when the parent is a named root type, `false` when it is an ID
    fn write_parent_info(&mut self, is_y_key: bool);

    fn write_type_ref(&mut self, type_ref: u8);

    fn write_len(&mut self, len: u32);

    fn write_key(&mut self, key: &str);

    fn write_json(&mut self, value: &serde_json::Value) -> Result<()>;
}

/// Version 1 of the update encoding
#[derive(Debug, Default)]
pub struct EncoderV1 {
    buf: BufferWrite,
}

impl EncoderV1 {
    pub fn new() -> Self {
        Self::default()
    }

    fn write_id(&mut self, id: &ID) {
        self.buf.write_signed_var(false, id.client);
        self.buf.write_signed_var(false, id.clock as u64);
    }
}

impl Write for EncoderV1 {
    fn write_all(&mut self, buf: &[u8]) {
        self.buf.write_all(buf);
    }
}

impl Encoder for EncoderV1 {
    fn to_bytes(&self) -> Bytes {
        self.buf.to_bytes()
    }

    fn reset_ds_cur_val(&mut self) {
        // V1 writes delete-set clocks as absolute values
    }

    fn write_ds_clock(&mut self, clock: u32) {
        self.buf.write_var_u32(clock);
    }

    fn write_ds_len(&mut self, len: u32) {
        self.buf.write_var_u32(len);
    }

    fn write_left_id(&mut self, id: &ID) {
        self.write_id(id);
    }

    fn write_right_id(&mut self, id: &ID) {
        self.write_id(id);
    }

    fn write_client(&mut self, client: ClientID) {
        self.buf.write_signed_var(false, client);
    }

    fn write_info(&mut self, info: u8) {
        self.buf.write_u8(info);
    }

    fn write_parent_info(&mut self, is_y_key: bool) {
        self.buf.write_var_u32(is_y_key as u32);
    }

    fn write_type_ref(&mut self, type_ref: u8) {
        self.buf.write_u8(type_ref);
    }

    fn write_len(&mut self, len: u32) {
        self.buf.write_var_u32(len);
    }

    fn write_key(&mut self, key: &str) {
        self.buf.write_string(key);
    }

    fn write_json(&mut self, value: &serde_json::Value) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.buf.write_string(&json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_var_ints() {
        let mut encoder = EncoderV1::new();
        encoder.write_left_id(&ID::new(255, 1));
        encoder.write_right_id(&ID::new(1, 65535));
        assert_eq!(
            encoder.to_bytes().as_ref(),
            &[0xbf, 0x03, 0x01, 0x01, 0xbf, 0xff, 0x07]
        );
    }

    #[test]
    fn test_structural_fields() {
        let mut encoder = EncoderV1::new();
        encoder.write_client(4294967295);
        encoder.write_info(0b1010_0100);
        encoder.write_parent_info(true);
        encoder.write_parent_info(false);
        encoder.write_type_ref(3);
        encoder.write_len(255);
        encoder.write_ds_clock(128);
        encoder.write_ds_len(1);
        encoder.write_key("k");
        assert_eq!(
            encoder.to_bytes().as_ref(),
            &[
                0xbf, 0xff, 0xff, 0xff, 0x1f, // client
                0xa4, // info
                0x01, 0x00, // parent info
                0x03, // type ref
                0xff, 0x01, // len
                0x80, 0x01, 0x01, // delete set clock and len
                0x01, b'k',
            ]
        );
    }

    #[test]
    fn test_write_json() {
        let mut encoder = EncoderV1::new();
        encoder.write_json(&serde_json::json!([1, "a"])).unwrap();
        assert_eq!(encoder.to_bytes().as_ref(), b"\x07[1,\"a\"]");
    }
}
