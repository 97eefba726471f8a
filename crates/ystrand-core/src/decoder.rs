//! Structured decoder, the mirror of [`crate::encoder`]

use ystrand_codec::{Cursor, Error as CodecError, Read};

use crate::error::Result;
use crate::id::{ClientID, ID};

/// Reads the CRDT-specific fields of an update
pub trait Decoder: Read {
    fn reset_ds_cur_val(&mut self);

    fn read_ds_clock(&mut self) -> Result<u32>;

    fn read_ds_len(&mut self) -> Result<u32>;

    fn read_left_id(&mut self) -> Result<ID>;

    fn read_right_id(&mut self) -> Result<ID>;

    fn read_client(&mut self) -> Result<ClientID>;

    fn read_info(&mut self) -> Result<u8>;

    fn read_parent_info(&mut self) -> Result<bool>;

    fn read_type_ref(&mut self) -> Result<u8>;

    fn read_len(&mut self) -> Result<u32>;

    fn read_key(&mut self) -> Result<String>;

    fn read_json(&mut self) -> Result<serde_json::Value>;
}

/// Version 1 of the update decoding
#[derive(Debug)]
pub struct DecoderV1<'a> {
    cursor: Cursor<'a>,
}

impl<'a> DecoderV1<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(buf),
        }
    }

    /// Non-negative var-int
    fn read_unsigned_var_int(&mut self) -> Result<u64> {
        let (negative, magnitude) = self.cursor.read_signed_var()?;
        if negative && magnitude != 0 {
            let err = CodecError::IntegerOutOfRange {
                value: -(magnitude as i128),
                target: "u64",
            };
            return Ok(self.cursor.fail(err)?);
        }
        Ok(magnitude)
    }

    fn read_id(&mut self) -> Result<ID> {
        let client = self.read_unsigned_var_int()?;
        let clock = self.read_unsigned_var_int()?;
        match u32::try_from(clock) {
            Ok(clock) => Ok(ID::new(client, clock)),
            Err(_) => Ok(self.cursor.fail(CodecError::IntegerOutOfRange {
                value: clock as i128,
                target: "u32",
            })?),
        }
    }
}

impl Read for DecoderV1<'_> {
    fn read_exact(&mut self, len: usize) -> ystrand_codec::Result<&[u8]> {
        self.cursor.read_exact(len)
    }

    fn has_content(&self) -> bool {
        self.cursor.has_content()
    }

    fn exhaust(&mut self) {
        self.cursor.exhaust();
    }
}

impl Decoder for DecoderV1<'_> {
    fn reset_ds_cur_val(&mut self) {
        // V1 reads delete-set clocks as absolute values
    }

    fn read_ds_clock(&mut self) -> Result<u32> {
        Ok(self.cursor.read_var_u32()?)
    }

    fn read_ds_len(&mut self) -> Result<u32> {
        Ok(self.cursor.read_var_u32()?)
    }

    fn read_left_id(&mut self) -> Result<ID> {
        self.read_id()
    }

    fn read_right_id(&mut self) -> Result<ID> {
        self.read_id()
    }

    fn read_client(&mut self) -> Result<ClientID> {
        self.read_unsigned_var_int()
    }

    fn read_info(&mut self) -> Result<u8> {
        Ok(self.cursor.read_u8()?)
    }

    fn read_parent_info(&mut self) -> Result<bool> {
        Ok(self.cursor.read_var_u32()? == 1)
    }

    fn read_type_ref(&mut self) -> Result<u8> {
        Ok(self.cursor.read_u8()?)
    }

    fn read_len(&mut self) -> Result<u32> {
        Ok(self.cursor.read_var_u32()?)
    }

    fn read_key(&mut self) -> Result<String> {
        Ok(self.cursor.read_string()?)
    }

    fn read_json(&mut self) -> Result<serde_json::Value> {
        let json = self.cursor.read_string()?;
        match serde_json::from_str(&json) {
            Ok(value) => Ok(value),
            Err(e) => {
                self.cursor.exhaust();
                Err(e.into())
            }
        }
    }
}
