//! String streams split into one text payload and a length stream

use bytes::Bytes;
use tracing::debug;

use crate::error::{Error, Result};
use crate::read::{Cursor, Read};
use crate::rle::{UIntOptRleDecoder, UIntOptRleEncoder};
use crate::write::{BufferWrite, Write};

/// Concatenates strings and records each chunk's length in UTF-16 units
#[derive(Debug, Default)]
pub struct StringEncoder {
    text: String,
    lens: UIntOptRleEncoder,
}

impl StringEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, s: &str) {
        self.text.push_str(s);
        self.lens.write(s.encode_utf16().count() as u64);
    }

    /// Var-string of all text followed by the raw length stream
    pub fn to_bytes(&mut self) -> Bytes {
        let lens = self.lens.to_bytes();
        let mut out = BufferWrite::with_capacity(self.text.len() + lens.len() + 5);
        out.write_string(&self.text);
        out.write_all(&lens);
        out.into_bytes()
    }
}

/// Reads back the chunks written by a [`StringEncoder`]
#[derive(Debug)]
pub struct StringDecoder<'a> {
    units: Vec<u16>,
    pos: usize,
    lens: UIntOptRleDecoder<'a>,
}

impl<'a> StringDecoder<'a> {
    pub fn new(buf: &'a [u8]) -> Result<Self> {
        let mut cursor = Cursor::new(buf);
        let text = cursor.read_string()?;
        Ok(Self {
            units: text.encode_utf16().collect(),
            pos: 0,
            lens: UIntOptRleDecoder::new(cursor.rest()),
        })
    }

    /// Next chunk. A length running past the remaining text fails with
    /// [`Error::EndOfBuffer`] and drops the rest of the input.
    pub fn read(&mut self) -> Result<String> {
        let len = self.lens.read()?;
        let remaining = self.units.len() - self.pos;
        let end = match usize::try_from(len) {
            Ok(len) if len <= remaining => self.pos + len,
            _ => {
                let err = Error::EndOfBuffer {
                    needed: usize::try_from(len).unwrap_or(usize::MAX),
                    remaining,
                };
                debug!(error = %err, "String chunk overruns text, dropping remaining input");
                self.pos = self.units.len();
                self.lens = UIntOptRleDecoder::new(&[]);
                return Err(err);
            }
        };
        // chunks that split a surrogate pair decode to replacement characters
        let chunk = String::from_utf16_lossy(&self.units[self.pos..end]);
        self.pos = end;
        Ok(chunk)
    }
}
