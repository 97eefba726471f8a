//! Reading primitives back out of encoded buffers
//!
//! Every read either returns a complete value or fails. Once a read fails the
//! source is exhausted, so a caller that ignores the error cannot resume
//! decoding from the middle of a corrupt value.

use crate::any::Any;
use crate::error::{Error, Result};
use tracing::debug;

/// Source of encoded values
pub trait Read {
    /// Take the next `len` bytes
    fn read_exact(&mut self, len: usize) -> Result<&[u8]>;

    /// Whether any unread bytes remain
    fn has_content(&self) -> bool;

    /// Drop all remaining input
    fn exhaust(&mut self);

    /// Exhaust the source and return `err`
    fn fail<T>(&mut self, err: Error) -> Result<T>
    where
        Self: Sized,
    {
        debug!(error = %err, "Decode failed, dropping remaining input");
        self.exhaust();
        Err(err)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]>
    where
        Self: Sized,
    {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_exact(N)?);
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8>
    where
        Self: Sized,
    {
        Ok(self.read_exact(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16>
    where
        Self: Sized,
    {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    fn read_u32(&mut self) -> Result<u32>
    where
        Self: Sized,
    {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    fn read_u32_be(&mut self) -> Result<u32>
    where
        Self: Sized,
    {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    fn read_u64(&mut self) -> Result<u64>
    where
        Self: Sized,
    {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    fn read_i64(&mut self) -> Result<i64>
    where
        Self: Sized,
    {
        Ok(i64::from_be_bytes(self.read_array()?))
    }

    fn read_f32(&mut self) -> Result<f32>
    where
        Self: Sized,
    {
        Ok(f32::from_be_bytes(self.read_array()?))
    }

    fn read_f64(&mut self) -> Result<f64>
    where
        Self: Sized,
    {
        Ok(f64::from_be_bytes(self.read_array()?))
    }

    fn read_var_u64(&mut self) -> Result<u64>
    where
        Self: Sized,
    {
        let mut num = 0u64;
        let mut shift = 0u32;
        loop {
            let b = self.read_u8()?;
            let payload = (b & 0b0111_1111) as u64;
            if shift == 63 && payload > 1 {
                return self.fail(Error::VarIntSizeExceeded { bits: 64 });
            }
            num |= payload << shift;
            if b < 0b1000_0000 {
                return Ok(num);
            }
            shift += 7;
            if shift > 63 {
                return self.fail(Error::VarIntSizeExceeded { bits: 64 });
            }
        }
    }

    fn read_var_u32(&mut self) -> Result<u32>
    where
        Self: Sized,
    {
        let num = self.read_var_u64()?;
        match u32::try_from(num) {
            Ok(n) => Ok(n),
            Err(_) => self.fail(Error::IntegerOutOfRange {
                value: num as i128,
                target: "u32",
            }),
        }
    }

    /// Signed var-int as its raw sign flag and magnitude.
    ///
    /// Keeps the sign of a zero magnitude, which plain integer reads lose.
    fn read_signed_var(&mut self) -> Result<(bool, u64)>
    where
        Self: Sized,
    {
        let first = self.read_u8()?;
        let negative = first & 0b0100_0000 != 0;
        let mut num = (first & 0b0011_1111) as u128;
        if first & 0b1000_0000 != 0 {
            let mut shift = 6u32;
            loop {
                let b = self.read_u8()?;
                num |= ((b & 0b0111_1111) as u128) << shift;
                shift += 7;
                if b < 0b1000_0000 {
                    break;
                }
                if shift > 70 {
                    return self.fail(Error::VarIntSizeExceeded { bits: 70 });
                }
            }
        }
        match u64::try_from(num) {
            Ok(magnitude) => Ok((negative, magnitude)),
            Err(_) => self.fail(Error::VarIntSizeExceeded { bits: 64 }),
        }
    }

    fn read_var_i64(&mut self) -> Result<i64>
    where
        Self: Sized,
    {
        let (negative, magnitude) = self.read_signed_var()?;
        let value = if negative {
            -(magnitude as i128)
        } else {
            magnitude as i128
        };
        match i64::try_from(value) {
            Ok(n) => Ok(n),
            Err(_) => self.fail(Error::IntegerOutOfRange { value, target: "i64" }),
        }
    }

    fn read_var_i32(&mut self) -> Result<i32>
    where
        Self: Sized,
    {
        let num = self.read_var_i64()?;
        match i32::try_from(num) {
            Ok(n) => Ok(n),
            Err(_) => self.fail(Error::IntegerOutOfRange {
                value: num as i128,
                target: "i32",
            }),
        }
    }

    /// Length-prefixed byte array
    fn read_buf(&mut self) -> Result<Vec<u8>>
    where
        Self: Sized,
    {
        let len = self.read_var_u64()? as usize;
        Ok(self.read_exact(len)?.to_vec())
    }

    /// Length-prefixed UTF-8 string
    fn read_string(&mut self) -> Result<String>
    where
        Self: Sized,
    {
        let buf = self.read_buf()?;
        match String::from_utf8(buf) {
            Ok(s) => Ok(s),
            Err(e) => self.fail(e.into()),
        }
    }

    fn read_any(&mut self) -> Result<Any>
    where
        Self: Sized,
    {
        Any::decode(self)
    }
}

/// Read position over a borrowed byte slice
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    next: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, next: 0 }
    }

    pub fn position(&self) -> usize {
        self.next
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.next
    }

    /// Everything not read yet
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.next..]
    }
}

impl<'a> From<&'a [u8]> for Cursor<'a> {
    fn from(buf: &'a [u8]) -> Self {
        Self::new(buf)
    }
}

impl Read for Cursor<'_> {
    fn read_exact(&mut self, len: usize) -> Result<&[u8]> {
        let remaining = self.remaining();
        if len > remaining {
            self.exhaust();
            return Err(Error::EndOfBuffer {
                needed: len,
                remaining,
            });
        }
        let start = self.next;
        self.next += len;
        Ok(&self.buf[start..self.next])
    }

    fn has_content(&self) -> bool {
        self.next < self.buf.len()
    }

    fn exhaust(&mut self) {
        self.next = self.buf.len();
    }
}
