//! Run-length encoders for compact per-client streams
//!
//! Encoders buffer the pending run and only emit it once a different value
//! arrives or [`to_bytes`](RleEncoder::to_bytes) finalizes the stream.

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::read::{Cursor, Read};
use crate::write::{BufferWrite, Write};

/// Plain run-length encoding of bytes.
///
/// Each run is the byte value followed by `count - 1` as var-uint. The
/// length of the last run is left implicit.
#[derive(Debug, Default)]
pub struct RleEncoder {
    buf: BufferWrite,
    state: Option<u8>,
    count: u64,
}

impl RleEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, value: u8) {
        if self.state == Some(value) {
            self.count += 1;
            return;
        }
        if self.count > 0 {
            self.buf.write_var_u64(self.count - 1);
        }
        self.buf.write_u8(value);
        self.count = 1;
        self.state = Some(value);
    }

    /// Nothing is pending: the last run length is implied by end of input.
    pub fn flush(&mut self) {}

    pub fn to_bytes(&mut self) -> Bytes {
        self.flush();
        self.buf.to_bytes()
    }
}

#[derive(Debug)]
pub struct RleDecoder<'a> {
    cursor: Cursor<'a>,
    state: u8,
    count: u64,
    unbounded: bool,
}

impl<'a> RleDecoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(buf),
            state: 0,
            count: 0,
            unbounded: false,
        }
    }

    pub fn read(&mut self) -> Result<u8> {
        if self.count == 0 && !self.unbounded {
            self.state = self.cursor.read_u8()?;
            if self.cursor.has_content() {
                self.count = self.cursor.read_var_u64()? + 1;
            } else {
                // the final run repeats forever
                self.unbounded = true;
            }
        }
        if !self.unbounded {
            self.count -= 1;
        }
        Ok(self.state)
    }
}

/// Run-length encoding of unsigned integers, optimized for runs of one.
///
/// A single value is written as a non-negative var-int. A repeated value is
/// written negated and followed by `count - 2` as var-uint. Zero keeps the
/// distinction through the negative-zero form.
#[derive(Debug, Default)]
pub struct UIntOptRleEncoder {
    buf: BufferWrite,
    state: u64,
    count: u64,
}

impl UIntOptRleEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, value: u64) {
        if self.state == value {
            self.count += 1;
        } else {
            self.flush();
            self.count = 1;
            self.state = value;
        }
    }

    /// Emit the pending run
    pub fn flush(&mut self) {
        if self.count == 0 {
            return;
        }
        let repeated = self.count > 1;
        self.buf.write_signed_var(repeated, self.state);
        if repeated {
            self.buf.write_var_u64(self.count - 2);
        }
        self.count = 0;
    }

    pub fn to_bytes(&mut self) -> Bytes {
        self.flush();
        self.buf.to_bytes()
    }
}

#[derive(Debug)]
pub struct UIntOptRleDecoder<'a> {
    cursor: Cursor<'a>,
    state: u64,
    count: u64,
}

impl<'a> UIntOptRleDecoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(buf),
            state: 0,
            count: 0,
        }
    }

    pub fn read(&mut self) -> Result<u64> {
        if self.count == 0 {
            let (repeated, value) = self.cursor.read_signed_var()?;
            self.state = value;
            self.count = if repeated {
                self.cursor.read_var_u64()?.saturating_add(2)
            } else {
                1
            };
        }
        self.count -= 1;
        Ok(self.state)
    }
}

/// Run-length encoding of the differences between consecutive values.
///
/// Each run is written as var-int `diff * 2 + repeated` where the low bit
/// flags a following var-uint `count - 2`.
#[derive(Debug, Default)]
pub struct IntDiffOptRleEncoder {
    buf: BufferWrite,
    state: i64,
    diff: i64,
    count: u64,
}

impl IntDiffOptRleEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, value: u32) {
        let value = value as i64;
        if self.diff == value - self.state {
            self.state = value;
            self.count += 1;
        } else {
            self.flush();
            self.count = 1;
            self.diff = value - self.state;
            self.state = value;
        }
    }

    /// Emit the pending run
    pub fn flush(&mut self) {
        if self.count == 0 {
            return;
        }
        let repeated = self.count > 1;
        self.buf.write_var_i64(self.diff * 2 + repeated as i64);
        if repeated {
            self.buf.write_var_u64(self.count - 2);
        }
        self.count = 0;
    }

    pub fn to_bytes(&mut self) -> Bytes {
        self.flush();
        self.buf.to_bytes()
    }
}

#[derive(Debug)]
pub struct IntDiffOptRleDecoder<'a> {
    cursor: Cursor<'a>,
    state: i64,
    diff: i64,
    count: u64,
}

impl<'a> IntDiffOptRleDecoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(buf),
            state: 0,
            diff: 0,
            count: 0,
        }
    }

    pub fn read(&mut self) -> Result<u32> {
        if self.count == 0 {
            let encoded = self.cursor.read_var_i64()?;
            self.diff = encoded >> 1;
            self.count = if encoded & 1 == 1 {
                self.cursor.read_var_u64()?.saturating_add(2)
            } else {
                1
            };
        }
        self.state = self.state.saturating_add(self.diff);
        self.count -= 1;
        match u32::try_from(self.state) {
            Ok(value) => Ok(value),
            Err(_) => self.cursor.fail(Error::IntegerOutOfRange {
                value: self.state as i128,
                target: "u32",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rle_encoder() {
        let mut encoder = RleEncoder::new();
        for v in [1, 1, 1, 7] {
            encoder.write(v);
        }
        assert_eq!(encoder.to_bytes().as_ref(), &[0x01, 0x02, 0x07]);

        let mut encoder = RleEncoder::new();
        for v in [1, 2, 3, 255] {
            encoder.write(v);
        }
        assert_eq!(
            encoder.to_bytes().as_ref(),
            &[0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0xff]
        );
    }

    #[test]
    fn test_rle_decoder_repeats_last_run() {
        let mut decoder = RleDecoder::new(&[0x01, 0x02, 0x07]);
        let values: Vec<u8> = (0..6).map(|_| decoder.read().unwrap()).collect();
        assert_eq!(values, [1, 1, 1, 7, 7, 7]);
    }

    #[test]
    fn test_rle_decoder_empty_input() {
        let mut decoder = RleDecoder::new(&[]);
        assert!(matches!(decoder.read(), Err(Error::EndOfBuffer { .. })));
    }

    #[test]
    fn test_uint_opt_rle_encoder() {
        let mut encoder = UIntOptRleEncoder::new();
        for v in [1, 2, 3, 3, 3] {
            encoder.write(v);
        }
        assert_eq!(encoder.to_bytes().as_ref(), &[0x01, 0x02, 0x43, 0x01]);

        let mut encoder = UIntOptRleEncoder::new();
        for v in [1, 2, 3, 65535, 18273719133] {
            encoder.write(v);
        }
        assert_eq!(
            encoder.to_bytes().as_ref(),
            &[0x01, 0x02, 0x03, 0xbf, 0xff, 0x07, 0x9d, 0xcd, 0x96, 0x93, 0x88, 0x01]
        );
    }

    #[test]
    fn test_uint_opt_rle_zero_runs() {
        let mut encoder = UIntOptRleEncoder::new();
        encoder.write(0);
        assert_eq!(encoder.to_bytes().as_ref(), &[0x00]);

        let mut encoder = UIntOptRleEncoder::new();
        for _ in 0..3 {
            encoder.write(0);
        }
        let data = encoder.to_bytes();
        assert_eq!(data.as_ref(), &[0x40, 0x01]);

        let mut decoder = UIntOptRleDecoder::new(&data);
        for _ in 0..3 {
            assert_eq!(decoder.read().unwrap(), 0);
        }
        assert!(decoder.read().is_err());
    }

    #[test]
    fn test_to_bytes_twice_does_not_repeat_run() {
        let mut encoder = UIntOptRleEncoder::new();
        encoder.write(5);
        encoder.write(5);
        let first = encoder.to_bytes();
        assert_eq!(encoder.to_bytes(), first);
    }

    #[test]
    fn test_int_diff_opt_rle_encoder() {
        let mut encoder = IntDiffOptRleEncoder::new();
        for v in [1, 2, 3, 2] {
            encoder.write(v);
        }
        assert_eq!(encoder.to_bytes().as_ref(), &[0x03, 0x01, 0x42]);

        let mut encoder = IntDiffOptRleEncoder::new();
        for v in [1, 2, 3, 2, 2, 2, 2, 2, 2, 2] {
            encoder.write(v);
        }
        assert_eq!(
            encoder.to_bytes().as_ref(),
            &[0x03, 0x01, 0x42, 0x01, 0x04]
        );
    }

    #[test]
    fn test_int_diff_opt_rle_decoder() {
        let mut decoder = IntDiffOptRleDecoder::new(&[0x03, 0x01, 0x42, 0x01, 0x04]);
        let values: Vec<u32> = (0..10).map(|_| decoder.read().unwrap()).collect();
        assert_eq!(values, [1, 2, 3, 2, 2, 2, 2, 2, 2, 2]);
    }

    #[test]
    fn test_int_diff_opt_rle_rejects_negative_value() {
        // a single diff of -1 from zero
        let mut decoder = IntDiffOptRleDecoder::new(&[0x42]);
        assert!(matches!(
            decoder.read(),
            Err(Error::IntegerOutOfRange { target: "u32", .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_rle_round_trip(values in prop::collection::vec(0u8..4, 0..64)) {
            let mut encoder = RleEncoder::new();
            for v in &values {
                encoder.write(*v);
            }
            let data = encoder.to_bytes();
            let mut decoder = RleDecoder::new(&data);
            for v in &values {
                prop_assert_eq!(decoder.read().unwrap(), *v);
            }
        }

        #[test]
        fn prop_uint_opt_rle_round_trip(
            values in prop::collection::vec(prop_oneof![0u64..3, any::<u64>()], 0..64)
        ) {
            let mut encoder = UIntOptRleEncoder::new();
            for v in &values {
                encoder.write(*v);
            }
            let data = encoder.to_bytes();
            let mut decoder = UIntOptRleDecoder::new(&data);
            for v in &values {
                prop_assert_eq!(decoder.read().unwrap(), *v);
            }
        }

        #[test]
        fn prop_int_diff_opt_rle_round_trip(
            values in prop::collection::vec(prop_oneof![0u32..8, any::<u32>()], 0..64)
        ) {
            let mut encoder = IntDiffOptRleEncoder::new();
            for v in &values {
                encoder.write(*v);
            }
            let data = encoder.to_bytes();
            let mut decoder = IntDiffOptRleDecoder::new(&data);
            for v in &values {
                prop_assert_eq!(decoder.read().unwrap(), *v);
            }
        }
    }
}
