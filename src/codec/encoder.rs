use bytes::BufMut;
use zerocopy::{IntoBytes, LE, U64, transmute_ref};

use crate::container::bitmap::WORDS;

/// A positioned sink for the serialized form.
///
/// Tracks the number of bytes written so callers can zero-pad to the absolute offsets recorded
/// in the header, keeping the encoding deterministic.
pub struct Encoder<B: BufMut> {
    buf: B,
    bytes_written: usize,
}

impl<B: BufMut> Encoder<B> {
    pub fn new(buf: B) -> Self {
        Self { buf, bytes_written: 0 }
    }

    /// Retrieve the wrapped buffer from the `Encoder`.
    pub fn into_inner(self) -> B {
        self.buf
    }

    /// The total number of bytes written since this `Encoder` was initialized.
    pub(crate) fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Write zeroes until `pos` bytes have been written.
    pub(crate) fn pad_to(&mut self, pos: usize) {
        debug_assert!(pos >= self.bytes_written, "padding target behind cursor");
        for _ in self.bytes_written..pos {
            self.buf.put_u8(0);
        }
        self.bytes_written = pos;
    }

    #[inline]
    pub(crate) fn put_u32(&mut self, value: u32) {
        self.put_slice(&value.to_le_bytes());
    }

    pub(crate) fn put_u16_values(&mut self, values: impl Iterator<Item = u16>) {
        for value in values {
            self.put_slice(&value.to_le_bytes());
        }
    }

    pub(crate) fn put_words(&mut self, words: &[u64; WORDS]) {
        static_assertions::assert_cfg!(target_endian = "little");
        let raw: &[U64<LE>; WORDS] = transmute_ref!(words);
        self.put_slice(raw.as_bytes());
    }

    pub(crate) fn put_slice(&mut self, data: &[u8]) {
        self.buf.put_slice(data);
        self.bytes_written += data.len();
    }
}
