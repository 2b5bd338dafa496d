//! Field math for the serialized header.
//!
//! A frozen bitmap is laid out as `n_keys`, then three parallel `u32` tables (keys,
//! cardinality-minus-one, shape-and-offset), then the payload region. The shape tag lives in
//! the top 2 bits of the shape-and-offset word; the low 30 bits hold the payload's byte offset
//! from the start of the buffer.

use crate::{
    codec::DecodeErr,
    container::{VALUE_SPAN, bitmap::WORDS},
};

/// Alignment of the payload region relative to the start of the buffer, and of every member
/// buffer inside a pack.
pub(crate) const PAYLOAD_REGION_ALIGN: usize = 32;

const OFFSET_BITS: u32 = 30;
const OFFSET_MASK: u32 = (1 << OFFSET_BITS) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Shape {
    Array = 0,
    Bitmap = 1,
    Inverted = 2,
}

impl Shape {
    pub fn from_tag(tag: u32) -> Result<Shape, DecodeErr> {
        match tag {
            0 => Ok(Shape::Array),
            1 => Ok(Shape::Bitmap),
            2 => Ok(Shape::Inverted),
            _ => Err(DecodeErr::Shape),
        }
    }

    /// Required alignment of this shape's payload. Bitmap payloads are read as 64-bit words.
    pub fn alignment(self) -> usize {
        match self {
            Shape::Bitmap => 8,
            Shape::Array | Shape::Inverted => 4,
        }
    }

    /// Payload size in bytes, derived from the shape and the container cardinality.
    pub fn payload_size(self, cardinality: usize) -> usize {
        match self {
            Shape::Array => 2 * cardinality,
            Shape::Bitmap => WORDS * 8,
            Shape::Inverted => 2 * (VALUE_SPAN - cardinality),
        }
    }
}

/// Size of the header for `n_keys` entries, before payload-region alignment.
pub(crate) fn header_size(n_keys: usize) -> usize {
    4 + 12 * n_keys
}

pub(crate) fn pack_shape_offset(shape: Shape, offset: usize) -> u32 {
    debug_assert!(offset <= OFFSET_MASK as usize, "payload offset overflow");
    ((shape as u32) << OFFSET_BITS) | offset as u32
}

pub(crate) fn unpack_shape_offset(word: u32) -> (u32, usize) {
    (word >> OFFSET_BITS, (word & OFFSET_MASK) as usize)
}
