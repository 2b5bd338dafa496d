use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;
use zerocopy::{ConvertError, SizeError};

use crate::codec::encoder::Encoder;

pub(crate) mod container_ref;
pub mod encoder;
pub(crate) mod layout;

/// Trait for types that can be encoded into the binary bitmap format.
pub trait Encodable {
    /// Returns the exact number of bytes [`encode`](Self::encode) will write, allowing for
    /// buffer pre-allocation.
    fn encoded_size(&self) -> usize;

    /// Encodes this value into the provided encoder.
    fn encode<B: BufMut>(&self, encoder: &mut Encoder<B>);

    /// Convenience method that encodes this value to a [`Bytes`] buffer.
    ///
    /// ```
    /// use quiver_rs::{Encodable, RoaringBitmap};
    ///
    /// let bitmap = RoaringBitmap::from_iter([8, 42, 16]);
    /// let bytes = bitmap.encode_to_bytes();
    /// assert_eq!(bytes.len(), bitmap.encoded_size());
    /// ```
    fn encode_to_bytes(&self) -> Bytes {
        let size = self.encoded_size();
        let mut encoder = Encoder::new(BytesMut::with_capacity(size));
        self.encode(&mut encoder);
        encoder.into_inner().freeze()
    }
}

/// Errors that can occur when opening serialized bitmap data.
///
/// Buffers are validated once when a view is constructed; container decoding afterwards trusts
/// the header.
#[derive(Debug, Error)]
pub enum DecodeErr {
    /// The buffer is truncated, or a payload extends past the end of the buffer.
    #[error("not enough bytes")]
    Length,

    /// The key count exceeds the 16-bit key domain.
    #[error("too many keys")]
    KeyCount,

    /// A key is outside the 16-bit domain or keys are not strictly ascending.
    #[error("keys out of range or out of order")]
    Keys,

    /// A container records a cardinality outside `[1, 65536]`.
    #[error("container cardinality out of range")]
    Cardinality,

    /// An unknown container shape tag.
    #[error("invalid container shape")]
    Shape,

    /// A container payload violates its shape's alignment.
    #[error("misaligned container payload")]
    Alignment,

    /// Payload offsets are non-monotonic, overlap, or intrude into the header.
    #[error("non-monotonic payload offsets")]
    Offsets,
}

impl<S, D> From<SizeError<S, D>> for DecodeErr {
    #[track_caller]
    fn from(_: SizeError<S, D>) -> Self {
        DecodeErr::Length
    }
}

impl<A, S, V> From<ConvertError<A, S, V>> for DecodeErr {
    #[track_caller]
    fn from(err: ConvertError<A, S, V>) -> Self {
        match err {
            ConvertError::Alignment(_) => panic!("all zerocopy transmutations must be unaligned"),
            ConvertError::Size(_) => DecodeErr::Length,
            ConvertError::Validity(_) => DecodeErr::Shape,
        }
    }
}
