//! Quiver is a [Roaring Bitmap](https://roaringbitmap.org/) library for sets of 32-bit unsigned
//! integers (`u32`), built around a serialized form that can be queried in place.
//!
//! ## Key Features:
//!
//! - **Three container shapes**: each 16-bit bucket is stored as a sorted array, a 65536-bit
//!   bitmap, or a sorted list of *absent* values, switching representation automatically as its
//!   cardinality crosses the 4096 / 61440 thresholds.
//!
//! - **Zero-copy access**: [`RoaringRef`] reads a frozen bitmap directly from any type
//!   implementing `Deref<Target = [u8]>`, such as an in-memory buffer or a memory-mapped file,
//!   without deserializing.
//!
//! - **Bitmap packs**: [`Quiver`] lays an ordered sequence of frozen bitmaps into one contiguous
//!   buffer with bulk multi-way intersection and Jaccard-distance batches.

pub mod bits;

mod codec;
mod container;
mod multi;
mod roaring;
mod roaring_ops;
mod roaring_ref;

#[cfg(test)]
mod testutil;

pub use codec::{DecodeErr, Encodable, encoder::Encoder};
pub use multi::{OpenErr, Quiver};
pub use roaring::RoaringBitmap;
pub use roaring_ref::RoaringRef;
