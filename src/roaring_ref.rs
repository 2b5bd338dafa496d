use std::{fmt::Debug, ops::Deref};

use bytes::Bytes;
use zerocopy::{FromBytes, LE, U16, U32, U64};

use crate::{
    RoaringBitmap,
    codec::{
        DecodeErr, Encodable,
        container_ref::{BitmapRef, ContainerRef, ValuesRef},
        layout::{PAYLOAD_REGION_ALIGN, Shape, header_size, unpack_shape_offset},
    },
    container::{VALUE_SPAN, bitmap::WORDS},
    roaring::{Entry, clamp_entries},
};

/// A read-only bitmap view over a frozen buffer.
///
/// The buffer is validated once in [`from_bytes`](Self::from_bytes); every read afterwards
/// decodes containers lazily without copying. Set algebra against a `RoaringRef` produces new
/// [`RoaringBitmap`]s.
///
/// ```
/// use quiver_rs::{RoaringBitmap, RoaringRef};
///
/// let frozen = RoaringBitmap::from_iter([1, 65537, 131073]).freeze();
/// let bitmap = RoaringRef::from_bytes(frozen).unwrap();
/// assert!(bitmap.contains(131073));
/// assert_eq!(bitmap.cardinality(), 3);
/// ```
#[derive(Clone)]
pub struct RoaringRef<B> {
    pub(crate) data: B,
}

impl<B> RoaringRef<B> {
    #[inline]
    pub fn inner(&self) -> &B {
        &self.data
    }

    #[inline]
    pub fn into_inner(self) -> B {
        self.data
    }
}

impl<B: Deref<Target = [u8]>> RoaringRef<B> {
    /// Validates `data` and wraps it. The header, key order, shape tags, payload alignment and
    /// payload bounds are checked here; reads afterwards trust the header.
    pub fn from_bytes(data: B) -> Result<Self, DecodeErr> {
        EntriesRef::parse(&data)?.validate(data.len())?;
        Ok(Self { data })
    }

    pub(crate) fn load(&self) -> EntriesRef<'_> {
        EntriesRef::parse(&self.data).expect("buffer validated in from_bytes")
    }

    pub fn cardinality(&self) -> usize {
        let view = self.load();
        (0..view.len()).map(|idx| view.cardinality(idx)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.load().len() == 0
    }

    pub fn contains(&self, value: u32) -> bool {
        let view = self.load();
        match view.search((value >> 16) as u16) {
            Some(idx) => view.container(idx).contains(value as u16),
            None => false,
        }
    }

    /// Number of values less than or equal to `value`.
    pub fn rank(&self, value: u32) -> usize {
        let view = self.load();
        let key = (value >> 16) as u16;
        let mut rank = 0;
        for idx in 0..view.len() {
            let entry_key = view.key(idx);
            if entry_key < key {
                rank += view.cardinality(idx);
            } else {
                if entry_key == key {
                    rank += view.container(idx).rank(value as u16);
                }
                break;
            }
        }
        rank
    }

    /// The `idx`-th value in ascending order, if `idx < cardinality`.
    pub fn select(&self, idx: usize) -> Option<u32> {
        let view = self.load();
        let mut remaining = idx;
        for entry in 0..view.len() {
            let cardinality = view.cardinality(entry);
            if remaining < cardinality {
                let low = view.container(entry).select(remaining)?;
                return Some((view.key(entry) as u32) << 16 | low as u32);
            }
            remaining -= cardinality;
        }
        None
    }

    pub fn min(&self) -> Option<u32> {
        let view = self.load();
        if view.len() == 0 {
            return None;
        }
        let low = view.container(0).min()?;
        Some((view.key(0) as u32) << 16 | low as u32)
    }

    pub fn max(&self) -> Option<u32> {
        let view = self.load();
        let last = view.len().checked_sub(1)?;
        let low = view.container(last).max()?;
        Some((view.key(last) as u32) << 16 | low as u32)
    }

    /// Ascending iterator over all values.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.load()
            .iter()
            .flat_map(|(key, view)| view.iter().map(move |low| (key as u32) << 16 | low as u32))
    }

    /// Deep-copy into a mutable bitmap.
    pub fn to_roaring(&self) -> RoaringBitmap {
        let entries = self
            .load()
            .iter()
            .map(|(key, view)| Entry { key, container: view.to_container() })
            .collect();
        RoaringBitmap::from_entries(entries)
    }

    /// A mutable copy restricted to `start..stop`, built without materializing the rest of the
    /// bitmap.
    pub fn clamp(&self, start: u32, stop: u32) -> RoaringBitmap {
        clamp_entries(self.load().iter(), start, stop)
    }
}

impl RoaringRef<memmap2::Mmap> {
    /// Open a frozen bitmap file read-only through a memory map and validate it.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, crate::OpenErr> {
        let file = std::fs::File::open(path)?;
        // SAFETY: the map is read-only; callers must not truncate the file while the view
        // is alive.
        let data = unsafe { memmap2::Mmap::map(&file)? };
        Ok(Self::from_bytes(data)?)
    }
}

impl RoaringBitmap {
    /// Freeze into an owned, validated [`RoaringRef`].
    pub fn freeze_ref(&self) -> RoaringRef<Bytes> {
        RoaringRef { data: self.freeze() }
    }
}

impl<B: Deref<Target = [u8]>> Debug for RoaringRef<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoaringRef")
            .field("cardinality", &self.cardinality())
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl<B: Deref<Target = [u8]>> Encodable for RoaringRef<B> {
    #[inline]
    fn encoded_size(&self) -> usize {
        self.data.len()
    }

    #[inline]
    fn encode<T: bytes::BufMut>(&self, encoder: &mut crate::codec::encoder::Encoder<T>) {
        encoder.put_slice(&self.data);
    }
}

impl<B: Deref<Target = [u8]>> PartialEq for RoaringRef<B> {
    fn eq(&self, other: &Self) -> bool {
        *self.data == *other.data
    }
}

impl<B: Deref<Target = [u8]>> PartialEq<RoaringBitmap> for RoaringRef<B> {
    fn eq(&self, other: &RoaringBitmap) -> bool {
        other == self
    }
}

impl<B: Deref<Target = [u8]>> PartialEq<RoaringRef<B>> for RoaringBitmap {
    fn eq(&self, other: &RoaringRef<B>) -> bool {
        let view = other.load();
        self.entries.len() == view.len()
            && self
                .view_entries()
                .zip(view.iter())
                .all(|((key, container), (ref_key, ref_container))| {
                    key == ref_key && container_eq(&container, &ref_container)
                })
    }
}

fn container_eq(a: &ContainerRef<'_>, b: &ContainerRef<'_>) -> bool {
    a.cardinality() == b.cardinality() && a.iter().eq(b.iter())
}

/// The decoded header of a frozen bitmap: three parallel tables plus the payload region.
#[derive(Clone, Copy)]
pub(crate) struct EntriesRef<'a> {
    keys: &'a [U32<LE>],
    cardinalities: &'a [U32<LE>],
    shapes: &'a [U32<LE>],
    data: &'a [u8],
}

impl<'a> EntriesRef<'a> {
    /// Split the header tables out of `data`. Bounds-checks the header only; `validate`
    /// performs the per-entry checks.
    pub fn parse(data: &'a [u8]) -> Result<Self, DecodeErr> {
        let (n_keys, rest) = U32::<LE>::ref_from_prefix(data)?;
        let n_keys = n_keys.get() as usize;
        if n_keys > VALUE_SPAN {
            return Err(DecodeErr::KeyCount);
        }
        let (keys, rest) = <[U32<LE>]>::ref_from_prefix_with_elems(rest, n_keys)?;
        let (cardinalities, rest) = <[U32<LE>]>::ref_from_prefix_with_elems(rest, n_keys)?;
        let (shapes, _) = <[U32<LE>]>::ref_from_prefix_with_elems(rest, n_keys)?;
        Ok(EntriesRef { keys, cardinalities, shapes, data })
    }

    pub fn validate(&self, buf_len: usize) -> Result<(), DecodeErr> {
        let mut cursor = header_size(self.len());
        if self.len() > 0 {
            cursor = cursor.next_multiple_of(PAYLOAD_REGION_ALIGN);
        }
        let mut prev_key = None;
        for idx in 0..self.len() {
            let key = self.keys[idx].get();
            if key as usize >= VALUE_SPAN || prev_key.is_some_and(|prev| prev >= key) {
                return Err(DecodeErr::Keys);
            }
            prev_key = Some(key);

            let cardinality = self.cardinalities[idx].get() as usize + 1;
            if cardinality > VALUE_SPAN {
                return Err(DecodeErr::Cardinality);
            }

            let (tag, offset) = unpack_shape_offset(self.shapes[idx].get());
            let shape = Shape::from_tag(tag)?;
            if offset % shape.alignment() != 0 {
                return Err(DecodeErr::Alignment);
            }
            if offset < cursor {
                return Err(DecodeErr::Offsets);
            }
            let end = offset + shape.payload_size(cardinality);
            if end > buf_len {
                return Err(DecodeErr::Length);
            }
            cursor = end;
        }
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn key(&self, idx: usize) -> u16 {
        self.keys[idx].get() as u16
    }

    #[inline]
    pub fn cardinality(&self, idx: usize) -> usize {
        self.cardinalities[idx].get() as usize + 1
    }

    /// Index of the entry holding `key`, if any.
    pub fn search(&self, key: u16) -> Option<usize> {
        self.keys
            .binary_search_by(|probe| probe.get().cmp(&(key as u32)))
            .ok()
    }

    /// Decode the `idx`-th container payload in place.
    pub fn container(&self, idx: usize) -> ContainerRef<'a> {
        let cardinality = self.cardinality(idx);
        let (tag, offset) = unpack_shape_offset(self.shapes[idx].get());
        let shape = Shape::from_tag(tag).expect("buffer validated in from_bytes");
        let payload = &self.data[offset..offset + shape.payload_size(cardinality)];
        match shape {
            Shape::Array => {
                let values = <[U16<LE>]>::ref_from_bytes(payload).expect("validated payload");
                ContainerRef::Array(ValuesRef::new(values))
            }
            Shape::Bitmap => {
                let words =
                    <[U64<LE>; WORDS]>::ref_from_bytes(payload).expect("validated payload");
                ContainerRef::Bitmap(BitmapRef::new(words, cardinality))
            }
            Shape::Inverted => {
                let absent = <[U16<LE>]>::ref_from_bytes(payload).expect("validated payload");
                ContainerRef::Inverted(ValuesRef::new(absent))
            }
        }
    }

    pub fn iter(self) -> impl Iterator<Item = (u16, ContainerRef<'a>)> + 'a {
        (0..self.len()).map(move |idx| (self.key(idx), self.container(idx)))
    }
}
