use std::{fs::File, io::Write, ops::Range, path::Path};

use bytes::{Bytes, BytesMut};
use memmap2::Mmap;
use thiserror::Error;
use zerocopy::{FromBytes, LE, U32};

use crate::{
    RoaringBitmap, RoaringRef,
    codec::{DecodeErr, Encodable, encoder::Encoder, layout::PAYLOAD_REGION_ALIGN},
};

/// Errors that can occur when building or opening a pack file.
#[derive(Debug, Error)]
pub enum OpenErr {
    #[error("i/o failure")]
    Io(#[from] std::io::Error),

    #[error("invalid buffer")]
    Decode(#[from] DecodeErr),
}

/// An ordered pack of frozen bitmaps in one contiguous buffer.
///
/// The header records a byte offset and size per member (`size == 0` marks an absent slot);
/// member buffers follow back to back at 32-byte-aligned offsets, so the whole pack can be
/// memory-mapped and queried in place.
///
/// ```
/// use quiver_rs::{Quiver, RoaringBitmap};
///
/// let bitmaps = [
///     RoaringBitmap::from_iter([0, 1, 2]),
///     RoaringBitmap::from_iter([1, 6, 8]),
/// ];
/// let quiver = Quiver::from_bitmaps(&bitmaps);
/// assert_eq!(quiver.len(), 2);
/// assert!(quiver.get(1).unwrap().contains(6));
/// ```
pub struct Quiver<B> {
    data: B,
}

impl Quiver<Bytes> {
    /// Pack `bitmaps` into an in-memory buffer. Empty bitmaps become absent slots.
    pub fn from_bitmaps<'a>(bitmaps: impl IntoIterator<Item = &'a RoaringBitmap>) -> Self {
        let frozen: Vec<Bytes> = bitmaps.into_iter().map(|b| b.encode_to_bytes()).collect();

        let header = header_size(frozen.len());
        let mut cursor = header.next_multiple_of(PAYLOAD_REGION_ALIGN);
        let mut offsets = Vec::with_capacity(frozen.len());
        for buf in &frozen {
            offsets.push(cursor);
            if !is_empty_member(buf) {
                cursor += buf.len();
                cursor = cursor.next_multiple_of(PAYLOAD_REGION_ALIGN);
            }
        }

        let mut encoder = Encoder::new(BytesMut::with_capacity(cursor));
        encoder.put_u32(frozen.len() as u32);
        for &offset in &offsets {
            encoder.put_u32(offset as u32);
        }
        for buf in &frozen {
            let size = if is_empty_member(buf) { 0 } else { buf.len() };
            encoder.put_u32(size as u32);
        }
        for (buf, &offset) in frozen.iter().zip(&offsets) {
            if !is_empty_member(buf) {
                encoder.pad_to(offset);
                encoder.put_slice(buf);
            }
        }

        Quiver { data: encoder.into_inner().freeze() }
    }

    /// Pack `bitmaps` into `path`, flush, and reopen the file read-only as a map.
    ///
    /// The file is created (or truncated) in read-write mode and fully synced before the
    /// writer handle is released.
    pub fn create<'a>(
        path: impl AsRef<Path>,
        bitmaps: impl IntoIterator<Item = &'a RoaringBitmap>,
    ) -> Result<Quiver<Mmap>, OpenErr> {
        let packed = Self::from_bitmaps(bitmaps);
        let mut file = File::create(&path)?;
        file.write_all(&packed.data)?;
        file.sync_all()?;
        drop(file);
        Quiver::open(path)
    }
}

impl Quiver<Mmap> {
    /// Open a pack file read-only through a memory map and validate it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, OpenErr> {
        let file = File::open(path)?;
        // SAFETY: the map is read-only; callers must not truncate the file while the Quiver
        // is alive.
        let data = unsafe { Mmap::map(&file)? };
        Ok(Quiver::from_bytes(data)?)
    }
}

impl<B: std::ops::Deref<Target = [u8]>> Quiver<B> {
    /// Validates the pack header and every member buffer.
    pub fn from_bytes(data: B) -> Result<Self, DecodeErr> {
        let header = HeaderRef::parse(&data)?;
        let aligned_header = header_size(header.len()).next_multiple_of(PAYLOAD_REGION_ALIGN);
        let mut prev_offset = 0;
        for idx in 0..header.len() {
            let (offset, size) = header.slot(idx);
            if offset < prev_offset {
                return Err(DecodeErr::Offsets);
            }
            prev_offset = offset;
            if size == 0 {
                continue;
            }
            if offset % PAYLOAD_REGION_ALIGN != 0 {
                return Err(DecodeErr::Alignment);
            }
            if offset < aligned_header {
                return Err(DecodeErr::Offsets);
            }
            let end = offset.checked_add(size).ok_or(DecodeErr::Length)?;
            if end > data.len() {
                return Err(DecodeErr::Length);
            }
            RoaringRef::from_bytes(&data[offset..end])?;
        }
        Ok(Quiver { data })
    }

    /// Number of member slots, including absent ones.
    pub fn len(&self) -> usize {
        self.header().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// End of the last member relative to the start of the buffer.
    pub fn buf_size(&self) -> usize {
        let header = self.header();
        match header.len().checked_sub(1) {
            Some(last) => {
                let (offset, size) = header.slot(last);
                offset + size
            }
            None => header_size(0),
        }
    }

    /// The member at `idx`, or `None` if the slot is absent or out of range.
    pub fn get(&self, idx: usize) -> Option<RoaringRef<&[u8]>> {
        let header = self.header();
        if idx >= header.len() {
            return None;
        }
        let (offset, size) = header.slot(idx);
        if size == 0 {
            return None;
        }
        // validated in from_bytes
        Some(RoaringRef { data: &self.data[offset..offset + size] })
    }

    /// Member views in slot order; absent slots yield `None`.
    pub fn iter(&self) -> impl Iterator<Item = Option<RoaringRef<&[u8]>>> {
        (0..self.len()).map(|idx| self.get(idx))
    }

    /// Multi-way intersection of the members at `indexes`, optionally clamped to `bounds`.
    ///
    /// Members are intersected smallest-first so intermediates stay small, short-circuiting
    /// once the accumulator empties. Returns `None` when any index is out of range or absent,
    /// when `indexes` is empty, or when the result is empty, so `Some` always carries a
    /// non-empty bitmap.
    pub fn intersection(
        &self,
        indexes: &[u32],
        bounds: Option<Range<u32>>,
    ) -> Option<RoaringBitmap> {
        let mut order = Vec::with_capacity(indexes.len());
        for &idx in indexes {
            let member = self.get(idx as usize)?;
            order.push((member.inner().len(), idx));
        }
        // smallest serialized member first minimizes the intermediate size
        order.sort_unstable();

        let (_, seed) = *order.first()?;
        let seed = self.get(seed as usize)?;
        let mut acc = match bounds {
            Some(range) => seed.clamp(range.start, range.end),
            None => seed.to_roaring(),
        };
        for &(_, idx) in &order[1..] {
            if acc.is_empty() {
                break;
            }
            acc &= &self.get(idx as usize)?;
        }
        (!acc.is_empty()).then_some(acc)
    }

    /// Pairwise Jaccard distances between the members at `a[i]` and `b[i]`.
    ///
    /// Absent or out-of-range members are at distance 1 from everything, as are two empty
    /// sets.
    pub fn jaccard_distances(&self, a: &[u32], b: &[u32]) -> Vec<f64> {
        debug_assert_eq!(a.len(), b.len(), "index lists must be parallel");
        a.iter()
            .zip(b)
            .map(|(&i, &j)| self.jaccard_pair(i as usize, j as usize))
            .collect()
    }

    fn jaccard_pair(&self, a: usize, b: usize) -> f64 {
        let (Some(a), Some(b)) = (self.get(a), self.get(b)) else {
            return 1.0;
        };
        let cardinality = a.cardinality() + b.cardinality();
        // intersect starting from the smaller member
        let (small, big) = if a.cardinality() <= b.cardinality() { (a, b) } else { (b, a) };
        let mut acc = small.to_roaring();
        acc &= &big;
        let intersection = acc.cardinality();
        let union = cardinality - intersection;
        if union == 0 {
            1.0
        } else {
            1.0 - intersection as f64 / union as f64
        }
    }

    fn header(&self) -> HeaderRef<'_> {
        HeaderRef::parse(&self.data).expect("buffer validated in from_bytes")
    }
}

/// Pack header size for `n` members, before alignment padding.
fn header_size(n: usize) -> usize {
    4 + 8 * n
}

/// An empty bitmap encodes to a bare zero key count; it is stored as an absent slot.
fn is_empty_member(buf: &[u8]) -> bool {
    buf.len() == 4
}

#[derive(Clone, Copy)]
struct HeaderRef<'a> {
    offsets: &'a [U32<LE>],
    sizes: &'a [U32<LE>],
}

impl<'a> HeaderRef<'a> {
    fn parse(data: &'a [u8]) -> Result<Self, DecodeErr> {
        let (n, rest) = U32::<LE>::ref_from_prefix(data)?;
        let n = n.get() as usize;
        let (offsets, rest) = <[U32<LE>]>::ref_from_prefix_with_elems(rest, n)?;
        let (sizes, _) = <[U32<LE>]>::ref_from_prefix_with_elems(rest, n)?;
        Ok(HeaderRef { offsets, sizes })
    }

    fn len(&self) -> usize {
        self.offsets.len()
    }

    fn slot(&self, idx: usize) -> (usize, usize) {
        (self.offsets[idx].get() as usize, self.sizes[idx].get() as usize)
    }
}
