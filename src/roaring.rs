use std::{fmt::Debug, ops::Range};

use bytes::Bytes;
use itertools::Itertools;

use crate::{
    codec::{
        Encodable,
        container_ref::ContainerRef,
        encoder::Encoder,
        layout::{PAYLOAD_REGION_ALIGN, header_size, pack_shape_offset},
    },
    container::Container,
};

/// A mutable compressed set of `u32` values.
///
/// Values are partitioned by their high 16 bits into containers holding the low 16 bits; the
/// entry sequence is strictly ascending by key and never holds an empty container.
///
/// ```
/// use quiver_rs::RoaringBitmap;
///
/// let mut bitmap = RoaringBitmap::from_iter([1, 2, 3]);
/// bitmap.insert(100_000);
/// assert_eq!(bitmap.cardinality(), 4);
/// assert!(bitmap.contains(100_000));
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RoaringBitmap {
    pub(crate) entries: Vec<Entry>,
}

#[derive(Clone, PartialEq, Eq)]
pub(crate) struct Entry {
    pub key: u16,
    pub container: Container,
}

#[inline]
fn split(value: u32) -> (u16, u16) {
    ((value >> 16) as u16, value as u16)
}

#[inline]
fn join(key: u16, low: u16) -> u32 {
    (key as u32) << 16 | low as u32
}

impl RoaringBitmap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The set holding every value in `range`.
    pub fn from_range(range: Range<u32>) -> Self {
        if range.is_empty() {
            return Self::default();
        }
        let (first_key, first_low) = split(range.start);
        let (last_key, last_low) = split(range.end - 1);
        let entries = (first_key..=last_key)
            .map(|key| {
                let lo = if key == first_key { first_low } else { 0 };
                let hi = if key == last_key { last_low } else { u16::MAX };
                Entry { key, container: Container::from_range(lo, hi) }
            })
            .collect();
        RoaringBitmap { entries }
    }

    /// Total number of values in the set.
    pub fn cardinality(&self) -> usize {
        self.entries.iter().map(|e| e.container.cardinality()).sum()
    }

    /// Alias for [`cardinality`](Self::cardinality).
    #[inline]
    pub fn len(&self) -> usize {
        self.cardinality()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, value: u32) -> bool {
        let (key, low) = split(value);
        match self.entry_index(key) {
            Ok(idx) => self.entries[idx].container.contains(low),
            Err(_) => false,
        }
    }

    /// Inserts `value`, returning `true` if it was not already present.
    pub fn insert(&mut self, value: u32) -> bool {
        let (key, low) = split(value);
        match self.entry_index(key) {
            Ok(idx) => self.entries[idx].container.insert(low),
            Err(idx) => {
                let container = Container::from_sorted(vec![low]);
                self.entries.insert(idx, Entry { key, container });
                true
            }
        }
    }

    /// Removes `value` if present, returning `true` if the removal occurred.
    pub fn remove(&mut self, value: u32) -> bool {
        let (key, low) = split(value);
        match self.entry_index(key) {
            Ok(idx) => {
                let removed = self.entries[idx].container.remove(low);
                if self.entries[idx].container.is_empty() {
                    self.entries.remove(idx);
                }
                removed
            }
            Err(_) => false,
        }
    }

    pub fn min(&self) -> Option<u32> {
        let entry = self.entries.first()?;
        entry.container.min().map(|low| join(entry.key, low))
    }

    pub fn max(&self) -> Option<u32> {
        let entry = self.entries.last()?;
        entry.container.max().map(|low| join(entry.key, low))
    }

    /// Number of values less than or equal to `value`.
    pub fn rank(&self, value: u32) -> usize {
        let (key, low) = split(value);
        let mut rank = 0;
        for entry in &self.entries {
            if entry.key < key {
                rank += entry.container.cardinality();
            } else {
                if entry.key == key {
                    rank += entry.container.rank(low);
                }
                break;
            }
        }
        rank
    }

    /// The `idx`-th value in ascending order, if `idx < cardinality`.
    pub fn select(&self, idx: usize) -> Option<u32> {
        let mut remaining = idx;
        for entry in &self.entries {
            let cardinality = entry.container.cardinality();
            if remaining < cardinality {
                return entry.container.select(remaining).map(|low| join(entry.key, low));
            }
            remaining -= cardinality;
        }
        None
    }

    /// Ascending iterator over all values.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries
            .iter()
            .flat_map(|entry| entry.container.iter().map(move |low| join(entry.key, low)))
    }

    /// Inserts every value in `range`.
    pub fn insert_range(&mut self, range: Range<u32>) {
        if !range.is_empty() {
            *self |= &RoaringBitmap::from_range(range);
        }
    }

    /// Removes every value in `range`.
    pub fn remove_range(&mut self, range: Range<u32>) {
        if !range.is_empty() {
            *self -= &RoaringBitmap::from_range(range);
        }
    }

    /// A copy restricted to `start..stop`.
    pub fn clamp(&self, start: u32, stop: u32) -> RoaringBitmap {
        clamp_entries(self.view_entries(), start, stop)
    }

    /// True iff every value of `self` is contained in `other`.
    pub fn is_subset(&self, other: &RoaringBitmap) -> bool {
        if self.cardinality() > other.cardinality() {
            return false;
        }
        self.entries.iter().all(|entry| match other.entry_index(entry.key) {
            Ok(idx) => entry.container.is_subset(&other.entries[idx].container.as_view()),
            Err(_) => false,
        })
    }

    /// True iff `self` and `other` share no value.
    pub fn is_disjoint(&self, other: &RoaringBitmap) -> bool {
        self.entries.iter().all(|entry| match other.entry_index(entry.key) {
            Ok(idx) => !entry.container.intersects(&other.entries[idx].container.as_view()),
            Err(_) => true,
        })
    }

    /// Jaccard distance `1 − |A ∩ B| / |A ∪ B|`; two empty sets are at distance 1.
    pub fn jaccard(&self, other: &RoaringBitmap) -> f64 {
        let cardinality = self.cardinality() + other.cardinality();
        let intersection = (self & other).cardinality();
        let union = cardinality - intersection;
        if union == 0 {
            1.0
        } else {
            1.0 - intersection as f64 / union as f64
        }
    }

    /// Pure union; see also the `|` and `|=` operators.
    #[inline]
    pub fn union(&self, other: &RoaringBitmap) -> RoaringBitmap {
        self | other
    }

    /// Pure intersection; see also the `&` and `&=` operators.
    #[inline]
    pub fn intersection(&self, other: &RoaringBitmap) -> RoaringBitmap {
        self & other
    }

    /// Pure difference; see also the `-` and `-=` operators.
    #[inline]
    pub fn difference(&self, other: &RoaringBitmap) -> RoaringBitmap {
        self - other
    }

    /// Pure symmetric difference; see also the `^` and `^=` operators.
    #[inline]
    pub fn symmetric_difference(&self, other: &RoaringBitmap) -> RoaringBitmap {
        self ^ other
    }

    /// Serialize into the frozen byte layout. The result is byte-stable: freezing an equal
    /// bitmap always produces an identical buffer.
    pub fn freeze(&self) -> Bytes {
        self.encode_to_bytes()
    }

    fn entry_index(&self, key: u16) -> Result<usize, usize> {
        self.entries.binary_search_by_key(&key, |entry| entry.key)
    }

    pub(crate) fn view_entries(&self) -> impl Iterator<Item = (u16, ContainerRef<'_>)> {
        self.entries.iter().map(|entry| (entry.key, entry.container.as_view()))
    }

    pub(crate) fn from_entries(entries: Vec<Entry>) -> Self {
        debug_assert!(entries.is_sorted_by(|a, b| a.key < b.key));
        debug_assert!(entries.iter().all(|e| !e.container.is_empty()));
        RoaringBitmap { entries }
    }

    /// Byte offset of every container payload plus the total encoded size.
    fn layout(&self) -> (Vec<usize>, usize) {
        let mut cursor = header_size(self.entries.len());
        if !self.entries.is_empty() {
            cursor = cursor.next_multiple_of(PAYLOAD_REGION_ALIGN);
        }
        let mut offsets = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let shape = entry.container.shape();
            cursor = cursor.next_multiple_of(shape.alignment());
            offsets.push(cursor);
            cursor += shape.payload_size(entry.container.cardinality());
        }
        (offsets, cursor)
    }
}

/// Copy the entries overlapping `start..stop`, intersecting the boundary containers with the
/// clipped low ranges.
pub(crate) fn clamp_entries<'a>(
    entries: impl Iterator<Item = (u16, ContainerRef<'a>)>,
    start: u32,
    stop: u32,
) -> RoaringBitmap {
    if start >= stop {
        return RoaringBitmap::default();
    }
    let (first_key, first_low) = split(start);
    let (last_key, last_low) = split(stop - 1);

    let mut out = Vec::new();
    for (key, view) in entries {
        if key < first_key || key > last_key {
            continue;
        }
        let lo = if key == first_key { first_low } else { 0 };
        let hi = if key == last_key { last_low } else { u16::MAX };
        let mut container = view.to_container();
        if (lo, hi) != (0, u16::MAX) {
            container &= Container::from_range(lo, hi).as_view();
        }
        if !container.is_empty() {
            out.push(Entry { key, container });
        }
    }
    RoaringBitmap::from_entries(out)
}

impl FromIterator<u32> for RoaringBitmap {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut values: Vec<u32> = iter.into_iter().collect();
        values.sort_unstable();
        values.dedup();

        let mut entries = Vec::new();
        let groups = values.into_iter().chunk_by(|&value| (value >> 16) as u16);
        for (key, group) in &groups {
            let lows: Vec<u16> = group.map(|value| value as u16).collect();
            entries.push(Entry { key, container: Container::from_sorted(lows) });
        }
        RoaringBitmap { entries }
    }
}

impl Extend<u32> for RoaringBitmap {
    fn extend<I: IntoIterator<Item = u32>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl Debug for RoaringBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoaringBitmap")
            .field("cardinality", &self.cardinality())
            .field("keys", &self.entries.len())
            .finish()
    }
}

impl Encodable for RoaringBitmap {
    fn encoded_size(&self) -> usize {
        self.layout().1
    }

    fn encode<B: bytes::BufMut>(&self, encoder: &mut Encoder<B>) {
        let (offsets, total) = self.layout();

        encoder.put_u32(self.entries.len() as u32);
        for entry in &self.entries {
            encoder.put_u32(entry.key as u32);
        }
        for entry in &self.entries {
            encoder.put_u32((entry.container.cardinality() - 1) as u32);
        }
        for (entry, &offset) in self.entries.iter().zip(&offsets) {
            encoder.put_u32(pack_shape_offset(entry.container.shape(), offset));
        }
        for (entry, &offset) in self.entries.iter().zip(&offsets) {
            encoder.pad_to(offset);
            entry.container.write_payload(encoder);
        }
        debug_assert_eq!(encoder.bytes_written(), total);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::{collection::btree_set, proptest};
    use quickcheck_macros::quickcheck;

    use super::*;
    use crate::testutil::{SetGen, mkroaring};

    #[test]
    fn test_sanity() {
        let mut bitmap = RoaringBitmap::new();
        assert!(bitmap.is_empty());
        assert!(bitmap.insert(1));
        assert!(!bitmap.insert(1));
        assert!(bitmap.contains(1));
        assert!(!bitmap.contains(2));

        for value in [1024, 123, 16384, 100_000, u32::MAX, 0] {
            assert!(bitmap.insert(value));
            assert!(bitmap.contains(value));
        }

        assert_eq!(bitmap.cardinality(), 7);
        assert_eq!(bitmap.min(), Some(0));
        assert_eq!(bitmap.max(), Some(u32::MAX));

        assert!(bitmap.remove(u32::MAX));
        assert!(!bitmap.remove(u32::MAX));
        assert_eq!(bitmap.max(), Some(100_000));

        bitmap.clear();
        assert!(bitmap.is_empty());
        assert_eq!(bitmap.min(), None);
    }

    #[test]
    fn test_sparse_keys() {
        // one value per key
        let bitmap = RoaringBitmap::from_iter((0..10u32).map(|k| k * 65536));
        assert_eq!(bitmap.cardinality(), 10);
        assert_eq!(bitmap.entries.len(), 10);
        assert_eq!(bitmap.select(5), Some(5 * 65536));
        assert!(bitmap.iter().eq((0..10u32).map(|k| k * 65536)));
    }

    #[test]
    fn test_range_spanning_keys() {
        let bitmap = RoaringBitmap::from_range(0..70_000);
        assert_eq!(bitmap.cardinality(), 70_000);
        assert_eq!(bitmap.entries.len(), 2);
        // key 0 is saturated, key 1 holds 4464 values
        assert_eq!(bitmap.entries[0].container.cardinality(), 65536);
        assert_eq!(bitmap.entries[1].container.cardinality(), 4464);
        assert!(bitmap.contains(0));
        assert!(bitmap.contains(69_999));
        assert!(!bitmap.contains(70_000));
    }

    #[test]
    fn test_insert_remove_range() {
        let mut bitmap = RoaringBitmap::from_iter([5, 100, 200_000]);
        bitmap.insert_range(50..150);
        assert_eq!(bitmap.cardinality(), 102);
        bitmap.remove_range(0..1 << 17);
        assert!(bitmap.iter().eq([200_000]));

        bitmap.insert_range(10..10);
        assert_eq!(bitmap.cardinality(), 1);

        let mut bitmap = RoaringBitmap::new();
        bitmap.insert_range(u32::MAX - 1..u32::MAX);
        assert!(bitmap.iter().eq([u32::MAX - 1]));
    }

    #[test]
    fn test_clamp() {
        let bitmap = RoaringBitmap::from_iter([1, 2, 3, 65_536, 70_000, 200_000]);
        assert!(bitmap.clamp(2, 70_000).iter().eq([2, 3, 65_536]));
        assert!(bitmap.clamp(0, u32::MAX).iter().eq(bitmap.iter()));
        assert!(bitmap.clamp(5, 5).is_empty());
        assert!(bitmap.clamp(70_001, 200_000).is_empty());
    }

    #[test]
    fn test_rank_select_roundtrip() {
        let mut setgen = SetGen::new(0xFEED);
        let values = setgen.random(2000);
        let bitmap = mkroaring(&values);
        for (idx, &value) in values.iter().enumerate() {
            assert_eq!(bitmap.select(bitmap.rank(value) - 1), Some(value));
            assert_eq!(bitmap.select(idx), Some(value));
        }
        assert_eq!(bitmap.select(values.len()), None);
        assert_eq!(bitmap.rank(u32::MAX), values.len());
    }

    #[test]
    fn test_subset_disjoint() {
        let a = mkroaring(&[1, 2, 3]);
        let b = mkroaring(&[1, 2, 3, 70_000]);
        let c = mkroaring(&[70_000]);

        assert!(a.is_subset(&b));
        assert!(!b.is_subset(&a));
        assert!(a.is_subset(&a));
        assert!(RoaringBitmap::new().is_subset(&a));

        assert!(a.is_disjoint(&c));
        assert!(!b.is_disjoint(&c));
        assert!(RoaringBitmap::new().is_disjoint(&RoaringBitmap::new()));
    }

    #[test]
    fn test_jaccard() {
        let a = mkroaring(&[0, 6, 8]);
        let b = mkroaring(&[1, 7, 6]);
        // |∩| = 1, |∪| = 5
        assert_eq!(a.jaccard(&b), 1.0 - 1.0 / 5.0);
        assert_eq!(a.jaccard(&a), 0.0);
        assert_eq!(RoaringBitmap::new().jaccard(&RoaringBitmap::new()), 1.0);
        assert_eq!(RoaringBitmap::new().jaccard(&a), 1.0);
    }

    #[test]
    fn test_against_reference_impl() {
        let mut setgen = SetGen::new(0xACE);
        let values = setgen.random(10_000);
        let ours = mkroaring(&values);
        let reference = roaring::RoaringBitmap::from_sorted_iter(values.iter().copied()).unwrap();

        assert_eq!(ours.cardinality() as u64, reference.len());
        assert!(ours.iter().eq(reference.iter()));
        for probe in setgen.random(1000) {
            assert_eq!(ours.contains(probe), reference.contains(probe));
        }
    }

    proptest! {
        #[test]
        fn test_iter_matches_set(set in btree_set(0u32..2_000_000, 0..512)) {
            let bitmap = RoaringBitmap::from_iter(set.iter().copied());
            assert_eq!(bitmap.cardinality(), set.len());
            assert!(bitmap.iter().eq(set.iter().copied()));
            assert_eq!(bitmap.min(), set.first().copied());
            assert_eq!(bitmap.max(), set.last().copied());
        }

        #[test]
        fn test_insert_remove_matches_set(
            mut set in btree_set(0u32..100_000, 0..256),
            edits in proptest::collection::vec((proptest::bool::ANY, 0u32..100_000), 0..64),
        ) {
            let mut bitmap = RoaringBitmap::from_iter(set.iter().copied());
            for (add, value) in edits {
                if add {
                    assert_eq!(bitmap.insert(value), set.insert(value));
                } else {
                    assert_eq!(bitmap.remove(value), set.remove(&value));
                }
            }
            assert!(bitmap.iter().eq(set.iter().copied()));
        }

        #[test]
        fn test_clamp_matches_set(
            set in btree_set(0u32..200_000, 0..256),
            start in 0u32..200_000,
            len in 0u32..100_000,
        ) {
            let stop = start.saturating_add(len);
            let bitmap = RoaringBitmap::from_iter(set.iter().copied());
            let clamped = bitmap.clamp(start, stop);
            let expected: BTreeSet<u32> =
                set.iter().copied().filter(|&v| v >= start && v < stop).collect();
            assert!(clamped.iter().eq(expected.iter().copied()));
        }
    }

    #[quickcheck]
    fn test_contains_quickcheck(set: Vec<u32>) -> bool {
        let bitmap = RoaringBitmap::from_iter(set.iter().copied());
        if set.is_empty() {
            !bitmap.contains(123)
        } else {
            bitmap.contains(set[set.len() / 3])
        }
    }

    #[quickcheck]
    fn test_rank_counts_le(set: BTreeSet<u32>, probe: u32) -> bool {
        let bitmap = RoaringBitmap::from_iter(set.iter().copied());
        bitmap.rank(probe) == set.iter().filter(|&&v| v <= probe).count()
    }
}
