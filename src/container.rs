use std::ops::{BitAndAssign, BitOrAssign, BitXorAssign, SubAssign};

use either::Either;
use itertools::{EitherOrBoth, Itertools};
use zerocopy::{LE, U16, U64, transmute_ref};

use crate::{
    bits,
    codec::{
        container_ref::{BitmapRef, ContainerRef, ValuesRef},
        encoder::Encoder,
        layout::Shape,
    },
    container::{
        array::{ArrayContainer, merge_intersect, merge_subtract, merge_union, merge_xor},
        bitmap::{BitmapContainer, WORDS},
        inverted::InvertedContainer,
    },
};

pub(crate) mod array;
pub(crate) mod bitmap;
pub(crate) mod inverted;

/// Number of distinct 16-bit values.
pub(crate) const VALUE_SPAN: usize = 1 << 16;

/// Largest cardinality stored as a sorted array.
pub(crate) const ARRAY_MAX_LEN: usize = 4096;

/// Smallest cardinality stored as a sorted list of absent values.
pub(crate) const INVERTED_MIN_LEN: usize = VALUE_SPAN - 4096;

/// The set of 16-bit values sharing one high key, in one of three representations picked by
/// cardinality: a sorted array up to [`ARRAY_MAX_LEN`], a sorted list of absent values from
/// [`INVERTED_MIN_LEN`], and a 65536-bit bitmap in between.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Container {
    Array(ArrayContainer),
    Bitmap(BitmapContainer),
    Inverted(InvertedContainer),
}

impl Default for Container {
    fn default() -> Self {
        Container::Array(ArrayContainer::default())
    }
}

impl Container {
    /// Construct from a strictly increasing vec of values.
    pub fn from_sorted(values: Vec<u16>) -> Self {
        let mut container = Container::Array(ArrayContainer::from_sorted(values));
        container.normalize();
        container
    }

    /// The cheapest representation of the inclusive range `lo..=hi`.
    pub fn from_range(lo: u16, hi: u16) -> Self {
        debug_assert!(lo <= hi);
        let len = (hi - lo) as usize + 1;
        if len <= ARRAY_MAX_LEN {
            Container::Array(ArrayContainer::from_sorted((lo..=hi).collect()))
        } else if len >= INVERTED_MIN_LEN {
            let mut absent: Vec<u16> = (0..lo).collect();
            absent.extend((hi..u16::MAX).map(|v| v + 1));
            Container::Inverted(InvertedContainer::from_sorted_absent(absent))
        } else {
            Container::Bitmap(BitmapContainer::from_range(lo, hi))
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            Container::Array(_) => Shape::Array,
            Container::Bitmap(_) => Shape::Bitmap,
            Container::Inverted(_) => Shape::Inverted,
        }
    }

    pub fn cardinality(&self) -> usize {
        match self {
            Container::Array(arr) => arr.cardinality(),
            Container::Bitmap(bitmap) => bitmap.cardinality(),
            Container::Inverted(inv) => inv.cardinality(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cardinality() == 0
    }

    /// Re-type to satisfy the threshold rule for the current cardinality. Called after every
    /// mutation and every algebra kernel.
    pub fn normalize(&mut self) {
        let cardinality = self.cardinality();
        match self {
            Container::Array(arr) if cardinality > ARRAY_MAX_LEN => {
                let bitmap = BitmapContainer::from_values(arr.iter());
                *self = Container::Bitmap(bitmap);
                // an array this large may also cross the inverted threshold
                self.normalize();
            }
            Container::Bitmap(bitmap) if cardinality <= ARRAY_MAX_LEN => {
                let values = bitmap.iter().collect();
                *self = Container::Array(ArrayContainer::from_sorted(values));
            }
            Container::Bitmap(bitmap) if cardinality >= INVERTED_MIN_LEN => {
                let absent: Vec<u16> = bits::UnsetBits::new(bitmap.words().iter().copied())
                    .map(|pos| pos as u16)
                    .collect();
                *self = Container::Inverted(InvertedContainer::from_sorted_absent(absent));
            }
            Container::Inverted(inv) if cardinality < INVERTED_MIN_LEN => {
                if cardinality <= ARRAY_MAX_LEN {
                    let values = inv.iter().collect();
                    *self = Container::Array(ArrayContainer::from_sorted(values));
                } else {
                    let mut bitmap = BitmapContainer::full();
                    for &value in inv.absent() {
                        bitmap.remove(value);
                    }
                    *self = Container::Bitmap(bitmap);
                }
            }
            _ => {}
        }
    }

    pub fn contains(&self, value: u16) -> bool {
        match self {
            Container::Array(arr) => arr.contains(value),
            Container::Bitmap(bitmap) => bitmap.contains(value),
            Container::Inverted(inv) => inv.contains(value),
        }
    }

    pub fn insert(&mut self, value: u16) -> bool {
        let inserted = match self {
            Container::Array(arr) => arr.insert(value),
            Container::Bitmap(bitmap) => bitmap.insert(value),
            Container::Inverted(inv) => inv.insert(value),
        };
        if inserted {
            self.normalize();
        }
        inserted
    }

    pub fn remove(&mut self, value: u16) -> bool {
        let removed = match self {
            Container::Array(arr) => arr.remove(value),
            Container::Bitmap(bitmap) => bitmap.remove(value),
            Container::Inverted(inv) => inv.remove(value),
        };
        if removed {
            self.normalize();
        }
        removed
    }

    /// Number of values less than or equal to `value`.
    pub fn rank(&self, value: u16) -> usize {
        match self {
            Container::Array(arr) => arr.rank(value),
            Container::Bitmap(bitmap) => bitmap.rank(value),
            Container::Inverted(inv) => inv.rank(value),
        }
    }

    pub fn select(&self, idx: usize) -> Option<u16> {
        match self {
            Container::Array(arr) => arr.select(idx),
            Container::Bitmap(bitmap) => bitmap.select(idx),
            Container::Inverted(inv) => inv.select(idx),
        }
    }

    pub fn min(&self) -> Option<u16> {
        match self {
            Container::Array(arr) => arr.min(),
            Container::Bitmap(bitmap) => bitmap.min(),
            Container::Inverted(inv) => inv.min(),
        }
    }

    pub fn max(&self) -> Option<u16> {
        match self {
            Container::Array(arr) => arr.max(),
            Container::Bitmap(bitmap) => bitmap.max(),
            Container::Inverted(inv) => inv.max(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        match self {
            Container::Array(arr) => Either::Left(arr.iter()),
            Container::Bitmap(bitmap) => Either::Right(Either::Left(bitmap.iter())),
            Container::Inverted(inv) => Either::Right(Either::Right(inv.iter())),
        }
    }

    /// Lend this container's payload as the borrowed form the algebra kernels consume.
    pub(crate) fn as_view(&self) -> ContainerRef<'_> {
        static_assertions::assert_cfg!(target_endian = "little");
        match self {
            Container::Array(arr) => {
                let values: &[U16<LE>] = transmute_ref!(arr.values());
                ContainerRef::Array(ValuesRef::new(values))
            }
            Container::Bitmap(bitmap) => {
                let words: &[U64<LE>; WORDS] = transmute_ref!(bitmap.words());
                ContainerRef::Bitmap(BitmapRef::new(words, bitmap.cardinality()))
            }
            Container::Inverted(inv) => {
                let absent: &[U16<LE>] = transmute_ref!(inv.absent());
                ContainerRef::Inverted(ValuesRef::new(absent))
            }
        }
    }

    pub(crate) fn write_payload<B: bytes::BufMut>(&self, encoder: &mut Encoder<B>) {
        match self {
            Container::Array(arr) => encoder.put_u16_values(arr.iter()),
            Container::Bitmap(bitmap) => encoder.put_words(bitmap.words()),
            Container::Inverted(inv) => encoder.put_u16_values(inv.absent().iter().copied()),
        }
    }

    /// True iff every value of `self` is contained in `rhs`.
    pub fn is_subset(&self, rhs: &ContainerRef<'_>) -> bool {
        if self.cardinality() > rhs.cardinality() {
            return false;
        }
        match (self, rhs) {
            (Container::Array(arr), ContainerRef::Array(rb)) => arr
                .iter()
                .merge_join_by(rb.iter(), Ord::cmp)
                .all(|pair| !matches!(pair, EitherOrBoth::Left(_))),
            (Container::Array(arr), ContainerRef::Bitmap(rb)) => {
                arr.iter().all(|value| rb.contains(value))
            }
            // a ⊆ ¬S ⟺ a ∩ S = ∅
            (_, ContainerRef::Inverted(rb)) => rb.iter().all(|value| !self.contains(value)),
            (Container::Bitmap(bitmap), ContainerRef::Bitmap(rb)) => {
                bits::is_subset(bitmap.words(), rb.words())
            }
            // remaining combinations fail the cardinality precheck for threshold-normalized
            // containers; scan for robustness against non-canonical shapes
            _ => self.iter().all(|value| rhs.contains(value)),
        }
    }

    /// True iff `self` and `rhs` share at least one value.
    pub fn intersects(&self, rhs: &ContainerRef<'_>) -> bool {
        match (self, rhs) {
            (Container::Array(arr), _) => arr.iter().any(|value| rhs.contains(value)),
            (_, ContainerRef::Array(rb)) => rb.iter().any(|value| self.contains(value)),
            (Container::Bitmap(bitmap), ContainerRef::Bitmap(rb)) => {
                bitmap.words().iter().zip(rb.words()).any(|(&x, y)| x & y != 0)
            }
            (Container::Bitmap(bitmap), ContainerRef::Inverted(rb)) => {
                // some set bit falls outside the rhs absence list
                bitmap.cardinality() > rb.iter().filter(|&value| bitmap.contains(value)).count()
            }
            (Container::Inverted(inv), ContainerRef::Bitmap(rb)) => {
                rb.cardinality() > inv.absent().iter().filter(|&&value| rb.contains(value)).count()
            }
            (Container::Inverted(inv), ContainerRef::Inverted(rb)) => {
                // ¬A ∩ ¬B = ¬(A ∪ B)
                merge_union(inv.absent().iter().copied(), rb.iter()).len() < VALUE_SPAN
            }
        }
    }
}

impl PartialEq<ContainerRef<'_>> for Container {
    fn eq(&self, rhs: &ContainerRef<'_>) -> bool {
        if self.cardinality() != rhs.cardinality() {
            return false;
        }
        match (self, rhs) {
            (Container::Bitmap(bitmap), ContainerRef::Bitmap(rb)) => {
                bitmap.words().iter().copied().eq(rb.words())
            }
            (Container::Inverted(inv), ContainerRef::Inverted(rb)) => {
                inv.absent().iter().copied().eq(rb.iter())
            }
            _ => self.iter().eq(rhs.iter()),
        }
    }
}

impl BitOrAssign<ContainerRef<'_>> for Container {
    fn bitor_assign(&mut self, rhs: ContainerRef<'_>) {
        match (&mut *self, rhs) {
            (Container::Array(arr), ContainerRef::Array(rb)) => {
                if arr.cardinality() + rb.len() > ARRAY_MAX_LEN {
                    let mut bitmap = BitmapContainer::from_values(arr.iter());
                    for value in rb.iter() {
                        bitmap.insert(value);
                    }
                    *self = Container::Bitmap(bitmap);
                } else {
                    *arr = ArrayContainer::from_sorted(merge_union(arr.iter(), rb.iter()));
                }
            }
            (Container::Array(arr), ContainerRef::Bitmap(rb)) => {
                let mut bitmap = rb.to_container();
                for value in arr.iter() {
                    bitmap.insert(value);
                }
                *self = Container::Bitmap(bitmap);
            }
            // a ∪ ¬S = ¬(S ∖ a)
            (Container::Array(arr), ContainerRef::Inverted(rb)) => {
                let absent = merge_subtract(rb.iter(), arr.iter());
                *self = Container::Inverted(InvertedContainer::from_sorted_absent(absent));
            }
            (Container::Bitmap(bitmap), ContainerRef::Array(rb)) => {
                for value in rb.iter() {
                    bitmap.insert(value);
                }
            }
            (Container::Bitmap(bitmap), ContainerRef::Bitmap(rb)) => {
                bitmap.union_with(rb.words());
            }
            (Container::Bitmap(bitmap), ContainerRef::Inverted(rb)) => {
                let absent: Vec<u16> =
                    rb.iter().filter(|&value| !bitmap.contains(value)).collect();
                *self = Container::Inverted(InvertedContainer::from_sorted_absent(absent));
            }
            (Container::Inverted(inv), ContainerRef::Array(rb)) => {
                let absent = merge_subtract(inv.absent().iter().copied(), rb.iter());
                *inv = InvertedContainer::from_sorted_absent(absent);
            }
            (Container::Inverted(inv), ContainerRef::Bitmap(rb)) => {
                let absent: Vec<u16> = inv
                    .absent()
                    .iter()
                    .copied()
                    .filter(|&value| !rb.contains(value))
                    .collect();
                *inv = InvertedContainer::from_sorted_absent(absent);
            }
            // ¬A ∪ ¬B = ¬(A ∩ B)
            (Container::Inverted(inv), ContainerRef::Inverted(rb)) => {
                let absent = merge_intersect(inv.absent().iter().copied(), rb.iter());
                *inv = InvertedContainer::from_sorted_absent(absent);
            }
        }
        self.normalize();
    }
}

impl BitAndAssign<ContainerRef<'_>> for Container {
    fn bitand_assign(&mut self, rhs: ContainerRef<'_>) {
        match (&mut *self, rhs) {
            (Container::Array(arr), ContainerRef::Array(rb)) => {
                *arr = ArrayContainer::from_sorted(merge_intersect(arr.iter(), rb.iter()));
            }
            (Container::Array(arr), ContainerRef::Bitmap(rb)) => {
                arr.retain(|&value| rb.contains(value));
            }
            // a ∩ ¬S = a ∖ S
            (Container::Array(arr), ContainerRef::Inverted(rb)) => {
                *arr = ArrayContainer::from_sorted(merge_subtract(arr.iter(), rb.iter()));
            }
            (Container::Bitmap(bitmap), ContainerRef::Array(rb)) => {
                let values: Vec<u16> =
                    rb.iter().filter(|&value| bitmap.contains(value)).collect();
                *self = Container::Array(ArrayContainer::from_sorted(values));
            }
            (Container::Bitmap(bitmap), ContainerRef::Bitmap(rb)) => {
                bitmap.intersect_with(rb.words());
            }
            (Container::Bitmap(bitmap), ContainerRef::Inverted(rb)) => {
                for value in rb.iter() {
                    bitmap.remove(value);
                }
            }
            (Container::Inverted(inv), ContainerRef::Array(rb)) => {
                let values = merge_subtract(rb.iter(), inv.absent().iter().copied());
                *self = Container::Array(ArrayContainer::from_sorted(values));
            }
            (Container::Inverted(inv), ContainerRef::Bitmap(rb)) => {
                let mut bitmap = rb.to_container();
                for &value in inv.absent() {
                    bitmap.remove(value);
                }
                *self = Container::Bitmap(bitmap);
            }
            // ¬A ∩ ¬B = ¬(A ∪ B)
            (Container::Inverted(inv), ContainerRef::Inverted(rb)) => {
                let absent = merge_union(inv.absent().iter().copied(), rb.iter());
                *inv = InvertedContainer::from_sorted_absent(absent);
            }
        }
        self.normalize();
    }
}

impl SubAssign<ContainerRef<'_>> for Container {
    fn sub_assign(&mut self, rhs: ContainerRef<'_>) {
        match (&mut *self, rhs) {
            (Container::Array(arr), ContainerRef::Array(rb)) => {
                *arr = ArrayContainer::from_sorted(merge_subtract(arr.iter(), rb.iter()));
            }
            (Container::Array(arr), ContainerRef::Bitmap(rb)) => {
                arr.retain(|&value| !rb.contains(value));
            }
            // a ∖ ¬S = a ∩ S
            (Container::Array(arr), ContainerRef::Inverted(rb)) => {
                *arr = ArrayContainer::from_sorted(merge_intersect(arr.iter(), rb.iter()));
            }
            (Container::Bitmap(bitmap), ContainerRef::Array(rb)) => {
                for value in rb.iter() {
                    bitmap.remove(value);
                }
            }
            (Container::Bitmap(bitmap), ContainerRef::Bitmap(rb)) => {
                bitmap.subtract_with(rb.words());
            }
            // w ∖ ¬S = w ∩ S
            (Container::Bitmap(bitmap), ContainerRef::Inverted(rb)) => {
                let values: Vec<u16> =
                    rb.iter().filter(|&value| bitmap.contains(value)).collect();
                *self = Container::Array(ArrayContainer::from_sorted(values));
            }
            (Container::Inverted(inv), ContainerRef::Array(rb)) => {
                let absent = merge_union(inv.absent().iter().copied(), rb.iter());
                *inv = InvertedContainer::from_sorted_absent(absent);
            }
            // ¬A ∖ w = ¬A ∩ ¬w
            (Container::Inverted(inv), ContainerRef::Bitmap(rb)) => {
                let mut bitmap = rb.to_container();
                bitmap.complement();
                for &value in inv.absent() {
                    bitmap.remove(value);
                }
                *self = Container::Bitmap(bitmap);
            }
            // ¬A ∖ ¬B = B ∖ A
            (Container::Inverted(inv), ContainerRef::Inverted(rb)) => {
                let values = merge_subtract(rb.iter(), inv.absent().iter().copied());
                *self = Container::Array(ArrayContainer::from_sorted(values));
            }
        }
        self.normalize();
    }
}

impl BitXorAssign<ContainerRef<'_>> for Container {
    fn bitxor_assign(&mut self, rhs: ContainerRef<'_>) {
        match (&mut *self, rhs) {
            (Container::Array(arr), ContainerRef::Array(rb)) => {
                *arr = ArrayContainer::from_sorted(merge_xor(arr.iter(), rb.iter()));
            }
            (Container::Array(arr), ContainerRef::Bitmap(rb)) => {
                let mut bitmap = rb.to_container();
                for value in arr.iter() {
                    bitmap.toggle(value);
                }
                *self = Container::Bitmap(bitmap);
            }
            // a △ ¬S = ¬(a △ S)
            (Container::Array(arr), ContainerRef::Inverted(rb)) => {
                let absent = merge_xor(arr.iter(), rb.iter());
                *self = Container::Inverted(InvertedContainer::from_sorted_absent(absent));
            }
            (Container::Bitmap(bitmap), ContainerRef::Array(rb)) => {
                for value in rb.iter() {
                    bitmap.toggle(value);
                }
            }
            (Container::Bitmap(bitmap), ContainerRef::Bitmap(rb)) => {
                bitmap.xor_with(rb.words());
            }
            (Container::Bitmap(bitmap), ContainerRef::Inverted(rb)) => {
                for value in rb.iter() {
                    bitmap.toggle(value);
                }
                bitmap.complement();
            }
            // ¬A △ b = ¬(A △ b)
            (Container::Inverted(inv), ContainerRef::Array(rb)) => {
                let absent = merge_xor(inv.absent().iter().copied(), rb.iter());
                *inv = InvertedContainer::from_sorted_absent(absent);
            }
            (Container::Inverted(inv), ContainerRef::Bitmap(rb)) => {
                let mut bitmap = rb.to_container();
                for &value in inv.absent() {
                    bitmap.toggle(value);
                }
                bitmap.complement();
                *self = Container::Bitmap(bitmap);
            }
            // ¬A △ ¬B = A △ B
            (Container::Inverted(inv), ContainerRef::Inverted(rb)) => {
                let values = merge_xor(inv.absent().iter().copied(), rb.iter());
                *self = Container::Array(ArrayContainer::from_sorted(values));
            }
        }
        self.normalize();
    }
}

macro_rules! owned_rhs_assign {
    ($OpAssign:ident, $op_assign:ident) => {
        impl $OpAssign<&Container> for Container {
            #[inline]
            fn $op_assign(&mut self, rhs: &Container) {
                self.$op_assign(rhs.as_view());
            }
        }
    };
}

owned_rhs_assign!(BitOrAssign, bitor_assign);
owned_rhs_assign!(BitAndAssign, bitand_assign);
owned_rhs_assign!(SubAssign, sub_assign);
owned_rhs_assign!(BitXorAssign, bitxor_assign);

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::testutil::SetGen;

    fn mkcontainer(values: &BTreeSet<u16>) -> Container {
        Container::from_sorted(values.iter().copied().collect())
    }

    fn assert_matches_set(container: &Container, values: &BTreeSet<u16>) {
        assert_eq!(container.cardinality(), values.len());
        assert!(container.iter().eq(values.iter().copied()));
        let expected_shape = match values.len() {
            n if n <= ARRAY_MAX_LEN => Shape::Array,
            n if n >= INVERTED_MIN_LEN => Shape::Inverted,
            _ => Shape::Bitmap,
        };
        assert_eq!(container.shape(), expected_shape);
    }

    /// Cardinalities chosen so every pair of shapes is exercised, including the threshold
    /// boundaries.
    fn shape_cases(setgen: &mut SetGen) -> Vec<BTreeSet<u16>> {
        vec![
            setgen.set16(5),
            setgen.set16(ARRAY_MAX_LEN),
            setgen.set16(ARRAY_MAX_LEN + 1),
            setgen.set16(30_000),
            setgen.set16(INVERTED_MIN_LEN - 1),
            setgen.set16(INVERTED_MIN_LEN),
            setgen.set16(VALUE_SPAN - 1),
            (0..=u16::MAX).collect(),
        ]
    }

    #[test]
    fn test_shape_thresholds() {
        let mut setgen = SetGen::new(0xC0FFEE);
        for case in shape_cases(&mut setgen) {
            assert_matches_set(&mkcontainer(&case), &case);
        }
    }

    #[test]
    fn test_insert_remove_transitions() {
        let mut container = Container::from_sorted((0..ARRAY_MAX_LEN as u16).collect());
        assert_eq!(container.shape(), Shape::Array);

        // 4097th value promotes to bitmap
        assert!(container.insert(ARRAY_MAX_LEN as u16));
        assert_eq!(container.shape(), Shape::Bitmap);

        // back down to 4096 demotes to array
        assert!(container.remove(0));
        assert_eq!(container.shape(), Shape::Array);
        assert_eq!(container.cardinality(), ARRAY_MAX_LEN);

        let mut container = Container::from_range(0, (INVERTED_MIN_LEN - 2) as u16);
        assert_eq!(container.shape(), Shape::Bitmap);
        assert!(container.insert((INVERTED_MIN_LEN - 1) as u16));
        assert_eq!(container.shape(), Shape::Inverted);
        assert!(container.remove(7));
        assert_eq!(container.shape(), Shape::Bitmap);
    }

    #[test]
    fn test_from_range_shapes() {
        assert_eq!(Container::from_range(0, 99).shape(), Shape::Array);
        assert_eq!(Container::from_range(0, 9999).shape(), Shape::Bitmap);
        assert_eq!(Container::from_range(0, u16::MAX).shape(), Shape::Inverted);
        assert_eq!(Container::from_range(1, u16::MAX - 1).shape(), Shape::Inverted);

        let full = Container::from_range(0, u16::MAX);
        assert_eq!(full.cardinality(), VALUE_SPAN);
        let clipped = Container::from_range(10, u16::MAX);
        assert!(!clipped.contains(9));
        assert!(clipped.contains(10));
        assert!(clipped.contains(u16::MAX));
    }

    #[test]
    fn test_point_ops_across_shapes() {
        let mut setgen = SetGen::new(0xBADCAB);
        for mut case in shape_cases(&mut setgen) {
            let mut container = mkcontainer(&case);
            for probe in [0u16, 1, 255, 4096, 40_000, u16::MAX] {
                assert_eq!(container.contains(probe), case.contains(&probe));
                assert_eq!(container.insert(probe), case.insert(probe));
                assert_eq!(container.remove(probe), case.remove(&probe));
                container.normalize();
            }
            assert_matches_set(&container, &case);

            assert_eq!(container.min(), case.first().copied());
            assert_eq!(container.max(), case.last().copied());
            for (idx, &value) in case.iter().enumerate().step_by(1024.max(case.len() / 7)) {
                assert_eq!(container.select(idx), Some(value));
                assert_eq!(container.rank(value), idx + 1);
            }
            assert_eq!(container.select(case.len()), None);
        }
    }

    #[test]
    fn test_algebra_matrix() {
        let mut setgen = SetGen::new(0xDEAD_BEEF);
        let cases = shape_cases(&mut setgen);

        for a in &cases {
            for b in &cases {
                let lhs = mkcontainer(a);
                let rhs = mkcontainer(b);

                let mut union = lhs.clone();
                union |= &rhs;
                assert_matches_set(&union, &(a | b));

                let mut intersection = lhs.clone();
                intersection &= &rhs;
                assert_matches_set(&intersection, &(a & b));

                let mut difference = lhs.clone();
                difference -= &rhs;
                assert_matches_set(&difference, &(a - b));

                let mut xor = lhs.clone();
                xor ^= &rhs;
                assert_matches_set(&xor, &(a ^ b));

                assert_eq!(lhs.is_subset(&rhs.as_view()), a.is_subset(b));
                assert_eq!(lhs.intersects(&rhs.as_view()), !a.is_disjoint(b));
            }
        }
    }

    #[test]
    fn test_subset_intersects_edges() {
        let empty = Container::default();
        let one = Container::from_sorted(vec![42]);
        let full = Container::from_range(0, u16::MAX);

        assert!(empty.is_subset(&one.as_view()));
        assert!(empty.is_subset(&empty.as_view()));
        assert!(one.is_subset(&full.as_view()));
        assert!(!full.is_subset(&one.as_view()));
        assert!(!empty.intersects(&full.as_view()));
        assert!(one.intersects(&full.as_view()));
    }
}
