use std::{
    mem,
    ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Deref, Sub, SubAssign},
};

use itertools::{EitherOrBoth, Itertools};

use crate::{
    RoaringBitmap, RoaringRef,
    codec::container_ref::ContainerRef,
    roaring::Entry,
};

// The assign kernels merge the two entry sequences by key. They take the left side by value so
// untouched containers move instead of cloning; the right side is always the borrowed view, so
// one body serves owned and frozen operands.

fn union_entries<'a>(
    lhs: Vec<Entry>,
    rhs: impl Iterator<Item = (u16, ContainerRef<'a>)>,
) -> Vec<Entry> {
    lhs.into_iter()
        .merge_join_by(rhs, |entry, rhs| entry.key.cmp(&rhs.0))
        .map(|pair| match pair {
            EitherOrBoth::Left(entry) => entry,
            EitherOrBoth::Right((key, view)) => Entry { key, container: view.to_container() },
            EitherOrBoth::Both(mut entry, (_, view)) => {
                entry.container |= view;
                entry
            }
        })
        .collect()
}

fn intersection_entries<'a>(
    lhs: Vec<Entry>,
    rhs: impl Iterator<Item = (u16, ContainerRef<'a>)>,
) -> Vec<Entry> {
    lhs.into_iter()
        .merge_join_by(rhs, |entry, rhs| entry.key.cmp(&rhs.0))
        .filter_map(|pair| match pair {
            EitherOrBoth::Both(mut entry, (_, view)) => {
                entry.container &= view;
                (!entry.container.is_empty()).then_some(entry)
            }
            _ => None,
        })
        .collect()
}

fn difference_entries<'a>(
    lhs: Vec<Entry>,
    rhs: impl Iterator<Item = (u16, ContainerRef<'a>)>,
) -> Vec<Entry> {
    lhs.into_iter()
        .merge_join_by(rhs, |entry, rhs| entry.key.cmp(&rhs.0))
        .filter_map(|pair| match pair {
            EitherOrBoth::Left(entry) => Some(entry),
            EitherOrBoth::Right(_) => None,
            EitherOrBoth::Both(mut entry, (_, view)) => {
                entry.container -= view;
                (!entry.container.is_empty()).then_some(entry)
            }
        })
        .collect()
}

fn xor_entries<'a>(
    lhs: Vec<Entry>,
    rhs: impl Iterator<Item = (u16, ContainerRef<'a>)>,
) -> Vec<Entry> {
    lhs.into_iter()
        .merge_join_by(rhs, |entry, rhs| entry.key.cmp(&rhs.0))
        .filter_map(|pair| match pair {
            EitherOrBoth::Left(entry) => Some(entry),
            EitherOrBoth::Right((key, view)) => Some(Entry { key, container: view.to_container() }),
            EitherOrBoth::Both(mut entry, (_, view)) => {
                entry.container ^= view;
                (!entry.container.is_empty()).then_some(entry)
            }
        })
        .collect()
}

macro_rules! roaring_assign {
    ($OpAssign:ident, $op_assign:ident, $entries:ident) => {
        impl $OpAssign<&RoaringBitmap> for RoaringBitmap {
            fn $op_assign(&mut self, rhs: &RoaringBitmap) {
                let lhs = mem::take(&mut self.entries);
                self.entries = $entries(lhs, rhs.view_entries());
            }
        }

        impl<B: Deref<Target = [u8]>> $OpAssign<&RoaringRef<B>> for RoaringBitmap {
            fn $op_assign(&mut self, rhs: &RoaringRef<B>) {
                let view = rhs.load();
                let lhs = mem::take(&mut self.entries);
                self.entries = $entries(lhs, view.iter());
            }
        }

        impl<B: Deref<Target = [u8]>> $OpAssign<RoaringRef<B>> for RoaringBitmap {
            #[inline]
            fn $op_assign(&mut self, rhs: RoaringRef<B>) {
                self.$op_assign(&rhs);
            }
        }
    };
}

roaring_assign!(BitOrAssign, bitor_assign, union_entries);
roaring_assign!(BitAndAssign, bitand_assign, intersection_entries);
roaring_assign!(SubAssign, sub_assign, difference_entries);
roaring_assign!(BitXorAssign, bitxor_assign, xor_entries);

macro_rules! roaring_binary_op {
    ($Op:tt, $op:ident, $assign:path) => {
        impl $Op<RoaringBitmap> for RoaringBitmap {
            type Output = RoaringBitmap;
            fn $op(mut self, rhs: RoaringBitmap) -> Self::Output {
                $assign(&mut self, &rhs);
                self
            }
        }
        impl $Op<&RoaringBitmap> for RoaringBitmap {
            type Output = RoaringBitmap;
            fn $op(mut self, rhs: &RoaringBitmap) -> Self::Output {
                $assign(&mut self, rhs);
                self
            }
        }
        impl<B: Deref<Target = [u8]>> $Op<RoaringRef<B>> for RoaringBitmap {
            type Output = RoaringBitmap;
            fn $op(mut self, rhs: RoaringRef<B>) -> Self::Output {
                $assign(&mut self, &rhs);
                self
            }
        }
        impl<B: Deref<Target = [u8]>> $Op<&RoaringRef<B>> for RoaringBitmap {
            type Output = RoaringBitmap;
            fn $op(mut self, rhs: &RoaringRef<B>) -> Self::Output {
                $assign(&mut self, rhs);
                self
            }
        }
        impl<B: Deref<Target = [u8]>> $Op<RoaringRef<B>> for &RoaringBitmap {
            type Output = RoaringBitmap;
            fn $op(self, rhs: RoaringRef<B>) -> Self::Output {
                $Op::$op(self.clone(), rhs)
            }
        }
        impl<B: Deref<Target = [u8]>> $Op<&RoaringRef<B>> for &RoaringBitmap {
            type Output = RoaringBitmap;
            fn $op(self, rhs: &RoaringRef<B>) -> Self::Output {
                $Op::$op(self.clone(), rhs)
            }
        }
    };
}

roaring_binary_op!(BitOr, bitor, BitOrAssign::bitor_assign);
roaring_binary_op!(BitAnd, bitand, BitAndAssign::bitand_assign);
roaring_binary_op!(BitXor, bitxor, BitXorAssign::bitxor_assign);
roaring_binary_op!(Sub, sub, SubAssign::sub_assign);

impl BitOr<&RoaringBitmap> for &RoaringBitmap {
    type Output = RoaringBitmap;
    fn bitor(self, rhs: &RoaringBitmap) -> Self::Output {
        // merge into the larger set
        if rhs.cardinality() > self.cardinality() {
            rhs.clone() | self
        } else {
            self.clone() | rhs
        }
    }
}

impl BitAnd<&RoaringBitmap> for &RoaringBitmap {
    type Output = RoaringBitmap;
    fn bitand(self, rhs: &RoaringBitmap) -> Self::Output {
        // intersect into the smaller set
        if rhs.cardinality() < self.cardinality() {
            rhs.clone() & self
        } else {
            self.clone() & rhs
        }
    }
}

impl BitXor<&RoaringBitmap> for &RoaringBitmap {
    type Output = RoaringBitmap;
    fn bitxor(self, rhs: &RoaringBitmap) -> Self::Output {
        self.clone() ^ rhs
    }
}

impl Sub<&RoaringBitmap> for &RoaringBitmap {
    type Output = RoaringBitmap;
    fn sub(self, rhs: &RoaringBitmap) -> Self::Output {
        self.clone() - rhs
    }
}

impl BitOrAssign<RoaringBitmap> for RoaringBitmap {
    fn bitor_assign(&mut self, mut rhs: RoaringBitmap) {
        // merge into the larger set
        if rhs.cardinality() > self.cardinality() {
            mem::swap(self, &mut rhs);
        }
        *self |= &rhs;
    }
}

impl BitAndAssign<RoaringBitmap> for RoaringBitmap {
    fn bitand_assign(&mut self, mut rhs: RoaringBitmap) {
        // intersect into the smaller set
        if rhs.cardinality() < self.cardinality() {
            mem::swap(self, &mut rhs);
        }
        *self &= &rhs;
    }
}

impl BitXorAssign<RoaringBitmap> for RoaringBitmap {
    #[inline]
    fn bitxor_assign(&mut self, rhs: RoaringBitmap) {
        *self ^= &rhs;
    }
}

impl SubAssign<RoaringBitmap> for RoaringBitmap {
    #[inline]
    fn sub_assign(&mut self, rhs: RoaringBitmap) {
        *self -= &rhs;
    }
}

#[cfg(test)]
mod tests {
    use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Sub, SubAssign};

    use proptest::{collection::hash_set, proptest};

    use crate::{
        RoaringBitmap,
        testutil::{TestBitmap, check_combinations},
    };

    macro_rules! test_bitop {
        ($test_name:ident, $op_method:ident, $op_assign_method:ident, $hashset_method:ident) => {
            proptest! {
                #[test]
                fn $test_name(
                    a in hash_set(0u32..500_000, 0..1024),
                    b in hash_set(0u32..500_000, 0..1024),
                ) {
                    let expected: RoaringBitmap = a.$hashset_method(&b).copied().collect();

                    let a = RoaringBitmap::from_iter(a);
                    let b = RoaringBitmap::from_iter(b);

                    // all combinations of owned and borrowed operands
                    assert_eq!((&a).$op_method(&b), expected, "&a, &b");
                    assert_eq!(a.clone().$op_method(&b), expected, "a, &b");
                    assert_eq!(a.clone().$op_method(b.clone()), expected, "a, b");

                    // assignment operators
                    let mut c = a.clone();
                    c.$op_assign_method(b.clone());
                    assert_eq!(c, expected, "c assign b");

                    let mut c = a.clone();
                    c.$op_assign_method(&b);
                    assert_eq!(c, expected, "c assign &b");

                    // do it all again against a frozen rhs
                    let b = b.freeze_ref();

                    assert_eq!((&a).$op_method(&b), expected, "&a, &bref");
                    assert_eq!((&a).$op_method(b.clone()), expected, "&a, bref");
                    assert_eq!(a.clone().$op_method(&b), expected, "a, &bref");
                    assert_eq!(a.clone().$op_method(b.clone()), expected, "a, bref");

                    let mut c = a.clone();
                    c.$op_assign_method(b.clone());
                    assert_eq!(c, expected, "c assign bref");

                    let mut c = a.clone();
                    c.$op_assign_method(&b);
                    assert_eq!(c, expected, "c assign &bref");
                }
            }
        };
    }

    test_bitop!(test_bitor, bitor, bitor_assign, union);
    test_bitop!(test_bitand, bitand, bitand_assign, intersection);
    test_bitop!(test_bitxor, bitxor, bitxor_assign, symmetric_difference);
    test_bitop!(test_sub, sub, sub_assign, difference);

    fn apply(
        lhs: TestBitmap,
        rhs: TestBitmap,
        op: impl Fn(RoaringBitmap, TestBitmap) -> RoaringBitmap,
    ) -> RoaringBitmap {
        let lhs = match lhs {
            TestBitmap::Owned(bitmap) => bitmap,
            TestBitmap::Frozen(frozen) => frozen.to_roaring(),
        };
        op(lhs, rhs)
    }

    #[test]
    fn test_scenario_combinations() {
        let a = [1u32, 2, 3];
        let b = [2u32, 3, 4];

        check_combinations(a, b, [1u32, 2, 3, 4], |lhs, rhs| {
            apply(lhs, rhs, |l, r| match r {
                TestBitmap::Owned(r) => l | r,
                TestBitmap::Frozen(r) => l | r,
            })
        });
        check_combinations(a, b, [2u32, 3], |lhs, rhs| {
            apply(lhs, rhs, |l, r| match r {
                TestBitmap::Owned(r) => l & r,
                TestBitmap::Frozen(r) => l & r,
            })
        });
        check_combinations(a, b, [1u32], |lhs, rhs| {
            apply(lhs, rhs, |l, r| match r {
                TestBitmap::Owned(r) => l - r,
                TestBitmap::Frozen(r) => l - r,
            })
        });
        check_combinations(a, b, [1u32, 4], |lhs, rhs| {
            apply(lhs, rhs, |l, r| match r {
                TestBitmap::Owned(r) => l ^ r,
                TestBitmap::Frozen(r) => l ^ r,
            })
        });
    }

    #[test]
    fn test_empty_identities() {
        let a = RoaringBitmap::from_iter([1, 2, 100_000]);
        let empty = RoaringBitmap::new();

        assert_eq!(&a | &empty, a);
        assert_eq!(&empty | &a, a);
        assert_eq!(&a & &empty, empty);
        assert_eq!(&a - &empty, a);
        assert_eq!(&empty - &a, empty);
        assert_eq!(&a ^ &empty, a);
    }

    proptest! {
        #[test]
        fn test_subset_identities(
            a in hash_set(0u32..100_000, 0..512),
            b in hash_set(0u32..100_000, 0..512),
        ) {
            let a = RoaringBitmap::from_iter(a);
            let b = RoaringBitmap::from_iter(b);

            // a ⊆ b ⟺ a ∪ b = b ⟺ a ∩ b = a
            let is_subset = a.is_subset(&b);
            assert_eq!(is_subset, (&a | &b) == b);
            assert_eq!(is_subset, (&a & &b) == a);

            // disjoint ⟺ empty intersection
            assert_eq!(a.is_disjoint(&b), (&a & &b).is_empty());
        }

        #[test]
        fn test_algebra_laws(
            a in hash_set(0u32..100_000, 0..512),
            b in hash_set(0u32..100_000, 0..512),
        ) {
            let a = RoaringBitmap::from_iter(a);
            let b = RoaringBitmap::from_iter(b);

            assert_eq!(&a | &b, &b | &a);
            assert_eq!(&a & &b, &b & &a);
            assert_eq!(&a | &a, a);
            assert_eq!(&a & &a, a);
            assert_eq!((&a - &b) | (&a & &b), a);
            assert_eq!((&a ^ &b), (&a | &b) - (&a & &b));
        }
    }
}
