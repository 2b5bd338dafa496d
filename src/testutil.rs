use std::collections::BTreeSet;

use bytes::Bytes;
use itertools::Itertools;
use rand::{SeedableRng, seq::index};

use crate::{RoaringBitmap, RoaringRef};

pub fn mkroaring(values: impl IntoIterator<Item = impl std::borrow::Borrow<u32>>) -> RoaringBitmap {
    let mut bitmap = RoaringBitmap::new();
    for value in values {
        bitmap.insert(*value.borrow());
    }
    bitmap
}

pub fn mkroaring_ref(
    values: impl IntoIterator<Item = impl std::borrow::Borrow<u32>>,
) -> RoaringRef<Bytes> {
    RoaringRef::from_bytes(mkroaring(values).freeze()).unwrap()
}

/// Create a pair of owned and frozen bitmaps from the same values.
pub fn mkroarings(values: impl IntoIterator<Item = u32> + Clone) -> [TestBitmap; 2] {
    [
        TestBitmap::Owned(mkroaring(values.clone())),
        TestBitmap::Frozen(mkroaring_ref(values)),
    ]
}

/// Run `test` over every owned/frozen combination of operands and compare against `expected`.
pub fn check_combinations<L, R, E, F>(left: L, right: R, expected: E, test: F)
where
    L: IntoIterator<Item = u32> + Clone,
    R: IntoIterator<Item = u32> + Clone,
    E: IntoIterator<Item = u32> + Clone,
    F: Fn(TestBitmap, TestBitmap) -> RoaringBitmap,
{
    let left = mkroarings(left);
    let right = mkroarings(right);
    let expected = mkroaring(expected);
    for (lhs, rhs) in left.into_iter().cartesian_product(right) {
        let label = format!("lhs: {lhs:?}, rhs: {rhs:?}");
        let out = test(lhs, rhs);
        assert_eq!(out, expected, "{label}");
    }
}

#[derive(Clone)]
pub enum TestBitmap {
    Owned(RoaringBitmap),
    Frozen(RoaringRef<Bytes>),
}

impl std::fmt::Debug for TestBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owned(bitmap) => {
                let prefix: Vec<_> = bitmap.iter().take(10).collect();
                f.debug_struct("Owned").field("prefix", &prefix).finish()
            }
            Self::Frozen(frozen) => {
                let prefix: Vec<_> = frozen.iter().take(10).collect();
                f.debug_struct("Frozen").field("prefix", &prefix).finish()
            }
        }
    }
}

pub struct SetGen {
    rng: rand::rngs::StdRng,
}

impl SetGen {
    pub fn new(seed: u64) -> Self {
        let rng = rand::rngs::StdRng::seed_from_u64(seed);
        Self { rng }
    }

    /// `len` distinct random u32 values, ascending.
    pub fn random(&mut self, len: usize) -> Vec<u32> {
        index::sample(&mut self.rng, u32::MAX as usize, len)
            .into_iter()
            .map(|v| v as u32)
            .sorted()
            .collect()
    }

    /// `len` distinct random 16-bit values.
    pub fn set16(&mut self, len: usize) -> BTreeSet<u16> {
        index::sample(&mut self.rng, 1 << 16, len)
            .into_iter()
            .map(|v| v as u16)
            .collect()
    }
}
