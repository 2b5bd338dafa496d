use itertools::{EitherOrBoth, Itertools};

/// Sorted array of distinct 16-bit values.
///
/// Invariant: `values` is strictly increasing.
#[derive(Clone, Default, PartialEq, Eq)]
pub(crate) struct ArrayContainer {
    values: Vec<u16>,
}

impl ArrayContainer {
    /// Construct from a strictly increasing vec of values.
    pub fn from_sorted(values: Vec<u16>) -> Self {
        debug_assert!(values.is_sorted_by(|a, b| a < b), "values must be strictly increasing");
        ArrayContainer { values }
    }

    #[inline]
    pub fn cardinality(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn values(&self) -> &[u16] {
        &self.values
    }

    pub fn contains(&self, value: u16) -> bool {
        self.values.binary_search(&value).is_ok()
    }

    pub fn insert(&mut self, value: u16) -> bool {
        match self.values.binary_search(&value) {
            Ok(_) => false,
            Err(index) => {
                self.values.insert(index, value);
                true
            }
        }
    }

    pub fn remove(&mut self, value: u16) -> bool {
        match self.values.binary_search(&value) {
            Ok(index) => {
                self.values.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    /// Number of values less than or equal to `value`.
    pub fn rank(&self, value: u16) -> usize {
        match self.values.binary_search(&value) {
            Ok(index) => index + 1,
            Err(index) => index,
        }
    }

    pub fn select(&self, idx: usize) -> Option<u16> {
        self.values.get(idx).copied()
    }

    pub fn min(&self) -> Option<u16> {
        self.values.first().copied()
    }

    pub fn max(&self) -> Option<u16> {
        self.values.last().copied()
    }

    pub fn retain(&mut self, f: impl FnMut(&u16) -> bool) {
        self.values.retain(f);
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.values.iter().copied()
    }
}

impl std::fmt::Debug for ArrayContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ArrayContainer({})", self.cardinality())
    }
}

// Sorted-merge kernels shared by the container algebra. Both inputs must be strictly
// increasing; every output is strictly increasing.

pub(crate) fn merge_union(
    a: impl Iterator<Item = u16>,
    b: impl Iterator<Item = u16>,
) -> Vec<u16> {
    a.merge(b).dedup().collect()
}

pub(crate) fn merge_intersect(
    a: impl Iterator<Item = u16>,
    b: impl Iterator<Item = u16>,
) -> Vec<u16> {
    a.merge_join_by(b, Ord::cmp)
        .filter_map(|pair| match pair {
            EitherOrBoth::Both(v, _) => Some(v),
            _ => None,
        })
        .collect()
}

pub(crate) fn merge_subtract(
    a: impl Iterator<Item = u16>,
    b: impl Iterator<Item = u16>,
) -> Vec<u16> {
    a.merge_join_by(b, Ord::cmp)
        .filter_map(|pair| match pair {
            EitherOrBoth::Left(v) => Some(v),
            _ => None,
        })
        .collect()
}

pub(crate) fn merge_xor(a: impl Iterator<Item = u16>, b: impl Iterator<Item = u16>) -> Vec<u16> {
    a.merge_join_by(b, Ord::cmp)
        .filter_map(|pair| match pair {
            EitherOrBoth::Both(_, _) => None,
            EitherOrBoth::Left(v) => Some(v),
            EitherOrBoth::Right(v) => Some(v),
        })
        .collect()
}
