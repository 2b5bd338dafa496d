//! Borrowed container payloads decoded in place from a frozen buffer.
//!
//! All multi-byte reads go through zerocopy's unaligned byteorder types, so a view never
//! requires an aligned base pointer.

use either::Either;
use zerocopy::{LE, U16, U64};

use crate::{
    bits,
    container::{
        Container, VALUE_SPAN,
        array::ArrayContainer,
        bitmap::{BitmapContainer, WORDS},
        inverted::{ComplementIter, InvertedContainer},
    },
};

#[derive(Clone, Copy)]
pub(crate) enum ContainerRef<'a> {
    Array(ValuesRef<'a>),
    Bitmap(BitmapRef<'a>),
    /// The referenced values are the *absent* ones.
    Inverted(ValuesRef<'a>),
}

impl<'a> ContainerRef<'a> {
    pub fn cardinality(&self) -> usize {
        match self {
            ContainerRef::Array(values) => values.len(),
            ContainerRef::Bitmap(bitmap) => bitmap.cardinality(),
            ContainerRef::Inverted(absent) => VALUE_SPAN - absent.len(),
        }
    }

    pub fn contains(&self, value: u16) -> bool {
        match self {
            ContainerRef::Array(values) => values.contains(value),
            ContainerRef::Bitmap(bitmap) => bitmap.contains(value),
            ContainerRef::Inverted(absent) => !absent.contains(value),
        }
    }

    /// Number of values less than or equal to `value`.
    pub fn rank(&self, value: u16) -> usize {
        match self {
            ContainerRef::Array(values) => values.rank(value),
            ContainerRef::Bitmap(bitmap) => bitmap.rank(value),
            ContainerRef::Inverted(absent) => value as usize + 1 - absent.rank(value),
        }
    }

    pub fn select(&self, idx: usize) -> Option<u16> {
        if idx >= self.cardinality() {
            return None;
        }
        match self {
            ContainerRef::Array(values) => Some(values.get(idx)),
            ContainerRef::Bitmap(bitmap) => bitmap.select(idx),
            ContainerRef::Inverted(absent) => {
                // each absent value at or below the result shifts it up by one
                let mut skipped = 0;
                for a in absent.iter() {
                    if (a as usize) <= idx + skipped {
                        skipped += 1;
                    } else {
                        break;
                    }
                }
                Some((idx + skipped) as u16)
            }
        }
    }

    pub fn min(&self) -> Option<u16> {
        match self {
            ContainerRef::Array(values) => values.first(),
            ContainerRef::Bitmap(bitmap) => bitmap.iter().next(),
            ContainerRef::Inverted(_) => self.select(0),
        }
    }

    pub fn max(&self) -> Option<u16> {
        match self {
            ContainerRef::Array(values) => values.last(),
            ContainerRef::Bitmap(bitmap) => bitmap.max(),
            ContainerRef::Inverted(absent) => {
                let cardinality = self.cardinality();
                if cardinality == 0 {
                    return None;
                }
                let mut max = VALUE_SPAN - 1;
                for a in absent.iter().rev() {
                    if a as usize == max {
                        max -= 1;
                    } else {
                        break;
                    }
                }
                Some(max as u16)
            }
        }
    }

    pub fn iter(self) -> impl Iterator<Item = u16> + 'a {
        match self {
            ContainerRef::Array(values) => Either::Left(values.iter()),
            ContainerRef::Bitmap(bitmap) => Either::Right(Either::Left(bitmap.iter())),
            ContainerRef::Inverted(absent) => {
                Either::Right(Either::Right(ComplementIter::new(absent.iter())))
            }
        }
    }

    /// Deep-copy into an owned container of the same shape.
    pub fn to_container(&self) -> Container {
        match self {
            ContainerRef::Array(values) => {
                Container::Array(ArrayContainer::from_sorted(values.iter().collect()))
            }
            ContainerRef::Bitmap(bitmap) => Container::Bitmap(bitmap.to_container()),
            ContainerRef::Inverted(absent) => {
                Container::Inverted(InvertedContainer::from_sorted_absent(absent.iter().collect()))
            }
        }
    }
}

/// Sorted 16-bit values borrowed from a payload.
#[derive(Clone, Copy)]
pub(crate) struct ValuesRef<'a>(&'a [U16<LE>]);

impl<'a> ValuesRef<'a> {
    pub fn new(values: &'a [U16<LE>]) -> Self {
        ValuesRef(values)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn get(&self, idx: usize) -> u16 {
        self.0[idx].get()
    }

    pub fn first(&self) -> Option<u16> {
        self.0.first().map(|v| v.get())
    }

    pub fn last(&self) -> Option<u16> {
        self.0.last().map(|v| v.get())
    }

    pub fn contains(&self, value: u16) -> bool {
        self.0.binary_search_by(|probe| probe.get().cmp(&value)).is_ok()
    }

    /// Number of values less than or equal to `value`.
    pub fn rank(&self, value: u16) -> usize {
        match self.0.binary_search_by(|probe| probe.get().cmp(&value)) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }

    pub fn iter(self) -> impl DoubleEndedIterator<Item = u16> + 'a {
        self.0.iter().map(|v| v.get())
    }
}

/// A 65536-bit payload borrowed from a frozen buffer, with the header's cardinality.
#[derive(Clone, Copy)]
pub(crate) struct BitmapRef<'a> {
    words: &'a [U64<LE>; WORDS],
    cardinality: usize,
}

impl<'a> BitmapRef<'a> {
    pub fn new(words: &'a [U64<LE>; WORDS], cardinality: usize) -> Self {
        BitmapRef { words, cardinality }
    }

    #[inline]
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    pub fn words(self) -> impl Iterator<Item = u64> + 'a {
        self.words.iter().map(|w| w.get())
    }

    pub fn contains(&self, value: u16) -> bool {
        self.words[value as usize / 64].get() & (1 << (value % 64)) != 0
    }

    pub fn rank(&self, value: u16) -> usize {
        let idx = value as usize / 64;
        let prefix: usize = self.words[..idx]
            .iter()
            .map(|w| w.get().count_ones() as usize)
            .sum();
        let partial = (self.words[idx].get() << (63 - value % 64)).count_ones() as usize;
        prefix + partial
    }

    pub fn select(&self, idx: usize) -> Option<u16> {
        if idx >= self.cardinality {
            return None;
        }
        let mut remaining = idx;
        for (word_idx, word) in self.words().enumerate() {
            let ones = word.count_ones() as usize;
            if remaining < ones {
                let bit = bits::select_word(word, remaining as u32) as usize;
                return Some((word_idx * 64 + bit) as u16);
            }
            remaining -= ones;
        }
        None
    }

    pub fn max(&self) -> Option<u16> {
        bits::SetBitsRev::new(self.words.iter().rev().map(|w| w.get()), WORDS)
            .next()
            .map(|pos| pos as u16)
    }

    pub fn iter(self) -> impl Iterator<Item = u16> + 'a {
        bits::SetBits::new(self.words.iter().map(|w| w.get())).map(|pos| pos as u16)
    }

    pub fn to_container(&self) -> BitmapContainer {
        let mut words = Box::new([0u64; WORDS]);
        for (dst, src) in words.iter_mut().zip(self.words.iter()) {
            *dst = src.get();
        }
        BitmapContainer::from_words(words, self.cardinality)
    }
}
