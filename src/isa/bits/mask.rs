//! Fixed-width bit sets used for decode masks and concrete instruction words.

use std::fmt;

use smallvec::SmallVec;

const WORD_BITS: usize = u64::BITS as usize;

/// A set of bit positions `0..width`, bit 0 being the least significant bit of an
/// instruction word. Also doubles as a concrete instruction word during resolution.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BitMask {
    width: usize,
    words: SmallVec<[u64; 1]>,
}

impl BitMask {
    pub fn empty(width: usize) -> Self {
        Self {
            width,
            words: SmallVec::from_elem(0, width.div_ceil(WORD_BITS)),
        }
    }

    pub fn full(width: usize) -> Self {
        let mut mask = Self::empty(width);
        for word in mask.words.iter_mut() {
            *word = u64::MAX;
        }
        mask.clear_excess();
        mask
    }

    /// Builds a concrete word from the low `width` bits of `value`.
    pub fn from_u64(value: u64, width: usize) -> Self {
        let mut mask = Self::empty(width);
        if let Some(first) = mask.words.first_mut() {
            *first = value;
        }
        mask.clear_excess();
        mask
    }

    /// Builds a mask covering `width` bits starting at `first`.
    pub fn range(total_width: usize, first: usize, width: usize) -> Self {
        let mut mask = Self::empty(total_width);
        for bit in first..(first + width).min(total_width) {
            mask.insert(bit);
        }
        mask
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn contains(&self, bit: usize) -> bool {
        bit < self.width && (self.words[bit / WORD_BITS] >> (bit % WORD_BITS)) & 1 == 1
    }

    pub fn insert(&mut self, bit: usize) {
        debug_assert!(bit < self.width, "bit {bit} outside {}-bit mask", self.width);
        if bit < self.width {
            self.words[bit / WORD_BITS] |= 1 << (bit % WORD_BITS);
        }
    }

    pub fn remove(&mut self, bit: usize) {
        if bit < self.width {
            self.words[bit / WORD_BITS] &= !(1 << (bit % WORD_BITS));
        }
    }

    pub fn set(&mut self, bit: usize, value: bool) {
        if value {
            self.insert(bit);
        } else {
            self.remove(bit);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|word| *word == 0)
    }

    pub fn count(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    pub fn lowest(&self) -> Option<usize> {
        self.words
            .iter()
            .enumerate()
            .find(|(_, word)| **word != 0)
            .map(|(index, word)| index * WORD_BITS + word.trailing_zeros() as usize)
    }

    /// Iterates set bit positions in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.width).filter(move |bit| self.contains(*bit))
    }

    /// Keeps `self`'s width; bits past `other`'s width count as clear in `other`.
    pub fn intersect(&self, other: &BitMask) -> BitMask {
        let mut result = self.clone();
        for (index, word) in result.words.iter_mut().enumerate() {
            *word &= other.words.get(index).copied().unwrap_or(0);
        }
        result
    }

    pub fn union(&self, other: &BitMask) -> BitMask {
        let mut result = self.clone();
        for (index, word) in result.words.iter_mut().enumerate() {
            *word |= other.words.get(index).copied().unwrap_or(0);
        }
        result.clear_excess();
        result
    }

    pub fn difference(&self, other: &BitMask) -> BitMask {
        let mut result = self.clone();
        for (index, word) in result.words.iter_mut().enumerate() {
            *word &= !other.words.get(index).copied().unwrap_or(0);
        }
        result
    }

    /// Clears every bit at or above `width` while keeping the mask's own width.
    pub fn truncated(&self, width: usize) -> BitMask {
        let mut result = self.clone();
        for bit in width..self.width {
            result.remove(bit);
        }
        result
    }

    pub fn is_superset(&self, other: &BitMask) -> bool {
        other.iter().all(|bit| self.contains(bit))
    }

    /// Reads `width` bits starting at `first`, highest bit first, as a `'0'`/`'1'` string.
    pub fn field_string(&self, first: usize, width: usize) -> String {
        (first..first + width)
            .rev()
            .map(|bit| if self.contains(bit) { '1' } else { '0' })
            .collect()
    }

    /// Renders the mask as zero-padded uppercase hex, most significant nibble first.
    pub fn to_hex(&self) -> String {
        let digits = self.width.div_ceil(4).max(1);
        (0..digits)
            .rev()
            .map(|nibble| {
                let value = (0..4).fold(0u32, |acc, offset| {
                    acc | (u32::from(self.contains(nibble * 4 + offset)) << offset)
                });
                char::from_digit(value, 16)
                    .map(|ch| ch.to_ascii_uppercase())
                    .unwrap_or('0')
            })
            .collect()
    }

    fn clear_excess(&mut self) {
        let used = self.width % WORD_BITS;
        if used != 0
            && let Some(last) = self.words.last_mut()
        {
            *last &= (1u64 << used) - 1;
        }
    }
}

impl fmt::Debug for BitMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitMask({}'h{})", self.width, self.to_hex())
    }
}
