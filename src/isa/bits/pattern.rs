//! Encoding templates over the alphabet `{0, 1, -}`.

use std::fmt;

use super::mask::BitMask;

/// One instruction encoding template. Bit 0 is the rightmost character of the source text.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BitPattern {
    width: usize,
    care: BitMask,
    value: BitMask,
}

impl BitPattern {
    /// Parses a template such as `"0000000 ----- ----- 000 ----- 0110011"`. Whitespace and
    /// `_` are separators and carry no bits.
    pub fn parse(text: &str) -> Result<Self, PatternError> {
        let symbols: Vec<(usize, char)> = text
            .char_indices()
            .filter(|(_, ch)| !ch.is_whitespace() && *ch != '_')
            .collect();
        if symbols.is_empty() {
            return Err(PatternError::Empty);
        }
        let width = symbols.len();
        let mut pattern = BitPattern::dont_care(width);
        for (bit, (position, ch)) in symbols.iter().rev().enumerate() {
            match ch {
                '0' => pattern.care.insert(bit),
                '1' => {
                    pattern.care.insert(bit);
                    pattern.value.insert(bit);
                }
                '-' => {}
                other => {
                    return Err(PatternError::InvalidSymbol {
                        symbol: *other,
                        position: *position,
                    });
                }
            }
        }
        Ok(pattern)
    }

    /// A template of `width` bits where nothing is known yet.
    pub fn dont_care(width: usize) -> Self {
        Self {
            width,
            care: BitMask::empty(width),
            value: BitMask::empty(width),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Bits holding a concrete `0`/`1`.
    pub fn care(&self) -> &BitMask {
        &self.care
    }

    /// Values of the concrete bits; don't-care positions read as zero.
    pub fn value(&self) -> &BitMask {
        &self.value
    }

    /// `None` for don't-care or out-of-range positions.
    pub fn bit(&self, bit: usize) -> Option<bool> {
        self.care.contains(bit).then(|| self.value.contains(bit))
    }

    pub fn is_concrete(&self, bit: usize) -> bool {
        self.care.contains(bit)
    }

    /// Concrete bits of the field `[first, first + width)` read from the high bit down, or
    /// `None` when any of them is don't-care.
    pub fn field_value(&self, first: usize, width: usize) -> Option<String> {
        (first..first + width)
            .rev()
            .map(|bit| self.bit(bit).map(|set| if set { '1' } else { '0' }))
            .collect()
    }

    /// Returns a copy with the field `[first, first + bits.len())` fixed to `bits`
    /// (high bit first).
    pub fn with_field(&self, first: usize, bits: &str) -> Self {
        let mut result = self.clone();
        let width = bits.len();
        for (offset, ch) in bits.chars().enumerate() {
            let bit = first + width - 1 - offset;
            if bit >= result.width {
                continue;
            }
            result.care.insert(bit);
            result.value.set(bit, ch == '1');
        }
        result
    }

    /// Whether a concrete word satisfies every concrete bit of the template.
    pub fn matches(&self, word: &BitMask) -> bool {
        word.width() >= self.width && self.care.intersect(word) == self.value
    }

    /// Whether some concrete word could satisfy both templates.
    pub fn overlaps(&self, other: &BitPattern) -> bool {
        let shared = self.care.intersect(&other.care);
        shared
            .iter()
            .all(|bit| self.value.contains(bit) == other.value.contains(bit))
    }

    /// Whether `self` constrains every bit `other` constrains, with identical values.
    pub fn refines(&self, other: &BitPattern) -> bool {
        self.care.is_superset(&other.care)
            && other
                .care
                .iter()
                .all(|bit| self.value.contains(bit) == other.value.contains(bit))
    }
}

impl fmt::Display for BitPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in (0..self.width).rev() {
            let symbol = match self.bit(bit) {
                Some(true) => '1',
                Some(false) => '0',
                None => '-',
            };
            write!(f, "{symbol}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitPattern({self})")
    }
}

/// Errors raised while parsing patterns and bit-range specs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    Empty,
    InvalidSymbol { symbol: char, position: usize },
    InvalidToken(String),
    InvalidNumber(String),
    ZeroWidthRange,
    MissingRanges,
    ReversedRange { high: usize, low: usize },
    OperandTooWide { bits: usize },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::Empty => write!(f, "bit pattern is empty"),
            PatternError::InvalidSymbol { symbol, position } => {
                write!(f, "invalid symbol '{symbol}' at offset {position} in bit pattern")
            }
            PatternError::InvalidToken(token) => write!(f, "invalid token '{token}' in bit range spec"),
            PatternError::InvalidNumber(token) => {
                write!(f, "invalid number '{token}' in bit range spec")
            }
            PatternError::ZeroWidthRange => write!(f, "bit range width must be non-zero"),
            PatternError::MissingRanges => write!(f, "bit range spec does not contain any ranges"),
            PatternError::ReversedRange { high, low } => {
                write!(f, "bit range {high}-{low} must be written high-low")
            }
            PatternError::OperandTooWide { bits } => {
                write!(f, "operand spans {bits} bits, more than 64")
            }
        }
    }
}

impl std::error::Error for PatternError {}
