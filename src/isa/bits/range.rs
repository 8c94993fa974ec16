//! Operand bit-range descriptors that carve operand values out of an instruction word.

use std::fmt;

use smallvec::SmallVec;

use super::mask::BitMask;
use super::pattern::PatternError;

const OPERAND_BITS: usize = u64::BITS as usize;

/// Selects `width` bits starting at absolute bit `first` of the raw encoding and places them
/// at bit `shift` of the reconstructed operand value. Operand values are at most 64 bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BitRange {
    pub first: usize,
    pub width: usize,
    pub shift: usize,
}

impl BitRange {
    pub fn new(first: usize, width: usize, shift: usize) -> Result<Self, PatternError> {
        let range = Self {
            first,
            width,
            shift,
        };
        range.check()?;
        Ok(range)
    }

    fn check(&self) -> Result<(), PatternError> {
        if self.width == 0 {
            return Err(PatternError::ZeroWidthRange);
        }
        match self.shift.checked_add(self.width) {
            Some(bits) if bits <= OPERAND_BITS => Ok(()),
            bits => Err(PatternError::OperandTooWide {
                bits: bits.unwrap_or(usize::MAX),
            }),
        }
    }

    /// One past the highest encoding bit read by this range.
    pub fn end(&self) -> usize {
        self.first + self.width
    }
}

impl fmt::Display for BitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.width == 1 {
            write!(f, "{}", self.first)?;
        } else {
            write!(f, "{}-{}", self.end() - 1, self.first)?;
        }
        if self.shift != 0 {
            write!(f, "<<{}", self.shift)?;
        }
        Ok(())
    }
}

/// Ordered ranges concatenated high-to-low into one logical field. Split immediates such as
/// the RISC-V branch offset use several ranges.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BitRangeSet {
    ranges: SmallVec<[BitRange; 2]>,
}

impl BitRangeSet {
    /// A single contiguous field with no shift.
    pub fn single(first: usize, width: usize) -> Result<Self, PatternError> {
        Self::from_ranges([BitRange::new(first, width, 0)?])
    }

    pub fn from_ranges<I>(ranges: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = BitRange>,
    {
        let ranges: SmallVec<[BitRange; 2]> = ranges.into_iter().collect();
        if ranges.is_empty() {
            return Err(PatternError::MissingRanges);
        }
        for range in &ranges {
            range.check()?;
        }
        Ok(Self { ranges })
    }

    /// Parses `@(31|7|30-25|11-8)<<1`: LSB-0 `hi-lo` or single-bit tokens listed from the
    /// most significant operand bits down, with an optional shift applied to the whole field.
    pub fn parse(spec: &str) -> Result<Self, PatternError> {
        let trimmed = spec.trim();
        let (body, base_shift) = match trimmed.rsplit_once("<<") {
            Some((body, shift)) => (body.trim(), parse_number(shift.trim())?),
            None => (trimmed, 0),
        };
        let body = body
            .strip_prefix("@(")
            .or_else(|| body.strip_prefix('('))
            .map(|rest| {
                rest.strip_suffix(')')
                    .ok_or_else(|| PatternError::InvalidToken(trimmed.to_string()))
            })
            .unwrap_or(Ok(body))?;

        let mut spans = Vec::new();
        for token in body.split('|') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            spans.push(parse_span(token)?);
        }
        if spans.is_empty() {
            return Err(PatternError::MissingRanges);
        }

        let mut shift = base_shift;
        let mut ranges: SmallVec<[BitRange; 2]> = SmallVec::new();
        for (first, width) in spans.into_iter().rev() {
            ranges.push(BitRange::new(first, width, shift)?);
            shift = shift.saturating_add(width);
        }
        ranges.reverse();
        Ok(Self { ranges })
    }

    pub fn ranges(&self) -> &[BitRange] {
        &self.ranges
    }

    /// Total operand bits contributed by all ranges.
    pub fn width(&self) -> usize {
        self.ranges.iter().map(|range| range.width).sum()
    }

    /// One past the highest encoding bit read by any range.
    pub fn end(&self) -> usize {
        self.ranges.iter().map(BitRange::end).max().unwrap_or(0)
    }

    /// Reconstructs the operand value from a concrete word.
    pub fn extract(&self, word: &BitMask) -> u64 {
        let mut ordered: SmallVec<[&BitRange; 2]> = self.ranges.iter().collect();
        ordered.sort_by(|a, b| b.shift.cmp(&a.shift));
        ordered.into_iter().fold(0u64, |acc, range| {
            let part = (0..range.width.min(OPERAND_BITS)).fold(0u64, |part, offset| {
                part | (u64::from(word.contains(range.first + offset)) << offset)
            });
            let placed = u32::try_from(range.shift)
                .ok()
                .and_then(|shift| part.checked_shl(shift));
            acc | placed.unwrap_or(0)
        })
    }
}

impl fmt::Display for BitRangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (index, range) in self.ranges.iter().enumerate() {
            if index > 0 {
                write!(f, "|")?;
            }
            write!(f, "{range}")?;
        }
        write!(f, "]")
    }
}

fn parse_span(token: &str) -> Result<(usize, usize), PatternError> {
    match token.split_once('-') {
        Some((high, low)) => {
            let high = parse_number(high.trim())?;
            let low = parse_number(low.trim())?;
            if high < low {
                return Err(PatternError::ReversedRange { high, low });
            }
            let width = (high - low)
                .checked_add(1)
                .ok_or(PatternError::OperandTooWide { bits: usize::MAX })?;
            Ok((low, width))
        }
        None => Ok((parse_number(token)?, 1)),
    }
}

fn parse_number(token: &str) -> Result<usize, PatternError> {
    if token.is_empty() {
        return Err(PatternError::InvalidNumber(token.to_string()));
    }
    let value = if let Some(rest) = token.strip_prefix("0x") {
        usize::from_str_radix(rest, 16)
    } else {
        token.parse::<usize>()
    };
    value.map_err(|_| PatternError::InvalidNumber(token.to_string()))
}
