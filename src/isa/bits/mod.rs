//! Bit-level building blocks: masks, encoding templates, and operand bit ranges.

pub mod mask;
pub mod pattern;
pub mod range;

pub use mask::BitMask;
pub use pattern::{BitPattern, PatternError};
pub use range::{BitRange, BitRangeSet};
