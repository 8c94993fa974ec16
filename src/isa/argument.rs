//! Operand descriptors attached to instruction records and emitted verbatim for the
//! execution engine's run-time extraction.

use std::fmt;

use bitflags::bitflags;

use super::bits::{BitMask, BitRangeSet};

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct EncodingFlags: u8 {
        /// Register number is stored relative to x8 (compressed encodings).
        const COMPRESSED = 0b0000_0001;
        /// Register names a 64-bit even/odd pair.
        const REG_PAIR_64 = 0b0000_0010;
        /// Register aliases the floating-point file.
        const FLOAT_REG = 0b0000_0100;
        const POST_INC = 0b0000_1000;
        const PRE_INC = 0b0001_0000;
    }
}

impl fmt::Display for EncodingFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (name, _)) in self.iter_names().enumerate() {
            if index > 0 {
                write!(f, "+")?;
            }
            write!(f, "{}", name.to_ascii_lowercase())?;
        }
        Ok(())
    }
}

/// Slot namespaces; slot ids must be unique within each of them per instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperandDirection {
    Output,
    Input,
    Immediate,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Operand {
    pub slot: u8,
    pub ranges: BitRangeSet,
    pub show_name: bool,
    pub flags: EncodingFlags,
}

impl Operand {
    pub fn new(slot: u8, ranges: BitRangeSet) -> Self {
        Self {
            slot,
            ranges,
            show_name: false,
            flags: EncodingFlags::empty(),
        }
    }

    pub fn with_flags(mut self, flags: EncodingFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn named(mut self) -> Self {
        self.show_name = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Indirect {
    pub base: Box<Argument>,
    pub offset: Option<Box<Argument>>,
    pub mode: EncodingFlags,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Argument {
    OutReg(Operand),
    InReg(Operand),
    SignedImm(Operand),
    UnsignedImm(Operand),
    Constant { value: i64 },
    Indirect(Indirect),
}

impl Argument {
    pub fn indirect(base: Argument, offset: Option<Argument>, mode: EncodingFlags) -> Self {
        Argument::Indirect(Indirect {
            base: Box::new(base),
            offset: offset.map(Box::new),
            mode,
        })
    }

    /// Direction of a leaf operand; composite and constant arguments have none.
    pub fn direction(&self) -> Option<OperandDirection> {
        match self {
            Argument::OutReg(_) => Some(OperandDirection::Output),
            Argument::InReg(_) => Some(OperandDirection::Input),
            Argument::SignedImm(_) | Argument::UnsignedImm(_) => Some(OperandDirection::Immediate),
            Argument::Constant { .. } | Argument::Indirect(_) => None,
        }
    }

    pub fn operand(&self) -> Option<&Operand> {
        match self {
            Argument::OutReg(op)
            | Argument::InReg(op)
            | Argument::SignedImm(op)
            | Argument::UnsignedImm(op) => Some(op),
            Argument::Constant { .. } | Argument::Indirect(_) => None,
        }
    }

    /// Visits every leaf operand, descending into indirect bases and offsets.
    pub fn for_each_operand<F>(&self, visit: &mut F)
    where
        F: FnMut(OperandDirection, &Operand),
    {
        match self {
            Argument::Indirect(indirect) => {
                indirect.base.for_each_operand(visit);
                if let Some(offset) = &indirect.offset {
                    offset.for_each_operand(visit);
                }
            }
            other => {
                if let (Some(direction), Some(op)) = (other.direction(), other.operand()) {
                    visit(direction, op);
                }
            }
        }
    }

    /// One past the highest encoding bit read by this argument.
    pub fn encoding_end(&self) -> usize {
        let mut end = 0;
        self.for_each_operand(&mut |_, op| end = end.max(op.ranges.end()));
        end
    }

    /// Extracts the operand value from a concrete word, sign-extending signed immediates.
    pub fn value(&self, word: &BitMask) -> Option<i64> {
        match self {
            Argument::Constant { value } => Some(*value),
            Argument::SignedImm(op) => {
                let raw = op.ranges.extract(word);
                let top = op.ranges.ranges().iter().map(|r| r.shift + r.width).max()?;
                if top == 0 || top >= 64 {
                    return Some(raw as i64);
                }
                let shift = 64 - top as u32;
                Some(((raw << shift) as i64) >> shift)
            }
            Argument::OutReg(op) | Argument::InReg(op) | Argument::UnsignedImm(op) => {
                let raw = op.ranges.extract(word) as i64;
                if op.flags.contains(EncodingFlags::COMPRESSED) {
                    raw.checked_add(8)
                } else {
                    Some(raw)
                }
            }
            Argument::Indirect(_) => None,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Argument::OutReg(_) => "out_reg",
            Argument::InReg(_) => "in_reg",
            Argument::SignedImm(_) => "simm",
            Argument::UnsignedImm(_) => "uimm",
            Argument::Constant { .. } => "const",
            Argument::Indirect(_) => "indirect",
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Constant { value } => write!(f, "const({value})"),
            Argument::Indirect(indirect) => {
                write!(f, "indirect({}", indirect.base)?;
                if let Some(offset) = &indirect.offset {
                    write!(f, ",{offset}")?;
                }
                write!(f, ")")?;
                if !indirect.mode.is_empty() {
                    write!(f, "{{{}}}", indirect.mode)?;
                }
                Ok(())
            }
            other => {
                let Some(op) = other.operand() else {
                    return Ok(());
                };
                write!(f, "{}#{}{}", other.kind_name(), op.slot, op.ranges)?;
                if op.show_name {
                    write!(f, "!")?;
                }
                if !op.flags.is_empty() {
                    write!(f, "{{{}}}", op.flags)?;
                }
                Ok(())
            }
        }
    }
}
