//! Helpers for assembling instruction tables in memory and turning them into a populated
//! [`IsaSession`].
//!
//! Errors raised while describing an instruction (bad pattern, bad bit-range spec) are held
//! back until [`IsaBuilder::build`] so table code can stay a flat chain of calls.

use super::argument::{Argument, EncodingFlags, Operand};
use super::bits::BitRangeSet;
use super::compat::CompatRule;
use super::error::IsaError;
use super::instruction::{InstructionRecord, ResourceBinding};
use super::options::BuildOptions;
use super::session::IsaSession;

/// Convenience wrapper for describing named instruction subsets.
#[derive(Default)]
pub struct IsaBuilder {
    options: BuildOptions,
    rules: Vec<CompatRule>,
    subsets: Vec<(String, Vec<InstructionRecord>)>,
    error: Option<IsaError>,
}

impl IsaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(&mut self, options: BuildOptions) -> &mut Self {
        self.options = options;
        self
    }

    pub fn rule(&mut self, rule: CompatRule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// Declares a subset so it is registered in this position even before it has members.
    pub fn subset(&mut self, name: impl Into<String>) -> &mut Self {
        self.subset_members(name.into());
        self
    }

    /// Begins an instruction of `subset`; call [`InstructionBuilder::finish`] to push it.
    pub fn instruction(
        &mut self,
        subset: impl Into<String>,
        label: impl Into<String>,
        pattern: impl Into<String>,
    ) -> InstructionBuilder<'_> {
        let record = InstructionRecord::new(label, pattern);
        InstructionBuilder {
            builder: self,
            subset: subset.into(),
            record,
        }
    }

    /// Registers every subset in declaration order.
    pub fn build(self) -> Result<IsaSession, IsaError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let mut session = IsaSession::new(self.options);
        for rule in self.rules {
            session.add_rule(rule);
        }
        for (name, records) in self.subsets {
            session.register_subset(name, records)?;
        }
        Ok(session)
    }

    fn subset_members(&mut self, name: String) -> &mut Vec<InstructionRecord> {
        let index = match self.subsets.iter().position(|(existing, _)| *existing == name) {
            Some(index) => index,
            None => {
                self.subsets.push((name, Vec::new()));
                self.subsets.len() - 1
            }
        };
        &mut self.subsets[index].1
    }

    fn push(&mut self, subset: String, record: Result<InstructionRecord, IsaError>) {
        match record {
            Ok(record) => self.subset_members(subset).push(record),
            Err(err) => {
                self.error.get_or_insert(err);
            }
        }
    }
}

/// Builder for one [`InstructionRecord`].
#[must_use = "the instruction is only added by `finish()`"]
pub struct InstructionBuilder<'a> {
    builder: &'a mut IsaBuilder,
    subset: String,
    record: Result<InstructionRecord, IsaError>,
}

impl<'a> InstructionBuilder<'a> {
    fn update(mut self, apply: impl FnOnce(&mut InstructionRecord)) -> Self {
        if let Ok(record) = &mut self.record {
            apply(record);
        }
        self
    }

    fn try_update(
        mut self,
        apply: impl FnOnce(&mut InstructionRecord) -> Result<(), IsaError>,
    ) -> Self {
        if let Ok(record) = &mut self.record
            && let Err(err) = apply(record)
        {
            self.record = Err(err);
        }
        self
    }

    pub fn trace_label(self, label: impl Into<String>) -> Self {
        let label = label.into();
        self.update(|record| record.trace_label = label)
    }

    pub fn decode_hint(self, hint: impl Into<String>) -> Self {
        let hint = hint.into();
        self.update(|record| record.decode_hint = Some(hint))
    }

    pub fn handler(self, handler: impl Into<String>) -> Self {
        let handler = handler.into();
        self.update(|record| record.handler_id = Some(handler))
    }

    pub fn fast_handler(self, handler: impl Into<String>) -> Self {
        let handler = handler.into();
        self.update(|record| record.fast_handler_id = Some(handler))
    }

    pub fn tag(self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.update(|record| {
            record.tags.insert(tag);
        })
    }

    pub fn isa_tag(self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.update(|record| {
            record.isa_tags.insert(tag);
        })
    }

    pub fn resource(self, name: impl Into<String>, latency: u32, bandwidth: u32) -> Self {
        let name = name.into();
        self.update(|record| {
            record.resource = Some(ResourceBinding {
                name,
                latency,
                bandwidth,
            })
        })
    }

    pub fn latency(self, latency: u32) -> Self {
        self.update(|record| record.latency = latency)
    }

    pub fn power_group(self, group: u32) -> Self {
        self.update(|record| record.power_group = group)
    }

    pub fn macro_op(self) -> Self {
        self.update(|record| record.is_macro_op = true)
    }

    pub fn argument(self, argument: Argument) -> Self {
        self.update(|record| record.arguments.push(argument))
    }

    pub fn out_reg(self, slot: u8, spec: &str) -> Self {
        self.operand_argument(slot, spec, EncodingFlags::empty(), Argument::OutReg)
    }

    pub fn in_reg(self, slot: u8, spec: &str) -> Self {
        self.operand_argument(slot, spec, EncodingFlags::empty(), Argument::InReg)
    }

    /// 3-bit compressed register field (x8..x15).
    pub fn out_creg(self, slot: u8, spec: &str) -> Self {
        self.operand_argument(slot, spec, EncodingFlags::COMPRESSED, Argument::OutReg)
    }

    pub fn in_creg(self, slot: u8, spec: &str) -> Self {
        self.operand_argument(slot, spec, EncodingFlags::COMPRESSED, Argument::InReg)
    }

    pub fn simm(self, slot: u8, spec: &str) -> Self {
        self.operand_argument(slot, spec, EncodingFlags::empty(), Argument::SignedImm)
    }

    pub fn uimm(self, slot: u8, spec: &str) -> Self {
        self.operand_argument(slot, spec, EncodingFlags::empty(), Argument::UnsignedImm)
    }

    pub fn constant(self, value: i64) -> Self {
        self.argument(Argument::Constant { value })
    }

    fn operand_argument(
        self,
        slot: u8,
        spec: &str,
        flags: EncodingFlags,
        wrap: fn(Operand) -> Argument,
    ) -> Self {
        self.try_update(|record| {
            let op = operand(slot, spec)?.with_flags(flags);
            record.arguments.push(wrap(op));
            Ok(())
        })
    }

    /// Completes the builder and pushes the instruction into its subset.
    pub fn finish(self) -> &'a mut IsaBuilder {
        self.builder.push(self.subset, self.record);
        self.builder
    }
}

/// Operand over a bit-range spec such as `@(11-7)` or `@(31|7|30-25|11-8)<<1`.
pub fn operand(slot: u8, spec: &str) -> Result<Operand, IsaError> {
    Ok(Operand::new(slot, BitRangeSet::parse(spec)?))
}
