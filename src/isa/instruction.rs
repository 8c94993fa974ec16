//! Instruction records: one encoding template plus the metadata emitted alongside it.

use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroU32;

use super::argument::{Argument, OperandDirection};
use super::bits::{BitMask, BitPattern};
use super::error::IsaError;
use super::symbols::is_plain_token;

/// Global instruction number assigned by a session in registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InsnId(NonZeroU32);

impl InsnId {
    /// Id of the record at `index`, or `None` once the id space is used up.
    pub(crate) fn checked(index: usize) -> Option<Self> {
        u32::try_from(index)
            .ok()
            .and_then(|index| index.checked_add(1))
            .and_then(NonZeroU32::new)
            .map(Self)
    }

    #[cfg(test)]
    pub(crate) fn from_index(index: usize) -> Self {
        Self::checked(index).expect("index fits an instruction id")
    }

    pub fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Display for InsnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Execution resource an instruction occupies (e.g. a shared divider).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceBinding {
    pub name: String,
    pub latency: u32,
    pub bandwidth: u32,
}

impl fmt::Display for ResourceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.name, self.latency, self.bandwidth)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstructionRecord {
    pub label: String,
    pub trace_label: String,
    pub pattern_text: String,
    pub pattern: BitPattern,
    pub arguments: Vec<Argument>,
    pub decode_hint: Option<String>,
    pub handler_id: Option<String>,
    pub fast_handler_id: Option<String>,
    pub tags: BTreeSet<String>,
    pub isa_tags: BTreeSet<String>,
    pub resource: Option<ResourceBinding>,
    pub latency: u32,
    pub power_group: u32,
    pub is_macro_op: bool,
    id: Option<InsnId>,
    symbol: Option<String>,
}

impl InstructionRecord {
    pub fn new(label: impl Into<String>, pattern: impl Into<String>) -> Result<Self, IsaError> {
        let label = label.into();
        let pattern_text = pattern.into();
        if label.trim().is_empty() {
            return Err(IsaError::MalformedInstruction(format!(
                "instruction with pattern '{pattern_text}' has an empty label"
            )));
        }
        if !is_plain_token(&label) {
            return Err(IsaError::MalformedInstruction(format!(
                "instruction label '{label}' contains whitespace or one of '=,;'"
            )));
        }
        let pattern = BitPattern::parse(&pattern_text).map_err(|err| {
            IsaError::MalformedInstruction(format!("instruction '{label}': {err}"))
        })?;
        Ok(Self {
            trace_label: label.clone(),
            label,
            pattern_text,
            pattern,
            arguments: Vec::new(),
            decode_hint: None,
            handler_id: None,
            fast_handler_id: None,
            tags: BTreeSet::new(),
            isa_tags: BTreeSet::new(),
            resource: None,
            latency: 0,
            power_group: 0,
            is_macro_op: false,
            id: None,
            symbol: None,
        })
    }

    pub fn width(&self) -> usize {
        self.pattern.width()
    }

    /// Set once a session registers the record.
    pub fn id(&self) -> Option<InsnId> {
        self.id
    }

    /// Unique emission symbol, set once a session registers the record.
    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub(crate) fn assign(&mut self, id: InsnId, symbol: String) {
        self.id = Some(id);
        self.symbol = Some(symbol);
    }

    /// Base name for the emission symbol, before collision suffixes.
    pub fn symbol_base(&self) -> String {
        let source = self.decode_hint.as_deref().unwrap_or(&self.label);
        let mut base: String = source
            .chars()
            .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
            .collect();
        if base.starts_with(|ch: char| ch.is_ascii_digit()) {
            base.insert(0, '_');
        }
        base
    }

    pub fn handler(&self) -> String {
        match (&self.handler_id, &self.symbol) {
            (Some(handler), _) => handler.clone(),
            (None, Some(symbol)) => format!("{symbol}_exec"),
            (None, None) => format!("{}_exec", self.symbol_base()),
        }
    }

    pub fn fast_handler(&self) -> String {
        self.fast_handler_id.clone().unwrap_or_else(|| self.handler())
    }

    /// Whether `tag` appears in either tag set.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag) || self.isa_tags.contains(tag)
    }

    pub fn matches(&self, word: &BitMask) -> bool {
        self.pattern.matches(word)
    }

    /// Checks that every emitted text field is a single token, operand slot uniqueness per
    /// direction, and that every argument reads bits inside the pattern.
    pub fn validate(&self) -> Result<(), IsaError> {
        self.validate_text()?;
        let mut seen: BTreeSet<(OperandDirection, u8)> = BTreeSet::new();
        let mut duplicate = None;
        for argument in &self.arguments {
            argument.for_each_operand(&mut |direction, op| {
                if !seen.insert((direction, op.slot)) && duplicate.is_none() {
                    duplicate = Some((direction, op.slot));
                }
            });
            let end = argument.encoding_end();
            if end > self.width() {
                return Err(IsaError::MalformedInstruction(format!(
                    "instruction '{}': argument {argument} reads bit {} of a {}-bit pattern",
                    self.label,
                    end - 1,
                    self.width()
                )));
            }
        }
        if let Some((direction, slot)) = duplicate {
            return Err(IsaError::MalformedInstruction(format!(
                "instruction '{}': duplicate {direction:?} operand slot {slot}",
                self.label
            )));
        }
        Ok(())
    }

    fn validate_text(&self) -> Result<(), IsaError> {
        let fields = [
            ("label", Some(self.label.as_str())),
            ("trace label", Some(self.trace_label.as_str())),
            ("decode hint", self.decode_hint.as_deref()),
            ("handler", self.handler_id.as_deref()),
            ("fast handler", self.fast_handler_id.as_deref()),
            ("resource", self.resource.as_ref().map(|r| r.name.as_str())),
        ];
        let tags = self
            .tags
            .iter()
            .chain(&self.isa_tags)
            .map(|tag| ("tag", Some(tag.as_str())));
        for (field, value) in fields.into_iter().chain(tags) {
            if let Some(value) = value
                && (!is_plain_token(value) || (field == "resource" && value.contains(':')))
            {
                return Err(IsaError::MalformedInstruction(format!(
                    "instruction '{}': {field} '{value}' contains whitespace or one of '=,;'",
                    self.label
                )));
            }
        }
        Ok(())
    }
}
