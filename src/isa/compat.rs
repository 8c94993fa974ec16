//! Cross-subset compatibility rules, applied to the input of a build.

use std::fmt;

use tracing::debug;

use super::instruction::InstructionRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompatRule {
    /// Instructions tagged `tag` need `subset` to be registered.
    RequireSubset { tag: String, subset: String },
    /// Instructions tagged `tag` are dropped when `subset` is registered.
    ExcludeWithSubset { tag: String, subset: String },
}

impl CompatRule {
    pub fn require(tag: impl Into<String>, subset: impl Into<String>) -> Self {
        CompatRule::RequireSubset {
            tag: tag.into(),
            subset: subset.into(),
        }
    }

    pub fn exclude_with(tag: impl Into<String>, subset: impl Into<String>) -> Self {
        CompatRule::ExcludeWithSubset {
            tag: tag.into(),
            subset: subset.into(),
        }
    }

    /// Whether this rule removes `record` given the registered subsets.
    pub fn disables(&self, record: &InstructionRecord, present: &[&str]) -> bool {
        match self {
            CompatRule::RequireSubset { tag, subset } => {
                record.has_tag(tag) && !present.contains(&subset.as_str())
            }
            CompatRule::ExcludeWithSubset { tag, subset } => {
                record.has_tag(tag) && present.contains(&subset.as_str())
            }
        }
    }
}

impl fmt::Display for CompatRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompatRule::RequireSubset { tag, subset } => write!(f, "{tag} requires {subset}"),
            CompatRule::ExcludeWithSubset { tag, subset } => {
                write!(f, "{tag} excluded with {subset}")
            }
        }
    }
}

/// Keeps the records no rule disables, in input order.
pub fn filter<'r>(
    rules: &[CompatRule],
    present: &[&str],
    records: &[&'r InstructionRecord],
) -> Vec<&'r InstructionRecord> {
    records
        .iter()
        .copied()
        .filter(|record| match rules.iter().find(|rule| rule.disables(record, present)) {
            Some(rule) => {
                debug!(insn = %record.label, %rule, "instruction disabled");
                false
            }
            None => true,
        })
        .collect()
}
