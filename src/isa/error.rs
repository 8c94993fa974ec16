use std::fmt;

use super::bits::PatternError;

/// One instruction taking part in a decode conflict, reported verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictEntry {
    pub label: String,
    pub pattern: String,
}

/// Represents any failure that can occur while assembling instruction tables, building
/// decode trees, or emitting them.
#[derive(Debug)]
pub enum IsaError {
    /// Two or more instructions cannot be told apart by any remaining bit.
    DecodeConflict { entries: Vec<ConflictEntry> },
    /// An instruction record violates a structural invariant.
    MalformedInstruction(String),
    Pattern(PatternError),
    UnknownSubset(String),
    DuplicateSubset(String),
    InvalidParameter(String),
}

impl IsaError {
    pub fn is_decode_conflict(&self) -> bool {
        matches!(self, IsaError::DecodeConflict { .. })
    }

    pub fn conflict_entries(&self) -> &[ConflictEntry] {
        match self {
            IsaError::DecodeConflict { entries } => entries,
            _ => &[],
        }
    }
}

impl From<PatternError> for IsaError {
    fn from(err: PatternError) -> Self {
        IsaError::Pattern(err)
    }
}

impl fmt::Display for IsaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IsaError::DecodeConflict { entries } => {
                writeln!(
                    f,
                    "decode conflict: {} instruction(s) cannot be discriminated:",
                    entries.len()
                )?;
                for entry in entries {
                    writeln!(f, "  - {} {}", entry.pattern, entry.label)?;
                }
                Ok(())
            }
            IsaError::MalformedInstruction(msg) => write!(f, "malformed instruction: {msg}"),
            IsaError::Pattern(err) => write!(f, "malformed instruction: {err}"),
            IsaError::UnknownSubset(name) => write!(f, "unknown ISA subset '{name}'"),
            IsaError::DuplicateSubset(name) => {
                write!(f, "ISA subset '{name}' registered multiple times")
            }
            IsaError::InvalidParameter(msg) => write!(f, "invalid build parameter: {msg}"),
        }
    }
}

impl std::error::Error for IsaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IsaError::Pattern(err) => Some(err),
            _ => None,
        }
    }
}
