//! Build-session configuration.

use super::error::IsaError;

pub const DEFAULT_CATCHALL_KEY: &str = "OTHERS";

/// Parameter values accepted by [`BuildOptions::from_parameters`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterValue {
    Number(u64),
    Word(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Key naming catch-all buckets in emitted tables.
    pub catchall_key: String,
    /// Accept instructions of different widths in one build call.
    pub allow_mixed_widths: bool,
    /// Report catch-all instructions that only partially overlap a concrete sibling.
    pub reject_partial_overlap: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            catchall_key: DEFAULT_CATCHALL_KEY.to_string(),
            allow_mixed_widths: false,
            reject_partial_overlap: false,
        }
    }
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn catchall_key(mut self, key: impl Into<String>) -> Self {
        self.catchall_key = key.into();
        self
    }

    pub fn allow_mixed_widths(mut self, allow: bool) -> Self {
        self.allow_mixed_widths = allow;
        self
    }

    pub fn reject_partial_overlap(mut self, reject: bool) -> Self {
        self.reject_partial_overlap = reject;
        self
    }

    /// Applies named parameters on top of the defaults.
    pub fn from_parameters<'a, I>(params: I) -> Result<Self, IsaError>
    where
        I: IntoIterator<Item = (&'a str, &'a ParameterValue)>,
    {
        let mut options = Self::default();
        for (name, value) in params {
            match name {
                "catchall_key" => match value {
                    ParameterValue::Word(word) if !word.trim().is_empty() => {
                        options.catchall_key = word.clone();
                    }
                    other => {
                        return Err(IsaError::InvalidParameter(format!(
                            "catchall_key expects a non-empty word, got {other:?}"
                        )));
                    }
                },
                "allow_mixed_widths" => options.allow_mixed_widths = parse_flag(name, value)?,
                "reject_partial_overlap" => {
                    options.reject_partial_overlap = parse_flag(name, value)?
                }
                unknown => {
                    return Err(IsaError::InvalidParameter(format!(
                        "unknown parameter '{unknown}'"
                    )));
                }
            }
        }
        Ok(options)
    }
}

fn parse_flag(name: &str, value: &ParameterValue) -> Result<bool, IsaError> {
    match value {
        ParameterValue::Number(0) => Ok(false),
        ParameterValue::Number(1) => Ok(true),
        ParameterValue::Word(word) if word.eq_ignore_ascii_case("true") => Ok(true),
        ParameterValue::Word(word) if word.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(IsaError::InvalidParameter(format!(
            "{name} expects 0/1 or true/false, got {other:?}"
        ))),
    }
}
