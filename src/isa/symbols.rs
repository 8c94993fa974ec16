//! Emission symbol allocation with deterministic collision suffixes.

use ahash::{AHashMap, AHashSet};

/// Characters that split a `key=value` field or a list in the emitted table.
const FIELD_SEPARATORS: [char; 3] = ['=', ',', ';'];

/// Characters that separate a tree name from the group or leaf part of a node symbol.
const SYMBOL_SEPARATORS: [char; 2] = ['#', ':'];

/// Whether `text` can be written into the emitted table as one field value.
pub fn is_plain_token(text: &str) -> bool {
    !text.is_empty()
        && !text
            .chars()
            .any(|ch| ch.is_whitespace() || ch.is_control() || FIELD_SEPARATORS.contains(&ch))
}

/// Whether `text` can name a subset or decode tree. Tree names prefix node symbols, so
/// they also exclude the symbol separators.
pub fn is_plain_name(text: &str) -> bool {
    is_plain_token(text) && !text.contains(SYMBOL_SEPARATORS)
}

/// Hands out unique symbols. The first request for a base name receives it unchanged;
/// later requests receive `<base>_0`, `<base>_1`, ... in request order.
#[derive(Default, Debug)]
pub struct SymbolAllocator {
    taken: AHashSet<String>,
    next_suffix: AHashMap<String, u32>,
}

impl SymbolAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_owned()) {
            return base.to_owned();
        }
        let counter = self.next_suffix.entry(base.to_owned()).or_insert(0);
        loop {
            let candidate = format!("{base}_{counter}");
            *counter += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.taken.contains(symbol)
    }

    pub fn len(&self) -> usize {
        self.taken.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }
}
