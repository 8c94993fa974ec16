//! Tag -> instruction multimap shared by every subset of a session.

use ahash::AHashMap;

use super::instruction::{InsnId, InstructionRecord};

#[derive(Debug, Default, Clone)]
pub struct TagIndex {
    order: Vec<String>,
    members: AHashMap<String, Vec<InsnId>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes a registered record under each of its tags, or under `subset` when it has
    /// none. Records without an id are ignored.
    pub fn index(&mut self, record: &InstructionRecord, subset: &str) {
        let Some(id) = record.id() else {
            return;
        };
        if record.tags.is_empty() {
            self.insert(subset, id);
        } else {
            for tag in &record.tags {
                self.insert(tag, id);
            }
        }
    }

    pub fn insert(&mut self, tag: &str, id: InsnId) {
        match self.members.get_mut(tag) {
            Some(ids) => {
                if ids.last() != Some(&id) {
                    ids.push(id);
                }
            }
            None => {
                self.order.push(tag.to_owned());
                self.members.insert(tag.to_owned(), vec![id]);
            }
        }
    }

    /// Members of `tag` in registration order; empty for unknown tags.
    pub fn get(&self, tag: &str) -> &[InsnId] {
        self.members.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.members.contains_key(tag)
    }

    /// Tags in first-registration order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
