//! Build session: owns the global instruction numbering, the tag index, symbol allocation,
//! and the cache of built decode trees.

use std::collections::BTreeMap;
use std::sync::Arc;

use ahash::AHashMap;
use tracing::debug;

use super::compat::{self, CompatRule};
use super::decode::DecodeTree;
use super::emit::DecodeTable;
use super::error::IsaError;
use super::instruction::{InsnId, InstructionRecord};
use super::options::BuildOptions;
use super::symbols::{SymbolAllocator, is_plain_name};
use super::tags::TagIndex;

#[derive(Debug, Clone)]
pub struct Subset {
    pub name: String,
    pub members: Vec<InsnId>,
}

/// Instructions a cached tree was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Selection {
    Subsets(Vec<String>),
    Tags(Vec<String>),
}

#[derive(Debug)]
struct CachedTree {
    selection: Selection,
    tree: Arc<DecodeTree>,
}

#[derive(Debug, Default)]
pub struct IsaSession {
    options: BuildOptions,
    instructions: Vec<InstructionRecord>,
    subsets: Vec<Subset>,
    subset_index: AHashMap<String, usize>,
    tags: TagIndex,
    symbols: SymbolAllocator,
    rules: Vec<CompatRule>,
    trees: BTreeMap<String, CachedTree>,
}

impl IsaSession {
    pub fn new(options: BuildOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Adds a compatibility rule applied to the input of every later build.
    pub fn add_rule(&mut self, rule: CompatRule) {
        self.rules.push(rule);
        self.invalidate();
    }

    /// Appends `instructions` to the global list, numbering them after every instruction
    /// registered so far, and indexes them by tag.
    pub fn register_subset(
        &mut self,
        name: impl Into<String>,
        instructions: Vec<InstructionRecord>,
    ) -> Result<&[InsnId], IsaError> {
        let name = name.into();
        check_name("subset", &name)?;
        if self.subset_index.contains_key(&name) {
            return Err(IsaError::DuplicateSubset(name));
        }
        for record in &instructions {
            record.validate()?;
        }
        let ids = id_range(self.instructions.len(), instructions.len())?;

        let mut members = Vec::with_capacity(instructions.len());
        for (id, mut record) in ids.zip(instructions) {
            let symbol = self.symbols.allocate(&record.symbol_base());
            record.assign(id, symbol);
            self.tags.index(&record, &name);
            members.push(id);
            self.instructions.push(record);
        }
        debug!(subset = %name, instructions = members.len(), "subset registered");

        let index = self.subsets.len();
        self.subset_index.insert(name.clone(), index);
        self.subsets.push(Subset { name, members });
        self.invalidate();
        Ok(&self.subsets[index].members)
    }

    pub fn subset(&self, name: &str) -> Option<&Subset> {
        self.subset_index.get(name).map(|index| &self.subsets[*index])
    }

    /// Subsets in registration order.
    pub fn subsets(&self) -> &[Subset] {
        &self.subsets
    }

    pub fn instruction(&self, id: InsnId) -> Option<&InstructionRecord> {
        self.instructions.get(id.index())
    }

    /// Every registered instruction, indexed by id.
    pub fn instructions(&self) -> &[InstructionRecord] {
        &self.instructions
    }

    pub fn tags(&self) -> &TagIndex {
        &self.tags
    }

    /// Instructions indexed under `tag` in registration order.
    pub fn insns_for_tag(&self, tag: &str) -> Vec<&InstructionRecord> {
        self.tags
            .get(tag)
            .iter()
            .filter_map(|id| self.instruction(*id))
            .collect()
    }

    /// Decode tree of one subset, built on first request and cached afterwards.
    pub fn tree_for(&mut self, subset: &str) -> Result<Arc<DecodeTree>, IsaError> {
        self.forest_for(subset, &[subset])
    }

    /// One decode tree over several subsets, in the order given.
    pub fn forest_for(&mut self, name: &str, subsets: &[&str]) -> Result<Arc<DecodeTree>, IsaError> {
        let selection = Selection::Subsets(subsets.iter().map(|s| s.to_string()).collect());
        self.cached(name, selection)
    }

    /// One decode tree over every instruction carrying any of `tags`, in registration order.
    pub fn tree_for_tags(&mut self, name: &str, tags: &[&str]) -> Result<Arc<DecodeTree>, IsaError> {
        let selection = Selection::Tags(tags.iter().map(|t| t.to_string()).collect());
        self.cached(name, selection)
    }

    /// Builds (or reuses) the tree of every subset, in registration order.
    pub fn all_trees(&mut self) -> Result<Vec<Arc<DecodeTree>>, IsaError> {
        let names: Vec<String> = self.subsets.iter().map(|s| s.name.clone()).collect();
        names.iter().map(|name| self.tree_for(name)).collect()
    }

    /// Emission table for `trees` plus the full instruction list and tag index.
    pub fn emit(&self, trees: &[Arc<DecodeTree>]) -> DecodeTable {
        DecodeTable::from_session(self, trees)
    }

    fn cached(&mut self, name: &str, selection: Selection) -> Result<Arc<DecodeTree>, IsaError> {
        check_name("tree", name)?;
        if let Some(cached) = self.trees.get(name) {
            if cached.selection != selection {
                return Err(IsaError::InvalidParameter(format!(
                    "tree '{name}' was already built from a different selection"
                )));
            }
            debug!(tree = %name, "decode tree cache hit");
            return Ok(Arc::clone(&cached.tree));
        }

        debug!(tree = %name, "decode tree cache miss");
        let members = self.select(&selection)?;
        let records: Vec<&InstructionRecord> = members
            .iter()
            .filter_map(|id| self.instruction(*id))
            .collect();
        let present: Vec<&str> = self.subsets.iter().map(|s| s.name.as_str()).collect();
        let enabled = compat::filter(&self.rules, &present, &records);
        let tree = Arc::new(DecodeTree::build(name, &enabled, &self.options)?);
        self.trees.insert(
            name.to_owned(),
            CachedTree {
                selection,
                tree: Arc::clone(&tree),
            },
        );
        Ok(tree)
    }

    fn select(&self, selection: &Selection) -> Result<Vec<InsnId>, IsaError> {
        match selection {
            Selection::Subsets(names) => {
                let mut members = Vec::new();
                for name in names {
                    let subset = self
                        .subset(name)
                        .ok_or_else(|| IsaError::UnknownSubset(name.clone()))?;
                    members.extend(subset.members.iter().copied());
                }
                Ok(members)
            }
            Selection::Tags(tags) => {
                let mut members: Vec<InsnId> =
                    tags.iter().flat_map(|tag| self.tags.get(tag)).copied().collect();
                members.sort_unstable();
                members.dedup();
                Ok(members)
            }
        }
    }

    fn invalidate(&mut self) {
        if !self.trees.is_empty() {
            debug!(trees = self.trees.len(), "decode tree cache cleared");
            self.trees.clear();
        }
    }
}

fn check_name(kind: &str, name: &str) -> Result<(), IsaError> {
    if is_plain_name(name) {
        Ok(())
    } else {
        Err(IsaError::InvalidParameter(format!(
            "{kind} name '{name}' must be a single token without '=,;#:'"
        )))
    }
}

/// Ids for `count` records registered after the first `start`.
fn id_range(start: usize, count: usize) -> Result<impl Iterator<Item = InsnId>, IsaError> {
    let exhausted = || {
        IsaError::MalformedInstruction(format!(
            "cannot number {count} more instructions after {start}: instruction ids exhausted"
        ))
    };
    if count > 0 {
        let last = start.checked_add(count - 1).ok_or_else(exhausted)?;
        InsnId::checked(last).ok_or_else(exhausted)?;
    }
    Ok((start..start + count).filter_map(InsnId::checked))
}
