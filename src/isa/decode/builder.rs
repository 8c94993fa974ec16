//! Greedy decode-tree construction.
//!
//! Each call narrows the set of still-untested bits, picks a discriminating field, buckets
//! the instructions by the value they hold there, and recurses per bucket:
//!
//! 1. Clip the available mask to the narrowest instruction of the set.
//! 2. Drop bits no instruction has a concrete value for.
//! 3. Pick the first contiguous run of bits concrete in every instruction, scanning from
//!    bit 0 upward and stopping at the first gap once a bit has been accepted.
//! 4. Without such a run, test the lowest remaining bit alone; instructions that don't
//!    care about it go to the catch-all bucket.
//! 5. Bucket by field value in first-seen order and recurse with the field removed.
//! 6. A group left with a single concrete child and no catch-all is replaced by that child.
//!
//! A set with more than one instruction and no bit left is a decode conflict.

use ahash::AHashMap;
use tracing::{debug, trace};

use crate::isa::bits::{BitMask, BitPattern};
use crate::isa::error::{ConflictEntry, IsaError};
use crate::isa::instruction::{InsnId, InstructionRecord};
use crate::isa::options::BuildOptions;

use super::node::{DecodeGroup, DecodeLeaf, DecodeNode, DecodeTree, FieldTest, GroupId, OpcodeKey};

/// Builds one decode tree. Group numbers come from a counter owned by the builder, so
/// independent builds never share state.
pub struct DecodeTreeBuilder<'o> {
    options: &'o BuildOptions,
    tree: String,
    next_group: u32,
}

struct Entry<'r> {
    id: InsnId,
    record: &'r InstructionRecord,
}

impl<'o> DecodeTreeBuilder<'o> {
    pub fn new(tree: impl Into<String>, options: &'o BuildOptions) -> Self {
        Self {
            options,
            tree: tree.into(),
            next_group: 0,
        }
    }

    /// Validates the records and builds the whole tree from an all-ones mask.
    pub fn build(mut self, instructions: &[&InstructionRecord]) -> Result<DecodeTree, IsaError> {
        let entries = self.prepare(instructions)?;
        let width = entries
            .iter()
            .map(|entry| entry.record.width())
            .max()
            .unwrap_or(0);
        let members = entries.iter().map(|entry| entry.id).collect();
        let root = self.build_entries(entries, BitMask::full(width), BitPattern::dont_care(width))?;
        debug!(
            tree = %self.tree,
            groups = self.next_group,
            "decode tree built"
        );
        Ok(DecodeTree {
            name: self.tree,
            width,
            members,
            root,
            group_count: self.next_group,
        })
    }

    /// Builds the subtree discriminating `instructions` using only bits in `available`.
    /// `fixed` records the bits already decided by the caller's tests.
    pub fn build_subtree(
        &mut self,
        instructions: &[&InstructionRecord],
        available: BitMask,
        fixed: BitPattern,
    ) -> Result<DecodeNode, IsaError> {
        let entries = self.prepare(instructions)?;
        self.build_entries(entries, available, fixed)
    }

    fn prepare<'r>(&self, instructions: &[&'r InstructionRecord]) -> Result<Vec<Entry<'r>>, IsaError> {
        let Some(first) = instructions.first() else {
            return Err(IsaError::MalformedInstruction(format!(
                "decode tree '{}' has no instructions",
                self.tree
            )));
        };
        let mut entries = Vec::with_capacity(instructions.len());
        for record in instructions {
            let id = record.id().ok_or_else(|| {
                IsaError::MalformedInstruction(format!(
                    "instruction '{}' was not registered with a session",
                    record.label
                ))
            })?;
            if !self.options.allow_mixed_widths && record.width() != first.width() {
                return Err(IsaError::MalformedInstruction(format!(
                    "decode tree '{}' mixes {}-bit '{}' with {}-bit '{}'",
                    self.tree,
                    first.width(),
                    first.label,
                    record.width(),
                    record.label
                )));
            }
            record.validate()?;
            entries.push(Entry { id, record });
        }
        Ok(entries)
    }

    fn build_entries(
        &mut self,
        entries: Vec<Entry<'_>>,
        available: BitMask,
        fixed: BitPattern,
    ) -> Result<DecodeNode, IsaError> {
        let narrowest = entries
            .iter()
            .map(|entry| entry.record.width())
            .min()
            .unwrap_or(0);
        let discriminating = entries
            .iter()
            .fold(BitMask::empty(available.width()), |acc, entry| {
                acc.union(entry.record.pattern.care())
            });
        let mask = available.truncated(narrowest).intersect(&discriminating);

        if let [single] = entries.as_slice() {
            // Untested concrete bits are verified by the leaf itself.
            return Ok(DecodeNode::Leaf(DecodeLeaf {
                insn: single.id,
                opcode: OpcodeKey::Root,
                verify: single.record.pattern.clone(),
            }));
        }
        if mask.is_empty() {
            return Err(conflict(&entries));
        }

        let test = common_run(&entries, &mask).unwrap_or_else(|| FieldTest {
            first: mask.lowest().unwrap_or(0),
            width: 1,
        });

        let mut buckets: Vec<(String, Vec<Entry<'_>>)> = Vec::new();
        let mut bucket_index: AHashMap<String, usize> = AHashMap::new();
        let mut catchall = Vec::new();
        for entry in entries {
            match entry.record.pattern.field_value(test.first, test.width) {
                Some(key) => {
                    trace!(insn = %entry.record.label, %key, field = %test, "routed");
                    match bucket_index.get(&key) {
                        Some(index) => buckets[*index].1.push(entry),
                        None => {
                            bucket_index.insert(key.clone(), buckets.len());
                            buckets.push((key, vec![entry]));
                        }
                    }
                }
                None => {
                    trace!(insn = %entry.record.label, field = %test, "routed to catch-all");
                    catchall.push(entry);
                }
            }
        }

        if self.options.reject_partial_overlap {
            check_partial_overlap(&buckets, &catchall)?;
        }

        let remaining = available.difference(&test.mask(available.width()));
        let bucket_count = buckets.len();
        let catchall_count = catchall.len();

        let mut children = Vec::with_capacity(buckets.len());
        for (key, bucket) in buckets {
            let mut child =
                self.build_entries(bucket, remaining.clone(), fixed.with_field(test.first, &key))?;
            child.set_opcode(OpcodeKey::Value(key));
            children.push(child);
        }
        let catchall = if catchall.is_empty() {
            None
        } else {
            let mut child = self.build_entries(catchall, remaining, fixed.clone())?;
            child.set_opcode(OpcodeKey::Catchall);
            Some(Box::new(child))
        };

        if children.len() == 1
            && catchall.is_none()
            && let Some(mut only) = children.pop()
        {
            only.set_opcode(OpcodeKey::Root);
            rebase_known(&mut only, fixed);
            return Ok(only);
        }

        let id = GroupId(self.next_group);
        self.next_group += 1;
        debug!(
            tree = %self.tree,
            group = id.0,
            field = %test,
            buckets = bucket_count,
            catchall = catchall_count,
            "decode group"
        );
        Ok(DecodeNode::Group(DecodeGroup {
            id,
            test,
            opcode: OpcodeKey::Root,
            known: fixed,
            children,
            catchall,
        }))
    }
}

impl DecodeTree {
    /// Builds a tree named `name` over registered `instructions`, preserving their order.
    pub fn build(
        name: impl Into<String>,
        instructions: &[&InstructionRecord],
        options: &BuildOptions,
    ) -> Result<DecodeTree, IsaError> {
        DecodeTreeBuilder::new(name, options).build(instructions)
    }
}

/// Rewrites `known` throughout a subtree that was hoisted past a collapsed group, so it
/// only reflects the tests of surviving ancestors.
fn rebase_known(node: &mut DecodeNode, known: BitPattern) {
    let DecodeNode::Group(group) = node else {
        return;
    };
    let first = group.test.first;
    for child in &mut group.children {
        let below = match child.opcode() {
            OpcodeKey::Value(key) => known.with_field(first, key),
            _ => known.clone(),
        };
        rebase_known(child, below);
    }
    if let Some(catchall) = group.catchall.as_deref_mut() {
        rebase_known(catchall, known.clone());
    }
    group.known = known;
}

fn common_run(entries: &[Entry<'_>], mask: &BitMask) -> Option<FieldTest> {
    let mut first = None;
    let mut width = 0;
    for bit in 0..mask.width() {
        let common = mask.contains(bit)
            && entries
                .iter()
                .all(|entry| entry.record.pattern.is_concrete(bit));
        if common {
            first.get_or_insert(bit);
            width += 1;
        } else if first.is_some() {
            break;
        }
    }
    first.map(|first| FieldTest { first, width })
}

fn conflict(entries: &[Entry<'_>]) -> IsaError {
    IsaError::DecodeConflict {
        entries: entries
            .iter()
            .map(|entry| ConflictEntry {
                label: entry.record.label.clone(),
                pattern: entry.record.pattern_text.clone(),
            })
            .collect(),
    }
}

fn check_partial_overlap(
    buckets: &[(String, Vec<Entry<'_>>)],
    catchall: &[Entry<'_>],
) -> Result<(), IsaError> {
    for generic in catchall {
        for (_, bucket) in buckets {
            for specific in bucket {
                let generic_pattern = &generic.record.pattern;
                let specific_pattern = &specific.record.pattern;
                if generic_pattern.overlaps(specific_pattern)
                    && !specific_pattern.refines(generic_pattern)
                {
                    return Err(IsaError::DecodeConflict {
                        entries: vec![
                            ConflictEntry {
                                label: specific.record.label.clone(),
                                pattern: specific.record.pattern_text.clone(),
                            },
                            ConflictEntry {
                                label: generic.record.label.clone(),
                                pattern: generic.record.pattern_text.clone(),
                            },
                        ],
                    });
                }
            }
        }
    }
    Ok(())
}
