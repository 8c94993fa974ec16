//! Decode tree nodes and run-time resolution of concrete instruction words.

use std::fmt;

use crate::isa::bits::{BitMask, BitPattern};
use crate::isa::instruction::InsnId;

/// Key under which a node hangs from its parent.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum OpcodeKey {
    Root,
    Value(String),
    Catchall,
}

impl OpcodeKey {
    pub fn render<'a>(&'a self, catchall_key: &'a str) -> &'a str {
        match self {
            OpcodeKey::Root => "-",
            OpcodeKey::Value(bits) => bits,
            OpcodeKey::Catchall => catchall_key,
        }
    }
}

/// The discriminating field a group compares: `width` bits starting at `first`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldTest {
    pub first: usize,
    pub width: usize,
}

impl FieldTest {
    pub fn bits(&self) -> impl Iterator<Item = usize> {
        self.first..self.first + self.width
    }

    pub fn mask(&self, total_width: usize) -> BitMask {
        BitMask::range(total_width, self.first, self.width)
    }

    /// Field bits of `word`, high bit first; `None` when the word is too short.
    pub fn read(&self, word: &BitMask) -> Option<String> {
        (self.first + self.width <= word.width()).then(|| word.field_string(self.first, self.width))
    }
}

impl fmt::Display for FieldTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.first, self.width)
    }
}

/// Build-order number of a group within its tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u32);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeLeaf {
    pub insn: InsnId,
    pub opcode: OpcodeKey,
    /// Full template of the instruction; checked on resolution so bits that were never
    /// tested on the path still reject foreign words.
    pub verify: BitPattern,
}

impl DecodeLeaf {
    pub fn matches_catchall(&self) -> bool {
        self.opcode == OpcodeKey::Catchall
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeGroup {
    pub id: GroupId,
    pub test: FieldTest,
    pub opcode: OpcodeKey,
    /// Bits fixed by ancestor tests when this group was built.
    pub known: BitPattern,
    /// Concrete children in first-seen order; each child's opcode is `OpcodeKey::Value`.
    pub children: Vec<DecodeNode>,
    pub catchall: Option<Box<DecodeNode>>,
}

impl DecodeGroup {
    pub fn child(&self, key: &str) -> Option<&DecodeNode> {
        self.children
            .iter()
            .find(|child| matches!(child.opcode(), OpcodeKey::Value(bits) if bits == key))
    }

    /// Concrete children followed by the catch-all child.
    pub fn all_children(&self) -> impl Iterator<Item = &DecodeNode> {
        self.children.iter().chain(self.catchall.as_deref())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeNode {
    Leaf(DecodeLeaf),
    Group(DecodeGroup),
}

impl DecodeNode {
    pub fn opcode(&self) -> &OpcodeKey {
        match self {
            DecodeNode::Leaf(leaf) => &leaf.opcode,
            DecodeNode::Group(group) => &group.opcode,
        }
    }

    pub(crate) fn set_opcode(&mut self, key: OpcodeKey) {
        match self {
            DecodeNode::Leaf(leaf) => leaf.opcode = key,
            DecodeNode::Group(group) => group.opcode = key,
        }
    }

    pub fn as_leaf(&self) -> Option<&DecodeLeaf> {
        match self {
            DecodeNode::Leaf(leaf) => Some(leaf),
            DecodeNode::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&DecodeGroup> {
        match self {
            DecodeNode::Group(group) => Some(group),
            DecodeNode::Leaf(_) => None,
        }
    }

    /// Resolves a concrete word. A concrete child that rejects the word falls back to the
    /// catch-all child, so more specific encodings win over their generic forms.
    pub fn resolve(&self, word: &BitMask) -> Option<InsnId> {
        match self {
            DecodeNode::Leaf(leaf) => leaf.verify.matches(word).then_some(leaf.insn),
            DecodeNode::Group(group) => {
                if let Some(key) = group.test.read(word)
                    && let Some(child) = group.child(&key)
                    && let Some(insn) = child.resolve(word)
                {
                    return Some(insn);
                }
                group.catchall.as_ref()?.resolve(word)
            }
        }
    }

    /// Pre-order walk; `depth` counts groups above the visited node.
    pub fn walk<'a, F>(&'a self, visit: &mut F)
    where
        F: FnMut(&'a DecodeNode, usize),
    {
        self.walk_at(0, visit);
    }

    fn walk_at<'a, F>(&'a self, depth: usize, visit: &mut F)
    where
        F: FnMut(&'a DecodeNode, usize),
    {
        visit(self, depth);
        if let DecodeNode::Group(group) = self {
            for child in group.all_children() {
                child.walk_at(depth + 1, visit);
            }
        }
    }

    /// Groups from this node down to the leaf holding `insn`, outermost first.
    pub fn path_to(&self, insn: InsnId) -> Option<Vec<&DecodeGroup>> {
        match self {
            DecodeNode::Leaf(leaf) => (leaf.insn == insn).then(Vec::new),
            DecodeNode::Group(group) => group.all_children().find_map(|child| {
                child.path_to(insn).map(|mut path| {
                    path.insert(0, group);
                    path
                })
            }),
        }
    }

    pub fn leaves(&self) -> Vec<&DecodeLeaf> {
        let mut leaves = Vec::new();
        self.walk(&mut |node, _| {
            if let DecodeNode::Leaf(leaf) = node {
                leaves.push(leaf);
            }
        });
        leaves
    }
}

/// A built decode tree for one subset, merged forest, or tag selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeTree {
    pub(crate) name: String,
    pub(crate) width: usize,
    pub(crate) members: Vec<InsnId>,
    pub(crate) root: DecodeNode,
    pub(crate) group_count: u32,
}

impl DecodeTree {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Widest instruction in the tree.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Instructions the tree was built from, in input order.
    pub fn members(&self) -> &[InsnId] {
        &self.members
    }

    pub fn root(&self) -> &DecodeNode {
        &self.root
    }

    pub fn group_count(&self) -> u32 {
        self.group_count
    }

    pub fn resolve(&self, word: &BitMask) -> Option<InsnId> {
        self.root.resolve(word)
    }

    pub fn path_to(&self, insn: InsnId) -> Option<Vec<&DecodeGroup>> {
        self.root.path_to(insn)
    }

    pub fn leaves(&self) -> Vec<&DecodeLeaf> {
        self.root.leaves()
    }

    pub fn group_symbol(&self, id: GroupId) -> String {
        format!("{}#{}", self.name, id.0)
    }
}
