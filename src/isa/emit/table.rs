//! Emission records: everything the execution engine needs, detached from the session.

use std::sync::Arc;

use crate::isa::decode::{DecodeNode, DecodeTree, FieldTest};
use crate::isa::instruction::{InsnId, InstructionRecord};
use crate::isa::session::IsaSession;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsnEntry {
    pub id: InsnId,
    pub symbol: String,
    pub label: String,
    pub trace_label: String,
    pub pattern: String,
    pub handler: String,
    pub fast_handler: String,
    pub decode_hint: Option<String>,
    pub arguments: Vec<String>,
    pub resource: Option<String>,
    pub latency: u32,
    pub power_group: u32,
    pub is_macro_op: bool,
    pub tags: Vec<String>,
    pub isa_tags: Vec<String>,
}

impl InsnEntry {
    fn from_record(id: InsnId, record: &InstructionRecord) -> Self {
        Self {
            id,
            symbol: insn_symbol(record),
            label: record.label.clone(),
            trace_label: record.trace_label.clone(),
            pattern: record.pattern.to_string(),
            handler: record.handler(),
            fast_handler: record.fast_handler(),
            decode_hint: record.decode_hint.clone(),
            arguments: record.arguments.iter().map(ToString::to_string).collect(),
            resource: record.resource.as_ref().map(ToString::to_string),
            latency: record.latency,
            power_group: record.power_group,
            is_macro_op: record.is_macro_op,
            tags: record.tags.iter().cloned().collect(),
            isa_tags: record.isa_tags.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEntry {
    Group {
        symbol: String,
        key: String,
        test: FieldTest,
        known: String,
        /// Concrete children first, catch-all last.
        children: Vec<String>,
    },
    Leaf {
        symbol: String,
        key: String,
        insn: InsnId,
        catchall: bool,
    },
}

impl NodeEntry {
    pub fn symbol(&self) -> &str {
        match self {
            NodeEntry::Group { symbol, .. } | NodeEntry::Leaf { symbol, .. } => symbol,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForestEntry {
    pub name: String,
    pub width: usize,
    pub groups: u32,
    pub root: String,
    /// Pre-order.
    pub nodes: Vec<NodeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    pub tag: String,
    pub leaves: Vec<String>,
}

/// The emitted artifact in structured form; see `render` for the byte format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeTable {
    pub catchall_key: String,
    pub instructions: Vec<InsnEntry>,
    pub forests: Vec<ForestEntry>,
    pub tags: Vec<TagEntry>,
}

impl DecodeTable {
    pub fn from_session(session: &IsaSession, trees: &[Arc<DecodeTree>]) -> Self {
        let catchall_key = session.options().catchall_key.clone();
        let records = session.instructions();

        let instructions = records
            .iter()
            .filter_map(|record| Some(InsnEntry::from_record(record.id()?, record)))
            .collect();

        let forests: Vec<ForestEntry> = trees
            .iter()
            .map(|tree| forest_entry(tree, records, &catchall_key))
            .collect();

        let tags = session
            .tags()
            .tags()
            .map(|tag| TagEntry {
                tag: tag.to_owned(),
                leaves: session
                    .tags()
                    .get(tag)
                    .iter()
                    .flat_map(|id| {
                        trees
                            .iter()
                            .filter(|tree| tree.members().contains(id))
                            .filter_map(|tree| {
                                let record = records.get(id.index())?;
                                Some(leaf_symbol(tree, record))
                            })
                            .collect::<Vec<_>>()
                    })
                    .collect(),
            })
            .collect();

        Self {
            catchall_key,
            instructions,
            forests,
            tags,
        }
    }

    pub fn forest(&self, name: &str) -> Option<&ForestEntry> {
        self.forests.iter().find(|forest| forest.name == name)
    }
}

fn insn_symbol(record: &InstructionRecord) -> String {
    record
        .symbol()
        .map(str::to_owned)
        .unwrap_or_else(|| record.symbol_base())
}

fn leaf_symbol(tree: &DecodeTree, record: &InstructionRecord) -> String {
    format!("{}:{}", tree.name(), insn_symbol(record))
}

fn node_symbol(tree: &DecodeTree, node: &DecodeNode, records: &[InstructionRecord]) -> String {
    match node {
        DecodeNode::Group(group) => tree.group_symbol(group.id),
        DecodeNode::Leaf(leaf) => match records.get(leaf.insn.index()) {
            Some(record) => leaf_symbol(tree, record),
            None => format!("{}:#{}", tree.name(), leaf.insn),
        },
    }
}

fn forest_entry(tree: &DecodeTree, records: &[InstructionRecord], catchall_key: &str) -> ForestEntry {
    let mut nodes = Vec::new();
    tree.root().walk(&mut |node, _| {
        let symbol = node_symbol(tree, node, records);
        let key = node.opcode().render(catchall_key).to_owned();
        nodes.push(match node {
            DecodeNode::Group(group) => NodeEntry::Group {
                symbol,
                key,
                test: group.test,
                known: group.known.to_string(),
                children: group
                    .all_children()
                    .map(|child| node_symbol(tree, child, records))
                    .collect(),
            },
            DecodeNode::Leaf(leaf) => NodeEntry::Leaf {
                symbol,
                key,
                insn: leaf.insn,
                catchall: leaf.matches_catchall(),
            },
        });
    });
    ForestEntry {
        name: tree.name().to_owned(),
        width: tree.width(),
        groups: tree.group_count(),
        root: node_symbol(tree, tree.root(), records),
        nodes,
    }
}
