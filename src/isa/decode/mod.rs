//! Decode trees: greedy construction over instruction templates and run-time resolution.

pub mod builder;
pub mod node;

#[cfg(test)]
mod proptests;

pub use builder::DecodeTreeBuilder;
pub use node::{DecodeGroup, DecodeLeaf, DecodeNode, DecodeTree, FieldTest, GroupId, OpcodeKey};
