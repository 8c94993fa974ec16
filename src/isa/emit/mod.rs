//! Emission of built decode trees as a deterministic table for the execution engine.

pub mod render;
pub mod table;

pub use table::{DecodeTable, ForestEntry, InsnEntry, NodeEntry, TagEntry};
