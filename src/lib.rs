//! Instruction decode-tree compiler.
//!
//! Turns tables of fixed-width instruction bit patterns into discriminating decode trees
//! and emits them as a deterministic table for an external execution engine.

pub mod isa;
