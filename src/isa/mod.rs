//! Instruction table pipeline: encoding templates and operand descriptors feed a build
//! session, which groups them into subsets, compiles decode trees, and emits a
//! [`DecodeTable`](emit/struct.DecodeTable.html) for an external execution engine.

pub mod argument;
pub mod bits;
pub mod builder;
pub mod compat;
pub mod decode;
pub mod emit;
pub mod error;
pub mod instruction;
pub mod options;
pub mod session;
pub mod symbols;
pub mod tags;

pub use argument::{Argument, EncodingFlags, Operand, OperandDirection};
pub use bits::{BitMask, BitPattern, BitRange, BitRangeSet};
pub use builder::{InstructionBuilder, IsaBuilder};
pub use compat::CompatRule;
pub use decode::{DecodeNode, DecodeTree};
pub use emit::DecodeTable;
pub use error::IsaError;
pub use instruction::{InsnId, InstructionRecord, ResourceBinding};
pub use options::{BuildOptions, ParameterValue};
pub use session::IsaSession;
