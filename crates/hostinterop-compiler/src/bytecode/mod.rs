//! Bytecode types for the interop compiler.
//!
//! - [`OpCode`] - the instruction set of the reference VM
//! - [`BytecodeChunk`] - emitted code with its line, string and type tables
//! - [`ConstantPool`] - the process-wide literal table

mod chunk;
mod constant;
mod opcode;

pub use chunk::{BytecodeChunk, EmptyKind};
pub use constant::ConstantPool;
pub use opcode::OpCode;
