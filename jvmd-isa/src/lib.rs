//! Opcode definitions and operand reading for JVM-style stack bytecode.
//!
//! This crate provides the static opcode table (mnemonic, operand shape and
//! control-flow flags for every classic opcode) and a bounds-checked
//! big-endian reader used by the method decoder.

pub use bitflags;

mod decoder;
mod opcodes;

pub use decoder::{ByteReader, DecodeError};
pub use opcodes::{Opcode, OpcodeFlags, OpcodeInfo, OperandShape, lookup, opcode_count, opcode_table};
