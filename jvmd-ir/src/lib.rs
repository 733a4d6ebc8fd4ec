//! Intermediate representation shared by the decompiler stages: decoded
//! instructions, method inputs, the control-flow graph, exception regions
//! and the recovered expression/statement trees.

pub mod cfg;
pub mod exception;
pub mod expr;
pub mod instruction;
pub mod method;
pub mod stmt;
