pub mod condition;
pub mod constant_pool;
pub mod decode;
pub mod descriptor;
pub mod expr_recovery;
pub mod java_emitter;
pub mod method;
pub mod naming;
pub mod options;
pub mod simplify;

mod error;
mod passes;
mod structuring;

pub use decode::decode_method;
pub use error::{DecompileError, Result};
pub use method::{DecompileState, MethodAnalysis, MethodDecompiler};
pub use options::DecompilerOptions;

use jvmd_ir::method::MethodInput;
use jvmd_ir::stmt::MethodAst;

/// Decompile one method without a constant pool, using default options.
pub fn decompile_method(method: &MethodInput) -> Result<MethodAst> {
    MethodDecompiler::new().decompile(method)
}
