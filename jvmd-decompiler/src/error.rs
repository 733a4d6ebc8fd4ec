/// Hard failures surfaced to the caller of the decompiler.
///
/// Everything else (undecodable bytes, unresolvable targets, shapes the
/// structurer does not recognize) degrades the output instead.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecompileError {
    /// The simulated operand stack was empty when an instruction popped it.
    #[error("operand stack underflow in {method} at offset {offset}")]
    StackUnderflow { method: String, offset: u32 },
    /// A method or field descriptor could not be parsed.
    #[error("invalid descriptor {0:?}")]
    InvalidDescriptor(String),
}

pub type Result<T> = std::result::Result<T, DecompileError>;
