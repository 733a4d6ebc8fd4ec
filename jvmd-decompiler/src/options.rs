/// Knobs controlling how much the decompiler rewrites its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecompilerOptions {
    /// Drop static calls on `kotlin/jvm/internal/Intrinsics` (null checks
    /// inserted by the Kotlin compiler).
    pub hide_kotlin_intrinsics: bool,
    /// Drop void static calls whose name starts with `$`.
    pub hide_synthetic_dollar_calls: bool,
    /// Use the region structurer for methods the two-returns pattern does
    /// not fully describe.
    pub structure_regions: bool,
    /// Run the expression simplifier over the final statement tree.
    pub simplify: bool,
}

impl Default for DecompilerOptions {
    fn default() -> Self {
        Self {
            hide_kotlin_intrinsics: true,
            hide_synthetic_dollar_calls: true,
            structure_regions: true,
            simplify: true,
        }
    }
}
