//! Method-level inputs supplied by the class container reader.

bitflags::bitflags! {
    /// Method access flags as stored in the class file.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const BRIDGE = 0x0040;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
    }
}

impl AccessFlags {
    /// Source-order modifier keywords, e.g. `["public", "static"]`.
    pub fn keywords(self) -> Vec<&'static str> {
        const ORDER: [(AccessFlags, &str); 8] = [
            (AccessFlags::PUBLIC, "public"),
            (AccessFlags::PROTECTED, "protected"),
            (AccessFlags::PRIVATE, "private"),
            (AccessFlags::ABSTRACT, "abstract"),
            (AccessFlags::STATIC, "static"),
            (AccessFlags::FINAL, "final"),
            (AccessFlags::SYNCHRONIZED, "synchronized"),
            (AccessFlags::NATIVE, "native"),
        ];
        ORDER
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, kw)| *kw)
            .collect()
    }
}

/// One row of the raw exception-handler table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    /// Exclusive end of the protected range.
    pub end_pc: u16,
    pub handler_pc: u16,
    /// Constant-pool class index; 0 means catch-all.
    pub catch_type: u16,
}

/// One row of the debug local-variable table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariableEntry {
    pub start_pc: u16,
    pub length: u16,
    pub name: String,
    pub descriptor: String,
    pub index: u16,
}

impl LocalVariableEntry {
    pub fn covers(&self, pc: u32) -> bool {
        let start = u32::from(self.start_pc);
        pc >= start && pc < start + u32::from(self.length)
    }
}

/// One row of the debug line-number table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineNumberEntry {
    pub start_pc: u16,
    pub line_number: u16,
}

/// The executable body of a method.
#[derive(Debug, Clone, Default)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub local_variables: Vec<LocalVariableEntry>,
    pub line_numbers: Vec<LineNumberEntry>,
}

impl CodeAttribute {
    /// Source line for the instruction at `pc`, if line numbers are present.
    pub fn line_for(&self, pc: u32) -> Option<u16> {
        self.line_numbers
            .iter()
            .filter(|ln| u32::from(ln.start_pc) <= pc)
            .max_by_key(|ln| ln.start_pc)
            .map(|ln| ln.line_number)
    }
}

/// A method as handed over by the container reader.
#[derive(Debug, Clone)]
pub struct MethodInput {
    pub name: String,
    pub descriptor: String,
    pub access: AccessFlags,
    /// `None` for abstract and native methods.
    pub code: Option<CodeAttribute>,
}

impl MethodInput {
    pub fn is_static(&self) -> bool {
        self.access.contains(AccessFlags::STATIC)
    }
}
