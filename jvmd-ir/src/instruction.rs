use jvmd_isa::{DecodeError, Opcode, OpcodeFlags};

/// Resolved targets of a `tableswitch` or `lookupswitch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchTable {
    /// Absolute offset of the default target.
    pub default: u32,
    /// `(key, absolute target)` pairs in encoding order.
    pub cases: Vec<(i32, u32)>,
}

/// A decoded operand payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    None,
    /// Local-variable slot.
    Local(u16),
    /// Signed immediate (`bipush`, `sipush`, `newarray` type code).
    Imm(i32),
    /// Absolute branch target.
    Branch(u32),
    /// Constant-pool index.
    ConstPool(u16),
    /// `iinc` slot and delta.
    Iinc { index: u16, delta: i16 },
    /// `invokeinterface` method reference and argument-slot count.
    InvokeInterface { index: u16, count: u8 },
    /// `multianewarray` class reference and dimension count.
    MultiANewArray { index: u16, dimensions: u8 },
    Switch(SwitchTable),
    /// Terminal marker: the remaining code bytes could not be decoded.
    UndecodedTail { bytes: Vec<u8>, reason: DecodeError },
}

/// A single decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Byte offset within the method's code.
    pub offset: u32,
    pub opcode: Opcode,
    pub operand: Operand,
    /// Encoded size in bytes.
    pub size: u32,
}

impl Instruction {
    pub fn flags(&self) -> OpcodeFlags {
        self.opcode.flags()
    }

    /// Offset of the instruction that follows this one.
    pub fn next_offset(&self) -> u32 {
        self.offset + self.size
    }

    pub fn branch_target(&self) -> Option<u32> {
        match self.operand {
            Operand::Branch(target) => Some(target),
            _ => None,
        }
    }

    pub fn switch_table(&self) -> Option<&SwitchTable> {
        match &self.operand {
            Operand::Switch(table) => Some(table),
            _ => None,
        }
    }

    pub fn is_undecoded(&self) -> bool {
        matches!(self.operand, Operand::UndecodedTail { .. })
    }

    pub fn is_conditional_branch(&self) -> bool {
        !self.is_undecoded() && self.flags().contains(OpcodeFlags::JUMP | OpcodeFlags::CONDITIONAL)
    }

    pub fn is_unconditional_jump(&self) -> bool {
        let flags = self.flags();
        !self.is_undecoded()
            && flags.contains(OpcodeFlags::JUMP)
            && !flags.contains(OpcodeFlags::CONDITIONAL)
    }

    pub fn is_switch(&self) -> bool {
        !self.is_undecoded() && self.flags().contains(OpcodeFlags::SWITCH)
    }

    /// Returns, `athrow` and `ret`: no successor inside the method body.
    pub fn is_exit(&self) -> bool {
        !self.is_undecoded() && self.flags().intersects(OpcodeFlags::RETURN | OpcodeFlags::THROW)
    }

    /// Any control transfer that makes the next instruction a leader.
    pub fn is_branch(&self) -> bool {
        self.is_conditional_branch() || self.is_unconditional_jump() || self.is_switch()
    }
}
