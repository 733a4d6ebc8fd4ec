use std::fmt;

/// A raw one-byte opcode. Values outside the table are representable so that
/// an undecodable byte can still be reported.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Opcode(pub u8);

impl Opcode {
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Table entry for this opcode, if it is a known opcode.
    pub fn info(self) -> Option<&'static OpcodeInfo> {
        lookup(self.0)
    }

    /// Mnemonic, or `"<unknown>"` for bytes outside the table.
    pub fn mnemonic(self) -> &'static str {
        self.info().map(|i| i.mnemonic).unwrap_or("<unknown>")
    }

    pub fn flags(self) -> OpcodeFlags {
        self.info().map(|i| i.flags).unwrap_or(OpcodeFlags::empty())
    }
}

impl fmt::Debug for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opcode({:#04x} {})", self.0, self.mnemonic())
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Layout of the operand bytes that follow an opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandShape {
    /// No operand bytes.
    None,
    /// Unsigned one-byte local-slot index.
    Local,
    /// Signed one-byte immediate (`bipush`).
    Byte,
    /// Signed two-byte immediate (`sipush`).
    Short,
    /// Unsigned one-byte constant-pool index (`ldc`).
    ConstPoolNarrow,
    /// Unsigned two-byte constant-pool index.
    ConstPool,
    /// One-byte slot index followed by a signed one-byte delta (`iinc`).
    Iinc,
    /// Signed two-byte branch delta.
    Branch,
    /// Signed four-byte branch delta.
    BranchWide,
    /// Padded `default, low, high, targets[high - low + 1]` table.
    TableSwitch,
    /// Padded `default, npairs, (key, target)[npairs]` table.
    LookupSwitch,
    /// Two-byte index, one-byte argument count, one zero byte.
    InvokeInterface,
    /// Two-byte index followed by two zero bytes.
    InvokeDynamic,
    /// Two-byte class index followed by a one-byte dimension count.
    MultiANewArray,
    /// One-byte primitive array type code (`newarray`).
    ArrayType,
    /// Operand-modifying prefix. Never decoded.
    Wide,
}

impl OperandShape {
    /// Number of operand bytes after the opcode, or `None` for the padded
    /// switch forms and the `wide` prefix.
    pub const fn fixed_len(self) -> Option<usize> {
        match self {
            OperandShape::None => Some(0),
            OperandShape::Local
            | OperandShape::Byte
            | OperandShape::ConstPoolNarrow
            | OperandShape::ArrayType => Some(1),
            OperandShape::Short
            | OperandShape::ConstPool
            | OperandShape::Iinc
            | OperandShape::Branch => Some(2),
            OperandShape::MultiANewArray => Some(3),
            OperandShape::BranchWide
            | OperandShape::InvokeInterface
            | OperandShape::InvokeDynamic => Some(4),
            OperandShape::TableSwitch | OperandShape::LookupSwitch | OperandShape::Wide => None,
        }
    }
}

bitflags::bitflags! {
    /// Control-flow and operation-class properties of an opcode.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct OpcodeFlags: u16 {
        /// Transfers control to a branch target.
        const JUMP = 1 << 0;
        /// Only transfers control when a condition holds.
        const CONDITIONAL = 1 << 1;
        /// Leaves the method or subroutine; no fallthrough.
        const RETURN = 1 << 2;
        /// Raises an exception; no fallthrough.
        const THROW = 1 << 3;
        /// Multi-way branch.
        const SWITCH = 1 << 4;
        /// Method invocation.
        const INVOKE = 1 << 5;
        /// Field read or write.
        const FIELD = 1 << 6;
        /// Subroutine call or return (`jsr`, `ret`).
        const SUBROUTINE = 1 << 7;
    }
}

/// Static metadata for one opcode.
#[derive(Clone, Copy, Debug)]
pub struct OpcodeInfo {
    opcode: Opcode,
    mnemonic: &'static str,
    shape: OperandShape,
    flags: OpcodeFlags,
}

impl OpcodeInfo {
    pub const fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub const fn mnemonic(&self) -> &'static str {
        self.mnemonic
    }

    pub const fn shape(&self) -> OperandShape {
        self.shape
    }

    pub const fn flags(&self) -> OpcodeFlags {
        self.flags
    }

    /// Encoded size including the opcode byte, when it does not depend on
    /// the instruction's position.
    pub const fn fixed_size(&self) -> Option<usize> {
        match self.shape.fixed_len() {
            Some(n) => Some(n + 1),
            None => None,
        }
    }

    pub fn is_conditional_branch(&self) -> bool {
        self.flags.contains(OpcodeFlags::JUMP.union(OpcodeFlags::CONDITIONAL))
    }

    pub fn is_unconditional_jump(&self) -> bool {
        self.flags.contains(OpcodeFlags::JUMP) && !self.flags.contains(OpcodeFlags::CONDITIONAL)
    }

    /// Any instruction after which execution does not fall through.
    pub fn is_terminator(&self) -> bool {
        self.flags.intersects(OpcodeFlags::RETURN.union(OpcodeFlags::THROW))
    }

    /// Any instruction that ends a basic block by transferring control.
    pub fn is_branch(&self) -> bool {
        self.flags.intersects(OpcodeFlags::JUMP.union(OpcodeFlags::SWITCH))
    }
}

const NONE: OpcodeFlags = OpcodeFlags::empty();
const COND: OpcodeFlags = OpcodeFlags::JUMP.union(OpcodeFlags::CONDITIONAL);
const GOTO: OpcodeFlags = OpcodeFlags::JUMP;
const JSR: OpcodeFlags = OpcodeFlags::JUMP.union(OpcodeFlags::SUBROUTINE);
const RET: OpcodeFlags = OpcodeFlags::RETURN;
const RET_SUB: OpcodeFlags = OpcodeFlags::RETURN.union(OpcodeFlags::SUBROUTINE);
const THROW: OpcodeFlags = OpcodeFlags::THROW;
const SWITCH: OpcodeFlags = OpcodeFlags::SWITCH;
const INVOKE: OpcodeFlags = OpcodeFlags::INVOKE;
const FIELD: OpcodeFlags = OpcodeFlags::FIELD;

macro_rules! opcode_table {
    ($( $name:ident = $code:literal, $mnemonic:literal, $shape:ident, $flags:expr; )*) => {
        impl Opcode {
            $( pub const $name: Opcode = Opcode($code); )*
        }

        static OPCODE_TABLE: &[OpcodeInfo] = &[
            $(
                OpcodeInfo {
                    opcode: Opcode($code),
                    mnemonic: $mnemonic,
                    shape: OperandShape::$shape,
                    flags: $flags,
                },
            )*
        ];
    };
}

opcode_table! {
    NOP = 0x00, "nop", None, NONE;
    ACONST_NULL = 0x01, "aconst_null", None, NONE;
    ICONST_M1 = 0x02, "iconst_m1", None, NONE;
    ICONST_0 = 0x03, "iconst_0", None, NONE;
    ICONST_1 = 0x04, "iconst_1", None, NONE;
    ICONST_2 = 0x05, "iconst_2", None, NONE;
    ICONST_3 = 0x06, "iconst_3", None, NONE;
    ICONST_4 = 0x07, "iconst_4", None, NONE;
    ICONST_5 = 0x08, "iconst_5", None, NONE;
    LCONST_0 = 0x09, "lconst_0", None, NONE;
    LCONST_1 = 0x0a, "lconst_1", None, NONE;
    FCONST_0 = 0x0b, "fconst_0", None, NONE;
    FCONST_1 = 0x0c, "fconst_1", None, NONE;
    FCONST_2 = 0x0d, "fconst_2", None, NONE;
    DCONST_0 = 0x0e, "dconst_0", None, NONE;
    DCONST_1 = 0x0f, "dconst_1", None, NONE;
    BIPUSH = 0x10, "bipush", Byte, NONE;
    SIPUSH = 0x11, "sipush", Short, NONE;
    LDC = 0x12, "ldc", ConstPoolNarrow, NONE;
    LDC_W = 0x13, "ldc_w", ConstPool, NONE;
    LDC2_W = 0x14, "ldc2_w", ConstPool, NONE;
    ILOAD = 0x15, "iload", Local, NONE;
    LLOAD = 0x16, "lload", Local, NONE;
    FLOAD = 0x17, "fload", Local, NONE;
    DLOAD = 0x18, "dload", Local, NONE;
    ALOAD = 0x19, "aload", Local, NONE;
    ILOAD_0 = 0x1a, "iload_0", None, NONE;
    ILOAD_1 = 0x1b, "iload_1", None, NONE;
    ILOAD_2 = 0x1c, "iload_2", None, NONE;
    ILOAD_3 = 0x1d, "iload_3", None, NONE;
    LLOAD_0 = 0x1e, "lload_0", None, NONE;
    LLOAD_1 = 0x1f, "lload_1", None, NONE;
    LLOAD_2 = 0x20, "lload_2", None, NONE;
    LLOAD_3 = 0x21, "lload_3", None, NONE;
    FLOAD_0 = 0x22, "fload_0", None, NONE;
    FLOAD_1 = 0x23, "fload_1", None, NONE;
    FLOAD_2 = 0x24, "fload_2", None, NONE;
    FLOAD_3 = 0x25, "fload_3", None, NONE;
    DLOAD_0 = 0x26, "dload_0", None, NONE;
    DLOAD_1 = 0x27, "dload_1", None, NONE;
    DLOAD_2 = 0x28, "dload_2", None, NONE;
    DLOAD_3 = 0x29, "dload_3", None, NONE;
    ALOAD_0 = 0x2a, "aload_0", None, NONE;
    ALOAD_1 = 0x2b, "aload_1", None, NONE;
    ALOAD_2 = 0x2c, "aload_2", None, NONE;
    ALOAD_3 = 0x2d, "aload_3", None, NONE;
    IALOAD = 0x2e, "iaload", None, NONE;
    LALOAD = 0x2f, "laload", None, NONE;
    FALOAD = 0x30, "faload", None, NONE;
    DALOAD = 0x31, "daload", None, NONE;
    AALOAD = 0x32, "aaload", None, NONE;
    BALOAD = 0x33, "baload", None, NONE;
    CALOAD = 0x34, "caload", None, NONE;
    SALOAD = 0x35, "saload", None, NONE;
    ISTORE = 0x36, "istore", Local, NONE;
    LSTORE = 0x37, "lstore", Local, NONE;
    FSTORE = 0x38, "fstore", Local, NONE;
    DSTORE = 0x39, "dstore", Local, NONE;
    ASTORE = 0x3a, "astore", Local, NONE;
    ISTORE_0 = 0x3b, "istore_0", None, NONE;
    ISTORE_1 = 0x3c, "istore_1", None, NONE;
    ISTORE_2 = 0x3d, "istore_2", None, NONE;
    ISTORE_3 = 0x3e, "istore_3", None, NONE;
    LSTORE_0 = 0x3f, "lstore_0", None, NONE;
    LSTORE_1 = 0x40, "lstore_1", None, NONE;
    LSTORE_2 = 0x41, "lstore_2", None, NONE;
    LSTORE_3 = 0x42, "lstore_3", None, NONE;
    FSTORE_0 = 0x43, "fstore_0", None, NONE;
    FSTORE_1 = 0x44, "fstore_1", None, NONE;
    FSTORE_2 = 0x45, "fstore_2", None, NONE;
    FSTORE_3 = 0x46, "fstore_3", None, NONE;
    DSTORE_0 = 0x47, "dstore_0", None, NONE;
    DSTORE_1 = 0x48, "dstore_1", None, NONE;
    DSTORE_2 = 0x49, "dstore_2", None, NONE;
    DSTORE_3 = 0x4a, "dstore_3", None, NONE;
    ASTORE_0 = 0x4b, "astore_0", None, NONE;
    ASTORE_1 = 0x4c, "astore_1", None, NONE;
    ASTORE_2 = 0x4d, "astore_2", None, NONE;
    ASTORE_3 = 0x4e, "astore_3", None, NONE;
    IASTORE = 0x4f, "iastore", None, NONE;
    LASTORE = 0x50, "lastore", None, NONE;
    FASTORE = 0x51, "fastore", None, NONE;
    DASTORE = 0x52, "dastore", None, NONE;
    AASTORE = 0x53, "aastore", None, NONE;
    BASTORE = 0x54, "bastore", None, NONE;
    CASTORE = 0x55, "castore", None, NONE;
    SASTORE = 0x56, "sastore", None, NONE;
    POP = 0x57, "pop", None, NONE;
    POP2 = 0x58, "pop2", None, NONE;
    DUP = 0x59, "dup", None, NONE;
    DUP_X1 = 0x5a, "dup_x1", None, NONE;
    DUP_X2 = 0x5b, "dup_x2", None, NONE;
    DUP2 = 0x5c, "dup2", None, NONE;
    DUP2_X1 = 0x5d, "dup2_x1", None, NONE;
    DUP2_X2 = 0x5e, "dup2_x2", None, NONE;
    SWAP = 0x5f, "swap", None, NONE;
    IADD = 0x60, "iadd", None, NONE;
    LADD = 0x61, "ladd", None, NONE;
    FADD = 0x62, "fadd", None, NONE;
    DADD = 0x63, "dadd", None, NONE;
    ISUB = 0x64, "isub", None, NONE;
    LSUB = 0x65, "lsub", None, NONE;
    FSUB = 0x66, "fsub", None, NONE;
    DSUB = 0x67, "dsub", None, NONE;
    IMUL = 0x68, "imul", None, NONE;
    LMUL = 0x69, "lmul", None, NONE;
    FMUL = 0x6a, "fmul", None, NONE;
    DMUL = 0x6b, "dmul", None, NONE;
    IDIV = 0x6c, "idiv", None, NONE;
    LDIV = 0x6d, "ldiv", None, NONE;
    FDIV = 0x6e, "fdiv", None, NONE;
    DDIV = 0x6f, "ddiv", None, NONE;
    IREM = 0x70, "irem", None, NONE;
    LREM = 0x71, "lrem", None, NONE;
    FREM = 0x72, "frem", None, NONE;
    DREM = 0x73, "drem", None, NONE;
    INEG = 0x74, "ineg", None, NONE;
    LNEG = 0x75, "lneg", None, NONE;
    FNEG = 0x76, "fneg", None, NONE;
    DNEG = 0x77, "dneg", None, NONE;
    ISHL = 0x78, "ishl", None, NONE;
    LSHL = 0x79, "lshl", None, NONE;
    ISHR = 0x7a, "ishr", None, NONE;
    LSHR = 0x7b, "lshr", None, NONE;
    IUSHR = 0x7c, "iushr", None, NONE;
    LUSHR = 0x7d, "lushr", None, NONE;
    IAND = 0x7e, "iand", None, NONE;
    LAND = 0x7f, "land", None, NONE;
    IOR = 0x80, "ior", None, NONE;
    LOR = 0x81, "lor", None, NONE;
    IXOR = 0x82, "ixor", None, NONE;
    LXOR = 0x83, "lxor", None, NONE;
    IINC = 0x84, "iinc", Iinc, NONE;
    I2L = 0x85, "i2l", None, NONE;
    I2F = 0x86, "i2f", None, NONE;
    I2D = 0x87, "i2d", None, NONE;
    L2I = 0x88, "l2i", None, NONE;
    L2F = 0x89, "l2f", None, NONE;
    L2D = 0x8a, "l2d", None, NONE;
    F2I = 0x8b, "f2i", None, NONE;
    F2L = 0x8c, "f2l", None, NONE;
    F2D = 0x8d, "f2d", None, NONE;
    D2I = 0x8e, "d2i", None, NONE;
    D2L = 0x8f, "d2l", None, NONE;
    D2F = 0x90, "d2f", None, NONE;
    I2B = 0x91, "i2b", None, NONE;
    I2C = 0x92, "i2c", None, NONE;
    I2S = 0x93, "i2s", None, NONE;
    LCMP = 0x94, "lcmp", None, NONE;
    FCMPL = 0x95, "fcmpl", None, NONE;
    FCMPG = 0x96, "fcmpg", None, NONE;
    DCMPL = 0x97, "dcmpl", None, NONE;
    DCMPG = 0x98, "dcmpg", None, NONE;
    IFEQ = 0x99, "ifeq", Branch, COND;
    IFNE = 0x9a, "ifne", Branch, COND;
    IFLT = 0x9b, "iflt", Branch, COND;
    IFGE = 0x9c, "ifge", Branch, COND;
    IFGT = 0x9d, "ifgt", Branch, COND;
    IFLE = 0x9e, "ifle", Branch, COND;
    IF_ICMPEQ = 0x9f, "if_icmpeq", Branch, COND;
    IF_ICMPNE = 0xa0, "if_icmpne", Branch, COND;
    IF_ICMPLT = 0xa1, "if_icmplt", Branch, COND;
    IF_ICMPGE = 0xa2, "if_icmpge", Branch, COND;
    IF_ICMPGT = 0xa3, "if_icmpgt", Branch, COND;
    IF_ICMPLE = 0xa4, "if_icmple", Branch, COND;
    IF_ACMPEQ = 0xa5, "if_acmpeq", Branch, COND;
    IF_ACMPNE = 0xa6, "if_acmpne", Branch, COND;
    GOTO = 0xa7, "goto", Branch, GOTO;
    JSR = 0xa8, "jsr", Branch, JSR;
    RET = 0xa9, "ret", Local, RET_SUB;
    TABLESWITCH = 0xaa, "tableswitch", TableSwitch, SWITCH;
    LOOKUPSWITCH = 0xab, "lookupswitch", LookupSwitch, SWITCH;
    IRETURN = 0xac, "ireturn", None, RET;
    LRETURN = 0xad, "lreturn", None, RET;
    FRETURN = 0xae, "freturn", None, RET;
    DRETURN = 0xaf, "dreturn", None, RET;
    ARETURN = 0xb0, "areturn", None, RET;
    RETURN = 0xb1, "return", None, RET;
    GETSTATIC = 0xb2, "getstatic", ConstPool, FIELD;
    PUTSTATIC = 0xb3, "putstatic", ConstPool, FIELD;
    GETFIELD = 0xb4, "getfield", ConstPool, FIELD;
    PUTFIELD = 0xb5, "putfield", ConstPool, FIELD;
    INVOKEVIRTUAL = 0xb6, "invokevirtual", ConstPool, INVOKE;
    INVOKESPECIAL = 0xb7, "invokespecial", ConstPool, INVOKE;
    INVOKESTATIC = 0xb8, "invokestatic", ConstPool, INVOKE;
    INVOKEINTERFACE = 0xb9, "invokeinterface", InvokeInterface, INVOKE;
    INVOKEDYNAMIC = 0xba, "invokedynamic", InvokeDynamic, INVOKE;
    NEW = 0xbb, "new", ConstPool, NONE;
    NEWARRAY = 0xbc, "newarray", ArrayType, NONE;
    ANEWARRAY = 0xbd, "anewarray", ConstPool, NONE;
    ARRAYLENGTH = 0xbe, "arraylength", None, NONE;
    ATHROW = 0xbf, "athrow", None, THROW;
    CHECKCAST = 0xc0, "checkcast", ConstPool, NONE;
    INSTANCEOF = 0xc1, "instanceof", ConstPool, NONE;
    MONITORENTER = 0xc2, "monitorenter", None, NONE;
    MONITOREXIT = 0xc3, "monitorexit", None, NONE;
    WIDE = 0xc4, "wide", Wide, NONE;
    MULTIANEWARRAY = 0xc5, "multianewarray", MultiANewArray, NONE;
    IFNULL = 0xc6, "ifnull", Branch, COND;
    IFNONNULL = 0xc7, "ifnonnull", Branch, COND;
    GOTO_W = 0xc8, "goto_w", BranchWide, GOTO;
    JSR_W = 0xc9, "jsr_w", BranchWide, JSR;
}

/// Look up an opcode by its raw byte value.
pub fn lookup(raw: u8) -> Option<&'static OpcodeInfo> {
    // The table is dense from 0x00 up to its last entry.
    OPCODE_TABLE
        .get(raw as usize)
        .filter(|info| info.opcode.0 == raw)
}

/// All known opcodes in ascending order.
pub fn opcode_table() -> &'static [OpcodeInfo] {
    OPCODE_TABLE
}

pub fn opcode_count() -> usize {
    OPCODE_TABLE.len()
}
