use jvmd_ir::instruction::{Instruction, Operand, SwitchTable};
use jvmd_isa::{ByteReader, DecodeError, Opcode, OperandShape};

/// Decode a method's code bytes into a list of instructions.
///
/// Decoding is a single left-to-right pass. The first instruction that
/// cannot be decoded (unknown opcode, truncated operand, `wide` prefix,
/// malformed switch) becomes one `UndecodedTail` carrying every remaining
/// byte, and decoding stops there.
pub fn decode_method(code: &[u8]) -> Vec<Instruction> {
    let mut reader = ByteReader::new(code);
    let mut instructions = Vec::new();

    while !reader.is_empty() {
        reader.begin_instruction();
        match decode_one(&mut reader) {
            Ok(insn) => instructions.push(insn),
            Err(reason) => {
                let start = reader.instruction_start();
                let bytes = reader.rest_of_instruction_stream().to_vec();
                log::warn!(
                    "{reason}; keeping {} trailing bytes undecoded",
                    bytes.len()
                );
                instructions.push(Instruction {
                    offset: start as u32,
                    opcode: Opcode(bytes[0]),
                    size: bytes.len() as u32,
                    operand: Operand::UndecodedTail { bytes, reason },
                });
                break;
            }
        }
    }

    instructions
}

fn decode_one(reader: &mut ByteReader<'_>) -> Result<Instruction, DecodeError> {
    let offset = reader.instruction_start();
    let raw = reader.u8()?;
    let info = jvmd_isa::lookup(raw).ok_or(DecodeError::UnknownOpcode {
        offset,
        opcode: raw,
    })?;
    let opcode = info.opcode();

    let operand = match info.shape() {
        OperandShape::None => implicit_local(opcode).map_or(Operand::None, Operand::Local),
        OperandShape::Local => Operand::Local(u16::from(reader.u8()?)),
        OperandShape::Byte => Operand::Imm(i32::from(reader.i8()?)),
        OperandShape::Short => Operand::Imm(i32::from(reader.i16()?)),
        OperandShape::ArrayType => Operand::Imm(i32::from(reader.u8()?)),
        OperandShape::ConstPoolNarrow => Operand::ConstPool(u16::from(reader.u8()?)),
        OperandShape::ConstPool => Operand::ConstPool(reader.u16()?),
        OperandShape::Iinc => Operand::Iinc {
            index: u16::from(reader.u8()?),
            delta: i16::from(reader.i8()?),
        },
        OperandShape::Branch => {
            let delta = i32::from(reader.i16()?);
            Operand::Branch(branch_target(offset, delta)?)
        }
        OperandShape::BranchWide => {
            let delta = reader.i32()?;
            Operand::Branch(branch_target(offset, delta)?)
        }
        OperandShape::TableSwitch => Operand::Switch(table_switch(reader, offset)?),
        OperandShape::LookupSwitch => Operand::Switch(lookup_switch(reader, offset)?),
        OperandShape::InvokeInterface => {
            let index = reader.u16()?;
            let count = reader.u8()?;
            reader.u8()?;
            Operand::InvokeInterface { index, count }
        }
        OperandShape::InvokeDynamic => {
            let index = reader.u16()?;
            reader.u16()?;
            Operand::ConstPool(index)
        }
        OperandShape::MultiANewArray => Operand::MultiANewArray {
            index: reader.u16()?,
            dimensions: reader.u8()?,
        },
        OperandShape::Wide => return Err(DecodeError::WidePrefix(offset)),
    };

    Ok(Instruction {
        offset: offset as u32,
        opcode,
        operand,
        size: (reader.position() - offset) as u32,
    })
}

/// Slot encoded in the opcode itself (`iload_1`, `astore_3`, ...).
fn implicit_local(opcode: Opcode) -> Option<u16> {
    let raw = opcode.raw();
    let slot = match raw {
        // iload_0 ..= aload_3
        0x1a..=0x2d => (raw - 0x1a) % 4,
        // istore_0 ..= astore_3
        0x3b..=0x4e => (raw - 0x3b) % 4,
        _ => return None,
    };
    Some(u16::from(slot))
}

fn branch_target(offset: usize, delta: i32) -> Result<u32, DecodeError> {
    let target = offset as i64 + i64::from(delta);
    u32::try_from(target).map_err(|_| DecodeError::InvalidJumpTarget { offset, target })
}

fn table_switch(reader: &mut ByteReader<'_>, offset: usize) -> Result<SwitchTable, DecodeError> {
    reader.align4()?;
    let default = branch_target(offset, reader.i32()?)?;
    let low = reader.i32()?;
    let high = reader.i32()?;
    if high < low {
        return Err(DecodeError::MalformedSwitch(offset));
    }
    let count = i64::from(high) - i64::from(low) + 1;
    let mut cases = Vec::new();
    for i in 0..count {
        let key = (i64::from(low) + i) as i32;
        cases.push((key, branch_target(offset, reader.i32()?)?));
    }
    Ok(SwitchTable { default, cases })
}

fn lookup_switch(reader: &mut ByteReader<'_>, offset: usize) -> Result<SwitchTable, DecodeError> {
    reader.align4()?;
    let default = branch_target(offset, reader.i32()?)?;
    let npairs = reader.i32()?;
    if npairs < 0 {
        return Err(DecodeError::MalformedSwitch(offset));
    }
    let mut cases = Vec::new();
    for _ in 0..npairs {
        let key = reader.i32()?;
        cases.push((key, branch_target(offset, reader.i32()?)?));
    }
    Ok(SwitchTable { default, cases })
}
