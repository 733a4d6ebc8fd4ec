/// Reasons an instruction could not be decoded.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Byte at the given offset is not a known opcode.
    #[error("unknown opcode {opcode:#04x} at offset {offset}")]
    UnknownOpcode { offset: usize, opcode: u8 },
    /// An operand at the given instruction offset runs past the end of the code.
    #[error("truncated instruction at offset {0}")]
    Truncated(usize),
    /// The operand-modifying `wide` prefix at the given offset.
    #[error("unsupported wide prefix at offset {0}")]
    WidePrefix(usize),
    /// A switch at the given offset declares a negative range or pair count.
    #[error("malformed switch table at offset {0}")]
    MalformedSwitch(usize),
    /// A branch at `offset` resolves to a target before the start of the code.
    #[error("branch at offset {offset} targets invalid offset {target}")]
    InvalidJumpTarget { offset: usize, target: i64 },
}

/// Bounds-checked big-endian cursor over a method's code bytes.
///
/// Every read reports [`DecodeError::Truncated`] against the offset of the
/// instruction being decoded rather than the byte that ran out, so callers
/// can mark the whole instruction as undecodable.
#[derive(Clone, Debug)]
pub struct ByteReader<'a> {
    code: &'a [u8],
    pos: usize,
    insn_start: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(code: &'a [u8]) -> Self {
        Self {
            code,
            pos: 0,
            insn_start: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.code.len()
    }

    /// Mark the current position as the start of a new instruction.
    pub fn begin_instruction(&mut self) {
        self.insn_start = self.pos;
    }

    pub fn instruction_start(&self) -> usize {
        self.insn_start
    }

    /// Bytes from the current instruction start to the end of the code.
    pub fn rest_of_instruction_stream(&self) -> &'a [u8] {
        &self.code[self.insn_start.min(self.code.len())..]
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.code.len())
            .ok_or(DecodeError::Truncated(self.insn_start))?;
        let bytes = &self.code[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub fn i8(&mut self) -> Result<i8, DecodeError> {
        Ok(self.u8()? as i8)
    }

    pub fn u16(&mut self) -> Result<u16, DecodeError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn i16(&mut self) -> Result<i16, DecodeError> {
        Ok(self.u16()? as i16)
    }

    pub fn i32(&mut self) -> Result<i32, DecodeError> {
        let b = self.take(4)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Skip padding up to the next 4-byte boundary, measured from the start
    /// of the code array.
    pub fn align4(&mut self) -> Result<(), DecodeError> {
        let pad = (4 - self.pos % 4) % 4;
        self.take(pad).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian() {
        let mut r = ByteReader::new(&[0x12, 0x34, 0xff, 0xfe, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(r.u16().unwrap(), 0x1234);
        assert_eq!(r.i16().unwrap(), -2);
        assert_eq!(r.i32().unwrap(), 256);
        assert!(r.is_empty());
    }

    #[test]
    fn truncation_reports_instruction_start() {
        let mut r = ByteReader::new(&[0xa7, 0x00]);
        r.begin_instruction();
        r.u8().unwrap();
        assert_eq!(r.i16().unwrap_err(), DecodeError::Truncated(0));
    }

    #[test]
    fn align_is_relative_to_code_start() {
        let mut r = ByteReader::new(&[0; 8]);
        r.u8().unwrap();
        r.align4().unwrap();
        assert_eq!(r.position(), 4);
        r.align4().unwrap();
        assert_eq!(r.position(), 4);
    }
}
