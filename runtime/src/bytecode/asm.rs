use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::bytecode::{OpCode, Program};

/// Error type for assembly
#[derive(Error, Debug)]
pub enum AsmError {
    #[error("unresolved label '{0}'")]
    UnresolvedLabel(String),

    #[error("label '{0}' bound beyond the 32-bit offset range")]
    OffsetOutOfRange(String),
}

/// Builds bytecode buffers directly, without going through the compiler.
///
/// Jump operands are emitted as placeholders against named labels and
/// patched when `finish` runs, the same resolution scheme the compiler
/// uses. The first binding of a label name is authoritative.
pub struct Assembler {
    code: Vec<u8>,
    labels: FxHashMap<String, usize>,
    fixups: Vec<(usize, String)>,
}

impl Assembler {
    pub fn new() -> Self {
        Self {
            code: Vec::new(),
            labels: FxHashMap::default(),
            fixups: Vec::new(),
        }
    }

    /// Emit a bare opcode.
    pub fn op(&mut self, op: OpCode) -> &mut Self {
        self.code.push(op.to_byte());
        self
    }

    /// Emit PUSH with its constant operand.
    pub fn push_int(&mut self, value: i32) -> &mut Self {
        self.code.push(OpCode::Push.to_byte());
        self.code.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Emit a name-operand opcode (LOAD, STORE, INPUT). Names longer than
    /// 255 bytes are truncated at emission.
    pub fn named(&mut self, op: OpCode, name: &str) -> &mut Self {
        self.code.push(op.to_byte());
        let bytes = name.as_bytes();
        let len = bytes.len().min(255);
        self.code.push(len as u8);
        self.code.extend_from_slice(&bytes[..len]);
        self
    }

    /// Emit a jump-family opcode (JMP, JMP_IF, JMP_NOT, CALL) targeting a
    /// label, resolved at `finish`.
    pub fn jump(&mut self, op: OpCode, label: &str) -> &mut Self {
        self.code.push(op.to_byte());
        self.fixups.push((self.code.len(), label.to_string()));
        self.code.extend_from_slice(&0i32.to_le_bytes());
        self
    }

    /// Bind a label to the current byte offset.
    pub fn bind(&mut self, label: &str) -> &mut Self {
        let offset = self.code.len();
        self.labels.entry(label.to_string()).or_insert(offset);
        self
    }

    /// Current byte offset, useful for asserting instruction addresses.
    pub fn offset(&self) -> usize {
        self.code.len()
    }

    /// Patch every pending jump and produce the finished program.
    pub fn finish(mut self) -> Result<Program, AsmError> {
        for (position, label) in &self.fixups {
            let target = self
                .labels
                .get(label)
                .copied()
                .ok_or_else(|| AsmError::UnresolvedLabel(label.clone()))?;
            let offset =
                i32::try_from(target).map_err(|_| AsmError::OffsetOutOfRange(label.clone()))?;
            self.code[*position..position + 4].copy_from_slice(&offset.to_le_bytes());
        }
        Ok(Program::new(self.code))
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_emission() {
        let mut asm = Assembler::new();
        asm.push_int(5).push_int(3).op(OpCode::Add).op(OpCode::Halt);
        let program = asm.finish().unwrap();

        assert_eq!(
            program.bytes(),
            &[0x10, 5, 0, 0, 0, 0x10, 3, 0, 0, 0, 0x20, 0x00]
        );
    }

    #[test]
    fn test_negative_constants_are_little_endian() {
        let mut asm = Assembler::new();
        asm.push_int(-1);
        let program = asm.finish().unwrap();
        assert_eq!(program.bytes(), &[0x10, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_name_operand_encoding() {
        let mut asm = Assembler::new();
        asm.named(OpCode::Store, "xy");
        let program = asm.finish().unwrap();
        assert_eq!(program.bytes(), &[0x51, 2, b'x', b'y']);
    }

    #[test]
    fn test_long_names_truncate_to_255() {
        let name = "n".repeat(300);
        let mut asm = Assembler::new();
        asm.named(OpCode::Load, &name);
        let program = asm.finish().unwrap();

        assert_eq!(program.bytes()[1], 255);
        assert_eq!(program.len(), 1 + 1 + 255);
    }

    #[test]
    fn test_forward_jump_is_patched() {
        let mut asm = Assembler::new();
        asm.jump(OpCode::Jmp, "end").push_int(1).bind("end").op(OpCode::Halt);
        let program = asm.finish().unwrap();

        // JMP(1+4) then PUSH(1+4) puts "end" at offset 10.
        assert_eq!(&program.bytes()[1..5], &10i32.to_le_bytes());
    }

    #[test]
    fn test_backward_jump_is_patched() {
        let mut asm = Assembler::new();
        asm.bind("top").push_int(1).op(OpCode::Pop).jump(OpCode::Jmp, "top");
        let program = asm.finish().unwrap();

        assert_eq!(&program.bytes()[7..11], &0i32.to_le_bytes());
    }

    #[test]
    fn test_first_label_binding_wins() {
        let mut asm = Assembler::new();
        asm.bind("l").push_int(1).bind("l").jump(OpCode::Jmp, "l");
        let program = asm.finish().unwrap();

        assert_eq!(&program.bytes()[6..10], &0i32.to_le_bytes());
    }

    #[test]
    fn test_unresolved_label_is_an_error() {
        let mut asm = Assembler::new();
        asm.jump(OpCode::Jmp, "nowhere");
        let err = asm.finish().unwrap_err();
        assert!(matches!(err, AsmError::UnresolvedLabel(name) if name == "nowhere"));
    }
}
