mod asm;
mod disasm;
mod opcode;

pub use asm::{AsmError, Assembler};
pub use disasm::disassemble;
pub use opcode::{OpCode, OperandKind};

use std::io;
use std::path::Path;

/// A compiled bytecode program: a dense byte buffer of opcodes and operands.
///
/// The buffer is the whole artifact. It is persisted verbatim, with no
/// header, and the VM never mutates it after loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    code: Vec<u8>,
}

impl Program {
    pub fn new(code: Vec<u8>) -> Self {
        Self { code }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.code
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.code
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Read a program back from a bytecode file written with `write_file`.
    pub fn read_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(Self::new(std::fs::read(path)?))
    }

    /// Persist the raw buffer to a bytecode file.
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        std::fs::write(path, &self.code)
    }
}

impl From<Vec<u8>> for Program {
    fn from(code: Vec<u8>) -> Self {
        Self::new(code)
    }
}

impl AsRef<[u8]> for Program {
    fn as_ref(&self) -> &[u8] {
        &self.code
    }
}
