use thiserror::Error;

/// Error type for VM execution failures. Any of these aborts the run;
/// the caller recovers by discarding the machine.
#[derive(Error, Debug)]
pub enum VmError {
    #[error("Stack underflow")]
    StackUnderflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),

    #[error("Return outside a call frame")]
    InvalidReturn,

    #[error("Unknown opcode: 0x{0:02X}")]
    UnknownOpcode(u8),

    #[error("Instruction pointer out of bounds: {0}")]
    InstructionOutOfBounds(i64),
}

/// Result type for VM operations
pub type VmResult<T> = Result<T, VmError>;
