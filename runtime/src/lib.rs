// Cinder - a stack-based bytecode virtual machine for a small scripting language

pub mod bytecode;
pub mod runtime;
pub mod vm;

pub use bytecode::{Assembler, OpCode, Program};
pub use runtime::{Runtime, RuntimeConfig, RuntimeError, RuntimeResult};
pub use vm::{Value, VirtualMachine, VmError, VmResult};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
