use std::path::Path;

use crate::bytecode::{disassemble, Program};
use crate::runtime::{RuntimeConfig, RuntimeResult};
use crate::vm::{InputSource, OutputSink, VirtualMachine};

/// The Runtime is the main entry point for executing compiled programs
#[derive(Clone, Debug, Default)]
pub struct Runtime {
    config: RuntimeConfig,
}

impl Runtime {
    /// Create a new runtime with default configuration
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create a new runtime with custom configuration
    pub fn with_config(config: RuntimeConfig) -> Self {
        Self { config }
    }

    /// Execute a bytecode file
    pub fn execute_file<P: AsRef<Path>>(&self, path: P) -> RuntimeResult<()> {
        let program = Program::read_file(&path)?;

        if self.config.debug_mode {
            println!(
                "Loaded {} bytes from {}",
                program.len(),
                path.as_ref().display()
            );
            print!("{}", disassemble(program.bytes()));
        }

        self.execute_program(&program)
    }

    /// Execute an in-memory program against process stdin/stdout
    pub fn execute_program(&self, program: &Program) -> RuntimeResult<()> {
        let mut vm = VirtualMachine::new();
        self.run(&mut vm, program)
    }

    /// Execute an in-memory program against caller-supplied I/O
    pub fn execute_with_io(
        &self,
        program: &Program,
        input: Box<dyn InputSource>,
        output: Box<dyn OutputSink>,
    ) -> RuntimeResult<()> {
        let mut vm = VirtualMachine::with_io(input, output);
        self.run(&mut vm, program)
    }

    fn run(&self, vm: &mut VirtualMachine, program: &Program) -> RuntimeResult<()> {
        vm.set_trace(self.config.trace);
        vm.load(program.bytes());
        vm.execute()?;

        if self.config.debug_mode {
            println!("Globals: {}", vm.dump_globals());
        }

        Ok(())
    }
}
