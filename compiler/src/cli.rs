use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use cinder::bytecode::disassemble;
use cinder::{Program, Runtime, RuntimeConfig};

use crate::compiler::compile_source;

#[derive(Parser)]
#[command(name = "cinder-lang", version, about = "Compile and run Cinder programs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compile a source file to a bytecode file
    Build {
        source: PathBuf,

        /// Output path (defaults to the source path with an .ash extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compile a source file (or load an .ash file) and execute it
    Run {
        file: PathBuf,

        /// Print each instruction and the stack while executing
        #[arg(long)]
        trace: bool,

        /// Print the load summary, listing, and final globals
        #[arg(long)]
        debug: bool,
    },

    /// Disassemble a source or bytecode file
    Dis { file: PathBuf },
}

#[derive(Default)]
pub struct CliHandler;

impl CliHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, cli: Cli) -> Result<()> {
        match cli.command {
            Command::Build { source, output } => self.build(&source, output),
            Command::Run { file, trace, debug } => self.run(&file, trace, debug),
            Command::Dis { file } => self.dis(&file),
        }
    }

    fn build(&self, source: &Path, output: Option<PathBuf>) -> Result<()> {
        let program = self.compile_file(source)?;
        let output = output.unwrap_or_else(|| source.with_extension("ash"));
        program
            .write_file(&output)
            .with_context(|| format!("failed to write {}", output.display()))?;
        println!("Wrote {} bytes to {}", program.len(), output.display());
        Ok(())
    }

    fn run(&self, file: &Path, trace: bool, debug: bool) -> Result<()> {
        let program = self.load_or_compile(file)?;
        let config = RuntimeConfig::default()
            .with_trace(trace)
            .with_debug_mode(debug);
        Runtime::with_config(config)
            .execute_program(&program)
            .with_context(|| format!("failed to run {}", file.display()))?;
        Ok(())
    }

    fn dis(&self, file: &Path) -> Result<()> {
        let program = self.load_or_compile(file)?;
        print!("{}", disassemble(program.bytes()));
        Ok(())
    }

    /// `.ash` files load verbatim; anything else is treated as source.
    fn load_or_compile(&self, file: &Path) -> Result<Program> {
        if file.extension().is_some_and(|ext| ext == "ash") {
            Program::read_file(file)
                .with_context(|| format!("failed to read {}", file.display()))
        } else {
            self.compile_file(file)
        }
    }

    fn compile_file(&self, source: &Path) -> Result<Program> {
        let text = fs::read_to_string(source)
            .with_context(|| format!("failed to read {}", source.display()))?;
        let program = compile_source(&text)
            .with_context(|| format!("failed to compile {}", source.display()))?;
        Ok(program)
    }
}
